//! Per-section visibility toggles.
//!
//! A section switched on is not drawn straight away: it waits for the host to
//! report that its container has been laid out, then renders from whatever
//! document the session holds at that moment.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::PcaError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionId {
    Pca,
    Contribution,
    Cumulative,
}

impl SectionId {
    /// Paint order for the initial render pass.
    pub const ALL: [SectionId; 3] = [SectionId::Pca, SectionId::Contribution, SectionId::Cumulative];

    pub fn as_str(self) -> &'static str {
        match self {
            SectionId::Pca => "pca",
            SectionId::Contribution => "contribution",
            SectionId::Cumulative => "cumulative",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            SectionId::Pca => "PCA Projection",
            SectionId::Contribution => "Component Contributions",
            SectionId::Cumulative => "Cumulative Variance",
        }
    }

    pub fn container_id(self) -> &'static str {
        match self {
            SectionId::Pca => "pca-section",
            SectionId::Contribution => "contribution-section",
            SectionId::Cumulative => "cumulative-section",
        }
    }

    pub fn plot_id(self) -> &'static str {
        match self {
            SectionId::Pca => "pcaPlot",
            SectionId::Contribution => "contributionPlot",
            SectionId::Cumulative => "cumulativePlot",
        }
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionId {
    type Err = PcaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pca" | "projection" => Ok(SectionId::Pca),
            "contribution" | "contributions" => Ok(SectionId::Contribution),
            "cumulative" => Ok(SectionId::Cumulative),
            other => Err(PcaError::InvalidConfig(format!("unknown section '{other}'"))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SectionTransition {
    /// Container shown; draw once `layout_ready` arrives.
    Shown(SectionId),
    Hidden(SectionId),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SectionVisibility {
    active: BTreeSet<SectionId>,
    awaiting_layout: BTreeSet<SectionId>,
}

impl SectionVisibility {
    pub fn new(default_active: &[SectionId]) -> Self {
        Self {
            active: default_active.iter().copied().collect(),
            awaiting_layout: BTreeSet::new(),
        }
    }

    pub fn is_active(&self, section: SectionId) -> bool {
        self.active.contains(&section)
    }

    pub fn is_awaiting_layout(&self, section: SectionId) -> bool {
        self.awaiting_layout.contains(&section)
    }

    /// Active sections in paint order.
    pub fn active_in_order(&self) -> Vec<SectionId> {
        SectionId::ALL
            .into_iter()
            .filter(|s| self.active.contains(s))
            .collect()
    }

    pub fn toggle(&mut self, section: SectionId) -> SectionTransition {
        if self.active.remove(&section) {
            self.awaiting_layout.remove(&section);
            SectionTransition::Hidden(section)
        } else {
            self.active.insert(section);
            self.awaiting_layout.insert(section);
            SectionTransition::Shown(section)
        }
    }

    /// Clears the pending flag. Returns `true` when the section should be drawn now.
    pub fn take_layout_ready(&mut self, section: SectionId) -> bool {
        self.awaiting_layout.remove(&section) && self.active.contains(&section)
    }
}
