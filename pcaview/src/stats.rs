use serde::{Deserialize, Serialize};

use crate::{PcaError, ResultDocument};

/// Display statistics recomputed on every successful load.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DerivedStats {
    pub point_count: usize,
    #[serde(rename = "pc1VariancePct")]
    pub pc1_variance_pct: f64,
    #[serde(rename = "pc2VariancePct")]
    pub pc2_variance_pct: f64,
    #[serde(rename = "cumulativePC1PC2Pct")]
    pub cumulative_pc1_pc2_pct: f64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatCard {
    pub value: String,
    pub label: &'static str,
}

pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}

pub fn derive(doc: &ResultDocument) -> Result<DerivedStats, PcaError> {
    doc.ensure_components()?;
    let ratios = &doc.explained_variance_ratio_all;
    Ok(DerivedStats {
        point_count: doc.points.len(),
        pc1_variance_pct: round_to(ratios[0] * 100.0, 1),
        pc2_variance_pct: round_to(ratios[1] * 100.0, 1),
        cumulative_pc1_pc2_pct: round_to(doc.cumulative_variance_ratio_all[1] * 100.0, 1),
    })
}

impl DerivedStats {
    pub fn cards(&self) -> [StatCard; 4] {
        [
            StatCard {
                value: self.point_count.to_string(),
                label: "Data Points",
            },
            StatCard {
                value: format!("{:.1}%", self.pc1_variance_pct),
                label: "PC1 Variance",
            },
            StatCard {
                value: format!("{:.1}%", self.pc2_variance_pct),
                label: "PC2 Variance",
            },
            StatCard {
                value: format!("{:.1}%", self.cumulative_pc1_pc2_pct),
                label: "PC1+PC2 Cum. Var.",
            },
        ]
    }
}
