//! Presentation core for precomputed PCA results.
//!
//! The crate never computes a PCA. It accepts the JSON an upstream tool already
//! produced, checks its shape, derives a handful of display statistics, and builds
//! Plotly-compatible chart descriptions. Front ends (CLI, browser) drive a
//! [`Session`] through the [`Surface`] trait.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod charts;
pub mod document;
pub mod sections;
pub mod session;
pub mod stats;
pub mod timecode;

pub use charts::{
    chart_for_section, contribution_chart, cumulative_chart, projection_chart, ChartDescription,
};
pub use document::{validate, Point, ResultDocument, REQUIRED_FIELDS};
pub use sections::{SectionId, SectionTransition, SectionVisibility};
pub use session::{Session, Surface, UploadTicket};
pub use stats::{derive, round_to, DerivedStats, StatCard};
pub use timecode::{extract_color_encoding, extract_time_ps, ColorEncoding, ColorTitle, TimeUnit};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PcaError {
    #[error("malformed JSON: {0}")]
    MalformedJson(String),
    #[error("invalid JSON format: top-level value must be an object")]
    NotAnObject,
    #[error("invalid JSON format: required keys missing: {}", .0.join(", "))]
    MissingRequiredFields(Vec<String>),
    #[error("invalid field '{field}': {reason}")]
    InvalidField { field: String, reason: String },
    #[error("unsupported file type: '{0}' (expected a '.json' file)")]
    UnsupportedFileType(String),
    #[error("'{field}' lists {len} component(s); at least 2 are required")]
    InsufficientComponents { field: String, len: usize },
    #[error("no file selected")]
    NoFileSelected,
    #[error("failed to read file: {0}")]
    ReadFailed(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// How the upload filter compares the `.json` suffix.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExtensionMatch {
    #[default]
    Exact,
    IgnoreCase,
}

impl ExtensionMatch {
    pub fn accepts(self, file_name: &str) -> bool {
        match self {
            ExtensionMatch::Exact => file_name.ends_with(".json"),
            ExtensionMatch::IgnoreCase => file_name.to_ascii_lowercase().ends_with(".json"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewerConfig {
    pub default_sections: Vec<SectionId>,
    pub extension_match: ExtensionMatch,
    pub marker_size: f64,
    pub colorscale: String,
    pub cumulative_range_max: f64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            default_sections: SectionId::ALL.to_vec(),
            extension_match: ExtensionMatch::Exact,
            marker_size: 12.0,
            colorscale: "Viridis".to_string(),
            cumulative_range_max: 1.1,
        }
    }
}

impl ViewerConfig {
    pub fn from_json(text: &str) -> Result<Self, PcaError> {
        let config: ViewerConfig =
            serde_json::from_str(text).map_err(|e| PcaError::InvalidConfig(e.to_string()))?;
        config.check()?;
        Ok(config)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: &std::path::Path) -> Result<Self, PcaError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| PcaError::InvalidConfig(format!("{}: {e}", path.display())))?;
        Self::from_json(&text)
    }

    fn check(&self) -> Result<(), PcaError> {
        if !(self.marker_size.is_finite() && self.marker_size > 0.0) {
            return Err(PcaError::InvalidConfig(format!(
                "marker_size must be positive, got {}",
                self.marker_size
            )));
        }
        if !(self.cumulative_range_max.is_finite() && self.cumulative_range_max >= 1.0) {
            return Err(PcaError::InvalidConfig(format!(
                "cumulative_range_max must be at least 1.0, got {}",
                self.cumulative_range_max
            )));
        }
        if self.colorscale.trim().is_empty() {
            return Err(PcaError::InvalidConfig("colorscale must not be empty".into()));
        }
        Ok(())
    }
}
