//! Time tokens embedded in point labels, used to colour the projection scatter.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::Point;

static TIME_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([0-9]+(?:\.[0-9]+)?)\s*(fs|ps|ns)").expect("time token pattern is valid")
});

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeUnit {
    Femtoseconds,
    Picoseconds,
    Nanoseconds,
}

impl TimeUnit {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "fs" => Some(TimeUnit::Femtoseconds),
            "ps" => Some(TimeUnit::Picoseconds),
            "ns" => Some(TimeUnit::Nanoseconds),
            _ => None,
        }
    }

    pub fn to_picoseconds(self, value: f64) -> f64 {
        match self {
            TimeUnit::Femtoseconds => value / 1000.0,
            TimeUnit::Picoseconds => value,
            TimeUnit::Nanoseconds => value * 1000.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorTitle {
    TimePs,
    FileIndex,
}

impl ColorTitle {
    pub fn as_str(self) -> &'static str {
        match self {
            ColorTitle::TimePs => "Time (ps)",
            ColorTitle::FileIndex => "File Index",
        }
    }
}

/// Colour values aligned 1:1 with the document's points.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorEncoding {
    pub values: Vec<f64>,
    pub title: ColorTitle,
    /// Extracted time per point, `None` where the label carried no token.
    pub times_ps: Vec<Option<f64>>,
}

/// First `<number><unit>` token in `label`, normalised to picoseconds.
pub fn extract_time_ps(label: &str) -> Option<f64> {
    let caps = TIME_TOKEN.captures(label)?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    let unit = TimeUnit::from_token(caps.get(2)?.as_str())?;
    Some(unit.to_picoseconds(value))
}

/// Labels with a time token colour by time; the rest fall back to their index.
/// With no token anywhere every point colours by index.
pub fn extract_color_encoding(points: &[Point]) -> ColorEncoding {
    let times_ps: Vec<Option<f64>> = points.iter().map(|p| extract_time_ps(&p.label)).collect();
    let any_time = times_ps.iter().any(Option::is_some);
    let values = times_ps
        .iter()
        .enumerate()
        .map(|(idx, t)| t.unwrap_or(idx as f64))
        .collect();
    ColorEncoding {
        values,
        title: if any_time {
            ColorTitle::TimePs
        } else {
            ColorTitle::FileIndex
        },
        times_ps,
    }
}
