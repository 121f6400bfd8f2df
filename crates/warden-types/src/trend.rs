use serde::{Deserialize, Serialize};

/// Directional movement of recent response times against the older baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Improving,
    Stable,
    Degrading,
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Improving => "improving",
            Self::Stable => "stable",
            Self::Degrading => "degrading",
        };
        f.write_str(s)
    }
}

/// Rolling statistics over the successful probes in an agent's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    pub avg_time: f64,
    /// Population standard deviation, not sample.
    pub std_dev: f64,
    pub recent_trend: TrendDirection,
}

impl TrendReport {
    pub fn flat(direction: TrendDirection) -> Self {
        Self {
            avg_time: 0.0,
            std_dev: 0.0,
            recent_trend: direction,
        }
    }
}
