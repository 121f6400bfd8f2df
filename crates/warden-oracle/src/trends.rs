//! Rolling trend analytics over an agent's probe history.
//!
//! Pure functions of the stored history: same history, same output.

use warden_types::{ProbeSample, TrendDirection, TrendReport};

/// How many of the most recent successful samples form the "recent" window.
const RECENT_WINDOW: usize = 3;

/// Derive average, population standard deviation and direction.
///
/// Fewer than 3 samples say nothing; a history with no successful probe at
/// all is already degrading.
pub fn analyze(history: &[ProbeSample]) -> TrendReport {
    if history.len() < 3 {
        return TrendReport::flat(TrendDirection::Stable);
    }

    let successful: Vec<f64> = history
        .iter()
        .filter(|s| s.success)
        .map(|s| s.response_time_ms as f64)
        .collect();

    if successful.is_empty() {
        return TrendReport::flat(TrendDirection::Degrading);
    }

    let avg_time = mean(&successful);
    let variance = successful
        .iter()
        .map(|t| (t - avg_time).powi(2))
        .sum::<f64>()
        / successful.len() as f64;
    let std_dev = variance.sqrt();

    let split = successful.len().saturating_sub(RECENT_WINDOW);
    let (older, recent) = successful.split_at(split);
    let recent_trend = if older.is_empty() {
        TrendDirection::Stable
    } else {
        let older_mean = mean(older);
        let recent_mean = mean(recent);
        if recent_mean < 0.8 * older_mean {
            TrendDirection::Improving
        } else if recent_mean > 1.2 * older_mean {
            TrendDirection::Degrading
        } else {
            TrendDirection::Stable
        }
    };

    TrendReport {
        avg_time,
        std_dev,
        recent_trend,
    }
}

/// A probe is anomalous when it sits more than two standard deviations
/// above the rolling average.
pub fn is_anomalous(current_response_ms: u64, report: &TrendReport) -> bool {
    report.avg_time > 0.0
        && (current_response_ms as f64) > report.avg_time + 2.0 * report.std_dev
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
