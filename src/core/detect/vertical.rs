// faamcat - core/detect/vertical.rs
//
// Profile detection: sustained climbs and descents, read from the trend of
// smoothed static pressure. Pressure falls while climbing.

use super::level_run::window_in_range;
use super::runs::true_runs;
use super::window::{centred_mean, diff};
use super::{Airborne, ChannelNames, Segment};
use crate::core::series::TimeSeries;
use crate::util::constants::{
    DEFAULT_PROFILE_MIN_LENGTH, DEFAULT_PROFILE_THRESHOLD, DEFAULT_PROFILE_WINDOW,
};
use crate::util::error::DetectError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileParams {
    /// Width of the centred pressure smoothing window, in samples.
    pub window: usize,
    /// Per-second pressure change (hPa/s) a sample must reach to count.
    pub threshold: f64,
    /// Shortest profile reported, in samples.
    pub min_length: usize,
}

impl Default for ProfileParams {
    fn default() -> Self {
        Self {
            window: DEFAULT_PROFILE_WINDOW,
            threshold: DEFAULT_PROFILE_THRESHOLD,
            min_length: DEFAULT_PROFILE_MIN_LENGTH,
        }
    }
}

impl ProfileParams {
    pub fn validate(&self) -> Result<(), DetectError> {
        window_in_range("window", self.window)?;
        window_in_range("min_length", self.min_length)?;
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(DetectError::InvalidParameter {
                parameter: "threshold",
                reason: format!("must be a non-negative number, got {}", self.threshold),
            });
        }
        Ok(())
    }
}

/// Climbs and descents found in one table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Profiles {
    pub ascending: Vec<Segment>,
    pub descending: Vec<Segment>,
}

/// Find ascending and descending profiles in `table`.
///
/// Airborne 1 Hz pressure is smoothed with a centred mean of `window`
/// samples and differenced. A sample is descending when the trend is at
/// least `+threshold`, ascending when it is at most `-threshold`. Samples
/// without a trend (window edges) are neither. With a zero threshold a flat
/// trend satisfies both and appears in both lists.
pub fn detect_profiles(
    table: &TimeSeries,
    channels: &ChannelNames,
    params: &ProfileParams,
) -> Result<Profiles, DetectError> {
    params.validate()?;

    let grid = table.resample(1)?;
    let air = Airborne::extract(&grid, &channels.ground, &[channels.pressure.as_str()])?;
    let trend = diff(&centred_mean(&air.columns[0], params.window));

    let descending_mask: Vec<bool> = trend.iter().map(|d| *d >= params.threshold).collect();
    let ascending_mask: Vec<bool> = trend.iter().map(|d| *d <= -params.threshold).collect();

    let segments = |mask: &[bool]| -> Vec<Segment> {
        true_runs(mask, params.min_length)
            .map(|run| Segment::new(air.index[run.start..run.end()].to_vec()))
            .collect()
    };
    let profiles = Profiles {
        ascending: segments(&ascending_mask),
        descending: segments(&descending_mask),
    };

    tracing::debug!(
        airborne = air.index.len(),
        ascending = profiles.ascending.len(),
        descending = profiles.descending.len(),
        "Profile detection complete"
    );
    Ok(profiles)
}
