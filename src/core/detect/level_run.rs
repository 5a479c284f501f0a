// faamcat - core/detect/level_run.rs
//
// Steady-level-run detection: airborne stretches where static pressure is
// nearly constant and the aircraft holds its wings level.

use super::runs::{chunk_run, true_runs};
use super::window::{centred_range, centred_std, trailing_mean};
use super::{check_output_frequency, Airborne, ChannelNames, Segment};
use crate::core::series::TimeSeries;
use crate::util::constants::{
    DEFAULT_OUTPUT_FREQUENCY, DEFAULT_PRESSURE_STD_LIMIT, DEFAULT_ROLL_LIMIT,
    DEFAULT_ROLL_SMOOTHING_WINDOW, DEFAULT_SLR_MIN_LENGTH, MAX_DETECTOR_WINDOW,
};
use crate::util::error::DetectError;
use serde::{Deserialize, Serialize};

/// Tuning for [`detect_level_runs`]. Lengths are in 1 Hz samples (seconds).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelRunParams {
    /// Shortest run reported; also the width of the rolling windows.
    pub min_length: usize,
    /// When set, longer runs are cut into chunks of exactly this length.
    pub max_length: Option<usize>,
    /// Largest allowed roll excursion (degrees) across a window.
    pub roll_limit: f64,
    /// Largest allowed standard deviation of static pressure across a window.
    pub pressure_std_limit: f64,
    /// Trailing mean applied to roll before the excursion check.
    pub roll_smoothing_window: usize,
    /// Rate of the emitted segment index.
    pub output_frequency: u32,
}

impl Default for LevelRunParams {
    fn default() -> Self {
        Self {
            min_length: DEFAULT_SLR_MIN_LENGTH,
            max_length: None,
            roll_limit: DEFAULT_ROLL_LIMIT,
            pressure_std_limit: DEFAULT_PRESSURE_STD_LIMIT,
            roll_smoothing_window: DEFAULT_ROLL_SMOOTHING_WINDOW,
            output_frequency: DEFAULT_OUTPUT_FREQUENCY,
        }
    }
}

impl LevelRunParams {
    pub fn validate(&self) -> Result<(), DetectError> {
        window_in_range("min_length", self.min_length)?;
        window_in_range("roll_smoothing_window", self.roll_smoothing_window)?;
        if let Some(max) = self.max_length {
            if max < self.min_length {
                return Err(DetectError::InvalidParameter {
                    parameter: "max_length",
                    reason: format!(
                        "max_length ({max}) is shorter than min_length ({})",
                        self.min_length
                    ),
                });
            }
        }
        limit_in_range("roll_limit", self.roll_limit)?;
        limit_in_range("pressure_std_limit", self.pressure_std_limit)?;
        check_output_frequency(self.output_frequency)
    }
}

pub(super) fn window_in_range(parameter: &'static str, value: usize) -> Result<(), DetectError> {
    if value == 0 || value > MAX_DETECTOR_WINDOW {
        return Err(DetectError::InvalidParameter {
            parameter,
            reason: format!("must be between 1 and {MAX_DETECTOR_WINDOW}, got {value}"),
        });
    }
    Ok(())
}

fn limit_in_range(parameter: &'static str, value: f64) -> Result<(), DetectError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(DetectError::InvalidParameter {
            parameter,
            reason: format!("must be a positive number, got {value}"),
        });
    }
    Ok(())
}

/// Find steady level runs in `table`.
///
/// The table is brought onto a 1 Hz grid first. Ground rows and rows missing
/// any of the three channels are dropped, then each remaining position is
/// steady when the centred pressure standard deviation and the centred range
/// of smoothed roll (both over `min_length` samples) are under their limits.
/// Steady stretches of at least `min_length` samples become segments, cut by
/// `max_length` when set.
pub fn detect_level_runs(
    table: &TimeSeries,
    channels: &ChannelNames,
    params: &LevelRunParams,
) -> Result<Vec<Segment>, DetectError> {
    params.validate()?;

    let grid = table.resample(1)?;
    let air = Airborne::extract(
        &grid,
        &channels.ground,
        &[channels.pressure.as_str(), channels.roll.as_str()],
    )?;
    let (pressure, roll) = (&air.columns[0], &air.columns[1]);

    let pressure_std = centred_std(pressure, params.min_length);
    let roll_smoothed = trailing_mean(roll, params.roll_smoothing_window);
    let roll_range = centred_range(&roll_smoothed, params.min_length);

    let steady: Vec<bool> = pressure_std
        .iter()
        .zip(&roll_range)
        .map(|(ps, rr)| *ps < params.pressure_std_limit && *rr < params.roll_limit)
        .collect();

    let mut segments = Vec::new();
    for run in true_runs(&steady, params.min_length) {
        for (offset, len) in chunk_run(run.len, params.min_length, params.max_length) {
            let start = run.start + offset;
            segments.push(Segment::upsampled(
                &air.index[start..start + len],
                params.output_frequency,
            )?);
        }
    }

    tracing::debug!(
        airborne = air.index.len(),
        segments = segments.len(),
        min_length = params.min_length,
        "Steady level run detection complete"
    );
    Ok(segments)
}
