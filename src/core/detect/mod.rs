// faamcat - core/detect/mod.rs
//
// Flight-segment detectors over a time-indexed table.
// Pure computation: the caller loads the data and passes a TimeSeries in.

pub mod level_run;
pub mod runs;
pub mod vertical;
pub mod window;

use crate::core::series::{step_for, TimeSeries};
use crate::util::constants::{
    DEFAULT_GROUND_CHANNEL, DEFAULT_PRESSURE_CHANNEL, DEFAULT_ROLL_CHANNEL, MAX_OUTPUT_FREQUENCY,
};
use crate::util::error::DetectError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub use level_run::{detect_level_runs, LevelRunParams};
pub use vertical::{detect_profiles, ProfileParams, Profiles};

/// Channel names the detectors read from the input table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelNames {
    /// Weight-on-wheels style flag, non-zero while on the ground.
    pub ground: String,
    /// Static pressure.
    pub pressure: String,
    /// Roll angle.
    pub roll: String,
}

impl Default for ChannelNames {
    fn default() -> Self {
        Self {
            ground: DEFAULT_GROUND_CHANNEL.to_string(),
            pressure: DEFAULT_PRESSURE_CHANNEL.to_string(),
            roll: DEFAULT_ROLL_CHANNEL.to_string(),
        }
    }
}

/// A detected interval, expressed as the timestamps it covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    index: Vec<NaiveDateTime>,
}

impl Segment {
    pub fn new(index: Vec<NaiveDateTime>) -> Self {
        Self { index }
    }

    /// Expand 1 Hz timestamps to `hz` by filling each second with `hz`
    /// evenly spaced samples. Gaps between seconds stay gaps.
    fn upsampled(seconds: &[NaiveDateTime], hz: u32) -> Result<Self, DetectError> {
        if hz == 1 {
            return Ok(Self::new(seconds.to_vec()));
        }
        let step = step_for(hz)?;
        let index = seconds
            .iter()
            .flat_map(|t| (0..hz).map(move |k| *t + step * k as i32))
            .collect();
        Ok(Self::new(index))
    }

    pub fn index(&self) -> &[NaiveDateTime] {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn start(&self) -> Option<NaiveDateTime> {
        self.index.first().copied()
    }

    pub fn end(&self) -> Option<NaiveDateTime> {
        self.index.last().copied()
    }
}

/// Airborne rows of a 1 Hz table: on-ground rows and rows with any missing
/// value in the requested channels are removed. `columns[k]` follows
/// `names[k]`; positions in the result are positions in the compressed
/// series, so rolling windows span across removed rows.
#[derive(Debug)]
struct Airborne {
    index: Vec<NaiveDateTime>,
    columns: Vec<Vec<f64>>,
}

impl Airborne {
    fn extract(table: &TimeSeries, ground: &str, names: &[&str]) -> Result<Self, DetectError> {
        let ground_values = table.channel(ground)?;
        let sources = names
            .iter()
            .map(|name| table.channel(name))
            .collect::<Result<Vec<_>, _>>()?;

        let mut index = Vec::new();
        let mut columns = vec![Vec::new(); names.len()];
        for (row, t) in table.index().iter().enumerate() {
            let g = ground_values[row];
            if !g.is_finite() || g != 0.0 {
                continue;
            }
            if sources.iter().any(|c| !c[row].is_finite()) {
                continue;
            }
            index.push(*t);
            for (column, source) in columns.iter_mut().zip(&sources) {
                column.push(source[row]);
            }
        }
        Ok(Self { index, columns })
    }
}

fn check_output_frequency(hz: u32) -> Result<(), DetectError> {
    if hz == 0 || hz > MAX_OUTPUT_FREQUENCY {
        return Err(DetectError::InvalidParameter {
            parameter: "output_frequency",
            reason: format!("must be between 1 and {MAX_OUTPUT_FREQUENCY} Hz, got {hz}"),
        });
    }
    Ok(())
}
