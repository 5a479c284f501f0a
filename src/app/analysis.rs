// faamcat - app/analysis.rs
//
// Flight analysis: resolve a flight's product to one file, load the
// channels a detector needs with the reader for the product's file family,
// run the detector. Also reads the resolved flight-summary file.

use crate::core::data_model::{FlightSummaryModel, ModelLoaders};
use crate::core::detect::{
    detect_level_runs, detect_profiles, ChannelNames, LevelRunParams, ProfileParams, Profiles,
    Segment,
};
use crate::core::flight::Flight;
use crate::core::model::Frequency;
use crate::core::product::ProductRegistry;
use crate::core::series::TimeSeries;
use crate::core::summary::FlightSummary;
use crate::util::constants::{CORE_HOOK, FLIGHT_SUMMARY_HOOK};
use crate::util::error::{ResolveError, Result, SeriesError, SummaryError};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Detector runs against one product of one flight.
///
/// The product's `model` picks the loader from `loaders`.
pub struct FlightAnalysis<'a> {
    flight: &'a Flight,
    registry: &'a ProductRegistry,
    loaders: &'a ModelLoaders,
    hook: String,
    channels: ChannelNames,
}

impl<'a> FlightAnalysis<'a> {
    /// Analysis of the primary instrument product with default channel names.
    pub fn new(flight: &'a Flight, registry: &'a ProductRegistry, loaders: &'a ModelLoaders) -> Self {
        Self {
            flight,
            registry,
            loaders,
            hook: CORE_HOOK.to_string(),
            channels: ChannelNames::default(),
        }
    }

    pub fn with_hook(mut self, hook: impl Into<String>) -> Self {
        self.hook = hook.into();
        self
    }

    pub fn with_channels(mut self, channels: ChannelNames) -> Self {
        self.channels = channels;
        self
    }

    /// Path of the file the current pins resolve to.
    pub fn resolved_path(&self) -> Result<PathBuf> {
        let fileset = self.flight.accessor(&self.hook)?;
        Ok(fileset.resolve()?.path().to_path_buf())
    }

    /// Load `names` from the resolved file at the pinned rate.
    fn load(&self, names: &[&str]) -> Result<(TimeSeries, Frequency)> {
        let fileset = self.flight.accessor(&self.hook)?;
        let resolution = fileset.resolve()?;
        let frequency = fileset
            .frequency()
            .unwrap_or_else(|| resolution.record.frequency());

        let model = self
            .registry
            .get(&self.hook)
            .ok_or_else(|| ResolveError::UnknownAccessor {
                flight: self.flight.flight_number().to_string(),
                hook: self.hook.clone(),
            })?
            .model;
        let loader = self.loaders.get(model).ok_or_else(|| SeriesError::NoLoader {
            hook: self.hook.clone(),
            model,
        })?;

        tracing::debug!(
            flight = %self.flight.flight_number(),
            hook = %self.hook,
            %model,
            file = %resolution.path().display(),
            %frequency,
            channels = ?names,
            "Loading channels"
        );
        let table = loader.load(resolution.path(), names, frequency)?;
        Ok((table, frequency))
    }

    /// Steady level runs over ground flag, static pressure and roll.
    pub fn level_runs(&self, params: &LevelRunParams) -> Result<Vec<Segment>> {
        let names = [
            self.channels.ground.as_str(),
            self.channels.pressure.as_str(),
            self.channels.roll.as_str(),
        ];
        let (table, _) = self.load(&names)?;
        let runs = detect_level_runs(&table, &self.channels, params)?;
        tracing::info!(flight = %self.flight.flight_number(), runs = runs.len(), "Level runs found");
        Ok(runs)
    }

    /// Ascending and descending profiles over ground flag and static pressure.
    pub fn profiles(&self, params: &ProfileParams) -> Result<Profiles> {
        let names = [self.channels.ground.as_str(), self.channels.pressure.as_str()];
        let (table, frequency) = self.load(&names)?;
        if frequency != Frequency::Hz(1) {
            tracing::warn!(
                flight = %self.flight.flight_number(),
                %frequency,
                "Profile detection is tuned for 1 Hz data"
            );
        }
        let profiles = detect_profiles(&table, &self.channels, params)?;
        tracing::info!(
            flight = %self.flight.flight_number(),
            ascending = profiles.ascending.len(),
            descending = profiles.descending.len(),
            "Profiles found"
        );
        Ok(profiles)
    }
}

/// Flight-summary access for a catalogued flight.
pub trait FlightSummaryExt {
    /// Read the flight-summary file the summary pins resolve to.
    fn summary(&self) -> Result<FlightSummary>;
}

impl FlightSummaryExt for Flight {
    fn summary(&self) -> Result<FlightSummary> {
        let resolution = self.accessor(FLIGHT_SUMMARY_HOOK)?.resolve()?;
        Ok(open_summary(resolution.path())?.into_summary())
    }
}

/// Open a flight-summary file by extension.
///
/// Only the CSV format is readable; `.txt` summaries are recognised but
/// rejected with `UnsupportedFormat`.
pub fn open_summary(path: &Path) -> std::result::Result<FlightSummaryModel, SummaryError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    if extension != "csv" {
        return Err(SummaryError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension,
        });
    }

    let file = File::open(path).map_err(|source| SummaryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let summary = FlightSummary::from_csv(BufReader::new(file), path)?;
    Ok(FlightSummaryModel::new(path, summary))
}
