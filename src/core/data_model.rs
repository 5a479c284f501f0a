// faamcat - core/data_model.rs
//
// Reader-side abstractions: what a loaded data file can answer, and the
// boundary through which time series are loaded for a resolved path.

use crate::core::model::{Frequency, ModelKind};
use crate::core::series::TimeSeries;
use crate::core::summary::FlightSummary;
use crate::util::error::SeriesError;
use chrono::NaiveDateTime;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Capabilities shared by every file family once it is opened.
pub trait DataModel {
    /// The family this model reads.
    fn kind(&self) -> ModelKind;

    /// The file's primary time index.
    fn time(&self) -> Vec<NaiveDateTime>;

    /// Named variables, sorted.
    fn variables(&self) -> Vec<String>;

    /// The named channels against the time index.
    fn table(&self, channels: &[&str]) -> Result<TimeSeries, SeriesError>;

    /// Global attributes as text.
    fn attributes(&self) -> BTreeMap<String, String>;

    /// Variables whose names match `pattern`.
    fn find(&self, pattern: &Regex) -> Vec<String> {
        self.variables()
            .into_iter()
            .filter(|name| pattern.is_match(name))
            .collect()
    }
}

/// A loaded flat-variable file is already a table.
impl DataModel for TimeSeries {
    fn kind(&self) -> ModelKind {
        ModelKind::FlatVariable
    }

    fn time(&self) -> Vec<NaiveDateTime> {
        self.index().to_vec()
    }

    fn variables(&self) -> Vec<String> {
        self.channel_names().map(str::to_string).collect()
    }

    fn table(&self, channels: &[&str]) -> Result<TimeSeries, SeriesError> {
        self.select(channels)
    }

    fn attributes(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }
}

/// Numeric columns a flight summary exposes as channels.
const SUMMARY_CHANNELS: [&str; 8] = [
    "start_hdg",
    "start_height",
    "start_lat",
    "start_lon",
    "stop_hdg",
    "stop_height",
    "stop_lat",
    "stop_lon",
];

/// Tabular-summary family: one row per event, indexed by start time.
#[derive(Debug, Clone)]
pub struct FlightSummaryModel {
    path: PathBuf,
    summary: FlightSummary,
}

impl FlightSummaryModel {
    pub fn new(path: impl Into<PathBuf>, summary: FlightSummary) -> Self {
        Self {
            path: path.into(),
            summary,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn summary(&self) -> &FlightSummary {
        &self.summary
    }

    pub fn into_summary(self) -> FlightSummary {
        self.summary
    }
}

impl DataModel for FlightSummaryModel {
    fn kind(&self) -> ModelKind {
        ModelKind::TabularSummary
    }

    fn time(&self) -> Vec<NaiveDateTime> {
        self.summary.events().iter().map(|e| e.start_time).collect()
    }

    fn variables(&self) -> Vec<String> {
        let mut names: Vec<String> = SUMMARY_CHANNELS.iter().map(|s| s.to_string()).collect();
        names.sort();
        names
    }

    /// Fails with `UnsortedIndex` when two events share a start time.
    fn table(&self, channels: &[&str]) -> Result<TimeSeries, SeriesError> {
        let mut table = TimeSeries::new(self.time())?;
        for name in channels {
            let values = self
                .summary
                .events()
                .iter()
                .map(|e| {
                    let cell = match *name {
                        "start_hdg" => e.start_hdg,
                        "start_height" => e.start_height,
                        "start_lat" => e.start_lat,
                        "start_lon" => e.start_lon,
                        "stop_hdg" => e.stop_hdg,
                        "stop_height" => e.stop_height,
                        "stop_lat" => e.stop_lat,
                        "stop_lon" => e.stop_lon,
                        _ => {
                            return Err(SeriesError::MissingChannel {
                                channel: (*name).to_string(),
                            })
                        }
                    };
                    Ok(cell.unwrap_or(f64::NAN))
                })
                .collect::<Result<Vec<_>, _>>()?;
            table.insert_channel(*name, values)?;
        }
        Ok(table)
    }

    fn attributes(&self) -> BTreeMap<String, String> {
        let mut attrs = BTreeMap::new();
        attrs.insert("path".to_string(), self.path.display().to_string());
        attrs.insert("events".to_string(), self.summary.len().to_string());
        attrs
    }
}

/// Loads the named channels of a data file as a time series.
///
/// Native readers for the netCDF families plug in here, one per family in
/// `ModelLoaders`.
pub trait TimeSeriesLoader {
    fn load(
        &self,
        path: &Path,
        channels: &[&str],
        frequency: Frequency,
    ) -> Result<TimeSeries, SeriesError>;
}

/// Path-keyed tables held in memory.
///
/// A fixed-rate request re-grids the stored table to that rate; a full-rate
/// request returns it unchanged.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    tables: HashMap<PathBuf, TimeSeries>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, table: TimeSeries) {
        self.tables.insert(path.into(), table);
    }

    pub fn with(mut self, path: impl Into<PathBuf>, table: TimeSeries) -> Self {
        self.insert(path, table);
        self
    }
}

impl TimeSeriesLoader for MemoryLoader {
    fn load(
        &self,
        path: &Path,
        channels: &[&str],
        frequency: Frequency,
    ) -> Result<TimeSeries, SeriesError> {
        let table = self.tables.get(path).ok_or_else(|| SeriesError::NotLoaded {
            path: path.to_path_buf(),
        })?;
        let selected = table.select(channels)?;
        match frequency.hz() {
            Some(hz) => selected.resample(hz),
            None => Ok(selected),
        }
    }
}

/// One loader per file family, chosen by a product's `model`.
#[derive(Default)]
pub struct ModelLoaders {
    loaders: HashMap<ModelKind, Box<dyn TimeSeriesLoader>>,
}

impl ModelLoaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `kind` with `loader`, replacing any earlier registration.
    pub fn register(&mut self, kind: ModelKind, loader: impl TimeSeriesLoader + 'static) {
        self.loaders.insert(kind, Box::new(loader));
    }

    pub fn with(mut self, kind: ModelKind, loader: impl TimeSeriesLoader + 'static) -> Self {
        self.register(kind, loader);
        self
    }

    pub fn get(&self, kind: ModelKind) -> Option<&dyn TimeSeriesLoader> {
        self.loaders.get(&kind).map(|l| l.as_ref())
    }

    pub fn supports(&self, kind: ModelKind) -> bool {
        self.loaders.contains_key(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }
}
