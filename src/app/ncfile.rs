// faamcat - app/ncfile.rs
//
// netCDF readers for the flat-variable and hierarchical-group families.
// Compiled with the `netcdf` feature; links the system libnetcdf.
//
// Flat files carry one `Time` coordinate and variables shaped either
// (time) or (time, samples-per-second). Hierarchical files carry one group
// per instrument, each with its own time coordinate; their channels are
// named `group/variable`.

use crate::core::cf::{self, RawVariable};
use crate::core::data_model::{DataModel, TimeSeriesLoader};
use crate::core::model::{Frequency, ModelKind};
use crate::core::series::TimeSeries;
use crate::util::constants::FLAT_TIME_VARIABLE;
use crate::util::error::SeriesError;
use chrono::NaiveDateTime;
use netcdf::AttributeValue;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

fn read_error(path: &Path, e: impl std::fmt::Display) -> SeriesError {
    SeriesError::Read {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

fn attribute_text(value: AttributeValue) -> String {
    match value {
        AttributeValue::Str(s) => s,
        AttributeValue::Double(v) => v.to_string(),
        AttributeValue::Float(v) => v.to_string(),
        AttributeValue::Int(v) => v.to_string(),
        AttributeValue::Short(v) => v.to_string(),
        other => format!("{other:?}"),
    }
}

fn fill_value(var: &netcdf::Variable<'_>) -> Option<f64> {
    match var.attribute("_FillValue")?.value().ok()? {
        AttributeValue::Double(v) => Some(v),
        AttributeValue::Float(v) => Some(f64::from(v)),
        AttributeValue::Int(v) => Some(f64::from(v)),
        AttributeValue::Short(v) => Some(f64::from(v)),
        AttributeValue::Schar(v) => Some(f64::from(v)),
        AttributeValue::Uchar(v) => Some(f64::from(v)),
        _ => None,
    }
}

fn read_values(path: &Path, var: &netcdf::Variable<'_>) -> Result<Vec<f64>, SeriesError> {
    let mut values = var
        .get_values::<f64, _>(..)
        .map_err(|e| read_error(path, e))?;
    if let Some(fill) = fill_value(var) {
        cf::mask_fill(&mut values, fill);
    }
    Ok(values)
}

fn read_time(path: &Path, var: &netcdf::Variable<'_>) -> Result<Vec<NaiveDateTime>, SeriesError> {
    let units = match var.attribute("units").and_then(|a| a.value().ok()) {
        Some(AttributeValue::Str(units)) => units,
        _ => {
            return Err(SeriesError::TimeUnits {
                units: String::new(),
            })
        }
    };
    let epoch = cf::parse_time_units(&units)?;
    cf::decode_times(epoch, &read_values(path, var)?)
}

/// An opened netCDF data file. Metadata is read on open; channel data is
/// read per `table` call.
#[derive(Debug, Clone)]
pub struct NetcdfModel {
    path: PathBuf,
    kind: ModelKind,
    time: Vec<NaiveDateTime>,
    variables: Vec<String>,
    attributes: BTreeMap<String, String>,
}

impl NetcdfModel {
    /// Open `path` as a file of family `kind`. The tabular family is not
    /// netCDF and is read as flat.
    pub fn open(path: &Path, kind: ModelKind) -> Result<Self, SeriesError> {
        let file = netcdf::open(path).map_err(|e| read_error(path, e))?;

        let attributes = file
            .attributes()
            .filter_map(|a| Some((a.name().to_string(), attribute_text(a.value().ok()?))))
            .collect();

        let (time, mut variables) = match kind {
            ModelKind::HierarchicalGroup => {
                let mut time = Vec::new();
                let mut variables = Vec::new();
                for group in file.groups().map_err(|e| read_error(path, e))? {
                    let group_name = group.name();
                    let names: Vec<String> = group.variables().map(|v| v.name()).collect();
                    if let Some(var) = cf::time_coordinate(&names).and_then(|t| group.variable(t)) {
                        time.extend(read_time(path, &var)?);
                    }
                    variables.extend(names.iter().map(|n| format!("{group_name}/{n}")));
                }
                time.sort();
                time.dedup();
                (time, variables)
            }
            ModelKind::FlatVariable | ModelKind::TabularSummary => {
                let var = file
                    .variable(FLAT_TIME_VARIABLE)
                    .ok_or_else(|| SeriesError::MissingChannel {
                        channel: FLAT_TIME_VARIABLE.to_string(),
                    })?;
                let time = read_time(path, &var)?;
                let variables = file.variables().map(|v| v.name()).collect();
                (time, variables)
            }
        };
        variables.sort();

        tracing::debug!(
            file = %path.display(),
            model = %kind,
            samples = time.len(),
            variables = variables.len(),
            "netCDF file opened"
        );
        Ok(Self {
            path: path.to_path_buf(),
            kind,
            time,
            variables,
            attributes,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flat_table(&self, file: &netcdf::File, channels: &[&str]) -> Result<TimeSeries, SeriesError> {
        let start = *self
            .time
            .first()
            .ok_or_else(|| read_error(&self.path, "empty time axis"))?;

        let mut variables = Vec::with_capacity(channels.len());
        for name in channels {
            let var = file
                .variable(name)
                .ok_or_else(|| SeriesError::MissingChannel {
                    channel: (*name).to_string(),
                })?;
            let samples_per_second = var.dimensions().get(1).map_or(1, |d| d.len());
            variables.push(RawVariable {
                name: (*name).to_string(),
                samples_per_second,
                values: read_values(&self.path, &var)?,
            });
        }
        cf::flat_table(start, self.time.len(), variables)
    }

    fn group_table(&self, file: &netcdf::File, channels: &[&str]) -> Result<TimeSeries, SeriesError> {
        let mut joined: Option<TimeSeries> = None;

        for (group_name, names) in cf::group_channels(channels)? {
            let missing = |name: &str| SeriesError::MissingChannel {
                channel: format!("{group_name}/{name}"),
            };
            let group = file
                .group(group_name)
                .map_err(|e| read_error(&self.path, e))?
                .ok_or_else(|| missing(names.first().copied().unwrap_or_default()))?;

            let var_names: Vec<String> = group.variables().map(|v| v.name()).collect();
            let time_var = cf::time_coordinate(&var_names)
                .and_then(|t| group.variable(t))
                .ok_or_else(|| missing("time"))?;
            let mut table = TimeSeries::new(read_time(&self.path, &time_var)?)?;

            for name in names {
                let var = group.variable(name).ok_or_else(|| missing(name))?;
                table.insert_channel(format!("{group_name}/{name}"), read_values(&self.path, &var)?)?;
            }

            joined = Some(match joined {
                Some(j) => j.outer_join(&table),
                None => table,
            });
        }
        Ok(joined.unwrap_or_default())
    }
}

impl DataModel for NetcdfModel {
    fn kind(&self) -> ModelKind {
        self.kind
    }

    fn time(&self) -> Vec<NaiveDateTime> {
        self.time.clone()
    }

    fn variables(&self) -> Vec<String> {
        self.variables.clone()
    }

    fn table(&self, channels: &[&str]) -> Result<TimeSeries, SeriesError> {
        let file = netcdf::open(&self.path).map_err(|e| read_error(&self.path, e))?;
        match self.kind {
            ModelKind::HierarchicalGroup => self.group_table(&file, channels),
            ModelKind::FlatVariable | ModelKind::TabularSummary => self.flat_table(&file, channels),
        }
    }

    fn attributes(&self) -> BTreeMap<String, String> {
        self.attributes.clone()
    }
}

/// Loads channels from netCDF files of one family.
#[derive(Debug, Clone, Copy)]
pub struct NetcdfLoader {
    kind: ModelKind,
}

impl NetcdfLoader {
    pub fn new(kind: ModelKind) -> Self {
        Self { kind }
    }
}

impl TimeSeriesLoader for NetcdfLoader {
    fn load(
        &self,
        path: &Path,
        channels: &[&str],
        frequency: Frequency,
    ) -> Result<TimeSeries, SeriesError> {
        let table = NetcdfModel::open(path, self.kind)?.table(channels)?;
        match frequency.hz() {
            Some(hz) => table.resample(hz),
            None => Ok(table),
        }
    }
}
