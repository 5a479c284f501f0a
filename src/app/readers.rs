// faamcat - app/readers.rs
//
// The file readers this build offers, one per file family.

use crate::app::analysis::open_summary;
use crate::core::data_model::{DataModel, ModelLoaders, TimeSeriesLoader};
use crate::core::model::{Frequency, ModelKind};
use crate::core::series::TimeSeries;
use crate::util::error::SeriesError;
use std::path::Path;

/// Flight-summary files as a table of event start columns.
///
/// Rows sit at event start times, so only a full-rate request makes sense;
/// a fixed rate re-grids them like any other table.
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryLoader;

impl TimeSeriesLoader for SummaryLoader {
    fn load(
        &self,
        path: &Path,
        channels: &[&str],
        frequency: Frequency,
    ) -> Result<TimeSeries, SeriesError> {
        let model = open_summary(path).map_err(|e| SeriesError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let table = model.table(channels)?;
        match frequency.hz() {
            Some(hz) => table.resample(hz),
            None => Ok(table),
        }
    }
}

/// Every reader compiled into this build.
///
/// The netCDF families need the `netcdf` feature; without it only flight
/// summaries are readable and the rest report `NoLoader`.
pub fn native_loaders() -> ModelLoaders {
    let mut loaders = ModelLoaders::new();
    loaders.register(ModelKind::TabularSummary, SummaryLoader);

    #[cfg(feature = "netcdf")]
    for kind in [ModelKind::FlatVariable, ModelKind::HierarchicalGroup] {
        loaders.register(kind, crate::app::ncfile::NetcdfLoader::new(kind));
    }

    tracing::debug!(
        netcdf = cfg!(feature = "netcdf"),
        "Readers registered"
    );
    loaders
}
