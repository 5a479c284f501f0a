// faamcat - app/catalog.rs
//
// Catalogue scan: walk the roots, classify every file name against the
// product registry and route matches into per-flight FileSets.
//
// Only file names are inspected; no data file is opened during a scan.
// Per-file and per-root problems are non-fatal and land in the ScanReport.

use crate::app::analysis::FlightAnalysis;
use crate::core::data_model::ModelLoaders;
use crate::core::discovery::{self, DiscoveryConfig};
use crate::core::flight::Flight;
use crate::core::product::{Classified, ProductRegistry};
use crate::util::constants;
use crate::util::error::{ClassificationError, ResolveError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// What a scan saw, for reporting. Nothing here is fatal.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Files reached by discovery.
    pub files_visited: usize,
    /// Files routed into a FileSet.
    pub files_classified: usize,
    /// Files matching no product pattern (silently skipped).
    pub unmatched: usize,
    /// Files that matched a pattern but could not be classified.
    pub errors: Vec<ClassificationError>,
    /// Discovery problems (missing roots, unreadable entries).
    pub warnings: Vec<String>,
}

/// Flights found under a set of roots, keyed by lower-cased flight number.
#[derive(Debug, Clone)]
pub struct Catalog {
    registry: ProductRegistry,
    flights: BTreeMap<String, Flight>,
}

impl Catalog {
    /// Scan `roots` in order. Each root may be a file or a directory.
    pub fn scan(
        registry: ProductRegistry,
        roots: &[PathBuf],
        config: &DiscoveryConfig,
    ) -> (Self, ScanReport) {
        let mut catalog = Self {
            registry,
            flights: BTreeMap::new(),
        };
        let mut report = ScanReport::default();

        for root in roots {
            let found = match discovery::discover_files(root, config) {
                Ok(found) => found,
                Err(e) => {
                    tracing::warn!(root = %root.display(), error = %e, "Scan root skipped");
                    report.warnings.push(e.to_string());
                    continue;
                }
            };
            report.warnings.extend(found.warnings);

            for path in &found.files {
                report.files_visited += 1;
                catalog.add_path(path, &mut report);
            }
        }
        report.warnings.truncate(constants::MAX_WARNINGS);

        tracing::info!(
            flights = catalog.flights.len(),
            visited = report.files_visited,
            classified = report.files_classified,
            unmatched = report.unmatched,
            errors = report.errors.len(),
            "Catalogue scan complete"
        );
        (catalog, report)
    }

    fn add_path(&mut self, path: &Path, report: &mut ScanReport) {
        let classified = match self.registry.classify(path) {
            None => {
                tracing::trace!(file = %path.display(), "No product matches");
                report.unmatched += 1;
                return;
            }
            Some(Err(e)) => {
                tracing::warn!(error = %e, "File skipped");
                report.errors.push(e);
                return;
            }
            Some(Ok(c)) => c,
        };

        if tracing::enabled!(tracing::Level::DEBUG) {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                let hooks = self.registry.matching_hooks(name);
                if hooks.len() > 1 {
                    tracing::debug!(file = name, ?hooks, chosen = %classified.hook, "Several products match");
                }
            }
        }

        let Classified {
            hook,
            flight_number,
            date,
            record,
        } = classified;

        let flight = self
            .flights
            .entry(flight_number.to_lowercase())
            .or_insert_with(|| {
                tracing::debug!(flight = %flight_number, %date, "New flight");
                Flight::new(&flight_number, date)
            });
        if flight.date() != date {
            tracing::warn!(
                flight = %flight.flight_number(),
                expected = %flight.date(),
                found = %date,
                file = %path.display(),
                "File date disagrees with flight date"
            );
        }

        if flight.add_file(&hook, record) {
            report.files_classified += 1;
        }
    }

    pub fn registry(&self) -> &ProductRegistry {
        &self.registry
    }

    /// Flights in flight-number order.
    pub fn flights(&self) -> impl Iterator<Item = &Flight> {
        self.flights.values()
    }

    pub fn len(&self) -> usize {
        self.flights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flights.is_empty()
    }

    /// Look up a flight by number, ignoring case.
    pub fn flight(&self, flight_number: &str) -> Result<&Flight, ResolveError> {
        self.flights
            .get(&flight_number.to_lowercase())
            .ok_or_else(|| ResolveError::UnknownFlight {
                flight: flight_number.to_string(),
            })
    }

    pub fn flight_mut(&mut self, flight_number: &str) -> Result<&mut Flight, ResolveError> {
        self.flights
            .get_mut(&flight_number.to_lowercase())
            .ok_or_else(|| ResolveError::UnknownFlight {
                flight: flight_number.to_string(),
            })
    }

    /// Detector access to one flight, reading files through `loaders` by
    /// each product's file family.
    pub fn analysis<'a>(
        &'a self,
        flight_number: &str,
        loaders: &'a ModelLoaders,
    ) -> Result<FlightAnalysis<'a>, ResolveError> {
        Ok(FlightAnalysis::new(
            self.flight(flight_number)?,
            &self.registry,
            loaders,
        ))
    }
}
