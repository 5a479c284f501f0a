// faamcat - core/flight.rs
//
// A single logical flight: one FileSet per product hook seen for it.

use crate::core::fileset::FileSet;
use crate::core::model::FileRecord;
use crate::util::error::ResolveError;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// One flight and its per-product file sets.
#[derive(Debug, Clone)]
pub struct Flight {
    flight_number: String,
    date: NaiveDate,
    accessors: BTreeMap<String, FileSet>,
}

impl Flight {
    /// A flight with no accessors. The number is stored lower-cased; flight
    /// numbers are case-insensitive keys.
    pub fn new(flight_number: &str, date: NaiveDate) -> Self {
        Self {
            flight_number: flight_number.to_lowercase(),
            date,
            accessors: BTreeMap::new(),
        }
    }

    pub fn flight_number(&self) -> &str {
        &self.flight_number
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Hooks with at least one file, sorted.
    pub fn hooks(&self) -> impl Iterator<Item = &str> {
        self.accessors.keys().map(String::as_str)
    }

    pub fn has_accessor(&self, hook: &str) -> bool {
        self.accessors.contains_key(hook)
    }

    /// The FileSet for `hook`, or `UnknownAccessor`.
    pub fn accessor(&self, hook: &str) -> Result<&FileSet, ResolveError> {
        self.accessors
            .get(hook)
            .ok_or_else(|| self.unknown_accessor(hook))
    }

    pub fn accessor_mut(&mut self, hook: &str) -> Result<&mut FileSet, ResolveError> {
        let flight = &self.flight_number;
        self.accessors
            .get_mut(hook)
            .ok_or_else(|| ResolveError::UnknownAccessor {
                flight: flight.clone(),
                hook: hook.to_string(),
            })
    }

    /// Route a record into the FileSet for `hook`, creating it on first use.
    pub fn add_file(&mut self, hook: &str, record: FileRecord) -> bool {
        self.accessors
            .entry(hook.to_string())
            .or_insert_with(|| {
                tracing::debug!(flight = %self.flight_number, hook, "New accessor");
                FileSet::new(hook)
            })
            .add_file(record)
    }

    fn unknown_accessor(&self, hook: &str) -> ResolveError {
        ResolveError::UnknownAccessor {
            flight: self.flight_number.clone(),
            hook: hook.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::Frequency;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, 30).unwrap()
    }

    #[test]
    fn test_flight_number_is_lowercased() {
        let flight = Flight::new("C224", date());
        assert_eq!(flight.flight_number(), "c224");
    }

    #[test]
    fn test_one_fileset_per_hook() {
        let mut flight = Flight::new("c224", date());
        flight.add_file("core", FileRecord::new("a.nc", Some(5), Some(0), Frequency::Full, None));
        flight.add_file("core", FileRecord::new("b.nc", Some(5), Some(1), Frequency::Full, None));
        flight.add_file("ccp", FileRecord::new("c.nc", Some(501), Some(0), Frequency::Full, None));

        assert_eq!(flight.hooks().collect::<Vec<_>>(), vec!["ccp", "core"]);
        assert_eq!(flight.accessor("core").unwrap().len(), 2);
        assert_eq!(flight.accessor("ccp").unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_hook_is_typed_error() {
        let mut flight = Flight::new("c224", date());
        flight.add_file("core", FileRecord::new("a.nc", Some(5), Some(0), Frequency::Full, None));

        let err = flight.accessor("ccpCAS").unwrap_err();
        assert_eq!(
            err,
            ResolveError::UnknownAccessor {
                flight: "c224".to_string(),
                hook: "ccpCAS".to_string()
            }
        );
        assert!(err.to_string().contains("not an accessor"));
        assert!(flight.accessor_mut("ccpCAS").is_err());
    }

    #[test]
    fn test_accessor_mut_pins_persist() {
        let mut flight = Flight::new("c224", date());
        flight.add_file("core", FileRecord::new("a.nc", Some(4), Some(0), Frequency::Full, None));
        flight.add_file("core", FileRecord::new("b.nc", Some(5), Some(0), Frequency::Full, None));

        flight.accessor_mut("core").unwrap().set_version(Some(4)).unwrap();
        assert_eq!(flight.accessor("core").unwrap().version(), Some(4));
    }
}
