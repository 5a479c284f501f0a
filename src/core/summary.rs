// faamcat - core/summary.rs
//
// Flight-summary event model: the per-flight log of runs, profiles and
// instantaneous events, with time and name lookups.
//
// Parsing takes any `Read`; opening the file is the caller's business.

use crate::util::constants::{DEFAULT_EVENT_TOLERANCE_SECS, SUMMARY_TIME_FORMAT};
use crate::util::error::SummaryError;
use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use std::io::Read;
use std::path::Path;

/// One row of a flight summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub event: String,
    pub start_time: NaiveDateTime,
    pub start_hdg: Option<f64>,
    pub start_height: Option<f64>,
    pub start_lat: Option<f64>,
    pub start_lon: Option<f64>,
    /// Absent for instantaneous events.
    pub stop_time: Option<NaiveDateTime>,
    pub stop_hdg: Option<f64>,
    pub stop_height: Option<f64>,
    pub stop_lat: Option<f64>,
    pub stop_lon: Option<f64>,
    pub comment: Option<String>,
}

impl Event {
    pub fn is_instantaneous(&self) -> bool {
        self.stop_time.is_none()
    }

    /// Whether the event is current at `time`, widened by `tolerance` on
    /// both sides. Bounds are inclusive.
    pub fn covers(&self, time: NaiveDateTime, tolerance: Duration) -> bool {
        match self.stop_time {
            None => (self.start_time - time).abs() <= tolerance,
            Some(stop) => self.start_time - tolerance <= time && time <= stop + tolerance,
        }
    }
}

/// All events of one flight, ordered by start time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlightSummary {
    events: Vec<Event>,
}

impl FlightSummary {
    /// Build from events in any order. Sorting is stable, so events that
    /// start together keep their file order.
    pub fn new(mut events: Vec<Event>) -> Self {
        events.sort_by_key(|e| e.start_time);
        Self { events }
    }

    /// Parse the CSV summary format. `path` is only used in error messages.
    ///
    /// The first row is a header and is skipped. Columns are positional;
    /// short rows leave the trailing fields absent.
    pub fn from_csv<R: Read>(reader: R, path: &Path) -> Result<Self, SummaryError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut events = Vec::new();
        for row in csv_reader.records() {
            let row = row.map_err(|source| SummaryError::Csv {
                path: path.to_path_buf(),
                source,
            })?;
            let line = row.position().map_or(0, csv::Position::line);
            let cells = Cells { row: &row, path, line };

            let start_time = cells
                .time(1, "start_time")?
                .ok_or_else(|| SummaryError::MissingStartTime {
                    path: path.to_path_buf(),
                    line,
                })?;

            events.push(Event {
                event: cells.text(0).unwrap_or_default(),
                start_time,
                start_hdg: cells.number(2, "start_hdg")?,
                start_height: cells.number(3, "start_height")?,
                start_lat: cells.number(4, "start_lat")?,
                start_lon: cells.number(5, "start_lon")?,
                stop_time: cells.time(6, "stop_time")?,
                stop_hdg: cells.number(7, "stop_hdg")?,
                stop_height: cells.number(8, "stop_height")?,
                stop_lat: cells.number(9, "stop_lat")?,
                stop_lon: cells.number(10, "stop_lon")?,
                comment: cells.text(11),
            });
        }

        tracing::debug!(path = %path.display(), events = events.len(), "Parsed flight summary");
        Ok(Self::new(events))
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events current at `time` within `tolerance`. A generous tolerance can
    /// return adjacent runs together.
    pub fn at(&self, time: NaiveDateTime, tolerance: Duration) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.covers(time, tolerance))
            .collect()
    }

    /// `at` with the default 60 s tolerance.
    pub fn near(&self, time: NaiveDateTime) -> Vec<&Event> {
        self.at(time, Duration::seconds(DEFAULT_EVENT_TOLERANCE_SECS))
    }

    /// First event whose name matches exactly, ignoring case.
    pub fn by_name(&self, name: &str) -> Result<&Event, SummaryError> {
        let wanted = name.to_lowercase();
        self.events
            .iter()
            .find(|e| e.event.to_lowercase() == wanted)
            .ok_or_else(|| SummaryError::EventNotFound {
                name: name.to_string(),
            })
    }

    /// Start and (for extended events) stop time of the named event.
    pub fn event_window(
        &self,
        name: &str,
    ) -> Result<(NaiveDateTime, Option<NaiveDateTime>), SummaryError> {
        self.by_name(name).map(|e| (e.start_time, e.stop_time))
    }
}

struct Cells<'a> {
    row: &'a csv::StringRecord,
    path: &'a Path,
    line: u64,
}

impl Cells<'_> {
    fn raw(&self, column: usize) -> Option<&str> {
        self.row.get(column).filter(|s| !s.is_empty())
    }

    fn text(&self, column: usize) -> Option<String> {
        self.raw(column).map(str::to_string)
    }

    fn time(&self, column: usize, field: &'static str) -> Result<Option<NaiveDateTime>, SummaryError> {
        self.raw(column)
            .map(|raw| {
                NaiveDateTime::parse_from_str(raw, SUMMARY_TIME_FORMAT).map_err(|_| {
                    SummaryError::InvalidTime {
                        path: self.path.to_path_buf(),
                        line: self.line,
                        field,
                        raw: raw.to_string(),
                    }
                })
            })
            .transpose()
    }

    fn number(&self, column: usize, field: &'static str) -> Result<Option<f64>, SummaryError> {
        self.raw(column)
            .map(|raw| {
                raw.parse::<f64>().map_err(|_| SummaryError::InvalidNumber {
                    path: self.path.to_path_buf(),
                    line: self.line,
                    field,
                    raw: raw.to_string(),
                })
            })
            .transpose()
    }
}
