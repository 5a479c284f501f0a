// faamcat - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// Every subsystem owns one enum; `FaamError` wraps them all so callers at
// the application edge can use a single `Result` alias.

use crate::core::model::{Frequency, ModelKind};
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all faamcat operations.
#[derive(Debug)]
pub enum FaamError {
    /// Product definition loading or validation failed.
    Product(ProductError),

    /// Walking a scan root failed.
    Discovery(DiscoveryError),

    /// A file matched a product pattern but could not be classified.
    Classification(ClassificationError),

    /// A flight/product/file lookup failed.
    Resolve(ResolveError),

    /// Time-series table access or loading failed.
    Series(SeriesError),

    /// A detector was invoked with bad parameters or data.
    Detect(DetectError),

    /// Flight-summary reading or lookup failed.
    Summary(SummaryError),

    /// Configuration loading or validation failed.
    Config(ConfigError),
}

impl fmt::Display for FaamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Product(e) => write!(f, "Product error: {e}"),
            Self::Discovery(e) => write!(f, "Discovery error: {e}"),
            Self::Classification(e) => write!(f, "Classification error: {e}"),
            Self::Resolve(e) => write!(f, "Resolution error: {e}"),
            Self::Series(e) => write!(f, "Time-series error: {e}"),
            Self::Detect(e) => write!(f, "Detection error: {e}"),
            Self::Summary(e) => write!(f, "Flight summary error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
        }
    }
}

impl std::error::Error for FaamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Product(e) => Some(e),
            Self::Discovery(e) => Some(e),
            Self::Classification(e) => Some(e),
            Self::Resolve(e) => Some(e),
            Self::Series(e) => Some(e),
            Self::Detect(e) => Some(e),
            Self::Summary(e) => Some(e),
            Self::Config(e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Product errors
// ---------------------------------------------------------------------------

/// Errors related to product definition loading and validation.
#[derive(Debug)]
pub enum ProductError {
    /// TOML file could not be parsed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Product file exceeds the maximum allowed size.
    FileTooLarge {
        path: PathBuf,
        size: u64,
        max_size: u64,
    },

    /// A required field is missing or empty.
    MissingField { hook: String, field: &'static str },

    /// The filename pattern does not compile.
    InvalidRegex {
        hook: String,
        pattern: String,
        source: regex::Error,
    },

    /// The filename pattern exceeds the maximum allowed length.
    RegexTooLong {
        hook: String,
        length: usize,
        max_length: usize,
    },

    /// The filename pattern lacks a mandatory named capture group.
    MissingCapture { hook: String, capture: &'static str },

    /// The filename pattern defines a capture group nothing reads.
    UnknownCapture { hook: String, capture: String },

    /// Two user product files declare the same hook.
    DuplicateHook {
        hook: String,
        path1: PathBuf,
        path2: PathBuf,
    },

    /// Maximum number of products exceeded.
    TooManyProducts { count: usize, max: usize },

    /// I/O error reading a product file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ProductError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Failed to parse TOML '{}': {source}", path.display())
            }
            Self::FileTooLarge {
                path,
                size,
                max_size,
            } => write!(
                f,
                "Product file '{}' is {size} bytes, exceeds maximum of {max_size} bytes",
                path.display()
            ),
            Self::MissingField { hook, field } => {
                write!(f, "Product '{hook}': missing required field '{field}'")
            }
            Self::InvalidRegex {
                hook,
                pattern,
                source,
            } => write!(
                f,
                "Product '{hook}': invalid filename pattern ('{pattern}'): {source}"
            ),
            Self::RegexTooLong {
                hook,
                length,
                max_length,
            } => write!(
                f,
                "Product '{hook}': filename pattern is {length} chars, \
                 exceeds maximum of {max_length}"
            ),
            Self::MissingCapture { hook, capture } => write!(
                f,
                "Product '{hook}': filename pattern has no '{capture}' capture group"
            ),
            Self::UnknownCapture { hook, capture } => write!(
                f,
                "Product '{hook}': unknown capture group '{capture}' in filename pattern"
            ),
            Self::DuplicateHook { hook, path1, path2 } => write!(
                f,
                "Duplicate product hook '{hook}' in '{}' and '{}'",
                path1.display(),
                path2.display()
            ),
            Self::TooManyProducts { count, max } => {
                write!(f, "Too many products loaded ({count}), maximum is {max}")
            }
            Self::Io { path, source } => {
                write!(
                    f,
                    "I/O error reading product file '{}': {source}",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for ProductError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::InvalidRegex { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ProductError> for FaamError {
    fn from(e: ProductError) -> Self {
        Self::Product(e)
    }
}

// ---------------------------------------------------------------------------
// Discovery errors
// ---------------------------------------------------------------------------

/// Errors related to walking scan roots.
#[derive(Debug)]
pub enum DiscoveryError {
    /// The root scan path does not exist or is not accessible.
    RootNotFound { path: PathBuf },

    /// Permission denied accessing the root path.
    PermissionDenied { path: PathBuf, source: io::Error },

    /// Walkdir traversal error (individual file/dir access failures).
    Traversal {
        path: PathBuf,
        source: walkdir::Error,
    },
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RootNotFound { path } => {
                write!(f, "Scan path '{}' does not exist", path.display())
            }
            Self::PermissionDenied { path, source } => {
                write!(
                    f,
                    "Permission denied accessing '{}': {source}",
                    path.display()
                )
            }
            Self::Traversal { path, source } => {
                write!(f, "Error traversing '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for DiscoveryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::PermissionDenied { source, .. } => Some(source),
            Self::Traversal { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<DiscoveryError> for FaamError {
    fn from(e: DiscoveryError) -> Self {
        Self::Discovery(e)
    }
}

// ---------------------------------------------------------------------------
// Classification errors
// ---------------------------------------------------------------------------

/// Per-file errors raised while routing a matched filename into a flight.
/// Always non-fatal for the scan as a whole.
#[derive(Debug)]
pub enum ClassificationError {
    /// The `date` capture is not an 8-digit calendar date.
    InvalidDate {
        path: PathBuf,
        hook: String,
        raw: String,
        source: chrono::ParseError,
    },

    /// The `flightnum` capture is empty.
    MissingFlightNumber { path: PathBuf, hook: String },

    /// A numeric capture (version, revision, freq) does not fit its type.
    InvalidNumber {
        path: PathBuf,
        hook: String,
        field: &'static str,
        raw: String,
    },

    /// The filename is not valid UTF-8 and cannot be matched.
    NonUtf8Name { path: PathBuf },
}

impl fmt::Display for ClassificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDate {
                path,
                hook,
                raw,
                source,
            } => write!(
                f,
                "'{}' ({hook}): cannot parse date '{raw}': {source}",
                path.display()
            ),
            Self::MissingFlightNumber { path, hook } => {
                write!(f, "'{}' ({hook}): empty flight number", path.display())
            }
            Self::InvalidNumber {
                path,
                hook,
                field,
                raw,
            } => write!(
                f,
                "'{}' ({hook}): {field} '{raw}' is not a valid number",
                path.display()
            ),
            Self::NonUtf8Name { path } => {
                write!(f, "'{}': non-UTF-8 filename", path.display())
            }
        }
    }
}

impl std::error::Error for ClassificationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidDate { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ClassificationError> for FaamError {
    fn from(e: ClassificationError) -> Self {
        Self::Classification(e)
    }
}

// ---------------------------------------------------------------------------
// Resolve errors
// ---------------------------------------------------------------------------

/// Errors raised when resolving a flight, accessor or file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// No record satisfies the attempted version/revision/frequency pins.
    NoMatch {
        hook: String,
        version: Option<u32>,
        revision: Option<u32>,
        frequency: Option<Frequency>,
    },

    /// The hook was never registered for this flight.
    UnknownAccessor { flight: String, hook: String },

    /// The catalogue holds no flight with this number.
    UnknownFlight { flight: String },

    /// A frequency string is neither a positive integer nor "full".
    InvalidFrequency { raw: String },
}

fn fmt_pin<T: fmt::Display>(value: &Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "any".to_string(),
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMatch {
                hook,
                version,
                revision,
                frequency,
            } => write!(
                f,
                "No '{hook}' file for version {}, revision {}, frequency {}",
                fmt_pin(version),
                fmt_pin(revision),
                fmt_pin(frequency)
            ),
            Self::UnknownAccessor { flight, hook } => {
                write!(f, "Flight '{flight}': '{hook}' is not an accessor")
            }
            Self::UnknownFlight { flight } => write!(f, "Flight '{flight}' not found"),
            Self::InvalidFrequency { raw } => write!(
                f,
                "Invalid frequency '{raw}': expected a positive integer or \"full\""
            ),
        }
    }
}

impl std::error::Error for ResolveError {}

impl From<ResolveError> for FaamError {
    fn from(e: ResolveError) -> Self {
        Self::Resolve(e)
    }
}

// ---------------------------------------------------------------------------
// Time-series errors
// ---------------------------------------------------------------------------

/// Errors related to time-series tables and their loaders.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesError {
    /// A requested channel is absent from the table or file.
    MissingChannel { channel: String },

    /// A channel's length differs from the time index length.
    LengthMismatch {
        channel: String,
        expected: usize,
        actual: usize,
    },

    /// The time index is not strictly increasing.
    UnsortedIndex { position: usize },

    /// Resampling frequency must be positive.
    InvalidFrequency { hz: u32 },

    /// The loader has no data for this file.
    NotLoaded { path: PathBuf },

    /// No reader is registered for the product's file family.
    NoLoader { hook: String, model: ModelKind },

    /// A time coordinate's units are not "seconds since <datetime>".
    TimeUnits { units: String },

    /// The file could not be read.
    Read { path: PathBuf, reason: String },
}

impl fmt::Display for SeriesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingChannel { channel } => write!(f, "Channel '{channel}' not found"),
            Self::LengthMismatch {
                channel,
                expected,
                actual,
            } => write!(
                f,
                "Channel '{channel}' has {actual} samples, time index has {expected}"
            ),
            Self::UnsortedIndex { position } => {
                write!(f, "Time index is not strictly increasing at sample {position}")
            }
            Self::InvalidFrequency { hz } => {
                write!(f, "Cannot resample to {hz} Hz: frequency must be positive")
            }
            Self::NotLoaded { path } => {
                write!(f, "No time-series data available for '{}'", path.display())
            }
            Self::NoLoader { hook, model } => write!(
                f,
                "No reader for '{hook}' files ({model}) in this build"
            ),
            Self::TimeUnits { units } => {
                write!(f, "Unsupported time units '{units}'")
            }
            Self::Read { path, reason } => {
                write!(f, "Failed to read '{}': {reason}", path.display())
            }
        }
    }
}

impl std::error::Error for SeriesError {}

impl From<SeriesError> for FaamError {
    fn from(e: SeriesError) -> Self {
        Self::Series(e)
    }
}

// ---------------------------------------------------------------------------
// Detection errors
// ---------------------------------------------------------------------------

/// Errors raised by the flight-segment detectors.
#[derive(Debug, Clone, PartialEq)]
pub enum DetectError {
    /// A parameter, or a combination of parameters, is inconsistent.
    InvalidParameter {
        parameter: &'static str,
        reason: String,
    },

    /// The input table could not supply a required channel.
    Series(SeriesError),
}

impl fmt::Display for DetectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParameter { parameter, reason } => {
                write!(f, "Invalid parameter '{parameter}': {reason}")
            }
            Self::Series(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for DetectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Series(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SeriesError> for DetectError {
    fn from(e: SeriesError) -> Self {
        Self::Series(e)
    }
}

impl From<DetectError> for FaamError {
    fn from(e: DetectError) -> Self {
        Self::Detect(e)
    }
}

// ---------------------------------------------------------------------------
// Flight summary errors
// ---------------------------------------------------------------------------

/// Errors related to flight-summary reading and queries.
#[derive(Debug)]
pub enum SummaryError {
    /// CSV decoding failed.
    Csv { path: PathBuf, source: csv::Error },

    /// A time cell does not match the summary time format.
    InvalidTime {
        path: PathBuf,
        line: u64,
        field: &'static str,
        raw: String,
    },

    /// A numeric cell is not a number.
    InvalidNumber {
        path: PathBuf,
        line: u64,
        field: &'static str,
        raw: String,
    },

    /// A row has no start time.
    MissingStartTime { path: PathBuf, line: u64 },

    /// The summary file format cannot be read.
    UnsupportedFormat { path: PathBuf, extension: String },

    /// No event carries the requested name.
    EventNotFound { name: String },

    /// I/O error opening the summary file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for SummaryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv { path, source } => {
                write!(f, "'{}': CSV error: {source}", path.display())
            }
            Self::InvalidTime {
                path,
                line,
                field,
                raw,
            } => write!(
                f,
                "'{}' line {line}: cannot parse {field} '{raw}'",
                path.display()
            ),
            Self::InvalidNumber {
                path,
                line,
                field,
                raw,
            } => write!(
                f,
                "'{}' line {line}: {field} '{raw}' is not a number",
                path.display()
            ),
            Self::MissingStartTime { path, line } => {
                write!(f, "'{}' line {line}: event has no start time", path.display())
            }
            Self::UnsupportedFormat { path, extension } => write!(
                f,
                "'{}': flight summaries in '.{extension}' format are not supported",
                path.display()
            ),
            Self::EventNotFound { name } => write!(f, "Event '{name}' not found"),
            Self::Io { path, source } => {
                write!(f, "'{}': I/O error: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for SummaryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Csv { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<SummaryError> for FaamError {
    fn from(e: SummaryError) -> Self {
        Self::Summary(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A config value is out of the allowed range.
    ValueOutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// Config file exceeds the maximum allowed size.
    FileTooLarge {
        path: PathBuf,
        size: u64,
        max_size: u64,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "Config '{field}' = '{value}' is out of range. Expected: {expected}"
            ),
            Self::FileTooLarge {
                path,
                size,
                max_size,
            } => write!(
                f,
                "Config '{}' is {size} bytes, exceeds maximum of {max_size} bytes",
                path.display()
            ),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for FaamError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Convenience type alias for faamcat results.
pub type Result<T> = std::result::Result<T, FaamError>;
