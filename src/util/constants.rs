// faamcat - util/constants.rs
//
// Single source of truth for named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "faamcat";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "faamcat";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Discovery limits
// =============================================================================

/// Maximum directory recursion depth during a catalogue scan.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Hard upper bound on max depth (prevents runaway traversal).
pub const ABSOLUTE_MAX_DEPTH: usize = 50;

/// Default exclude glob patterns. Literal entries also prune directories.
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[".git", "__pycache__", "*.tmp", "*.part"];

/// Maximum number of non-fatal warnings kept in a single scan report.
pub const MAX_WARNINGS: usize = 1_000;

// =============================================================================
// Product definitions
// =============================================================================

/// Maximum number of product definitions (built-in + user).
pub const MAX_PRODUCTS: usize = 100;

/// Maximum size of a product TOML file in bytes.
pub const MAX_PRODUCT_FILE_SIZE: u64 = 64 * 1024; // 64 KB

/// Maximum regex pattern length to prevent ReDoS.
pub const MAX_REGEX_PATTERN_LENGTH: usize = 4_096;

/// chrono format of the `date` capture group in every product filename.
pub const FILENAME_DATE_FORMAT: &str = "%Y%m%d";

/// Capture groups every product pattern must define.
pub const REQUIRED_CAPTURES: &[&str] = &["date", "flightnum"];

/// Capture groups a product pattern may define.
pub const KNOWN_CAPTURES: &[&str] = &["date", "flightnum", "version", "revision", "freq", "ext"];

/// Hook of the primary instrument product, used by flight analysis by default.
pub const CORE_HOOK: &str = "core";

/// Hook of the flight-summary product.
pub const FLIGHT_SUMMARY_HOOK: &str = "corefltsum";

// =============================================================================
// Level-run detection defaults
// =============================================================================

/// Minimum steady-level-run length in seconds.
pub const DEFAULT_SLR_MIN_LENGTH: usize = 120;

/// Maximum peak-to-peak roll (degrees) inside a level run.
pub const DEFAULT_ROLL_LIMIT: f64 = 3.0;

/// Maximum static-pressure standard deviation inside a level run.
pub const DEFAULT_PRESSURE_STD_LIMIT: f64 = 2.0;

/// Trailing window (samples) used to smooth roll before the range test.
pub const DEFAULT_ROLL_SMOOTHING_WINDOW: usize = 5;

/// Output sampling rate of detected runs (Hz).
pub const DEFAULT_OUTPUT_FREQUENCY: u32 = 1;

/// Upper bound on any detector window (samples); a day at 1 Hz.
pub const MAX_DETECTOR_WINDOW: usize = 86_400;

/// Upper bound on the output frequency of detected runs (Hz).
pub const MAX_OUTPUT_FREQUENCY: u32 = 1_000;

// =============================================================================
// Profile detection defaults
// =============================================================================

/// Centered rolling-mean window (samples) applied to static pressure.
pub const DEFAULT_PROFILE_WINDOW: usize = 60;

/// Pressure trend (hPa per sample) that marks a climb or descent.
pub const DEFAULT_PROFILE_THRESHOLD: f64 = 0.15;

/// Minimum profile length in samples.
pub const DEFAULT_PROFILE_MIN_LENGTH: usize = 60;

// =============================================================================
// Channel names
// =============================================================================

/// Weight-on-wheels indicator; 1 while the aircraft is on the ground.
pub const DEFAULT_GROUND_CHANNEL: &str = "WOW_IND";

/// Static pressure from the RVSM system.
pub const DEFAULT_PRESSURE_CHANNEL: &str = "PS_RVSM";

/// Roll angle from the GPS-aided inertial navigation unit.
pub const DEFAULT_ROLL_CHANNEL: &str = "ROLL_GIN";

/// Time coordinate of flat-variable files.
pub const FLAT_TIME_VARIABLE: &str = "Time";

/// Separator between group and variable in hierarchical channel names.
pub const GROUP_SEPARATOR: char = '/';

// =============================================================================
// Flight summary
// =============================================================================

/// Timestamp format used in CSV flight summaries.
pub const SUMMARY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Default tolerance (seconds) for point-in-time event lookups.
pub const DEFAULT_EVENT_TOLERANCE_SECS: i64 = 60;

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Maximum size of config.toml in bytes.
pub const MAX_CONFIG_FILE_SIZE: u64 = 256 * 1024;

/// User products subdirectory name.
pub const PRODUCTS_DIR_NAME: &str = "products";
