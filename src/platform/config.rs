// faamcat - platform/config.rs
//
// Platform directory resolution and config.toml loading with startup
// validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Resolved platform paths for faamcat configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/faamcat/)
    pub config_dir: PathBuf,

    /// Default location of config.toml.
    pub config_file: PathBuf,

    /// User product definitions (e.g. ~/.config/faamcat/products/)
    pub user_products_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to the current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        let config_dir = match ProjectDirs::from("", "", constants::APP_ID) {
            Some(proj_dirs) => proj_dirs.config_dir().to_path_buf(),
            None => {
                tracing::warn!("Could not determine platform directories, using current directory");
                PathBuf::from(".")
            }
        };
        let paths = Self::under(config_dir);
        tracing::debug!(
            config = %paths.config_file.display(),
            products = %paths.user_products_dir.display(),
            "Platform paths resolved"
        );
        paths
    }

    /// Paths rooted at an explicit config directory.
    pub fn under(config_dir: PathBuf) -> Self {
        Self {
            config_file: config_dir.join(constants::CONFIG_FILE_NAME),
            user_products_dir: config_dir.join(constants::PRODUCTS_DIR_NAME),
            config_dir,
        }
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored so a newer config file still loads in
/// an older binary.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub discovery: DiscoverySection,
    pub detection: DetectionSection,
    pub logging: LoggingSection,
}

/// `[discovery]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct DiscoverySection {
    pub max_depth: Option<usize>,
    pub exclude_patterns: Option<Vec<String>>,
}

/// `[detection]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct DetectionSection {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub roll_limit: Option<f64>,
    pub pressure_std_limit: Option<f64>,
    pub roll_smoothing_window: Option<usize>,
    pub output_frequency: Option<u32>,
    pub profile_window: Option<usize>,
    pub profile_threshold: Option<f64>,
    pub profile_min_length: Option<usize>,
    pub channels: ChannelsSection,
}

/// `[detection.channels]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ChannelsSection {
    pub ground: Option<String>,
    pub pressure: Option<String>,
    pub roll: Option<String>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

/// Validated application configuration derived from `config.toml`.
///
/// Invalid values produce warnings and fall back to defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    // -- Discovery --
    pub max_depth: usize,
    pub exclude_patterns: Vec<String>,

    // -- Level runs --
    pub min_length: usize,
    pub max_length: Option<usize>,
    pub roll_limit: f64,
    pub pressure_std_limit: f64,
    pub roll_smoothing_window: usize,
    pub output_frequency: u32,

    // -- Profiles --
    pub profile_window: usize,
    pub profile_threshold: f64,
    pub profile_min_length: usize,

    // -- Channels --
    pub ground_channel: String,
    pub pressure_channel: String,
    pub roll_channel: String,

    // -- Logging --
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_depth: constants::DEFAULT_MAX_DEPTH,
            exclude_patterns: constants::DEFAULT_EXCLUDE_PATTERNS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            min_length: constants::DEFAULT_SLR_MIN_LENGTH,
            max_length: None,
            roll_limit: constants::DEFAULT_ROLL_LIMIT,
            pressure_std_limit: constants::DEFAULT_PRESSURE_STD_LIMIT,
            roll_smoothing_window: constants::DEFAULT_ROLL_SMOOTHING_WINDOW,
            output_frequency: constants::DEFAULT_OUTPUT_FREQUENCY,
            profile_window: constants::DEFAULT_PROFILE_WINDOW,
            profile_threshold: constants::DEFAULT_PROFILE_THRESHOLD,
            profile_min_length: constants::DEFAULT_PROFILE_MIN_LENGTH,
            ground_channel: constants::DEFAULT_GROUND_CHANNEL.to_string(),
            pressure_channel: constants::DEFAULT_PRESSURE_CHANNEL.to_string(),
            roll_channel: constants::DEFAULT_ROLL_CHANNEL.to_string(),
            log_level: None,
        }
    }
}

/// Load and validate the config file at `config_path`.
///
/// Returns validated values and every non-fatal problem found. A missing
/// file yields defaults with no warnings (first run). An unreadable or
/// unparseable file yields defaults with one warning.
pub fn load_config(config_path: &Path) -> (AppConfig, Vec<ConfigError>) {
    let mut warnings: Vec<ConfigError> = Vec::new();

    let metadata = match std::fs::metadata(config_path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %config_path.display(), "No config.toml found; using defaults");
            return (AppConfig::default(), warnings);
        }
        Err(e) => {
            warnings.push(ConfigError::Io {
                path: config_path.to_path_buf(),
                source: e,
            });
            return finish(AppConfig::default(), warnings);
        }
    };

    if metadata.len() > constants::MAX_CONFIG_FILE_SIZE {
        warnings.push(ConfigError::FileTooLarge {
            path: config_path.to_path_buf(),
            size: metadata.len(),
            max_size: constants::MAX_CONFIG_FILE_SIZE,
        });
        return finish(AppConfig::default(), warnings);
    }

    let content = match std::fs::read_to_string(config_path) {
        Ok(c) => c,
        Err(e) => {
            warnings.push(ConfigError::Io {
                path: config_path.to_path_buf(),
                source: e,
            });
            return finish(AppConfig::default(), warnings);
        }
    };

    let raw: RawConfig = match toml::from_str(&content) {
        Ok(r) => r,
        Err(e) => {
            warnings.push(ConfigError::TomlParse {
                path: config_path.to_path_buf(),
                source: e,
            });
            return finish(AppConfig::default(), warnings);
        }
    };

    tracing::info!(path = %config_path.display(), "Loaded config.toml");
    let config = validate(raw, &mut warnings);
    finish(config, warnings)
}

fn finish(config: AppConfig, warnings: Vec<ConfigError>) -> (AppConfig, Vec<ConfigError>) {
    for w in &warnings {
        tracing::warn!(warning = %w, "Config problem; default used");
    }
    (config, warnings)
}

/// Check every present field against its bounds, accumulating problems.
fn validate(raw: RawConfig, warnings: &mut Vec<ConfigError>) -> AppConfig {
    let mut config = AppConfig::default();
    let mut out_of_range = |field: &str, value: String, expected: String| {
        warnings.push(ConfigError::ValueOutOfRange {
            field: field.to_string(),
            value,
            expected,
        });
    };

    // -- Discovery --
    if let Some(depth) = raw.discovery.max_depth {
        if (1..=constants::ABSOLUTE_MAX_DEPTH).contains(&depth) {
            config.max_depth = depth;
        } else {
            out_of_range(
                "discovery.max_depth",
                depth.to_string(),
                format!("1-{}", constants::ABSOLUTE_MAX_DEPTH),
            );
        }
    }
    if let Some(patterns) = raw.discovery.exclude_patterns {
        let (valid, invalid): (Vec<String>, Vec<String>) = patterns
            .into_iter()
            .partition(|p| glob::Pattern::new(p).is_ok());
        for p in invalid {
            out_of_range("discovery.exclude_patterns", p, "a valid glob pattern".to_string());
        }
        config.exclude_patterns = valid;
    }

    // -- Detection windows --
    let windows = [
        ("detection.min_length", raw.detection.min_length, &mut config.min_length),
        (
            "detection.roll_smoothing_window",
            raw.detection.roll_smoothing_window,
            &mut config.roll_smoothing_window,
        ),
        ("detection.profile_window", raw.detection.profile_window, &mut config.profile_window),
        (
            "detection.profile_min_length",
            raw.detection.profile_min_length,
            &mut config.profile_min_length,
        ),
    ];
    for (field, value, slot) in windows {
        if let Some(v) = value {
            if (1..=constants::MAX_DETECTOR_WINDOW).contains(&v) {
                *slot = v;
            } else {
                out_of_range(field, v.to_string(), format!("1-{}", constants::MAX_DETECTOR_WINDOW));
            }
        }
    }

    if let Some(max) = raw.detection.max_length {
        if (config.min_length..=constants::MAX_DETECTOR_WINDOW).contains(&max) {
            config.max_length = Some(max);
        } else {
            out_of_range(
                "detection.max_length",
                max.to_string(),
                format!("{}-{} (not below min_length)", config.min_length, constants::MAX_DETECTOR_WINDOW),
            );
        }
    }

    // -- Detection limits --
    let positive = [
        ("detection.roll_limit", raw.detection.roll_limit, &mut config.roll_limit),
        (
            "detection.pressure_std_limit",
            raw.detection.pressure_std_limit,
            &mut config.pressure_std_limit,
        ),
    ];
    for (field, value, slot) in positive {
        if let Some(v) = value {
            if v.is_finite() && v > 0.0 {
                *slot = v;
            } else {
                out_of_range(field, v.to_string(), "a positive number".to_string());
            }
        }
    }

    if let Some(t) = raw.detection.profile_threshold {
        if t.is_finite() && t >= 0.0 {
            config.profile_threshold = t;
        } else {
            out_of_range("detection.profile_threshold", t.to_string(), "a number >= 0".to_string());
        }
    }

    if let Some(hz) = raw.detection.output_frequency {
        if (1..=constants::MAX_OUTPUT_FREQUENCY).contains(&hz) {
            config.output_frequency = hz;
        } else {
            out_of_range(
                "detection.output_frequency",
                hz.to_string(),
                format!("1-{}", constants::MAX_OUTPUT_FREQUENCY),
            );
        }
    }

    // -- Channels --
    let channels = [
        ("detection.channels.ground", raw.detection.channels.ground, &mut config.ground_channel),
        (
            "detection.channels.pressure",
            raw.detection.channels.pressure,
            &mut config.pressure_channel,
        ),
        ("detection.channels.roll", raw.detection.channels.roll, &mut config.roll_channel),
    ];
    for (field, value, slot) in channels {
        match value {
            Some(name) if !name.trim().is_empty() => *slot = name.trim().to_string(),
            Some(name) => out_of_range(field, format!("\"{name}\""), "a channel name".to_string()),
            None => {}
        }
    }

    // -- Logging --
    if let Some(level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.to_lowercase());
        } else {
            out_of_range(
                "logging.level",
                format!("\"{level}\""),
                "one of error, warn, info, debug, trace".to_string(),
            );
        }
    }

    config
}
