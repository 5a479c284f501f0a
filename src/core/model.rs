// faamcat - core/model.rs
//
// Core data model types. Pure data definitions with no I/O.
// These types are the shared vocabulary across all layers.

use crate::util::error::ResolveError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

// =============================================================================
// Frequency
// =============================================================================

/// Sampling rate of a file variant.
///
/// `Full` marks an unsplit file that carries every variable at its native
/// rate. It is a distinguished value, not a large integer, but it orders above
/// every fixed rate so that "maximum frequency" prefers the full-rate file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Frequency {
    /// Fixed sampling rate in Hz (always positive).
    Hz(u32),
    /// Unsplit, natively multi-rate file.
    Full,
}

impl Frequency {
    /// Fixed rate in Hz, or `None` for the full-rate sentinel.
    pub fn hz(&self) -> Option<u32> {
        match self {
            Frequency::Hz(hz) => Some(*hz),
            Frequency::Full => None,
        }
    }

    pub fn is_full(&self) -> bool {
        matches!(self, Frequency::Full)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::Hz(hz) => write!(f, "{hz}"),
            Frequency::Full => f.write_str("full"),
        }
    }
}

impl FromStr for Frequency {
    type Err = ResolveError;

    /// Accepts "full" (any case), a positive integer, or an integer with an
    /// "hz" suffix ("32hz").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().to_ascii_lowercase();
        if trimmed == "full" {
            return Ok(Frequency::Full);
        }
        let digits = trimmed.strip_suffix("hz").unwrap_or(&trimmed);
        match digits.parse::<u32>() {
            Ok(hz) if hz > 0 => Ok(Frequency::Hz(hz)),
            _ => Err(ResolveError::InvalidFrequency { raw: s.to_string() }),
        }
    }
}

impl Serialize for Frequency {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Frequency::Hz(hz) => serializer.serialize_u32(*hz),
            Frequency::Full => serializer.serialize_str("full"),
        }
    }
}

// =============================================================================
// File record
// =============================================================================

/// One data file, as described by its filename.
///
/// Built from a successful product-pattern match. Captures the pattern did
/// not produce are `None`; only the frequency has a sentinel (`Full`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FileRecord {
    path: PathBuf,
    version: Option<u32>,
    revision: Option<u32>,
    frequency: Frequency,
    extension: Option<String>,
}

impl FileRecord {
    pub fn new(
        path: impl Into<PathBuf>,
        version: Option<u32>,
        revision: Option<u32>,
        frequency: Frequency,
        extension: Option<String>,
    ) -> Self {
        Self {
            path: path.into(),
            version,
            revision,
            frequency,
            extension,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn version(&self) -> Option<u32> {
        self.version
    }

    pub fn revision(&self) -> Option<u32> {
        self.revision
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }
}

impl fmt::Display for FileRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

// =============================================================================
// Selection (pins)
// =============================================================================

/// The version/revision/frequency a FileSet is pinned to.
/// `None` in any field means "not pinned": every record passes that field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Selection {
    pub version: Option<u32>,
    pub revision: Option<u32>,
    pub frequency: Option<Frequency>,
}

impl Selection {
    /// True when `record` agrees with every pinned field.
    pub fn matches(&self, record: &FileRecord) -> bool {
        self.version.map_or(true, |v| record.version == Some(v))
            && self.revision.map_or(true, |r| record.revision == Some(r))
            && self.frequency.map_or(true, |f| record.frequency == f)
    }

    /// True when nothing is pinned.
    pub fn is_empty(&self) -> bool {
        self.version.is_none() && self.revision.is_none() && self.frequency.is_none()
    }
}

// =============================================================================
// Data model family
// =============================================================================

/// The on-disk family a product's files belong to. Bound to each product by
/// its definition; decides which reader serves the files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ModelKind {
    /// Flat netCDF: every variable at the root, multi-rate via a second dimension.
    #[default]
    FlatVariable,
    /// Grouped netCDF: variables nested in groups with per-group time.
    HierarchicalGroup,
    /// Row-per-event tabular flight summary.
    TabularSummary,
}

impl ModelKind {
    pub fn label(&self) -> &'static str {
        match self {
            ModelKind::FlatVariable => "flat-variable",
            ModelKind::HierarchicalGroup => "hierarchical-group",
            ModelKind::TabularSummary => "tabular-summary",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Product (runtime representation)
// =============================================================================

/// Runtime representation of a product definition after TOML parsing and
/// regex compilation.
#[derive(Debug, Clone)]
pub struct Product {
    /// Accessor name for this product on every flight (e.g. "core").
    pub hook: String,

    /// Human-readable name.
    pub name: String,

    /// Description of what the files contain.
    pub description: String,

    /// File family, selects the reader.
    pub model: ModelKind,

    /// Compiled, case-insensitive filename pattern with named captures.
    pub pattern: regex::Regex,

    /// Whether this is a built-in product (true) or user-defined (false).
    pub is_builtin: bool,
}
