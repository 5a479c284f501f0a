// faamcat - core/discovery.rs
//
// Recursive directory traversal collecting candidate data files.
//
// Architecture note: this module uses `walkdir` for directory traversal as an
// OS abstraction (similar to using std::path::Path). It reads only directory
// entries and metadata, never file contents; classification by filename is
// done by the app layer (app::catalog) against the product registry.
//
// Per-entry access errors are non-fatal and collected as warnings. Exclude
// patterns short-circuit directory descent via filter_entry so excluded
// subtrees (e.g. .git/) are never traversed at all.

use crate::util::constants;
use crate::util::error::DiscoveryError;
use std::path::{Path, PathBuf};

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for a discovery operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryConfig {
    /// Maximum directory recursion depth (clamped to `ABSOLUTE_MAX_DEPTH`).
    pub max_depth: usize,

    /// Glob patterns matched against filenames AND directory component names.
    /// Matching files are skipped; matching directories are not descended into.
    pub exclude_patterns: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_depth: constants::DEFAULT_MAX_DEPTH,
            exclude_patterns: constants::DEFAULT_EXCLUDE_PATTERNS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }
}

/// Files found under one root, plus non-fatal warnings.
#[derive(Debug, Default)]
pub struct Discovered {
    pub files: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

// =============================================================================
// Discovery
// =============================================================================

/// Collect files under `root`, applying exclude glob patterns.
///
/// A root that is itself a file is returned as the single candidate (unless
/// its name is excluded). Files are returned in walk order, sorted by name
/// within each directory.
///
/// # Fatal errors
/// Returns `Err` only if the root itself is missing or unreadable.
pub fn discover_files(root: &Path, config: &DiscoveryConfig) -> Result<Discovered, DiscoveryError> {
    // fs::metadata rather than Path::exists so an access-denied root is not
    // reported as missing.
    let root_meta = std::fs::metadata(root).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => DiscoveryError::PermissionDenied {
            path: root.to_path_buf(),
            source: e,
        },
        _ => DiscoveryError::RootNotFound {
            path: root.to_path_buf(),
        },
    })?;

    let max_depth = config.max_depth.min(constants::ABSOLUTE_MAX_DEPTH);
    let exclude_pats = compile_patterns(&config.exclude_patterns);

    tracing::debug!(
        root = %root.display(),
        max_depth,
        exclude = ?config.exclude_patterns,
        "Discovery starting"
    );

    let mut found = Discovered::default();

    if root_meta.is_file() {
        let excluded = root
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| is_excluded_filename(n, &exclude_pats));
        if !excluded {
            found.files.push(root.to_path_buf());
        }
        return Ok(found);
    }

    let walker = walkdir::WalkDir::new(root)
        .max_depth(max_depth)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            // Literal patterns prune directories; wildcards only test files.
            if e.file_type().is_dir() && e.depth() > 0 {
                let name = e.file_name().to_str().unwrap_or("");
                return !is_excluded_component(name, &exclude_pats);
            }
            true
        });

    for entry_result in walker {
        let entry = match entry_result {
            Ok(e) => e,
            Err(source) => {
                let path = source
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf());
                let warning = DiscoveryError::Traversal { path, source }.to_string();
                tracing::debug!(warning = %warning, "Discovery warning");
                push_warning(&mut found.warnings, warning);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        // Non-UTF-8 names are passed on; classification reports them.
        let path = entry.path();
        let file_name = entry.file_name().to_string_lossy();
        if is_excluded_filename(&file_name, &exclude_pats) {
            tracing::trace!(file = %file_name, "Excluded by pattern");
            continue;
        }

        found.files.push(path.to_path_buf());
    }

    tracing::debug!(
        root = %root.display(),
        files = found.files.len(),
        warnings = found.warnings.len(),
        "Discovery complete"
    );
    Ok(found)
}

fn push_warning(warnings: &mut Vec<String>, warning: String) {
    if warnings.len() < constants::MAX_WARNINGS {
        warnings.push(warning);
    }
}

// =============================================================================
// Glob helpers
// =============================================================================

/// Compile glob pattern strings. Patterns that fail to compile are logged
/// and skipped.
fn compile_patterns(patterns: &[String]) -> Vec<glob::Pattern> {
    patterns
        .iter()
        .filter_map(|p| match glob::Pattern::new(p) {
            Ok(compiled) => Some(compiled),
            Err(e) => {
                tracing::warn!(pattern = p, error = %e, "Invalid exclude pattern, skipping");
                None
            }
        })
        .collect()
}

/// True if `dir_name` matches an exclude pattern with no wildcard characters.
fn is_excluded_component(dir_name: &str, exclude_pats: &[glob::Pattern]) -> bool {
    exclude_pats.iter().any(|p| {
        let s = p.as_str();
        !s.contains('*') && !s.contains('?') && !s.contains('[') && p.matches(dir_name)
    })
}

fn is_excluded_filename(file_name: &str, exclude_pats: &[glob::Pattern]) -> bool {
    exclude_pats.iter().any(|p| p.matches(file_name))
}

// =============================================================================
// Tests
// =============================================================================
