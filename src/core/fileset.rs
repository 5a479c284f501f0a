// faamcat - core/fileset.rs
//
// The per-flight, per-product file collection and its pinning state machine.
//
// Invariants:
//   - After `add_file` the pins select at least one record (auto-selection).
//   - A pin change that would select nothing is rejected and leaves the
//     previous pins untouched.
//   - Records iterate in lexical path order; every tie-break uses that order.

use crate::core::model::{FileRecord, Frequency, Selection};
use crate::util::error::ResolveError;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Outcome of resolving a FileSet to a single file.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// The chosen record (first match in path order).
    pub record: FileRecord,

    /// Set when more than one record satisfied the pins.
    pub ambiguity: Option<AmbiguousResolution>,
}

impl Resolution {
    pub fn path(&self) -> &Path {
        self.record.path()
    }

    pub fn is_ambiguous(&self) -> bool {
        self.ambiguity.is_some()
    }
}

/// Several files satisfied the same pins. Non-fatal: the first candidate in
/// path order was used.
#[derive(Debug, Clone, PartialEq)]
pub struct AmbiguousResolution {
    pub hook: String,
    pub selection: Selection,
    /// Every matching path, in the order the tie-break considered them.
    pub candidates: Vec<PathBuf>,
}

/// All files of one product for one flight, plus the current pins.
#[derive(Debug, Clone)]
pub struct FileSet {
    hook: String,
    records: BTreeMap<PathBuf, FileRecord>,
    selected: Selection,
}

impl FileSet {
    /// An empty set for `hook` with nothing pinned.
    pub fn new(hook: impl Into<String>) -> Self {
        Self {
            hook: hook.into(),
            records: BTreeMap::new(),
            selected: Selection::default(),
        }
    }

    pub fn hook(&self) -> &str {
        &self.hook
    }

    /// Every record, in path order.
    pub fn records(&self) -> impl Iterator<Item = &FileRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn selection(&self) -> Selection {
        self.selected
    }

    pub fn version(&self) -> Option<u32> {
        self.selected.version
    }

    pub fn revision(&self) -> Option<u32> {
        self.selected.revision
    }

    pub fn frequency(&self) -> Option<Frequency> {
        self.selected.frequency
    }

    pub fn versions(&self) -> BTreeSet<u32> {
        self.records.values().filter_map(FileRecord::version).collect()
    }

    pub fn revisions(&self) -> BTreeSet<u32> {
        self.records.values().filter_map(FileRecord::revision).collect()
    }

    pub fn frequencies(&self) -> BTreeSet<Frequency> {
        self.records.values().map(FileRecord::frequency).collect()
    }

    /// Records satisfying every current pin, in path order.
    pub fn filtered(&self) -> Vec<&FileRecord> {
        self.matching(&self.selected)
    }

    fn matching(&self, selection: &Selection) -> Vec<&FileRecord> {
        self.records
            .values()
            .filter(|r| selection.matches(r))
            .collect()
    }

    /// Add a record and re-run auto-selection over the whole set.
    ///
    /// Returns false when a record with the same path was already present
    /// (the existing record is kept).
    pub fn add_file(&mut self, record: FileRecord) -> bool {
        if self.records.contains_key(record.path()) {
            tracing::debug!(
                hook = %self.hook,
                path = %record.path().display(),
                "File already catalogued"
            );
            return false;
        }
        self.records.insert(record.path().to_path_buf(), record);
        self.autoselect();
        true
    }

    /// Pin the newest data: the maximum version, then the maximum revision
    /// within it, then the maximum frequency within both. A field no record
    /// carries is left unpinned.
    pub fn autoselect(&mut self) {
        let all: Vec<&FileRecord> = self.records.values().collect();

        let version = all.iter().filter_map(|r| r.version()).max();
        let in_version: Vec<&FileRecord> = all
            .into_iter()
            .filter(|r| version.map_or(true, |v| r.version() == Some(v)))
            .collect();

        let revision = in_version.iter().filter_map(|r| r.revision()).max();
        let in_revision: Vec<&FileRecord> = in_version
            .into_iter()
            .filter(|r| revision.map_or(true, |v| r.revision() == Some(v)))
            .collect();

        let frequency = in_revision.iter().map(|r| r.frequency()).max();

        self.selected = Selection {
            version,
            revision,
            frequency,
        };

        tracing::trace!(
            hook = %self.hook,
            selection = ?self.selected,
            "Auto-selected file pins"
        );
    }

    /// Replace all pins at once. `None` fields are unpinned.
    ///
    /// Fails with `NoMatch` (carrying the attempted pins) if nothing would be
    /// selected; the previous pins are then left exactly as they were.
    pub fn set(&mut self, selection: Selection) -> Result<(), ResolveError> {
        if self.matching(&selection).is_empty() {
            return Err(self.no_match(&selection));
        }
        self.selected = selection;
        Ok(())
    }

    /// Pin the fields given in `pins`; fields left as `None` keep their
    /// current pins. Fails like `set`.
    pub fn update(&mut self, pins: Selection) -> Result<(), ResolveError> {
        self.set(Selection {
            version: pins.version.or(self.selected.version),
            revision: pins.revision.or(self.selected.revision),
            frequency: pins.frequency.or(self.selected.frequency),
        })
    }

    pub fn set_version(&mut self, version: Option<u32>) -> Result<(), ResolveError> {
        self.set(Selection {
            version,
            ..self.selected
        })
    }

    pub fn set_revision(&mut self, revision: Option<u32>) -> Result<(), ResolveError> {
        self.set(Selection {
            revision,
            ..self.selected
        })
    }

    pub fn set_frequency(&mut self, frequency: Option<Frequency>) -> Result<(), ResolveError> {
        self.set(Selection {
            frequency,
            ..self.selected
        })
    }

    /// Resolve the current pins to exactly one file.
    ///
    /// Zero matches is a `NoMatch` error. Several matches are not an error:
    /// the first in path order is returned with the ambiguity attached, and
    /// a warning is logged.
    pub fn resolve(&self) -> Result<Resolution, ResolveError> {
        let matches = self.filtered();
        let first = match matches.first() {
            Some(r) => (*r).clone(),
            None => return Err(self.no_match(&self.selected)),
        };

        let ambiguity = if matches.len() > 1 {
            let candidates: Vec<PathBuf> =
                matches.iter().map(|r| r.path().to_path_buf()).collect();
            tracing::warn!(
                hook = %self.hook,
                count = candidates.len(),
                chosen = %first.path().display(),
                "Duplicate files match the selected version/revision/frequency"
            );
            Some(AmbiguousResolution {
                hook: self.hook.clone(),
                selection: self.selected,
                candidates,
            })
        } else {
            None
        };

        Ok(Resolution {
            record: first,
            ambiguity,
        })
    }

    fn no_match(&self, attempted: &Selection) -> ResolveError {
        ResolveError::NoMatch {
            hook: self.hook.clone(),
            version: attempted.version,
            revision: attempted.revision,
            frequency: attempted.frequency,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
