// src/services/candidate_filter.rs
//
// Candidate Filter
//
// Decides which dropped files become reconciliation candidates.
//
// CRITICAL RULES:
// - Checks run in a fixed order: extension, size, identifier
// - Rejected items are counted, not reported individually
// - File contents are read only for inputs that passed every check
// - An unreadable file is a rejection, never an error for the batch

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::ImportConfig;
use crate::domain::import::{extension_of, normalize_extension};
use crate::domain::{ImportCandidate, ImportKind};
use crate::error::{AppError, AppResult};
use crate::services::extraction_rules::IdentifierRules;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Source {
    Memory(Vec<u8>),
    Disk(PathBuf),
}

/// A file as handed over by the operator, before any checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawInput {
    pub name: String,
    size: u64,
    source: Source,
}

impl RawInput {
    pub fn new(name: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size: payload.len() as u64,
            source: Source::Memory(payload),
        }
    }

    /// Reference a file on disk by name and size; contents stay unread
    pub fn from_path(path: &Path) -> AppResult<Self> {
        let size = std::fs::metadata(path)?.len();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Ok(Self {
            name,
            size,
            source: Source::Disk(path.to_path_buf()),
        })
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    fn into_payload(self) -> (String, AppResult<Vec<u8>>) {
        let payload = match self.source {
            Source::Memory(bytes) => Ok(bytes),
            Source::Disk(path) => std::fs::read(&path).map_err(AppError::from),
        };
        (self.name, payload)
    }
}

/// Regular files found below a directory
#[derive(Debug, Default)]
pub struct DirectoryScan {
    /// Sorted by file name within each directory
    pub inputs: Vec<RawInput>,

    /// Entries whose metadata could not be read
    pub unreadable: usize,
}

/// Walk `dir` (following symlinks) without reading any file contents.
/// Only a missing or unreadable `dir` itself is an error.
pub fn scan_directory(dir: &Path) -> AppResult<DirectoryScan> {
    if !std::fs::metadata(dir)?.is_dir() {
        return Err(AppError::InvalidFormat(format!(
            "{} is not a directory",
            dir.display()
        )));
    }

    let mut scan = DirectoryScan::default();
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                scan.unreadable += 1;
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        match RawInput::from_path(entry.path()) {
            Ok(input) => scan.inputs.push(input),
            Err(e) => {
                log::warn!("Skipping {}: {}", entry.path().display(), e);
                scan.unreadable += 1;
            }
        }
    }

    Ok(scan)
}

#[derive(Debug, Default)]
pub struct FilterOutcome {
    /// Accepted candidates, in input order
    pub accepted: Vec<ImportCandidate>,
    pub rejected: usize,
}

pub struct CandidateFilter {
    kind: ImportKind,
    allowed_extensions: Vec<String>,
    max_file_size_bytes: u64,
    rules: IdentifierRules,
}

impl CandidateFilter {
    pub fn new(kind: ImportKind, config: &ImportConfig) -> Self {
        Self {
            kind,
            allowed_extensions: config
                .allowed_extensions(kind)
                .iter()
                .map(|ext| normalize_extension(ext))
                .collect(),
            max_file_size_bytes: config.max_file_size_bytes,
            rules: IdentifierRules::default(),
        }
    }

    pub fn filter(&self, inputs: Vec<RawInput>) -> FilterOutcome {
        let mut outcome = FilterOutcome::default();

        for input in inputs {
            let key = match self.check(&input) {
                Ok(key) => key,
                Err(reason) => {
                    log::debug!("Rejected {} ({}): {}", input.name, self.kind, reason);
                    outcome.rejected += 1;
                    continue;
                }
            };

            // Re-checked after reading: the file may have grown since the scan
            let (name, payload) = input.into_payload();
            match payload {
                Ok(payload) if payload.len() as u64 > self.max_file_size_bytes => {
                    log::debug!("Rejected {} ({}): file too large", name, self.kind);
                    outcome.rejected += 1;
                }
                Ok(payload) => outcome
                    .accepted
                    .push(ImportCandidate::new(name, Some(key), payload)),
                Err(e) => {
                    log::warn!("Rejected {} ({}): cannot read file: {}", name, self.kind, e);
                    outcome.rejected += 1;
                }
            }
        }

        if outcome.rejected > 0 {
            log::warn!(
                "{} of {} {} file(s) rejected before reconciliation",
                outcome.rejected,
                outcome.rejected + outcome.accepted.len(),
                self.kind
            );
        }

        outcome
    }

    fn check(&self, input: &RawInput) -> Result<String, &'static str> {
        let extension = extension_of(&input.name).ok_or("no file extension")?;
        if !self
            .allowed_extensions
            .contains(&normalize_extension(&extension))
        {
            return Err("file type not allowed");
        }

        if input.size() > self.max_file_size_bytes {
            return Err("file too large");
        }

        self.rules
            .extract(&input.name)
            .ok_or("no report number in file name")
    }
}
