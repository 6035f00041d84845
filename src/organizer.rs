//! Cover art matching and library transfer passes.
//!
//! A system folder inside the working root looks like this:
//!
//! ```text
//! <working root>/<alias>/                      ROM files
//! <working root>/<alias>/cover art/            source images
//! <working root>/<alias>/renamed cover art/    images renamed after their ROM
//! <working root>/<alias>/unmatched cover art/  ROMs without a matching image
//! <working root>/<alias>/bios/                 BIOS files
//! <working root>/Multi Disc/<alias>/           multi-disc games
//! ```
//!
//! Each pass works one file at a time. A failing file is recorded in the
//! pass report and the pass moves on to the next file.

use crate::destinations::{DestinationResolver, Role};
use crate::fs_ops::{FileOps, StdFileOps, file_name_string, file_stem_string, has_extension};
use crate::output::OutputFormatter;
use crate::similarity::{SimilarityMatcher, normalize_name};
use glob::{MatchOptions, Pattern};
use indicatif::ProgressBar;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const COVER_ART_DIR: &str = "cover art";
pub const RENAMED_COVER_ART_DIR: &str = "renamed cover art";
pub const UNMATCHED_COVER_ART_DIR: &str = "unmatched cover art";
pub const BIOS_DIR: &str = "bios";
pub const MULTI_DISC_DIR: &str = "Multi Disc";

/// Patch and binary side files that are never treated as ROMs.
pub const EXCLUDED_EXTENSIONS: &[&str] = &["ips", "bps", "bin"];

/// Cover art image types considered for matching.
pub const IMAGE_EXTENSIONS: &[&str] = &["png"];

/// Errors that can occur during organizer passes.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// A role key is absent from the system's destinations.
    #[error("no destination '{role_key}' configured for system '{alias}'")]
    DestinationMissing { alias: String, role_key: String },
    /// No master file section declares the alias.
    #[error("no destination mapping found for system '{0}'")]
    UnknownSystem(String),
    #[error("failed to copy {} to {}: {source}", from.display(), to.display())]
    CopyFailure {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to delete {}: {source}", path.display())]
    DeleteFailure {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to move {} to {}: {source}", from.display(), to.display())]
    MoveFailure {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to create directory {}: {source}", path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read directory {}: {source}", path.display())]
    ReadDirFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A folder that should have been removed still has content.
    #[error("{} is not empty and was left in place", .0.display())]
    CleanupWarning(PathBuf),
}

/// Result type for organizer operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Outcome of matching one ROM file.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    Matched { artwork: PathBuf, score: f64 },
    Unmatched,
}

/// Result of a match pass over one system folder.
#[derive(Debug, Default)]
pub struct MatchReport {
    /// Every ROM considered, in listing order.
    pub results: Vec<(PathBuf, MatchResult)>,
    /// Files moved into `unmatched cover art`.
    pub quarantined: Vec<PathBuf>,
    pub failures: Vec<OrganizeError>,
}

impl MatchReport {
    pub fn matched_count(&self) -> usize {
        self.results
            .iter()
            .filter(|(_, result)| matches!(result, MatchResult::Matched { .. }))
            .count()
    }

    pub fn unmatched_count(&self) -> usize {
        self.results.len() - self.matched_count()
    }
}

/// Result of a restore pass over one system folder.
#[derive(Debug, Default)]
pub struct RestoreReport {
    pub restored: Vec<PathBuf>,
    pub removed_renamed: bool,
    pub skipped: Vec<(PathBuf, String)>,
    pub failures: Vec<OrganizeError>,
    pub warnings: Vec<OrganizeError>,
}

/// Result of copying to or deleting from removable media.
#[derive(Debug, Default)]
pub struct TransferReport {
    /// Files copied, or entries deleted.
    pub processed: Vec<PathBuf>,
    pub skipped: Vec<(PathBuf, String)>,
    pub failures: Vec<OrganizeError>,
    /// Systems or roles that had no configured destination.
    pub missing: Vec<OrganizeError>,
}

impl TransferReport {
    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty() && self.missing.is_empty()
    }
}

/// What a delete-from-drive request ended with.
#[derive(Debug)]
pub enum DeleteOutcome {
    Deleted(TransferReport),
    /// Nothing was deleted. `missing` still names unconfigured systems and roles.
    Declined { missing: Vec<OrganizeError> },
}

/// Runs the organizer passes over a library through a [`FileOps`] backend.
#[derive(Debug, Default)]
pub struct ArtworkOrganizer<F: FileOps = StdFileOps> {
    pub(crate) fs: F,
    matcher: SimilarityMatcher,
    show_progress: bool,
}

impl ArtworkOrganizer<StdFileOps> {
    pub fn new() -> Self {
        Self::with_fs(StdFileOps)
    }
}

impl<F: FileOps> ArtworkOrganizer<F> {
    pub fn with_fs(fs: F) -> Self {
        Self {
            fs,
            matcher: SimilarityMatcher::default(),
            show_progress: false,
        }
    }

    /// Shows a progress bar while copying to removable media.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn file_ops(&self) -> &F {
        &self.fs
    }

    /// Folders in `working_root` named exactly after a known system alias.
    pub fn recognized_systems(
        &self,
        working_root: &Path,
        expected_aliases: &BTreeSet<String>,
    ) -> OrganizeResult<Vec<String>> {
        Ok(self
            .read_entries(working_root)?
            .into_iter()
            .filter(|entry| self.fs.is_dir(entry))
            .map(|entry| file_name_string(&entry))
            .filter(|name| expected_aliases.contains(name))
            .collect())
    }

    /// Recognized system folders that are ready for matching: they hold at
    /// least one file directly and at least one file in `cover art`.
    pub fn discover_systems(
        &self,
        working_root: &Path,
        expected_aliases: &BTreeSet<String>,
    ) -> OrganizeResult<Vec<String>> {
        let systems = self.recognized_systems(working_root, expected_aliases)?;
        Ok(systems
            .into_iter()
            .filter(|name| {
                let system_dir = working_root.join(name);
                let has_roms = self.fs.list_files(&system_dir).is_ok_and(|f| !f.is_empty());
                let has_art = self
                    .fs
                    .list_files(&system_dir.join(COVER_ART_DIR))
                    .is_ok_and(|f| !f.is_empty());
                has_roms && has_art
            })
            .collect())
    }

    /// Copies the best matching cover art for every ROM in `system_dir` into
    /// `renamed cover art` as `<rom file name>.png`.
    ///
    /// With `quarantine` set, a ROM without an acceptable match is moved into
    /// `unmatched cover art` together with every file sharing its normalized
    /// base name.
    ///
    /// # Errors
    ///
    /// Fails only if the output folders cannot be created or `system_dir`
    /// cannot be listed. Per-file failures are recorded in the report.
    pub fn match_cover_art(&self, system_dir: &Path, quarantine: bool) -> OrganizeResult<MatchReport> {
        tracing::info!(system = %system_dir.display(), quarantine, "matching cover art");

        let renamed_dir = system_dir.join(RENAMED_COVER_ART_DIR);
        let unmatched_dir = system_dir.join(UNMATCHED_COVER_ART_DIR);
        self.ensure_dir(&renamed_dir)?;
        if quarantine {
            self.ensure_dir(&unmatched_dir)?;
        }

        let all_files = self.read_files(system_dir)?;
        let artwork = self.artwork_files(&system_dir.join(COVER_ART_DIR));
        let artwork_stems: Vec<String> = artwork.iter().map(|p| file_stem_string(p)).collect();

        let mut report = MatchReport::default();

        for rom in all_files.iter().filter(|p| !has_extension(p, EXCLUDED_EXTENSIONS)) {
            // an earlier ROM may have quarantined this one as a sibling
            if !self.fs.exists(rom) {
                continue;
            }
            let rom_name = file_name_string(rom);
            let rom_stem = file_stem_string(rom);

            match self.matcher.best_match(&rom_stem, &artwork_stems) {
                Some(found) => {
                    let source = &artwork[found.index];
                    let destination = renamed_dir.join(format!("{rom_name}.png"));
                    tracing::debug!(rom = %rom_name, artwork = found.candidate, score = found.score, "matched");
                    match self.fs.copy_file(source, &destination) {
                        Ok(()) => report.results.push((
                            rom.clone(),
                            MatchResult::Matched {
                                artwork: source.clone(),
                                score: found.score,
                            },
                        )),
                        Err(source_error) => report.failures.push(OrganizeError::CopyFailure {
                            from: source.clone(),
                            to: destination,
                            source: source_error,
                        }),
                    }
                }
                None => {
                    tracing::debug!(rom = %rom_name, "no cover art above threshold");
                    report.results.push((rom.clone(), MatchResult::Unmatched));
                    if quarantine {
                        self.quarantine_siblings(&rom_stem, &all_files, &unmatched_dir, &mut report);
                    }
                }
            }
        }

        Ok(report)
    }

    fn quarantine_siblings(
        &self,
        rom_stem: &str,
        all_files: &[PathBuf],
        unmatched_dir: &Path,
        report: &mut MatchReport,
    ) {
        let base = normalize_name(rom_stem);
        for sibling in all_files {
            if normalize_name(&file_stem_string(sibling)) != base || !self.fs.exists(sibling) {
                continue;
            }
            let destination = unmatched_dir.join(file_name_string(sibling));
            match self.fs.move_path(sibling, &destination) {
                Ok(()) => report.quarantined.push(destination),
                Err(source) => report.failures.push(OrganizeError::MoveFailure {
                    from: sibling.clone(),
                    to: destination,
                    source,
                }),
            }
        }
    }

    /// Undoes a match pass: moves quarantined files back into `system_dir`,
    /// removes `unmatched cover art` if it ends up empty, and deletes
    /// `renamed cover art` with its contents.
    ///
    /// Running it again when both folders are gone does nothing.
    pub fn restore(&self, system_dir: &Path) -> OrganizeResult<RestoreReport> {
        tracing::info!(system = %system_dir.display(), "restoring system folder");
        let mut report = RestoreReport::default();

        let unmatched_dir = system_dir.join(UNMATCHED_COVER_ART_DIR);
        if self.fs.is_dir(&unmatched_dir) {
            for entry in self.read_entries(&unmatched_dir)? {
                let destination = system_dir.join(file_name_string(&entry));
                if self.fs.exists(&destination) {
                    report
                        .skipped
                        .push((entry, "a file with this name already exists".to_string()));
                    continue;
                }
                match self.fs.move_path(&entry, &destination) {
                    Ok(()) => report.restored.push(destination),
                    Err(source) => report.failures.push(OrganizeError::MoveFailure {
                        from: entry,
                        to: destination,
                        source,
                    }),
                }
            }
            if self.fs.remove_dir(&unmatched_dir).is_err() {
                tracing::warn!(path = %unmatched_dir.display(), "unmatched folder left in place");
                report.warnings.push(OrganizeError::CleanupWarning(unmatched_dir));
            }
        }

        let renamed_dir = system_dir.join(RENAMED_COVER_ART_DIR);
        if self.fs.is_dir(&renamed_dir) {
            match self.fs.remove_dir_all(&renamed_dir) {
                Ok(()) => report.removed_renamed = true,
                Err(source) => report.failures.push(OrganizeError::DeleteFailure {
                    path: renamed_dir,
                    source,
                }),
            }
        }

        Ok(report)
    }

    /// Copies each system's games, multi-disc games, renamed cover art, and
    /// BIOS files to their resolved destinations under `media_root`.
    ///
    /// Files already present at the destination are skipped without
    /// comparing content.
    pub fn copy_to_drive(
        &self,
        working_root: &Path,
        systems: &[String],
        resolver: &DestinationResolver<'_>,
        media_root: &str,
    ) -> TransferReport {
        let mut report = TransferReport::default();
        let exclusion = resolver
            .target()
            .copy_exclusion()
            .and_then(|glob| Pattern::new(glob).ok());

        for system in systems {
            let destinations = match resolver.resolve(system, media_root) {
                Ok(destinations) => destinations,
                Err(e) => {
                    tracing::warn!("{e}");
                    report.missing.push(e);
                    continue;
                }
            };
            tracing::info!(system = %system, target = resolver.target().id(), "copying to drive");

            let system_dir = working_root.join(system);
            let sources = [
                (system_dir.clone(), Role::Games, true),
                (working_root.join(MULTI_DISC_DIR).join(system), Role::MultiDisc, false),
                (system_dir.join(RENAMED_COVER_ART_DIR), Role::RenamedCoverArt, false),
                (system_dir.join(BIOS_DIR), Role::Bios, false),
            ];

            for (source_dir, role, required) in sources {
                if !required && !self.fs.is_dir(&source_dir) {
                    continue;
                }
                match destinations.path_for(role) {
                    Ok(destination) => {
                        self.copy_folder(&source_dir, &destination, exclusion.as_ref(), &mut report)
                    }
                    Err(e) => {
                        tracing::warn!("{e}");
                        report.missing.push(e);
                    }
                }
            }
        }

        report
    }

    fn copy_folder(
        &self,
        source_dir: &Path,
        destination_dir: &Path,
        exclusion: Option<&Pattern>,
        report: &mut TransferReport,
    ) {
        if let Err(source) = self.fs.create_dir_all(destination_dir) {
            report.failures.push(OrganizeError::DirectoryCreationFailed {
                path: destination_dir.to_path_buf(),
                source,
            });
            return;
        }

        let files = match self.fs.list_files(source_dir) {
            Ok(files) => files,
            Err(source) => {
                report.failures.push(OrganizeError::ReadDirFailed {
                    path: source_dir.to_path_buf(),
                    source,
                });
                return;
            }
        };

        let progress = if self.show_progress {
            OutputFormatter::create_progress_bar(files.len() as u64, &file_name_string(source_dir))
        } else {
            ProgressBar::hidden()
        };
        let case_insensitive = MatchOptions {
            case_sensitive: false,
            ..MatchOptions::new()
        };

        for file in files {
            progress.inc(1);
            let name = file_name_string(&file);
            if exclusion.is_some_and(|pattern| pattern.matches_with(&name, case_insensitive)) {
                report.skipped.push((file, "excluded for this target".to_string()));
                continue;
            }
            let destination = destination_dir.join(&name);
            if self.fs.exists(&destination) {
                report.skipped.push((file, "already exists on drive".to_string()));
                continue;
            }
            progress.set_message(name);
            match self.fs.copy_file(&file, &destination) {
                Ok(()) => report.processed.push(destination),
                Err(source) => report.failures.push(OrganizeError::CopyFailure {
                    from: file,
                    to: destination,
                    source,
                }),
            }
        }

        progress.finish_and_clear();
    }

    /// The games and renamed cover art folders on the drive for `systems`.
    ///
    /// Unconfigured systems and roles are recorded in `report.missing`.
    pub fn deletion_targets(
        &self,
        systems: &[String],
        resolver: &DestinationResolver<'_>,
        media_root: &str,
        report: &mut TransferReport,
    ) -> Vec<PathBuf> {
        let mut targets = Vec::new();
        for system in systems {
            let destinations = match resolver.resolve(system, media_root) {
                Ok(destinations) => destinations,
                Err(e) => {
                    report.missing.push(e);
                    continue;
                }
            };
            for role in [Role::Games, Role::RenamedCoverArt] {
                match destinations.path_for(role) {
                    Ok(path) => targets.push(path),
                    Err(e) => report.missing.push(e),
                }
            }
        }
        targets
    }

    /// Deletes everything directly under each system's games and renamed
    /// cover art folders on the drive.
    ///
    /// `confirm` receives the folders about to be emptied; nothing is deleted
    /// unless it returns `true`.
    pub fn delete_from_drive<C>(
        &self,
        systems: &[String],
        resolver: &DestinationResolver<'_>,
        media_root: &str,
        confirm: C,
    ) -> DeleteOutcome
    where
        C: FnOnce(&[PathBuf]) -> bool,
    {
        let mut report = TransferReport::default();
        let targets = self.deletion_targets(systems, resolver, media_root, &mut report);
        if !confirm(&targets) {
            return DeleteOutcome::Declined {
                missing: report.missing,
            };
        }

        for folder in targets {
            if !self.fs.is_dir(&folder) {
                report.skipped.push((folder, "folder not found on drive".to_string()));
                continue;
            }
            let entries = match self.fs.list_entries(&folder) {
                Ok(entries) => entries,
                Err(source) => {
                    report.failures.push(OrganizeError::ReadDirFailed { path: folder, source });
                    continue;
                }
            };
            for entry in entries {
                let removed = if self.fs.is_dir(&entry) {
                    self.fs.remove_dir_all(&entry)
                } else {
                    self.fs.remove_file(&entry)
                };
                match removed {
                    Ok(()) => report.processed.push(entry),
                    Err(source) => report.failures.push(OrganizeError::DeleteFailure { path: entry, source }),
                }
            }
        }

        DeleteOutcome::Deleted(report)
    }

    pub(crate) fn ensure_dir(&self, path: &Path) -> OrganizeResult<()> {
        self.fs
            .create_dir_all(path)
            .map_err(|source| OrganizeError::DirectoryCreationFailed {
                path: path.to_path_buf(),
                source,
            })
    }

    pub(crate) fn read_files(&self, dir: &Path) -> OrganizeResult<Vec<PathBuf>> {
        self.fs.list_files(dir).map_err(|source| OrganizeError::ReadDirFailed {
            path: dir.to_path_buf(),
            source,
        })
    }

    pub(crate) fn read_entries(&self, dir: &Path) -> OrganizeResult<Vec<PathBuf>> {
        self.fs.list_entries(dir).map_err(|source| OrganizeError::ReadDirFailed {
            path: dir.to_path_buf(),
            source,
        })
    }

    fn artwork_files(&self, cover_art_dir: &Path) -> Vec<PathBuf> {
        if !self.fs.is_dir(cover_art_dir) {
            return Vec::new();
        }
        self.fs
            .list_files(cover_art_dir)
            .unwrap_or_default()
            .into_iter()
            .filter(|p| has_extension(p, IMAGE_EXTENSIONS))
            .collect()
    }
}
