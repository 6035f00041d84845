//! Region foldering for ROM files.
//!
//! ROM names carry region tags such as `(E)` or `(Germany)`. The sort pass
//! moves each tagged ROM into a region subfolder of its system folder, and
//! the unsort pass flattens those subfolders back again.
//!
//! # Examples
//!
//! ```
//! use romshelf::regions::Region;
//!
//! assert_eq!(Region::classify("Tetris (Europe).gb"), Some(Region::Europe));
//! assert_eq!(Region::classify("Tetris (USA).gb"), None);
//! assert_eq!(Region::Europe.dir_name(), "Europe");
//! ```
use crate::fs_ops::{FileOps, file_name_string, has_extension};
use crate::organizer::{ArtworkOrganizer, EXCLUDED_EXTENSIONS, OrganizeError, OrganizeResult};
use std::path::{Path, PathBuf};

/// A region or language folder inside a system folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    Europe,
    France,
    Germany,
    Italy,
    Sweden,
    Spain,
    Netherlands,
    Australia,
    Brazil,
    Asia,
    /// Fan translations. Never assigned by the sort pass, only flattened.
    Translated,
}

impl Region {
    /// Every region, in classification order.
    pub const ALL: [Region; 11] = [
        Region::Europe,
        Region::France,
        Region::Germany,
        Region::Italy,
        Region::Sweden,
        Region::Spain,
        Region::Netherlands,
        Region::Australia,
        Region::Brazil,
        Region::Asia,
        Region::Translated,
    ];

    pub fn dir_name(&self) -> &'static str {
        match self {
            Region::Europe => "Europe",
            Region::France => "France",
            Region::Germany => "Germany",
            Region::Italy => "Italy",
            Region::Sweden => "Sweden",
            Region::Spain => "Spain",
            Region::Netherlands => "Netherlands",
            Region::Australia => "Australia",
            Region::Brazil => "Brazil",
            Region::Asia => "Asia",
            Region::Translated => "Translated",
        }
    }

    /// Lowercase tags that place a file in this region.
    fn markers(&self) -> &'static [&'static str] {
        match self {
            Region::Europe => &["(e)", "(eur)", "(europe)"],
            Region::France => &["(f)", "(france)"],
            Region::Germany => &["(g)", "(germany)"],
            Region::Italy => &["(i)", "(italy)"],
            Region::Sweden => &["(s)", "(sweden)"],
            Region::Spain => &["(spain)"],
            Region::Netherlands => &["(netherlands)"],
            Region::Australia => &["(australia)"],
            Region::Brazil => &["(brazil)"],
            Region::Asia => &["(asia)"],
            Region::Translated => &[],
        }
    }

    /// The first region whose tag appears in `file_name`, ignoring case.
    pub fn classify(file_name: &str) -> Option<Region> {
        let lower = file_name.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|region| region.markers().iter().any(|marker| lower.contains(marker)))
    }
}

/// Result of a sort or unsort pass over one system folder.
#[derive(Debug, Default)]
pub struct RegionReport {
    /// Destination paths of moved files.
    pub moved: Vec<PathBuf>,
    /// Files left in place because no region tag matched.
    pub unclassified: Vec<PathBuf>,
    pub skipped: Vec<(PathBuf, String)>,
    pub failures: Vec<OrganizeError>,
    pub warnings: Vec<OrganizeError>,
}

impl<F: FileOps> ArtworkOrganizer<F> {
    /// Moves every region-tagged ROM in `system_dir` into its region folder.
    ///
    /// Region folders left empty afterwards are removed.
    pub fn sort_by_region(&self, system_dir: &Path) -> OrganizeResult<RegionReport> {
        tracing::info!(system = %system_dir.display(), "sorting by region");
        let mut report = RegionReport::default();

        let roms = self.read_files(system_dir)?;
        for rom in roms.into_iter().filter(|p| !has_extension(p, EXCLUDED_EXTENSIONS)) {
            let name = file_name_string(&rom);
            let Some(region) = Region::classify(&name) else {
                report.unclassified.push(rom);
                continue;
            };

            let region_dir = system_dir.join(region.dir_name());
            if let Err(e) = self.ensure_dir(&region_dir) {
                report.failures.push(e);
                continue;
            }
            let destination = region_dir.join(&name);
            self.move_without_overwrite(rom, destination, &mut report);
        }

        for region in Region::ALL {
            let region_dir = system_dir.join(region.dir_name());
            if self.fs.is_dir(&region_dir)
                && self.fs.list_entries(&region_dir).is_ok_and(|e| e.is_empty())
                && let Err(source) = self.fs.remove_dir(&region_dir)
            {
                report.failures.push(OrganizeError::DeleteFailure {
                    path: region_dir,
                    source,
                });
            }
        }

        Ok(report)
    }

    /// Moves the contents of every region folder back into `system_dir` and
    /// removes the emptied folders.
    pub fn unsort_regions(&self, system_dir: &Path) -> OrganizeResult<RegionReport> {
        tracing::info!(system = %system_dir.display(), "flattening region folders");
        let mut report = RegionReport::default();

        for region in Region::ALL {
            let region_dir = system_dir.join(region.dir_name());
            if !self.fs.is_dir(&region_dir) {
                continue;
            }
            for entry in self.read_entries(&region_dir)? {
                let destination = system_dir.join(file_name_string(&entry));
                self.move_without_overwrite(entry, destination, &mut report);
            }
            if self.fs.remove_dir(&region_dir).is_err() {
                tracing::warn!(path = %region_dir.display(), "region folder left in place");
                report.warnings.push(OrganizeError::CleanupWarning(region_dir));
            }
        }

        Ok(report)
    }

    fn move_without_overwrite(&self, from: PathBuf, to: PathBuf, report: &mut RegionReport) {
        if self.fs.exists(&to) {
            report
                .skipped
                .push((from, "a file with this name already exists".to_string()));
            return;
        }
        match self.fs.move_path(&from, &to) {
            Ok(()) => report.moved.push(to),
            Err(source) => report.failures.push(OrganizeError::MoveFailure { from, to, source }),
        }
    }
}
