//! Parsing and querying of the master destination file.
//!
//! The master file is a small line-oriented text format. Each section header
//! lists one or more pipe-separated system aliases, and each `-` entry maps a
//! role key to a destination path on removable media:
//!
//! ```text
//! [Playstation|PS1|PSX]
//! - wii games = drive:\wiisxrx\isos
//! - wii renamed cover art = drive:\wiiflow\boxcovers\Playstation
//! - wii bios = drive:\wiisxrx\bios
//!
//! [Working Folder]
//! - wii = ROMS
//! - rpi = roms
//! ```
//!
//! All aliases of a section share one destination mapping, so `PS1` and `PSX`
//! always resolve to the same paths.

use indexmap::IndexMap;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;

/// Header of the section that maps target identifiers to local folder names.
pub const WORKING_FOLDER_SECTION: &str = "Working Folder";

/// Working folder used when the target has no entry or the master file is missing.
pub const DEFAULT_WORKING_FOLDER: &str = "Systems";

/// Token in destination values that is replaced with the chosen media root.
pub const DRIVE_PLACEHOLDER: &str = "drive:";

/// Role key to destination path, in declaration order.
pub type DestinationMap = IndexMap<String, String>;

/// A destination mapping shared by every alias of one section.
pub type SharedDestinations = Rc<RefCell<DestinationMap>>;

/// Errors that can occur while loading the master file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The master file does not exist. Callers fall back to defaults.
    #[error("master file not found: {}", .0.display())]
    ConfigMissing(PathBuf),
    /// The master file exists but could not be read.
    #[error("failed to read master file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// What a section holds.
#[derive(Debug, Clone)]
pub enum SectionBody {
    /// System destinations keyed by role.
    Destinations(SharedDestinations),
    /// The working-folder section; its entries live in the document itself.
    WorkingFolder,
}

/// One `[header]` block of the master file.
#[derive(Debug, Clone)]
pub struct Section {
    /// The trimmed text between the brackets.
    pub header: String,
    /// Pipe-separated components of the header, trimmed, in order.
    pub aliases: Vec<String>,
    pub body: SectionBody,
}

/// The parsed master file.
#[derive(Debug, Clone, Default)]
pub struct ConfigDocument {
    sections: Vec<Section>,
    by_alias: IndexMap<String, SharedDestinations>,
    working_folders: IndexMap<String, String>,
}

impl ConfigDocument {
    /// Parses master file text. Malformed lines are ignored, never rejected.
    pub fn parse(text: &str) -> Self {
        let mut doc = Self::default();
        let mut current: Option<SharedDestinations> = None;
        let mut in_working_folder = false;

        for raw in text.lines() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(header) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                let header = header.trim().to_string();
                let aliases: Vec<String> =
                    header.split('|').map(|alias| alias.trim().to_string()).collect();

                if header.to_lowercase() == WORKING_FOLDER_SECTION.to_lowercase() {
                    in_working_folder = true;
                    current = None;
                    doc.sections.push(Section {
                        header,
                        aliases,
                        body: SectionBody::WorkingFolder,
                    });
                } else {
                    in_working_folder = false;
                    let shared: SharedDestinations = Rc::default();
                    for alias in &aliases {
                        doc.by_alias.insert(alias.clone(), Rc::clone(&shared));
                    }
                    doc.sections.push(Section {
                        header,
                        aliases,
                        body: SectionBody::Destinations(Rc::clone(&shared)),
                    });
                    current = Some(shared);
                }
                continue;
            }

            let Some(entry) = line.strip_prefix('-') else {
                continue;
            };
            let Some((key, value)) = entry.split_once('=') else {
                continue;
            };
            let (key, value) = (key.trim().to_string(), value.trim().to_string());

            if in_working_folder {
                doc.working_folders.insert(key, value);
            } else if let Some(destinations) = &current {
                destinations.borrow_mut().insert(key, value);
            }
        }

        doc
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Returns the shared mapping behind `alias`, if any section declares it.
    pub fn destinations(&self, alias: &str) -> Option<SharedDestinations> {
        self.by_alias.get(alias).map(Rc::clone)
    }

    pub fn working_folders(&self) -> &IndexMap<String, String> {
        &self.working_folders
    }
}

/// Read-only access to the master file with the default fallbacks applied.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    document: ConfigDocument,
}

impl ConfigStore {
    /// Loads and parses the master file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigMissing` if the file does not exist and
    /// `ConfigError::Io` if it cannot be read.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigMissing(path.to_path_buf()));
        }
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&text))
    }

    /// Loads the master file, degrading to an empty store when it is missing
    /// or unreadable.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(store) => store,
            Err(e) => {
                tracing::warn!("{e}; using default destinations");
                Self::default()
            }
        }
    }

    pub fn parse(text: &str) -> Self {
        Self {
            document: ConfigDocument::parse(text),
        }
    }

    pub fn document(&self) -> &ConfigDocument {
        &self.document
    }

    /// Every alias that names a system, i.e. directories that count as
    /// recognised systems in a working folder.
    ///
    /// Only a header spelled exactly `Working Folder` is left out here, while
    /// parsing treats the header case-insensitively. A `[working folder]`
    /// header therefore still contributes its name as an alias.
    pub fn expected_aliases(&self) -> BTreeSet<String> {
        self.document
            .sections
            .iter()
            .filter(|section| section.header != WORKING_FOLDER_SECTION)
            .flat_map(|section| section.aliases.iter().cloned())
            .collect()
    }

    /// The local folder name configured for `target_id`, or
    /// [`DEFAULT_WORKING_FOLDER`].
    pub fn working_folder(&self, target_id: &str) -> &str {
        self.document
            .working_folders
            .get(target_id)
            .map(String::as_str)
            .unwrap_or(DEFAULT_WORKING_FOLDER)
    }

    /// The alias's destinations with [`DRIVE_PLACEHOLDER`] replaced by `media_root`.
    ///
    /// Replacement is a plain substring replace of every occurrence.
    pub fn destinations_for_alias(&self, alias: &str, media_root: &str) -> Option<DestinationMap> {
        let shared = self.document.by_alias.get(alias)?;
        let resolved = shared
            .borrow()
            .iter()
            .map(|(key, value)| (key.clone(), value.replace(DRIVE_PLACEHOLDER, media_root)))
            .collect();
        Some(resolved)
    }
}
