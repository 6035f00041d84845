//! Target devices and per-system destination resolution.

use crate::config_store::{ConfigStore, DestinationMap};
use crate::organizer::OrganizeError;
use clap::ValueEnum;
use std::fmt;
use std::path::{Path, PathBuf};

/// A device that a library is prepared for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Target {
    #[value(name = "rpi")]
    RaspberryPi,
    #[value(name = "wii")]
    Wii,
    #[value(name = "xbox")]
    Xbox,
    #[value(name = "xbox360")]
    Xbox360,
}

impl Target {
    pub const ALL: [Target; 4] = [
        Target::RaspberryPi,
        Target::Wii,
        Target::Xbox,
        Target::Xbox360,
    ];

    /// The identifier used as the role-key prefix and in the working-folder section.
    pub fn id(&self) -> &'static str {
        match self {
            Target::RaspberryPi => "rpi",
            Target::Wii => "wii",
            Target::Xbox => "xbox",
            Target::Xbox360 => "xbox 360",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Target::RaspberryPi => "Raspberry Pi",
            Target::Wii => "Nintendo Wii",
            Target::Xbox => "Microsoft XBOX",
            Target::Xbox360 => "Microsoft XBOX 360",
        }
    }

    /// Glob of source files this device must not receive.
    pub fn copy_exclusion(&self) -> Option<&'static str> {
        match self {
            Target::Wii => Some("*.m3u"),
            _ => None,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// The kind of content a destination holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Games,
    RenamedCoverArt,
    Bios,
    MultiDisc,
}

impl Role {
    pub fn suffix(&self) -> &'static str {
        match self {
            Role::Games => "games",
            Role::RenamedCoverArt => "renamed cover art",
            Role::Bios => "bios",
            Role::MultiDisc => "multi disc",
        }
    }
}

/// Builds the role key `"<target id> <role suffix>"`.
pub fn role_key(target: Target, role: Role) -> String {
    format!("{} {}", target.id(), role.suffix())
}

/// The destinations of one system alias on one media root.
#[derive(Debug, Clone)]
pub struct ResolvedDestinationSet {
    pub alias: String,
    pub target: Target,
    pub paths: DestinationMap,
}

impl ResolvedDestinationSet {
    /// Looks up the path for `role`.
    ///
    /// Multi-disc content goes to `"<id> multi disc"` when configured and to
    /// the games destination otherwise.
    ///
    /// # Errors
    ///
    /// Returns `OrganizeError::DestinationMissing` naming the last key tried.
    pub fn path_for(&self, role: Role) -> Result<PathBuf, OrganizeError> {
        let key = role_key(self.target, role);
        if let Some(path) = self.paths.get(&key) {
            return Ok(PathBuf::from(path));
        }
        if role == Role::MultiDisc {
            return self.path_for(Role::Games);
        }
        Err(OrganizeError::DestinationMissing {
            alias: self.alias.clone(),
            role_key: key,
        })
    }
}

/// Answers where each kind of content goes for a target device.
#[derive(Debug, Clone, Copy)]
pub struct DestinationResolver<'a> {
    store: &'a ConfigStore,
    target: Target,
}

impl<'a> DestinationResolver<'a> {
    pub fn new(store: &'a ConfigStore, target: Target) -> Self {
        Self { store, target }
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn store(&self) -> &'a ConfigStore {
        self.store
    }

    /// Name of the local folder holding this target's library.
    pub fn working_folder(&self) -> &'a str {
        self.store.working_folder(self.target.id())
    }

    pub fn working_root(&self, base_dir: &Path) -> PathBuf {
        base_dir.join(self.working_folder())
    }

    /// Resolves every destination configured for `alias` against `media_root`.
    ///
    /// # Errors
    ///
    /// Returns `OrganizeError::UnknownSystem` if no section declares `alias`.
    pub fn resolve(&self, alias: &str, media_root: &str) -> Result<ResolvedDestinationSet, OrganizeError> {
        let paths = self
            .store
            .destinations_for_alias(alias, media_root)
            .ok_or_else(|| OrganizeError::UnknownSystem(alias.to_string()))?;
        tracing::debug!(alias, target = self.target.id(), ?paths, "resolved destinations");
        Ok(ResolvedDestinationSet {
            alias: alias.to_string(),
            target: self.target,
            paths,
        })
    }
}
