//! Command-line interface module for romshelf.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - The interactive target and operations menus
//! - Running organizer passes for the selected systems
//! - Printing pass reports

use crate::config_store::ConfigStore;
use crate::destinations::{DestinationResolver, Target};
use crate::drives;
use crate::fs_ops::file_name_string;
use crate::organizer::{
    ArtworkOrganizer, DeleteOutcome, MatchReport, MatchResult, OrganizeError, RestoreReport, TransferReport,
};
use crate::output::OutputFormatter;
use crate::prompt::{LineInput, PromptError, Prompter};
use crate::regions::RegionReport;
use crate::settings::Settings;
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "romshelf", version, about = "Match cover art to ROMs and copy libraries to removable media")]
pub struct Cli {
    /// Directory holding the working folders (defaults to the current directory).
    #[arg(long, global = true)]
    pub base_dir: Option<PathBuf>,

    /// Master destination file, relative to the base directory.
    #[arg(long, global = true)]
    pub master: Option<PathBuf>,

    /// TOML settings file.
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Show debug output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Operation to run; omit for the interactive menu.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Target device and systems an operation applies to.
#[derive(Debug, Clone, Args)]
pub struct Scope {
    /// Device the library is prepared for.
    #[arg(long, value_enum)]
    pub target: Target,

    /// System folder to process; repeat for several. Defaults to every system found.
    #[arg(long = "system")]
    pub systems: Vec<String>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Copy matching cover art into "renamed cover art".
    Match {
        #[command(flatten)]
        scope: Scope,
        /// Move ROMs without a match into "unmatched cover art".
        #[arg(long)]
        quarantine: bool,
    },
    /// Undo a match pass.
    Restore {
        #[command(flatten)]
        scope: Scope,
    },
    /// Move ROMs into region folders.
    Sort {
        #[command(flatten)]
        scope: Scope,
    },
    /// Flatten region folders back into the system folder.
    Unsort {
        #[command(flatten)]
        scope: Scope,
    },
    /// Copy games, cover art, and BIOS files to a drive.
    Copy {
        #[command(flatten)]
        scope: Scope,
        /// Root of the removable drive.
        #[arg(long)]
        drive: PathBuf,
    },
    /// Delete games and cover art from a drive.
    Delete {
        #[command(flatten)]
        scope: Scope,
        /// Root of the removable drive.
        #[arg(long)]
        drive: PathBuf,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// List mounted drives.
    Drives,
}

/// Runs the CLI application.
///
/// # Errors
///
/// Fails if the base directory or settings cannot be determined, or if the
/// terminal cannot be read. Problems inside a pass are reported and do not
/// end the run.
pub fn run(cli: Cli) -> anyhow::Result<()> {
    crate::logging::init(cli.verbose);

    let settings = load_settings(&cli)?;
    let store = ConfigStore::load_or_default(&settings.master_config);

    match cli.command {
        None => run_interactive(&settings, &store),
        Some(command) => run_command(&settings, &store, command),
    }
}

/// Loads the settings file, then applies `--base-dir` and `--master` on top.
///
/// The settings file is looked up in `--base-dir` when given, otherwise in
/// the current directory.
pub fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let lookup_dir = match &cli.base_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("Could not determine the current directory")?,
    };
    let mut settings = Settings::load(&lookup_dir, cli.settings.as_deref())?;
    if let Some(base_dir) = &cli.base_dir {
        settings = settings.with_base_dir_override(base_dir);
    }
    if let Some(master) = &cli.master {
        settings = settings.with_master_config(master);
    }
    Ok(settings)
}

/// Runs one non-interactive command.
pub fn run_command(settings: &Settings, store: &ConfigStore, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Match { scope, quarantine } => {
            let session = Session::new(settings, store, scope.target);
            let systems = session.systems_or_matchable(scope.systems);
            let quarantine = quarantine || settings.quarantine_unmatched.unwrap_or(false);
            session.match_cover_art(&systems, quarantine);
        }
        Command::Restore { scope } => {
            let session = Session::new(settings, store, scope.target);
            session.restore(&session.systems_or_recognized(scope.systems));
        }
        Command::Sort { scope } => {
            let session = Session::new(settings, store, scope.target);
            session.sort(&session.systems_or_recognized(scope.systems));
        }
        Command::Unsort { scope } => {
            let session = Session::new(settings, store, scope.target);
            session.unsort(&session.systems_or_recognized(scope.systems));
        }
        Command::Copy { scope, drive } => {
            let session = Session::new(settings, store, scope.target).with_progress();
            let systems = session.systems_or_recognized(scope.systems);
            session.copy_to_drive(&systems, &drives::media_root_string(&drive));
        }
        Command::Delete { scope, drive, yes } => {
            let session = Session::new(settings, store, scope.target);
            let systems = session.systems_or_recognized(scope.systems);
            session.delete_from_drive(&systems, &drives::media_root_string(&drive), |targets| {
                yes || confirm_deletion(&mut Prompter::stdio(), targets)
            });
        }
        Command::Drives => {
            let roots = drives::removable_roots();
            if roots.is_empty() {
                OutputFormatter::warning("No drives found.");
            }
            for root in roots {
                OutputFormatter::plain(&root.display().to_string());
            }
        }
    }
    Ok(())
}

/// Runs the passes for one target device and prints their reports.
pub struct Session<'a> {
    settings: &'a Settings,
    resolver: DestinationResolver<'a>,
    organizer: ArtworkOrganizer,
    working_root: PathBuf,
}

impl<'a> Session<'a> {
    pub fn new(settings: &'a Settings, store: &'a ConfigStore, target: Target) -> Self {
        let resolver = DestinationResolver::new(store, target);
        let working_root = resolver.working_root(&settings.base_dir);
        tracing::debug!(
            target = target.id(),
            working_folder = resolver.working_folder(),
            "selected working folder"
        );
        Self {
            settings,
            resolver,
            organizer: ArtworkOrganizer::new(),
            working_root,
        }
    }

    pub fn with_progress(mut self) -> Self {
        self.organizer = self.organizer.with_progress(true);
        self
    }

    pub fn target(&self) -> Target {
        self.resolver.target()
    }

    pub fn working_root(&self) -> &Path {
        &self.working_root
    }

    /// Systems ready for cover art matching.
    pub fn matchable_systems(&self) -> Result<Vec<String>, OrganizeError> {
        let expected = self.resolver.store().expected_aliases();
        self.organizer.discover_systems(&self.working_root, &expected)
    }

    /// Every folder named after a known system.
    pub fn recognized_systems(&self) -> Result<Vec<String>, OrganizeError> {
        let expected = self.resolver.store().expected_aliases();
        self.organizer.recognized_systems(&self.working_root, &expected)
    }

    fn systems_or_matchable(&self, requested: Vec<String>) -> Vec<String> {
        if !requested.is_empty() {
            return requested;
        }
        self.matchable_systems().unwrap_or_else(|e| {
            OutputFormatter::error(&e.to_string());
            Vec::new()
        })
    }

    fn systems_or_recognized(&self, requested: Vec<String>) -> Vec<String> {
        if !requested.is_empty() {
            return requested;
        }
        self.recognized_systems().unwrap_or_else(|e| {
            OutputFormatter::error(&e.to_string());
            Vec::new()
        })
    }

    pub fn match_cover_art(&self, systems: &[String], quarantine: bool) {
        OutputFormatter::info("Running cover art matching...");
        for system in systems {
            match self
                .organizer
                .match_cover_art(&self.working_root.join(system), quarantine)
            {
                Ok(report) => print_match_report(system, &report),
                Err(e) => OutputFormatter::error(&e.to_string()),
            }
        }
    }

    pub fn restore(&self, systems: &[String]) {
        OutputFormatter::info("Restoring cover art folders...");
        for system in systems {
            match self.organizer.restore(&self.working_root.join(system)) {
                Ok(report) => print_restore_report(system, &report),
                Err(e) => OutputFormatter::error(&e.to_string()),
            }
        }
    }

    pub fn sort(&self, systems: &[String]) {
        OutputFormatter::info("Sorting games by region...");
        for system in systems {
            match self.organizer.sort_by_region(&self.working_root.join(system)) {
                Ok(report) => print_region_report(system, &report, true),
                Err(e) => OutputFormatter::error(&e.to_string()),
            }
        }
    }

    pub fn unsort(&self, systems: &[String]) {
        OutputFormatter::info("Flattening region folders...");
        for system in systems {
            match self.organizer.unsort_regions(&self.working_root.join(system)) {
                Ok(report) => print_region_report(system, &report, false),
                Err(e) => OutputFormatter::error(&e.to_string()),
            }
        }
    }

    pub fn copy_to_drive(&self, systems: &[String], media_root: &str) {
        OutputFormatter::info(&format!(
            "Copying files to {media_root} for '{}'...",
            self.target()
        ));
        let report = self
            .organizer
            .copy_to_drive(&self.working_root, systems, &self.resolver, media_root);
        print_transfer_report("COPY TO DRIVE", "Copied", &report);
    }

    /// Empties the systems' folders on the drive once `confirm` agrees.
    pub fn delete_from_drive<C>(&self, systems: &[String], media_root: &str, confirm: C)
    where
        C: FnOnce(&[PathBuf]) -> bool,
    {
        match self
            .organizer
            .delete_from_drive(systems, &self.resolver, media_root, confirm)
        {
            DeleteOutcome::Deleted(report) => print_transfer_report("DELETE FROM DRIVE", "Deleted", &report),
            DeleteOutcome::Declined { missing } => {
                print_missing(&missing);
                OutputFormatter::info("Deletion cancelled.");
            }
        }
    }
}

fn confirm_deletion<I: LineInput, W: Write>(prompter: &mut Prompter<I, W>, targets: &[PathBuf]) -> bool {
    if targets.is_empty() {
        OutputFormatter::warning("Nothing to delete.");
        return false;
    }
    OutputFormatter::warning("Everything inside these folders will be deleted:");
    for target in targets {
        OutputFormatter::item(&target.display().to_string());
    }
    prompter
        .confirm("Are you sure you want to continue?")
        .unwrap_or(false)
}

const OPERATIONS: [&str; 6] = [
    "Match cover art to games",
    "Restore cover art folders",
    "Sort games by region",
    "Unsort region folders",
    "Copy files to drive",
    "Delete files from drive",
];

/// Runs the interactive target and operations menus until the user exits.
pub fn run_interactive(settings: &Settings, store: &ConfigStore) -> anyhow::Result<()> {
    let mut prompter = Prompter::stdio();
    interactive_loop(&mut prompter, settings, store)
}

/// The menu loop over any line source.
pub fn interactive_loop<I: LineInput, W: Write>(
    prompter: &mut Prompter<I, W>,
    settings: &Settings,
    store: &ConfigStore,
) -> anyhow::Result<()> {
    loop {
        let target = match prompter.choose("Which system are we making this for?", &Target::ALL) {
            Ok(Some(index)) => Target::ALL[index],
            Ok(None) => {
                OutputFormatter::plain("Exiting program...");
                return Ok(());
            }
            Err(PromptError::SelectionInvalid(message)) => {
                OutputFormatter::error(&format!("{message}. Try again."));
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let session = Session::new(settings, store, target).with_progress();
        OutputFormatter::info(&format!(
            "Using destination mappings for '{target}' in {}",
            session.working_root().display()
        ));
        operations_loop(prompter, &session)?;
    }
}

fn operations_loop<I: LineInput, W: Write>(
    prompter: &mut Prompter<I, W>,
    session: &Session<'_>,
) -> anyhow::Result<()> {
    loop {
        let title = format!("Operations Menu for {}:", session.target());
        let operation = match prompter.choose(&title, &OPERATIONS) {
            Ok(Some(index)) => index,
            Ok(None) => return Ok(()),
            Err(PromptError::SelectionInvalid(message)) => {
                OutputFormatter::error(&format!("{message}. Try again."));
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        match run_operation(prompter, session, operation) {
            Ok(()) => {}
            Err(PromptError::SelectionInvalid(message)) => OutputFormatter::error(&message),
            Err(e) => return Err(e.into()),
        }

        prompter.pause(
            "\nPress Enter to return to the operations menu...",
            session.settings.idle_wait,
        )?;
    }
}

fn run_operation<I: LineInput, W: Write>(
    prompter: &mut Prompter<I, W>,
    session: &Session<'_>,
    operation: usize,
) -> Result<(), PromptError> {
    match operation {
        0 => {
            let Some(systems) = select_systems(prompter, session, session.matchable_systems())? else {
                return Ok(());
            };
            let quarantine = match session.settings.quarantine_unmatched {
                Some(quarantine) => quarantine,
                None => prompter.confirm("Move unmatched games to 'unmatched cover art'?")?,
            };
            session.match_cover_art(&systems, quarantine);
        }
        1..=3 => {
            let Some(systems) = select_systems(prompter, session, session.recognized_systems())? else {
                return Ok(());
            };
            match operation {
                1 => session.restore(&systems),
                2 => session.sort(&systems),
                _ => session.unsort(&systems),
            }
        }
        _ => {
            let Some(media_root) = select_drive(prompter)? else {
                return Ok(());
            };
            let Some(systems) = select_systems(prompter, session, session.recognized_systems())? else {
                return Ok(());
            };
            if operation == 4 {
                session.copy_to_drive(&systems, &media_root);
            } else {
                session.delete_from_drive(&systems, &media_root, |targets| {
                    confirm_deletion(prompter, targets)
                });
            }
        }
    }
    Ok(())
}

fn select_systems<I: LineInput, W: Write>(
    prompter: &mut Prompter<I, W>,
    session: &Session<'_>,
    available: Result<Vec<String>, OrganizeError>,
) -> Result<Option<Vec<String>>, PromptError> {
    let available = match available {
        Ok(systems) if systems.is_empty() => {
            OutputFormatter::warning(&format!(
                "No systems found in {}",
                session.working_root().display()
            ));
            return Ok(None);
        }
        Ok(systems) => systems,
        Err(e) => {
            OutputFormatter::error(&e.to_string());
            return Ok(None);
        }
    };

    let selected = prompter.choose_many("Select system(s):", &available, "All Systems")?;
    if selected.is_none() {
        OutputFormatter::plain("Cancelled.");
    }
    Ok(selected.map(|indices| indices.into_iter().map(|i| available[i].clone()).collect()))
}

fn select_drive<I: LineInput, W: Write>(prompter: &mut Prompter<I, W>) -> Result<Option<String>, PromptError> {
    let roots = drives::removable_roots();
    if roots.is_empty() {
        OutputFormatter::warning("No available drives found.");
        return Ok(None);
    }
    let labels: Vec<String> = roots.iter().map(|root| root.display().to_string()).collect();
    let choice = prompter.choose("Available drives:", &labels)?;
    if choice.is_none() {
        OutputFormatter::plain("Cancelled.");
    }
    Ok(choice.map(|index| drives::media_root_string(&roots[index])))
}

fn print_failures(failures: &[OrganizeError]) {
    for failure in failures {
        OutputFormatter::error(&failure.to_string());
    }
}

fn print_skipped(skipped: &[(PathBuf, String)]) {
    for (path, reason) in skipped {
        OutputFormatter::item(&format!("{}: {}", file_name_string(path), reason));
    }
}

fn print_match_report(system: &str, report: &MatchReport) {
    for (rom, result) in &report.results {
        let rom_name = file_name_string(rom);
        match result {
            MatchResult::Matched { artwork, score } => OutputFormatter::success(&format!(
                "Matching {rom_name} -> {rom_name}.png (from {}, score {score:.2})",
                file_name_string(artwork)
            )),
            MatchResult::Unmatched => {
                OutputFormatter::warning(&format!("No cover art match found for {rom_name}"))
            }
        }
    }
    for moved in &report.quarantined {
        OutputFormatter::item(&format!(
            "Moved unmatched file {} to 'unmatched cover art'",
            file_name_string(moved)
        ));
    }
    print_failures(&report.failures);
    OutputFormatter::summary_table(
        system,
        &[
            ("Matched", report.matched_count()),
            ("Unmatched", report.unmatched_count()),
            ("Quarantined", report.quarantined.len()),
            ("Failed", report.failures.len()),
        ],
    );
}

fn print_restore_report(system: &str, report: &RestoreReport) {
    print_skipped(&report.skipped);
    print_failures(&report.failures);
    for warning in &report.warnings {
        OutputFormatter::warning(&warning.to_string());
    }
    if report.removed_renamed {
        OutputFormatter::success("Removed 'renamed cover art'");
    }
    OutputFormatter::summary_table(
        system,
        &[
            ("Restored", report.restored.len()),
            ("Skipped", report.skipped.len()),
            ("Failed", report.failures.len()),
        ],
    );
}

fn print_region_report(system: &str, report: &RegionReport, sorting: bool) {
    for path in &report.unclassified {
        OutputFormatter::warning(&format!("No region found for file: {}", file_name_string(path)));
    }
    print_skipped(&report.skipped);
    print_failures(&report.failures);
    for warning in &report.warnings {
        OutputFormatter::warning(&warning.to_string());
    }
    let mut rows = vec![("Moved", report.moved.len())];
    if sorting {
        rows.push(("No region", report.unclassified.len()));
    }
    rows.push(("Skipped", report.skipped.len()));
    rows.push(("Failed", report.failures.len()));
    OutputFormatter::summary_table(system, &rows);
}

fn print_missing(missing: &[OrganizeError]) {
    for entry in missing {
        OutputFormatter::warning(&entry.to_string());
    }
}

fn print_transfer_report(title: &str, done_label: &str, report: &TransferReport) {
    print_missing(&report.missing);
    print_skipped(&report.skipped);
    print_failures(&report.failures);
    OutputFormatter::summary_table(
        title,
        &[
            (done_label, report.processed.len()),
            ("Skipped", report.skipped.len()),
            ("Failed", report.failures.len()),
        ],
    );
    if report.is_complete_success() {
        OutputFormatter::success("Done.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    #[test]
    fn test_parse_match_command() {
        let cli = Cli::try_parse_from([
            "romshelf",
            "--base-dir",
            "/games",
            "match",
            "--target",
            "wii",
            "--system",
            "SNES",
            "--system",
            "PS1",
            "--quarantine",
        ])
        .expect("Failed to parse arguments");

        assert_eq!(cli.base_dir, Some(PathBuf::from("/games")));
        match cli.command {
            Some(Command::Match { scope, quarantine }) => {
                assert_eq!(scope.target, Target::Wii);
                assert_eq!(scope.systems, ["SNES", "PS1"]);
                assert!(quarantine);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_target() {
        assert!(Cli::try_parse_from(["romshelf", "sort", "--target", "gamecube"]).is_err());
    }

    #[test]
    fn test_no_command_means_interactive() {
        let cli = Cli::try_parse_from(["romshelf", "-v"]).expect("Failed to parse arguments");
        assert!(cli.verbose);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_base_dir_flag_overrides_settings_file() {
        let flag_dir = TempDir::new().expect("Failed to create temp directory");
        std::fs::write(
            flag_dir.path().join(".romshelf.toml"),
            "base_dir = \"/somewhere/else\"\nquarantine_unmatched = true\n",
        )
        .expect("Failed to write settings");

        let flag = flag_dir.path().to_string_lossy().into_owned();
        let cli = Cli::try_parse_from(["romshelf", "--base-dir", flag.as_str(), "drives"])
            .expect("Failed to parse arguments");
        let settings = load_settings(&cli).expect("Failed to load settings");

        assert_eq!(settings.base_dir, flag_dir.path());
        assert_eq!(settings.master_config, flag_dir.path().join("master.txt"));
        assert_eq!(settings.quarantine_unmatched, Some(true));

        let cli = Cli::try_parse_from(["romshelf", "--base-dir", flag.as_str(), "--master", "alt.txt"])
            .expect("Failed to parse arguments");
        let settings = load_settings(&cli).expect("Failed to load settings");
        assert_eq!(settings.master_config, flag_dir.path().join("alt.txt"));
    }

    #[test]
    fn test_interactive_match_via_menu() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let system = temp_dir.path().join("ROMS").join("SNES");
        std::fs::create_dir_all(system.join("cover art")).expect("Failed to create directory");
        std::fs::write(system.join("Zelda (USA).sfc"), "rom").expect("Failed to write file");
        std::fs::write(system.join("cover art").join("zelda.png"), "art").expect("Failed to write file");

        let store = ConfigStore::parse("[SNES]\n- wii games = drive:/snes\n[Working Folder]\n- wii = ROMS\n");
        let mut settings = Settings::with_base_dir(temp_dir.path());
        settings.idle_wait = std::time::Duration::ZERO;

        // target Wii, match, all systems, no quarantine, pause, back, exit
        let input = Cursor::new("2\n1\n2\nn\n\n0\n0\n");
        let mut prompter = Prompter::new(input, Vec::new());
        interactive_loop(&mut prompter, &settings, &store).expect("Menu failed");

        assert!(system.join("renamed cover art").join("Zelda (USA).sfc.png").exists());
    }
}
