//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output, including colored output,
//! copy progress, and pass summaries.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

const COPY_PROGRESS_TEMPLATE: &str = "{spinner:.cyan} {prefix:.bold} [{bar:40.cyan/blue}] {pos}/{len} {wide_msg}";

/// Manages all CLI output with consistent styling and formatting.
///
/// Status lines carry a colored marker: `✓` for finished files, `✗` for
/// failures (on stderr), `⚠` for things the user should look at. Per-file
/// detail under a status line is printed with [`OutputFormatter::item`].
pub struct OutputFormatter;

impl OutputFormatter {
    fn status(marker: ColoredString, message: &str) {
        println!("{marker} {message}");
    }

    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use romshelf::output::OutputFormatter;
    /// OutputFormatter::success("Copied Zelda (USA).sfc");
    /// ```
    pub fn success(message: &str) {
        Self::status("✓".green(), message);
    }

    /// Prints a failure to stderr so it survives redirected reports.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red().bold(), message.red());
    }

    pub fn warning(message: &str) {
        Self::status("⚠".yellow(), message);
    }

    /// Prints a progress note for the pass that is starting.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn plain(message: &str) {
        println!("{message}");
    }

    /// Prints one indented entry of a list, such as a skipped file.
    pub fn item(message: &str) {
        println!("  {} {}", "-".dimmed(), message);
    }

    /// Prints the system name or pass title above a summary.
    pub fn header(header: &str) {
        println!("\n{}", header.bold().underline());
    }

    /// Creates a progress bar for copying `total` files out of the folder
    /// named by `prefix`. The bar message shows the file being copied.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use romshelf::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(12, "SNES");
    /// pb.set_message("Zelda (USA).sfc");
    /// pb.inc(1);
    /// pb.finish_and_clear();
    /// ```
    pub fn create_progress_bar(total: u64, prefix: &str) -> ProgressBar {
        let style = ProgressStyle::with_template(COPY_PROGRESS_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        ProgressBar::new(total)
            .with_style(style)
            .with_prefix(prefix.to_string())
    }

    /// Prints a two-column summary of a pass.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use romshelf::output::OutputFormatter;
    ///
    /// OutputFormatter::summary_table("SNES", &[("Matched", 15), ("Unmatched", 2)]);
    /// ```
    pub fn summary_table(title: &str, rows: &[(&str, usize)]) {
        Self::header(title);

        let width = rows
            .iter()
            .map(|(label, _)| label.len())
            .max()
            .unwrap_or(0)
            .max(6);

        println!("{}", "-".repeat(width + 10));
        for (label, count) in rows {
            let file_word = if *count == 1 { "file" } else { "files" };
            let count = if *count == 0 {
                count.to_string().dimmed()
            } else {
                count.to_string().green()
            };
            println!("{:<width$} | {} {}", label, count, file_word, width = width);
        }
        println!("{}", "-".repeat(width + 10));
    }
}
