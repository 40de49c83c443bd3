//! # Progress Display Module
//!
//! Renders the live build summary with `indicatif`:
//!
//! ```text
//! Currently processing:
//!   • Assets/textures/wall.png
//!   • Assets/textures/floor_normal.png
//!   • Assets/ui/button.png
//!   ... and 5 more
//!
//! [█████████████████░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░] 42/120 (35.0%)
//! ```
//!
//! In CI mode the live display is hidden entirely and every decorative
//! glyph is replaced by a plain ASCII marker.

use indicatif::{ProgressBar, ProgressState, ProgressStyle};
use std::fmt::Write;

/// Width of the progress bar in cells
pub const BAR_WIDTH: usize = 50;

/// In-flight files listed by name before collapsing into "... and N more"
pub const MAX_LISTED_FILES: usize = 3;

/// Decorative symbols used by the console output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyphs {
    pub bullet: &'static str,
    pub check: &'static str,
    pub warn: &'static str,
    pub bar_full: &'static str,
    pub bar_empty: &'static str,
}

impl Glyphs {
    pub const UNICODE: Glyphs = Glyphs {
        bullet: "•",
        check: "✓",
        warn: "⚠",
        bar_full: "█",
        bar_empty: "░",
    };

    pub const ASCII: Glyphs = Glyphs {
        bullet: "*",
        check: "+",
        warn: "!",
        bar_full: "#",
        bar_empty: "-",
    };

    pub fn for_mode(ci: bool) -> Glyphs {
        if ci {
            Glyphs::ASCII
        } else {
            Glyphs::UNICODE
        }
    }
}

/// Text block listing the files currently being worked on
pub fn active_files_message(active: &[String], glyphs: &Glyphs) -> String {
    if active.is_empty() {
        return String::new();
    }

    let mut lines = vec!["Currently processing:".to_string()];
    for name in active.iter().take(MAX_LISTED_FILES) {
        lines.push(format!("  {} {}", glyphs.bullet, name));
    }
    if active.len() > MAX_LISTED_FILES {
        lines.push(format!("  ... and {} more", active.len() - MAX_LISTED_FILES));
    }
    lines.push(String::new());
    lines.push(String::new());
    lines.join("\n")
}

/// Percentage of `completed` over `total` with one decimal place
pub fn percent_label(completed: u64, total: u64) -> String {
    if total == 0 {
        return "0.0".to_string();
    }
    format!("{:.1}", completed as f64 * 100.0 / total as f64)
}

/// Live progress display for a build
#[derive(Clone)]
pub struct ProgressDisplay {
    bar: ProgressBar,
    glyphs: Glyphs,
}

impl ProgressDisplay {
    /// Create the display; CI mode gets a hidden bar
    pub fn new(total_files: u64, ci: bool) -> Self {
        let glyphs = Glyphs::for_mode(ci);
        let bar = if ci {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(total_files)
        };

        let template = format!("{{msg}}[{{bar:{}}}] {{pos}}/{{len}} ({{percent_decimal}}%)", BAR_WIDTH);
        if let Ok(style) = ProgressStyle::with_template(&template) {
            let style = style
                .with_key("percent_decimal", |state: &ProgressState, w: &mut dyn Write| {
                    let _ = write!(w, "{}", percent_label(state.pos(), state.len().unwrap_or(0)));
                })
                .progress_chars(&format!("{}{}", glyphs.bar_full, glyphs.bar_empty));
            bar.set_style(style);
        }

        Self { bar, glyphs }
    }

    /// A display that never draws
    pub fn hidden() -> Self {
        Self::new(0, true)
    }

    pub fn glyphs(&self) -> &Glyphs {
        &self.glyphs
    }

    /// Redraw with the current counters and in-flight list
    pub fn redraw(&self, completed: usize, active: &[String]) {
        self.bar.set_message(active_files_message(active, &self.glyphs));
        self.bar.set_position(completed as u64);
    }

    /// Print a line without tearing the live display
    pub fn notice(&self, message: &str) {
        self.bar.suspend(|| eprintln!("{}", message));
    }

    /// Remove the live display before the final summary is printed
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
