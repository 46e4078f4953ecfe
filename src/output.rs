//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Each file leads with its positional index and its path relative to the
//! source root. What happened to it follows as indented context lines: one
//! `→` line per produced file with its size and the change against the input,
//! or the pass-through / failure reason.
//!
//! ```text
//! 001 photos/dawn.png (48.2 KB)
//!     → photos/dawn.webp 20.1 KB (-58%)
//!     → photos/dawn.avif 9.7 KB (-80%)
//! 002 photos/notes.txt
//!     passed through
//! 003 photos/broken.png (1.0 KB)
//!     failed: decode failed: ...
//!
//! 3 files: 1 squashed (2 outputs), 1 passed through, 1 failed
//! ```
//!
//! # Architecture
//!
//! `format_*` functions return `Vec<String>` (or `String`) for testability and
//! `print_*` wrappers write to stdout. Format functions are pure.

use crate::transform::{FileState, StageEvent};
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Human-readable byte count.
pub fn format_size(bytes: usize) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

/// Signed percentage change from `before` to `after`.
fn format_change(before: usize, after: usize) -> String {
    if before == 0 {
        return String::new();
    }
    let pct = (after as f64 - before as f64) / before as f64 * 100.0;
    format!(" ({:+.0}%)", pct)
}

fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

/// Format a single stage event as display lines.
pub fn format_stage_event(index: usize, event: &StageEvent, root: &Path) -> Vec<String> {
    let path = display_path(&event.path, root);
    let header = match (&event.state, event.input_size) {
        (FileState::PassedThrough, _) | (_, 0) => format!("{} {}", format_index(index), path),
        _ => format!(
            "{} {} ({})",
            format_index(index),
            path,
            format_size(event.input_size)
        ),
    };

    let mut lines = vec![header];
    match &event.state {
        FileState::PassedThrough => lines.push(format!("{}passed through", indent(1))),
        FileState::Emitted(outputs) => {
            for output in outputs {
                lines.push(format!(
                    "{}\u{2192} {} {}{}",
                    indent(1),
                    display_path(&output.path, root),
                    format_size(output.size),
                    format_change(event.input_size, output.size)
                ));
            }
        }
        FileState::Failed(reason) => lines.push(format!("{}failed: {}", indent(1), reason)),
    }
    lines
}

/// Print a stage event to stdout.
pub fn print_stage_event(index: usize, event: &StageEvent, root: &Path) {
    for line in format_stage_event(index, event, root) {
        println!("{}", line);
    }
}

/// Running totals over a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub files: usize,
    pub squashed: usize,
    pub outputs: usize,
    pub passed_through: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn record(&mut self, event: &StageEvent) {
        self.files += 1;
        match &event.state {
            FileState::PassedThrough => self.passed_through += 1,
            FileState::Emitted(outputs) => {
                self.squashed += 1;
                self.outputs += outputs.len();
            }
            FileState::Failed(_) => self.failed += 1,
        }
    }
}

/// One-line run summary.
pub fn format_summary(summary: &RunSummary) -> String {
    format!(
        "{} files: {} squashed ({} outputs), {} passed through, {} failed",
        summary.files, summary.squashed, summary.outputs, summary.passed_through, summary.failed
    )
}
