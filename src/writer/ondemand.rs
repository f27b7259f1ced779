//! On-demand cleartext snapshot writer, triggered by the single-character
//! `d` command (spec.md §4.G).

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::SystemTime;

use crate::aggregator::Aggregator;

use super::{format_row, CSV_HEADER};

/// Writes one cleartext CSV dump of the current aggregator snapshot.
/// Independent of the periodic writer: each call takes its own snapshot.
pub fn write_cleartext_dump(aggregator: &Aggregator, path: &Path) -> std::io::Result<()> {
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);

    writeln!(out, "{CSV_HEADER}")?;
    let now = SystemTime::now();
    for (key, stats) in aggregator.snapshot() {
        writeln!(out, "{}", format_row(&key, &stats, now))?;
    }
    out.flush()
}

/// Runs the interactive command-loop thread: a line of just `d` triggers a
/// dump, anything else is ignored (spec.md §6 CLI surface).
pub fn run_command_loop(aggregator: &Aggregator, path: &Path) {
    let stdin = std::io::stdin();
    let mut line = String::new();
    loop {
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) => return, // stdin closed
            Ok(_) => {
                if line.trim() == "d" {
                    match write_cleartext_dump(aggregator, path) {
                        Ok(()) => tracing::info!("wrote cleartext snapshot to {}", path.display()),
                        Err(e) => tracing::warn!("cleartext dump failed: {e}"),
                    }
                }
            }
            Err(e) => {
                tracing::warn!("command loop stdin read failed: {e}");
                return;
            }
        }
    }
}
