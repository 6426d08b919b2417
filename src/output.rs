use std::io::{self, Write};

use serde::Serialize;

use crate::app::{BatchReport, ProgressEvent, ProgressSink};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Console,
    Json,
    Quiet,
}

/// Prints progress lines to stdout as they happen.
pub struct ConsoleOutput;

impl ProgressSink for ConsoleOutput {
    fn event(&self, event: ProgressEvent) {
        let mut stdout = io::stdout().lock();
        let written = match event.elapsed {
            Some(elapsed) => writeln!(
                stdout,
                "{}\t({:.1}s)",
                event.message,
                elapsed.as_secs_f64()
            ),
            None => writeln!(stdout, "{}", event.message),
        };
        if let Err(err) = written {
            tracing::debug!("failed to write progress line: {err}");
        }
    }
}

impl ConsoleOutput {
    pub fn print_summary(report: &BatchReport) {
        let rate = if report.attempted == 0 {
            "n/a".to_string()
        } else {
            format!(
                "{:.2}%",
                report.succeeded as f64 * 100.0 / report.attempted as f64
            )
        };
        println!(
            "Resolved {}/{} cited patents ({rate}) across {} categories",
            report.succeeded,
            report.attempted,
            report.categories.len()
        );
        for skipped in &report.skipped {
            println!("Skipped {}: {}", skipped.path, skipped.reason);
        }
    }
}

/// Silent while running; prints the final report as JSON.
pub struct JsonOutput;

impl JsonOutput {
    pub fn print_report(report: &BatchReport) -> io::Result<()> {
        Self::print_json(report)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

/// Drops progress events; only the final summary is printed.
pub struct QuietOutput;

impl ProgressSink for QuietOutput {
    fn event(&self, _event: ProgressEvent) {}
}
