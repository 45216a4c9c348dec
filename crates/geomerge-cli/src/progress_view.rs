//! Progress-drain thread
//!
//! Single consumer of the driver's bounded event channel. Printing here
//! is decoupled from raster I/O; the thread exits when the sender is
//! dropped.

use std::sync::mpsc::Receiver;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use console::style;
use geomerge_core::progress::ProgressEvent;
use indicatif::{ProgressBar, ProgressStyle};

pub fn spawn(rx: Receiver<ProgressEvent>) -> JoinHandle<()> {
    thread::spawn(move || {
        let pb = create_spinner();
        for event in rx {
            match event {
                ProgressEvent::Opening { index, total, name } => {
                    pb.set_message(format!("Opening file {}/{}: {}", index, total, name));
                }
                ProgressEvent::Merging { index, total, name } => {
                    pb.set_message(format!("Merging {}/{}: {}", index, total, basename(&name)));
                }
                ProgressEvent::MosaicReady {
                    width,
                    height,
                    bands,
                } => {
                    pb.println(format!(
                        "  Mosaic grid: {}x{} pixels, {} band(s)",
                        width, height, bands
                    ));
                }
                ProgressEvent::Reprojecting { target } => {
                    pb.set_message(format!("Reprojecting to {}", target));
                }
                ProgressEvent::Writing { path } => {
                    pb.set_message(format!("Writing {}", path.display()));
                }
                ProgressEvent::Warning(message) => {
                    pb.println(format!("  {} {}", style("⚠").yellow().bold(), message));
                }
            }
        }
        pb.finish_and_clear();
    })
}

fn create_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.blue} {msg}")
            .unwrap()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn basename(path: &str) -> String {
    std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}
