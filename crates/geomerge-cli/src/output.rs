//! Terminal presentation helpers

use std::path::Path;
use std::time::Duration;

use console::style;
use geomerge_core::{CandidateFile, OutputSummary};

pub fn print_header() {
    println!("{}", style("=".repeat(60)).dim());
    println!("{}", style("  GeoTIFF processing tool").bold());
    println!("{}", style("=".repeat(60)).dim());
}

pub fn print_no_inputs(dir: &Path) {
    println!();
    print_warning(&format!("No GeoTIFF files found in {}", dir.display()));
    println!("Place your .tif files there and run again.");
}

pub fn print_file_list(files: &[CandidateFile]) {
    println!("\n{}", style("Files in current folder:").bold());
    for (i, file) in files.iter().enumerate() {
        match &file.info {
            Some(info) => println!(
                "{:>3}. {:<40} | {:>7.1} MB | {:>5}x{:<5} | {}",
                i + 1,
                truncate(&file.file_name(), 40),
                file.size_mb(),
                info.width,
                info.height,
                info.crs.as_deref().unwrap_or("no CRS"),
            ),
            None => println!(
                "{:>3}. {:<40} | {}",
                i + 1,
                truncate(&file.file_name(), 40),
                style("(cannot read)").red(),
            ),
        }
    }
    println!();
}

pub fn print_info(message: &str) {
    println!("{} {}", style("ℹ").blue().bold(), message);
}

pub fn print_warning(message: &str) {
    eprintln!("{} {}", style("⚠").yellow().bold(), message);
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), message);
}

pub fn print_summary(summary: &OutputSummary, min_max: Option<(f64, f64)>, elapsed: Duration) {
    println!(
        "\n{} {}",
        style("✓").green().bold(),
        style("Processing complete").bold()
    );
    println!("  Name:       {}", summary.path.display());
    println!(
        "  Size:       {:.1} MB",
        summary.size_bytes as f64 / 1024.0 / 1024.0
    );
    println!(
        "  Dimensions: {} x {} pixels",
        summary.width, summary.height
    );
    println!("  Bands:      {}", summary.bands);
    println!("  CRS:        {}", summary.crs.as_deref().unwrap_or("unknown"));
    println!("  Data type:  {}", summary.data_type);
    if let Some((lo, hi)) = min_max {
        println!("  Sample min/max: {:.1} / {:.1}", lo, hi);
    }
    let secs = elapsed.as_secs();
    println!("  Elapsed:    {}m {}s", secs / 60, secs % 60);
}

fn truncate(name: &str, max: usize) -> String {
    if name.chars().count() <= max {
        name.to_string()
    } else {
        let mut out: String = name.chars().take(max - 1).collect();
        out.push('…');
        out
    }
}
