//! Interactive prompt flow
//!
//! State machine over the prompts: awaiting-selection -> awaiting-mode
//! -> awaiting-crs -> awaiting-output-name -> processing -> done. Every
//! recoverable error loops back to its prompt; `Q` at the file list and
//! Cancel at the mode prompt exit cleanly with status 0.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use console::style;
use dialoguer::{Confirm, Input, Select};
use geomerge_core::crs::{self, CrsChoice};
use geomerge_core::selection::{parse_selection, Selection};
use geomerge_core::{
    process, progress, scan, CandidateFile, GeomergeError, Mode, ProcessingConfig,
};

use crate::output;
use crate::progress_view;

pub fn run() -> Result<()> {
    output::print_header();

    let cwd = std::env::current_dir()?;
    let files = match scan::scan_directory(&cwd) {
        Ok(files) => files,
        Err(GeomergeError::NoInputFiles { dir }) => {
            output::print_no_inputs(&dir);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    loop {
        let Some(selected) = prompt_selection(&files)? else {
            println!("{}", style("Bye.").dim());
            return Ok(());
        };

        let Some(mode) = prompt_mode()? else {
            println!("{}", style("Operation cancelled.").yellow());
            return Ok(());
        };

        // Transition guard: reproject-only is a single-file operation.
        if mode == Mode::ReprojectOnly && selected.len() != 1 {
            output::print_warning(&format!(
                "Reproject-only works on exactly one file ({} selected); pick again",
                selected.len()
            ));
            continue;
        }

        let crs_choice = if mode.needs_crs() {
            Some(prompt_crs()?)
        } else {
            None
        };

        let output_path = prompt_output_name(mode)?;
        let overwrite = if output_path.exists() {
            let confirmed = Confirm::new()
                .with_prompt(format!(
                    "File '{}' exists. Overwrite?",
                    output_path.display()
                ))
                .default(false)
                .interact()?;
            if !confirmed {
                println!(
                    "{}",
                    style("Operation cancelled; existing file left untouched.").yellow()
                );
                return Ok(());
            }
            true
        } else {
            false
        };

        // Resolve the CRS choice to a concrete spatial reference before
        // the driver runs.
        let target = match crs_choice {
            Some(choice) => {
                let target = crs::resolve_for_files(choice, &selected)?;
                if target.auto_selected {
                    output::print_info(&format!("Auto-selected {}", target.label()));
                }
                Some(target)
            }
            None => None,
        };

        let config = ProcessingConfig {
            mode,
            target,
            output: output_path,
            overwrite,
        };
        return process_and_report(&selected, &config);
    }
}

/// The file-selection prompt. Returns `None` when the user quits.
/// Re-prompts until the selection string is valid (unbounded, per the
/// interactive contract).
fn prompt_selection(files: &[CandidateFile]) -> Result<Option<Vec<CandidateFile>>> {
    output::print_file_list(files);
    loop {
        let input: String = Input::new()
            .with_prompt("Select files (A = all, 1,3,5 or 1-3 = by number, Q = quit)")
            .allow_empty(true)
            .interact()?;
        match parse_selection(&input, files.len()) {
            Ok(Selection::Quit) => return Ok(None),
            Ok(Selection::All) => return Ok(Some(files.to_vec())),
            Ok(Selection::Indices(indices)) => {
                return Ok(Some(indices.into_iter().map(|i| files[i].clone()).collect()))
            }
            Err(e) if e.is_recoverable() => output::print_warning(&e.to_string()),
            Err(e) => return Err(e.into()),
        }
    }
}

/// The mode prompt. Returns `None` on Cancel.
fn prompt_mode() -> Result<Option<Mode>> {
    let items = [
        "Merge only - combine the selected GeoTIFFs into one",
        "Reproject only - change the coordinate system of one file",
        "Merge and reproject - mosaic first, then warp once",
        "Cancel",
    ];
    let choice = Select::new()
        .with_prompt("Processing mode")
        .items(&items)
        .default(2)
        .interact()?;
    Ok(match choice {
        0 => Some(Mode::MergeOnly),
        1 => Some(Mode::ReprojectOnly),
        2 => Some(Mode::MergeReproject),
        _ => None,
    })
}

/// The target-CRS prompt. An invalid custom EPSG code re-prompts.
fn prompt_crs() -> Result<CrsChoice> {
    let items = [
        "WGS84 (EPSG:4326) - web maps, Google Earth",
        "UTM zone - automatic from image location",
        "Custom EPSG code",
        "Keep original CRS",
    ];
    let choice = Select::new()
        .with_prompt("Target coordinate system")
        .items(&items)
        .default(0)
        .interact()?;
    match choice {
        0 => Ok(CrsChoice::Wgs84),
        1 => Ok(CrsChoice::AutoUtm),
        2 => loop {
            let code: u32 = Input::new()
                .with_prompt("EPSG code (e.g. 3857)")
                .interact()?;
            match crs::validate_epsg(code) {
                Ok(()) => return Ok(CrsChoice::Epsg(code)),
                Err(e) => output::print_warning(&e.to_string()),
            }
        },
        _ => Ok(CrsChoice::Keep),
    }
}

fn prompt_output_name(mode: Mode) -> Result<PathBuf> {
    let name: String = Input::new()
        .with_prompt("Output filename")
        .default(mode.default_output_name().to_string())
        .interact()?;
    Ok(PathBuf::from(name))
}

fn process_and_report(files: &[CandidateFile], config: &ProcessingConfig) -> Result<()> {
    println!();
    let started = Instant::now();

    let (tx, rx) = progress::progress_channel(64);
    let printer = progress_view::spawn(rx);

    let result = process::run(files, config, &tx);

    // Close the channel so the printer drains and exits, then join it
    // before touching the terminal again.
    drop(tx);
    let _ = printer.join();

    match result {
        Ok(summary) => {
            let min_max = process::sample_min_max(&summary.path).ok().flatten();
            output::print_summary(&summary, min_max, started.elapsed());
            Ok(())
        }
        // Fatal errors surface once, at the binary boundary in main.
        Err(e) => Err(e.into()),
    }
}
