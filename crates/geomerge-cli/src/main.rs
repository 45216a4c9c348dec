//! geomerge - interactive GeoTIFF merge and reprojection tool
//!
//! Fully interactive: no flags or subcommands. The prompt flow lives in
//! [`flow`], progress printing in [`progress_view`].

mod flow;
mod output;
mod progress_view;

fn main() {
    // Interactive output owns the terminal, so default logging to warn.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    if let Err(e) = flow::run() {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}
