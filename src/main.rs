//! Data Explorer - Migration Tool & Data Visualization
//!
//! Explore CSV/JSON data with interactive charts, and inspect how Clerk
//! users line up with a Convex snapshot.

mod charts;
mod config;
mod data;
mod gui;
mod migration;
mod stats;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use eframe::egui;
use gui::ExplorerApp;
use migration::UserDataComparer;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "data_explorer",
    about = "Data Explorer - Migration Tool & Data Visualization"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Match Clerk users against a Convex snapshot and write the results
    Compare {
        /// Clerk users CSV export
        #[arg(long, default_value = "clerk_users.csv")]
        clerk_csv: PathBuf,
        /// Convex snapshot directory (one folder per table)
        #[arg(long, default_value = "convex_snapshot")]
        convex_snapshot: PathBuf,
        /// Where linked_users.jsonl, unmatched_users.jsonl and sync_report.json go
        #[arg(long, default_value = "output")]
        output: PathBuf,
    },
}

fn run_compare(clerk_csv: PathBuf, convex_snapshot: PathBuf, output: PathBuf) -> Result<()> {
    if !clerk_csv.is_file() {
        bail!("Clerk CSV not found: {}", clerk_csv.display());
    }
    if !convex_snapshot.is_dir() {
        bail!("Convex snapshot directory not found: {}", convex_snapshot.display());
    }

    let report = UserDataComparer::new(clerk_csv, convex_snapshot, &output).run()?;

    println!("{}", migration::sync_report_summary(&report));
    println!("Results written to {}", output.display());
    Ok(())
}

fn run_gui() -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1800.0, 1100.0])
            .with_min_inner_size([1200.0, 800.0])
            .with_title("Data Explorer - Migration Tool & Data Visualization"),
        ..Default::default()
    };

    info!("Starting Data Explorer");
    eframe::run_native(
        "Data Explorer",
        options,
        Box::new(|cc| Ok(Box::new(ExplorerApp::new(cc)))),
    )
    .map_err(|e| anyhow::anyhow!("Failed to start the window: {}", e))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("data_explorer=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Command::Compare {
            clerk_csv,
            convex_snapshot,
            output,
        }) => run_compare(clerk_csv, convex_snapshot, output),
        None => run_gui(),
    }
}
