//! mdpreview - native markdown previewer
//!
//! Renders markdown with a table of contents that follows the scroll
//! position, plus theme switching, fullscreen, drag-and-drop and printing.

mod app;
mod core;
mod ui;

use std::path::PathBuf;

use app::PreviewApp;
use eframe::egui;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> eframe::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::filter::LevelFilter::INFO)
        .init();

    tracing::info!("Starting mdpreview...");

    let initial_file = std::env::args_os().nth(1).map(PathBuf::from);

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 800.0])
            .with_min_inner_size([600.0, 400.0])
            .with_drag_and_drop(true)
            .with_title("mdpreview"),
        ..Default::default()
    };

    eframe::run_native(
        "mdpreview",
        native_options,
        Box::new(|cc| Ok(Box::new(PreviewApp::new(cc, initial_file)))),
    )
}
