mod app;
mod color;
mod data;
mod state;
mod ui;

use std::path::Path;

use app::SiniestrosApp;
use eframe::egui;

/// Where the processed dataset lives by convention.
const DEFAULT_DATASET: &str = "data/processed/dataset_limpio.csv";

fn main() -> eframe::Result {
    env_logger::init();

    let mut app = SiniestrosApp::default();

    // Load the conventional dataset path if it exists; the user can always
    // open another file from the menu.
    let default_path = Path::new(DEFAULT_DATASET);
    if default_path.exists() {
        match data::loader::load_file(default_path) {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} victim records from {DEFAULT_DATASET}",
                    dataset.len()
                );
                app.state.set_dataset(dataset);
            }
            Err(e) => {
                log::error!("Failed to load {DEFAULT_DATASET}: {e:#}");
                app.state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 840.0])
            .with_min_inner_size([700.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Siniestros viales fatales (2017-2023)",
        options,
        Box::new(|_cc| Ok(Box::new(app))),
    )
}
