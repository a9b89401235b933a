use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – year / province filters
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filtros");
    ui.separator();

    let dataset = match &state.dataset {
        Some(ds) => ds,
        None => {
            ui.label("No dataset loaded.");
            return;
        }
    };

    // Clone the filter dimensions so we can mutate state inside the loops.
    let years: Vec<i32> = dataset.years.iter().copied().collect();
    let provinces: Vec<String> = dataset.provinces.iter().cloned().collect();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Año ----
            let header = format!("Año  ({}/{})", state.filters.years.len(), years.len());
            egui::CollapsingHeader::new(RichText::new(header).strong())
                .id_salt("year_filter")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    ui.horizontal(|ui: &mut Ui| {
                        if ui.small_button("All").clicked() {
                            state.select_all_years();
                        }
                        if ui.small_button("None").clicked() {
                            state.select_no_years();
                        }
                    });
                    for year in &years {
                        let mut checked = state.filters.years.contains(year);
                        if ui.checkbox(&mut checked, year.to_string()).changed() {
                            state.toggle_year(*year);
                        }
                    }
                });

            // ---- Provincia ----
            let header = format!(
                "Provincia  ({}/{})",
                state.filters.provinces.len(),
                provinces.len()
            );
            egui::CollapsingHeader::new(RichText::new(header).strong())
                .id_salt("province_filter")
                .default_open(false)
                .show(ui, |ui: &mut Ui| {
                    ui.horizontal(|ui: &mut Ui| {
                        if ui.small_button("All").clicked() {
                            state.select_all_provinces();
                        }
                        if ui.small_button("None").clicked() {
                            state.select_no_provinces();
                        }
                    });
                    for province in &provinces {
                        let mut checked = state.filters.provinces.contains(province);
                        if ui.checkbox(&mut checked, province).changed() {
                            state.toggle_province(province);
                        }
                    }
                });
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} victim records loaded, {} after filters",
                ds.len(),
                state.visible_indices.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open accident dataset")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.loading = true;
        match crate::data::loader::load_file(&path) {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} victim records across {} years and {} provinces",
                    dataset.len(),
                    dataset.years.len(),
                    dataset.provinces.len()
                );
                state.set_dataset(dataset);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
                state.loading = false;
            }
        }
    }
}
