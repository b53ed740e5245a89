use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – figure list and method toggles
// ---------------------------------------------------------------------------

/// Render the left panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Figures");
    ui.separator();

    if state.figures.is_empty() {
        ui.label("No results loaded.");
        return;
    }

    // Clone what we need so we can mutate state inside the loops.
    let figure_names: Vec<String> = state
        .figures
        .iter()
        .map(|f| f.spec.file_stem.clone())
        .collect();
    let methods: Vec<(String, String, Color32)> = state
        .selected_figure()
        .map(|f| {
            f.series
                .iter()
                .map(|s| (s.method.clone(), s.style.name.clone(), s.style.color.to_egui(1.0)))
                .collect()
        })
        .unwrap_or_default();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for (i, name) in figure_names.iter().enumerate() {
                if ui.selectable_label(state.selected == i, name).clicked() {
                    state.select_figure(i);
                }
            }
            ui.separator();

            ui.strong("Methods");
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    state.show_all();
                }
                if ui.small_button("None").clicked() {
                    state.hide_all();
                }
            });

            for (method, label, color) in &methods {
                let mut checked = state.is_visible(method);
                if ui
                    .checkbox(&mut checked, RichText::new(label).color(*color))
                    .changed()
                {
                    state.set_visible(method, checked);
                }
            }
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

        let can_export = !state.figures.is_empty();
        if ui
            .add_enabled(can_export, egui::Button::new("Export"))
            .clicked()
        {
            state.export();
        }

        ui.separator();

        if let Some(src) = &state.source {
            ui.label(format!(
                "{} – {} figure(s)",
                src.display(),
                state.figures.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            let color = if msg.starts_with("Error") {
                Color32::RED
            } else {
                Color32::GRAY
            };
            ui.label(RichText::new(msg).color(color));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open results")
        .add_filter("Supported files", &["json", "csv", "parquet", "pq"])
        .add_filter("JSON", &["json"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.open(&path);
    }
}
