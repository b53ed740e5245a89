use eframe::egui::Ui;
use egui_plot::{Legend, Line, MarkerShape, Plot, PlotPoints, Points};

use crate::state::AppState;
use crate::style::{LineStyle, Marker};

// ---------------------------------------------------------------------------
// Figure plot (central panel)
// ---------------------------------------------------------------------------

fn marker_shape(marker: Marker) -> MarkerShape {
    match marker {
        Marker::Circle => MarkerShape::Circle,
        Marker::Diamond => MarkerShape::Diamond,
        Marker::Cross => MarkerShape::Cross,
        Marker::Star => MarkerShape::Asterisk,
        Marker::Square => MarkerShape::Square,
    }
}

/// Render the selected figure in the central panel.
pub fn figure_plot(ui: &mut Ui, state: &AppState) {
    let Some(figure) = state.selected_figure() else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a results file to view figures  (File → Open…)");
        });
        return;
    };

    ui.vertical_centered(|ui: &mut Ui| {
        ui.heading(&figure.spec.title);
    });

    let radius = figure.spec.marker_size as f32;

    Plot::new(&figure.spec.file_stem)
        .legend(Legend::default())
        .x_axis_label(figure.spec.x_label.clone())
        .y_axis_label(figure.spec.y_label.clone())
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for series in state.visible_series() {
                let name = &series.style.name;
                let xy: Vec<[f64; 2]> = series.points.iter().map(|&(x, y)| [x, y]).collect();

                if series.draw_line && xy.len() > 1 {
                    let mut line = Line::new(PlotPoints::from(xy.clone()))
                        .name(name)
                        .color(series.style.color.to_egui(0.7))
                        .width(2.0);
                    if series.style.line_style == LineStyle::Dashed {
                        line = line.style(egui_plot::LineStyle::dashed_loose());
                    }
                    plot_ui.line(line);
                }

                let points = Points::new(PlotPoints::from(xy))
                    .name(name)
                    .shape(marker_shape(series.style.marker))
                    .radius(radius)
                    .filled(true)
                    .color(series.style.color.to_egui(1.0));
                plot_ui.points(points);
            }
        });
}
