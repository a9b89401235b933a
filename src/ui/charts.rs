use chrono::NaiveDate;
use eframe::egui::{RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints, Points};

use crate::color::{CategoryColors, MAP_COLOR, MM12_COLOR, VICTIMS_COLOR};
use crate::data::aggregate::Kpis;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Central panel – the dashboard
// ---------------------------------------------------------------------------

/// Render the full dashboard in the central panel.
pub fn dashboard(ui: &mut Ui, state: &AppState) {
    let dataset = match &state.dataset {
        Some(ds) => ds,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Open a dataset to explore  (File → Open…)");
            });
            return;
        }
    };

    let views = match &state.views {
        Some(v) => v,
        None => {
            // Empty filtered selection: halt before any aggregate rendering.
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("No hay datos con los filtros seleccionados. Ajuste Año/Provincia.");
            });
            return;
        }
    };

    ScrollArea::vertical().show(ui, |ui: &mut Ui| {
        ui.heading("Análisis exploratorio de siniestros viales fatales (2017–2023)");
        ui.label(
            RichText::new("Fuente: datos.gob.ar | Sistema de Alerta Temprana (SAT) | Unidad de análisis: víctimas fatales")
                .small(),
        );
        ui.separator();

        ui.strong("KPIs claves");
        kpi_row(ui, &views.kpis);
        ui.separator();

        ui.strong("Vista general del dataset");
        preview_table(ui, state, dataset);
        ui.separator();

        ui.strong("Evolución mensual de víctimas (MM12)");
        monthly_chart(ui, &views.monthly);
        ui.label(
            RichText::new(
                "Se observa un quiebre marcado en 2020: la serie cae abruptamente y luego \
                 muestra recuperación gradual.",
            )
            .small(),
        );
        ui.separator();

        ui.strong("Estacionalidad: promedio de víctimas por mes");
        seasonality_chart(ui, &views.seasonality);
        ui.separator();

        ui.strong("Top provincias por víctimas (según filtros)");
        top_provinces_chart(ui, &views.top_provinces);
        ui.separator();

        ui.strong("Víctimas según el tipo de vehículo");
        vehicles_chart(ui, &views.top_vehicles);
        ui.separator();

        ui.strong("Mapa geográfico (solo registros con coordenadas válidas)");
        map_chart(ui, &views.geo_points);
    });
}

// ---------------------------------------------------------------------------
// KPI cards
// ---------------------------------------------------------------------------

fn kpi_row(ui: &mut Ui, kpis: &Kpis) {
    ui.columns(4, |cols: &mut [Ui]| {
        metric(
            &mut cols[0],
            "Total víctimas (registros)",
            format_thousands(kpis.total_victims),
        );
        metric(
            &mut cols[1],
            "Total siniestros (id únicos)",
            kpis.total_incidents
                .map(format_thousands)
                .unwrap_or_else(|| "—".to_string()),
        );
        metric(
            &mut cols[2],
            "Cobertura del mapa (% coordenadas)",
            format!("{:.1}%", kpis.geo_coverage_pct),
        );
        metric(
            &mut cols[3],
            "Rango etario más frecuente",
            kpis.top_age_bracket
                .as_ref()
                .map(|bracket| format!("{bracket} años"))
                .unwrap_or_else(|| "—".to_string()),
        );
    });
}

fn metric(ui: &mut Ui, label: &str, value: String) {
    ui.vertical(|ui: &mut Ui| {
        ui.label(RichText::new(label).small());
        ui.heading(value);
    });
}

/// Format a count with dot thousands separators (es-AR convention).
fn format_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

// ---------------------------------------------------------------------------
// Preview table (first rows of the filtered set)
// ---------------------------------------------------------------------------

const PREVIEW_ROWS: usize = 10;

fn preview_table(ui: &mut Ui, state: &AppState, dataset: &crate::data::model::AccidentDataset) {
    let dash = "—";
    TableBuilder::new(ui)
        .striped(true)
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::remainder())
        .header(18.0, |mut header| {
            for title in ["Año", "Mes", "Provincia", "Rango etario", "Vehículo"] {
                header.col(|ui: &mut Ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|mut body| {
            for &idx in state.visible_indices.iter().take(PREVIEW_ROWS) {
                let rec = &dataset.records[idx];
                body.row(18.0, |mut row| {
                    row.col(|ui: &mut Ui| {
                        ui.label(rec.year.map_or(dash.to_string(), |y| y.to_string()));
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(rec.month.map_or(dash.to_string(), |m| m.to_string()));
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(rec.province.as_deref().unwrap_or(dash));
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(rec.age_bracket.as_deref().unwrap_or(dash));
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(rec.vehicle.as_deref().unwrap_or(dash));
                    });
                });
            }
        });
}

// ---------------------------------------------------------------------------
// Monthly time series + MM12
// ---------------------------------------------------------------------------

fn monthly_chart(ui: &mut Ui, monthly: &[crate::data::aggregate::MonthlyPoint]) {
    use chrono::Datelike;

    let victims: PlotPoints = monthly
        .iter()
        .map(|p| [p.date.num_days_from_ce() as f64, p.victims as f64])
        .collect();
    let mm12: PlotPoints = monthly
        .iter()
        .map(|p| [p.date.num_days_from_ce() as f64, p.mm12])
        .collect();

    Plot::new("monthly_series")
        .height(260.0)
        .legend(Legend::default())
        .x_axis_formatter(|mark, _range| {
            NaiveDate::from_num_days_from_ce_opt(mark.value.round() as i32)
                .map(|d| format!("{}-{:02}", d.year(), d.month()))
                .unwrap_or_default()
        })
        .y_axis_label("Víctimas")
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new(victims).name("victimas").color(VICTIMS_COLOR).width(1.5));
            plot_ui.line(Line::new(mm12).name("mm_12").color(MM12_COLOR).width(2.0));
        });
}

// ---------------------------------------------------------------------------
// Seasonality bars
// ---------------------------------------------------------------------------

fn seasonality_chart(ui: &mut Ui, seasonality: &[(u32, f64)]) {
    let bars: Vec<Bar> = seasonality
        .iter()
        .map(|&(month, avg)| Bar::new(month as f64, avg).width(0.7).fill(VICTIMS_COLOR))
        .collect();

    Plot::new("seasonality")
        .height(220.0)
        .x_axis_formatter(|mark, _range| {
            let month = mark.value.round();
            if (1.0..=12.0).contains(&month) && (mark.value - month).abs() < 1e-6 {
                format!("{month:.0}")
            } else {
                String::new()
            }
        })
        .y_axis_label("Promedio de víctimas")
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name("promedio"));
        });
}

// ---------------------------------------------------------------------------
// Ranking bars
// ---------------------------------------------------------------------------

fn top_provinces_chart(ui: &mut Ui, ranking: &[(String, u64)]) {
    let colors = CategoryColors::new(ranking.iter().map(|(label, _)| label.as_str()));
    let labels: Vec<String> = ranking.iter().map(|(label, _)| label.clone()).collect();

    // Horizontal bars, largest count on top.
    let bars: Vec<Bar> = ranking
        .iter()
        .enumerate()
        .map(|(i, (label, count))| {
            Bar::new((ranking.len() - 1 - i) as f64, *count as f64)
                .width(0.7)
                .name(label)
                .fill(colors.color_for(label))
        })
        .collect();

    let n = labels.len();
    Plot::new("top_provinces")
        .height(320.0)
        .y_axis_formatter(move |mark, _range| {
            let pos = mark.value.round();
            if pos >= 0.0 && (mark.value - pos).abs() < 1e-6 && (pos as usize) < n {
                labels[n - 1 - pos as usize].clone()
            } else {
                String::new()
            }
        })
        .x_axis_label("Víctimas")
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).horizontal());
        });
}

fn vehicles_chart(ui: &mut Ui, ranking: &[(String, u64)]) {
    let colors = CategoryColors::new(ranking.iter().map(|(label, _)| label.as_str()));
    let labels: Vec<String> = ranking.iter().map(|(label, _)| label.clone()).collect();

    let bars: Vec<Bar> = ranking
        .iter()
        .enumerate()
        .map(|(i, (label, count))| {
            Bar::new(i as f64, *count as f64)
                .width(0.7)
                .name(label)
                .fill(colors.color_for(label))
        })
        .collect();

    Plot::new("vehicles")
        .height(260.0)
        .x_axis_formatter(move |mark, _range| {
            let pos = mark.value.round();
            if pos >= 0.0 && (mark.value - pos).abs() < 1e-6 && (pos as usize) < labels.len() {
                truncate_label(&labels[pos as usize], 14)
            } else {
                String::new()
            }
        })
        .y_axis_label("Víctimas")
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars));
        });
}

fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        label.to_string()
    } else {
        let head: String = label.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{head}…")
    }
}

// ---------------------------------------------------------------------------
// Point map
// ---------------------------------------------------------------------------

fn map_chart(ui: &mut Ui, geo_points: &[[f64; 2]]) {
    if geo_points.is_empty() {
        ui.label("No hay registros georreferenciados para los filtros seleccionados.");
        return;
    }

    Plot::new("geo_map")
        .height(420.0)
        .data_aspect(1.0)
        .x_axis_label("Longitud")
        .y_axis_label("Latitud")
        .show(ui, |plot_ui| {
            plot_ui.points(
                Points::new(PlotPoints::from(geo_points.to_vec()))
                    .radius(1.8)
                    .color(MAP_COLOR)
                    .name("víctimas"),
            );
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousands_are_dot_separated() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1000), "1.000");
        assert_eq!(format_thousands(1234567), "1.234.567");
    }

    #[test]
    fn long_labels_are_truncated_with_ellipsis() {
        assert_eq!(truncate_label("moto", 14), "moto");
        assert_eq!(truncate_label("transporte de carga pesada", 14), "transporte de…");
    }
}
