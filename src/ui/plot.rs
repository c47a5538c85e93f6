use std::f64::consts::TAU;

use eframe::egui::{self, Color32, RichText, Stroke, Ui};
use egui_plot::{
    Bar, BarChart, BoxElem, BoxPlot, BoxSpread, Legend, Line, Plot, PlotPoint, Points,
    Polygon, Text,
};

use crate::chart::projection::{Camera, Normalizer, cube_edges};
use crate::chart::{self, ChartData, ChartKind, Group, MATRIX_FIELDS};
use crate::color::{self, ColorMap};
use crate::data::model::Schema;
use crate::state::AppState;

const CHART_HEIGHT: f32 = 320.0;

// ---------------------------------------------------------------------------
// Chart list (central panel)
// ---------------------------------------------------------------------------

/// Render every enabled chart against the current filtered view.
pub fn charts_panel(ui: &mut Ui, state: &mut AppState) {
    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a stroke dataset to begin  (File → Open…)");
        });
        return;
    }

    let pie_title = chart::pie_title(&state.selection);
    let charts: Vec<ChartKind> = state.enabled_charts.iter().copied().collect();
    let AppState {
        chart_data,
        chart_options,
        color_map,
        camera,
        ..
    } = state;
    let colors = SeriesStyle {
        map: color_map.as_ref(),
        schema: Schema::stroke(),
        color_by: &chart_options.color_by,
    };

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for chart in charts {
                let title = match chart {
                    ChartKind::Pie => pie_title.clone(),
                    other => other.title().to_string(),
                };
                ui.heading(title);

                if chart_data.is_empty() {
                    ui.label(RichText::new("No data matches the current filters.").italics());
                    ui.separator();
                    continue;
                }

                match chart {
                    ChartKind::Scatter3d => scatter_3d(ui, chart_data, &colors, camera),
                    ChartKind::DensityContour => density_contour(ui, chart_data, &colors),
                    ChartKind::Pie => outcome_pie(ui, chart_data),
                    ChartKind::Bar => glucose_bars(ui, chart_data, &colors, chart_options.glucose_range),
                    ChartKind::Box => box_plot(ui, chart_data, &chart_options.box_value),
                    ChartKind::Violin => violin_plot(ui, chart_data, &colors),
                    ChartKind::Sunburst => sunburst(ui, chart_data),
                    ChartKind::ScatterMatrix => scatter_matrix(ui, chart_data, &colors),
                }
                ui.separator();
            }
        });
}

/// Colour and legend naming for series grouped by the colour-by field.
struct SeriesStyle<'a> {
    map: Option<&'a ColorMap>,
    schema: Schema,
    color_by: &'a str,
}

impl SeriesStyle<'_> {
    fn color<T>(&self, group: &Group<T>) -> Color32 {
        self.map
            .map(|m| m.color_for(&group.key))
            .unwrap_or(Color32::LIGHT_BLUE)
    }

    fn name<T>(&self, group: &Group<T>) -> String {
        format!("{} = {}", self.schema.label_of(self.color_by), group.key)
    }
}

// ---------------------------------------------------------------------------
// 3D scatter
// ---------------------------------------------------------------------------

fn scatter_3d(ui: &mut Ui, data: &ChartData, colors: &SeriesStyle<'_>, camera: &mut Camera) {
    ui.horizontal(|ui: &mut Ui| {
        ui.add(egui::Slider::new(&mut camera.yaw, -180.0..=180.0).text("rotate"));
        ui.add(egui::Slider::new(&mut camera.pitch, -90.0..=90.0).text("tilt"));
    });

    let all: Vec<[f64; 3]> = data.scatter3d.iter().flat_map(|g| g.data.iter().copied()).collect();
    let Some(norm) = Normalizer::from_points(&all) else {
        ui.label("No rows with age, glucose and BMI all present.");
        return;
    };
    let cam = *camera;

    Plot::new("scatter_3d")
        .height(CHART_HEIGHT)
        .data_aspect(1.0)
        .show_axes(false)
        .show_grid(false)
        .legend(Legend::default())
        .show(ui, |plot_ui| {
            for [a, b] in cube_edges() {
                plot_ui.line(
                    Line::new(vec![cam.project(a), cam.project(b)])
                        .color(Color32::from_gray(120))
                        .width(0.5),
                );
            }
            for (axis, label) in ["Age", "Average Glucose Level", "BMI"].into_iter().enumerate() {
                let mut tip = [-1.0, -1.0, -1.0];
                tip[axis] = 1.15;
                let [x, y] = cam.project(tip);
                let (lo, hi) = norm.extent(axis);
                plot_ui.text(Text::new(
                    PlotPoint::new(x, y),
                    RichText::new(format!("{label} ({lo:.0}–{hi:.0})")).small(),
                ));
            }
            for group in &data.scatter3d {
                let projected: Vec<[f64; 2]> = group
                    .data
                    .iter()
                    .map(|&p| cam.project(norm.normalize(p)))
                    .collect();
                plot_ui.points(
                    Points::new(projected)
                        .radius(2.0)
                        .color(colors.color(group))
                        .name(colors.name(group)),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Density contour
// ---------------------------------------------------------------------------

fn density_contour(ui: &mut Ui, data: &ChartData, colors: &SeriesStyle<'_>) {
    Plot::new("density_contour")
        .height(CHART_HEIGHT)
        .x_axis_label("Age")
        .y_axis_label("Average Glucose Level")
        .legend(Legend::default())
        .show(ui, |plot_ui| {
            for group in &data.contours {
                let color = colors.color(group);
                let name = colors.name(group);
                for (k, segments) in group.data.iter().enumerate() {
                    let width = 1.0 + k as f32 * 0.3;
                    for [a, b] in segments {
                        plot_ui.line(
                            Line::new(vec![*a, *b])
                                .color(color)
                                .width(width)
                                .name(&name),
                        );
                    }
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Pie
// ---------------------------------------------------------------------------

/// Closed wedge (or ring sector when `inner > 0`) between two turn fractions,
/// cut into narrow slices so each polygon stays convex enough to fill.
fn sector(inner: f64, outer: f64, start: f64, end: f64) -> Vec<Vec<[f64; 2]>> {
    const SLICE: f64 = 1.0 / 64.0;
    let at = |r: f64, t: f64| {
        // Twelve o'clock, clockwise.
        let angle = TAU * (0.25 - t);
        [r * angle.cos(), r * angle.sin()]
    };
    let slices = ((end - start) / SLICE).ceil().max(1.0) as usize;
    (0..slices)
        .map(|i| {
            let a = start + (end - start) * i as f64 / slices as f64;
            let b = start + (end - start) * (i + 1) as f64 / slices as f64;
            let mid = (a + b) / 2.0;
            let mut pts = vec![at(outer, a), at(outer, mid), at(outer, b)];
            if inner > 0.0 {
                pts.extend([at(inner, b), at(inner, mid), at(inner, a)]);
            } else {
                pts.push([0.0, 0.0]);
            }
            pts
        })
        .collect()
}

fn outcome_pie(ui: &mut Ui, data: &ChartData) {
    let total: usize = data.outcome_counts.iter().map(|(_, n)| n).sum();
    if total == 0 {
        return;
    }
    Plot::new("outcome_pie")
        .height(CHART_HEIGHT)
        .data_aspect(1.0)
        .show_axes(false)
        .show_grid(false)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .legend(Legend::default())
        .show(ui, |plot_ui| {
            let mut cursor = 0.0;
            for (value, count) in &data.outcome_counts {
                let share = *count as f64 / total as f64;
                let fill = color::outcome_color(value);
                for slice in sector(0.0, 1.0, cursor, cursor + share) {
                    plot_ui.polygon(
                        Polygon::new(slice)
                            .fill_color(fill)
                            .stroke(Stroke::new(0.5, fill))
                            .name(format!("stroke = {value}")),
                    );
                }
                let mid = TAU * (0.25 - (cursor + share / 2.0));
                plot_ui.text(Text::new(
                    PlotPoint::new(0.6 * mid.cos(), 0.6 * mid.sin()),
                    RichText::new(format!("{:.1}%", share * 100.0)).color(Color32::WHITE).strong(),
                ));
                cursor += share;
            }
        });
}

// ---------------------------------------------------------------------------
// Glucose bars
// ---------------------------------------------------------------------------

fn glucose_bars(ui: &mut Ui, data: &ChartData, colors: &SeriesStyle<'_>, pinned: Option<(f64, f64)>) {
    let mut plot = Plot::new("glucose_bars")
        .height(CHART_HEIGHT)
        .x_axis_label("Average Glucose Level")
        .y_axis_label("Patients")
        .legend(Legend::default());
    if let Some((lo, hi)) = pinned {
        plot = plot.include_x(lo).include_x(hi);
    }
    plot.show(ui, |plot_ui| {
        let mut stacked: Vec<BarChart> = Vec::new();
        for group in &data.glucose_bars {
            let bars: Vec<Bar> = group
                .data
                .iter()
                .map(|bin| {
                    Bar::new(bin.center(), bin.count as f64)
                        .width(bin.width() * 0.95)
                        .name(format!("{:.0}–{:.0}", bin.start, bin.end))
                })
                .collect();
            let below: Vec<&BarChart> = stacked.iter().collect();
            let chart = BarChart::new(bars)
                .color(colors.color(group))
                .name(colors.name(group))
                .stack_on(&below);
            stacked.push(chart);
        }
        for chart in stacked {
            plot_ui.bar_chart(chart);
        }
    });
}

// ---------------------------------------------------------------------------
// Box
// ---------------------------------------------------------------------------

fn box_plot(ui: &mut Ui, data: &ChartData, value_field: &str) {
    let labels: Vec<String> = data.boxes.iter().map(|g| g.key.to_string()).collect();
    let palette = color::generate_palette(data.boxes.len());

    Plot::new("box_plot")
        .height(CHART_HEIGHT)
        .y_axis_label(Schema::stroke().label_of(value_field).to_string())
        .x_axis_formatter(move |mark, _range| {
            let idx = mark.value.round();
            if (mark.value - idx).abs() < 1e-6 && idx >= 0.0 {
                labels.get(idx as usize).cloned().unwrap_or_default()
            } else {
                String::new()
            }
        })
        .show(ui, |plot_ui| {
            for (i, (group, color)) in data.boxes.iter().zip(&palette).enumerate() {
                let s = &group.data;
                let x = i as f64;
                let elem = BoxElem::new(
                    x,
                    BoxSpread::new(s.lower_whisker, s.q1, s.median, s.q3, s.upper_whisker),
                )
                .name(format!("{} (n={})", group.key, s.count))
                .fill(color.gamma_multiply(0.4))
                .stroke(Stroke::new(1.5, *color))
                .box_width(0.6);
                plot_ui.box_plot(BoxPlot::new(vec![elem]).color(*color));

                if !s.outliers.is_empty() {
                    let outliers: Vec<[f64; 2]> = s.outliers.iter().map(|&v| [x, v]).collect();
                    plot_ui.points(Points::new(outliers).radius(1.5).color(*color));
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Violin
// ---------------------------------------------------------------------------

fn violin_plot(ui: &mut Ui, data: &ChartData, colors: &SeriesStyle<'_>) {
    let peak = data
        .violins
        .iter()
        .flat_map(|g| g.data.curve.iter().map(|p| p[1]))
        .fold(0.0, f64::max);
    if peak <= 0.0 {
        return;
    }
    let scale = 0.4 / peak;

    Plot::new("violin_plot")
        .height(CHART_HEIGHT)
        .y_axis_label("Age")
        .show_axes([false, true])
        .legend(Legend::default())
        .show(ui, |plot_ui| {
            for (i, group) in data.violins.iter().enumerate() {
                let x = i as f64;
                let color = colors.color(group);
                let curve = &group.data.curve;
                let mut outline: Vec<[f64; 2]> = curve.iter().map(|&[y, d]| [x + d * scale, y]).collect();
                outline.extend(curve.iter().rev().map(|&[y, d]| [x - d * scale, y]));
                plot_ui.polygon(
                    Polygon::new(outline)
                        .fill_color(color.gamma_multiply(0.35))
                        .stroke(Stroke::new(1.5, color))
                        .name(colors.name(group)),
                );
                if let Some(s) = &group.data.summary {
                    plot_ui.line(
                        Line::new(vec![[x, s.q1], [x, s.q3]])
                            .color(color)
                            .width(5.0),
                    );
                    plot_ui.points(
                        Points::new(vec![[x, s.median]])
                            .radius(3.0)
                            .color(Color32::WHITE),
                    );
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Sunburst
// ---------------------------------------------------------------------------

fn sunburst(ui: &mut Ui, data: &ChartData) {
    let families = data.sunburst.iter().map(|a| a.family + 1).max().unwrap_or(0);
    let palette = color::generate_palette(families);

    Plot::new("sunburst")
        .height(CHART_HEIGHT + 80.0)
        .data_aspect(1.0)
        .show_axes(false)
        .show_grid(false)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for arc in &data.sunburst {
                let inner = 0.3 + arc.depth as f64;
                let outer = inner + 1.0;
                let base = palette.get(arc.family).copied().unwrap_or(Color32::GRAY);
                let fill = color::lighten(base, 0.25 * arc.depth as f32);
                for slice in sector(inner, outer, arc.start, arc.end) {
                    plot_ui.polygon(
                        Polygon::new(slice)
                            .fill_color(fill)
                            .stroke(Stroke::new(0.5, fill))
                            .name(format!("{} ({})", arc.label, arc.count)),
                    );
                }
                if arc.end - arc.start > 0.04 {
                    let mid = TAU * (0.25 - (arc.start + arc.end) / 2.0);
                    let r = (inner + outer) / 2.0;
                    plot_ui.text(Text::new(
                        PlotPoint::new(r * mid.cos(), r * mid.sin()),
                        RichText::new(&arc.label).small().color(Color32::BLACK),
                    ));
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Scatterplot matrix
// ---------------------------------------------------------------------------

fn scatter_matrix(ui: &mut Ui, data: &ChartData, colors: &SeriesStyle<'_>) {
    let n = MATRIX_FIELDS.len();
    let cell = ((ui.available_width() - 24.0) / n as f32).clamp(120.0, 260.0);
    let schema = Schema::stroke();

    egui::Grid::new("scatter_matrix")
        .spacing([4.0, 4.0])
        .show(ui, |ui: &mut Ui| {
            for row in 0..n {
                for col in 0..n {
                    let mut plot = Plot::new(format!("splom_{row}_{col}"))
                        .width(cell)
                        .height(cell)
                        .show_axes([row == n - 1, col == 0])
                        .allow_drag(false)
                        .allow_scroll(false);
                    if row == n - 1 {
                        plot = plot.x_axis_label(schema.label_of(MATRIX_FIELDS[col]).to_string());
                    }
                    if col == 0 {
                        plot = plot.y_axis_label(schema.label_of(MATRIX_FIELDS[row]).to_string());
                    }
                    plot.show(ui, |plot_ui| {
                        for group in &data.matrix {
                            let color = colors.color(group);
                            if row == col {
                                let values: Vec<f64> = group.data.iter().filter_map(|r| r[col]).collect();
                                let all: Vec<f64> =
                                    data.matrix.iter().flat_map(|g| g.data.iter().filter_map(|r| r[col])).collect();
                                let Some(range) = chart::span(&all) else {
                                    continue;
                                };
                                let bars: Vec<Bar> = chart::aggregate::histogram(&values, range, 20)
                                    .iter()
                                    .map(|b| Bar::new(b.center(), b.count as f64).width(b.width()))
                                    .collect();
                                plot_ui.bar_chart(BarChart::new(bars).color(color.gamma_multiply(0.6)));
                            } else {
                                let points: Vec<[f64; 2]> = group
                                    .data
                                    .iter()
                                    .filter_map(|r| Some([r[col]?, r[row]?]))
                                    .collect();
                                plot_ui.points(Points::new(points).radius(1.2).color(color));
                            }
                        }
                    });
                }
                ui.end_row();
            }
        });
}
