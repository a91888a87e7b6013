//! Chart rendering
//!
//! Draws one decoded series as a line chart on a single-page vector PDF
//! (DIN A5 landscape): framed plot area, light grid at rounded tick steps,
//! tick labels, axis labels and a title.

use candump_decoder::Series;
use printpdf::{BuiltinFont, Color, Line, Mm, PdfDocument, Point, Rgb};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// DIN A5 landscape
const PAGE_WIDTH_MM: f64 = 210.0;
const PAGE_HEIGHT_MM: f64 = 148.0;

const PLOT_LEFT_MM: f64 = 28.0;
const PLOT_RIGHT_MM: f64 = PAGE_WIDTH_MM - 12.0;
const PLOT_BOTTOM_MM: f64 = 24.0;
const PLOT_TOP_MM: f64 = PAGE_HEIGHT_MM - 26.0;

const TARGET_TICKS: usize = 6;
const MAX_TICKS: usize = 50;
const MAX_PLOTTED_POINTS: usize = 4000;

const POINTS_PER_MM: f64 = 72.0 / 25.4;

/// What to plot and where
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ChartSpec {
    /// Label of the series to plot
    pub label: String,
    /// Chart title
    pub title: String,
    /// Horizontal axis caption
    #[serde(default = "default_x_label")]
    pub x_label: String,
    /// Vertical axis caption
    pub y_label: String,
    /// Output file name, relative to the plot output directory
    pub file: PathBuf,
}

fn default_x_label() -> String {
    "Elapsed time since first sample [s]".to_string()
}

/// Charts drawn when the configuration names none
pub fn default_charts() -> Vec<ChartSpec> {
    vec![
        ChartSpec {
            label: "RPM".to_string(),
            title: "Engine speed".to_string(),
            x_label: default_x_label(),
            y_label: "Revolutions per minute [r/min]".to_string(),
            file: PathBuf::from("RPM.pdf"),
        },
        ChartSpec {
            label: "Consumption".to_string(),
            title: "Fuel consumption".to_string(),
            x_label: default_x_label(),
            y_label: "Consumption [l/h]".to_string(),
            file: PathBuf::from("Consumption.pdf"),
        },
    ]
}

/// Errors that can occur while rendering a chart
#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error("Series {label:?} has {points} point(s), at least 2 are needed")]
    TooFewPoints { label: String, points: usize },

    #[error("PDF generation failed: {0}")]
    Pdf(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Linear mapping from data values onto a page span in millimetres
#[derive(Debug, Clone, Copy, PartialEq)]
struct Axis {
    min: f64,
    max: f64,
    step: f64,
    start_mm: f64,
    end_mm: f64,
}

impl Axis {
    /// Axis covering `[lo, hi]`, widened outward to whole tick steps
    fn fit(lo: f64, hi: f64, start_mm: f64, end_mm: f64) -> Self {
        let (lo, hi) = if !(hi - lo).is_finite() {
            (0.0, 1.0)
        } else if (hi - lo).abs() < f64::EPSILON {
            let pad = if lo.abs() > 1.0 { lo.abs() * 0.1 } else { 1.0 };
            (lo - pad, hi + pad)
        } else {
            (lo, hi)
        };
        let step = nice_step((hi - lo) / TARGET_TICKS as f64);
        Self {
            min: (lo / step).floor() * step,
            max: (hi / step).ceil() * step,
            step,
            start_mm,
            end_mm,
        }
    }

    fn project(&self, value: f64) -> f64 {
        let ratio = (value - self.min) / (self.max - self.min);
        self.start_mm + ratio * (self.end_mm - self.start_mm)
    }

    fn ticks(&self) -> Vec<f64> {
        let span = (self.max - self.min) / self.step;
        if !span.is_finite() || span < 0.0 {
            return Vec::new();
        }
        let count = (span.round() as usize).min(MAX_TICKS);
        (0..=count).map(|i| self.min + i as f64 * self.step).collect()
    }

    fn tick_label(&self, value: f64) -> String {
        let decimals = (-self.step.log10().floor()).max(0.0) as usize;
        let text = format!("{:.*}", decimals, value);
        // Avoid printing "-0" for values that round to zero
        if text.trim_start_matches('-').chars().all(|c| c == '0' || c == '.') {
            text.trim_start_matches('-').to_string()
        } else {
            text
        }
    }
}

/// Round a raw step up to 1, 2 or 5 times a power of ten
fn nice_step(raw: f64) -> f64 {
    if !raw.is_finite() || raw <= 0.0 {
        return 1.0;
    }
    let magnitude = 10f64.powf(raw.log10().floor());
    let fraction = raw / magnitude;
    let nice = if fraction <= 1.0 {
        1.0
    } else if fraction <= 2.0 {
        2.0
    } else if fraction <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

/// Rough width of Helvetica text, for centring and right alignment
fn approx_text_width_mm(text: &str, font_size: f64) -> f64 {
    text.chars().count() as f64 * font_size * 0.5 / POINTS_PER_MM
}

fn rgb(r: f32, g: f32, b: f32) -> Color {
    Color::Rgb(Rgb::new(r, g, b, None))
}

fn polyline(points: &[(f64, f64)], is_closed: bool) -> Line {
    Line {
        points: points
            .iter()
            .map(|&(x, y)| (Point::new(Mm(x as f32), Mm(y as f32)), false))
            .collect(),
        is_closed,
    }
}

/// Render `series` into a PDF at `path`
pub fn render_pdf(series: &Series, spec: &ChartSpec, path: &Path) -> Result<(), ChartError> {
    // Non-finite samples cannot be placed on the page
    let series = &Series {
        label: series.label.clone(),
        unit: series.unit.clone(),
        points: series
            .points
            .iter()
            .copied()
            .filter(|(t, v)| t.is_finite() && v.is_finite())
            .collect(),
    };
    let (Some((t_min, t_max)), Some((v_min, v_max)), true) = (
        series.time_range(),
        series.value_range(),
        series.points.len() >= 2,
    ) else {
        return Err(ChartError::TooFewPoints {
            label: series.label.clone(),
            points: series.points.len(),
        });
    };

    let x_axis = Axis::fit(t_min.min(0.0), t_max, PLOT_LEFT_MM, PLOT_RIGHT_MM);
    let y_axis = Axis::fit(v_min, v_max, PLOT_BOTTOM_MM, PLOT_TOP_MM);

    let (doc, page, layer) = PdfDocument::new(
        spec.title.as_str(),
        Mm(PAGE_WIDTH_MM as f32),
        Mm(PAGE_HEIGHT_MM as f32),
        "Chart",
    );
    let layer = doc.get_page(page).get_layer(layer);
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ChartError::Pdf(e.to_string()))?;
    let font_bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ChartError::Pdf(e.to_string()))?;

    // Grid
    layer.set_outline_color(rgb(0.85, 0.85, 0.85));
    layer.set_outline_thickness(0.3);
    for tick in x_axis.ticks() {
        let x = x_axis.project(tick);
        layer.add_line(polyline(&[(x, PLOT_BOTTOM_MM), (x, PLOT_TOP_MM)], false));
    }
    for tick in y_axis.ticks() {
        let y = y_axis.project(tick);
        layer.add_line(polyline(&[(PLOT_LEFT_MM, y), (PLOT_RIGHT_MM, y)], false));
    }

    // Frame
    layer.set_outline_color(rgb(0.3, 0.3, 0.3));
    layer.set_outline_thickness(0.5);
    layer.add_line(polyline(
        &[
            (PLOT_LEFT_MM, PLOT_BOTTOM_MM),
            (PLOT_RIGHT_MM, PLOT_BOTTOM_MM),
            (PLOT_RIGHT_MM, PLOT_TOP_MM),
            (PLOT_LEFT_MM, PLOT_TOP_MM),
        ],
        true,
    ));

    // Tick labels
    let tick_size = 8.0;
    layer.set_fill_color(rgb(0.0, 0.0, 0.0));
    for tick in x_axis.ticks() {
        let text = x_axis.tick_label(tick);
        let x = x_axis.project(tick) - approx_text_width_mm(&text, tick_size) / 2.0;
        let y = PLOT_BOTTOM_MM - 5.0;
        layer.use_text(text, tick_size as f32, Mm(x as f32), Mm(y as f32), &font);
    }
    for tick in y_axis.ticks() {
        let text = y_axis.tick_label(tick);
        let x = PLOT_LEFT_MM - 2.0 - approx_text_width_mm(&text, tick_size);
        let y = y_axis.project(tick) - 1.0;
        layer.use_text(text, tick_size as f32, Mm(x as f32), Mm(y as f32), &font);
    }

    // Captions
    let caption_size = 9.0;
    let x_caption = PLOT_LEFT_MM + (PLOT_RIGHT_MM - PLOT_LEFT_MM) / 2.0
        - approx_text_width_mm(&spec.x_label, caption_size) / 2.0;
    layer.use_text(
        spec.x_label.as_str(),
        caption_size as f32,
        Mm(x_caption as f32),
        Mm(8.0),
        &font,
    );
    layer.use_text(
        spec.y_label.as_str(),
        caption_size as f32,
        Mm(PLOT_LEFT_MM as f32),
        Mm((PLOT_TOP_MM + 4.0) as f32),
        &font,
    );
    layer.use_text(
        spec.title.as_str(),
        14.0,
        Mm(PLOT_LEFT_MM as f32),
        Mm((PAGE_HEIGHT_MM - 14.0) as f32),
        &font_bold,
    );

    // Data
    let step = (series.points.len() / MAX_PLOTTED_POINTS).max(1);
    let mut points: Vec<(f64, f64)> = series
        .points
        .iter()
        .step_by(step)
        .map(|&(t, v)| (x_axis.project(t), y_axis.project(v)))
        .collect();
    if let Some(&(t, v)) = series.points.last() {
        if (series.points.len() - 1) % step != 0 {
            points.push((x_axis.project(t), y_axis.project(v)));
        }
    }
    layer.set_outline_color(rgb(0.0, 0.0, 0.0));
    layer.set_outline_thickness(0.75);
    layer.add_line(polyline(&points, false));

    let mut writer = BufWriter::new(File::create(path)?);
    doc.save(&mut writer).map_err(|e| ChartError::Pdf(e.to_string()))?;

    log::info!(
        "Rendered {} ({} points) to {:?}",
        series.label,
        series.points.len(),
        path
    );
    Ok(())
}
