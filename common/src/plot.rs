use std::{
    ops::Range,
    path::{Path, PathBuf},
};

use eyre::{Context, Result};
use itertools::Itertools;
use plotters::{coord::Shift, prelude::*};
use tracing::{debug, info};

use crate::{
    backend::TextFallback,
    font::FONT_FAMILY,
    metric::DisplayLabel,
    sheet::{Series, SheetError},
};

pub const X_AXIS_LABEL: &str = "Time / Sample Index";
const CHART_SIZE: (u32, u32) = (1000, 600);
const MARKER_SIZE: u32 = 3;
const LEGEND_FONT_SIZE: u32 = 14;
const LEGEND_SWATCH: i32 = 20;
const LEGEND_MARGIN: i32 = 8;

/// Line colours, in legend order
const PALETTE: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

/// Extraction result of one source for the metric being plotted
#[derive(Debug)]
pub struct SourceOutcome {
    pub source: String,
    pub result: Result<Series, SheetError>,
}

impl SourceOutcome {
    pub fn new(source: impl Into<String>, result: Result<Series, SheetError>) -> Self {
        Self {
            source: source.into(),
            result,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartReport {
    pub label: DisplayLabel,
    /// Legend entries, in plotting order
    pub plotted: Vec<String>,
    /// (source, reason) of every source left out of the chart
    pub failures: Vec<(String, String)>,
    /// None when nothing could be plotted
    pub output: Option<PathBuf>,
}

impl ChartReport {
    pub fn is_skipped(&self) -> bool {
        self.output.is_none()
    }
}

/// Overlays every successfully extracted series on one chart, saved as
/// `<output_dir>/<label>.png`. Failed sources are left out. Nothing is
/// written when no source succeeded.
pub fn render_metric(
    output_dir: &Path,
    label: &DisplayLabel,
    outcomes: Vec<SourceOutcome>,
) -> Result<ChartReport> {
    let mut series = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();
    for SourceOutcome { source, result } in outcomes {
        match result {
            Ok(data) => series.push((source, data)),
            Err(err) => {
                debug!("Error extracting '{label}' for {source}: {err}");
                failures.push((source, err.to_string()));
            }
        }
    }

    let mut report = ChartReport {
        label: label.clone(),
        plotted: series.iter().map(|(source, _)| source.clone()).collect(),
        failures,
        output: None,
    };
    if series.is_empty() {
        info!("Skipped plotting '{label}' (no data extracted)");
        return Ok(report);
    }

    let path = output_dir.join(label.file_name());
    draw_chart(&path, label.as_str(), &series)
        .wrap_err_with(|| format!("Plotting {}", path.display()))?;
    info!(
        "Saved plot {} with {}",
        path.display(),
        series
            .iter()
            .map(|(source, data)| format!("{source} ({} samples)", data.len()))
            .join(", ")
    );
    report.output = Some(path);
    Ok(report)
}

fn draw_chart(path: &Path, title: &str, series: &[(String, Series)]) -> Result<()> {
    let (x_range, y_range) = axis_ranges(series);
    let root = TextFallback::new(BitMapBackend::new(path, CHART_SIZE)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, (FONT_FAMILY, 24))
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .x_desc(X_AXIS_LABEL)
        .y_desc(title)
        .axis_desc_style((FONT_FAMILY, 16))
        .label_style((FONT_FAMILY, 13))
        .draw()?;

    let mut legend = Vec::with_capacity(series.len());
    for (idx, (source, data)) in series.iter().enumerate() {
        let color = PALETTE[idx % PALETTE.len()];
        legend.push((source.as_str(), color));
        chart.draw_series(LineSeries::new(
            data.samples().iter().copied(),
            color.stroke_width(1),
        ))?;
        chart.draw_series(
            data.samples()
                .iter()
                .map(|&(x, y)| Circle::new((x, y), MARKER_SIZE, color.filled())),
        )?;
    }

    draw_legend(&chart.plotting_area().strip_coord_spec(), &legend)?;

    root.present()?;
    Ok(())
}

/// Legend box in the upper right corner of `area`. Text is measured through
/// the backend, so a missing font only drops the labels.
fn draw_legend<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    entries: &[(&str, RGBColor)],
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    if entries.is_empty() {
        return Ok(());
    }
    let style = TextStyle::from((FONT_FAMILY, LEGEND_FONT_SIZE).into_font());
    let mut text_width = 0;
    let mut text_height = LEGEND_FONT_SIZE as i32;
    for (label, _) in entries {
        let (w, h) = area.estimate_text_size(label, &style)?;
        text_width = text_width.max(w as i32);
        text_height = text_height.max(h as i32);
    }
    let row_height = text_height + LEGEND_MARGIN / 2;
    let width = text_width + LEGEND_SWATCH + LEGEND_MARGIN * 3;
    let height = row_height * entries.len() as i32 + LEGEND_MARGIN * 2;

    let (area_width, _) = area.dim_in_pixel();
    let left = area_width as i32 - width - LEGEND_MARGIN;
    let top = LEGEND_MARGIN;
    let corners = [(left, top), (left + width, top + height)];
    area.draw(&Rectangle::new(corners, WHITE.mix(0.8).filled()))?;
    area.draw(&Rectangle::new(corners, BLACK.mix(0.4).stroke_width(1)))?;

    for (row, (label, color)) in entries.iter().enumerate() {
        let y = top + LEGEND_MARGIN + row_height * row as i32;
        let x = left + LEGEND_MARGIN;
        let mid = y + row_height / 2;
        area.draw(&PathElement::new(
            vec![(x, mid), (x + LEGEND_SWATCH, mid)],
            color.stroke_width(2),
        ))?;
        area.draw(&Text::new(
            *label,
            (x + LEGEND_SWATCH + LEGEND_MARGIN, y),
            style.clone(),
        ))?;
    }
    Ok(())
}

fn merge_bounds(a: Option<(f64, f64)>, b: Option<(f64, f64)>) -> Option<(f64, f64)> {
    match (a, b) {
        (Some(a), Some(b)) => Some((a.0.min(b.0), a.1.max(b.1))),
        (a, None) => a,
        (None, b) => b,
    }
}

fn padded(bounds: Option<(f64, f64)>, margin: f64) -> Range<f64> {
    let (lo, hi) = bounds.unwrap_or((0.0, 1.0));
    let span = hi - lo;
    if span <= 0.0 {
        let pad = if lo == 0.0 { 1.0 } else { lo.abs() * 0.1 };
        return (lo - pad)..(hi + pad);
    }
    (lo - span * margin)..(hi + span * margin)
}

fn axis_ranges(series: &[(String, Series)]) -> (Range<f64>, Range<f64>) {
    let x = series
        .iter()
        .map(|(_, data)| data.x_bounds())
        .fold(None, merge_bounds);
    let y = series
        .iter()
        .map(|(_, data)| data.y_bounds())
        .fold(None, merge_bounds);
    (padded(x, 0.0), padded(y, 0.05))
}
