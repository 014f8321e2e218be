use std::ops::Range;
use std::panic;
use std::path::Path;

use anyhow::Result;
use chrono::{Days, NaiveDate};
use plotters::coord::ranged1d::{DefaultFormatting, KeyPointHint, Ranged};
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use plotters::style::{FontDesc, FontFamily, FontStyle};
use plotters_backend::{
    BackendColor, BackendCoord, BackendStyle, BackendTextStyle, DrawingBackend, DrawingErrorKind,
};
use runlog::{Dashboard, PaceAxis};

const BACKGROUND: RGBColor = RGBColor(13, 17, 23);
const FOREGROUND: RGBColor = RGBColor(230, 237, 243);
const PACE_COLOR: RGBColor = RGBColor(0, 255, 255);
const HR_COLOR: RGBColor = RGBColor(255, 69, 0);

#[derive(Clone, Copy, Debug)]
pub enum ChartKind {
    Png,
    Svg,
}

/// Points of the trend chart, x in days since the earliest run.
#[derive(Clone, Debug)]
struct TrendData {
    start: NaiveDate,
    x_range: Range<f64>,
    pace_points: Vec<(f64, f64)>,
    hr_points: Vec<(f64, f64)>,
    hr_range: Range<f64>,
}

fn trend_data(dashboard: &Dashboard) -> Option<TrendData> {
    let rows = dashboard.records();
    let start = rows.iter().map(|r| r.record.date).min()?;
    let end = rows.iter().map(|r| r.record.date).max()?;
    let offset = |date: NaiveDate| (date - start).num_days() as f64;

    let pace_points = rows
        .iter()
        .filter_map(|r| {
            r.pace
                .seconds()
                .map(|s| (offset(r.record.date), PaceAxis::position(s)))
        })
        .collect();
    let hr_points: Vec<(f64, f64)> = rows
        .iter()
        .map(|r| (offset(r.record.date), r.record.heart_rate as f64))
        .collect();

    let hr_min = hr_points.iter().map(|p| p.1).fold(f64::MAX, f64::min);
    let hr_max = hr_points.iter().map(|p| p.1).fold(f64::MIN, f64::max);

    Some(TrendData {
        start,
        x_range: -0.5..offset(end).max(1.0) + 0.5,
        pace_points,
        hr_points,
        hr_range: (hr_min - 5.0).max(0.0)..hr_max + 5.0,
    })
}

pub fn render_chart_guard(
    dashboard: &Dashboard,
    path: &Path,
    kind: ChartKind,
    size: (u32, u32),
) -> Result<(), String> {
    let render = || -> Result<(), String> {
        render_chart(dashboard, path, kind, size).map_err(|e| format!("plotting error: {}", e))
    };

    panic::catch_unwind(panic::AssertUnwindSafe(render))
        .map_err(|_| "plotting backend panicked".to_string())?
}

fn render_chart(dashboard: &Dashboard, path: &Path, kind: ChartKind, size: (u32, u32)) -> Result<()> {
    let data = match trend_data(dashboard) {
        Some(data) => data,
        None => return Ok(()),
    };
    let pace_range = match dashboard.axis() {
        Some(axis) => PaceRange::new(axis.range(), axis.key_points()),
        None => PaceRange::new(-360.0..-240.0, Vec::new()),
    };

    match kind {
        ChartKind::Png => {
            let backend = BitMapBackend::new(path, size);
            let root = FontSafeBackend::new(backend).into_drawing_area();
            draw_trend_chart(root, &data, pace_range)?;
        }
        ChartKind::Svg => {
            let backend = SVGBackend::new(path, size);
            let root = FontSafeBackend::new(backend).into_drawing_area();
            draw_trend_chart(root, &data, pace_range)?;
        }
    }
    Ok(())
}

/// Pace coordinate whose mesh lines and labels sit exactly on the axis ticks.
#[derive(Clone)]
struct PaceRange {
    inner: RangedCoordf64,
    ticks: Vec<f64>,
}

impl PaceRange {
    fn new(range: Range<f64>, ticks: Vec<f64>) -> Self {
        Self {
            inner: range.into(),
            ticks,
        }
    }
}

impl Ranged for PaceRange {
    type FormatOption = DefaultFormatting;
    type ValueType = f64;

    fn map(&self, value: &f64, limit: (i32, i32)) -> i32 {
        self.inner.map(value, limit)
    }

    fn key_points<Hint: KeyPointHint>(&self, _hint: Hint) -> Vec<f64> {
        self.ticks.clone()
    }

    fn range(&self) -> Range<f64> {
        self.inner.range()
    }
}

fn draw_trend_chart<DB>(
    root: DrawingArea<DB, plotters::coord::Shift>,
    data: &TrendData,
    pace_range: PaceRange,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&BACKGROUND)?;

    let title_font = FontDesc::new(FontFamily::SansSerif, 26.0, FontStyle::Normal);
    let axis_font = FontDesc::new(FontFamily::SansSerif, 18.0, FontStyle::Normal);
    let legend_font = FontDesc::new(FontFamily::SansSerif, 16.0, FontStyle::Normal);

    let mut chart = ChartBuilder::on(&root)
        .margin(25)
        .caption("Pace & Heart Rate Trendline", title_font.color(&FOREGROUND))
        .set_label_area_size(LabelAreaPosition::Left, 70)
        .set_label_area_size(LabelAreaPosition::Right, 70)
        .set_label_area_size(LabelAreaPosition::Bottom, 50)
        .build_cartesian_2d(data.x_range.clone(), pace_range)?
        .set_secondary_coord(data.x_range.clone(), data.hr_range.clone());

    let start = data.start;
    let date_label = move |v: &f64| {
        if *v < 0.0 {
            return String::new();
        }
        start
            .checked_add_days(Days::new(v.round() as u64))
            .map(|d| d.format("%m-%d").to_string())
            .unwrap_or_default()
    };

    chart
        .configure_mesh()
        .light_line_style(&TRANSPARENT)
        .bold_line_style(&TRANSPARENT)
        .x_desc("Date")
        .y_desc("Pace (min/km)")
        .x_label_formatter(&date_label)
        .y_label_formatter(&|v| PaceAxis::label_at(*v))
        .label_style(axis_font.clone().color(&FOREGROUND))
        .axis_desc_style(axis_font.clone().color(&FOREGROUND))
        .axis_style(&FOREGROUND.mix(0.5))
        .draw()?;

    chart
        .configure_secondary_axes()
        .y_desc("Heart Rate (BPM)")
        .y_label_formatter(&|v| format!("{:.0}", v))
        .label_style(axis_font.clone().color(&FOREGROUND))
        .axis_desc_style(axis_font.color(&FOREGROUND))
        .draw()?;

    chart
        .draw_series(LineSeries::new(
            data.pace_points.iter().copied(),
            plotters::style::Color::stroke_width(&PACE_COLOR, 4),
        ))?
        .label("Pace")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 30, y)], plotters::style::Color::stroke_width(&PACE_COLOR, 4)));
    chart.draw_series(
        data.pace_points
            .iter()
            .map(|&(x, y)| Circle::new((x, y), 5, PACE_COLOR.filled())),
    )?;

    chart
        .draw_secondary_series(LineSeries::new(
            data.hr_points.iter().copied(),
            plotters::style::Color::stroke_width(&HR_COLOR, 2),
        ))?
        .label("Heart Rate")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 30, y)], plotters::style::Color::stroke_width(&HR_COLOR, 2)));

    chart
        .configure_series_labels()
        .background_style(&BACKGROUND.mix(0.8))
        .border_style(&FOREGROUND.mix(0.3))
        .label_font(legend_font.color(&FOREGROUND))
        .position(SeriesLabelPosition::UpperRight)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Wraps a backend so missing system fonts degrade to unlabeled output instead
/// of failing the whole chart.
struct FontSafeBackend<DB> {
    inner: DB,
}

impl<DB> FontSafeBackend<DB> {
    fn new(inner: DB) -> Self {
        Self { inner }
    }
}

impl<DB: DrawingBackend> DrawingBackend for FontSafeBackend<DB> {
    type ErrorType = DB::ErrorType;

    fn get_size(&self) -> (u32, u32) {
        self.inner.get_size()
    }

    fn ensure_prepared(&mut self) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.ensure_prepared()
    }

    fn present(&mut self) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.present()
    }

    fn draw_pixel(
        &mut self,
        point: BackendCoord,
        color: BackendColor,
    ) -> Result<(), DrawingErrorKind<DB::ErrorType>> {
        self.inner.draw_pixel(point, color)
    }

    fn draw_line<S: BackendStyle>(
        &mut self,
        from: BackendCoord,
        to: BackendCoord,
        style: &S,
    ) -> Result<(), DrawingErrorKind<DB::ErrorType>> {
        self.inner.draw_line(from, to, style)
    }

    fn draw_rect<S: BackendStyle>(
        &mut self,
        upper_left: BackendCoord,
        bottom_right: BackendCoord,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<DB::ErrorType>> {
        self.inner.draw_rect(upper_left, bottom_right, style, fill)
    }

    fn draw_path<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        path: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<DB::ErrorType>> {
        self.inner.draw_path(path, style)
    }

    fn draw_circle<S: BackendStyle>(
        &mut self,
        center: BackendCoord,
        radius: u32,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_circle(center, radius, style, fill)
    }

    fn blit_bitmap(
        &mut self,
        pos: BackendCoord,
        (iw, ih): (u32, u32),
        src: &[u8],
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.blit_bitmap(pos, (iw, ih), src)
    }

    fn draw_text<TStyle: BackendTextStyle>(
        &mut self,
        text: &str,
        style: &TStyle,
        pos: BackendCoord,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        // Text is dropped when no font can rasterize it.
        let _ = panic::catch_unwind(panic::AssertUnwindSafe(|| {
            self.inner.draw_text(text, style, pos)
        }));
        Ok(())
    }

    fn estimate_text_size<TStyle: BackendTextStyle>(
        &self,
        text: &str,
        style: &TStyle,
    ) -> Result<(u32, u32), DrawingErrorKind<Self::ErrorType>> {
        match panic::catch_unwind(panic::AssertUnwindSafe(|| {
            self.inner.estimate_text_size(text, style)
        })) {
            Ok(Ok(size)) => Ok(size),
            _ => Ok(approximate_text_size(text, style.size())),
        }
    }
}

/// Rough box for sans-serif text when font metrics are unavailable.
fn approximate_text_size(text: &str, size: f64) -> (u32, u32) {
    let width = text.chars().count() as f64 * size * 0.6;
    (width.ceil() as u32, size.ceil() as u32)
}
