//! Scatter plot of predictions on a lon/lat frame, composed as SVG.
//!
//! Layout follows the usual single-axes figure: the plot area takes the
//! middle of the canvas, a vertical colorbar sits to its right, the title is
//! centred above. Every marker is a filled square centred on its point,
//! drawn in input order so later points cover earlier ones.

use pm_common::{BoundingBox, Prediction};
use serde::{Deserialize, Serialize};

use crate::colormap::{Color, Jet, Normalize, LUT_SIZE};

const FONT_FAMILY: &str = "DejaVu Sans, Liberation Sans, Arial, sans-serif";
const GRID_COLOR: &str = "#b0b0b0";

/// Plot appearance. Every field has a default, so partial YAML works.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub colorbar_label: String,
    /// Canvas width in pixels
    pub width: u32,
    /// Canvas height in pixels
    pub height: u32,
    pub dpi: u32,
    /// Marker area in points squared
    pub marker_area: f64,
    /// Fixed lower colour limit; the data minimum when unset
    pub vmin: Option<f64>,
    /// Fixed upper colour limit; the data maximum when unset
    pub vmax: Option<f64>,
    pub grid: bool,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            title: "PM2.5 Concentration Map".to_string(),
            x_label: "Longitude".to_string(),
            y_label: "Latitude".to_string(),
            colorbar_label: "PM2.5 concentration (μg/m³)".to_string(),
            width: 1000,
            height: 800,
            dpi: 100,
            marker_area: 30.0,
            vmin: None,
            vmax: None,
            grid: true,
        }
    }
}

impl PlotConfig {
    /// Marker side length in pixels.
    pub fn marker_side(&self) -> f64 {
        self.marker_area.max(0.0).sqrt() * self.dpi as f64 / 72.0
    }

    fn points_to_px(&self, pt: f64) -> f64 {
        pt * self.dpi as f64 / 72.0
    }

    /// Colour limits for `points`, fixed limits taking precedence.
    pub fn color_limits(&self, points: &[Prediction]) -> Normalize {
        let data = Normalize::from_values(points.iter().map(|p| p.value))
            .unwrap_or_else(|| Normalize::new(0.0, 1.0));
        Normalize::new(self.vmin.unwrap_or(data.vmin), self.vmax.unwrap_or(data.vmax))
    }
}

/// Pixel rectangle, y growing downward.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Rect {
    left: f64,
    top: f64,
    right: f64,
    bottom: f64,
}

impl Rect {
    fn width(&self) -> f64 {
        self.right - self.left
    }

    fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

/// Plot area and colorbar placement for a canvas.
#[derive(Debug, Clone, Copy)]
struct Layout {
    axes: Rect,
    colorbar: Rect,
}

impl Layout {
    fn new(width: f64, height: f64) -> Self {
        let outer_left = 0.125 * width;
        let outer_width = 0.775 * width;
        let top = 0.12 * height;
        let bottom = 0.89 * height;

        let axes = Rect {
            left: outer_left,
            top,
            right: outer_left + 0.8 * outer_width,
            bottom,
        };
        let cbar_left = axes.right + 0.05 * outer_width;
        let colorbar = Rect {
            left: cbar_left,
            top,
            right: cbar_left + axes.height() / 20.0,
            bottom,
        };
        Self { axes, colorbar }
    }
}

/// Linear data → pixel transform for one axes.
#[derive(Debug, Clone, Copy)]
struct Transform {
    frame: Rect,
    extent: BoundingBox,
}

impl Transform {
    fn x(&self, lon: f64) -> f64 {
        self.frame.left + (lon - self.extent.min_lon) / self.extent.width() * self.frame.width()
    }

    fn y(&self, lat: f64) -> f64 {
        self.frame.bottom - (lat - self.extent.min_lat) / self.extent.height() * self.frame.height()
    }
}

/// Tick positions at a 1, 2, 2.5 or 5 × 10ⁿ step inside `[lo, hi]`.
pub fn nice_ticks(lo: f64, hi: f64, target: usize) -> (Vec<f64>, f64) {
    if !(hi > lo) || target == 0 {
        return (vec![lo], 1.0);
    }
    let raw = (hi - lo) / target as f64;
    let magnitude = 10f64.powf(raw.log10().floor());
    let step = [1.0, 2.0, 2.5, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|s| *s >= raw)
        .unwrap_or(10.0 * magnitude);

    let first = (lo / step).ceil() as i64;
    let last = (hi / step).floor() as i64;
    let ticks = (first..=last).map(|i| i as f64 * step).collect();
    (ticks, step)
}

/// Tick label with just enough decimals for `step`.
pub fn tick_label(value: f64, step: f64) -> String {
    let decimals = if step >= 1.0 {
        0
    } else {
        let mut d = (-step.log10().floor()) as usize;
        // 0.25 needs two decimals
        if ((step * 10f64.powi(d as i32)).fract()).abs() > 1e-9 {
            d += 1;
        }
        d
    };
    let label = format!("{:.*}", decimals, value);
    // avoid "-0.0"
    if label.starts_with('-') && label[1..].chars().all(|c| c == '0' || c == '.') {
        label[1..].to_string()
    } else {
        label
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn text(svg: &mut String, x: f64, y: f64, size: f64, anchor: &str, extra: &str, content: &str) {
    svg.push_str(&format!(
        r#"<text x="{:.2}" y="{:.2}" font-size="{:.1}" text-anchor="{}"{}>{}</text>"#,
        x,
        y,
        size,
        anchor,
        extra,
        escape(content)
    ));
    svg.push('\n');
}

fn line(svg: &mut String, x1: f64, y1: f64, x2: f64, y2: f64, stroke: &str, width: f64) {
    svg.push_str(&format!(
        r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{}" stroke-width="{:.2}"/>"#,
        x1, y1, x2, y2, stroke, width
    ));
    svg.push('\n');
}

fn frame(svg: &mut String, r: &Rect, width: f64) {
    svg.push_str(&format!(
        r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="none" stroke="black" stroke-width="{:.2}"/>"#,
        r.left,
        r.top,
        r.width(),
        r.height(),
        width
    ));
    svg.push('\n');
}

/// Compose the scatter plot as an SVG document.
pub fn scatter_svg(points: &[Prediction], config: &PlotConfig) -> String {
    let width = config.width as f64;
    let height = config.height as f64;
    let layout = Layout::new(width, height);
    let jet = Jet::new();
    let norm = config.color_limits(points);

    let extent = BoundingBox::from_points(points.iter().map(|p| (p.lon, p.lat)))
        .unwrap_or_else(|| BoundingBox::new(0.0, 0.0, 1.0, 1.0))
        .padded(0.05, 0.05);
    let transform = Transform {
        frame: layout.axes,
        extent,
    };

    let font = config.points_to_px(10.0);
    let title_font = config.points_to_px(12.0);
    let tick_len = config.points_to_px(3.5);
    let frame_width = config.points_to_px(0.8);
    let axes = layout.axes;

    let mut svg = String::with_capacity(64 * points.len() + 16 * 1024);
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="{font}">"#,
        w = config.width,
        h = config.height,
        font = FONT_FAMILY
    ));
    svg.push('\n');
    svg.push_str(&format!(
        r#"<rect x="0" y="0" width="{}" height="{}" fill="white"/>"#,
        config.width, config.height
    ));
    svg.push('\n');
    svg.push_str(&format!(
        r#"<defs><clipPath id="axes-clip"><rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}"/></clipPath></defs>"#,
        axes.left,
        axes.top,
        axes.width(),
        axes.height()
    ));
    svg.push('\n');

    let (x_ticks, x_step) = nice_ticks(extent.min_lon, extent.max_lon, 6);
    let (y_ticks, y_step) = nice_ticks(extent.min_lat, extent.max_lat, 6);

    if config.grid {
        for &t in &x_ticks {
            let x = transform.x(t);
            line(&mut svg, x, axes.top, x, axes.bottom, GRID_COLOR, frame_width);
        }
        for &t in &y_ticks {
            let y = transform.y(t);
            line(&mut svg, axes.left, y, axes.right, y, GRID_COLOR, frame_width);
        }
    }

    let side = config.marker_side();
    svg.push_str(r#"<g clip-path="url(#axes-clip)">"#);
    svg.push('\n');
    for p in points {
        if !(p.lon.is_finite() && p.lat.is_finite() && p.value.is_finite()) {
            continue;
        }
        let color = jet.color(norm.apply(p.value));
        svg.push_str(&format!(
            r#"<rect class="marker" x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}"/>"#,
            transform.x(p.lon) - side / 2.0,
            transform.y(p.lat) - side / 2.0,
            side,
            side,
            color.to_hex()
        ));
        svg.push('\n');
    }
    svg.push_str("</g>\n");

    frame(&mut svg, &axes, frame_width);

    for &t in &x_ticks {
        let x = transform.x(t);
        line(&mut svg, x, axes.bottom, x, axes.bottom + tick_len, "black", frame_width);
        text(&mut svg, x, axes.bottom + tick_len + font * 1.1, font, "middle", "", &tick_label(t, x_step));
    }
    for &t in &y_ticks {
        let y = transform.y(t);
        line(&mut svg, axes.left - tick_len, y, axes.left, y, "black", frame_width);
        text(&mut svg, axes.left - tick_len - 4.0, y + font * 0.35, font, "end", "", &tick_label(t, y_step));
    }

    let cx = (axes.left + axes.right) / 2.0;
    text(&mut svg, cx, axes.top - title_font * 0.6, title_font, "middle", "", &config.title);
    text(&mut svg, cx, axes.bottom + tick_len + font * 2.8, font, "middle", "", &config.x_label);
    let ylx = axes.left - tick_len - font * 4.2;
    let yly = (axes.top + axes.bottom) / 2.0;
    text(
        &mut svg,
        ylx,
        yly,
        font,
        "middle",
        &format!(r#" transform="rotate(-90 {:.2} {:.2})""#, ylx, yly),
        &config.y_label,
    );

    colorbar(&mut svg, &layout.colorbar, &jet, norm, config, font, tick_len, frame_width);

    svg.push_str("</svg>\n");
    svg
}

#[allow(clippy::too_many_arguments)]
fn colorbar(
    svg: &mut String,
    bar: &Rect,
    jet: &Jet,
    norm: Normalize,
    config: &PlotConfig,
    font: f64,
    tick_len: f64,
    frame_width: f64,
) {
    let (lo, hi) = norm.nonsingular();
    let band = bar.height() / LUT_SIZE as f64;
    for i in 0..LUT_SIZE {
        let t = (i as f64 + 0.5) / LUT_SIZE as f64;
        let color: Color = jet.color(t);
        let y = bar.bottom - (i as f64 + 1.0) * band;
        // overlap by half a pixel to hide seams between bands
        svg.push_str(&format!(
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}"/>"#,
            bar.left,
            y,
            bar.width(),
            band + 0.5,
            color.to_hex()
        ));
        svg.push('\n');
    }
    frame(svg, bar, frame_width);

    let (ticks, step) = nice_ticks(lo, hi, 7);
    for t in ticks {
        let y = bar.bottom - (t - lo) / (hi - lo) * bar.height();
        line(svg, bar.right, y, bar.right + tick_len, y, "black", frame_width);
        text(svg, bar.right + tick_len + 4.0, y + font * 0.35, font, "start", "", &tick_label(t, step));
    }

    let lx = bar.right + tick_len + font * 5.0;
    let ly = (bar.top + bar.bottom) / 2.0;
    text(
        svg,
        lx,
        ly,
        font,
        "middle",
        &format!(r#" transform="rotate(-90 {:.2} {:.2})""#, lx, ly),
        &config.colorbar_label,
    );
}
