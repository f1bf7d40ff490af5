//! SVG rasterisation and PNG output.

use std::sync::{Arc, OnceLock};

use pm_common::Prediction;
use tracing::debug;

use crate::error::{RenderError, RenderResult};
use crate::png::create_png_auto;
use crate::scatter::{scatter_svg, PlotConfig};

/// System fonts, loaded on first use and shared by every render.
fn font_database() -> Arc<usvg::fontdb::Database> {
    static FONTS: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
    FONTS
        .get_or_init(|| {
            let mut db = usvg::fontdb::Database::new();
            db.load_system_fonts();
            debug!(faces = db.len(), "Loaded system fonts for plot text");
            Arc::new(db)
        })
        .clone()
}

/// Render an SVG document onto a white `width` × `height` canvas.
///
/// Returns straight RGBA bytes.
pub fn rasterize_svg(svg: &str, width: u32, height: u32) -> RenderResult<Vec<u8>> {
    let mut opt = usvg::Options::default();
    opt.fontdb = font_database();
    let tree = usvg::Tree::from_str(svg, &opt).map_err(|e| RenderError::Svg(e.to_string()))?;

    let mut pixmap =
        tiny_skia::Pixmap::new(width, height).ok_or(RenderError::Pixmap { width, height })?;
    pixmap.fill(tiny_skia::Color::WHITE);

    let size = tree.size();
    let transform = tiny_skia::Transform::from_scale(
        width as f32 / size.width(),
        height as f32 / size.height(),
    );
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    let rgba = pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();
    Ok(rgba)
}

/// Scatter plot of predictions encoded as PNG.
///
/// The pixmap and SVG source are dropped before returning.
pub fn render_scatter_png(points: &[Prediction], config: &PlotConfig) -> RenderResult<Vec<u8>> {
    let svg = scatter_svg(points, config);
    let pixels = rasterize_svg(&svg, config.width, config.height)?;
    let png = create_png_auto(
        &pixels,
        config.width as usize,
        config.height as usize,
        config.dpi,
    )?;
    debug!(
        points = points.len(),
        width = config.width,
        height = config.height,
        bytes = png.len(),
        "Rendered scatter plot"
    );
    Ok(png)
}
