//! Plot rendering for PM2.5 predictions.
//!
//! The figure is composed as SVG ([`scatter`]), rasterised with resvg
//! ([`raster`]) and encoded by the in-crate PNG writer ([`png`]).

pub mod colormap;
pub mod error;
pub mod png;
pub mod raster;
pub mod scatter;

pub use colormap::{Color, Jet, Normalize};
pub use error::{RenderError, RenderResult};
pub use raster::{rasterize_svg, render_scatter_png};
pub use scatter::{scatter_svg, PlotConfig};
