//! Readers for the gridded inputs of the PM2.5 estimator.
//!
//! Three sources are supported, each described by a [`SourceLayout`]:
//!
//! - **AOD**: HDF5 container with `AOD`, `latitude` and `longitude` datasets
//! - **MET**: netCDF reanalysis with `PS`, `T2M`, `QV2M`, `U10M`, `V10M` over
//!   `time × lat × lon`
//! - **PBLH**: netCDF reanalysis with `PBLH` over `time × lat × lon`
//!
//! Every value raster comes back flattened row-major (latitude outer,
//! longitude inner) with one value per coordinate pair.

pub mod array;
pub mod error;
pub mod layout;
pub mod native;

pub use error::{NetCdfError, NetCdfResult};
pub use layout::SourceLayout;
pub use native::{load_grid, silence_hdf5_errors};
