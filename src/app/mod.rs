// faamcat - app/mod.rs
//
// Application layer: product loading, catalogue scanning, file readers,
// flight analysis.
// Dependencies: core layer.
// Must NOT depend on: platform specifics.

pub mod analysis;
pub mod catalog;
#[cfg(feature = "netcdf")]
pub mod ncfile;
pub mod product_mgr;
pub mod readers;
