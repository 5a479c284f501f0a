// faamcat - core/mod.rs
//
// Core logic layer: catalogue model, resolution and detection.
// Must NOT depend on: app, platform. The only filesystem access is
// directory walking in `discovery`; file contents arrive as readers or
// already-loaded tables.

pub mod cf;
pub mod data_model;
pub mod detect;
pub mod discovery;
pub mod fileset;
pub mod flight;
pub mod model;
pub mod product;
pub mod series;
pub mod summary;
