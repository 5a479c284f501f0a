// faamcat - lib.rs
//
// Library entry point: the catalogue, file-resolution state machine,
// flight-segment detectors and flight-summary model. The CLI in `main.rs`
// is a thin consumer of this surface.

pub mod app;
pub mod core;
pub mod platform;
pub mod util;
