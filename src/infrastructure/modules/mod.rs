//! Module units - discovery, parsing and startup loading
//!
//! A source unit is a YAML or JSON file describing one command, structured
//! command, event binding or addon. Units name a handler key that resolves
//! against the [`HandlerTable`](crate::application::handlers::HandlerTable).

pub mod discovery;
pub mod import;
pub mod loader;
pub mod unit;

pub use import::UnitImporter;
pub use loader::{LoadReport, ModuleLoader};
