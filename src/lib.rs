//! Data layer of the Morocco crop production dashboard: loading, selection
//! state, derived views and the shapes handed to each widget.
pub mod adapters;
pub mod classify;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod loader;
pub mod output;
pub mod selection;
pub mod session;
pub mod table;
pub mod types;
pub mod util;
pub mod views;
