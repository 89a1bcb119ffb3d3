//! Terminal dashboard for watching blockchain mempools.

pub mod app;
pub mod error;
pub mod types;
pub mod ui;
pub mod utils;
