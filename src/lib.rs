//! Module Wizard - step-by-step creation of anonymization modules
//!
//! The [`wizard`] holds the five-step state machine, [`store`] persists the
//! resulting files and [`app`] wraps both in a terminal UI.

pub mod app;
pub mod config;
pub mod logging;
pub mod store;
pub mod ui;
pub mod wizard;
