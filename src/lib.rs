// src/lib.rs

pub mod config;
pub mod core;
pub mod error;
pub mod favorites;
pub mod loader;
pub mod logging;
pub mod persistence;
pub mod ui;
pub mod usage;
pub use crate::core::engine::{Catalog, Intent, Outcome};
