//! Translation core.
//!
//! This module provides the [`Translator`], which turns an engine container
//! descriptor into a runtime spec, and its configuration.

mod config;
mod translator;

pub use config::TranslateConfig;
pub use translator::{DEFAULT_TERMINAL, DEFAULT_TERMINAL_PATH, Translator, process_env};
