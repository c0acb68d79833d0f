//! Run configuration.
//!
//! Provides the pipeline's tunables as an operator-facing TOML file,
//! replacing any hardcoded thresholds.
//!
//! ## Loading order
//!
//! 1. `$ALERT_ENGINE_CONFIG` (path to a TOML file)
//! 2. `./alert_engine.toml` in the current working directory
//! 3. Built-in defaults
//!
//! Explicit CLI flags (see `bin/main.rs`) are applied last and always win.
//! The loaded `RunConfig` is passed directly into `Pipeline::new` rather
//! than read back out of a global — there is exactly one run per process.

mod run_config;

pub use run_config::*;
