//! # Core Runtime Module
//!
//! Runtime infrastructure shared by the offline media crates:
//! - Logging and tracing initialization
//! - Log-safe formatting helpers
//!
//! Host applications call [`logging::init_logging`] once at startup, before
//! opening the offline store, so its `tracing` spans and events are captured.

pub mod error;
pub mod logging;

pub use error::{Error, Result};
