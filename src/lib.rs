//! Workspace facade crate.
//!
//! Host applications depend on `mpc-offline` and enable the `offline-cache`
//! feature (on by default) instead of wiring `core-offline` and
//! `core-runtime` individually.

#[cfg(feature = "offline-cache")]
pub use core_offline as offline;

#[cfg(feature = "offline-cache")]
pub use core_runtime as runtime;
