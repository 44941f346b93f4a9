//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (`core-runtime`, `core-playback`). Host applications can
//! depend on `mpc-playback` and enable the documented features without needing
//! to wire each crate individually.

pub use core_playback as playback;
pub use core_runtime as runtime;
