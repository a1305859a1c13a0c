//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (e.g., `core-service`, `core-playback`, `core-catalog`).
//! Host applications can depend on `resonance-workspace` and enable the
//! documented features without needing to wire each crate individually.
