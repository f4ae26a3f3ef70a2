//! # MagRobo Runtime
//!
//! Library half of the `magrobo` binary: argument parsing in [`cli`] and the
//! episode loop in [`app`]. Kept as a library so the loop can be driven from
//! integration tests without spawning a process.

pub mod app;
pub mod cli;

pub use control;
pub use probe;
