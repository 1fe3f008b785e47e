//! Shared utilities for the gateway.

pub mod ids;

pub use ids::ModuleHandle;
