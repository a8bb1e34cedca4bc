//! DocShare application layer
//!
//! Use cases over the device transport and local-disk ports, plus the
//! coordinator runtime that owns all published browser state.

pub mod deps;
pub mod runtime;
pub mod usecases;

pub use deps::AppDeps;
pub use runtime::{BrowserRuntime, BrowserSnapshot, CoreHandle, RuntimeOptions};
