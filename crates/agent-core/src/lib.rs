//! Core abstractions for the analyst pipeline
//!
//! This crate defines the fundamental traits and types shared by every stage:
//! the [`Stage`] trait, the [`Context`] state mapping with typed keys, and the
//! common [`Error`] type.

pub mod context;
pub mod error;
pub mod stage;

pub use context::{Context, StateKey};
pub use error::{Error, Result};
pub use stage::Stage;
