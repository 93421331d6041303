//! Core document types, tax derivation, validation, and series numbering.
//!
//! Everything here is synchronous and free of shared state, except the
//! [`SeriesStore`] port whose `reserve_next` is the one atomic operation
//! the engine depends on.

mod builder;
mod error;
mod numbering;
mod tax;
mod types;
mod validation;

pub use builder::*;
pub use error::*;
pub use numbering::*;
pub use tax::*;
pub use types::*;
pub use validation::*;
