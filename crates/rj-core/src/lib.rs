//! rusty-journal/crates/rj-core/src/lib.rs
//!
//! The central domain logic and interface definitions for Rusty-Journal.

pub mod clock;
pub mod error;
pub mod grammar;
pub mod models;
pub mod streak;
pub mod traits;
pub mod validation;

// Re-exporting for easier access in other crates
pub use clock::*;
pub use error::*;
pub use models::*;
pub use traits::*;
