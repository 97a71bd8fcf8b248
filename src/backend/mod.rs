//! Backend abstraction layer
//!
//! The graph consumes the GPU through the narrow [`RenderBackend`] capability
//! set; concrete device/queue implementations live outside this crate.

pub mod traits;
pub mod types;

pub use traits::*;
pub use types::*;
