//! Infrastructure Layer
//!
//! Store implementations.

pub mod memory;
