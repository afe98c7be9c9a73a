//! Store implementations.

pub mod in_memory;
