//! Application layer orchestrating the domain rules.
//!
//! [`engine::TontineEngine`] is the entry point the outer CRUD/API layer
//! calls into: it loads aggregates from the stores, applies the pure domain
//! transitions, and persists the results, awaiting each storage operation to
//! keep mutations sequentially consistent.

pub mod engine;
