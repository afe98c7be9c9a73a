//! Inbound/outbound adapters.

pub mod csv;
