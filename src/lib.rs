//! # DiTontine Core
//!
//! Financial-lifecycle rules engine for rotating savings groups (tontines):
//! vault bookkeeping, participation state machine and scoring, payment
//! lateness/penalty computation, and jackpot distribution rules.
//!
//! The domain layer is pure and synchronous; the application layer drives it
//! against pluggable async stores. No I/O happens outside `interfaces` and
//! `main`.

pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;
