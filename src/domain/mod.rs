//! Pure domain aggregates and rules.
//!
//! Everything in this module is a synchronous state transition over an
//! aggregate and its direct children. Time is injected through
//! [`clock::Clock`]; persistence goes through the traits in [`ports`].

pub mod clock;
pub mod jackpot;
pub mod meta;
pub mod money;
pub mod participation;
pub mod payment;
pub mod ports;
pub mod tontine;
pub mod vault;
