use thiserror::Error;

/// Error taxonomy for the rules engine.
///
/// The domain never logs or formats these for end users; callers decide the
/// user-facing messaging.
#[derive(Error, Debug)]
pub enum TontineError {
    /// The requested operation's precondition on the current state is false
    /// (e.g. distributing a non-active jackpot, overdrawing a vault).
    #[error("illegal transition: {0}")]
    IllegalTransition(String),
    /// The data fails a structural rule and must be rejected before the
    /// mutation is applied or persisted.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
    /// The aggregate exists but does not meet the eligibility rules for the
    /// requested operation.
    #[error("not eligible: {0}")]
    NotEligible(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TontineError>;
