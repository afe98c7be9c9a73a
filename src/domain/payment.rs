use crate::domain::clock::Clock;
use crate::domain::meta::{EntityMeta, ParticipationId, PaymentId, TontineId};
use crate::domain::money::{Amount, Money};
use crate::domain::participation::Participation;
use crate::domain::tontine::Tontine;
use crate::error::{Result, TontineError};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Confirmed,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    MobileMoney,
    BankTransfer,
    Card,
    Cash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    /// A periodic cycle contribution; requires a cycle number.
    Contribution,
    Penalty,
    Other,
}

/// One contribution or related charge tied to a participation.
///
/// `days_late` and `penalty` are derived figures: recomputed and frozen at
/// confirmation time, never left unset past validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub meta: EntityMeta,
    pub participation: ParticipationId,
    pub tontine: TontineId,
    pub amount: Money,
    pub method: PaymentMethod,
    pub kind: PaymentKind,
    pub status: PaymentStatus,
    pub due_date: Option<NaiveDate>,
    pub paid_at: Option<DateTime<Utc>>,
    pub reference: Option<String>,
    /// Cycle the contribution belongs to; required for [`PaymentKind::Contribution`].
    pub cycle: Option<u32>,
    pub penalty: Money,
    pub days_late: u32,
    pub comment: Option<String>,
    pub transaction_fee: Money,
    pub automatic: bool,
    pub attempt: u32,
}

impl Payment {
    pub fn new(
        participation: ParticipationId,
        tontine: TontineId,
        amount: Amount,
        method: PaymentMethod,
        kind: PaymentKind,
        clock: &dyn Clock,
    ) -> Self {
        Self {
            id: PaymentId::new(),
            meta: EntityMeta::new(clock),
            participation,
            tontine,
            amount: amount.into(),
            method,
            kind,
            status: PaymentStatus::Pending,
            due_date: None,
            paid_at: None,
            reference: None,
            cycle: None,
            penalty: Money::ZERO,
            days_late: 0,
            comment: None,
            transaction_fee: Money::ZERO,
            automatic: false,
            attempt: 1,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == PaymentStatus::Confirmed
    }

    /// Days past the due date. Zero without a due date or when on time.
    ///
    /// Once confirmed, the confirmation date is the authoritative reference;
    /// until then the current date is used. Pure function of the payment and
    /// the clock.
    pub fn compute_days_late(&self, clock: &dyn Clock) -> u32 {
        let Some(due) = self.due_date else {
            return 0;
        };
        let reference = match (self.status, self.paid_at) {
            (PaymentStatus::Confirmed, Some(paid_at)) => paid_at.date_naive(),
            _ => clock.today(),
        };
        (reference - due).num_days().max(0) as u32
    }

    /// Penalty owed for lateness: zero when the tontine defines no rate or
    /// the lateness is within the grace period, otherwise
    /// `rate * (days_late - grace)`.
    pub fn compute_penalty(&self, tontine: &Tontine, clock: &dyn Clock) -> Money {
        let Some(rate) = tontine.late_penalty_per_day else {
            return Money::ZERO;
        };
        let days_late = self.compute_days_late(clock);
        if days_late <= tontine.grace_period_days {
            return Money::ZERO;
        }
        rate * (days_late - tontine.grace_period_days)
    }

    /// Confirms the payment and applies it to the owning participation.
    ///
    /// Pending -> Confirmed only; a second confirmation is rejected so the
    /// participation totals cannot be double-counted. The confirmation
    /// timestamp freezes `days_late` and `penalty`.
    pub fn confirm(
        &mut self,
        reference: &str,
        tontine: &Tontine,
        participation: &mut Participation,
        clock: &dyn Clock,
    ) -> Result<()> {
        if self.status != PaymentStatus::Pending {
            return Err(TontineError::IllegalTransition(format!(
                "payment cannot be confirmed from {:?}",
                self.status
            )));
        }
        if self.participation != participation.id {
            return Err(TontineError::InvariantViolation(
                "payment does not belong to this participation".to_string(),
            ));
        }
        self.validate()?;

        self.status = PaymentStatus::Confirmed;
        self.paid_at = Some(clock.now());
        self.reference = Some(reference.to_string());
        self.days_late = self.compute_days_late(clock);
        self.penalty = self.compute_penalty(tontine, clock);
        self.meta.touch(clock);

        participation.record_confirmed_payment(self.amount, self.penalty, self.days_late);
        Ok(())
    }

    /// Pending -> Failed. No participation side effects.
    pub fn fail(&mut self, reason: &str, clock: &dyn Clock) -> Result<()> {
        self.terminate(PaymentStatus::Failed, reason, clock)
    }

    /// Pending -> Cancelled. No participation side effects.
    pub fn cancel(&mut self, reason: &str, clock: &dyn Clock) -> Result<()> {
        self.terminate(PaymentStatus::Cancelled, reason, clock)
    }

    fn terminate(&mut self, target: PaymentStatus, reason: &str, clock: &dyn Clock) -> Result<()> {
        if self.status != PaymentStatus::Pending {
            return Err(TontineError::IllegalTransition(format!(
                "payment cannot move to {target:?} from {:?}",
                self.status
            )));
        }
        self.status = target;
        self.comment = Some(reason.to_string());
        self.meta.touch(clock);
        Ok(())
    }

    /// Policy flag for the external approval workflow, not an error.
    pub fn requires_manual_review(&self) -> bool {
        self.amount > Money::new(dec!(100000))
            || self.method == PaymentMethod::Cash
            || self.attempt > 3
    }

    /// Amount plus transaction fee plus accrued penalty.
    pub fn total_amount(&self) -> Money {
        self.amount + self.transaction_fee + self.penalty
    }

    /// Structural validation, invoked before persisting.
    pub fn validate(&self) -> Result<()> {
        if self.kind == PaymentKind::Contribution && self.cycle.is_none() {
            return Err(TontineError::InvariantViolation(
                "contribution payments require a cycle number".to_string(),
            ));
        }
        if let Some(0) = self.cycle {
            return Err(TontineError::InvariantViolation(
                "cycle numbers start at 1".to_string(),
            ));
        }
        Ok(())
    }
}
