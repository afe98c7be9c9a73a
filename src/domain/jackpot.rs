use crate::domain::clock::Clock;
use crate::domain::meta::{EntityMeta, JackpotId, ParticipationId, TontineId};
use crate::domain::money::Money;
use crate::domain::participation::Participation;
use crate::error::{Result, TontineError};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

pub const DEFAULT_NOTIFY_BEFORE_DAYS: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JackpotStatus {
    Scheduled,
    Active,
    Distributed,
    Postponed,
    Cancelled,
}

impl JackpotStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JackpotStatus::Distributed | JackpotStatus::Cancelled)
    }
}

/// The payout for one cycle of one tontine to one beneficiary participation.
///
/// `net` is derived from gross minus fees and deducted penalties, frozen at
/// distribution time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Jackpot {
    pub id: JackpotId,
    pub meta: EntityMeta,
    pub tontine: TontineId,
    pub beneficiary: ParticipationId,
    pub cycle: u32,
    pub gross: Money,
    pub scheduled_date: NaiveDate,
    pub distributed_at: Option<DateTime<Utc>>,
    pub status: JackpotStatus,
    pub management_fee: Money,
    pub deducted_penalties: Money,
    pub net: Option<Money>,
    pub method: Option<String>,
    pub reference: Option<String>,
    pub comment: Option<String>,
    pub priority: bool,
    pub notify_before_days: u32,
}

impl Jackpot {
    pub fn new(
        tontine: TontineId,
        beneficiary: ParticipationId,
        cycle: u32,
        gross: Money,
        scheduled_date: NaiveDate,
        clock: &dyn Clock,
    ) -> Self {
        Self {
            id: JackpotId::new(),
            meta: EntityMeta::new(clock),
            tontine,
            beneficiary,
            cycle,
            gross,
            scheduled_date,
            distributed_at: None,
            status: JackpotStatus::Scheduled,
            management_fee: Money::ZERO,
            deducted_penalties: Money::ZERO,
            net: None,
            method: None,
            reference: None,
            comment: None,
            priority: false,
            notify_before_days: DEFAULT_NOTIFY_BEFORE_DAYS,
        }
    }

    /// Net payout: gross minus management fee and deducted penalties,
    /// floored at zero. Pure function of the aggregate.
    pub fn net_amount(&self) -> Money {
        self.gross
            .saturating_sub(self.management_fee + self.deducted_penalties)
    }

    /// Fee plus penalties as a percentage of the gross amount, 2 decimals,
    /// half-up. Zero for a zero gross.
    pub fn levy_percentage(&self) -> Decimal {
        if self.gross.is_zero() {
            return Decimal::ZERO;
        }
        let levy = (self.management_fee + self.deducted_penalties).value();
        (levy * Decimal::from(100) / self.gross.value())
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Scheduled -> Active only.
    pub fn activate(&mut self, clock: &dyn Clock) -> Result<()> {
        if self.status != JackpotStatus::Scheduled {
            return Err(self.illegal("activated"));
        }
        self.status = JackpotStatus::Active;
        self.meta.touch(clock);
        Ok(())
    }

    /// Any non-terminal state -> Postponed; updates the scheduled date and
    /// records the reason.
    pub fn postpone(&mut self, new_date: NaiveDate, reason: &str, clock: &dyn Clock) -> Result<()> {
        if self.status.is_terminal() {
            return Err(self.illegal("postponed"));
        }
        self.status = JackpotStatus::Postponed;
        self.scheduled_date = new_date;
        self.comment = Some(reason.to_string());
        self.meta.touch(clock);
        Ok(())
    }

    /// Any non-terminal state -> Cancelled.
    pub fn cancel(&mut self, reason: &str, clock: &dyn Clock) -> Result<()> {
        if self.status.is_terminal() {
            return Err(self.illegal("cancelled"));
        }
        self.status = JackpotStatus::Cancelled;
        self.comment = Some(reason.to_string());
        self.meta.touch(clock);
        Ok(())
    }

    /// Active -> Distributed. Checks the levy invariant and the beneficiary's
    /// eligibility before mutating anything, then freezes the net amount and
    /// flags the beneficiary as served.
    pub fn distribute(
        &mut self,
        method: &str,
        reference: &str,
        beneficiary: &mut Participation,
        clock: &dyn Clock,
    ) -> Result<()> {
        if self.status != JackpotStatus::Active {
            return Err(self.illegal("distributed"));
        }
        self.validate()?;
        if self.beneficiary != beneficiary.id {
            return Err(TontineError::InvariantViolation(
                "participation is not the beneficiary of this jackpot".to_string(),
            ));
        }
        if !beneficiary.is_eligible_for_jackpot() {
            return Err(TontineError::NotEligible(format!(
                "participation {} cannot receive a jackpot",
                beneficiary.id
            )));
        }

        self.status = JackpotStatus::Distributed;
        self.distributed_at = Some(clock.now());
        self.method = Some(method.to_string());
        self.reference = Some(reference.to_string());
        self.net = Some(self.net_amount());
        self.meta.touch(clock);

        beneficiary.has_received_jackpot = true;
        beneficiary.meta.touch(clock);
        Ok(())
    }

    /// True while a scheduled or active jackpot sits past its date.
    pub fn is_overdue(&self, clock: &dyn Clock) -> bool {
        matches!(self.status, JackpotStatus::Scheduled | JackpotStatus::Active)
            && clock.today() > self.scheduled_date
    }

    /// True for an active jackpot within the notification window before the
    /// scheduled date.
    pub fn should_notify(&self, clock: &dyn Clock) -> bool {
        self.status == JackpotStatus::Active
            && clock.today() > self.scheduled_date - Duration::days(self.notify_before_days as i64)
    }

    /// Structural validation, invoked before persisting and before
    /// distribution.
    pub fn validate(&self) -> Result<()> {
        if self.cycle == 0 {
            return Err(TontineError::InvariantViolation(
                "cycle numbers start at 1".to_string(),
            ));
        }
        if self.notify_before_days == 0 {
            return Err(TontineError::InvariantViolation(
                "notification window must be at least 1 day".to_string(),
            ));
        }
        if self.management_fee + self.deducted_penalties > self.gross {
            return Err(TontineError::InvariantViolation(format!(
                "fee {} plus penalties {} exceed gross amount {}",
                self.management_fee, self.deducted_penalties, self.gross
            )));
        }
        Ok(())
    }

    fn illegal(&self, verb: &str) -> TontineError {
        TontineError::IllegalTransition(format!(
            "jackpot cannot be {verb} from {:?}",
            self.status
        ))
    }
}
