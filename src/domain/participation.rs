use crate::domain::clock::Clock;
use crate::domain::meta::{EntityMeta, ParticipationId, TontineId, UserId};
use crate::domain::money::Money;
use crate::domain::tontine::Tontine;
use crate::error::{Result, TontineError};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Score threshold below which a participant cannot receive a jackpot.
pub const JACKPOT_ELIGIBILITY_SCORE: Decimal = dec!(50);
/// Flat score deduction applied while the participant carries penalties.
const PENALTY_SCORE_DEDUCTION: Decimal = dec!(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipationStatus {
    Pending,
    Active,
    Suspended,
    Completed,
    Excluded,
}

/// One user's membership in one tontine, unique per (user, tontine).
///
/// Carries the running totals and the performance score that the payment
/// engine maintains on every confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participation {
    pub id: ParticipationId,
    pub meta: EntityMeta,
    pub user: UserId,
    pub tontine: TontineId,
    pub status: ParticipationStatus,
    pub requested_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    /// Individual pledge, used by event-based tontines.
    pub pledged_amount: Option<Money>,
    /// Position in the draw order for selective draws.
    pub draw_position: Option<u32>,
    pub payments_made: u32,
    pub payments_late: u32,
    pub total_paid: Money,
    pub total_penalties: Money,
    pub has_received_jackpot: bool,
    /// Performance score in [0, 100], starts at 100.
    pub score: Decimal,
}

impl Participation {
    pub fn new(user: UserId, tontine: TontineId, clock: &dyn Clock) -> Self {
        Self {
            id: ParticipationId::new(),
            meta: EntityMeta::new(clock),
            user,
            tontine,
            status: ParticipationStatus::Pending,
            requested_at: clock.now(),
            accepted_at: None,
            pledged_amount: None,
            draw_position: None,
            payments_made: 0,
            payments_late: 0,
            total_paid: Money::ZERO,
            total_penalties: Money::ZERO,
            has_received_jackpot: false,
            score: dec!(100),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ParticipationStatus::Active
    }

    /// Admin acceptance: Pending -> Active, stamps the acceptance time.
    pub fn accept(&mut self, clock: &dyn Clock) -> Result<()> {
        if self.status != ParticipationStatus::Pending {
            return Err(self.illegal("accepted"));
        }
        self.status = ParticipationStatus::Active;
        self.accepted_at = Some(clock.now());
        self.meta.touch(clock);
        Ok(())
    }

    pub fn suspend(&mut self, clock: &dyn Clock) -> Result<()> {
        if self.status != ParticipationStatus::Active {
            return Err(self.illegal("suspended"));
        }
        self.status = ParticipationStatus::Suspended;
        self.meta.touch(clock);
        Ok(())
    }

    pub fn reactivate(&mut self, clock: &dyn Clock) -> Result<()> {
        if self.status != ParticipationStatus::Suspended {
            return Err(self.illegal("reactivated"));
        }
        self.status = ParticipationStatus::Active;
        self.meta.touch(clock);
        Ok(())
    }

    pub fn complete(&mut self, clock: &dyn Clock) -> Result<()> {
        if self.status != ParticipationStatus::Active {
            return Err(self.illegal("completed"));
        }
        self.status = ParticipationStatus::Completed;
        self.meta.touch(clock);
        Ok(())
    }

    /// Any non-terminal state can be excluded.
    pub fn exclude(&mut self, clock: &dyn Clock) -> Result<()> {
        if !matches!(
            self.status,
            ParticipationStatus::Pending
                | ParticipationStatus::Active
                | ParticipationStatus::Suspended
        ) {
            return Err(self.illegal("excluded"));
        }
        self.status = ParticipationStatus::Excluded;
        self.meta.touch(clock);
        Ok(())
    }

    fn illegal(&self, verb: &str) -> TontineError {
        TontineError::IllegalTransition(format!(
            "participation cannot be {verb} from {:?}",
            self.status
        ))
    }

    /// Share of confirmed payments that were on time, as a percentage.
    /// 100 when nothing has been paid yet.
    pub fn punctuality_pct(&self) -> Decimal {
        if self.payments_made == 0 {
            return dec!(100);
        }
        let on_time = self.payments_made.saturating_sub(self.payments_late);
        (Decimal::from(on_time) * dec!(100) / Decimal::from(self.payments_made)).round_dp(2)
    }

    /// Score = punctuality, minus a flat deduction while penalties are
    /// outstanding, clamped to [0, 100]. Invoked by the payment engine on
    /// every confirmation.
    pub fn recalculate_score(&mut self) {
        let mut score = self.punctuality_pct();
        if self.total_penalties > Money::ZERO {
            score -= PENALTY_SCORE_DEDUCTION;
        }
        self.score = score.clamp(Decimal::ZERO, dec!(100));
    }

    /// Applies a confirmed payment to the running totals and refreshes the
    /// score. Called by `Payment::confirm`.
    pub fn record_confirmed_payment(&mut self, amount: Money, penalty: Money, days_late: u32) {
        self.payments_made += 1;
        self.total_paid += amount;
        self.total_penalties += penalty;
        if days_late > 0 {
            self.payments_late += 1;
        }
        self.recalculate_score();
    }

    pub fn is_eligible_for_jackpot(&self) -> bool {
        self.is_active() && !self.has_received_jackpot && self.score >= JACKPOT_ELIGIBILITY_SCORE
    }

    /// Total owed over the life of the tontine: the individual pledge for
    /// event-based tontines, contribution times headcount otherwise.
    pub fn total_due(&self, tontine: &Tontine, participant_count: u32) -> Money {
        if tontine.is_event_based() {
            self.pledged_amount.unwrap_or(Money::ZERO)
        } else {
            tontine.contribution_amount.unwrap_or(Money::ZERO) * participant_count
        }
    }

    pub fn remaining_due(&self, tontine: &Tontine, participant_count: u32) -> Money {
        self.total_due(tontine, participant_count) - self.total_paid
    }

    pub fn is_up_to_date(&self, tontine: &Tontine, participant_count: u32) -> bool {
        self.remaining_due(tontine, participant_count) <= Money::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clock::SystemClock;
    use crate::domain::tontine::{DrawKind, TontineKind};

    fn active_participation() -> Participation {
        let mut p = Participation::new(UserId::new(), TontineId::new(), &SystemClock);
        p.accept(&SystemClock).unwrap();
        p
    }

    #[test]
    fn test_accept_sets_timestamp() {
        let mut p = Participation::new(UserId::new(), TontineId::new(), &SystemClock);
        assert!(p.accepted_at.is_none());
        p.accept(&SystemClock).unwrap();
        assert!(p.is_active());
        assert!(p.accepted_at.is_some());
    }

    #[test]
    fn test_only_forward_transitions() {
        let mut p = active_participation();
        assert!(matches!(
            p.accept(&SystemClock),
            Err(TontineError::IllegalTransition(_))
        ));

        p.suspend(&SystemClock).unwrap();
        assert!(p.complete(&SystemClock).is_err());
        p.reactivate(&SystemClock).unwrap();
        p.complete(&SystemClock).unwrap();

        // Completed is terminal
        assert!(p.suspend(&SystemClock).is_err());
        assert!(p.exclude(&SystemClock).is_err());
    }

    #[test]
    fn test_exclusion_from_any_non_terminal_state() {
        let mut pending = Participation::new(UserId::new(), TontineId::new(), &SystemClock);
        assert!(pending.exclude(&SystemClock).is_ok());

        let mut suspended = active_participation();
        suspended.suspend(&SystemClock).unwrap();
        assert!(suspended.exclude(&SystemClock).is_ok());
    }

    #[test]
    fn test_punctuality_with_no_payments_is_100() {
        let p = active_participation();
        assert_eq!(p.punctuality_pct(), dec!(100));
    }

    #[test]
    fn test_score_scenario_ten_payments_two_late_with_penalties() {
        let mut p = active_participation();
        for i in 0..10 {
            let late = i < 2;
            let penalty = if late {
                Money::new(dec!(500))
            } else {
                Money::ZERO
            };
            p.record_confirmed_payment(
                Money::new(dec!(10000)),
                penalty,
                if late { 5 } else { 0 },
            );
        }
        assert_eq!(p.payments_made, 10);
        assert_eq!(p.payments_late, 2);
        assert_eq!(p.punctuality_pct(), dec!(80));
        assert_eq!(p.score, dec!(70));
    }

    #[test]
    fn test_score_clamped_to_zero() {
        let mut p = active_participation();
        // Every payment late and penalized: punctuality 0, minus 10, clamped.
        for _ in 0..3 {
            p.record_confirmed_payment(Money::new(dec!(1000)), Money::new(dec!(100)), 4);
        }
        assert_eq!(p.score, dec!(0));
    }

    #[test]
    fn test_score_stays_100_when_always_on_time() {
        let mut p = active_participation();
        for _ in 0..5 {
            p.record_confirmed_payment(Money::new(dec!(1000)), Money::ZERO, 0);
        }
        assert_eq!(p.score, dec!(100));
    }

    #[test]
    fn test_jackpot_eligibility() {
        let mut p = active_participation();
        assert!(p.is_eligible_for_jackpot());

        p.has_received_jackpot = true;
        assert!(!p.is_eligible_for_jackpot());

        p.has_received_jackpot = false;
        p.score = dec!(49.99);
        assert!(!p.is_eligible_for_jackpot());

        p.score = dec!(50);
        p.suspend(&SystemClock).unwrap();
        assert!(!p.is_eligible_for_jackpot());
    }

    #[test]
    fn test_total_due_per_tontine_kind() {
        let mut classic = Tontine::new(
            UserId::new(),
            "classic",
            TontineKind::Classic,
            DrawKind::Random,
            2,
            10,
            &SystemClock,
        );
        classic.contribution_amount = Some(Money::new(dec!(10000)));
        classic.contribution_frequency_days = Some(30);

        let mut p = active_participation();
        assert_eq!(p.total_due(&classic, 5), Money::new(dec!(50000)));

        let mut event = classic.clone();
        event.kind = TontineKind::EventBased;
        p.pledged_amount = Some(Money::new(dec!(25000)));
        assert_eq!(p.total_due(&event, 5), Money::new(dec!(25000)));

        p.total_paid = Money::new(dec!(20000));
        assert_eq!(p.remaining_due(&event, 5), Money::new(dec!(5000)));
        assert!(!p.is_up_to_date(&event, 5));
        p.total_paid = Money::new(dec!(25000));
        assert!(p.is_up_to_date(&event, 5));
    }
}
