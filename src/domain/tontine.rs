use crate::domain::clock::Clock;
use crate::domain::meta::{EntityMeta, TontineId, UserId};
use crate::domain::money::Money;
use crate::domain::participation::Participation;
use crate::error::{Result, TontineError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const MIN_PARTICIPANTS: u32 = 2;
pub const MAX_PARTICIPANTS: u32 = 100;
pub const DEFAULT_GRACE_PERIOD_DAYS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TontineKind {
    /// Fixed contributions at a fixed frequency, rotating jackpots.
    Classic,
    /// Variable pledges building toward a single event date.
    EventBased,
    /// Pooled jackpot shared by the whole group; contribution rules follow
    /// the classic kind.
    Grouped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawKind {
    Random,
    Selective,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TontineStatus {
    Pending,
    Active,
    Completed,
    Cancelled,
}

/// Configuration and rules of one savings circle.
///
/// Participations, payments and jackpots reference the tontine by id; the
/// tontine itself holds no back-pointers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tontine {
    pub id: TontineId,
    pub meta: EntityMeta,
    pub admin: UserId,
    pub name: String,
    pub description: Option<String>,
    pub kind: TontineKind,
    pub draw: DrawKind,
    pub status: TontineStatus,
    pub min_participants: u32,
    pub max_participants: u32,
    /// Per-cycle contribution, required for classic and grouped tontines.
    pub contribution_amount: Option<Money>,
    /// Days between contributions, required for classic and grouped tontines.
    pub contribution_frequency_days: Option<u32>,
    /// Pledge bounds for event-based tontines.
    pub min_contribution: Option<Money>,
    pub max_contribution: Option<Money>,
    /// Required for event-based tontines.
    pub event_date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Flat penalty accrued per day of lateness past the grace period.
    pub late_penalty_per_day: Option<Money>,
    pub grace_period_days: u32,
    pub public: bool,
    pub invite_code: Option<String>,
}

impl Tontine {
    pub fn new(
        admin: UserId,
        name: &str,
        kind: TontineKind,
        draw: DrawKind,
        min_participants: u32,
        max_participants: u32,
        clock: &dyn Clock,
    ) -> Self {
        Self {
            id: TontineId::new(),
            meta: EntityMeta::new(clock),
            admin,
            name: name.to_string(),
            description: None,
            kind,
            draw,
            status: TontineStatus::Pending,
            min_participants,
            max_participants,
            contribution_amount: None,
            contribution_frequency_days: None,
            min_contribution: None,
            max_contribution: None,
            event_date: None,
            start_date: None,
            end_date: None,
            late_penalty_per_day: None,
            grace_period_days: DEFAULT_GRACE_PERIOD_DAYS,
            public: true,
            invite_code: None,
        }
    }

    pub fn is_event_based(&self) -> bool {
        self.kind == TontineKind::EventBased
    }

    pub fn is_active(&self) -> bool {
        self.status == TontineStatus::Active
    }

    pub fn can_accept_participant(&self, current_count: u32) -> bool {
        self.is_active() && current_count < self.max_participants
    }

    pub fn has_minimum_participants(&self, current_count: u32) -> bool {
        current_count >= self.min_participants
    }

    /// Total collected per cycle: the sum of pledges for event-based
    /// tontines, contribution times headcount otherwise.
    pub fn total_per_cycle(&self, participations: &[Participation]) -> Money {
        if self.is_event_based() {
            participations
                .iter()
                .filter_map(|p| p.pledged_amount)
                .fold(Money::ZERO, |acc, pledge| acc + pledge)
        } else {
            self.contribution_amount.unwrap_or(Money::ZERO) * participations.len() as u32
        }
    }

    /// Pending -> Active, gated on the minimum quorum.
    pub fn activate(&mut self, current_count: u32, clock: &dyn Clock) -> Result<()> {
        if self.status != TontineStatus::Pending {
            return Err(TontineError::IllegalTransition(format!(
                "tontine cannot be activated from {:?}",
                self.status
            )));
        }
        if !self.has_minimum_participants(current_count) {
            return Err(TontineError::NotEligible(format!(
                "tontine needs {} participants, has {current_count}",
                self.min_participants
            )));
        }
        self.status = TontineStatus::Active;
        self.meta.touch(clock);
        Ok(())
    }

    pub fn complete(&mut self, clock: &dyn Clock) -> Result<()> {
        if self.status != TontineStatus::Active {
            return Err(TontineError::IllegalTransition(format!(
                "tontine cannot be completed from {:?}",
                self.status
            )));
        }
        self.status = TontineStatus::Completed;
        self.meta.touch(clock);
        Ok(())
    }

    pub fn cancel(&mut self, clock: &dyn Clock) -> Result<()> {
        if !matches!(self.status, TontineStatus::Pending | TontineStatus::Active) {
            return Err(TontineError::IllegalTransition(format!(
                "tontine cannot be cancelled from {:?}",
                self.status
            )));
        }
        self.status = TontineStatus::Cancelled;
        self.meta.touch(clock);
        Ok(())
    }

    /// Structural validation, invoked by the caller before persisting a new
    /// or updated tontine.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(TontineError::InvariantViolation(
                "tontine name cannot be empty".to_string(),
            ));
        }
        if self.min_participants < MIN_PARTICIPANTS {
            return Err(TontineError::InvariantViolation(format!(
                "a tontine needs at least {MIN_PARTICIPANTS} participants"
            )));
        }
        if self.max_participants > MAX_PARTICIPANTS {
            return Err(TontineError::InvariantViolation(format!(
                "a tontine cannot exceed {MAX_PARTICIPANTS} participants"
            )));
        }
        if self.min_participants > self.max_participants {
            return Err(TontineError::InvariantViolation(format!(
                "min participants {} exceeds max {}",
                self.min_participants, self.max_participants
            )));
        }
        if let Some(rate) = self.late_penalty_per_day {
            if rate < Money::ZERO {
                return Err(TontineError::InvariantViolation(
                    "late penalty rate cannot be negative".to_string(),
                ));
            }
        }

        if self.is_event_based() {
            if self.event_date.is_none() {
                return Err(TontineError::InvariantViolation(
                    "event-based tontines require an event date".to_string(),
                ));
            }
            if let (Some(min), Some(max)) = (self.min_contribution, self.max_contribution) {
                if min > max {
                    return Err(TontineError::InvariantViolation(format!(
                        "min contribution {min} exceeds max {max}"
                    )));
                }
            }
        } else {
            if self.contribution_amount.is_none() {
                return Err(TontineError::InvariantViolation(
                    "classic tontines require a contribution amount".to_string(),
                ));
            }
            match self.contribution_frequency_days {
                None => {
                    return Err(TontineError::InvariantViolation(
                        "classic tontines require a contribution frequency".to_string(),
                    ));
                }
                Some(0) => {
                    return Err(TontineError::InvariantViolation(
                        "contribution frequency must be at least 1 day".to_string(),
                    ));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}
