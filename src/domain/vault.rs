use crate::domain::clock::Clock;
use crate::domain::meta::{EntityMeta, UserId, VaultId};
use crate::domain::money::{Amount, Money};
use crate::error::{Result, TontineError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Kind of entry in a vault's transaction trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VaultTransactionKind {
    Deposit,
    Withdrawal,
    AutoSave,
    /// Zero-amount marker appended when the savings goal is reached.
    GoalReached,
}

impl VaultTransactionKind {
    fn is_debit(&self) -> bool {
        matches!(self, VaultTransactionKind::Withdrawal)
    }
}

/// One immutable entry in a vault's trail. Snapshots the balance on both
/// sides of the mutation so the trail can be audited independently of the
/// running balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultTransaction {
    pub kind: VaultTransactionKind,
    pub amount: Money,
    pub balance_before: Money,
    pub balance_after: Money,
    pub description: String,
    pub at: DateTime<Utc>,
}

/// A savings goal: target amount, label, and a deadline that must be in the
/// future when the goal is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsGoal {
    pub amount: Money,
    pub label: String,
    pub target_date: NaiveDate,
}

/// Recurring auto-save configuration. The day of month is capped at 28 so the
/// tick exists in every month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoSavePlan {
    pub amount: Money,
    pub day_of_month: u8,
}

/// A user's personal savings vault (1:1 with the user).
///
/// The balance is never negative and every mutation appends to the
/// transaction trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vault {
    pub id: VaultId,
    pub meta: EntityMeta,
    pub owner: UserId,
    pub balance: Money,
    pub goal: Option<SavingsGoal>,
    pub auto_save: Option<AutoSavePlan>,
    pub transactions: Vec<VaultTransaction>,
}

impl Vault {
    pub fn new(owner: UserId, clock: &dyn Clock) -> Self {
        Self {
            id: VaultId::new(),
            meta: EntityMeta::new(clock),
            owner,
            balance: Money::ZERO,
            goal: None,
            auto_save: None,
            transactions: Vec::new(),
        }
    }

    /// Credits the vault and returns the updated balance.
    pub fn deposit(
        &mut self,
        amount: Amount,
        description: &str,
        clock: &dyn Clock,
    ) -> Result<Money> {
        self.apply(VaultTransactionKind::Deposit, amount.into(), description, clock)
    }

    /// Debits the vault. Fails without mutating when the amount exceeds the
    /// balance.
    pub fn withdraw(
        &mut self,
        amount: Amount,
        description: &str,
        clock: &dyn Clock,
    ) -> Result<Money> {
        let amount: Money = amount.into();
        if amount > self.balance {
            return Err(TontineError::IllegalTransition(format!(
                "withdrawal of {amount} exceeds balance {}",
                self.balance
            )));
        }
        self.apply(VaultTransactionKind::Withdrawal, amount, description, clock)
    }

    /// Applies the configured recurring amount as an auto-save credit.
    pub fn auto_save_tick(&mut self, clock: &dyn Clock) -> Result<Money> {
        let amount = match &self.auto_save {
            Some(plan) => plan.amount,
            None => {
                return Err(TontineError::NotEligible(
                    "vault has no auto-save plan configured".to_string(),
                ));
            }
        };
        self.apply(VaultTransactionKind::AutoSave, amount, "auto-save", clock)
    }

    /// Appends the goal-reached marker once the balance covers the goal.
    pub fn record_goal_reached(&mut self, clock: &dyn Clock) -> Result<()> {
        match &self.goal {
            Some(goal) if self.balance >= goal.amount => {
                let label = goal.label.clone();
                self.apply(VaultTransactionKind::GoalReached, Money::ZERO, &label, clock)?;
                Ok(())
            }
            Some(goal) => Err(TontineError::NotEligible(format!(
                "balance {} has not reached goal {}",
                self.balance, goal.amount
            ))),
            None => Err(TontineError::NotEligible(
                "vault has no savings goal".to_string(),
            )),
        }
    }

    /// Sets or replaces the savings goal. The target date must be strictly in
    /// the future.
    pub fn set_goal(&mut self, goal: SavingsGoal, clock: &dyn Clock) -> Result<()> {
        if goal.target_date <= clock.today() {
            return Err(TontineError::InvariantViolation(format!(
                "goal target date {} is not in the future",
                goal.target_date
            )));
        }
        self.goal = Some(goal);
        self.meta.touch(clock);
        Ok(())
    }

    /// Configures the recurring auto-save. Day of month must be 1-28.
    pub fn configure_auto_save(
        &mut self,
        amount: Amount,
        day_of_month: u8,
        clock: &dyn Clock,
    ) -> Result<()> {
        if !(1..=28).contains(&day_of_month) {
            return Err(TontineError::InvariantViolation(format!(
                "auto-save day {day_of_month} must be between 1 and 28"
            )));
        }
        self.auto_save = Some(AutoSavePlan {
            amount: amount.into(),
            day_of_month,
        });
        self.meta.touch(clock);
        Ok(())
    }

    pub fn is_goal_reached(&self) -> bool {
        self.goal
            .as_ref()
            .is_some_and(|goal| self.balance >= goal.amount)
    }

    fn apply(
        &mut self,
        kind: VaultTransactionKind,
        amount: Money,
        description: &str,
        clock: &dyn Clock,
    ) -> Result<Money> {
        let before = self.balance;
        let after = if kind.is_debit() {
            before - amount
        } else {
            before + amount
        };
        self.transactions.push(VaultTransaction {
            kind,
            amount,
            balance_before: before,
            balance_after: after,
            description: description.to_string(),
            at: clock.now(),
        });
        self.balance = after;
        self.meta.touch(clock);
        Ok(after)
    }
}
