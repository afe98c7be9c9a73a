//! Vault bookkeeping through the engine: trail integrity, auto-save and
//! goal tracking.

use chrono::NaiveDate;
use ditontine_core::application::engine::{Stores, TontineEngine};
use ditontine_core::domain::clock::FixedClock;
use ditontine_core::domain::meta::UserId;
use ditontine_core::domain::money::{Amount, Money};
use ditontine_core::domain::ports::VaultStore;
use ditontine_core::domain::vault::{SavingsGoal, VaultTransactionKind};
use ditontine_core::error::TontineError;
use ditontine_core::infrastructure::in_memory::{
    InMemoryJackpotStore, InMemoryParticipationStore, InMemoryPaymentStore, InMemoryTontineStore,
    InMemoryVaultStore,
};
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn engine_with_vault_store(today: NaiveDate) -> (TontineEngine, InMemoryVaultStore) {
    let vaults = InMemoryVaultStore::new();
    let engine = TontineEngine::new(
        Stores {
            tontines: Box::new(InMemoryTontineStore::new()),
            participations: Box::new(InMemoryParticipationStore::new()),
            payments: Box::new(InMemoryPaymentStore::new()),
            jackpots: Box::new(InMemoryJackpotStore::new()),
            vaults: Box::new(vaults.clone()),
        },
        Box::new(FixedClock::at(today)),
    );
    (engine, vaults)
}

fn amount(d: rust_decimal::Decimal) -> Amount {
    Amount::new(d).unwrap()
}

#[tokio::test]
async fn test_trail_invariant_over_mixed_operations() {
    let (engine, _) = engine_with_vault_store(date(2025, 6, 1));
    let vault_id = engine.open_vault(UserId::new()).await.unwrap();

    engine.deposit(vault_id, amount(dec!(5000)), "a").await.unwrap();
    engine.withdraw(vault_id, amount(dec!(1200)), "b").await.unwrap();
    engine.deposit(vault_id, amount(dec!(300.50)), "c").await.unwrap();
    assert!(engine.withdraw(vault_id, amount(dec!(99999)), "d").await.is_err());
    engine.withdraw(vault_id, amount(dec!(100)), "e").await.unwrap();

    let vaults = engine.vault_statements().await.unwrap();
    let vault = &vaults[0];
    assert_eq!(vault.balance, Money::new(dec!(4000.50)));
    // The rejected withdrawal appended nothing.
    assert_eq!(vault.transactions.len(), 4);

    for tx in &vault.transactions {
        let expected = match tx.kind {
            VaultTransactionKind::Withdrawal => tx.balance_before - tx.amount,
            _ => tx.balance_before + tx.amount,
        };
        assert_eq!(tx.balance_after, expected);
        assert!(tx.balance_after >= Money::ZERO);
    }
}

#[tokio::test]
async fn test_auto_save_tick_through_engine() {
    let (engine, vaults) = engine_with_vault_store(date(2025, 6, 1));
    let vault_id = engine.open_vault(UserId::new()).await.unwrap();

    // No plan configured yet.
    assert!(matches!(
        engine.auto_save_tick(vault_id).await,
        Err(TontineError::NotEligible(_))
    ));

    let mut vault = vaults.get(vault_id).await.unwrap().unwrap();
    vault
        .configure_auto_save(amount(dec!(250)), 5, engine.clock())
        .unwrap();
    vaults.store(vault).await.unwrap();

    assert_eq!(
        engine.auto_save_tick(vault_id).await.unwrap(),
        Money::new(dec!(250))
    );
    assert_eq!(
        engine.auto_save_tick(vault_id).await.unwrap(),
        Money::new(dec!(500))
    );
}

#[tokio::test]
async fn test_goal_lifecycle_through_engine() {
    let (engine, _) = engine_with_vault_store(date(2025, 6, 1));
    let vault_id = engine.open_vault(UserId::new()).await.unwrap();

    // Target date must be strictly in the future.
    let stale = SavingsGoal {
        amount: Money::new(dec!(1000)),
        label: "magal".to_string(),
        target_date: date(2025, 6, 1),
    };
    assert!(matches!(
        engine.set_vault_goal(vault_id, stale).await,
        Err(TontineError::InvariantViolation(_))
    ));

    engine
        .set_vault_goal(
            vault_id,
            SavingsGoal {
                amount: Money::new(dec!(1000)),
                label: "magal".to_string(),
                target_date: date(2025, 12, 1),
            },
        )
        .await
        .unwrap();

    assert!(matches!(
        engine.record_goal_reached(vault_id).await,
        Err(TontineError::NotEligible(_))
    ));

    engine.deposit(vault_id, amount(dec!(1000)), "save").await.unwrap();
    engine.record_goal_reached(vault_id).await.unwrap();

    let vaults = engine.vault_statements().await.unwrap();
    let marker = vaults[0].transactions.last().unwrap();
    assert_eq!(marker.kind, VaultTransactionKind::GoalReached);
    assert_eq!(marker.balance_before, marker.balance_after);
}
