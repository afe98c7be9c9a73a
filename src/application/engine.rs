use crate::domain::clock::Clock;
use crate::domain::jackpot::Jackpot;
use crate::domain::meta::{JackpotId, ParticipationId, PaymentId, TontineId, UserId, VaultId};
use crate::domain::money::{Amount, Money};
use crate::domain::participation::{Participation, ParticipationStatus};
use crate::domain::payment::Payment;
use crate::domain::ports::{
    JackpotStoreBox, ParticipationStoreBox, PaymentStoreBox, TontineStoreBox, VaultStoreBox,
};
use crate::domain::tontine::Tontine;
use crate::domain::vault::{SavingsGoal, Vault};
use crate::error::{Result, TontineError};
use chrono::NaiveDate;

/// The persistence backends the engine drives.
pub struct Stores {
    pub tontines: TontineStoreBox,
    pub participations: ParticipationStoreBox,
    pub payments: PaymentStoreBox,
    pub jackpots: JackpotStoreBox,
    pub vaults: VaultStoreBox,
}

/// Orchestrates the tontine lifecycle over pluggable stores.
///
/// Every operation loads the aggregates it touches, applies the pure domain
/// transition, and stores the results before returning. Serializing
/// concurrent mutations to the same aggregate remains the caller's job.
pub struct TontineEngine {
    stores: Stores,
    clock: Box<dyn Clock>,
}

impl TontineEngine {
    pub fn new(stores: Stores, clock: Box<dyn Clock>) -> Self {
        Self { stores, clock }
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    // --- Vaults -----------------------------------------------------------

    /// Creates an empty vault for the user and returns its id.
    pub async fn open_vault(&self, owner: UserId) -> Result<VaultId> {
        if self.stores.vaults.find_by_owner(owner).await?.is_some() {
            return Err(TontineError::InvariantViolation(format!(
                "user {owner} already has a vault"
            )));
        }
        let vault = Vault::new(owner, self.clock());
        let id = vault.id;
        self.stores.vaults.store(vault).await?;
        Ok(id)
    }

    pub async fn deposit(
        &self,
        vault_id: VaultId,
        amount: Amount,
        description: &str,
    ) -> Result<Money> {
        let mut vault = self.vault(vault_id).await?;
        let balance = vault.deposit(amount, description, self.clock())?;
        self.stores.vaults.store(vault).await?;
        Ok(balance)
    }

    pub async fn withdraw(
        &self,
        vault_id: VaultId,
        amount: Amount,
        description: &str,
    ) -> Result<Money> {
        let mut vault = self.vault(vault_id).await?;
        let balance = vault.withdraw(amount, description, self.clock())?;
        self.stores.vaults.store(vault).await?;
        Ok(balance)
    }

    pub async fn auto_save_tick(&self, vault_id: VaultId) -> Result<Money> {
        let mut vault = self.vault(vault_id).await?;
        let balance = vault.auto_save_tick(self.clock())?;
        self.stores.vaults.store(vault).await?;
        Ok(balance)
    }

    pub async fn set_vault_goal(&self, vault_id: VaultId, goal: SavingsGoal) -> Result<()> {
        let mut vault = self.vault(vault_id).await?;
        vault.set_goal(goal, self.clock())?;
        self.stores.vaults.store(vault).await?;
        Ok(())
    }

    pub async fn record_goal_reached(&self, vault_id: VaultId) -> Result<()> {
        let mut vault = self.vault(vault_id).await?;
        vault.record_goal_reached(self.clock())?;
        self.stores.vaults.store(vault).await?;
        Ok(())
    }

    pub async fn vault_statements(&self) -> Result<Vec<Vault>> {
        self.stores.vaults.get_all().await
    }

    // --- Tontines ---------------------------------------------------------

    /// Validates and persists a tontine configuration.
    pub async fn create_tontine(&self, tontine: Tontine) -> Result<TontineId> {
        tontine.validate()?;
        let id = tontine.id;
        self.stores.tontines.store(tontine).await?;
        Ok(id)
    }

    /// Activates a pending tontine once the quorum is met.
    pub async fn activate_tontine(&self, id: TontineId) -> Result<()> {
        let mut tontine = self.tontine(id).await?;
        let count = self.member_count(id).await?;
        tontine.activate(count, self.clock())?;
        self.stores.tontines.store(tontine).await?;
        Ok(())
    }

    // --- Participations ---------------------------------------------------

    /// Registers a pending membership request. One per (user, tontine).
    pub async fn request_participation(
        &self,
        user: UserId,
        tontine_id: TontineId,
    ) -> Result<ParticipationId> {
        self.tontine(tontine_id).await?;
        let existing = self.stores.participations.list_for_tontine(tontine_id).await?;
        if existing.iter().any(|p| p.user == user) {
            return Err(TontineError::InvariantViolation(format!(
                "user {user} already participates in tontine {tontine_id}"
            )));
        }
        let participation = Participation::new(user, tontine_id, self.clock());
        let id = participation.id;
        self.stores.participations.store(participation).await?;
        Ok(id)
    }

    /// Admin acceptance, capacity-checked against the tontine.
    pub async fn accept_participation(&self, id: ParticipationId) -> Result<()> {
        let mut participation = self.participation(id).await?;
        let tontine = self.tontine(participation.tontine).await?;
        let count = self.member_count(tontine.id).await?;
        if !tontine.can_accept_participant(count) {
            return Err(TontineError::NotEligible(format!(
                "tontine {} cannot accept more participants",
                tontine.id
            )));
        }
        participation.accept(self.clock())?;
        self.stores.participations.store(participation).await?;
        Ok(())
    }

    pub async fn suspend_participation(&self, id: ParticipationId) -> Result<()> {
        let mut participation = self.participation(id).await?;
        participation.suspend(self.clock())?;
        self.stores.participations.store(participation).await?;
        Ok(())
    }

    pub async fn reactivate_participation(&self, id: ParticipationId) -> Result<()> {
        let mut participation = self.participation(id).await?;
        participation.reactivate(self.clock())?;
        self.stores.participations.store(participation).await?;
        Ok(())
    }

    pub async fn exclude_participation(&self, id: ParticipationId) -> Result<()> {
        let mut participation = self.participation(id).await?;
        participation.exclude(self.clock())?;
        self.stores.participations.store(participation).await?;
        Ok(())
    }

    // --- Payments ---------------------------------------------------------

    /// Validates and persists a pending payment.
    pub async fn submit_payment(&self, payment: Payment) -> Result<PaymentId> {
        payment.validate()?;
        self.participation(payment.participation).await?;
        let id = payment.id;
        self.stores.payments.store(payment).await?;
        Ok(id)
    }

    /// Confirms a payment and commits the participation update with it.
    pub async fn confirm_payment(&self, id: PaymentId, reference: &str) -> Result<Payment> {
        let mut payment = self.payment(id).await?;
        let tontine = self.tontine(payment.tontine).await?;
        let mut participation = self.participation(payment.participation).await?;

        payment.confirm(reference, &tontine, &mut participation, self.clock())?;

        self.stores.payments.store(payment.clone()).await?;
        self.stores.participations.store(participation).await?;
        Ok(payment)
    }

    pub async fn fail_payment(&self, id: PaymentId, reason: &str) -> Result<()> {
        let mut payment = self.payment(id).await?;
        payment.fail(reason, self.clock())?;
        self.stores.payments.store(payment).await?;
        Ok(())
    }

    pub async fn cancel_payment(&self, id: PaymentId, reason: &str) -> Result<()> {
        let mut payment = self.payment(id).await?;
        payment.cancel(reason, self.clock())?;
        self.stores.payments.store(payment).await?;
        Ok(())
    }

    // --- Jackpots ---------------------------------------------------------

    /// Validates and persists a scheduled jackpot.
    pub async fn schedule_jackpot(&self, jackpot: Jackpot) -> Result<JackpotId> {
        jackpot.validate()?;
        self.tontine(jackpot.tontine).await?;
        self.participation(jackpot.beneficiary).await?;
        let id = jackpot.id;
        self.stores.jackpots.store(jackpot).await?;
        Ok(id)
    }

    pub async fn activate_jackpot(&self, id: JackpotId) -> Result<()> {
        let mut jackpot = self.jackpot(id).await?;
        jackpot.activate(self.clock())?;
        self.stores.jackpots.store(jackpot).await?;
        Ok(())
    }

    pub async fn postpone_jackpot(
        &self,
        id: JackpotId,
        new_date: NaiveDate,
        reason: &str,
    ) -> Result<()> {
        let mut jackpot = self.jackpot(id).await?;
        jackpot.postpone(new_date, reason, self.clock())?;
        self.stores.jackpots.store(jackpot).await?;
        Ok(())
    }

    pub async fn cancel_jackpot(&self, id: JackpotId, reason: &str) -> Result<()> {
        let mut jackpot = self.jackpot(id).await?;
        jackpot.cancel(reason, self.clock())?;
        self.stores.jackpots.store(jackpot).await?;
        Ok(())
    }

    /// Distributes a jackpot and commits the beneficiary flag with it.
    pub async fn distribute_jackpot(
        &self,
        id: JackpotId,
        method: &str,
        reference: &str,
    ) -> Result<Jackpot> {
        let mut jackpot = self.jackpot(id).await?;
        let mut beneficiary = self.participation(jackpot.beneficiary).await?;

        jackpot.distribute(method, reference, &mut beneficiary, self.clock())?;

        self.stores.jackpots.store(jackpot.clone()).await?;
        self.stores.participations.store(beneficiary).await?;
        Ok(jackpot)
    }

    // --- Loading helpers --------------------------------------------------

    async fn vault(&self, id: VaultId) -> Result<Vault> {
        self.stores
            .vaults
            .get(id)
            .await?
            .ok_or_else(|| TontineError::NotFound(format!("vault {id}")))
    }

    async fn tontine(&self, id: TontineId) -> Result<Tontine> {
        self.stores
            .tontines
            .get(id)
            .await?
            .ok_or_else(|| TontineError::NotFound(format!("tontine {id}")))
    }

    async fn participation(&self, id: ParticipationId) -> Result<Participation> {
        self.stores
            .participations
            .get(id)
            .await?
            .ok_or_else(|| TontineError::NotFound(format!("participation {id}")))
    }

    async fn payment(&self, id: PaymentId) -> Result<Payment> {
        self.stores
            .payments
            .get(id)
            .await?
            .ok_or_else(|| TontineError::NotFound(format!("payment {id}")))
    }

    async fn jackpot(&self, id: JackpotId) -> Result<Jackpot> {
        self.stores
            .jackpots
            .get(id)
            .await?
            .ok_or_else(|| TontineError::NotFound(format!("jackpot {id}")))
    }

    /// Members counted against capacity and quorum: everyone not excluded.
    async fn member_count(&self, tontine: TontineId) -> Result<u32> {
        let members = self.stores.participations.list_for_tontine(tontine).await?;
        Ok(members
            .iter()
            .filter(|p| p.status != ParticipationStatus::Excluded)
            .count() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clock::FixedClock;
    use crate::domain::payment::{PaymentKind, PaymentMethod};
    use crate::domain::tontine::{DrawKind, TontineKind};
    use crate::infrastructure::in_memory::{
        InMemoryJackpotStore, InMemoryParticipationStore, InMemoryPaymentStore,
        InMemoryTontineStore, InMemoryVaultStore,
    };
    use rust_decimal_macros::dec;

    fn engine_at(date: NaiveDate) -> TontineEngine {
        TontineEngine::new(
            Stores {
                tontines: Box::new(InMemoryTontineStore::new()),
                participations: Box::new(InMemoryParticipationStore::new()),
                payments: Box::new(InMemoryPaymentStore::new()),
                jackpots: Box::new(InMemoryJackpotStore::new()),
                vaults: Box::new(InMemoryVaultStore::new()),
            },
            Box::new(FixedClock::at(date)),
        )
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn classic_tontine(engine: &TontineEngine) -> TontineId {
        let mut tontine = Tontine::new(
            UserId::new(),
            "engine circle",
            TontineKind::Classic,
            DrawKind::Random,
            2,
            10,
            engine.clock(),
        );
        tontine.contribution_amount = Some(Money::new(dec!(10000)));
        tontine.contribution_frequency_days = Some(30);
        tontine.late_penalty_per_day = Some(Money::new(dec!(500)));
        engine.create_tontine(tontine).await.unwrap()
    }

    #[tokio::test]
    async fn test_vault_roundtrip() {
        let engine = engine_at(date(2025, 1, 10));
        let vault_id = engine.open_vault(UserId::new()).await.unwrap();

        engine
            .deposit(vault_id, Amount::new(dec!(5000)).unwrap(), "initial")
            .await
            .unwrap();
        let balance = engine
            .withdraw(vault_id, Amount::new(dec!(1500)).unwrap(), "rent")
            .await
            .unwrap();
        assert_eq!(balance, Money::new(dec!(3500)));

        let err = engine
            .withdraw(vault_id, Amount::new(dec!(7000)).unwrap(), "too much")
            .await;
        assert!(matches!(err, Err(TontineError::IllegalTransition(_))));

        let statements = engine.vault_statements().await.unwrap();
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].balance, Money::new(dec!(3500)));
        assert_eq!(statements[0].transactions.len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_vault_rejected() {
        let engine = engine_at(date(2025, 1, 10));
        let owner = UserId::new();
        engine.open_vault(owner).await.unwrap();
        assert!(matches!(
            engine.open_vault(owner).await,
            Err(TontineError::InvariantViolation(_))
        ));
    }

    #[tokio::test]
    async fn test_membership_flow_and_quorum() {
        let engine = engine_at(date(2025, 1, 1));
        let tontine_id = classic_tontine(&engine).await;

        let p1 = engine
            .request_participation(UserId::new(), tontine_id)
            .await
            .unwrap();
        // Tontine still pending, cannot accept members yet.
        assert!(matches!(
            engine.accept_participation(p1).await,
            Err(TontineError::NotEligible(_))
        ));

        // One member is below the quorum of 2.
        assert!(matches!(
            engine.activate_tontine(tontine_id).await,
            Err(TontineError::NotEligible(_))
        ));

        engine
            .request_participation(UserId::new(), tontine_id)
            .await
            .unwrap();
        engine.activate_tontine(tontine_id).await.unwrap();
        engine.accept_participation(p1).await.unwrap();
    }

    #[tokio::test]
    async fn test_duplicate_membership_rejected() {
        let engine = engine_at(date(2025, 1, 1));
        let tontine_id = classic_tontine(&engine).await;
        let user = UserId::new();
        engine.request_participation(user, tontine_id).await.unwrap();
        assert!(matches!(
            engine.request_participation(user, tontine_id).await,
            Err(TontineError::InvariantViolation(_))
        ));
    }

    #[tokio::test]
    async fn test_confirm_payment_commits_participation_update() {
        let engine = engine_at(date(2025, 1, 10));
        let tontine_id = classic_tontine(&engine).await;
        let user = UserId::new();
        let p_id = engine.request_participation(user, tontine_id).await.unwrap();
        engine
            .request_participation(UserId::new(), tontine_id)
            .await
            .unwrap();
        engine.activate_tontine(tontine_id).await.unwrap();
        engine.accept_participation(p_id).await.unwrap();

        let mut payment = Payment::new(
            p_id,
            tontine_id,
            Amount::new(dec!(10000)).unwrap(),
            PaymentMethod::MobileMoney,
            PaymentKind::Contribution,
            engine.clock(),
        );
        payment.cycle = Some(1);
        payment.due_date = Some(date(2025, 1, 1));
        let payment_id = engine.submit_payment(payment).await.unwrap();

        let confirmed = engine.confirm_payment(payment_id, "TX-77").await.unwrap();
        assert_eq!(confirmed.days_late, 9);
        assert_eq!(confirmed.penalty, Money::new(dec!(3000)));

        let stored = engine.participation(p_id).await.unwrap();
        assert_eq!(stored.payments_made, 1);
        assert_eq!(stored.total_penalties, Money::new(dec!(3000)));

        // Second confirmation is rejected and totals stay put.
        assert!(engine.confirm_payment(payment_id, "TX-78").await.is_err());
        let stored = engine.participation(p_id).await.unwrap();
        assert_eq!(stored.payments_made, 1);
    }

    #[tokio::test]
    async fn test_submit_contribution_without_cycle_rejected() {
        let engine = engine_at(date(2025, 1, 10));
        let tontine_id = classic_tontine(&engine).await;
        let p_id = engine
            .request_participation(UserId::new(), tontine_id)
            .await
            .unwrap();

        let payment = Payment::new(
            p_id,
            tontine_id,
            Amount::new(dec!(10000)).unwrap(),
            PaymentMethod::MobileMoney,
            PaymentKind::Contribution,
            engine.clock(),
        );
        assert!(matches!(
            engine.submit_payment(payment).await,
            Err(TontineError::InvariantViolation(_))
        ));
    }

    #[tokio::test]
    async fn test_jackpot_distribution_flow() {
        let engine = engine_at(date(2025, 3, 1));
        let tontine_id = classic_tontine(&engine).await;
        let p_id = engine
            .request_participation(UserId::new(), tontine_id)
            .await
            .unwrap();
        engine
            .request_participation(UserId::new(), tontine_id)
            .await
            .unwrap();
        engine.activate_tontine(tontine_id).await.unwrap();
        engine.accept_participation(p_id).await.unwrap();

        let mut jackpot = Jackpot::new(
            tontine_id,
            p_id,
            1,
            Money::new(dec!(100000)),
            date(2025, 3, 1),
            engine.clock(),
        );
        jackpot.management_fee = Money::new(dec!(2000));
        jackpot.deducted_penalties = Money::new(dec!(3000));
        let jackpot_id = engine.schedule_jackpot(jackpot).await.unwrap();

        engine.activate_jackpot(jackpot_id).await.unwrap();
        let distributed = engine
            .distribute_jackpot(jackpot_id, "MOBILE_MONEY", "JP-1")
            .await
            .unwrap();
        assert_eq!(distributed.net, Some(Money::new(dec!(95000))));

        let beneficiary = engine.participation(p_id).await.unwrap();
        assert!(beneficiary.has_received_jackpot);

        // A second jackpot to the same beneficiary is not eligible.
        let jackpot2 = Jackpot::new(
            tontine_id,
            p_id,
            2,
            Money::new(dec!(100000)),
            date(2025, 4, 1),
            engine.clock(),
        );
        let jackpot2_id = engine.schedule_jackpot(jackpot2).await.unwrap();
        engine.activate_jackpot(jackpot2_id).await.unwrap();
        assert!(matches!(
            engine.distribute_jackpot(jackpot2_id, "CASH", "JP-2").await,
            Err(TontineError::NotEligible(_))
        ));
    }

    #[tokio::test]
    async fn test_overfee_jackpot_rejected_at_scheduling() {
        let engine = engine_at(date(2025, 3, 1));
        let tontine_id = classic_tontine(&engine).await;
        let p_id = engine
            .request_participation(UserId::new(), tontine_id)
            .await
            .unwrap();

        let mut jackpot = Jackpot::new(
            tontine_id,
            p_id,
            1,
            Money::new(dec!(1000)),
            date(2025, 3, 1),
            engine.clock(),
        );
        jackpot.management_fee = Money::new(dec!(600));
        jackpot.deducted_penalties = Money::new(dec!(600));
        assert!(matches!(
            engine.schedule_jackpot(jackpot).await,
            Err(TontineError::InvariantViolation(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_ids_surface_not_found() {
        let engine = engine_at(date(2025, 1, 1));
        assert!(matches!(
            engine.confirm_payment(PaymentId::new(), "TX").await,
            Err(TontineError::NotFound(_))
        ));
        assert!(matches!(
            engine.activate_jackpot(JackpotId::new()).await,
            Err(TontineError::NotFound(_))
        ));
        assert!(matches!(
            engine
                .deposit(VaultId::new(), Amount::new(dec!(1)).unwrap(), "x")
                .await,
            Err(TontineError::NotFound(_))
        ));
    }
}
