//! Thread-safe in-memory stores.
//!
//! Each store is an `Arc<RwLock<HashMap>>` keyed by aggregate id, cheap to
//! clone and share. Soft-deleted rows stay in the map but are filtered out of
//! every query.

use crate::domain::jackpot::Jackpot;
use crate::domain::meta::{JackpotId, ParticipationId, PaymentId, TontineId, UserId, VaultId};
use crate::domain::participation::Participation;
use crate::domain::payment::Payment;
use crate::domain::ports::{
    JackpotStore, ParticipationStore, PaymentStore, TontineStore, VaultStore,
};
use crate::domain::tontine::Tontine;
use crate::domain::vault::Vault;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default, Clone)]
pub struct InMemoryTontineStore {
    tontines: Arc<RwLock<HashMap<TontineId, Tontine>>>,
}

impl InMemoryTontineStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TontineStore for InMemoryTontineStore {
    async fn store(&self, tontine: Tontine) -> Result<()> {
        self.tontines.write().await.insert(tontine.id, tontine);
        Ok(())
    }

    async fn get(&self, id: TontineId) -> Result<Option<Tontine>> {
        let tontines = self.tontines.read().await;
        Ok(tontines.get(&id).filter(|t| t.meta.is_live()).cloned())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryParticipationStore {
    participations: Arc<RwLock<HashMap<ParticipationId, Participation>>>,
}

impl InMemoryParticipationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ParticipationStore for InMemoryParticipationStore {
    async fn store(&self, participation: Participation) -> Result<()> {
        self.participations
            .write()
            .await
            .insert(participation.id, participation);
        Ok(())
    }

    async fn get(&self, id: ParticipationId) -> Result<Option<Participation>> {
        let participations = self.participations.read().await;
        Ok(participations
            .get(&id)
            .filter(|p| p.meta.is_live())
            .cloned())
    }

    async fn list_for_tontine(&self, tontine: TontineId) -> Result<Vec<Participation>> {
        let participations = self.participations.read().await;
        Ok(participations
            .values()
            .filter(|p| p.tontine == tontine && p.meta.is_live())
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryPaymentStore {
    payments: Arc<RwLock<HashMap<PaymentId, Payment>>>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn store(&self, payment: Payment) -> Result<()> {
        self.payments.write().await.insert(payment.id, payment);
        Ok(())
    }

    async fn get(&self, id: PaymentId) -> Result<Option<Payment>> {
        let payments = self.payments.read().await;
        Ok(payments.get(&id).filter(|p| p.meta.is_live()).cloned())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryJackpotStore {
    jackpots: Arc<RwLock<HashMap<JackpotId, Jackpot>>>,
}

impl InMemoryJackpotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JackpotStore for InMemoryJackpotStore {
    async fn store(&self, jackpot: Jackpot) -> Result<()> {
        self.jackpots.write().await.insert(jackpot.id, jackpot);
        Ok(())
    }

    async fn get(&self, id: JackpotId) -> Result<Option<Jackpot>> {
        let jackpots = self.jackpots.read().await;
        Ok(jackpots.get(&id).filter(|j| j.meta.is_live()).cloned())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryVaultStore {
    vaults: Arc<RwLock<HashMap<VaultId, Vault>>>,
}

impl InMemoryVaultStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VaultStore for InMemoryVaultStore {
    async fn store(&self, vault: Vault) -> Result<()> {
        self.vaults.write().await.insert(vault.id, vault);
        Ok(())
    }

    async fn get(&self, id: VaultId) -> Result<Option<Vault>> {
        let vaults = self.vaults.read().await;
        Ok(vaults.get(&id).filter(|v| v.meta.is_live()).cloned())
    }

    async fn find_by_owner(&self, owner: UserId) -> Result<Option<Vault>> {
        let vaults = self.vaults.read().await;
        Ok(vaults
            .values()
            .find(|v| v.owner == owner && v.meta.is_live())
            .cloned())
    }

    async fn get_all(&self) -> Result<Vec<Vault>> {
        let vaults = self.vaults.read().await;
        Ok(vaults.values().filter(|v| v.meta.is_live()).cloned().collect())
    }
}
