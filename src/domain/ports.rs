use crate::domain::jackpot::Jackpot;
use crate::domain::meta::{JackpotId, ParticipationId, PaymentId, TontineId, UserId, VaultId};
use crate::domain::participation::Participation;
use crate::domain::payment::Payment;
use crate::domain::tontine::Tontine;
use crate::domain::vault::Vault;
use crate::error::Result;
use async_trait::async_trait;

/// Persistence ports for the aggregates.
///
/// Deletion is logical everywhere: implementations must filter soft-deleted
/// rows out of every query.

#[async_trait]
pub trait TontineStore: Send + Sync {
    async fn store(&self, tontine: Tontine) -> Result<()>;
    async fn get(&self, id: TontineId) -> Result<Option<Tontine>>;
}

#[async_trait]
pub trait ParticipationStore: Send + Sync {
    async fn store(&self, participation: Participation) -> Result<()>;
    async fn get(&self, id: ParticipationId) -> Result<Option<Participation>>;
    async fn list_for_tontine(&self, tontine: TontineId) -> Result<Vec<Participation>>;
}

#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn store(&self, payment: Payment) -> Result<()>;
    async fn get(&self, id: PaymentId) -> Result<Option<Payment>>;
}

#[async_trait]
pub trait JackpotStore: Send + Sync {
    async fn store(&self, jackpot: Jackpot) -> Result<()>;
    async fn get(&self, id: JackpotId) -> Result<Option<Jackpot>>;
}

#[async_trait]
pub trait VaultStore: Send + Sync {
    async fn store(&self, vault: Vault) -> Result<()>;
    async fn get(&self, id: VaultId) -> Result<Option<Vault>>;
    async fn find_by_owner(&self, owner: UserId) -> Result<Option<Vault>>;
    async fn get_all(&self) -> Result<Vec<Vault>>;
}

pub type TontineStoreBox = Box<dyn TontineStore>;
pub type ParticipationStoreBox = Box<dyn ParticipationStore>;
pub type PaymentStoreBox = Box<dyn PaymentStore>;
pub type JackpotStoreBox = Box<dyn JackpotStore>;
pub type VaultStoreBox = Box<dyn VaultStore>;
