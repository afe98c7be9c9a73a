use crate::domain::clock::Clock;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_type!(
    /// Opaque reference to a user in the external identity provider.
    UserId
);
id_type!(TontineId);
id_type!(ParticipationId);
id_type!(PaymentId);
id_type!(JackpotId);
id_type!(VaultId);

/// Common bookkeeping embedded in every aggregate: creation/update timestamps
/// and the logical-deletion flag. Stores must filter deleted rows out of every
/// query; nothing is ever hard-deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMeta {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted: bool,
}

impl EntityMeta {
    pub fn new(clock: &dyn Clock) -> Self {
        let now = clock.now();
        Self {
            created_at: now,
            updated_at: now,
            deleted: false,
        }
    }

    pub fn touch(&mut self, clock: &dyn Clock) {
        self.updated_at = clock.now();
    }

    pub fn mark_deleted(&mut self, clock: &dyn Clock) {
        self.deleted = true;
        self.touch(clock);
    }

    pub fn is_live(&self) -> bool {
        !self.deleted
    }
}
