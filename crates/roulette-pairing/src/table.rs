//! Pairing table: the symmetric relation of matched users.

use std::collections::HashMap;
use std::sync::Arc;

use roulette_common::UserId;
use tokio::sync::RwLock;

use crate::error::TableError;

/// Thread-safe bidirectional partner map.
///
/// Both directions of a pair live in one map under one lock, so a pair is
/// created and destroyed as a unit. No reader can observe one side freed
/// while the other is still paired.
#[derive(Debug, Clone, Default)]
pub struct PairingTable {
    partners: Arc<RwLock<HashMap<UserId, UserId>>>,
}

impl PairingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn has_partner(&self, id: &UserId) -> bool {
        self.partners.read().await.contains_key(id)
    }

    /// Pair `a` with `b`.
    ///
    /// Both sides are checked before anything is written; on failure the
    /// table is untouched.
    pub async fn create_pair(&self, a: UserId, b: UserId) -> Result<(), TableError> {
        if a == b {
            return Err(TableError::SelfPairing);
        }

        let mut map = self.partners.write().await;
        if map.contains_key(&a) {
            return Err(TableError::AlreadyPaired(a));
        }
        if map.contains_key(&b) {
            return Err(TableError::AlreadyPaired(b));
        }

        map.insert(a.clone(), b.clone());
        map.insert(b, a);
        Ok(())
    }

    pub async fn get_partner(&self, id: &UserId) -> Result<UserId, TableError> {
        self.partners
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or(TableError::NoPartner)
    }

    /// Dissolve the pair containing `id` and return the former partner.
    pub async fn remove_pair(&self, id: &UserId) -> Result<UserId, TableError> {
        let mut map = self.partners.write().await;
        let partner = map.remove(id).ok_or(TableError::NoPartner)?;
        let back = map.remove(&partner);
        debug_assert_eq!(back.as_ref(), Some(id), "asymmetric pair for {id}");
        Ok(partner)
    }

    pub async fn pair_count(&self) -> usize {
        self.partners.read().await.len() / 2
    }
}
