//! Waiting pool: users looking for a partner.

use std::collections::HashMap;
use std::sync::Arc;

use rand::Rng;
use roulette_common::UserId;
use tokio::sync::Mutex;

use crate::error::PoolError;

/// Dense member list plus a position index, so membership tests and
/// removals are O(1) and a random member can be picked in O(1).
#[derive(Debug, Default)]
struct PoolState {
    members: Vec<UserId>,
    index: HashMap<UserId, usize>,
}

impl PoolState {
    fn insert(&mut self, id: UserId) -> Result<(), PoolError> {
        if self.index.contains_key(&id) {
            return Err(PoolError::AlreadyWaiting);
        }
        self.index.insert(id.clone(), self.members.len());
        self.members.push(id);
        Ok(())
    }

    /// Remove the member at `pos`, moving the last member into its slot.
    fn take(&mut self, pos: usize) -> UserId {
        let id = self.members.swap_remove(pos);
        self.index.remove(&id);
        if let Some(moved) = self.members.get(pos) {
            self.index.insert(moved.clone(), pos);
        }
        id
    }

    fn take_random(&mut self) -> Option<UserId> {
        if self.members.is_empty() {
            return None;
        }
        let pos = rand::thread_rng().gen_range(0..self.members.len());
        Some(self.take(pos))
    }
}

/// Thread-safe set of waiting users.
///
/// Every operation runs under one lock. [`pick_any`](Self::pick_any)
/// returns an arbitrary member; callers must not assume FIFO or any other
/// fairness order.
#[derive(Debug, Clone, Default)]
pub struct WaitingPool {
    state: Arc<Mutex<PoolState>>,
}

impl WaitingPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `id` is currently waiting.
    pub async fn has(&self, id: &UserId) -> bool {
        self.state.lock().await.index.contains_key(id)
    }

    /// Insert `id`. Fails with [`PoolError::AlreadyWaiting`] if present.
    pub async fn add(&self, id: UserId) -> Result<(), PoolError> {
        self.state.lock().await.insert(id)
    }

    /// Delete `id`. Fails with [`PoolError::NotWaiting`] if absent.
    pub async fn remove(&self, id: &UserId) -> Result<(), PoolError> {
        let mut state = self.state.lock().await;
        let pos = *state.index.get(id).ok_or(PoolError::NotWaiting)?;
        state.take(pos);
        Ok(())
    }

    /// Remove and return an arbitrary waiting member.
    pub async fn pick_any(&self) -> Result<UserId, PoolError> {
        self.state
            .lock()
            .await
            .take_random()
            .ok_or(PoolError::PoolEmpty)
    }

    /// Pick a waiting member, or enqueue `id` if nobody is waiting.
    ///
    /// Both branches happen under the same lock, so two concurrent callers
    /// on an empty pool cannot both end up waiting. Returns the picked
    /// member, or `None` if `id` was enqueued.
    pub async fn pick_or_add(&self, id: UserId) -> Result<Option<UserId>, PoolError> {
        let mut state = self.state.lock().await;
        if state.index.contains_key(&id) {
            return Err(PoolError::AlreadyWaiting);
        }
        match state.take_random() {
            Some(picked) => Ok(Some(picked)),
            None => state.insert(id).map(|()| None),
        }
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.members.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.members.is_empty()
    }
}
