//! Pairing protocol: moves users between idle, waiting and paired.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use roulette_common::{Notice, NoticeKind, UserId};
use tracing::{debug, error, info, warn};

use crate::error::{PairingError, PoolError};
use crate::pool::WaitingPool;
use crate::sink::NoticeSink;
use crate::table::PairingTable;


/// Where a user currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserState {
    Idle,
    Waiting,
    Paired,
}

/// Successful result of [`Orchestrator::request_pairing`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Nobody was waiting; the user now waits.
    Queued,
    /// Matched with the contained partner.
    Paired(UserId),
}

/// Successful result of [`Orchestrator::stop`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    /// The chat with the contained partner was ended.
    Ended(UserId),
    /// The user left the waiting pool.
    Cancelled,
    /// The user was neither waiting nor paired.
    NotActive,
}

/// Snapshot of pool and table sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PairingStats {
    pub waiting: usize,
    pub pairs: usize,
}

/// Sequences [`WaitingPool`] and [`PairingTable`] operations into the
/// user-facing pairing actions.
pub struct Orchestrator<S> {
    pool: WaitingPool,
    table: PairingTable,
    sink: Arc<S>,
    /// Users with a `request_pairing` call in progress.
    requesting: Arc<Mutex<HashSet<UserId>>>,
}

/// Marks a user as mid-request until dropped, panics included.
struct RequestGuard<'a> {
    requesting: &'a Mutex<HashSet<UserId>>,
    user: UserId,
}

impl<'a> RequestGuard<'a> {
    /// `None` if `user` already has a request in progress.
    fn acquire(requesting: &'a Mutex<HashSet<UserId>>, user: &UserId) -> Option<Self> {
        let mut set = requesting.lock().unwrap_or_else(PoisonError::into_inner);
        if !set.insert(user.clone()) {
            return None;
        }
        Some(Self {
            requesting,
            user: user.clone(),
        })
    }
}

impl Drop for RequestGuard<'_> {
    fn drop(&mut self) {
        self.requesting
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.user);
    }
}

impl<S> Clone for Orchestrator<S> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            table: self.table.clone(),
            sink: Arc::clone(&self.sink),
            requesting: Arc::clone(&self.requesting),
        }
    }
}

impl<S: NoticeSink> Orchestrator<S> {
    pub fn new(sink: Arc<S>) -> Self {
        Self::with_parts(WaitingPool::new(), PairingTable::new(), sink)
    }

    pub fn with_parts(pool: WaitingPool, table: PairingTable, sink: Arc<S>) -> Self {
        Self {
            pool,
            table,
            sink,
            requesting: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn pool(&self) -> &WaitingPool {
        &self.pool
    }

    pub fn table(&self) -> &PairingTable {
        &self.table
    }

    pub async fn state_of(&self, user: &UserId) -> UserState {
        if self.table.has_partner(user).await {
            UserState::Paired
        } else if self.pool.has(user).await {
            UserState::Waiting
        } else {
            UserState::Idle
        }
    }

    pub async fn stats(&self) -> PairingStats {
        PairingStats {
            waiting: self.pool.len().await,
            pairs: self.table.pair_count().await,
        }
    }

    /// Match `user` with a waiting partner, or put them in the pool.
    ///
    /// Requests from the same user are serialized: a second one arriving
    /// while the first is in progress is rejected like a request from a
    /// waiting user.
    pub async fn request_pairing(&self, user: &UserId) -> Result<RequestOutcome, PairingError> {
        let Some(_guard) = RequestGuard::acquire(&self.requesting, user) else {
            debug!(user_id = %user, "pairing request already in progress");
            self.notify(user, NoticeKind::AlreadyInQueue).await;
            return Err(PairingError::AlreadyActive);
        };

        if self.reject_if_active(user).await {
            return Err(PairingError::AlreadyActive);
        }

        debug!(user_id = %user, "trying to queue chat");

        let candidate = match self.pool.pick_or_add(user.clone()).await {
            Ok(candidate) => candidate,
            Err(PoolError::AlreadyWaiting) => {
                self.notify(user, NoticeKind::AlreadyInQueue).await;
                return Err(PairingError::AlreadyActive);
            }
            Err(e) => return Err(e.into()),
        };

        match candidate {
            Some(partner) => self.establish(user, partner).await.map(RequestOutcome::Paired),
            None => {
                info!(user_id = %user, "user queued");
                // Another user may have picked us already; they sent PartnerFound.
                if !self.table.has_partner(user).await {
                    self.notify(user, NoticeKind::QueuedConfirmation).await;
                }
                Ok(RequestOutcome::Queued)
            }
        }
    }

    /// Take a waiting user out of the pool.
    pub async fn cancel_pairing(&self, user: &UserId) -> Result<(), PairingError> {
        self.pool.remove(user).await?;

        info!(user_id = %user, "user removed from queue");
        self.notify(user, NoticeKind::RemovedFromQueueConfirmation).await;
        Ok(())
    }

    /// End the chat `user` is in and return the former partner.
    pub async fn end_pairing(&self, user: &UserId) -> Result<UserId, PairingError> {
        let partner = self.table.remove_pair(user).await?;

        info!(user_id = %user, partner_id = %partner, "chat stopped");
        self.notify(user, NoticeKind::SessionEndedBySelf).await;
        self.notify(&partner, NoticeKind::SessionEndedByPartner).await;
        Ok(partner)
    }

    /// Forward `content` unchanged to the partner of `user`.
    ///
    /// Unpaired senders get a notice matching their state instead.
    pub async fn relay_message(&self, user: &UserId, content: String) -> Result<UserId, PairingError> {
        match self.table.get_partner(user).await {
            Ok(partner) => {
                debug!(user_id = %user, partner_id = %partner, "message relayed");
                self.notify(&partner, NoticeKind::RelayedContent(content)).await;
                Ok(partner)
            }
            Err(e) => {
                let kind = if self.pool.has(user).await {
                    NoticeKind::InQueueNotice
                } else {
                    NoticeKind::NotInChatNotice
                };
                self.notify(user, kind).await;
                Err(e.into())
            }
        }
    }

    /// Leave whatever `user` is doing: end the chat, leave the pool, or
    /// tell them there is nothing to stop.
    pub async fn stop(&self, user: &UserId) -> Result<StopOutcome, PairingError> {
        match self.state_of(user).await {
            UserState::Paired => self.end_pairing(user).await.map(StopOutcome::Ended),
            UserState::Waiting => self
                .cancel_pairing(user)
                .await
                .map(|()| StopOutcome::Cancelled),
            UserState::Idle => {
                self.notify(user, NoticeKind::NotInChatNotice).await;
                Ok(StopOutcome::NotActive)
            }
        }
    }

    /// Drop every trace of a user whose connection is gone.
    ///
    /// A partner is told the chat ended; the departed user gets nothing.
    pub async fn disconnect(&self, user: &UserId) {
        if let Ok(partner) = self.table.remove_pair(user).await {
            info!(user_id = %user, partner_id = %partner, "chat stopped by disconnect");
            self.notify(&partner, NoticeKind::SessionEndedByPartner).await;
        }
        if self.pool.remove(user).await.is_ok() {
            info!(user_id = %user, "user removed from queue by disconnect");
        }
    }

    /// Notify and return `true` if `user` is already waiting or paired.
    async fn reject_if_active(&self, user: &UserId) -> bool {
        let kind = match self.state_of(user).await {
            UserState::Idle => return false,
            UserState::Paired => NoticeKind::AlreadyInChat,
            UserState::Waiting => NoticeKind::AlreadyInQueue,
        };
        self.notify(user, kind).await;
        true
    }

    /// Turn a picked candidate into a pair, compensating on failure.
    async fn establish(&self, user: &UserId, candidate: UserId) -> Result<UserId, PairingError> {
        match self.table.create_pair(user.clone(), candidate.clone()).await {
            Ok(()) => {
                info!(user_id = %user, partner_id = %candidate, "chat established");
                self.notify(user, NoticeKind::PartnerFound).await;
                self.notify(&candidate, NoticeKind::PartnerFound).await;
                Ok(candidate)
            }
            Err(source) => {
                warn!(
                    user_id = %user,
                    partner_id = %candidate,
                    error = %source,
                    "picked candidate could not be paired"
                );
                self.requeue(&candidate).await;
                self.notify(user, NoticeKind::UnknownError).await;
                Err(PairingError::PairingConflict {
                    user: user.clone(),
                    candidate,
                    source,
                })
            }
        }
    }

    /// Put a picked candidate back, unless it is paired elsewhere (a stale
    /// pool entry), which would break pool/table disjointness.
    async fn requeue(&self, candidate: &UserId) {
        if self.table.has_partner(candidate).await {
            warn!(partner_id = %candidate, "dropping stale pool entry that is already paired");
            return;
        }
        match self.pool.add(candidate.clone()).await {
            Ok(()) => debug!(partner_id = %candidate, "candidate re-queued"),
            Err(e) => error!(partner_id = %candidate, error = %e, "cant re-queue candidate"),
        }
    }

    /// Send a notice that is not tied to a state change.
    pub async fn notify(&self, recipient: &UserId, kind: NoticeKind) {
        self.sink.deliver(Notice::new(recipient.clone(), kind)).await;
    }
}
