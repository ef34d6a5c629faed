//! Connected users and their outbound channels.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use roulette_common::{Notice, NoticeKind, UserId};
use roulette_pairing::NoticeSink;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, RwLock};

use crate::protocol::ServerFrame;
use crate::text::MessageTexts;

/// Maps user ids to the channel feeding their WebSocket writer, and
/// delivers notices as [`ServerFrame`]s.
#[derive(Clone)]
pub struct ConnectionRegistry {
    senders: Arc<RwLock<HashMap<UserId, mpsc::Sender<String>>>>,
    texts: Arc<MessageTexts>,
}

impl ConnectionRegistry {
    pub fn new(texts: MessageTexts) -> Self {
        Self {
            senders: Arc::new(RwLock::new(HashMap::new())),
            texts: Arc::new(texts),
        }
    }

    pub async fn register(&self, user: UserId, tx: mpsc::Sender<String>) {
        self.senders.write().await.insert(user, tx);
    }

    pub async fn unregister(&self, user: &UserId) {
        self.senders.write().await.remove(user);
    }

    /// Number of open connections.
    pub async fn count(&self) -> usize {
        self.senders.read().await.len()
    }

    fn frame_for(&self, kind: &NoticeKind) -> ServerFrame {
        match kind {
            NoticeKind::RelayedContent(text) => ServerFrame::Relayed { text: text.clone() },
            other => ServerFrame::Notice {
                kind: other.name(),
                text: self.texts.render(other),
            },
        }
    }
}

/// Never waits on the recipient: a client that stops reading loses
/// frames once its buffer is full instead of stalling the sender.
#[async_trait]
impl NoticeSink for ConnectionRegistry {
    async fn deliver(&self, notice: Notice) {
        let tx = self.senders.read().await.get(&notice.recipient).cloned();
        let Some(tx) = tx else {
            tracing::debug!(user_id = %notice.recipient, kind = notice.kind.name(), "Recipient not connected");
            return;
        };

        let json = self.frame_for(&notice.kind).to_json();
        match tx.try_send(json) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::warn!(user_id = %notice.recipient, kind = notice.kind.name(), "Outbound buffer full, frame dropped");
            }
            Err(TrySendError::Closed(_)) => {
                tracing::error!(user_id = %notice.recipient, kind = notice.kind.name(), "cant send message");
            }
        }
    }
}
