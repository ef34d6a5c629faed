//! Per-event task spawning with fault isolation.
//!
//! Every inbound event runs in its own task. A panic inside one event is
//! caught at the task boundary and logged; other events and the connection
//! that produced it keep going. A semaphore bounds how many event tasks
//! run at once.

use std::sync::Arc;

use roulette_common::{new_correlation_id, NoticeKind, UserId};
use roulette_pairing::{NoticeSink, Orchestrator, PairingError, PoolError, TableError};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::commands::{Command, InboundEvent};

pub struct Dispatcher<S> {
    orchestrator: Orchestrator<S>,
    permits: Arc<Semaphore>,
}

impl<S> Clone for Dispatcher<S> {
    fn clone(&self) -> Self {
        Self {
            orchestrator: self.orchestrator.clone(),
            permits: Arc::clone(&self.permits),
        }
    }
}

impl<S: NoticeSink + 'static> Dispatcher<S> {
    pub fn new(orchestrator: Orchestrator<S>, max_inflight: usize) -> Self {
        Self {
            orchestrator,
            permits: Arc::new(Semaphore::new(max_inflight)),
        }
    }

    pub fn orchestrator(&self) -> &Orchestrator<S> {
        &self.orchestrator
    }

    /// Spawn the handling of one event.
    ///
    /// Returns at once. The spawned task waits for a free slot when the
    /// in-flight limit is reached. The returned handle never yields a
    /// panic; awaiting it is optional.
    pub fn dispatch(&self, user: UserId, event: InboundEvent) -> JoinHandle<()> {
        let permits = Arc::clone(&self.permits);
        let orchestrator = self.orchestrator.clone();
        let event_id = new_correlation_id();

        tokio::spawn(async move {
            let _permit = permits.acquire_owned().await.ok();
            let worker = tokio::spawn(handle_event(
                orchestrator,
                user.clone(),
                event,
                event_id.clone(),
            ));

            if let Err(e) = worker.await {
                if e.is_panic() {
                    error!(event_id = %event_id, user_id = %user, error = %e, "panic during event handling");
                } else {
                    warn!(event_id = %event_id, user_id = %user, "event task cancelled");
                }
            }
        })
    }
}

async fn handle_event<S: NoticeSink>(
    orchestrator: Orchestrator<S>,
    user: UserId,
    event: InboundEvent,
    event_id: String,
) {
    debug!(event_id = %event_id, user_id = %user, event = event.label(), "handling event");

    match event {
        InboundEvent::Command(Command::Help) => {
            orchestrator.notify(&user, NoticeKind::Help).await;
        }
        InboundEvent::Command(Command::NewChat) => {
            match orchestrator.request_pairing(&user).await {
                Ok(outcome) => debug!(event_id = %event_id, user_id = %user, outcome = ?outcome, "pairing requested"),
                Err(PairingError::AlreadyActive) => {
                    debug!(event_id = %event_id, user_id = %user, "duplicate pairing request");
                }
                Err(e @ PairingError::PairingConflict { .. }) => {
                    warn!(event_id = %event_id, user_id = %user, error = %e, "pairing request unsatisfied");
                }
                Err(e) => {
                    error!(event_id = %event_id, user_id = %user, error = %e, "cant queue chat");
                    orchestrator.notify(&user, NoticeKind::UnknownError).await;
                }
            }
        }
        InboundEvent::Command(Command::StopChat) => match orchestrator.stop(&user).await {
            Ok(outcome) => debug!(event_id = %event_id, user_id = %user, outcome = ?outcome, "stop handled"),
            // The partner or a concurrent event got there first.
            Err(PairingError::Table(TableError::NoPartner))
            | Err(PairingError::Pool(PoolError::NotWaiting)) => {
                debug!(event_id = %event_id, user_id = %user, "nothing left to stop");
            }
            Err(e) => error!(event_id = %event_id, user_id = %user, error = %e, "cant stop chat"),
        },
        InboundEvent::Command(Command::Unknown(name)) => {
            orchestrator
                .notify(&user, NoticeKind::UnknownCommand(name))
                .await;
        }
        InboundEvent::Text(text) => {
            if let Err(e) = orchestrator.relay_message(&user, text).await {
                debug!(event_id = %event_id, user_id = %user, error = %e, "message not relayed");
            }
        }
        InboundEvent::Edit => {
            orchestrator.notify(&user, NoticeKind::EditNotSupported).await;
        }
        InboundEvent::Delete => {
            orchestrator
                .notify(&user, NoticeKind::DeleteNotSupported)
                .await;
        }
        InboundEvent::Malformed => {
            orchestrator.notify(&user, NoticeKind::UnknownError).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use roulette_common::Notice;
    use roulette_pairing::UserState;

    use super::*;

    /// Records notices; panics when asked to deliver `Help`.
    #[derive(Default)]
    struct TrapSink {
        notices: Mutex<Vec<Notice>>,
    }

    impl TrapSink {
        fn kinds_for(&self, user: &UserId) -> Vec<NoticeKind> {
            self.notices
                .lock()
                .unwrap()
                .iter()
                .filter(|n| &n.recipient == user)
                .map(|n| n.kind.clone())
                .collect()
        }
    }

    #[async_trait]
    impl NoticeSink for TrapSink {
        async fn deliver(&self, notice: Notice) {
            if notice.kind == NoticeKind::Help {
                panic!("trap sprung");
            }
            self.notices.lock().unwrap().push(notice);
        }
    }

    fn setup(max_inflight: usize) -> (Dispatcher<TrapSink>, Arc<TrapSink>) {
        let sink = Arc::new(TrapSink::default());
        let orchestrator = Orchestrator::new(Arc::clone(&sink));
        (Dispatcher::new(orchestrator, max_inflight), sink)
    }

    fn uid(s: &str) -> UserId {
        UserId::from(s)
    }

    async fn run(dispatcher: &Dispatcher<TrapSink>, user: &str, event: InboundEvent) {
        dispatcher.dispatch(uid(user), event).await.unwrap();
    }

    #[tokio::test]
    async fn newchat_and_relay_flow() {
        let (dispatcher, sink) = setup(8);

        run(&dispatcher, "a", InboundEvent::Command(Command::NewChat)).await;
        run(&dispatcher, "b", InboundEvent::Command(Command::NewChat)).await;
        run(&dispatcher, "a", InboundEvent::Text("hello".into())).await;

        assert_eq!(
            sink.kinds_for(&uid("b")),
            vec![
                NoticeKind::PartnerFound,
                NoticeKind::RelayedContent("hello".into())
            ]
        );
        assert_eq!(
            sink.kinds_for(&uid("a")),
            vec![NoticeKind::QueuedConfirmation, NoticeKind::PartnerFound]
        );
    }

    #[tokio::test]
    async fn stopchat_when_idle_sends_not_in_chat() {
        let (dispatcher, sink) = setup(8);
        run(&dispatcher, "a", InboundEvent::Command(Command::StopChat)).await;
        assert_eq!(sink.kinds_for(&uid("a")), vec![NoticeKind::NotInChatNotice]);
    }

    #[tokio::test]
    async fn unsupported_events_get_notices() {
        let (dispatcher, sink) = setup(8);
        run(&dispatcher, "a", InboundEvent::Edit).await;
        run(&dispatcher, "a", InboundEvent::Delete).await;
        run(&dispatcher, "a", InboundEvent::Malformed).await;
        run(
            &dispatcher,
            "a",
            InboundEvent::Command(Command::Unknown("debug".into())),
        )
        .await;

        assert_eq!(
            sink.kinds_for(&uid("a")),
            vec![
                NoticeKind::EditNotSupported,
                NoticeKind::DeleteNotSupported,
                NoticeKind::UnknownError,
                NoticeKind::UnknownCommand("debug".into()),
            ]
        );
    }

    #[tokio::test]
    async fn panicking_event_does_not_take_down_dispatcher() {
        let (dispatcher, sink) = setup(1);

        // The outer task absorbs the panic.
        run(&dispatcher, "a", InboundEvent::Command(Command::Help)).await;

        // The permit was released and later events still run.
        run(&dispatcher, "a", InboundEvent::Command(Command::NewChat)).await;
        assert_eq!(
            dispatcher.orchestrator().state_of(&uid("a")).await,
            UserState::Waiting
        );
        assert_eq!(sink.kinds_for(&uid("a")), vec![NoticeKind::QueuedConfirmation]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn many_concurrent_events_with_small_limit() {
        let (dispatcher, _sink) = setup(2);

        let mut handles = Vec::new();
        for i in 0..30 {
            handles.push(
                dispatcher
                    .dispatch(
                        uid(&format!("u{i}")),
                        InboundEvent::Command(Command::NewChat),
                    ),
            );
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let stats = dispatcher.orchestrator().stats().await;
        assert_eq!(stats.pairs, 15);
        assert_eq!(stats.waiting, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn stalled_reader_does_not_block_other_users() {
        use std::time::Duration;

        use tokio::sync::mpsc;

        use crate::registry::ConnectionRegistry;
        use crate::text::MessageTexts;

        let registry = ConnectionRegistry::new(MessageTexts::default());
        let dispatcher = Dispatcher::new(Orchestrator::new(Arc::new(registry.clone())), 4);

        let (a_tx, _a_rx) = mpsc::channel(64);
        // "b" never reads and has room for a single frame.
        let (b_tx, _b_rx) = mpsc::channel(1);
        let (c_tx, mut c_rx) = mpsc::channel(64);
        registry.register(uid("a"), a_tx).await;
        registry.register(uid("b"), b_tx).await;
        registry.register(uid("c"), c_tx).await;

        let orchestrator = dispatcher.orchestrator();
        orchestrator.request_pairing(&uid("a")).await.unwrap();
        orchestrator.request_pairing(&uid("b")).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..6 {
            handles.push(dispatcher.dispatch(uid("a"), InboundEvent::Text(format!("msg {i}"))));
        }
        handles.push(dispatcher.dispatch(uid("c"), InboundEvent::Command(Command::StopChat)));

        tokio::time::timeout(Duration::from_secs(2), async {
            for handle in handles {
                handle.await.unwrap();
            }
        })
        .await
        .expect("events stalled behind a full outbound buffer");

        let frame: serde_json::Value = serde_json::from_str(&c_rx.recv().await.unwrap()).unwrap();
        assert_eq!(frame["kind"], "not_in_chat_notice");
    }
}
