//! Matchmaking and pairing-consistency engine.
//!
//! A user is always in exactly one of three states: idle, waiting in the
//! [`WaitingPool`], or paired in the [`PairingTable`]. The [`Orchestrator`]
//! sequences pool and table operations into the user-facing actions and
//! reports the outcome to a [`NoticeSink`].
//!
//! Both containers serialize their own operations behind a single lock.
//! Sequences spanning both are not globally atomic; the orchestrator
//! compensates when a pick cannot be turned into a pair.

pub mod error;
pub mod orchestrator;
pub mod pool;
pub mod sink;
pub mod table;

pub use error::{PairingError, PoolError, TableError};
pub use orchestrator::{Orchestrator, PairingStats, RequestOutcome, StopOutcome, UserState};
pub use pool::WaitingPool;
pub use sink::NoticeSink;
pub use table::PairingTable;
