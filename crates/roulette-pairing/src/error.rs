use roulette_common::UserId;

/// Failures reported by [`WaitingPool`](crate::WaitingPool).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("user is already waiting")]
    AlreadyWaiting,

    #[error("user is not waiting")]
    NotWaiting,

    #[error("waiting pool is empty")]
    PoolEmpty,
}

/// Failures reported by [`PairingTable`](crate::PairingTable).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error("user {0} already has a partner")]
    AlreadyPaired(UserId),

    #[error("user has no partner")]
    NoPartner,

    #[error("a user cannot be paired with themselves")]
    SelfPairing,
}

/// Failures of the orchestrated pairing actions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PairingError {
    #[error("user is already waiting or paired")]
    AlreadyActive,

    #[error("could not pair {user} with {candidate}: {source}")]
    PairingConflict {
        user: UserId,
        candidate: UserId,
        source: TableError,
    },

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Table(#[from] TableError),
}
