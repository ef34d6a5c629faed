use serde::{Deserialize, Serialize};

use crate::id::UserId;

/// What an outbound notice tells its recipient.
///
/// Wording and formatting are up to the delivery layer; only
/// `RelayedContent` carries a payload that must be delivered verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum NoticeKind {
    QueuedConfirmation,
    AlreadyInQueue,
    AlreadyInChat,
    PartnerFound,
    NotInChatNotice,
    /// Sent instead of relaying when the sender is still waiting.
    InQueueNotice,
    SessionEndedBySelf,
    SessionEndedByPartner,
    RemovedFromQueueConfirmation,
    RelayedContent(String),
    Help,
    UnknownCommand(String),
    EditNotSupported,
    DeleteNotSupported,
    UnknownError,
}

impl NoticeKind {
    /// Every value [`name`](Self::name) can return.
    pub const NAMES: &'static [&'static str] = &[
        "queued_confirmation",
        "already_in_queue",
        "already_in_chat",
        "partner_found",
        "not_in_chat_notice",
        "in_queue_notice",
        "session_ended_by_self",
        "session_ended_by_partner",
        "removed_from_queue_confirmation",
        "relayed_content",
        "help",
        "unknown_command",
        "edit_not_supported",
        "delete_not_supported",
        "unknown_error",
    ];

    /// Stable snake_case name, used as the wire tag and as the key for
    /// message text overrides.
    pub fn name(&self) -> &'static str {
        match self {
            Self::QueuedConfirmation => "queued_confirmation",
            Self::AlreadyInQueue => "already_in_queue",
            Self::AlreadyInChat => "already_in_chat",
            Self::PartnerFound => "partner_found",
            Self::NotInChatNotice => "not_in_chat_notice",
            Self::InQueueNotice => "in_queue_notice",
            Self::SessionEndedBySelf => "session_ended_by_self",
            Self::SessionEndedByPartner => "session_ended_by_partner",
            Self::RemovedFromQueueConfirmation => "removed_from_queue_confirmation",
            Self::RelayedContent(_) => "relayed_content",
            Self::Help => "help",
            Self::UnknownCommand(_) => "unknown_command",
            Self::EditNotSupported => "edit_not_supported",
            Self::DeleteNotSupported => "delete_not_supported",
            Self::UnknownError => "unknown_error",
        }
    }
}

/// A notice addressed to a single user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub recipient: UserId,
    pub kind: NoticeKind,
}

impl Notice {
    pub fn new(recipient: UserId, kind: NoticeKind) -> Self {
        Self { recipient, kind }
    }
}
