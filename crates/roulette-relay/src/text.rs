//! Notice wording.

use std::collections::HashMap;

use roulette_common::NoticeKind;

/// Renders notices to user-facing text, with optional per-kind overrides
/// from config. `{command}` in an `unknown_command` override is replaced
/// by the command name.
#[derive(Debug, Clone, Default)]
pub struct MessageTexts {
    overrides: HashMap<String, String>,
}

impl MessageTexts {
    pub fn new(overrides: HashMap<String, String>) -> Self {
        Self { overrides }
    }

    pub fn render(&self, kind: &NoticeKind) -> String {
        if let NoticeKind::RelayedContent(content) = kind {
            return content.clone();
        }

        let template = self
            .overrides
            .get(kind.name())
            .map(String::as_str)
            .unwrap_or_else(|| default_text(kind));

        match kind {
            NoticeKind::UnknownCommand(command) => template.replace("{command}", command),
            _ => template.to_string(),
        }
    }
}

fn default_text(kind: &NoticeKind) -> &'static str {
    match kind {
        NoticeKind::QueuedConfirmation => "Looking for a partner. You will be notified when someone joins.",
        NoticeKind::AlreadyInQueue => "You are already in the queue.",
        NoticeKind::AlreadyInChat => "You are already in a chat. Send /stopchat to leave it.",
        NoticeKind::PartnerFound => "Partner found! Say hi.",
        NoticeKind::NotInChatNotice => "You are not in a chat. Send /newchat to find a partner.",
        NoticeKind::InQueueNotice => "Still looking for a partner, your message was not delivered.",
        NoticeKind::SessionEndedBySelf => "You have left the chat.",
        NoticeKind::SessionEndedByPartner => "Your partner has left the chat.",
        NoticeKind::RemovedFromQueueConfirmation => "You have been removed from the queue.",
        NoticeKind::Help => "Send /newchat to talk to a random stranger and /stopchat to leave.",
        NoticeKind::UnknownCommand(_) => "Unknown command: /{command}",
        NoticeKind::EditNotSupported => "Edits are not delivered to your partner.",
        NoticeKind::DeleteNotSupported => "Deletions are not delivered to your partner.",
        NoticeKind::UnknownError | NoticeKind::RelayedContent(_) => {
            "Something went wrong, please try again."
        }
    }
}
