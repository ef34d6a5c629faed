//! Inbound event classification.

use std::sync::LazyLock;

use regex::Regex;

use crate::protocol::ClientFrame;

static COMMAND_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^/[a-zA-Z0-9_]+").unwrap());

/// A slash command recognized at the start of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    NewChat,
    StopChat,
    Unknown(String),
}

/// One unit of work derived from a client frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Command(Command),
    Text(String),
    Edit,
    Delete,
    /// A frame that could not be understood.
    Malformed,
}

impl InboundEvent {
    /// Short name for logs; never includes message text.
    pub fn label(&self) -> &'static str {
        match self {
            InboundEvent::Command(Command::Help) => "help",
            InboundEvent::Command(Command::NewChat) => "newchat",
            InboundEvent::Command(Command::StopChat) => "stopchat",
            InboundEvent::Command(Command::Unknown(_)) => "unknown_command",
            InboundEvent::Text(_) => "text",
            InboundEvent::Edit => "edit",
            InboundEvent::Delete => "delete",
            InboundEvent::Malformed => "malformed",
        }
    }
}

impl From<ClientFrame> for InboundEvent {
    fn from(frame: ClientFrame) -> Self {
        match frame {
            ClientFrame::Message { text } => match parse_command(&text) {
                Some(cmd) => InboundEvent::Command(cmd),
                None => InboundEvent::Text(text),
            },
            ClientFrame::Edit => InboundEvent::Edit,
            ClientFrame::Delete => InboundEvent::Delete,
        }
    }
}

/// Extract a command from the start of `text`, case-insensitively.
pub fn parse_command(text: &str) -> Option<Command> {
    let found = COMMAND_RE.find(text)?;
    let name = found.as_str()[1..].to_lowercase();
    Some(match name.as_str() {
        "start" | "help" => Command::Help,
        "newchat" => Command::NewChat,
        "stopchat" => Command::StopChat,
        _ => Command::Unknown(name),
    })
}
