use serde::{Deserialize, Serialize};

/// The Telegram user behind an inbound event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub user_id: String,
    pub name: String,
    pub username: String,
}

impl Caller {
    pub fn new(
        user_id: impl Into<String>,
        name: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        let username = username.into();
        Self {
            user_id: user_id.into(),
            name: name.into(),
            username: if username.is_empty() {
                "-".to_string()
            } else {
                username
            },
        }
    }
}

/// An event delivered by the bot transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A slash command; `name` has no leading `/`.
    Command {
        caller: Caller,
        chat_id: i64,
        name: String,
        args: Vec<String>,
    },
    /// An inline-button press carrying raw callback data.
    Callback {
        caller: Caller,
        chat_id: i64,
        message_id: i64,
        data: String,
    },
    /// A photo message, used as top-up proof.
    Photo {
        caller: Caller,
        chat_id: i64,
        file_id: String,
    },
}

impl Inbound {
    pub fn caller(&self) -> &Caller {
        match self {
            Inbound::Command { caller, .. }
            | Inbound::Callback { caller, .. }
            | Inbound::Photo { caller, .. } => caller,
        }
    }

    pub fn chat_id(&self) -> i64 {
        match self {
            Inbound::Command { chat_id, .. }
            | Inbound::Callback { chat_id, .. }
            | Inbound::Photo { chat_id, .. } => *chat_id,
        }
    }
}
