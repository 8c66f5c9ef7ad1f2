use super::notice::Notice;
use crate::domain::action::CallbackAction;
use serde::{Serialize, Serializer};
use std::fmt::Display;

fn as_text<T: Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// Where a message goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Recipient {
    Chat(i64),
    AdminGroup,
}

impl Recipient {
    /// The private chat of a user; Telegram uses the user id as its chat id.
    pub fn user(user_id: &str) -> Option<Self> {
        match user_id.parse() {
            Ok(chat_id) => Some(Recipient::Chat(chat_id)),
            Err(_) => {
                tracing::warn!(%user_id, "user id is not a chat id, notification dropped");
                None
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Button {
    pub label: String,
    #[serde(rename = "data", serialize_with = "as_text")]
    pub action: CallbackAction,
}

impl Button {
    pub fn new(label: impl Into<String>, action: CallbackAction) -> Self {
        Self {
            label: label.into(),
            action,
        }
    }
}

/// Rows of inline buttons.
pub type Keyboard = Vec<Vec<Button>>;

/// A delivery instruction for the bot transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outbound {
    Message {
        to: Recipient,
        #[serde(rename = "text", serialize_with = "as_text")]
        notice: Notice,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        keyboard: Keyboard,
    },
    Photo {
        to: Recipient,
        file_id: String,
        #[serde(rename = "caption", serialize_with = "as_text")]
        notice: Notice,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        keyboard: Keyboard,
    },
    /// Replaces the text of an earlier message and drops its keyboard.
    Edit {
        chat_id: i64,
        message_id: i64,
        #[serde(rename = "text", serialize_with = "as_text")]
        notice: Notice,
    },
}

impl Outbound {
    pub fn message(to: Recipient, notice: Notice) -> Self {
        Outbound::Message {
            to,
            notice,
            keyboard: Keyboard::new(),
        }
    }

    pub fn with_keyboard(to: Recipient, notice: Notice, keyboard: Keyboard) -> Self {
        Outbound::Message {
            to,
            notice,
            keyboard,
        }
    }

    pub fn edit(chat_id: i64, message_id: i64, notice: Notice) -> Self {
        Outbound::Edit {
            chat_id,
            message_id,
            notice,
        }
    }

    pub fn notice(&self) -> &Notice {
        match self {
            Outbound::Message { notice, .. }
            | Outbound::Photo { notice, .. }
            | Outbound::Edit { notice, .. } => notice,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_serializes_rendered_text_and_button_data() {
        let out = Outbound::with_keyboard(
            Recipient::AdminGroup,
            Notice::TopupCancelled,
            vec![vec![Button::new(
                "Approve",
                CallbackAction::ApproveTopup("TOP1".into()),
            )]],
        );
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["kind"], "message");
        assert_eq!(json["to"], "admin_group");
        assert_eq!(json["text"], Notice::TopupCancelled.to_string());
        assert_eq!(json["keyboard"][0][0]["data"], "topup_approve_TOP1");
    }

    #[test]
    fn test_plain_message_omits_keyboard() {
        let out = Outbound::message(Recipient::Chat(42), Notice::AccessGranted);
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["to"]["chat"], 42);
        assert!(json.get("keyboard").is_none());
    }
}
