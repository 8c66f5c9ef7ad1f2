use crate::application::event::{Caller, Inbound};
use crate::error::{LedgerError, Result};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Command,
    Callback,
    Photo,
}

/// One row of an event script.
///
/// `payload` is the command line (`/mmb 12345678 1234 86`), the callback
/// data, or the photo file id, depending on `kind`.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone)]
pub struct EventRecord {
    pub kind: EventKind,
    pub user_id: String,
    pub chat_id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub message_id: Option<i64>,
    pub payload: String,
}

impl TryFrom<EventRecord> for Inbound {
    type Error = LedgerError;

    fn try_from(record: EventRecord) -> Result<Self> {
        let name = if record.name.is_empty() {
            record.user_id.clone()
        } else {
            record.name
        };
        let caller = Caller::new(record.user_id, name, record.username);
        let chat_id = record.chat_id;

        match record.kind {
            EventKind::Command => {
                let mut words = record.payload.split_whitespace();
                let command = words
                    .next()
                    .and_then(|word| word.strip_prefix('/'))
                    .ok_or_else(|| {
                        LedgerError::InvalidEvent(format!("not a command: `{}`", record.payload))
                    })?;
                // `/start@SomeBot` addresses a bot explicitly in groups.
                let name = command.split('@').next().unwrap_or(command);
                Ok(Inbound::Command {
                    caller,
                    chat_id,
                    name: name.to_lowercase(),
                    args: words.map(str::to_string).collect(),
                })
            }
            EventKind::Callback => Ok(Inbound::Callback {
                caller,
                chat_id,
                message_id: record.message_id.ok_or_else(|| {
                    LedgerError::InvalidEvent("callback without message_id".into())
                })?,
                data: record.payload,
            }),
            EventKind::Photo => Ok(Inbound::Photo {
                caller,
                chat_id,
                file_id: record.payload,
            }),
        }
    }
}

/// Reads inbound events from a CSV source.
///
/// Wraps `csv::Reader` with whitespace trimming and flexible record lengths,
/// and yields one `Inbound` per row.
pub struct EventReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> EventReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily reads and converts events, one row at a time.
    pub fn events(self) -> impl Iterator<Item = Result<Inbound>> {
        self.reader
            .into_deserialize::<EventRecord>()
            .map(|row| row.map_err(LedgerError::from).and_then(Inbound::try_from))
    }
}
