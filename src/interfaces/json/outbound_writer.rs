use crate::application::outbound::{Outbound, Recipient};
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct Delivery<'a> {
    /// Resolved destination chat, with the admin group substituted.
    target_chat: i64,
    #[serde(flatten)]
    outbound: &'a Outbound,
}

/// Writes outbound instructions as JSON lines.
pub struct OutboundWriter<W: Write> {
    writer: W,
    admin_group_id: i64,
}

impl<W: Write> OutboundWriter<W> {
    pub fn new(writer: W, admin_group_id: i64) -> Self {
        Self {
            writer,
            admin_group_id,
        }
    }

    fn target_chat(&self, outbound: &Outbound) -> i64 {
        match outbound {
            Outbound::Message { to, .. } | Outbound::Photo { to, .. } => match to {
                Recipient::Chat(chat_id) => *chat_id,
                Recipient::AdminGroup => self.admin_group_id,
            },
            Outbound::Edit { chat_id, .. } => *chat_id,
        }
    }

    pub fn write(&mut self, outbound: &Outbound) -> Result<()> {
        let delivery = Delivery {
            target_chat: self.target_chat(outbound),
            outbound,
        };
        serde_json::to_writer(&mut self.writer, &delivery).map_err(std::io::Error::from)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    pub fn write_all(&mut self, outbound: &[Outbound]) -> Result<()> {
        outbound.iter().try_for_each(|o| self.write(o))?;
        self.writer.flush()?;
        Ok(())
    }
}
