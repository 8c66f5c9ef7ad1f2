//! Application layer: the workflows behind each bot command and button.
//!
//! `LedgerEngine` is the single entry point. It decodes an inbound event,
//! runs the matching workflow against the shared `WorkflowContext` and
//! returns the outbound instructions for the bot transport.

pub mod account;
pub mod admin;
pub mod affiliate;
pub mod context;
pub mod engine;
pub mod event;
pub mod intents;
pub mod notice;
pub mod order;
pub mod outbound;
pub mod topup;
