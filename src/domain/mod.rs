//! Ledger entities, pricing rules and the store port.

pub mod action;
pub mod ids;
pub mod money;
pub mod order;
pub mod ports;
pub mod pricing;
pub mod settings;
pub mod topup;
pub mod user;
pub mod validation;
