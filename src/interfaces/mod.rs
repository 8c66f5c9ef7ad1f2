//! Inbound event scripts and outbound delivery formats.

pub mod csv;
pub mod json;
