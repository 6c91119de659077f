//! Tether DB Library
//!
//! Postgres persistence for file slot columns. Host applications call
//! [`SlotColumnsRepository`] from their `Record::save` implementation.

pub mod slots;

pub use slots::{quote_identifier, SlotColumnsRepository};
