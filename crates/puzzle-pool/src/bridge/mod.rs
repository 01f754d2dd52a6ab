//! Messages exchanged between the coordinator and its workers.
//!
//! # Architecture
//!
//! - **protocol**: request/response envelopes, task payload sum types, identifiers

pub mod protocol;
