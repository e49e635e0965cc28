//! Envelope rendering

pub mod console;
