//! Caller-facing response envelope.

pub mod entities;

pub use entities::{
    ComponentFailure, ResponseEnvelope, ResponseMetadata, StageKind, StageResponse,
};
