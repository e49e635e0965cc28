//! Model backend adapters
//!
//! Every backend is reached over HTTP; the only thing that differs between
//! them is the request/response JSON layout, captured by [`ResponseShape`].

#[cfg(feature = "http")]
pub mod http;
pub mod shape;

pub use shape::ResponseShape;

use parley_domain::Model;
use std::collections::HashMap;

/// Where and how to reach one model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelEndpoint {
    pub url: String,
    pub shape: ResponseShape,
}

impl ModelEndpoint {
    pub fn new(url: impl Into<String>, shape: ResponseShape) -> Self {
        Self {
            url: url.into(),
            shape,
        }
    }
}

/// Endpoint lookup by model name.
#[derive(Debug, Clone, Default)]
pub struct EndpointTable {
    endpoints: HashMap<Model, ModelEndpoint>,
}

impl EndpointTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoint(mut self, model: Model, endpoint: ModelEndpoint) -> Self {
        self.endpoints.insert(model, endpoint);
        self
    }

    pub fn insert(&mut self, model: Model, endpoint: ModelEndpoint) {
        self.endpoints.insert(model, endpoint);
    }

    pub fn get(&self, model: &Model) -> Option<&ModelEndpoint> {
        self.endpoints.get(model)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}
