//! Shared utilities for use cases.

use crate::ports::model_invoker::{Completion, InvocationError, InvocationRequest, ModelInvoker};
use parley_domain::{DomainError, Model, util::millis};
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Check if cancellation has been requested.
pub(crate) fn check_cancelled(token: &CancellationToken) -> Result<(), DomainError> {
    if token.is_cancelled() {
        return Err(DomainError::Cancelled);
    }
    Ok(())
}

/// Invoke a model and measure how long the call took, success or not.
pub(crate) async fn invoke_timed<I: ModelInvoker + ?Sized>(
    invoker: &I,
    model: &Model,
    request: &InvocationRequest,
) -> (Result<Completion, InvocationError>, u64) {
    let started = Instant::now();
    let result = invoker.invoke(model, request).await;
    (result, millis(started.elapsed()))
}
