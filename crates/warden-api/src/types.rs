//! Shared API state and response envelopes.

use std::sync::Arc;

use serde::Serialize;
use warden_db::StoreReader;
use warden_llm::DiagnosticEngine;

use crate::rate_limit::RateLimiter;

#[derive(Clone)]
pub struct ApiState {
    pub reader: Arc<StoreReader>,
    pub engine: Arc<DiagnosticEngine>,
    pub limiter: Arc<RateLimiter>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
