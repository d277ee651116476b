//! Logging trait for completion client operations.
//!
//! This module provides the [`ClientLogger`] trait that allows callers to capture every
//! exchange passing through a [`ChatCompletions`](crate::ChatCompletions) client, and
//! [`StderrLogger`], which writes each one to stderr as a JSON line.

use std::io::{self, Write};

use serde_json::json;

use crate::error::Error;
use crate::types::{ChatCompletionRequest, ChatCompletionResponse};

/// A trait for logging completion client operations.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Mutex;
/// use parley::{ChatCompletionRequest, ChatCompletionResponse, ClientLogger, Error};
///
/// struct CountingLogger {
///     seen: Mutex<usize>,
/// }
///
/// impl ClientLogger for CountingLogger {
///     fn log_request(&self, _: &ChatCompletionRequest) {
///         *self.seen.lock().unwrap() += 1;
///     }
///     fn log_response(&self, _: &ChatCompletionResponse) {}
///     fn log_error(&self, _: &Error) {}
/// }
/// ```
pub trait ClientLogger: Send + Sync {
    /// Log a request just before it is sent.
    fn log_request(&self, request: &ChatCompletionRequest);

    /// Log a successfully decoded response.
    fn log_response(&self, response: &ChatCompletionResponse);

    /// Log a failed request.
    fn log_error(&self, error: &Error);
}

/// Writes one JSON object per event to stderr.
#[derive(Debug, Default)]
pub struct StderrLogger;

impl StderrLogger {
    /// Creates a new stderr logger.
    pub fn new() -> Self {
        Self
    }

    fn emit(&self, event: serde_json::Value) {
        let mut stderr = io::stderr().lock();
        let _ = writeln!(stderr, "{event}");
    }
}

impl ClientLogger for StderrLogger {
    fn log_request(&self, request: &ChatCompletionRequest) {
        self.emit(request_event(request));
    }

    fn log_response(&self, response: &ChatCompletionResponse) {
        self.emit(response_event(response));
    }

    fn log_error(&self, error: &Error) {
        self.emit(error_event(error));
    }
}

fn request_event(request: &ChatCompletionRequest) -> serde_json::Value {
    json!({
        "event": "request",
        "model": request.model,
        "messages": request.messages.len(),
    })
}

fn response_event(response: &ChatCompletionResponse) -> serde_json::Value {
    json!({
        "event": "response",
        "id": response.id,
        "model": response.model,
        "choices": response.choices.len(),
        "usage": response.usage,
    })
}

fn error_event(error: &Error) -> serde_json::Value {
    json!({
        "event": "error",
        "status": error.status_code(),
        "message": error.to_string(),
    })
}
