use crate::types::{HttpRequest, HttpResponse};
use std::fmt;

/// Errors raised synchronously at call preparation, before any middleware
/// or transport is touched. Never caught by middlewares (spec.md §7).
#[derive(Debug)]
pub enum ConfigurationError {
    UnregisteredResource { client_name: String, resource: String },
    UnregisteredRoute { verb: &'static str, resource: String, client_name: String },
    NoContract { verb: &'static str, resource: String },
    WrongRequestType { expected: &'static str, got: &'static str },
    NoResponseSchema { verb: &'static str, resource: String },
    UnregisteredContentType(String),
    UnregisteredService(String),
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::UnregisteredResource { client_name, resource } => {
                write!(f, "resource '{resource}' is not registered for client '{client_name}'")
            }
            ConfigurationError::UnregisteredRoute { verb, resource, client_name } => {
                write!(f, "no {verb} route on resource '{resource}' of client '{client_name}'")
            }
            ConfigurationError::NoContract { verb, resource } => {
                write!(f, "no contract registered for {verb} on resource '{resource}'")
            }
            ConfigurationError::WrongRequestType { expected, got } => {
                write!(f, "expected request schema '{expected}', got '{got}'")
            }
            ConfigurationError::NoResponseSchema { verb, resource } => {
                write!(f, "no response schema registered for {verb} on resource '{resource}'")
            }
            ConfigurationError::UnregisteredContentType(ct) => {
                write!(f, "no body serializer registered for content type '{ct}'")
            }
            ConfigurationError::UnregisteredService(name) => {
                write!(f, "service discovery has no endpoint for service '{name}'")
            }
        }
    }
}

impl std::error::Error for ConfigurationError {}

/// Kind of failure a transport may report before any response is received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Connect,
    Timeout,
    Dns,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportErrorKind::Connect => write!(f, "connect failure"),
            TransportErrorKind::Timeout => write!(f, "timeout"),
            TransportErrorKind::Dns => write!(f, "dns failure"),
        }
    }
}

/// The single error value threaded through the middleware chain. Reconciles
/// spec.md §7's `TransportError` / `HttpError` / `CircuitOpenError` into one
/// enum (§4.12 of SPEC_FULL.md) since all three flow through the same
/// `Result<HttpResponse, HttpError>` channel.
#[derive(Debug)]
pub enum HttpError {
    /// A non-2xx response reached the caller.
    Status {
        request: HttpRequest,
        response: HttpResponse,
        status_code: u16,
    },
    /// The transport could not produce a response at all.
    Transport {
        request: HttpRequest,
        message: String,
        kind: TransportErrorKind,
    },
    /// The circuit breaker short-circuited the call.
    CircuitOpen { client_name: String },
}

impl HttpError {
    /// True for HTTP 400..=499 status codes — used by the circuit breaker's
    /// exclusion predicate (spec.md §4.6) to avoid counting client errors as
    /// breaker failures.
    pub fn is_client_error(&self) -> bool {
        matches!(self, HttpError::Status { status_code, .. } if (400..500).contains(status_code))
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            HttpError::Status { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    pub fn response(&self) -> Option<&HttpResponse> {
        match self {
            HttpError::Status { response, .. } => Some(response),
            _ => None,
        }
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpError::Status { status_code, .. } => write!(f, "HTTP error: status {status_code}"),
            HttpError::Transport { message, kind, .. } => write!(f, "transport error ({kind}): {message}"),
            HttpError::CircuitOpen { client_name } => write!(f, "circuit open for client '{client_name}'"),
        }
    }
}

impl std::error::Error for HttpError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn is_client_error_true_for_4xx() {
        let req = HttpRequest::new(crate::types::HttpMethod::Get, "/x");
        let resp = HttpResponse::new(422, HashMap::new(), serde_json::Value::Null);
        let err = HttpError::Status { request: req, response: resp, status_code: 422 };
        assert!(err.is_client_error());
    }

    #[test]
    fn is_client_error_false_for_5xx() {
        let req = HttpRequest::new(crate::types::HttpMethod::Get, "/x");
        let resp = HttpResponse::new(500, HashMap::new(), serde_json::Value::Null);
        let err = HttpError::Status { request: req, response: resp, status_code: 500 };
        assert!(!err.is_client_error());
    }

    #[test]
    fn is_client_error_false_for_transport_and_circuit_open() {
        let req = HttpRequest::new(crate::types::HttpMethod::Get, "/x");
        let transport_err = HttpError::Transport {
            request: req,
            message: "boom".into(),
            kind: TransportErrorKind::Timeout,
        };
        assert!(!transport_err.is_client_error());
        let circuit_err = HttpError::CircuitOpen { client_name: "dummy".into() };
        assert!(!circuit_err.is_client_error());
    }
}
