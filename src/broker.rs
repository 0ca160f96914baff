//! Typed request/response envelopes for the SASL exchange and the dispatch
//! capability they travel over.
//!
//! Wire framing, request/response correlation, timeouts and reconnects all
//! live behind the [`Broker`] trait. This crate only fills envelopes in and
//! reads them back out.

use std::fmt;

use async_trait::async_trait;

use crate::error::Error;

/// Identity of the broker an exchange runs against, used to attribute errors
/// when a cluster has many brokers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BrokerId(pub i32);

impl fmt::Display for BrokerId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{}", self.0)
    }
}

/// The protocol error codes a SASL exchange can observe in a response
/// envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// The request succeeded.
    None,
    /// The transport failed while the request was outstanding.
    NetworkException,
    /// The broker does not support the requested SASL mechanism.
    UnsupportedSaslMechanism,
    /// The request arrived out of sequence for the SASL session.
    IllegalSaslState,
    /// SASL authentication failed.
    SaslAuthenticationFailed,
}

impl ErrorCode {
    /// The wire value of the code.
    pub fn code(self) -> i16 {
        match self {
            ErrorCode::None => 0,
            ErrorCode::NetworkException => 13,
            ErrorCode::UnsupportedSaslMechanism => 33,
            ErrorCode::IllegalSaslState => 34,
            ErrorCode::SaslAuthenticationFailed => 58,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCode::None => "NONE",
            ErrorCode::NetworkException => "NETWORK_EXCEPTION",
            ErrorCode::UnsupportedSaslMechanism => "UNSUPPORTED_SASL_MECHANISM",
            ErrorCode::IllegalSaslState => "ILLEGAL_SASL_STATE",
            ErrorCode::SaslAuthenticationFailed => "SASL_AUTHENTICATION_FAILED",
        };
        write!(fmt, "{} ({})", name, self.code())
    }
}

/// Request announcing the SASL mechanism chosen for the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaslHandshakeRequest {
    /// Name of the mechanism, e.g. `SCRAM-SHA-256`.
    pub mechanism: String,
}

/// Response to a [`SaslHandshakeRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaslHandshakeResponse {
    /// `ErrorCode::None` when the broker accepts the mechanism.
    pub error_code: ErrorCode,
}

/// Generic authenticate envelope carrying one opaque SASL payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaslAuthenticateRequest {
    /// The serialized SASL message for the current exchange step.
    pub auth_bytes: Vec<u8>,
}

/// Response to a [`SaslAuthenticateRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaslAuthenticateResponse {
    /// `ErrorCode::None` when the step succeeded.
    pub error_code: ErrorCode,
    /// An optional human-readable message accompanying a failure.
    pub error_message: Option<String>,
    /// The server's SASL payload for the current exchange step.
    pub auth_bytes: Vec<u8>,
}

/// Dispatch capability for one broker connection.
///
/// Each call sends one request and suspends until the correlated response
/// arrives. Implementors own framing, correlation and timeouts; a transport
/// failure (timeout, cancellation, lost connection) is reported as
/// [`Error::Broker`] and aborts the attempt exactly like an in-band error
/// code. The capability may be shared between concurrent attempts, each of
/// which keeps its own exchange state.
#[async_trait]
pub trait Broker {
    /// The identity of this broker, for error attribution.
    fn id(&self) -> BrokerId;

    /// Sends a SaslHandshake request and awaits its response.
    async fn sasl_handshake(
        &self,
        request: SaslHandshakeRequest,
    ) -> Result<SaslHandshakeResponse, Error>;

    /// Sends a SaslAuthenticate request and awaits its response.
    async fn sasl_authenticate(
        &self,
        request: SaslAuthenticateRequest,
    ) -> Result<SaslAuthenticateResponse, Error>;
}
