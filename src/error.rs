use std::fmt;

use thiserror::Error;

use crate::broker::{BrokerId, ErrorCode};

/// The SCRAM exchange error cases.
///
/// Every error aborts the running authentication attempt. A caller wishing to
/// retry must start a new attempt, which generates a new nonce.
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// The broker answered a handshake or authenticate request with a
    /// non-success error code, or the transport failed while the request was
    /// outstanding.
    #[error("broker {broker} returned {code}: {}", .message.as_deref().unwrap_or("<no error message>"))]
    Broker {
        /// The broker the request was dispatched to.
        broker: BrokerId,
        /// The error code carried by the response envelope.
        code: ErrorCode,
        /// An optional human-readable message supplied by the broker.
        message: Option<String>,
    },
    /// A server message wasn't formatted as required. `Kind` contains further
    /// information.
    ///
    /// RFC 5802 section 7 describes the format of the exchanged messages.
    #[error("protocol violation: {0}")]
    Protocol(Kind),
    /// The server required a mandatory extension to be present that this
    /// client doesn't support.
    #[error("unsupported mandatory extension")]
    UnsupportedExtension,
    /// The server responded with a nonce that doesn't start with the nonce
    /// this client sent. The response belongs to some other exchange, or
    /// someone is replaying one.
    #[error("server nonce does not start with the client nonce")]
    NonceMismatch,
    /// The server advertised an iteration count below the mechanism's
    /// minimum. Accepting it would weaken the derived key, so the attempt is
    /// aborted before any derivation happens.
    #[error("server iteration count {iterations} below required minimum {minimum}")]
    IterationCountTooLow {
        /// The iteration count the server advertised.
        iterations: u32,
        /// The floor defined by the mechanism in use.
        minimum: u32,
    },
    /// The server rejected the authentication attempt. `String` contains the
    /// message sent by the server.
    #[error("authentication rejected: {0}")]
    Authentication(String),
    /// The server couldn't be validated: the signature it returned doesn't
    /// match the one computed locally. Either the server doesn't possess the
    /// expected credentials or the exchange was tampered with.
    #[error("server signature does not match the locally computed signature")]
    InvalidServer,
}

/// The kinds of protocol violations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Kind {
    /// The content of the field `Field` is invalid.
    #[error("invalid {0} field")]
    InvalidField(Field),
    /// The field `Field` was expected but not found.
    #[error("expected {0} field")]
    ExpectedField(Field),
    /// The payload is not valid UTF-8.
    #[error("payload is not valid UTF-8")]
    InvalidUtf8,
}

/// The fields used in the exchanged messages.
#[derive(Debug, PartialEq, Eq)]
pub enum Field {
    /// Nonce
    Nonce,
    /// Salt
    Salt,
    /// Iterations
    Iterations,
    /// Verify or Error
    VerifyOrError,
}

impl fmt::Display for Field {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Nonce => fmt.write_str("nonce"),
            Field::Salt => fmt.write_str("salt"),
            Field::Iterations => fmt.write_str("iterations"),
            Field::VerifyOrError => fmt.write_str("verifier-or-error"),
        }
    }
}
