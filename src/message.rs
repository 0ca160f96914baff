//! The four SCRAM wire messages.
//!
//! Client messages are built, server messages are parsed. The gs2 header is
//! fixed to `n,,`: channel binding is never requested and no authorization
//! identity is sent.

use std::borrow::Cow;
use std::num::NonZeroU32;
use std::str;

use crate::error::{Error, Field, Kind};

const GS2_HEADER: &str = "n,,";

/// Escapes `,` and `=` in a username as required by RFC 5802 section 5.1.
fn escape_username(username: &str) -> Cow<'_, str> {
    if username.contains(',') || username.contains('=') {
        username.replace('=', "=3D").replace(',', "=2C").into()
    } else {
        username.into()
    }
}

/// The client's opening message, binding the attempt to a fresh nonce.
#[derive(Debug, Clone)]
pub struct ClientFirstMessage {
    bare: String,
    nonce: String,
}

impl ClientFirstMessage {
    /// Builds the opening message for `username` and the attempt's `nonce`.
    pub fn new(username: &str, nonce: &str) -> Self {
        let bare = format!("n={},r={}", escape_username(username), nonce);
        ClientFirstMessage {
            bare,
            nonce: nonce.to_string(),
        }
    }

    /// The nonce this attempt is bound to.
    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    /// The message without the gs2 header, as it appears in the auth message.
    pub fn bare(&self) -> &str {
        &self.bare
    }

    /// The full wire form of the message.
    pub fn message(&self) -> String {
        format!("{}{}", GS2_HEADER, self.bare)
    }
}

/// The server's challenge, parsed from the first authenticate response.
#[derive(Debug, Clone)]
pub struct ServerFirstMessage {
    message: String,
    nonce: String,
    salt: Vec<u8>,
    iterations: NonZeroU32,
}

impl ServerFirstMessage {
    /// Parses the server's challenge out of a raw authenticate payload.
    ///
    /// The payload must carry the `r=`, `s=` and `i=` fields in order. A
    /// leading `m=` attribute announces a mandatory extension this client
    /// doesn't support and rejects the exchange.
    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        let message = str::from_utf8(data).map_err(|_| Error::Protocol(Kind::InvalidUtf8))?;
        let mut parts = message.split(',').peekable();

        match parts.peek() {
            Some(part) if part.starts_with("m=") => return Err(Error::UnsupportedExtension),
            Some(_) => {}
            None => return Err(Error::Protocol(Kind::ExpectedField(Field::Nonce))),
        }

        let nonce = match parts.next() {
            Some(part) if part.starts_with("r=") => &part[2..],
            _ => return Err(Error::Protocol(Kind::ExpectedField(Field::Nonce))),
        };
        let salt = match parts.next() {
            Some(part) if part.starts_with("s=") => base64::decode(&part[2..])
                .map_err(|_| Error::Protocol(Kind::InvalidField(Field::Salt)))?,
            _ => return Err(Error::Protocol(Kind::ExpectedField(Field::Salt)))
        };
        let iterations = match parts.next() {
            Some(part) if part.starts_with("i=") => part[2..]
                .parse::<u32>()
                .ok()
                .and_then(NonZeroU32::new)
                .ok_or(Error::Protocol(Kind::InvalidField(Field::Iterations)))?,
            _ => return Err(Error::Protocol(Kind::ExpectedField(Field::Iterations))),
        };

        Ok(ServerFirstMessage {
            message: message.to_string(),
            nonce: nonce.to_string(),
            salt,
            iterations,
        })
    }

    /// The combined client+server nonce.
    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    /// The salt for the password derivation.
    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    /// The advertised PBKDF2 iteration count.
    pub fn iterations(&self) -> NonZeroU32 {
        self.iterations
    }

    /// The raw message, as it appears in the auth message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// The client's proof-bearing message, built from the server's challenge.
///
/// The proof must be attached with [`set_proof`](Self::set_proof) before the
/// message is serialized.
#[derive(Debug, Clone)]
pub struct ClientFinalMessage {
    without_proof: String,
    proof: Option<Vec<u8>>,
}

impl ClientFinalMessage {
    /// Builds the message for the combined `nonce` returned by the server.
    /// The channel-binding field carries the fixed `n,,` marker.
    pub fn new(nonce: &str) -> Self {
        ClientFinalMessage {
            without_proof: format!("c={},r={}", base64::encode(GS2_HEADER), nonce),
            proof: None,
        }
    }

    /// Attaches the computed client proof.
    pub fn set_proof(&mut self, proof: Vec<u8>) {
        self.proof = Some(proof);
    }

    /// The message without the proof field, as it appears in the auth
    /// message.
    pub fn without_proof(&self) -> &str {
        &self.without_proof
    }

    /// The full wire form of the message.
    pub fn message(&self) -> String {
        let proof = self.proof.as_deref().unwrap_or_default();
        format!("{},p={}", self.without_proof, base64::encode(proof))
    }
}

/// The server's confirmation or rejection, parsed from the final
/// authenticate response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerFinalMessage {
    /// The server's signature over the exchange transcript.
    Verifier(Vec<u8>),
    /// The server's error message rejecting the attempt.
    Error(String),
}

impl ServerFinalMessage {
    /// Parses the server's final message out of a raw authenticate payload.
    ///
    /// The payload carries either a `v=` field (signature) or an `e=` field
    /// (error text); which one decides the variant, nothing else does.
    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        let message = str::from_utf8(data).map_err(|_| Error::Protocol(Kind::InvalidUtf8))?;
        if let Some(verifier) = message.strip_prefix("v=") {
            let signature = base64::decode(verifier)
                .map_err(|_| Error::Protocol(Kind::InvalidField(Field::VerifyOrError)))?;
            Ok(ServerFinalMessage::Verifier(signature))
        } else if let Some(error) = message.strip_prefix("e=") {
            Ok(ServerFinalMessage::Error(error.to_string()))
        } else {
            Err(Error::Protocol(Kind::ExpectedField(Field::VerifyOrError)))
        }
    }
}
