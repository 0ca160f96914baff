//! # SASL/SCRAM authentication for Kafka-compatible brokers
//!
//! This crate implements the client side of the SASL/SCRAM exchange spoken
//! by Kafka-compatible brokers, in the SCRAM-SHA-256 and SCRAM-SHA-512
//! variants of RFC 5802 and RFC 7677. It doesn't support channel binding.
//!
//! One call runs one complete authentication attempt: a SaslHandshake
//! request announces the mechanism, then two SaslAuthenticate round trips
//! prove possession of the password without ever sending it. The connection
//! itself stays outside the crate behind the [`Broker`] trait; implement it
//! on your connection type to provide framing, request/response correlation
//! and timeouts, and pass credentials per attempt.
//!
//! The server's challenge is validated before any expensive derivation: the
//! combined nonce must extend the client nonce and the advertised iteration
//! count must reach the mechanism's floor. After the proof is sent, the
//! server's own signature is recomputed locally and compared byte for byte,
//! so a server that doesn't hold the expected credentials is detected even
//! when it claims success.
//!
//! # Usage
//!
//! ```no_run
//! use kafka_scram::{
//!     authenticate_scram_sha256, Broker, BrokerId, Error, SaslAuthenticateRequest,
//!     SaslAuthenticateResponse, SaslHandshakeRequest, SaslHandshakeResponse,
//! };
//!
//! // This type represents your connection and framing implementation.
//! struct Connection;
//!
//! #[async_trait::async_trait]
//! impl Broker for Connection {
//!     fn id(&self) -> BrokerId {
//!         BrokerId(1)
//!     }
//!
//!     async fn sasl_handshake(
//!         &self,
//!         request: SaslHandshakeRequest,
//!     ) -> Result<SaslHandshakeResponse, Error> {
//!         unimplemented!("send the request over the wire and await the response")
//!     }
//!
//!     async fn sasl_authenticate(
//!         &self,
//!         request: SaslAuthenticateRequest,
//!     ) -> Result<SaslAuthenticateResponse, Error> {
//!         unimplemented!("send the request over the wire and await the response")
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     let broker = Connection;
//!     authenticate_scram_sha256(&broker, "user", "password").await
//! }
//! ```

mod broker;
mod client;
mod error;
mod mechanism;
mod message;

pub use broker::{
    Broker, BrokerId, ErrorCode, SaslAuthenticateRequest, SaslAuthenticateResponse,
    SaslHandshakeRequest, SaslHandshakeResponse,
};
pub use client::{
    authenticate, authenticate_scram_sha256, authenticate_scram_sha512, generate_nonce,
    sasl_handshake, NONCE_LENGTH,
};
pub use error::{Error, Field, Kind};
pub use mechanism::{ScramMechanism, ScramSha256, ScramSha512};
pub use message::{
    ClientFinalMessage, ClientFirstMessage, ServerFinalMessage, ServerFirstMessage,
};
