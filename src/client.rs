//! The driver for one authentication attempt.
//!
//! One attempt runs strictly in sequence: handshake, client-first round
//! trip, server-first validation, client-final round trip, server-final
//! validation. The only suspension points are the three dispatches; all
//! message construction and key derivation is synchronous. Every failure
//! aborts the attempt, and a retried attempt starts over with a fresh nonce.

use log::debug;
use rand::distributions::{Alphanumeric, DistString};
use rand::rngs::OsRng;

use crate::broker::{Broker, ErrorCode, SaslAuthenticateRequest, SaslHandshakeRequest};
use crate::error::Error;
use crate::mechanism::{ScramMechanism, ScramSha256, ScramSha512};
use crate::message::{
    ClientFinalMessage, ClientFirstMessage, ServerFinalMessage, ServerFirstMessage,
};

/// Length in characters of the generated client nonce.
pub const NONCE_LENGTH: usize = 130;

/// Generates a fresh alphanumeric nonce from the OS random source.
///
/// Every attempt gets its own nonce; nothing derived from one attempt is
/// reused by another.
pub fn generate_nonce() -> String {
    Alphanumeric.sample_string(&mut OsRng, NONCE_LENGTH)
}

/// Announces `mechanism` to the broker before the SCRAM exchange starts.
///
/// Any non-success error code aborts the attempt; nothing is retried here.
pub async fn sasl_handshake<B: Broker + ?Sized>(
    broker: &B,
    mechanism: &str,
) -> Result<(), Error> {
    let request = SaslHandshakeRequest {
        mechanism: mechanism.to_string(),
    };
    let response = broker.sasl_handshake(request).await?;
    if response.error_code != ErrorCode::None {
        return Err(Error::Broker {
            broker: broker.id(),
            code: response.error_code,
            message: None,
        });
    }
    Ok(())
}

async fn send_client_first<B: Broker + ?Sized>(
    broker: &B,
    client_first: &ClientFirstMessage,
) -> Result<ServerFirstMessage, Error> {
    let request = SaslAuthenticateRequest {
        auth_bytes: client_first.message().into_bytes(),
    };
    let response = broker.sasl_authenticate(request).await?;
    if response.error_code != ErrorCode::None {
        return Err(Error::Broker {
            broker: broker.id(),
            code: response.error_code,
            message: response.error_message,
        });
    }
    ServerFirstMessage::parse(&response.auth_bytes)
}

async fn send_client_final<B: Broker + ?Sized>(
    broker: &B,
    client_final: &ClientFinalMessage,
) -> Result<ServerFinalMessage, Error> {
    let request = SaslAuthenticateRequest {
        auth_bytes: client_final.message().into_bytes(),
    };
    let response = broker.sasl_authenticate(request).await?;
    if response.error_code != ErrorCode::None {
        return Err(Error::Broker {
            broker: broker.id(),
            code: response.error_code,
            message: response.error_message,
        });
    }
    ServerFinalMessage::parse(&response.auth_bytes)
}

/// Runs one complete authentication attempt against `broker` with the hash
/// strength `A`.
///
/// The combined nonce must extend the client nonce and the advertised
/// iteration count must reach the mechanism floor before any password
/// derivation happens. On the success path the server's signature is
/// recomputed locally and compared byte for byte; a mismatch means the
/// server failed to prove possession of the credentials.
pub async fn authenticate<A: ScramMechanism, B: Broker + ?Sized>(
    broker: &B,
    username: &str,
    password: &str,
) -> Result<(), Error> {
    sasl_handshake(broker, A::NAME).await?;
    debug!("broker {} accepted mechanism {}", broker.id(), A::NAME);

    let nonce = generate_nonce();
    let client_first = ClientFirstMessage::new(username, &nonce);
    let server_first = send_client_first(broker, &client_first).await?;

    if !server_first.nonce().starts_with(client_first.nonce()) {
        return Err(Error::NonceMismatch);
    }
    if server_first.iterations().get() < A::MIN_ITERATIONS {
        return Err(Error::IterationCountTooLow {
            iterations: server_first.iterations().get(),
            minimum: A::MIN_ITERATIONS,
        });
    }
    debug!(
        "broker {} challenge validated, {} iterations",
        broker.id(),
        server_first.iterations()
    );

    let salted_password =
        A::salted_password(password, server_first.salt(), server_first.iterations());

    let mut client_final = ClientFinalMessage::new(server_first.nonce());
    let proof = A::client_proof(&salted_password, &client_first, &server_first, &client_final);
    client_final.set_proof(proof);

    match send_client_final(broker, &client_final).await? {
        ServerFinalMessage::Error(message) => Err(Error::Authentication(message)),
        ServerFinalMessage::Verifier(signature) => {
            let server_key = A::server_key(&salted_password);
            let expected =
                A::server_signature(&server_key, &client_first, &server_first, &client_final);
            if signature != expected {
                return Err(Error::InvalidServer);
            }
            debug!("broker {} authenticated user {}", broker.id(), username);
            Ok(())
        }
    }
}

/// Authenticates with SCRAM-SHA-256.
pub async fn authenticate_scram_sha256<B: Broker + ?Sized>(
    broker: &B,
    username: &str,
    password: &str,
) -> Result<(), Error> {
    authenticate::<ScramSha256, B>(broker, username, password).await
}

/// Authenticates with SCRAM-SHA-512.
pub async fn authenticate_scram_sha512<B: Broker + ?Sized>(
    broker: &B,
    username: &str,
    password: &str,
) -> Result<(), Error> {
    authenticate::<ScramSha512, B>(broker, username, password).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonce_has_fixed_length_and_charset() {
        let nonce = generate_nonce();
        assert_eq!(nonce.len(), NONCE_LENGTH);
        assert!(nonce.chars().all(|chr| chr.is_ascii_alphanumeric()));
    }

    #[test]
    fn nonces_differ_between_attempts() {
        assert_ne!(generate_nonce(), generate_nonce());
    }
}
