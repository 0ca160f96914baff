//! The hash-strength strategy behind the exchange.
//!
//! Both supported mechanisms share every derivation rule and differ only in
//! the digest they run it over. The orchestrator in [`crate::client`] is
//! written once against [`ScramMechanism`] and instantiated per strength.

use std::num::NonZeroU32;

use ring::digest::{self, SHA256_OUTPUT_LEN, SHA512_OUTPUT_LEN};
use ring::hmac;
use ring::pbkdf2;
use zeroize::Zeroizing;

use crate::message::{ClientFinalMessage, ClientFirstMessage, ServerFirstMessage};

/// One SCRAM hash strength.
///
/// All operations are deterministic pure functions over their inputs. The
/// orchestrator relies on that to recompute the signature the server must
/// return, and the tests to check the published reference exchange.
pub trait ScramMechanism {
    /// SASL mechanism name announced in the handshake.
    const NAME: &'static str;

    /// Smallest iteration count this client accepts from a server. Lower
    /// values are a downgrade and abort the exchange.
    const MIN_ITERATIONS: u32;

    /// Derives the salted password: PBKDF2 over the mechanism's HMAC with
    /// the server-provided salt and iteration count.
    fn salted_password(
        password: &str,
        salt: &[u8],
        iterations: NonZeroU32,
    ) -> Zeroizing<Vec<u8>>;

    /// Computes the proof of password possession over the exchange
    /// transcript.
    fn client_proof(
        salted_password: &[u8],
        client_first: &ClientFirstMessage,
        server_first: &ServerFirstMessage,
        client_final: &ClientFinalMessage,
    ) -> Vec<u8>;

    /// Derives the server key from the salted password.
    fn server_key(salted_password: &[u8]) -> Zeroizing<Vec<u8>>;

    /// Computes the signature the server is expected to return over the same
    /// transcript.
    fn server_signature(
        server_key: &[u8],
        client_first: &ClientFirstMessage,
        server_first: &ServerFirstMessage,
        client_final: &ClientFinalMessage,
    ) -> Vec<u8>;
}

/// Assembles the auth message the proofs are computed over:
/// `client-first-bare "," server-first "," client-final-without-proof`.
fn auth_message(
    client_first: &ClientFirstMessage,
    server_first: &ServerFirstMessage,
    client_final: &ClientFinalMessage,
) -> String {
    format!(
        "{},{},{}",
        client_first.bare(),
        server_first.message(),
        client_final.without_proof()
    )
}

fn hi(
    algorithm: pbkdf2::Algorithm,
    len: usize,
    password: &str,
    salt: &[u8],
    iterations: NonZeroU32,
) -> Zeroizing<Vec<u8>> {
    let mut salted_password = Zeroizing::new(vec![0u8; len]);
    pbkdf2::derive(
        algorithm,
        iterations,
        salt,
        password.as_bytes(),
        &mut salted_password,
    );
    salted_password
}

fn sign(algorithm: hmac::Algorithm, key: &[u8], data: &[u8]) -> hmac::Tag {
    hmac::sign(&hmac::Key::new(algorithm, key), data)
}

fn find_client_proof(
    hmac_algorithm: hmac::Algorithm,
    digest_algorithm: &'static digest::Algorithm,
    salted_password: &[u8],
    auth_message: &str,
) -> Vec<u8> {
    let client_key = sign(hmac_algorithm, salted_password, b"Client Key");
    let stored_key = digest::digest(digest_algorithm, client_key.as_ref());
    let client_signature = sign(hmac_algorithm, stored_key.as_ref(), auth_message.as_bytes());
    client_key
        .as_ref()
        .iter()
        .zip(client_signature.as_ref())
        .map(|(key, signature)| key ^ signature)
        .collect()
}

/// SCRAM-SHA-256 as specified by RFC 7677.
#[derive(Debug)]
pub enum ScramSha256 {}

impl ScramMechanism for ScramSha256 {
    const NAME: &'static str = "SCRAM-SHA-256";
    const MIN_ITERATIONS: u32 = 4096;

    fn salted_password(
        password: &str,
        salt: &[u8],
        iterations: NonZeroU32,
    ) -> Zeroizing<Vec<u8>> {
        hi(
            pbkdf2::PBKDF2_HMAC_SHA256,
            SHA256_OUTPUT_LEN,
            password,
            salt,
            iterations,
        )
    }

    fn client_proof(
        salted_password: &[u8],
        client_first: &ClientFirstMessage,
        server_first: &ServerFirstMessage,
        client_final: &ClientFinalMessage,
    ) -> Vec<u8> {
        find_client_proof(
            hmac::HMAC_SHA256,
            &digest::SHA256,
            salted_password,
            &auth_message(client_first, server_first, client_final),
        )
    }

    fn server_key(salted_password: &[u8]) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(
            sign(hmac::HMAC_SHA256, salted_password, b"Server Key")
                .as_ref()
                .to_vec(),
        )
    }

    fn server_signature(
        server_key: &[u8],
        client_first: &ClientFirstMessage,
        server_first: &ServerFirstMessage,
        client_final: &ClientFinalMessage,
    ) -> Vec<u8> {
        sign(
            hmac::HMAC_SHA256,
            server_key,
            auth_message(client_first, server_first, client_final).as_bytes(),
        )
        .as_ref()
        .to_vec()
    }
}

/// SCRAM-SHA-512, the same exchange over the stronger digest.
#[derive(Debug)]
pub enum ScramSha512 {}

impl ScramMechanism for ScramSha512 {
    const NAME: &'static str = "SCRAM-SHA-512";
    const MIN_ITERATIONS: u32 = 4096;

    fn salted_password(
        password: &str,
        salt: &[u8],
        iterations: NonZeroU32,
    ) -> Zeroizing<Vec<u8>> {
        hi(
            pbkdf2::PBKDF2_HMAC_SHA512,
            SHA512_OUTPUT_LEN,
            password,
            salt,
            iterations,
        )
    }

    fn client_proof(
        salted_password: &[u8],
        client_first: &ClientFirstMessage,
        server_first: &ServerFirstMessage,
        client_final: &ClientFinalMessage,
    ) -> Vec<u8> {
        find_client_proof(
            hmac::HMAC_SHA512,
            &digest::SHA512,
            salted_password,
            &auth_message(client_first, server_first, client_final),
        )
    }

    fn server_key(salted_password: &[u8]) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(
            sign(hmac::HMAC_SHA512, salted_password, b"Server Key")
                .as_ref()
                .to_vec(),
        )
    }

    fn server_signature(
        server_key: &[u8],
        client_first: &ClientFirstMessage,
        server_first: &ServerFirstMessage,
        client_final: &ClientFinalMessage,
    ) -> Vec<u8> {
        sign(
            hmac::HMAC_SHA512,
            server_key,
            auth_message(client_first, server_first, client_final).as_bytes(),
        )
        .as_ref()
        .to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The SCRAM-SHA-256 exchange published in RFC 7677 section 3.
    const USERNAME: &str = "user";
    const PASSWORD: &str = "pencil";
    const CLIENT_NONCE: &str = "rOprNGfwEbeRWgbNEkqO";
    const SERVER_FIRST: &[u8] =
        b"r=rOprNGfwEbeRWgbNEkqO%hvYDpWUa2RaTCAfuxFIlj)hNlF$k0,s=W22ZaJ0SNY7soEsUEjb6gQ==,i=4096";

    fn reference_exchange() -> (ClientFirstMessage, ServerFirstMessage, ClientFinalMessage) {
        let client_first = ClientFirstMessage::new(USERNAME, CLIENT_NONCE);
        let server_first = ServerFirstMessage::parse(SERVER_FIRST).unwrap();
        let client_final = ClientFinalMessage::new(server_first.nonce());
        (client_first, server_first, client_final)
    }

    #[test]
    fn sha256_reference_client_proof() {
        let (client_first, server_first, client_final) = reference_exchange();
        let salted_password =
            ScramSha256::salted_password(PASSWORD, server_first.salt(), server_first.iterations());
        let proof =
            ScramSha256::client_proof(&salted_password, &client_first, &server_first, &client_final);
        assert_eq!(
            base64::encode(&proof),
            "dHzbZapWIk4jUhN+Ute9ytag9zjfMHgsqmmiz7AndVQ="
        );
    }

    #[test]
    fn sha256_reference_server_signature() {
        let (client_first, server_first, client_final) = reference_exchange();
        let salted_password =
            ScramSha256::salted_password(PASSWORD, server_first.salt(), server_first.iterations());
        let server_key = ScramSha256::server_key(&salted_password);
        let signature = ScramSha256::server_signature(
            &server_key,
            &client_first,
            &server_first,
            &client_final,
        );
        assert_eq!(
            base64::encode(&signature),
            "6rriTRBi23WpRR/wtup+mMhUZUn/dB5nLTJRsjl95G4="
        );
    }

    #[test]
    fn derivations_are_deterministic() {
        let iterations = NonZeroU32::new(4096).unwrap();
        assert_eq!(
            *ScramSha256::salted_password(PASSWORD, b"salt", iterations),
            *ScramSha256::salted_password(PASSWORD, b"salt", iterations)
        );
        assert_eq!(
            *ScramSha512::salted_password(PASSWORD, b"salt", iterations),
            *ScramSha512::salted_password(PASSWORD, b"salt", iterations)
        );
    }

    #[test]
    fn sha512_output_lengths() {
        let (client_first, server_first, client_final) = reference_exchange();
        let salted_password =
            ScramSha512::salted_password(PASSWORD, server_first.salt(), server_first.iterations());
        assert_eq!(salted_password.len(), 64);
        let proof =
            ScramSha512::client_proof(&salted_password, &client_first, &server_first, &client_final);
        assert_eq!(proof.len(), 64);
        let server_key = ScramSha512::server_key(&salted_password);
        assert_eq!(server_key.len(), 64);
        let signature = ScramSha512::server_signature(
            &server_key,
            &client_first,
            &server_first,
            &client_final,
        );
        assert_eq!(signature.len(), 64);
    }

    #[test]
    fn password_change_flips_the_signature() {
        let (client_first, server_first, client_final) = reference_exchange();
        let signature_for = |password: &str| {
            let salted_password = ScramSha256::salted_password(
                password,
                server_first.salt(),
                server_first.iterations(),
            );
            let server_key = ScramSha256::server_key(&salted_password);
            ScramSha256::server_signature(
                &server_key,
                &client_first,
                &server_first,
                &client_final,
            )
        };
        assert_ne!(signature_for("pencil"), signature_for("pencim"));
    }
}
