//! # RSA-PSS Fleet Signatures
//!
//! Every fleet is an RSA keypair. Events are signed with RSA-PSS using
//! SHA-256 for both the digest and MGF1, with the maximum salt length the
//! modulus allows.
//!
//! The message is hashed twice: its SHA-256 hex string is what gets signed,
//! and PSS hashes that string again. The signed digest is therefore
//! `SHA-256(hex(SHA-256(message)))`.
//!
//! ## Public Key Encoding
//!
//! Public keys travel in "shrunk" form: the SPKI PEM without its header,
//! footer and line breaks. The fleet hash is the SHA-256 of that string.
//! [`expand_public_key`] rebuilds the PEM before parsing.

use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{Pss, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::hashing::{sha256_digest, sha256_hex};
use crate::CryptoError;

/// Key size used for new fleets.
pub const DEFAULT_KEY_BITS: usize = 2048;

const PEM_HEADER: &str = "-----BEGIN PUBLIC KEY-----";
const PEM_FOOTER: &str = "-----END PUBLIC KEY-----";
const PEM_LINE_WIDTH: usize = 64;
const SHA256_LEN: usize = 32;

/// Strip header, footer and newlines from a public key PEM.
pub fn shrink_public_pem(pem: &str) -> String {
    pem.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("-----"))
        .collect()
}

/// Rebuild a PEM document from a shrunk public key.
pub fn expand_public_key(shrunk: &str) -> String {
    let mut pem = String::with_capacity(shrunk.len() + 80);
    pem.push_str(PEM_HEADER);
    pem.push('\n');
    for chunk in shrunk.as_bytes().chunks(PEM_LINE_WIDTH) {
        pem.push_str(&String::from_utf8_lossy(chunk));
        pem.push('\n');
    }
    pem.push_str(PEM_FOOTER);
    pem.push('\n');
    pem
}

/// Largest PSS salt for this modulus: emLen - hLen - 2.
fn max_salt_len(key: &RsaPublicKey) -> usize {
    let em_bits = key.n().bits().saturating_sub(1);
    let em_len = em_bits.div_ceil(8);
    em_len.saturating_sub(SHA256_LEN + 2)
}

fn pss(key: &RsaPublicKey) -> Pss {
    Pss::new_with_salt::<Sha256>(max_salt_len(key))
}

/// Digest handed to PSS for `message`.
fn signing_digest(message: &str) -> [u8; SHA256_LEN] {
    sha256_digest(sha256_hex(message))
}

fn parse_public_key(shrunk: &str) -> Result<RsaPublicKey, CryptoError> {
    RsaPublicKey::from_public_key_pem(&expand_public_key(shrunk))
        .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
}

/// Verify a hex encoded RSA-PSS signature over `message`.
///
/// The message goes through the same double hashing as
/// [`FleetKeyPair::sign`].
///
/// # Errors
///
/// - `InvalidPublicKey` if the shrunk key does not parse
/// - `InvalidSignatureFormat` if the signature is not hex
/// - `SignatureVerificationFailed` on any mismatch
pub fn verify_signature(
    public_key: &str,
    message: &str,
    signature_hex: &str,
) -> Result<(), CryptoError> {
    let key = parse_public_key(public_key)?;
    let signature = hex::decode(signature_hex)
        .map_err(|e| CryptoError::InvalidSignatureFormat(e.to_string()))?;
    let digest = signing_digest(message);

    key.verify(pss(&key), &digest, &signature)
        .map_err(|_| CryptoError::SignatureVerificationFailed)
}

/// RSA keypair owning a fleet.
#[derive(Clone)]
pub struct FleetKeyPair {
    private_key: RsaPrivateKey,
    public_key: String,
}

impl FleetKeyPair {
    /// Generate a fresh keypair with the given modulus size.
    pub fn generate(bits: usize) -> Result<Self, CryptoError> {
        let private_key = RsaPrivateKey::new(&mut rand::thread_rng(), bits)
            .map_err(|e| CryptoError::KeyGenerationFailed(e.to_string()))?;
        Self::from_private_key(private_key)
    }

    /// Restore a keypair from its PKCS#8 PEM private key.
    pub fn from_private_pem(pem: &str) -> Result<Self, CryptoError> {
        let private_key = RsaPrivateKey::from_pkcs8_pem(pem)
            .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?;
        Self::from_private_key(private_key)
    }

    fn from_private_key(private_key: RsaPrivateKey) -> Result<Self, CryptoError> {
        let pem = RsaPublicKey::from(&private_key)
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
        Ok(Self {
            private_key,
            public_key: shrink_public_pem(&pem),
        })
    }

    /// PKCS#8 PEM encoding of the private key.
    pub fn private_pem(&self) -> Result<Zeroizing<String>, CryptoError> {
        self.private_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))
    }

    /// Shrunk public key.
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// Fleet identity, `SHA-256(public key)`.
    pub fn fleet_hash(&self) -> String {
        sha256_hex(&self.public_key)
    }

    /// Sign `message` and return the hex encoded signature.
    pub fn sign(&self, message: &str) -> Result<String, CryptoError> {
        let public = RsaPublicKey::from(&self.private_key);
        let digest = signing_digest(message);
        let signature = self
            .private_key
            .sign_with_rng(&mut rand::thread_rng(), pss(&public), &digest)
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
        Ok(hex::encode(signature))
    }
}

impl std::fmt::Debug for FleetKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FleetKeyPair")
            .field("fleet_hash", &self.fleet_hash())
            .finish_non_exhaustive()
    }
}
