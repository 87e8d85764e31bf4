//! 分块 RSA-OAEP 解密。
//!
//! Chunked RSA-OAEP decryption of service results.
//!
//! The service does not use hybrid encryption: it RSA-encrypts successive
//! plaintext blocks and concatenates the 256-byte ciphertext blocks before
//! base64-encoding the whole. Decryption mirrors that exactly: split the raw
//! ciphertext into [`CHUNK_SIZE`] blocks, decrypt each with OAEP, concatenate.
//! There is no checksum, so the block size and order are load-bearing.

use crate::{Error, ErrorContext, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::rand_core::CryptoRngCore;
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Ciphertext block size used by the service (2048-bit modulus).
pub const CHUNK_SIZE: usize = 256;

/// Digest used by OAEP for both the label hash and MGF1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OaepDigest {
    /// OpenSSL's default for `OPENSSL_PKCS1_OAEP_PADDING`; what the service uses.
    #[default]
    Sha1,
    Sha256,
}

impl OaepDigest {
    fn padding(&self) -> Oaep {
        match self {
            OaepDigest::Sha1 => Oaep::new::<sha1::Sha1>(),
            OaepDigest::Sha256 => Oaep::new::<sha2::Sha256>(),
        }
    }

    fn output_len(&self) -> usize {
        match self {
            OaepDigest::Sha1 => 20,
            OaepDigest::Sha256 => 32,
        }
    }
}

impl FromStr for OaepDigest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('-', "").as_str() {
            "sha1" => Ok(OaepDigest::Sha1),
            "sha256" => Ok(OaepDigest::Sha256),
            other => Err(Error::configuration_with_context(
                format!("unsupported OAEP digest `{}`", other),
                ErrorContext::new()
                    .with_field_path("oaep_digest")
                    .with_details("expected sha1 or sha256"),
            )),
        }
    }
}

/// RSA private key used to decrypt results.
#[derive(Clone)]
pub struct PrivateKey {
    key: RsaPrivateKey,
    digest: OaepDigest,
}

impl PrivateKey {
    pub fn new(key: RsaPrivateKey) -> Self {
        Self {
            key,
            digest: OaepDigest::default(),
        }
    }

    /// Parse a PEM key: PKCS#8, PKCS#1 (`RSA PRIVATE KEY`) or passphrase
    /// protected PKCS#8 (`ENCRYPTED PRIVATE KEY`).
    pub fn from_pem(pem: &str, passphrase: Option<&str>) -> Result<Self> {
        let parsed = if pem.contains("BEGIN ENCRYPTED PRIVATE KEY") {
            RsaPrivateKey::from_pkcs8_encrypted_pem(pem, passphrase.unwrap_or("").as_bytes())
                .map_err(|e| key_error(format!("cannot decrypt private key: {}", e)))?
        } else if pem.contains("BEGIN RSA PRIVATE KEY") {
            RsaPrivateKey::from_pkcs1_pem(pem)
                .map_err(|e| key_error(format!("invalid PKCS#1 private key: {}", e)))?
        } else {
            RsaPrivateKey::from_pkcs8_pem(pem)
                .map_err(|e| key_error(format!("invalid PKCS#8 private key: {}", e)))?
        };
        Ok(Self::new(parsed))
    }

    pub fn from_file(path: impl AsRef<Path>, passphrase: Option<&str>) -> Result<Self> {
        let pem = std::fs::read_to_string(path.as_ref())?;
        Self::from_pem(&pem, passphrase)
    }

    pub fn with_digest(mut self, digest: OaepDigest) -> Self {
        self.digest = digest;
        self
    }

    pub fn digest(&self) -> OaepDigest {
        self.digest
    }

    pub fn public_key(&self) -> RsaPublicKey {
        self.key.to_public_key()
    }

    /// Decode base64 and decrypt block by block. Any failing block aborts the
    /// whole operation; no partial plaintext is returned.
    pub fn decrypt(&self, encoded: &str) -> Result<Vec<u8>> {
        let cleaned: String = encoded
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        let raw = STANDARD
            .decode(cleaned.as_bytes())
            .map_err(|e| Error::decryption(format!("ciphertext is not valid base64: {}", e)))?;

        let mut plaintext = Vec::with_capacity(raw.len());
        for (index, chunk) in raw.chunks(CHUNK_SIZE).enumerate() {
            let block = self
                .key
                .decrypt(self.digest.padding(), chunk)
                .map_err(|e| Error::DecryptionFailed {
                    message: format!("Problem decrypting the message: {}", e),
                    context: ErrorContext::new()
                        .with_source("crypto")
                        .with_details(format!("block {} of {} bytes", index, chunk.len())),
                })?;
            plaintext.extend_from_slice(&block);
        }
        Ok(plaintext)
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKey")
            .field("bits", &(self.key.size() * 8))
            .field("digest", &self.digest)
            .finish()
    }
}

fn key_error(message: String) -> Error {
    Error::configuration_with_context(
        message,
        ErrorContext::new()
            .with_field_path("private_key")
            .with_source("crypto"),
    )
}

/// Decrypt with the configured key, failing with [`Error::MissingKey`] when none is set.
pub fn decrypt(key: Option<&PrivateKey>, encoded: &str) -> Result<Vec<u8>> {
    key.ok_or(Error::MissingKey)?.decrypt(encoded)
}

/// Encrypt the way the service does: plaintext blocks of the largest size OAEP
/// allows, each RSA-encrypted, concatenated and base64-encoded.
pub fn encrypt_chunked<R: CryptoRngCore>(
    rng: &mut R,
    key: &RsaPublicKey,
    digest: OaepDigest,
    plaintext: &[u8],
) -> Result<String> {
    let block = key.size() - 2 * digest.output_len() - 2;
    let mut out = Vec::with_capacity(plaintext.len().div_ceil(block) * key.size());
    for chunk in plaintext.chunks(block) {
        let encrypted = key
            .encrypt(rng, digest.padding(), chunk)
            .map_err(|e| Error::decryption(format!("encryption failed: {}", e)))?;
        out.extend_from_slice(&encrypted);
    }
    Ok(STANDARD.encode(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use rsa::pkcs8::DecodePublicKey;

    const PRIVATE_PEM: &str = include_str!("../tests/fixtures/private_key.pem");
    const PUBLIC_PEM: &str = include_str!("../tests/fixtures/public_key.pem");

    static KEY: Lazy<PrivateKey> =
        Lazy::new(|| PrivateKey::from_pem(PRIVATE_PEM, None).expect("fixture key"));

    fn round_trip(len: usize, digest: OaepDigest) {
        let key = KEY.clone().with_digest(digest);
        let public = RsaPublicKey::from_public_key_pem(PUBLIC_PEM).unwrap();
        let plaintext: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        let encoded = encrypt_chunked(&mut rand::thread_rng(), &public, digest, &plaintext).unwrap();
        assert_eq!(key.decrypt(&encoded).unwrap(), plaintext, "length {}", len);
    }

    #[test]
    fn test_round_trip_across_block_boundaries() {
        for len in [0, 1, 213, 214, 215, 255, 256, 257, 1000] {
            round_trip(len, OaepDigest::Sha1);
        }
    }

    #[test]
    fn test_round_trip_with_sha256() {
        round_trip(400, OaepDigest::Sha256);
    }

    #[test]
    fn test_ciphertext_blocks_are_256_bytes() {
        let public = KEY.public_key();
        let encoded = encrypt_chunked(&mut rand::thread_rng(), &public, OaepDigest::Sha1, &[7u8; 300]).unwrap();
        assert_eq!(STANDARD.decode(encoded).unwrap().len(), 2 * CHUNK_SIZE);
    }

    #[test]
    fn test_missing_key() {
        assert!(matches!(decrypt(None, "AAAA"), Err(Error::MissingKey)));
    }

    #[test]
    fn test_truncated_ciphertext_fails_whole_operation() {
        let public = KEY.public_key();
        let encoded = encrypt_chunked(&mut rand::thread_rng(), &public, OaepDigest::Sha1, &[1u8; 300]).unwrap();
        let mut raw = STANDARD.decode(encoded).unwrap();
        raw.truncate(CHUNK_SIZE + 100);
        let err = KEY.decrypt(&STANDARD.encode(raw)).unwrap_err();
        assert!(matches!(err, Error::DecryptionFailed { .. }));
        assert_eq!(
            err.context().and_then(|c| c.details.as_deref()),
            Some("block 1 of 100 bytes")
        );
    }

    #[test]
    fn test_wrong_digest_fails() {
        let public = KEY.public_key();
        let encoded = encrypt_chunked(&mut rand::thread_rng(), &public, OaepDigest::Sha256, b"hello").unwrap();
        assert!(KEY.decrypt(&encoded).is_err());
    }

    #[test]
    fn test_invalid_base64() {
        let err = KEY.decrypt("not*base64").unwrap_err();
        assert!(matches!(err, Error::DecryptionFailed { .. }));
    }

    #[test]
    fn test_whitespace_in_base64_is_ignored() {
        let public = KEY.public_key();
        let encoded = encrypt_chunked(&mut rand::thread_rng(), &public, OaepDigest::Sha1, b"wrapped").unwrap();
        let wrapped: String = encoded
            .as_bytes()
            .chunks(76)
            .map(|c| format!("{}\n", std::str::from_utf8(c).unwrap()))
            .collect();
        assert_eq!(KEY.decrypt(&wrapped).unwrap(), b"wrapped");
    }

    #[test]
    fn test_digest_parsing() {
        assert_eq!("SHA-256".parse::<OaepDigest>().unwrap(), OaepDigest::Sha256);
        assert_eq!("sha1".parse::<OaepDigest>().unwrap(), OaepDigest::Sha1);
        assert!("md5".parse::<OaepDigest>().is_err());
    }
}
