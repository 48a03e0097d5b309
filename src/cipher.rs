// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Envelope Cipher
//!
//! Symmetric authenticated encryption for record payloads and annotations
//! at rest, using AES-256-GCM from `ring`.
//!
//! ## Blob Format
//!
//! ```text
//! base64( nonce[12] || ciphertext || tag[16] )
//! ```
//!
//! Every call to [`EnvelopeCipher::encrypt`] draws a fresh random nonce, so
//! encrypting the same plaintext twice yields different blobs.

use std::fmt;

use base64ct::{Base64, Encoding};
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};

/// Required key length in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// Errors returned by [`EnvelopeCipher`].
#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("encryption key must be {KEY_LEN} bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("failed to generate nonce")]
    NonceGeneration,

    #[error("encryption failed")]
    Seal,

    #[error("ciphertext is not valid base64")]
    Encoding,

    #[error("ciphertext is truncated or has been tampered with")]
    Tampered,

    #[error("decrypted text is not valid UTF-8")]
    InvalidUtf8,
}

/// AES-256-GCM cipher keyed once at startup.
pub struct EnvelopeCipher {
    key: LessSafeKey,
    rng: SystemRandom,
}

impl EnvelopeCipher {
    /// Build a cipher from a raw 32-byte key.
    pub fn new(key: &[u8]) -> Result<Self, CipherError> {
        if key.len() != KEY_LEN {
            return Err(CipherError::InvalidKeyLength(key.len()));
        }
        let unbound = UnboundKey::new(&AES_256_GCM, key)
            .map_err(|_| CipherError::InvalidKeyLength(key.len()))?;

        Ok(Self {
            key: LessSafeKey::new(unbound),
            rng: SystemRandom::new(),
        })
    }

    /// Encrypt `plaintext` into a self-contained base64 blob.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<String, CipherError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| CipherError::NonceGeneration)?;

        let mut sealed = plaintext.to_vec();
        self.key
            .seal_in_place_append_tag(
                Nonce::assume_unique_for_key(nonce_bytes),
                Aad::empty(),
                &mut sealed,
            )
            .map_err(|_| CipherError::Seal)?;

        let mut blob = Vec::with_capacity(NONCE_LEN + sealed.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&sealed);
        Ok(Base64::encode_string(&blob))
    }

    /// Decrypt a blob produced by [`EnvelopeCipher::encrypt`].
    pub fn decrypt(&self, encoded: &str) -> Result<Vec<u8>, CipherError> {
        let blob = Base64::decode_vec(encoded).map_err(|_| CipherError::Encoding)?;
        if blob.len() < NONCE_LEN + AES_256_GCM.tag_len() {
            return Err(CipherError::Tampered);
        }

        let (nonce_bytes, sealed) = blob.split_at(NONCE_LEN);
        let nonce =
            Nonce::try_assume_unique_for_key(nonce_bytes).map_err(|_| CipherError::Tampered)?;

        let mut buffer = sealed.to_vec();
        let plaintext = self
            .key
            .open_in_place(nonce, Aad::empty(), &mut buffer)
            .map_err(|_| CipherError::Tampered)?;
        Ok(plaintext.to_vec())
    }

    pub fn encrypt_str(&self, plaintext: &str) -> Result<String, CipherError> {
        self.encrypt(plaintext.as_bytes())
    }

    pub fn decrypt_string(&self, encoded: &str) -> Result<String, CipherError> {
        String::from_utf8(self.decrypt(encoded)?).map_err(|_| CipherError::InvalidUtf8)
    }
}

impl fmt::Debug for EnvelopeCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvelopeCipher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> EnvelopeCipher {
        EnvelopeCipher::new(&[7u8; KEY_LEN]).unwrap()
    }

    #[test]
    fn round_trips_plaintext() {
        let cipher = cipher();
        let blob = cipher.encrypt(b"correct horse battery staple").unwrap();
        assert_eq!(cipher.decrypt(&blob).unwrap(), b"correct horse battery staple");
    }

    #[test]
    fn round_trips_empty_plaintext() {
        let cipher = cipher();
        let blob = cipher.encrypt_str("").unwrap();
        assert_eq!(cipher.decrypt_string(&blob).unwrap(), "");
    }

    #[test]
    fn same_plaintext_encrypts_differently() {
        let cipher = cipher();
        let first = cipher.encrypt(b"same").unwrap();
        let second = cipher.encrypt(b"same").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn flipped_byte_is_rejected() {
        let cipher = cipher();
        let blob = cipher.encrypt(b"secret").unwrap();
        let mut raw = Base64::decode_vec(&blob).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        let tampered = Base64::encode_string(&raw);

        assert!(matches!(cipher.decrypt(&tampered), Err(CipherError::Tampered)));
    }

    #[test]
    fn short_blob_is_rejected() {
        let cipher = cipher();
        let short = Base64::encode_string(&[0u8; NONCE_LEN + 4]);
        assert!(matches!(cipher.decrypt(&short), Err(CipherError::Tampered)));
    }

    #[test]
    fn invalid_base64_is_rejected() {
        assert!(matches!(cipher().decrypt("not base64!"), Err(CipherError::Encoding)));
    }

    #[test]
    fn other_key_cannot_decrypt() {
        let blob = cipher().encrypt(b"secret").unwrap();
        let other = EnvelopeCipher::new(&[8u8; KEY_LEN]).unwrap();
        assert!(matches!(other.decrypt(&blob), Err(CipherError::Tampered)));
    }

    #[test]
    fn rejects_wrong_key_length() {
        assert!(matches!(
            EnvelopeCipher::new(&[0u8; 16]),
            Err(CipherError::InvalidKeyLength(16))
        ));
    }
}
