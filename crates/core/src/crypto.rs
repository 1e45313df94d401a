//! Symmetric encryption for third-party provider API keys stored per user.
//!
//! Keys are sealed with AES-256-GCM. The 256-bit key is derived from the
//! configured secret with SHA-256; every encryption draws a fresh 96-bit
//! nonce. The stored form is the hex encoding of `nonce || ciphertext`.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};

use crate::hashing::sha256;

/// AES-GCM nonce length in bytes.
const NONCE_LEN: usize = 12;

/// Number of trailing characters revealed by [`mask_api_key`].
const MASK_VISIBLE_CHARS: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("encryption failed")]
    Encrypt,

    #[error("decryption failed: ciphertext is corrupt or was sealed with another secret")]
    Decrypt,

    #[error("stored ciphertext is not valid hex: {0}")]
    Encoding(#[from] hex::FromHexError),
}

/// Encrypts and decrypts provider API keys.
#[derive(Clone)]
pub struct ApiKeyCipher {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for ApiKeyCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyCipher").finish_non_exhaustive()
    }
}

impl ApiKeyCipher {
    /// Derive the cipher key from an arbitrary-length secret.
    pub fn from_secret(secret: &str) -> Self {
        let digest = sha256(secret.as_bytes());
        let key = Key::<Aes256Gcm>::from_slice(&digest);
        Self {
            cipher: Aes256Gcm::new(key),
        }
    }

    /// Seal a plaintext key. Returns hex of `nonce || ciphertext`.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| CryptoError::Encrypt)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(nonce.as_slice());
        sealed.extend_from_slice(&ciphertext);
        Ok(hex::encode(sealed))
    }

    /// Open a value produced by [`ApiKeyCipher::encrypt`].
    pub fn decrypt(&self, sealed_hex: &str) -> Result<String, CryptoError> {
        let sealed = hex::decode(sealed_hex)?;
        if sealed.len() <= NONCE_LEN {
            return Err(CryptoError::Decrypt);
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CryptoError::Decrypt)?;
        String::from_utf8(plaintext).map_err(|_| CryptoError::Decrypt)
    }
}

/// Render a key for display, keeping only the last few characters.
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= MASK_VISIBLE_CHARS {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - MASK_VISIBLE_CHARS..].iter().collect();
    format!("{}{tail}", "*".repeat(chars.len() - MASK_VISIBLE_CHARS))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn encrypt_then_decrypt_returns_original() {
        let cipher = ApiKeyCipher::from_secret("unit-test-secret");
        let sealed = cipher.encrypt("gsk_live_0123456789").unwrap();
        assert_ne!(sealed, "gsk_live_0123456789");
        assert_eq!(cipher.decrypt(&sealed).unwrap(), "gsk_live_0123456789");
    }

    #[test]
    fn nonces_differ_between_encryptions() {
        let cipher = ApiKeyCipher::from_secret("unit-test-secret");
        let a = cipher.encrypt("same").unwrap();
        let b = cipher.encrypt("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn wrong_secret_fails_to_decrypt() {
        let sealed = ApiKeyCipher::from_secret("alpha").encrypt("key").unwrap();
        let result = ApiKeyCipher::from_secret("bravo").decrypt(&sealed);
        assert_matches!(result, Err(CryptoError::Decrypt));
    }

    #[test]
    fn garbage_input_is_rejected() {
        let cipher = ApiKeyCipher::from_secret("alpha");
        assert_matches!(cipher.decrypt("not-hex"), Err(CryptoError::Encoding(_)));
        assert_matches!(cipher.decrypt("abcd"), Err(CryptoError::Decrypt));
    }

    #[test]
    fn mask_keeps_last_four() {
        assert_eq!(mask_api_key("AIzaSyExample1234"), "*************1234");
        assert_eq!(mask_api_key("abc"), "***");
    }
}
