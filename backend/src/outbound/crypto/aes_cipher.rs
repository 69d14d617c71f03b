//! AES-256-GCM implementation of [`SecretCipher`].
//!
//! Ciphertexts are `base64(nonce || sealed)` with a fresh 96-bit nonce per
//! call, so sealing the same code twice never yields the same string.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use zeroize::Zeroizing;

use crate::domain::ports::{SecretCipher, SecretCipherError};

/// Key length in bytes.
pub const KEY_LEN: usize = 32;

const NONCE_LEN: usize = 12;

#[derive(Clone)]
pub struct AesGcmCipher {
    cipher: Aes256Gcm,
}

impl AesGcmCipher {
    pub fn new(key: &Zeroizing<[u8; KEY_LEN]>) -> Self {
        Self {
            cipher: Aes256Gcm::new(&(**key).into()),
        }
    }
}

impl std::fmt::Debug for AesGcmCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AesGcmCipher(..)")
    }
}

#[async_trait]
impl SecretCipher for AesGcmCipher {
    async fn encrypt(&self, plaintext: &[u8]) -> Result<String, SecretCipherError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let sealed = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|err| SecretCipherError::encrypt(err.to_string()))?;
        let mut framed = Vec::with_capacity(NONCE_LEN + sealed.len());
        framed.extend_from_slice(&nonce);
        framed.extend_from_slice(&sealed);
        Ok(STANDARD.encode(framed))
    }

    async fn decrypt(&self, ciphertext: &str) -> Result<Zeroizing<Vec<u8>>, SecretCipherError> {
        let framed = STANDARD
            .decode(ciphertext)
            .map_err(|err| SecretCipherError::decrypt(err.to_string()))?;
        let (nonce, sealed) = framed
            .split_at_checked(NONCE_LEN)
            .ok_or_else(|| SecretCipherError::decrypt("ciphertext shorter than nonce"))?;
        self.cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map(Zeroizing::new)
            .map_err(|_| SecretCipherError::decrypt("authentication failed"))
    }
}
