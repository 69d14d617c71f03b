//! Driven port for sealing short secrets such as login OTPs.
use async_trait::async_trait;
use zeroize::Zeroizing;

use super::define_port_error;

define_port_error! {
    /// Errors raised by secret cipher adapters.
    pub enum SecretCipherError {
        /// Sealing the plaintext failed.
        Encrypt { message: String } => "secret encryption failed: {message}",
        /// The ciphertext was malformed or failed authentication.
        Decrypt { message: String } => "secret decryption failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SecretCipher: Send + Sync {
    /// Seal `plaintext`, returning a base64 ciphertext safe to store.
    async fn encrypt(&self, plaintext: &[u8]) -> Result<String, SecretCipherError>;

    /// Open a ciphertext produced by [`SecretCipher::encrypt`].
    async fn decrypt(&self, ciphertext: &str) -> Result<Zeroizing<Vec<u8>>, SecretCipherError>;
}
