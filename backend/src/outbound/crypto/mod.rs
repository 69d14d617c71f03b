//! Cryptographic adapters: OTP sealing and session tokens.

mod aes_cipher;
mod jwt_tokens;

pub use aes_cipher::{AesGcmCipher, KEY_LEN};
pub use jwt_tokens::{JwtSessionTokens, TokenSettings};
