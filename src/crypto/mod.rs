//! String encryption for serialized objects
//!
//! The serializer only needs the [`Crypt`] trait. [`CryptEngine`] implements
//! it for the standard security handler's RC4 and AES crypt filters, given a
//! file key that has already been authenticated elsewhere.

mod aes;
mod engine;
mod rc4;

pub use engine::{CryptEngine, CryptMethod};
use crate::error::PdfResult;

/// Per-object string encryption.
pub trait Crypt {
    /// Encrypt `data` as part of indirect object `num gen`.
    fn encrypt_bytes(&self, data: &[u8], num: i32, gen: i32) -> PdfResult<Vec<u8>>;
}

/// Cipher applied with an already derived object key.
pub(crate) trait CryptoProvider: Send + Sync {
    fn encrypt(&self, data: &[u8], key: &[u8]) -> PdfResult<Vec<u8>>;
    fn decrypt(&self, data: &[u8], key: &[u8]) -> PdfResult<Vec<u8>>;
}
