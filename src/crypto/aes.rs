//! AES-CBC provider
//!
//! Ciphertext is the 16-byte IV followed by the PKCS#7 padded data, as the
//! AESV2 and AESV3 crypt filters store it.

use aes::cipher::{generic_array::GenericArray, BlockDecrypt, BlockEncrypt, KeyInit};
use aes::{Aes128, Aes256};
use rand::{thread_rng, RngCore};

use crate::error::{PdfError, PdfResult};
use super::CryptoProvider;

const BLOCK: usize = 16;

enum AesCipher {
    Aes128(Aes128),
    Aes256(Aes256),
}

impl AesCipher {
    fn new(key: &[u8]) -> PdfResult<Self> {
        match key.len() {
            16 => Ok(Self::Aes128(Aes128::new_from_slice(key)?)),
            32 => Ok(Self::Aes256(Aes256::new_from_slice(key)?)),
            n => Err(PdfError::InvalidKeyLength(n)),
        }
    }

    fn encrypt_block(&self, block: &mut [u8]) {
        let block = GenericArray::from_mut_slice(block);
        match self {
            Self::Aes128(c) => c.encrypt_block(block),
            Self::Aes256(c) => c.encrypt_block(block),
        }
    }

    fn decrypt_block(&self, block: &mut [u8]) {
        let block = GenericArray::from_mut_slice(block);
        match self {
            Self::Aes128(c) => c.decrypt_block(block),
            Self::Aes256(c) => c.decrypt_block(block),
        }
    }
}

/// AES in CBC mode with a fresh random IV per string.
pub(crate) struct AesProvider {
    key_length: usize,
}

impl AesProvider {
    /// Create a provider for a 16 or 32 byte key.
    pub fn new(key_length: usize) -> Self {
        Self { key_length }
    }

    fn cipher(&self, key: &[u8]) -> PdfResult<AesCipher> {
        if key.len() != self.key_length {
            return Err(PdfError::InvalidKeyLength(key.len()));
        }
        AesCipher::new(key)
    }
}

impl CryptoProvider for AesProvider {
    fn encrypt(&self, data: &[u8], key: &[u8]) -> PdfResult<Vec<u8>> {
        let cipher = self.cipher(key)?;

        let pad = BLOCK - data.len() % BLOCK;
        let mut out = vec![0u8; BLOCK];
        thread_rng().fill_bytes(&mut out);
        out.extend_from_slice(data);
        out.extend(std::iter::repeat(pad as u8).take(pad));

        for start in (BLOCK..out.len()).step_by(BLOCK) {
            let (prev, rest) = out.split_at_mut(start);
            let prev = &prev[start - BLOCK..];
            let block = &mut rest[..BLOCK];
            for (b, p) in block.iter_mut().zip(prev) {
                *b ^= p;
            }
            cipher.encrypt_block(block);
        }
        Ok(out)
    }

    fn decrypt(&self, data: &[u8], key: &[u8]) -> PdfResult<Vec<u8>> {
        let cipher = self.cipher(key)?;
        if data.len() < 2 * BLOCK || data.len() % BLOCK != 0 {
            return Err(PdfError::invalid_length("AES decryption"));
        }

        let mut out = Vec::with_capacity(data.len() - BLOCK);
        for pair in data.windows(2 * BLOCK).step_by(BLOCK) {
            let (prev, block) = pair.split_at(BLOCK);
            let mut plain = [0u8; BLOCK];
            plain.copy_from_slice(block);
            cipher.decrypt_block(&mut plain);
            for (b, p) in plain.iter_mut().zip(prev) {
                *b ^= p;
            }
            out.extend_from_slice(&plain);
        }

        let pad = usize::from(out.last().copied().unwrap_or(0));
        if pad == 0 || pad > BLOCK || out[out.len() - pad..].iter().any(|&b| usize::from(b) != pad) {
            return Err(PdfError::crypt("invalid AES padding"));
        }
        out.truncate(out.len() - pad);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_aes_128_round_trip() -> PdfResult<()> {
        let provider = AesProvider::new(16);
        let key = [1u8; 16];
        let data = b"Test AES-128 encryption with CBC mode".to_vec();

        let encrypted = provider.encrypt(&data, &key)?;
        assert_eq!(encrypted.len(), 16 + 48);
        assert_ne!(&encrypted[16..16 + data.len()], &data[..]);
        assert_eq!(provider.decrypt(&encrypted, &key)?, data);
        Ok(())
    }

    #[test]
    fn test_aes_256_round_trip() -> PdfResult<()> {
        let provider = AesProvider::new(32);
        let key = [9u8; 32];
        for len in [0, 1, 15, 16, 17] {
            let data = vec![0x5Au8; len];
            let encrypted = provider.encrypt(&data, &key)?;
            assert_eq!(encrypted.len() % 16, 0);
            assert_eq!(provider.decrypt(&encrypted, &key)?, data);
        }
        Ok(())
    }

    #[test]
    fn test_fresh_iv_per_call() -> PdfResult<()> {
        let provider = AesProvider::new(16);
        let key = [3u8; 16];
        let a = provider.encrypt(b"same", &key)?;
        let b = provider.encrypt(b"same", &key)?;
        assert_ne!(a, b);
        Ok(())
    }

    #[test]
    fn test_invalid_key_length() {
        let provider = AesProvider::new(16);
        assert!(matches!(
            provider.encrypt(b"data", &[1u8; 24]),
            Err(PdfError::InvalidKeyLength(24))
        ));
    }

    #[test]
    fn test_invalid_data_length() {
        let provider = AesProvider::new(16);
        let key = [1u8; 16];
        assert!(matches!(
            provider.decrypt(&[0u8; 8], &key),
            Err(PdfError::InvalidDataLength { .. })
        ));
        assert!(matches!(
            provider.decrypt(&[0u8; 40], &key),
            Err(PdfError::InvalidDataLength { .. })
        ));
    }
}
