//! Per-object key derivation and cipher dispatch

use log::trace;
use zeroize::Zeroizing;

use crate::error::{PdfError, PdfResult};
use super::aes::AesProvider;
use super::rc4::Rc4Provider;
use super::{Crypt, CryptoProvider};

/// Crypt filter method of the standard security handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CryptMethod {
    /// Strings are written unchanged.
    Identity,
    Rc4,
    AesV2,
    AesV3,
}

impl CryptMethod {
    /// Name of the method as it appears in a `/CFM` entry.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Identity => "Identity",
            Self::Rc4 => "V2",
            Self::AesV2 => "AESV2",
            Self::AesV3 => "AESV3",
        }
    }
}

/// String encryption with an authenticated file key.
pub struct CryptEngine {
    method: CryptMethod,
    file_key: Zeroizing<Vec<u8>>,
    provider: Option<Box<dyn CryptoProvider>>,
}

impl CryptEngine {
    /// Build an engine for `method`. RC4 takes 5 to 16 byte keys, AESV2 16
    /// and AESV3 32.
    pub fn new(method: CryptMethod, file_key: &[u8]) -> PdfResult<Self> {
        let valid = match method {
            CryptMethod::Identity => true,
            CryptMethod::Rc4 => (5..=16).contains(&file_key.len()),
            CryptMethod::AesV2 => file_key.len() == 16,
            CryptMethod::AesV3 => file_key.len() == 32,
        };
        if !valid {
            return Err(PdfError::InvalidKeyLength(file_key.len()));
        }

        let provider: Option<Box<dyn CryptoProvider>> = match method {
            CryptMethod::Identity => None,
            CryptMethod::Rc4 => Some(Box::new(Rc4Provider)),
            CryptMethod::AesV2 => Some(Box::new(AesProvider::new(16))),
            CryptMethod::AesV3 => Some(Box::new(AesProvider::new(32))),
        };

        Ok(Self {
            method,
            file_key: Zeroizing::new(file_key.to_vec()),
            provider,
        })
    }

    /// The configured method.
    pub fn method(&self) -> CryptMethod {
        self.method
    }

    /// Key for the strings of object `num gen`.
    ///
    /// MD5 over the file key, the low three bytes of the object number and
    /// the low two bytes of the generation (little-endian), plus `sAlT` for
    /// AESV2. The digest is cut to the file key length + 5, at most 16.
    /// AESV3 uses the file key unchanged.
    pub(crate) fn object_key(&self, num: i32, gen: i32) -> Zeroizing<Vec<u8>> {
        if self.method == CryptMethod::AesV3 {
            return self.file_key.clone();
        }

        let mut input = Zeroizing::new(Vec::with_capacity(self.file_key.len() + 9));
        input.extend_from_slice(&self.file_key);
        input.extend_from_slice(&num.to_le_bytes()[..3]);
        input.extend_from_slice(&gen.to_le_bytes()[..2]);
        if self.method == CryptMethod::AesV2 {
            input.extend_from_slice(b"sAlT");
        }

        let digest = md5::compute(&input[..]);
        let len = (self.file_key.len() + 5).min(16);
        Zeroizing::new(digest.0[..len].to_vec())
    }

    /// Reverse [`Crypt::encrypt_bytes`] for a string of object `num gen`.
    pub fn decrypt_bytes(&self, data: &[u8], num: i32, gen: i32) -> PdfResult<Vec<u8>> {
        match &self.provider {
            None => Ok(data.to_vec()),
            Some(provider) => {
                let key = self.object_key(num, gen);
                provider.decrypt(data, &key)
            }
        }
    }
}

impl Crypt for CryptEngine {
    fn encrypt_bytes(&self, data: &[u8], num: i32, gen: i32) -> PdfResult<Vec<u8>> {
        match &self.provider {
            None => Ok(data.to_vec()),
            Some(provider) => {
                trace!("{} encrypting {} bytes for {} {}", self.method.as_str(), data.len(), num, gen);
                let key = self.object_key(num, gen);
                provider.encrypt(data, &key)
            }
        }
    }
}

impl std::fmt::Debug for CryptEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptEngine")
            .field("method", &self.method)
            .field("key_length", &self.file_key.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(CryptMethod::Rc4, 5, 10)]
    #[case(CryptMethod::Rc4, 16, 16)]
    #[case(CryptMethod::AesV2, 16, 16)]
    #[case(CryptMethod::AesV3, 32, 32)]
    fn test_object_key_length(
        #[case] method: CryptMethod,
        #[case] file_key_len: usize,
        #[case] expected: usize,
    ) -> PdfResult<()> {
        let engine = CryptEngine::new(method, &vec![0x42; file_key_len])?;
        assert_eq!(engine.object_key(1, 0).len(), expected);
        Ok(())
    }

    #[test_log::test]
    fn test_object_key_varies_per_object() -> PdfResult<()> {
        let engine = CryptEngine::new(CryptMethod::Rc4, b"12345")?;
        let a = engine.object_key(1, 0);
        let b = engine.object_key(2, 0);
        let c = engine.object_key(1, 1);
        assert_ne!(*a, *b);
        assert_ne!(*a, *c);
        assert_eq!(*a, *engine.object_key(1, 0));
        Ok(())
    }

    #[test_log::test]
    fn test_object_key_matches_md5() -> PdfResult<()> {
        let engine = CryptEngine::new(CryptMethod::AesV2, &[0u8; 16])?;
        let mut input = vec![0u8; 16];
        input.extend_from_slice(&[7, 0, 0, 2, 0]);
        input.extend_from_slice(b"sAlT");
        assert_eq!(&engine.object_key(7, 2)[..], &md5::compute(&input).0[..]);
        Ok(())
    }

    #[rstest]
    #[case(CryptMethod::Rc4, 16)]
    #[case(CryptMethod::AesV2, 16)]
    #[case(CryptMethod::AesV3, 32)]
    fn test_round_trip(#[case] method: CryptMethod, #[case] key_len: usize) -> PdfResult<()> {
        let engine = CryptEngine::new(method, &vec![0x17; key_len])?;
        let encrypted = engine.encrypt_bytes(b"Hello", 12, 0)?;
        assert_ne!(encrypted, b"Hello");
        assert_eq!(engine.decrypt_bytes(&encrypted, 12, 0)?, b"Hello");
        Ok(())
    }

    #[test_log::test]
    fn test_identity_passes_through() -> PdfResult<()> {
        let engine = CryptEngine::new(CryptMethod::Identity, &[])?;
        assert_eq!(engine.encrypt_bytes(b"abc", 1, 0)?, b"abc");
        Ok(())
    }

    #[test_log::test]
    fn test_rejects_bad_key_length() {
        assert!(CryptEngine::new(CryptMethod::Rc4, &[0; 4]).is_err());
        assert!(CryptEngine::new(CryptMethod::AesV2, &[0; 32]).is_err());
        assert!(CryptEngine::new(CryptMethod::AesV3, &[0; 16]).is_err());
    }
}
