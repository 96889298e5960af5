//! RC4 provider

use rc4::cipher::consts::{U10, U11, U12, U13, U14, U15, U16, U5, U6, U7, U8, U9};
use rc4::cipher::generic_array::ArrayLength;
use rc4::{KeyInit, Rc4, StreamCipher};

use crate::error::{PdfError, PdfResult};
use super::CryptoProvider;

/// RC4 with keys of 5 to 16 bytes. Encryption and decryption are the same
/// keystream XOR.
#[derive(Debug, Default)]
pub(crate) struct Rc4Provider;

fn apply<N>(key: &[u8], data: &mut [u8]) -> PdfResult<()>
where
    N: ArrayLength<u8>,
    Rc4<N>: KeyInit + StreamCipher,
{
    let mut cipher =
        Rc4::<N>::new_from_slice(key).map_err(|_| PdfError::InvalidKeyLength(key.len()))?;
    cipher.apply_keystream(data);
    Ok(())
}

fn process(data: &[u8], key: &[u8]) -> PdfResult<Vec<u8>> {
    let mut out = data.to_vec();
    match key.len() {
        5 => apply::<U5>(key, &mut out)?,
        6 => apply::<U6>(key, &mut out)?,
        7 => apply::<U7>(key, &mut out)?,
        8 => apply::<U8>(key, &mut out)?,
        9 => apply::<U9>(key, &mut out)?,
        10 => apply::<U10>(key, &mut out)?,
        11 => apply::<U11>(key, &mut out)?,
        12 => apply::<U12>(key, &mut out)?,
        13 => apply::<U13>(key, &mut out)?,
        14 => apply::<U14>(key, &mut out)?,
        15 => apply::<U15>(key, &mut out)?,
        16 => apply::<U16>(key, &mut out)?,
        n => return Err(PdfError::InvalidKeyLength(n)),
    }
    Ok(out)
}

impl CryptoProvider for Rc4Provider {
    fn encrypt(&self, data: &[u8], key: &[u8]) -> PdfResult<Vec<u8>> {
        process(data, key)
    }

    fn decrypt(&self, data: &[u8], key: &[u8]) -> PdfResult<Vec<u8>> {
        process(data, key)
    }
}
