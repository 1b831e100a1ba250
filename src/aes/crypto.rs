use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_128_GCM, AES_256_GCM};

use crate::aes::AesKey;
use crate::codec::{concat, split_at};
use crate::engine::random_array;
use crate::error::{CryptoError, EngineError};
use crate::key::{KeyUsage, check_usage};
use crate::params::AesGcmParams;

/*
cipher text shape:
[ iv: [u8;12] | encrypted data: [u8;?] | tag: [u8;16] ]
the iv length is fixed for the protocol, it is not encoded anywhere
*/

// length of AES-GCM nonce
pub const IV_LEN: usize = 12;  // ring::aead::NONCE_LEN
// length to extend encrypted data for AES-GCM
pub const TAG_LEN: usize = 16;

fn aead_key(material: &[u8], params: &AesGcmParams) -> Result<LessSafeKey, EngineError> {
    if params.tag_length != TAG_LEN as u32 * 8 {
        return Err(EngineError::UnsupportedAlgorithm);
    }
    let algorithm = match material.len() {
        16 => &AES_128_GCM,
        32 => &AES_256_GCM,
        _ => return Err(EngineError::InvalidKey),
    };
    let key = UnboundKey::new(algorithm, material)
        .or(Err(EngineError::InvalidKey))?;
    Ok(LessSafeKey::new(key))
}

fn aad(params: &AesGcmParams) -> Aad<&[u8]> {
    Aad::from(params.additional_data.as_deref().unwrap_or_default())
}

pub(crate) fn raw_encrypt(key: &AesKey, data: &[u8], params: &AesGcmParams) -> Result<Vec<u8>, EngineError> {
    // NB: prefixes a fresh iv and extends data with tag
    check_usage(key.usages(), KeyUsage::Encrypt)?;
    let sealing_key = aead_key(key.material(), params)?;
    let iv: [u8; IV_LEN] = random_array()?;
    let mut cipher_text = data.to_vec();
    sealing_key.seal_in_place_append_tag(Nonce::assume_unique_for_key(iv), aad(params), &mut cipher_text)
        .or(Err(EngineError::Failure))?;
    Ok(concat(&iv, &cipher_text))
}

pub(crate) fn raw_decrypt(key: &AesKey, data: &[u8], params: &AesGcmParams) -> Result<Vec<u8>, CryptoError> {
    // NB: data must start with iv and end with tag
    check_usage(key.usages(), KeyUsage::Decrypt)?;
    let opening_key = aead_key(key.material(), params)?;
    let (iv, cipher_text) = split_at(data, IV_LEN)?;
    let nonce = Nonce::try_assume_unique_for_key(iv)
        .or(Err(EngineError::Failure))?;
    let mut plain_text = cipher_text.to_vec();
    let len = opening_key.open_in_place(nonce, aad(params), &mut plain_text)
        .or(Err(EngineError::Authentication))?
        .len();
    plain_text.truncate(len);
    Ok(plain_text)
}
