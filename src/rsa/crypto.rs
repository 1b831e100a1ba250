use openssl::encrypt::{Decrypter, Encrypter};
use openssl::rsa::Padding;

use crate::engine::openssl_error;
use crate::error::EngineError;
use crate::key::{KeyUsage, check_usage};
use crate::params::OaepParams;
use crate::rsa::{RsaPrivateKey, RsaPublicKey};

// encrypts data, typically a symmetric key, for the holder of the private key
pub(crate) fn oaep_encrypt(key: &RsaPublicKey, data: &[u8], params: &OaepParams, usage: KeyUsage) -> Result<Vec<u8>, EngineError> {
    check_usage(key.usages(), usage)?;
    if data.len() > key.max_plain_text_len() {
        debug!("{} bytes exceed RSA-OAEP limit of {}", data.len(), key.max_plain_text_len());
        return Err(EngineError::DataTooLarge);
    }
    let digest = key.hash().message_digest();
    let mut encrypter = Encrypter::new(key.pkey()).map_err(openssl_error)?;
    encrypter.set_rsa_padding(Padding::PKCS1_OAEP).map_err(openssl_error)?;
    encrypter.set_rsa_oaep_md(digest).map_err(openssl_error)?;
    encrypter.set_rsa_mgf1_md(digest).map_err(openssl_error)?;
    if let Some(label) = &params.label {
        encrypter.set_rsa_oaep_label(label).map_err(openssl_error)?;
    }
    let len = encrypter.encrypt_len(data).map_err(openssl_error)?;
    let mut cipher_text: Vec<u8> = vec![0; len];
    let len = encrypter.encrypt(data, &mut cipher_text).map_err(openssl_error)?;
    cipher_text.truncate(len);
    Ok(cipher_text)
}

pub(crate) fn oaep_decrypt(key: &RsaPrivateKey, cipher_text: &[u8], params: &OaepParams, usage: KeyUsage) -> Result<Vec<u8>, EngineError> {
    check_usage(key.usages(), usage)?;
    let digest = key.hash().message_digest();
    let mut decrypter = Decrypter::new(key.pkey()).map_err(openssl_error)?;
    decrypter.set_rsa_padding(Padding::PKCS1_OAEP).map_err(openssl_error)?;
    decrypter.set_rsa_oaep_md(digest).map_err(openssl_error)?;
    decrypter.set_rsa_mgf1_md(digest).map_err(openssl_error)?;
    if let Some(label) = &params.label {
        decrypter.set_rsa_oaep_label(label).map_err(openssl_error)?;
    }
    let len = decrypter.decrypt_len(cipher_text).map_err(openssl_error)?;
    let mut plain_text: Vec<u8> = vec![0; len];
    let len = decrypter.decrypt(cipher_text, &mut plain_text)
        .map_err(|e| {
            debug!("Decryption error: {}", e);
            EngineError::Decryption
        })?;
    plain_text.truncate(len);
    Ok(plain_text)
}
