use std::fmt::{Debug, Formatter, Result as FormatResult};

use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::codec::{base64_to_buffer, buffer_to_base64, buffer_to_string, string_to_buffer};
use crate::engine;
use crate::error::{CryptoError, EngineError};
use crate::key::{ImportKey, Key, KeyUsage, restrict_usages};
use crate::params::{AesGcmParams, AesKeyParams};

mod crypto;

pub use crypto::{IV_LEN, TAG_LEN};
use crypto::{raw_decrypt, raw_encrypt};

const AES_USAGES: &[KeyUsage] = &[KeyUsage::Encrypt, KeyUsage::Decrypt];

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
struct KeyMaterial(Vec<u8>);

#[derive(Clone)]
pub struct AesKey {
    material: KeyMaterial,
    extractable: bool,
    usages: Vec<KeyUsage>,
}

impl AesKey {
    pub(crate) fn new(material: Vec<u8>, extractable: bool) -> Result<AesKey, EngineError> {
        let material = KeyMaterial(material);
        match material.0.len() {
            16 | 32 => Ok(AesKey { material, extractable, usages: AES_USAGES.to_vec() }),
            24 => Err(EngineError::UnsupportedAlgorithm),
            _ => Err(EngineError::InvalidKey),
        }
    }

    /// Key length in bits.
    #[inline]
    pub fn length(&self) -> u32 {
        self.material.0.len() as u32 * 8
    }

    #[inline]
    pub fn is_extractable(&self) -> bool {
        self.extractable
    }

    #[inline]
    pub fn usages(&self) -> &[KeyUsage] {
        &self.usages
    }

    pub fn with_usages(mut self, usages: &[KeyUsage]) -> Result<AesKey, EngineError> {
        self.usages = restrict_usages(AES_USAGES, usages)?;
        Ok(self)
    }

    pub fn export_raw(&self) -> Result<Vec<u8>, EngineError> {
        self.export_secret().map(|material| material.to_vec())
    }

    pub(crate) fn export_secret(&self) -> Result<Zeroizing<Vec<u8>>, EngineError> {
        if !self.extractable {
            return Err(EngineError::NotExtractable);
        }
        Ok(Zeroizing::new(self.material.0.clone()))
    }

    #[inline]
    pub(crate) fn material(&self) -> &[u8] {
        &self.material.0
    }
}

impl ImportKey for AesKey {
    type Params = ();

    fn import(encoded: &[u8], _params: &()) -> Result<Self, CryptoError> {
        // encoded key material is already known to the caller
        Ok(AesKey::new(encoded.to_vec(), true)?)
    }
}

key_handle!(AesKey);

impl Debug for AesKey {
    fn fmt(&self, f: &mut Formatter) -> FormatResult {
        write!(f, "AesKey(AES-GCM {})", self.length())
    }
}

pub async fn generate_key(params: AesKeyParams, extractable: bool) -> Result<AesKey, CryptoError> {
    engine::run("generate AES key", move || {
        let material = engine::random_bytes(params.key_len()?)?;
        Ok(AesKey::new(material, extractable)?)
    }).await
}

pub async fn generate_key_base64(params: AesKeyParams) -> Result<String, CryptoError> {
    let key = generate_key(params, true).await?;
    export_key_base64(&key).await
}

pub async fn export_key_raw(key: &AesKey) -> Result<Vec<u8>, CryptoError> {
    Ok(key.export_raw()?)
}

pub async fn export_key_base64(key: &AesKey) -> Result<String, CryptoError> {
    export_key_raw(key).await
        .map(buffer_to_base64)
}

pub async fn import_key<K>(key: K) -> Result<AesKey, CryptoError> where K: Into<Key<AesKey>> {
    key.into().resolve()
}

pub async fn encrypt<K>(key: K, data: &[u8], params: &AesGcmParams) -> Result<Vec<u8>, CryptoError> where K: Into<Key<AesKey>> {
    let key = key.into().resolve()?;
    let data = data.to_vec();
    let params = params.clone();
    engine::run("AES-GCM encrypt", move || Ok(raw_encrypt(&key, &data, &params)?)).await
}

pub async fn decrypt<K>(key: K, data: &[u8], params: &AesGcmParams) -> Result<Vec<u8>, CryptoError> where K: Into<Key<AesKey>> {
    let key = key.into().resolve()?;
    let data = data.to_vec();
    let params = params.clone();
    engine::run("AES-GCM decrypt", move || raw_decrypt(&key, &data, &params)).await
}

pub async fn encrypt_string<K>(key: K, text: &str, params: &AesGcmParams) -> Result<String, CryptoError> where K: Into<Key<AesKey>> {
    encrypt(key, &string_to_buffer(text), params).await
        .map(buffer_to_base64)
}

pub async fn decrypt_string<K>(key: K, encoded: &str, params: &AesGcmParams) -> Result<String, CryptoError> where K: Into<Key<AesKey>> {
    let data = base64_to_buffer(encoded)?;
    let data = decrypt(key, &data, params).await?;
    Ok(buffer_to_string(data)?)
}


#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::CodecError;

    #[tokio::test]
    async fn hello_world() {
        let key = generate_key(AesKeyParams::default(), true).await.unwrap();
        assert_eq!(key.length(), 256);
        let params = AesGcmParams::default();
        let cipher_text = encrypt_string(&key, "hello world", &params).await.unwrap();
        assert_ne!(cipher_text, "hello world");
        assert_eq!(decrypt_string(&key, &cipher_text, &params).await, Ok(String::from("hello world")));
    }

    #[tokio::test]
    async fn round_trip() {
        let params = AesGcmParams::default();
        for length in &[128, 256] {
            let key = generate_key(AesKeyParams { length: *length }, true).await.unwrap();
            assert_eq!(key.length(), *length);
            for plain_text in &[&b""[..], &b"x"[..], &[7u8; 4096][..]] {
                let cipher_text = encrypt(&key, *plain_text, &params).await.unwrap();
                assert_eq!(cipher_text.len(), IV_LEN + plain_text.len() + TAG_LEN);
                assert_eq!(decrypt(&key, &cipher_text, &params).await.unwrap(), plain_text.to_vec());
            }
        }
    }

    #[tokio::test]
    async fn key_conversion() {
        let key = generate_key(AesKeyParams::default(), true).await.unwrap();
        let encoded = export_key_base64(&key).await.unwrap();
        assert_eq!(base64_to_buffer(&encoded).unwrap().len(), 32);
        let imported = import_key(encoded.as_str()).await.unwrap();
        assert_eq!(imported.export_raw(), key.export_raw());

        let params = AesGcmParams::default();
        let cipher_text = encrypt_string(&key, "Testing rusty envelope $!@", &params).await.unwrap();
        assert_eq!(decrypt_string(encoded, &cipher_text, &params).await, Ok(String::from("Testing rusty envelope $!@")));

        let raw = export_key_raw(&key).await.unwrap();
        let cipher_text = encrypt(raw, b"raw key", &params).await.unwrap();
        assert_eq!(decrypt(&key, &cipher_text, &params).await.unwrap(), b"raw key");

        let key = generate_key_base64(AesKeyParams { length: 128 }).await.unwrap();
        assert_eq!(import_key(key).await.map(|key| key.length()), Ok(128));
    }

    #[tokio::test]
    async fn invalid_keys() {
        assert_eq!(generate_key(AesKeyParams { length: 192 }, true).await.err(), Some(CryptoError::Engine(EngineError::UnsupportedAlgorithm)));
        assert_eq!(generate_key(AesKeyParams { length: 512 }, true).await.err(), Some(CryptoError::Engine(EngineError::UnsupportedAlgorithm)));
        assert_eq!(import_key(vec![0u8; 24]).await.err(), Some(CryptoError::Engine(EngineError::UnsupportedAlgorithm)));
        assert_eq!(import_key(vec![0u8; 31]).await.err(), Some(CryptoError::Engine(EngineError::InvalidKey)));
        assert_eq!(import_key("!!").await.err(), Some(CryptoError::Codec(CodecError::InvalidBase64)));
    }

    #[tokio::test]
    async fn non_extractable() {
        let key = generate_key(AesKeyParams::default(), false).await.unwrap();
        assert!(!key.is_extractable());
        assert_eq!(export_key_raw(&key).await, Err(CryptoError::Engine(EngineError::NotExtractable)));
        assert_eq!(export_key_base64(&key).await, Err(CryptoError::Engine(EngineError::NotExtractable)));
        let params = AesGcmParams::default();
        let cipher_text = encrypt(&key, b"still usable", &params).await.unwrap();
        assert_eq!(decrypt(&key, &cipher_text, &params).await.unwrap(), b"still usable");
        assert_eq!(format!("{:?}", key), "AesKey(AES-GCM 256)");
    }

    #[tokio::test]
    async fn tampering() {
        let key = generate_key(AesKeyParams::default(), true).await.unwrap();
        let params = AesGcmParams::default();
        let mut cipher_text = encrypt(&key, b"hello world", &params).await.unwrap();
        cipher_text[0] ^= 0x80;
        assert_eq!(decrypt(&key, &cipher_text, &params).await, Err(CryptoError::Engine(EngineError::Authentication)));
        assert_eq!(decrypt_string(&key, "not base64", &params).await, Err(CryptoError::Codec(CodecError::InvalidBase64)));
    }

    #[tokio::test]
    async fn restricted_usages() {
        let params = AesGcmParams::default();
        let key = generate_key(AesKeyParams::default(), true).await.unwrap();
        let cipher_text = encrypt(&key, b"encrypt only", &params).await.unwrap();

        let sealer = key.clone().with_usages(&[KeyUsage::Encrypt]).unwrap();
        assert_eq!(sealer.usages(), &[KeyUsage::Encrypt]);
        assert!(encrypt(&sealer, b"allowed", &params).await.is_ok());
        assert_eq!(decrypt(&sealer, &cipher_text, &params).await, Err(CryptoError::Engine(EngineError::KeyUsage)));

        let opener = key.clone().with_usages(&[KeyUsage::Decrypt]).unwrap();
        assert_eq!(decrypt(&opener, &cipher_text, &params).await.unwrap(), b"encrypt only");
        assert_eq!(encrypt(&opener, b"denied", &params).await, Err(CryptoError::Engine(EngineError::KeyUsage)));

        assert_eq!(key.clone().with_usages(&[KeyUsage::WrapKey]).err(), Some(EngineError::KeyUsage));
        assert_eq!(key.with_usages(&[]).err(), Some(EngineError::KeyUsage));
    }

    #[tokio::test]
    async fn secret_export() {
        let key = generate_key(AesKeyParams { length: 128 }, true).await.unwrap();
        let secret = key.export_secret().unwrap();
        assert_eq!(secret.len(), 16);
        assert_eq!(Ok(secret.to_vec()), key.export_raw());
        let hidden = generate_key(AesKeyParams::default(), false).await.unwrap();
        assert_eq!(hidden.export_secret().err(), Some(EngineError::NotExtractable));
    }

    #[test]
    fn requires_runtime() {
        let result = futures::executor::block_on(generate_key(AesKeyParams::default(), true));
        assert_eq!(result.err(), Some(CryptoError::Engine(EngineError::NoRuntime)));
    }
}
