use serde::{Deserialize, Serialize};

use crate::aes::{AesKey, export_key_base64};
use crate::codec::{base64_to_buffer, buffer_to_base64};
use crate::engine;
use crate::error::{CryptoError, EngineError};
use crate::params::KdfParams;

pub const SALT_LEN: usize = 16;
pub const PBKDF2_ITERATIONS: u32 = 250_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Salt {
    Bytes(Vec<u8>),
    Base64(String),
}

impl Salt {
    fn into_bytes(self) -> Result<Vec<u8>, CryptoError> {
        match self {
            Salt::Bytes(salt) => Ok(salt),
            Salt::Base64(salt) => Ok(base64_to_buffer(salt)?),
        }
    }
}

impl From<Vec<u8>> for Salt {
    fn from(salt: Vec<u8>) -> Self {
        Salt::Bytes(salt)
    }
}

impl From<&[u8]> for Salt {
    fn from(salt: &[u8]) -> Self {
        Salt::Bytes(salt.to_vec())
    }
}

impl From<String> for Salt {
    fn from(salt: String) -> Self {
        Salt::Base64(salt)
    }
}

impl From<&str> for Salt {
    fn from(salt: &str) -> Self {
        Salt::Base64(salt.to_owned())
    }
}

#[derive(Debug, Clone)]
pub struct DerivedKey {
    pub key: AesKey,
    pub salt: Vec<u8>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct DerivedKeyBase64 {
    pub key: String,
    pub salt: String,
}

pub fn create_salt() -> Result<Vec<u8>, CryptoError> {
    Ok(engine::random_bytes(SALT_LEN)?)
}

#[inline]
pub fn salt_to_base64(salt: &[u8]) -> String {
    buffer_to_base64(salt)
}

fn raw_derive(password: &[u8], salt: &[u8], params: &KdfParams) -> Result<AesKey, EngineError> {
    let iterations = params.iterations()?;
    let mut material = vec![0u8; params.key.key_len()?];
    ring::pbkdf2::derive(params.hash.pbkdf2_algorithm(), iterations, salt, password, &mut material);
    // derived keys stay extractable so they can be exported or sealed
    AesKey::new(material, true)
}

pub async fn derive_aes_key_from_password(password: &str, salt: Option<Salt>, params: &KdfParams) -> Result<DerivedKey, CryptoError> {
    let salt = match salt {
        Some(salt) => salt.into_bytes()?,
        None => create_salt()?,
    };
    let password = password.as_bytes().to_vec();
    let params = *params;
    engine::run("PBKDF2 derive", move || {
        let key = raw_derive(&password, &salt, &params)?;
        Ok(DerivedKey { key, salt })
    }).await
}

pub async fn derive_aes_key_from_password_base64(password: &str, salt: Option<Salt>, params: &KdfParams) -> Result<DerivedKeyBase64, CryptoError> {
    let derived = derive_aes_key_from_password(password, salt, params).await?;
    let key = export_key_base64(&derived.key).await?;
    Ok(DerivedKeyBase64 { key, salt: salt_to_base64(&derived.salt) })
}
