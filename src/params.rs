use std::fmt::{Display, Formatter, Result as FormatResult};
use std::num::NonZeroU32;
use std::str::FromStr;

use openssl::hash::MessageDigest;
use ring::{digest, pbkdf2};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    #[serde(rename = "SHA-1")]
    Sha1,
    #[serde(rename = "SHA-256")]
    Sha256,
    #[serde(rename = "SHA-384")]
    Sha384,
    #[serde(rename = "SHA-512")]
    Sha512,
}

impl HashAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha1 => "SHA-1",
            HashAlgorithm::Sha256 => "SHA-256",
            HashAlgorithm::Sha384 => "SHA-384",
            HashAlgorithm::Sha512 => "SHA-512",
        }
    }

    pub fn output_len(&self) -> usize {
        self.digest_algorithm().output_len()
    }

    pub(crate) fn digest_algorithm(&self) -> &'static digest::Algorithm {
        match self {
            HashAlgorithm::Sha1 => &digest::SHA1_FOR_LEGACY_USE_ONLY,
            HashAlgorithm::Sha256 => &digest::SHA256,
            HashAlgorithm::Sha384 => &digest::SHA384,
            HashAlgorithm::Sha512 => &digest::SHA512,
        }
    }

    pub(crate) fn pbkdf2_algorithm(&self) -> pbkdf2::Algorithm {
        match self {
            HashAlgorithm::Sha1 => pbkdf2::PBKDF2_HMAC_SHA1,
            HashAlgorithm::Sha256 => pbkdf2::PBKDF2_HMAC_SHA256,
            HashAlgorithm::Sha384 => pbkdf2::PBKDF2_HMAC_SHA384,
            HashAlgorithm::Sha512 => pbkdf2::PBKDF2_HMAC_SHA512,
        }
    }

    pub(crate) fn message_digest(&self) -> MessageDigest {
        match self {
            HashAlgorithm::Sha1 => MessageDigest::sha1(),
            HashAlgorithm::Sha256 => MessageDigest::sha256(),
            HashAlgorithm::Sha384 => MessageDigest::sha384(),
            HashAlgorithm::Sha512 => MessageDigest::sha512(),
        }
    }
}

impl Display for HashAlgorithm {
    fn fmt(&self, f: &mut Formatter) -> FormatResult {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = EngineError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_uppercase().as_str() {
            "SHA-1" | "SHA1" => Ok(HashAlgorithm::Sha1),
            "SHA-256" | "SHA256" => Ok(HashAlgorithm::Sha256),
            "SHA-384" | "SHA384" => Ok(HashAlgorithm::Sha384),
            "SHA-512" | "SHA512" => Ok(HashAlgorithm::Sha512),
            _ => Err(EngineError::UnsupportedAlgorithm),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AesKeyParams {
    pub length: u32,
}

impl AesKeyParams {
    pub(crate) fn key_len(&self) -> Result<usize, EngineError> {
        match self.length {
            128 | 256 => Ok(self.length as usize / 8),
            _ => Err(EngineError::UnsupportedAlgorithm),
        }
    }
}

impl Default for AesKeyParams {
    fn default() -> Self {
        AesKeyParams { length: 256 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AesGcmParams {
    pub tag_length: u32,
    pub additional_data: Option<Vec<u8>>,
}

impl Default for AesGcmParams {
    fn default() -> Self {
        AesGcmParams { tag_length: 128, additional_data: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RsaKeyParams {
    pub modulus_length: u32,
    pub public_exponent: u32,
    pub hash: HashAlgorithm,
}

impl Default for RsaKeyParams {
    fn default() -> Self {
        RsaKeyParams {
            modulus_length: 4096,
            public_exponent: 65537,
            hash: HashAlgorithm::Sha256,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RsaImportParams {
    pub hash: HashAlgorithm,
}

impl Default for RsaImportParams {
    fn default() -> Self {
        RsaImportParams { hash: HashAlgorithm::Sha256 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OaepParams {
    pub label: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    pub iterations: u32,
    pub hash: HashAlgorithm,
    pub key: AesKeyParams,
}

impl KdfParams {
    pub(crate) fn iterations(&self) -> Result<NonZeroU32, EngineError> {
        NonZeroU32::new(self.iterations).ok_or(EngineError::UnsupportedAlgorithm)
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        KdfParams {
            iterations: crate::kdf::PBKDF2_ITERATIONS,
            hash: HashAlgorithm::Sha256,
            key: AesKeyParams::default(),
        }
    }
}
