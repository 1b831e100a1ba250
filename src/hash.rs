use ring::digest;

use crate::codec::{buffer_to_base64, string_to_buffer};
use crate::engine;
use crate::error::CryptoError;
use crate::params::HashAlgorithm;

pub async fn digest(algorithm: HashAlgorithm, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let data = data.to_vec();
    engine::run("digest", move || {
        Ok(digest::digest(algorithm.digest_algorithm(), &data).as_ref().to_vec())
    }).await
}

pub async fn digest_string(algorithm: HashAlgorithm, text: &str) -> Result<String, CryptoError> {
    digest(algorithm, &string_to_buffer(text)).await
        .map(buffer_to_base64)
}

pub async fn sha1(data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    digest(HashAlgorithm::Sha1, data).await
}

pub async fn sha256(data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    digest(HashAlgorithm::Sha256, data).await
}

pub async fn sha384(data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    digest(HashAlgorithm::Sha384, data).await
}

pub async fn sha512(data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    digest(HashAlgorithm::Sha512, data).await
}

pub async fn sha1_string(text: &str) -> Result<String, CryptoError> {
    digest_string(HashAlgorithm::Sha1, text).await
}

pub async fn sha256_string(text: &str) -> Result<String, CryptoError> {
    digest_string(HashAlgorithm::Sha256, text).await
}

pub async fn sha384_string(text: &str) -> Result<String, CryptoError> {
    digest_string(HashAlgorithm::Sha384, text).await
}

pub async fn sha512_string(text: &str) -> Result<String, CryptoError> {
    digest_string(HashAlgorithm::Sha512, text).await
}
