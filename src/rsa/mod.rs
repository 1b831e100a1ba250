use std::fmt::{Debug, Formatter, Result as FormatResult};

use openssl::bn::BigNum;
use openssl::pkey::{Id, PKey, Private, Public};
use openssl::rsa::Rsa;
use serde::{Deserialize, Serialize};

use crate::codec::{base64_to_buffer, buffer_to_base64, buffer_to_string, string_to_buffer};
use crate::engine::{self, openssl_error};
use crate::error::{CryptoError, EngineError};
use crate::key::{ImportKey, Key, KeyUsage, restrict_usages};
use crate::params::{HashAlgorithm, OaepParams, RsaImportParams, RsaKeyParams};

mod crypto;

pub(crate) use crypto::{oaep_decrypt, oaep_encrypt};

const PUBLIC_USAGES: &[KeyUsage] = &[KeyUsage::Encrypt, KeyUsage::WrapKey];
const PRIVATE_USAGES: &[KeyUsage] = &[KeyUsage::Decrypt, KeyUsage::UnwrapKey];

const MIN_MODULUS_LENGTH: u32 = 1024;
const MAX_MODULUS_LENGTH: u32 = 16384;

#[derive(Clone)]
pub struct RsaPublicKey {
    key: PKey<Public>,
    hash: HashAlgorithm,
    usages: Vec<KeyUsage>,
}

#[derive(Clone)]
pub struct RsaPrivateKey {
    key: PKey<Private>,
    hash: HashAlgorithm,
    extractable: bool,
    usages: Vec<KeyUsage>,
}

#[derive(Clone, Debug)]
pub struct RsaKeyPair {
    pub public_key: RsaPublicKey,
    pub private_key: RsaPrivateKey,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RsaKeyPairBase64 {
    pub public: String,
    pub private: String,
}

impl RsaPublicKey {
    #[inline]
    pub fn modulus_length(&self) -> u32 {
        self.key.bits()
    }

    #[inline]
    pub fn hash(&self) -> HashAlgorithm {
        self.hash
    }

    #[inline]
    pub fn usages(&self) -> &[KeyUsage] {
        &self.usages
    }

    pub fn with_usages(mut self, usages: &[KeyUsage]) -> Result<RsaPublicKey, EngineError> {
        self.usages = restrict_usages(PUBLIC_USAGES, usages)?;
        Ok(self)
    }

    pub fn max_plain_text_len(&self) -> usize {
        (self.key.size() as usize).saturating_sub(2 * self.hash.output_len() + 2)
    }

    pub fn export_spki(&self) -> Result<Vec<u8>, EngineError> {
        self.key.public_key_to_der().map_err(openssl_error)
    }

    #[inline]
    pub(crate) fn pkey(&self) -> &PKey<Public> {
        &self.key
    }
}

impl RsaPrivateKey {
    #[inline]
    pub fn modulus_length(&self) -> u32 {
        self.key.bits()
    }

    #[inline]
    pub fn hash(&self) -> HashAlgorithm {
        self.hash
    }

    #[inline]
    pub fn is_extractable(&self) -> bool {
        self.extractable
    }

    #[inline]
    pub fn usages(&self) -> &[KeyUsage] {
        &self.usages
    }

    pub fn with_usages(mut self, usages: &[KeyUsage]) -> Result<RsaPrivateKey, EngineError> {
        self.usages = restrict_usages(PRIVATE_USAGES, usages)?;
        Ok(self)
    }

    pub fn export_pkcs8(&self) -> Result<Vec<u8>, EngineError> {
        if !self.extractable {
            return Err(EngineError::NotExtractable);
        }
        self.key.private_key_to_pkcs8().map_err(openssl_error)
    }

    #[inline]
    pub(crate) fn pkey(&self) -> &PKey<Private> {
        &self.key
    }
}

fn require_rsa(id: Id) -> Result<(), EngineError> {
    if id == Id::RSA {
        Ok(())
    } else {
        debug!("Imported key is not an RSA key: {:?}", id);
        Err(EngineError::UnsupportedAlgorithm)
    }
}

impl ImportKey for RsaPublicKey {
    type Params = RsaImportParams;

    fn import(encoded: &[u8], params: &RsaImportParams) -> Result<Self, CryptoError> {
        let key = PKey::public_key_from_der(encoded)
            .map_err(|e| {
                debug!("Cannot read SPKI: {}", e);
                EngineError::InvalidKey
            })?;
        require_rsa(key.id())?;
        Ok(RsaPublicKey { key, hash: params.hash, usages: PUBLIC_USAGES.to_vec() })
    }
}

impl ImportKey for RsaPrivateKey {
    type Params = RsaImportParams;

    fn import(encoded: &[u8], params: &RsaImportParams) -> Result<Self, CryptoError> {
        let key = PKey::private_key_from_pkcs8(encoded)
            .map_err(|e| {
                debug!("Cannot read PKCS8: {}", e);
                EngineError::InvalidKey
            })?;
        require_rsa(key.id())?;
        Ok(RsaPrivateKey { key, hash: params.hash, extractable: true, usages: PRIVATE_USAGES.to_vec() })
    }
}

key_handle!(RsaPublicKey);
key_handle!(RsaPrivateKey);

impl Debug for RsaPublicKey {
    fn fmt(&self, f: &mut Formatter) -> FormatResult {
        write!(f, "RsaPublicKey(RSA-OAEP {} {})", self.modulus_length(), self.hash)
    }
}

impl Debug for RsaPrivateKey {
    fn fmt(&self, f: &mut Formatter) -> FormatResult {
        write!(f, "RsaPrivateKey(RSA-OAEP {} {})", self.modulus_length(), self.hash)
    }
}

pub(crate) fn raw_generate(params: RsaKeyParams, extractable: bool) -> Result<RsaKeyPair, EngineError> {
    let modulus_length = params.modulus_length;
    if modulus_length < MIN_MODULUS_LENGTH || modulus_length > MAX_MODULUS_LENGTH || modulus_length % 8 != 0 {
        return Err(EngineError::UnsupportedAlgorithm);
    }
    if params.public_exponent < 3 || params.public_exponent % 2 == 0 {
        return Err(EngineError::UnsupportedAlgorithm);
    }
    let exponent = BigNum::from_u32(params.public_exponent).map_err(openssl_error)?;
    let rsa = Rsa::generate_with_e(modulus_length, &exponent).map_err(openssl_error)?;
    let private = PKey::from_rsa(rsa).map_err(openssl_error)?;
    let public = private.public_key_to_der()
        .and_then(|der| PKey::public_key_from_der(&der))
        .map_err(openssl_error)?;
    Ok(RsaKeyPair {
        public_key: RsaPublicKey { key: public, hash: params.hash, usages: PUBLIC_USAGES.to_vec() },
        private_key: RsaPrivateKey { key: private, hash: params.hash, extractable, usages: PRIVATE_USAGES.to_vec() },
    })
}

pub async fn generate_key_pair(params: RsaKeyParams, extractable: bool) -> Result<RsaKeyPair, CryptoError> {
    engine::run("generate RSA key pair", move || Ok(raw_generate(params, extractable)?)).await
}

pub async fn generate_key_pair_base64(params: RsaKeyParams) -> Result<RsaKeyPairBase64, CryptoError> {
    let pair = generate_key_pair(params, true).await?;
    let (private, public) = futures::try_join!(
        export_private_key_base64(&pair.private_key),
        export_public_key_base64(&pair.public_key),
    )?;
    Ok(RsaKeyPairBase64 { public, private })
}

pub async fn export_public_key_spki(key: &RsaPublicKey) -> Result<Vec<u8>, CryptoError> {
    Ok(key.export_spki()?)
}

pub async fn export_public_key_base64(key: &RsaPublicKey) -> Result<String, CryptoError> {
    export_public_key_spki(key).await
        .map(buffer_to_base64)
}

pub async fn export_private_key_pkcs8(key: &RsaPrivateKey) -> Result<Vec<u8>, CryptoError> {
    Ok(key.export_pkcs8()?)
}

pub async fn export_private_key_base64(key: &RsaPrivateKey) -> Result<String, CryptoError> {
    export_private_key_pkcs8(key).await
        .map(buffer_to_base64)
}

pub async fn import_public_key<K>(key: K, params: RsaImportParams) -> Result<RsaPublicKey, CryptoError> where K: Into<Key<RsaPublicKey>> {
    key.into().resolve_with(&params)
}

pub async fn import_private_key<K>(key: K, params: RsaImportParams) -> Result<RsaPrivateKey, CryptoError> where K: Into<Key<RsaPrivateKey>> {
    key.into().resolve_with(&params)
}

pub async fn encrypt_with_public_key<K>(key: K, data: &[u8], params: &OaepParams) -> Result<Vec<u8>, CryptoError> where K: Into<Key<RsaPublicKey>> {
    let key = key.into().resolve()?;
    let data = data.to_vec();
    let params = params.clone();
    engine::run("RSA-OAEP encrypt", move || {
        Ok(oaep_encrypt(&key, &data, &params, KeyUsage::Encrypt)?)
    }).await
}

pub async fn decrypt_with_private_key<K>(key: K, data: &[u8], params: &OaepParams) -> Result<Vec<u8>, CryptoError> where K: Into<Key<RsaPrivateKey>> {
    let key = key.into().resolve()?;
    let data = data.to_vec();
    let params = params.clone();
    engine::run("RSA-OAEP decrypt", move || {
        Ok(oaep_decrypt(&key, &data, &params, KeyUsage::Decrypt)?)
    }).await
}

pub async fn encrypt_string_with_public_key<K>(key: K, text: &str, params: &OaepParams) -> Result<String, CryptoError> where K: Into<Key<RsaPublicKey>> {
    encrypt_with_public_key(key, &string_to_buffer(text), params).await
        .map(buffer_to_base64)
}

pub async fn decrypt_string_with_private_key<K>(key: K, encoded: &str, params: &OaepParams) -> Result<String, CryptoError> where K: Into<Key<RsaPrivateKey>> {
    let data = base64_to_buffer(encoded)?;
    let data = decrypt_with_private_key(key, &data, params).await?;
    Ok(buffer_to_string(data)?)
}


#[cfg(test)]
mod tests {
    use super::*;

    use openssl::ec::{EcGroup, EcKey};
    use openssl::nid::Nid;

    use crate::error::CodecError;

    lazy_static! {
        static ref KEY_PAIR: RsaKeyPair = raw_generate(RsaKeyParams::default(), true).expect("cannot generate RSA key");
    }

    fn small_params() -> RsaKeyParams {
        RsaKeyParams { modulus_length: 2048, ..Default::default() }
    }

    #[test]
    fn defaults() {
        let pair = &*KEY_PAIR;
        assert_eq!(pair.public_key.modulus_length(), 4096);
        assert_eq!(pair.private_key.modulus_length(), 4096);
        assert_eq!(pair.public_key.hash(), HashAlgorithm::Sha256);
        assert_eq!(pair.public_key.max_plain_text_len(), 446);
        assert_eq!(pair.public_key.usages(), &[KeyUsage::Encrypt, KeyUsage::WrapKey]);
        assert_eq!(pair.private_key.usages(), &[KeyUsage::Decrypt, KeyUsage::UnwrapKey]);
        assert_eq!(format!("{:?}", pair.public_key), "RsaPublicKey(RSA-OAEP 4096 SHA-256)");
    }

    #[tokio::test]
    async fn round_trip_limits() {
        let pair = &*KEY_PAIR;
        let params = OaepParams::default();
        for len in &[0, 1, 32, 445, 446] {
            let plain_text = vec![0x5a; *len];
            let cipher_text = encrypt_with_public_key(&pair.public_key, &plain_text, &params).await.unwrap();
            assert_eq!(cipher_text.len(), 512);
            assert_eq!(decrypt_with_private_key(&pair.private_key, &cipher_text, &params).await, Ok(plain_text));
        }
        for len in &[447, 512, 4096] {
            let plain_text = vec![0x5a; *len];
            assert_eq!(
                encrypt_with_public_key(&pair.public_key, &plain_text, &params).await,
                Err(CryptoError::Engine(EngineError::DataTooLarge)),
            );
        }
    }

    #[tokio::test]
    async fn strings_with_encoded_keys() {
        let pair = generate_key_pair_base64(small_params()).await.unwrap();
        let params = OaepParams::default();
        let message = "/ery s3cr³t mess@ge to $er/ice!";
        let cipher_text = encrypt_string_with_public_key(pair.public.as_str(), message, &params).await.unwrap();
        assert_eq!(decrypt_string_with_private_key(&pair.private, &cipher_text, &params).await, Ok(String::from(message)));

        let json = serde_json::to_string(&pair).unwrap();
        let parsed: RsaKeyPairBase64 = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, pair);
    }

    #[tokio::test]
    async fn export_import() {
        let pair = generate_key_pair(small_params(), true).await.unwrap();
        let spki = export_public_key_spki(&pair.public_key).await.unwrap();
        let pkcs8 = export_private_key_pkcs8(&pair.private_key).await.unwrap();

        let public = import_public_key(spki.clone(), RsaImportParams::default()).await.unwrap();
        assert_eq!(export_public_key_spki(&public).await, Ok(spki.clone()));
        let private = import_private_key(buffer_to_base64(&pkcs8), RsaImportParams::default()).await.unwrap();
        assert!(private.is_extractable());
        assert_eq!(export_private_key_pkcs8(&private).await, Ok(pkcs8));

        let public = import_public_key(buffer_to_base64(&spki), RsaImportParams { hash: HashAlgorithm::Sha512 }).await.unwrap();
        assert_eq!(public.hash(), HashAlgorithm::Sha512);
        assert_eq!(public.max_plain_text_len(), 126);
    }

    #[tokio::test]
    async fn non_extractable() {
        let pair = generate_key_pair(small_params(), false).await.unwrap();
        assert!(!pair.private_key.is_extractable());
        assert_eq!(export_private_key_base64(&pair.private_key).await, Err(CryptoError::Engine(EngineError::NotExtractable)));
        assert!(export_public_key_base64(&pair.public_key).await.is_ok());
        let params = OaepParams::default();
        let cipher_text = encrypt_with_public_key(&pair.public_key, b"usable", &params).await.unwrap();
        assert_eq!(decrypt_with_private_key(&pair.private_key, &cipher_text, &params).await.unwrap(), b"usable");
    }

    #[tokio::test]
    async fn restricted_usages() {
        let params = OaepParams::default();
        let cipher_text = encrypt_with_public_key(&KEY_PAIR.public_key, b"secret", &params).await.unwrap();

        let wrapper = KEY_PAIR.public_key.clone().with_usages(&[KeyUsage::WrapKey]).unwrap();
        assert_eq!(wrapper.usages(), &[KeyUsage::WrapKey]);
        assert_eq!(encrypt_with_public_key(&wrapper, b"secret", &params).await, Err(CryptoError::Engine(EngineError::KeyUsage)));
        let unwrapper = KEY_PAIR.private_key.clone().with_usages(&[KeyUsage::UnwrapKey]).unwrap();
        assert_eq!(decrypt_with_private_key(&unwrapper, &cipher_text, &params).await, Err(CryptoError::Engine(EngineError::KeyUsage)));

        let decrypter = KEY_PAIR.private_key.clone().with_usages(&[KeyUsage::Decrypt]).unwrap();
        assert_eq!(decrypt_with_private_key(&decrypter, &cipher_text, &params).await.unwrap(), b"secret");

        assert_eq!(KEY_PAIR.public_key.clone().with_usages(&[KeyUsage::Decrypt]).err(), Some(EngineError::KeyUsage));
        assert_eq!(KEY_PAIR.private_key.clone().with_usages(&[KeyUsage::Encrypt, KeyUsage::Decrypt]).err(), Some(EngineError::KeyUsage));
    }

    #[tokio::test]
    async fn wrong_key() {
        let other = generate_key_pair(small_params(), true).await.unwrap();
        let params = OaepParams::default();
        let cipher_text = encrypt_with_public_key(&KEY_PAIR.public_key, b"secret", &params).await.unwrap();
        assert_eq!(decrypt_with_private_key(&other.private_key, &cipher_text, &params).await, Err(CryptoError::Engine(EngineError::Decryption)));
        let mut tampered = cipher_text.clone();
        tampered[100] ^= 1;
        assert_eq!(decrypt_with_private_key(&KEY_PAIR.private_key, &tampered, &params).await, Err(CryptoError::Engine(EngineError::Decryption)));
    }

    #[tokio::test]
    async fn invalid_imports() {
        let params = RsaImportParams::default();
        assert_eq!(import_public_key(vec![1u8; 32], params).await.err(), Some(CryptoError::Engine(EngineError::InvalidKey)));
        assert_eq!(import_private_key(vec![1u8; 32], params).await.err(), Some(CryptoError::Engine(EngineError::InvalidKey)));
        assert_eq!(import_public_key("%%%", params).await.err(), Some(CryptoError::Codec(CodecError::InvalidBase64)));

        let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
        let ec = PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap();
        let spki = ec.public_key_to_der().unwrap();
        assert_eq!(import_public_key(spki, params).await.err(), Some(CryptoError::Engine(EngineError::UnsupportedAlgorithm)));
        let pkcs8 = ec.private_key_to_pkcs8().unwrap();
        assert_eq!(import_private_key(pkcs8, params).await.err(), Some(CryptoError::Engine(EngineError::UnsupportedAlgorithm)));
    }

    #[tokio::test]
    async fn unsupported_params() {
        for params in &[
            RsaKeyParams { modulus_length: 512, ..Default::default() },
            RsaKeyParams { modulus_length: 2047, ..Default::default() },
            RsaKeyParams { modulus_length: 2048, public_exponent: 65536, ..Default::default() },
            RsaKeyParams { modulus_length: 2048, public_exponent: 1, ..Default::default() },
        ] {
            assert_eq!(generate_key_pair(*params, true).await.err(), Some(CryptoError::Engine(EngineError::UnsupportedAlgorithm)));
        }
    }
}
