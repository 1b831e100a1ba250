//! Key transport: AES keys wrapped under RSA-OAEP public keys.

use zeroize::Zeroizing;

use crate::aes::AesKey;
use crate::codec::{base64_to_buffer, buffer_to_base64};
use crate::engine;
use crate::error::{CryptoError, EngineError};
use crate::key::{Key, KeyUsage};
use crate::params::{AesKeyParams, OaepParams};
use crate::rsa::{RsaPrivateKey, RsaPublicKey, oaep_decrypt, oaep_encrypt};

pub async fn seal_envelope<P, K>(public_key: P, aes_key: K, params: &OaepParams) -> Result<Vec<u8>, CryptoError>
    where P: Into<Key<RsaPublicKey>>, K: Into<Key<AesKey>> {
    let public_key = public_key.into().resolve()?;
    let aes_key = aes_key.into().resolve()?;
    let params = params.clone();
    engine::run("seal envelope", move || {
        let material = aes_key.export_secret()?;
        Ok(oaep_encrypt(&public_key, &material, &params, KeyUsage::WrapKey)?)
    }).await
}

pub async fn seal_envelope_base64<P, K>(public_key: P, aes_key: K, params: &OaepParams) -> Result<String, CryptoError>
    where P: Into<Key<RsaPublicKey>>, K: Into<Key<AesKey>> {
    seal_envelope(public_key, aes_key, params).await
        .map(buffer_to_base64)
}

pub async fn open_envelope<P>(envelope: &[u8], private_key: P, params: &OaepParams, key_params: AesKeyParams) -> Result<AesKey, CryptoError>
    where P: Into<Key<RsaPrivateKey>> {
    let private_key = private_key.into().resolve()?;
    let envelope = envelope.to_vec();
    let params = params.clone();
    engine::run("open envelope", move || {
        let key_len = key_params.key_len()?;
        let material = Zeroizing::new(oaep_decrypt(&private_key, &envelope, &params, KeyUsage::UnwrapKey)?);
        if material.len() != key_len {
            debug!("Unwrapped {} bytes, expected AES-GCM {} key", material.len(), key_params.length);
            return Err(EngineError::KeyMismatch.into());
        }
        Ok(AesKey::new(material.to_vec(), true)?)
    }).await
}

pub async fn open_envelope_base64<P>(envelope: &str, private_key: P, params: &OaepParams, key_params: AesKeyParams) -> Result<AesKey, CryptoError>
    where P: Into<Key<RsaPrivateKey>> {
    let envelope = base64_to_buffer(envelope)?;
    open_envelope(&envelope, private_key, params, key_params).await
}


#[cfg(test)]
mod tests {
    use super::*;

    use crate::aes::{decrypt_string, encrypt_string, export_key_base64, generate_key};
    use crate::error::CodecError;
    use crate::params::{AesGcmParams, RsaKeyParams};
    use crate::rsa::{RsaKeyPair, export_private_key_base64, export_public_key_base64, generate_key_pair, raw_generate};

    lazy_static! {
        static ref KEY_PAIR: RsaKeyPair = raw_generate(RsaKeyParams { modulus_length: 2048, ..Default::default() }, true)
            .expect("cannot generate RSA key");
    }

    #[tokio::test]
    async fn round_trip() {
        let params = OaepParams::default();
        for length in &[128, 256] {
            let key_params = AesKeyParams { length: *length };
            let key = generate_key(key_params, true).await.unwrap();
            let envelope = seal_envelope(&KEY_PAIR.public_key, &key, &params).await.unwrap();
            assert_eq!(envelope.len(), 256);
            let opened = open_envelope(&envelope, &KEY_PAIR.private_key, &params, key_params).await.unwrap();
            assert_eq!(opened.length(), *length);
            assert_eq!(opened.export_raw(), key.export_raw());
        }
    }

    #[tokio::test]
    async fn hybrid_message() {
        let recipient = generate_key_pair(RsaKeyParams { modulus_length: 2048, ..Default::default() }, true).await.unwrap();
        let public = export_public_key_base64(&recipient.public_key).await.unwrap();
        let private = export_private_key_base64(&recipient.private_key).await.unwrap();

        // sender side
        let message = "Some very secret message that is far longer than a single RSA-OAEP block could carry. ".repeat(20);
        let key = generate_key(AesKeyParams::default(), true).await.unwrap();
        let cipher_text = encrypt_string(&key, &message, &AesGcmParams::default()).await.unwrap();
        let sealed = seal_envelope_base64(public.as_str(), export_key_base64(&key).await.unwrap(), &OaepParams::default()).await.unwrap();

        // recipient side
        let opened = open_envelope_base64(&sealed, private, &OaepParams::default(), AesKeyParams::default()).await.unwrap();
        assert_eq!(decrypt_string(&opened, &cipher_text, &AesGcmParams::default()).await, Ok(message));
    }

    #[tokio::test]
    async fn failures() {
        let params = OaepParams::default();
        let key = generate_key(AesKeyParams::default(), true).await.unwrap();
        let envelope = seal_envelope(&KEY_PAIR.public_key, &key, &params).await.unwrap();

        let other = raw_generate(RsaKeyParams { modulus_length: 2048, ..Default::default() }, true).unwrap();
        assert_eq!(
            open_envelope(&envelope, &other.private_key, &params, AesKeyParams::default()).await.err(),
            Some(CryptoError::Engine(EngineError::Decryption)),
        );
        assert_eq!(
            open_envelope(&envelope, &KEY_PAIR.private_key, &params, AesKeyParams { length: 128 }).await.err(),
            Some(CryptoError::Engine(EngineError::KeyMismatch)),
        );
        assert_eq!(
            open_envelope(&envelope, &KEY_PAIR.private_key, &params, AesKeyParams { length: 192 }).await.err(),
            Some(CryptoError::Engine(EngineError::UnsupportedAlgorithm)),
        );
        let labelled = OaepParams { label: Some(b"recipient".to_vec()) };
        assert_eq!(
            open_envelope(&envelope, &KEY_PAIR.private_key, &labelled, AesKeyParams::default()).await.err(),
            Some(CryptoError::Engine(EngineError::Decryption)),
        );
        assert_eq!(
            open_envelope_base64("@@", &KEY_PAIR.private_key, &params, AesKeyParams::default()).await.err(),
            Some(CryptoError::Codec(CodecError::InvalidBase64)),
        );

        let hidden = generate_key(AesKeyParams::default(), false).await.unwrap();
        assert_eq!(
            seal_envelope(&KEY_PAIR.public_key, &hidden, &params).await,
            Err(CryptoError::Engine(EngineError::NotExtractable)),
        );
    }

    #[tokio::test]
    async fn restricted_usages() {
        let params = OaepParams::default();
        let key = generate_key(AesKeyParams::default(), true).await.unwrap();

        let encrypter = KEY_PAIR.public_key.clone().with_usages(&[KeyUsage::Encrypt]).unwrap();
        assert_eq!(seal_envelope(&encrypter, &key, &params).await, Err(CryptoError::Engine(EngineError::KeyUsage)));
        let wrapper = KEY_PAIR.public_key.clone().with_usages(&[KeyUsage::WrapKey]).unwrap();
        let envelope = seal_envelope(&wrapper, &key, &params).await.unwrap();

        let decrypter = KEY_PAIR.private_key.clone().with_usages(&[KeyUsage::Decrypt]).unwrap();
        assert_eq!(
            open_envelope(&envelope, &decrypter, &params, AesKeyParams::default()).await.err(),
            Some(CryptoError::Engine(EngineError::KeyUsage)),
        );
        let unwrapper = KEY_PAIR.private_key.clone().with_usages(&[KeyUsage::UnwrapKey]).unwrap();
        let opened = open_envelope(&envelope, &unwrapper, &params, AesKeyParams::default()).await.unwrap();
        assert_eq!(opened.export_raw(), key.export_raw());
    }
}
