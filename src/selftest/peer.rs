use openssl::encrypt::{Decrypter, Encrypter};
use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Private};
use openssl::rsa::{Padding, Rsa};
use openssl::symm::{Cipher, decrypt_aead};

use zeroize::Zeroizing;

use crate::aes::{IV_LEN, TAG_LEN};
use crate::codec::{base64_to_buffer, buffer_to_base64, buffer_to_string, split_at};
use crate::engine;

define_error!(PeerError;
    InvalidEncoding="invalid message encoding",
    InvalidKey="invalid key",
    Encryption="cannot encrypt message",
    Decryption="cannot decrypt message",
    KeyGeneration="cannot generate key pair",
    Interrupted="peer operation interrupted"
);

pub struct Peer {
    key: PKey<Private>,
}

impl Peer {
    pub async fn new(modulus_length: u32) -> Result<Peer, PeerError> {
        let key = dispatch("generate peer key", move || {
            Rsa::generate(modulus_length)
                .and_then(PKey::from_rsa)
                .map_err(|e| {
                    error!("Peer cannot generate RSA key: {}", e);
                    PeerError::KeyGeneration
                })
        }).await?;
        Ok(Peer { key })
    }

    pub fn modulus_length(&self) -> u32 {
        self.key.bits()
    }

    pub fn public_key_base64(&self) -> Result<String, PeerError> {
        self.key.public_key_to_der()
            .map(buffer_to_base64)
            .or(Err(PeerError::InvalidKey))
    }

    pub async fn decrypt_message_with_aes(&self, key_base64: &str, message_base64: &str) -> Result<String, PeerError> {
        let key = decode(key_base64)?;
        let message = decode(message_base64)?;
        dispatch("peer AES-GCM decrypt", move || aes_gcm_decrypt(&key, &message)).await
    }

    pub async fn decrypt_message_with_rsa(&self, message_base64: &str) -> Result<String, PeerError> {
        let message = decode(message_base64)?;
        let key = self.key.clone();
        dispatch("peer RSA-OAEP decrypt", move || {
            let plain_text = oaep_unwrap(&key, &message)?;
            buffer_to_string(plain_text).or(Err(PeerError::InvalidEncoding))
        }).await
    }

    pub async fn encrypt_message_with_rsa(&self, public_key_base64: &str, message: &str) -> Result<String, PeerError> {
        let public_key = decode(public_key_base64)?;
        let message = message.to_owned();
        dispatch("peer RSA-OAEP encrypt", move || oaep_wrap(&public_key, message.as_bytes())).await
    }

    pub async fn open_envelope(&self, envelope_base64: &str, message_base64: &str) -> Result<String, PeerError> {
        let envelope = decode(envelope_base64)?;
        let message = decode(message_base64)?;
        let key = self.key.clone();
        dispatch("peer open envelope", move || {
            let aes_key = Zeroizing::new(oaep_unwrap(&key, &envelope)?);
            aes_gcm_decrypt(&aes_key, &message)
        }).await
    }
}

async fn dispatch<F, T>(operation: &'static str, task: F) -> Result<T, PeerError>
    where F: FnOnce() -> Result<T, PeerError> + Send + 'static, T: Send + 'static {
    match engine::run(operation, move || Ok(task())).await {
        Ok(result) => result,
        Err(e) => {
            debug!("{} not run: {}", operation, e);
            Err(PeerError::Interrupted)
        },
    }
}

fn oaep_wrap(public_key: &[u8], data: &[u8]) -> Result<String, PeerError> {
    let public_key = PKey::public_key_from_der(public_key).or(Err(PeerError::InvalidKey))?;
    let mut encrypter = Encrypter::new(&public_key).or(Err(PeerError::InvalidKey))?;
    encrypter.set_rsa_padding(Padding::PKCS1_OAEP)
        .and_then(|_| encrypter.set_rsa_oaep_md(MessageDigest::sha256()))
        .and_then(|_| encrypter.set_rsa_mgf1_md(MessageDigest::sha256()))
        .or(Err(PeerError::InvalidKey))?;
    let len = encrypter.encrypt_len(data).or(Err(PeerError::Encryption))?;
    let mut cipher_text: Vec<u8> = vec![0; len];
    let len = encrypter.encrypt(data, &mut cipher_text)
        .map_err(|e| {
            debug!("Peer encryption error: {}", e);
            PeerError::Encryption
        })?;
    cipher_text.truncate(len);
    Ok(buffer_to_base64(cipher_text))
}

fn oaep_unwrap(key: &PKey<Private>, cipher_text: &[u8]) -> Result<Vec<u8>, PeerError> {
    let mut decrypter = Decrypter::new(key).or(Err(PeerError::InvalidKey))?;
    decrypter.set_rsa_padding(Padding::PKCS1_OAEP)
        .and_then(|_| decrypter.set_rsa_oaep_md(MessageDigest::sha256()))
        .and_then(|_| decrypter.set_rsa_mgf1_md(MessageDigest::sha256()))
        .or(Err(PeerError::InvalidKey))?;
    let len = decrypter.decrypt_len(cipher_text).or(Err(PeerError::Decryption))?;
    let mut plain_text: Vec<u8> = vec![0; len];
    let len = decrypter.decrypt(cipher_text, &mut plain_text)
        .map_err(|e| {
            debug!("Peer decryption error: {}", e);
            PeerError::Decryption
        })?;
    plain_text.truncate(len);
    Ok(plain_text)
}

fn decode(text: &str) -> Result<Vec<u8>, PeerError> {
    base64_to_buffer(text).or(Err(PeerError::InvalidEncoding))
}

fn aes_gcm_decrypt(key: &[u8], message: &[u8]) -> Result<String, PeerError> {
    let cipher = match key.len() {
        16 => Cipher::aes_128_gcm(),
        32 => Cipher::aes_256_gcm(),
        _ => return Err(PeerError::InvalidKey),
    };
    if message.len() < IV_LEN + TAG_LEN {
        return Err(PeerError::InvalidEncoding);
    }
    let (iv, rest) = split_at(message, IV_LEN).or(Err(PeerError::InvalidEncoding))?;
    let (cipher_text, tag) = split_at(rest, rest.len() - TAG_LEN).or(Err(PeerError::InvalidEncoding))?;
    let plain_text = decrypt_aead(cipher, key, Some(iv), &[], cipher_text, tag)
        .map_err(|e| {
            debug!("Peer AES-GCM error: {}", e);
            PeerError::Decryption
        })?;
    buffer_to_string(plain_text).or(Err(PeerError::InvalidEncoding))
}
