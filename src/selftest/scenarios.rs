use std::sync::Arc;

use futures::{FutureExt, TryFutureExt};

use crate::aes::{decrypt_string, encrypt_string, export_key_base64, generate_key, import_key};
use crate::envelope::seal_envelope_base64;
use crate::kdf::{Salt, derive_aes_key_from_password};
use crate::params::{AesGcmParams, AesKeyParams, KdfParams, OaepParams, RsaImportParams, RsaKeyParams};
use crate::rsa::{
    decrypt_string_with_private_key, encrypt_string_with_public_key, export_public_key_base64, generate_key_pair,
    import_public_key,
};
use crate::selftest::{Peer, TestFn, TestFuture, TestFailure, expect_eq};

pub(super) const DEFAULT_TESTS: &[(&str, TestFn)] = &[
    ("aes_key_conversion", aes_key_conversion),
    ("aes_encryption", aes_encryption),
    ("aes_with_peer", aes_with_peer),
    ("generate_key_pair", generate_rsa_key_pair),
    ("peer_public_key", peer_public_key),
    ("encrypt_to_peer", encrypt_to_peer),
    ("encrypt_from_peer", encrypt_from_peer),
    ("envelope_with_peer", envelope_with_peer),
    ("key_derivation", key_derivation),
];

fn aes_key_conversion(_peer: Arc<Peer>) -> TestFuture {
    let message = "Testing rusty envelope $!@";
    async move {
        let params = AesGcmParams::default();
        let aes = generate_key(AesKeyParams::default(), true).await?;
        let (converted, cipher_text) = futures::try_join!(
            export_key_base64(&aes).and_then(|encoded| import_key(encoded)),
            encrypt_string(&aes, message, &params),
        )?;
        let plain_text = decrypt_string(&converted, &cipher_text, &params).await?;
        expect_eq("Key conversion invalid", &plain_text, message)
    }.boxed()
}

fn aes_encryption(_peer: Arc<Peer>) -> TestFuture {
    let message = "Testing rusty envelope $!@";
    async move {
        let params = AesGcmParams::default();
        let aes = generate_key(AesKeyParams::default(), true).await?;
        let cipher_text = encrypt_string(&aes, message, &params).await?;
        let plain_text = decrypt_string(&aes, &cipher_text, &params).await?;
        expect_eq("Decrypted message not equal to test message", &plain_text, message)
    }.boxed()
}

fn aes_with_peer(peer: Arc<Peer>) -> TestFuture {
    let message = "Testing rusty envelope with peer $!@";
    async move {
        let params = AesGcmParams::default();
        let aes = generate_key(AesKeyParams::default(), true).await?;
        let (encoded, cipher_text) = futures::try_join!(
            export_key_base64(&aes),
            encrypt_string(&aes, message, &params),
        )?;
        let plain_text = peer.decrypt_message_with_aes(&encoded, &cipher_text).await?;
        expect_eq("Peer decrypted message not equal to test message", &plain_text, message)
    }.boxed()
}

fn generate_rsa_key_pair(_peer: Arc<Peer>) -> TestFuture {
    let message = "This is a test message";
    async move {
        let params = OaepParams::default();
        let pair = generate_key_pair(RsaKeyParams::default(), true).await?;
        let cipher_text = encrypt_string_with_public_key(&pair.public_key, message, &params).await?;
        let plain_text = decrypt_string_with_private_key(&pair.private_key, &cipher_text, &params).await?;
        expect_eq("Decrypted message not equal to test message", &plain_text, message)
    }.boxed()
}

fn peer_public_key(peer: Arc<Peer>) -> TestFuture {
    async move {
        let public_key = import_public_key(peer.public_key_base64()?, RsaImportParams::default()).await?;
        if public_key.modulus_length() != peer.modulus_length() {
            return Err(TestFailure::mismatch(
                "Imported modulus length differs",
                public_key.modulus_length().to_string(),
                peer.modulus_length().to_string(),
            ));
        }
        Ok(())
    }.boxed()
}

fn encrypt_to_peer(peer: Arc<Peer>) -> TestFuture {
    let message = "/ery s3cr³t mess@ge to $er/ice!";
    async move {
        let public_key = peer.public_key_base64()?;
        let cipher_text = encrypt_string_with_public_key(public_key, message, &OaepParams::default()).await?;
        let plain_text = peer.decrypt_message_with_rsa(&cipher_text).await?;
        expect_eq("Encrypted message not equal to test message", &plain_text, message)
    }.boxed()
}

fn encrypt_from_peer(peer: Arc<Peer>) -> TestFuture {
    let message = "/ery s3cr³t mess@ge fr()m $er/ice!";
    async move {
        let pair = generate_key_pair(RsaKeyParams::default(), true).await?;
        let public_key = export_public_key_base64(&pair.public_key).await?;
        let cipher_text = peer.encrypt_message_with_rsa(&public_key, message).await?;
        let plain_text = decrypt_string_with_private_key(&pair.private_key, &cipher_text, &OaepParams::default()).await?;
        expect_eq("Decrypted message not equal to test message", &plain_text, message)
    }.boxed()
}

fn envelope_with_peer(peer: Arc<Peer>) -> TestFuture {
    let message = "This message gets encrypted with an 3nvelope";
    async move {
        let (wrap_params, params) = (OaepParams::default(), AesGcmParams::default());
        let public_key = peer.public_key_base64()?;
        let aes = generate_key(AesKeyParams::default(), true).await?;
        let (envelope, cipher_text) = futures::try_join!(
            seal_envelope_base64(public_key, &aes, &wrap_params),
            encrypt_string(&aes, message, &params),
        )?;
        let plain_text = peer.open_envelope(&envelope, &cipher_text).await?;
        expect_eq("Peer decrypted message not equal to test message", &plain_text, message)
    }.boxed()
}

fn key_derivation(_peer: Arc<Peer>) -> TestFuture {
    let password = "HamburgerRiesenradHampelmann69420";
    let message = "Ju$t@n()th3rS3cr3tM3ss@g3";
    async move {
        let params = KdfParams::default();
        let derived = derive_aes_key_from_password(password, None, &params).await?;
        let cipher_text = encrypt_string(&derived.key, message, &AesGcmParams::default()).await?;
        let again = derive_aes_key_from_password(password, Some(Salt::from(derived.salt)), &params).await?;
        let plain_text = decrypt_string(&again.key, &cipher_text, &AesGcmParams::default()).await?;
        expect_eq("Decrypted message not equal to test message", &plain_text, message)
    }.boxed()
}
