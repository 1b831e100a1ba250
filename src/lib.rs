#![deny(unused_must_use)]

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;

#[macro_export]
macro_rules! define_error {
    ( $Error:ident; $( $Option:ident = $description:expr ),+ ) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $Error {
            $(
            $Option,
            )*
        }

        impl std::error::Error for $Error {}

        impl std::fmt::Display for $Error {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                match self {
                    $(
                        $Error::$Option => f.write_str($description),
                    )*
                }
            }
        }
    };
}

pub mod error;
pub mod codec;
pub mod params;
#[macro_use]
pub mod key;
mod engine;
pub mod aes;
pub mod rsa;
pub mod kdf;
pub mod hash;
pub mod envelope;
pub mod selftest;
pub mod misc;

pub use error::{CryptoError, CodecError, EngineError};
pub use key::{Key, KeyUsage};
pub use params::{HashAlgorithm, AesKeyParams, AesGcmParams, RsaKeyParams, RsaImportParams, OaepParams, KdfParams};
pub use aes::AesKey;
pub use rsa::{RsaPublicKey, RsaPrivateKey, RsaKeyPair, RsaKeyPairBase64};
pub use kdf::{Salt, DerivedKey, DerivedKeyBase64};
