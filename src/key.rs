use std::fmt::{Debug, Formatter, Result as FormatResult};

use crate::codec::base64_to_buffer;
use crate::error::{CryptoError, EngineError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyUsage {
    Encrypt,
    Decrypt,
    WrapKey,
    UnwrapKey,
}

pub(crate) fn check_usage(usages: &[KeyUsage], usage: KeyUsage) -> Result<(), EngineError> {
    if usages.contains(&usage) {
        Ok(())
    } else {
        debug!("Key usage {:?} not permitted, key allows {:?}", usage, usages);
        Err(EngineError::KeyUsage)
    }
}

pub(crate) fn restrict_usages(allowed: &[KeyUsage], usages: &[KeyUsage]) -> Result<Vec<KeyUsage>, EngineError> {
    if usages.is_empty() {
        debug!("Key must allow at least one of {:?}", allowed);
        return Err(EngineError::KeyUsage);
    }
    for &usage in usages {
        check_usage(allowed, usage)?;
    }
    Ok(usages.to_vec())
}

pub trait ImportKey: Sized {
    type Params: Default;

    fn import(encoded: &[u8], params: &Self::Params) -> Result<Self, CryptoError>;
}

pub enum Key<H> {
    Handle(H),
    Encoded(Vec<u8>),
    Base64(String),
}

impl<H> Key<H> where H: ImportKey {
    pub fn resolve(self) -> Result<H, CryptoError> {
        self.resolve_with(&H::Params::default())
    }

    pub fn resolve_with(self, params: &H::Params) -> Result<H, CryptoError> {
        match self {
            Key::Handle(handle) => Ok(handle),
            Key::Encoded(encoded) => H::import(&encoded, params),
            Key::Base64(encoded) => {
                let encoded = base64_to_buffer(encoded)?;
                H::import(&encoded, params)
            },
        }
    }
}

impl<H> From<Vec<u8>> for Key<H> {
    fn from(encoded: Vec<u8>) -> Self {
        Key::Encoded(encoded)
    }
}

impl<H> From<String> for Key<H> {
    fn from(encoded: String) -> Self {
        Key::Base64(encoded)
    }
}

impl<H> From<&str> for Key<H> {
    fn from(encoded: &str) -> Self {
        Key::Base64(encoded.to_owned())
    }
}

impl<H> From<&String> for Key<H> {
    fn from(encoded: &String) -> Self {
        Key::Base64(encoded.clone())
    }
}

impl<H> Debug for Key<H> where H: Debug {
    fn fmt(&self, f: &mut Formatter) -> FormatResult {
        match self {
            Key::Handle(handle) => write!(f, "Key({:?})", handle),
            Key::Encoded(encoded) => write!(f, "Key(<{} bytes>)", encoded.len()),
            Key::Base64(encoded) => write!(f, "Key(<{} base64 characters>)", encoded.len()),
        }
    }
}

macro_rules! key_handle {
    ( $Handle:ty ) => {
        impl From<$Handle> for $crate::key::Key<$Handle> {
            fn from(handle: $Handle) -> Self {
                $crate::key::Key::Handle(handle)
            }
        }

        impl From<&$Handle> for $crate::key::Key<$Handle> {
            fn from(handle: &$Handle) -> Self {
                $crate::key::Key::Handle(handle.clone())
            }
        }
    };
}
