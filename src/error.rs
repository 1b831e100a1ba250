use std::error::Error;
use std::fmt::{Display, Formatter, Result as FormatResult};

define_error!(CodecError;
    InvalidBase64="invalid base64 text",
    InvalidUtf8="invalid utf-8 data",
    OffsetOutOfRange="split offset out of range"
);

define_error!(EngineError;
    UnsupportedAlgorithm="unsupported algorithm parameters",
    KeyUsage="key usage not permitted",
    NotExtractable="key is not extractable",
    InvalidKey="invalid key data",
    KeyMismatch="key does not match requested algorithm",
    DataTooLarge="data too large for key",
    Authentication="cannot authenticate cipher text",
    Decryption="cannot decrypt",
    Random="cannot generate random data",
    Failure="engine operation failed",
    Interrupted="engine operation interrupted",
    NoRuntime="no async runtime available"
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoError {
    Codec(CodecError),
    Engine(EngineError),
}

impl Error for CryptoError {}

impl Display for CryptoError {
    fn fmt(&self, f: &mut Formatter) -> FormatResult {
        match self {
            CryptoError::Codec(err) => write!(f, "codec error: {}", err),
            CryptoError::Engine(err) => write!(f, "engine error: {}", err),
        }
    }
}

impl From<CodecError> for CryptoError {
    fn from(err: CodecError) -> CryptoError {
        CryptoError::Codec(err)
    }
}

impl From<EngineError> for CryptoError {
    fn from(err: EngineError) -> CryptoError {
        CryptoError::Engine(err)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(CodecError::InvalidBase64.to_string(), "invalid base64 text");
        assert_eq!(CryptoError::from(EngineError::DataTooLarge).to_string(), "engine error: data too large for key");
        assert_eq!(CryptoError::from(CodecError::OffsetOutOfRange).to_string(), "codec error: split offset out of range");
    }
}
