use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::error::CodecError;

pub fn buffer_to_base64<T>(data: T) -> String where T: AsRef<[u8]> {
    STANDARD.encode(data)
}

pub fn base64_to_buffer<T>(text: T) -> Result<Vec<u8>, CodecError> where T: AsRef<[u8]> {
    STANDARD.decode(text)
        .map_err(|e| {
            debug!("Base64 decoding error: {}", e);
            CodecError::InvalidBase64
        })
}

#[inline]
pub fn string_to_buffer(text: &str) -> Vec<u8> {
    text.as_bytes().to_vec()
}

pub fn buffer_to_string(data: Vec<u8>) -> Result<String, CodecError> {
    String::from_utf8(data).or(Err(CodecError::InvalidUtf8))
}

pub fn concat(head: &[u8], tail: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(head.len() + tail.len());
    data.extend_from_slice(head);
    data.extend_from_slice(tail);
    data
}

pub fn split_at(data: &[u8], offset: usize) -> Result<(&[u8], &[u8]), CodecError> {
    if offset > data.len() {
        return Err(CodecError::OffsetOutOfRange);
    }
    Ok(data.split_at(offset))
}
