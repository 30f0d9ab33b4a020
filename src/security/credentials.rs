// Session tokens and transport encoding for biometric templates
use base64::{engine::general_purpose, Engine as _};
use rand::{rngs::OsRng, RngCore};

use crate::error::{BankError, Result};

/// Random token of `length` bytes, hex encoded
pub fn generate_token(length: usize) -> String {
    let mut bytes = vec![0u8; length];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Encode raw biometric data for storage
pub fn encode_biometric(data: &[u8]) -> String {
    general_purpose::STANDARD.encode(data)
}

/// Decode stored biometric data
pub fn decode_biometric(encoded: &str) -> Result<Vec<u8>> {
    general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| BankError::InvalidEncoding(e.to_string()))
}
