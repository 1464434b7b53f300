//! Row codec: JSON → PKCS#7 → AES-256-CBC → hex line, and back.
//!
//! Every table-file line is the lowercase hex encoding of the AES-256-CBC
//! ciphertext of one JSON-serialized row. The IV is the first 16 bytes of
//! the row key (see [`RowKey::iv`]); with a fixed IV, identical rows under
//! one key encrypt identically. That weakness is part of this design, not
//! something this module compensates for.

use crate::error::{StoreError, StoreResult};
use crate::keyvault::{RowKey, BLOCK_SIZE};
use crate::row::Row;
use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use serde_json::Value;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Encrypts one row into a hex table-file line.
pub fn encode_row(row: &Row, key: &RowKey) -> StoreResult<String> {
    let plaintext = serde_json::to_vec(row)?;
    let ciphertext = Aes256CbcEnc::new(&(*key.as_bytes()).into(), &key.iv().into())
        .encrypt_padded_vec_mut::<Pkcs7>(&plaintext);
    Ok(hex::encode(ciphertext))
}

/// Decrypts one hex table-file line back into a row.
///
/// # Errors
///
/// Returns [`StoreError::CorruptRecord`] if the line is not valid hex, not
/// block-aligned, fails padding removal, or does not parse as a JSON object.
/// A line truncated by a crash mid-rewrite surfaces here.
pub fn decode_row(line: &str, key: &RowKey) -> StoreResult<Row> {
    let ciphertext = hex::decode(line.trim())
        .map_err(|_| StoreError::corrupt_record("line is not valid hex"))?;
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(StoreError::corrupt_record("truncated ciphertext"));
    }

    let plaintext = Aes256CbcDec::new(&(*key.as_bytes()).into(), &key.iv().into())
        .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
        .map_err(|_| StoreError::corrupt_record("invalid padding"))?;

    match serde_json::from_slice::<Value>(&plaintext) {
        Ok(Value::Object(row)) => Ok(row),
        Ok(_) => Err(StoreError::corrupt_record("record is not a JSON object")),
        Err(_) => Err(StoreError::corrupt_record("record is not valid JSON")),
    }
}
