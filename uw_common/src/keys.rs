use bitcoin::secp256k1::PublicKey;

use crate::Error;

/// Compress a hex encoded public key, returning the 33 bytes compressed form in hex.
///
/// Both uncompressed (65 bytes) and already compressed keys are accepted, the key must be a
/// valid point on the curve.
pub fn compress_public_key(public_key: &str) -> Result<String, Error> {
    let bytes = hex::decode(public_key)?;
    let key = PublicKey::from_slice(&bytes)?;
    Ok(hex::encode(key.serialize()))
}
