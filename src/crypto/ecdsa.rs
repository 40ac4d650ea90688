//! ECDSA signature verification
//!
//! secp256k1 public keys in SEC1 form (33-byte compressed or 65-byte
//! uncompressed) verifying DER signatures over a 32-byte digest.

use k256::ecdsa::signature::hazmat::PrehashVerifier;
use k256::ecdsa::{Signature, VerifyingKey};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Hash;

/// Signature errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Invalid signature encoding")]
    InvalidSignature,
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Signature does not verify")]
    VerificationFailed,
}

/// SEC1-encoded secp256k1 public key
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey(#[serde(with = "hex_bytes")] Vec<u8>);

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        hex::decode(text).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublicKey({})", hex::encode(&self.0))
    }
}

impl PublicKey {
    /// Parse and validate SEC1 bytes
    pub fn from_sec1(bytes: &[u8]) -> Result<Self, SignatureError> {
        VerifyingKey::from_sec1_bytes(bytes).map_err(|_| SignatureError::InvalidPublicKey)?;
        Ok(PublicKey(bytes.to_vec()))
    }

    /// Parse hex-encoded SEC1 bytes
    pub fn from_hex(text: &str) -> Result<Self, SignatureError> {
        let bytes = hex::decode(text).map_err(|_| SignatureError::InvalidPublicKey)?;
        Self::from_sec1(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Verify a DER signature over `digest`
    ///
    /// High-S signatures are normalized before verification.
    pub fn verify(&self, digest: &Hash, der_signature: &[u8]) -> Result<(), SignatureError> {
        let key = VerifyingKey::from_sec1_bytes(&self.0).map_err(|_| SignatureError::InvalidPublicKey)?;
        let signature = Signature::from_der(der_signature).map_err(|_| SignatureError::InvalidSignature)?;
        let signature = signature.normalize_s().unwrap_or(signature);

        key.verify_prehash(&digest.0, &signature)
            .map_err(|_| SignatureError::VerificationFailed)
    }
}
