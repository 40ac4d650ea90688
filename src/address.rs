//! Base58Check addresses and keys
//!
//! `prefix || payload || sha256d(prefix || payload)[..4]`, Base58 encoded.
//! The prefix bytes come from the network's parameter set, so an address
//! only decodes against the network it was made for.

use thiserror::Error;

use crate::chainparams::{Base58Type, ChainParams};
use crate::crypto::hash_bytes;

const CHECKSUM_LEN: usize = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid base58: {0}")]
    InvalidEncoding(#[from] bs58::decode::Error),
    #[error("checksum mismatch")]
    InvalidChecksum,
    #[error("no {0} prefix on this network")]
    NotEncodable(&'static str),
    #[error("version prefix not used on this network")]
    UnknownPrefix,
    #[error("{kind} payload must be {expected} bytes, got {actual}")]
    InvalidLength {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// A decoded Base58Check string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub kind: Base58Type,
    pub payload: Vec<u8>,
}

/// Payload length a kind carries; secret keys may add a compression flag
fn payload_len_ok(kind: Base58Type, len: usize) -> bool {
    match kind {
        Base58Type::PubkeyAddress | Base58Type::ScriptAddress => len == 20,
        Base58Type::SecretKey => len == 32 || len == 33,
        Base58Type::ExtPublicKey | Base58Type::ExtSecretKey => len == 74,
        Base58Type::ExtCoinType => false,
    }
}

fn expected_len(kind: Base58Type) -> usize {
    match kind {
        Base58Type::PubkeyAddress | Base58Type::ScriptAddress => 20,
        Base58Type::SecretKey => 32,
        Base58Type::ExtPublicKey | Base58Type::ExtSecretKey => 74,
        Base58Type::ExtCoinType => 0,
    }
}

/// Base58Check over raw bytes
pub fn encode_check(data: &[u8]) -> String {
    let mut bytes = data.to_vec();
    bytes.extend_from_slice(&hash_bytes(data).0[..CHECKSUM_LEN]);
    bs58::encode(bytes).into_string()
}

/// Decode Base58Check, returning the data without the checksum
pub fn decode_check(text: &str) -> Result<Vec<u8>, AddressError> {
    let mut bytes = bs58::decode(text).into_vec()?;
    if bytes.len() < CHECKSUM_LEN {
        return Err(AddressError::InvalidChecksum);
    }
    let split = bytes.len() - CHECKSUM_LEN;
    if hash_bytes(&bytes[..split]).0[..CHECKSUM_LEN] != bytes[split..] {
        return Err(AddressError::InvalidChecksum);
    }
    bytes.truncate(split);
    Ok(bytes)
}

/// Encode `payload` as `kind` on the network of `params`
pub fn encode(params: &ChainParams, kind: Base58Type, payload: &[u8]) -> Result<String, AddressError> {
    if kind == Base58Type::ExtCoinType {
        return Err(AddressError::NotEncodable(kind.name()));
    }
    if !payload_len_ok(kind, payload.len()) {
        return Err(AddressError::InvalidLength {
            kind: kind.name(),
            expected: expected_len(kind),
            actual: payload.len(),
        });
    }

    let mut data = params.base58_prefix(kind).to_vec();
    data.extend_from_slice(payload);
    Ok(encode_check(&data))
}

/// Decode a string and detect its kind from the network's prefixes
pub fn decode(params: &ChainParams, text: &str) -> Result<Decoded, AddressError> {
    let data = decode_check(text)?;

    Base58Type::ENCODABLE
        .iter()
        .find_map(|&kind| {
            let payload = data.strip_prefix(params.base58_prefix(kind))?;
            payload_len_ok(kind, payload.len()).then(|| Decoded {
                kind,
                payload: payload.to_vec(),
            })
        })
        .ok_or(AddressError::UnknownPrefix)
}

/// Pay-to-pubkey-hash address for a 20-byte key hash
pub fn pubkey_address(params: &ChainParams, key_hash: &[u8; 20]) -> String {
    let mut data = params.base58_prefix(Base58Type::PubkeyAddress).to_vec();
    data.extend_from_slice(key_hash);
    encode_check(&data)
}

/// Pay-to-script-hash address for a 20-byte script hash
pub fn script_address(params: &ChainParams, script_hash: &[u8; 20]) -> String {
    let mut data = params.base58_prefix(Base58Type::ScriptAddress).to_vec();
    data.extend_from_slice(script_hash);
    encode_check(&data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chainparams::{main_params, regtest_params, testnet_params};

    #[test]
    fn test_known_vectors() {
        let zero = [0u8; 20];
        assert_eq!(pubkey_address(main_params(), &zero), "1111111111111111111114oLvT2");
        assert_eq!(script_address(main_params(), &zero), "31h1vYVSYuKP6AhS86fbRdMw9XHieotbST");
        assert_eq!(pubkey_address(testnet_params(), &zero), "i3UXS5QPRQGNRDDqVnyWTnmFCTHDbzmsYk");
        assert_eq!(script_address(testnet_params(), &zero), "JhsYKn7gEwPYz58p5Tf2LWychCLWNQsFhn");
    }

    #[test]
    fn test_kind_detection() {
        let params = main_params();
        let key = [7u8; 32];
        let mut compressed = key.to_vec();
        compressed.push(1);

        for (kind, payload) in [
            (Base58Type::PubkeyAddress, vec![1u8; 20]),
            (Base58Type::ScriptAddress, vec![2u8; 20]),
            (Base58Type::SecretKey, key.to_vec()),
            (Base58Type::SecretKey, compressed),
            (Base58Type::ExtPublicKey, vec![3u8; 74]),
            (Base58Type::ExtSecretKey, vec![4u8; 74]),
        ] {
            let text = encode(params, kind, &payload).unwrap();
            assert_eq!(decode(params, &text).unwrap(), Decoded { kind, payload });
        }
    }

    #[test]
    fn test_cross_network_rejected() {
        let text = pubkey_address(main_params(), &[9u8; 20]);
        assert_eq!(decode(testnet_params(), &text), Err(AddressError::UnknownPrefix));
        // regtest shares test prefixes
        let text = pubkey_address(testnet_params(), &[9u8; 20]);
        assert_eq!(decode(regtest_params(), &text).unwrap().kind, Base58Type::PubkeyAddress);
    }

    #[test]
    fn test_checksum_and_encoding_errors() {
        let mut text = pubkey_address(main_params(), &[5u8; 20]);
        let last = text.pop().unwrap();
        text.push(if last == 'z' { 'y' } else { 'z' });
        assert_eq!(decode(main_params(), &text), Err(AddressError::InvalidChecksum));

        assert!(matches!(decode(main_params(), "0OIl"), Err(AddressError::InvalidEncoding(_))));
        assert_eq!(decode_check(""), Err(AddressError::InvalidChecksum));
    }

    #[test]
    fn test_encode_rejects_bad_input() {
        assert_eq!(
            encode(main_params(), Base58Type::ExtCoinType, &[]),
            Err(AddressError::NotEncodable("ext_coin_type"))
        );
        assert_eq!(
            encode(main_params(), Base58Type::PubkeyAddress, &[0u8; 19]),
            Err(AddressError::InvalidLength {
                kind: "pubkey_address",
                expected: 20,
                actual: 19
            })
        );
    }
}
