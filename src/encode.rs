//! Consensus serialization helpers
//!
//! Integers are little-endian; variable-length fields carry a compact-size
//! prefix (1, 3, 5 or 9 bytes).

/// Append a compact-size length prefix
pub fn write_compact_size(bytes: &mut Vec<u8>, n: u64) {
    if n < 0xfd {
        bytes.push(n as u8);
    } else if n <= 0xffff {
        bytes.push(0xfd);
        bytes.extend_from_slice(&(n as u16).to_le_bytes());
    } else if n <= 0xffff_ffff {
        bytes.push(0xfe);
        bytes.extend_from_slice(&(n as u32).to_le_bytes());
    } else {
        bytes.push(0xff);
        bytes.extend_from_slice(&n.to_le_bytes());
    }
}

/// Append a compact-size prefixed byte string
pub fn write_var_bytes(bytes: &mut Vec<u8>, data: &[u8]) {
    write_compact_size(bytes, data.len() as u64);
    bytes.extend_from_slice(data);
}
