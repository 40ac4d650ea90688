//! Cryptography module - double SHA-256, Merkle trees, ECDSA verification, randomness

mod hash;
mod merkle;
mod ecdsa;
pub mod random;

pub use hash::*;
pub use merkle::*;
pub use ecdsa::*;
