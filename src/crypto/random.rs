//! Random number sources
//!
//! Two generators with different contracts:
//! - the OS CSPRNG, for anything an adversary must not predict. A failure of
//!   the OS source aborts the process; there is no degraded mode.
//! - [`InsecureRand`], a multiply-with-carry generator for tie-breaking and
//!   jitter only. It can run from the fixed seed `(11, 11)` so tests replay
//!   the same stream.

use log::error;
use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use rand_core::{impls, RngCore};
use std::sync::Mutex;
use thiserror::Error;

/// Seed used by both state words in deterministic mode
pub const DETERMINISTIC_SEED: u32 = 11;

/// `Rz` seed that maps to itself under the MWC step
pub const RZ_FIXED_POINT: u32 = 0x9068_ffff;

/// `Rw` seed that maps to itself under the MWC step
pub const RW_FIXED_POINT: u32 = 0x464f_ffff;

const RZ_MULTIPLIER: u32 = 36969;
const RW_MULTIPLIER: u32 = 18000;

/// Random source errors
#[derive(Debug, Error)]
pub enum RandomError {
    #[error("secure random source failed: {0}")]
    SourceFailed(String),
}

/// Fill `buf` from `rng`, reporting failure instead of aborting
pub fn try_fill_secure<R: RngCore + ?Sized>(rng: &mut R, buf: &mut [u8]) -> Result<(), RandomError> {
    rng.try_fill_bytes(buf)
        .map_err(|e| RandomError::SourceFailed(e.to_string()))
}

/// Fill `buf` with bytes from the OS CSPRNG
///
/// Aborts the process if the OS source reports failure.
pub fn get_rand_bytes(buf: &mut [u8]) {
    if let Err(err) = try_fill_secure(&mut OsRng, buf) {
        error!("get_rand_bytes: {}", err);
        std::process::abort();
    }
}

/// Uniform value in `[0, max)` from the OS CSPRNG
///
/// Values above the largest multiple of `max` are redrawn so the result has
/// no modulo bias. Returns 0 when `max` is 0.
pub fn get_rand(max: u64) -> u64 {
    if max == 0 {
        return 0;
    }

    let range = (u64::MAX / max) * max;
    loop {
        let mut bytes = [0u8; 8];
        get_rand_bytes(&mut bytes);
        let value = u64::from_le_bytes(bytes);
        if value < range {
            return value % max;
        }
    }
}

/// Fast non-cryptographic generator (two combined 16-bit MWC lags)
///
/// Not safe for adversarial use. A value must not be shared between threads
/// without external locking; use [`insecure_rand`] for the shared stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsecureRand {
    rz: u32,
    rw: u32,
    deterministic: bool,
}

impl InsecureRand {
    /// Create a generator; `deterministic` selects the fixed `(11, 11)` seed
    pub fn new(deterministic: bool) -> Self {
        if deterministic {
            Self::deterministic()
        } else {
            Self::randomized()
        }
    }

    /// Generator seeded with `(11, 11)`
    pub fn deterministic() -> Self {
        Self {
            rz: DETERMINISTIC_SEED,
            rw: DETERMINISTIC_SEED,
            deterministic: true,
        }
    }

    /// Generator seeded from the OS CSPRNG
    ///
    /// Aborts on OS source failure, like [`get_rand_bytes`].
    pub fn randomized() -> Self {
        match Self::from_rng(&mut OsRng) {
            Ok(rng) => rng,
            Err(err) => {
                error!("InsecureRand seeding: {}", err);
                std::process::abort();
            }
        }
    }

    /// Seed from `rng`, skipping zero and the fixed point of each lag
    pub fn from_rng<R: RngCore + ?Sized>(rng: &mut R) -> Result<Self, RandomError> {
        let rz = draw_seed(rng, RZ_FIXED_POINT)?;
        let rw = draw_seed(rng, RW_FIXED_POINT)?;
        Ok(Self {
            rz,
            rw,
            deterministic: false,
        })
    }

    /// Current `(Rz, Rw)` state
    pub fn state(&self) -> (u32, u32) {
        (self.rz, self.rw)
    }

    pub fn is_deterministic(&self) -> bool {
        self.deterministic
    }

    /// Advance both lags and combine them
    pub fn next(&mut self) -> u32 {
        self.rz = mwc_step(self.rz, RZ_MULTIPLIER);
        self.rw = mwc_step(self.rw, RW_MULTIPLIER);
        (self.rw << 16).wrapping_add(self.rz)
    }

    /// Value in `[0, max)`; slight modulo bias is accepted here
    pub fn below(&mut self, max: u32) -> u32 {
        if max == 0 {
            0
        } else {
            self.next() % max
        }
    }
}

impl RngCore for InsecureRand {
    fn next_u32(&mut self) -> u32 {
        self.next()
    }

    fn next_u64(&mut self) -> u64 {
        impls::next_u64_via_u32(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        impls::fill_bytes_via_next(self, dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

fn mwc_step(state: u32, multiplier: u32) -> u32 {
    multiplier
        .wrapping_mul(state & 0xffff)
        .wrapping_add(state >> 16)
}

fn draw_seed<R: RngCore + ?Sized>(rng: &mut R, fixed_point: u32) -> Result<u32, RandomError> {
    loop {
        let mut bytes = [0u8; 4];
        try_fill_secure(rng, &mut bytes)?;
        let candidate = u32::from_le_bytes(bytes);
        if candidate != 0 && candidate != fixed_point {
            return Ok(candidate);
        }
    }
}

static SHARED_INSECURE: Lazy<Mutex<InsecureRand>> =
    Lazy::new(|| Mutex::new(InsecureRand::deterministic()));

/// Reseed the process-wide insecure stream
pub fn seed_insecure_rand(deterministic: bool) {
    let fresh = InsecureRand::new(deterministic);
    let mut shared = SHARED_INSECURE.lock().unwrap_or_else(|e| e.into_inner());
    *shared = fresh;
}

/// Next value of the process-wide insecure stream
pub fn insecure_rand() -> u32 {
    SHARED_INSECURE
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .next()
}
