//! # Program-Derived Addresses
//!
//! `sha256(seed_1 ‖ … ‖ seed_n ‖ program_id ‖ "ProgramDerivedAddress")`,
//! rejected when the digest decompresses to an ed25519 point.
//!
//! `find_program_address` appends a one-byte bump and walks it down from 255
//! until the digest falls off the curve.

use crate::domain::{DerivationError, DerivedAddress, MAX_SEEDS, MAX_SEED_LEN, PDA_MARKER};
use ed25519_dalek::VerifyingKey;
use sha2::{Digest, Sha256};
use shared_types::Address;

/// Check whether 32 bytes decompress to a point on the ed25519 curve.
pub fn is_on_curve(bytes: &[u8; 32]) -> bool {
    VerifyingKey::from_bytes(bytes).is_ok()
}

fn check_seeds(seeds: &[&[u8]], max_count: usize) -> Result<(), DerivationError> {
    if seeds.len() > max_count {
        return Err(DerivationError::TooManySeeds {
            count: seeds.len(),
            max: max_count,
        });
    }
    for (position, seed) in seeds.iter().enumerate() {
        if seed.len() > MAX_SEED_LEN {
            return Err(DerivationError::SeedTooLong {
                position,
                len: seed.len(),
                max: MAX_SEED_LEN,
            });
        }
    }
    Ok(())
}

fn hash_seeds(seeds: &[&[u8]], bump: Option<u8>, program_id: &Address) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed);
    }
    if let Some(bump) = bump {
        hasher.update([bump]);
    }
    hasher.update(program_id.as_bytes());
    hasher.update(PDA_MARKER);
    hasher.finalize().into()
}

/// Derive an address from an exact seed tuple (any bump already included).
///
/// Fails with `OnCurve` if the digest is a valid curve point.
pub fn create_program_address(
    seeds: &[&[u8]],
    program_id: &Address,
) -> Result<Address, DerivationError> {
    check_seeds(seeds, MAX_SEEDS)?;
    let digest = hash_seeds(seeds, None, program_id);
    if is_on_curve(&digest) {
        return Err(DerivationError::OnCurve);
    }
    Ok(Address::new(digest))
}

/// Find the first off-curve address for `seeds ‖ [bump]`, bump from 255 down.
pub fn find_program_address(
    seeds: &[&[u8]],
    program_id: &Address,
) -> Result<DerivedAddress, DerivationError> {
    // One slot is reserved for the bump.
    check_seeds(seeds, MAX_SEEDS - 1)?;
    for bump in (0..=u8::MAX).rev() {
        let digest = hash_seeds(seeds, Some(bump), program_id);
        if !is_on_curve(&digest) {
            return Ok(DerivedAddress {
                address: Address::new(digest),
                bump,
            });
        }
    }
    Err(DerivationError::NoViableBump)
}
