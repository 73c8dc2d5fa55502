//! Core BN254 signing operations over raw group elements.
//!
//! Private keys are scalars in `Fr`, public keys live in G2
//! (`pk = sk * G2`), and signatures live in G1 (`sig = sk * H(m)`).
//! The wrapper types in the parent module delegate here.

use super::{group, map};
use crate::Error;
use ark_bn254::{Fr, G1Affine, G2Affine};
use ark_ec::CurveGroup;
use ark_ff::{
    field_hashers::{DefaultFieldHasher, HashToField},
    UniformRand, Zero,
};
use rand::{CryptoRng, RngCore};
use sha2::Sha256;

/// Minimum seed length accepted by [keypair_from_seed].
pub const MIN_SEED_LENGTH: usize = 32;

/// Generates a uniformly random keypair.
pub fn keypair<R: RngCore + CryptoRng>(rng: &mut R) -> (Fr, G2Affine) {
    let mut private = Fr::rand(rng);
    while private.is_zero() {
        private = Fr::rand(rng);
    }
    (private, compute_public(&private))
}

/// Derives a keypair deterministically from a seed of at least
/// [MIN_SEED_LENGTH] bytes.
///
/// The seed is expanded to a uniform scalar with `hash_to_field` under
/// a keygen-specific domain separation tag, so the same seed always
/// yields the same key and the result is indistinguishable from a
/// random one.
pub fn keypair_from_seed(seed: &[u8]) -> Result<(Fr, G2Affine), Error> {
    if seed.len() < MIN_SEED_LENGTH {
        return Err(Error::SeedTooShort);
    }
    let hasher = <DefaultFieldHasher<Sha256, 128> as HashToField<Fr>>::new(group::DST_KEYGEN);
    let scalars: Vec<Fr> = hasher.hash_to_field(seed, 1);
    let private = scalars.into_iter().next().ok_or(Error::InvalidPrivateKey)?;
    if private.is_zero() {
        // Probability ~2^-254; rejected rather than mapped.
        return Err(Error::InvalidPrivateKey);
    }
    Ok((private, compute_public(&private)))
}

/// Computes the G2 public key for a private scalar.
pub fn compute_public(private: &Fr) -> G2Affine {
    (group::generator_g2() * private).into_affine()
}

/// Signs a message: `sig = sk * H(m)`.
pub fn sign(private: &Fr, message: &[u8]) -> Result<G1Affine, Error> {
    let hm = map::hash_to_point(message)?;
    Ok((hm * private).into_affine())
}

/// Verifies a signature against a single public key.
///
/// Returns `Ok(false)` for a well-formed signature that does not
/// validate; errors are reserved for hashing failures.
pub fn verify(public: &G2Affine, message: &[u8], signature: &G1Affine) -> Result<bool, Error> {
    let hm = map::hash_to_point(message)?.into_affine();
    Ok(group::equal(signature, &hm, public))
}

/// Aggregates signatures by point addition.
pub fn aggregate_signatures(signatures: &[G1Affine]) -> Result<G1Affine, Error> {
    if signatures.is_empty() {
        return Err(Error::EmptyInput);
    }
    Ok(group::sum_g1(signatures.iter().copied()))
}

/// Aggregates public keys by point addition.
pub fn aggregate_public_keys(publics: &[G2Affine]) -> Result<G2Affine, Error> {
    if publics.is_empty() {
        return Err(Error::EmptyInput);
    }
    Ok(group::sum_g2(publics.iter().copied()))
}

/// Verifies that each signer produced a valid signature over the same
/// message, by aggregating both sides and performing a single pairing
/// check. Sound because aggregation is linear: the aggregate signature
/// verifies under the aggregate key iff every individual pair does,
/// assuming no rogue-key inputs (callers validate membership).
pub fn batch_verify(
    publics: &[G2Affine],
    message: &[u8],
    signatures: &[G1Affine],
) -> Result<bool, Error> {
    if publics.len() != signatures.len() {
        return Err(Error::LengthMismatch(publics.len(), signatures.len()));
    }
    let signature = aggregate_signatures(signatures)?;
    let public = aggregate_public_keys(publics)?;
    verify(&public, message, &signature)
}

/// Verifies an aggregate signature where each public key signed its own
/// message, via a single multi-pairing product.
pub fn aggregate_verify(
    publics: &[G2Affine],
    messages: &[&[u8]],
    signature: &G1Affine,
) -> Result<bool, Error> {
    if publics.len() != messages.len() {
        return Err(Error::LengthMismatch(publics.len(), messages.len()));
    }
    if publics.is_empty() {
        return Err(Error::EmptyInput);
    }
    let mut hms = Vec::with_capacity(messages.len());
    for message in messages {
        hms.push(map::hash_to_point(message)?.into_affine());
    }
    Ok(group::equal_many(signature, &hms, publics))
}
