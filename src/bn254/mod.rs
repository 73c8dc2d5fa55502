//! BLS-style signatures over the BN254 pairing curve.
//!
//! Public keys are points in G2 (`pk = sk * G2`, 64 bytes compressed) and
//! signatures are points in G1 (`sig = sk * H(m)`, 32 bytes compressed).
//! Messages are hashed to G1 with `expand_message_xmd` (SHA-256) and the
//! Shallue-van de Woestijne map under the fixed domain separation tag
//! `BLS_SIG_BN254G1_XMD:SHA-256_SVDW_RO_NUL_`.
//!
//! Verification is a single pairing-product check
//! `e(sig, -G2) * e(H(m), pk) == 1`; aggregation of signatures and public
//! keys is plain point addition. Callers are responsible for rogue-key
//! defenses (proofs of possession over the operator roster, as the
//! certificate layer assumes).

use crate::{Error, KeyMaterial, SigningScheme};
use ark_bn254::{Fr, G1Affine, G2Affine};
use ark_ff::Zero;
use rand::{CryptoRng, RngCore};
use std::fmt::{Debug, Display, Formatter};
use zeroize::Zeroize;

mod group;
mod map;
mod ops;

pub use group::{G1_ELEMENT_BYTE_LENGTH, G2_ELEMENT_BYTE_LENGTH, SCALAR_LENGTH};
pub use ops::MIN_SEED_LENGTH;

/// A BN254 private key (a nonzero scalar in `Fr`).
///
/// The scalar is wiped on drop. `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey(Fr);

impl PrivateKey {
    /// Computes the corresponding public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(ops::compute_public(&self.0))
    }

    /// Signs a message with this key.
    pub fn sign(&self, message: &[u8]) -> Result<Signature, Error> {
        ops::sign(&self.0, message).map(Signature)
    }
}

impl Zeroize for PrivateKey {
    fn zeroize(&mut self) {
        self.0 = Fr::zero();
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl Debug for PrivateKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "PrivateKey(..)")
    }
}

impl KeyMaterial for PrivateKey {
    fn to_bytes(&self) -> Vec<u8> {
        group::serialize_scalar(&self.0)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let scalar = group::deserialize_scalar(bytes)?;
        if scalar.is_zero() {
            return Err(Error::InvalidPrivateKey);
        }
        Ok(Self(scalar))
    }
}

/// A BN254 public key (a point in G2).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey(G2Affine);

impl Debug for PublicKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublicKey({self})")
    }
}

impl Display for PublicKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.to_bytes()))
    }
}

impl KeyMaterial for PublicKey {
    fn to_bytes(&self) -> Vec<u8> {
        group::serialize_g2(&self.0)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        group::deserialize_g2(bytes).map(Self)
    }
}

/// A BN254 signature (a point in G1).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature(G1Affine);

impl Signature {
    /// Verifies this signature against a public key and message.
    pub fn verify(&self, public: &PublicKey, message: &[u8]) -> Result<bool, Error> {
        ops::verify(&public.0, message, &self.0)
    }
}

impl Debug for Signature {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signature({self})")
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.to_bytes()))
    }
}

impl KeyMaterial for Signature {
    fn to_bytes(&self) -> Vec<u8> {
        group::serialize_g1(&self.0)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        group::deserialize_g1(bytes).map(Self)
    }
}

/// The BN254 signing scheme.
#[derive(Clone, Debug)]
pub struct Bn254;

impl SigningScheme for Bn254 {
    const NAME: &'static str = "bn254";

    type PrivateKey = PrivateKey;
    type PublicKey = PublicKey;
    type Signature = Signature;

    fn keypair<R: RngCore + CryptoRng>(rng: &mut R) -> (PrivateKey, PublicKey) {
        let (private, public) = ops::keypair(rng);
        (PrivateKey(private), PublicKey(public))
    }

    fn keypair_from_seed(seed: &[u8]) -> Result<(PrivateKey, PublicKey), Error> {
        let (private, public) = ops::keypair_from_seed(seed)?;
        Ok((PrivateKey(private), PublicKey(public)))
    }

    fn keypair_eip2333(_seed: &[u8], _path: &[u32]) -> Result<(PrivateKey, PublicKey), Error> {
        Err(Error::UnsupportedOperation("eip-2333 derivation"))
    }

    fn public_key(private: &PrivateKey) -> PublicKey {
        private.public_key()
    }

    fn sign(private: &PrivateKey, message: &[u8]) -> Result<Signature, Error> {
        private.sign(message)
    }

    fn verify(public: &PublicKey, message: &[u8], signature: &Signature) -> Result<bool, Error> {
        signature.verify(public, message)
    }

    fn aggregate_signatures(signatures: &[Signature]) -> Result<Signature, Error> {
        let points: Vec<G1Affine> = signatures.iter().map(|sig| sig.0).collect();
        ops::aggregate_signatures(&points).map(Signature)
    }

    fn aggregate_public_keys(publics: &[PublicKey]) -> Result<PublicKey, Error> {
        let points: Vec<G2Affine> = publics.iter().map(|pk| pk.0).collect();
        ops::aggregate_public_keys(&points).map(PublicKey)
    }

    fn batch_verify(
        publics: &[PublicKey],
        message: &[u8],
        signatures: &[Signature],
    ) -> Result<bool, Error> {
        let publics: Vec<G2Affine> = publics.iter().map(|pk| pk.0).collect();
        let signatures: Vec<G1Affine> = signatures.iter().map(|sig| sig.0).collect();
        ops::batch_verify(&publics, message, &signatures)
    }

    fn aggregate_verify(
        publics: &[PublicKey],
        messages: &[&[u8]],
        signature: &Signature,
    ) -> Result<bool, Error> {
        let publics: Vec<G2Affine> = publics.iter().map(|pk| pk.0).collect();
        ops::aggregate_verify(&publics, messages, &signature.0)
    }
}
