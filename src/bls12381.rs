//! BLS signatures over BLS12-381 in the `min_sig` orientation, backed by
//! `blst`.
//!
//! Matches the BN254 module's layout (public keys in G2, signatures in G1)
//! so the two families are interchangeable behind [SigningScheme]. Hashing
//! uses the ciphersuite `BLS_SIG_BLS12381G1_XMD:SHA-256_SSWU_RO_NUL_`.
//! Hierarchical key derivation per EIP-2333 is supported natively.

use crate::{Error, KeyMaterial, SigningScheme};
use blst::min_sig::{
    AggregatePublicKey, AggregateSignature, PublicKey as BlstPublicKey, SecretKey as BlstSecretKey,
    Signature as BlstSignature,
};
use blst::BLST_ERROR;
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};
use std::fmt::{Debug, Display, Formatter};

/// Domain separation tag for signatures (RFC 9380 ciphersuite ID).
pub const DST: &[u8] = b"BLS_SIG_BLS12381G1_XMD:SHA-256_SSWU_RO_NUL_";

/// Length of an encoded private key.
pub const PRIVATE_KEY_LENGTH: usize = 32;
/// Length of a compressed G2 public key.
pub const PUBLIC_KEY_LENGTH: usize = 96;
/// Length of a compressed G1 signature.
pub const SIGNATURE_LENGTH: usize = 48;
/// Minimum seed length for deterministic and EIP-2333 key derivation.
pub const MIN_SEED_LENGTH: usize = 32;

/// A BLS12-381 private key.
///
/// The underlying scalar is wiped on drop by `blst`. `Debug` output is
/// redacted.
#[derive(Clone)]
pub struct PrivateKey(BlstSecretKey);

impl PrivateKey {
    /// Computes the corresponding public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.sk_to_pk())
    }

    /// Signs a message with this key.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.0.sign(message, DST, &[]))
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bytes() == other.0.to_bytes()
    }
}

impl Eq for PrivateKey {}

impl Debug for PrivateKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "PrivateKey(..)")
    }
}

impl KeyMaterial for PrivateKey {
    fn to_bytes(&self) -> Vec<u8> {
        self.0.to_bytes().to_vec()
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != PRIVATE_KEY_LENGTH {
            return Err(Error::InvalidLength(PRIVATE_KEY_LENGTH, bytes.len()));
        }
        BlstSecretKey::from_bytes(bytes)
            .map(Self)
            .map_err(|_| Error::InvalidPrivateKey)
    }
}

/// A BLS12-381 public key (a point in G2).
#[derive(Clone, Copy)]
pub struct PublicKey(BlstPublicKey);

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bytes() == other.0.to_bytes()
    }
}

impl Eq for PublicKey {}

impl Debug for PublicKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublicKey({self})")
    }
}

impl Display for PublicKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0.to_bytes()))
    }
}

impl KeyMaterial for PublicKey {
    fn to_bytes(&self) -> Vec<u8> {
        self.0.to_bytes().to_vec()
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != PUBLIC_KEY_LENGTH {
            return Err(Error::InvalidLength(PUBLIC_KEY_LENGTH, bytes.len()));
        }
        // Checks subgroup membership and rejects the identity.
        BlstPublicKey::key_validate(bytes)
            .map(Self)
            .map_err(|_| Error::InvalidPoint)
    }
}

/// A BLS12-381 signature (a point in G1).
#[derive(Clone, Copy)]
pub struct Signature(BlstSignature);

impl Signature {
    /// Verifies this signature against a public key and message.
    pub fn verify(&self, public: &PublicKey, message: &[u8]) -> bool {
        self.0.verify(false, message, DST, &[], &public.0, false) == BLST_ERROR::BLST_SUCCESS
    }
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bytes() == other.0.to_bytes()
    }
}

impl Eq for Signature {}

impl Debug for Signature {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signature({self})")
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0.to_bytes()))
    }
}

impl KeyMaterial for Signature {
    fn to_bytes(&self) -> Vec<u8> {
        self.0.to_bytes().to_vec()
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(Error::InvalidLength(SIGNATURE_LENGTH, bytes.len()));
        }
        // Checks subgroup membership and rejects the identity.
        BlstSignature::sig_validate(bytes, true)
            .map(Self)
            .map_err(|_| Error::InvalidPoint)
    }
}

/// The BLS12-381 signing scheme.
#[derive(Clone, Debug)]
pub struct Bls12381;

impl SigningScheme for Bls12381 {
    const NAME: &'static str = "bls381";

    type PrivateKey = PrivateKey;
    type PublicKey = PublicKey;
    type Signature = Signature;

    fn keypair<R: RngCore + CryptoRng>(rng: &mut R) -> (PrivateKey, PublicKey) {
        // key_gen only fails on short ikm; 64 bytes always succeeds, so
        // the loop runs once.
        let secret = loop {
            let mut ikm = [0u8; 64];
            rng.fill_bytes(&mut ikm);
            if let Ok(secret) = BlstSecretKey::key_gen(&ikm, &[]) {
                break secret;
            }
        };
        let private = PrivateKey(secret);
        let public = private.public_key();
        (private, public)
    }

    fn keypair_from_seed(seed: &[u8]) -> Result<(PrivateKey, PublicKey), Error> {
        if seed.len() < MIN_SEED_LENGTH {
            return Err(Error::SeedTooShort);
        }
        // Normalize the seed before HKDF key generation so keys depend on
        // the full seed regardless of its length.
        let ikm = Sha256::digest(seed);
        let secret = BlstSecretKey::key_gen(&ikm, &[]).map_err(|_| Error::InvalidPrivateKey)?;
        let private = PrivateKey(secret);
        let public = private.public_key();
        Ok((private, public))
    }

    fn keypair_eip2333(seed: &[u8], path: &[u32]) -> Result<(PrivateKey, PublicKey), Error> {
        if seed.len() < MIN_SEED_LENGTH {
            return Err(Error::SeedTooShort);
        }
        let mut secret =
            BlstSecretKey::derive_master_eip2333(seed).map_err(|_| Error::InvalidPrivateKey)?;
        for index in path {
            secret = secret.derive_child_eip2333(*index);
        }
        let private = PrivateKey(secret);
        let public = private.public_key();
        Ok((private, public))
    }

    fn public_key(private: &PrivateKey) -> PublicKey {
        private.public_key()
    }

    fn sign(private: &PrivateKey, message: &[u8]) -> Result<Signature, Error> {
        Ok(private.sign(message))
    }

    fn verify(public: &PublicKey, message: &[u8], signature: &Signature) -> Result<bool, Error> {
        Ok(signature.verify(public, message))
    }

    fn aggregate_signatures(signatures: &[Signature]) -> Result<Signature, Error> {
        if signatures.is_empty() {
            return Err(Error::EmptyInput);
        }
        let refs: Vec<&BlstSignature> = signatures.iter().map(|sig| &sig.0).collect();
        let aggregate =
            AggregateSignature::aggregate(&refs, false).map_err(|_| Error::InvalidPoint)?;
        Ok(Signature(aggregate.to_signature()))
    }

    fn aggregate_public_keys(publics: &[PublicKey]) -> Result<PublicKey, Error> {
        if publics.is_empty() {
            return Err(Error::EmptyInput);
        }
        let refs: Vec<&BlstPublicKey> = publics.iter().map(|pk| &pk.0).collect();
        let aggregate =
            AggregatePublicKey::aggregate(&refs, false).map_err(|_| Error::InvalidPoint)?;
        Ok(PublicKey(aggregate.to_public_key()))
    }

    fn batch_verify(
        publics: &[PublicKey],
        message: &[u8],
        signatures: &[Signature],
    ) -> Result<bool, Error> {
        if publics.len() != signatures.len() {
            return Err(Error::LengthMismatch(publics.len(), signatures.len()));
        }
        let aggregate = Self::aggregate_signatures(signatures)?;
        let refs: Vec<&BlstPublicKey> = publics.iter().map(|pk| &pk.0).collect();
        Ok(aggregate.0.fast_aggregate_verify(false, message, DST, &refs)
            == BLST_ERROR::BLST_SUCCESS)
    }

    fn aggregate_verify(
        publics: &[PublicKey],
        messages: &[&[u8]],
        signature: &Signature,
    ) -> Result<bool, Error> {
        if publics.len() != messages.len() {
            return Err(Error::LengthMismatch(publics.len(), messages.len()));
        }
        if publics.is_empty() {
            return Err(Error::EmptyInput);
        }
        let refs: Vec<&BlstPublicKey> = publics.iter().map(|pk| &pk.0).collect();
        Ok(signature
            .0
            .aggregate_verify(false, messages, DST, &refs, false)
            == BLST_ERROR::BLST_SUCCESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_encoding_lengths() {
        let mut rng = StdRng::seed_from_u64(0);
        let (private, public) = Bls12381::keypair(&mut rng);
        assert_eq!(private.to_bytes().len(), PRIVATE_KEY_LENGTH);
        assert_eq!(public.to_bytes().len(), PUBLIC_KEY_LENGTH);
        let signature = private.sign(b"msg");
        assert_eq!(signature.to_bytes().len(), SIGNATURE_LENGTH);
    }

    #[test]
    fn test_private_key_debug_redacted() {
        let mut rng = StdRng::seed_from_u64(1);
        let (private, _) = Bls12381::keypair(&mut rng);
        assert_eq!(format!("{private:?}"), "PrivateKey(..)");
    }

    #[test]
    fn test_zero_private_key_rejected() {
        assert!(PrivateKey::from_bytes(&[0u8; PRIVATE_KEY_LENGTH]).is_err());
    }

    #[test]
    fn test_eip2333_seed_boundary() {
        // Exactly the minimum length derives; one byte short is rejected
        // by the length check, the only source of SeedTooShort.
        assert!(Bls12381::keypair_eip2333(&[3u8; MIN_SEED_LENGTH], &[]).is_ok());
        assert!(matches!(
            Bls12381::keypair_eip2333(&[3u8; MIN_SEED_LENGTH - 1], &[]),
            Err(Error::SeedTooShort)
        ));
    }

    #[test]
    fn test_eip2333_empty_path_is_master() {
        let seed = [5u8; 32];
        let (master, _) = Bls12381::keypair_eip2333(&seed, &[]).unwrap();
        let (child, _) = Bls12381::keypair_eip2333(&seed, &[0]).unwrap();
        assert_ne!(master, child);
    }

    #[test]
    fn test_eip2333_path_order_matters() {
        let seed = [6u8; 32];
        let (a, _) = Bls12381::keypair_eip2333(&seed, &[1, 2]).unwrap();
        let (b, _) = Bls12381::keypair_eip2333(&seed, &[2, 1]).unwrap();
        assert_ne!(a, b);
    }
}
