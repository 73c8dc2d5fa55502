//! Generate keys, sign arbitrary messages, and aggregate signatures over
//! pairing-friendly curves, with a threshold certificate protocol for
//! collecting operator signatures until a quorum is met.
//!
//! Two curve families are provided behind the same [SigningScheme] contract:
//! [bn254::Bn254] (public keys in G2, signatures in G1, hash-to-curve per
//! RFC 9380 with the Shallue-van de Woestijne map) and [bls12381::Bls12381]
//! (ZCash `min_sig` orientation, backed by `blst`). Higher layers that must
//! remain curve-agnostic can select an implementation by name with
//! [signing_scheme].

use rand::{rngs::OsRng, CryptoRng, RngCore};
use std::fmt::Debug;
use thiserror::Error;

pub mod bls12381;
pub mod bn254;
pub mod certificate;

/// Errors that can occur when working with keys, signatures, and aggregation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid private key")]
    InvalidPrivateKey,
    #[error("invalid point encoding")]
    InvalidPoint,
    #[error("invalid length: expected {0}, got {1}")]
    InvalidLength(usize, usize),
    #[error("hash-to-curve failed")]
    HashToCurve,
    #[error("seed too short")]
    SeedTooShort,
    #[error("empty input")]
    EmptyInput,
    #[error("length mismatch: {0} != {1}")]
    LengthMismatch(usize, usize),
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(&'static str),
    #[error("unknown signing scheme: {0}")]
    UnknownScheme(String),
}

/// Key material with an exact round-trip byte encoding.
///
/// `from_bytes(to_bytes(x)) == x` for every valid value. Decoding bytes that
/// are the wrong length, off-curve, outside the prime-order subgroup, or the
/// identity fails with an error (never coerced to a nearby valid value).
pub trait KeyMaterial: Clone + Eq + Debug + Send + Sync + Sized + 'static {
    /// Canonically serializes the value.
    fn to_bytes(&self) -> Vec<u8>;

    /// Deserializes and fully validates a canonically encoded value.
    fn from_bytes(bytes: &[u8]) -> Result<Self, Error>;
}

/// A curve family implementing BLS-style signing, verification, and
/// aggregation.
///
/// All operations are deterministic except [SigningScheme::keypair] (which
/// draws from the provided CSPRNG): signing introduces no randomness, and
/// [SigningScheme::keypair_from_seed] is a pure function of its seed.
pub trait SigningScheme: Clone + Debug + Send + Sync + 'static {
    /// Name used by [signing_scheme] to select this implementation.
    const NAME: &'static str;

    /// A scalar in the curve's scalar field.
    type PrivateKey: KeyMaterial;

    /// A point equal to `private · Generator2`.
    type PublicKey: KeyMaterial;

    /// A point equal to `private · HashToCurve(message)`.
    type Signature: KeyMaterial;

    /// Returns a new keypair derived from the provided randomness.
    fn keypair<R: RngCore + CryptoRng>(rng: &mut R) -> (Self::PrivateKey, Self::PublicKey);

    /// Returns a keypair derived deterministically from the provided seed.
    ///
    /// Identical seeds produce identical keypairs, byte-for-byte, across
    /// processes and platforms.
    fn keypair_from_seed(seed: &[u8]) -> Result<(Self::PrivateKey, Self::PublicKey), Error>;

    /// Returns a keypair derived hierarchically per EIP-2333, following
    /// `path` from the master key.
    ///
    /// Curves without EIP-2333 support return
    /// [Error::UnsupportedOperation] (never a silent fallback).
    fn keypair_eip2333(
        seed: &[u8],
        path: &[u32],
    ) -> Result<(Self::PrivateKey, Self::PublicKey), Error>;

    /// Computes the public key corresponding to the private key.
    fn public_key(private: &Self::PrivateKey) -> Self::PublicKey;

    /// Signs the message with the private key.
    ///
    /// The message is mapped to the curve under a fixed, standardized
    /// domain-separation tag; an error indicates the hash-to-curve
    /// machinery failed, not a bad message.
    fn sign(private: &Self::PrivateKey, message: &[u8]) -> Result<Self::Signature, Error>;

    /// Verifies the signature against the public key and message.
    ///
    /// A mismatched signature is a clean `Ok(false)`; the error channel is
    /// reserved for pairing-computation failures.
    fn verify(
        public: &Self::PublicKey,
        message: &[u8],
        signature: &Self::Signature,
    ) -> Result<bool, Error>;

    /// Sums the provided signatures into one. Fails on an empty list.
    fn aggregate_signatures(signatures: &[Self::Signature]) -> Result<Self::Signature, Error>;

    /// Sums the provided public keys into one. Fails on an empty list.
    fn aggregate_public_keys(publics: &[Self::PublicKey]) -> Result<Self::PublicKey, Error>;

    /// Verifies N signatures over the same message against N public keys
    /// with a single aggregated pairing check.
    ///
    /// Requires `publics.len() == signatures.len()` and at least one entry.
    fn batch_verify(
        publics: &[Self::PublicKey],
        message: &[u8],
        signatures: &[Self::Signature],
    ) -> Result<bool, Error>;

    /// Verifies one combined signature against N distinct
    /// `(public key, message)` pairs with a multi-pairing product check.
    ///
    /// Requires `publics.len() == messages.len()` and at least one entry.
    fn aggregate_verify(
        publics: &[Self::PublicKey],
        messages: &[&[u8]],
        signature: &Self::Signature,
    ) -> Result<bool, Error>;
}

/// Object-safe, byte-oriented view of a [SigningScheme].
///
/// Every key and signature crosses this interface as its canonical byte
/// encoding, so callers can hold a `Box<dyn DynSigningScheme>` without
/// naming a curve family.
pub trait DynSigningScheme: Send + Sync {
    /// Name of the underlying curve family.
    fn name(&self) -> &'static str;

    /// Generates a keypair from the operating system's entropy source.
    fn generate_keypair(&self) -> (Vec<u8>, Vec<u8>);

    /// Derives a keypair deterministically from the provided seed.
    fn keypair_from_seed(&self, seed: &[u8]) -> Result<(Vec<u8>, Vec<u8>), Error>;

    /// Derives a keypair hierarchically per EIP-2333.
    fn keypair_eip2333(&self, seed: &[u8], path: &[u32]) -> Result<(Vec<u8>, Vec<u8>), Error>;

    /// Computes the public key for an encoded private key.
    fn public_key(&self, private: &[u8]) -> Result<Vec<u8>, Error>;

    /// Validates an encoded public key.
    fn validate_public_key(&self, public: &[u8]) -> Result<(), Error>;

    /// Validates an encoded signature.
    fn validate_signature(&self, signature: &[u8]) -> Result<(), Error>;

    /// Signs the message with an encoded private key.
    fn sign(&self, private: &[u8], message: &[u8]) -> Result<Vec<u8>, Error>;

    /// Verifies an encoded signature against an encoded public key.
    fn verify(&self, public: &[u8], message: &[u8], signature: &[u8]) -> Result<bool, Error>;

    /// Sums encoded signatures into one.
    fn aggregate_signatures(&self, signatures: &[Vec<u8>]) -> Result<Vec<u8>, Error>;

    /// Sums encoded public keys into one.
    fn aggregate_public_keys(&self, publics: &[Vec<u8>]) -> Result<Vec<u8>, Error>;

    /// Same-message batch verification over encoded inputs.
    fn batch_verify(
        &self,
        publics: &[Vec<u8>],
        message: &[u8],
        signatures: &[Vec<u8>],
    ) -> Result<bool, Error>;

    /// Multi-message aggregate verification over encoded inputs.
    fn aggregate_verify(
        &self,
        publics: &[Vec<u8>],
        messages: &[&[u8]],
        signature: &[u8],
    ) -> Result<bool, Error>;
}

/// Adapter implementing [DynSigningScheme] for any [SigningScheme].
struct Erased<S: SigningScheme>(std::marker::PhantomData<S>);

impl<S: SigningScheme> Erased<S> {
    const fn new() -> Self {
        Self(std::marker::PhantomData)
    }

    fn decode_publics(publics: &[Vec<u8>]) -> Result<Vec<S::PublicKey>, Error> {
        publics
            .iter()
            .map(|pk| S::PublicKey::from_bytes(pk))
            .collect()
    }

    fn decode_signatures(signatures: &[Vec<u8>]) -> Result<Vec<S::Signature>, Error> {
        signatures
            .iter()
            .map(|sig| S::Signature::from_bytes(sig))
            .collect()
    }
}

impl<S: SigningScheme> DynSigningScheme for Erased<S> {
    fn name(&self) -> &'static str {
        S::NAME
    }

    fn generate_keypair(&self) -> (Vec<u8>, Vec<u8>) {
        let (private, public) = S::keypair(&mut OsRng);
        (private.to_bytes(), public.to_bytes())
    }

    fn keypair_from_seed(&self, seed: &[u8]) -> Result<(Vec<u8>, Vec<u8>), Error> {
        let (private, public) = S::keypair_from_seed(seed)?;
        Ok((private.to_bytes(), public.to_bytes()))
    }

    fn keypair_eip2333(&self, seed: &[u8], path: &[u32]) -> Result<(Vec<u8>, Vec<u8>), Error> {
        let (private, public) = S::keypair_eip2333(seed, path)?;
        Ok((private.to_bytes(), public.to_bytes()))
    }

    fn public_key(&self, private: &[u8]) -> Result<Vec<u8>, Error> {
        let private = S::PrivateKey::from_bytes(private)?;
        Ok(S::public_key(&private).to_bytes())
    }

    fn validate_public_key(&self, public: &[u8]) -> Result<(), Error> {
        S::PublicKey::from_bytes(public).map(|_| ())
    }

    fn validate_signature(&self, signature: &[u8]) -> Result<(), Error> {
        S::Signature::from_bytes(signature).map(|_| ())
    }

    fn sign(&self, private: &[u8], message: &[u8]) -> Result<Vec<u8>, Error> {
        let private = S::PrivateKey::from_bytes(private)?;
        Ok(S::sign(&private, message)?.to_bytes())
    }

    fn verify(&self, public: &[u8], message: &[u8], signature: &[u8]) -> Result<bool, Error> {
        let public = S::PublicKey::from_bytes(public)?;
        let signature = S::Signature::from_bytes(signature)?;
        S::verify(&public, message, &signature)
    }

    fn aggregate_signatures(&self, signatures: &[Vec<u8>]) -> Result<Vec<u8>, Error> {
        let signatures = Self::decode_signatures(signatures)?;
        Ok(S::aggregate_signatures(&signatures)?.to_bytes())
    }

    fn aggregate_public_keys(&self, publics: &[Vec<u8>]) -> Result<Vec<u8>, Error> {
        let publics = Self::decode_publics(publics)?;
        Ok(S::aggregate_public_keys(&publics)?.to_bytes())
    }

    fn batch_verify(
        &self,
        publics: &[Vec<u8>],
        message: &[u8],
        signatures: &[Vec<u8>],
    ) -> Result<bool, Error> {
        if publics.len() != signatures.len() {
            return Err(Error::LengthMismatch(publics.len(), signatures.len()));
        }
        let publics = Self::decode_publics(publics)?;
        let signatures = Self::decode_signatures(signatures)?;
        S::batch_verify(&publics, message, &signatures)
    }

    fn aggregate_verify(
        &self,
        publics: &[Vec<u8>],
        messages: &[&[u8]],
        signature: &[u8],
    ) -> Result<bool, Error> {
        if publics.len() != messages.len() {
            return Err(Error::LengthMismatch(publics.len(), messages.len()));
        }
        let publics = Self::decode_publics(publics)?;
        let signature = S::Signature::from_bytes(signature)?;
        S::aggregate_verify(&publics, messages, &signature)
    }
}

/// Selects a [DynSigningScheme] implementation by name.
///
/// Recognized names are `"bn254"` and `"bls381"`; anything else is
/// [Error::UnknownScheme].
pub fn signing_scheme(name: &str) -> Result<Box<dyn DynSigningScheme>, Error> {
    match name {
        bn254::Bn254::NAME => Ok(Box::new(Erased::<bn254::Bn254>::new())),
        bls12381::Bls12381::NAME => Ok(Box::new(Erased::<bls12381::Bls12381>::new())),
        other => Err(Error::UnknownScheme(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bls12381::Bls12381;
    use bn254::Bn254;
    use rand::{rngs::StdRng, SeedableRng};

    fn test_sign_and_verify<S: SigningScheme>() {
        let mut rng = StdRng::seed_from_u64(0);
        let (private, public) = S::keypair(&mut rng);
        let message = b"test_message";
        let signature = S::sign(&private, message).unwrap();
        assert!(S::verify(&public, message, &signature).unwrap());
    }

    fn test_sign_and_verify_wrong_message<S: SigningScheme>() {
        let mut rng = StdRng::seed_from_u64(0);
        let (private, public) = S::keypair(&mut rng);
        let signature = S::sign(&private, b"test_message").unwrap();
        assert!(!S::verify(&public, b"wrong_message", &signature).unwrap());
    }

    fn test_invalid_signature_publickey_pair<S: SigningScheme>() {
        let mut rng = StdRng::seed_from_u64(0);
        let (private, _) = S::keypair(&mut rng);
        let (_, unrelated) = S::keypair(&mut rng);
        let signature = S::sign(&private, b"test_message").unwrap();
        assert!(!S::verify(&unrelated, b"test_message", &signature).unwrap());
    }

    fn test_signature_determinism<S: SigningScheme>() {
        let (private_1, public_1) = S::keypair_from_seed(&[1u8; 32]).unwrap();
        let (private_2, public_2) = S::keypair_from_seed(&[1u8; 32]).unwrap();
        assert_eq!(private_1.to_bytes(), private_2.to_bytes());
        assert_eq!(public_1.to_bytes(), public_2.to_bytes());
        let signature_1 = S::sign(&private_1, b"test_message").unwrap();
        let signature_2 = S::sign(&private_2, b"test_message").unwrap();
        assert_eq!(signature_1.to_bytes(), signature_2.to_bytes());

        let (other, _) = S::keypair_from_seed(&[2u8; 32]).unwrap();
        assert_ne!(private_1.to_bytes(), other.to_bytes());

        // Short seeds are rejected outright.
        assert!(matches!(
            S::keypair_from_seed(&[0u8; 16]),
            Err(Error::SeedTooShort)
        ));
    }

    fn test_roundtrip_encodings<S: SigningScheme>() {
        let mut rng = StdRng::seed_from_u64(7);
        let (private, public) = S::keypair(&mut rng);
        let signature = S::sign(&private, b"roundtrip").unwrap();

        let private_2 = S::PrivateKey::from_bytes(&private.to_bytes()).unwrap();
        assert_eq!(private, private_2);
        let public_2 = S::PublicKey::from_bytes(&public.to_bytes()).unwrap();
        assert_eq!(public, public_2);
        let signature_2 = S::Signature::from_bytes(&signature.to_bytes()).unwrap();
        assert_eq!(signature, signature_2);
    }

    fn test_decode_garbage<S: SigningScheme>() {
        assert!(S::PublicKey::from_bytes(&[]).is_err());
        assert!(S::PublicKey::from_bytes(&[0u8; 1024]).is_err());
        assert!(S::Signature::from_bytes(&[0xffu8; 7]).is_err());
        let mut rng = StdRng::seed_from_u64(3);
        let (_, public) = S::keypair(&mut rng);
        let mut corrupted = public.to_bytes();
        let last = corrupted.len() - 1;
        corrupted[last] ^= 0x01;
        // Either decodes to a different key or fails outright; never the same key.
        if let Ok(decoded) = S::PublicKey::from_bytes(&corrupted) {
            assert_ne!(decoded, public);
        }
    }

    fn test_aggregation_laws<S: SigningScheme>() {
        let mut rng = StdRng::seed_from_u64(11);
        let (private_1, public_1) = S::keypair(&mut rng);
        let (private_2, public_2) = S::keypair(&mut rng);
        let message: &[u8] = b"shared message";
        let signature_1 = S::sign(&private_1, message).unwrap();
        let signature_2 = S::sign(&private_2, message).unwrap();

        let publics = [public_1, public_2];
        let signatures = [signature_1, signature_2];
        assert!(S::batch_verify(&publics, message, &signatures).unwrap());

        let aggregate = S::aggregate_signatures(&signatures).unwrap();
        assert!(S::aggregate_verify(&publics, &[message, message], &aggregate).unwrap());

        // A combined signature also verifies against the combined key.
        let combined_key = S::aggregate_public_keys(&publics).unwrap();
        assert!(S::verify(&combined_key, message, &aggregate).unwrap());
    }

    fn test_aggregate_verify_distinct_messages<S: SigningScheme>() {
        let mut rng = StdRng::seed_from_u64(13);
        let (private_1, public_1) = S::keypair(&mut rng);
        let (private_2, public_2) = S::keypair(&mut rng);
        let signature_1 = S::sign(&private_1, b"first").unwrap();
        let signature_2 = S::sign(&private_2, b"second").unwrap();
        let aggregate = S::aggregate_signatures(&[signature_1, signature_2]).unwrap();

        let publics = [public_1, public_2];
        assert!(S::aggregate_verify(&publics, &[b"first", b"second"], &aggregate).unwrap());
        assert!(!S::aggregate_verify(&publics, &[b"first", b"tampered"], &aggregate).unwrap());
    }

    fn test_aggregation_input_errors<S: SigningScheme>() {
        let mut rng = StdRng::seed_from_u64(17);
        let (private, public) = S::keypair(&mut rng);
        let signature = S::sign(&private, b"msg").unwrap();

        assert!(matches!(
            S::aggregate_signatures(&[]),
            Err(Error::EmptyInput)
        ));
        assert!(matches!(
            S::aggregate_public_keys(&[]),
            Err(Error::EmptyInput)
        ));
        assert!(matches!(
            S::batch_verify(&[public.clone()], b"msg", &[]),
            Err(Error::LengthMismatch(1, 0))
        ));
        assert!(matches!(
            S::aggregate_verify(&[public], &[], &signature),
            Err(Error::LengthMismatch(1, 0))
        ));
    }

    #[test]
    fn test_bn254_sign_and_verify() {
        test_sign_and_verify::<Bn254>();
    }

    #[test]
    fn test_bn254_sign_and_verify_wrong_message() {
        test_sign_and_verify_wrong_message::<Bn254>();
    }

    #[test]
    fn test_bn254_invalid_signature_publickey_pair() {
        test_invalid_signature_publickey_pair::<Bn254>();
    }

    #[test]
    fn test_bn254_signature_determinism() {
        test_signature_determinism::<Bn254>();
    }

    #[test]
    fn test_bn254_roundtrip_encodings() {
        test_roundtrip_encodings::<Bn254>();
    }

    #[test]
    fn test_bn254_decode_garbage() {
        test_decode_garbage::<Bn254>();
    }

    #[test]
    fn test_bn254_aggregation_laws() {
        test_aggregation_laws::<Bn254>();
    }

    #[test]
    fn test_bn254_aggregate_verify_distinct_messages() {
        test_aggregate_verify_distinct_messages::<Bn254>();
    }

    #[test]
    fn test_bn254_aggregation_input_errors() {
        test_aggregation_input_errors::<Bn254>();
    }

    #[test]
    fn test_bn254_eip2333_unsupported() {
        assert!(matches!(
            Bn254::keypair_eip2333(&[0u8; 32], &[0]),
            Err(Error::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn test_bls12381_sign_and_verify() {
        test_sign_and_verify::<Bls12381>();
    }

    #[test]
    fn test_bls12381_sign_and_verify_wrong_message() {
        test_sign_and_verify_wrong_message::<Bls12381>();
    }

    #[test]
    fn test_bls12381_invalid_signature_publickey_pair() {
        test_invalid_signature_publickey_pair::<Bls12381>();
    }

    #[test]
    fn test_bls12381_signature_determinism() {
        test_signature_determinism::<Bls12381>();
    }

    #[test]
    fn test_bls12381_roundtrip_encodings() {
        test_roundtrip_encodings::<Bls12381>();
    }

    #[test]
    fn test_bls12381_decode_garbage() {
        test_decode_garbage::<Bls12381>();
    }

    #[test]
    fn test_bls12381_aggregation_laws() {
        test_aggregation_laws::<Bls12381>();
    }

    #[test]
    fn test_bls12381_aggregate_verify_distinct_messages() {
        test_aggregate_verify_distinct_messages::<Bls12381>();
    }

    #[test]
    fn test_bls12381_aggregation_input_errors() {
        test_aggregation_input_errors::<Bls12381>();
    }

    #[test]
    fn test_bls12381_eip2333_deterministic() {
        let seed = [42u8; 32];
        let (private_1, public_1) = Bls12381::keypair_eip2333(&seed, &[0, 1]).unwrap();
        let (private_2, public_2) = Bls12381::keypair_eip2333(&seed, &[0, 1]).unwrap();
        assert_eq!(private_1, private_2);
        assert_eq!(public_1, public_2);

        // A different path yields a different key.
        let (private_3, _) = Bls12381::keypair_eip2333(&seed, &[0, 2]).unwrap();
        assert_ne!(private_1, private_3);

        // The derived key signs and verifies like any other.
        let signature = Bls12381::sign(&private_1, b"derived").unwrap();
        assert!(Bls12381::verify(&public_1, b"derived", &signature).unwrap());
    }

    #[test]
    fn test_bls12381_eip2333_short_seed() {
        assert!(matches!(
            Bls12381::keypair_eip2333(&[0u8; 16], &[0]),
            Err(Error::SeedTooShort)
        ));
    }

    #[test]
    fn test_factory_known_schemes() {
        for name in ["bn254", "bls381"] {
            let scheme = signing_scheme(name).unwrap();
            assert_eq!(scheme.name(), name);
        }
    }

    #[test]
    fn test_factory_unknown_scheme() {
        assert!(matches!(
            signing_scheme("ed25519"),
            Err(Error::UnknownScheme(_))
        ));
    }

    #[test]
    fn test_erased_roundtrip() {
        for name in ["bn254", "bls381"] {
            let scheme = signing_scheme(name).unwrap();
            let (private, public) = scheme.keypair_from_seed(&[9u8; 32]).unwrap();
            assert_eq!(scheme.public_key(&private).unwrap(), public);
            scheme.validate_public_key(&public).unwrap();

            let signature = scheme.sign(&private, b"message").unwrap();
            scheme.validate_signature(&signature).unwrap();
            assert!(scheme.verify(&public, b"message", &signature).unwrap());
            assert!(!scheme.verify(&public, b"other", &signature).unwrap());

            let aggregate = scheme.aggregate_signatures(&[signature.clone()]).unwrap();
            assert_eq!(aggregate, signature);
            assert!(scheme
                .batch_verify(&[public.clone()], b"message", &[signature.clone()])
                .unwrap());
            assert!(scheme
                .aggregate_verify(&[public], &[b"message"], &signature)
                .unwrap());
        }
    }
}
