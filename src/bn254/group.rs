//! Group operations over the BN254 pairing curve.
//!
//! Signatures live in G1 (32-byte compressed encoding) and public keys in G2
//! (64 bytes), so the cheap group carries the per-message work. Points are
//! checked to belong to the correct subgroup when deserialized; untrusted
//! bytes never reach the pairing without passing through [deserialize_g1] or
//! [deserialize_g2].

use crate::Error;
use ark_bn254::{Bn254, Fr, G1Affine, G1Projective, G2Affine, G2Projective};
use ark_ec::{pairing::Pairing, AffineRepr, CurveGroup, Group};
use ark_ff::Zero;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};

pub const SCALAR_LENGTH: usize = 32;
pub const G1_ELEMENT_BYTE_LENGTH: usize = 32;
pub const G2_ELEMENT_BYTE_LENGTH: usize = 64;

/// Domain separation tag for hashing a message to G1.
pub const DST_G1: &[u8] = b"BLS_SIG_BN254G1_XMD:SHA-256_SVDW_RO_NUL_";

/// Domain separation tag for deriving a scalar from a seed.
pub const DST_KEYGEN: &[u8] = b"BLS_KEYGEN_BN254FR_XMD:SHA-256_SEED_";

/// Canonically serializes a scalar.
pub fn serialize_scalar(scalar: &Fr) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(SCALAR_LENGTH);
    scalar
        .serialize_compressed(&mut bytes)
        .expect("serialization to a Vec cannot fail");
    bytes
}

/// Deserializes a canonically encoded scalar, rejecting values at or above
/// the field order.
pub fn deserialize_scalar(bytes: &[u8]) -> Result<Fr, Error> {
    if bytes.len() != SCALAR_LENGTH {
        return Err(Error::InvalidLength(SCALAR_LENGTH, bytes.len()));
    }
    Fr::deserialize_compressed(bytes).map_err(|_| Error::InvalidPrivateKey)
}

/// Canonically serializes a G1 point (compressed).
pub fn serialize_g1(point: &G1Affine) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(G1_ELEMENT_BYTE_LENGTH);
    point
        .serialize_compressed(&mut bytes)
        .expect("serialization to a Vec cannot fail");
    bytes
}

/// Deserializes a compressed G1 point, rejecting off-curve, wrong-subgroup,
/// and identity encodings.
pub fn deserialize_g1(bytes: &[u8]) -> Result<G1Affine, Error> {
    if bytes.len() != G1_ELEMENT_BYTE_LENGTH {
        return Err(Error::InvalidLength(G1_ELEMENT_BYTE_LENGTH, bytes.len()));
    }
    let point = G1Affine::deserialize_compressed(bytes).map_err(|_| Error::InvalidPoint)?;
    if point.is_zero() {
        return Err(Error::InvalidPoint);
    }
    Ok(point)
}

/// Canonically serializes a G2 point (compressed).
pub fn serialize_g2(point: &G2Affine) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(G2_ELEMENT_BYTE_LENGTH);
    point
        .serialize_compressed(&mut bytes)
        .expect("serialization to a Vec cannot fail");
    bytes
}

/// Deserializes a compressed G2 point, rejecting off-curve, wrong-subgroup,
/// and identity encodings.
pub fn deserialize_g2(bytes: &[u8]) -> Result<G2Affine, Error> {
    if bytes.len() != G2_ELEMENT_BYTE_LENGTH {
        return Err(Error::InvalidLength(G2_ELEMENT_BYTE_LENGTH, bytes.len()));
    }
    let point = G2Affine::deserialize_compressed(bytes).map_err(|_| Error::InvalidPoint)?;
    if point.is_zero() {
        return Err(Error::InvalidPoint);
    }
    Ok(point)
}

/// Returns the G2 generator.
pub fn generator_g2() -> G2Projective {
    G2Projective::generator()
}

/// Checks `e(sig, G2::one()) == e(hm, public)` as a single product with a
/// negated generator: `e(sig, -G2::one()) * e(hm, public) == 1`.
pub(super) fn equal(sig: &G1Affine, hm: &G1Affine, public: &G2Affine) -> bool {
    let neg_generator = (-G2Projective::generator()).into_affine();
    Bn254::multi_pairing([*sig, *hm], [neg_generator, *public]).is_zero()
}

/// Checks `e(sig, G2::one()) == prod_i e(hm_i, public_i)` with one
/// multi-pairing product.
pub(super) fn equal_many(sig: &G1Affine, hms: &[G1Affine], publics: &[G2Affine]) -> bool {
    debug_assert_eq!(hms.len(), publics.len());
    let neg_generator = (-G2Projective::generator()).into_affine();
    let mut g1 = Vec::with_capacity(hms.len() + 1);
    let mut g2 = Vec::with_capacity(publics.len() + 1);
    g1.push(*sig);
    g2.push(neg_generator);
    g1.extend_from_slice(hms);
    g2.extend_from_slice(publics);
    Bn254::multi_pairing(g1, g2).is_zero()
}

/// Sums G1 points in projective form, normalizing once at the end.
pub(super) fn sum_g1(points: impl IntoIterator<Item = G1Affine>) -> G1Affine {
    let mut acc = G1Projective::zero();
    for point in points {
        acc += point;
    }
    acc.into_affine()
}

/// Sums G2 points in projective form, normalizing once at the end.
pub(super) fn sum_g2(points: impl IntoIterator<Item = G2Affine>) -> G2Affine {
    let mut acc = G2Projective::zero();
    for point in points {
        acc += point;
    }
    acc.into_affine()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ff::UniformRand;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_scalar_roundtrip() {
        let mut rng = StdRng::seed_from_u64(0);
        let scalar = Fr::rand(&mut rng);
        let bytes = serialize_scalar(&scalar);
        assert_eq!(bytes.len(), SCALAR_LENGTH);
        assert_eq!(deserialize_scalar(&bytes).unwrap(), scalar);
    }

    #[test]
    fn test_scalar_rejects_wrong_length() {
        assert!(matches!(
            deserialize_scalar(&[0u8; 31]),
            Err(Error::InvalidLength(32, 31))
        ));
    }

    #[test]
    fn test_point_roundtrip() {
        let mut rng = StdRng::seed_from_u64(1);
        let scalar = Fr::rand(&mut rng);
        let g1 = (G1Projective::generator() * scalar).into_affine();
        let g2 = (G2Projective::generator() * scalar).into_affine();
        assert_eq!(deserialize_g1(&serialize_g1(&g1)).unwrap(), g1);
        assert_eq!(deserialize_g2(&serialize_g2(&g2)).unwrap(), g2);
    }

    #[test]
    fn test_rejects_identity() {
        let id_g1 = G1Affine::identity();
        let id_g2 = G2Affine::identity();
        assert!(deserialize_g1(&serialize_g1(&id_g1)).is_err());
        assert!(deserialize_g2(&serialize_g2(&id_g2)).is_err());
    }

    #[test]
    fn test_sum_matches_scalar_arithmetic() {
        let mut rng = StdRng::seed_from_u64(2);
        let a = Fr::rand(&mut rng);
        let b = Fr::rand(&mut rng);
        let pa = (G1Projective::generator() * a).into_affine();
        let pb = (G1Projective::generator() * b).into_affine();
        let expected = (G1Projective::generator() * (a + b)).into_affine();
        assert_eq!(sum_g1([pa, pb]), expected);
    }
}
