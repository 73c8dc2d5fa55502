//! Hash-to-curve for BN254 G1 per RFC 9380: `hash_to_field` with
//! `expand_message_xmd` (SHA-256), then the Shallue-van de Woestijne map
//! (section 6.6.1) applied to two field elements.
//!
//! The SVDW constants are derived from the curve equation at first use and
//! verified against the reference criteria; if derivation fails (it cannot
//! for BN254, but the check is kept explicit), every call returns
//! [Error::HashToCurve]. There is deliberately no alternative mapping: a
//! failure here must surface to the caller, never degrade to a weaker
//! point derivation.
//!
//! BN254 G1 has cofactor 1, so no cofactor clearing is required after
//! adding the two mapped points.

use super::group::DST_G1;
use crate::Error;
use ark_bn254::{Fq, G1Affine, G1Projective};
use ark_ec::short_weierstrass::SWCurveConfig;
use ark_ff::{
    field_hashers::{DefaultFieldHasher, HashToField},
    BigInteger, Field, One, PrimeField, Zero,
};
use sha2::Sha256;
use std::sync::OnceLock;

/// Precomputed constants for the SVDW map (RFC 9380, appendix F.1 naming).
struct SvdwParams {
    z: Fq,
    c1: Fq,
    c2: Fq,
    c3: Fq,
    c4: Fq,
}

static PARAMS: OnceLock<Option<SvdwParams>> = OnceLock::new();

fn coeff_a() -> Fq {
    ark_bn254::g1::Config::COEFF_A
}

fn coeff_b() -> Fq {
    ark_bn254::g1::Config::COEFF_B
}

/// Evaluates the curve equation `g(x) = x^3 + A*x + B`.
fn g(x: Fq) -> Fq {
    x.square() * x + coeff_a() * x + coeff_b()
}

fn is_square(x: &Fq) -> bool {
    x.legendre().is_qr()
}

/// `sgn0` for a prime field: the parity of the canonical representative.
fn sgn0(x: &Fq) -> bool {
    x.into_bigint().is_odd()
}

/// Finds the SVDW `Z` parameter by the reference criteria (RFC 9380,
/// `find_z_svdw`): smallest `Z` in `1, -1, 2, -2, ...` such that `g(Z) != 0`,
/// `h(Z) = -(3Z^2 + 4A) / (4g(Z))` is a nonzero square, and at least one of
/// `g(Z)`, `g(-Z/2)` is square.
fn find_z() -> Option<Fq> {
    let four_a = Fq::from(4u64) * coeff_a();
    let three = Fq::from(3u64);
    let four = Fq::from(4u64);
    let two_inv = Fq::from(2u64).inverse()?;
    for ctr in 1u64..=64 {
        for z in [Fq::from(ctr), -Fq::from(ctr)] {
            let gz = g(z);
            if gz.is_zero() {
                continue;
            }
            let denom = (four * gz).inverse()?;
            let h = -(three * z.square() + four_a) * denom;
            if h.is_zero() || !is_square(&h) {
                continue;
            }
            if !(is_square(&gz) || is_square(&g(-z * two_inv))) {
                continue;
            }
            return Some(z);
        }
    }
    None
}

fn derive_params() -> Option<SvdwParams> {
    let z = find_z()?;
    let c1 = g(z);
    let c2 = -z * Fq::from(2u64).inverse()?;
    let t = Fq::from(3u64) * z.square() + Fq::from(4u64) * coeff_a();
    let mut c3 = (-c1 * t).sqrt()?;
    if sgn0(&c3) {
        c3 = -c3;
    }
    let c4 = -(Fq::from(4u64) * c1) * t.inverse()?;
    Some(SvdwParams { z, c1, c2, c3, c4 })
}

fn params() -> Result<&'static SvdwParams, Error> {
    PARAMS
        .get_or_init(derive_params)
        .as_ref()
        .ok_or(Error::HashToCurve)
}

/// `1/x`, or zero when `x` is zero (RFC 9380 `inv0`).
fn inv0(x: Fq) -> Fq {
    x.inverse().unwrap_or_else(Fq::zero)
}

/// Maps a field element to a curve point (RFC 9380, section 6.6.1).
fn map_to_curve(u: Fq) -> Result<G1Affine, Error> {
    let p = params()?;

    let mut tv1 = u.square() * p.c1;
    let tv2 = Fq::one() + tv1;
    tv1 = Fq::one() - tv1;
    let tv3 = inv0(tv1 * tv2);
    let tv4 = u * tv1 * tv3 * p.c3;

    let x1 = p.c2 - tv4;
    let gx1 = g(x1);
    let e1 = is_square(&gx1);
    let x2 = p.c2 + tv4;
    let gx2 = g(x2);
    let e2 = is_square(&gx2) && !e1;
    let x3 = tv2.square() * tv3;
    let x3 = x3.square() * p.c4 + p.z;

    let x = if e1 {
        x1
    } else if e2 {
        x2
    } else {
        x3
    };
    let gx = g(x);
    let mut y = gx.sqrt().ok_or(Error::HashToCurve)?;
    if sgn0(&u) != sgn0(&y) {
        y = -y;
    }

    let point = G1Affine::new_unchecked(x, y);
    if !point.is_on_curve() {
        return Err(Error::HashToCurve);
    }
    Ok(point)
}

/// Hashes an arbitrary message to a G1 point under [DST_G1].
///
/// Deterministic and uniform (two independent field elements, mapped and
/// added), per the `hash_to_curve` construction of RFC 9380.
pub fn hash_to_point(message: &[u8]) -> Result<G1Projective, Error> {
    let hasher = <DefaultFieldHasher<Sha256, 128> as HashToField<Fq>>::new(DST_G1);
    let u: Vec<Fq> = hasher.hash_to_field(message, 2);
    if u.len() != 2 {
        return Err(Error::HashToCurve);
    }
    let q0 = map_to_curve(u[0])?;
    let q1 = map_to_curve(u[1])?;
    Ok(G1Projective::from(q0) + q1)
}
