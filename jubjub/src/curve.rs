use crate::{Fq, Fr, Point, ProjectivePoint, SCALAR_SIZE};
use ark_ec::{CurveGroup, PrimeGroup};
use ark_ff::field_hashers::{DefaultFieldHasher, HashToField};
use ark_ff::{BigInteger, PrimeField};
use blake2::Blake2b512;

const SEC_PARAM: usize = 128;
type FqHasher = DefaultFieldHasher<Blake2b512, SEC_PARAM>;

/// Hash arbitrary bytes to N elements of the base field under the given domain separation tag.
pub fn hash_to_fq<const N: usize>(domain: &[u8], msg: &[u8]) -> [Fq; N] {
    let hasher = <FqHasher as HashToField<Fq>>::new(domain);
    hasher.hash_to_field::<N>(msg)
}

/// Interpret `le_bytes` as a little-endian unsigned integer and reduce it modulo [`crate::FIELD_MODULUS`].
pub fn reduce_mod_m(le_bytes: &[u8]) -> Fr {
    Fr::from_le_bytes_mod_order(le_bytes)
}

/// `k·G` for the prime-order subgroup generator.
pub fn mul_generator(k: &Fr) -> Point {
    (ProjectivePoint::generator() * *k).into_affine()
}

/// Little-endian canonical bytes of a base field element.
pub fn fq_to_le_bytes(value: &Fq) -> [u8; SCALAR_SIZE] {
    let mut out = [0u8; SCALAR_SIZE];
    out.copy_from_slice(&value.into_bigint().to_bytes_le());
    out
}

/// Little-endian canonical bytes of a scalar.
pub fn fr_to_le_bytes(value: &Fr) -> [u8; SCALAR_SIZE] {
    let mut out = [0u8; SCALAR_SIZE];
    out.copy_from_slice(&value.into_bigint().to_bytes_le());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FIELD_MODULUS, G_X, G_Y};
    use ark_ff::{BigInt, One, Zero};

    #[test]
    fn moduli_match_field_types() {
        assert_eq!(
            FIELD_MODULUS,
            BigInt!("6554484396890773809930967563523245729705921265872317281365359162392183254199")
        );
        assert_eq!(
            Fq::MODULUS,
            BigInt!("52435875175126190479447740508185965837690552500527637822603658699938581184513")
        );
    }

    #[test]
    fn base_point() {
        let g = Point::new_unchecked(G_X, G_Y);
        assert!(g.is_on_curve());
        assert_eq!(ProjectivePoint::generator().into_affine(), g);
        assert_eq!(mul_generator(&Fr::one()), g);
    }

    #[test]
    fn base_point_order() {
        let g = ProjectivePoint::generator();
        assert!(g.mul_bigint(FIELD_MODULUS).is_zero());
        assert!((g * Fr::zero()).is_zero());
        assert_eq!(mul_generator(&Fr::zero()), Point::new_unchecked(Fq::zero(), Fq::one()));
    }

    #[test]
    fn reduction_wraps_at_modulus() {
        let m = FIELD_MODULUS.to_bytes_le();
        assert_eq!(reduce_mod_m(&m), Fr::zero());
        let mut m_plus_one = FIELD_MODULUS;
        let _carry = m_plus_one.add_with_carry(&ark_ff::BigInt::from(1u64));
        assert_eq!(reduce_mod_m(&m_plus_one.to_bytes_le()), Fr::one());
        assert_eq!(reduce_mod_m(&[5u8]), Fr::from(5u64));
    }

    #[test]
    fn byte_conversions_are_canonical() {
        let x = Fr::from(0x0102u64);
        let bytes = fr_to_le_bytes(&x);
        assert_eq!(&bytes[..3], &[0x02, 0x01, 0x00]);
        assert_eq!(reduce_mod_m(&bytes), x);
        let y = fq_to_le_bytes(&G_X);
        assert_eq!(Fq::from_le_bytes_mod_order(&y), G_X);
    }

    #[test]
    fn hash_to_field_is_deterministic_and_domain_separated() {
        let msg = b"test message";
        let h1: [Fq; 2] = hash_to_fq(b"domain-a", msg);
        let h2: [Fq; 2] = hash_to_fq(b"domain-a", msg);
        let h3: [Fq; 2] = hash_to_fq(b"domain-b", msg);
        assert_eq!(h1, h2);
        assert_ne!(h1, h3);
        let h4: [Fq; 2] = hash_to_fq(b"domain-a", b"other message");
        assert_ne!(h1, h4);
    }
}
