//! Jubjub constants
//!
//! Jubjub is the twisted Edwards curve $-x^2 + y^2 = 1 + dx^2y^2$, $d = -(10240/10241)$, defined over the BLS12-381
//! scalar field. Refer to <https://zips.z.cash/protocol/protocol.pdf> §5.4.9.3.

use crate::{Fq, Fr};
use ark_ff::biginteger::BigInteger256;
use ark_ff::{MontFp, PrimeField};

/// The prime modulus of the base field $F_q$ (= BLS12-381 scalar field). Credential attributes live here inside the
/// circuit.
pub const MODULUS_STR_FQ: &str = "52435875175126190479447740508185965837690552500527637822603658699938581184513";
/// The prime modulus of the scalar field $F_r$, the order of the prime-order subgroup.
pub const MODULUS_STR_FR: &str = "6554484396890773809930967563523245729705921265872317281365359162392183254199";

/// The modulus M that every signature value is reduced by.
///
/// The verification circuit reduces its challenge by the same value, so this is the only place it is defined.
pub const FIELD_MODULUS: BigInteger256 = <Fr as PrimeField>::MODULUS;

/// The size in bytes of a field element or scalar.
pub const SCALAR_SIZE: usize = 32;

/// The base point $G = (x,y)$ generates the prime-order subgroup.
///
/// $x = 8076246640662884909881801758704306714034609987455869804520522091855516602923$
pub const G_X: Fq = MontFp!("8076246640662884909881801758704306714034609987455869804520522091855516602923");
/// The y-coordinate of the base point G.
///
/// $y = 13262374693698910701929044844600465831413122818447359594527400194675274060458$
pub const G_Y: Fq = MontFp!("13262374693698910701929044844600465831413122818447359594527400194675274060458");
