pub mod constants;
mod curve;

pub use ark_ed_on_bls12_381::{EdwardsAffine as Point, EdwardsProjective as ProjectivePoint, Fq, Fr};
pub use constants::*;
pub use curve::*;
