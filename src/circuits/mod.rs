//! Input bundles for the compiled circuits.
//!
//! `es256` feeds the stand-alone signature verifier, `jwt` the full
//! token circuit whose inputs are a superset of the ES256 ones.

pub mod es256;
pub mod jwt;
