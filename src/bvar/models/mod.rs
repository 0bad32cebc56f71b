//! models — user-facing hierarchical BVAR estimation.
//!
//! [`BvarModel`] ties the evaluator, mode search, sampler, conjugate drawer
//! and IRF ensemble together behind `new` / `estimate`.

pub mod bvar;

pub use self::bvar::BvarModel;

pub mod prelude {
    pub use super::bvar::BvarModel;
}
