//! irf — impulse responses and variance decompositions for posterior draws.
//!
//! Purpose
//! -------
//! Propagate structural shocks through the companion form of each VAR draw.
//! Identification is either recursive (Cholesky) or by sign restrictions
//! searched over random rotations.
//!
//! Key behaviors
//! -------------
//! - [`companion`]: companion matrix and reduced-form responses `Φ_h`.
//! - [`engine`]: identified responses and FEVD for one draw.
//! - [`ensemble`]: rayon-parallel computation over all draws with
//!   per-draw seeded RNGs.
//! - [`options`]: validated [`IrfSpec`] and [`Identification`].
//!
//! Conventions
//! -----------
//! - Tensors are `[variable, step, shock]`; step 0 is impact.
//! - A draw whose sign search is exhausted is `None` in the ensemble.

pub mod companion;
pub mod engine;
pub mod ensemble;
pub mod errors;
pub mod options;

pub use self::engine::{ImpulseResponse, impulse_response};
pub use self::ensemble::IrfEnsemble;
pub use self::errors::{IrfError, IrfResult};
pub use self::options::{Identification, IrfSpec};

pub mod prelude {
    pub use super::ensemble::IrfEnsemble;
    pub use super::errors::{IrfError, IrfResult};
    pub use super::options::{Identification, IrfSpec};
}
