//! Prior specification for the hierarchical Minnesota prior.
//!
//! Purpose
//! -------
//! Describe every hyperparameter block (its mode, bounds, whether it is
//! sampled, and its hyperprior) plus the prior mean `b` and the intercept
//! variance, as one immutable value built once from the data.
//!
//! Key behaviors
//! -------------
//! - [`HyperBlock`] is the tagged collection: `Lambda`, `Alpha`, `Psi`,
//!   `Soc`, `Sur`, each with its own bounds and hyperprior.
//! - [`PriorSpecBuilder`] fills data-dependent defaults (psi modes from AR
//!   residual variances, `b` from `b_own`) and validates everything.
//! - [`PriorSpec::resolve`] turns a flat hyperparameter vector into
//!   [`ResolvedHypers`], falling back to the mode of fixed blocks.
//! - [`PriorSpec::log_hyperprior`] sums the hyperprior log densities of the
//!   sampled blocks.
//!
//! Invariants & assumptions
//! ------------------------
//! - Sampled blocks satisfy `0 < min < mode < max`; fixed blocks only need a
//!   positive mode.
//! - At least one coordinate is sampled.
//! - `b` is `K×M` and finite.
//!
//! Conventions
//! -----------
//! - Gamma hyperpriors are parameterized by mode and standard deviation:
//!   `k = (2 + m²/s² + √((4 + m²/s²)·m²/s²))/2`, `θ = √(s²/k)`.
//! - Psi uses an Inverse-Gamma(shape, scale) hyperprior per variable.
//!
//! Testing notes
//! -------------
//! - Tests cover default layout order, Gamma mode recovery, validation
//!   failures, and resolution of fixed vs sampled blocks.
use crate::bvar::{
    core::{
        data::Dataset,
        hyper::{HyperCoord, HyperKind, HyperLayout, ResolvedHypers},
        validation::{validate_finite_matrix, validate_hyper_bounds, validate_positive},
    },
    errors::{BvarError, BvarResult},
};
use crate::optimization::loglik_optimizer::Theta;
use ndarray::{Array1, Array2};
use statrs::distribution::{Continuous, Gamma, InverseGamma};

/// Default intercept prior variance.
pub const DEFAULT_INTERCEPT_VARIANCE: f64 = 1e7;

/// Default Inverse-Gamma shape and scale of the psi hyperprior.
pub const DEFAULT_PSI_SHAPE: f64 = 0.004;
pub const DEFAULT_PSI_SCALE: f64 = 0.004;

/// Psi bounds are `mode / PSI_BOUND_FACTOR` and `mode · PSI_BOUND_FACTOR`.
pub const PSI_BOUND_FACTOR: f64 = 100.0;

/// Hyperprior density attached to a block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Hyperprior {
    Gamma(Gamma),
    InverseGamma(InverseGamma),
}

impl Hyperprior {
    /// Gamma prior with the given mode and standard deviation.
    ///
    /// # Errors
    /// `BvarError::InvalidHyperprior` if `mode` or `sd` is not finite and
    /// positive.
    pub fn gamma_from_mode_sd(name: &str, mode: f64, sd: f64) -> BvarResult<Self> {
        validate_positive(name, mode)?;
        validate_positive(name, sd)?;
        let (shape, scale) = gamma_coefficients(mode, sd);
        Gamma::new(shape, 1.0 / scale).map(Hyperprior::Gamma).map_err(|_| {
            BvarError::InvalidHyperprior {
                name: name.to_string(),
                value: shape,
                reason: "Gamma shape/rate rejected.",
            }
        })
    }

    /// Inverse-Gamma prior with the given shape and scale.
    ///
    /// # Errors
    /// `BvarError::InvalidHyperprior` if either parameter is not finite and
    /// positive.
    pub fn inverse_gamma(name: &str, shape: f64, scale: f64) -> BvarResult<Self> {
        validate_positive(name, shape)?;
        validate_positive(name, scale)?;
        InverseGamma::new(shape, scale).map(Hyperprior::InverseGamma).map_err(|_| {
            BvarError::InvalidHyperprior {
                name: name.to_string(),
                value: shape,
                reason: "Inverse-Gamma shape/scale rejected.",
            }
        })
    }

    pub fn ln_pdf(&self, x: f64) -> f64 {
        match self {
            Hyperprior::Gamma(g) => g.ln_pdf(x),
            Hyperprior::InverseGamma(ig) => ig.ln_pdf(x),
        }
    }
}

/// Shape `k` and scale `θ` of a Gamma distribution with mode `m` and
/// standard deviation `s`.
pub fn gamma_coefficients(mode: f64, sd: f64) -> (f64, f64) {
    let r = mode * mode / (sd * sd);
    let k = (2.0 + r + ((4.0 + r) * r).sqrt()) / 2.0;
    (k, (sd * sd / k).sqrt())
}

/// `(mode, min, max)` triple of a scalar hyperparameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HyperBounds {
    pub mode: f64,
    pub min: f64,
    pub max: f64,
}

/// Scalar hyperparameter block (lambda, alpha, soc, sur).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarBlock {
    pub bounds: HyperBounds,
    pub hierarchical: bool,
    pub prior: Hyperprior,
}

impl ScalarBlock {
    /// Block with a Gamma hyperprior centred on `mode`.
    ///
    /// # Errors
    /// - `BvarError::InvalidHyperBounds` if the triple is inconsistent.
    /// - `BvarError::InvalidHyperprior` if `sd` is not finite and positive.
    pub fn gamma(
        name: &str, mode: f64, sd: f64, min: f64, max: f64, hierarchical: bool,
    ) -> BvarResult<Self> {
        validate_hyper_bounds(name, min, mode, max, hierarchical)?;
        let prior = Hyperprior::gamma_from_mode_sd(name, mode, sd)?;
        Ok(Self { bounds: HyperBounds { mode, min, max }, hierarchical, prior })
    }

    /// lambda: mode 0.2, sd 0.4, [1e-4, 5], sampled.
    pub fn default_lambda() -> BvarResult<Self> {
        Self::gamma("lambda", 0.2, 0.4, 1e-4, 5.0, true)
    }

    /// alpha: mode 2, sd 0.25, [1, 3], fixed.
    pub fn default_alpha() -> BvarResult<Self> {
        Self::gamma("alpha", 2.0, 0.25, 1.0, 3.0, false)
    }

    /// soc: mode 1, sd 1, [1e-4, 50], sampled.
    pub fn default_soc() -> BvarResult<Self> {
        Self::gamma("soc", 1.0, 1.0, 1e-4, 50.0, true)
    }

    /// sur: mode 1, sd 1, [1e-4, 50], sampled.
    pub fn default_sur() -> BvarResult<Self> {
        Self::gamma("sur", 1.0, 1.0, 1e-4, 50.0, true)
    }
}

/// Per-variable residual-scale block.
#[derive(Debug, Clone, PartialEq)]
pub struct PsiBlock {
    pub modes: Array1<f64>,
    pub lower: Array1<f64>,
    pub upper: Array1<f64>,
    pub hierarchical: bool,
    pub prior: Hyperprior,
}

impl PsiBlock {
    /// Bounds `mode/100` and `mode·100` per variable.
    ///
    /// # Errors
    /// `BvarError::InvalidHyperBounds` for the first variable whose mode is
    /// not finite and positive.
    pub fn new(modes: Array1<f64>, hierarchical: bool, prior: Hyperprior) -> BvarResult<Self> {
        let lower = modes.mapv(|m| m / PSI_BOUND_FACTOR);
        let upper = modes.mapv(|m| m * PSI_BOUND_FACTOR);
        for j in 0..modes.len() {
            validate_hyper_bounds(
                &format!("psi{}", j + 1),
                lower[j],
                modes[j],
                upper[j],
                hierarchical,
            )?;
        }
        Ok(Self { modes, lower, upper, hierarchical, prior })
    }
}

/// Tagged prior block.
#[derive(Debug, Clone, PartialEq)]
pub enum HyperBlock {
    Lambda(ScalarBlock),
    Alpha(ScalarBlock),
    Psi(PsiBlock),
    Soc(ScalarBlock),
    Sur(ScalarBlock),
}

impl HyperBlock {
    pub fn kind(&self) -> HyperKind {
        match self {
            HyperBlock::Lambda(_) => HyperKind::Lambda,
            HyperBlock::Alpha(_) => HyperKind::Alpha,
            HyperBlock::Psi(_) => HyperKind::Psi,
            HyperBlock::Soc(_) => HyperKind::Soc,
            HyperBlock::Sur(_) => HyperKind::Sur,
        }
    }

    pub fn is_hierarchical(&self) -> bool {
        match self {
            HyperBlock::Psi(p) => p.hierarchical,
            HyperBlock::Lambda(s)
            | HyperBlock::Alpha(s)
            | HyperBlock::Soc(s)
            | HyperBlock::Sur(s) => s.hierarchical,
        }
    }
}

/// Immutable prior specification.
#[derive(Debug, Clone, PartialEq)]
pub struct PriorSpec {
    blocks: Vec<HyperBlock>,
    b: Array2<f64>,
    intercept_variance: f64,
    layout: HyperLayout,
}

impl PriorSpec {
    pub fn builder() -> PriorSpecBuilder {
        PriorSpecBuilder::default()
    }

    pub fn blocks(&self) -> &[HyperBlock] {
        &self.blocks
    }

    /// Prior mean of the coefficients, `K×M`.
    pub fn b(&self) -> &Array2<f64> {
        &self.b
    }

    pub fn intercept_variance(&self) -> f64 {
        self.intercept_variance
    }

    /// Sampled coordinates, their modes and bounds.
    pub fn layout(&self) -> &HyperLayout {
        &self.layout
    }

    pub fn block(&self, kind: HyperKind) -> Option<&HyperBlock> {
        self.blocks.iter().find(|b| b.kind() == kind)
    }

    /// Resolve a flat vector into every hyperparameter value in effect.
    ///
    /// Returns `None` when `theta` has the wrong length or any coordinate is
    /// outside its inclusive bounds.
    pub fn resolve(&self, theta: &Theta) -> Option<ResolvedHypers> {
        if !self.layout.contains(theta) {
            return None;
        }
        let mut resolved = self.modes();
        for (coord, &value) in self.layout.coords.iter().zip(theta.iter()) {
            match coord.kind {
                HyperKind::Lambda => resolved.lambda = value,
                HyperKind::Alpha => resolved.alpha = value,
                HyperKind::Psi => resolved.psi[coord.index] = value,
                HyperKind::Soc => resolved.soc = Some(value),
                HyperKind::Sur => resolved.sur = Some(value),
            }
        }
        Some(resolved)
    }

    /// Hyperprior log density of the sampled blocks at `h`.
    pub fn log_hyperprior(&self, h: &ResolvedHypers) -> f64 {
        self.blocks
            .iter()
            .filter(|b| b.is_hierarchical())
            .map(|b| match b {
                HyperBlock::Lambda(s) => s.prior.ln_pdf(h.lambda),
                HyperBlock::Alpha(s) => s.prior.ln_pdf(h.alpha),
                HyperBlock::Psi(p) => h.psi.iter().map(|&v| p.prior.ln_pdf(v)).sum(),
                HyperBlock::Soc(s) => h.soc.map_or(0.0, |v| s.prior.ln_pdf(v)),
                HyperBlock::Sur(s) => h.sur.map_or(0.0, |v| s.prior.ln_pdf(v)),
            })
            .sum()
    }

    /// Values at every block's mode.
    fn modes(&self) -> ResolvedHypers {
        let mut out = ResolvedHypers {
            lambda: 0.0,
            alpha: 0.0,
            psi: Array1::zeros(0),
            soc: None,
            sur: None,
        };
        for block in &self.blocks {
            match block {
                HyperBlock::Lambda(s) => out.lambda = s.bounds.mode,
                HyperBlock::Alpha(s) => out.alpha = s.bounds.mode,
                HyperBlock::Psi(p) => out.psi = p.modes.clone(),
                HyperBlock::Soc(s) => out.soc = Some(s.bounds.mode),
                HyperBlock::Sur(s) => out.sur = Some(s.bounds.mode),
            }
        }
        out
    }
}

/// Builder for [`PriorSpec`].
///
/// Defaults: sampled lambda, fixed alpha, sampled psi with AR(lags)
/// residual-variance modes, no dummy priors, `b_own = 1`, intercept
/// variance `1e7`.
#[derive(Debug, Clone, PartialEq)]
pub struct PriorSpecBuilder {
    lambda: Option<ScalarBlock>,
    alpha: Option<ScalarBlock>,
    psi_modes: Option<Array1<f64>>,
    psi_hierarchical: bool,
    psi_shape: f64,
    psi_scale: f64,
    soc: Option<ScalarBlock>,
    sur: Option<ScalarBlock>,
    use_default_soc: bool,
    use_default_sur: bool,
    b_own: f64,
    b: Option<Array2<f64>>,
    intercept_variance: f64,
}

impl Default for PriorSpecBuilder {
    fn default() -> Self {
        Self {
            lambda: None,
            alpha: None,
            psi_modes: None,
            psi_hierarchical: true,
            psi_shape: DEFAULT_PSI_SHAPE,
            psi_scale: DEFAULT_PSI_SCALE,
            soc: None,
            sur: None,
            use_default_soc: false,
            use_default_sur: false,
            b_own: 1.0,
            b: None,
            intercept_variance: DEFAULT_INTERCEPT_VARIANCE,
        }
    }
}

impl PriorSpecBuilder {
    pub fn lambda(mut self, block: ScalarBlock) -> Self {
        self.lambda = Some(block);
        self
    }

    pub fn alpha(mut self, block: ScalarBlock) -> Self {
        self.alpha = Some(block);
        self
    }

    /// Override the data-driven psi modes.
    pub fn psi_modes(mut self, modes: Array1<f64>) -> Self {
        self.psi_modes = Some(modes);
        self
    }

    pub fn psi_hierarchical(mut self, hierarchical: bool) -> Self {
        self.psi_hierarchical = hierarchical;
        self
    }

    pub fn psi_hyperprior(mut self, shape: f64, scale: f64) -> Self {
        self.psi_shape = shape;
        self.psi_scale = scale;
        self
    }

    pub fn soc(mut self, block: ScalarBlock) -> Self {
        self.soc = Some(block);
        self
    }

    /// Add the sum-of-coefficients dummy with its default block.
    pub fn with_soc(mut self) -> Self {
        self.use_default_soc = true;
        self
    }

    pub fn sur(mut self, block: ScalarBlock) -> Self {
        self.sur = Some(block);
        self
    }

    /// Add the single-unit-root dummy with its default block.
    pub fn with_sur(mut self) -> Self {
        self.use_default_sur = true;
        self
    }

    /// Prior mean on each variable's own first lag (1 random walk, 0 white
    /// noise). Ignored when a full `prior_mean` is supplied.
    pub fn b_own(mut self, value: f64) -> Self {
        self.b_own = value;
        self
    }

    pub fn prior_mean(mut self, b: Array2<f64>) -> Self {
        self.b = Some(b);
        self
    }

    pub fn intercept_variance(mut self, value: f64) -> Self {
        self.intercept_variance = value;
        self
    }

    /// Validate and assemble the prior for `data`.
    ///
    /// Errors
    /// ------
    /// - `BvarError::InvalidHyperBounds` / `BvarError::InvalidHyperprior`
    ///   from block construction.
    /// - `BvarError::DimensionMismatch` if psi modes or `b` have the wrong
    ///   shape.
    /// - `BvarError::InvalidPriorMean` / `BvarError::InvalidPriorVariance`.
    /// - `BvarError::NoHierarchicalParameters` if nothing is sampled.
    pub fn build(self, data: &Dataset) -> BvarResult<PriorSpec> {
        let m = data.n_vars();
        let k = data.n_coef();

        if !self.intercept_variance.is_finite() || self.intercept_variance <= 0.0 {
            return Err(BvarError::InvalidPriorVariance { value: self.intercept_variance });
        }

        let lambda = match self.lambda {
            Some(b) => b,
            None => ScalarBlock::default_lambda()?,
        };
        let alpha = match self.alpha {
            Some(b) => b,
            None => ScalarBlock::default_alpha()?,
        };
        let psi_modes = match self.psi_modes {
            Some(modes) => modes,
            None => data.ar_residual_variances(),
        };
        if psi_modes.len() != m {
            return Err(BvarError::DimensionMismatch {
                what: "psi modes",
                expected: m,
                found: psi_modes.len(),
            });
        }
        let psi_prior = Hyperprior::inverse_gamma("psi", self.psi_shape, self.psi_scale)?;
        let psi = PsiBlock::new(psi_modes, self.psi_hierarchical, psi_prior)?;
        let soc = match (self.soc, self.use_default_soc) {
            (Some(b), _) => Some(b),
            (None, true) => Some(ScalarBlock::default_soc()?),
            (None, false) => None,
        };
        let sur = match (self.sur, self.use_default_sur) {
            (Some(b), _) => Some(b),
            (None, true) => Some(ScalarBlock::default_sur()?),
            (None, false) => None,
        };

        let b = match self.b {
            Some(b) => {
                if b.nrows() != k {
                    return Err(BvarError::DimensionMismatch {
                        what: "prior mean rows",
                        expected: k,
                        found: b.nrows(),
                    });
                }
                if b.ncols() != m {
                    return Err(BvarError::DimensionMismatch {
                        what: "prior mean columns",
                        expected: m,
                        found: b.ncols(),
                    });
                }
                validate_finite_matrix(&b).map_err(|e| match e {
                    BvarError::NonFiniteData { row, col, value } => {
                        BvarError::InvalidPriorMean { row, col, value }
                    }
                    other => other,
                })?;
                b
            }
            None => {
                if !self.b_own.is_finite() {
                    return Err(BvarError::InvalidPriorMean { row: 1, col: 0, value: self.b_own });
                }
                let mut b = Array2::<f64>::zeros((k, m));
                for j in 0..m {
                    b[[1 + j, j]] = self.b_own;
                }
                b
            }
        };

        let mut blocks =
            vec![HyperBlock::Lambda(lambda), HyperBlock::Alpha(alpha), HyperBlock::Psi(psi)];
        if let Some(s) = soc {
            blocks.push(HyperBlock::Soc(s));
        }
        if let Some(s) = sur {
            blocks.push(HyperBlock::Sur(s));
        }
        let layout = build_layout(&blocks);
        if layout.is_empty() {
            return Err(BvarError::NoHierarchicalParameters);
        }
        Ok(PriorSpec { blocks, b, intercept_variance: self.intercept_variance, layout })
    }
}

fn build_layout(blocks: &[HyperBlock]) -> HyperLayout {
    let mut coords = Vec::new();
    let mut modes = Vec::new();
    let mut lower = Vec::new();
    let mut upper = Vec::new();
    for block in blocks.iter().filter(|b| b.is_hierarchical()) {
        match block {
            HyperBlock::Psi(p) => {
                for j in 0..p.modes.len() {
                    coords.push(HyperCoord { kind: HyperKind::Psi, index: j });
                    modes.push(p.modes[j]);
                    lower.push(p.lower[j]);
                    upper.push(p.upper[j]);
                }
            }
            HyperBlock::Lambda(s)
            | HyperBlock::Alpha(s)
            | HyperBlock::Soc(s)
            | HyperBlock::Sur(s) => {
                coords.push(HyperCoord { kind: block.kind(), index: 0 });
                modes.push(s.bounds.mode);
                lower.push(s.bounds.min);
                upper.push(s.bounds.max);
            }
        }
    }
    HyperLayout {
        coords,
        modes: Array1::from(modes),
        lower: Array1::from(lower),
        upper: Array1::from(upper),
    }
}
