//! sampler — adaptive independence Metropolis–Hastings over hyperparameters.
//!
//! Purpose
//! -------
//! Run the chain that explores the hyperparameter posterior. Every proposal
//! is a fresh draw from the fixed Gaussian proposal around the mode; the
//! target is evaluated once per step and retained states are handed to a
//! caller-supplied callback (the conjugate drawer, in the BVAR pipeline).
//!
//! Key behaviors
//! -------------
//! - The counter runs from `1 − n_burn` to `n_draw − n_burn`; non-positive
//!   values are burn-in.
//! - A starting state is searched for with at most `max_init_attempts`
//!   proposals.
//! - Acceptance: `u < exp(ℓ_prop − ℓ_cur)`; rejected evaluations never win.
//! - Burn-in adaptation (`adjust_acc`): at every tenth step inside the first
//!   `⌊n_burn · adjust_burn⌋` steps the proposal is tightened or loosened
//!   when the running burn-in acceptance leaves `[acc_lower, acc_upper]`.
//! - Sampling: the state is saved when `i mod n_thin == 0`, which yields
//!   exactly `(n_draw − n_burn) / n_thin` saves.
//!
//! Invariants & assumptions
//! ------------------------
//! - Single-threaded; the RNG is threaded through so runs are reproducible.
//! - The reported acceptance rate counts sampling steps only.
use crate::{
    bvar::{
        core::options::{MhOptions, SamplerConfig},
        errors::{BvarError, BvarResult},
        ml::{EvaluationOutcome, EvaluationResult, MarginalLikelihood},
        mode::ProposalDistribution,
    },
    optimization::loglik_optimizer::Theta,
};
use rand::Rng;

/// Log density the chain targets, with a payload carried alongside the
/// current state.
pub trait MhTarget {
    type Payload;

    /// `Some((log density, payload))` or `None` if the point is rejected.
    fn log_density(&self, theta: &Theta) -> Option<(f64, Self::Payload)>;
}

impl MhTarget for MarginalLikelihood {
    type Payload = EvaluationResult;

    fn log_density(&self, theta: &Theta) -> Option<(f64, EvaluationResult)> {
        match self.evaluate(theta) {
            EvaluationOutcome::Accepted(r) => Some((r.log_ml, r)),
            EvaluationOutcome::Rejected => None,
        }
    }
}

/// Counters of one chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainStats {
    pub init_attempts: usize,
    pub accepted_burn: usize,
    pub accepted_sampling: usize,
    pub n_saved: usize,
    /// `accepted_sampling / (n_draw − n_burn)`.
    pub acceptance_rate: f64,
    /// Product of every rescaling factor applied during burn-in.
    pub proposal_scale: f64,
}

/// Current state of the chain.
struct ChainState<P> {
    theta: Theta,
    log_density: f64,
    payload: P,
}

/// Run the chain and call `on_save(theta, log density, payload, rng)` on
/// every retained iteration.
///
/// # Errors
/// - `BvarError::InitialDrawFailed` if no proposal is accepted within
///   `mh.max_init_attempts`.
/// - Whatever `on_save` returns; the chain stops at the first error.
pub fn run_chain<T, R, F>(
    target: &T, proposal: &mut ProposalDistribution, config: &SamplerConfig, mh: &MhOptions,
    rng: &mut R, mut on_save: F,
) -> BvarResult<ChainStats>
where
    T: MhTarget,
    R: Rng + ?Sized,
    F: FnMut(&Theta, f64, &T::Payload, &mut R) -> BvarResult<()>,
{
    let (mut state, init_attempts) = initial_state(target, proposal, mh.max_init_attempts, rng)?;

    let n_burn = config.n_burn as i64;
    let n_sampling = config.n_sampling() as i64;
    let window = (config.n_burn as f64 * mh.adjust_burn).floor() as usize;
    let mut accepted_burn = 0_usize;
    let mut accepted_sampling = 0_usize;
    let mut n_saved = 0_usize;
    let mut proposal_scale = 1.0;

    for i in (1 - n_burn)..=n_sampling {
        let candidate = proposal.draw(rng);
        let accepted = match target.log_density(&candidate) {
            Some((log_density, payload)) => {
                let u: f64 = rng.random();
                if u < (log_density - state.log_density).exp() {
                    state = ChainState { theta: candidate, log_density, payload };
                    true
                } else {
                    false
                }
            }
            None => false,
        };

        if i <= 0 {
            accepted_burn += usize::from(accepted);
            let s = (i + n_burn) as usize;
            if mh.adjust_acc && s <= window && s % 10 == 0 {
                let rate = accepted_burn as f64 / s as f64;
                let factor = if rate < mh.acc_lower {
                    Some(mh.acc_tighten)
                } else if rate > mh.acc_upper {
                    Some(mh.acc_loosen)
                } else {
                    None
                };
                if let Some(f) = factor {
                    proposal.rescale(f);
                    proposal_scale *= f;
                    tracing::trace!(step = s, rate, factor = f, "proposal rescaled");
                }
            }
            if i == 0 {
                tracing::debug!(accepted_burn, proposal_scale, "burn-in finished");
            }
        } else {
            accepted_sampling += usize::from(accepted);
            if (i as usize) % config.n_thin == 0 {
                on_save(&state.theta, state.log_density, &state.payload, rng)?;
                n_saved += 1;
            }
        }
    }

    let acceptance_rate = accepted_sampling as f64 / config.n_sampling() as f64;
    tracing::info!(n_saved, acceptance_rate, init_attempts, "MH chain finished");
    Ok(ChainStats {
        init_attempts,
        accepted_burn,
        accepted_sampling,
        n_saved,
        acceptance_rate,
        proposal_scale,
    })
}

fn initial_state<T, R>(
    target: &T, proposal: &ProposalDistribution, max_attempts: usize, rng: &mut R,
) -> BvarResult<(ChainState<T::Payload>, usize)>
where
    T: MhTarget,
    R: Rng + ?Sized,
{
    for attempt in 1..=max_attempts {
        let theta = proposal.draw(rng);
        if let Some((log_density, payload)) = target.log_density(&theta) {
            return Ok((ChainState { theta, log_density, payload }, attempt));
        }
    }
    Err(BvarError::InitialDrawFailed { attempts: max_attempts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::{SeedableRng, rngs::StdRng};

    /// Standard normal restricted to [-5, 5]; payload is the squared point.
    struct TruncatedNormal;

    impl MhTarget for TruncatedNormal {
        type Payload = f64;

        fn log_density(&self, theta: &Theta) -> Option<(f64, f64)> {
            let x = theta[0];
            (x.abs() <= 5.0).then(|| (-0.5 * x * x, x * x))
        }
    }

    /// Rejects every point.
    struct Nowhere;

    impl MhTarget for Nowhere {
        type Payload = ();

        fn log_density(&self, _theta: &Theta) -> Option<(f64, ())> {
            None
        }
    }

    fn proposal(scale: f64) -> ProposalDistribution {
        // logistic_derivative(0) · 2 = 0.5, so the variance is 0.25 · scale.
        ProposalDistribution::new(&array![0.0], &array![-1.0], &array![1.0], scale).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // The chain saves exactly n_save states, hands the payload through, and
    // reports an acceptance rate in [0, 1].
    //
    // Given
    // -----
    // - Truncated normal target, well-matched proposal, (200, 100, 2).
    //
    // Expect
    // ------
    // - 50 callbacks, payload equals θ², acceptance in (0, 1].
    fn chain_saves_n_save_draws_with_payload() {
        // Arrange
        let config = SamplerConfig::new(200, 100, 2).unwrap();
        let mut prop = proposal(4.0);
        let mut rng = StdRng::seed_from_u64(1);
        let mut saved = Vec::new();

        // Act
        let mh = MhOptions::default();
        let stats = run_chain(&TruncatedNormal, &mut prop, &config, &mh, &mut rng, |t, _, p, _| {
            assert_eq!(*p, t[0] * t[0]);
            saved.push(t[0]);
            Ok(())
        })
        .unwrap();

        // Assert
        assert_eq!(stats.n_saved, 50);
        assert_eq!(saved.len(), 50);
        assert!(stats.acceptance_rate > 0.0 && stats.acceptance_rate <= 1.0);
        assert_eq!(stats.proposal_scale, 1.0);
    }

    #[test]
    // Purpose
    // -------
    // Adaptation shrinks a far too wide proposal during burn-in and leaves
    // the sampling phase alone.
    //
    // Given
    // -----
    // - Proposal variance 2500 against a unit target; adjust_acc on,
    //   adjust_burn 1, n_burn 500.
    //
    // Expect
    // ------
    // - Covariance after the run is smaller than before; the recorded scale
    //   is below 1.
    fn adaptation_tightens_wide_proposal() {
        // Arrange
        let config = SamplerConfig::new(600, 500, 1).unwrap();
        let mh = MhOptions::new(10_000.0, true, 1.0, 0.25, 0.45, 0.9, 1.1, 1_000).unwrap();
        let mut prop = proposal(10_000.0);
        let before = prop.covariance()[(0, 0)];
        let mut rng = StdRng::seed_from_u64(2);

        // Act
        let stats =
            run_chain(&TruncatedNormal, &mut prop, &config, &mh, &mut rng, |_, _, _, _| Ok(()))
                .unwrap();

        // Assert
        assert!(prop.covariance()[(0, 0)] < before);
        assert!(stats.proposal_scale < 1.0);
        assert!((0.0..=1.0).contains(&stats.acceptance_rate));
    }

    /// Distance of `rate` from the band `[0.25, 0.45]`; zero inside it.
    fn band_gap(rate: f64) -> f64 {
        (0.25 - rate).max(rate - 0.45).max(0.0)
    }

    #[test]
    // Purpose
    // -------
    // A longer adaptive burn-in pulls the acceptance rate toward the target
    // band, and switching adaptation off leaves a far too wide proposal
    // with a rate well below it.
    //
    // Given
    // -----
    // - Proposal variance 2500 against the truncated normal target.
    // - Band [0.25, 0.45], factors 0.9 / 1.1, adjust_burn 1.
    // - Burn-in of 500 and of 5000 steps, 2000 sampling steps each.
    //
    // Expect
    // ------
    // - The 5000-step burn-in rate is closer to the band than the
    //   500-step one.
    // - The sampling rate after the long burn-in lies in [0.1, 0.7].
    // - Without adaptation the sampling rate stays below 0.15.
    fn adaptation_moves_rate_toward_band() {
        // Arrange
        let adaptive = MhOptions::new(10_000.0, true, 1.0, 0.25, 0.45, 0.9, 1.1, 1_000).unwrap();
        let fixed = MhOptions { adjust_acc: false, ..adaptive };
        let run = |n_burn: usize, mh: &MhOptions| {
            let config = SamplerConfig::new(n_burn + 2_000, n_burn, 1).unwrap();
            let mut prop = proposal(10_000.0);
            let mut rng = StdRng::seed_from_u64(11);
            run_chain(&TruncatedNormal, &mut prop, &config, mh, &mut rng, |_, _, _, _| Ok(()))
                .unwrap()
        };

        // Act
        let short = run(500, &adaptive);
        let long = run(5_000, &adaptive);
        let off = run(5_000, &fixed);

        // Assert
        let short_burn = short.accepted_burn as f64 / 500.0;
        let long_burn = long.accepted_burn as f64 / 5_000.0;
        assert!(band_gap(long_burn) < band_gap(short_burn));
        assert!((0.1..=0.7).contains(&long.acceptance_rate));
        assert!(off.acceptance_rate < 0.15);
        assert_eq!(off.proposal_scale, 1.0);
    }

    #[test]
    // Purpose
    // -------
    // A target that rejects everything exhausts the initial search.
    fn init_search_is_bounded() {
        let config = SamplerConfig::new(100, 50, 1).unwrap();
        let mh = MhOptions { max_init_attempts: 25, ..MhOptions::default() };
        let mut prop = proposal(1.0);
        let mut rng = StdRng::seed_from_u64(3);

        let res = run_chain(&Nowhere, &mut prop, &config, &mh, &mut rng, |_, _, _, _| Ok(()));

        assert_eq!(res, Err(BvarError::InitialDrawFailed { attempts: 25 }));
    }

    #[test]
    // Purpose
    // -------
    // A callback error stops the chain and is returned unchanged.
    fn callback_error_propagates() {
        let config = SamplerConfig::new(100, 50, 1).unwrap();
        let mut prop = proposal(1.0);
        let mut rng = StdRng::seed_from_u64(4);
        let mut calls = 0;

        let mh = MhOptions::default();

        let res = run_chain(&TruncatedNormal, &mut prop, &config, &mh, &mut rng, |_, _, _, _| {
            calls += 1;
            Err(BvarError::PosteriorDrawFailed { attempts: 1 })
        });

        assert_eq!(res, Err(BvarError::PosteriorDrawFailed { attempts: 1 }));
        assert_eq!(calls, 1);
    }

    #[test]
    // Purpose
    // -------
    // Runs are reproducible from the seed.
    fn same_seed_same_chain() {
        let config = SamplerConfig::new(120, 20, 1).unwrap();
        let run = |seed| {
            let mut prop = proposal(4.0);
            let mut rng = StdRng::seed_from_u64(seed);
            let mut out = Vec::new();
            let mh = MhOptions::default();
            run_chain(&TruncatedNormal, &mut prop, &config, &mh, &mut rng, |t, _, _, _| {
                out.push(t[0]);
                Ok(())
            })
            .unwrap();
            out
        };

        assert_eq!(run(9), run(9));
    }
}
