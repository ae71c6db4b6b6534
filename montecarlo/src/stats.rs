//! Goodness-of-fit helpers for checking sampled faces against die weights.

use claim::{debug_assert_ge, debug_assert_le};
use statrs::distribution::{ChiSquared, ContinuousCDF};

const EPS: f64 = 1e-10;

/// Return true iff `supp(p) ⊆ supp(q)` for dense PMFs `p` and `q`.
pub(crate) fn is_pmf_subset(p: &[f64], q: &[f64]) -> bool {
    p.iter().zip(q).all(|(&p_i, &q_i)| {
        // A = (q_i == 0.0)
        // B = (p_i == 0.0)
        // (A ==> B) <==> (¬A ∨ B)
        (q_i > 0.0) || (p_i <= 0.0)
    })
}

/// Compute the [KL-divergence](https://www.wikiwand.com/en/Kullback%E2%80%93Leibler_divergence)
/// between dense PMFs `p` and `q`.
///
/// `D_{KL}(p || q) = \sum_i p_i * \ln(p_i / q_i)`
///
/// Note: p's support must be a subset of q's support.
pub(crate) fn kl_divergence(p: &[f64], q: &[f64]) -> f64 {
    debug_assert!(is_pmf_subset(p, q));

    p.iter()
        .zip(q)
        .fold(0.0, |sum, (&p_i, &q_i)| sum + kl_div_term(p_i, q_i))
}

#[inline]
fn kl_div_term(p_i: f64, q_i: f64) -> f64 {
    if q_i > EPS && p_i > EPS {
        p_i * (p_i / q_i).ln()
    } else {
        0.0
    }
}

/// The CDF of the Chi^2-distribution, where `dof` is the
/// "degrees-of-freedom" parameter and `x ∈ R`.
pub(crate) fn chisq_cdf(dof: f64, x: f64) -> f64 {
    ChiSquared::new(dof).unwrap().cdf(x)
}

/// A goodness-of-fit G-test between a hypothesized multinomial distribution,
/// `p`, and observed per-outcome counts.
///
/// Returns a p-value, `Pr[G(x) >= g | H_0: x ~ p]`.
pub(crate) fn multinomial_test(counts_obs: &[usize], p: &[f64]) -> f64 {
    assert_eq!(counts_obs.len(), p.len());

    let n: usize = counts_obs.iter().sum();
    let p_hat = counts_obs
        .iter()
        .map(|&count| (count as f64) / (n as f64))
        .collect::<Vec<_>>();

    // want to compute the DOF (nnz of p)
    let nnz = p.iter().filter(|&&p_i| p_i > 0.0).count() as f64;
    let dof = nnz - 1.0;

    debug_assert_le!(nnz, p.len() as f64);
    debug_assert_ge!(dof, 1.0);

    // impossible to draw p_hat from p
    if !is_pmf_subset(&p_hat, p) {
        return 0.0;
    }

    let g = (n as f64) * (2.0 * kl_divergence(&p_hat, p));
    1.0 - chisq_cdf(dof, g)
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use claim::{assert_gt, assert_lt};

    #[test]
    fn test_is_pmf_subset() {
        let p = [0.0, 0.0, 1.0];
        let q = [0.0, 1.0, 1.0];

        assert!(is_pmf_subset(&p, &p));
        assert!(is_pmf_subset(&q, &q));
        assert!(is_pmf_subset(&p, &q));
        assert!(!is_pmf_subset(&q, &p));
    }

    #[test]
    fn test_kl_divergence() {
        let p = [0.1, 0.3, 0.6];
        let q = [0.3, 0.3, 0.4];

        assert_relative_eq!(0.0_f64, kl_divergence(&p, &p));
        assert_relative_eq!(0.0_f64, kl_divergence(&q, &q));

        // D_KL(p || q) = (0.1 * ln(0.1 / 0.3))
        //              + (0.3 * ln(0.3 / 0.3))
        //              + (0.6 * ln(0.6 / 0.4))
        //              = 0.13341783599808757
        assert_relative_eq!(0.13341783599808757_f64, kl_divergence(&p, &q));
    }

    #[test]
    fn test_multinomial_test() {
        let p = [0.25, 0.25, 0.5];

        // exactly the expected counts
        assert_relative_eq!(1.0, multinomial_test(&[250, 250, 500], &p));
        // way off
        assert_lt!(multinomial_test(&[500, 250, 250], &p), 0.01);
        // a little noise
        assert_gt!(multinomial_test(&[245, 262, 493], &p), 0.01);
        // an outcome p says is impossible
        assert_eq!(0.0, multinomial_test(&[1, 1, 1], &[0.5, 0.5, 0.0]));
    }
}
