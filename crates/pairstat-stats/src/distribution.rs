//! Quantiles and tail probabilities of the reference distributions.

use statrs::distribution::{Continuous, ContinuousCDF, Gamma, Normal, StudentsT};

use crate::error::StatsError;

fn check_probability(p: f64) -> Result<(), StatsError> {
    if p > 0.0 && p < 1.0 {
        Ok(())
    } else {
        Err(StatsError::InvalidParameter {
            name: "probability",
            reason: format!("{p} is not inside (0, 1)"),
        })
    }
}

/// Quantile of the standard normal distribution.
///
/// # Examples
///
/// ```
/// use pairstat_stats::distribution::normal_quantile;
///
/// let z = normal_quantile(0.975).unwrap();
/// assert!((z - 1.959_964).abs() < 1e-6);
/// ```
pub fn normal_quantile(p: f64) -> Result<f64, StatsError> {
    check_probability(p)?;
    Ok(Normal::new(0.0, 1.0)?.inverse_cdf(p))
}

/// Density of the standard normal distribution.
pub fn normal_pdf(z: f64) -> Result<f64, StatsError> {
    Ok(Normal::new(0.0, 1.0)?.pdf(z))
}

/// Upper tail `P(Z > z)` of the standard normal distribution.
pub fn normal_sf(z: f64) -> Result<f64, StatsError> {
    Ok(Normal::new(0.0, 1.0)?.sf(z))
}

/// Quantile of Student's t distribution with `df` degrees of freedom.
pub fn students_t_quantile(df: f64, p: f64) -> Result<f64, StatsError> {
    check_probability(p)?;
    Ok(StudentsT::new(0.0, 1.0, df)?.inverse_cdf(p))
}

/// Two-sided tail probability `P(|T| >= |t|)` for Student's t.
pub fn students_t_two_sided(df: f64, t: f64) -> Result<f64, StatsError> {
    let dist = StudentsT::new(0.0, 1.0, df)?;
    Ok((2.0 * dist.sf(t.abs())).clamp(0.0, 1.0))
}

/// Quantile of the chi-squared distribution with `df` degrees of freedom.
///
/// Inverted as `Gamma(df / 2, rate 1/2)`, whose inverse CDF refines the
/// bisection with Newton steps.
pub fn chi_squared_quantile(df: f64, p: f64) -> Result<f64, StatsError> {
    check_probability(p)?;
    Ok(Gamma::new(df / 2.0, 0.5)?.inverse_cdf(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_t_quantiles() {
        assert!((students_t_quantile(4.0, 0.975).unwrap() - 2.776_445).abs() < 1e-5);
        assert!((students_t_quantile(30.0, 0.975).unwrap() - 2.042_272).abs() < 1e-5);
        assert!((students_t_quantile(10.0, 0.5).unwrap()).abs() < 1e-9);
    }

    #[test]
    fn test_chi_squared_quantiles() {
        assert!((chi_squared_quantile(4.0, 0.025).unwrap() - 0.484_419).abs() < 1e-5);
        assert!((chi_squared_quantile(4.0, 0.975).unwrap() - 11.143_287).abs() < 1e-5);
        assert!((chi_squared_quantile(1.0, 0.95).unwrap() - 3.841_459).abs() < 1e-5);
    }

    #[test]
    fn test_normal_tails() {
        assert!((normal_quantile(0.5).unwrap()).abs() < 1e-9);
        assert!((normal_pdf(0.0).unwrap() - 0.398_942_280).abs() < 1e-9);
        assert!((normal_sf(1.959_964).unwrap() - 0.025).abs() < 1e-6);
        assert!((students_t_two_sided(4.0, -2.776_445).unwrap() - 0.05).abs() < 1e-5);
    }

    #[test]
    fn test_rejects_probabilities_outside_unit_interval() {
        assert!(normal_quantile(0.0).is_err());
        assert!(chi_squared_quantile(3.0, 1.0).is_err());
        assert!(students_t_quantile(3.0, -0.1).is_err());
    }
}
