//! Statistical routines for paired-measurement analysis.
//!
//! This crate provides the numerical side of the `pairstat` tool:
//!
//! - **Descriptive statistics**: mean, median, variance, quantiles, IQR fences
//! - **Distributions**: histograms, ECDFs, Gaussian kernel density estimates
//! - **Estimation**: normal-parameter intervals and the asymptotic median
//! - **Two-sample tests**: Kolmogorov-Smirnov and Mann-Whitney U
//! - **Regression**: linear quantile regression with robust or bootstrap errors
//! - **Association**: Pearson correlation and normal probability plots
//!
//! # Modules
//!
//! - [`descriptive`]: sample mean and variance
//! - [`quantiles`]: linearly interpolated quantiles
//! - [`summary`]: IQR fences and box-plot summaries
//! - [`histogram`]: equal-width histograms
//! - [`ecdf`]: empirical distribution functions
//! - [`kde`]: Gaussian kernel density estimation
//! - [`distribution`]: quantiles and tails of reference distributions
//! - [`estimation`]: confidence intervals for normal parameters
//! - [`median`]: large-sample inference for the median
//! - [`ks`]: two-sample Kolmogorov-Smirnov test
//! - [`mann_whitney`]: two-sample Mann-Whitney U test
//! - [`quantreg`]: quantile regression
//! - [`correlation`]: Pearson correlation matrices
//! - [`probplot`]: normal Q-Q plot coordinates
//!
//! # Examples
//!
//! ## Comparing two samples
//!
//! ```
//! use pairstat_stats::{ks::KsTest, mann_whitney::MannWhitneyTest};
//!
//! let children = [1.52, 1.61, 1.58, 1.70, 1.49, 1.66];
//! let adults = [1.63, 1.72, 1.69, 1.81, 1.75, 1.78, 1.68];
//! let ks = KsTest::new(&children, &adults).unwrap();
//! let mw = MannWhitneyTest::new(&children, &adults).unwrap();
//! assert!(ks.statistic > 0.5);
//! assert!(mw.p_value < 0.05);
//! ```
//!
//! ## Estimating normal parameters
//!
//! ```
//! use pairstat_stats::estimation::NormalEstimate;
//!
//! let estimate = NormalEstimate::new(&[9.8, 10.1, 10.3, 9.9, 10.0], 0.95).unwrap();
//! assert!(estimate.mean_ci.contains(10.0));
//! ```

pub mod correlation;
pub mod descriptive;
pub mod distribution;
pub mod ecdf;
pub mod error;
pub mod estimation;
pub mod histogram;
pub mod kde;
pub mod ks;
pub mod mann_whitney;
pub mod median;
pub mod probplot;
pub mod quantiles;
pub mod quantreg;
pub mod summary;
