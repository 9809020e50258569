pub mod formulas;

pub use formulas::evaluate_formula;

use rand::Rng;
use rand_distr::Distribution;
use statrs::distribution::{
    Binomial as StatBinomial, ContinuousCDF, DiscreteCDF, Exp as StatExp,
    LogNormal as StatLogNormal, Poisson as StatPoisson, Weibull as StatWeibull,
};
use statrs::function::gamma::gamma;

use crate::error::SftError;
use crate::parameters::DistributionSpec;

/// A parametrized closed-form distribution computed once from configuration
/// and used to produce reference CDF values and synthetic samples.
#[derive(Debug, Clone)]
pub enum TheoreticalDistribution {
    Exponential { rate: f64, dist: StatExp },
    Weibull { shape: f64, scale: f64, dist: StatWeibull },
    LogNormal { mu: f64, sigma: f64, dist: StatLogNormal },
    Binomial { n: u64, p: f64, dist: StatBinomial },
    Poisson { lambda: f64, dist: StatPoisson },
}

impl TheoreticalDistribution {
    /// Builds the distribution from its configuration spec.
    ///
    /// # Errors
    /// - If the parameters are outside the family's domain
    pub fn from_spec(spec: DistributionSpec) -> Result<Self, SftError> {
        match spec {
            DistributionSpec::Exponential { rate } => Ok(Self::Exponential {
                rate,
                dist: StatExp::new(rate).map_err(|e| SftError::constraint(e.to_string()))?,
            }),
            DistributionSpec::Weibull { shape, scale } => Ok(Self::Weibull {
                shape,
                scale,
                dist: StatWeibull::new(shape, scale)
                    .map_err(|e| SftError::constraint(e.to_string()))?,
            }),
            DistributionSpec::LogNormal { mu, sigma } => Ok(Self::LogNormal {
                mu,
                sigma,
                dist: StatLogNormal::new(mu, sigma)
                    .map_err(|e| SftError::constraint(e.to_string()))?,
            }),
            DistributionSpec::Binomial { n, p } => Ok(Self::Binomial {
                n,
                p,
                dist: StatBinomial::new(p, n)
                    .map_err(|e| SftError::constraint(e.to_string()))?,
            }),
            DistributionSpec::Poisson { lambda } => Ok(Self::Poisson {
                lambda,
                dist: StatPoisson::new(lambda)
                    .map_err(|e| SftError::constraint(e.to_string()))?,
            }),
        }
    }

    /// The cumulative distribution function at `x`. Discrete families use
    /// the floor of `x`, since the simulator reports counts as whole numbers.
    #[must_use]
    pub fn cdf(&self, x: f64) -> f64 {
        match self {
            Self::Exponential { dist, .. } => dist.cdf(x),
            Self::Weibull { dist, .. } => dist.cdf(x),
            Self::LogNormal { dist, .. } => dist.cdf(x),
            Self::Binomial { dist, .. } => discrete_cdf(dist, x),
            Self::Poisson { dist, .. } => discrete_cdf(dist, x),
        }
    }

    #[must_use]
    pub fn mean(&self) -> f64 {
        match *self {
            Self::Exponential { rate, .. } => 1.0 / rate,
            Self::Weibull { shape, scale, .. } => scale * gamma(1.0 + 1.0 / shape),
            Self::LogNormal { mu, sigma, .. } => (mu + sigma * sigma / 2.0).exp(),
            Self::Binomial { n, p, .. } => to_f64(n) * p,
            Self::Poisson { lambda, .. } => lambda,
        }
    }

    #[must_use]
    pub fn variance(&self) -> f64 {
        match *self {
            Self::Exponential { rate, .. } => 1.0 / (rate * rate),
            Self::Weibull { shape, scale, .. } => {
                let mean = self.mean();
                scale * scale * gamma(1.0 + 2.0 / shape) - mean * mean
            }
            Self::LogNormal { mu, sigma, .. } => {
                let s2 = sigma * sigma;
                (s2.exp() - 1.0) * (2.0 * mu + s2).exp()
            }
            Self::Binomial { n, p, .. } => to_f64(n) * p * (1.0 - p),
            Self::Poisson { lambda, .. } => lambda,
        }
    }

    /// The quantile function, used for diagnostic overlays. Discrete
    /// families return the smallest support point whose CDF reaches `p`.
    #[must_use]
    pub fn quantile(&self, p: f64) -> f64 {
        match self {
            Self::Exponential { dist, .. } => dist.inverse_cdf(p),
            Self::Weibull { dist, .. } => dist.inverse_cdf(p),
            Self::LogNormal { dist, .. } => dist.inverse_cdf(p),
            Self::Binomial { dist, .. } => to_f64(dist.inverse_cdf(p)),
            Self::Poisson { dist, .. } => to_f64(dist.inverse_cdf(p)),
        }
    }

    /// Whether the family is continuous; distribution-shape tests (KS) are
    /// only valid for continuous observed data.
    #[must_use]
    pub fn is_continuous(&self) -> bool {
        !matches!(self, Self::Binomial { .. } | Self::Poisson { .. })
    }

    /// Draws `n` synthetic samples for two-sample comparisons.
    ///
    /// # Errors
    /// - If the sampler rejects the parameters
    pub fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<Vec<f64>, SftError> {
        let samples = match *self {
            Self::Exponential { rate, .. } => {
                let sampler = rand_distr::Exp::new(rate)
                    .map_err(|e| SftError::constraint(e.to_string()))?;
                (0..n).map(|_| sampler.sample(rng)).collect()
            }
            Self::Weibull { shape, scale, .. } => {
                let sampler = rand_distr::Weibull::new(scale, shape)
                    .map_err(|e| SftError::constraint(e.to_string()))?;
                (0..n).map(|_| sampler.sample(rng)).collect()
            }
            Self::LogNormal { mu, sigma, .. } => {
                let sampler = rand_distr::LogNormal::new(mu, sigma)
                    .map_err(|e| SftError::constraint(e.to_string()))?;
                (0..n).map(|_| sampler.sample(rng)).collect()
            }
            Self::Binomial { n: trials, p, .. } => {
                let sampler = rand_distr::Binomial::new(trials, p)
                    .map_err(|e| SftError::constraint(e.to_string()))?;
                (0..n).map(|_| to_f64(sampler.sample(rng))).collect()
            }
            Self::Poisson { lambda, .. } => {
                let sampler = rand_distr::Poisson::new(lambda)
                    .map_err(|e| SftError::constraint(e.to_string()))?;
                (0..n).map(|_| sampler.sample(rng)).collect()
            }
        };
        Ok(samples)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn discrete_cdf<D: DiscreteCDF<u64, f64>>(dist: &D, x: f64) -> f64 {
    if x < 0.0 {
        0.0
    } else {
        dist.cdf(x.floor() as u64)
    }
}

#[allow(clippy::cast_precision_loss)]
fn to_f64(n: u64) -> f64 {
    n as f64
}
