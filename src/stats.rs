use serde::{Deserialize, Serialize};

const LN_2PI: f64 = 1.8378770664093453;

pub struct Accumulator {
    n_vals: usize,
    mean: f64,
    diff_2_sum: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccumulatorReport {
    pub mean: f64,
    pub std_dev: f64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self {
            n_vals: 0,
            mean: 0.0,
            diff_2_sum: 0.0,
        }
    }

    pub fn add(&mut self, val: f64) {
        self.n_vals += 1;

        let diff_a = val - self.mean;
        self.mean += diff_a / self.n_vals as f64;

        let diff_b = val - self.mean;
        self.diff_2_sum += diff_a * diff_b;
    }

    pub fn report(&self) -> AccumulatorReport {
        AccumulatorReport {
            mean: self.mean,
            std_dev: if self.n_vals > 1 {
                (self.diff_2_sum / (self.n_vals as f64 - 1.0)).sqrt()
            } else {
                f64::NAN
            },
        }
    }
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::new()
    }
}

pub fn compute_mean(vals: &[f64]) -> f64 {
    if vals.is_empty() {
        return f64::NAN;
    }
    vals.iter().sum::<f64>() / vals.len() as f64
}

pub fn compute_var(vals: &[f64]) -> f64 {
    let n_vals = vals.len();
    if n_vals < 2 {
        return f64::NAN;
    }
    let mean = compute_mean(vals);
    vals.iter().map(|&val| (val - mean).powi(2)).sum::<f64>() / (n_vals - 1) as f64
}

/// Log density of a Normal distribution at `x`.
pub fn log_normal(x: f64, mean: f64, std_dev: f64) -> f64 {
    let z = (x - mean) / std_dev;
    -0.5 * (LN_2PI + z * z) - std_dev.ln()
}

/// Log density of a half-Cauchy distribution with the given scale at `x >= 0`.
pub fn log_half_cauchy(x: f64, scale: f64) -> f64 {
    if x < 0.0 {
        return f64::NEG_INFINITY;
    }
    let z = x / scale;
    (2.0 / std::f64::consts::PI).ln() - scale.ln() - (1.0 + z * z).ln()
}

/// Log density of a Uniform distribution on `[lo, hi]` at `x`.
pub fn log_uniform(x: f64, lo: f64, hi: f64) -> f64 {
    if x < lo || x > hi {
        f64::NEG_INFINITY
    } else {
        -(hi - lo).ln()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn accumulator_matches_batch_statistics() {
        let vals = [1.0, 4.0, 2.0, 8.0, 5.0];
        let mut acc = Accumulator::new();
        for &val in &vals {
            acc.add(val);
        }
        let report = acc.report();
        assert_relative_eq!(report.mean, compute_mean(&vals), epsilon = 1e-12);
        assert_relative_eq!(report.std_dev, compute_var(&vals).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn standard_normal_log_density_at_zero() {
        assert_relative_eq!(log_normal(0.0, 0.0, 1.0), -0.9189385332046727, epsilon = 1e-12);
    }

    #[test]
    fn half_cauchy_log_density() {
        assert_relative_eq!(
            log_half_cauchy(0.0, 1.0),
            (2.0 / std::f64::consts::PI).ln(),
            epsilon = 1e-12
        );
        assert_eq!(log_half_cauchy(-0.5, 1.0), f64::NEG_INFINITY);
    }

    #[test]
    fn uniform_log_density_support() {
        assert_relative_eq!(log_uniform(3.0, 2.0, 4.0), -(2.0f64.ln()), epsilon = 1e-12);
        assert_eq!(log_uniform(1.0, 2.0, 4.0), f64::NEG_INFINITY);
        assert_eq!(log_uniform(5.0, 2.0, 4.0), f64::NEG_INFINITY);
    }
}
