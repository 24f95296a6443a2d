//! Mann-Kendall monotonic trend test.

use super::TrendLabel;

/// Significance level of the test.
pub const ALPHA: f64 = 0.05;

/// Two-sided critical value of the standard normal distribution at [`ALPHA`].
pub const CRITICAL_Z: f64 = 1.959_963_984_540_054;

/// Test statistics of one series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MannKendall {
    /// Concordant minus discordant pairs.
    pub s: f64,
    /// Variance of `s`, corrected for ties.
    pub variance: f64,
    /// Continuity-corrected normal score.
    pub z: f64,
}

impl MannKendall {
    /// Compute the statistics of `values`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn of(values: &[f64]) -> Self {
        let n = values.len();
        let mut s = 0.0;
        for k in 0..n.saturating_sub(1) {
            for j in k + 1..n {
                s += sign(values[j] - values[k]);
            }
        }

        let ties: f64 = tie_groups(values)
            .into_iter()
            .filter(|t| *t > 1)
            .map(|t| {
                let t = t as f64;
                t * (t - 1.0) * (2.0 * t + 5.0)
            })
            .sum();
        let nf = n as f64;
        let variance = (nf * (nf - 1.0) * (2.0 * nf + 5.0) - ties) / 18.0;

        let z = if variance <= 0.0 || s == 0.0 {
            0.0
        } else if s > 0.0 {
            (s - 1.0) / variance.sqrt()
        } else {
            (s + 1.0) / variance.sqrt()
        };

        Self { s, variance, z }
    }

    /// Verdict at significance [`ALPHA`].
    #[must_use]
    pub fn label(&self) -> TrendLabel {
        if self.z.abs() <= CRITICAL_Z {
            TrendLabel::None
        } else if self.z > 0.0 {
            TrendLabel::Increasing
        } else {
            TrendLabel::Decreasing
        }
    }
}

/// Run the test on `values`.
#[must_use]
pub fn mann_kendall(values: &[f64]) -> TrendLabel {
    MannKendall::of(values).label()
}

fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Sizes of the groups of equal values.
fn tie_groups(values: &[f64]) -> Vec<usize> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mut groups = Vec::new();
    let mut run = 0usize;
    for (i, v) in sorted.iter().enumerate() {
        if i > 0 && *v == sorted[i - 1] {
            run += 1;
        } else {
            if run > 0 {
                groups.push(run);
            }
            run = 1;
        }
    }
    if run > 0 {
        groups.push(run);
    }
    groups
}
