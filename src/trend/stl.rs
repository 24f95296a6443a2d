//! Seasonal-trend decomposition by loess, on top of the `stlrs` crate.
//!
//! The additive model is `y = seasonal + trend + remainder`. The multiplicative
//! model decomposes `ln y` additively and exponentiates the components, so
//! `y = seasonal × trend × remainder`. Non-positive inputs have no logarithm;
//! they are rejected before fitting.
//!
//! Every smoother is evaluated at each point (jumps of 1), the seasonal
//! smoother fits local constants and the trend and low-pass smoothers local
//! lines, as in the reference Fortran implementation.

use crate::error::{Error, Result};

/// Additive or multiplicative composition of the components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Model {
    #[default]
    Additive,
    Multiplicative,
}

/// Decomposition settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StlParams {
    /// Number of observations per cycle, at least 2.
    pub period: usize,
    /// Loess window of the cycle-subseries smoother, rounded up to an odd
    /// number of at least 3.
    pub seasonal_window: usize,
    /// Passes of the inner loop.
    pub inner_iterations: usize,
    /// Passes of the robustness loop.
    pub robust_iterations: usize,
    pub model: Model,
}

impl StlParams {
    #[must_use]
    pub const fn new(period: usize, seasonal_window: usize) -> Self {
        Self {
            period,
            seasonal_window,
            inner_iterations: 2,
            robust_iterations: 0,
            model: Model::Additive,
        }
    }

    #[must_use]
    pub const fn inner_iterations(mut self, n: usize) -> Self {
        self.inner_iterations = n;
        self
    }

    #[must_use]
    pub const fn robust_iterations(mut self, n: usize) -> Self {
        self.robust_iterations = n;
        self
    }

    #[must_use]
    pub const fn model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Seasonal window actually used by the smoother.
    #[must_use]
    pub const fn seasonal_length(&self) -> usize {
        let n = if self.seasonal_window < 3 { 3 } else { self.seasonal_window };
        if n % 2 == 0 { n + 1 } else { n }
    }
}

/// Components of a decomposed series, each as long as the input.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Decomposition {
    pub seasonal: Vec<f64>,
    pub trend: Vec<f64>,
    pub remainder: Vec<f64>,
}

/// Decompose `values` into seasonal, trend and remainder components.
///
/// # Errors
///
/// [`Error::Decomposition`] when the series covers fewer than two periods, the
/// period is below 2, or a multiplicative series holds a non-positive value.
pub fn decompose(values: &[f64], params: &StlParams) -> Result<Decomposition> {
    match params.model {
        Model::Additive => decompose_additive(values, params),
        Model::Multiplicative => {
            if let Some(v) = values.iter().find(|v| **v <= 0.0 || !v.is_finite()) {
                return Err(Error::Decomposition(format!(
                    "multiplicative model needs positive values, found {v}"
                )));
            }
            let logs: Vec<f64> = values.iter().map(|v| v.ln()).collect();
            let d = decompose_additive(&logs, params)?;
            Ok(Decomposition {
                seasonal: d.seasonal.into_iter().map(f64::exp).collect(),
                trend: d.trend.into_iter().map(f64::exp).collect(),
                remainder: d.remainder.into_iter().map(f64::exp).collect(),
            })
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn decompose_additive(values: &[f64], params: &StlParams) -> Result<Decomposition> {
    if params.period < 2 || values.len() < 2 * params.period {
        return Err(Error::Decomposition(format!(
            "{} points do not cover two periods of {}",
            values.len(),
            params.period
        )));
    }

    let series: Vec<f32> = values.iter().map(|v| *v as f32).collect();
    let fit = stlrs::params()
        .seasonal_length(params.seasonal_length())
        .seasonal_degree(0)
        .trend_degree(1)
        .low_pass_degree(1)
        .seasonal_jump(1)
        .trend_jump(1)
        .low_pass_jump(1)
        .inner_loops(params.inner_iterations)
        .outer_loops(params.robust_iterations)
        .robust(params.robust_iterations > 0)
        .fit(&series, params.period)
        .map_err(|e| Error::Decomposition(format!("{e:?}")))?;

    let widen = |xs: &[f32]| xs.iter().map(|x| f64::from(*x)).collect::<Vec<f64>>();
    Ok(Decomposition {
        seasonal: widen(fit.seasonal()),
        trend: widen(fit.trend()),
        remainder: widen(fit.remainder()),
    })
}
