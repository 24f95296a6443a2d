//! Ordinary least squares slope of a series against its index.

/// Slope of the least-squares line through `(i, values[i])`.
///
/// Unweighted, with intercept. Fewer than two points give `0.0`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let mean_x = (n - 1) as f64 / 2.0;
    let mean_y = values.iter().sum::<f64>() / n as f64;

    let (mut sxy, mut sxx) = (0.0, 0.0);
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - mean_x;
        sxy += dx * (y - mean_y);
        sxx += dx * dx;
    }
    sxy / sxx
}

/// [`slope`] as an angle in degrees, in `(-90, 90)`.
#[must_use]
pub fn slope_degrees(values: &[f64]) -> f64 {
    slope(values).atan().to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steep_line() {
        let deg = slope_degrees(&[0.0, 10.0, 20.0, 30.0]);
        assert_eq!((deg * 100.0).round() / 100.0, 84.29);
    }

    #[test]
    fn unit_slope_is_45_degrees() {
        assert!((slope_degrees(&[3.0, 4.0, 5.0, 6.0, 7.0]) - 45.0).abs() < 1e-9);
    }

    #[test]
    fn falling_and_flat() {
        assert!(slope_degrees(&[5.0, 4.0, 3.0]) < 0.0);
        assert_eq!(slope_degrees(&[2.0, 2.0, 2.0]), 0.0);
        assert_eq!(slope_degrees(&[1.0]), 0.0);
    }
}
