use serde::{Deserialize, Serialize};

/// Linear min/max scaler onto `[low, high]` (default `[-1, 1]`).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    data_min: f64,
    data_max: f64,
    low: f64,
    high: f64,
}

impl MinMaxScaler {
    /// Fit on `values`; `None` when there is no finite value.
    pub fn fit(values: &[f64]) -> Option<Self> {
        Self::fit_range(values, -1.0, 1.0)
    }

    pub fn fit_range(values: &[f64], low: f64, high: f64) -> Option<Self> {
        let (data_min, data_max) = values
            .iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                None => Some((*v, *v)),
                Some((lo, hi)) => Some((lo.min(*v), hi.max(*v))),
            })?;
        Some(Self {
            data_min,
            data_max,
            low,
            high,
        })
    }

    fn span(&self) -> f64 {
        self.data_max - self.data_min
    }

    /// Constant input maps to the midpoint of the target range.
    pub fn transform(&self, value: f64) -> f64 {
        if self.span() == 0.0 {
            return (self.low + self.high) / 2.0;
        }
        self.low + (value - self.data_min) / self.span() * (self.high - self.low)
    }

    pub fn inverse(&self, scaled: f64) -> f64 {
        if self.span() == 0.0 {
            return self.data_min;
        }
        self.data_min + (scaled - self.low) / (self.high - self.low) * self.span()
    }

    pub fn transform_all(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|v| self.transform(*v)).collect()
    }

    pub fn inverse_all(&self, scaled: &[f64]) -> Vec<f64> {
        scaled.iter().map(|v| self.inverse(*v)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scales_to_unit_range() {
        let s = MinMaxScaler::fit(&[10.0, 20.0, 15.0]).unwrap();
        assert_eq!(s.transform(10.0), -1.0);
        assert_eq!(s.transform(20.0), 1.0);
        assert_eq!(s.transform(15.0), 0.0);
        assert_eq!(s.inverse(0.5), 17.5);
    }

    #[test]
    fn test_constant_series() {
        let s = MinMaxScaler::fit(&[4.2, 4.2]).unwrap();
        assert_eq!(s.transform(4.2), 0.0);
        assert_eq!(s.inverse(0.3), 4.2);
    }

    #[test]
    fn test_ignores_non_finite() {
        let s = MinMaxScaler::fit(&[f64::NAN, 1.0, 3.0, f64::INFINITY]).unwrap();
        assert_eq!(s.transform(3.0), 1.0);
        assert!(MinMaxScaler::fit(&[f64::NAN]).is_none());
        assert!(MinMaxScaler::fit(&[]).is_none());
    }
}
