pub struct StatsHelper;

impl StatsHelper {
    /// Arithmetic mean, `None` for an empty slice.
    pub fn mean(samples: &[f64]) -> Option<f64> {
        if samples.is_empty() {
            return None;
        }
        Some(samples.iter().sum::<f64>() / samples.len() as f64)
    }

    /// Population standard deviation.
    pub fn std_dev(samples: &[f64]) -> Option<f64> {
        let mean = Self::mean(samples)?;
        let var = samples.iter().map(|&v| (v - mean) * (v - mean)).sum::<f64>()
            / samples.len() as f64;
        Some(var.sqrt())
    }

    /// Least-squares line `y = intercept + slope * i` against the sample index.
    ///
    /// Returns `(slope, intercept)`, or `None` with fewer than two samples.
    pub fn linear_fit(samples: &[f64]) -> Option<(f64, f64)> {
        let n = samples.len();
        if n < 2 {
            return None;
        }
        let mean_x = (n - 1) as f64 / 2.0;
        let mean_y = Self::mean(samples)?;
        let (mut sxy, mut sxx) = (0.0, 0.0);
        for (i, &y) in samples.iter().enumerate() {
            let dx = i as f64 - mean_x;
            sxy += dx * (y - mean_y);
            sxx += dx * dx;
        }
        let slope = sxy / sxx;
        Some((slope, mean_y - slope * mean_x))
    }
}
