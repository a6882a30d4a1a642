/// Ordinary least squares fit of `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OlsRegression {
    pub slope: f64,
    pub intercept: f64,
}

impl OlsRegression {
    /// Fit a line through `(x, y)` pairs. Returns `None` with fewer than two
    /// points or when every `x` is the same.
    pub fn fit(points: &[(f64, f64)]) -> Option<OlsRegression> {
        if points.len() < 2 {
            return None;
        }
        let n = points.len() as f64;
        let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
        let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;
        let (sxy, sxx) = points.iter().fold((0.0, 0.0), |(sxy, sxx), (x, y)| {
            let dx = x - mean_x;
            (sxy + dx * (y - mean_y), sxx + dx * dx)
        });
        if sxx == 0.0 {
            return None;
        }
        let slope = sxy / sxx;
        Some(OlsRegression {
            slope,
            intercept: mean_y - slope * mean_x,
        })
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}
