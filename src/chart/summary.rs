/// Quantile of an ascending slice using linear interpolation between closest
/// ranks (the Pandas / NumPy default).
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

/// Box-plot summary: quartiles plus Tukey whiskers at 1.5 × IQR, clamped to
/// the most extreme observations inside the fences.
#[derive(Debug, Clone, PartialEq)]
pub struct FiveNumber {
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
    pub mean: f64,
    pub count: usize,
    pub outliers: Vec<f64>,
}

impl FiveNumber {
    /// `None` when `values` holds no finite number.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);

        let q1 = quantile(&sorted, 0.25)?;
        let median = quantile(&sorted, 0.5)?;
        let q3 = quantile(&sorted, 0.75)?;
        let iqr = q3 - q1;
        let (low_fence, high_fence) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);

        let inside = |v: &f64| (low_fence..=high_fence).contains(v);
        let lower_whisker = sorted.iter().copied().find(inside).unwrap_or(q1);
        let upper_whisker = sorted.iter().rev().copied().find(inside).unwrap_or(q3);
        let outliers = sorted.iter().copied().filter(|v| !inside(v)).collect();

        Some(FiveNumber {
            lower_whisker,
            q1,
            median,
            q3,
            upper_whisker,
            mean: sorted.iter().sum::<f64>() / sorted.len() as f64,
            count: sorted.len(),
            outliers,
        })
    }
}
