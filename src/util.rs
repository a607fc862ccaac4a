pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

/// Standard deviation with one degree of freedom removed, as reported for samples
pub fn sample_std_dev(data: &[f64]) -> Option<f64> {
    let count = data.len();
    if count < 2 {
        return None;
    }
    let data_mean = mean(data)?;
    let variance = data
        .iter()
        .map(|value| (value - data_mean).powi(2))
        .sum::<f64>()
        / (count - 1) as f64;

    Some(variance.sqrt())
}

/// Quantile `q` in [0, 1] using linear interpolation between closest ranks
pub fn quantile(data: &[f64], q: f64) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}
