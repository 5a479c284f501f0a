// faamcat - core/detect/window.rs
//
// Fixed-size rolling statistics over sample positions.
//
// A window that runs off either end of the series, or contains a missing
// (NaN) value, yields NaN. NaN never passes a threshold comparison, so those
// positions are never selected by a detector.

/// Position range `[start, end]` of a centred window of `w` at `i`, if it
/// fits inside `n` samples. The centre sits right of middle for even `w`.
fn centred_bounds(i: usize, w: usize, n: usize) -> Option<(usize, usize)> {
    if w == 0 {
        return None;
    }
    let start = i.checked_sub(w / 2)?;
    let end = start + w - 1;
    (end < n).then_some((start, end))
}

fn trailing_bounds(i: usize, w: usize) -> Option<(usize, usize)> {
    if w == 0 {
        return None;
    }
    let start = (i + 1).checked_sub(w)?;
    Some((start, i))
}

fn complete(window: &[f64]) -> Option<&[f64]> {
    window.iter().all(|v| v.is_finite()).then_some(window)
}

fn mean(window: &[f64]) -> f64 {
    window.iter().sum::<f64>() / window.len() as f64
}

/// Sample standard deviation (n - 1 denominator); NaN below two samples.
fn sample_std(window: &[f64]) -> f64 {
    if window.len() < 2 {
        return f64::NAN;
    }
    let m = mean(window);
    let ss: f64 = window.iter().map(|v| (v - m) * (v - m)).sum();
    (ss / (window.len() - 1) as f64).sqrt()
}

fn range(window: &[f64]) -> f64 {
    let (lo, hi) = window
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    hi - lo
}

fn rolling<B, S>(values: &[f64], bounds: B, stat: S) -> Vec<f64>
where
    B: Fn(usize) -> Option<(usize, usize)>,
    S: Fn(&[f64]) -> f64,
{
    (0..values.len())
        .map(|i| {
            bounds(i)
                .and_then(|(s, e)| complete(&values[s..=e]))
                .map_or(f64::NAN, &stat)
        })
        .collect()
}

/// Mean of the `w` samples ending at each position.
pub fn trailing_mean(values: &[f64], w: usize) -> Vec<f64> {
    rolling(values, |i| trailing_bounds(i, w), mean)
}

/// Centred rolling mean.
pub fn centred_mean(values: &[f64], w: usize) -> Vec<f64> {
    let n = values.len();
    rolling(values, |i| centred_bounds(i, w, n), mean)
}

/// Centred rolling sample standard deviation.
pub fn centred_std(values: &[f64], w: usize) -> Vec<f64> {
    let n = values.len();
    rolling(values, |i| centred_bounds(i, w, n), sample_std)
}

/// Centred rolling peak-to-peak (max - min).
pub fn centred_range(values: &[f64], w: usize) -> Vec<f64> {
    let n = values.len();
    rolling(values, |i| centred_bounds(i, w, n), range)
}

/// First difference; the first position has no predecessor and is NaN.
pub fn diff(values: &[f64]) -> Vec<f64> {
    std::iter::once(f64::NAN)
        .chain(values.windows(2).map(|w| w[1] - w[0]))
        .take(values.len())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nan_mask(v: &[f64]) -> Vec<bool> {
        v.iter().map(|x| x.is_nan()).collect()
    }

    #[test]
    fn test_centred_window_placement() {
        // Odd window: one either side.
        assert_eq!(centred_bounds(1, 3, 5), Some((0, 2)));
        assert_eq!(centred_bounds(0, 3, 5), None);
        assert_eq!(centred_bounds(4, 3, 5), None);
        // Even window: two left, one right.
        assert_eq!(centred_bounds(2, 4, 5), Some((0, 3)));
        assert_eq!(centred_bounds(4, 4, 5), None);
    }

    #[test]
    fn test_trailing_mean() {
        let m = trailing_mean(&[1.0, 2.0, 3.0, 4.0], 2);
        assert!(m[0].is_nan());
        assert_eq!(&m[1..], &[1.5, 2.5, 3.5]);
    }

    #[test]
    fn test_centred_std_is_sample_std() {
        let s = centred_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0], 8);
        // Only position 4 has a complete window of 8.
        assert_eq!(nan_mask(&s), vec![true, true, true, true, false, true, true, true]);
        let expected = (32.0f64 / 7.0).sqrt();
        assert!((s[4] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_missing_value_poisons_window() {
        let v = [1.0, 1.0, f64::NAN, 1.0, 1.0, 1.0, 1.0];
        let r = centred_range(&v, 3);
        assert_eq!(
            nan_mask(&r),
            vec![true, true, true, true, false, false, true]
        );
        assert_eq!(r[4], 0.0);
    }

    #[test]
    fn test_window_longer_than_series_is_all_missing() {
        assert!(centred_mean(&[1.0, 2.0], 5).iter().all(|v| v.is_nan()));
        assert!(trailing_mean(&[1.0, 2.0], 0).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_diff() {
        let d = diff(&[1.0, 4.0, 2.0]);
        assert!(d[0].is_nan());
        assert_eq!(&d[1..], &[3.0, -2.0]);
        assert!(diff(&[]).is_empty());
    }
}
