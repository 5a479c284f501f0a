// faamcat - core/detect/runs.rs
//
// Run-length segmentation of boolean masks, shared by every detector.

/// A maximal stretch of equal mask values: positions `start..start + len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub value: bool,
    pub start: usize,
    pub len: usize,
}

impl Run {
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Split `mask` into maximal runs of identical values, in order.
pub fn runs(mask: &[bool]) -> Vec<Run> {
    let mut out: Vec<Run> = Vec::new();
    for (i, &value) in mask.iter().enumerate() {
        match out.last_mut() {
            Some(run) if run.value == value => run.len += 1,
            _ => out.push(Run {
                value,
                start: i,
                len: 1,
            }),
        }
    }
    out
}

/// Runs that are entirely `true` and at least `min_length` long.
pub fn true_runs(mask: &[bool], min_length: usize) -> impl Iterator<Item = Run> {
    runs(mask)
        .into_iter()
        .filter(move |r| r.value && r.len >= min_length)
}

/// Cut a run of `len` samples into consecutive chunks of exactly `max_length`.
///
/// Returns `(offset, len)` pairs relative to the run start. Every full chunk
/// is kept; the trailing remainder is kept only if it reaches `min_length`.
/// Without `max_length` the whole run is a single chunk.
pub fn chunk_run(len: usize, min_length: usize, max_length: Option<usize>) -> Vec<(usize, usize)> {
    let max = match max_length {
        Some(max) if max > 0 => max,
        _ => return if len > 0 { vec![(0, len)] } else { Vec::new() },
    };
    let full = len / max;
    let mut chunks: Vec<(usize, usize)> = (0..full).map(|i| (i * max, max)).collect();
    let remainder = len - full * max;
    if remainder > 0 && remainder >= min_length {
        chunks.push((full * max, remainder));
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runs_cover_mask_in_order() {
        let mask = [true, true, false, true, false, false];
        let r = runs(&mask);
        assert_eq!(
            r,
            vec![
                Run { value: true, start: 0, len: 2 },
                Run { value: false, start: 2, len: 1 },
                Run { value: true, start: 3, len: 1 },
                Run { value: false, start: 4, len: 2 },
            ]
        );
        assert_eq!(r.iter().map(|r| r.len).sum::<usize>(), mask.len());
    }

    #[test]
    fn test_runs_empty() {
        assert!(runs(&[]).is_empty());
    }

    #[test]
    fn test_true_runs_respects_min_length() {
        let mut mask = vec![true; 5];
        mask.push(false);
        mask.extend(vec![true; 3]);
        let kept: Vec<Run> = true_runs(&mask, 4).collect();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].start, 0);
        assert_eq!(kept[0].len, 5);
    }

    #[test]
    fn test_chunk_run_drops_short_remainder() {
        // 250 samples in chunks of 100: the 50-sample tail is under 120.
        assert_eq!(chunk_run(250, 120, Some(100)), vec![(0, 100), (100, 100)]);
        assert_eq!(chunk_run(250, 40, Some(100)), vec![(0, 100), (100, 100), (200, 50)]);
    }

    #[test]
    fn test_chunk_run_exact_multiple_has_no_remainder() {
        assert_eq!(chunk_run(300, 100, Some(150)), vec![(0, 150), (150, 150)]);
    }

    #[test]
    fn test_chunk_run_without_max_is_whole_run() {
        assert_eq!(chunk_run(250, 120, None), vec![(0, 250)]);
        assert!(chunk_run(0, 0, None).is_empty());
    }
}
