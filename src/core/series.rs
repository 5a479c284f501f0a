// faamcat - core/series.rs
//
// Time-indexed table of named channels, as materialised by a loader from a
// resolved data file. Missing samples are NaN.

use crate::util::error::SeriesError;
use chrono::{Duration, NaiveDateTime};
use std::collections::{BTreeMap, BTreeSet};

/// A strictly increasing time index plus equally long `f64` channels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeries {
    index: Vec<NaiveDateTime>,
    channels: BTreeMap<String, Vec<f64>>,
}

impl TimeSeries {
    /// A table with `index` and no channels yet.
    pub fn new(index: Vec<NaiveDateTime>) -> Result<Self, SeriesError> {
        if let Some(position) = index.windows(2).position(|w| w[1] <= w[0]) {
            return Err(SeriesError::UnsortedIndex {
                position: position + 1,
            });
        }
        Ok(Self {
            index,
            channels: BTreeMap::new(),
        })
    }

    /// A regular index of `len` samples at `hz`, starting at `start`.
    pub fn regular(start: NaiveDateTime, hz: u32, len: usize) -> Result<Self, SeriesError> {
        let step = step_for(hz)?;
        let index = (0..len)
            .map(|i| start + step * i as i32)
            .collect::<Vec<_>>();
        Self::new(index)
    }

    /// Builder form of `insert_channel`.
    pub fn with_channel(
        mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<Self, SeriesError> {
        self.insert_channel(name, values)?;
        Ok(self)
    }

    /// Add or replace a channel. Its length must equal the index length.
    pub fn insert_channel(
        &mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<(), SeriesError> {
        let name = name.into();
        if values.len() != self.index.len() {
            return Err(SeriesError::LengthMismatch {
                channel: name,
                expected: self.index.len(),
                actual: values.len(),
            });
        }
        self.channels.insert(name, values);
        Ok(())
    }

    pub fn index(&self) -> &[NaiveDateTime] {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(String::as_str)
    }

    pub fn has_channel(&self, name: &str) -> bool {
        self.channels.contains_key(name)
    }

    /// Values of `name`, or `MissingChannel`.
    pub fn channel(&self, name: &str) -> Result<&[f64], SeriesError> {
        self.channels
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| SeriesError::MissingChannel {
                channel: name.to_string(),
            })
    }

    /// A table with the same index and only the named channels.
    pub fn select(&self, names: &[&str]) -> Result<TimeSeries, SeriesError> {
        let mut channels = BTreeMap::new();
        for name in names {
            channels.insert((*name).to_string(), self.channel(name)?.to_vec());
        }
        Ok(TimeSeries {
            index: self.index.clone(),
            channels,
        })
    }

    /// Combine two tables over the union of their indexes. A channel is
    /// missing wherever its own table has no sample; on a name clash the
    /// channel from `other` wins.
    pub fn outer_join(&self, other: &TimeSeries) -> TimeSeries {
        let index: Vec<NaiveDateTime> = self
            .index
            .iter()
            .chain(&other.index)
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut channels = BTreeMap::new();
        for table in [self, other] {
            for (name, values) in &table.channels {
                let mut joined = vec![f64::NAN; index.len()];
                for (t, v) in table.index.iter().zip(values) {
                    if let Ok(p) = index.binary_search(t) {
                        joined[p] = *v;
                    }
                }
                channels.insert(name.clone(), joined);
            }
        }
        TimeSeries { index, channels }
    }

    /// Re-grid onto a regular `hz` cadence from the first to the last sample.
    ///
    /// Grid points that coincide with an existing timestamp keep its values;
    /// every other grid point is missing (NaN). No interpolation.
    pub fn resample(&self, hz: u32) -> Result<TimeSeries, SeriesError> {
        let step = step_for(hz)?;
        let (first, last) = match (self.index.first(), self.index.last()) {
            (Some(f), Some(l)) => (*f, *l),
            _ => return Ok(self.clone()),
        };

        let mut grid = Vec::new();
        let mut t = first;
        while t <= last {
            grid.push(t);
            t += step;
        }

        // Source position for each grid point, if an exact match exists.
        let mut source: Vec<Option<usize>> = Vec::with_capacity(grid.len());
        let mut j = 0usize;
        for g in &grid {
            while j < self.index.len() && self.index[j] < *g {
                j += 1;
            }
            source.push((j < self.index.len() && self.index[j] == *g).then_some(j));
        }

        let channels = self
            .channels
            .iter()
            .map(|(name, values)| {
                let resampled = source
                    .iter()
                    .map(|s| s.map_or(f64::NAN, |j| values[j]))
                    .collect();
                (name.clone(), resampled)
            })
            .collect();

        Ok(TimeSeries {
            index: grid,
            channels,
        })
    }
}

/// Sample spacing for a positive frequency.
pub fn step_for(hz: u32) -> Result<Duration, SeriesError> {
    if hz == 0 {
        return Err(SeriesError::InvalidFrequency { hz });
    }
    Ok(Duration::nanoseconds(1_000_000_000 / i64::from(hz)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 1, 30)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn secs(s: &[i64]) -> Vec<NaiveDateTime> {
        s.iter().map(|s| t0() + Duration::seconds(*s)).collect()
    }

    #[test]
    fn test_unsorted_index_rejected() {
        let err = TimeSeries::new(secs(&[0, 2, 1])).unwrap_err();
        assert_eq!(err, SeriesError::UnsortedIndex { position: 2 });
        assert!(TimeSeries::new(secs(&[0, 0])).is_err());
    }

    #[test]
    fn test_channel_length_checked() {
        let ts = TimeSeries::new(secs(&[0, 1, 2])).unwrap();
        let err = ts.with_channel("PS_RVSM", vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, SeriesError::LengthMismatch { expected: 3, actual: 2, .. }));
    }

    #[test]
    fn test_missing_channel_is_reported_by_name() {
        let ts = TimeSeries::new(secs(&[0])).unwrap();
        assert_eq!(
            ts.channel("ROLL_GIN").unwrap_err(),
            SeriesError::MissingChannel {
                channel: "ROLL_GIN".to_string()
            }
        );
        assert!(ts.select(&["ROLL_GIN"]).is_err());
    }

    #[test]
    fn test_resample_fills_gaps_with_missing() {
        let ts = TimeSeries::new(secs(&[0, 1, 4]))
            .unwrap()
            .with_channel("x", vec![10.0, 11.0, 14.0])
            .unwrap();
        let r = ts.resample(1).unwrap();
        assert_eq!(r.index(), secs(&[0, 1, 2, 3, 4]).as_slice());
        let x = r.channel("x").unwrap();
        assert_eq!(x[0], 10.0);
        assert_eq!(x[1], 11.0);
        assert!(x[2].is_nan());
        assert!(x[3].is_nan());
        assert_eq!(x[4], 14.0);
    }

    #[test]
    fn test_resample_down_picks_whole_seconds() {
        let ts = TimeSeries::regular(t0(), 4, 8)
            .unwrap()
            .with_channel("x", (0..8).map(f64::from).collect())
            .unwrap();
        let r = ts.resample(1).unwrap();
        assert_eq!(r.len(), 2);
        assert_eq!(r.channel("x").unwrap(), &[0.0, 4.0]);
    }

    #[test]
    fn test_outer_join_unions_indexes() {
        let a = TimeSeries::new(secs(&[0, 2]))
            .unwrap()
            .with_channel("CDP/conc", vec![1.0, 3.0])
            .unwrap();
        let b = TimeSeries::new(secs(&[1, 2]))
            .unwrap()
            .with_channel("CIP15/conc", vec![20.0, 30.0])
            .unwrap();
        let joined = a.outer_join(&b);
        assert_eq!(joined.index(), secs(&[0, 1, 2]).as_slice());

        let cdp = joined.channel("CDP/conc").unwrap();
        assert_eq!(cdp[0], 1.0);
        assert!(cdp[1].is_nan());
        assert_eq!(cdp[2], 3.0);

        let cip = joined.channel("CIP15/conc").unwrap();
        assert!(cip[0].is_nan());
        assert_eq!(&cip[1..], &[20.0, 30.0]);
    }

    #[test]
    fn test_resample_zero_hz_rejected() {
        let ts = TimeSeries::new(secs(&[0])).unwrap();
        assert!(matches!(
            ts.resample(0),
            Err(SeriesError::InvalidFrequency { hz: 0 })
        ));
    }

    #[test]
    fn test_resample_empty_is_empty() {
        let ts = TimeSeries::new(Vec::new()).unwrap();
        assert!(ts.resample(1).unwrap().is_empty());
    }
}
