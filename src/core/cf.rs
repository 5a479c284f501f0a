// faamcat - core/cf.rs
//
// CF-convention time axes and the multi-rate layout of flat data files.
// Pure functions over decoded arrays; the file reader lives in the app layer.

use crate::core::series::TimeSeries;
use crate::util::constants::GROUP_SEPARATOR;
use crate::util::error::SeriesError;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::BTreeMap;

/// Epoch of a `"seconds since <datetime>"` units string, in UTC.
///
/// Accepts a space or `T` separator, an optional numeric offset or `Z`, and
/// a bare date.
pub fn parse_time_units(units: &str) -> Result<NaiveDateTime, SeriesError> {
    let invalid = || SeriesError::TimeUnits {
        units: units.to_string(),
    };

    let (unit, epoch) = units.trim().split_once(" since ").ok_or_else(invalid)?;
    if !matches!(
        unit.trim().to_ascii_lowercase().as_str(),
        "seconds" | "second" | "secs" | "s"
    ) {
        return Err(invalid());
    }
    let epoch = epoch.trim();

    for fmt in ["%Y-%m-%d %H:%M:%S %z", "%Y-%m-%d %H:%M:%S%z", "%Y-%m-%dT%H:%M:%S%z"] {
        if let Ok(dt) = DateTime::parse_from_str(epoch, fmt) {
            return Ok(dt.naive_utc());
        }
    }

    let epoch = epoch
        .trim_end_matches("UTC")
        .trim_end_matches('Z')
        .trim_end();
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(epoch, fmt) {
            return Ok(dt);
        }
    }
    NaiveDate::parse_from_str(epoch, "%Y-%m-%d")
        .map(|d| d.and_time(NaiveTime::MIN))
        .map_err(|_| invalid())
}

/// Timestamps for second offsets from `epoch`, to the millisecond.
///
/// A non-finite offset cannot be placed and is reported as `UnsortedIndex`
/// at its position.
pub fn decode_times(epoch: NaiveDateTime, offsets: &[f64]) -> Result<Vec<NaiveDateTime>, SeriesError> {
    offsets
        .iter()
        .enumerate()
        .map(|(position, s)| {
            if !s.is_finite() {
                return Err(SeriesError::UnsortedIndex { position });
            }
            Ok(epoch + Duration::milliseconds((s * 1000.0).round() as i64))
        })
        .collect()
}

/// Replace the declared fill value with NaN.
pub fn mask_fill(values: &mut [f64], fill: f64) {
    for v in values.iter_mut().filter(|v| **v == fill) {
        *v = f64::NAN;
    }
}

/// One variable of a flat file: `samples_per_second` values for every
/// second of the time axis, time-major.
#[derive(Debug, Clone, PartialEq)]
pub struct RawVariable {
    pub name: String,
    pub samples_per_second: usize,
    pub values: Vec<f64>,
}

/// Lay out variables of mixed rates on one table at the fastest rate.
///
/// A slower variable fills the grid points its own samples fall on exactly;
/// the points between are missing.
pub fn flat_table(
    start: NaiveDateTime,
    seconds: usize,
    variables: Vec<RawVariable>,
) -> Result<TimeSeries, SeriesError> {
    let rate = variables
        .iter()
        .map(|v| v.samples_per_second)
        .max()
        .unwrap_or(1)
        .max(1);
    let hz = u32::try_from(rate).map_err(|_| SeriesError::InvalidFrequency { hz: u32::MAX })?;
    let mut table = TimeSeries::regular(start, hz, seconds * rate)?;

    for var in variables {
        let sps = var.samples_per_second.max(1);
        let expected = seconds * sps;
        if var.values.len() != expected {
            return Err(SeriesError::LengthMismatch {
                channel: var.name,
                expected,
                actual: var.values.len(),
            });
        }

        let mut column = vec![f64::NAN; seconds * rate];
        for (j, v) in var.values.into_iter().enumerate() {
            if (j * rate) % sps == 0 {
                column[j * rate / sps] = v;
            }
        }
        table.insert_channel(var.name, column)?;
    }
    Ok(table)
}

/// A group's time coordinate: the first variable with "time" in its name.
pub fn time_coordinate(names: &[String]) -> Option<&str> {
    names
        .iter()
        .map(String::as_str)
        .find(|n| n.to_ascii_lowercase().contains("time"))
}

/// Split `group/variable` channel names by group, keeping request order
/// within each group.
pub fn group_channels<'c>(channels: &[&'c str]) -> Result<BTreeMap<&'c str, Vec<&'c str>>, SeriesError> {
    let mut groups: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for channel in channels {
        match channel.rsplit_once(GROUP_SEPARATOR) {
            Some((group, variable)) if !group.is_empty() && !variable.is_empty() => {
                groups.entry(group).or_default().push(variable);
            }
            _ => {
                return Err(SeriesError::MissingChannel {
                    channel: (*channel).to_string(),
                })
            }
        }
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn midnight() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 1, 30)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_time_units_forms() {
        for units in [
            "seconds since 2020-01-30 00:00:00 +0000",
            "seconds since 2020-01-30 00:00:00+00:00",
            "seconds since 2020-01-30T00:00:00Z",
            "Seconds since 2020-01-30 00:00:00",
            "seconds since 2020-01-30",
        ] {
            assert_eq!(parse_time_units(units).unwrap(), midnight(), "{units}");
        }
    }

    #[test]
    fn test_time_units_offset_converted_to_utc() {
        let epoch = parse_time_units("seconds since 2020-01-30 01:00:00 +0100").unwrap();
        assert_eq!(epoch, midnight());
    }

    #[test]
    fn test_time_units_rejected() {
        assert!(matches!(
            parse_time_units("hours since 2020-01-30"),
            Err(SeriesError::TimeUnits { .. })
        ));
        assert!(parse_time_units("seconds").is_err());
        assert!(parse_time_units("seconds since yesterday").is_err());
    }

    #[test]
    fn test_decode_times() {
        let times = decode_times(midnight(), &[36000.0, 36000.5]).unwrap();
        assert_eq!(times[0], midnight() + Duration::hours(10));
        assert_eq!(times[1], times[0] + Duration::milliseconds(500));
        assert_eq!(
            decode_times(midnight(), &[0.0, f64::NAN]).unwrap_err(),
            SeriesError::UnsortedIndex { position: 1 }
        );
    }

    #[test]
    fn test_fill_value_masked() {
        let mut v = vec![1.0, -9999.0, 3.0];
        mask_fill(&mut v, -9999.0);
        assert_eq!(v[0], 1.0);
        assert!(v[1].is_nan());
    }

    #[test]
    fn test_flat_table_mixed_rates() {
        let start = midnight() + Duration::hours(10);
        let table = flat_table(
            start,
            2,
            vec![
                RawVariable {
                    name: "WOW_IND".to_string(),
                    samples_per_second: 1,
                    values: vec![0.0, 1.0],
                },
                RawVariable {
                    name: "PS_RVSM".to_string(),
                    samples_per_second: 4,
                    values: (0..8).map(f64::from).collect(),
                },
            ],
        )
        .unwrap();

        assert_eq!(table.len(), 8);
        assert_eq!(table.index()[4], start + Duration::seconds(1));
        assert_eq!(table.channel("PS_RVSM").unwrap()[5], 5.0);

        let wow = table.channel("WOW_IND").unwrap();
        assert_eq!(wow[0], 0.0);
        assert_eq!(wow[4], 1.0);
        assert!(wow[1].is_nan() && wow[7].is_nan());

        // Back on whole seconds every channel is complete.
        let one_hz = table.resample(1).unwrap();
        assert_eq!(one_hz.channel("WOW_IND").unwrap(), &[0.0, 1.0]);
        assert_eq!(one_hz.channel("PS_RVSM").unwrap(), &[0.0, 4.0]);
    }

    #[test]
    fn test_flat_table_length_checked() {
        let err = flat_table(
            midnight(),
            3,
            vec![RawVariable {
                name: "ROLL_GIN".to_string(),
                samples_per_second: 32,
                values: vec![0.0; 10],
            }],
        )
        .unwrap_err();
        assert!(matches!(err, SeriesError::LengthMismatch { expected: 96, actual: 10, .. }));
    }

    #[test]
    fn test_time_coordinate_by_name() {
        let names = vec!["conc".to_string(), "TIME_MID".to_string(), "time".to_string()];
        assert_eq!(time_coordinate(&names), Some("TIME_MID"));
        assert_eq!(time_coordinate(&["conc".to_string()]), None);
    }

    #[test]
    fn test_group_channels() {
        let groups = group_channels(&["CDP/conc", "CIP15/conc", "CDP/diam"]).unwrap();
        assert_eq!(groups["CDP"], vec!["conc", "diam"]);
        assert_eq!(groups["CIP15"], vec!["conc"]);

        for bad in ["conc", "CDP/", "/conc"] {
            assert_eq!(
                group_channels(&[bad]).unwrap_err(),
                SeriesError::MissingChannel {
                    channel: bad.to_string()
                }
            );
        }
    }
}
