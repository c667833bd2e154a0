//! Statistics computed over a session's readings.

use crate::types::{MaxResult, Reading};

/// Maximum value over `readings`.
///
/// Returns `None` for an empty input instead of a default such as `0.0`,
/// which would be indistinguishable from a real zero reading.
pub fn compute_max<'a, I>(readings: I) -> Option<MaxResult>
where
    I: IntoIterator<Item = &'a Reading>,
{
    readings.into_iter().fold(None, |acc, r| match acc {
        None => Some(MaxResult {
            value: r.value,
            samples: 1,
        }),
        Some(m) => Some(MaxResult {
            value: m.value.max(r.value),
            samples: m.samples + 1,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn readings(values: &[f64]) -> Vec<Reading> {
        values
            .iter()
            .enumerate()
            .map(|(i, &value)| Reading {
                seq: i as u64,
                timestamp: 0.0,
                value,
            })
            .collect()
    }

    #[test]
    fn max_of_mixed_values() {
        let r = readings(&[3.0, 1.0, 4.0, 1.0, 5.0]);
        let m = compute_max(&r).unwrap();
        assert_eq!(m.value, 5.0);
        assert_eq!(m.samples, 5);
    }

    #[test]
    fn max_of_empty_is_none() {
        assert_eq!(compute_max(&Vec::<Reading>::new()), None);
    }

    #[test]
    fn max_of_negative_values_is_not_zero() {
        let r = readings(&[-7.5, -2.0, -3.0]);
        assert_eq!(compute_max(&r).unwrap().value, -2.0);
    }
}
