use once_cell::sync::Lazy;
use regex::Regex;

static DECIMAL_INPUT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d*\.?\d*$").unwrap());

/// True while the text is something a user could be in the middle of typing
/// as a decimal number ("", "-", "3.", "-0.25").
pub fn is_decimal_input(value: &str) -> bool {
    DECIMAL_INPUT.is_match(value)
}

/// Parse user supplied text as a finite float.
pub fn parse_decimal(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() || !is_decimal_input(trimmed) {
        return None;
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => None,
    }
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Mean and sample standard deviation, None for fewer than two values.
pub fn mean_and_sd(values: &[f64]) -> Option<(f64, f64)> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some((mean, variance.sqrt()))
}

/// Middle element of the sorted values, the upper one for even counts.
pub fn upper_median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    Some(sorted[sorted.len() / 2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_input_accepts_partial_numbers() {
        for ok in ["", "-", "3.", "-0.25", "41", ".5"] {
            assert!(is_decimal_input(ok), "{}", ok);
        }
        for bad in ["1e5", "4,2", "abc", "--1", "1.2.3"] {
            assert!(!is_decimal_input(bad), "{}", bad);
        }
    }

    #[test]
    fn parse_decimal_requires_a_number() {
        assert_eq!(parse_decimal(" 55.3 "), Some(55.3));
        assert_eq!(parse_decimal("-"), None);
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("NaN"), None);
    }

    #[test]
    fn rounding_and_statistics() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(9.697, 1), 9.7);
        let (mean, sd) = mean_and_sd(&[2.0, 4.0, 6.0]).unwrap();
        assert_eq!(mean, 4.0);
        assert_eq!(sd, 2.0);
        assert!(mean_and_sd(&[1.0]).is_none());
        assert_eq!(upper_median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(upper_median(&[4.0, 1.0, 2.0, 3.0]), Some(3.0));
        assert_eq!(upper_median(&[]), None);
    }
}
