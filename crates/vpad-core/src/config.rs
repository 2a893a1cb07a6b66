//! Attribute value parsing with documented fallbacks.
//!
//! Controls are configured from string attributes. A value that does not
//! parse, or breaks its range rule, falls back to the option's default
//! instead of failing: a broken on-screen control would interrupt the whole
//! session.

use std::str::FromStr;

/// Leading-number parse in the spirit of `parseFloat`: `"120px"` → 120.
fn leading_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let mut end = 0;
    let mut prev = None;
    for (i, b) in trimmed.bytes().enumerate() {
        let sign_ok = i == 0 || matches!(prev, Some(b'e' | b'E'));
        let accepted = b.is_ascii_digit()
            || b == b'.'
            || ((b == b'-' || b == b'+') && sign_ok)
            || ((b == b'e' || b == b'E') && i > 0);
        if !accepted {
            break;
        }
        end = i + 1;
        prev = Some(b);
    }
    let mut candidate = &trimmed[..end];
    // Back off a dangling exponent or sign (`"3e"`, `"-"`)
    while !candidate.is_empty() {
        if let Ok(v) = candidate.parse::<f64>() {
            return v.is_finite().then_some(v);
        }
        candidate = &candidate[..candidate.len() - 1];
    }
    None
}

/// A strictly positive number, else `default`.
pub fn positive_or(raw: Option<&str>, default: f64) -> f64 {
    match raw.and_then(leading_number) {
        Some(v) if v > 0.0 => v,
        Some(v) => {
            log::debug!("non-positive value {v}, using default {default}");
            default
        }
        None => default,
    }
}

/// A non-negative number, else `default`.
pub fn non_negative_or(raw: Option<&str>, default: f64) -> f64 {
    match raw.and_then(leading_number) {
        Some(v) if v >= 0.0 => v,
        _ => default,
    }
}

/// Any number clamped into `min ..= max`; unparseable values use `default`.
pub fn clamped_or(raw: Option<&str>, default: f64, min: f64, max: f64) -> f64 {
    raw.and_then(leading_number)
        .map_or(default, |v| v.clamp(min, max))
}

/// A keyword enum, else its `Default`.
pub fn keyword_or_default<T: FromStr + Default>(raw: Option<&str>) -> T {
    match raw.map(str::trim) {
        Some(s) if !s.is_empty() => s.parse().unwrap_or_else(|_| {
            log::debug!("unknown keyword {s:?}, using default");
            T::default()
        }),
        _ => T::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    enum Flavor {
        #[default]
        Plain,
        Spicy,
    }

    impl FromStr for Flavor {
        type Err = ();
        fn from_str(s: &str) -> Result<Self, ()> {
            match s {
                "plain" => Ok(Self::Plain),
                "spicy" => Ok(Self::Spicy),
                _ => Err(()),
            }
        }
    }

    #[test]
    fn positive_values_fall_back() {
        assert_eq!(positive_or(Some("150"), 100.0), 150.0);
        assert_eq!(positive_or(Some("120px"), 100.0), 120.0);
        assert_eq!(positive_or(Some("abc"), 100.0), 100.0);
        assert_eq!(positive_or(Some("0"), 100.0), 100.0);
        assert_eq!(positive_or(Some("-5"), 100.0), 100.0);
        assert_eq!(positive_or(None, 100.0), 100.0);
    }

    #[test]
    fn non_negative_accepts_zero() {
        assert_eq!(non_negative_or(Some("0"), 50.0), 0.0);
        assert_eq!(non_negative_or(Some("-1"), 50.0), 50.0);
        assert_eq!(non_negative_or(Some("x"), 50.0), 50.0);
    }

    #[test]
    fn clamped_values() {
        assert_eq!(clamped_or(Some("0.3"), 0.1, 0.0, 1.0), 0.3);
        assert_eq!(clamped_or(Some("4"), 0.1, 0.0, 1.0), 1.0);
        assert_eq!(clamped_or(Some("-2"), 0.1, 0.0, 1.0), 0.0);
        assert_eq!(clamped_or(Some("nan"), 0.1, 0.0, 1.0), 0.1);
        assert_eq!(clamped_or(Some("1e-1"), 0.5, 0.0, 1.0), 0.1);
    }

    #[test]
    fn keywords_fall_back_to_default() {
        assert_eq!(keyword_or_default::<Flavor>(Some("spicy")), Flavor::Spicy);
        assert_eq!(keyword_or_default::<Flavor>(Some(" spicy ")), Flavor::Spicy);
        assert_eq!(keyword_or_default::<Flavor>(Some("sour")), Flavor::Plain);
        assert_eq!(keyword_or_default::<Flavor>(None), Flavor::Plain);
    }
}
