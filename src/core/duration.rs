//! Parsing of ISO-8601 style item durations (`PT1H2M3S`).

use std::sync::OnceLock;

use regex::Regex;

const SECONDS_PER_DAY: u64 = 86_400;
const SECONDS_PER_HOUR: u64 = 3_600;
const SECONDS_PER_MINUTE: u64 = 60;

fn duration_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?")
            .expect("duration regex is a valid constant")
    })
}

/// Parse an encoded duration into whole seconds.
///
/// Every component is optional. Input that does not look like a duration at
/// all yields zero instead of an error so one malformed item cannot abort a
/// pass.
pub fn parse(encoded: &str) -> u64 {
    let Some(caps) = duration_regex().captures(encoded) else {
        return 0;
    };

    // Captures are digits only, so a parse failure means the value overflowed
    let component = |idx: usize| -> u64 {
        caps.get(idx)
            .map(|m| m.as_str().parse::<u64>().unwrap_or(u64::MAX))
            .unwrap_or(0)
    };

    component(1)
        .saturating_mul(SECONDS_PER_DAY)
        .saturating_add(component(2).saturating_mul(SECONDS_PER_HOUR))
        .saturating_add(component(3).saturating_mul(SECONDS_PER_MINUTE))
        .saturating_add(component(4))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_duration() {
        assert_eq!(parse("PT1H2M3S"), 3723);
    }

    #[test]
    fn test_partial_durations() {
        assert_eq!(parse("PT5M"), 300);
        assert_eq!(parse("PT45S"), 45);
        assert_eq!(parse("PT2H"), 7200);
        assert_eq!(parse("PT1H30S"), 3630);
    }

    #[test]
    fn test_empty_components() {
        assert_eq!(parse("PT"), 0);
        assert_eq!(parse("P0D"), 0);
    }

    #[test]
    fn test_garbage_is_zero() {
        assert_eq!(parse("garbage"), 0);
        assert_eq!(parse(""), 0);
        assert_eq!(parse("12:34"), 0);
    }

    #[test]
    fn test_day_component() {
        assert_eq!(parse("P1DT2H"), 86_400 + 7_200);
    }

    #[test]
    fn test_oversized_components_saturate() {
        assert_eq!(parse("PT99999999999999999999H"), u64::MAX);
        assert_eq!(parse("PT99999999999999999999999S"), u64::MAX);
        assert_eq!(parse("P999999999999999DT1S"), u64::MAX);
    }
}
