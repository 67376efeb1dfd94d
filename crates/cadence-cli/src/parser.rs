use anyhow::Result;
use chrono::{DateTime, Utc};
use chrono_english::{parse_date_string, Dialect};

/// Parses a human-friendly moment like 'tomorrow 9am' or '2025-07-01' into a
/// UTC timestamp.
pub fn parse_moment(input: &str) -> Result<DateTime<Utc>> {
    parse_date_string(input, Utc::now(), Dialect::Us)
        .map_err(|e| anyhow::anyhow!("Failed to parse time '{}': {}", input, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("2025-07-01")]
    #[case("tomorrow")]
    #[case("next friday")]
    #[case("tomorrow 8:30pm")]
    fn test_parses_common_phrases(#[case] input: &str) {
        parse_moment(input).expect("Failed to parse time phrase");
    }

    #[test]
    fn test_rejects_gibberish() {
        assert!(parse_moment("not a time").is_err());
    }

    #[test]
    fn test_absolute_date_parses_to_that_day() {
        let parsed = parse_moment("2025-07-01").expect("Failed to parse date");
        assert_eq!(parsed.date_naive().to_string(), "2025-07-01");
    }
}
