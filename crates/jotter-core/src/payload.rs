use serde::{Deserialize, Serialize};

/// Bound on the short text variant; matches the storage column contract.
pub const SHORT_TEXT_MAX: usize = 200;

/// Bound on log book titles.
pub const TITLE_MAX: usize = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    Number,
    NumberArray,
    ShortText,
    LongText,
}

impl PayloadKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PayloadKind::Number => "number",
            PayloadKind::NumberArray => "number_array",
            PayloadKind::ShortText => "short_text",
            PayloadKind::LongText => "long_text",
        }
    }
}

/// The one value an entry holds. Stored as a discriminator plus per-kind
/// columns; every write covers all of them, so switching an entry's kind
/// cannot leave stale data behind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Payload {
    Number(f64),
    NumberArray(Vec<f64>),
    ShortText(String),
    LongText(String),
}

impl Payload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::Number(_) => PayloadKind::Number,
            Payload::NumberArray(_) => PayloadKind::NumberArray,
            Payload::ShortText(_) => PayloadKind::ShortText,
            Payload::LongText(_) => PayloadKind::LongText,
        }
    }

    /// Decode from the storage columns. A stored discriminator wins; rows
    /// without one (imports from the legacy system) fall back to [`infer`].
    ///
    /// [`infer`]: Payload::infer
    pub fn from_columns(
        kind: Option<&str>,
        number: Option<f64>,
        number_array: Option<Vec<f64>>,
        short_text: Option<String>,
        long_text: Option<String>,
    ) -> Option<Payload> {
        match kind {
            Some("number") => number.map(Payload::Number),
            Some("number_array") => number_array.map(Payload::NumberArray),
            Some("short_text") => short_text.map(Payload::ShortText),
            Some("long_text") => long_text.map(Payload::LongText),
            _ => Payload::infer(number, number_array, short_text, long_text),
        }
    }

    /// Variant inference for rows with no stored discriminator, in fixed
    /// precedence order: number, number_array, short_text, long_text.
    /// The first populated field wins; empty strings and empty arrays count
    /// as absent. A stray value in a lower-precedence field is ignored.
    pub fn infer(
        number: Option<f64>,
        number_array: Option<Vec<f64>>,
        short_text: Option<String>,
        long_text: Option<String>,
    ) -> Option<Payload> {
        if let Some(n) = number {
            return Some(Payload::Number(n));
        }
        match number_array {
            Some(a) if !a.is_empty() => return Some(Payload::NumberArray(a)),
            _ => {}
        }
        match short_text {
            Some(s) if !s.is_empty() => return Some(Payload::ShortText(s)),
            _ => {}
        }
        match long_text {
            Some(s) if !s.is_empty() => return Some(Payload::LongText(s)),
            _ => {}
        }
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid number: \"{segment}\"")]
pub struct InvalidNumber {
    pub segment: String,
}

/// Parse a comma- or newline-separated block of decimals, the raw form the
/// number-array field arrives in.
///
/// Segments are trimmed and empty ones skipped. The first unparseable
/// segment fails the whole input, carrying that segment verbatim — there is
/// no partial result.
pub fn parse_number_list(input: &str) -> Result<Vec<f64>, InvalidNumber> {
    let mut numbers = Vec::new();

    for segment in input.split(['\n', ',']) {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        match segment.parse::<f64>() {
            Ok(n) => numbers.push(n),
            Err(_) => {
                return Err(InvalidNumber {
                    segment: segment.to_string(),
                });
            }
        }
    }

    Ok(numbers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_mixed_separators() {
        assert_eq!(parse_number_list("1, 2.5\n3").unwrap(), vec![1.0, 2.5, 3.0]);
    }

    #[test]
    fn parse_skips_empty_segments() {
        assert_eq!(parse_number_list(" , ,\n2,").unwrap(), vec![2.0]);
        assert_eq!(parse_number_list("").unwrap(), Vec::<f64>::new());
    }

    #[test]
    fn parse_negative_and_exponent() {
        assert_eq!(parse_number_list("-2.5, 1e3").unwrap(), vec![-2.5, 1000.0]);
    }

    #[test]
    fn parse_fails_naming_the_segment() {
        let err = parse_number_list("1, abc").unwrap_err();
        assert_eq!(err.segment, "abc");
        assert_eq!(err.to_string(), "invalid number: \"abc\"");
    }

    #[test]
    fn parse_fails_on_first_bad_segment() {
        let err = parse_number_list("1\nbad\nalso-bad").unwrap_err();
        assert_eq!(err.segment, "bad");
    }

    #[test]
    fn infer_number_wins_over_stray_text() {
        let payload = Payload::infer(Some(4.0), None, Some("stray".into()), None);
        assert_eq!(payload, Some(Payload::Number(4.0)));
    }

    #[test]
    fn infer_zero_counts_as_populated() {
        let payload = Payload::infer(Some(0.0), None, None, Some("text".into()));
        assert_eq!(payload, Some(Payload::Number(0.0)));
    }

    #[test]
    fn infer_skips_empty_array() {
        let payload = Payload::infer(None, Some(vec![]), Some("note".into()), None);
        assert_eq!(payload, Some(Payload::ShortText("note".into())));
    }

    #[test]
    fn infer_all_absent() {
        assert_eq!(Payload::infer(None, None, Some(String::new()), None), None);
    }

    #[test]
    fn from_columns_prefers_discriminator() {
        let payload = Payload::from_columns(
            Some("long_text"),
            Some(1.0),
            None,
            None,
            Some("day one".into()),
        );
        assert_eq!(payload, Some(Payload::LongText("day one".into())));
    }

    #[test]
    fn from_columns_infers_without_discriminator() {
        let payload = Payload::from_columns(None, Some(7.5), None, Some("stray".into()), None);
        assert_eq!(payload, Some(Payload::Number(7.5)));
    }

    #[test]
    fn serde_shape_is_tagged() {
        let json = serde_json::to_value(Payload::NumberArray(vec![1.0, 2.5])).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "kind": "number_array", "value": [1.0, 2.5] })
        );
    }
}
