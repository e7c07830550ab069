use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HeaderError {
    #[error("header must look like 'Name: value', got '{0}'")]
    Malformed(String),
    #[error("invalid header name '{0}'")]
    InvalidName(String),
    #[error("invalid value for header '{0}'")]
    InvalidValue(String),
}

/// Parses a `Name: value` pair as given on the command line or in the config file.
pub fn parse_header(raw: &str) -> Result<(String, String), HeaderError> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| HeaderError::Malformed(raw.to_string()))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(HeaderError::Malformed(raw.to_string()));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Builds the headers passed through verbatim on every request.
pub fn header_map(headers: &[(String, String)]) -> Result<HeaderMap, HeaderError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| HeaderError::InvalidName(name.clone()))?;
        let header_value =
            HeaderValue::from_str(value).map_err(|_| HeaderError::InvalidValue(name.clone()))?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_header_trims_both_sides() {
        let (name, value) = parse_header("Ocp-Apim-Subscription-Key :  abc123 ").unwrap();
        assert_eq!(name, "Ocp-Apim-Subscription-Key");
        assert_eq!(value, "abc123");
    }

    #[test]
    fn test_parse_header_keeps_colons_in_value() {
        let (_, value) = parse_header("X-Forwarded-For: http://a:b").unwrap();
        assert_eq!(value, "http://a:b");
    }

    #[rstest]
    #[case("no-colon")]
    #[case(": value")]
    fn test_parse_header_rejects_malformed(#[case] raw: &str) {
        assert!(matches!(parse_header(raw), Err(HeaderError::Malformed(_))));
    }

    #[test]
    fn test_header_map_builds_entries() {
        let map = header_map(&[("X-Key".into(), "secret".into())]).unwrap();
        assert_eq!(map.get("x-key").unwrap(), "secret");
    }

    #[test]
    fn test_header_map_rejects_invalid_name() {
        let result = header_map(&[("bad name".into(), "v".into())]);
        assert!(matches!(result, Err(HeaderError::InvalidName(name)) if name == "bad name"));
    }

    #[test]
    fn test_header_map_rejects_invalid_value() {
        let result = header_map(&[("X-Key".into(), "line\nbreak".into())]);
        assert!(matches!(result, Err(HeaderError::InvalidValue(name)) if name == "X-Key"));
    }
}
