//! Hostname range expansion.

use std::sync::LazyLock;

use regex::Regex;

use super::RangeError;

static HOSTNAME_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^\[]+)\[([0-9A-Za-z]+)-([0-9A-Za-z]+)\]$").expect("Invalid hostname range regex")
});

/// Expand a hostname range into concrete hostnames.
///
/// Numeric bounds (`sw[1-3]`) produce three-digit zero-padded suffixes:
/// `sw001`, `sw002`, `sw003`. Alphanumeric bounds (`sw[101a-101c]`) must share
/// everything but a trailing letter, and the letter is stepped through:
/// `sw101a`, `sw101b`, `sw101c`. Letters are compared and emitted in
/// lowercase.
///
/// # Examples
/// ```
/// use fabricplan::range::parse_hostname_range;
///
/// assert_eq!(
///     parse_hostname_range("nj01pamr[101a-101c]").unwrap(),
///     vec!["nj01pamr101a", "nj01pamr101b", "nj01pamr101c"]
/// );
/// assert!(parse_hostname_range("leaf[3-1]").is_err());
/// ```
pub fn parse_hostname_range(input: &str) -> Result<Vec<String>, RangeError> {
    let input = input.trim();
    let caps = HOSTNAME_RANGE
        .captures(input)
        .ok_or_else(|| RangeError::HostnameFormat(input.to_string()))?;
    let prefix = &caps[1];
    let start = &caps[2];
    let end = &caps[3];

    if is_all_digits(start) && is_all_digits(end) {
        let start_num: u64 = start
            .parse()
            .map_err(|_| RangeError::HostnameFormat(input.to_string()))?;
        let end_num: u64 = end
            .parse()
            .map_err(|_| RangeError::HostnameFormat(input.to_string()))?;
        if start_num > end_num {
            return Err(RangeError::InvertedRange {
                start: start_num,
                end: end_num,
            });
        }
        return Ok((start_num..=end_num)
            .map(|i| format!("{}{:03}", prefix, i))
            .collect());
    }

    if start.len() != end.len() {
        return Err(RangeError::LengthMismatch {
            start: start.to_string(),
            end: end.to_string(),
        });
    }

    // The regex restricts bounds to ASCII, so byte slicing is safe here
    let (start_base, start_suffix) = start.split_at(start.len() - 1);
    let (end_base, end_suffix) = end.split_at(end.len() - 1);
    let start_char = start_suffix.chars().next().unwrap_or_default();
    let end_char = end_suffix.chars().next().unwrap_or_default();

    if start_base != end_base || !start_char.is_ascii_alphabetic() || !end_char.is_ascii_alphabetic() {
        return Err(RangeError::SuffixMismatch {
            start: start.to_string(),
            end: end.to_string(),
        });
    }

    let start_char = start_char.to_ascii_lowercase();
    let end_char = end_char.to_ascii_lowercase();
    if start_char > end_char {
        return Err(RangeError::InvertedSuffix {
            start: start_char,
            end: end_char,
        });
    }

    Ok((start_char..=end_char)
        .map(|c| format!("{}{}{}", prefix, start_base, c))
        .collect())
}

fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_range_is_zero_padded() {
        let hosts = parse_hostname_range("nj01pamr[101-106]").unwrap();
        assert_eq!(hosts.len(), 6);
        assert_eq!(hosts[0], "nj01pamr101");
        assert_eq!(hosts[5], "nj01pamr106");

        let hosts = parse_hostname_range("leaf[1-3]").unwrap();
        assert_eq!(hosts, vec!["leaf001", "leaf002", "leaf003"]);
    }

    #[test]
    fn test_numeric_range_length_and_order() {
        for (a, b) in [(0u64, 0u64), (1, 9), (7, 42), (98, 130)] {
            let hosts = parse_hostname_range(&format!("sp[{}-{}]", a, b)).unwrap();
            assert_eq!(hosts.len() as u64, b - a + 1);
            for (offset, host) in hosts.iter().enumerate() {
                assert_eq!(host, &format!("sp{:03}", a + offset as u64));
            }
            assert!(hosts.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_single_element_range() {
        assert_eq!(parse_hostname_range("s[5-5]").unwrap(), vec!["s005"]);
    }

    #[test]
    fn test_alphanumeric_range() {
        assert_eq!(
            parse_hostname_range("nj01pamr[101a-101c]").unwrap(),
            vec!["nj01pamr101a", "nj01pamr101b", "nj01pamr101c"]
        );
        assert_eq!(parse_hostname_range("r[1A-1B]").unwrap(), vec!["r1a", "r1b"]);
    }

    #[test]
    fn test_invalid_formats() {
        assert!(matches!(
            parse_hostname_range("leaf101"),
            Err(RangeError::HostnameFormat(_))
        ));
        assert!(matches!(
            parse_hostname_range("[1-2]"),
            Err(RangeError::HostnameFormat(_))
        ));
        assert!(matches!(
            parse_hostname_range("leaf[1_2]"),
            Err(RangeError::HostnameFormat(_))
        ));
    }

    #[test]
    fn test_inverted_ranges() {
        assert_eq!(
            parse_hostname_range("leaf[5-2]"),
            Err(RangeError::InvertedRange { start: 5, end: 2 })
        );
        assert_eq!(
            parse_hostname_range("leaf[101c-101a]"),
            Err(RangeError::InvertedSuffix { start: 'c', end: 'a' })
        );
    }

    #[test]
    fn test_mismatched_alphanumeric_bounds() {
        assert!(matches!(
            parse_hostname_range("leaf[101a-1010c]"),
            Err(RangeError::LengthMismatch { .. })
        ));
        assert!(matches!(
            parse_hostname_range("leaf[101a-102c]"),
            Err(RangeError::SuffixMismatch { .. })
        ));
        assert!(matches!(
            parse_hostname_range("leaf[10a1-10c1]"),
            Err(RangeError::SuffixMismatch { .. })
        ));
    }
}
