//! Flexible numeric range parsing (`[1,3,5-10]`).

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use super::RangeError;

static SUB_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)-(\d+)$").expect("Invalid sub-range regex"));

/// Parse a bracketed list of numbers and `start-end` sub-ranges.
///
/// The result is sorted ascending with duplicates removed. An empty
/// bracket pair yields an empty list; callers decide whether that is
/// acceptable for the field they are parsing.
///
/// # Examples
/// ```
/// use fabricplan::range::parse_flexible_range;
///
/// assert_eq!(parse_flexible_range("[1,3,5-10]").unwrap(), vec![1, 3, 5, 6, 7, 8, 9, 10]);
/// assert!(parse_flexible_range("1,3").is_err());
/// ```
pub fn parse_flexible_range(input: &str) -> Result<Vec<u32>, RangeError> {
    let trimmed = input.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| RangeError::Brackets(trimmed.to_string()))?;

    let mut result = BTreeSet::new();
    for item in inner.split(',').map(str::trim).filter(|item| !item.is_empty()) {
        if item.contains('-') {
            let caps = SUB_RANGE
                .captures(item)
                .ok_or_else(|| RangeError::Item(item.to_string()))?;
            let start: u32 = caps[1].parse().map_err(|_| RangeError::Item(item.to_string()))?;
            let end: u32 = caps[2].parse().map_err(|_| RangeError::Item(item.to_string()))?;
            if start < 1 || end < 1 {
                return Err(RangeError::NonPositive(item.to_string()));
            }
            if start > end {
                return Err(RangeError::InvertedRange {
                    start: start as u64,
                    end: end as u64,
                });
            }
            result.extend(start..=end);
        } else {
            let num: i64 = item.parse().map_err(|_| RangeError::Item(item.to_string()))?;
            if num < 1 {
                return Err(RangeError::NonPositive(item.to_string()));
            }
            let num = u32::try_from(num).map_err(|_| RangeError::Item(item.to_string()))?;
            result.insert(num);
        }
    }

    Ok(result.into_iter().collect())
}

/// Serialize numbers back into bracket form, collapsing consecutive runs.
///
/// The input need not be sorted; the output always is.
pub fn format_flexible_range(values: &[u32]) -> String {
    let sorted: BTreeSet<u32> = values.iter().copied().collect();
    let mut parts = Vec::new();
    let mut iter = sorted.into_iter().peekable();

    while let Some(start) = iter.next() {
        let mut end = start;
        while let Some(&next) = iter.peek() {
            if next != end + 1 {
                break;
            }
            end = next;
            iter.next();
        }
        if start == end {
            parts.push(start.to_string());
        } else {
            parts.push(format!("{}-{}", start, end));
        }
    }

    format!("[{}]", parts.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_items() {
        assert_eq!(
            parse_flexible_range("[1,3,5-10]").unwrap(),
            vec![1, 3, 5, 6, 7, 8, 9, 10]
        );
    }

    #[test]
    fn test_duplicates_and_order() {
        assert_eq!(parse_flexible_range("[9, 2-4, 3, 1]").unwrap(), vec![1, 2, 3, 4, 9]);
        assert_eq!(parse_flexible_range(" [ 47 , 48 ] ").unwrap(), vec![47, 48]);
    }

    #[test]
    fn test_empty_brackets() {
        assert!(parse_flexible_range("[]").unwrap().is_empty());
        assert!(parse_flexible_range("[ , ]").unwrap().is_empty());
    }

    #[test]
    fn test_errors_name_offending_token() {
        assert_eq!(
            parse_flexible_range("1,2"),
            Err(RangeError::Brackets("1,2".to_string()))
        );
        assert_eq!(
            parse_flexible_range("[1,x]"),
            Err(RangeError::Item("x".to_string()))
        );
        assert_eq!(
            parse_flexible_range("[0,2]"),
            Err(RangeError::NonPositive("0".to_string()))
        );
        assert_eq!(
            parse_flexible_range("[0-2]"),
            Err(RangeError::NonPositive("0-2".to_string()))
        );
        assert_eq!(
            parse_flexible_range("[8-3]"),
            Err(RangeError::InvertedRange { start: 8, end: 3 })
        );
        assert_eq!(
            parse_flexible_range("[1-2-3]"),
            Err(RangeError::Item("1-2-3".to_string()))
        );
        assert_eq!(
            parse_flexible_range("[-4]"),
            Err(RangeError::Item("-4".to_string()))
        );
    }

    #[test]
    fn test_format_collapses_runs() {
        assert_eq!(format_flexible_range(&[1, 3, 5, 6, 7, 8, 9, 10]), "[1,3,5-10]");
        assert_eq!(format_flexible_range(&[]), "[]");
        assert_eq!(format_flexible_range(&[4, 2, 3]), "[2-4]");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        for expr in ["[1,3,5-10]", "[10-12,1,1,2]", "[7]", "[3-3,4,6-9,8]"] {
            let parsed = parse_flexible_range(expr).unwrap();
            let reparsed = parse_flexible_range(&format_flexible_range(&parsed)).unwrap();
            assert_eq!(parsed, reparsed, "normalizing {} changed the set", expr);
        }
    }
}
