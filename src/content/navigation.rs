//! "Next page" / "previous page" by bumping the last number in a URL.

use std::sync::LazyLock;

use regex::Regex;

pub const NEXT_PAGE: i64 = 1;
pub const PREV_PAGE: i64 = -1;

static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("static pattern"));

/// `url` with its last run of digits shifted by `offset`.
///
/// `None` when the URL has no digits, the number overflows, or the result
/// would go below zero.
pub fn offset_last_number(url: &str, offset: i64) -> Option<String> {
    let last = DIGITS.find_iter(url).last()?;
    let current: i64 = last.as_str().parse().ok()?;
    let next = current.checked_add(offset).filter(|n| *n >= 0)?;

    Some(format!("{}{next}{}", &url[..last.start()], &url[last.end()..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increments_the_last_number_only() {
        assert_eq!(
            offset_last_number("https://x.test/2024/page/3?q=a", NEXT_PAGE).as_deref(),
            Some("https://x.test/2024/page/4?q=a")
        );
    }

    #[test]
    fn digit_count_may_change() {
        assert_eq!(
            offset_last_number("https://x.test/page/10/", PREV_PAGE).as_deref(),
            Some("https://x.test/page/9/")
        );
        assert_eq!(
            offset_last_number("https://x.test/page/99", NEXT_PAGE).as_deref(),
            Some("https://x.test/page/100")
        );
    }

    #[test]
    fn no_digits_or_negative_result_means_no_navigation() {
        assert_eq!(offset_last_number("https://x.test/about", NEXT_PAGE), None);
        assert_eq!(offset_last_number("https://x.test/page/0", PREV_PAGE), None);
    }
}
