//! 输入校验

use regex::Regex;
use std::sync::OnceLock;

fn symbol_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Z]{1,5}$").expect("symbol pattern is valid"))
}

/// 股票代码是否合法：1-5 个字母
pub fn is_valid_symbol(symbol: &str) -> bool {
    symbol_pattern().is_match(&symbol.to_uppercase())
}

/// 规范化股票代码
pub fn sanitize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

pub fn is_valid_query(query: &str) -> bool {
    !query.trim().is_empty()
}

pub fn sanitize_query(query: &str) -> String {
    query.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_validation() {
        assert!(is_valid_symbol("AAPL"));
        assert!(is_valid_symbol("v"));
        assert!(is_valid_symbol("googl"));
        assert!(!is_valid_symbol(""));
        assert!(!is_valid_symbol("TOOLONG"));
        assert!(!is_valid_symbol("BRK.B"));
        assert!(!is_valid_symbol("A1"));
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize_symbol("  msft "), "MSFT");
        assert_eq!(sanitize_query("  apple  "), "apple");
        assert!(!is_valid_query("   "));
        assert!(is_valid_query(" a "));
    }
}
