/// Leveraged/inverse and common fund tickers that slip past the name-keyword check.
const SYMBOL_BLOCKLIST: &[&str] = &[
    "SQQQ", "TQQQ", "UVXY", "SVIX", "TSLQ", "LABD", "DRIP", "QID", "BKLN", "PGX", "EWH", "SPY",
    "QQQ", "IWM", "VTI", "VOO", "SPXL", "SPXS", "TLT", "GLD", "SLV",
];

const NAME_KEYWORDS: &[&str] = &[
    "ETF", "TRUST", "FUND", "SPDR", "WARRANT", "SPAC", "PFD",
];

const SECURITY_TYPE_BLOCKLIST: &[&str] = &[
    "ETF", "ETN", "FUND", "MUTUAL_FUND", "PREFERRED", "RIGHT", "WARRANT", "TRUST", "INDEX",
];

/// True if the symbol itself, its provider-supplied display name, or its provider-supplied
/// security type marks it as a fund/ETF/leveraged product rather than a common stock.
pub fn is_fund_like(symbol: &str, name: Option<&str>, security_type: Option<&str>) -> bool {
    let upper = symbol.to_uppercase();
    if SYMBOL_BLOCKLIST.contains(&upper.as_str()) {
        return true;
    }
    if let Some(t) = security_type {
        if SECURITY_TYPE_BLOCKLIST.contains(&t.to_uppercase().as_str()) {
            return true;
        }
    }
    if let Some(n) = name {
        let upper_name = n.to_uppercase();
        if NAME_KEYWORDS.iter().any(|kw| upper_name.contains(kw)) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocklisted_symbol_is_fund_like() {
        assert!(is_fund_like("TQQQ", None, None));
    }

    #[test]
    fn name_keyword_catches_unlisted_funds() {
        assert!(is_fund_like("XYZ", Some("XYZ Municipal Bond Trust"), None));
    }

    #[test]
    fn security_type_catches_provider_tagged_funds() {
        assert!(is_fund_like("ABC", None, Some("ETF")));
    }

    #[test]
    fn ordinary_stock_passes() {
        assert!(!is_fund_like("ACME", Some("Acme Corp"), Some("CS")));
    }
}
