use crate::domain::errors::EngineError;

/// Normalizes a user-supplied asset identifier into `BASE/QUOTE` form.
///
/// The symbol is upper-cased and the default quote currency appended when no
/// `/` is present (`"eth"` -> `"ETH/USDT"`).
pub fn normalize_symbol(symbol: &str, default_quote: &str) -> Result<String, EngineError> {
    let trimmed = symbol.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidInput(
            "asset symbol not specified".to_string(),
        ));
    }

    let upper = trimmed.to_uppercase();
    if upper.contains('/') {
        Ok(upper)
    } else {
        Ok(format!("{}/{}", upper, default_quote.to_uppercase()))
    }
}

/// Converts `BASE/QUOTE` into the exchange wire format (`BASEQUOTE`).
pub fn to_exchange_symbol(symbol: &str) -> String {
    symbol.replace('/', "")
}

/// Filesystem-safe key fragment for an asset (`BTC/USDT` -> `BTC_USDT`).
pub fn to_storage_key(symbol: &str) -> String {
    symbol.replace('/', "_")
}

/// Base currency of a `BASE/QUOTE` pair, used as a news search term.
pub fn base_currency(symbol: &str) -> &str {
    symbol.split('/').next().unwrap_or(symbol)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_appends_quote() {
        assert_eq!(normalize_symbol("eth", "USDT").unwrap(), "ETH/USDT");
        assert_eq!(normalize_symbol("btc/usdt", "USDT").unwrap(), "BTC/USDT");
    }

    #[test]
    fn test_normalize_rejects_empty() {
        assert!(normalize_symbol("  ", "USDT").is_err());
    }

    #[test]
    fn test_symbol_conversions() {
        assert_eq!(to_exchange_symbol("SOL/USDT"), "SOLUSDT");
        assert_eq!(to_storage_key("SOL/USDT"), "SOL_USDT");
        assert_eq!(base_currency("SOL/USDT"), "SOL");
        assert_eq!(base_currency("SOL"), "SOL");
    }
}
