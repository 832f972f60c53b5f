//! Asset classification from ticker symbols.
//!
//! Brokerage compatibility and routing bonuses depend on the asset class of
//! the traded symbol. Classification is heuristic: a fixed set of known
//! crypto and ETF tickers, with the `-USD` pair convention recognized for
//! known crypto bases only.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::shared::Symbol;

/// Tickers always treated as crypto, even without a pair suffix.
const CRYPTO_TICKERS: &[&str] = &[
    "BTC", "ETH", "SOL", "ADA", "DOGE", "XRP", "DOT", "AVAX", "LINK", "LTC",
];

/// Tickers always treated as ETFs.
const ETF_TICKERS: &[&str] = &[
    "SPY", "QQQ", "VOO", "VTI", "IWM", "DIA", "ARKK", "GLD", "XLF", "XLK",
];

/// The class of a tradeable asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    /// Cryptocurrency (e.g. BTC, ETH-USD).
    Crypto,
    /// Common stock.
    Stock,
    /// Exchange-traded fund.
    Etf,
}

impl AssetClass {
    /// Classify a symbol into an asset class.
    ///
    /// Crypto wins on a known ticker, bare or paired with `-USD`; ETFs on a
    /// known ticker; everything else is a stock, including `-USD` pairs with
    /// an unknown base.
    #[must_use]
    pub fn classify(symbol: &Symbol) -> Self {
        let ticker = symbol.as_str();

        if let Some(base) = ticker.strip_suffix("-USD") {
            if CRYPTO_TICKERS.contains(&base) {
                return Self::Crypto;
            }
        }
        if CRYPTO_TICKERS.contains(&ticker) {
            return Self::Crypto;
        }
        if ETF_TICKERS.contains(&ticker) {
            return Self::Etf;
        }
        Self::Stock
    }

    /// Returns true for equity-like assets (stocks and ETFs).
    #[must_use]
    pub const fn is_equity_like(&self) -> bool {
        matches!(self, Self::Stock | Self::Etf)
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Crypto => write!(f, "crypto"),
            Self::Stock => write!(f, "stock"),
            Self::Etf => write!(f, "etf"),
        }
    }
}
