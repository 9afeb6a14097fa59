use crate::domain::errors::ParseFailure;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separates `exchange`, `base`, `quote` and `timeframe` in a table name.
pub const SEGMENT_SEPARATOR: char = '_';

/// Marks a derivative contract, e.g. `bybit_sol_usdt:usdt_1m`.
pub const INSTRUMENT_SEPARATOR: char = ':';

/// Instrument class of a stored market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentType {
    Spot,
    Derivative,
}

impl InstrumentType {
    /// Classification is purely the presence of the instrument separator.
    pub fn of(identifier: &str) -> Self {
        if identifier.contains(INSTRUMENT_SEPARATOR) {
            InstrumentType::Derivative
        } else {
            InstrumentType::Spot
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InstrumentType::Spot => "spot",
            InstrumentType::Derivative => "derivative",
        }
    }
}

impl fmt::Display for InstrumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured metadata recovered from a table identifier such as
/// `binance_btc_usdt_1m` or `binance_sui_usdt:usdt_1d`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MarketKey {
    pub exchange: String,
    pub base: String,
    pub quote: String,
    /// Settlement asset of a derivative contract (the segment after `:`).
    pub settle: Option<String>,
    pub instrument_type: InstrumentType,
    pub timeframe: String,
    /// Everything between exchange and timeframe, e.g. `sui_usdt:usdt`.
    pub market: String,
}

impl MarketKey {
    /// Parses `exchange_base_quote[:settle]_timeframe`.
    ///
    /// The instrument separator is folded into the segment separator before
    /// splitting, so a derivative decomposes like its spot counterpart.
    pub fn parse(identifier: &str) -> Result<Self, ParseFailure> {
        let instrument_type = InstrumentType::of(identifier);
        let normalized = identifier.replace(INSTRUMENT_SEPARATOR, "_");
        let parts: Vec<&str> = normalized.split(SEGMENT_SEPARATOR).collect();

        if parts.len() < 4 {
            return Err(ParseFailure::TooFewSegments {
                identifier: identifier.to_string(),
                segments: parts.len(),
            });
        }

        let exchange = parts[0];
        let timeframe = parts[parts.len() - 1];
        for (segment, value) in [
            ("exchange", exchange),
            ("base", parts[1]),
            ("quote", parts[2]),
            ("timeframe", timeframe),
        ] {
            if value.is_empty() {
                return Err(ParseFailure::EmptySegment {
                    identifier: identifier.to_string(),
                    segment,
                });
            }
        }

        let settle = match instrument_type {
            InstrumentType::Derivative if parts.len() >= 5 => Some(parts[3].to_lowercase()),
            _ => None,
        };

        // Both separators are single bytes, so offsets in `normalized` are valid in `identifier`.
        let market = identifier[exchange.len() + 1..identifier.len() - timeframe.len() - 1].to_string();

        Ok(Self {
            exchange: exchange.to_string(),
            base: parts[1].to_lowercase(),
            quote: parts[2].to_lowercase(),
            settle,
            instrument_type,
            timeframe: timeframe.to_string(),
            market,
        })
    }

    pub fn is_derivative(&self) -> bool {
        self.instrument_type == InstrumentType::Derivative
    }

    /// `(base, quote)` pair used to match a derivative against a spot index.
    pub fn pair(&self) -> (String, String) {
        (self.base.clone(), self.quote.clone())
    }
}
