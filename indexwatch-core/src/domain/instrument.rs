use serde::{Deserialize, Serialize};
use std::fmt;

/// A tracked index: exchange symbol plus the name shown on the dashboard.
///
/// The instrument set is read once from configuration and never mutated, so
/// instruments are plain values that can key maps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol: String,
    pub name: String,
}

impl Instrument {
    pub fn new(symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self { symbol: symbol.into(), name: name.into() }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.symbol)
    }
}

/// The built-in instrument list: the three Indian benchmark indices.
pub fn default_instruments() -> Vec<Instrument> {
    vec![
        Instrument::new("^NSEI", "Nifty 50 (India)"),
        Instrument::new("^NSEBANK", "BankNifty (India)"),
        Instrument::new("^BSESN", "Sensex (India)"),
    ]
}
