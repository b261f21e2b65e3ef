use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction assigned to a bar by a level classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Buy,
    Sell,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Signal::Buy).unwrap(), "\"buy\"");
        assert_eq!(serde_json::to_string(&Signal::Sell).unwrap(), "\"sell\"");
    }

    #[test]
    fn opposite_flips() {
        assert_eq!(Signal::Buy.opposite(), Signal::Sell);
        assert_eq!(Signal::Sell.opposite(), Signal::Buy);
    }
}
