use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    /// Only the exact literals `BUY` and `SELL` are directional.
    pub fn from_label(label: &str) -> Self {
        match label {
            "BUY" => Self::Buy,
            "SELL" => Self::Sell,
            _ => Self::Hold,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::Hold => "HOLD",
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifier verdict for one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSignal {
    pub signal: Signal,
    pub reasoning: String,
    pub confidence: Option<String>, // "High" / "Medium" / "Low"
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateOutcome {
    Approved,
    Vetoed,
    Unassessed,
}

impl GateOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "APPROVED",
            Self::Vetoed => "VETOED",
            Self::Unassessed => "UNASSESSED",
        }
    }
}

impl std::fmt::Display for GateOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk gate verdict. `outcome` is never `Unassessed` here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub outcome: GateOutcome,
    pub reasoning: String,
    pub position_size: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_label_defaults_to_hold() {
        assert_eq!(Signal::from_label("BUY"), Signal::Buy);
        assert_eq!(Signal::from_label("SELL"), Signal::Sell);
        assert_eq!(Signal::from_label("HOLD"), Signal::Hold);
        assert_eq!(Signal::from_label("buy"), Signal::Hold);
        assert_eq!(Signal::from_label("STRONG BUY"), Signal::Hold);
        assert_eq!(Signal::from_label(""), Signal::Hold);
    }
}
