use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityHolding {
    pub symbol: String,
    pub quantity: f64,
    pub average_buy_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CryptoHolding {
    pub currency: String,
    pub quantity: f64,
    pub cost_basis: Option<f64>,
}

/// Account view handed to the risk gate. Rendered into the request as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioState {
    pub cash: f64,
    pub equity_holdings: Vec<EquityHolding>,
    pub crypto_holdings: Vec<CryptoHolding>,
}
