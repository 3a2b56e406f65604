use serde::{Deserialize, Serialize};

use common::error::BrokerageError;
use common::models::{CryptoHolding, EquityHolding};

fn amount(raw: &str, what: &str) -> Result<f64, BrokerageError> {
    raw.parse::<f64>()
        .map_err(|e| BrokerageError::Decode(format!("{} {:?}: {}", what, raw, e)))
}

#[derive(Debug, Serialize)]
pub struct TokenRequest<'a> {
    pub client_id: &'a str,
    pub expires_in: u32,
    pub grant_type: &'a str,
    pub scope: &'a str,
    pub username: &'a str,
    pub password: &'a str,
    pub device_token: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub detail: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RevokeRequest<'a> {
    pub client_id: &'a str,
    pub token: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct AccountPayload {
    pub cash: Option<String>,
    pub portfolio_cash: Option<String>,
}

impl AccountPayload {
    pub fn cash(&self) -> Result<f64, BrokerageError> {
        let raw = self
            .cash
            .as_deref()
            .or(self.portfolio_cash.as_deref())
            .ok_or_else(|| BrokerageError::Decode("account has no cash field".to_string()))?;
        amount(raw, "cash")
    }
}

#[derive(Debug, Deserialize)]
pub struct PositionPayload {
    pub symbol: Option<String>,
    pub instrument_id: Option<String>,
    pub quantity: String,
    pub average_buy_price: Option<String>,
}

impl PositionPayload {
    pub fn to_holding(&self) -> Result<EquityHolding, BrokerageError> {
        let symbol = self
            .symbol
            .clone()
            .or_else(|| self.instrument_id.clone())
            .ok_or_else(|| BrokerageError::Decode("position without symbol".to_string()))?;

        Ok(EquityHolding {
            symbol,
            quantity: amount(&self.quantity, "quantity")?,
            average_buy_price: self
                .average_buy_price
                .as_deref()
                .and_then(|p| p.parse::<f64>().ok()),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CurrencyPayload {
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct CostBasisPayload {
    pub direct_cost_basis: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CryptoPositionPayload {
    pub currency: CurrencyPayload,
    pub quantity: String,
    #[serde(default)]
    pub cost_bases: Vec<CostBasisPayload>,
}

impl CryptoPositionPayload {
    /// `None` for closed positions that the endpoint still lists with zero quantity.
    pub fn to_holding(&self) -> Result<Option<CryptoHolding>, BrokerageError> {
        let quantity = amount(&self.quantity, "crypto quantity")?;
        if quantity <= 0.0 {
            return Ok(None);
        }

        Ok(Some(CryptoHolding {
            currency: self.currency.code.clone(),
            quantity,
            cost_basis: self
                .cost_bases
                .first()
                .and_then(|c| c.direct_cost_basis.as_deref())
                .and_then(|c| c.parse::<f64>().ok()),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_crypto_zero_quantity_is_dropped() {
        let page: Page<CryptoPositionPayload> = serde_json::from_value(json!({
            "results": [
                {"currency": {"code": "BTC"}, "quantity": "0.0100", "cost_bases": [{"direct_cost_basis": "400.00"}]},
                {"currency": {"code": "DOGE"}, "quantity": "0.0000", "cost_bases": []}
            ]
        }))
        .unwrap();

        let holdings: Vec<CryptoHolding> = page
            .results
            .iter()
            .filter_map(|p| p.to_holding().transpose())
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].currency, "BTC");
        assert_eq!(holdings[0].cost_basis, Some(400.0));
    }

    #[test]
    fn test_position_falls_back_to_instrument_id() {
        let position: PositionPayload = serde_json::from_value(json!({
            "instrument_id": "450dfc6d", "quantity": "3.00000000", "average_buy_price": "120.5"
        }))
        .unwrap();
        let holding = position.to_holding().unwrap();
        assert_eq!(holding.symbol, "450dfc6d");
        assert_eq!(holding.quantity, 3.0);
        assert_eq!(holding.average_buy_price, Some(120.5));
    }

    #[test]
    fn test_account_cash() {
        let account: AccountPayload =
            serde_json::from_value(json!({"cash": "10000.00", "portfolio_cash": "9000"})).unwrap();
        assert_eq!(account.cash().unwrap(), 10_000.0);
    }
}
