use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use uuid::Uuid;

use common::error::BrokerageError;
use common::models::{CryptoHolding, EquityHolding, PortfolioState};

use crate::remote::robinhood_response::{
    AccountPayload, CryptoPositionPayload, Page, PositionPayload, RevokeRequest, TokenRequest,
    TokenResponse,
};
use crate::remote::{USER_AGENT, get_robinhood_base_url, get_robinhood_crypto_url};
use crate::traits::Brokerage;

// Public client id used by the Robinhood web app.
const CLIENT_ID: &str = "c82SH0WZOsabOXGP2sxqcj34FxkvfnWRZBKlBjFS";

pub struct RobinhoodClient {
    client: Client,
    base_url: String,
    crypto_url: String,
    email: String,
    password: String,
    device_token: String,
    token: RwLock<Option<String>>,
}

impl RobinhoodClient {
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, BrokerageError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| BrokerageError::Request(e.to_string()))?;

        Ok(Self {
            client,
            base_url: get_robinhood_base_url(),
            crypto_url: get_robinhood_crypto_url(),
            email: email.into(),
            password: password.into(),
            device_token: Uuid::new_v4().to_string(),
            token: RwLock::new(None),
        })
    }

    async fn access_token(&self) -> Result<String, BrokerageError> {
        self.token
            .read()
            .await
            .clone()
            .ok_or(BrokerageError::NotAuthenticated)
    }

    async fn send<T>(&self, request: RequestBuilder) -> Result<T, BrokerageError>
    where
        T: DeserializeOwned,
    {
        let response = request
            .send()
            .await
            .map_err(|e| BrokerageError::Request(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 401 {
            return Err(BrokerageError::NotAuthenticated);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BrokerageError::Request(format!("HTTP {}: {}", status, body)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| BrokerageError::Decode(e.to_string()))
    }

    async fn get_page<T>(&self, url: &str, token: &str) -> Result<Vec<T>, BrokerageError>
    where
        T: DeserializeOwned,
    {
        let page: Page<T> = self.send(self.client.get(url).bearer_auth(token)).await?;
        Ok(page.results)
    }
}

#[async_trait]
impl Brokerage for RobinhoodClient {
    async fn login(&self) -> Result<(), BrokerageError> {
        info!("Attempting to log into Robinhood...");
        warn!("MANUAL ACTION REQUIRED: Please approve the login request on your Robinhood app.");

        let url = format!("{}/oauth2/token/", self.base_url);
        let body = TokenRequest {
            client_id: CLIENT_ID,
            expires_in: 86_400,
            grant_type: "password",
            scope: "internal",
            username: &self.email,
            password: &self.password,
            device_token: &self.device_token,
        };

        let response: TokenResponse = match self.send(self.client.post(&url).json(&body)).await {
            Ok(r) => r,
            Err(e) => {
                error!("Failed to log in to Robinhood: {}", e);
                return Err(BrokerageError::Login(e.to_string()));
            }
        };

        let Some(access_token) = response.access_token else {
            let detail = response
                .detail
                .unwrap_or_else(|| "no access token in response".to_string());
            error!("Failed to log in to Robinhood: {}", detail);
            return Err(BrokerageError::Login(detail));
        };

        *self.token.write().await = Some(access_token);
        info!("Successfully logged in to Robinhood.");
        Ok(())
    }

    async fn logout(&self) -> Result<(), BrokerageError> {
        let token = self.access_token().await.inspect_err(|_| {
            error!("User is not logged in.");
        })?;

        let url = format!("{}/oauth2/revoke_token/", self.base_url);
        let body = RevokeRequest {
            client_id: CLIENT_ID,
            token: &token,
        };
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| BrokerageError::Request(e.to_string()))?;

        if !response.status().is_success() {
            error!("Failed to log out of Robinhood: HTTP {}", response.status());
            return Err(BrokerageError::Request(format!(
                "revoke token answered HTTP {}",
                response.status()
            )));
        }

        *self.token.write().await = None;
        info!("Successfully logged out of Robinhood.");
        Ok(())
    }

    async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }

    async fn get_portfolio_state(&self) -> Result<PortfolioState, BrokerageError> {
        let token = self.access_token().await.inspect_err(|_| {
            error!("User is not logged in.");
        })?;

        let accounts: Vec<AccountPayload> = self
            .get_page(&format!("{}/accounts/", self.base_url), &token)
            .await?;
        let cash = accounts
            .first()
            .ok_or_else(|| BrokerageError::Decode("no brokerage account".to_string()))?
            .cash()?;

        let positions: Vec<PositionPayload> = self
            .get_page(&format!("{}/positions/?nonzero=true", self.base_url), &token)
            .await?;
        let equity_holdings = positions
            .iter()
            .map(PositionPayload::to_holding)
            .collect::<Result<Vec<EquityHolding>, _>>()?;

        let crypto: Vec<CryptoPositionPayload> = self
            .get_page(&format!("{}/holdings/", self.crypto_url), &token)
            .await?;
        let crypto_holdings = crypto
            .iter()
            .filter_map(|p| p.to_holding().transpose())
            .collect::<Result<Vec<CryptoHolding>, _>>()?;

        info!(
            "User Portfolio: cash={:.2}, {} equity positions, {} crypto positions",
            cash,
            equity_holdings.len(),
            crypto_holdings.len()
        );

        Ok(PortfolioState {
            cash,
            equity_holdings,
            crypto_holdings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> RobinhoodClient {
        RobinhoodClient::new("me@example.com", "hunter2", Duration::from_secs(1)).unwrap()
    }

    #[tokio::test]
    async fn test_portfolio_requires_login() {
        let rh = client();
        assert!(!rh.is_authenticated().await);
        assert!(matches!(
            rh.get_portfolio_state().await,
            Err(BrokerageError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_logout_requires_login() {
        let rh = client();
        assert!(matches!(rh.logout().await, Err(BrokerageError::NotAuthenticated)));
    }
}
