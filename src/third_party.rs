// Price and token lookups through the wallet server's proxy for CoinMarketCap,
// CoinGecko and Jupiter. No session involved; responses still come back with
// camelCase keys. Prices are best effort: any failure reads as 0.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::{build_http, read_response};
use crate::error::ApiError;
use crate::storage::Currency;

/// CoinMarketCap id of USDT, the dollar proxy fiat rates are read from.
const CMC_USDT_ID: &str = "825";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub chain: String,
    pub decimals: u32,
    pub id: String,
    pub logo: String,
    pub name: String,
    pub ticker: String,
}

#[derive(Debug, Deserialize)]
struct JupiterToken {
    id: String,
    name: String,
    symbol: String,
    #[serde(default)]
    icon: Option<String>,
    decimals: u32,
}

#[derive(Clone)]
pub struct ThirdPartyClient {
    http: Client,
    base_url: String,
}

impl ThirdPartyClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        Ok(ThirdPartyClient {
            http: build_http(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path_and_query: &str) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path_and_query);
        tracing::debug!(%url, "third-party request");
        let resp = self.http.get(&url).send().await?;
        let body = read_response(resp).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Value of one USD in `currency`, via the USDT quote. 0 when unknown.
    pub async fn base_value(&self, currency: Currency) -> f64 {
        if currency == Currency::Usd {
            return 1.0;
        }
        let path = format!(
            "/cmc/v2/cryptocurrency/quotes/latest?id={CMC_USDT_ID}&skip_invalid=true&aux=is_active&convert={}",
            currency.code()
        );
        match self.get::<Value>(&path).await {
            Ok(body) => quote_price(&body, currency).unwrap_or(0.0),
            Err(err) => {
                tracing::warn!("base value lookup failed: {err}");
                0.0
            }
        }
    }

    /// USD price of a coin (`contract` unset) or token on a CoinGecko platform.
    pub async fn price(&self, platform: &str, contract: Option<&str>) -> f64 {
        let path = match contract.filter(|c| !c.is_empty()) {
            Some(contract) => format!(
                "/coingeicko/api/v3/simple/token_price/{platform}?contract_addresses={contract}&vs_currencies=usd"
            ),
            None => format!("/coingeicko/api/v3/simple/price?ids={platform}&vs_currencies=usd"),
        };
        match self.get::<Value>(&path).await {
            Ok(body) => first_usd_price(&body).unwrap_or(0.0),
            Err(err) => {
                tracing::warn!("price lookup failed: {err}");
                0.0
            }
        }
    }

    /// First Jupiter search hit for `query` (a mint address or symbol).
    pub async fn jupiter_token(&self, query: &str) -> Result<Token, ApiError> {
        let path = format!("/jup/tokens/v2/search?query={}", urlencoding::encode(query));
        let tokens: Vec<JupiterToken> = self.get(&path).await?;
        let token = tokens.into_iter().next().ok_or_else(|| ApiError::Server {
            status: 404,
            message: "Token not found".to_string(),
        })?;
        Ok(Token {
            chain: "Solana".to_string(),
            decimals: token.decimals,
            id: token.id,
            logo: token.icon.unwrap_or_default(),
            name: token.name,
            ticker: token.symbol,
        })
    }
}

// The quote map arrives either still wrapped in `data` or already unwrapped
// along with the `status` block.
fn quote_price(body: &Value, currency: Currency) -> Option<f64> {
    body.get("data")
        .unwrap_or(body)
        .get(CMC_USDT_ID)?
        .get("quote")?
        .get(currency.code().to_uppercase())?
        .get("price")?
        .as_f64()
}

fn first_usd_price(body: &Value) -> Option<f64> {
    body.as_object()?
        .values()
        .next()?
        .get("usd")?
        .as_f64()
        .filter(|p| *p != 0.0)
}
