// src/connectors/binance.rs
use crate::config::{Credentials, ExchangeConfig};
use crate::connectors::messages::{
    ApiErrorBody, LeverageAck, OrderAck, PositionRisk, KLINE_CLOSE_INDEX,
};
use crate::connectors::signer::RequestSigner;
use crate::connectors::traits::ExchangeClient;
use crate::error::{BotError, Result};
use crate::types::{CandleSeries, OrderResponse, Position, Side};
use async_trait::async_trait;
use reqwest::{Client, Method, Response, StatusCode};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// How a non-2xx answer is classified.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Endpoint {
    Public,
    Account,
    Trading,
}

/// USDⓈ-M futures REST client.
pub struct BinanceFuturesClient {
    http_client: Client,
    base_url: Url,
    recv_window_ms: u64,
}

impl BinanceFuturesClient {
    pub fn new(config: &ExchangeConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| BotError::Configuration(format!("invalid base_url: {}", e)))?;
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| BotError::Configuration(format!("http client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
            recv_window_ms: config.recv_window_ms,
        })
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<Url> {
        self.base_url
            .join(endpoint)
            .map_err(|e| BotError::Configuration(format!("invalid endpoint {}: {}", endpoint, e)))
    }

    async fn send_signed_request<T: DeserializeOwned>(
        &self,
        creds: &Credentials,
        method: Method,
        endpoint: &str,
        params: Vec<(&str, String)>,
    ) -> Result<T> {
        if !creds.is_complete() {
            return Err(BotError::Auth("API key and secret must both be set".into()));
        }

        let signer = RequestSigner::new(creds, self.recv_window_ms);
        let mut url = self.endpoint_url(endpoint)?;
        url.set_query(Some(&signer.signed_query(&params)?));

        let kind = if method == Method::POST {
            Endpoint::Trading
        } else {
            Endpoint::Account
        };

        debug!("{} {}", method, endpoint);
        let response = self
            .http_client
            .request(method, url)
            .header("X-MBX-APIKEY", creds.api_key())
            .send()
            .await?;

        let response = check_status(response, kind).await?;
        decode(response).await
    }
}

async fn check_status(response: Response, kind: Endpoint) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let api_error = serde_json::from_str::<ApiErrorBody>(&body).ok();
    let detail = match &api_error {
        Some(err) => format!("HTTP {} (code {}): {}", status.as_u16(), err.code, err.msg),
        None => format!("HTTP {}: {}", status.as_u16(), body),
    };

    if kind == Endpoint::Public {
        return Err(BotError::Network(detail));
    }

    let auth_rejected = status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
        || api_error.as_ref().is_some_and(ApiErrorBody::is_auth_failure);
    if auth_rejected {
        return Err(BotError::Auth(detail));
    }

    if kind == Endpoint::Trading && status.is_client_error() {
        return Err(BotError::OrderRejected(detail));
    }
    Err(BotError::Network(detail))
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes)
        .map_err(|e| BotError::Network(format!("malformed response: {}", e)))
}

fn parse_closes(rows: &[Vec<serde_json::Value>]) -> Result<Vec<Decimal>> {
    rows.iter()
        .map(|row| {
            let raw = row
                .get(KLINE_CLOSE_INDEX)
                .and_then(|v| v.as_str())
                .ok_or_else(|| BotError::Network("kline without close price".into()))?;
            Decimal::from_str(raw)
                .map_err(|e| BotError::Network(format!("bad close price {:?}: {}", raw, e)))
        })
        .collect()
}

#[async_trait]
impl ExchangeClient for BinanceFuturesClient {
    async fn fetch_candles(
        &self,
        symbol: &str,
        interval: &str,
        limit: u16,
    ) -> Result<CandleSeries> {
        let url = self.endpoint_url("/fapi/v1/klines")?;
        let response = self
            .http_client
            .get(url)
            .query(&[
                ("symbol", symbol.to_string()),
                ("interval", interval.to_string()),
                ("limit", limit.to_string()),
            ])
            .send()
            .await?;

        let response = check_status(response, Endpoint::Public).await?;
        let rows: Vec<Vec<serde_json::Value>> = decode(response).await?;
        let closes = parse_closes(&rows)?;

        debug!("Fetched {} candles for {}", closes.len(), symbol);
        Ok(CandleSeries::new(closes))
    }

    async fn fetch_position(&self, creds: &Credentials, symbol: &str) -> Result<Position> {
        let entries: Vec<PositionRisk> = self
            .send_signed_request(
                creds,
                Method::GET,
                "/fapi/v2/positionRisk",
                vec![("symbol", symbol.to_string())],
            )
            .await?;

        Ok(entries
            .into_iter()
            .find(|p| p.symbol == symbol)
            .map(|p| Position {
                quantity: p.position_amt,
                entry_price: p.entry_price,
                unrealized_pnl: p.unrealized_profit,
            })
            .unwrap_or_default())
    }

    async fn set_leverage(&self, creds: &Credentials, symbol: &str, leverage: u8) -> Result<()> {
        let ack: LeverageAck = self
            .send_signed_request(
                creds,
                Method::POST,
                "/fapi/v1/leverage",
                vec![
                    ("symbol", symbol.to_string()),
                    ("leverage", leverage.to_string()),
                ],
            )
            .await?;

        debug!("Leverage for {} set to {}x", ack.symbol, ack.leverage);
        Ok(())
    }

    async fn submit_market_order(
        &self,
        creds: &Credentials,
        symbol: &str,
        side: Side,
        quantity: Decimal,
    ) -> Result<OrderResponse> {
        let params = vec![
            ("symbol", symbol.to_string()),
            ("side", side.as_str().to_string()),
            ("type", "MARKET".to_string()),
            ("quantity", quantity.normalize().to_string()),
        ];

        info!("🚀 Sending MARKET order: {} {} {}", side.as_str(), quantity, symbol);

        let ack: OrderAck = self
            .send_signed_request(creds, Method::POST, "/fapi/v1/order", params)
            .await?;

        Ok(OrderResponse {
            id: ack.order_id.to_string(),
            symbol: ack.symbol,
            status: ack.status,
        })
    }
}
