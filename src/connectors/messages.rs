// src/connectors/messages.rs
use rust_decimal::Decimal;
use serde::Deserialize;

/// Kline close price position: [openTime, open, high, low, close, volume, ...]
pub const KLINE_CLOSE_INDEX: usize = 4;

/// One entry of `GET /fapi/v2/positionRisk`. Binance sends numbers as strings.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionRisk {
    pub symbol: String,
    pub position_amt: Decimal,
    pub entry_price: Decimal,
    #[serde(rename = "unRealizedProfit")]
    pub unrealized_profit: Decimal,
}

/// Answer of `POST /fapi/v1/order`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAck {
    pub order_id: u64,
    pub symbol: String,
    pub status: String,
}

/// Answer of `POST /fapi/v1/leverage`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeverageAck {
    pub leverage: u32,
    pub symbol: String,
}

/// Error body: `{"code": -2015, "msg": "Invalid API-key, IP, or permissions for action."}`
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub code: i64,
    pub msg: String,
}

impl ApiErrorBody {
    /// Codes the exchange uses for rejected keys and signatures.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.code, -1022 | -2014 | -2015)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_position_risk_parses_string_numbers() {
        let raw = r#"[{"symbol":"BNBUSDT","positionAmt":"0.050","entryPrice":"600.10",
            "markPrice":"601.0","unRealizedProfit":"0.045","leverage":"5"}]"#;
        let entries: Vec<PositionRisk> = serde_json::from_str(raw).unwrap();

        assert_eq!(entries[0].symbol, "BNBUSDT");
        assert_eq!(entries[0].position_amt, Decimal::from_str("0.05").unwrap());
        assert_eq!(entries[0].entry_price, Decimal::from_str("600.1").unwrap());
        assert_eq!(
            entries[0].unrealized_profit,
            Decimal::from_str("0.045").unwrap()
        );
    }

    #[test]
    fn test_auth_codes() {
        let body: ApiErrorBody =
            serde_json::from_str(r#"{"code":-2015,"msg":"Invalid API-key"}"#).unwrap();
        assert!(body.is_auth_failure());

        let body: ApiErrorBody =
            serde_json::from_str(r#"{"code":-2019,"msg":"Margin is insufficient."}"#).unwrap();
        assert!(!body.is_auth_failure());
    }
}
