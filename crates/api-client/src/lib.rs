// In crates/api-client/src/lib.rs

use app_config::BrokerSettings;
use chrono::Utc;
use core_types::{Bar, Position, Side, Symbol, Timeframe};
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sha2::Sha256;
use std::time::Duration;

// Create a type alias for the HMAC-SHA256 implementation.
type HmacSha256 = Hmac<Sha256>;

pub mod error;
pub mod types;

// Re-export public types
pub use error::{Error, Result};
pub use types::*;

/// The exchange caps a single klines request at this many bars.
pub const MAX_KLINES_PER_REQUEST: usize = 1500;

impl ApiClient {
    /// Constructs a new ApiClient from BrokerSettings.
    pub fn new(settings: &BrokerSettings) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| Error::ClientBuildError(e.to_string()))?;

        Ok(ApiClient {
            http_client,
            api_key: settings.api_key.clone(),
            secret_key: settings.secret_key.clone(),
            base_url: settings.rest_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Generates an HMAC-SHA256 signature for a given query string.
    ///
    /// # Returns
    ///
    /// A hexadecimal string representation of the signature.
    fn sign(&self, query_string: &str) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(self.secret_key.as_bytes())
            .map_err(|e| Error::ClientBuildError(format!("invalid secret key: {}", e)))?;
        mac.update(query_string.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Appends the timestamp and the signature to `params`.
    fn create_signed_query(&self, params: &mut String) -> Result<()> {
        let timestamp = Utc::now().timestamp_millis();

        if !params.is_empty() {
            params.push('&');
        }
        params.push_str(&format!("timestamp={}", timestamp));

        let signature = self.sign(params)?;
        params.push_str(&format!("&signature={}", signature));
        Ok(())
    }

    /// Binance returns an error object on failure, so we check for that first.
    fn decode<T: DeserializeOwned>(text: &str) -> Result<T> {
        let value: Value = serde_json::from_str(text)?;
        if let Some(code) = value.get("code").and_then(Value::as_i64) {
            // Some endpoints answer `{"code": 200, "msg": "success"}`.
            if code != 200 && code != 0 {
                let msg = value
                    .get("msg")
                    .and_then(Value::as_str)
                    .unwrap_or("Unknown error")
                    .to_string();
                return Err(Error::ApiError { code, msg });
            }
        }
        Ok(serde_json::from_value(value)?)
    }

    async fn signed_get<T: DeserializeOwned>(&self, path: &str, mut params: String) -> Result<T> {
        self.create_signed_query(&mut params)?;
        let url = format!("{}{}?{}", self.base_url, path, params);

        let text = self
            .http_client
            .get(&url)
            .header("X-MBX-APIKEY", &self.api_key)
            .send()
            .await?
            .text()
            .await?;
        Self::decode(&text)
    }

    async fn signed_post<T: DeserializeOwned>(&self, path: &str, mut params: String) -> Result<T> {
        self.create_signed_query(&mut params)?;
        let url = format!("{}{}", self.base_url, path);

        let text = self
            .http_client
            .post(&url)
            .header("X-MBX-APIKEY", &self.api_key)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(params)
            .send()
            .await?
            .text()
            .await?;
        Self::decode(&text)
    }

    async fn signed_delete<T: DeserializeOwned>(&self, path: &str, mut params: String) -> Result<T> {
        self.create_signed_query(&mut params)?;
        let url = format!("{}{}?{}", self.base_url, path, params);

        let text = self
            .http_client
            .delete(&url)
            .header("X-MBX-APIKEY", &self.api_key)
            .send()
            .await?
            .text()
            .await?;
        Self::decode(&text)
    }

    /// Fetches the most recent `limit` klines, oldest first.
    ///
    /// This corresponds to the `GET /fapi/v1/klines` endpoint. The last
    /// element is the bar that is still forming.
    pub async fn get_klines(
        &self,
        symbol: &Symbol,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Bar>> {
        let limit = limit.min(MAX_KLINES_PER_REQUEST);
        let url = format!(
            "{}/fapi/v1/klines?symbol={}&interval={}&limit={}",
            self.base_url,
            symbol.0,
            timeframe.interval(),
            limit
        );

        let text = self.http_client.get(&url).send().await?.text().await?;
        let raw_klines: Vec<RawKline> = Self::decode(&text)?;

        // Convert the RawKlines into our clean, internal Bar type.
        raw_klines.into_iter().map(RawKline::into_bar).collect()
    }

    /// Fetches the futures account balance and floating profit.
    ///
    /// This corresponds to the `GET /fapi/v2/account` endpoint.
    pub async fn get_account(&self) -> Result<AccountState> {
        self.signed_get("/fapi/v2/account", String::new()).await
    }

    /// Fetches the open positions for one symbol.
    ///
    /// This corresponds to the `GET /fapi/v2/positionRisk` endpoint.
    pub async fn get_positions(&self, symbol: &Symbol) -> Result<Vec<Position>> {
        let risks: Vec<PositionRisk> = self
            .signed_get("/fapi/v2/positionRisk", format!("symbol={}", symbol.0))
            .await?;
        Ok(risks.iter().filter_map(PositionRisk::to_position).collect())
    }

    /// Places a new market order for a hedge-mode position.
    ///
    /// `position_side` is the position being opened or reduced; `side` is the
    /// order direction. Corresponds to `POST /fapi/v1/order`.
    pub async fn place_market_order(
        &self,
        symbol: &Symbol,
        side: OrderSide,
        position_side: Side,
        quantity: Decimal,
    ) -> Result<NewOrderResponse> {
        let params = format!(
            "symbol={}&side={}&type=MARKET&quantity={}&positionSide={}&newOrderRespType=RESULT",
            symbol.0,
            side.as_str(),
            quantity.normalize(),
            position_side_param(position_side)
        );
        tracing::debug!(%symbol, ?side, ?position_side, %quantity, "Placing market order.");
        self.signed_post("/fapi/v1/order", params).await
    }

    /// Places a conditional order that closes the whole position when
    /// `stop_price` is touched.
    pub async fn place_protective_order(
        &self,
        symbol: &Symbol,
        position_side: Side,
        kind: ProtectiveKind,
        stop_price: Decimal,
    ) -> Result<NewOrderResponse> {
        let params = format!(
            "symbol={}&side={}&type={}&stopPrice={}&closePosition=true&positionSide={}&workingType=MARK_PRICE",
            symbol.0,
            OrderSide::closing(position_side).as_str(),
            kind.order_type(),
            stop_price.normalize(),
            position_side_param(position_side)
        );
        tracing::debug!(%symbol, ?position_side, ?kind, %stop_price, "Placing protective order.");
        self.signed_post("/fapi/v1/order", params).await
    }

    /// Cancels every open order on `symbol`, protective orders included.
    ///
    /// Corresponds to `DELETE /fapi/v1/allOpenOrders`.
    pub async fn cancel_all_open_orders(&self, symbol: &Symbol) -> Result<()> {
        let _: Value = self
            .signed_delete("/fapi/v1/allOpenOrders", format!("symbol={}", symbol.0))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(secret: &str) -> ApiClient {
        ApiClient::new(&BrokerSettings {
            live_trading_enabled: false,
            api_key: "key".into(),
            secret_key: secret.into(),
            rest_base_url: "https://testnet.binancefuture.com/".into(),
            request_timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn signature_matches_exchange_documentation_example() {
        let client = client("NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j");
        let query = "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1&recvWindow=5000&timestamp=1499827319559";
        assert_eq!(
            client.sign(query).unwrap(),
            "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71"
        );
    }

    #[test]
    fn signed_query_ends_with_signature() {
        let client = client("secret");
        let mut params = "symbol=BTCUSDT".to_string();
        client.create_signed_query(&mut params).unwrap();
        assert!(params.starts_with("symbol=BTCUSDT&timestamp="));
        let signature = params.rsplit("&signature=").next().unwrap();
        assert_eq!(signature.len(), 64);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        assert_eq!(client("s").base_url, "https://testnet.binancefuture.com");
    }

    #[test]
    fn error_objects_become_api_errors() {
        let err = ApiClient::decode::<Vec<RawKline>>(r#"{"code":-1121,"msg":"Invalid symbol."}"#)
            .unwrap_err();
        assert!(matches!(err, Error::ApiError { code: -1121, .. }));
    }
}
