// In crates/api-client/src/types.rs

use crate::{Error, Result};
use chrono::{TimeZone, Utc};
use core_types::{Bar, Position, PositionId, Side, Symbol};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

/// The main client for interacting with the Binance Futures API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// The persistent HTTP client.
    pub http_client: Client,
    /// The user's Binance API key.
    pub api_key: String,
    /// The user's Binance secret key.
    pub secret_key: String,
    /// The base URL for the Binance Futures API.
    pub base_url: String,
}

/// The exchange-side order direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "BUY",
            OrderSide::Sell => "SELL",
        }
    }

    /// The order side that opens a position on `side`.
    pub fn opening(side: Side) -> Self {
        match side {
            Side::Long => OrderSide::Buy,
            Side::Short => OrderSide::Sell,
        }
    }

    /// The order side that reduces a position on `side`.
    pub fn closing(side: Side) -> Self {
        match side {
            Side::Long => OrderSide::Sell,
            Side::Short => OrderSide::Buy,
        }
    }
}

/// The hedge-mode `positionSide` parameter for a position side.
pub fn position_side_param(side: Side) -> &'static str {
    match side {
        Side::Long => "LONG",
        Side::Short => "SHORT",
    }
}

/// Conditional orders used as exchange-side stop-loss / take-profit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtectiveKind {
    StopLoss,
    TakeProfit,
}

impl ProtectiveKind {
    pub fn order_type(&self) -> &'static str {
        match self {
            ProtectiveKind::StopLoss => "STOP_MARKET",
            ProtectiveKind::TakeProfit => "TAKE_PROFIT_MARKET",
        }
    }
}

/// Represents a single position as returned by `GET /fapi/v2/positionRisk`.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PositionRisk {
    /// The trading pair symbol (e.g., "BTCUSDT").
    pub symbol: String,
    /// The quantity of the position (negative for short in one-way mode).
    pub position_amt: Decimal,
    /// The average entry price of the position.
    pub entry_price: Decimal,
    /// The current mark price of the position.
    pub mark_price: Decimal,
    /// The unrealized profit/loss of the position.
    #[serde(rename = "unRealizedProfit")]
    pub unrealized_profit: Decimal,
    /// The side of the position ("LONG", "SHORT", or "BOTH").
    pub position_side: String,
}

impl PositionRisk {
    /// Converts to the engine's position type. Flat entries yield `None`.
    pub fn to_position(&self) -> Option<Position> {
        if self.position_amt.is_zero() {
            return None;
        }
        let side = match self.position_side.as_str() {
            "LONG" => Side::Long,
            "SHORT" => Side::Short,
            _ if self.position_amt > Decimal::ZERO => Side::Long,
            _ => Side::Short,
        };
        Some(Position {
            id: PositionId(format!("{}:{}", self.symbol, position_side_param(side))),
            symbol: Symbol(self.symbol.clone()),
            side,
            volume: self.position_amt.abs(),
            open_price: self.entry_price,
        })
    }
}

/// Represents the overall futures account state.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AccountState {
    /// The total wallet balance in USDT.
    pub total_wallet_balance: Decimal,
    /// The total unrealized profit and loss in USDT.
    pub total_unrealized_profit: Decimal,
    /// The total margin balance in USDT.
    pub total_margin_balance: Decimal,
    /// The total available balance for new positions in USDT.
    pub available_balance: Option<Decimal>,
}

/// Temporary struct to deserialize the kline response from Binance,
/// which is a JSON array of mixed types.
#[derive(Debug, Deserialize)]
pub struct RawKline(
    pub i64,         // 0: Open time
    pub String,      // 1: Open
    pub String,      // 2: High
    pub String,      // 3: Low
    pub String,      // 4: Close
    pub String,      // 5: Volume
    pub i64,         // 6: Close time
    pub String,      // 7: Quote asset volume
    pub i64,         // 8: Number of trades
    pub String,      // 9: Taker buy base asset volume
    pub String,      // 10: Taker buy quote asset volume
    pub String,      // 11: Ignore
);

impl RawKline {
    pub fn into_bar(self) -> Result<Bar> {
        let time = Utc
            .timestamp_millis_opt(self.0)
            .single()
            .ok_or_else(|| Error::InvalidResponse(format!("kline open time {} out of range", self.0)))?;
        Ok(Bar {
            time,
            open: parse_decimal("open", &self.1)?,
            high: parse_decimal("high", &self.2)?,
            low: parse_decimal("low", &self.3)?,
            close: parse_decimal("close", &self.4)?,
            volume: parse_decimal("volume", &self.5)?,
        })
    }
}

fn parse_decimal(field: &str, raw: &str) -> Result<Decimal> {
    raw.parse()
        .map_err(|_| Error::InvalidResponse(format!("kline {field} '{raw}' is not a decimal")))
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderResponse {
    pub order_id: i64,
    pub symbol: String,
    pub side: String, // "BUY" or "SELL"
    pub r#type: String, // "MARKET", "STOP_MARKET", etc.
    pub status: String,
    pub avg_price: Decimal, // The actual average fill price
    pub executed_qty: Decimal, // The actual filled quantity
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn raw_kline_converts_to_bar() {
        let raw: RawKline = serde_json::from_str(
            r#"[1499040000000,"0.01634790","0.80000000","0.01575800","0.01577100",
                "148976.11427815",1499644799999,"2434.19055334",308,"1756.87402397",
                "28.46694368","17928899.62484339"]"#,
        )
        .unwrap();
        let bar = raw.into_bar().unwrap();
        assert_eq!(bar.time.timestamp_millis(), 1_499_040_000_000);
        assert_eq!(bar.high, dec!(0.8));
        assert_eq!(bar.close, dec!(0.015771));
    }

    #[test]
    fn malformed_price_is_an_invalid_response() {
        let raw = RawKline(
            0,
            "1".into(),
            "x".into(),
            "1".into(),
            "1".into(),
            "0".into(),
            0,
            "0".into(),
            0,
            "0".into(),
            "0".into(),
            "0".into(),
        );
        assert!(matches!(raw.into_bar(), Err(Error::InvalidResponse(_))));
    }

    #[test]
    fn position_risk_maps_hedge_and_one_way_sides() {
        let hedge: PositionRisk = serde_json::from_str(
            r#"{"symbol":"BTCUSDT","positionAmt":"-0.020","entryPrice":"64000.1",
                "markPrice":"63900.0","unRealizedProfit":"2.002","leverage":"10",
                "positionSide":"SHORT"}"#,
        )
        .unwrap();
        let position = hedge.to_position().unwrap();
        assert_eq!(position.side, Side::Short);
        assert_eq!(position.volume, dec!(0.020));
        assert_eq!(position.id, PositionId("BTCUSDT:SHORT".into()));

        let one_way = PositionRisk {
            position_side: "BOTH".into(),
            position_amt: dec!(0.5),
            ..hedge.clone()
        };
        assert_eq!(one_way.to_position().unwrap().side, Side::Long);

        let flat = PositionRisk {
            position_amt: Decimal::ZERO,
            ..hedge
        };
        assert!(flat.to_position().is_none());
    }
}
