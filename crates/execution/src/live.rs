// In crates/execution/src/live.rs

use crate::types::AccountSnapshot;
use crate::{Error, Gateway, Result};
use api_client::{ApiClient, OrderSide, ProtectiveKind, position_side_param};
use async_trait::async_trait;
use chrono::Utc;
use core_types::{Fill, OrderAction, OrderIntent, Position, PositionId, Symbol};
use rust_decimal::Decimal;

/// A gateway that places real orders on Binance USDⓈ-M futures.
///
/// The account is expected to run in hedge mode: every order names the
/// `positionSide` it opens or reduces, so one symbol can never net a long
/// against a short.
#[derive(Debug, Clone)]
pub struct LiveGateway {
    /// The API client for communicating with Binance.
    api_client: ApiClient,
}

impl LiveGateway {
    pub fn new(api_client: ApiClient) -> Self {
        Self { api_client }
    }

    /// Attaches the exchange-side stop-loss and take-profit orders.
    ///
    /// The position is already open when this runs, so a failure here is
    /// logged and does not fail the entry.
    async fn attach_protection(&self, intent: &OrderIntent) {
        let levels = [
            (ProtectiveKind::StopLoss, intent.stop_loss),
            (ProtectiveKind::TakeProfit, intent.take_profit),
        ];
        for (kind, level) in levels {
            let Some(level) = level else { continue };
            match self
                .api_client
                .place_protective_order(&intent.symbol, intent.side, kind, level)
                .await
            {
                Ok(resp) => tracing::info!(order_id = resp.order_id, ?kind, %level, "Protective order placed."),
                Err(e) => tracing::error!(error = %e, ?kind, %level, symbol = %intent.symbol, "Failed to place protective order."),
            }
        }
    }
}

fn fill_from(intent: &OrderIntent, avg_price: Decimal, executed_qty: Decimal) -> Fill {
    // MARKET orders may answer before the fill is reported.
    let price = if avg_price.is_zero() { intent.price } else { avg_price };
    let volume = if executed_qty.is_zero() { intent.volume } else { executed_qty };
    Fill {
        symbol: intent.symbol.clone(),
        action: intent.action,
        side: intent.side,
        price,
        volume,
        position: Some(PositionId(format!(
            "{}:{}",
            intent.symbol.0,
            position_side_param(intent.side)
        ))),
        time: Utc::now(),
    }
}

#[async_trait]
impl Gateway for LiveGateway {
    fn name(&self) -> &'static str {
        "LiveGateway"
    }

    async fn open_position(&self, intent: &OrderIntent) -> Result<Fill> {
        if intent.action != OrderAction::Open {
            return Err(Error::InvalidOrder("open_position needs an Open intent".to_string()));
        }
        tracing::info!(?intent, "Executing live entry...");

        let response = self
            .api_client
            .place_market_order(
                &intent.symbol,
                OrderSide::opening(intent.side),
                intent.side,
                intent.volume,
            )
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to place market order.");
                Error::ExecutionFailed { reason: format!("Failed to place order: {}", e) }
            })?;
        tracing::info!(?response, "Market order placed.");

        self.attach_protection(intent).await;
        Ok(fill_from(intent, response.avg_price, response.executed_qty))
    }

    async fn close_position(&self, intent: &OrderIntent) -> Result<Fill> {
        if intent.action != OrderAction::Close {
            return Err(Error::InvalidOrder("close_position needs a Close intent".to_string()));
        }
        tracing::info!(?intent, "Executing live close...");

        let response = self
            .api_client
            .place_market_order(
                &intent.symbol,
                OrderSide::closing(intent.side),
                intent.side,
                intent.volume,
            )
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to place closing order.");
                Error::ExecutionFailed { reason: format!("Failed to close position: {}", e) }
            })?;
        tracing::info!(?response, "Closing order filled.");

        // closePosition orders outlive their position; drop them once the symbol is flat.
        match self.api_client.get_positions(&intent.symbol).await {
            Ok(remaining) if remaining.is_empty() => {
                if let Err(e) = self.api_client.cancel_all_open_orders(&intent.symbol).await {
                    tracing::warn!(error = %e, symbol = %intent.symbol, "Failed to cancel leftover orders.");
                }
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "Could not re-read positions after close."),
        }

        Ok(fill_from(intent, response.avg_price, response.executed_qty))
    }

    async fn list_open_positions(&self, symbol: &Symbol) -> Result<Vec<Position>> {
        Ok(self.api_client.get_positions(symbol).await?)
    }

    async fn account(&self) -> Result<AccountSnapshot> {
        let state = self.api_client.get_account().await?;
        Ok(AccountSnapshot {
            balance: state.total_wallet_balance,
            profit: state.total_unrealized_profit,
        })
    }
}
