// In crates/engine/src/cycle.rs

use crate::reconciler::{self, Action};
use crate::{Error, Result};
use app_config::{Settings, TradingSettings};
use chrono::{DateTime, Utc};
use core_types::{
    Bar, Fill, IndicatorRow, OrderAction, OrderIntent, Position, Side, Signal, Symbol, Timeframe,
    TradeDirection,
};
use events::{CycleSummary, EngineEvent, OrderRejection};
use execution::{Gateway, MarketFeed};
use risk::{RiskManager, SimpleRiskManager};
use rust_decimal::Decimal;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;
use strategies::signal::last_closed;
use strategies::{Strategy, SuperTrend};
use tokio::sync::broadcast;

/// The fewest bars that still leave one closed bar to act on.
pub const MIN_BARS: usize = 2;

const EVENT_CAPACITY: usize = 256;

/// What one cycle evaluates and where.
#[derive(Debug, Clone)]
pub struct CycleParams {
    pub symbol: Symbol,
    pub timeframe: Timeframe,
    pub candle_count: usize,
    pub trade_direction: TradeDirection,
    /// Upper bound for each feed or gateway call.
    pub call_timeout: Duration,
}

impl From<&TradingSettings> for CycleParams {
    fn from(trading: &TradingSettings) -> Self {
        Self {
            symbol: trading.symbol(),
            timeframe: trading.timeframe,
            candle_count: trading.candle_count,
            trade_direction: trading.trade_direction,
            call_timeout: trading.call_timeout(),
        }
    }
}

/// The immutable result of one completed cycle, as shown to the operator.
#[derive(Debug, Clone)]
pub struct CycleSnapshot {
    pub symbol: Symbol,
    pub timeframe: Timeframe,
    pub completed_at: DateTime<Utc>,
    pub bars: Vec<Bar>,
    pub rows: Vec<IndicatorRow>,
    /// The signal on the last closed bar.
    pub signal: Signal,
    /// Close of the forming bar; entries are priced at it.
    pub last_price: Decimal,
    /// Positions as reported before any order of this cycle.
    pub positions: Vec<Position>,
    pub intents: Vec<OrderIntent>,
    pub fills: Vec<Fill>,
    /// Non-fatal problems: rejections, vetoes, conflicts.
    pub issues: Vec<String>,
    /// Intents the gateway refused or did not answer in time.
    pub rejected: usize,
}

impl CycleSnapshot {
    pub fn summary(&self) -> CycleSummary {
        CycleSummary {
            symbol: self.symbol.clone(),
            completed_at: self.completed_at,
            bars: self.bars.len(),
            signal: self.signal,
            last_price: self.last_price,
            intents: self.intents.len(),
            issues: self.issues.clone(),
        }
    }
}

/// Runs fetch → indicators → signal → reconcile → submit for one symbol.
pub struct CycleDriver {
    params: CycleParams,
    strategy: Box<dyn Strategy + Send + Sync>,
    risk_manager: Box<dyn RiskManager + Send + Sync>,
    feed: Arc<dyn MarketFeed>,
    gateway: Arc<dyn Gateway>,
    events: broadcast::Sender<EngineEvent>,
}

impl CycleDriver {
    pub fn new(
        params: CycleParams,
        strategy: Box<dyn Strategy + Send + Sync>,
        risk_manager: Box<dyn RiskManager + Send + Sync>,
        feed: Arc<dyn MarketFeed>,
        gateway: Arc<dyn Gateway>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            params,
            strategy,
            risk_manager,
            feed,
            gateway,
            events,
        }
    }

    /// Wires the SuperTrend strategy and the fixed-distance risk manager
    /// from the loaded settings.
    pub fn from_settings(
        settings: &Settings,
        feed: Arc<dyn MarketFeed>,
        gateway: Arc<dyn Gateway>,
    ) -> Result<Self> {
        let strategy = SuperTrend::new(settings.supertrend.clone())?;
        let risk_manager = SimpleRiskManager::new(&settings.risk)?;
        Ok(Self::new(
            CycleParams::from(&settings.trading),
            Box::new(strategy),
            Box::new(risk_manager),
            feed,
            gateway,
        ))
    }

    pub fn params(&self) -> &CycleParams {
        &self.params
    }

    pub fn gateway(&self) -> &Arc<dyn Gateway> {
        &self.gateway
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    pub(crate) fn publish(&self, event: EngineEvent) {
        // No subscriber is fine.
        let _ = self.events.send(event);
    }

    async fn bounded<T, E: Display>(
        &self,
        call: &str,
        fut: impl Future<Output = std::result::Result<T, E>>,
    ) -> std::result::Result<T, String> {
        match tokio::time::timeout(self.params.call_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!("{call} timed out after {:?}", self.params.call_timeout)),
        }
    }

    async fn fetch(&self, count: usize) -> Result<Vec<Bar>> {
        let p = &self.params;
        let bars = self
            .bounded("fetch_bars", self.feed.fetch_bars(&p.symbol, p.timeframe, count))
            .await
            .map_err(Error::FeedUnavailable)?;
        if bars.is_empty() {
            return Err(Error::FeedUnavailable(format!("no bars for {}", p.symbol)));
        }
        Ok(bars)
    }

    async fn positions(&self) -> Result<Vec<Position>> {
        self.bounded(
            "list_open_positions",
            self.gateway.list_open_positions(&self.params.symbol),
        )
        .await
        .map_err(Error::GatewayUnavailable)
    }

    /// The current market price: the close of the forming bar.
    async fn current_price(&self) -> Result<Decimal> {
        let bars = self.fetch(1).await?;
        let price = bars.last().map(|b| b.close).unwrap_or_default();
        self.gateway.mark_price(&self.params.symbol, price);
        Ok(price)
    }

    /// Computes the rows and decides the intents without submitting them
    /// and without touching the gateway's state.
    ///
    /// A feed failure or too short a window aborts with an error; nothing
    /// is produced in that case.
    pub async fn evaluate(&self) -> Result<CycleSnapshot> {
        self.assess(false).await
    }

    /// With `mark` set, the forming bar's close is pushed to the gateway
    /// before positions are listed, so protective levels it holds are
    /// settled first.
    async fn assess(&self, mark: bool) -> Result<CycleSnapshot> {
        let p = &self.params;
        let bars = self.fetch(p.candle_count).await?;
        if bars.len() < MIN_BARS {
            return Err(Error::IndicatorUnderflow {
                needed: MIN_BARS,
                got: bars.len(),
            });
        }

        let rows = self.strategy.assess(&bars);
        let signal = last_closed(&rows).unwrap_or_default();
        let last_price = bars.last().map(|b| b.close).unwrap_or_default();
        if mark {
            self.gateway.mark_price(&p.symbol, last_price);
        }

        let positions = self.positions().await?;
        let plan = reconciler::reconcile(signal, &positions, p.trade_direction);

        let mut issues = Vec::new();
        if plan.conflict {
            let conflict = Error::ConcurrentPositionConflict(p.symbol.clone());
            tracing::warn!(symbol = %p.symbol, positions = positions.len(), "{}", conflict);
            issues.push(conflict.to_string());
        }

        let mut intents = Vec::with_capacity(plan.actions.len());
        for action in plan.actions {
            match action {
                Action::Close(position) => intents.push(OrderIntent::close(&position, last_price)),
                Action::Open(side) => {
                    match self.risk_manager.entry_order(&p.symbol, side, last_price) {
                        Ok(intent) => intents.push(intent),
                        Err(e) => {
                            tracing::warn!(symbol = %p.symbol, ?side, error = %e, "Entry vetoed.");
                            issues.push(e.to_string());
                        }
                    }
                }
            }
        }

        if signal != Signal::None {
            tracing::info!(
                symbol = %p.symbol,
                ?signal,
                strategy = self.strategy.name(),
                intents = intents.len(),
                "Closed bar carries a signal."
            );
        }

        Ok(CycleSnapshot {
            symbol: p.symbol.clone(),
            timeframe: p.timeframe,
            completed_at: Utc::now(),
            bars,
            rows,
            signal,
            last_price,
            positions,
            intents,
            fills: Vec::new(),
            issues,
            rejected: 0,
        })
    }

    /// Sends one intent to the gateway, publishing the outcome.
    async fn submit_intent(&self, intent: &OrderIntent) -> Result<Fill> {
        let result = match intent.action {
            OrderAction::Open => self.bounded("open_position", self.gateway.open_position(intent)).await,
            OrderAction::Close => self.bounded("close_position", self.gateway.close_position(intent)).await,
        };

        match result {
            Ok(fill) => {
                tracing::info!(
                    symbol = %fill.symbol,
                    action = ?fill.action,
                    side = ?fill.side,
                    price = %fill.price,
                    volume = %fill.volume,
                    gateway = self.gateway.name(),
                    "Order filled."
                );
                self.publish(EngineEvent::OrderFilled(fill.clone()));
                Ok(fill)
            }
            Err(reason) => {
                tracing::warn!(action = ?intent.action, side = ?intent.side, %reason, "Gateway rejected order.");
                self.publish(EngineEvent::OrderRejected(OrderRejection {
                    intent: intent.clone(),
                    reason: reason.clone(),
                }));
                Err(Error::GatewayRejected { reason })
            }
        }
    }

    /// Submits the snapshot's intents in order. Rejections become issues
    /// and are counted in `rejected`; the next cycle decides them again
    /// from scratch.
    pub async fn submit(&self, snapshot: &mut CycleSnapshot) {
        for intent in &snapshot.intents {
            match self.submit_intent(intent).await {
                Ok(fill) => snapshot.fills.push(fill),
                Err(e) => {
                    snapshot.rejected += 1;
                    snapshot.issues.push(e.to_string());
                }
            }
        }
        snapshot.completed_at = Utc::now();
    }

    /// One full cycle: mark the price, evaluate, then submit.
    pub async fn run_once(&self) -> Result<CycleSnapshot> {
        let mut snapshot = self.assess(true).await?;
        self.submit(&mut snapshot).await;
        Ok(snapshot)
    }

    /// Opens a position at the current price, bypassing the signal.
    ///
    /// Refused while any position is open on the symbol. The trade
    /// direction filter does not apply to manual orders.
    pub async fn manual_entry(&self, side: Side) -> Result<Fill> {
        let symbol = &self.params.symbol;
        if !self.positions().await?.is_empty() {
            return Err(Error::PositionAlreadyOpen(symbol.clone()));
        }

        let price = self.current_price().await?;
        let intent = self.risk_manager.entry_order(symbol, side, price)?;
        tracing::info!(%symbol, ?side, %price, "Manual entry.");
        self.submit_intent(&intent).await
    }

    /// Closes every open position on the symbol.
    ///
    /// Every close is attempted; if any is rejected the call fails after
    /// the others have been sent.
    pub async fn close_all(&self) -> Result<Vec<Fill>> {
        let positions = self.positions().await?;
        if positions.is_empty() {
            tracing::info!(symbol = %self.params.symbol, "No open positions to close.");
            return Ok(Vec::new());
        }

        let price = match self.current_price().await {
            Ok(price) => Some(price),
            Err(e) => {
                tracing::warn!(error = %e, "No current price; closing at the open price.");
                None
            }
        };

        let mut fills = Vec::with_capacity(positions.len());
        let mut failures = Vec::new();
        for position in &positions {
            let intent = OrderIntent::close(position, price.unwrap_or(position.open_price));
            match self.submit_intent(&intent).await {
                Ok(fill) => fills.push(fill),
                Err(e) => failures.push(format!("{}: {}", position.id, e)),
            }
        }

        if failures.is_empty() {
            Ok(fills)
        } else {
            Err(Error::GatewayRejected {
                reason: format!(
                    "{} of {} closes failed: {}",
                    failures.len(),
                    positions.len(),
                    failures.join("; ")
                ),
            })
        }
    }
}
