// In crates/execution/src/feed.rs

use crate::{MarketFeed, Result};
use api_client::ApiClient;
use async_trait::async_trait;
use core_types::{Bar, Symbol, Timeframe};

/// Klines straight from the futures REST endpoint.
#[async_trait]
impl MarketFeed for ApiClient {
    async fn fetch_bars(
        &self,
        symbol: &Symbol,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<Bar>> {
        let bars = self.get_klines(symbol, timeframe, count).await?;
        tracing::debug!(%symbol, %timeframe, requested = count, received = bars.len(), "Fetched bars.");
        Ok(bars)
    }
}
