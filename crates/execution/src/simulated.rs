// In crates/execution/src/simulated.rs

use crate::types::AccountSnapshot;
use crate::{Error, Gateway, Result};
use app_config::SimulationSettings;
use async_trait::async_trait;
use chrono::Utc;
use core_types::{Fill, OrderAction, OrderIntent, Position, PositionId, Side, Symbol};
use num_traits::FromPrimitive;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A paper account that fills every order at the intent's price.
///
/// Stop-loss and take-profit levels are honoured on [`Gateway::mark_price`]:
/// a mark through a level closes the position at that level.
#[derive(Debug)]
pub struct SimulatedGateway {
    contract_size: Decimal,
    book: Mutex<Book>,
}

#[derive(Debug, Default)]
struct Book {
    balance: Decimal,
    positions: Vec<PaperPosition>,
    marks: HashMap<Symbol, Decimal>,
    next_ticket: u64,
}

#[derive(Debug, Clone)]
struct PaperPosition {
    position: Position,
    stop_loss: Option<Decimal>,
    take_profit: Option<Decimal>,
}

impl PaperPosition {
    /// The protective level crossed by `price`, stop-loss first.
    fn triggered_level(&self, price: Decimal) -> Option<Decimal> {
        let (hit_stop, hit_take) = match self.position.side {
            Side::Long => (
                self.stop_loss.filter(|sl| price <= *sl),
                self.take_profit.filter(|tp| price >= *tp),
            ),
            Side::Short => (
                self.stop_loss.filter(|sl| price >= *sl),
                self.take_profit.filter(|tp| price <= *tp),
            ),
        };
        hit_stop.or(hit_take)
    }
}

impl SimulatedGateway {
    pub fn new(settings: &SimulationSettings) -> Result<Self> {
        let balance = Decimal::from_f64(settings.initial_balance).ok_or_else(|| {
            Error::InvalidSettings(format!("initial_balance {}", settings.initial_balance))
        })?;
        let contract_size = Decimal::from_f64(settings.contract_size)
            .filter(|c| *c > Decimal::ZERO)
            .ok_or_else(|| {
                Error::InvalidSettings(format!("contract_size {}", settings.contract_size))
            })?;

        Ok(Self {
            contract_size,
            book: Mutex::new(Book {
                balance,
                next_ticket: 1,
                ..Book::default()
            }),
        })
    }

    fn book(&self) -> MutexGuard<'_, Book> {
        // The book holds plain values; a panic elsewhere cannot leave it half-written.
        self.book.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn pnl(&self, position: &Position, price: Decimal) -> Decimal {
        let sign = match position.side {
            Side::Long => Decimal::ONE,
            Side::Short => Decimal::NEGATIVE_ONE,
        };
        (price - position.open_price) * position.volume * self.contract_size * sign
    }

    /// Removes a position from the book and settles its P&L into the balance.
    fn settle(&self, book: &mut Book, index: usize, price: Decimal) -> Fill {
        let closed = book.positions.remove(index).position;
        let pnl = self.pnl(&closed, price);
        book.balance += pnl;

        tracing::info!(
            position = %closed.id,
            side = ?closed.side,
            open_price = %closed.open_price,
            close_price = %price,
            %pnl,
            balance = %book.balance,
            "Paper position closed."
        );

        Fill {
            symbol: closed.symbol,
            action: OrderAction::Close,
            side: closed.side,
            price,
            volume: closed.volume,
            position: Some(closed.id),
            time: Utc::now(),
        }
    }
}

fn check_intent(intent: &OrderIntent, expected: OrderAction) -> Result<()> {
    if intent.action != expected {
        return Err(Error::InvalidOrder(format!(
            "expected an {:?} intent, got {:?}",
            expected, intent.action
        )));
    }
    if intent.volume <= Decimal::ZERO || intent.price <= Decimal::ZERO {
        return Err(Error::InvalidOrder(format!(
            "volume {} and price {} must be positive",
            intent.volume, intent.price
        )));
    }
    Ok(())
}

#[async_trait]
impl Gateway for SimulatedGateway {
    fn name(&self) -> &'static str {
        "SimulatedGateway"
    }

    async fn open_position(&self, intent: &OrderIntent) -> Result<Fill> {
        check_intent(intent, OrderAction::Open)?;

        let mut book = self.book();
        let id = PositionId(format!("SIM-{}", book.next_ticket));
        book.next_ticket += 1;

        book.positions.push(PaperPosition {
            position: Position {
                id: id.clone(),
                symbol: intent.symbol.clone(),
                side: intent.side,
                volume: intent.volume,
                open_price: intent.price,
            },
            stop_loss: intent.stop_loss,
            take_profit: intent.take_profit,
        });
        book.marks.insert(intent.symbol.clone(), intent.price);

        tracing::info!(
            position = %id,
            symbol = %intent.symbol,
            side = ?intent.side,
            price = %intent.price,
            volume = %intent.volume,
            "Paper position opened."
        );

        Ok(Fill {
            symbol: intent.symbol.clone(),
            action: OrderAction::Open,
            side: intent.side,
            price: intent.price,
            volume: intent.volume,
            position: Some(id),
            time: Utc::now(),
        })
    }

    async fn close_position(&self, intent: &OrderIntent) -> Result<Fill> {
        check_intent(intent, OrderAction::Close)?;
        let id = intent
            .position
            .as_ref()
            .ok_or_else(|| Error::InvalidOrder("close intent without a position".to_string()))?;

        let mut book = self.book();
        let index = book
            .positions
            .iter()
            .position(|p| &p.position.id == id)
            .ok_or_else(|| Error::PositionNotFound(id.clone()))?;
        book.marks.insert(intent.symbol.clone(), intent.price);

        Ok(self.settle(&mut book, index, intent.price))
    }

    async fn list_open_positions(&self, symbol: &Symbol) -> Result<Vec<Position>> {
        Ok(self
            .book()
            .positions
            .iter()
            .filter(|p| &p.position.symbol == symbol)
            .map(|p| p.position.clone())
            .collect())
    }

    async fn account(&self) -> Result<AccountSnapshot> {
        let book = self.book();
        let profit = book
            .positions
            .iter()
            .map(|p| {
                let mark = book
                    .marks
                    .get(&p.position.symbol)
                    .copied()
                    .unwrap_or(p.position.open_price);
                self.pnl(&p.position, mark)
            })
            .sum();
        Ok(AccountSnapshot {
            balance: book.balance,
            profit,
        })
    }

    fn mark_price(&self, symbol: &Symbol, price: Decimal) {
        let mut book = self.book();
        book.marks.insert(symbol.clone(), price);

        loop {
            let hit = book
                .positions
                .iter()
                .enumerate()
                .filter(|(_, p)| &p.position.symbol == symbol)
                .find_map(|(i, p)| p.triggered_level(price).map(|level| (i, level)));
            let Some((index, level)) = hit else { break };

            tracing::info!(%symbol, %price, %level, "Protective level reached.");
            self.settle(&mut book, index, level);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn gateway() -> SimulatedGateway {
        SimulatedGateway::new(&SimulationSettings {
            initial_balance: 10_000.0,
            contract_size: 100.0,
        })
        .unwrap()
    }

    fn open(side: Side, price: Decimal, stop_loss: Option<Decimal>, take_profit: Option<Decimal>) -> OrderIntent {
        OrderIntent {
            action: OrderAction::Open,
            side,
            symbol: Symbol::from("XAUUSD"),
            volume: dec!(0.1),
            price,
            stop_loss,
            take_profit,
            position: None,
        }
    }

    #[tokio::test]
    async fn open_then_close_settles_profit() {
        let gateway = gateway();
        let symbol = Symbol::from("XAUUSD");
        let fill = gateway.open_position(&open(Side::Long, dec!(2350), None, None)).await.unwrap();
        assert_eq!(fill.position, Some(PositionId("SIM-1".into())));

        let positions = gateway.list_open_positions(&symbol).await.unwrap();
        assert_eq!(positions.len(), 1);

        gateway.mark_price(&symbol, dec!(2355));
        let account = gateway.account().await.unwrap();
        assert_eq!(account.balance, dec!(10000));
        assert_eq!(account.profit, dec!(50));

        let close = OrderIntent::close(&positions[0], dec!(2360));
        let fill = gateway.close_position(&close).await.unwrap();
        assert_eq!(fill.action, OrderAction::Close);
        assert_eq!(fill.side, Side::Long);

        let account = gateway.account().await.unwrap();
        assert_eq!(account.balance, dec!(10100));
        assert_eq!(account.profit, Decimal::ZERO);
        assert!(gateway.list_open_positions(&symbol).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn short_loses_when_price_rises() {
        let gateway = gateway();
        gateway.open_position(&open(Side::Short, dec!(100), None, None)).await.unwrap();
        gateway.mark_price(&Symbol::from("XAUUSD"), dec!(101));
        assert_eq!(gateway.account().await.unwrap().profit, dec!(-10));
    }

    #[tokio::test]
    async fn closing_an_unknown_position_fails() {
        let gateway = gateway();
        let ghost = Position {
            id: PositionId("SIM-42".into()),
            symbol: Symbol::from("XAUUSD"),
            side: Side::Long,
            volume: dec!(1),
            open_price: dec!(1),
        };
        let result = gateway.close_position(&OrderIntent::close(&ghost, dec!(2))).await;
        assert!(matches!(result, Err(Error::PositionNotFound(_))));
    }

    #[tokio::test]
    async fn mismatched_action_is_rejected() {
        let gateway = gateway();
        let mut intent = open(Side::Long, dec!(10), None, None);
        intent.action = OrderAction::Close;
        assert!(matches!(
            gateway.open_position(&intent).await,
            Err(Error::InvalidOrder(_))
        ));
    }

    #[tokio::test]
    async fn stop_loss_closes_at_the_level() {
        let gateway = gateway();
        let symbol = Symbol::from("XAUUSD");
        gateway
            .open_position(&open(Side::Long, dec!(2350), Some(dec!(2320)), Some(dec!(2365))))
            .await
            .unwrap();

        gateway.mark_price(&symbol, dec!(2330));
        assert_eq!(gateway.list_open_positions(&symbol).await.unwrap().len(), 1);

        gateway.mark_price(&symbol, dec!(2310));
        assert!(gateway.list_open_positions(&symbol).await.unwrap().is_empty());
        // Settled at 2320, not at the gap price.
        assert_eq!(gateway.account().await.unwrap().balance, dec!(9700));
    }

    #[tokio::test]
    async fn take_profit_on_a_short() {
        let gateway = gateway();
        let symbol = Symbol::from("XAUUSD");
        gateway
            .open_position(&open(Side::Short, dec!(2350), Some(dec!(2380)), Some(dec!(2335))))
            .await
            .unwrap();
        gateway.mark_price(&symbol, dec!(2335));
        assert!(gateway.list_open_positions(&symbol).await.unwrap().is_empty());
        assert_eq!(gateway.account().await.unwrap().balance, dec!(10150));
    }
}
