// In crates/engine/src/reconciler.rs

//! Maps the closed-bar signal and the broker's open positions to the
//! actions needed to follow it.
//!
//! The reconciler is level-triggered: it looks only at the current signal
//! and the current positions, so an action that failed on one cycle is
//! simply decided again on the next.

use core_types::{Position, Side, Signal, TradeDirection};

/// What the broker currently holds for one symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exposure {
    Flat,
    Long,
    Short,
    /// Positions on both sides at once.
    Conflicted,
}

impl Exposure {
    pub fn of(positions: &[Position]) -> Self {
        let long = positions.iter().any(|p| p.side == Side::Long);
        let short = positions.iter().any(|p| p.side == Side::Short);
        match (long, short) {
            (false, false) => Exposure::Flat,
            (true, false) => Exposure::Long,
            (false, true) => Exposure::Short,
            (true, true) => Exposure::Conflicted,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Open(Side),
    Close(Position),
}

/// The actions decided for one cycle. Never holds both a close and an open.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan {
    pub actions: Vec<Action>,
    /// Set when positions were found on both sides of the symbol.
    pub conflict: bool,
}

/// The position side a signal asks for.
fn wanted_side(signal: Signal) -> Option<Side> {
    match signal {
        Signal::Buy => Some(Side::Long),
        Signal::Sell => Some(Side::Short),
        Signal::None => None,
    }
}

/// Decides what to do about `signal` given the open `positions`.
///
/// * Flat: open on the signal's side if `filter` allows it.
/// * Holding the opposite side: close every opposing position, one action
///   each, and open nothing this cycle.
/// * Already aligned, or no signal: nothing.
///
/// The filter restricts entries only. Exits always follow the signal.
pub fn reconcile(signal: Signal, positions: &[Position], filter: TradeDirection) -> Plan {
    let exposure = Exposure::of(positions);
    let conflict = exposure == Exposure::Conflicted;

    let Some(side) = wanted_side(signal) else {
        return Plan { actions: Vec::new(), conflict };
    };

    let actions = match exposure {
        Exposure::Flat if filter.allows(side) => vec![Action::Open(side)],
        Exposure::Flat => Vec::new(),
        _ => positions
            .iter()
            .filter(|p| p.side == side.opposite())
            .cloned()
            .map(Action::Close)
            .collect(),
    };

    Plan { actions, conflict }
}
