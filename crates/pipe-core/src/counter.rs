// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-publisher counters.
//!
//! Counters are the rate-limiting primitive for signed blueprints: a blueprint
//! bumps a counter and then checks it against a bound via the junction, so the
//! whole requisition fails once the bound is reached.
use alloy_primitives::{Address, Bytes, B256, U256};
use tracing::debug;

use crate::abi::{word_u256, Args};
use crate::contract::Revert;
use crate::internal::{InternalFn, InternalFrame};
use crate::journal::Journaled;

/// Direction of a counter update. Wire values: `0` increase, `1` decrease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CounterUpdate {
    /// Add to the counter.
    Increase = 0,
    /// Subtract from the counter.
    Decrease = 1,
}

impl TryFrom<U256> for CounterUpdate {
    type Error = Revert;

    fn try_from(value: U256) -> Result<Self, Self::Error> {
        if value == U256::ZERO {
            Ok(Self::Increase)
        } else if value == U256::from(1u8) {
            Ok(Self::Decrease)
        } else {
            Err(Revert::Malformed("counter update mode must be 0 or 1"))
        }
    }
}

/// Journaled `(publisher, counter id) -> U256` map. Missing counters read as zero.
#[derive(Debug, Clone, Default)]
pub struct CounterStore {
    values: Journaled<(Address, B256), U256>,
}

impl CounterStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of `publisher`'s counter `id`.
    pub fn get(&self, publisher: Address, id: B256) -> U256 {
        self.values
            .get(&(publisher, id))
            .copied()
            .unwrap_or(U256::ZERO)
    }

    /// Applies `delta` in direction `mode` and returns the new value.
    ///
    /// # Errors
    /// [`Revert::CounterUnderflow`] if a decrease would go negative,
    /// [`Revert::CounterOverflow`] if an increase would exceed `U256::MAX`.
    /// The counter is unchanged on error.
    pub fn update(
        &mut self,
        publisher: Address,
        id: B256,
        delta: U256,
        mode: CounterUpdate,
    ) -> Result<U256, Revert> {
        let current = self.get(publisher, id);
        let next = match mode {
            CounterUpdate::Increase => current
                .checked_add(delta)
                .ok_or(Revert::CounterOverflow { current, delta })?,
            CounterUpdate::Decrease => current
                .checked_sub(delta)
                .ok_or(Revert::CounterUnderflow { current, delta })?,
        };
        self.values
            .set((publisher, id), (next != U256::ZERO).then_some(next));
        debug!(%publisher, %id, %next, "counter updated");
        Ok(next)
    }

    /// Opens a nested checkpoint.
    pub fn checkpoint(&mut self) {
        self.values.checkpoint();
    }

    /// Keeps every update since the innermost checkpoint.
    pub fn commit(&mut self) {
        self.values.commit();
    }

    /// Discards every update since the innermost checkpoint.
    pub fn revert(&mut self) {
        self.values.revert();
    }

    /// Number of open checkpoints.
    pub fn depth(&self) -> usize {
        self.values.depth()
    }
}

/// Internal functions exposing the counter store to batches.
pub const COUNTER_FUNCTIONS: [(&str, InternalFn); 3] = [
    ("getCounter(address,bytes32)", get_counter),
    ("getPublisherCounter(bytes32)", get_publisher_counter),
    ("updatePublisherCounter(bytes32,uint8,uint256)", update_publisher_counter),
];

fn get_counter(frame: &mut InternalFrame<'_>, data: &[u8]) -> Result<Bytes, Revert> {
    let (_, args) = Args::split(data)?;
    let value = frame.counters().get(args.address(0)?, args.word(1)?);
    Ok(word_u256(value).to_vec().into())
}

fn get_publisher_counter(frame: &mut InternalFrame<'_>, data: &[u8]) -> Result<Bytes, Revert> {
    let (_, args) = Args::split(data)?;
    let account = frame.account();
    let value = frame.counters().get(account, args.word(0)?);
    Ok(word_u256(value).to_vec().into())
}

fn update_publisher_counter(frame: &mut InternalFrame<'_>, data: &[u8]) -> Result<Bytes, Revert> {
    let (_, args) = Args::split(data)?;
    let id = args.word(0)?;
    let mode = CounterUpdate::try_from(args.u256(1)?)?;
    let delta = args.u256(2)?;
    let account = frame.account();
    let value = frame.counters_mut().update(account, id, delta, mode)?;
    Ok(word_u256(value).to_vec().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::{make_address, make_counter_id};

    #[test]
    fn decrease_below_zero_is_rejected_without_change() {
        let (who, id) = (make_address("p"), make_counter_id("c"));
        let mut store = CounterStore::new();
        store.update(who, id, U256::from(2u8), CounterUpdate::Increase).unwrap();
        let err = store.update(who, id, U256::from(3u8), CounterUpdate::Decrease);
        assert_eq!(
            err,
            Err(Revert::CounterUnderflow {
                current: U256::from(2u8),
                delta: U256::from(3u8)
            })
        );
        assert_eq!(store.get(who, id), U256::from(2u8));
    }

    #[test]
    fn increase_past_max_overflows() {
        let (who, id) = (make_address("p"), make_counter_id("c"));
        let mut store = CounterStore::new();
        store.update(who, id, U256::MAX, CounterUpdate::Increase).unwrap();
        assert!(matches!(
            store.update(who, id, U256::from(1u8), CounterUpdate::Increase),
            Err(Revert::CounterOverflow { .. })
        ));
    }

    #[test]
    fn counters_are_scoped_per_publisher() {
        let id = make_counter_id("shared");
        let mut store = CounterStore::new();
        store
            .update(make_address("a"), id, U256::from(1u8), CounterUpdate::Increase)
            .unwrap();
        assert_eq!(store.get(make_address("b"), id), U256::ZERO);
    }

    #[test]
    fn mode_word_must_be_binary() {
        assert!(CounterUpdate::try_from(U256::from(2u8)).is_err());
    }
}
