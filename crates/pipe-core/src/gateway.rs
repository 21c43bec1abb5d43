// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Convenience entry points layered on [`Composer::apply`].
//!
//! These mirror the classic pipeline surface: single pipes, parallel-array
//! multi pipes, value-carrying pipes, the full clipboard-aware advanced pipe,
//! and a read-only batch. None of them run with a publisher or operator.
use alloy_primitives::{Address, Bytes, U256};

use crate::call::Call;
use crate::clipboard::Clipboard;
use crate::composer::Composer;
use crate::context::ExecutionContext;
use crate::counter::CounterStore;
use crate::error::ExecutionError;

impl Composer {
    /// Calls `target` once and returns its return data.
    pub fn pipe(
        &mut self,
        caller: Address,
        target: Address,
        data: Bytes,
        counters: &mut CounterStore,
    ) -> Result<Bytes, ExecutionError> {
        let call = Call::external(target, data);
        let mut returns = self.apply(caller, &[call], &mut ExecutionContext::direct(counters))?;
        Ok(returns.pop().unwrap_or_default())
    }

    /// Calls `targets[i]` with `data[i]` for every `i`, atomically.
    ///
    /// # Errors
    /// [`ExecutionError::LengthMismatch`] if the arrays differ in length.
    pub fn multi_pipe(
        &mut self,
        caller: Address,
        targets: &[Address],
        data: &[Bytes],
        counters: &mut CounterStore,
    ) -> Result<Vec<Bytes>, ExecutionError> {
        if targets.len() != data.len() {
            return Err(ExecutionError::LengthMismatch {
                targets: targets.len(),
                data: data.len(),
            });
        }
        let batch: Vec<Call> = targets
            .iter()
            .zip(data)
            .map(|(target, data)| Call::external(*target, data.clone()))
            .collect();
        self.apply(caller, &batch, &mut ExecutionContext::direct(counters))
    }

    /// Moves `value` from `caller` to the composer and forwards it to `target`.
    pub fn ether_pipe(
        &mut self,
        caller: Address,
        target: Address,
        data: Bytes,
        value: U256,
        counters: &mut CounterStore,
    ) -> Result<Bytes, ExecutionError> {
        let call = Call::external(target, data).with_clipboard(&Clipboard::value(value));
        let mut returns =
            self.apply_funded(caller, &[call], &mut ExecutionContext::direct(counters), value)?;
        Ok(returns.pop().unwrap_or_default())
    }

    /// Moves `value` from `caller` to the composer, then runs `calls` with
    /// full clipboard support. Value not forwarded by any clipboard stays with
    /// the composer.
    pub fn advanced_pipe(
        &mut self,
        caller: Address,
        calls: &[Call],
        value: U256,
        counters: &mut CounterStore,
    ) -> Result<Vec<Bytes>, ExecutionError> {
        self.apply_funded(caller, calls, &mut ExecutionContext::direct(counters), value)
    }

    /// Runs `calls` and discards every effect.
    pub fn read_pipe(
        &mut self,
        caller: Address,
        calls: &[Call],
        counters: &mut CounterStore,
    ) -> Result<Vec<Bytes>, ExecutionError> {
        self.read_batch(caller, calls, &mut ExecutionContext::direct(counters))
    }
}
