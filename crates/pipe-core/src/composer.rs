// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The call composer: an atomic interpreter over batches of calls.
use std::collections::BTreeMap;
use std::sync::Arc;

use alloy_primitives::{Address, Bytes, U256};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::abi::{selector, Args, Selector};
use crate::call::{Call, Target};
use crate::clipboard::{Clipboard, PasteInstruction, PasteSource};
use crate::config::ComposerConfig;
use crate::context::ExecutionContext;
use crate::contract::{Contract, Frame, Revert};
use crate::counter::COUNTER_FUNCTIONS;
use crate::error::{ExecutionError, StepError};
use crate::internal::{InternalFn, InternalFrame, InternalFunction};
use crate::ledger::Ledger;
use crate::return_buffer::ReturnBuffer;

/// Errors raised while configuring a composer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposerError {
    /// A contract is already deployed at the address.
    #[error("contract already deployed at {0}")]
    DuplicateContract(Address),
    /// The address belongs to the composer itself.
    #[error("address {0} is reserved for the composer")]
    ReservedAddress(Address),
    /// Another internal function already uses the selector.
    #[error("selector 0x{} already registered by {existing}", hex::encode(.selector))]
    DuplicateSelector {
        /// Colliding selector.
        selector: Selector,
        /// Signature registered first.
        existing: &'static str,
    },
}

/// Executes batches of [`Call`]s atomically against its [`Ledger`].
///
/// Each batch runs under a checkpoint of both the ledger and the context's
/// counter store: either every step succeeds and all effects are kept, or the
/// first failure discards all of them and is reported with its step index.
pub struct Composer {
    address: Address,
    config: ComposerConfig,
    ledger: Ledger,
    contracts: BTreeMap<Address, Arc<dyn Contract>>,
    internals: BTreeMap<Selector, InternalFunction>,
}

impl core::fmt::Debug for Composer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Composer")
            .field("address", &self.address)
            .field("config", &self.config)
            .field("contracts", &self.contracts.keys().collect::<Vec<_>>())
            .field("internals", &self.internals.values().map(|f| f.signature).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Composer {
    /// Creates a composer at `address` with default limits and the counter
    /// functions registered.
    pub fn new(address: Address) -> Self {
        Self::with_config(address, ComposerConfig::default())
    }

    /// Creates a composer with explicit limits.
    pub fn with_config(address: Address, config: ComposerConfig) -> Self {
        let mut internals = BTreeMap::new();
        for (signature, handler) in COUNTER_FUNCTIONS {
            let selector = selector(signature);
            internals.insert(
                selector,
                InternalFunction {
                    signature,
                    selector,
                    handler,
                },
            );
        }
        Self {
            address,
            config,
            ledger: Ledger::new(),
            contracts: BTreeMap::new(),
            internals,
        }
    }

    /// Address used as the caller of every external call.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Active limits.
    pub fn config(&self) -> ComposerConfig {
        self.config
    }

    /// Replaces the active limits.
    pub fn set_config(&mut self, config: ComposerConfig) {
        self.config = config;
    }

    /// World state.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Mutable world state, for genesis setup.
    pub fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    /// Deploys `contract` at `at`.
    ///
    /// # Errors
    /// The address is the composer's own or already occupied.
    pub fn deploy<C: Contract + 'static>(&mut self, at: Address, contract: C) -> Result<(), ComposerError> {
        if at == self.address {
            return Err(ComposerError::ReservedAddress(at));
        }
        if self.contracts.contains_key(&at) {
            return Err(ComposerError::DuplicateContract(at));
        }
        self.contracts.insert(at, Arc::new(contract));
        Ok(())
    }

    /// Whether a contract is deployed at `at`.
    pub fn is_deployed(&self, at: Address) -> bool {
        self.contracts.contains_key(&at)
    }

    /// Registers an internal function under the selector of `signature`.
    ///
    /// # Errors
    /// [`ComposerError::DuplicateSelector`] if the selector is taken.
    pub fn register_internal(
        &mut self,
        signature: &'static str,
        handler: InternalFn,
    ) -> Result<Selector, ComposerError> {
        let selector = selector(signature);
        if let Some(existing) = self.internals.get(&selector) {
            return Err(ComposerError::DuplicateSelector {
                selector,
                existing: existing.signature,
            });
        }
        self.internals.insert(
            selector,
            InternalFunction {
                signature,
                selector,
                handler,
            },
        );
        Ok(selector)
    }

    /// Executes `batch` atomically on behalf of `caller`.
    ///
    /// Returns the raw return bytes of every call, in order.
    ///
    /// # Errors
    /// The first failing step, tagged with its index, after rolling back
    /// every effect of the batch.
    pub fn apply(
        &mut self,
        caller: Address,
        batch: &[Call],
        ctx: &mut ExecutionContext<'_>,
    ) -> Result<Vec<Bytes>, ExecutionError> {
        self.apply_funded(caller, batch, ctx, U256::ZERO)
    }

    /// Like [`Composer::apply`], first moving `value` of native balance from
    /// `caller` to the composer inside the same atomic unit.
    #[instrument(level = "debug", skip(self, batch, ctx), fields(calls = batch.len()))]
    pub(crate) fn apply_funded(
        &mut self,
        caller: Address,
        batch: &[Call],
        ctx: &mut ExecutionContext<'_>,
        value: U256,
    ) -> Result<Vec<Bytes>, ExecutionError> {
        self.check_batch(batch)?;
        self.ledger.checkpoint();
        ctx.counters.checkpoint();
        let result = self.fund_and_run(caller, batch, ctx, value);
        match &result {
            Ok(_) => {
                self.ledger.commit();
                ctx.counters.commit();
            }
            Err(err) => {
                self.ledger.revert();
                ctx.counters.revert();
                warn!(%caller, error = %err, "batch aborted");
            }
        }
        result
    }

    /// Executes one call and discards all of its effects.
    ///
    /// # Errors
    /// Same as a single-step [`Composer::apply`]; state is rolled back either way.
    pub fn read(
        &mut self,
        caller: Address,
        call: &Call,
        ctx: &mut ExecutionContext<'_>,
    ) -> Result<Bytes, ExecutionError> {
        let mut returns = self.read_batch(caller, core::slice::from_ref(call), ctx)?;
        Ok(returns.pop().unwrap_or_default())
    }

    /// Executes a whole batch and discards all of its effects.
    ///
    /// # Errors
    /// Same as [`Composer::apply`]; state is rolled back either way.
    #[instrument(level = "debug", skip(self, batch, ctx), fields(calls = batch.len()))]
    pub fn read_batch(
        &mut self,
        caller: Address,
        batch: &[Call],
        ctx: &mut ExecutionContext<'_>,
    ) -> Result<Vec<Bytes>, ExecutionError> {
        self.check_batch(batch)?;
        self.ledger.checkpoint();
        ctx.counters.checkpoint();
        let result = self.run(caller, batch, ctx);
        self.ledger.revert();
        ctx.counters.revert();
        result
    }

    /// Checks `batch` against the active limits without running it: the call
    /// count, then every clipboard for decodability and paste count.
    ///
    /// # Errors
    /// [`ExecutionError::BatchTooLarge`], or a step-tagged clipboard or
    /// paste-limit failure.
    pub fn preflight(&self, batch: &[Call]) -> Result<(), ExecutionError> {
        self.check_batch(batch)?;
        for (index, call) in batch.iter().enumerate() {
            self.checked_clipboard(call)
                .map_err(|source| ExecutionError::Step { index, source })?;
        }
        Ok(())
    }

    fn check_batch(&self, batch: &[Call]) -> Result<(), ExecutionError> {
        if batch.len() > self.config.max_calls {
            return Err(ExecutionError::BatchTooLarge {
                calls: batch.len(),
                max: self.config.max_calls,
            });
        }
        Ok(())
    }

    fn fund_and_run(
        &mut self,
        caller: Address,
        batch: &[Call],
        ctx: &mut ExecutionContext<'_>,
        value: U256,
    ) -> Result<Vec<Bytes>, ExecutionError> {
        self.ledger
            .transfer_native(caller, self.address, value)
            .map_err(ExecutionError::Payment)?;
        self.run(caller, batch, ctx)
    }

    fn run(
        &mut self,
        caller: Address,
        batch: &[Call],
        ctx: &mut ExecutionContext<'_>,
    ) -> Result<Vec<Bytes>, ExecutionError> {
        let mut returns = ReturnBuffer::with_capacity(batch.len());
        for (index, call) in batch.iter().enumerate() {
            let output = self
                .step(caller, call, &returns, ctx)
                .map_err(|source| ExecutionError::Step { index, source })?;
            debug!(index, bytes = output.len(), "step returned");
            returns.push(output);
        }
        Ok(returns.into_vec())
    }

    fn step(
        &mut self,
        caller: Address,
        call: &Call,
        returns: &ReturnBuffer,
        ctx: &mut ExecutionContext<'_>,
    ) -> Result<Bytes, StepError> {
        let clipboard = self.checked_clipboard(call)?;
        let pastes = clipboard.pastes();
        let data = resolve_pastes(&call.data, pastes, returns, ctx)?;
        let value = clipboard.attached_value().unwrap_or(U256::ZERO);

        match call.target {
            Target::External(target) => {
                debug!(%target, "external call");
                dispatch_external(&mut self.ledger, &self.contracts, self.address, target, &data, value)
            }
            Target::Static(target) => {
                debug!(%target, "static call");
                self.ledger.checkpoint();
                let result =
                    dispatch_external(&mut self.ledger, &self.contracts, self.address, target, &data, value);
                self.ledger.revert();
                result
            }
            Target::Internal => self.dispatch_internal(caller, &data, value, ctx),
        }
    }

    fn checked_clipboard(&self, call: &Call) -> Result<Clipboard, StepError> {
        let clipboard = Clipboard::decode(&call.clipboard)?;
        let count = clipboard.pastes().len();
        if count > self.config.max_pastes_per_call {
            return Err(StepError::TooManyPastes {
                count,
                max: self.config.max_pastes_per_call,
            });
        }
        Ok(clipboard)
    }

    fn dispatch_internal(
        &mut self,
        caller: Address,
        data: &[u8],
        value: U256,
        ctx: &mut ExecutionContext<'_>,
    ) -> Result<Bytes, StepError> {
        let (selector, _) = Args::split(data)?;
        let function = self
            .internals
            .get(&selector)
            .ok_or(Revert::UnknownSelector(selector))?;
        debug!(function = function.signature, "internal call");
        let mut frame = InternalFrame {
            host: self.address,
            caller,
            publisher: ctx.publisher,
            operator: ctx.operator,
            value,
            ledger: &mut self.ledger,
            contracts: &self.contracts,
            counters: &mut *ctx.counters,
        };
        (function.handler)(&mut frame, data).map_err(StepError::from)
    }
}

/// Calls `target` with `caller` as the immediate caller, moving `value` from
/// `caller` first. The call runs under its own checkpoint.
pub(crate) fn dispatch_external(
    ledger: &mut Ledger,
    contracts: &BTreeMap<Address, Arc<dyn Contract>>,
    caller: Address,
    target: Address,
    data: &[u8],
    value: U256,
) -> Result<Bytes, StepError> {
    let contract = contracts
        .get(&target)
        .ok_or(StepError::UnknownTarget(target))?;
    ledger.checkpoint();
    let result = match ledger.transfer_native(caller, target, value) {
        Ok(()) => {
            let mut frame = Frame::new(ledger, target, caller, value);
            contract.call(&mut frame, data)
        }
        Err(revert) => Err(revert),
    };
    if result.is_ok() {
        ledger.commit();
    } else {
        ledger.revert();
    }
    result.map_err(StepError::from)
}

/// Copies every paste into a fresh copy of `template`.
fn resolve_pastes(
    template: &[u8],
    pastes: &[PasteInstruction],
    returns: &ReturnBuffer,
    ctx: &ExecutionContext<'_>,
) -> Result<Vec<u8>, StepError> {
    let mut data = template.to_vec();
    let publisher_word = ctx.publisher.map(|p| p.into_word());
    for paste in pastes {
        let length = paste.length() as usize;
        let from = paste.source_offset() as usize;
        let (bytes, available) = match paste.source() {
            PasteSource::Return(index) => (
                returns.slice(index, from, length),
                returns.get(index).map_or(0, |entry| entry.len()),
            ),
            PasteSource::Publisher => {
                let word = publisher_word.as_ref().map_or(&[][..], |w| w.as_slice());
                (window(word, from, length), word.len())
            }
            PasteSource::Operator => (
                window(&ctx.operator_data, from, length),
                ctx.operator_data.len(),
            ),
        };
        let bytes = bytes.ok_or(StepError::CopyOutOfBounds {
            from: paste.source(),
            offset: paste.source_offset(),
            length: paste.length(),
            available,
        })?;
        let calldata_len = data.len();
        let slot = window_mut(&mut data, paste.dest_offset() as usize, length).ok_or(
            StepError::PasteOutOfBounds {
                offset: paste.dest_offset(),
                length: paste.length(),
                calldata_len,
            },
        )?;
        slot.copy_from_slice(bytes);
    }
    Ok(data)
}

fn window(bytes: &[u8], from: usize, length: usize) -> Option<&[u8]> {
    bytes.get(from..from.checked_add(length)?)
}

fn window_mut(bytes: &mut [u8], from: usize, length: usize) -> Option<&mut [u8]> {
    bytes.get_mut(from..from.checked_add(length)?)
}
