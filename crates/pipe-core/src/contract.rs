// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! External call targets.
//!
//! A [`Contract`] is any deployed component the composer can dispatch
//! calldata to. Each invocation gets a [`Frame`] exposing the callee's own
//! storage, its caller, the forwarded value, and native balances. Contracts are
//! stateless objects: all persistent state lives in the [`Ledger`] so that the
//! composer's checkpoints cover it.
use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use thiserror::Error;

use crate::abi::Selector;
use crate::ledger::Ledger;

/// Reason a single call reverted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Revert {
    /// A junction `check` evaluated false.
    #[error("Junction: check failed")]
    ThresholdExceeded,
    /// A counter decrease would go below zero.
    #[error("counter underflow: {current} - {delta}")]
    CounterUnderflow {
        /// Value before the update.
        current: U256,
        /// Requested decrease.
        delta: U256,
    },
    /// A counter increase would exceed `U256::MAX`.
    #[error("counter overflow: {current} + {delta}")]
    CounterOverflow {
        /// Value before the update.
        current: U256,
        /// Requested increase.
        delta: U256,
    },
    /// Checked arithmetic overflowed or underflowed.
    #[error("arithmetic overflow")]
    Overflow,
    /// Division or modulo by zero.
    #[error("division by zero")]
    DivisionByZero,
    /// Indexed lookup past the end of a table.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange {
        /// Requested index.
        index: U256,
        /// Table length.
        len: usize,
    },
    /// No function registered for the selector.
    #[error("unknown selector 0x{}", hex::encode(.0))]
    UnknownSelector(Selector),
    /// Calldata did not match the function's expected layout.
    #[error("malformed calldata: {0}")]
    Malformed(&'static str),
    /// A value transfer exceeded the sender's native balance.
    #[error("insufficient value: needed {needed}, available {available}")]
    InsufficientValue {
        /// Amount requested.
        needed: U256,
        /// Amount held.
        available: U256,
    },
    /// Contract-specific revert reason.
    #[error("{0}")]
    Reason(String),
}

/// A deployed call target.
pub trait Contract: Send + Sync {
    /// Executes `data` against this contract.
    ///
    /// Writes made through `frame` are rolled back by the composer if this
    /// returns `Err`, or if a later step of the same batch fails.
    fn call(&self, frame: &mut Frame<'_>, data: &[u8]) -> Result<Bytes, Revert>;
}

/// Execution frame handed to a [`Contract`].
#[derive(Debug)]
pub struct Frame<'a> {
    ledger: &'a mut Ledger,
    address: Address,
    caller: Address,
    value: U256,
}

impl<'a> Frame<'a> {
    /// Builds a frame for `address` invoked by `caller` with `value` attached.
    pub fn new(ledger: &'a mut Ledger, address: Address, caller: Address, value: U256) -> Self {
        Self {
            ledger,
            address,
            caller,
            value,
        }
    }

    /// Address of the executing contract.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Immediate caller (the composer for composed calls).
    pub fn caller(&self) -> Address {
        self.caller
    }

    /// Native value forwarded with this call.
    pub fn value(&self) -> U256 {
        self.value
    }

    /// Reads a slot of the executing contract's storage.
    pub fn load(&self, slot: B256) -> B256 {
        self.ledger.load(self.address, slot)
    }

    /// Writes a slot of the executing contract's storage.
    pub fn store(&mut self, slot: B256, value: B256) {
        self.ledger.store(self.address, slot, value);
    }

    /// Native balance of any account.
    pub fn native_balance(&self, account: Address) -> U256 {
        self.ledger.native_balance(account)
    }

    /// Sends native value from the executing contract.
    pub fn send_native(&mut self, to: Address, amount: U256) -> Result<(), Revert> {
        self.ledger.transfer_native(self.address, to, amount)
    }
}

/// Storage slot for `key` in the mapping rooted at `base`:
/// `keccak256(key || base)`.
pub fn mapping_slot(base: B256, key: B256) -> B256 {
    let mut preimage = [0u8; 64];
    preimage[..32].copy_from_slice(key.as_slice());
    preimage[32..].copy_from_slice(base.as_slice());
    keccak256(preimage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_slots_depend_on_key_and_base() {
        let a = mapping_slot(B256::ZERO, B256::repeat_byte(1));
        let b = mapping_slot(B256::ZERO, B256::repeat_byte(2));
        let c = mapping_slot(B256::repeat_byte(3), B256::repeat_byte(1));
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn check_failure_message_matches_junction_wording() {
        assert_eq!(Revert::ThresholdExceeded.to_string(), "Junction: check failed");
    }
}
