// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! World state seen by composed calls: per-contract word storage plus native
//! balances, both journaled so a failed batch can be rolled back wholesale.
use alloy_primitives::{Address, B256, U256};
use blake3::Hasher;

use crate::contract::Revert;
use crate::domain::LEDGER_STATE_V1;
use crate::ident::Hash;
use crate::journal::Journaled;

/// Journaled storage and native balances.
///
/// Zero words and zero balances are never stored, so two ledgers with the same
/// observable contents always produce the same [`Ledger::state_digest`].
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    storage: Journaled<(Address, B256), B256>,
    balances: Journaled<Address, U256>,
}

impl Ledger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `slot` of `owner`'s storage (zero when unset).
    pub fn load(&self, owner: Address, slot: B256) -> B256 {
        self.storage
            .get(&(owner, slot))
            .copied()
            .unwrap_or(B256::ZERO)
    }

    /// Writes `slot` of `owner`'s storage.
    pub fn store(&mut self, owner: Address, slot: B256, value: B256) {
        let value = (value != B256::ZERO).then_some(value);
        self.storage.set((owner, slot), value);
    }

    /// Native balance of `account`.
    pub fn native_balance(&self, account: Address) -> U256 {
        self.balances.get(&account).copied().unwrap_or(U256::ZERO)
    }

    /// Overwrites the native balance of `account`. Used for genesis funding.
    pub fn set_native_balance(&mut self, account: Address, amount: U256) {
        let amount = (amount != U256::ZERO).then_some(amount);
        self.balances.set(account, amount);
    }

    /// Moves `amount` of native value from `from` to `to`.
    ///
    /// # Errors
    /// [`Revert::InsufficientValue`] when `from` holds less than `amount`.
    pub fn transfer_native(&mut self, from: Address, to: Address, amount: U256) -> Result<(), Revert> {
        if amount == U256::ZERO || from == to {
            return Ok(());
        }
        let available = self.native_balance(from);
        let remaining = available
            .checked_sub(amount)
            .ok_or(Revert::InsufficientValue {
                needed: amount,
                available,
            })?;
        let credited = self
            .native_balance(to)
            .checked_add(amount)
            .ok_or(Revert::Overflow)?;
        self.set_native_balance(from, remaining);
        self.set_native_balance(to, credited);
        Ok(())
    }

    /// Opens a nested checkpoint.
    pub fn checkpoint(&mut self) {
        self.storage.checkpoint();
        self.balances.checkpoint();
    }

    /// Keeps every write since the innermost checkpoint.
    pub fn commit(&mut self) {
        self.storage.commit();
        self.balances.commit();
    }

    /// Discards every write since the innermost checkpoint.
    pub fn revert(&mut self) {
        self.storage.revert();
        self.balances.revert();
    }

    /// Number of open checkpoints.
    pub fn depth(&self) -> usize {
        self.storage.depth()
    }

    /// Canonical digest of the full ledger contents.
    ///
    /// Layout: domain prefix, then storage entries in `(owner, slot)` order as
    /// `owner || slot || value`, then balance entries in address order as
    /// `account || amount_be32`. Each section is prefixed with its entry count
    /// as u64 little-endian.
    pub fn state_digest(&self) -> Hash {
        let mut hasher = Hasher::new();
        hasher.update(LEDGER_STATE_V1);
        hasher.update(&(self.storage.len() as u64).to_le_bytes());
        for ((owner, slot), value) in self.storage.iter() {
            hasher.update(owner.as_slice());
            hasher.update(slot.as_slice());
            hasher.update(value.as_slice());
        }
        hasher.update(&(self.balances.len() as u64).to_le_bytes());
        for (account, amount) in self.balances.iter() {
            hasher.update(account.as_slice());
            hasher.update(&amount.to_be_bytes::<32>());
        }
        hasher.finalize().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::make_address;

    #[test]
    fn zero_writes_do_not_change_digest() {
        let mut ledger = Ledger::new();
        let before = ledger.state_digest();
        ledger.store(make_address("a"), B256::repeat_byte(1), B256::ZERO);
        ledger.set_native_balance(make_address("a"), U256::ZERO);
        assert_eq!(before, ledger.state_digest());
    }

    #[test]
    fn transfer_checks_balance() {
        let (alice, bob) = (make_address("alice"), make_address("bob"));
        let mut ledger = Ledger::new();
        ledger.set_native_balance(alice, U256::from(5u8));
        let err = ledger.transfer_native(alice, bob, U256::from(6u8));
        assert!(matches!(err, Err(Revert::InsufficientValue { .. })));
        ledger.transfer_native(alice, bob, U256::from(5u8)).unwrap();
        assert_eq!(ledger.native_balance(alice), U256::ZERO);
        assert_eq!(ledger.native_balance(bob), U256::from(5u8));
    }

    #[test]
    fn revert_restores_storage_and_balances() {
        let owner = make_address("owner");
        let mut ledger = Ledger::new();
        ledger.store(owner, B256::ZERO, B256::repeat_byte(9));
        let digest = ledger.state_digest();
        ledger.checkpoint();
        ledger.store(owner, B256::ZERO, B256::repeat_byte(1));
        ledger.set_native_balance(owner, U256::from(1u8));
        ledger.revert();
        assert_eq!(ledger.state_digest(), digest);
    }
}
