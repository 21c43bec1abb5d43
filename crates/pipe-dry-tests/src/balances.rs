// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Internal balances held in the composer's own storage.
//!
//! These are registered as internal functions, so they act for the active
//! publisher during requisition execution and for the caller otherwise. They
//! give operator-tip blueprints something to pay with.

use alloy_primitives::{Address, Bytes, B256, U256};
use pipe_core::abi::{encode_call, selector, word_address, word_to_u256, word_u256, Args};
use pipe_core::{mapping_slot, Composer, ComposerError, InternalFrame, Ledger, Revert};

const INTERNAL_BALANCES: B256 = B256::with_last_byte(0x1b);

fn slot(account: Address) -> B256 {
    mapping_slot(INTERNAL_BALANCES, word_address(account))
}

/// Registers `getInternalBalance(address)` and `transferInternal(address,uint256)`.
pub fn register_internal_balances(composer: &mut Composer) -> Result<(), ComposerError> {
    composer.register_internal("getInternalBalance(address)", get_internal_balance)?;
    composer.register_internal("transferInternal(address,uint256)", transfer_internal)?;
    Ok(())
}

/// `transferInternal(address,uint256)` calldata.
pub fn transfer_internal_call(to: Address, amount: U256) -> Bytes {
    encode_call(
        selector("transferInternal(address,uint256)"),
        &[word_address(to), word_u256(amount)],
    )
}

/// `getInternalBalance(address)` calldata.
pub fn get_internal_balance_call(account: Address) -> Bytes {
    encode_call(selector("getInternalBalance(address)"), &[word_address(account)])
}

/// Adds `amount` to `account`'s internal balance on the composer at `host`.
pub fn credit_internal(ledger: &mut Ledger, host: Address, account: Address, amount: U256) {
    let current = internal_balance(ledger, host, account);
    ledger.store(host, slot(account), word_u256(current.saturating_add(amount)));
}

/// Reads `account`'s internal balance on the composer at `host`.
pub fn internal_balance(ledger: &Ledger, host: Address, account: Address) -> U256 {
    word_to_u256(&ledger.load(host, slot(account)))
}

fn get_internal_balance(frame: &mut InternalFrame<'_>, data: &[u8]) -> Result<Bytes, Revert> {
    let (_, args) = Args::split(data)?;
    Ok(frame.load(slot(args.address(0)?)).to_vec().into())
}

fn transfer_internal(frame: &mut InternalFrame<'_>, data: &[u8]) -> Result<Bytes, Revert> {
    let (_, args) = Args::split(data)?;
    let (to, amount) = (args.address(0)?, args.u256(1)?);
    let from = frame.account();
    let remaining = word_to_u256(&frame.load(slot(from)))
        .checked_sub(amount)
        .ok_or_else(|| Revert::Reason("internal balance too low".into()))?;
    frame.store(slot(from), word_u256(remaining));
    let credited = word_to_u256(&frame.load(slot(to)))
        .checked_add(amount)
        .ok_or(Revert::Overflow)?;
    frame.store(slot(to), word_u256(credited));
    Ok(Bytes::new())
}
