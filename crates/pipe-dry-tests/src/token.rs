// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Minimal fungible token used as a call target in composer tests.
//!
//! Storage layout: balances at `mapping_slot(0, owner)`, allowances at
//! `mapping_slot(mapping_slot(1, owner), spender)`, total supply at slot 2.
//! Minting is unrestricted.

use alloy_primitives::{Address, Bytes, B256, U256};
use pipe_core::abi::{encode_call, selector, word_address, word_bool, word_to_u256, word_u256, Args};
use pipe_core::{mapping_slot, Contract, Frame, Ledger, Revert};

const BALANCES: B256 = B256::ZERO;
const ALLOWANCES: B256 = B256::with_last_byte(1);
const TOTAL_SUPPLY: B256 = B256::with_last_byte(2);

/// The token contract.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockToken;

fn balance_slot(owner: Address) -> B256 {
    mapping_slot(BALANCES, word_address(owner))
}

fn allowance_slot(owner: Address, spender: Address) -> B256 {
    mapping_slot(mapping_slot(ALLOWANCES, word_address(owner)), word_address(spender))
}

fn word(value: U256) -> Bytes {
    word_u256(value).to_vec().into()
}

fn yes() -> Bytes {
    word_bool(true).to_vec().into()
}

impl MockToken {
    /// `mint(address,uint256)` calldata.
    pub fn mint_call(to: Address, amount: U256) -> Bytes {
        encode_call(selector("mint(address,uint256)"), &[word_address(to), word_u256(amount)])
    }

    /// `transfer(address,uint256)` calldata.
    pub fn transfer_call(to: Address, amount: U256) -> Bytes {
        encode_call(selector("transfer(address,uint256)"), &[word_address(to), word_u256(amount)])
    }

    /// `approve(address,uint256)` calldata.
    pub fn approve_call(spender: Address, amount: U256) -> Bytes {
        encode_call(selector("approve(address,uint256)"), &[word_address(spender), word_u256(amount)])
    }

    /// `transferFrom(address,address,uint256)` calldata.
    pub fn transfer_from_call(from: Address, to: Address, amount: U256) -> Bytes {
        encode_call(
            selector("transferFrom(address,address,uint256)"),
            &[word_address(from), word_address(to), word_u256(amount)],
        )
    }

    /// `balanceOf(address)` calldata.
    pub fn balance_of_call(owner: Address) -> Bytes {
        encode_call(selector("balanceOf(address)"), &[word_address(owner)])
    }

    /// Reads `owner`'s balance of the token deployed at `token` directly from storage.
    pub fn balance(ledger: &Ledger, token: Address, owner: Address) -> U256 {
        word_to_u256(&ledger.load(token, balance_slot(owner)))
    }

    /// Reads an allowance directly from storage.
    pub fn allowance(ledger: &Ledger, token: Address, owner: Address, spender: Address) -> U256 {
        word_to_u256(&ledger.load(token, allowance_slot(owner, spender)))
    }

    /// Writes an allowance directly, standing in for an `approve` sent by `owner` itself.
    pub fn seed_allowance(ledger: &mut Ledger, token: Address, owner: Address, spender: Address, amount: U256) {
        ledger.store(token, allowance_slot(owner, spender), word_u256(amount));
    }

    /// Writes a balance directly (does not touch total supply).
    pub fn seed_balance(ledger: &mut Ledger, token: Address, owner: Address, amount: U256) {
        ledger.store(token, balance_slot(owner), word_u256(amount));
    }

    fn read(frame: &Frame<'_>, slot: B256) -> U256 {
        word_to_u256(&frame.load(slot))
    }

    fn move_balance(frame: &mut Frame<'_>, from: Address, to: Address, amount: U256) -> Result<(), Revert> {
        let from_balance = Self::read(frame, balance_slot(from));
        let remaining = from_balance
            .checked_sub(amount)
            .ok_or_else(|| Revert::Reason("ERC20: transfer amount exceeds balance".into()))?;
        frame.store(balance_slot(from), word_u256(remaining));
        let to_balance = Self::read(frame, balance_slot(to));
        frame.store(
            balance_slot(to),
            word_u256(to_balance.checked_add(amount).ok_or(Revert::Overflow)?),
        );
        Ok(())
    }
}

impl Contract for MockToken {
    fn call(&self, frame: &mut Frame<'_>, data: &[u8]) -> Result<Bytes, Revert> {
        let (sel, args) = Args::split(data)?;
        if sel == selector("balanceOf(address)") {
            Ok(word(Self::read(frame, balance_slot(args.address(0)?))))
        } else if sel == selector("totalSupply()") {
            Ok(word(Self::read(frame, TOTAL_SUPPLY)))
        } else if sel == selector("allowance(address,address)") {
            let slot = allowance_slot(args.address(0)?, args.address(1)?);
            Ok(word(Self::read(frame, slot)))
        } else if sel == selector("mint(address,uint256)") {
            let (to, amount) = (args.address(0)?, args.u256(1)?);
            let supply = Self::read(frame, TOTAL_SUPPLY)
                .checked_add(amount)
                .ok_or(Revert::Overflow)?;
            frame.store(TOTAL_SUPPLY, word_u256(supply));
            let balance = Self::read(frame, balance_slot(to));
            frame.store(balance_slot(to), word_u256(balance + amount));
            Ok(yes())
        } else if sel == selector("transfer(address,uint256)") {
            let caller = frame.caller();
            Self::move_balance(frame, caller, args.address(0)?, args.u256(1)?)?;
            Ok(yes())
        } else if sel == selector("approve(address,uint256)") {
            let slot = allowance_slot(frame.caller(), args.address(0)?);
            frame.store(slot, args.word(1)?);
            Ok(yes())
        } else if sel == selector("transferFrom(address,address,uint256)") {
            let (from, to, amount) = (args.address(0)?, args.address(1)?, args.u256(2)?);
            let slot = allowance_slot(from, frame.caller());
            let allowed = Self::read(frame, slot)
                .checked_sub(amount)
                .ok_or_else(|| Revert::Reason("ERC20: insufficient allowance".into()))?;
            frame.store(slot, word_u256(allowed));
            Self::move_balance(frame, from, to, amount)?;
            Ok(yes())
        } else {
            Err(Revert::UnknownSelector(sel))
        }
    }
}
