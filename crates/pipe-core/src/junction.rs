// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Junction: stateless arithmetic, comparison, and assertion helpers.
//!
//! Deployed as an ordinary contract so blueprints can combine return values
//! (via pastes) and abort on conditions. Every function takes and returns ABI
//! words; arithmetic is checked and reverts instead of wrapping.
use std::collections::BTreeMap;
use std::sync::OnceLock;

use alloy_primitives::{Bytes, U256, U512};

use crate::abi::{selector, word_bool, word_u256, Args, Selector};
use crate::contract::{Contract, Frame, Revert};

type OpFn = fn(&Args<'_>) -> Result<Bytes, Revert>;

struct JunctionOp {
    signature: &'static str,
    handler: OpFn,
}

static OPS: &[JunctionOp] = &[
    JunctionOp { signature: "add(uint256,uint256)", handler: add },
    JunctionOp { signature: "sub(uint256,uint256)", handler: sub },
    JunctionOp { signature: "mul(uint256,uint256)", handler: mul },
    JunctionOp { signature: "div(uint256,uint256)", handler: div },
    JunctionOp { signature: "mod(uint256,uint256)", handler: rem },
    JunctionOp { signature: "mulDiv(uint256,uint256,uint256)", handler: mul_div_op },
    JunctionOp { signature: "mulDivUp(uint256,uint256,uint256)", handler: mul_div_up_op },
    JunctionOp { signature: "eq(uint256,uint256)", handler: eq },
    JunctionOp { signature: "gt(uint256,uint256)", handler: gt },
    JunctionOp { signature: "gte(uint256,uint256)", handler: gte },
    JunctionOp { signature: "lt(uint256,uint256)", handler: lt },
    JunctionOp { signature: "lte(uint256,uint256)", handler: lte },
    JunctionOp { signature: "check(bool)", handler: check },
    JunctionOp { signature: "check(bool,bool)", handler: check_inverted },
    JunctionOp { signature: "bytes32Switch(uint256,bytes32[])", handler: bytes32_switch },
];

fn table() -> &'static BTreeMap<Selector, &'static JunctionOp> {
    static TABLE: OnceLock<BTreeMap<Selector, &'static JunctionOp>> = OnceLock::new();
    TABLE.get_or_init(|| OPS.iter().map(|op| (selector(op.signature), op)).collect())
}

/// The junction contract.
#[derive(Debug, Clone, Copy, Default)]
pub struct Junction;

impl Junction {
    /// Signatures of every junction function.
    pub fn signatures() -> impl Iterator<Item = &'static str> {
        OPS.iter().map(|op| op.signature)
    }
}

impl Contract for Junction {
    fn call(&self, _frame: &mut Frame<'_>, data: &[u8]) -> Result<Bytes, Revert> {
        let (selector, args) = Args::split(data)?;
        let op = table()
            .get(&selector)
            .ok_or(Revert::UnknownSelector(selector))?;
        (op.handler)(&args)
    }
}

fn word(value: U256) -> Bytes {
    word_u256(value).to_vec().into()
}

fn flag(value: bool) -> Bytes {
    word_bool(value).to_vec().into()
}

fn pair(args: &Args<'_>) -> Result<(U256, U256), Revert> {
    Ok((args.u256(0)?, args.u256(1)?))
}

fn add(args: &Args<'_>) -> Result<Bytes, Revert> {
    let (a, b) = pair(args)?;
    a.checked_add(b).map(word).ok_or(Revert::Overflow)
}

fn sub(args: &Args<'_>) -> Result<Bytes, Revert> {
    let (a, b) = pair(args)?;
    a.checked_sub(b).map(word).ok_or(Revert::Overflow)
}

fn mul(args: &Args<'_>) -> Result<Bytes, Revert> {
    let (a, b) = pair(args)?;
    a.checked_mul(b).map(word).ok_or(Revert::Overflow)
}

fn div(args: &Args<'_>) -> Result<Bytes, Revert> {
    let (a, b) = pair(args)?;
    a.checked_div(b).map(word).ok_or(Revert::DivisionByZero)
}

fn rem(args: &Args<'_>) -> Result<Bytes, Revert> {
    let (a, b) = pair(args)?;
    a.checked_rem(b).map(word).ok_or(Revert::DivisionByZero)
}

fn mul_div_op(args: &Args<'_>) -> Result<Bytes, Revert> {
    mul_div(args.u256(0)?, args.u256(1)?, args.u256(2)?).map(word)
}

fn mul_div_up_op(args: &Args<'_>) -> Result<Bytes, Revert> {
    mul_div_up(args.u256(0)?, args.u256(1)?, args.u256(2)?).map(word)
}

fn eq(args: &Args<'_>) -> Result<Bytes, Revert> {
    pair(args).map(|(a, b)| flag(a == b))
}

fn gt(args: &Args<'_>) -> Result<Bytes, Revert> {
    pair(args).map(|(a, b)| flag(a > b))
}

fn gte(args: &Args<'_>) -> Result<Bytes, Revert> {
    pair(args).map(|(a, b)| flag(a >= b))
}

fn lt(args: &Args<'_>) -> Result<Bytes, Revert> {
    pair(args).map(|(a, b)| flag(a < b))
}

fn lte(args: &Args<'_>) -> Result<Bytes, Revert> {
    pair(args).map(|(a, b)| flag(a <= b))
}

fn check(args: &Args<'_>) -> Result<Bytes, Revert> {
    if args.bool(0)? {
        Ok(Bytes::new())
    } else {
        Err(Revert::ThresholdExceeded)
    }
}

// Passes when the condition differs from `invert`.
fn check_inverted(args: &Args<'_>) -> Result<Bytes, Revert> {
    if args.bool(0)? == args.bool(1)? {
        Err(Revert::ThresholdExceeded)
    } else {
        Ok(Bytes::new())
    }
}

fn bytes32_switch(args: &Args<'_>) -> Result<Bytes, Revert> {
    let index = args.u256(0)?;
    let table = args.word_array(1)?;
    crate::abi::u256_to_usize(index)
        .and_then(|i| table.get(i))
        .map(|w| Bytes::from(w.to_vec()))
        .ok_or(Revert::IndexOutOfRange {
            index,
            len: table.len(),
        })
}

fn widen(value: U256) -> U512 {
    let l = value.as_limbs();
    U512::from_limbs([l[0], l[1], l[2], l[3], 0, 0, 0, 0])
}

fn narrow(value: U512) -> Option<U256> {
    let l = value.as_limbs();
    if l[4..].iter().any(|limb| *limb != 0) {
        return None;
    }
    Some(U256::from_limbs([l[0], l[1], l[2], l[3]]))
}

/// `floor(a * b / denominator)` with a 512-bit intermediate product.
///
/// # Errors
/// [`Revert::DivisionByZero`] for a zero denominator, [`Revert::Overflow`]
/// when the quotient does not fit 256 bits.
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Result<U256, Revert> {
    if denominator == U256::ZERO {
        return Err(Revert::DivisionByZero);
    }
    narrow(widen(a) * widen(b) / widen(denominator)).ok_or(Revert::Overflow)
}

/// `ceil(a * b / denominator)` with a 512-bit intermediate product.
///
/// # Errors
/// As [`mul_div`].
pub fn mul_div_up(a: U256, b: U256, denominator: U256) -> Result<U256, Revert> {
    if denominator == U256::ZERO {
        return Err(Revert::DivisionByZero);
    }
    let product = widen(a) * widen(b);
    let denominator = widen(denominator);
    let mut quotient = product / denominator;
    if product % denominator != U512::ZERO {
        quotient += U512::from(1u8);
    }
    narrow(quotient).ok_or(Revert::Overflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selectors_are_unique() {
        assert_eq!(table().len(), OPS.len());
    }

    #[test]
    fn mul_div_uses_wide_intermediate() {
        let half = U256::MAX / U256::from(2u8);
        assert_eq!(mul_div(half, U256::from(4u8), U256::from(4u8)), Ok(half));
        assert_eq!(
            mul_div(U256::MAX, U256::from(2u8), U256::from(1u8)),
            Err(Revert::Overflow)
        );
    }

    #[test]
    fn mul_div_up_rounds_toward_infinity() {
        let (seven, two) = (U256::from(7u8), U256::from(2u8));
        assert_eq!(mul_div(seven, U256::from(1u8), two), Ok(U256::from(3u8)));
        assert_eq!(mul_div_up(seven, U256::from(1u8), two), Ok(U256::from(4u8)));
        assert_eq!(mul_div_up(U256::from(6u8), U256::from(1u8), two), Ok(U256::from(3u8)));
    }

    #[test]
    fn zero_denominator_reverts() {
        assert_eq!(
            mul_div_up(U256::from(1u8), U256::from(1u8), U256::ZERO),
            Err(Revert::DivisionByZero)
        );
    }
}
