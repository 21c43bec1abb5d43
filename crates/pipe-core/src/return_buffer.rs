// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-batch record of return data.
use alloy_primitives::Bytes;

/// Return bytes of every successfully executed call in a batch, in order.
///
/// Entry `i` exists only once call `i` has returned, so a paste reading
/// `Return(j)` while executing call `i` is causal exactly when `j < len()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReturnBuffer {
    entries: Vec<Bytes>,
}

impl ReturnBuffer {
    /// Creates an empty buffer sized for `calls` entries.
    pub fn with_capacity(calls: usize) -> Self {
        Self {
            entries: Vec::with_capacity(calls),
        }
    }

    /// Records the return data of the next call.
    pub fn push(&mut self, data: Bytes) {
        self.entries.push(data);
    }

    /// Return data of call `index`, if it has executed.
    pub fn get(&self, index: u64) -> Option<&Bytes> {
        usize::try_from(index).ok().and_then(|i| self.entries.get(i))
    }

    /// Borrows `length` bytes at `offset` from entry `index`.
    pub fn slice(&self, index: u64, offset: usize, length: usize) -> Option<&[u8]> {
        let entry = self.get(index)?;
        entry.get(offset..offset.checked_add(length)?)
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` before the first call returns.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consumes the buffer, yielding the entries in call order.
    pub fn into_vec(self) -> Vec<Bytes> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_are_bounds_checked() {
        let mut buffer = ReturnBuffer::default();
        buffer.push(Bytes::from_static(&[1, 2, 3, 4]));
        assert_eq!(buffer.slice(0, 1, 2), Some(&[2u8, 3][..]));
        assert_eq!(buffer.slice(0, 3, 2), None);
        assert_eq!(buffer.slice(1, 0, 1), None);
        assert_eq!(buffer.slice(0, usize::MAX, 2), None);
    }
}
