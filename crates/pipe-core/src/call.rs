// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Batch entries.
use alloy_primitives::{Address, Bytes};

use crate::clipboard::Clipboard;

/// Where a call is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Target {
    /// A deployed contract, called with the composer as its caller.
    External(Address),
    /// A function registered on the composer itself, dispatched by selector
    /// and acting for the publisher (or the original caller).
    Internal,
    /// A deployed contract whose state effects are always discarded.
    Static(Address),
}

/// One step of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Call {
    /// Dispatch target.
    pub target: Target,
    /// Calldata template; pastes overwrite ranges of a copy of it.
    pub data: Bytes,
    /// Encoded clipboard (empty means no pastes and no value).
    pub clipboard: Bytes,
}

impl Call {
    /// A plain call to `target`.
    pub fn external(target: Address, data: Bytes) -> Self {
        Self {
            target: Target::External(target),
            data,
            clipboard: Bytes::new(),
        }
    }

    /// A call into the composer's internal function table.
    pub fn internal(data: Bytes) -> Self {
        Self {
            target: Target::Internal,
            data,
            clipboard: Bytes::new(),
        }
    }

    /// A read-only call to `target`.
    pub fn read(target: Address, data: Bytes) -> Self {
        Self {
            target: Target::Static(target),
            data,
            clipboard: Bytes::new(),
        }
    }

    /// Attaches a clipboard.
    pub fn with_clipboard(mut self, clipboard: &Clipboard) -> Self {
        self.clipboard = clipboard.encode();
        self
    }

    /// Attaches pre-encoded clipboard bytes verbatim.
    pub fn with_raw_clipboard(mut self, clipboard: Bytes) -> Self {
        self.clipboard = clipboard;
        self
    }
}
