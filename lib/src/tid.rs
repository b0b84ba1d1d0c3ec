// Copyright 2026 The odbcopy Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Transaction identifiers.

use std::fmt;

/// An 8-byte opaque transaction identifier.
///
/// Backends hand these out and order transactions by them; the copier
/// never interprets the bytes except to compute a successor for
/// incremental-copy cursors.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tid([u8; 8]);

impl Tid {
    pub const ZERO: Self = Self([0; 8]);

    pub fn new(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        bytes.try_into().ok().map(Self)
    }

    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }

    /// Returns the next TID in ascending order, treating the bytes as a
    /// big-endian u64.
    pub fn successor(&self) -> Self {
        let n = u64::from_be_bytes(self.0);
        Self((n + 1).to_be_bytes())
    }

    fn as_u64(&self) -> u64 {
        u64::from_be_bytes(self.0)
    }

    /// Numeric value of this TID, for backends that assign their own
    /// monotonically increasing TIDs.
    pub fn to_u64(&self) -> u64 {
        self.as_u64()
    }
}

impl fmt::Debug for Tid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tid({:016x})", self.as_u64())
    }
}

impl fmt::Display for Tid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.as_u64())
    }
}

impl From<u64> for Tid {
    fn from(value: u64) -> Self {
        Self(value.to_be_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successor_increments_big_endian_value() {
        let t = Tid::from(41u64);
        assert_eq!(t.successor(), Tid::from(42u64));
    }

    #[test]
    fn ordering_follows_numeric_value() {
        assert!(Tid::from(1u64) < Tid::from(2u64));
        assert!(Tid::ZERO < Tid::from(1u64));
    }

    #[test]
    fn from_bytes_rejects_wrong_length() {
        assert!(Tid::from_bytes(&[0; 7]).is_none());
        assert!(Tid::from_bytes(&[0; 8]).is_some());
    }
}
