//! # Cell Key Module
//!
//! Canonical identity of a world cell. A [`CellKey`] is built from an integer
//! triple and compares, hashes and orders by value, so a key computed from a
//! local click and a key parsed out of an inbound snapshot for the same cell
//! are always equal, regardless of how the numbers were spelled on the wire.
//!
//! The wire form is the JSON array text `[x,y,z]`, which is also how the
//! world channel names the entries of a `stateUpdate`.

use std::fmt;

use crate::core::error::SyncError;

/// Totally ordered, hashable key of a single cell.
///
/// Ordering is lexicographic on `(x, y, z)`, which keeps snapshot key sets
/// deterministic when iterated.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    x: i32,
    y: i32,
    z: i32,
}

impl CellKey {
    /// Encodes an integer coordinate.
    pub fn encode(x: i32, y: i32, z: i32) -> Self {
        CellKey { x, y, z }
    }

    /// Recovers the coordinate this key was built from.
    pub fn decode(&self) -> (i32, i32, i32) {
        (self.x, self.y, self.z)
    }

    /// Parses the wire form `[x,y,z]`.
    ///
    /// Whitespace around numbers is ignored and a leading `+` is accepted, so
    /// `"[ 1, +2,3 ]"` is the same key as `"[1,2,3]"`. Anything else (wrong
    /// arity, fractions, values outside `i32`) fails with
    /// [`SyncError::MalformedKey`].
    pub fn parse(text: &str) -> Result<Self, SyncError> {
        let malformed = || SyncError::MalformedKey {
            key: text.to_string(),
        };

        let inner = text
            .trim()
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .ok_or_else(malformed)?;

        let mut parts = inner.split(',').map(|part| part.trim().parse::<i32>());
        let (Some(Ok(x)), Some(Ok(y)), Some(Ok(z)), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };

        Ok(CellKey::encode(x, y, z))
    }
}

/// Prints the canonical wire form, `[x,y,z]` with no spaces.
impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{},{}]", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_canonical_form() {
        assert_eq!(CellKey::parse("[1,-2,3]").unwrap(), CellKey::encode(1, -2, 3));
    }

    #[test]
    fn formatting_does_not_change_identity() {
        let a = CellKey::parse("[ 4 , +5,6]").unwrap();
        let b = CellKey::parse("[4,5,6]").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "[4,5,6]");
    }

    #[test]
    fn rejects_malformed_keys() {
        let keys = [
            "",
            "[]",
            "[1,2]",
            "[1,2,3,4]",
            "1,2,3",
            "[1.5,2,3]",
            "[a,b,c]",
            "[9999999999,0,0]",
        ];
        for bad in keys {
            let err = CellKey::parse(bad).unwrap_err();
            assert!(matches!(err, SyncError::MalformedKey { .. }), "{bad} accepted");
        }
    }

    #[test]
    fn orders_lexicographically() {
        let mut keys = vec![
            CellKey::encode(1, 0, 0),
            CellKey::encode(0, 5, 0),
            CellKey::encode(0, 0, 9),
        ];
        keys.sort();
        assert_eq!(keys[0], CellKey::encode(0, 0, 9));
        assert_eq!(keys[2], CellKey::encode(1, 0, 0));
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(x in any::<i32>(), y in any::<i32>(), z in any::<i32>()) {
            prop_assert_eq!(CellKey::encode(x, y, z).decode(), (x, y, z));
        }

        #[test]
        fn wire_form_parses_back(x in any::<i32>(), y in any::<i32>(), z in any::<i32>()) {
            let key = CellKey::encode(x, y, z);
            prop_assert_eq!(CellKey::parse(&key.to_string()).unwrap(), key);
        }
    }
}
