use std::fmt;

use serde::{Deserialize, Serialize};

/// The owner of every row the core writes. Carried on the enriched operation,
/// never on the wire payload itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(String);

/// A stable, non-empty identifier for the originating device/replica.
///
/// Trusted only for LWW tie-breaking (spec.md §4.2.1); never used for
/// authorization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClientId(String);

/// Client-chosen identifier for a card. Cards are created offline, so the
/// server never assigns these.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CardId(String);

/// Client-chosen identifier for a deck.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeckId(String);

/// Client-chosen, globally-unique identifier for a review log row
/// (spec.md §4.2.2 — "the client must assign globally unique ids, UUIDs in
/// practice").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReviewLogId(String);

/// Error returned when constructing an identifier from an empty string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("identifier must not be empty")]
pub struct EmptyIdError;

macro_rules! string_id {
    ($name:ident) => {
        impl $name {
            /// Wraps a non-empty string as an identifier.
            ///
            /// # Errors
            ///
            /// Returns `EmptyIdError` if `value` is empty.
            pub fn new(value: impl Into<String>) -> Result<Self, EmptyIdError> {
                let value = value.into();
                if value.is_empty() {
                    return Err(EmptyIdError);
                }
                Ok(Self(value))
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            #[must_use]
            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(UserId);
string_id!(ClientId);
string_id!(CardId);
string_id!(DeckId);
string_id!(ReviewLogId);

/// A user's monotone sequence number, stamped on every write.
///
/// `seqNo` does not participate in conflict resolution (spec.md §5); it
/// exists for the downstream pull path to stream deltas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeqNo(i64);

impl SeqNo {
    #[must_use]
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn value(self) -> i64 {
        self.0
    }

    /// Returns the next sequence number in a reserved contiguous run.
    #[must_use]
    pub fn offset(self, n: i64) -> Self {
        Self(self.0 + n)
    }
}

impl fmt::Display for SeqNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_client_id() {
        assert!(ClientId::new("").is_err());
    }

    #[test]
    fn accepts_non_empty_card_id() {
        let id = CardId::new("card-1").unwrap();
        assert_eq!(id.as_str(), "card-1");
        assert_eq!(id.to_string(), "card-1");
    }

    #[test]
    fn seq_no_offset_advances() {
        let first = SeqNo::new(5);
        assert_eq!(first.offset(3).value(), 8);
    }
}
