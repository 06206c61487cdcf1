//! Wire-level operation shapes (spec.md §3.1, §6.1).
//!
//! An [`Operation`] is the client-authored intent to mutate one logical
//! entity. The discriminator set is closed; [`OperationKind`] enumerates it
//! and [`OperationKind::parse`] is the single place an unrecognized
//! discriminator turns into an error, matching spec.md §9's guidance to use
//! "an enum + switch with default-error".

use serde::{Deserialize, Serialize};

use crate::ids::{CardId, ClientId, DeckId, ReviewLogId, UserId};

/// The closed set of operation discriminators (spec.md §3.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Card,
    ReviewLog,
    ReviewLogDeleted,
    CardContent,
    CardDeleted,
    CardBookmarked,
    CardSuspended,
    Deck,
    UpdateDeckCard,
}

impl OperationKind {
    /// Parses the wire-level `type` discriminator.
    ///
    /// # Errors
    ///
    /// Returns the original string if it does not name a known operation
    /// kind, so the caller can report `UnknownOperationType` with context.
    pub fn parse(raw: &str) -> Result<Self, &str> {
        match raw {
            "card" => Ok(Self::Card),
            "reviewLog" => Ok(Self::ReviewLog),
            "reviewLogDeleted" => Ok(Self::ReviewLogDeleted),
            "cardContent" => Ok(Self::CardContent),
            "cardDeleted" => Ok(Self::CardDeleted),
            "cardBookmarked" => Ok(Self::CardBookmarked),
            "cardSuspended" => Ok(Self::CardSuspended),
            "deck" => Ok(Self::Deck),
            "updateDeckCard" => Ok(Self::UpdateDeckCard),
            other => Err(other),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::ReviewLog => "reviewLog",
            Self::ReviewLogDeleted => "reviewLogDeleted",
            Self::CardContent => "cardContent",
            Self::CardDeleted => "cardDeleted",
            Self::CardBookmarked => "cardBookmarked",
            Self::CardSuspended => "cardSuspended",
            Self::Deck => "deck",
            Self::UpdateDeckCard => "updateDeckCard",
        }
    }
}

/// Scheduler-owned fields for a card (spec.md §6.1). Stored verbatim; the
/// core never interprets them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardPayload {
    pub id: CardId,
    pub due: i64,
    pub stability: f64,
    pub difficulty: f64,
    pub elapsed_days: f64,
    pub scheduled_days: f64,
    pub reps: i64,
    pub lapses: i64,
    pub state: i64,
    pub last_review: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardContentPayload {
    pub card_id: CardId,
    pub front: String,
    pub back: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDeletedPayload {
    pub card_id: CardId,
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardBookmarkedPayload {
    pub card_id: CardId,
    pub bookmarked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardSuspendedPayload {
    pub card_id: CardId,
    pub suspended: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckPayload {
    pub id: DeckId,
    pub name: String,
    pub description: Option<String>,
    pub deleted: bool,
}

/// FSRS-produced review outcome fields, stored verbatim (spec.md §6.1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewLogPayload {
    pub id: ReviewLogId,
    pub card_id: CardId,
    pub grade: i64,
    pub state: i64,
    pub due: i64,
    pub stability: f64,
    pub difficulty: f64,
    pub elapsed_days: f64,
    pub last_elapsed_days: f64,
    pub scheduled_days: f64,
    pub review: i64,
    pub duration: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewLogDeletedPayload {
    pub review_log_id: ReviewLogId,
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDeckCardPayload {
    pub card_id: CardId,
    pub deck_id: DeckId,
    pub cl_count: i64,
}

/// A closed sum of every operation's kind-specific payload.
///
/// Exhaustiveness here is what makes the dispatcher's match exhaustive at
/// compile time (spec.md §9): adding a tenth operation kind is a compile
/// error everywhere this is matched, until every arm is updated. The
/// `tag`/`content` representation mirrors the wire shape directly, so an
/// unrecognized `type` or a payload that doesn't match its kind is rejected
/// by `serde` itself rather than by hand-written dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum OperationPayload {
    Card(CardPayload),
    ReviewLog(ReviewLogPayload),
    ReviewLogDeleted(ReviewLogDeletedPayload),
    CardContent(CardContentPayload),
    CardDeleted(CardDeletedPayload),
    CardBookmarked(CardBookmarkedPayload),
    CardSuspended(CardSuspendedPayload),
    Deck(DeckPayload),
    UpdateDeckCard(UpdateDeckCardPayload),
}

impl OperationPayload {
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Card(_) => OperationKind::Card,
            Self::ReviewLog(_) => OperationKind::ReviewLog,
            Self::ReviewLogDeleted(_) => OperationKind::ReviewLogDeleted,
            Self::CardContent(_) => OperationKind::CardContent,
            Self::CardDeleted(_) => OperationKind::CardDeleted,
            Self::CardBookmarked(_) => OperationKind::CardBookmarked,
            Self::CardSuspended(_) => OperationKind::CardSuspended,
            Self::Deck(_) => OperationKind::Deck,
            Self::UpdateDeckCard(_) => OperationKind::UpdateDeckCard,
        }
    }
}

/// A client-authored operation as it arrives over the wire, before the
/// server enriches it with `userId`/`clientId` (spec.md §3.1). `payload` is
/// flattened so `type`, `timestamp`, and `payload` sit as siblings on the
/// wire, matching spec.md §6.1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub timestamp: i64,
    #[serde(flatten)]
    pub payload: OperationPayload,
}

/// An [`Operation`] enriched with the owner and originating replica
/// (spec.md §3.1).
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedOperation {
    pub user_id: UserId,
    pub client_id: ClientId,
    pub operation: Operation,
}

impl EnrichedOperation {
    #[must_use]
    pub fn new(user_id: UserId, client_id: ClientId, operation: Operation) -> Self {
        Self {
            user_id,
            client_id,
            operation,
        }
    }

    #[must_use]
    pub fn kind(&self) -> OperationKind {
        self.operation.payload.kind()
    }

    /// The `(timestamp, clientId)` pair used to break ties under the LWW
    /// total order (spec.md §4.2.1).
    #[must_use]
    pub fn write_stamp(&self) -> WriteStamp {
        WriteStamp {
            timestamp: self.operation.timestamp,
            client_id: self.client_id.clone(),
        }
    }
}

/// The `(timestamp, clientId)` total order LWW registers and the
/// `updateDeckCard` observability columns are compared under
/// (spec.md §4.2.1). Comparison is lexicographic: timestamp first, then
/// `clientId` as a string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct WriteStamp {
    pub timestamp: i64,
    pub client_id: ClientId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_known_kind() {
        for (raw, expected) in [
            ("card", OperationKind::Card),
            ("reviewLog", OperationKind::ReviewLog),
            ("reviewLogDeleted", OperationKind::ReviewLogDeleted),
            ("cardContent", OperationKind::CardContent),
            ("cardDeleted", OperationKind::CardDeleted),
            ("cardBookmarked", OperationKind::CardBookmarked),
            ("cardSuspended", OperationKind::CardSuspended),
            ("deck", OperationKind::Deck),
            ("updateDeckCard", OperationKind::UpdateDeckCard),
        ] {
            assert_eq!(OperationKind::parse(raw).unwrap(), expected);
            assert_eq!(expected.as_str(), raw);
        }
    }

    #[test]
    fn rejects_unknown_kind() {
        assert_eq!(OperationKind::parse("bogus"), Err("bogus"));
    }

    #[test]
    fn operation_round_trips_through_the_tagged_wire_shape() {
        let op = Operation {
            timestamp: 1_700_000_000,
            payload: OperationPayload::CardBookmarked(CardBookmarkedPayload {
                card_id: CardId::new("card-1").unwrap(),
                bookmarked: true,
            }),
        };

        let value = serde_json::to_value(&op).unwrap();
        assert_eq!(value["type"], "cardBookmarked");
        assert_eq!(value["payload"]["cardId"], "card-1");
        assert_eq!(value["timestamp"], 1_700_000_000);

        let back: Operation = serde_json::from_value(value).unwrap();
        assert_eq!(back, op);
    }

    #[test]
    fn deserializing_an_unknown_type_fails() {
        let value = serde_json::json!({
            "timestamp": 0,
            "type": "bogus",
            "payload": {},
        });
        assert!(serde_json::from_value::<Operation>(value).is_err());
    }

    #[test]
    fn write_stamp_orders_by_timestamp_then_client_id() {
        let a = WriteStamp {
            timestamp: 100,
            client_id: ClientId::new("A").unwrap(),
        };
        let b = WriteStamp {
            timestamp: 100,
            client_id: ClientId::new("B").unwrap(),
        };
        assert!(b > a);

        let later = WriteStamp {
            timestamp: 99,
            client_id: ClientId::new("Z").unwrap(),
        };
        let earlier = WriteStamp {
            timestamp: 100,
            client_id: ClientId::new("A").unwrap(),
        };
        assert!(earlier > later);
    }
}
