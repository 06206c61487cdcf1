#![forbid(unsafe_code)]

//! Domain types for the flashcard sync ingestion core: identifiers, the
//! closed operation sum, and the clock abstraction. No I/O lives here; the
//! merge semantics and dispatch live in `sync-ingest`, the persistence in
//! `sync-storage`.

pub mod ids;
pub mod operation;
pub mod time;

pub use ids::{CardId, ClientId, DeckId, EmptyIdError, ReviewLogId, SeqNo, UserId};
pub use operation::{
    CardBookmarkedPayload, CardContentPayload, CardDeletedPayload, CardPayload, CardSuspendedPayload,
    DeckPayload, EnrichedOperation, Operation, OperationKind, OperationPayload,
    ReviewLogDeletedPayload, ReviewLogPayload, UpdateDeckCardPayload, WriteStamp,
};
pub use time::Clock;
