use sync_core::EnrichedOperation;

use crate::error::IngestError;

/// Rejects batches exceeding the hard operation cap (spec.md §4.5).
///
/// Performs no per-operation inspection; that is the dispatcher's job.
#[derive(Debug, Clone, Copy)]
pub struct BatchValidator {
    max_ops: usize,
}

impl BatchValidator {
    #[must_use]
    pub fn new(max_ops: usize) -> Self {
        Self { max_ops }
    }

    /// # Errors
    ///
    /// Returns `IngestError::TooManyOperations` if `ops.len() > max_ops`.
    pub fn validate(&self, ops: &[EnrichedOperation]) -> Result<(), IngestError> {
        if ops.len() > self.max_ops {
            return Err(IngestError::TooManyOperations);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sync_core::{ClientId, Operation, OperationPayload, UserId, CardBookmarkedPayload, CardId};

    fn op(n: usize) -> EnrichedOperation {
        EnrichedOperation::new(
            UserId::new("u1").unwrap(),
            ClientId::new("c1").unwrap(),
            Operation {
                timestamp: n as i64,
                payload: OperationPayload::CardBookmarked(CardBookmarkedPayload {
                    card_id: CardId::new("card").unwrap(),
                    bookmarked: true,
                }),
            },
        )
    }

    #[test]
    fn accepts_batch_at_the_cap() {
        let validator = BatchValidator::new(3);
        let ops: Vec<_> = (0..3).map(op).collect();
        assert!(validator.validate(&ops).is_ok());
    }

    #[test]
    fn rejects_batch_over_the_cap_with_exact_message() {
        let validator = BatchValidator::new(3);
        let ops: Vec<_> = (0..4).map(op).collect();
        let err = validator.validate(&ops).unwrap_err();
        assert_eq!(err.to_string(), "Too many operations");
    }
}
