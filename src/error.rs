use thiserror::Error;

use crate::card::Card;

/// Structural invariant violations. These signal a bug in the caller or the
/// move engine, never a bad shuffle, and abort the current attempt.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StackError {
    #[error("foundation push out of order: {card} onto {top}")]
    OutOfOrder { card: Card, top: Card },
    #[error("requested {requested} cards but only {available} are available")]
    Capacity { requested: usize, available: usize },
}

#[derive(Debug, Error)]
pub enum SortError {
    /// Every attempt within the retry bound ended in a loss.
    #[error("no winning deal found after {attempts} attempts")]
    ExhaustedRetries { attempts: usize },
    #[error(transparent)]
    Stack(#[from] StackError),
}
