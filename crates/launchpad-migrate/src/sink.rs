use std::sync::Arc;

use launchpad_common::error::BoxError;
use tracing::info;

/// Number of characters of statement text shown by [`LoggingSink`].
const PREVIEW_CHARS: usize = 100;

/// Receives the statement text of declarative descriptors.
///
/// Implementations execute `statements` verbatim against the data store. An
/// error aborts the run and is reported as a failure of descriptor `id`.
pub trait StatementSink: Send + Sync {
    fn execute(&self, id: &str, statements: &str) -> Result<(), BoxError>;
}

impl<T: StatementSink + ?Sized> StatementSink for Arc<T> {
    fn execute(&self, id: &str, statements: &str) -> Result<(), BoxError> {
        (**self).execute(id, statements)
    }
}

/// Sink that only logs a preview of each statement batch. Nothing is sent to
/// a database.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSink;

impl StatementSink for LoggingSink {
    fn execute(&self, id: &str, statements: &str) -> Result<(), BoxError> {
        info!("executing SQL migration {id}: {}...", preview(statements));
        Ok(())
    }
}

fn preview(statements: &str) -> &str {
    match statements.char_indices().nth(PREVIEW_CHARS) {
        Some((idx, _)) => &statements[..idx],
        None => statements,
    }
}
