//! Error type cached and replayed by the initialization gate.

use std::sync::Arc;

use thiserror::Error;

/// The error produced by a failed gate run.
///
/// A gate caches one of these per failed epoch and replays it to every later
/// caller of [`run`](crate::OnceGate::run) until the next reset. Clones share
/// the same underlying factory error.
#[derive(Clone, Debug, Error)]
#[error("initialization failed: {0}")]
pub struct InitError(Arc<anyhow::Error>);

impl InitError {
   #[inline]
   pub(crate) fn new(inner: Arc<anyhow::Error>) -> Self {
      Self(inner)
   }

   /// The underlying error returned by the registered action.
   #[inline]
   pub fn inner(&self) -> &anyhow::Error {
      &self.0
   }
}
