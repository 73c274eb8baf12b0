//! Lazy, memoizing delegation proxy over a content provider factory.
//!
//! [`LazyProvider`] defers the (possibly expensive or fallible) construction
//! of a real [`ContentProvider`] until the first read. The factory is invoked
//! at most once per epoch by an internal [`OnceGate`]; on success the produced
//! delegate is installed atomically and every subsequent read forwards to it.
//! On failure the no-op placeholder stays installed, so reads keep returning
//! empty answers while the error sits in the gate's cache for anyone who asks.

use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use arc_swap::{ArcSwap, Guard};
use tracing::debug;

use crate::error::InitError;
use crate::gate::OnceGate;
use crate::provider::{ContentProvider, Markup, NopProvider};

/// A boxed content delegate, as produced by a factory.
pub type BoxedProvider = Box<dyn ContentProvider>;

/// A content provider that initializes itself on first read.
///
/// Every method of the [`ContentProvider`] interface first triggers the
/// factory (at most once per epoch, across any number of threads) and then
/// forwards to whichever delegate is installed. Before the first successful
/// run, and after a failed one, that delegate is [`NopProvider`], so reads
/// return zero values rather than errors; the factory error is retained and
/// available from [`init_error`](Self::init_error). This silent degradation
/// is deliberate: a broken delegate should not break rendering of everything
/// around it.
///
/// [`reset`](Self::reset) discards the memoized outcome so the next read
/// invokes the factory again.
///
/// # Blocking
///
/// A read that arrives while the factory is running blocks until that single
/// invocation completes. There is no way to abandon the wait: a factory that
/// never returns blocks every caller indefinitely.
pub struct LazyProvider {
   gate: OnceGate,
   current: Arc<ArcSwap<BoxedProvider>>,
}

impl LazyProvider {
   /// Creates a proxy around `factory`.
   ///
   /// The factory is not invoked here; the no-op delegate is installed and
   /// the first read (or [`ensure_initialized`](Self::ensure_initialized))
   /// triggers construction. The factory's contract is taken at face value:
   /// whatever delegate it returns on success is installed and forwarded to
   /// as-is.
   pub fn new<F>(factory: F) -> Self
   where
      F: Fn() -> Result<BoxedProvider> + Send + Sync + 'static,
   {
      let current: Arc<ArcSwap<BoxedProvider>> =
         Arc::new(ArcSwap::from_pointee(Box::new(NopProvider) as BoxedProvider));
      let gate = OnceGate::new();
      let slot = Arc::clone(&current);
      gate.register(move || {
         let provider = factory()?;
         debug!("content provider factory succeeded, installing delegate");
         // The swap happens before the gate commits, so every caller that
         // observes the gate as done also observes the real delegate.
         slot.store(Arc::new(provider));
         Ok(())
      });
      Self { gate, current }
   }

   /// Triggers initialization and returns the currently installed delegate.
   ///
   /// The gate's outcome is intentionally ignored at this call site; a failed
   /// factory run leaves the no-op delegate installed and the error cached
   /// for [`init_error`](Self::init_error).
   pub fn ensure_initialized(&self) -> Guard<Arc<BoxedProvider>> {
      let _ = self.gate.run();
      self.current.load()
   }

   /// Discards the memoized outcome; the next read invokes the factory again.
   ///
   /// The currently installed delegate stays in place until the next
   /// successful run overwrites it: after a failed epoch that is already the
   /// no-op delegate, so a reset followed by another failure changes nothing.
   /// Blocks until any in-flight factory invocation completes. Resetting
   /// while other threads are reading is memory-safe, but the interleaving
   /// is unspecified; serializing resets against concurrent use is the
   /// caller's responsibility.
   pub fn reset(&self) {
      self.gate.reset();
   }

   /// The error cached by the last failed factory run, if any.
   ///
   /// Forwarding methods never inspect or surface this; it exists for
   /// callers that want to distinguish "empty content" from "initialization
   /// failed".
   pub fn init_error(&self) -> Option<InitError> {
      self.gate.error()
   }
}

impl ContentProvider for LazyProvider {
   fn content(&self) -> Result<Markup> {
      self.ensure_initialized().content()
   }

   fn plain(&self) -> String {
      self.ensure_initialized().plain()
   }

   fn plain_words(&self) -> Vec<String> {
      self.ensure_initialized().plain_words()
   }

   fn summary(&self) -> Markup {
      self.ensure_initialized().summary()
   }

   fn truncated(&self) -> bool {
      self.ensure_initialized().truncated()
   }

   fn word_count(&self) -> usize {
      self.ensure_initialized().word_count()
   }

   fn fuzzy_word_count(&self) -> usize {
      self.ensure_initialized().fuzzy_word_count()
   }

   fn reading_time(&self) -> usize {
      self.ensure_initialized().reading_time()
   }

   fn len(&self) -> usize {
      self.ensure_initialized().len()
   }
}

impl fmt::Debug for LazyProvider {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("LazyProvider")
         .field("gate", &self.gate)
         .finish_non_exhaustive()
   }
}
