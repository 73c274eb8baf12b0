//! A resettable run-at-most-once gate and a lazy delegation proxy built on it.
//!
//! This crate provides two layers:
//!
//! - [`OnceGate`]: a reusable "run exactly once until reset" gate. It runs a
//!   registered fallible action at most once per epoch, caches the outcome
//!   (success or failure) and replays it to every caller without re-running
//!   the action, until an explicit reset starts a new epoch.
//! - [`LazyProvider`]: a deferred, memoizing proxy over a caller-supplied
//!   factory. It exposes the full [`ContentProvider`] read interface, but
//!   only constructs the real delegate on the first read. Until then - and
//!   after a failed construction - reads are answered by [`NopProvider`]
//!   with zero values.
//!
//! # Features
//!
//! - **Lock-free fast path**: once an epoch has completed, triggering the
//!   gate is a single atomic load.
//! - **Efficient blocking**: callers that arrive during an in-flight run park
//!   on a futex until it completes, then observe the same outcome.
//! - **Failure caching**: a failed run is not retried; the error is replayed
//!   verbatim to every caller until the gate is reset.
//! - **Graceful degradation**: a proxy whose factory failed keeps answering
//!   reads with empty values instead of erroring, while retaining the error
//!   for callers that ask for it.
//!
//! # Examples
//!
//! ```rust
//! use anyhow::Result;
//! use lazy_gate::{BoxedProvider, ContentProvider, LazyProvider, Markup};
//!
//! struct Page {
//!    body: String,
//! }
//!
//! impl ContentProvider for Page {
//!    fn content(&self) -> Result<Markup> {
//!       Ok(Markup::new(format!("<p>{}</p>", self.body)))
//!    }
//!    fn plain(&self) -> String {
//!       self.body.clone()
//!    }
//!    fn plain_words(&self) -> Vec<String> {
//!       self.body.split_whitespace().map(str::to_owned).collect()
//!    }
//!    fn summary(&self) -> Markup {
//!       Markup::new(self.body.clone())
//!    }
//!    fn truncated(&self) -> bool {
//!       false
//!    }
//!    fn word_count(&self) -> usize {
//!       self.plain_words().len()
//!    }
//!    fn fuzzy_word_count(&self) -> usize {
//!       self.word_count()
//!    }
//!    fn reading_time(&self) -> usize {
//!       1
//!    }
//!    fn len(&self) -> usize {
//!       self.body.len()
//!    }
//! }
//!
//! // The factory runs on first read, not here.
//! let lazy = LazyProvider::new(|| {
//!    let page = Page { body: "hello lazy world".to_owned() };
//!    Ok(Box::new(page) as BoxedProvider)
//! });
//!
//! assert_eq!(lazy.word_count(), 3);
//! assert_eq!(lazy.plain(), "hello lazy world");
//! ```
//!
//! ## Using the gate directly
//!
//! ```rust
//! use lazy_gate::OnceGate;
//!
//! let gate = OnceGate::new();
//! gate.register(|| Ok(()));
//!
//! gate.run().expect("action succeeds");
//! assert!(gate.is_done());
//!
//! gate.reset();
//! assert!(!gate.is_done()); // next run executes the action again
//! ```

/// Error type cached and replayed by the gate.
mod error;

/// Resettable run-at-most-once gate.
mod gate;

/// Lazy delegation proxy.
mod lazy;

/// Delegate interface and no-op placeholder.
mod provider;

/// Internal synchronization state management.
mod state;

pub use error::InitError;
pub use gate::OnceGate;
pub use lazy::{BoxedProvider, LazyProvider};
pub use provider::{ContentProvider, Markup, NopProvider};
