//! The content delegate interface and its no-op placeholder.
//!
//! [`ContentProvider`] is the fixed set of read operations a content delegate
//! answers. [`NopProvider`] answers every one of them with a zero value and
//! stands in for the real delegate before (or instead of) a successful
//! initialization. Both the placeholder and [`LazyProvider`](crate::LazyProvider)
//! implement the trait, so either is usable wherever a delegate is expected.

use std::fmt;

use anyhow::Result;

/// Pre-rendered markup, safe to emit without further escaping.
///
/// Carries no escaping logic of its own; constructing one asserts that the
/// wrapped string is already safe for the output context.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Markup(String);

impl Markup {
   /// Wraps an already-safe string.
   #[inline]
   pub fn new(markup: impl Into<String>) -> Self {
      Self(markup.into())
   }

   /// The markup as a string slice.
   #[inline]
   pub fn as_str(&self) -> &str {
      &self.0
   }

   /// True when the markup is empty.
   #[inline]
   pub fn is_empty(&self) -> bool {
      self.0.is_empty()
   }

   /// Consumes the wrapper, returning the inner string.
   #[inline]
   pub fn into_string(self) -> String {
      self.0
   }
}

impl fmt::Display for Markup {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str(&self.0)
   }
}

impl From<String> for Markup {
   #[inline]
   fn from(markup: String) -> Self {
      Self(markup)
   }
}

impl From<&str> for Markup {
   #[inline]
   fn from(markup: &str) -> Self {
      Self(markup.to_owned())
   }
}

/// Read interface answered by content delegates.
///
/// Every method takes no arguments beyond the receiver and returns a plain
/// value; only [`content`](Self::content) is fallible. Implementations are
/// shared across threads, hence the `Send + Sync` bound.
pub trait ContentProvider: Send + Sync {
   /// Rendered content body.
   fn content(&self) -> Result<Markup>;

   /// Content stripped of markup.
   fn plain(&self) -> String;

   /// Words of the plain content, in order.
   fn plain_words(&self) -> Vec<String>;

   /// Summary markup, safe to render as-is.
   fn summary(&self) -> Markup;

   /// Whether the summary was truncated from the full content.
   fn truncated(&self) -> bool;

   /// Number of words in the content.
   fn word_count(&self) -> usize;

   /// Word count rounded for stable display, e.g. to the nearest hundred.
   fn fuzzy_word_count(&self) -> usize;

   /// Estimated reading time in minutes.
   fn reading_time(&self) -> usize;

   /// Length of the rendered content in bytes.
   fn len(&self) -> usize;

   /// True when the rendered content is empty.
   fn is_empty(&self) -> bool {
      self.len() == 0
   }
}

/// Placeholder delegate answering every query with a zero value.
///
/// Installed in a [`LazyProvider`](crate::LazyProvider) before the first
/// factory run and left in place when the factory fails, so reads degrade to
/// empty answers instead of erroring.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NopProvider;

impl ContentProvider for NopProvider {
   fn content(&self) -> Result<Markup> {
      Ok(Markup::default())
   }

   fn plain(&self) -> String {
      String::new()
   }

   fn plain_words(&self) -> Vec<String> {
      Vec::new()
   }

   fn summary(&self) -> Markup {
      Markup::default()
   }

   fn truncated(&self) -> bool {
      false
   }

   fn word_count(&self) -> usize {
      0
   }

   fn fuzzy_word_count(&self) -> usize {
      0
   }

   fn reading_time(&self) -> usize {
      0
   }

   fn len(&self) -> usize {
      0
   }
}
