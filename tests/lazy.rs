use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Result};
use lazy_gate::{BoxedProvider, ContentProvider, LazyProvider, Markup};

/// Fixed-answer delegate used as the factory product in these tests.
struct StaticProvider {
   body: &'static str,
   truncated: bool,
}

impl StaticProvider {
   fn boxed(body: &'static str) -> BoxedProvider {
      Box::new(Self {
         body,
         truncated: false,
      })
   }
}

impl ContentProvider for StaticProvider {
   fn content(&self) -> Result<Markup> {
      Ok(Markup::new(format!("<p>{}</p>", self.body)))
   }

   fn plain(&self) -> String {
      self.body.to_owned()
   }

   fn plain_words(&self) -> Vec<String> {
      self.body.split_whitespace().map(str::to_owned).collect()
   }

   fn summary(&self) -> Markup {
      Markup::new(self.body.to_owned())
   }

   fn truncated(&self) -> bool {
      self.truncated
   }

   fn word_count(&self) -> usize {
      self.plain_words().len()
   }

   fn fuzzy_word_count(&self) -> usize {
      (self.word_count() + 99) / 100 * 100
   }

   fn reading_time(&self) -> usize {
      1
   }

   fn len(&self) -> usize {
      self.body.len()
   }
}

#[test]
fn test_factory_runs_on_first_read_only() {
   let calls = Arc::new(AtomicUsize::new(0));
   let lazy = {
      let calls = Arc::clone(&calls);
      LazyProvider::new(move || {
         calls.fetch_add(1, Ordering::SeqCst);
         Ok(StaticProvider::boxed("one two three"))
      })
   };

   // Construction does not invoke the factory.
   assert_eq!(calls.load(Ordering::SeqCst), 0);

   // The sequence from the contract: word_count, content, word_count.
   assert_eq!(lazy.word_count(), 3);
   assert_eq!(lazy.content().unwrap().as_str(), "<p>one two three</p>");
   assert_eq!(lazy.word_count(), 3);
   assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_memoized_across_every_method() {
   let calls = Arc::new(AtomicUsize::new(0));
   let lazy = {
      let calls = Arc::clone(&calls);
      LazyProvider::new(move || {
         calls.fetch_add(1, Ordering::SeqCst);
         Ok(StaticProvider::boxed("alpha beta"))
      })
   };

   assert_eq!(lazy.plain(), "alpha beta");
   assert_eq!(lazy.plain_words(), vec!["alpha", "beta"]);
   assert_eq!(lazy.summary().as_str(), "alpha beta");
   assert!(!lazy.truncated());
   assert_eq!(lazy.word_count(), 2);
   assert_eq!(lazy.fuzzy_word_count(), 100);
   assert_eq!(lazy.reading_time(), 1);
   assert_eq!(lazy.len(), 10);
   assert!(lazy.content().is_ok());

   // One factory invocation serves all nine methods.
   assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_failed_factory_degrades_to_nop_answers() {
   let calls = Arc::new(AtomicUsize::new(0));
   let lazy = {
      let calls = Arc::clone(&calls);
      LazyProvider::new(move || {
         calls.fetch_add(1, Ordering::SeqCst);
         Err(anyhow!("content backend unavailable"))
      })
   };

   // Reads do not surface the error; they return the documented zero values.
   assert_eq!(lazy.content().unwrap(), Markup::default());
   assert_eq!(lazy.plain(), "");
   assert!(lazy.plain_words().is_empty());
   assert!(lazy.summary().is_empty());
   assert!(!lazy.truncated());
   assert_eq!(lazy.word_count(), 0);
   assert_eq!(lazy.fuzzy_word_count(), 0);
   assert_eq!(lazy.reading_time(), 0);
   assert_eq!(lazy.len(), 0);

   // The factory ran once; the failure was cached, not retried.
   assert_eq!(calls.load(Ordering::SeqCst), 1);

   // The error is retained for callers that opt in.
   let err = lazy.init_error().expect("cached error");
   assert!(err.to_string().contains("content backend unavailable"));
}

#[test]
fn test_reset_after_failure_reinvokes_factory() {
   let calls = Arc::new(AtomicUsize::new(0));
   let lazy = {
      let calls = Arc::clone(&calls);
      LazyProvider::new(move || {
         if calls.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(anyhow!("transient failure"))
         } else {
            Ok(StaticProvider::boxed("recovered"))
         }
      })
   };

   // First epoch fails: zero-value answer, one invocation.
   assert_eq!(lazy.len(), 0);
   assert_eq!(calls.load(Ordering::SeqCst), 1);

   // Reset re-arms; the next read invokes the factory again and installs
   // the fresh delegate.
   lazy.reset();
   assert_eq!(lazy.len(), "recovered".len());
   assert_eq!(calls.load(Ordering::SeqCst), 2);
   assert!(lazy.init_error().is_none());
   assert_eq!(lazy.plain(), "recovered");
}

#[test]
fn test_reset_after_success_installs_fresh_delegate() {
   let calls = Arc::new(AtomicUsize::new(0));
   let lazy = {
      let calls = Arc::clone(&calls);
      LazyProvider::new(move || {
         let bodies = ["first epoch", "second epoch"];
         let n = calls.fetch_add(1, Ordering::SeqCst);
         Ok(StaticProvider::boxed(bodies[n.min(1)]))
      })
   };

   assert_eq!(lazy.plain(), "first epoch");
   lazy.reset();
   assert_eq!(lazy.plain(), "second epoch");
   assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_concurrent_first_touch_invokes_factory_once() {
   let calls = Arc::new(AtomicUsize::new(0));
   let lazy = {
      let calls = Arc::clone(&calls);
      Arc::new(LazyProvider::new(move || {
         calls.fetch_add(1, Ordering::SeqCst);
         // Simulate slow construction so the other threads block on it.
         thread::sleep(Duration::from_millis(30));
         Ok(StaticProvider::boxed("shared body text"))
      }))
   };

   // Mix of forwarding methods racing on first touch.
   let threads: Vec<_> = (0..12)
      .map(|i| {
         let lazy = Arc::clone(&lazy);
         thread::spawn(move || match i % 3 {
            0 => lazy.word_count(),
            1 => lazy.plain_words().len(),
            _ => lazy.plain().split_whitespace().count(),
         })
      })
      .collect();

   // Every thread sees the same fully-installed delegate.
   for handle in threads {
      assert_eq!(handle.join().unwrap(), 3);
   }
   assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_proxy_substitutes_for_a_delegate() {
   fn describe(provider: &dyn ContentProvider) -> (usize, bool) {
      (provider.word_count(), provider.truncated())
   }

   let lazy = LazyProvider::new(|| Ok(StaticProvider::boxed("a b c d")));
   assert_eq!(describe(&lazy), (4, false));
}

#[test]
fn test_ensure_initialized_returns_installed_delegate() {
   let lazy = LazyProvider::new(|| Ok(StaticProvider::boxed("body")));
   let delegate = lazy.ensure_initialized();
   assert_eq!(delegate.len(), 4);

   // A failing proxy hands out the no-op placeholder instead.
   let broken = LazyProvider::new(|| Err(anyhow!("nope")));
   let delegate = broken.ensure_initialized();
   assert_eq!(delegate.len(), 0);
   assert!(broken.init_error().is_some());
}
