use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::bail;
use lazy_gate::{BoxedProvider, ContentProvider, LazyProvider, NopProvider};

fn main() {
   tracing_subscriber::fmt()
      .with_max_level(tracing::Level::DEBUG)
      .init();

   let attempts = Arc::new(AtomicUsize::new(0));
   let lazy = {
      let attempts = Arc::clone(&attempts);
      LazyProvider::new(move || {
         if attempts.fetch_add(1, Ordering::Relaxed) == 0 {
            bail!("backend unavailable");
         }
         // Second epoch: pretend the backend came back.
         Ok(Box::new(NopProvider) as BoxedProvider)
      })
   };

   // The first epoch fails. Reads degrade to zero values instead of
   // erroring; the cause is cached for anyone who asks.
   println!("word count while degraded: {}", lazy.word_count());
   match lazy.init_error() {
      Some(err) => println!("cached failure: {err}"),
      None => panic!("expected a cached failure"),
   }
   assert_eq!(attempts.load(Ordering::Relaxed), 1); // Failure cached, not retried

   // Reset re-arms the proxy; the next read invokes the factory again.
   lazy.reset();
   println!("word count after reset: {}", lazy.word_count());
   assert!(lazy.init_error().is_none());
   assert_eq!(attempts.load(Ordering::Relaxed), 2);
}
