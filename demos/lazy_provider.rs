use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use lazy_gate::{BoxedProvider, ContentProvider, LazyProvider, Markup};

struct Article {
   body: String,
}

impl ContentProvider for Article {
   fn content(&self) -> Result<Markup> {
      Ok(Markup::new(format!("<article>{}</article>", self.body)))
   }
   fn plain(&self) -> String {
      self.body.clone()
   }
   fn plain_words(&self) -> Vec<String> {
      self.body.split_whitespace().map(str::to_owned).collect()
   }
   fn summary(&self) -> Markup {
      Markup::new(self.body.chars().take(20).collect::<String>())
   }
   fn truncated(&self) -> bool {
      self.body.len() > 20
   }
   fn word_count(&self) -> usize {
      self.plain_words().len()
   }
   fn fuzzy_word_count(&self) -> usize {
      (self.word_count() + 99) / 100 * 100
   }
   fn reading_time(&self) -> usize {
      (self.word_count() + 212) / 213
   }
   fn len(&self) -> usize {
      self.body.len()
   }
}

fn main() {
   tracing_subscriber::fmt()
      .with_max_level(tracing::Level::TRACE)
      .init();

   let factory_calls = Arc::new(AtomicUsize::new(0));
   let lazy = {
      let factory_calls = Arc::clone(&factory_calls);
      Arc::new(LazyProvider::new(move || {
         // This runs only once, no matter how many threads read first.
         factory_calls.fetch_add(1, Ordering::Relaxed);
         println!("Building the real provider...");
         thread::sleep(Duration::from_millis(50));
         let article = Article {
            body: "The quick brown fox jumps over the lazy dog".to_owned(),
         };
         Ok(Box::new(article) as BoxedProvider)
      }))
   };

   let threads: Vec<_> = (0..5)
      .map(|_| {
         let lazy = Arc::clone(&lazy);
         thread::spawn(move || {
            println!("word count: {}", lazy.word_count());
         })
      })
      .collect();
   for t in threads {
      t.join().unwrap();
   }

   println!("content: {}", lazy.content().unwrap());
   println!("summary: {} (truncated: {})", lazy.summary(), lazy.truncated());
   assert_eq!(factory_calls.load(Ordering::Relaxed), 1); // Factory ran only once
}
