//! Resettable run-at-most-once gate.
//!
//! [`OnceGate`] runs a registered action at most once per epoch, caches the
//! outcome (success or the error) and replays it to every caller without
//! re-running the action. An explicit [`reset`](OnceGate::reset) starts a new
//! epoch, after which the next [`run`](OnceGate::run) executes the same
//! registered action again.
//!
//! The fast path for an already-completed epoch is a single atomic load;
//! callers that arrive while a run is in flight block on a futex until it
//! completes and then observe the same cached outcome.

use std::fmt;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::Result;
use arc_swap::ArcSwapOption;
use tracing::{trace, warn};

use crate::error::InitError;
use crate::state::GateState;

/// The registered action: fallible, zero-argument, callable once per epoch.
type Action = Box<dyn Fn() -> Result<()> + Send + Sync>;

/// A gate that runs its registered action at most once per epoch.
///
/// The outcome of the run - success or the error - is cached and returned to
/// every subsequent [`run`](Self::run) call without re-executing the action.
/// Failures are never retried automatically; only [`reset`](Self::reset)
/// re-arms the gate.
///
/// # Examples
///
/// ```rust
/// use lazy_gate::OnceGate;
///
/// let gate = OnceGate::new();
/// gate.register(|| Ok(()));
///
/// assert!(!gate.is_done());
/// assert!(gate.run().is_ok());
/// assert!(gate.is_done());
///
/// // A completed epoch replays its outcome without re-running the action.
/// assert!(gate.run().is_ok());
///
/// // Reset starts a new epoch; the same action runs again on next use.
/// gate.reset();
/// assert!(!gate.is_done());
/// ```
pub struct OnceGate {
   state: GateState,
   action: ArcSwapOption<Action>,
   outcome: ArcSwapOption<anyhow::Error>,
}

impl OnceGate {
   /// Creates an idle gate with no registered action and no cached outcome.
   #[inline]
   #[must_use]
   pub fn new() -> Self {
      Self {
         state: GateState::new(),
         action: ArcSwapOption::empty(),
         outcome: ArcSwapOption::empty(),
      }
   }

   /// Registers the action to run.
   ///
   /// The first registration wins; later calls are ignored. Registering more
   /// than once without an intervening epoch is a caller error, tolerated
   /// rather than surfaced. The registration survives resets: every epoch
   /// re-runs the same action.
   pub fn register<F>(&self, action: F)
   where
      F: Fn() -> Result<()> + Send + Sync + 'static,
   {
      if self.action.load().is_some() {
         trace!("gate action already registered, keeping the first one");
         return;
      }
      self.action.store(Some(Arc::new(Box::new(action))));
   }

   /// Runs the registered action if this epoch has not run yet, otherwise
   /// replays the cached outcome.
   ///
   /// Concurrent callers during an in-flight run block until that single
   /// execution completes, then observe its outcome. A failed run caches the
   /// error and replays it verbatim until the next [`reset`](Self::reset);
   /// the gate never retries on its own.
   ///
   /// Calling `run` before anything was registered is a no-op returning
   /// `Ok(())`; the gate stays idle so a later registration still takes
   /// effect.
   ///
   /// If the action panics, the panic propagates to the triggering caller
   /// and the gate returns to idle: panics are not cached outcomes.
   #[inline]
   pub fn run(&self) -> Result<(), InitError> {
      if self.state.is_done(Ordering::Acquire) {
         return self.cached();
      }
      self.run_slow()
   }

   /// Cold path for `run`. Acquires the lock and executes the action.
   #[cold]
   fn run_slow(&self) -> Result<(), InitError> {
      let Some(guard) = self.state.lock() else {
         // Another thread completed the run while we waited.
         return self.cached();
      };
      let Some(action) = self.action.load_full() else {
         // Nothing registered yet; dropping the guard leaves the gate idle.
         return Ok(());
      };

      trace!("running gate action");
      match (*action)() {
         Ok(()) => {
            guard.commit();
            Ok(())
         }
         Err(err) => {
            let err = Arc::new(err);
            warn!(error = %err, "gate action failed, caching the error until reset");
            // The store happens before the commit, so any caller observing
            // the done state also observes the cached error.
            self.outcome.store(Some(Arc::clone(&err)));
            guard.commit();
            Err(InitError::new(err))
         }
      }
   }

   /// Starts a new epoch: clears the cached outcome and returns the gate to
   /// idle, so the next [`run`](Self::run) executes the action again.
   ///
   /// Blocks until any in-flight run completes before taking effect. A reset
   /// racing with callers that already observed the previous epoch's outcome
   /// has no defined ordering; serializing resets against concurrent use is
   /// the caller's responsibility.
   pub fn reset(&self) {
      let guard = self.state.lock_exclusive();
      self.outcome.store(None);
      trace!("gate reset, next run will execute the action again");
      // Dropping the guard transitions back to idle and wakes waiters.
      drop(guard);
   }

   /// Checks whether the current epoch has completed. Never blocks.
   #[inline]
   pub fn is_done(&self) -> bool {
      self.state.is_done(Ordering::Acquire)
   }

   /// The error cached by this epoch's run, if it failed. Never blocks.
   #[inline]
   pub fn error(&self) -> Option<InitError> {
      self.outcome.load_full().map(InitError::new)
   }

   /// Replays the outcome of the completed run.
   ///
   /// Invariant: `outcome` is `None` whenever the gate is idle, so a `None`
   /// here means the run succeeded.
   #[inline]
   fn cached(&self) -> Result<(), InitError> {
      match self.outcome.load_full() {
         None => Ok(()),
         Some(err) => Err(InitError::new(err)),
      }
   }
}

impl Default for OnceGate {
   /// Creates an idle gate, equivalent to [`OnceGate::new`].
   #[inline]
   fn default() -> Self {
      Self::new()
   }
}

impl fmt::Debug for OnceGate {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("OnceGate")
         .field("done", &self.is_done())
         .field("failed", &self.outcome.load().is_some())
         .finish()
   }
}
