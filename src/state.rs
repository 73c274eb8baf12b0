//! Internal synchronization state for the initialization gate.
//!
//! The state is packed into a single `AtomicU8`:
//! - Bit 0: DONE - the action for the current epoch has completed
//! - Bit 1: LOCKED - a run (or a reset) is in flight
//! - Bit 2: WAITING - at least one thread is parked on this state
//! - Bits 3-7: EPOCH - generation counter, bumped on every commit and reset
//!
//! Checking for completion is a single lock-free load; threads that arrive
//! while a run is in flight park on the state word via `parking_lot_core`
//! and are woken when the run commits or aborts.

use core::mem;
use core::sync::atomic::{AtomicU8, Ordering};

use parking_lot_core::{DEFAULT_PARK_TOKEN, DEFAULT_UNPARK_TOKEN};

/// Atomic state word shared by all callers of a gate.
#[repr(transparent)]
pub(crate) struct GateState(AtomicU8);

impl GateState {
   /// Bit flag: the current epoch's run has completed.
   const DONE: u8 = 1;
   /// Bit flag: a run or reset holds the gate.
   const LOCKED: u8 = 2;
   /// Bit flag: at least one thread is parked, waiting for the holder.
   const WAITING: u8 = 4;
   /// Start of the epoch bits.
   const EPOCH_1: u8 = 8;
   /// Mask for the epoch bits.
   const EPOCH_MASK: u8 = !(Self::DONE | Self::LOCKED | Self::WAITING);

   /// Calculates the next epoch value based on the current state.
   #[inline(always)]
   const fn next_epoch(current_state: u8) -> u8 {
      (current_state & Self::EPOCH_MASK).wrapping_add(Self::EPOCH_1) & Self::EPOCH_MASK
   }

   /// Creates a new state representing an idle, never-run gate.
   #[inline]
   pub(crate) const fn new() -> Self {
      Self(AtomicU8::new(0))
   }

   /// Wakes every thread parked on this state word.
   #[inline]
   fn notify_all(&self) {
      // SAFETY: The address passed to unpark must match the address used for
      // park. We consistently use the address of the AtomicU8.
      unsafe {
         parking_lot_core::unpark_all(self.0.as_ptr() as usize, DEFAULT_UNPARK_TOKEN);
      }
   }

   /// Parks the calling thread until the state changes from `expected_state`.
   #[inline]
   fn wait(&self, expected_state: u8) {
      // SAFETY: See safety comment in `notify_all`.
      unsafe {
         // park() re-checks the condition closure before sleeping and only
         // sleeps while the state still matches. Wake-ups may be spurious;
         // callers loop and re-examine the state.
         let _ = parking_lot_core::park(
            self.0.as_ptr() as usize,
            || self.0.load(Ordering::Acquire) == expected_state,
            || {},
            |_, _| {},
            DEFAULT_PARK_TOKEN,
            None,
         );
      }
   }

   /// Transitions to DONE, bumps the epoch and wakes any waiters.
   ///
   /// Must only be called while holding the lock (via `GateGuard`).
   #[inline]
   fn set_done(&self) {
      let current_state = self.0.load(Ordering::Relaxed);
      let new_state = Self::DONE | Self::next_epoch(current_state);

      // Release ordering: the outcome (cached error, delegate swap) written
      // by the lock holder happens-before any Acquire load that observes
      // DONE.
      let prev_state = self.0.swap(new_state, Ordering::Release);
      if prev_state & Self::WAITING != 0 {
         self.notify_all();
      }
   }

   /// Transitions back to idle (clears DONE and LOCKED), bumps the epoch and
   /// wakes any waiters.
   ///
   /// Must only be called while holding the lock (via `GateGuard`).
   #[inline]
   fn set_idle(&self) {
      let current_state = self.0.load(Ordering::Relaxed);
      let new_state = Self::next_epoch(current_state);

      // Release ordering: a reset's clearing of the cached outcome
      // happens-before the next run observes the idle state.
      let prev_state = self.0.swap(new_state, Ordering::Release);
      if prev_state & Self::WAITING != 0 {
         self.notify_all();
      }
   }

   /// Checks whether the DONE flag is set.
   #[inline]
   pub(crate) fn is_done(&self, ordering: Ordering) -> bool {
      self.0.load(ordering) & Self::DONE != 0
   }

   /// One attempt at acquiring the lock.
   ///
   /// With `steal_done` false, a DONE state short-circuits to `Ok(None)`.
   /// With `steal_done` true (reset path), DONE is claimed: the flag is
   /// cleared as part of taking the lock, so `Ok(None)` cannot occur.
   ///
   /// Returns `Err(state)` when another thread holds the lock; the returned
   /// state has the WAITING flag set and is the value to park on.
   #[inline]
   fn lock_step(&self, steal_done: bool) -> Result<Option<GateGuard<'_>>, u8> {
      loop {
         // Acquire pairs with the Release transition in `set_done`, so a
         // caller that observes DONE here also observes the cached outcome.
         let current_state = self.0.load(Ordering::Acquire);
         if !steal_done && current_state & Self::DONE != 0 {
            return Ok(None);
         }

         if current_state & Self::LOCKED == 0 {
            let new_state = (current_state & !Self::DONE) | Self::LOCKED;
            match self.0.compare_exchange_weak(
               current_state,
               new_state,
               Ordering::Acquire,
               Ordering::Relaxed,
            ) {
               Ok(_) => return Ok(Some(GateGuard::new(self))),
               Err(_) => {
                  std::hint::spin_loop();
                  continue;
               }
            }
         }

         // Lock is held by someone else; make sure WAITING is set before
         // parking so the holder knows to wake us.
         if current_state & Self::WAITING == 0 {
            let new_state = current_state | Self::WAITING;
            match self.0.compare_exchange_weak(
               current_state,
               new_state,
               Ordering::Relaxed,
               Ordering::Relaxed,
            ) {
               Ok(_) => return Err(new_state),
               Err(_) => {
                  std::hint::spin_loop();
                  continue;
               }
            }
         }
         return Err(current_state);
      }
   }

   /// Acquires the run lock, blocking while another thread holds it.
   ///
   /// Returns `None` if the state became DONE, either before this call or
   /// while waiting for the holder.
   #[inline]
   pub(crate) fn lock(&self) -> Option<GateGuard<'_>> {
      match self.lock_step(false) {
         Ok(guard_opt) => guard_opt,
         Err(mut observed_state) => loop {
            self.wait(observed_state);
            match self.lock_step(false) {
               Ok(guard_opt) => return guard_opt,
               Err(new_state) => observed_state = new_state,
            }
         },
      }
   }

   /// Acquires the lock regardless of the DONE flag, blocking while another
   /// thread holds it. Used by reset: an in-flight run finishes before the
   /// reset takes effect.
   #[inline]
   pub(crate) fn lock_exclusive(&self) -> GateGuard<'_> {
      let mut step = self.lock_step(true);
      loop {
         match step {
            Ok(Some(guard)) => return guard,
            // DONE is claimed in the steal path, so Ok(None) cannot occur.
            Ok(None) => unreachable!("exclusive lock observed a done state"),
            Err(observed_state) => {
               self.wait(observed_state);
               step = self.lock_step(true);
            }
         }
      }
   }
}

/// RAII guard for the LOCKED state.
///
/// `commit()` marks the epoch as DONE. Dropping the guard without committing
/// returns the gate to idle, so a panicking action or an abandoned run
/// re-arms the gate and wakes any waiters.
pub(crate) struct GateGuard<'a> {
   state: &'a GateState,
}

impl<'a> GateGuard<'a> {
   /// Creates a new guard. Assumes the LOCKED flag is already set on `state`.
   #[inline(always)]
   const fn new(state: &'a GateState) -> Self {
      Self { state }
   }

   /// Marks the epoch as complete, consumes the guard and notifies waiters.
   #[inline(always)]
   pub(crate) fn commit(self) {
      self.state.set_done();
      mem::forget(self); // Prevent Drop from resetting the state
   }
}

impl Drop for GateGuard<'_> {
   #[inline(always)]
   fn drop(&mut self) {
      self.state.set_idle(); // Back to idle, notifies waiters
   }
}
