//! Cooperative, thread-indexed run-loop.
//!
//! Each registered thread id is an independent run-loop context: a list of
//! periodic entries run in registration order every `iterate()`, plus a
//! FIFO of one-shots drained after the periodics. Nothing here blocks;
//! platform code is expected to call `iterate()` for each thread id from
//! its own main loop (or ISR-safe polling point).

use crate::config::{MAX_ONESHOTS_PER_THREAD, MAX_PERIODICS_PER_THREAD, MAX_RUNLOOP_THREADS};
use crate::containers::fifo::OnFullPolicy;
use crate::containers::{Fifo, FixedArray};

/// Identifies one cooperative run-loop thread.
pub type ThreadId = u8;

/// Runs once, the first time its owning thread is iterated.
pub type OnInitFn<U> = fn(&mut U);
/// Runs every iteration of its owning thread.
pub type PeriodicFn<U> = fn(&mut U);
/// Runs exactly once, no earlier than the next iteration of its thread
/// after being dispatched.
pub type OneShotFn<U> = fn(&mut U);

struct PeriodicEntry<U> {
    on_init: Option<OnInitFn<U>>,
    periodic: PeriodicFn<U>,
    initialized: bool,
}

struct Thread<U> {
    id: ThreadId,
    periodics: FixedArray<PeriodicEntry<U>, MAX_PERIODICS_PER_THREAD>,
    oneshots: Fifo<OneShotFn<U>, MAX_ONESHOTS_PER_THREAD>,
}

impl<U> Thread<U> {
    fn new(id: ThreadId) -> Self {
        Self {
            id,
            periodics: FixedArray::new(),
            oneshots: Fifo::new(OnFullPolicy::DropNewest),
        }
    }
}

/// A registry of cooperative run-loop threads, each driven independently
/// by platform code calling [`RunLoop::iterate`].
pub struct RunLoop<U> {
    threads: FixedArray<Thread<U>, MAX_RUNLOOP_THREADS>,
}

impl<U> RunLoop<U> {
    pub const fn new() -> Self {
        Self {
            threads: FixedArray::new(),
        }
    }

    /// Register a new thread id. Returns `false` if already registered or
    /// the thread table is full.
    pub fn add_thread(&mut self, id: ThreadId) -> bool {
        if self.find_index(id).is_some() {
            return false;
        }
        self.threads.append(Thread::new(id))
    }

    /// Register a periodic entry on `thread_id`. `on_init`, if given, runs
    /// once the first time that thread is iterated, before any periodic
    /// (including this one) runs for the first time. Returns `false` if
    /// the thread does not exist or its periodic table is full.
    pub fn add_entry(
        &mut self,
        thread_id: ThreadId,
        on_init: Option<OnInitFn<U>>,
        periodic: PeriodicFn<U>,
    ) -> bool {
        let Some(thread) = self.find_mut(thread_id) else {
            return false;
        };
        thread.periodics.append(PeriodicEntry {
            on_init,
            periodic,
            initialized: false,
        })
    }

    /// Queue `f` to run exactly once, on the next `iterate()` of
    /// `thread_id`. Returns `false` if the thread does not exist or its
    /// one-shot queue is full.
    pub fn dispatch_next_iteration(&mut self, thread_id: ThreadId, f: OneShotFn<U>) -> bool {
        let Some(thread) = self.find_mut(thread_id) else {
            return false;
        };
        thread.oneshots.enqueue(f)
    }

    /// Run one iteration of `thread_id`: any not-yet-initialized periodic's
    /// `on_init`, then every periodic in registration order, then drain
    /// the one-shot queue (FIFO order). No-op if the thread is unknown.
    pub fn iterate(&mut self, thread_id: ThreadId, ctx: &mut U) {
        let Some(thread) = self.find_mut(thread_id) else {
            return;
        };

        for entry in thread.periodics.iter_mut() {
            if !entry.initialized {
                if let Some(init) = entry.on_init {
                    init(ctx);
                }
                entry.initialized = true;
            }
        }

        for entry in thread.periodics.iter() {
            (entry.periodic)(ctx);
        }

        while let Some(f) = thread.oneshots.dequeue() {
            f(ctx);
        }
    }

    fn find_index(&self, id: ThreadId) -> Option<usize> {
        self.threads.iter().position(|t| t.id == id)
    }

    fn find_mut(&mut self, id: ThreadId) -> Option<&mut Thread<U>> {
        let idx = self.find_index(id)?;
        self.threads.get_mut(idx)
    }
}

impl<U> Default for RunLoop<U> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Ctx {
        init_count: u32,
        periodic_count: u32,
        oneshot_log: heapless::Vec<u8, 8>,
    }

    fn on_init(ctx: &mut Ctx) {
        ctx.init_count += 1;
    }

    fn periodic(ctx: &mut Ctx) {
        ctx.periodic_count += 1;
    }

    fn oneshot_a(ctx: &mut Ctx) {
        let _ = ctx.oneshot_log.push(b'a');
    }

    fn oneshot_b(ctx: &mut Ctx) {
        let _ = ctx.oneshot_log.push(b'b');
    }

    #[test]
    fn on_init_runs_exactly_once() {
        let mut rl: RunLoop<Ctx> = RunLoop::new();
        rl.add_thread(0);
        rl.add_entry(0, Some(on_init), periodic);
        let mut ctx = Ctx::default();

        rl.iterate(0, &mut ctx);
        rl.iterate(0, &mut ctx);
        rl.iterate(0, &mut ctx);

        assert_eq!(ctx.init_count, 1);
        assert_eq!(ctx.periodic_count, 3);
    }

    #[test]
    fn one_shots_run_fifo_order_and_only_once() {
        let mut rl: RunLoop<Ctx> = RunLoop::new();
        rl.add_thread(0);
        let mut ctx = Ctx::default();

        assert!(rl.dispatch_next_iteration(0, oneshot_a));
        assert!(rl.dispatch_next_iteration(0, oneshot_b));
        rl.iterate(0, &mut ctx);
        assert_eq!(ctx.oneshot_log.as_slice(), b"ab");

        rl.iterate(0, &mut ctx);
        assert_eq!(ctx.oneshot_log.as_slice(), b"ab"); // nothing queued, no repeat
    }

    #[test]
    fn unknown_thread_operations_fail_softly() {
        let mut rl: RunLoop<Ctx> = RunLoop::new();
        assert!(!rl.add_entry(9, None, periodic));
        assert!(!rl.dispatch_next_iteration(9, oneshot_a));
        let mut ctx = Ctx::default();
        rl.iterate(9, &mut ctx); // no-op, must not panic
        assert_eq!(ctx.periodic_count, 0);
    }

    #[test]
    fn duplicate_thread_registration_rejected() {
        let mut rl: RunLoop<Ctx> = RunLoop::new();
        assert!(rl.add_thread(0));
        assert!(!rl.add_thread(0));
    }
}
