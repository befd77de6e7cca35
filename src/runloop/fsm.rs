//! Declarative, dynamically-registered state machine with optional timed
//! auto-transitions.
//!
//! States are added at construction time up to `MAX_STATES`, each carrying
//! optional `enter`/`state`/`leave` function pointers and a user context
//! type `U` threaded through every call — the same function-pointer-table
//! shape as a simple fixed-enum FSM, generalized so the state set and the
//! timed/normal split are both configured at run time rather than baked
//! into an enum.

use crate::containers::FixedArray;

/// Identifies one state within an [`Fsm`]. Caller-assigned, must be unique
/// within one machine.
pub type StateId = u8;

/// Runs once on entering or leaving a state.
pub type StateActionFn<U> = fn(&mut U);

/// Runs once per `update()` tick while a state is current. Returning
/// `Some(next)` queues a transition for the *following* tick — the same
/// queued-by-default semantics as calling [`Fsm::transition`].
pub type StateUpdateFn<U> = fn(&mut U) -> Option<StateId>;

#[derive(Clone, Copy)]
enum StateKind {
    Normal,
    /// Auto-transitions to `next_id` if no other transition has been taken
    /// within `duration_ms` of entering this state.
    Timed { next_id: StateId, duration_ms: u32 },
}

struct StateDescriptor<U> {
    id: StateId,
    name: &'static str,
    on_enter: Option<StateActionFn<U>>,
    on_exit: Option<StateActionFn<U>>,
    on_update: Option<StateUpdateFn<U>>,
    kind: StateKind,
}

/// The state machine engine. `MAX_STATES` bounds how many states may be
/// registered; `U` is the user context type threaded through every
/// callback (sensor readings, actuator handles, whatever the owning
/// subsystem needs visible inside its state functions).
pub struct Fsm<U, const MAX_STATES: usize> {
    states: FixedArray<StateDescriptor<U>, MAX_STATES>,
    current: Option<StateId>,
    pending: Option<StateId>,
    state_entered_at_ms: u64,
}

impl<U, const MAX_STATES: usize> Fsm<U, MAX_STATES> {
    pub const fn new() -> Self {
        Self {
            states: FixedArray::new(),
            current: None,
            pending: None,
            state_entered_at_ms: 0,
        }
    }

    /// Register a plain state. Returns `false`, unchanged, if `id` is
    /// already registered or the table is full.
    pub fn add_state(
        &mut self,
        id: StateId,
        name: &'static str,
        on_enter: Option<StateActionFn<U>>,
        on_exit: Option<StateActionFn<U>>,
        on_update: Option<StateUpdateFn<U>>,
    ) -> bool {
        self.add_state_inner(id, name, on_enter, on_exit, on_update, StateKind::Normal)
    }

    /// Register a timed state: if no transition is taken within
    /// `duration_ms` of entering it, the machine automatically queues a
    /// transition to `next_id`.
    pub fn add_state_timed(
        &mut self,
        id: StateId,
        name: &'static str,
        on_enter: Option<StateActionFn<U>>,
        on_exit: Option<StateActionFn<U>>,
        on_update: Option<StateUpdateFn<U>>,
        next_id: StateId,
        duration_ms: u32,
    ) -> bool {
        self.add_state_inner(
            id,
            name,
            on_enter,
            on_exit,
            on_update,
            StateKind::Timed {
                next_id,
                duration_ms,
            },
        )
    }

    fn add_state_inner(
        &mut self,
        id: StateId,
        name: &'static str,
        on_enter: Option<StateActionFn<U>>,
        on_exit: Option<StateActionFn<U>>,
        on_update: Option<StateUpdateFn<U>>,
        kind: StateKind,
    ) -> bool {
        if self.states.iter().any(|s| s.id == id) {
            return false;
        }
        self.states.append(StateDescriptor {
            id,
            name,
            on_enter,
            on_exit,
            on_update,
            kind,
        })
    }

    /// Enter `initial` and run its `on_enter`. Must be called exactly once,
    /// before the first `update()`. Returns `false` if `initial` was never
    /// registered.
    pub fn start(&mut self, initial: StateId, ctx: &mut U, now_ms: u64) -> bool {
        if self.find(initial).is_none() {
            return false;
        }
        self.current = Some(initial);
        self.state_entered_at_ms = now_ms;
        if let Some(enter) = self.find(initial).and_then(|s| s.on_enter) {
            enter(ctx);
        }
        true
    }

    /// Queue a transition to `id`, taken at the start of the next
    /// `update()` call. Superseded by a later call before that update runs.
    pub fn transition(&mut self, id: StateId) {
        self.pending = Some(id);
    }

    /// Run `leave(current)` then `enter(id)` synchronously, bypassing the
    /// queue. Used for faults that must preempt whatever the current state
    /// was about to do.
    pub fn transition_now(&mut self, id: StateId, ctx: &mut U, now_ms: u64) -> bool {
        if self.find(id).is_none() {
            return false;
        }
        self.pending = None;
        self.do_transition(id, ctx, now_ms);
        true
    }

    /// Advance the machine by one tick:
    /// 1. If a transition is pending, take it and return.
    /// 2. Else, if the current state is timed and its duration has
    ///    elapsed, queue its auto-transition and return (taken next tick,
    ///    consistent with any other queued transition).
    /// 3. Else invoke the current state's `on_update`; if it returns
    ///    `Some(next)`, queue it.
    pub fn update(&mut self, ctx: &mut U, now_ms: u64) {
        if let Some(next) = self.pending.take() {
            self.do_transition(next, ctx, now_ms);
            return;
        }

        let Some(current_id) = self.current else {
            return;
        };
        let Some(desc) = self.find(current_id) else {
            return;
        };

        if let StateKind::Timed {
            next_id,
            duration_ms,
        } = desc.kind
        {
            if now_ms.saturating_sub(self.state_entered_at_ms) >= u64::from(duration_ms) {
                self.pending = Some(next_id);
                return;
            }
        }

        if let Some(update_fn) = desc.on_update {
            if let Some(next) = update_fn(ctx) {
                self.pending = Some(next);
            }
        }
    }

    pub fn current_state(&self) -> Option<StateId> {
        self.current
    }

    pub fn current_state_name(&self) -> Option<&'static str> {
        self.current.and_then(|id| self.find(id)).map(|s| s.name)
    }

    pub fn ms_in_current_state(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.state_entered_at_ms)
    }

    fn find(&self, id: StateId) -> Option<&StateDescriptor<U>> {
        self.states.iter().find(|s| s.id == id)
    }

    fn do_transition(&mut self, next_id: StateId, ctx: &mut U, now_ms: u64) {
        let Some(next_idx) = self.states.iter().position(|s| s.id == next_id) else {
            return;
        };

        if let Some(current_id) = self.current {
            if let Some(exit) = self.find(current_id).and_then(|s| s.on_exit) {
                exit(ctx);
            }
        }

        self.current = Some(next_id);
        self.state_entered_at_ms = now_ms;

        if let Some(enter) = self.states.get(next_idx).and_then(|s| s.on_enter) {
            enter(ctx);
        }
    }
}

impl<U, const MAX_STATES: usize> Default for Fsm<U, MAX_STATES> {
    fn default() -> Self {
        Self::new()
    }
}
