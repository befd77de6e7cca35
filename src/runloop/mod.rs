//! Cooperative run-loop and finite-state-machine engine. Everything above
//! this layer assumes a single call graph per thread id between two
//! `iterate()`/`update()` calls — no preemption, no re-entrancy.

pub mod fsm;
pub mod scheduler;

pub use fsm::Fsm;
pub use scheduler::RunLoop;
