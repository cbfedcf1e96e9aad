//! Signal-driven runner with the same observable behavior as the blocking one.

use crate::context::ValueContext;
use crate::module::ModuleError;
use crate::plans::Plan;
use petgraph::graph::NodeIndex;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use tracing::trace;

/// Runs a plan as a pub/sub exchange between modules.
///
/// Every module completion publishes a signal on a [`flume`] channel. The
/// dispatch loop consumes signals, decrements the pending-input count of each
/// downstream module along the completed module's outgoing edges, and enqueues
/// a module the moment its last input has fired. Ready modules run
/// smallest-vertex-first, which makes the execution order identical to
/// [`BlockingScheduler`](super::BlockingScheduler)'s topological sequence.
///
/// The runner stays single-threaded; the channel is the seam a concurrent
/// variant would widen.
pub struct SignalScheduler<X = ()> {
    plan: Plan<X>,
    in_degrees: Vec<usize>,
}

impl<X> SignalScheduler<X> {
    #[must_use]
    pub fn new(plan: Plan<X>) -> Self {
        let in_degrees = plan.in_degrees();
        Self { plan, in_degrees }
    }

    /// Runs every module once against a fresh context and returns it.
    pub fn run(&mut self, extra: &mut X) -> Result<ValueContext, ModuleError> {
        let mut slots = ValueContext::new(self.plan.num_channels());
        self.run_in(&mut slots, extra)?;
        Ok(slots)
    }

    /// Runs against a caller-owned context.
    pub fn run_in(&mut self, slots: &mut ValueContext, extra: &mut X) -> Result<(), ModuleError> {
        let (completions, signals) = flume::unbounded::<usize>();
        let mut pending = self.in_degrees.clone();
        let mut ready: BinaryHeap<Reverse<usize>> = pending
            .iter()
            .enumerate()
            .filter(|(_, &count)| count == 0)
            .map(|(index, _)| Reverse(index))
            .collect();

        let mut ran = 0;
        while let Some(Reverse(index)) = ready.pop() {
            let module = &mut self.plan.modules_mut()[index];
            module.invoke(slots, extra)?;
            trace!(module = %module.id(), "completed, signalling");
            completions
                .send(index)
                .expect("signal receiver lives for the whole run");

            while let Ok(done) = signals.try_recv() {
                ran += 1;
                let fired: Vec<usize> = self
                    .plan
                    .dependencies()
                    .neighbors(NodeIndex::new(done))
                    .map(NodeIndex::index)
                    .collect();
                for listener in fired {
                    pending[listener] -= 1;
                    if pending[listener] == 0 {
                        ready.push(Reverse(listener));
                    }
                }
            }
        }
        debug_assert_eq!(ran, self.plan.len(), "every module ran exactly once");
        Ok(())
    }

    #[must_use]
    pub fn plan(&self) -> &Plan<X> {
        &self.plan
    }

    #[must_use]
    pub fn into_plan(self) -> Plan<X> {
        self.plan
    }
}
