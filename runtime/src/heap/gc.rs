use crate::debug_log;
use crate::heap::Heap;
use crate::heap::method_area::MethodArea;
use crate::thread::JavaThreadState;
use crate::vm::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GcPolicy {
    MarkSweep,
}

/// Stop-the-world mark-sweep collector. Only consulted at the method entry
/// and return safepoints, so the root set is exactly the frame stack, the
/// static fields and the string pool.
pub struct Collector {
    threshold_bytes: usize,
    collections: u64,
}

impl Collector {
    pub fn new(threshold_bytes: usize) -> Self {
        Self {
            threshold_bytes,
            collections: 0,
        }
    }

    pub fn shall_gc(&self, heap: &Heap) -> bool {
        heap.bytes_allocated() >= self.threshold_bytes
    }

    /// With one mutator per VM instance the world is already stopped when a
    /// safepoint is reached; this is the barrier where other mutators would
    /// park.
    pub fn stop_the_world(&self) {
        debug_log!("gc: stopping the world");
    }

    pub fn collect(
        &mut self,
        policy: GcPolicy,
        heap: &mut Heap,
        method_area: &MethodArea,
        thread: &JavaThreadState,
    ) -> usize {
        let GcPolicy::MarkSweep = policy;
        self.collections += 1;

        let mut roots = Vec::new();
        for frame in thread.stack.frames() {
            for value in frame.locals().iter().chain(frame.operands()) {
                if let Value::Ref(obj) = value {
                    roots.push(*obj);
                }
            }
        }
        roots.extend(method_area.static_reference_roots());

        heap.mark_from_roots(roots);
        let freed = heap.sweep();

        // Raise the threshold when a collection barely helps, so a mostly
        // live heap does not trigger a sweep at every safepoint.
        if heap.bytes_allocated() >= self.threshold_bytes {
            self.threshold_bytes = heap.bytes_allocated() * 2;
        }
        debug_log!(
            "gc #{}: freed {} slots, {} bytes live",
            self.collections,
            freed,
            heap.bytes_allocated()
        );
        freed
    }

    pub fn collections(&self) -> u64 {
        self.collections
    }
}
