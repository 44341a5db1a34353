use crate::keys::ThreadId;
use crate::vm::stack::FrameStack;

/// Per-interpreter mutable state: the frame stack plus the trace being
/// collected for the exception currently in flight, if any.
pub struct JavaThreadState {
    pub id: ThreadId,
    pub stack: FrameStack,
    backtrace: Vec<String>,
}

impl JavaThreadState {
    pub fn new(id: ThreadId, frame_stack_depth: usize) -> Self {
        Self {
            id,
            stack: FrameStack::new(frame_stack_depth),
            backtrace: Vec::new(),
        }
    }

    /// Record the name of a frame the pending exception propagated out of.
    pub fn record_unwound_frame(&mut self, method_name: String) {
        self.backtrace.push(method_name);
    }

    pub fn clear_backtrace(&mut self) {
        self.backtrace.clear();
    }

    pub fn backtrace(&self) -> &[String] {
        &self.backtrace
    }
}
