use crate::error::JvmError;
use crate::thread::JavaThreadState;

pub mod class_loader;
pub mod error;
pub mod heap;
pub mod interpreter;
pub mod keys;
pub mod native;
pub mod rt;
pub mod thread;
pub mod vm;

pub use keys::{ClassId, FieldDescriptorId, MethodDescriptorId, MethodId, Symbol, ThreadId};
pub use vm::{ObjectRef, Value, VirtualMachine};

#[doc(hidden)]
pub use tracing_log as __tracing_log;

#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)+) => {
        $crate::__tracing_log::log::debug!($($arg)+)
    };
}

#[macro_export]
macro_rules! debug_error_log {
    ($($arg:tt)+) => {
        $crate::__tracing_log::log::error!($($arg)+)
    };
}

#[derive(Debug, Clone)]
pub struct VmConfig {
    /// Classpath directories searched for user `.class` files.
    pub class_path: Vec<String>,
    /// Binary name of the class whose `main` is invoked, slash-separated.
    pub main_class: String,
    /// Arguments passed through to `main` as a `String[]`.
    pub program_args: Vec<String>,
    pub heap_size_mb: usize,
    pub frame_stack_depth: usize,
    pub gc_threshold_mb: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            class_path: Vec::new(),
            main_class: String::new(),
            program_args: Vec::new(),
            heap_size_mb: 64,
            frame_stack_depth: 1024,
            gc_threshold_mb: 32,
        }
    }
}

/// Boot a VM, run the configured main class and report an escaping throwable.
pub fn start(config: VmConfig) -> Result<(), JvmError> {
    let frame_stack_depth = config.frame_stack_depth;
    let vm = VirtualMachine::new(config)?;
    let mut thread = JavaThreadState::new(ThreadId::from_usize(0), frame_stack_depth);
    match vm.run_main(&mut thread) {
        Ok(()) => Ok(()),
        Err(JvmError::JavaExceptionThrown(exception)) => {
            vm.report_uncaught_exception(&thread, exception);
            Err(JvmError::JavaExceptionThrown(exception))
        }
        Err(e) => {
            debug_error_log!("VM terminated: {}", e);
            eprintln!("Error: {}", e);
            Err(e)
        }
    }
}
