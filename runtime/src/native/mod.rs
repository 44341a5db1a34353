use crate::error::JvmError;
use crate::keys::FullyQualifiedMethodKey;
use crate::thread::JavaThreadState;
use crate::vm::{Value, VirtualMachine};
use dashmap::DashMap;
use lasso::ThreadedRodeo;
use std::sync::Arc;

pub mod preregistered;

pub type NativeRet = Result<Option<Value>, JvmError>;

/// Host callback backing a `native` method. `args[0]` is the receiver for
/// instance methods.
pub type NativeMethod = fn(&VirtualMachine, &mut JavaThreadState, &[Value]) -> NativeRet;

/// Process-wide (per VM) mapping from `class.method.descriptor` to the host
/// callback. Lookup misses are handled by the invoker as no-ops returning
/// null.
pub struct NativeRegistry {
    methods: DashMap<FullyQualifiedMethodKey, NativeMethod>,
    pub string_interner: Arc<ThreadedRodeo>,
}

impl NativeRegistry {
    pub fn new(string_interner: Arc<ThreadedRodeo>) -> Self {
        Self {
            methods: DashMap::new(),
            string_interner,
        }
    }

    pub fn register(&mut self, key: FullyQualifiedMethodKey, method: NativeMethod) {
        self.methods.insert(key, method);
    }

    pub fn get(&self, key: &FullyQualifiedMethodKey) -> Option<NativeMethod> {
        self.methods.get(key).map(|entry| *entry.value())
    }
}
