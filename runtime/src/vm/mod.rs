use crate::error::{JavaExceptionFromJvm, JvmError};
use crate::heap::Heap;
use crate::heap::gc::{Collector, GcPolicy};
use crate::heap::method_area::MethodArea;
use crate::interpreter::Interpreter;
use crate::keys::ClassId;
use crate::native::NativeRegistry;
use crate::thread::JavaThreadState;
use crate::vm::bootstrap_registry::BootstrapRegistry;
use crate::{VmConfig, debug_log, throw_exception};
use lasso::ThreadedRodeo;
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub mod bootstrap_registry;
pub mod stack;
pub mod throw;

/// Index into the heap's slot table. Slot 0 is reserved, so a live address is
/// never zero.
pub type HeapAddr = usize;

/// A non-null reference: the referenced object's class plus its heap slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub class_id: ClassId,
    pub addr: HeapAddr,
}

/// Used to represent stack operands, local variables, arguments and static
/// field values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Integer(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Ref(ObjectRef),
    Null,
}

impl Value {
    /// Category-2 computational types occupy two local slots.
    pub fn is_wide(&self) -> bool {
        matches!(self, Value::Long(_) | Value::Double(_))
    }

    pub fn as_nullable_obj_ref(&self) -> Result<Option<ObjectRef>, JvmError> {
        match self {
            Value::Ref(obj) => Ok(Some(*obj)),
            Value::Null => Ok(None),
            other => Err(JvmError::UnexpectedType(format!(
                "expected a reference, found {:?}",
                other
            ))),
        }
    }

    pub fn as_obj_ref(&self) -> Result<ObjectRef, JvmError> {
        match self {
            Value::Ref(obj) => Ok(*obj),
            Value::Null => throw_exception!(NullPointerException),
            other => Err(JvmError::UnexpectedType(format!(
                "expected a reference, found {:?}",
                other
            ))),
        }
    }

    pub fn as_int(&self) -> Result<i32, JvmError> {
        match self {
            Value::Integer(v) => Ok(*v),
            other => Err(JvmError::UnexpectedType(format!(
                "expected an int, found {:?}",
                other
            ))),
        }
    }

    pub fn as_long(&self) -> Result<i64, JvmError> {
        match self {
            Value::Long(v) => Ok(*v),
            other => Err(JvmError::UnexpectedType(format!(
                "expected a long, found {:?}",
                other
            ))),
        }
    }

    pub fn as_float(&self) -> Result<f32, JvmError> {
        match self {
            Value::Float(v) => Ok(*v),
            other => Err(JvmError::UnexpectedType(format!(
                "expected a float, found {:?}",
                other
            ))),
        }
    }

    pub fn as_double(&self) -> Result<f64, JvmError> {
        match self {
            Value::Double(v) => Ok(*v),
            other => Err(JvmError::UnexpectedType(format!(
                "expected a double, found {:?}",
                other
            ))),
        }
    }
}

impl From<sigrun_common::jtype::AllocationType> for Value {
    fn from(ty: sigrun_common::jtype::AllocationType) -> Self {
        use sigrun_common::jtype::AllocationType;
        match ty {
            AllocationType::Boolean
            | AllocationType::Byte
            | AllocationType::Char
            | AllocationType::Short
            | AllocationType::Int => Value::Integer(0),
            AllocationType::Long => Value::Long(0),
            AllocationType::Float => Value::Float(0.0),
            AllocationType::Double => Value::Double(0.0),
            AllocationType::Reference => Value::Null,
        }
    }
}

impl From<&sigrun_common::descriptor::JavaType> for Value {
    fn from(jtype: &sigrun_common::descriptor::JavaType) -> Self {
        Value::from(jtype.as_allocation_type())
    }
}

/// One VM instance: the shared method area and heap plus the collaborators
/// the interpreter consults. Threads each carry their own
/// [`JavaThreadState`]; everything here is handed around by reference.
pub struct VirtualMachine {
    heap: RwLock<Heap>,
    method_area: RwLock<MethodArea>,
    pub native_registry: NativeRegistry,
    collector: Mutex<Collector>,
    interner: Arc<ThreadedRodeo>,
    pub br: Arc<BootstrapRegistry>,
    config: VmConfig,
}

impl VirtualMachine {
    pub fn new(config: VmConfig) -> Result<Self, JvmError> {
        let interner = Arc::new(ThreadedRodeo::default());
        let (method_area, br) = MethodArea::init(&config, interner.clone())?;

        let string_class_id = br.get_java_lang_string_id()?;
        let string_instance_size = method_area
            .get_instance_class(&string_class_id)?
            .get_instance_size()?;
        let char_array_class_id = br.get_char_array_class_id()?;
        let heap = Heap::new(
            config.heap_size_mb,
            interner.clone(),
            string_class_id,
            string_instance_size,
            char_array_class_id,
        );

        let mut native_registry = NativeRegistry::new(interner.clone());
        crate::native::preregistered::register_all(&mut native_registry);

        let collector = Mutex::new(Collector::new(config.gc_threshold_mb * 1024 * 1024));

        let vm = Self {
            heap: RwLock::new(heap),
            method_area: RwLock::new(method_area),
            native_registry,
            collector,
            interner,
            br,
            config,
        };
        vm.bootstrap_system_streams()?;
        Ok(vm)
    }

    pub fn heap_read(&self) -> RwLockReadGuard<'_, Heap> {
        self.heap.read().unwrap()
    }

    pub fn heap_write(&self) -> RwLockWriteGuard<'_, Heap> {
        self.heap.write().unwrap()
    }

    pub fn method_area_read(&self) -> RwLockReadGuard<'_, MethodArea> {
        self.method_area.read().unwrap()
    }

    pub fn method_area_write(&self) -> RwLockWriteGuard<'_, MethodArea> {
        self.method_area.write().unwrap()
    }

    pub fn interner(&self) -> &ThreadedRodeo {
        &self.interner
    }

    pub fn frame_stack_depth(&self) -> usize {
        self.config.frame_stack_depth
    }

    /// `System.out` and `System.err` are plain `PrintStream` instances over
    /// the host file descriptors; their natives look at the `fd` field.
    fn bootstrap_system_streams(&self) -> Result<(), JvmError> {
        let system_id = self.br.get_java_lang_system_id()?;
        let print_stream_id = self.br.get_java_io_print_stream_id()?;

        for (field_key, fd) in [(self.br.system_out_fk, 1), (self.br.system_err_fk, 2)] {
            let stream_ref = {
                let ma = self.method_area_read();
                let print_stream_class = ma.get_instance_class(&print_stream_id)?;
                let mut heap = self.heap_write();
                let stream_ref = heap.alloc_instance(print_stream_id, print_stream_class)?;
                heap.write_field_by_name(
                    stream_ref.addr,
                    print_stream_class,
                    self.br.print_stream_fd_fk.name,
                    Value::Integer(fd),
                )?;
                stream_ref
            };
            self.method_area_read()
                .get_instance_class(&system_id)?
                .set_static_field_value(&field_key, Value::Ref(stream_ref))?;
        }
        Ok(())
    }

    /// Materialize a VM-raised Java exception as a real heap throwable, so it
    /// can run through exception tables like any bytecode-thrown object.
    pub fn map_rust_error_to_java_exception(
        &self,
        thread: &mut JavaThreadState,
        exception: JavaExceptionFromJvm,
    ) -> Result<ObjectRef, JvmError> {
        let class_sym = self.interner.get_or_intern(exception.kind.class_name());
        let class_id = self
            .method_area_write()
            .get_class_id_or_load(class_sym, thread.id)?;

        let exception_ref = {
            let ma = self.method_area_read();
            let class = ma.get_instance_class(&class_id)?;
            self.heap_write().alloc_instance(class_id, class)?
        };

        if let Some(message) = exception.message {
            let text = message.into_resolved(&self.interner);
            let string_ref = self.heap_write().alloc_string(&text)?;
            let ma = self.method_area_read();
            let class = ma.get_instance_class(&class_id)?;
            self.heap_write().write_field_by_name(
                exception_ref.addr,
                class,
                self.br.message_fk.name,
                Value::Ref(string_ref),
            )?;
        }
        Ok(exception_ref)
    }

    /// The detail message of a throwable instance, if one was recorded.
    pub fn throwable_message(&self, exception: ObjectRef) -> Option<String> {
        let ma = self.method_area_read();
        let class = ma.get_instance_class(&exception.class_id).ok()?;
        let heap = self.heap_read();
        let message =
            heap.read_field_by_name(exception.addr, class, self.br.message_fk.name).ok()?;
        match message {
            Value::Ref(string_ref) => heap.get_rust_string_from_java_string(string_ref.addr).ok(),
            _ => None,
        }
    }

    /// Load, initialize and run the configured main class. An escaping
    /// throwable comes back as `JvmError::JavaExceptionThrown`.
    pub fn run_main(&self, thread: &mut JavaThreadState) -> Result<(), JvmError> {
        let main_class_sym = self.interner.get_or_intern(&self.config.main_class);
        let class_id = self
            .method_area_write()
            .get_class_id_or_load(main_class_sym, thread.id)?;
        Interpreter::ensure_initialized(thread, Some(class_id), self)?;

        let args_ref = self.build_main_args(thread)?;
        let has_main = {
            let ma = self.method_area_read();
            ma.find_method(class_id, &self.br.main_mk).is_some()
        };
        if !has_main {
            return Err(JvmError::MainMethodNotFound(self.config.main_class.clone()));
        }
        Interpreter::invoke_by_name(
            thread,
            class_id,
            self.br.main_mk,
            self,
            vec![Value::Ref(args_ref)],
        )?;
        Ok(())
    }

    fn build_main_args(&self, thread: &mut JavaThreadState) -> Result<ObjectRef, JvmError> {
        let array_class_id = self
            .method_area_write()
            .get_class_id_or_load(self.br.string_array_desc, thread.id)?;
        let args_ref = self
            .heap_write()
            .alloc_object_array(array_class_id, self.config.program_args.len() as i32)?;
        for (i, arg) in self.config.program_args.iter().enumerate() {
            let string_ref = self.heap_write().alloc_string(arg)?;
            self.heap_write()
                .write_array_element(args_ref.addr, i as i32, Value::Ref(string_ref))?;
        }
        Ok(args_ref)
    }

    pub fn report_uncaught_exception(&self, thread: &JavaThreadState, exception: ObjectRef) {
        let class_name = {
            let ma = self.method_area_read();
            match ma.class_name(exception.class_id) {
                Some(sym) => self.interner.resolve(&sym).replace('/', "."),
                None => "<unknown throwable>".to_string(),
            }
        };
        match self.throwable_message(exception) {
            Some(message) => eprintln!("Exception in thread \"main\" {}: {}", class_name, message),
            None => eprintln!("Exception in thread \"main\" {}", class_name),
        }
        for frame_name in thread.backtrace() {
            eprintln!("\tat {}", frame_name);
        }
    }

    /// Safepoint: consult the collector and run mark-sweep if the heap
    /// crossed the threshold. Called at method entry and return only.
    pub(crate) fn safepoint(&self, thread: &JavaThreadState) {
        let needs_gc = {
            let heap = self.heap_read();
            self.collector.lock().unwrap().shall_gc(&heap)
        };
        if !needs_gc {
            return;
        }
        let ma = self.method_area_read();
        let mut heap = self.heap_write();
        let mut collector = self.collector.lock().unwrap();
        collector.stop_the_world();
        let freed = collector.collect(GcPolicy::MarkSweep, &mut heap, &ma, thread);
        debug_log!("gc freed {} heap slots", freed);
    }
}
