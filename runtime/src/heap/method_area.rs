use crate::VmConfig;
use crate::class_loader::ClassLoader;
use crate::debug_log;
use crate::error::JvmError;
use crate::keys::{
    ClassId, FieldDescriptorId, FieldKey, FullyQualifiedMethodKey, MethodDescriptorId, MethodId,
    MethodKey, Symbol, ThreadId,
};
use crate::rt::array::{ObjectArrayClass, PrimitiveArrayClass};
use crate::rt::class::InstanceClass;
use crate::rt::constant_pool::RuntimeConstantPool;
use crate::rt::field::{InstanceField, StaticField};
use crate::rt::method::{CodeBody, Method, MethodBody};
use crate::rt::RuntimeClass;
use crate::vm::{ObjectRef, Value};
use lasso::ThreadedRodeo;
use sigrun_classfile::ClassFile;
use sigrun_classfile::flags::{ClassFlags, FieldFlags, MethodFlags};
use sigrun_common::descriptor::{JavaType, MethodDescriptor};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::vm::bootstrap_registry::BootstrapRegistry;

/// The shared class registry: loaded classes, their methods, and interned
/// descriptor tables. Loading and linking are fused here; initialization is
/// driven by the interpreter.
pub struct MethodArea {
    bootstrap_class_loader: ClassLoader,
    class_name_to_index: HashMap<Symbol, ClassId>,
    classes: Vec<RuntimeClass>,
    methods: Vec<Method>,

    field_descriptors: Vec<JavaType>,
    field_descriptors_index: HashMap<Symbol, FieldDescriptorId>,

    method_descriptors: Vec<MethodDescriptor>,
    method_descriptors_index: HashMap<Symbol, MethodDescriptorId>,

    interner: Arc<ThreadedRodeo>,
    bootstrap_registry: Arc<BootstrapRegistry>,
}

struct BuiltinMethod {
    name: &'static str,
    desc: &'static str,
    flags: u16,
    native: bool,
}

impl BuiltinMethod {
    const fn bytecode(name: &'static str, desc: &'static str, flags: u16) -> Self {
        Self {
            name,
            desc,
            flags,
            native: false,
        }
    }

    const fn native(name: &'static str, desc: &'static str, flags: u16) -> Self {
        Self {
            name,
            desc,
            flags: flags | MethodFlags::ACC_NATIVE,
            native: true,
        }
    }
}

impl MethodArea {
    pub fn init(
        vm_config: &VmConfig,
        string_interner: Arc<ThreadedRodeo>,
    ) -> Result<(Self, Arc<BootstrapRegistry>), JvmError> {
        debug_log!("Creating Method Area...");
        let bootstrap_class_loader = ClassLoader::new(vm_config)?;

        let mut method_area = Self {
            bootstrap_class_loader,
            class_name_to_index: HashMap::new(),
            classes: Vec::with_capacity(256),
            methods: Vec::with_capacity(2048),
            field_descriptors: Vec::with_capacity(256),
            field_descriptors_index: HashMap::new(),
            method_descriptors: Vec::with_capacity(1024),
            method_descriptors_index: HashMap::new(),
            bootstrap_registry: Arc::new(BootstrapRegistry::new(&string_interner)),
            interner: string_interner,
        };

        method_area.define_builtin_classes()?;
        let br = method_area.bootstrap_registry.clone();
        Ok((method_area, br))
    }

    pub fn br(&self) -> &BootstrapRegistry {
        &self.bootstrap_registry
    }

    pub fn interner(&self) -> &ThreadedRodeo {
        &self.interner
    }

    pub fn interner_arc(&self) -> Arc<ThreadedRodeo> {
        self.interner.clone()
    }

    // Registries

    pub fn push_class(&mut self, class: RuntimeClass) -> ClassId {
        let name = class.name();
        self.classes.push(class);
        let class_id = ClassId::from_usize(self.classes.len());
        self.class_name_to_index.insert(name, class_id);
        class_id
    }

    pub fn get_class(&self, class_id: &ClassId) -> &RuntimeClass {
        &self.classes[class_id.to_index()]
    }

    pub fn class_name(&self, class_id: ClassId) -> Option<Symbol> {
        self.classes.get(class_id.to_index()).map(|c| c.name())
    }

    pub fn get_instance_class(&self, class_id: &ClassId) -> Result<&InstanceClass, JvmError> {
        self.get_class(class_id).as_instance_class()
    }

    pub fn push_method(&mut self, method: Method) -> MethodId {
        self.methods.push(method);
        MethodId::from_usize(self.methods.len())
    }

    pub fn get_method(&self, method_id: &MethodId) -> &Method {
        &self.methods[method_id.to_index()]
    }

    // Descriptor tables

    pub fn get_or_new_field_descriptor_id(
        &mut self,
        descriptor: Symbol,
    ) -> Result<FieldDescriptorId, JvmError> {
        if let Some(id) = self.field_descriptors_index.get(&descriptor) {
            return Ok(*id);
        }
        let descriptor_str = self.interner.resolve(&descriptor);
        let ty = JavaType::try_from(descriptor_str)?;
        self.field_descriptors.push(ty);
        let id = FieldDescriptorId::from_usize(self.field_descriptors.len());
        self.field_descriptors_index.insert(descriptor, id);
        Ok(id)
    }

    pub fn get_field_descriptor(&self, id: &FieldDescriptorId) -> &JavaType {
        &self.field_descriptors[id.to_index()]
    }

    pub fn get_or_new_method_descriptor_id(
        &mut self,
        descriptor: &Symbol,
    ) -> Result<MethodDescriptorId, JvmError> {
        if let Some(id) = self.method_descriptors_index.get(descriptor) {
            return Ok(*id);
        }
        let descriptor_str = self.interner.resolve(descriptor);
        let method_descriptor = MethodDescriptor::try_from(descriptor_str)?;
        self.method_descriptors.push(method_descriptor);
        let id = MethodDescriptorId::from_usize(self.method_descriptors.len());
        self.method_descriptors_index.insert(*descriptor, id);
        Ok(id)
    }

    pub fn get_method_descriptor(&self, id: &MethodDescriptorId) -> &MethodDescriptor {
        &self.method_descriptors[id.to_index()]
    }

    pub fn get_method_descriptor_by_method_id(&self, method_id: &MethodId) -> &MethodDescriptor {
        let method = self.get_method(method_id);
        self.get_method_descriptor(&method.descriptor_id())
    }

    pub fn build_fully_qualified_native_method_key(
        &self,
        method_id: &MethodId,
    ) -> FullyQualifiedMethodKey {
        let method = self.get_method(method_id);
        let class_name = self.get_class(&method.class_id()).name();
        FullyQualifiedMethodKey::new(class_name, method.name, method.desc)
    }

    // Loading

    pub fn find_class(&self, name_sym: Symbol) -> Option<ClassId> {
        self.class_name_to_index.get(&name_sym).copied()
    }

    pub fn get_class_id_or_load(
        &mut self,
        name_sym: Symbol,
        thread_id: ThreadId,
    ) -> Result<ClassId, JvmError> {
        if let Some(class_id) = self.class_name_to_index.get(&name_sym) {
            return Ok(*class_id);
        }
        self.load_class(name_sym, thread_id)
    }

    fn load_class(&mut self, name_sym: Symbol, thread_id: ThreadId) -> Result<ClassId, JvmError> {
        let name_str = self.interner.resolve(&name_sym).to_string();
        if name_str.starts_with('[') {
            return self.load_array_class(name_sym, thread_id);
        }
        let data = self.bootstrap_class_loader.load(&name_str)?;
        let cf = ClassFile::try_from(data)?;
        self.define_class(cf, thread_id)
    }

    /// Link an already-parsed classfile. Superclasses (and, during linking,
    /// superinterfaces) load recursively.
    pub fn define_class(&mut self, cf: ClassFile, thread_id: ThreadId) -> Result<ClassId, JvmError> {
        let super_sym = match cf.get_super_class_name()? {
            Some(name) => Some(self.interner.get_or_intern(name)),
            None => None,
        };
        let super_id = match super_sym {
            Some(sym) => Some(self.get_class_id_or_load(sym, thread_id)?),
            None => None,
        };
        InstanceClass::load_and_link(cf, self, super_id, thread_id)
    }

    /// Array classes are synthesized: the leading `[` of the name is peeled
    /// and the component class is loaded first.
    pub(crate) fn load_array_class(
        &mut self,
        name_sym: Symbol,
        thread_id: ThreadId,
    ) -> Result<ClassId, JvmError> {
        if let Some(class_id) = self.class_name_to_index.get(&name_sym) {
            return Ok(*class_id);
        }
        let name_str = self.interner.resolve(&name_sym).to_string();
        let descriptor = JavaType::try_from(name_str.as_str())?;
        let object_id = self.br().get_java_lang_object_id()?;

        let JavaType::Array(element) = descriptor else {
            return Err(JvmError::ClassStructure(format!(
                "not an array class descriptor: {}",
                name_str
            )));
        };
        let class = match element.as_ref() {
            JavaType::Primitive(primitive) => RuntimeClass::PrimitiveArray(PrimitiveArrayClass {
                name: name_sym,
                super_id: object_id,
                element_type: *primitive,
            }),
            JavaType::Instance(element_name) => {
                let element_sym = self.interner.get_or_intern(element_name);
                let element_class_id = self.get_class_id_or_load(element_sym, thread_id)?;
                RuntimeClass::ObjectArray(ObjectArrayClass {
                    name: name_sym,
                    super_id: object_id,
                    element_class_id,
                })
            }
            JavaType::Array(_) => {
                let inner_sym = self.interner.get_or_intern(&name_str[1..]);
                let element_class_id = self.load_array_class(inner_sym, thread_id)?;
                RuntimeClass::ObjectArray(ObjectArrayClass {
                    name: name_sym,
                    super_id: object_id,
                    element_class_id,
                })
            }
        };
        Ok(self.push_class(class))
    }

    // Method lookup: declared methods, then the superclass chain, then
    // direct interfaces preferring concrete matches.

    pub fn find_method(&self, class_id: ClassId, key: &MethodKey) -> Option<(MethodId, ClassId)> {
        let class = self.classes.get(class_id.to_index())?;
        let instance = match class {
            RuntimeClass::Instance(instance) => instance,
            RuntimeClass::PrimitiveArray(array) => return self.find_method(array.super_id, key),
            RuntimeClass::ObjectArray(array) => return self.find_method(array.super_id, key),
        };

        if let Some(method_id) = instance.get_declared_method(key) {
            return Some((method_id, class_id));
        }
        if let Some(super_id) = instance.get_super() {
            if let Some(found) = self.find_method(super_id, key) {
                return Some(found);
            }
        }
        self.search_interfaces_for_method(instance, key)
    }

    fn search_interfaces_for_method(
        &self,
        class: &InstanceClass,
        key: &MethodKey,
    ) -> Option<(MethodId, ClassId)> {
        let mut abstract_fallback = None;
        for &interface_id in class.get_interfaces().ok()? {
            let interface = self.get_instance_class(&interface_id).ok()?;
            if let Some(method_id) = interface.get_declared_method(key) {
                let method = self.get_method(&method_id);
                if !method.is_static() && !method.is_private() {
                    if !method.is_abstract() {
                        return Some((method_id, interface_id));
                    }
                    abstract_fallback.get_or_insert((method_id, interface_id));
                }
            }
            if let Some(found) = self.search_interfaces_for_method(interface, key) {
                if !self.get_method(&found.0).is_abstract() {
                    return Some(found);
                }
                abstract_fallback.get_or_insert(found);
            }
        }
        abstract_fallback
    }

    // Static field resolution: class chain first, then interfaces.

    pub fn resolve_static_field_class(
        &self,
        class_id: ClassId,
        field_key: &FieldKey,
    ) -> Result<ClassId, JvmError> {
        let mut cur_id = Some(class_id);
        while let Some(id) = cur_id {
            let class = self.get_instance_class(&id)?;
            if class.has_static_field(field_key)? {
                return Ok(id);
            }
            cur_id = class.get_super();
        }
        self.search_interfaces_for_static_field(class_id, field_key)
            .ok_or_else(|| {
                crate::build_exception!(
                    NoSuchFieldError,
                    field_key: *field_key,
                    class_sym: self.get_class(&class_id).name()
                )
            })
    }

    fn search_interfaces_for_static_field(
        &self,
        class_id: ClassId,
        field_key: &FieldKey,
    ) -> Option<ClassId> {
        let class = self.get_instance_class(&class_id).ok()?;
        for &interface_id in class.get_interfaces().ok()? {
            let interface = self.get_instance_class(&interface_id).ok()?;
            if interface.has_static_field(field_key).unwrap_or(false) {
                return Some(interface_id);
            }
            if let Some(found) = self.search_interfaces_for_static_field(interface_id, field_key) {
                return Some(found);
            }
        }
        None
    }

    pub fn get_static_field_value(
        &self,
        class_id: &ClassId,
        key: &FieldKey,
    ) -> Result<Value, JvmError> {
        self.get_instance_class(class_id)?.get_static_field_value(key)
    }

    // Type tests

    pub fn is_assignable_from(&self, this_class: ClassId, cls: ClassId) -> bool {
        self.is_subclass_of(cls, this_class)
    }

    /// Reflexive, transitive is-a over superclasses and declared interfaces.
    /// Arrays only class-match `java/lang/Object` (their super) and covary
    /// over reference element types.
    pub fn is_subclass_of(&self, this_class: ClassId, target_class: ClassId) -> bool {
        if this_class == target_class {
            return true;
        }

        let this = self.get_class(&this_class);
        let target = self.get_class(&target_class);

        if this.is_array() && target.is_array() {
            return match (this, target) {
                (RuntimeClass::PrimitiveArray(a), RuntimeClass::PrimitiveArray(b)) => {
                    a.element_type == b.element_type
                }
                (RuntimeClass::ObjectArray(a), RuntimeClass::ObjectArray(b)) => {
                    self.is_subclass_of(a.element_class_id, b.element_class_id)
                }
                _ => false,
            };
        }

        if let Some(super_id) = this.super_id() {
            if self.is_subclass_of(super_id, target_class) {
                return true;
            }
        }

        if let RuntimeClass::Instance(instance) = this {
            if let Ok(interfaces) = instance.get_interfaces() {
                for &interface_id in interfaces {
                    if self.is_subclass_of(interface_id, target_class) {
                        return true;
                    }
                }
            }
        }

        false
    }

    pub fn instance_of(&self, this_class_id: ClassId, other_sym: Symbol) -> bool {
        match self.class_name_to_index.get(&other_sym) {
            Some(&other_class_id) => self.is_subclass_of(this_class_id, other_class_id),
            None => false,
        }
    }

    // Constant pools

    pub fn get_cp(&self, class_id: &ClassId) -> Result<&RuntimeConstantPool, JvmError> {
        self.get_class(class_id).get_cp()
    }

    pub fn get_cp_by_method_id(
        &self,
        method_id: &MethodId,
    ) -> Result<&RuntimeConstantPool, JvmError> {
        let class_id = self.get_method(method_id).class_id();
        self.get_cp(&class_id)
    }

    // Collector support

    pub fn static_reference_roots(&self) -> Vec<ObjectRef> {
        let mut roots = Vec::new();
        for class in &self.classes {
            let RuntimeClass::Instance(instance) = class else {
                continue;
            };
            let Ok(static_fields) = instance.get_static_fields() else {
                continue;
            };
            for field in static_fields.values() {
                if let Value::Ref(obj) = *field.value.read().unwrap() {
                    roots.push(obj);
                }
            }
        }
        roots
    }

    // Builtin core classes. The original runtime ships these with the VM;
    // classpath definitions never shadow them because the cache is seeded
    // first.

    fn define_builtin_classes(&mut self) -> Result<(), JvmError> {
        let object_id = self.define_builtin_class(
            "java/lang/Object",
            None,
            &[],
            &[],
            &[
                BuiltinMethod::bytecode("<init>", "()V", MethodFlags::ACC_PUBLIC),
                BuiltinMethod::native("hashCode", "()I", MethodFlags::ACC_PUBLIC),
            ],
        )?;
        self.br().set_java_lang_object_id(object_id)?;

        let string_id = self.define_builtin_class(
            "java/lang/String",
            Some(object_id),
            &[("value", "[C")],
            &[],
            &[
                BuiltinMethod::bytecode("<init>", "()V", MethodFlags::ACC_PUBLIC),
                BuiltinMethod::native("length", "()I", MethodFlags::ACC_PUBLIC),
                BuiltinMethod::native("charAt", "(I)C", MethodFlags::ACC_PUBLIC),
            ],
        )?;
        self.br().set_java_lang_string_id(string_id)?;

        let thread_id = ThreadId::from_usize(0);
        let char_array_id = self.load_array_class(self.br().char_array_desc, thread_id)?;
        self.br().set_char_array_class_id(char_array_id)?;

        let throwable_id = self.define_builtin_class(
            "java/lang/Throwable",
            Some(object_id),
            &[("message", "Ljava/lang/String;")],
            &[],
            &[
                BuiltinMethod::bytecode("<init>", "()V", MethodFlags::ACC_PUBLIC),
                BuiltinMethod::native("<init>", "(Ljava/lang/String;)V", MethodFlags::ACC_PUBLIC),
                BuiltinMethod::native(
                    "getMessage",
                    "()Ljava/lang/String;",
                    MethodFlags::ACC_PUBLIC,
                ),
            ],
        )?;
        self.br().set_java_lang_throwable_id(throwable_id)?;

        let exception_id =
            self.define_builtin_class("java/lang/Exception", Some(throwable_id), &[], &[], &[])?;
        let runtime_exception_id = self.define_builtin_class(
            "java/lang/RuntimeException",
            Some(exception_id),
            &[],
            &[],
            &[],
        )?;
        let error_id =
            self.define_builtin_class("java/lang/Error", Some(throwable_id), &[], &[], &[])?;
        let index_oob_id = self.define_builtin_class(
            "java/lang/IndexOutOfBoundsException",
            Some(runtime_exception_id),
            &[],
            &[],
            &[],
        )?;

        for (name, super_id) in [
            ("java/lang/ArithmeticException", runtime_exception_id),
            ("java/lang/ArrayIndexOutOfBoundsException", index_oob_id),
            ("java/lang/ArrayStoreException", runtime_exception_id),
            ("java/lang/ClassFormatError", error_id),
            ("java/lang/ClassNotFoundException", exception_id),
            ("java/lang/IllegalMonitorStateException", runtime_exception_id),
            ("java/lang/IncompatibleClassChangeError", error_id),
            ("java/lang/InternalError", error_id),
            ("java/lang/NegativeArraySizeException", runtime_exception_id),
            ("java/lang/NoSuchFieldError", error_id),
            ("java/lang/NoSuchMethodError", error_id),
            ("java/lang/NullPointerException", runtime_exception_id),
            ("java/lang/UnsupportedOperationException", runtime_exception_id),
        ] {
            self.define_builtin_class(name, Some(super_id), &[], &[], &[])?;
        }

        let print_stream_id = self.define_builtin_class(
            "java/io/PrintStream",
            Some(object_id),
            &[("fd", "I")],
            &[],
            &[
                BuiltinMethod::bytecode("<init>", "()V", MethodFlags::ACC_PUBLIC),
                BuiltinMethod::native("println", "()V", MethodFlags::ACC_PUBLIC),
                BuiltinMethod::native("println", "(I)V", MethodFlags::ACC_PUBLIC),
                BuiltinMethod::native("println", "(J)V", MethodFlags::ACC_PUBLIC),
                BuiltinMethod::native("println", "(F)V", MethodFlags::ACC_PUBLIC),
                BuiltinMethod::native("println", "(D)V", MethodFlags::ACC_PUBLIC),
                BuiltinMethod::native("println", "(Z)V", MethodFlags::ACC_PUBLIC),
                BuiltinMethod::native("println", "(C)V", MethodFlags::ACC_PUBLIC),
                BuiltinMethod::native("println", "(Ljava/lang/String;)V", MethodFlags::ACC_PUBLIC),
                BuiltinMethod::native("print", "(I)V", MethodFlags::ACC_PUBLIC),
                BuiltinMethod::native("print", "(J)V", MethodFlags::ACC_PUBLIC),
                BuiltinMethod::native("print", "(F)V", MethodFlags::ACC_PUBLIC),
                BuiltinMethod::native("print", "(D)V", MethodFlags::ACC_PUBLIC),
                BuiltinMethod::native("print", "(Z)V", MethodFlags::ACC_PUBLIC),
                BuiltinMethod::native("print", "(C)V", MethodFlags::ACC_PUBLIC),
                BuiltinMethod::native("print", "(Ljava/lang/String;)V", MethodFlags::ACC_PUBLIC),
            ],
        )?;
        self.br().set_java_io_print_stream_id(print_stream_id)?;

        let system_id = self.define_builtin_class(
            "java/lang/System",
            Some(object_id),
            &[],
            &[
                ("out", "Ljava/io/PrintStream;"),
                ("err", "Ljava/io/PrintStream;"),
            ],
            &[BuiltinMethod::native(
                "arraycopy",
                "(Ljava/lang/Object;ILjava/lang/Object;II)V",
                MethodFlags::ACC_PUBLIC | MethodFlags::ACC_STATIC,
            )],
        )?;
        self.br().set_java_lang_system_id(system_id)?;

        Ok(())
    }

    fn define_builtin_class(
        &mut self,
        name: &str,
        super_id: Option<ClassId>,
        instance_fields: &[(&str, &str)],
        static_fields: &[(&str, &str)],
        methods: &[BuiltinMethod],
    ) -> Result<ClassId, JvmError> {
        let name_sym = self.interner.get_or_intern(name);
        let flags = ClassFlags::new(ClassFlags::ACC_PUBLIC | ClassFlags::ACC_SUPER);
        let class = InstanceClass::new_loaded(
            name_sym,
            flags,
            super_id,
            None,
            RuntimeConstantPool::empty(),
        );
        let this_id = self.push_class(RuntimeClass::Instance(Box::new(class)));

        // Fields, inheriting the super's slot layout.
        let (mut fields, mut field_index, mut name_index) = match super_id {
            Some(id) => {
                let super_class = self.get_instance_class(&id)?;
                (
                    super_class.get_instance_fields()?.clone(),
                    HashMap::new(),
                    HashMap::new(),
                )
            }
            None => (Vec::new(), HashMap::new(), HashMap::new()),
        };
        for inherited in &fields {
            field_index.insert(
                FieldKey {
                    name: inherited.name,
                    desc: inherited.desc,
                },
                inherited.offset,
            );
            name_index.insert(inherited.name, inherited.offset);
        }
        for (field_name, field_desc) in instance_fields {
            let key = FieldKey {
                name: self.interner.get_or_intern(field_name),
                desc: self.interner.get_or_intern(field_desc),
            };
            let descriptor_id = self.get_or_new_field_descriptor_id(key.desc)?;
            let allocation_type = self
                .get_field_descriptor(&descriptor_id)
                .as_allocation_type();
            let offset = fields.len();
            fields.push(InstanceField {
                name: key.name,
                desc: key.desc,
                descriptor_id,
                allocation_type,
                offset,
                flags: FieldFlags::new(FieldFlags::ACC_PRIVATE),
                declaring_class: this_id,
            });
            field_index.insert(key, offset);
            name_index.insert(key.name, offset);
        }

        let mut statics = HashMap::new();
        for (field_name, field_desc) in static_fields {
            let key = FieldKey {
                name: self.interner.get_or_intern(field_name),
                desc: self.interner.get_or_intern(field_desc),
            };
            let descriptor_id = self.get_or_new_field_descriptor_id(key.desc)?;
            let allocation_type = self
                .get_field_descriptor(&descriptor_id)
                .as_allocation_type();
            statics.insert(
                key,
                StaticField {
                    flags: FieldFlags::new(FieldFlags::ACC_PUBLIC | FieldFlags::ACC_STATIC),
                    descriptor_id,
                    allocation_type,
                    value: RwLock::new(Value::from(allocation_type)),
                    string_literal: None,
                },
            );
        }

        // Methods: bytecode bodies are a bare `return`, everything else is
        // native.
        let mut declared = HashMap::new();
        for spec in methods {
            let key = MethodKey {
                name: self.interner.get_or_intern(spec.name),
                desc: self.interner.get_or_intern(spec.desc),
            };
            let descriptor_id = self.get_or_new_method_descriptor_id(&key.desc)?;
            let flags = MethodFlags::new(spec.flags);
            let body = if spec.native {
                MethodBody::Native
            } else {
                let descriptor = self.get_method_descriptor(&descriptor_id);
                let mut max_locals: u16 = if flags.is_static() { 0 } else { 1 };
                for param in &descriptor.params {
                    max_locals += if param.is_wide() { 2 } else { 1 };
                }
                MethodBody::Interpreted(CodeBody::new(vec![0xb1], 0, max_locals))
            };
            let method = Method::builtin(this_id, key.name, key.desc, descriptor_id, flags, body);
            let method_id = self.push_method(method);
            declared.insert(key, method_id);
        }

        let instance_size = fields.len();
        let this = self.get_instance_class(&this_id)?;
        this.set_instance_fields(fields)?;
        this.set_instance_field_index(field_index)?;
        this.set_instance_field_name_index(name_index)?;
        this.set_instance_size(instance_size)?;
        this.set_static_fields(statics)?;
        this.set_declared_methods(declared)?;
        this.set_interfaces(Vec::new())?;
        this.set_linked();
        this.set_initialized();
        Ok(this_id)
    }
}
