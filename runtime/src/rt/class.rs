use crate::error::JvmError;
use crate::heap::method_area::MethodArea;
use crate::keys::{ClassId, FieldKey, MethodId, MethodKey, Symbol, ThreadId};
use crate::rt::constant_pool::RuntimeConstantPool;
use crate::rt::field::{InstanceField, StaticField};
use crate::rt::method::Method;
use crate::rt::{ClassState, RuntimeClass};
use crate::vm::Value;
use sigrun_classfile::ClassFile;
use sigrun_classfile::attribute::class::ClassAttr;
use sigrun_classfile::constant::ConstantInfo;
use sigrun_classfile::field::FieldInfo;
use sigrun_classfile::flags::{ClassFlags, FieldFlags};
use sigrun_classfile::method::MethodInfo;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU8, Ordering};

/// A loaded class or interface (discriminated by the interface flag, as in
/// the class model of the classfile itself). Linking fills the `OnceCell`s;
/// the id has to exist in the method area before methods and fields can
/// reference it, hence the two-phase construction.
pub struct InstanceClass {
    name: Symbol,
    flags: ClassFlags,
    super_id: Option<ClassId>,
    source_file: Option<Symbol>,
    pub cp: RuntimeConstantPool,
    state: AtomicU8,
    clinit: OnceCell<MethodId>,
    declared_methods: OnceCell<HashMap<MethodKey, MethodId>>,
    instance_fields: OnceCell<Vec<InstanceField>>,
    instance_field_index: OnceCell<HashMap<FieldKey, usize>>,
    instance_field_name_index: OnceCell<HashMap<Symbol, usize>>,
    static_fields: OnceCell<HashMap<FieldKey, StaticField>>,
    interfaces: OnceCell<Vec<ClassId>>,
    instance_size: OnceCell<usize>,
}

struct FieldSpec {
    key: FieldKey,
    flags: FieldFlags,
    constant_value: Option<Value>,
    string_literal: Option<Symbol>,
}

impl InstanceClass {
    pub(crate) fn new_loaded(
        name: Symbol,
        flags: ClassFlags,
        super_id: Option<ClassId>,
        source_file: Option<Symbol>,
        cp: RuntimeConstantPool,
    ) -> Self {
        Self {
            name,
            flags,
            super_id,
            source_file,
            cp,
            state: AtomicU8::new(ClassState::Loaded as u8),
            clinit: OnceCell::new(),
            declared_methods: OnceCell::new(),
            instance_fields: OnceCell::new(),
            instance_field_index: OnceCell::new(),
            instance_field_name_index: OnceCell::new(),
            static_fields: OnceCell::new(),
            interfaces: OnceCell::new(),
            instance_size: OnceCell::new(),
        }
    }

    pub fn load_and_link(
        cf: ClassFile,
        method_area: &mut MethodArea,
        super_id: Option<ClassId>,
        thread_id: ThreadId,
    ) -> Result<ClassId, JvmError> {
        let interner = method_area.interner_arc();
        let name = interner.get_or_intern(cf.cp.get_class_name(cf.this_class)?);
        let source_file = cf.attributes.iter().find_map(|attr| match attr {
            ClassAttr::SourceFile(idx) => cf.cp.get_utf8(*idx).ok().map(|s| interner.get_or_intern(s)),
            ClassAttr::Unknown(_) => None,
        });

        let mut field_specs = Vec::with_capacity(cf.fields.len());
        for field in &cf.fields {
            field_specs.push(Self::field_spec(field, &cf, &interner)?);
        }

        let mut method_specs = Vec::with_capacity(cf.methods.len());
        for method in &cf.methods {
            let key = MethodKey {
                name: interner.get_or_intern(cf.cp.get_utf8(method.name_index)?),
                desc: interner.get_or_intern(cf.cp.get_utf8(method.descriptor_index)?),
            };
            method_specs.push((key, method.clone()));
        }

        let mut interface_names = Vec::with_capacity(cf.interfaces.len());
        for interface_idx in &cf.interfaces {
            interface_names.push(interner.get_or_intern(cf.cp.get_class_name(*interface_idx)?));
        }

        let runtime_cp = RuntimeConstantPool::new(cf.cp.inner);
        let class = RuntimeClass::Instance(Box::new(Self::new_loaded(
            name,
            cf.access_flags,
            super_id,
            source_file,
            runtime_cp,
        )));
        let this_id = method_area.push_class(class);

        Self::link_fields(field_specs, this_id, super_id, method_area)?;
        Self::link_methods(method_specs, this_id, method_area)?;
        Self::link_interfaces(interface_names, this_id, method_area, thread_id)?;

        method_area.get_instance_class(&this_id)?.set_linked();
        Ok(this_id)
    }

    fn field_spec(
        field: &FieldInfo,
        cf: &ClassFile,
        interner: &lasso::ThreadedRodeo,
    ) -> Result<FieldSpec, JvmError> {
        let key = FieldKey {
            name: interner.get_or_intern(cf.cp.get_utf8(field.name_index)?),
            desc: interner.get_or_intern(cf.cp.get_utf8(field.descriptor_index)?),
        };
        let mut constant_value = None;
        let mut string_literal = None;
        if field.access_flags.is_static() {
            if let Some(idx) = field.constant_value_index() {
                match cf.cp.entry(idx)? {
                    ConstantInfo::Integer(v) => constant_value = Some(Value::Integer(*v)),
                    ConstantInfo::Float(v) => constant_value = Some(Value::Float(*v)),
                    ConstantInfo::Long(v) => constant_value = Some(Value::Long(*v)),
                    ConstantInfo::Double(v) => constant_value = Some(Value::Double(*v)),
                    ConstantInfo::String(string_idx) => {
                        string_literal =
                            Some(interner.get_or_intern(cf.cp.get_utf8(*string_idx)?));
                    }
                    _ => {}
                }
            }
        }
        Ok(FieldSpec {
            key,
            flags: field.access_flags,
            constant_value,
            string_literal,
        })
    }

    fn link_fields(
        field_specs: Vec<FieldSpec>,
        this_id: ClassId,
        super_id: Option<ClassId>,
        method_area: &mut MethodArea,
    ) -> Result<(), JvmError> {
        let (mut instance_fields, mut field_index, mut name_index) = match super_id {
            Some(id) => {
                let super_class = method_area.get_instance_class(&id)?;
                (
                    super_class.get_instance_fields()?.clone(),
                    super_class.get_instance_field_index()?.clone(),
                    super_class.get_instance_field_name_index()?.clone(),
                )
            }
            None => (Vec::new(), HashMap::new(), HashMap::new()),
        };
        let mut static_fields = HashMap::new();

        for spec in field_specs {
            let descriptor_id = method_area.get_or_new_field_descriptor_id(spec.key.desc)?;
            let allocation_type = method_area
                .get_field_descriptor(&descriptor_id)
                .as_allocation_type();

            if spec.flags.is_static() {
                let initial = spec
                    .constant_value
                    .unwrap_or_else(|| Value::from(allocation_type));
                static_fields.insert(
                    spec.key,
                    StaticField {
                        flags: spec.flags,
                        descriptor_id,
                        allocation_type,
                        value: RwLock::new(initial),
                        string_literal: spec.string_literal,
                    },
                );
            } else {
                let offset = instance_fields.len();
                instance_fields.push(InstanceField {
                    name: spec.key.name,
                    desc: spec.key.desc,
                    descriptor_id,
                    allocation_type,
                    offset,
                    flags: spec.flags,
                    declaring_class: this_id,
                });
                field_index.insert(spec.key, offset);
                name_index.insert(spec.key.name, offset);
            }
        }

        let instance_size = instance_fields.len();
        let this = method_area.get_instance_class(&this_id)?;
        this.set_instance_fields(instance_fields)?;
        this.set_instance_field_index(field_index)?;
        this.set_instance_field_name_index(name_index)?;
        this.set_instance_size(instance_size)?;
        this.set_static_fields(static_fields)?;
        Ok(())
    }

    fn link_methods(
        method_specs: Vec<(MethodKey, MethodInfo)>,
        this_id: ClassId,
        method_area: &mut MethodArea,
    ) -> Result<(), JvmError> {
        let clinit_sym = method_area.br().clinit_sym;
        let mut declared = HashMap::new();

        for (key, info) in method_specs {
            let descriptor_id = method_area.get_or_new_method_descriptor_id(&key.desc)?;
            let method = Method::from_class_file(info, this_id, descriptor_id, key.name, key.desc)?;
            let method_id = method_area.push_method(method);
            if key.name == clinit_sym {
                method_area.get_instance_class(&this_id)?.set_clinit(method_id)?;
            } else {
                declared.insert(key, method_id);
            }
        }

        method_area
            .get_instance_class(&this_id)?
            .set_declared_methods(declared)
    }

    fn link_interfaces(
        interface_names: Vec<Symbol>,
        this_id: ClassId,
        method_area: &mut MethodArea,
        thread_id: ThreadId,
    ) -> Result<(), JvmError> {
        let mut interface_ids = Vec::with_capacity(interface_names.len());
        for name in interface_names {
            interface_ids.push(method_area.get_class_id_or_load(name, thread_id)?);
        }
        method_area
            .get_instance_class(&this_id)?
            .set_interfaces(interface_ids)
    }

    pub fn name(&self) -> Symbol {
        self.name
    }

    pub fn flags(&self) -> ClassFlags {
        self.flags
    }

    pub fn get_super(&self) -> Option<ClassId> {
        self.super_id
    }

    pub fn get_source_file(&self) -> Option<Symbol> {
        self.source_file
    }

    pub fn is_interface(&self) -> bool {
        self.flags.is_interface()
    }

    // State machine

    pub fn set_linked(&self) {
        self.state.store(ClassState::Linked as u8, Ordering::Release);
    }

    pub fn set_initializing(&self) {
        self.state
            .store(ClassState::Initializing as u8, Ordering::Release);
    }

    pub fn set_initialized(&self) {
        self.state
            .store(ClassState::Initialized as u8, Ordering::Release);
    }

    pub fn state(&self) -> ClassState {
        ClassState::from(self.state.load(Ordering::Acquire))
    }

    pub fn is_initialized_or_initializing(&self) -> bool {
        matches!(
            self.state(),
            ClassState::Initialized | ClassState::Initializing
        )
    }

    // Methods

    pub fn get_clinit_method_id(&self) -> Option<MethodId> {
        self.clinit.get().copied()
    }

    pub fn get_declared_method(&self, key: &MethodKey) -> Option<MethodId> {
        self.declared_methods.get().and_then(|map| map.get(key)).copied()
    }

    // Static fields

    pub fn has_static_field(&self, field_key: &FieldKey) -> Result<bool, JvmError> {
        Ok(self.get_static_fields()?.contains_key(field_key))
    }

    pub fn set_static_field_value(&self, field_key: &FieldKey, value: Value) -> Result<(), JvmError> {
        let static_field = self
            .get_static_fields()?
            .get(field_key)
            .ok_or(JvmError::ClassStructure(format!(
                "static field missing on {:?}",
                field_key
            )))?;
        *static_field.value.write().unwrap() = value;
        Ok(())
    }

    pub fn get_static_field_value(&self, field_key: &FieldKey) -> Result<Value, JvmError> {
        let static_field = self
            .get_static_fields()?
            .get(field_key)
            .ok_or(JvmError::ClassStructure(format!(
                "static field missing on {:?}",
                field_key
            )))?;
        Ok(*static_field.value.read().unwrap())
    }

    pub fn get_static_fields(&self) -> Result<&HashMap<FieldKey, StaticField>, JvmError> {
        self.static_fields.get().ok_or(JvmError::ClassStructure(
            "static fields not linked yet".to_string(),
        ))
    }

    // Instance fields

    pub fn get_instance_field(&self, field_key: &FieldKey) -> Result<&InstanceField, JvmError> {
        let idx = self
            .get_instance_field_index()?
            .get(field_key)
            .copied()
            .ok_or_else(|| {
                crate::build_exception!(NoSuchFieldError, field_key: *field_key, class_sym: self.name)
            })?;
        Ok(&self.get_instance_fields()?[idx])
    }

    pub fn get_instance_field_by_name(&self, name: &Symbol) -> Result<&InstanceField, JvmError> {
        let idx = self
            .get_instance_field_name_index()?
            .get(name)
            .copied()
            .ok_or(JvmError::ClassStructure(
                "instance field name not present on class".to_string(),
            ))?;
        Ok(&self.get_instance_fields()?[idx])
    }

    pub fn get_instance_fields(&self) -> Result<&Vec<InstanceField>, JvmError> {
        self.instance_fields.get().ok_or(JvmError::ClassStructure(
            "instance fields not linked yet".to_string(),
        ))
    }

    pub fn get_instance_size(&self) -> Result<usize, JvmError> {
        self.instance_size.get().copied().ok_or(JvmError::ClassStructure(
            "instance size not linked yet".to_string(),
        ))
    }

    pub fn get_interfaces(&self) -> Result<&Vec<ClassId>, JvmError> {
        self.interfaces.get().ok_or(JvmError::ClassStructure(
            "interfaces not linked yet".to_string(),
        ))
    }

    // Internal setters for the lazily linked pieces; the class id has to be
    // known before these can be produced.

    pub(crate) fn set_clinit(&self, method_id: MethodId) -> Result<(), JvmError> {
        self.clinit
            .set(method_id)
            .map_err(|_| JvmError::ClassStructure("clinit already set".to_string()))
    }

    pub(crate) fn set_declared_methods(
        &self,
        declared: HashMap<MethodKey, MethodId>,
    ) -> Result<(), JvmError> {
        self.declared_methods
            .set(declared)
            .map_err(|_| JvmError::ClassStructure("declared methods already set".to_string()))
    }

    pub(crate) fn set_instance_fields(&self, fields: Vec<InstanceField>) -> Result<(), JvmError> {
        self.instance_fields
            .set(fields)
            .map_err(|_| JvmError::ClassStructure("instance fields already set".to_string()))
    }

    pub(crate) fn set_instance_field_index(
        &self,
        index: HashMap<FieldKey, usize>,
    ) -> Result<(), JvmError> {
        self.instance_field_index
            .set(index)
            .map_err(|_| JvmError::ClassStructure("instance field index already set".to_string()))
    }

    pub(crate) fn set_instance_field_name_index(
        &self,
        index: HashMap<Symbol, usize>,
    ) -> Result<(), JvmError> {
        self.instance_field_name_index.set(index).map_err(|_| {
            JvmError::ClassStructure("instance field name index already set".to_string())
        })
    }

    pub(crate) fn set_static_fields(
        &self,
        static_fields: HashMap<FieldKey, StaticField>,
    ) -> Result<(), JvmError> {
        self.static_fields
            .set(static_fields)
            .map_err(|_| JvmError::ClassStructure("static fields already set".to_string()))
    }

    pub(crate) fn set_interfaces(&self, interfaces: Vec<ClassId>) -> Result<(), JvmError> {
        self.interfaces
            .set(interfaces)
            .map_err(|_| JvmError::ClassStructure("interfaces already set".to_string()))
    }

    pub(crate) fn set_instance_size(&self, size: usize) -> Result<(), JvmError> {
        self.instance_size
            .set(size)
            .map_err(|_| JvmError::ClassStructure("instance size already set".to_string()))
    }

    fn get_instance_field_index(&self) -> Result<&HashMap<FieldKey, usize>, JvmError> {
        self.instance_field_index.get().ok_or(JvmError::ClassStructure(
            "instance field index not linked yet".to_string(),
        ))
    }

    fn get_instance_field_name_index(&self) -> Result<&HashMap<Symbol, usize>, JvmError> {
        self.instance_field_name_index
            .get()
            .ok_or(JvmError::ClassStructure(
                "instance field name index not linked yet".to_string(),
            ))
    }
}
