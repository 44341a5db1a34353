use crate::keys::{ClassId, FieldDescriptorId, Symbol};
use crate::vm::Value;
use sigrun_classfile::flags::FieldFlags;
use sigrun_common::jtype::AllocationType;
use std::sync::RwLock;

/// An instance field slot. `offset` indexes the object's field slot vector
/// and already accounts for inherited fields.
#[derive(Debug, Clone)]
pub struct InstanceField {
    pub name: Symbol,
    pub desc: Symbol,
    pub descriptor_id: FieldDescriptorId,
    pub allocation_type: AllocationType,
    pub offset: usize,
    pub flags: FieldFlags,
    pub declaring_class: ClassId,
}

/// Static field storage. `string_literal` carries a `ConstantValue` string
/// that can only be materialized once the heap exists; class initialization
/// writes it into `value`.
pub struct StaticField {
    pub flags: FieldFlags,
    pub descriptor_id: FieldDescriptorId,
    pub allocation_type: AllocationType,
    pub value: RwLock<Value>,
    pub string_literal: Option<Symbol>,
}
