use crate::keys::{ClassId, Symbol};
use sigrun_common::jtype::PrimitiveType;

/// Runtime class of `[I`, `[B` and friends. Super is always
/// `java/lang/Object`.
pub struct PrimitiveArrayClass {
    pub name: Symbol,
    pub super_id: ClassId,
    pub element_type: PrimitiveType,
}

/// Runtime class of `[Lsome/Class;` and of nested arrays, whose element
/// class is itself an array class.
pub struct ObjectArrayClass {
    pub name: Symbol,
    pub super_id: ClassId,
    pub element_class_id: ClassId,
}
