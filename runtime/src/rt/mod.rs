use crate::error::JvmError;
use crate::keys::{ClassId, Symbol};
use crate::rt::array::{ObjectArrayClass, PrimitiveArrayClass};
use crate::rt::class::InstanceClass;
use crate::rt::constant_pool::RuntimeConstantPool;

pub mod array;
pub mod class;
pub mod constant_pool;
pub mod field;
pub mod method;

/// Class lifecycle (load → link → initialize). Stored as an atomic u8 on the
/// class so initialization stays idempotent and re-entrant.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassState {
    Loaded = 0,
    Linked = 1,
    Initializing = 2,
    Initialized = 3,
}

impl From<u8> for ClassState {
    fn from(v: u8) -> Self {
        match v {
            0 => ClassState::Loaded,
            1 => ClassState::Linked,
            2 => ClassState::Initializing,
            3 => ClassState::Initialized,
            _ => unreachable!("invalid class state {}", v),
        }
    }
}

/// Everything a [`crate::keys::ClassId`] can point at. Classes and
/// interfaces share [`InstanceClass`], discriminated by the interface flag;
/// array classes are synthesized by the method area.
pub enum RuntimeClass {
    Instance(Box<InstanceClass>),
    PrimitiveArray(PrimitiveArrayClass),
    ObjectArray(ObjectArrayClass),
}

impl RuntimeClass {
    pub fn name(&self) -> Symbol {
        match self {
            RuntimeClass::Instance(class) => class.name(),
            RuntimeClass::PrimitiveArray(class) => class.name,
            RuntimeClass::ObjectArray(class) => class.name,
        }
    }

    pub fn super_id(&self) -> Option<ClassId> {
        match self {
            RuntimeClass::Instance(class) => class.get_super(),
            RuntimeClass::PrimitiveArray(class) => Some(class.super_id),
            RuntimeClass::ObjectArray(class) => Some(class.super_id),
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(
            self,
            RuntimeClass::PrimitiveArray(_) | RuntimeClass::ObjectArray(_)
        )
    }

    pub fn is_interface(&self) -> bool {
        match self {
            RuntimeClass::Instance(class) => class.flags().is_interface(),
            _ => false,
        }
    }

    pub fn as_instance_class(&self) -> Result<&InstanceClass, JvmError> {
        match self {
            RuntimeClass::Instance(class) => Ok(class.as_ref()),
            other => Err(JvmError::ClassStructure(format!(
                "expected an instance class, found the array class {:?}",
                other.name()
            ))),
        }
    }

    pub fn get_cp(&self) -> Result<&RuntimeConstantPool, JvmError> {
        Ok(&self.as_instance_class()?.cp)
    }
}
