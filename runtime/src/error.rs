use crate::keys::{FieldKey, MethodKey, Symbol};
use crate::rt::constant_pool::RuntimeConstantType;
use crate::vm::{HeapAddr, ObjectRef};
use lasso::ThreadedRodeo;
use sigrun_common::descriptor::MethodDescriptor;
use sigrun_common::error::{
    CursorError, InstructionErr, LinkageError, MethodDescriptorErr, TypeDescriptorErr,
};
use std::fmt::Display;

/// Everything that can stop the interpreter. `JavaExceptionThrown` and
/// `JavaException` are the bytecode-observable channel; every other variant
/// is fatal at the VM level and never reaches an exception table.
#[derive(Debug)]
pub enum JvmError {
    MainClassNotFound(String),
    MainMethodNotFound(String),
    Linkage(LinkageError),
    Cursor(CursorError),
    Instruction(InstructionErr),
    TypeDescriptor(TypeDescriptorErr),
    MethodDescriptor(MethodDescriptorErr),
    FrameStackIsEmpty,
    FrameStackOverflow { limit: usize },
    OperandStackIsEmpty,
    OperandStackOverflow { max_stack: usize },
    LocalIndexOutOfBounds { index: usize, max_locals: usize },
    HeapExhausted { capacity_bytes: usize },
    WrongHeapAddress(HeapAddr),
    UnexpectedType(String),
    NonThrowableThrown(String),
    MethodIsAbstract(String),
    UnsupportedConstant(RuntimeConstantType),
    ClassStructure(String),
    ClassInitializationFailed(String),
    MonitorContended(HeapAddr),
    /// Pending bytecode-level exception, propagating frame by frame.
    JavaExceptionThrown(ObjectRef),
    /// VM-raised Java exception, not yet materialized on the heap.
    JavaException(JavaExceptionFromJvm),
}

impl From<CursorError> for JvmError {
    fn from(value: CursorError) -> Self {
        JvmError::Cursor(value)
    }
}

impl From<InstructionErr> for JvmError {
    fn from(value: InstructionErr) -> Self {
        JvmError::Instruction(value)
    }
}

impl From<TypeDescriptorErr> for JvmError {
    fn from(value: TypeDescriptorErr) -> Self {
        JvmError::TypeDescriptor(value)
    }
}

impl From<MethodDescriptorErr> for JvmError {
    fn from(value: MethodDescriptorErr) -> Self {
        JvmError::MethodDescriptor(value)
    }
}

impl From<LinkageError> for JvmError {
    fn from(value: LinkageError) -> Self {
        JvmError::Linkage(value)
    }
}

impl From<JavaExceptionFromJvm> for JvmError {
    fn from(value: JavaExceptionFromJvm) -> Self {
        JvmError::JavaException(value)
    }
}

impl Display for JvmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl JvmError {
    pub fn into_pretty_string(self, interner: &ThreadedRodeo) -> String {
        match self {
            JvmError::JavaException(ex) => {
                let mut result = ex.kind.class_name_dot();
                if let Some(message) = ex.message {
                    let resolved_message = message.into_resolved(interner);
                    result.push_str(": ");
                    result.push_str(&resolved_message);
                }
                result
            }
            _ => format!("{:?}", self),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ExceptionMessage {
    Resolved(String),
    MethodNotFound(MethodKey, Symbol),
    FieldNotFound(FieldKey, Symbol),
    IncompatibleClassChangeRuntimePool {
        pool_idx: u16,
        expected: RuntimeConstantType,
        actual: RuntimeConstantType,
    },
}

impl ExceptionMessage {
    pub fn into_resolved(self, interner: &ThreadedRodeo) -> String {
        match self {
            ExceptionMessage::Resolved(s) => s,
            ExceptionMessage::MethodNotFound(method_key, class_sym) => {
                let desc_str = interner.resolve(&method_key.desc);
                let class_name = interner.resolve(&class_sym);
                let method_name = interner.resolve(&method_key.name);
                match MethodDescriptor::try_from(desc_str) {
                    Ok(desc) => desc.to_java_signature(class_name, method_name),
                    Err(_) => format!("{}.{}{}", class_name.replace('/', "."), method_name, desc_str),
                }
            }
            ExceptionMessage::FieldNotFound(field_key, class_sym) => {
                format!(
                    "{}.{}",
                    interner.resolve(&class_sym).replace('/', "."),
                    interner.resolve(&field_key.name)
                )
            }
            ExceptionMessage::IncompatibleClassChangeRuntimePool {
                pool_idx,
                expected,
                actual,
            } => {
                format!(
                    "Incompatible class change at runtime constant pool index {}: expected {}, found {}",
                    pool_idx, expected, actual
                )
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JavaExceptionKind {
    ArithmeticException,
    ArrayIndexOutOfBoundsException,
    ArrayStoreException,
    ClassFormatError,
    ClassNotFoundException,
    IllegalMonitorStateException,
    IncompatibleClassChangeError,
    InternalError,
    NegativeArraySizeException,
    NoSuchFieldError,
    NoSuchMethodError,
    NullPointerException,
    UnsupportedOperationException,
}

impl JavaExceptionKind {
    pub const fn class_name(self) -> &'static str {
        match self {
            Self::ArithmeticException => "java/lang/ArithmeticException",
            Self::ArrayIndexOutOfBoundsException => "java/lang/ArrayIndexOutOfBoundsException",
            Self::ArrayStoreException => "java/lang/ArrayStoreException",
            Self::ClassFormatError => "java/lang/ClassFormatError",
            Self::ClassNotFoundException => "java/lang/ClassNotFoundException",
            Self::IllegalMonitorStateException => "java/lang/IllegalMonitorStateException",
            Self::IncompatibleClassChangeError => "java/lang/IncompatibleClassChangeError",
            Self::InternalError => "java/lang/InternalError",
            Self::NegativeArraySizeException => "java/lang/NegativeArraySizeException",
            Self::NoSuchFieldError => "java/lang/NoSuchFieldError",
            Self::NoSuchMethodError => "java/lang/NoSuchMethodError",
            Self::NullPointerException => "java/lang/NullPointerException",
            Self::UnsupportedOperationException => "java/lang/UnsupportedOperationException",
        }
    }

    pub fn class_name_dot(self) -> String {
        self.class_name().replace('/', ".")
    }
}

#[derive(Debug, Clone)]
pub struct JavaExceptionFromJvm {
    pub kind: JavaExceptionKind,
    pub message: Option<ExceptionMessage>,
}

impl JavaExceptionFromJvm {
    pub fn new(kind: JavaExceptionKind) -> Self {
        Self { kind, message: None }
    }

    pub fn with_message(kind: JavaExceptionKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: Some(ExceptionMessage::Resolved(message.into())),
        }
    }

    pub fn with_method_not_found(kind: JavaExceptionKind, key: MethodKey, class_sym: Symbol) -> Self {
        Self {
            kind,
            message: Some(ExceptionMessage::MethodNotFound(key, class_sym)),
        }
    }

    pub fn with_field_not_found(kind: JavaExceptionKind, key: FieldKey, class_sym: Symbol) -> Self {
        Self {
            kind,
            message: Some(ExceptionMessage::FieldNotFound(key, class_sym)),
        }
    }

    pub fn with_runtime_pool_incompatible_class_change(
        kind: JavaExceptionKind,
        pool_idx: u16,
        expected: RuntimeConstantType,
        actual: RuntimeConstantType,
    ) -> Self {
        Self {
            kind,
            message: Some(ExceptionMessage::IncompatibleClassChangeRuntimePool {
                pool_idx,
                expected,
                actual,
            }),
        }
    }
}
