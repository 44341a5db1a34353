use crate::error::JvmError;
use crate::keys::{ClassId, MethodDescriptorId, Symbol};
use crate::throw_exception;
use sigrun_classfile::attribute::method::{CodeAttribute, ExceptionTableEntry};
use sigrun_classfile::flags::MethodFlags;
use sigrun_classfile::method::MethodInfo;
use sigrun_common::error::LinkageError;
use std::sync::Arc;

pub struct CodeBody {
    /// Shared so the dispatch loop can hold the bytes without pinning a
    /// method-area lock across instructions.
    pub code: Arc<[u8]>,
    max_stack: u16,
    max_locals: u16,
    pub exception_table: Vec<ExceptionTableEntry>,
}

impl CodeBody {
    pub fn new(code: Vec<u8>, max_stack: u16, max_locals: u16) -> Self {
        Self {
            code: Arc::from(code.into_boxed_slice()),
            max_stack,
            max_locals,
            exception_table: Vec::new(),
        }
    }
}

impl From<CodeAttribute> for CodeBody {
    fn from(code_attr: CodeAttribute) -> Self {
        CodeBody {
            code: Arc::from(code_attr.code.into_boxed_slice()),
            max_stack: code_attr.max_stack,
            max_locals: code_attr.max_locals,
            exception_table: code_attr.exception_table,
        }
    }
}

pub enum MethodBody {
    Interpreted(CodeBody),
    Native,
    Abstract,
}

pub struct Method {
    class_id: ClassId,
    pub name: Symbol,
    pub desc: Symbol,
    descriptor_id: MethodDescriptorId,
    flags: MethodFlags,
    body: MethodBody,
}

impl Method {
    pub fn from_class_file(
        method_info: MethodInfo,
        class_id: ClassId,
        descriptor_id: MethodDescriptorId,
        name: Symbol,
        desc: Symbol,
    ) -> Result<Self, JvmError> {
        let flags = method_info.access_flags;
        let body = if flags.is_abstract() {
            MethodBody::Abstract
        } else if flags.is_native() {
            MethodBody::Native
        } else {
            let code_attr = method_info
                .code_attribute()
                .cloned()
                .ok_or(JvmError::Linkage(LinkageError::MissingCodeAttribute))?;
            MethodBody::Interpreted(CodeBody::from(code_attr))
        };
        Ok(Method {
            class_id,
            name,
            desc,
            descriptor_id,
            flags,
            body,
        })
    }

    /// Used for the synthesized core classes, which carry hand-built bodies.
    pub fn builtin(
        class_id: ClassId,
        name: Symbol,
        desc: Symbol,
        descriptor_id: MethodDescriptorId,
        flags: MethodFlags,
        body: MethodBody,
    ) -> Self {
        Method {
            class_id,
            name,
            desc,
            descriptor_id,
            flags,
            body,
        }
    }

    pub fn class_id(&self) -> ClassId {
        self.class_id
    }

    pub fn flags(&self) -> MethodFlags {
        self.flags
    }

    pub fn is_static(&self) -> bool {
        self.flags.is_static()
    }

    pub fn is_private(&self) -> bool {
        self.flags.is_private()
    }

    pub fn is_native(&self) -> bool {
        matches!(self.body, MethodBody::Native)
    }

    pub fn is_abstract(&self) -> bool {
        matches!(self.body, MethodBody::Abstract)
    }

    pub fn descriptor_id(&self) -> MethodDescriptorId {
        self.descriptor_id
    }

    pub fn get_frame_attributes(&self) -> Result<(u16, u16), JvmError> {
        match &self.body {
            MethodBody::Interpreted(code_body) => Ok((code_body.max_stack, code_body.max_locals)),
            _ => throw_exception!(InternalError, "method has no frame to size"),
        }
    }

    pub fn get_code(&self) -> Result<Arc<[u8]>, JvmError> {
        match &self.body {
            MethodBody::Interpreted(code_body) => Ok(code_body.code.clone()),
            _ => throw_exception!(InternalError, "method has no bytecode body"),
        }
    }

    pub fn get_exception_table(&self) -> Result<&[ExceptionTableEntry], JvmError> {
        match &self.body {
            MethodBody::Interpreted(code_body) => Ok(&code_body.exception_table),
            _ => throw_exception!(InternalError, "method has no exception table"),
        }
    }
}
