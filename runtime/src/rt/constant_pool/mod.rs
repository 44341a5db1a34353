use crate::error::JvmError;
use crate::keys::Symbol;
use crate::rt::constant_pool::entry::{
    ClassEntry, FieldEntryView, MemberRefEntry, MethodEntryView, NameAndTypeEntry,
    NameAndTypeEntryView, StringEntry, Utf8Entry,
};
use crate::{build_exception, throw_exception};
use lasso::ThreadedRodeo;
use sigrun_classfile::constant::ConstantInfo;
use std::fmt::Display;

pub mod entry;

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum RuntimeConstantType {
    Unused,
    Utf8,
    Integer,
    Float,
    Long,
    Double,
    Class,
    String,
    Method,
    Field,
    InterfaceMethod,
    NameAndType,
    MethodType,
    MethodHandle,
    InvokeDynamic,
}

impl Display for RuntimeConstantType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let type_str = match self {
            RuntimeConstantType::Unused => "Unused",
            RuntimeConstantType::Utf8 => "Utf8",
            RuntimeConstantType::Integer => "Integer",
            RuntimeConstantType::Float => "Float",
            RuntimeConstantType::Long => "Long",
            RuntimeConstantType::Double => "Double",
            RuntimeConstantType::Class => "Class",
            RuntimeConstantType::String => "String",
            RuntimeConstantType::Method => "Method",
            RuntimeConstantType::Field => "Field",
            RuntimeConstantType::InterfaceMethod => "InterfaceMethod",
            RuntimeConstantType::NameAndType => "NameAndType",
            RuntimeConstantType::MethodType => "MethodType",
            RuntimeConstantType::MethodHandle => "MethodHandle",
            RuntimeConstantType::InvokeDynamic => "InvokeDynamic",
        };
        write!(f, "{}", type_str)
    }
}

pub enum RuntimeConstant {
    Unused,
    Utf8(Utf8Entry),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class(ClassEntry),
    String(StringEntry),
    Method(MemberRefEntry),
    Field(MemberRefEntry),
    InterfaceMethod(MemberRefEntry),
    NameAndType(NameAndTypeEntry),
    // Parsed for completeness; resolving any of these is an unsupported
    // feature at the interpreter level.
    MethodType(u16),
    MethodHandle { reference_kind: u8, reference_index: u16 },
    InvokeDynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
}

impl RuntimeConstant {
    pub fn get_type(&self) -> RuntimeConstantType {
        match self {
            RuntimeConstant::Unused => RuntimeConstantType::Unused,
            RuntimeConstant::Utf8(_) => RuntimeConstantType::Utf8,
            RuntimeConstant::Integer(_) => RuntimeConstantType::Integer,
            RuntimeConstant::Float(_) => RuntimeConstantType::Float,
            RuntimeConstant::Long(_) => RuntimeConstantType::Long,
            RuntimeConstant::Double(_) => RuntimeConstantType::Double,
            RuntimeConstant::Class(_) => RuntimeConstantType::Class,
            RuntimeConstant::String(_) => RuntimeConstantType::String,
            RuntimeConstant::Method(_) => RuntimeConstantType::Method,
            RuntimeConstant::Field(_) => RuntimeConstantType::Field,
            RuntimeConstant::InterfaceMethod(_) => RuntimeConstantType::InterfaceMethod,
            RuntimeConstant::NameAndType(_) => RuntimeConstantType::NameAndType,
            RuntimeConstant::MethodType(_) => RuntimeConstantType::MethodType,
            RuntimeConstant::MethodHandle { .. } => RuntimeConstantType::MethodHandle,
            RuntimeConstant::InvokeDynamic { .. } => RuntimeConstantType::InvokeDynamic,
        }
    }
}

/// The per-class runtime view of the parsed constant pool: same indexing,
/// lazily interned symbols, typed accessors for each reference kind.
pub struct RuntimeConstantPool {
    entries: Vec<RuntimeConstant>,
}

impl RuntimeConstantPool {
    pub fn new(entries: Vec<ConstantInfo>) -> Self {
        let mut rt_entries = Vec::with_capacity(entries.len());
        for entry in entries {
            let rt_entry = match entry {
                ConstantInfo::Unused => RuntimeConstant::Unused,
                ConstantInfo::Utf8(utf8) => RuntimeConstant::Utf8(Utf8Entry::new(utf8)),
                ConstantInfo::Integer(v) => RuntimeConstant::Integer(v),
                ConstantInfo::Float(v) => RuntimeConstant::Float(v),
                ConstantInfo::Long(v) => RuntimeConstant::Long(v),
                ConstantInfo::Double(v) => RuntimeConstant::Double(v),
                ConstantInfo::Class(idx) => RuntimeConstant::Class(ClassEntry::new(idx)),
                ConstantInfo::String(idx) => RuntimeConstant::String(StringEntry::new(idx)),
                ConstantInfo::MethodRef(ref_info) => RuntimeConstant::Method(MemberRefEntry::new(
                    ref_info.class_index,
                    ref_info.name_and_type_index,
                )),
                ConstantInfo::FieldRef(ref_info) => RuntimeConstant::Field(MemberRefEntry::new(
                    ref_info.class_index,
                    ref_info.name_and_type_index,
                )),
                ConstantInfo::InterfaceMethodRef(ref_info) => RuntimeConstant::InterfaceMethod(
                    MemberRefEntry::new(ref_info.class_index, ref_info.name_and_type_index),
                ),
                ConstantInfo::NameAndType(nat_info) => RuntimeConstant::NameAndType(
                    NameAndTypeEntry::new(nat_info.name_index, nat_info.descriptor_index),
                ),
                ConstantInfo::MethodType(idx) => RuntimeConstant::MethodType(idx),
                ConstantInfo::MethodHandle(handle) => RuntimeConstant::MethodHandle {
                    reference_kind: handle.reference_kind,
                    reference_index: handle.reference_index,
                },
                ConstantInfo::InvokeDynamic(dynamic_info) => RuntimeConstant::InvokeDynamic {
                    bootstrap_method_attr_index: dynamic_info.bootstrap_method_attr_index,
                    name_and_type_index: dynamic_info.name_and_type_index,
                },
            };
            rt_entries.push(rt_entry);
        }
        Self { entries: rt_entries }
    }

    pub fn empty() -> Self {
        Self {
            entries: vec![RuntimeConstant::Unused],
        }
    }

    fn entry(&self, idx: &u16) -> Result<&RuntimeConstant, JvmError> {
        self.entries.get(*idx as usize).ok_or(build_exception!(
            ClassFormatError,
            "Invalid constant pool index: {}",
            *idx
        ))
    }

    /// `ldc` entry point: pre-resolves nested symbols so the handler can
    /// match on the returned constant directly.
    pub fn get_constant(
        &self,
        idx: &u16,
        interner: &ThreadedRodeo,
    ) -> Result<&RuntimeConstant, JvmError> {
        let entry = self.entry(idx)?;
        match entry {
            RuntimeConstant::Class(_) => {
                self.get_class_sym(idx, interner)?;
            }
            RuntimeConstant::String(_) => {
                self.get_string_sym(idx, interner)?;
            }
            _ => {}
        };
        Ok(entry)
    }

    pub fn get_utf8_sym(&self, idx: &u16, interner: &ThreadedRodeo) -> Result<Symbol, JvmError> {
        match self.entry(idx)? {
            RuntimeConstant::Utf8(entry) => Ok(*entry
                .utf8_sym
                .get_or_init(|| interner.get_or_intern(&entry.value))),
            other => throw_exception!(
                IncompatibleClassChangeError,
                pool_idx: *idx,
                expected: RuntimeConstantType::Utf8,
                actual: other.get_type()
            ),
        }
    }

    pub fn get_class_sym(&self, idx: &u16, interner: &ThreadedRodeo) -> Result<Symbol, JvmError> {
        match self.entry(idx)? {
            RuntimeConstant::Class(entry) => entry
                .name_sym
                .get_or_try_init(|| self.get_utf8_sym(&entry.name_idx, interner))
                .copied(),
            other => throw_exception!(
                IncompatibleClassChangeError,
                pool_idx: *idx,
                expected: RuntimeConstantType::Class,
                actual: other.get_type()
            ),
        }
    }

    pub fn get_string_sym(&self, idx: &u16, interner: &ThreadedRodeo) -> Result<Symbol, JvmError> {
        match self.entry(idx)? {
            RuntimeConstant::String(entry) => entry
                .string_sym
                .get_or_try_init(|| self.get_utf8_sym(&entry.string_idx, interner))
                .copied(),
            other => throw_exception!(
                IncompatibleClassChangeError,
                pool_idx: *idx,
                expected: RuntimeConstantType::String,
                actual: other.get_type()
            ),
        }
    }

    pub fn get_nat_view(
        &self,
        idx: &u16,
        interner: &ThreadedRodeo,
    ) -> Result<NameAndTypeEntryView, JvmError> {
        match self.entry(idx)? {
            RuntimeConstant::NameAndType(entry) => {
                let name_sym = *entry
                    .name_sym
                    .get_or_try_init(|| self.get_utf8_sym(&entry.name_idx, interner))?;
                let descriptor_sym = *entry
                    .descriptor_sym
                    .get_or_try_init(|| self.get_utf8_sym(&entry.descriptor_idx, interner))?;
                Ok(NameAndTypeEntryView::new(name_sym, descriptor_sym))
            }
            other => throw_exception!(
                IncompatibleClassChangeError,
                pool_idx: *idx,
                expected: RuntimeConstantType::NameAndType,
                actual: other.get_type()
            ),
        }
    }

    pub fn get_method_view(
        &self,
        idx: &u16,
        interner: &ThreadedRodeo,
    ) -> Result<MethodEntryView, JvmError> {
        match self.entry(idx)? {
            RuntimeConstant::Method(entry) => {
                let class_sym = *entry
                    .class_sym
                    .get_or_try_init(|| self.get_class_sym(&entry.class_idx, interner))?;
                let nat_view = self.get_nat_view(&entry.nat_idx, interner)?;
                Ok(MethodEntryView::new(class_sym, nat_view))
            }
            other => throw_exception!(
                IncompatibleClassChangeError,
                pool_idx: *idx,
                expected: RuntimeConstantType::Method,
                actual: other.get_type()
            ),
        }
    }

    pub fn get_interface_method_view(
        &self,
        idx: &u16,
        interner: &ThreadedRodeo,
    ) -> Result<MethodEntryView, JvmError> {
        match self.entry(idx)? {
            RuntimeConstant::InterfaceMethod(entry) => {
                let class_sym = *entry
                    .class_sym
                    .get_or_try_init(|| self.get_class_sym(&entry.class_idx, interner))?;
                let nat_view = self.get_nat_view(&entry.nat_idx, interner)?;
                Ok(MethodEntryView::new(class_sym, nat_view))
            }
            other => throw_exception!(
                IncompatibleClassChangeError,
                pool_idx: *idx,
                expected: RuntimeConstantType::InterfaceMethod,
                actual: other.get_type()
            ),
        }
    }

    /// `invokestatic` accepts either reference kind.
    pub fn get_method_or_interface_method_view(
        &self,
        idx: &u16,
        interner: &ThreadedRodeo,
    ) -> Result<MethodEntryView, JvmError> {
        match self.entry(idx)? {
            RuntimeConstant::Method(_) => self.get_method_view(idx, interner),
            RuntimeConstant::InterfaceMethod(_) => self.get_interface_method_view(idx, interner),
            other => throw_exception!(
                IncompatibleClassChangeError,
                pool_idx: *idx,
                expected: RuntimeConstantType::Method,
                actual: other.get_type()
            ),
        }
    }

    pub fn get_field_view(
        &self,
        idx: &u16,
        interner: &ThreadedRodeo,
    ) -> Result<FieldEntryView, JvmError> {
        match self.entry(idx)? {
            RuntimeConstant::Field(entry) => {
                let class_sym = *entry
                    .class_sym
                    .get_or_try_init(|| self.get_class_sym(&entry.class_idx, interner))?;
                let nat_view = self.get_nat_view(&entry.nat_idx, interner)?;
                Ok(FieldEntryView::new(class_sym, nat_view))
            }
            other => throw_exception!(
                IncompatibleClassChangeError,
                pool_idx: *idx,
                expected: RuntimeConstantType::Field,
                actual: other.get_type()
            ),
        }
    }
}
