use crate::keys::{FieldKey, MethodKey, Symbol};
use once_cell::sync::OnceCell;

/// Pool entries cache their interned symbols on first resolution.

pub struct Utf8Entry {
    pub value: String,
    pub utf8_sym: OnceCell<Symbol>,
}

impl Utf8Entry {
    pub fn new(value: String) -> Self {
        Self {
            value,
            utf8_sym: OnceCell::new(),
        }
    }
}

pub struct ClassEntry {
    pub name_idx: u16,
    pub name_sym: OnceCell<Symbol>,
}

impl ClassEntry {
    pub fn new(name_idx: u16) -> Self {
        Self {
            name_idx,
            name_sym: OnceCell::new(),
        }
    }
}

pub struct StringEntry {
    pub string_idx: u16,
    pub string_sym: OnceCell<Symbol>,
}

impl StringEntry {
    pub fn new(string_idx: u16) -> Self {
        Self {
            string_idx,
            string_sym: OnceCell::new(),
        }
    }
}

pub struct NameAndTypeEntry {
    pub name_idx: u16,
    pub descriptor_idx: u16,
    pub name_sym: OnceCell<Symbol>,
    pub descriptor_sym: OnceCell<Symbol>,
}

impl NameAndTypeEntry {
    pub fn new(name_idx: u16, descriptor_idx: u16) -> Self {
        Self {
            name_idx,
            descriptor_idx,
            name_sym: OnceCell::new(),
            descriptor_sym: OnceCell::new(),
        }
    }
}

/// `Fieldref` / `Methodref` / `InterfaceMethodref` share this shape.
pub struct MemberRefEntry {
    pub class_idx: u16,
    pub nat_idx: u16,
    pub class_sym: OnceCell<Symbol>,
}

impl MemberRefEntry {
    pub fn new(class_idx: u16, nat_idx: u16) -> Self {
        Self {
            class_idx,
            nat_idx,
            class_sym: OnceCell::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameAndTypeEntryView {
    pub name_sym: Symbol,
    pub descriptor_sym: Symbol,
}

impl NameAndTypeEntryView {
    pub fn new(name_sym: Symbol, descriptor_sym: Symbol) -> Self {
        Self {
            name_sym,
            descriptor_sym,
        }
    }
}

impl From<NameAndTypeEntryView> for MethodKey {
    fn from(view: NameAndTypeEntryView) -> Self {
        MethodKey {
            name: view.name_sym,
            desc: view.descriptor_sym,
        }
    }
}

impl From<NameAndTypeEntryView> for FieldKey {
    fn from(view: NameAndTypeEntryView) -> Self {
        FieldKey {
            name: view.name_sym,
            desc: view.descriptor_sym,
        }
    }
}

/// A resolved symbolic reference: `(class, name, descriptor)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodEntryView {
    pub class_sym: Symbol,
    pub name_and_type: NameAndTypeEntryView,
}

impl MethodEntryView {
    pub fn new(class_sym: Symbol, name_and_type: NameAndTypeEntryView) -> Self {
        Self {
            class_sym,
            name_and_type,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldEntryView {
    pub class_sym: Symbol,
    pub name_and_type: NameAndTypeEntryView,
}

impl FieldEntryView {
    pub fn new(class_sym: Symbol, name_and_type: NameAndTypeEntryView) -> Self {
        Self {
            class_sym,
            name_and_type,
        }
    }
}
