use lasso::ThreadedRodeo;
use std::num::NonZeroU32;

/// Interned name or descriptor.
pub type Symbol = lasso::Spur;

macro_rules! index_key {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(NonZeroU32);

        impl $name {
            /// One-based: built from `vec.len()` right after a push.
            pub fn from_usize(one_based: usize) -> Self {
                Self(NonZeroU32::new(one_based as u32).expect("index keys are one-based"))
            }

            pub fn to_index(self) -> usize {
                (self.0.get() - 1) as usize
            }
        }
    };
}

index_key!(ClassId);
index_key!(MethodId);
index_key!(FieldDescriptorId);
index_key!(MethodDescriptorId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadId(usize);

impl ThreadId {
    pub fn from_usize(id: usize) -> Self {
        Self(id)
    }

    pub fn to_usize(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldKey {
    pub name: Symbol,
    pub desc: Symbol,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodKey {
    pub name: Symbol,
    pub desc: Symbol,
}

/// Key of the native registry: declaring class plus name and descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FullyQualifiedMethodKey {
    pub class: Symbol,
    pub name: Symbol,
    pub desc: Symbol,
}

impl FullyQualifiedMethodKey {
    pub fn new(class: Symbol, name: Symbol, desc: Symbol) -> Self {
        Self { class, name, desc }
    }

    pub fn new_with_str(class: &str, name: &str, desc: &str, interner: &ThreadedRodeo) -> Self {
        Self {
            class: interner.get_or_intern(class),
            name: interner.get_or_intern(name),
            desc: interner.get_or_intern(desc),
        }
    }
}
