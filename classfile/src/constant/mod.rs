use sigrun_common::error::LinkageError;
use sigrun_common::utils::cursor::Cursor;

pub mod pool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefInfo {
    pub class_index: u16,
    pub name_and_type_index: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameAndTypeInfo {
    pub name_index: u16,
    pub descriptor_index: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodHandleInfo {
    pub reference_kind: u8,
    pub reference_index: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvokeDynamicInfo {
    pub bootstrap_method_attr_index: u16,
    pub name_and_type_index: u16,
}

/// One constant pool entry (JVMS §4.4). Index 0 and the upper halves of
/// `Long`/`Double` entries are `Unused`.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantInfo {
    Unused,
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class(u16),
    String(u16),
    FieldRef(RefInfo),
    MethodRef(RefInfo),
    InterfaceMethodRef(RefInfo),
    NameAndType(NameAndTypeInfo),
    MethodHandle(MethodHandleInfo),
    MethodType(u16),
    InvokeDynamic(InvokeDynamicInfo),
}

impl ConstantInfo {
    const TAG_UTF8: u8 = 1;
    const TAG_INTEGER: u8 = 3;
    const TAG_FLOAT: u8 = 4;
    const TAG_LONG: u8 = 5;
    const TAG_DOUBLE: u8 = 6;
    const TAG_CLASS: u8 = 7;
    const TAG_STRING: u8 = 8;
    const TAG_FIELD_REF: u8 = 9;
    const TAG_METHOD_REF: u8 = 10;
    const TAG_INTERFACE_METHOD_REF: u8 = 11;
    const TAG_NAME_AND_TYPE: u8 = 12;
    const TAG_METHOD_HANDLE: u8 = 15;
    const TAG_METHOD_TYPE: u8 = 16;
    const TAG_INVOKE_DYNAMIC: u8 = 18;

    /// Parse one entry. `Long`/`Double` report that they consume a second
    /// pool slot via the returned flag.
    pub(crate) fn parse(cur: &mut Cursor<'_>, idx: u16) -> Result<(Self, bool), LinkageError> {
        let tag = cur.u1()?;
        let entry = match tag {
            Self::TAG_UTF8 => {
                let len = cur.u2()? as usize;
                let bytes = cur.bytes(len)?;
                // Classfile strings are MUTF-8; plain UTF-8 covers everything
                // this interpreter resolves (names, descriptors, literals
                // without embedded NUL or supplementary pairs).
                let value = std::str::from_utf8(bytes)
                    .map_err(|_| LinkageError::MalformedUtf8(idx))?
                    .to_string();
                ConstantInfo::Utf8(value)
            }
            Self::TAG_INTEGER => ConstantInfo::Integer(cur.i4()?),
            Self::TAG_FLOAT => ConstantInfo::Float(f32::from_bits(cur.u4()?)),
            Self::TAG_LONG => {
                let high = cur.u4()? as u64;
                let low = cur.u4()? as u64;
                return Ok((ConstantInfo::Long(((high << 32) | low) as i64), true));
            }
            Self::TAG_DOUBLE => {
                let high = cur.u4()? as u64;
                let low = cur.u4()? as u64;
                return Ok((ConstantInfo::Double(f64::from_bits((high << 32) | low)), true));
            }
            Self::TAG_CLASS => ConstantInfo::Class(cur.u2()?),
            Self::TAG_STRING => ConstantInfo::String(cur.u2()?),
            Self::TAG_FIELD_REF => ConstantInfo::FieldRef(RefInfo {
                class_index: cur.u2()?,
                name_and_type_index: cur.u2()?,
            }),
            Self::TAG_METHOD_REF => ConstantInfo::MethodRef(RefInfo {
                class_index: cur.u2()?,
                name_and_type_index: cur.u2()?,
            }),
            Self::TAG_INTERFACE_METHOD_REF => ConstantInfo::InterfaceMethodRef(RefInfo {
                class_index: cur.u2()?,
                name_and_type_index: cur.u2()?,
            }),
            Self::TAG_NAME_AND_TYPE => ConstantInfo::NameAndType(NameAndTypeInfo {
                name_index: cur.u2()?,
                descriptor_index: cur.u2()?,
            }),
            Self::TAG_METHOD_HANDLE => ConstantInfo::MethodHandle(MethodHandleInfo {
                reference_kind: cur.u1()?,
                reference_index: cur.u2()?,
            }),
            Self::TAG_METHOD_TYPE => ConstantInfo::MethodType(cur.u2()?),
            Self::TAG_INVOKE_DYNAMIC => ConstantInfo::InvokeDynamic(InvokeDynamicInfo {
                bootstrap_method_attr_index: cur.u2()?,
                name_and_type_index: cur.u2()?,
            }),
            other => return Err(LinkageError::BadConstantTag(other)),
        };
        Ok((entry, false))
    }
}
