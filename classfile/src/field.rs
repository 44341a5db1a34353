use crate::attribute::{attribute_name, skip_attribute};
use crate::constant::pool::ConstantPool;
use crate::flags::FieldFlags;
use sigrun_common::error::LinkageError;
use sigrun_common::utils::cursor::Cursor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldAttr {
    /// Constant pool index of the initial value of a static final field.
    ConstantValue(u16),
    Unknown(u16),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    pub access_flags: FieldFlags,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Vec<FieldAttr>,
}

impl FieldInfo {
    pub(crate) fn parse(cur: &mut Cursor<'_>, cp: &ConstantPool) -> Result<Self, LinkageError> {
        let access_flags = FieldFlags::new(cur.u2()?);
        let name_index = cur.u2()?;
        let descriptor_index = cur.u2()?;

        let count = cur.u2()?;
        let mut attributes = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let attr_name_index = cur.u2()?;
            let length = cur.u4()?;
            let attr = match attribute_name(cp, attr_name_index)? {
                "ConstantValue" => FieldAttr::ConstantValue(cur.u2()?),
                _ => {
                    skip_attribute(cur, length)?;
                    FieldAttr::Unknown(attr_name_index)
                }
            };
            attributes.push(attr);
        }

        Ok(FieldInfo {
            access_flags,
            name_index,
            descriptor_index,
            attributes,
        })
    }

    pub fn constant_value_index(&self) -> Option<u16> {
        self.attributes.iter().find_map(|attr| match attr {
            FieldAttr::ConstantValue(idx) => Some(*idx),
            FieldAttr::Unknown(_) => None,
        })
    }
}
