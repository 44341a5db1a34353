use crate::attribute::method::{CodeAttribute, MethodAttribute};
use crate::constant::pool::ConstantPool;
use crate::flags::MethodFlags;
use sigrun_common::error::LinkageError;
use sigrun_common::utils::cursor::Cursor;

#[derive(Debug, Clone, PartialEq)]
pub struct MethodInfo {
    pub access_flags: MethodFlags,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Vec<MethodAttribute>,
}

impl MethodInfo {
    pub(crate) fn parse(cur: &mut Cursor<'_>, cp: &ConstantPool) -> Result<Self, LinkageError> {
        let access_flags = MethodFlags::new(cur.u2()?);
        let name_index = cur.u2()?;
        let descriptor_index = cur.u2()?;
        let attributes = MethodAttribute::parse_all(cur, cp)?;
        Ok(MethodInfo {
            access_flags,
            name_index,
            descriptor_index,
            attributes,
        })
    }

    pub fn code_attribute(&self) -> Option<&CodeAttribute> {
        self.attributes.iter().find_map(|attr| match attr {
            MethodAttribute::Code(code) => Some(code),
            MethodAttribute::Unknown(_) => None,
        })
    }
}
