use crate::attribute::{attribute_name, skip_attribute};
use crate::constant::pool::ConstantPool;
use sigrun_common::error::LinkageError;
use sigrun_common::utils::cursor::Cursor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassAttr {
    SourceFile(u16),
    /// Attribute the interpreter has no use for; name index retained for
    /// diagnostics.
    Unknown(u16),
}

impl ClassAttr {
    pub(crate) fn parse_all(
        cur: &mut Cursor<'_>,
        cp: &ConstantPool,
    ) -> Result<Vec<ClassAttr>, LinkageError> {
        let count = cur.u2()?;
        let mut attributes = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let name_index = cur.u2()?;
            let length = cur.u4()?;
            let attr = match attribute_name(cp, name_index)? {
                "SourceFile" => ClassAttr::SourceFile(cur.u2()?),
                _ => {
                    skip_attribute(cur, length)?;
                    ClassAttr::Unknown(name_index)
                }
            };
            attributes.push(attr);
        }
        Ok(attributes)
    }
}
