use crate::constant::ConstantInfo;
use sigrun_common::error::LinkageError;
use sigrun_common::utils::cursor::Cursor;

/// The parsed constant pool. Entries keep classfile indexing: slot 0 is
/// `Unused`, `Long`/`Double` occupy two slots.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantPool {
    pub inner: Vec<ConstantInfo>,
}

impl ConstantPool {
    pub(crate) fn parse(cur: &mut Cursor<'_>) -> Result<Self, LinkageError> {
        let count = cur.u2()?;
        let mut inner = Vec::with_capacity(count as usize);
        inner.push(ConstantInfo::Unused);
        let mut idx = 1u16;
        while idx < count {
            let (entry, takes_two_slots) = ConstantInfo::parse(cur, idx)?;
            inner.push(entry);
            idx += 1;
            if takes_two_slots {
                inner.push(ConstantInfo::Unused);
                idx += 1;
            }
        }
        Ok(Self { inner })
    }

    pub fn entry(&self, idx: u16) -> Result<&ConstantInfo, LinkageError> {
        self.inner
            .get(idx as usize)
            .ok_or(LinkageError::BadConstantPoolIndex(idx))
    }

    pub fn get_utf8(&self, idx: u16) -> Result<&str, LinkageError> {
        match self.entry(idx)? {
            ConstantInfo::Utf8(s) => Ok(s),
            _ => Err(LinkageError::BadConstantPoolIndex(idx)),
        }
    }

    pub fn get_class_name(&self, idx: u16) -> Result<&str, LinkageError> {
        match self.entry(idx)? {
            ConstantInfo::Class(name_idx) => self.get_utf8(*name_idx),
            _ => Err(LinkageError::BadConstantPoolIndex(idx)),
        }
    }
}
