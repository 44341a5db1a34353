use crate::constant::pool::ConstantPool;
use sigrun_common::error::LinkageError;
use sigrun_common::utils::cursor::Cursor;

pub mod class;
pub mod method;

pub(crate) fn attribute_name<'a>(
    cp: &'a ConstantPool,
    name_index: u16,
) -> Result<&'a str, LinkageError> {
    cp.get_utf8(name_index)
}

pub(crate) fn skip_attribute(cur: &mut Cursor<'_>, length: u32) -> Result<(), LinkageError> {
    cur.skip(length as usize)?;
    Ok(())
}
