use crate::attribute::{attribute_name, skip_attribute};
use crate::constant::pool::ConstantPool;
use sigrun_common::error::LinkageError;
use sigrun_common::utils::cursor::Cursor;

/// One row of a method's exception table (JVMS §4.7.3). `catch_type == 0`
/// matches any throwable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionTableEntry {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    pub catch_type: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineNumberEntry {
    pub start_pc: u16,
    pub line_number: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeAttributeInfo {
    LineNumberTable(Vec<LineNumberEntry>),
    Unknown(u16),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeAttribute {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
    pub exception_table: Vec<ExceptionTableEntry>,
    pub attributes: Vec<CodeAttributeInfo>,
}

impl CodeAttribute {
    fn parse(cur: &mut Cursor<'_>, cp: &ConstantPool) -> Result<Self, LinkageError> {
        let max_stack = cur.u2()?;
        let max_locals = cur.u2()?;
        let code_length = cur.u4()? as usize;
        let code = cur.bytes(code_length)?.to_vec();

        let exception_table_length = cur.u2()?;
        let mut exception_table = Vec::with_capacity(exception_table_length as usize);
        for _ in 0..exception_table_length {
            exception_table.push(ExceptionTableEntry {
                start_pc: cur.u2()?,
                end_pc: cur.u2()?,
                handler_pc: cur.u2()?,
                catch_type: cur.u2()?,
            });
        }

        let attr_count = cur.u2()?;
        let mut attributes = Vec::with_capacity(attr_count as usize);
        for _ in 0..attr_count {
            let name_index = cur.u2()?;
            let length = cur.u4()?;
            let attr = match attribute_name(cp, name_index)? {
                "LineNumberTable" => {
                    let entries = cur.u2()?;
                    let mut table = Vec::with_capacity(entries as usize);
                    for _ in 0..entries {
                        table.push(LineNumberEntry {
                            start_pc: cur.u2()?,
                            line_number: cur.u2()?,
                        });
                    }
                    CodeAttributeInfo::LineNumberTable(table)
                }
                _ => {
                    skip_attribute(cur, length)?;
                    CodeAttributeInfo::Unknown(name_index)
                }
            };
            attributes.push(attr);
        }

        Ok(CodeAttribute {
            max_stack,
            max_locals,
            code,
            exception_table,
            attributes,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MethodAttribute {
    Code(CodeAttribute),
    Unknown(u16),
}

impl MethodAttribute {
    pub(crate) fn parse_all(
        cur: &mut Cursor<'_>,
        cp: &ConstantPool,
    ) -> Result<Vec<MethodAttribute>, LinkageError> {
        let count = cur.u2()?;
        let mut attributes = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let name_index = cur.u2()?;
            let length = cur.u4()?;
            let attr = match attribute_name(cp, name_index)? {
                "Code" => MethodAttribute::Code(CodeAttribute::parse(cur, cp)?),
                _ => {
                    skip_attribute(cur, length)?;
                    MethodAttribute::Unknown(name_index)
                }
            };
            attributes.push(attr);
        }
        Ok(attributes)
    }
}
