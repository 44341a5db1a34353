use crate::attribute::class::ClassAttr;
use crate::constant::pool::ConstantPool;
use crate::field::FieldInfo;
use crate::flags::ClassFlags;
use crate::method::MethodInfo;
use sigrun_common::error::LinkageError;
use sigrun_common::utils::cursor::Cursor;

pub mod attribute;
pub mod constant;
pub mod field;
pub mod flags;
pub mod method;

const MAGIC: u32 = 0xCAFE_BABE;

/// A fully parsed `.class` file. Symbolic indices are left unresolved; the
/// runtime constant pool interprets them on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub cp: ConstantPool,
    pub access_flags: ClassFlags,
    pub this_class: u16,
    pub super_class: u16,
    pub interfaces: Vec<u16>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
    pub attributes: Vec<ClassAttr>,
}

impl ClassFile {
    pub fn get_this_class_name(&self) -> Result<&str, LinkageError> {
        self.cp.get_class_name(self.this_class)
    }

    /// `None` only for `java/lang/Object`, which has no superclass.
    pub fn get_super_class_name(&self) -> Result<Option<&str>, LinkageError> {
        if self.super_class == 0 {
            return Ok(None);
        }
        self.cp.get_class_name(self.super_class).map(Some)
    }
}

impl TryFrom<Vec<u8>> for ClassFile {
    type Error = LinkageError;

    fn try_from(data: Vec<u8>) -> Result<Self, Self::Error> {
        ClassFile::try_from(data.as_slice())
    }
}

impl TryFrom<&[u8]> for ClassFile {
    type Error = LinkageError;

    fn try_from(data: &[u8]) -> Result<Self, Self::Error> {
        let mut cur = Cursor::new(data);

        let magic = cur.u4()?;
        if magic != MAGIC {
            return Err(LinkageError::BadMagic(magic));
        }
        let minor_version = cur.u2()?;
        let major_version = cur.u2()?;

        let cp = ConstantPool::parse(&mut cur)?;

        let access_flags = ClassFlags::new(cur.u2()?);
        let this_class = cur.u2()?;
        let super_class = cur.u2()?;

        let interface_count = cur.u2()?;
        let mut interfaces = Vec::with_capacity(interface_count as usize);
        for _ in 0..interface_count {
            interfaces.push(cur.u2()?);
        }

        let field_count = cur.u2()?;
        let mut fields = Vec::with_capacity(field_count as usize);
        for _ in 0..field_count {
            fields.push(FieldInfo::parse(&mut cur, &cp)?);
        }

        let method_count = cur.u2()?;
        let mut methods = Vec::with_capacity(method_count as usize);
        for _ in 0..method_count {
            methods.push(MethodInfo::parse(&mut cur, &cp)?);
        }

        let attributes = ClassAttr::parse_all(&mut cur, &cp)?;

        if cur.remaining() != 0 {
            return Err(LinkageError::TrailingBytes(cur.remaining()));
        }

        Ok(ClassFile {
            minor_version,
            major_version,
            cp,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::ConstantInfo;

    /// Hand-assembled classfile for `class Probe { static int answer() {...} }`
    /// with code `iconst_2 iconst_3 iadd ireturn`.
    fn probe_class_bytes() -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&MAGIC.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes()); // minor
        out.extend_from_slice(&52u16.to_be_bytes()); // major

        // Constant pool: 1=Utf8 "Probe", 2=Class #1, 3=Utf8 "java/lang/Object",
        // 4=Class #3, 5=Utf8 "answer", 6=Utf8 "()I", 7=Utf8 "Code"
        out.extend_from_slice(&8u16.to_be_bytes());
        for text in ["Probe"] {
            out.push(1);
            out.extend_from_slice(&(text.len() as u16).to_be_bytes());
            out.extend_from_slice(text.as_bytes());
        }
        out.push(7);
        out.extend_from_slice(&1u16.to_be_bytes());
        for text in ["java/lang/Object"] {
            out.push(1);
            out.extend_from_slice(&(text.len() as u16).to_be_bytes());
            out.extend_from_slice(text.as_bytes());
        }
        out.push(7);
        out.extend_from_slice(&3u16.to_be_bytes());
        for text in ["answer", "()I", "Code"] {
            out.push(1);
            out.extend_from_slice(&(text.len() as u16).to_be_bytes());
            out.extend_from_slice(text.as_bytes());
        }

        out.extend_from_slice(&0x0021u16.to_be_bytes()); // public super
        out.extend_from_slice(&2u16.to_be_bytes()); // this = Probe
        out.extend_from_slice(&4u16.to_be_bytes()); // super = Object
        out.extend_from_slice(&0u16.to_be_bytes()); // interfaces
        out.extend_from_slice(&0u16.to_be_bytes()); // fields

        out.extend_from_slice(&1u16.to_be_bytes()); // methods
        out.extend_from_slice(&0x0009u16.to_be_bytes()); // public static
        out.extend_from_slice(&5u16.to_be_bytes()); // name "answer"
        out.extend_from_slice(&6u16.to_be_bytes()); // desc "()I"
        out.extend_from_slice(&1u16.to_be_bytes()); // one attribute
        out.extend_from_slice(&7u16.to_be_bytes()); // "Code"
        let code: [u8; 4] = [0x05, 0x06, 0x60, 0xac];
        let code_attr_len = 2 + 2 + 4 + code.len() + 2 + 2;
        out.extend_from_slice(&(code_attr_len as u32).to_be_bytes());
        out.extend_from_slice(&2u16.to_be_bytes()); // max_stack
        out.extend_from_slice(&0u16.to_be_bytes()); // max_locals
        out.extend_from_slice(&(code.len() as u32).to_be_bytes());
        out.extend_from_slice(&code);
        out.extend_from_slice(&0u16.to_be_bytes()); // exception table
        out.extend_from_slice(&0u16.to_be_bytes()); // code attributes

        out.extend_from_slice(&0u16.to_be_bytes()); // class attributes
        out
    }

    #[test]
    fn parses_handcrafted_class() {
        let cf = ClassFile::try_from(probe_class_bytes()).unwrap();
        assert_eq!(cf.get_this_class_name().unwrap(), "Probe");
        assert_eq!(cf.get_super_class_name().unwrap(), Some("java/lang/Object"));
        assert!(cf.access_flags.has_super_semantics());
        assert_eq!(cf.methods.len(), 1);

        let method = &cf.methods[0];
        assert!(method.access_flags.is_static());
        assert_eq!(cf.cp.get_utf8(method.name_index).unwrap(), "answer");
        let code = method.code_attribute().unwrap();
        assert_eq!(code.max_stack, 2);
        assert_eq!(code.code, vec![0x05, 0x06, 0x60, 0xac]);
        assert!(code.exception_table.is_empty());
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = probe_class_bytes();
        bytes[0] = 0;
        assert!(matches!(
            ClassFile::try_from(bytes),
            Err(LinkageError::BadMagic(_))
        ));
    }

    #[test]
    fn long_and_double_take_two_slots() {
        // Minimal pool: count 4, Long at 1 (slots 1+2), Utf8 at 3.
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&4u16.to_be_bytes());
        bytes.push(5);
        bytes.extend_from_slice(&0x1_0000_0002u64.to_be_bytes());
        bytes.push(1);
        bytes.extend_from_slice(&1u16.to_be_bytes());
        bytes.push(b'x');
        let mut cur = Cursor::new(&bytes);
        let pool = ConstantPool::parse(&mut cur).unwrap();
        assert_eq!(pool.inner.len(), 4);
        assert_eq!(*pool.entry(1).unwrap(), ConstantInfo::Long(0x1_0000_0002));
        assert_eq!(*pool.entry(2).unwrap(), ConstantInfo::Unused);
        assert_eq!(pool.get_utf8(3).unwrap(), "x");
    }
}
