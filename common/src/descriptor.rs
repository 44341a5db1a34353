use crate::error::{MethodDescriptorErr, TypeDescriptorErr};
use crate::jtype::{AllocationType, PrimitiveType};
use itertools::Itertools;
use std::fmt::Display;

/// A parsed field type descriptor (JVMS §4.3.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JavaType {
    Primitive(PrimitiveType),
    Instance(String),
    Array(Box<JavaType>),
}

impl JavaType {
    pub fn as_allocation_type(&self) -> AllocationType {
        match self {
            JavaType::Primitive(p) => AllocationType::from(*p),
            JavaType::Instance(_) | JavaType::Array(_) => AllocationType::Reference,
        }
    }

    pub fn is_wide(&self) -> bool {
        matches!(
            self,
            JavaType::Primitive(PrimitiveType::Long) | JavaType::Primitive(PrimitiveType::Double)
        )
    }

    /// For an array descriptor, the element type of a one-dimensional
    /// primitive array, if that is what this is.
    pub fn primitive_array_element(&self) -> Option<PrimitiveType> {
        match self {
            JavaType::Array(inner) => match inner.as_ref() {
                JavaType::Primitive(p) => Some(*p),
                _ => None,
            },
            _ => None,
        }
    }

    /// For an array descriptor, the class name of a one-dimensional object
    /// array element, if that is what this is.
    pub fn instance_array_element(&self) -> Option<&str> {
        match self {
            JavaType::Array(inner) => match inner.as_ref() {
                JavaType::Instance(name) => Some(name),
                _ => None,
            },
            _ => None,
        }
    }

    fn parse(chars: &mut std::str::Chars<'_>, full: &str) -> Result<Self, TypeDescriptorErr> {
        let tag = chars.next().ok_or(TypeDescriptorErr::Empty)?;
        match tag {
            'Z' => Ok(JavaType::Primitive(PrimitiveType::Boolean)),
            'B' => Ok(JavaType::Primitive(PrimitiveType::Byte)),
            'C' => Ok(JavaType::Primitive(PrimitiveType::Char)),
            'S' => Ok(JavaType::Primitive(PrimitiveType::Short)),
            'I' => Ok(JavaType::Primitive(PrimitiveType::Int)),
            'J' => Ok(JavaType::Primitive(PrimitiveType::Long)),
            'F' => Ok(JavaType::Primitive(PrimitiveType::Float)),
            'D' => Ok(JavaType::Primitive(PrimitiveType::Double)),
            'L' => {
                let name: String = chars.take_while_ref(|&c| c != ';').collect();
                match chars.next() {
                    Some(';') => Ok(JavaType::Instance(name)),
                    _ => Err(TypeDescriptorErr::UnterminatedObject(full.to_string())),
                }
            }
            '[' => Ok(JavaType::Array(Box::new(Self::parse(chars, full)?))),
            other => Err(TypeDescriptorErr::UnknownTag(other)),
        }
    }

    fn java_name(&self) -> String {
        match self {
            JavaType::Primitive(p) => p.name().to_string(),
            JavaType::Instance(name) => name.replace('/', "."),
            JavaType::Array(inner) => format!("{}[]", inner.java_name()),
        }
    }
}

impl TryFrom<&str> for JavaType {
    type Error = TypeDescriptorErr;

    fn try_from(descriptor: &str) -> Result<Self, Self::Error> {
        let mut chars = descriptor.chars();
        let ty = Self::parse(&mut chars, descriptor)?;
        if chars.next().is_some() {
            return Err(TypeDescriptorErr::TrailingChars(descriptor.to_string()));
        }
        Ok(ty)
    }
}

impl Display for JavaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.java_name())
    }
}

/// A parsed method descriptor (JVMS §4.3.3). `ret` is `None` for `V`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub params: Vec<JavaType>,
    pub ret: Option<JavaType>,
}

impl MethodDescriptor {
    pub fn is_void(&self) -> bool {
        self.ret.is_none()
    }

    pub fn to_java_signature(&self, class_name: &str, method_name: &str) -> String {
        let params = self.params.iter().map(|p| p.java_name()).join(", ");
        let ret = self
            .ret
            .as_ref()
            .map(|r| r.java_name())
            .unwrap_or_else(|| "void".to_string());
        format!("{} {}.{}({})", ret, class_name.replace('/', "."), method_name, params)
    }
}

impl TryFrom<&str> for MethodDescriptor {
    type Error = MethodDescriptorErr;

    fn try_from(descriptor: &str) -> Result<Self, Self::Error> {
        let rest = descriptor
            .strip_prefix('(')
            .ok_or_else(|| MethodDescriptorErr::MissingOpenParen(descriptor.to_string()))?;
        let close = rest
            .find(')')
            .ok_or_else(|| MethodDescriptorErr::MissingCloseParen(descriptor.to_string()))?;
        let (param_str, ret_str) = rest.split_at(close);
        let ret_str = &ret_str[1..];

        let mut params = Vec::new();
        let mut chars = param_str.chars();
        while !chars.as_str().is_empty() {
            params.push(
                JavaType::parse(&mut chars, param_str).map_err(MethodDescriptorErr::BadParameter)?,
            );
        }

        let ret = if ret_str == "V" {
            None
        } else {
            Some(JavaType::try_from(ret_str).map_err(MethodDescriptorErr::BadReturn)?)
        };

        Ok(MethodDescriptor { params, ret })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("I", JavaType::Primitive(PrimitiveType::Int))]
    #[case("J", JavaType::Primitive(PrimitiveType::Long))]
    #[case("Ljava/lang/String;", JavaType::Instance("java/lang/String".to_string()))]
    #[case("[I", JavaType::Array(Box::new(JavaType::Primitive(PrimitiveType::Int))))]
    #[case(
        "[[Ljava/lang/Object;",
        JavaType::Array(Box::new(JavaType::Array(Box::new(JavaType::Instance(
            "java/lang/Object".to_string()
        )))))
    )]
    fn parses_field_descriptors(#[case] input: &str, #[case] expected: JavaType) {
        assert_eq!(JavaType::try_from(input).unwrap(), expected);
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(matches!(
            JavaType::try_from("Ix"),
            Err(TypeDescriptorErr::TrailingChars(_))
        ));
        assert!(matches!(
            JavaType::try_from("Ljava/lang/String"),
            Err(TypeDescriptorErr::UnterminatedObject(_))
        ));
    }

    #[rstest]
    #[case("()V", 0, true)]
    #[case("(IJ)I", 2, false)]
    #[case("([Ljava/lang/String;)V", 1, true)]
    #[case("(Ljava/lang/String;IZ)Ljava/lang/Object;", 3, false)]
    fn parses_method_descriptors(#[case] input: &str, #[case] params: usize, #[case] void: bool) {
        let desc = MethodDescriptor::try_from(input).unwrap();
        assert_eq!(desc.params.len(), params);
        assert_eq!(desc.is_void(), void);
    }

    #[test]
    fn renders_java_signature() {
        let desc = MethodDescriptor::try_from("(Ljava/lang/String;I)V").unwrap();
        assert_eq!(
            desc.to_java_signature("com/example/Main", "run"),
            "void com.example.Main.run(java.lang.String, int)"
        );
    }
}
