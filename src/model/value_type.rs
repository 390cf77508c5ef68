//! Value kinds and raw declared types.
//!
//! Validation rules are registered against a [`ValueType`]; a rule declared for
//! a kind applies to every kind below it in the lineage
//! (`Object > Number > Integer`, `Object > Text > String`, ...).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of value kinds with a single-parent lineage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Object,
    Number,
    Integer,
    Long,
    Short,
    Byte,
    Float,
    Double,
    Decimal,
    Text,
    String,
    Character,
    Boolean,
    Date,
    Enum,
    File,
    Image,
}

impl ValueType {
    /// Direct parent in the lineage, `None` for `Object`.
    pub fn parent(self) -> Option<ValueType> {
        use ValueType::*;

        match self {
            Object => None,
            Number | Text | Character | Boolean | Date | Enum | File | Image => Some(Object),
            Integer | Long | Short | Byte | Float | Double | Decimal => Some(Number),
            String => Some(Text),
        }
    }

    /// This kind followed by each ancestor, nearest first.
    pub fn lineage(self) -> impl Iterator<Item = ValueType> {
        std::iter::successors(Some(self), |ty| ty.parent())
    }

    /// True when a value of kind `other` may be used where `self` is expected.
    pub fn is_assignable_from(self, other: ValueType) -> bool {
        other.lineage().any(|ty| ty == self)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Unboxed scalar types accepted in declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Int,
    Long,
    Short,
    Byte,
    Float,
    Double,
    Boolean,
    Char,
}

impl Primitive {
    /// Boxed counterpart, so one rule entry serves both spellings.
    pub fn boxed(self) -> ValueType {
        match self {
            Primitive::Int => ValueType::Integer,
            Primitive::Long => ValueType::Long,
            Primitive::Short => ValueType::Short,
            Primitive::Byte => ValueType::Byte,
            Primitive::Float => ValueType::Float,
            Primitive::Double => ValueType::Double,
            Primitive::Boolean => ValueType::Boolean,
            Primitive::Char => ValueType::Character,
        }
    }
}

/// Type text of a declared field, parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawType {
    Primitive(Primitive),
    Boxed(ValueType),
    /// `enum:<Name>`
    Enum(String),
    Unsupported(String),
}

impl RawType {
    pub fn parse(text: &str) -> RawType {
        let text = text.trim();

        if let Some(name) = text.strip_prefix("enum:") {
            return RawType::Enum(name.trim().to_string());
        }

        match text {
            "int" => RawType::Primitive(Primitive::Int),
            "long" => RawType::Primitive(Primitive::Long),
            "short" => RawType::Primitive(Primitive::Short),
            "byte" => RawType::Primitive(Primitive::Byte),
            "float" => RawType::Primitive(Primitive::Float),
            "double" => RawType::Primitive(Primitive::Double),
            "boolean" | "bool" => RawType::Primitive(Primitive::Boolean),
            "char" => RawType::Primitive(Primitive::Char),
            "Integer" => RawType::Boxed(ValueType::Integer),
            "Long" => RawType::Boxed(ValueType::Long),
            "Short" => RawType::Boxed(ValueType::Short),
            "Byte" => RawType::Boxed(ValueType::Byte),
            "Float" => RawType::Boxed(ValueType::Float),
            "Double" => RawType::Boxed(ValueType::Double),
            "BigDecimal" | "Decimal" => RawType::Boxed(ValueType::Decimal),
            "Boolean" => RawType::Boxed(ValueType::Boolean),
            "Character" => RawType::Boxed(ValueType::Character),
            "String" => RawType::Boxed(ValueType::String),
            "Date" => RawType::Boxed(ValueType::Date),
            "File" => RawType::Boxed(ValueType::File),
            "Image" => RawType::Boxed(ValueType::Image),
            other => RawType::Unsupported(other.to_string()),
        }
    }

    /// Normalized value kind; `None` for unsupported types.
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            RawType::Primitive(p) => Some(p.boxed()),
            RawType::Boxed(ty) => Some(*ty),
            RawType::Enum(_) => Some(ValueType::Enum),
            RawType::Unsupported(_) => None,
        }
    }
}

impl FromStr for RawType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(RawType::parse(s))
    }
}
