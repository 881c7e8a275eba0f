use std::fmt::Display;

use super::constants::TYPE_INT;
use super::error::FaultKind;

/// Handle to an object slot in the [`Heap`](super::Heap). It does not own the
/// object; the heap does. The generation tells a handle to the current
/// occupant of a slot apart from one left over from a destroyed object.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef {
    slot: usize,
    generation: u32,
}

impl ObjectRef {
    pub(crate) fn new(slot: usize, generation: u32) -> Self {
        Self { slot, generation }
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.generation {
            0 => write!(f, "@{}", self.slot),
            generation => write!(f, "@{}.{generation}", self.slot),
        }
    }
}

/// Contents of a register, a frame entry, a mailbox entry or a property.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Value {
    Int(u16),
    Ref(ObjectRef),
}

impl Default for Value {
    fn default() -> Self {
        Value::Int(0)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Ref(r) => write!(f, "{r}"),
        }
    }
}

impl Value {
    pub fn type_str(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Ref(_) => "ref",
        }
    }

    pub fn as_int(&self) -> Result<u16, FaultKind> {
        match self {
            Value::Int(i) => Ok(*i),
            other => Err(FaultKind::TypeMismatch {
                expected: "int",
                actual: other.type_str(),
            }),
        }
    }

    pub fn as_object(&self) -> Result<ObjectRef, FaultKind> {
        match self {
            Value::Ref(r) => Ok(*r),
            other => Err(FaultKind::TypeMismatch {
                expected: "ref",
                actual: other.type_str(),
            }),
        }
    }
}

/// Cast kinds a type tag operand can name.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TypeTag {
    Int,
}

impl TryFrom<u16> for TypeTag {
    type Error = FaultKind;

    fn try_from(tag: u16) -> Result<Self, Self::Error> {
        match tag {
            TYPE_INT => Ok(TypeTag::Int),
            tag => Err(FaultKind::UnsupportedCast { tag }),
        }
    }
}

impl TypeTag {
    pub fn word(&self) -> u16 {
        match self {
            TypeTag::Int => TYPE_INT,
        }
    }

    /// Coerces `value` into this type. A reference has no integer view.
    pub fn cast(&self, value: Value) -> Result<Value, FaultKind> {
        match (self, value) {
            (TypeTag::Int, Value::Int(i)) => Ok(Value::Int(i)),
            (TypeTag::Int, Value::Ref(_)) => Err(FaultKind::UnsupportedCast { tag: self.word() }),
        }
    }

    /// Interprets an immediate literal word as a value of this type.
    pub fn from_literal(&self, word: u16) -> Value {
        match self {
            TypeTag::Int => Value::Int(word),
        }
    }
}

/// Casts `value` to the type named by the raw `tag` word.
pub fn cast(value: Value, tag: u16) -> Result<Value, FaultKind> {
    TypeTag::try_from(tag)?.cast(value)
}
