//! # Type Descriptors
//!
//! Explicit structural descriptions of model types.
//!
//! ## Descriptor Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Descriptor Graph                                │
//! │                                                                         │
//! │  Author (Record)                                                        │
//! │  ├── id        : Pointer ──► Scalar(Int)          Option<i64>           │
//! │  ├── username  : Scalar(String)                                         │
//! │  └── posts     : Slice ──► Record(Post)           Vec<Post>             │
//! │                               │                                         │
//! │                               ▼  (RecordRef, resolved lazily)           │
//! │                 Post (Record)                                           │
//! │                 ├── title  : Scalar(String)                             │
//! │                 └── images : Slice ──► Record(Img)                      │
//! │                                                                         │
//! │  Records link to each other through `RecordRef` (a function pointer     │
//! │  returning a `&'static RecordDesc`), so self-referential and cyclic     │
//! │  model graphs can be described without infinite construction.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Building Descriptors
//! Scalars and containers implement [`Describe`] out of the box. Model structs
//! get an implementation from [`describe_record!`](crate::describe_record),
//! or by hand with [`RecordDesc::new`] and [`FieldDesc`].

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::tag::StructTag;

// =============================================================================
// Type Descriptor
// =============================================================================

/// Primitive, non-record value kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    Bool,
    Int,
    Uint,
    Float,
    Char,
    String,
    Unit,
    Timestamp,
    Uuid,
}

/// Structural description of a type.
///
/// Only [`TypeDesc::Slice`] and [`TypeDesc::Array`] count as collections for
/// preload discovery. Pointers are followed when normalizing to a record but
/// never make a field a collection on their own.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeDesc {
    Scalar(ScalarKind),
    /// Indirection: `Box`, `Option`, `Rc`, `Arc`, references.
    Pointer(Box<TypeDesc>),
    /// Growable sequence: `Vec`, `VecDeque`, `[T]`.
    Slice(Box<TypeDesc>),
    /// Fixed-length sequence: `[T; N]`.
    Array(Box<TypeDesc>, usize),
    Map(Box<TypeDesc>, Box<TypeDesc>),
    Record(RecordRef),
}

impl TypeDesc {
    /// Returns the descriptor of `T`.
    pub fn of<T: Describe + ?Sized>() -> Self {
        T::type_desc()
    }

    /// Returns true for slice and array kinds.
    #[inline]
    pub fn is_collection(&self) -> bool {
        matches!(self, TypeDesc::Slice(_) | TypeDesc::Array(..))
    }

    /// Returns the element type of a pointer, slice or array.
    pub fn elem(&self) -> Option<&TypeDesc> {
        match self {
            TypeDesc::Pointer(inner) | TypeDesc::Slice(inner) | TypeDesc::Array(inner, _) => {
                Some(inner)
            }
            _ => None,
        }
    }

    /// Returns the record behind this descriptor if it is one directly.
    pub fn as_record(&self) -> Option<&'static RecordDesc> {
        match self {
            TypeDesc::Record(record) => Some(record.get()),
            _ => None,
        }
    }

    /// Short name of the descriptor kind, used in logs.
    pub fn kind_name(&self) -> &'static str {
        match self {
            TypeDesc::Scalar(_) => "scalar",
            TypeDesc::Pointer(_) => "pointer",
            TypeDesc::Slice(_) => "slice",
            TypeDesc::Array(..) => "array",
            TypeDesc::Map(..) => "map",
            TypeDesc::Record(_) => "record",
        }
    }
}

// =============================================================================
// Record Reference
// =============================================================================

/// Lazy link to a record descriptor.
///
/// Holding a function instead of the descriptor itself is what allows a
/// record to mention itself (directly or through other records) in its own
/// field list.
#[derive(Clone, Copy)]
pub struct RecordRef(fn() -> &'static RecordDesc);

impl RecordRef {
    pub const fn new(resolve: fn() -> &'static RecordDesc) -> Self {
        RecordRef(resolve)
    }

    /// Resolves the referenced descriptor.
    #[inline]
    pub fn get(&self) -> &'static RecordDesc {
        (self.0)()
    }
}

impl PartialEq for RecordRef {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.get(), other.get())
    }
}

impl fmt::Debug for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordRef({})", self.get().name())
    }
}

/// Serializes as the record name only; a full dump would not terminate on
/// cyclic graphs.
impl Serialize for RecordRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.get().name())
    }
}

// =============================================================================
// Record and Field Descriptors
// =============================================================================

/// Field visibility as seen from outside the declaring module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// `pub`; the only exported visibility.
    Public,
    /// `pub(crate)`, `pub(super)`, `pub(in ..)`.
    Restricted,
    Private,
}

impl Visibility {
    /// Maps the token text of a visibility qualifier (as produced by
    /// `stringify!` on a `vis` fragment) to a [`Visibility`].
    pub fn from_token(token: &str) -> Self {
        match token.trim() {
            "pub" => Visibility::Public,
            "" => Visibility::Private,
            _ => Visibility::Restricted,
        }
    }

    #[inline]
    pub fn is_exported(&self) -> bool {
        matches!(self, Visibility::Public)
    }
}

/// A declared field of a record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDesc {
    name: String,
    visibility: Visibility,
    ty: TypeDesc,
    tag: StructTag,
}

impl FieldDesc {
    pub fn new(name: impl Into<String>, visibility: Visibility, ty: TypeDesc) -> Self {
        FieldDesc {
            name: name.into(),
            visibility,
            ty,
            tag: StructTag::default(),
        }
    }

    /// Creates an exported field.
    pub fn public(name: impl Into<String>, ty: TypeDesc) -> Self {
        FieldDesc::new(name, Visibility::Public, ty)
    }

    /// Creates a module-private field.
    pub fn private(name: impl Into<String>, ty: TypeDesc) -> Self {
        FieldDesc::new(name, Visibility::Private, ty)
    }

    /// Attaches a raw tag string, e.g. `ezg:"no-preload"`.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = StructTag::new(tag);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn ty(&self) -> &TypeDesc {
        &self.ty
    }

    pub fn tag(&self) -> &StructTag {
        &self.tag
    }
}

/// A record (struct) type: a name and its fields in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordDesc {
    name: String,
    fields: Vec<FieldDesc>,
}

impl RecordDesc {
    pub fn new(name: impl Into<String>) -> Self {
        RecordDesc {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Appends a field, keeping declaration order.
    pub fn with_field(mut self, field: FieldDesc) -> Self {
        self.fields.push(field);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDesc] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDesc> {
        self.fields.iter().find(|f| f.name == name)
    }
}

// =============================================================================
// Describe
// =============================================================================

/// Types that can produce their own [`TypeDesc`].
pub trait Describe {
    fn type_desc() -> TypeDesc;
}

macro_rules! describe_scalar {
    ($kind:ident => $($ty:ty),+ $(,)?) => {
        $(
            impl Describe for $ty {
                #[inline]
                fn type_desc() -> TypeDesc {
                    TypeDesc::Scalar(ScalarKind::$kind)
                }
            }
        )+
    };
}

describe_scalar!(Bool => bool);
describe_scalar!(Int => i8, i16, i32, i64, i128, isize);
describe_scalar!(Uint => u8, u16, u32, u64, u128, usize);
describe_scalar!(Float => f32, f64);
describe_scalar!(Char => char);
describe_scalar!(String => String, str);
describe_scalar!(Unit => ());
describe_scalar!(Timestamp => DateTime<Utc>);
describe_scalar!(Uuid => Uuid);

macro_rules! describe_pointer {
    ($($ty:ident),+) => {
        $(
            impl<T: Describe + ?Sized> Describe for $ty<T> {
                fn type_desc() -> TypeDesc {
                    TypeDesc::Pointer(Box::new(T::type_desc()))
                }
            }
        )+
    };
}

describe_pointer!(Box, Rc, Arc);

impl<T: Describe> Describe for Option<T> {
    fn type_desc() -> TypeDesc {
        TypeDesc::Pointer(Box::new(T::type_desc()))
    }
}

impl<T: Describe + ?Sized> Describe for &T {
    fn type_desc() -> TypeDesc {
        TypeDesc::Pointer(Box::new(T::type_desc()))
    }
}

impl<T: Describe> Describe for Vec<T> {
    fn type_desc() -> TypeDesc {
        TypeDesc::Slice(Box::new(T::type_desc()))
    }
}

impl<T: Describe> Describe for VecDeque<T> {
    fn type_desc() -> TypeDesc {
        TypeDesc::Slice(Box::new(T::type_desc()))
    }
}

impl<T: Describe> Describe for [T] {
    fn type_desc() -> TypeDesc {
        TypeDesc::Slice(Box::new(T::type_desc()))
    }
}

impl<T: Describe, const N: usize> Describe for [T; N] {
    fn type_desc() -> TypeDesc {
        TypeDesc::Array(Box::new(T::type_desc()), N)
    }
}

impl<K: Describe, V: Describe, S> Describe for HashMap<K, V, S> {
    fn type_desc() -> TypeDesc {
        TypeDesc::Map(Box::new(K::type_desc()), Box::new(V::type_desc()))
    }
}

impl<K: Describe, V: Describe> Describe for BTreeMap<K, V> {
    fn type_desc() -> TypeDesc {
        TypeDesc::Map(Box::new(K::type_desc()), Box::new(V::type_desc()))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
