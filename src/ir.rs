// Strongly-typed IR for codegen. No serde_json::Value past the parser.

use std::fmt;

use ordered_float::OrderedFloat;

use crate::schema::resolver::Reference;

/// Scalar kinds a `type` keyword can name for a leaf node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Integer,
    Number,
    String,
    Boolean,
}

impl ScalarKind {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "string" => Some(Self::String),
            "boolean" => Some(Self::Boolean),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Number => "number",
            Self::String => "string",
            Self::Boolean => "boolean",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One enum literal, typed by the declared scalar kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EnumValue {
    Integer(i64),
    Number(OrderedFloat<f64>),
    String(String),
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{i}"),
            Self::Number(n) => write!(f, "{:?}", n.0),
            Self::String(s) => f.write_str(s),
        }
    }
}

/// Closed set of literals. `names` is either empty or parallel to `values`.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumShape {
    pub kind: ScalarKind,
    pub values: Vec<EnumValue>,
    pub names: Vec<String>,
}

/// The single active variant of a [`TypeExpr`].
#[derive(Debug, Clone, Default)]
pub enum Shape {
    /// no `type` keyword and nothing else matched (intentional placeholder)
    #[default]
    Untyped,
    /// `object` without `oneOf`, or a type keyword we don't recognise;
    /// `TypeExpr::type_name` keeps the raw keyword
    Plain,
    Base(ScalarKind),
    Ref(Reference),
    AllOf(Vec<TypeExpr>),
    OneOf(Vec<TypeExpr>),
    Enum(EnumShape),
    Array(Box<TypeExpr>),
}

/// One schema node after parsing.
#[derive(Debug, Clone, Default)]
pub struct TypeExpr {
    /// raw `type` keyword, if the node had one
    pub type_name: Option<String>,
    pub description: Option<String>,
    /// source-document order, kept verbatim for deterministic output
    pub properties: Vec<Definition>,
    /// names listed in the node's `required` array
    pub required: Vec<String>,
    pub shape: Shape,
}

impl TypeExpr {
    pub fn is_untyped(&self) -> bool {
        matches!(self.shape, Shape::Untyped)
    }

    /// Object with properties and no other variant tag.
    pub fn is_object(&self) -> bool {
        matches!(self.shape, Shape::Plain | Shape::Untyped) && !self.properties.is_empty()
    }

    pub fn is_required(&self, property: &str) -> bool {
        self.required.iter().any(|name| name == property)
    }

    pub fn as_reference(&self) -> Option<&Reference> {
        match &self.shape {
            Shape::Ref(r) => Some(r),
            _ => None,
        }
    }
}

/// Named binding of an identifier to a type. Also used for object properties.
#[derive(Debug, Clone, Default)]
pub struct Definition {
    pub name: String,
    pub expr: TypeExpr,
}

impl Definition {
    pub fn new(name: impl Into<String>, expr: TypeExpr) -> Self {
        Self { name: name.into(), expr }
    }

    /// Name-only placeholder with an untyped body.
    pub fn stub(name: impl Into<String>) -> Self {
        Self { name: name.into(), expr: TypeExpr::default() }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResponseExpr {
    pub expr: TypeExpr,
    pub required: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ResponseDefinition {
    pub name: String,
    pub expr: ResponseExpr,
}

#[derive(Debug, Clone)]
pub struct MethodParam {
    pub name: String,
    pub required: bool,
    pub expr: TypeExpr,
}

#[derive(Debug, Clone, Default)]
pub struct MethodDefinition {
    pub name: String,
    pub description: Option<String>,
    pub access_token_type: Vec<String>,
    pub parameters: Vec<MethodParam>,
    pub responses: Vec<Definition>,
}

/// Everything one parse pass over the three documents produced.
#[derive(Debug, Clone, Default)]
pub struct Forest {
    pub objects: Vec<Definition>,
    pub methods: Vec<MethodDefinition>,
    pub responses: Vec<ResponseDefinition>,
}
