//! Structural equality over [`TypeExpr`].
//!
//! Used to tell when two independently parsed shapes (say, two methods'
//! inline response objects) would generate the same declaration.
//!
//! Properties are compared by position, not by name: property order is part
//! of the generated output, so `{a, b}` and `{b, a}` are different types.

use std::collections::HashSet;
use std::mem;

use crate::error::SchemaError;
use crate::ir::{Definition, Shape, TypeExpr};
use crate::schema::Reference;

/// Dereference failures are errors, never "not equal".
pub fn equal_type(a: &TypeExpr, b: &TypeExpr) -> Result<bool, SchemaError> {
    Comparator::default().equal_type(a, b)
}

/// Same name and structurally equal body.
pub fn equal_definition(a: &Definition, b: &Definition) -> Result<bool, SchemaError> {
    Comparator::default().equal_definition(a, b)
}

#[derive(Debug, Default)]
struct Comparator {
    /// pointer pairs assumed equal so far. Any mismatch aborts the whole
    /// comparison, so meeting a pair again (a cycle) can answer `true`.
    visiting: HashSet<(String, String)>,
}

impl Comparator {
    fn equal_definition(&mut self, a: &Definition, b: &Definition) -> Result<bool, SchemaError> {
        if a.name != b.name {
            return Ok(false);
        }
        self.equal_type(&a.expr, &b.expr)
    }

    fn equal_type(&mut self, a: &TypeExpr, b: &TypeExpr) -> Result<bool, SchemaError> {
        if a.type_name != b.type_name {
            return Ok(false);
        }
        if mem::discriminant(&a.shape) != mem::discriminant(&b.shape) {
            return Ok(false);
        }

        if a.properties.len() != b.properties.len() {
            return Ok(false);
        }
        for (pa, pb) in a.properties.iter().zip(&b.properties) {
            if !self.equal_definition(pa, pb)? {
                return Ok(false);
            }
        }

        match (&a.shape, &b.shape) {
            (Shape::Base(x), Shape::Base(y)) => Ok(x == y),
            (Shape::Ref(x), Shape::Ref(y)) => self.equal_reference(x, y),
            (Shape::AllOf(xs), Shape::AllOf(ys)) | (Shape::OneOf(xs), Shape::OneOf(ys)) => {
                self.equal_list(xs, ys)
            }
            (Shape::Enum(x), Shape::Enum(y)) => Ok(x.values == y.values && x.names == y.names),
            (Shape::Array(x), Shape::Array(y)) => self.equal_type(x, y),
            // Untyped / Plain: nothing beyond type name and properties
            _ => Ok(true),
        }
    }

    fn equal_list(&mut self, xs: &[TypeExpr], ys: &[TypeExpr]) -> Result<bool, SchemaError> {
        if xs.len() != ys.len() {
            return Ok(false);
        }
        for (x, y) in xs.iter().zip(ys) {
            if !self.equal_type(x, y)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn equal_reference(&mut self, a: &Reference, b: &Reference) -> Result<bool, SchemaError> {
        let key = (a.pointer().to_string(), b.pointer().to_string());
        if !self.visiting.insert(key) {
            return Ok(true);
        }
        let ra = a.resolve()?;
        let rb = b.resolve()?;
        self.equal_definition(&ra, &rb)
    }
}
