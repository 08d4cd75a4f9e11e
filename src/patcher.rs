//! Point fixes on already-generated Rust source.
//!
//! The source is parsed with `syn` only to find things: the struct, the field,
//! and the byte span of the field's declared type. The rewrite itself splices
//! the new type text over that span, so every other byte (comments, blank
//! lines, formatting) comes out exactly as it went in.

use proc_macro2::{LineColumn, TokenStream};
use quote::ToTokens;
use serde::Deserialize;

use crate::error::PatchError;

/// One requested change: `declaration.field: type`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldPatch {
    pub declaration: String,
    pub field: String,
    #[serde(rename = "type")]
    pub ty: String,
}

pub struct Patcher {
    source: String,
    file: syn::File,
}

impl Patcher {
    pub fn parse(source: impl Into<String>) -> Result<Self, PatchError> {
        let source = source.into();
        let file = syn::parse_str::<syn::File>(&source)
            .map_err(|e| PatchError::MalformedSource { reason: e.to_string() })?;
        Ok(Self { source, file })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Find the top-level `struct` called `name`.
    pub fn locate(&self, name: &str) -> Result<StructHandle<'_>, PatchError> {
        let mut other = None;
        for item in &self.file.items {
            match item {
                syn::Item::Struct(item) if item.ident == name => {
                    return Ok(StructHandle { patcher: self, item });
                }
                item if other.is_none() => {
                    if let Some(kind) = named_item_kind(item, name) {
                        other = Some(kind);
                    }
                }
                _ => {}
            }
        }
        Err(match other {
            Some(found) => PatchError::NotAnAggregateType { name: name.to_string(), found },
            None => PatchError::DeclarationNotFound { name: name.to_string() },
        })
    }
}

/// A located struct. Rewrites produce new text and leave the patcher as is.
pub struct StructHandle<'a> {
    patcher: &'a Patcher,
    item: &'a syn::ItemStruct,
}

impl StructHandle<'_> {
    pub fn name(&self) -> String {
        self.item.ident.to_string()
    }

    pub fn field_names(&self) -> Vec<String> {
        self.item
            .fields
            .iter()
            .filter_map(|field| field.ident.as_ref().map(ToString::to_string))
            .collect()
    }

    /// Replace the declared type of `field` with `new_type`.
    pub fn set_field_type(&self, field: &str, new_type: &str) -> Result<String, PatchError> {
        let new_type = new_type.trim();
        syn::parse_str::<syn::Type>(new_type).map_err(|e| PatchError::MalformedTypeExpression {
            text: new_type.to_string(),
            reason: e.to_string(),
        })?;

        let declaration = self.name();
        let mut target = None;
        for slot in &self.item.fields {
            let Some(ident) = &slot.ident else {
                return Err(PatchError::AmbiguousFieldName { declaration, field: field.to_string() });
            };
            if ident == field {
                target = Some(slot);
                break;
            }
        }
        let slot = target.ok_or_else(|| PatchError::FieldNotFound {
            declaration: declaration.clone(),
            field: field.to_string(),
        })?;

        let source = self.patcher.source();
        let (start, end) = token_range(source, slot.ty.to_token_stream()).ok_or_else(|| {
            PatchError::MalformedSource { reason: format!("no source span for {declaration}.{field}") }
        })?;

        let mut out = String::with_capacity(source.len() - (end - start) + new_type.len());
        out.push_str(&source[..start]);
        out.push_str(new_type);
        out.push_str(&source[end..]);
        tracing::debug!(%declaration, field, ty = new_type, "patched field type");
        Ok(out)
    }
}

/// Parse, locate, rewrite. Each call is independent.
///
/// Span locations of every source parsed on this thread are dropped on
/// return, so a [`Patcher`] still alive on the same thread must not be used
/// afterwards.
pub fn set_field_type(source: &str, declaration: &str, field: &str, new_type: &str) -> Result<String, PatchError> {
    let result = Patcher::parse(source).and_then(|patcher| {
        let handle = patcher.locate(declaration)?;
        handle.set_field_type(field, new_type)
    });
    // proc-macro2 keeps each parsed text in a per-thread map until told otherwise
    proc_macro2::extra::invalidate_current_thread_spans();
    result
}

/// Apply patches in order, each against the previous result. Nothing is
/// returned unless every patch applies.
pub fn apply_patches(source: &str, patches: &[FieldPatch]) -> Result<String, PatchError> {
    patches.iter().try_fold(source.to_string(), |current, patch| {
        set_field_type(&current, &patch.declaration, &patch.field, &patch.ty)
    })
}

fn named_item_kind(item: &syn::Item, name: &str) -> Option<&'static str> {
    let (ident, kind) = match item {
        syn::Item::Type(i) => (&i.ident, "type alias"),
        syn::Item::Enum(i) => (&i.ident, "enum"),
        syn::Item::Union(i) => (&i.ident, "union"),
        syn::Item::Fn(i) => (&i.sig.ident, "function"),
        syn::Item::Const(i) => (&i.ident, "constant"),
        syn::Item::Static(i) => (&i.ident, "static"),
        syn::Item::Trait(i) => (&i.ident, "trait"),
        syn::Item::Mod(i) => (&i.ident, "module"),
        _ => return None,
    };
    (ident == name).then_some(kind)
}

/// Byte range from the start of the first token to the end of the last one.
fn token_range(source: &str, tokens: TokenStream) -> Option<(usize, usize)> {
    let mut iter = tokens.into_iter();
    let first = iter.next()?;
    let last = iter.last().unwrap_or_else(|| first.clone());
    let start = byte_offset(source, first.span().start())?;
    let end = byte_offset(source, last.span().end())?;
    (start <= end).then_some((start, end))
}

/// `LineColumn` is 1-based lines and 0-based char columns.
fn byte_offset(source: &str, at: LineColumn) -> Option<usize> {
    let line_start = if at.line <= 1 {
        0
    } else {
        source.match_indices('\n').nth(at.line - 2).map(|(i, _)| i + 1)?
    };
    let line = &source[line_start..];
    let column = line
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(line.len()))
        .nth(at.column)?;
    Some(line_start + column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SRC: &str = r#"// header comment
use serde::Deserialize;

/// A user.
#[derive(Debug, Deserialize)]
pub struct User {
    pub x: i64, // trailing
    /// docs for y
    pub y: Vec<Option<String>>,
}

pub type Alias = i64;

pub struct Pair(i64, String);
"#;

    #[test]
    fn replaces_only_the_target_type() {
        let out = set_field_type(SRC, "User", "x", "String").unwrap();
        assert_eq!(out, SRC.replace("pub x: i64,", "pub x: String,"));
    }

    #[test]
    fn replaces_multi_token_types() {
        let out = set_field_type(SRC, "User", "y", " std::collections::BTreeMap<String, u8> ").unwrap();
        assert_eq!(
            out,
            SRC.replace("Vec<Option<String>>", "std::collections::BTreeMap<String, u8>")
        );
    }

    #[test]
    fn handles_non_ascii_before_the_field() {
        let src = "/// naïve café\npub struct Cafe { pub a: u8, /* crème brûlée */ pub b: u8 }\n";
        let out = set_field_type(src, "Cafe", "b", "u16").unwrap();
        assert_eq!(out, "/// naïve café\npub struct Cafe { pub a: u8, /* crème brûlée */ pub b: u16 }\n");
    }

    #[test]
    fn located_handle_lists_fields() {
        let patcher = Patcher::parse(SRC).unwrap();
        let handle = patcher.locate("User").unwrap();
        assert_eq!(handle.name(), "User");
        assert_eq!(handle.field_names(), ["x", "y"]);
    }

    #[test]
    fn errors() {
        assert_eq!(
            set_field_type(SRC, "Missing", "x", "u8").unwrap_err(),
            PatchError::DeclarationNotFound { name: "Missing".to_string() }
        );
        assert_eq!(
            set_field_type(SRC, "Alias", "x", "u8").unwrap_err(),
            PatchError::NotAnAggregateType { name: "Alias".to_string(), found: "type alias" }
        );
        assert_eq!(
            set_field_type(SRC, "Pair", "0", "u8").unwrap_err(),
            PatchError::AmbiguousFieldName { declaration: "Pair".to_string(), field: "0".to_string() }
        );
        assert_eq!(
            set_field_type(SRC, "User", "z", "u8").unwrap_err(),
            PatchError::FieldNotFound { declaration: "User".to_string(), field: "z".to_string() }
        );
        assert!(matches!(
            set_field_type(SRC, "User", "x", "Vec<").unwrap_err(),
            PatchError::MalformedTypeExpression { .. }
        ));
        assert!(matches!(
            set_field_type("struct {", "User", "x", "u8").unwrap_err(),
            PatchError::MalformedSource { .. }
        ));
    }

    #[test]
    fn failed_patch_leaves_source_intact() {
        let patcher = Patcher::parse(SRC).unwrap();
        let handle = patcher.locate("User").unwrap();
        assert!(handle.set_field_type("x", "Vec<").is_err());
        assert_eq!(patcher.source(), SRC);
        assert_eq!(handle.set_field_type("x", "u8").unwrap(), SRC.replace("x: i64", "x: u8"));
    }

    #[test]
    fn struct_wins_over_same_named_function() {
        let src = "fn Thing() {}\nstruct Thing { a: u8 }\n";
        let out = set_field_type(src, "Thing", "a", "u32").unwrap();
        assert_eq!(out, "fn Thing() {}\nstruct Thing { a: u32 }\n");
    }

    #[test]
    fn patches_chain_in_order() {
        let patches = vec![
            FieldPatch { declaration: "User".into(), field: "x".into(), ty: "u64".into() },
            FieldPatch { declaration: "User".into(), field: "y".into(), ty: "Vec<String>".into() },
        ];
        let out = apply_patches(SRC, &patches).unwrap();
        assert_eq!(
            out,
            SRC.replace("x: i64", "x: u64").replace("Vec<Option<String>>", "Vec<String>")
        );
    }

    #[test]
    fn long_patch_chains_on_one_thread() {
        let patches: Vec<FieldPatch> = (0..200)
            .map(|i| FieldPatch { declaration: "User".into(), field: "x".into(), ty: format!("[u8; {i}]") })
            .collect();
        let out = apply_patches(SRC, &patches).unwrap();
        assert_eq!(out, SRC.replace("x: i64", "x: [u8; 199]"));

        // spans of sources parsed after the chain still resolve
        let patcher = Patcher::parse(out).unwrap();
        let handle = patcher.locate("User").unwrap();
        assert_eq!(handle.set_field_type("x", "u8").unwrap(), SRC.replace("x: i64", "x: u8"));
    }

    #[test]
    fn same_input_gives_same_output() {
        let a = set_field_type(SRC, "User", "x", "u8").unwrap();
        let b = set_field_type(SRC, "User", "x", "u8").unwrap();
        assert_eq!(a, b);
    }
}
