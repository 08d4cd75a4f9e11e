use std::path::{Path, PathBuf};

use apigen::codegen::Naming;
use apigen::manifest::load_patches;
use apigen::patcher::FieldPatch;
use apigen::pipeline::{self, GenerateOptions, SchemaDocuments};
use apigen::{PatchError, SchemaError};
use pretty_assertions::assert_eq;

fn fixture_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/schema")
}

fn generate(options: &GenerateOptions) -> anyhow::Result<String> {
    let docs = SchemaDocuments::from_dir(&fixture_dir())?;
    pipeline::generate(&docs, options)
}

fn patch(declaration: &str, field: &str, ty: &str) -> FieldPatch {
    FieldPatch { declaration: declaration.into(), field: field.into(), ty: ty.into() }
}

#[test]
fn generates_every_document() {
    let src = generate(&GenerateOptions::default()).unwrap();

    assert!(src.starts_with("// Code generated by apigen. DO NOT EDIT.\n"), "{src}");
    assert!(src.contains("pub type BaseBoolInt = i64;\npub const BASE_BOOL_INT_NO: BaseBoolInt = 0;\n"), "{src}");
    assert!(src.contains("pub const BASE_SEX_MALE: BaseSex = 2;\n"), "{src}");
    assert!(src.contains("pub struct UsersUserMin {\n    /// User ID\n    pub id: i64,\n"), "{src}");
    assert!(src.contains("pub deactivated: Option<UsersUserMinDeactivated>,"), "{src}");
    assert!(src.contains("pub struct UsersUser {\n    #[serde(flatten)]\n    pub users_user_min: UsersUserMin,\n"), "{src}");
    assert!(src.contains("pub parent: Option<Box<GroupsGroup>>,"), "{src}");
    assert!(src.contains("pub members: Option<Vec<UsersUser>>,"), "{src}");
    assert!(src.contains("pub admin: Option<UsersUserMin>,"), "{src}");
    assert!(src.contains("pub owner: Option<Box<WallOwner>>,"), "{src}");
    assert!(src.contains("pub pinned: Option<Box<WallPost>>,"), "{src}");
    assert!(src.contains("pub enum MessagesPayload {\n    UsersUserMin(UsersUserMin),\n    String(String),\n}"), "{src}");
    assert!(src.contains("/// Free-form payload\npub type BasePlaceholder = serde_json::Value;\n"), "{src}");
    assert!(src.contains("pub type UsersGetResponse = Vec<UsersUser>;\n"), "{src}");
    assert!(src.contains("pub struct GroupsGetByIdResponse {\n    pub count: i64,\n    pub groups: Vec<GroupsGroup>,\n}"), "{src}");
    assert!(src.contains("/// Access: user, service\n"), "{src}");
    assert!(src.contains("pub struct GroupsGetByIdParams {\n    pub group_id: i64,\n}"), "{src}");
    assert!(src.contains("pub const METHOD: &'static str = \"groups.getById\";"), "{src}");

    syn::parse_file(&src).unwrap();
}

#[test]
fn generation_is_deterministic() {
    let options = GenerateOptions::default();
    assert_eq!(generate(&options).unwrap(), generate(&options).unwrap());
}

#[test]
fn no_rename_keeps_schema_names() {
    let options = GenerateOptions { naming: Naming { rename: false }, ..Default::default() };
    let src = generate(&options).unwrap();
    assert!(src.contains("#![allow(non_camel_case_types, non_snake_case)]\n"), "{src}");
    assert!(src.contains("pub struct users_user_min {"), "{src}");
    assert!(src.contains("pub struct groups_getByIdParams {"), "{src}");
}

#[test]
fn patch_changes_only_the_requested_field() {
    let plain = generate(&GenerateOptions::default()).unwrap();
    let patched = generate(&GenerateOptions {
        patches: vec![patch("GroupsGroup", "id", "u64")],
        ..Default::default()
    })
    .unwrap();

    let start = plain.find("pub struct GroupsGroup {").unwrap();
    let at = start + plain[start..].find("pub id: i64,").unwrap() + "pub id: ".len();
    let mut expected = plain.clone();
    expected.replace_range(at..at + "i64".len(), "u64");
    assert_eq!(patched, expected);

    // the same field name elsewhere is untouched
    assert!(patched.contains("pub struct UsersUserMin {\n    /// User ID\n    pub id: i64,\n"));
}

#[test]
fn patches_from_a_manifest_file() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("patches.json");
    std::fs::write(
        &manifest,
        r#"[
            {"declaration": "UsersUserMin", "field": "id", "type": "u32"},
            {"declaration": "UsersUserMin", "field": "id", "type": "Option<u32>"}
        ]"#,
    )
    .unwrap();
    let patches = load_patches(&manifest).unwrap();
    assert_eq!(patches.len(), 2);

    let src = generate(&GenerateOptions { patches, ..Default::default() }).unwrap();
    assert!(src.contains("/// User ID\n    pub id: Option<u32>,\n"), "{src}");
}

#[test]
fn failed_patch_produces_no_output() {
    let err = generate(&GenerateOptions {
        patches: vec![patch("GroupsGroup", "id", "u64"), patch("GroupsGroup", "nope", "u8")],
        ..Default::default()
    })
    .unwrap_err();
    assert_eq!(
        err.downcast_ref::<PatchError>(),
        Some(&PatchError::FieldNotFound { declaration: "GroupsGroup".into(), field: "nope".into() })
    );

    let err = generate(&GenerateOptions {
        patches: vec![patch("BaseBoolInt", "x", "u8")],
        ..Default::default()
    })
    .unwrap_err();
    assert!(matches!(err.downcast_ref::<PatchError>(), Some(PatchError::NotAnAggregateType { .. })), "{err:#}");
}

#[test]
fn unsupported_reference_document_aborts() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["methods.json", "responses.json"] {
        std::fs::copy(fixture_dir().join(name), dir.path().join(name)).unwrap();
    }
    std::fs::write(
        dir.path().join("objects.json"),
        r#"{"title": "objects", "definitions": {"photo_holder": {"type": "object", "properties": {
            "photo": {"$ref": "photos.json#/definitions/photos_photo"}
        }}}}"#,
    )
    .unwrap();

    let docs = SchemaDocuments::from_dir(dir.path()).unwrap();
    let err = pipeline::generate(&docs, &GenerateOptions::default()).unwrap_err();
    assert_eq!(
        err.downcast_ref::<SchemaError>(),
        Some(&SchemaError::UnsupportedReferenceDocument {
            pointer: "photos.json#/definitions/photos_photo".into(),
            document: "photos.json".into(),
        })
    );
}

#[test]
fn missing_document_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::copy(fixture_dir().join("objects.json"), dir.path().join("objects.json")).unwrap();
    let err = SchemaDocuments::from_dir(dir.path()).unwrap_err();
    assert!(err.to_string().contains("methods.json"), "{err:#}");
}
