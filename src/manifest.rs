//! Patch manifests: a JSON array of `{"declaration", "field", "type"}` records.
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::de::DeserializeOwned;

use crate::patcher::FieldPatch;

pub fn load_patches(path: &Path) -> Result<Vec<FieldPatch>> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read patch manifest {}", path.display()))?;
    from_slice_with_path(&bytes).with_context(|| format!("invalid patch manifest {}", path.display()))
}

/// Deserialize with JSON-path context in error messages.
pub fn from_slice_with_path<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let de = &mut serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize::<_, T>(de).map_err(|err| {
        let path = err.path().to_string();
        anyhow!("at JSON path {path} → {}", err.into_inner())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_patch_records() {
        let patches: Vec<FieldPatch> = from_slice_with_path(
            br#"[{"declaration": "UsersUser", "field": "id", "type": "u64"}]"#,
        )
        .unwrap();
        assert_eq!(
            patches,
            vec![FieldPatch { declaration: "UsersUser".into(), field: "id".into(), ty: "u64".into() }]
        );
    }

    #[test]
    fn errors_name_the_offending_path() {
        let err = from_slice_with_path::<Vec<FieldPatch>>(
            br#"[{"declaration": "A", "field": "x", "type": "u8"}, {"declaration": "B", "field": 3, "type": "u8"}]"#,
        )
        .unwrap_err();
        assert!(err.to_string().starts_with("at JSON path [1].field"), "{err}");
    }
}
