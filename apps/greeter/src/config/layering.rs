//! YAML layering helpers: tolerant file loading, deep merge and key lookup.

use std::path::Path;

use serde_yaml::{Mapping, Value};

use crate::errors::ConfigError;

/// Reads a YAML file as a mapping. A missing file or an empty document
/// yields an empty mapping.
pub fn load_yaml(path: &Path) -> Result<Mapping, ConfigError> {
    if !path.exists() {
        return Ok(Mapping::new());
    }

    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let value: Value = serde_yaml::from_str(&contents).map_err(|source| ConfigError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;

    match value {
        Value::Null => Ok(Mapping::new()),
        Value::Mapping(m) => Ok(m),
        _ => Err(ConfigError::InvalidValue {
            field: path.display().to_string(),
            reason: "top-level YAML document must be a mapping".to_string(),
        }),
    }
}

/// Returns `base` with `overlay` merged on top. Mappings present on both
/// sides merge recursively; any other overlay value replaces the base value
/// wholesale. Neither input is modified.
pub fn deep_merge(base: &Mapping, overlay: &Mapping) -> Mapping {
    let mut merged = base.clone();
    for (key, value) in overlay {
        let next = match (merged.get(key), value) {
            (Some(Value::Mapping(existing)), Value::Mapping(incoming)) => {
                Value::Mapping(deep_merge(existing, incoming))
            }
            _ => value.clone(),
        };
        merged.insert(key.clone(), next);
    }
    merged
}

/// Looks up a nested section by name, tolerating the listed aliases in
/// order. Missing or non-mapping sections read as empty.
pub fn section<'a>(root: &'a Mapping, names: &[&str]) -> Option<&'a Mapping> {
    names
        .iter()
        .find_map(|name| root.get(*name))
        .and_then(Value::as_mapping)
}

/// First value present under any of `keys`, in order.
pub fn first_present<'a>(map: &'a Mapping, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| map.get(*k))
}

/// Renders a scalar as a string. Numbers and booleans are stringified so a
/// YAML author can write `size: 1024x1024` or `name: 42` without quoting.
pub fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// First non-empty string under any of `keys`.
pub fn non_empty_string(map: &Mapping, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| map.get(*k))
        .filter_map(scalar_string)
        .find(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(s: &str) -> Mapping {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn test_load_yaml_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let m = load_yaml(&dir.path().join("nope.yaml")).unwrap();
        assert!(m.is_empty());
    }

    #[test]
    fn test_load_yaml_empty_document_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.yaml");
        std::fs::write(&path, "").unwrap();
        assert!(load_yaml(&path).unwrap().is_empty());
    }

    #[test]
    fn test_load_yaml_rejects_non_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.yaml");
        std::fs::write(&path, "- a\n- b\n").unwrap();
        assert!(matches!(
            load_yaml(&path),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_load_yaml_reports_syntax_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "grandma: [unclosed").unwrap();
        assert!(matches!(load_yaml(&path), Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn test_merge_nested_field_keeps_siblings() {
        let base = yaml("grandma:\n  name: Abuela\n  language: spanish\n");
        let overlay = yaml("grandma:\n  language: italian\n");
        let merged = deep_merge(&base, &overlay);
        let grandma = section(&merged, &["grandma"]).unwrap();
        assert_eq!(grandma.get("name").unwrap().as_str(), Some("Abuela"));
        assert_eq!(grandma.get("language").unwrap().as_str(), Some("italian"));
    }

    #[test]
    fn test_merge_scalar_override_replaces() {
        let base = yaml("prompts:\n  creation_template: old text\n");
        let overlay = yaml("prompts:\n  creation_template: new\n");
        let merged = deep_merge(&base, &overlay);
        let prompts = section(&merged, &["prompts"]).unwrap();
        assert_eq!(
            prompts.get("creation_template").unwrap().as_str(),
            Some("new")
        );
    }

    #[test]
    fn test_merge_mapping_replaced_by_scalar() {
        let base = yaml("grandma:\n  name: Abuela\n");
        let overlay = yaml("grandma: nobody\n");
        let merged = deep_merge(&base, &overlay);
        assert_eq!(merged.get("grandma").unwrap().as_str(), Some("nobody"));
    }

    #[test]
    fn test_merge_adds_override_only_keys() {
        let base = yaml("grandma:\n  name: Abuela\n");
        let overlay = yaml("grandma:\n  watermark_path: /tmp/w.png\nextra: 1\n");
        let merged = deep_merge(&base, &overlay);
        let grandma = section(&merged, &["grandma"]).unwrap();
        assert_eq!(grandma.get("name").unwrap().as_str(), Some("Abuela"));
        assert_eq!(
            grandma.get("watermark_path").unwrap().as_str(),
            Some("/tmp/w.png")
        );
        assert!(merged.contains_key("extra"));
    }

    #[test]
    fn test_merge_with_empty_overlay_is_identity() {
        let base = yaml("grandma:\n  name: Abuela\nprompts:\n  system: hi\n");
        assert_eq!(deep_merge(&base, &Mapping::new()), base);
    }

    #[test]
    fn test_merge_does_not_mutate_base() {
        let base = yaml("grandma:\n  name: Abuela\n  language: spanish\n");
        let snapshot = base.clone();
        let overlay = yaml("grandma:\n  name: Nonna\n  language: italian\n");
        let _ = deep_merge(&base, &overlay);
        assert_eq!(base, snapshot);
    }

    #[test]
    fn test_first_present_respects_order() {
        let m = yaml("system_prompt: alt\nsystem: primary\n");
        let v = first_present(&m, &["system", "system_prompt"]).unwrap();
        assert_eq!(v.as_str(), Some("primary"));
    }

    #[test]
    fn test_non_empty_string_skips_blank_values() {
        let m = yaml("OPENAI_API_KEY: \"\"\nllm_api_key: legacy\n");
        assert_eq!(
            non_empty_string(&m, &["OPENAI_API_KEY", "llm_api_key"]).as_deref(),
            Some("legacy")
        );
    }
}
