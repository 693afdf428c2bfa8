//! Flow document loading, saving, and validation.
//!
//! Documents are YAML on disk; JSON documents load through the same parser
//! since YAML is a superset. Saving picks the format from the file extension.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use flowdeck_types::Flow;

/// Loads a flow document from a YAML or JSON file.
pub fn load_flow(path: impl AsRef<Path>) -> Result<Flow> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).with_context(|| format!("failed to read flow document {}", path.display()))?;
    let flow: Flow = serde_yaml::from_str(&text).with_context(|| format!("failed to parse flow document {}", path.display()))?;
    Ok(flow)
}

/// Saves a flow document, as pretty JSON for a `.json` extension and YAML
/// otherwise.
pub fn save_flow(flow: &Flow, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let rendered = if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")) {
        let mut text = serde_json::to_string_pretty(flow).context("failed to serialize flow as JSON")?;
        text.push('\n');
        text
    } else {
        serde_yaml::to_string(flow).context("failed to serialize flow as YAML")?
    };
    fs::write(path, rendered).with_context(|| format!("failed to write flow document {}", path.display()))
}

/// Structural validation beyond deserialization: action ids must be unique,
/// since step results are recorded by id.
pub fn validate_flow(flow: &Flow) -> Result<()> {
    let mut seen = std::collections::HashSet::new();
    for action in &flow.actions {
        if action.action_type.trim().is_empty() {
            bail!("action '{}' has no type", action.display_name());
        }
        if !action.id.is_empty() && !seen.insert(action.id.as_str()) {
            bail!("duplicate action id: '{}'", action.id);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowdeck_types::ActionDef;
    use indexmap::IndexMap;

    fn sample_flow() -> Flow {
        Flow {
            name: "sample".into(),
            description: "round trip".into(),
            actions: vec![ActionDef {
                id: "s1".into(),
                action_type: "file.copy".into(),
                name: "Copy".into(),
                params: IndexMap::new(),
                enabled: true,
            }],
        }
    }

    #[test]
    fn yaml_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("flow.yaml");
        save_flow(&sample_flow(), &path).expect("save");
        let loaded = load_flow(&path).expect("load");
        assert_eq!(loaded.name, "sample");
        assert_eq!(loaded.actions[0].action_type, "file.copy");
    }

    #[test]
    fn json_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("flow.json");
        save_flow(&sample_flow(), &path).expect("save");
        let text = fs::read_to_string(&path).expect("read");
        assert!(text.trim_start().starts_with('{'));
        let loaded = load_flow(&path).expect("load");
        assert_eq!(loaded.name, "sample");
    }

    #[test]
    fn json_text_loads_through_the_yaml_parser() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("flow.yml");
        fs::write(&path, r#"{"name": "inline", "actions": []}"#).expect("write");
        let loaded = load_flow(&path).expect("load");
        assert_eq!(loaded.name, "inline");
    }

    #[test]
    fn duplicate_action_ids_are_rejected() {
        let mut flow = sample_flow();
        flow.actions.push(flow.actions[0].clone());
        let error = validate_flow(&flow).expect_err("duplicate id must fail");
        assert!(error.to_string().contains("duplicate action id"));
    }

    #[test]
    fn missing_file_reports_the_path() {
        let error = load_flow("/no/such/flow.yaml").expect_err("must fail");
        assert!(error.to_string().contains("/no/such/flow.yaml"));
    }
}
