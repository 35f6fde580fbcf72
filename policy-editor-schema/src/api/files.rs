//! File-backed translation.
//!
//! The destination is only written after the whole document has been translated in
//! memory, so a failing call never leaves partial output behind.

use std::fs;
use std::path::Path;

use log::info;

use super::{decode_with, encode_with, TranslateOptions};
use crate::error::{Result, TranslationError};

/// Translate the XML policy at `policy_file` into editor JSON written to `json_file`
pub fn policy_to_editor(
    policy_file: impl AsRef<Path>,
    json_file: impl AsRef<Path>,
    options: &TranslateOptions,
) -> Result<()> {
    let source = read_source(policy_file.as_ref(), "policy file")?;
    let output = decode_with(&source, options)?;
    write_destination(json_file.as_ref(), &output)?;
    info!(
        "Translated policy {} into editor schema {}",
        policy_file.as_ref().display(),
        json_file.as_ref().display()
    );
    Ok(())
}

/// Translate the editor JSON at `json_file` into an XML policy written to `policy_file`
pub fn editor_to_policy(
    json_file: impl AsRef<Path>,
    policy_file: impl AsRef<Path>,
    options: &TranslateOptions,
) -> Result<()> {
    let source = read_source(json_file.as_ref(), "json file")?;
    let output = encode_with(&source, options)?;
    write_destination(policy_file.as_ref(), &output)?;
    info!(
        "Translated editor schema {} into policy {}",
        json_file.as_ref().display(),
        policy_file.as_ref().display()
    );
    Ok(())
}

/// Read a whole source file. An empty path means the source was never supplied.
pub fn read_source(path: &Path, what: &'static str) -> Result<Vec<u8>> {
    if path.as_os_str().is_empty() {
        return Err(TranslationError::MissingInput(what));
    }
    fs::read(path).map_err(|e| TranslationError::sink("read", path, e))
}

/// Write translated bytes to a destination file. An empty path means it was never supplied.
pub fn write_destination(path: &Path, bytes: &[u8]) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(TranslationError::MissingInput("destination file"));
    }
    fs::write(path, bytes).map_err(|e| TranslationError::sink("write", path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Stage;
    use tempfile::TempDir;

    const POLICY_XML: &str = r#"<policy combine="first-applicable"><rule effect="Deny"/></policy>"#;

    #[test]
    fn test_policy_to_editor_writes_json() {
        let temp_dir = TempDir::new().unwrap();
        let policy_file = temp_dir.path().join("policy.xml");
        let json_file = temp_dir.path().join("editor.json");
        fs::write(&policy_file, POLICY_XML).unwrap();

        policy_to_editor(&policy_file, &json_file, &TranslateOptions::default()).unwrap();

        let json = fs::read_to_string(&json_file).unwrap();
        assert_eq!(
            json,
            r#"{"policy":{"combine":"first-applicable","subject":[],"rule":[{"effect":"Deny"}]}}"#
        );
    }

    #[test]
    fn test_editor_to_policy_writes_xml() {
        let temp_dir = TempDir::new().unwrap();
        let json_file = temp_dir.path().join("editor.json");
        let policy_file = temp_dir.path().join("policy.xml");
        fs::write(&json_file, r#"{"policy-set": {"combine": "deny-overrides"}}"#).unwrap();

        editor_to_policy(&json_file, &policy_file, &TranslateOptions::default()).unwrap();

        let xml = fs::read_to_string(&policy_file).unwrap();
        assert!(xml.starts_with("<policy-set"), "unexpected output: {}", xml);
        assert!(xml.contains(r#"combine="deny-overrides""#));
    }

    #[test]
    fn test_empty_source_path_is_missing_input() {
        let temp_dir = TempDir::new().unwrap();
        let error = editor_to_policy("", temp_dir.path().join("out.xml"), &TranslateOptions::default())
            .unwrap_err();
        assert!(matches!(error, TranslationError::MissingInput("json file")));
    }

    #[test]
    fn test_missing_source_file_is_sink_failure() {
        let temp_dir = TempDir::new().unwrap();
        let error = policy_to_editor(
            temp_dir.path().join("nonexistent.xml"),
            temp_dir.path().join("out.json"),
            &TranslateOptions::default(),
        )
        .unwrap_err();
        assert_eq!(error.stage(), Stage::Sink);
        assert!(error.to_string().contains("nonexistent.xml"));
    }

    #[test]
    fn test_failed_translation_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let json_file = temp_dir.path().join("editor.json");
        let policy_file = temp_dir.path().join("policy.xml");
        fs::write(&json_file, "{ not json").unwrap();

        let error = editor_to_policy(&json_file, &policy_file, &TranslateOptions::default())
            .unwrap_err();
        assert_eq!(error.stage(), Stage::Parse);
        assert!(!policy_file.exists());
    }

    #[test]
    fn test_unwritable_attribute_name_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let json_file = temp_dir.path().join("editor.json");
        let policy_file = temp_dir.path().join("policy.xml");
        fs::write(
            &json_file,
            r#"{"policy": {"subject": [{"a b": "x"}], "rule": [{"effect": "Permit"}]}}"#,
        )
        .unwrap();

        let error = editor_to_policy(&json_file, &policy_file, &TranslateOptions::default())
            .unwrap_err();
        assert_eq!(error.stage(), Stage::Serialize);
        assert!(!policy_file.exists());
    }

    #[test]
    fn test_unwritable_destination_is_sink_failure() {
        let temp_dir = TempDir::new().unwrap();
        let policy_file = temp_dir.path().join("policy.xml");
        fs::write(&policy_file, POLICY_XML).unwrap();

        let error = policy_to_editor(
            &policy_file,
            temp_dir.path().join("missing-dir").join("editor.json"),
            &TranslateOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(
            error,
            TranslationError::Sink {
                operation: "write",
                ..
            }
        ));
    }
}
