//! Normalizing a saved workflow payload.

use std::io::Read;

use anyhow::{Context, Result};

use mergesense_core::response::{ConflictResult, ResponseNormalizer};
use mergesense_core::webhook::decode_saved_payload;

/// Read a payload from `source` (a path, or `-` for stdin) and print the
/// normalized result as pretty JSON.
pub fn run_normalize(source: &str, normalizer: &ResponseNormalizer) -> Result<()> {
    let raw = read_source(source)?;
    let result = normalize_text(&raw, normalizer);
    let json = serde_json::to_string_pretty(&result).context("failed to serialize result")?;
    println!("{}", json);
    Ok(())
}

/// Normalize raw payload text; text that is not JSON is a string payload.
pub fn normalize_text(raw: &str, normalizer: &ResponseNormalizer) -> ConflictResult {
    normalizer.normalize(&decode_saved_payload(raw))
}

fn read_source(source: &str) -> Result<String> {
    if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read payload from stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(source).with_context(|| format!("failed to read {}", source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mergesense_core::response::ResolutionStatus;

    #[test]
    fn test_normalize_text_json() {
        let result = normalize_text(
            r#"{"mergedCode": "ok", "confidence": 0.9}"#,
            &ResponseNormalizer::default(),
        );
        assert_eq!(result.status, ResolutionStatus::Success);
    }

    #[test]
    fn test_normalize_text_plain() {
        let result = normalize_text("let x = 1;", &ResponseNormalizer::default());
        assert_eq!(result.status, ResolutionStatus::Success);
        assert_eq!(result.merged_code, "let x = 1;");

        let result = normalize_text("", &ResponseNormalizer::default());
        assert_eq!(result.status, ResolutionStatus::AiFailed);
    }

    #[test]
    fn test_run_normalize_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payload.json");
        std::fs::write(&path, r#"[{"output": "merged"}]"#).unwrap();
        run_normalize(path.to_str().unwrap(), &ResponseNormalizer::default()).unwrap();
        assert!(run_normalize("/nonexistent/payload.json", &ResponseNormalizer::default()).is_err());
    }
}
