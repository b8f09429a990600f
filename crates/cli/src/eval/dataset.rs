use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One golden-dataset entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalCase {
    pub id: String,
    pub category: String,
    pub question: String,
    #[serde(default)]
    pub expected_refusal: bool,
    #[serde(default)]
    pub expected_keywords: Vec<String>,
    #[serde(default)]
    pub expected_answer: Option<String>,
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("could not read dataset `{path}`: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("could not parse dataset `{path}`: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },
    #[error("dataset `{0}` contains no cases")]
    Empty(PathBuf),
    #[error("dataset case id `{0}` appears more than once")]
    DuplicateId(String),
    #[error("answer case `{0}` has no expected_answer")]
    MissingExpectedAnswer(String),
}

pub fn load_dataset(path: &Path) -> Result<Vec<EvalCase>, DatasetError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| DatasetError::Read { path: path.to_path_buf(), source })?;
    let cases = serde_json::from_str::<Vec<EvalCase>>(&raw)
        .map_err(|source| DatasetError::Parse { path: path.to_path_buf(), source })?;

    if cases.is_empty() {
        return Err(DatasetError::Empty(path.to_path_buf()));
    }
    validate_cases(&cases)?;
    Ok(cases)
}

fn validate_cases(cases: &[EvalCase]) -> Result<(), DatasetError> {
    let mut seen = HashSet::new();
    for case in cases {
        if !seen.insert(case.id.as_str()) {
            return Err(DatasetError::DuplicateId(case.id.clone()));
        }
        let has_answer = case.expected_answer.as_deref().is_some_and(|a| !a.trim().is_empty());
        if !case.expected_refusal && !has_answer {
            return Err(DatasetError::MissingExpectedAnswer(case.id.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use super::{load_dataset, DatasetError};

    fn write(dir: &Path, body: &str) -> std::path::PathBuf {
        let path = dir.join("dataset.json");
        fs::write(&path, body).expect("write dataset");
        path
    }

    #[test]
    fn loads_cases_with_optional_fields_defaulted() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write(
            dir.path(),
            r#"[
                {"id": "r1", "category": "out_of_scope", "question": "Best matcha?", "expected_refusal": true},
                {"id": "a1", "category": "brewing", "question": "AeroPress grind?",
                 "expected_keywords": ["medium-fine"], "expected_answer": "Medium-fine grind."}
            ]"#,
        );

        let cases = load_dataset(&path).expect("dataset loads");

        assert_eq!(cases.len(), 2);
        assert!(cases[0].expected_refusal);
        assert!(cases[0].expected_keywords.is_empty());
        assert_eq!(cases[0].expected_answer, None);
        assert!(!cases[1].expected_refusal);
        assert_eq!(cases[1].expected_keywords, vec!["medium-fine".to_string()]);
    }

    #[test]
    fn rejects_empty_duplicate_and_unanswerable_datasets() {
        let dir = tempfile::tempdir().expect("tempdir");

        let empty = write(dir.path(), "[]");
        assert!(matches!(load_dataset(&empty), Err(DatasetError::Empty(_))));

        let duplicate = write(
            dir.path(),
            r#"[{"id": "x", "category": "c", "question": "q", "expected_refusal": true},
                {"id": "x", "category": "c", "question": "q", "expected_refusal": true}]"#,
        );
        assert!(matches!(load_dataset(&duplicate), Err(DatasetError::DuplicateId(ref id)) if id == "x"));

        let unanswerable =
            write(dir.path(), r#"[{"id": "a", "category": "c", "question": "q"}]"#);
        assert!(matches!(
            load_dataset(&unanswerable),
            Err(DatasetError::MissingExpectedAnswer(ref id)) if id == "a"
        ));
    }

    #[test]
    fn missing_file_and_bad_json_are_distinguished() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            load_dataset(&dir.path().join("absent.json")),
            Err(DatasetError::Read { .. })
        ));

        let garbage = write(dir.path(), "{ not json");
        assert!(matches!(load_dataset(&garbage), Err(DatasetError::Parse { .. })));
    }

    #[test]
    fn shipped_golden_dataset_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../eval/golden_dataset.json");
        let cases = load_dataset(&path).expect("golden dataset loads");

        assert_eq!(cases.len(), 20);
        assert!(cases.iter().any(|case| case.expected_refusal));
        assert!(cases.iter().any(|case| !case.expected_refusal));
    }
}
