use std::collections::HashMap;
use std::path::Path;

use crate::error::{AppError, Result};
use crate::quiz::{QuizQuestion, Subject};

/// Static questions, one ordered list per subject.
#[derive(Debug, Clone, Default)]
pub struct QuizCatalog {
    subjects: HashMap<Subject, Vec<QuizQuestion>>,
}

impl QuizCatalog {
    pub fn new(subjects: HashMap<Subject, Vec<QuizQuestion>>) -> Result<Self> {
        for (subject, questions) in &subjects {
            for (idx, question) in questions.iter().enumerate() {
                question.validate().map_err(|e| {
                    AppError::Config(format!("{} question #{}: {}", subject, idx + 1, e))
                })?;
            }
        }
        Ok(Self { subjects })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("failed to read catalog {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Self::new(serde_json::from_str(content)?)
    }

    pub fn questions(&self, subject: Subject) -> &[QuizQuestion] {
        self.subjects
            .get(&subject)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn get(&self, subject: Subject, idx: usize) -> Option<&QuizQuestion> {
        self.questions(subject).get(idx)
    }

    pub fn len(&self, subject: Subject) -> usize {
        self.questions(subject).len()
    }
}
