pub mod ai_helper;
pub mod catalog;
pub mod personality;
pub mod rank;
pub mod roadmap;
pub mod scramble;
pub mod session;
pub mod skills;
pub mod view;

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Subject {
    Math,
    Science,
    Tech,
}

impl Subject {
    pub const ALL: [Subject; 3] = [Subject::Math, Subject::Science, Subject::Tech];

    pub fn name(&self) -> &'static str {
        match self {
            Subject::Math => "Math",
            Subject::Science => "Science",
            Subject::Tech => "Tech",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    /// Must equal one of `options` exactly.
    pub answer: String,
    pub xp: u32,
}

impl QuizQuestion {
    pub fn new(question: String, options: Vec<String>, answer: String, xp: u32) -> Self {
        Self {
            question,
            options,
            answer,
            xp,
        }
    }

    /// Checks the shape of a question, returning a description of the first problem.
    pub fn validate(&self) -> Result<(), String> {
        if self.question.trim().is_empty() {
            return Err("question text is empty".to_string());
        }
        if self.options.len() < 2 {
            return Err(format!(
                "question {:?} needs at least two options",
                self.question
            ));
        }
        for (idx, option) in self.options.iter().enumerate() {
            if option.trim().is_empty() {
                return Err(format!("question {:?} has an empty option", self.question));
            }
            if self.options[..idx].contains(option) {
                return Err(format!(
                    "question {:?} lists option {:?} twice",
                    self.question, option
                ));
            }
        }
        if !self.options.contains(&self.answer) {
            return Err(format!(
                "answer {:?} is not one of the options of {:?}",
                self.answer, self.question
            ));
        }
        Ok(())
    }

    pub fn is_correct(&self, choice: &str) -> bool {
        choice == self.answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question() -> QuizQuestion {
        QuizQuestion::new(
            "2 + 2 = ?".into(),
            vec!["3".into(), "4".into(), "5".into()],
            "4".into(),
            10,
        )
    }

    #[test]
    fn test_exact_match_only() {
        let q = question();
        assert!(q.is_correct("4"));
        assert!(!q.is_correct(" 4"));
        assert!(!q.is_correct("4 "));
    }

    #[test]
    fn test_answer_must_be_an_option() {
        let mut q = question();
        assert!(q.validate().is_ok());
        q.answer = "four".into();
        assert!(q.validate().is_err());
    }

    #[test]
    fn test_needs_two_options() {
        let mut q = question();
        q.options = vec!["4".into()];
        assert!(q.validate().is_err());
    }

    #[test]
    fn test_empty_or_duplicate_options_rejected() {
        let mut q = question();
        q.options = vec!["".into(), "4".into()];
        assert!(q.validate().is_err());
        q.options = vec!["4".into(), "5".into(), "4".into()];
        assert!(q.validate().is_err());
    }

    #[test]
    fn test_subject_names() {
        assert_eq!(Subject::Math.to_string(), "Math");
        assert_eq!(Subject::ALL.len(), 3);
    }
}
