//! STEM personality quiz: every option points at a skill, and the picked
//! skills become the interests fed into the career stage of the roadmap.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// `options[i]` detects `skills[i]`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PersonalityQuestion {
    pub id: u32,
    pub question: String,
    pub options: Vec<String>,
    pub skills: Vec<String>,
}

impl PersonalityQuestion {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.question.trim().is_empty() {
            return Err("empty question text".into());
        }
        if self.options.len() < 2 {
            return Err("needs at least two options".into());
        }
        if self.options.len() != self.skills.len() {
            return Err(format!(
                "{} options but {} skills",
                self.options.len(),
                self.skills.len()
            ));
        }
        if self.skills.iter().any(|skill| skill.trim().is_empty()) {
            return Err("empty skill name".into());
        }
        Ok(())
    }

    /// The skill behind an exact option text.
    pub fn skill_for(&self, choice: &str) -> Option<&str> {
        self.options
            .iter()
            .position(|option| option == choice)
            .map(|idx| self.skills[idx].as_str())
    }
}

#[derive(Deserialize)]
struct PersonalityFile {
    questions: Vec<PersonalityQuestion>,
}

#[derive(Debug, Clone, Default)]
pub struct PersonalityQuiz {
    questions: Vec<PersonalityQuestion>,
}

impl PersonalityQuiz {
    pub fn new(questions: Vec<PersonalityQuestion>) -> Result<Self> {
        if questions.is_empty() {
            return Err(AppError::Config("personality quiz has no questions".into()));
        }
        for question in &questions {
            question.validate().map_err(|e| {
                AppError::Config(format!("personality question {}: {}", question.id, e))
            })?;
        }
        Ok(Self { questions })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!(
                "failed to read personality quiz {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let file: PersonalityFile = serde_json::from_str(content)?;
        Self::new(file.questions)
    }

    pub fn get(&self, idx: usize) -> Option<&PersonalityQuestion> {
        self.questions.get(idx)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PersonalityStep {
    Next,
    /// Detected skills, duplicates removed, in the order they were first picked.
    Finished(Vec<String>),
}

/// A walk through the personality quiz, one question per message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalityRun {
    index: usize,
    picked: Vec<String>,
}

impl PersonalityRun {
    pub fn current<'a>(&self, quiz: &'a PersonalityQuiz) -> Option<&'a PersonalityQuestion> {
        quiz.get(self.index)
    }

    /// 1-based, for display.
    pub fn number(&self) -> usize {
        self.index + 1
    }

    pub fn answer(&mut self, choice: &str, quiz: &PersonalityQuiz) -> Result<PersonalityStep> {
        let question = self
            .current(quiz)
            .ok_or_else(|| AppError::InputValidation("the personality quiz is over".into()))?;
        let skill = question.skill_for(choice).ok_or_else(|| {
            AppError::InputValidation("please pick one of the offered options".into())
        })?;

        if !self.picked.iter().any(|picked| picked == skill) {
            self.picked.push(skill.to_string());
        }
        self.index += 1;

        if self.index >= quiz.len() {
            Ok(PersonalityStep::Finished(self.picked.clone()))
        } else {
            Ok(PersonalityStep::Next)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUIZ: &str = r#"{
        "questions": [
            {"id": 1, "question": "Free afternoon?", "options": ["Build a robot", "Read about stars"], "skills": ["Engineering", "Astronomy"]},
            {"id": 2, "question": "Favourite tool?", "options": ["Soldering iron", "Telescope", "Laptop"], "skills": ["Engineering", "Astronomy", "Programming"]}
        ]
    }"#;

    #[test]
    fn test_option_maps_to_skill() {
        let quiz = PersonalityQuiz::from_json_str(QUIZ).unwrap();
        let question = quiz.get(1).unwrap();
        assert_eq!(question.skill_for("Telescope"), Some("Astronomy"));
        assert_eq!(question.skill_for("Laptop"), Some("Programming"));
        assert_eq!(question.skill_for("laptop"), None);
    }

    #[test]
    fn test_run_collects_unique_skills() {
        let quiz = PersonalityQuiz::from_json_str(QUIZ).unwrap();
        let mut run = PersonalityRun::default();

        assert_eq!(run.answer("Build a robot", &quiz).unwrap(), PersonalityStep::Next);
        assert_eq!(run.number(), 2);
        assert_eq!(
            run.answer("Soldering iron", &quiz).unwrap(),
            PersonalityStep::Finished(vec!["Engineering".to_string()])
        );
    }

    #[test]
    fn test_run_keeps_first_seen_order() {
        let quiz = PersonalityQuiz::from_json_str(QUIZ).unwrap();
        let mut run = PersonalityRun::default();
        run.answer("Read about stars", &quiz).unwrap();
        assert_eq!(
            run.answer("Laptop", &quiz).unwrap(),
            PersonalityStep::Finished(vec!["Astronomy".to_string(), "Programming".to_string()])
        );
    }

    #[test]
    fn test_unknown_choice_does_not_advance() {
        let quiz = PersonalityQuiz::from_json_str(QUIZ).unwrap();
        let mut run = PersonalityRun::default();
        assert!(matches!(
            run.answer("Go fishing", &quiz),
            Err(AppError::InputValidation(_))
        ));
        assert_eq!(run.number(), 1);
    }

    #[test]
    fn test_mismatched_skills_rejected() {
        let raw = r#"{"questions": [{"id": 7, "question": "?", "options": ["a", "b"], "skills": ["x"]}]}"#;
        assert!(matches!(
            PersonalityQuiz::from_json_str(raw),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_bundled_personality_quiz_is_valid() {
        let quiz = PersonalityQuiz::load(
            Path::new(env!("CARGO_MANIFEST_DIR")).join("data/personality_quiz.json"),
        )
        .unwrap();
        assert!(quiz.len() >= 3);
    }
}
