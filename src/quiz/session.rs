//! One-question-at-a-time quiz controller.
//!
//! A question moves `AwaitingAnswer -> Answered`. Catalog quizzes then advance
//! to the next index or to `Complete`; generated quizzes wait for a new
//! question to be installed.

use serde::{Deserialize, Serialize};

use crate::quiz::catalog::QuizCatalog;
use crate::quiz::skills::Progress;
use crate::quiz::{QuizQuestion, Subject};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QuestionSource {
    Catalog { index: usize },
    Generated { current: Option<QuizQuestion> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizState {
    AwaitingAnswer,
    Answered,
    Complete,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Correct { xp_awarded: u32 },
    Incorrect { correct_answer: String },
    AlreadyAnswered,
    /// Generated quiz without a question, or an exhausted catalog.
    NoQuestion,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizSession {
    subject: Subject,
    source: QuestionSource,
    answered: bool,
    skill_step: f64,
}

impl QuizSession {
    pub fn from_catalog(subject: Subject, skill_step: f64) -> Self {
        Self {
            subject,
            source: QuestionSource::Catalog { index: 0 },
            answered: false,
            skill_step,
        }
    }

    pub fn generated(subject: Subject, skill_step: f64) -> Self {
        Self {
            subject,
            source: QuestionSource::Generated { current: None },
            answered: false,
            skill_step,
        }
    }

    pub fn subject(&self) -> Subject {
        self.subject
    }

    /// Position in the catalog; always 0 for generated quizzes.
    pub fn index(&self) -> usize {
        match self.source {
            QuestionSource::Catalog { index } => index,
            QuestionSource::Generated { .. } => 0,
        }
    }

    pub fn state(&self, catalog: &QuizCatalog) -> QuizState {
        if let QuestionSource::Catalog { index } = self.source {
            if index >= catalog.len(self.subject) {
                return QuizState::Complete;
            }
        }
        if self.answered {
            QuizState::Answered
        } else {
            QuizState::AwaitingAnswer
        }
    }

    /// The question currently on screen, if any.
    pub fn load_question<'a>(&'a self, catalog: &'a QuizCatalog) -> Option<&'a QuizQuestion> {
        match &self.source {
            QuestionSource::Catalog { index } => catalog.get(self.subject, *index),
            QuestionSource::Generated { .. } => self.generated_question(),
        }
    }

    pub fn generated_question(&self) -> Option<&QuizQuestion> {
        match &self.source {
            QuestionSource::Generated { current } => current.as_ref(),
            QuestionSource::Catalog { .. } => None,
        }
    }

    /// Whether a generated quiz has to ask the AI for a question.
    ///
    /// An unanswered question is kept unless `force` is set or the subject changed.
    pub fn needs_fetch(&self, subject: Subject, force: bool) -> bool {
        match &self.source {
            QuestionSource::Catalog { .. } => false,
            QuestionSource::Generated { current } => {
                force || subject != self.subject || current.is_none() || self.answered
            }
        }
    }

    /// Puts a freshly generated question on screen. Turns a catalog quiz into a generated one.
    pub fn install(&mut self, subject: Subject, question: QuizQuestion) {
        self.subject = subject;
        self.source = QuestionSource::Generated {
            current: Some(question),
        };
        self.answered = false;
    }

    pub fn submit_answer(
        &mut self,
        choice: &str,
        catalog: &QuizCatalog,
        progress: &mut Progress,
    ) -> SubmitOutcome {
        if self.answered {
            return SubmitOutcome::AlreadyAnswered;
        }

        let (subject, skill_step) = (self.subject, self.skill_step);
        let Some(question) = self.load_question(catalog) else {
            return SubmitOutcome::NoQuestion;
        };

        let outcome = if question.is_correct(choice) {
            progress.apply_correct_answer(subject, question.xp, skill_step);
            SubmitOutcome::Correct {
                xp_awarded: question.xp,
            }
        } else {
            SubmitOutcome::Incorrect {
                correct_answer: question.answer.clone(),
            }
        };
        self.answered = true;
        outcome
    }

    /// Moves a catalog quiz to the next question once the current one is answered.
    pub fn advance(&mut self, catalog: &QuizCatalog) -> QuizState {
        if let QuestionSource::Catalog { index } = &mut self.source {
            if self.answered {
                *index += 1;
                self.answered = false;
            }
        }
        self.state(catalog)
    }

    /// Back to the first catalog question. Progress is left alone.
    pub fn restart(&mut self) {
        if let QuestionSource::Catalog { index } = &mut self.source {
            *index = 0;
        }
        self.answered = false;
    }
}

/// Takes the AI quiz parked in the session, or starts a fresh one.
///
/// The caller checks `needs_fetch` on the result and parks it again if the fetch fails,
/// so an unanswered question survives a flaky AI call.
pub fn resume_generated(
    parked: &mut Option<QuizSession>,
    subject: Subject,
    skill_step: f64,
) -> QuizSession {
    parked
        .take()
        .unwrap_or_else(|| QuizSession::generated(subject, skill_step))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> QuizCatalog {
        QuizCatalog::from_json_str(
            r#"{
                "Math": [
                    {"question": "2 + 2 = ?", "options": ["3", "4"], "answer": "4", "xp": 10},
                    {"question": "3 * 3 = ?", "options": ["6", "9"], "answer": "9", "xp": 15},
                    {"question": "10 / 2 = ?", "options": ["5", "2"], "answer": "5", "xp": 20}
                ]
            }"#,
        )
        .unwrap()
    }

    fn generated_question() -> QuizQuestion {
        QuizQuestion::new(
            "Which particle has a negative charge?".into(),
            vec!["Proton".into(), "Electron".into(), "Neutron".into()],
            "Electron".into(),
            15,
        )
    }

    #[test]
    fn test_correct_answer_awards_once() {
        let catalog = catalog();
        let mut progress = Progress::default();
        let mut quiz = QuizSession::from_catalog(Subject::Math, 0.1);

        assert_eq!(quiz.state(&catalog), QuizState::AwaitingAnswer);
        assert_eq!(
            quiz.submit_answer("4", &catalog, &mut progress),
            SubmitOutcome::Correct { xp_awarded: 10 }
        );
        assert_eq!(quiz.state(&catalog), QuizState::Answered);
        assert_eq!(
            quiz.submit_answer("4", &catalog, &mut progress),
            SubmitOutcome::AlreadyAnswered
        );
        assert_eq!(progress.xp, 10);
        assert_eq!(progress.skills.math, 0.1);
    }

    #[test]
    fn test_incorrect_answer_changes_nothing() {
        let catalog = catalog();
        let mut progress = Progress::default();
        let mut quiz = QuizSession::from_catalog(Subject::Math, 0.1);

        assert_eq!(
            quiz.submit_answer("3", &catalog, &mut progress),
            SubmitOutcome::Incorrect {
                correct_answer: "4".into()
            }
        );
        assert_eq!(progress, Progress::default());
        // the answered flag also blocks a corrected retry
        assert_eq!(
            quiz.submit_answer("4", &catalog, &mut progress),
            SubmitOutcome::AlreadyAnswered
        );
        assert_eq!(progress.xp, 0);
    }

    #[test]
    fn test_comparison_is_case_and_whitespace_sensitive() {
        let catalog = QuizCatalog::from_json_str(
            r#"{"Science": [{"question": "Red planet?", "options": ["Mars", "Venus"], "answer": "Mars", "xp": 10}]}"#,
        )
        .unwrap();
        let mut progress = Progress::default();
        let mut quiz = QuizSession::from_catalog(Subject::Science, 0.1);
        assert!(matches!(
            quiz.submit_answer("mars ", &catalog, &mut progress),
            SubmitOutcome::Incorrect { .. }
        ));
    }

    #[test]
    fn test_advance_requires_answer() {
        let catalog = catalog();
        let mut quiz = QuizSession::from_catalog(Subject::Math, 0.1);
        assert_eq!(quiz.advance(&catalog), QuizState::AwaitingAnswer);
        assert_eq!(quiz.index(), 0);
    }

    #[test]
    fn test_exhaustion_and_restart() {
        let catalog = catalog();
        let mut progress = Progress::default();
        let mut quiz = QuizSession::from_catalog(Subject::Math, 0.1);

        for answer in ["4", "9", "5"] {
            quiz.submit_answer(answer, &catalog, &mut progress);
            quiz.advance(&catalog);
        }
        assert_eq!(quiz.state(&catalog), QuizState::Complete);
        assert!(quiz.load_question(&catalog).is_none());
        assert_eq!(
            quiz.submit_answer("4", &catalog, &mut progress),
            SubmitOutcome::NoQuestion
        );

        let before = progress.clone();
        quiz.restart();
        assert_eq!(quiz.index(), 0);
        assert_eq!(quiz.state(&catalog), QuizState::AwaitingAnswer);
        assert_eq!(progress, before);
        assert_eq!(progress.xp, 45);
    }

    #[test]
    fn test_empty_subject_is_complete() {
        let catalog = catalog();
        let quiz = QuizSession::from_catalog(Subject::Tech, 0.1);
        assert_eq!(quiz.state(&catalog), QuizState::Complete);
    }

    #[test]
    fn test_generated_fetch_rules() {
        let mut quiz = QuizSession::generated(Subject::Science, 0.2);
        assert!(quiz.needs_fetch(Subject::Science, false));

        quiz.install(Subject::Science, generated_question());
        assert_eq!(quiz.generated_question().unwrap().answer, "Electron");
        assert!(!quiz.needs_fetch(Subject::Science, false));
        assert!(quiz.needs_fetch(Subject::Science, true));
        assert!(quiz.needs_fetch(Subject::Math, false));

        let mut progress = Progress::default();
        quiz.submit_answer("Proton", &QuizCatalog::default(), &mut progress);
        assert!(quiz.needs_fetch(Subject::Science, false));
    }

    #[test]
    fn test_generated_answer_uses_step() {
        let catalog = QuizCatalog::default();
        let mut progress = Progress::default();
        let mut quiz = QuizSession::generated(Subject::Science, 0.2);

        assert_eq!(
            quiz.submit_answer("Electron", &catalog, &mut progress),
            SubmitOutcome::NoQuestion
        );

        quiz.install(Subject::Science, generated_question());
        assert_eq!(
            quiz.submit_answer("Electron", &catalog, &mut progress),
            SubmitOutcome::Correct { xp_awarded: 15 }
        );
        assert_eq!(progress.xp, 15);
        assert_eq!(progress.skills.science, 0.2);

        quiz.install(Subject::Science, generated_question());
        assert_eq!(quiz.state(&catalog), QuizState::AwaitingAnswer);
    }

    #[test]
    fn test_catalog_advance_ignored_for_generated() {
        let catalog = QuizCatalog::default();
        let mut quiz = QuizSession::generated(Subject::Tech, 0.2);
        quiz.install(Subject::Tech, generated_question());
        let mut progress = Progress::default();
        quiz.submit_answer("Proton", &catalog, &mut progress);
        assert_eq!(quiz.advance(&catalog), QuizState::Answered);
    }

    #[test]
    fn test_resume_without_parked_quiz_starts_fresh() {
        let mut parked = None;
        let quiz = resume_generated(&mut parked, Subject::Math, 0.2);
        assert_eq!(quiz.subject(), Subject::Math);
        assert!(quiz.needs_fetch(Subject::Math, false));
    }

    #[test]
    fn test_resume_keeps_unanswered_question() {
        let mut parked = Some(QuizSession::generated(Subject::Science, 0.2));
        if let Some(quiz) = parked.as_mut() {
            quiz.install(Subject::Science, generated_question());
        }

        let quiz = resume_generated(&mut parked, Subject::Science, 0.2);
        assert!(parked.is_none());
        assert!(!quiz.needs_fetch(Subject::Science, false));
        assert_eq!(quiz.generated_question().unwrap().answer, "Electron");
    }

    #[test]
    fn test_resume_other_subject_needs_fetch() {
        let mut parked = Some(QuizSession::generated(Subject::Science, 0.2));
        if let Some(quiz) = parked.as_mut() {
            quiz.install(Subject::Science, generated_question());
        }

        let mut quiz = resume_generated(&mut parked, Subject::Tech, 0.2);
        assert!(quiz.needs_fetch(Subject::Tech, false));
        quiz.install(Subject::Tech, generated_question());
        assert_eq!(quiz.subject(), Subject::Tech);
    }

    #[test]
    fn test_reparked_after_failed_fetch_keeps_question() {
        let mut parked = Some(QuizSession::generated(Subject::Science, 0.2));
        if let Some(quiz) = parked.as_mut() {
            quiz.install(Subject::Science, generated_question());
        }

        // asked for Math, fetch failed, quiz goes back untouched
        let quiz = resume_generated(&mut parked, Subject::Math, 0.2);
        assert!(quiz.needs_fetch(Subject::Math, false));
        parked = Some(quiz);

        let quiz = resume_generated(&mut parked, Subject::Science, 0.2);
        assert!(!quiz.needs_fetch(Subject::Science, false));
    }
}
