use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::quiz::skills::Progress;
use crate::quiz::Subject;

/// Scramble words are all tech vocabulary, so they train the tech skill.
pub const SCRAMBLE_SUBJECT: Subject = Subject::Tech;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrambleChallenge {
    pub word: String,
    pub clue: String,
    pub xp: u32,
    pub scrambled: String,
    answered: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GuessOutcome {
    Correct { xp_awarded: u32 },
    Incorrect { word: String },
    AlreadyAnswered,
}

impl ScrambleChallenge {
    pub fn new(word: String, clue: String, xp: u32) -> Self {
        let scrambled = scramble_word(&word, &mut rand::thread_rng());
        Self {
            word,
            clue,
            xp,
            scrambled,
            answered: false,
        }
    }

    /// Scores a guess once. Surrounding whitespace and letter case are ignored.
    pub fn guess(&mut self, guess: &str, progress: &mut Progress, skill_step: f64) -> GuessOutcome {
        if self.answered {
            return GuessOutcome::AlreadyAnswered;
        }
        self.answered = true;

        if guess.trim().to_lowercase() == self.word.trim().to_lowercase() {
            progress.apply_correct_answer(SCRAMBLE_SUBJECT, self.xp, skill_step);
            GuessOutcome::Correct {
                xp_awarded: self.xp,
            }
        } else {
            GuessOutcome::Incorrect {
                word: self.word.clone(),
            }
        }
    }
}

/// Shuffles the letters, retrying a few times so the word is not shown as-is.
pub fn scramble_word<R: Rng + ?Sized>(word: &str, rng: &mut R) -> String {
    let original = word.trim().to_uppercase();
    let mut letters = original.chars().collect::<Vec<_>>();

    for _ in 0..10 {
        letters.shuffle(rng);
        let candidate = letters.iter().collect::<String>();
        if candidate != original {
            return candidate;
        }
    }
    // e.g. "AAA" cannot be scrambled
    letters.iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sorted(word: &str) -> Vec<char> {
        let mut chars = word.chars().collect::<Vec<_>>();
        chars.sort_unstable();
        chars
    }

    #[test]
    fn test_scramble_keeps_letters() {
        let mut rng = StdRng::seed_from_u64(7);
        let scrambled = scramble_word("compiler", &mut rng);
        assert_eq!(sorted(&scrambled), sorted("COMPILER"));
        assert_ne!(scrambled, "COMPILER");
    }

    #[test]
    fn test_unscramblable_word() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(scramble_word("aaa", &mut rng), "AAA");
        assert_eq!(scramble_word("x", &mut rng), "X");
    }

    #[test]
    fn test_correct_guess_scores_once() {
        let mut progress = Progress::default();
        let mut challenge = ScrambleChallenge::new("Kernel".into(), "Core of an OS".into(), 15);

        assert_eq!(
            challenge.guess("  kernel ", &mut progress, 0.1),
            GuessOutcome::Correct { xp_awarded: 15 }
        );
        assert_eq!(
            challenge.guess("kernel", &mut progress, 0.1),
            GuessOutcome::AlreadyAnswered
        );
        assert_eq!(progress.xp, 15);
        assert_eq!(progress.skills.tech, 0.1);
    }

    #[test]
    fn test_wrong_guess_reveals_word() {
        let mut progress = Progress::default();
        let mut challenge = ScrambleChallenge::new("Router".into(), "Forwards packets".into(), 10);
        assert_eq!(
            challenge.guess("switch", &mut progress, 0.1),
            GuessOutcome::Incorrect {
                word: "Router".into()
            }
        );
        assert!(challenge.answered);
        assert_eq!(progress.xp, 0);
    }

    #[test]
    fn test_guess_ignores_non_ascii_case() {
        let mut progress = Progress::default();
        let mut challenge = ScrambleChallenge::new("Café".into(), "Where code meets coffee".into(), 10);
        // the scrambled display is uppercased, so users type it back that way
        assert!(challenge.scrambled.contains('É'));
        assert_eq!(
            challenge.guess("CAFÉ", &mut progress, 0.1),
            GuessOutcome::Correct { xp_awarded: 10 }
        );
    }
}
