//! Chat text derived from session state. Rendering never mutates anything.

use crate::quiz::rank::{rank, xp_to_next_rank};
use crate::quiz::scramble::ScrambleChallenge;
use crate::quiz::skills::Progress;
use crate::quiz::{QuizQuestion, Subject};

const BAR_WIDTH: usize = 10;

/// Display-only clamp; stored skill values may exceed 1.0.
pub fn clamp_for_display(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

fn skill_bar(value: f64) -> String {
    let filled = (clamp_for_display(value) * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

pub fn progress_report(progress: &Progress) -> String {
    let current = rank(progress.xp);
    let next = match xp_to_next_rank(progress.xp) {
        Some(missing) => format!("{} XP to the next rank", missing),
        None => "top rank reached".to_string(),
    };

    let mut lines = vec![format!(
        "🏅 {} {} · {} XP ({})",
        current.name,
        "⭐".repeat(current.tier_index + 1),
        progress.xp,
        next
    )];
    for subject in Subject::ALL {
        let value = progress.skills.get(subject);
        lines.push(format!(
            "{:<8} {} {:>3.0}%",
            subject.name(),
            skill_bar(value),
            clamp_for_display(value) * 100.0
        ));
    }
    lines.join("\n")
}

pub fn question_text(subject: Subject, number: Option<usize>, question: &QuizQuestion) -> String {
    let header = match number {
        Some(n) => format!("{} · question #{}", subject, n),
        None => format!("{} · AI challenge", subject),
    };
    format!("{}\n\n{}\n\nReward: {} XP", header, question.question, question.xp)
}

pub fn scramble_text(challenge: &ScrambleChallenge) -> String {
    format!(
        "🔤 Unscramble: {}\nClue: {}\n\nReward: {} XP",
        challenge.scrambled, challenge.clue, challenge.xp
    )
}
