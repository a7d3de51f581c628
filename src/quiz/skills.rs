use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::quiz::Subject;

/// Cumulative per-subject proficiency. Values may grow past 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SkillVector {
    pub math: f64,
    pub science: f64,
    pub tech: f64,
}

impl SkillVector {
    pub fn new(math: f64, science: f64, tech: f64) -> Self {
        Self {
            math,
            science,
            tech,
        }
    }

    pub fn get(&self, subject: Subject) -> f64 {
        match subject {
            Subject::Math => self.math,
            Subject::Science => self.science,
            Subject::Tech => self.tech,
        }
    }

    fn get_mut(&mut self, subject: Subject) -> &mut f64 {
        match subject {
            Subject::Math => &mut self.math,
            Subject::Science => &mut self.science,
            Subject::Tech => &mut self.tech,
        }
    }
}

/// XP and skills of one session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub xp: u32,
    pub skills: SkillVector,
}

impl Progress {
    pub fn apply_correct_answer(&mut self, subject: Subject, xp_reward: u32, skill_step: f64) {
        self.xp = self.xp.saturating_add(xp_reward);
        *self.skills.get_mut(subject) += skill_step;
        log::debug!(
            "{} +{} XP, {} skill now {:.2}",
            subject,
            xp_reward,
            subject,
            self.skills.get(subject)
        );
    }
}

/// Parses "0.9 0.2 0.5" (spaces or commas) into math, science and tech scores.
pub fn parse_manual_scores(input: &str) -> Result<SkillVector> {
    let parts = input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>();

    if parts.len() != 3 {
        return Err(AppError::InputValidation(format!(
            "expected three scores (math science tech), got {}",
            parts.len()
        )));
    }

    let mut values = [0.0; 3];
    for (slot, (part, subject)) in values.iter_mut().zip(parts.iter().zip(Subject::ALL)) {
        let value: f64 = part.parse().map_err(|_| {
            AppError::InputValidation(format!("{} score {:?} is not a number", subject, part))
        })?;
        if !value.is_finite() || value < 0.0 {
            return Err(AppError::InputValidation(format!(
                "{} score must be a non-negative number",
                subject
            )));
        }
        *slot = value;
    }

    Ok(SkillVector::new(values[0], values[1], values[2]))
}
