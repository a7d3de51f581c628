//! Gate and input contract for the career roadmap pipeline.
//!
//! The pipeline runs in two stages: a career suggestion from the raw scores,
//! then a four-week roadmap that receives the suggestion as context.
//! This module builds both prompts but never talks to the network.

use serde::Serialize;
use thiserror::Error;

use crate::quiz::skills::SkillVector;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    #[error("Locked: you have {xp} XP, {required} XP needed. Keep playing!")]
    BelowThreshold { xp: u32, required: u32 },
}

/// Checks an XP gate shared by the roadmap and the unlockable games.
pub fn check_gate(xp: u32, required: u32) -> Result<(), GateError> {
    if xp < required {
        return Err(GateError::BelowThreshold { xp, required });
    }
    Ok(())
}

/// Scores exactly as the AI stages expect them. Values are not clamped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RoadmapPrompt {
    pub math: f64,
    pub science: f64,
    pub tech: f64,
}

pub fn build_roadmap_request(
    skills: &SkillVector,
    xp: u32,
    threshold: u32,
) -> Result<RoadmapPrompt, GateError> {
    check_gate(xp, threshold)?;
    Ok(RoadmapPrompt {
        math: skills.math,
        science: skills.science,
        tech: skills.tech,
    })
}

impl RoadmapPrompt {
    /// Stage one: pick a career from the scores and any interests from the personality quiz.
    pub fn career_prompt(&self, interests: &[String]) -> String {
        let interests = if interests.is_empty() {
            String::new()
        } else {
            format!(
                " The student's interests: {}. Prefer a career that uses them.",
                interests.join(", ")
            )
        };
        format!(
            "Analyze these proficiency scores: Math: {}/1.0, Science: {}/1.0, Tech: {}/1.0.{} \
            Suggest 1 high-growth STEM career and give a 2-sentence 'Why' based on these specific strengths. \
            Answer with a career title and a brief justification.",
            self.math, self.science, self.tech, interests
        )
    }

    /// Stage two: author the roadmap using the stage one answer as context.
    pub fn roadmap_prompt(&self, career_suggestion: &str) -> String {
        format!(
            "Career suggestion from the previous step:\n{}\n\n\
            Based on this career and the skill levels (M:{}, S:{}, T:{}), design a 4-week roadmap. \
            Adjust difficulty: if a score is below 0.4, include more basics. \
            If above 0.8, make Week 1 a masterclass.\n\
            Answer with a Markdown formatted 4-week roadmap. Each week needs: \
            1. Focus Title | 2. 3 Specific Objectives | 3. A Success Pro-Tip.",
            career_suggestion.trim(),
            self.math,
            self.science,
            self.tech
        )
    }
}
