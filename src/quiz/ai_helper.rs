use std::ops::RangeInclusive;

use chatgpt::client::ChatGPT;
use chatgpt::types::CompletionResponse;
use rand::seq::SliceRandom;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::quiz::roadmap::RoadmapPrompt;
use crate::quiz::scramble::ScrambleChallenge;
use crate::quiz::skills::SkillVector;
use crate::quiz::{QuizQuestion, Subject};

pub struct QuizHelper {
    chat_gpt: ChatGPT,
    reward_range: RangeInclusive<u32>,
}

impl QuizHelper {
    pub fn new(chat_gpt: ChatGPT, reward_range: RangeInclusive<u32>) -> Self {
        Self {
            chat_gpt,
            reward_range,
        }
    }

    async fn ask(&self, role: Role, task: &str) -> Result<String> {
        let prompt = format!("{}\n\n{}", role.get_role(), task);
        log::debug!("Sending prompt as {:?}: {:?}", role, task);

        let response: CompletionResponse = self.chat_gpt.send_message(prompt).await?;
        let content = response.message().clone().content;

        log::debug!("Completion: {:?}", content);
        if content.trim().is_empty() {
            return Err(AppError::Upstream("empty completion".into()));
        }
        Ok(content)
    }

    /// Two sequential completions: career pick, then the roadmap built on it.
    pub async fn generate_roadmap(
        &self,
        prompt: &RoadmapPrompt,
        interests: &[String],
    ) -> Result<String> {
        log::info!(
            "Generating roadmap for math={} science={} tech={} interests={:?}",
            prompt.math,
            prompt.science,
            prompt.tech,
            interests
        );
        let career = self
            .ask(Role::CareerMatchmaker, &prompt.career_prompt(interests))
            .await?;
        let roadmap = self
            .ask(Role::CurriculumDesigner, &prompt.roadmap_prompt(&career))
            .await?;

        Ok(format!("{}\n\n{}", career.trim(), roadmap.trim()))
    }

    pub async fn generate_question(
        &self,
        subject: Subject,
        skills: &SkillVector,
    ) -> Result<QuizQuestion> {
        let level = skills.get(subject);
        let task = format!(
            "Write one multiple-choice {} question for a student whose {} proficiency is {:.2} on a 0-1 scale. \
            Harder questions for higher proficiency. Give 4 options. \
            Reply with JSON only, no prose, exactly in this shape: \
            {{\"question\": \"...\", \"options\": [\"...\", \"...\", \"...\", \"...\"], \"answer\": \"<one of the options, verbatim>\", \"xp\": <integer {}-{}>}}",
            subject,
            subject,
            level,
            self.reward_range.start(),
            self.reward_range.end()
        );
        let raw = self.ask(Role::QuizMaster, &task).await?;

        let mut question = parse_generated_question(&raw, &self.reward_range)?;
        // the model tends to put the right answer first
        question.options.shuffle(&mut rand::thread_rng());
        Ok(question)
    }

    pub async fn generate_scramble(&self) -> Result<ScrambleChallenge> {
        let task = format!(
            "Pick one single-word technology term (4 to 10 letters, no spaces) and write a short clue for it. \
            Reply with JSON only, exactly in this shape: \
            {{\"word\": \"...\", \"clue\": \"...\", \"xp\": <integer {}-{}>}}",
            self.reward_range.start(),
            self.reward_range.end()
        );
        let raw = self.ask(Role::QuizMaster, &task).await?;
        parse_generated_scramble(&raw, &self.reward_range)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Role {
    CareerMatchmaker,
    CurriculumDesigner,
    QuizMaster,
}

impl Role {
    pub fn get_role(&self) -> &'static str {
        match self {
            Role::CareerMatchmaker => {
                "You are a world-class STEM career strategist. You look at technical proficiency \
                scores to suggest the perfect career path for a student."
            }
            Role::CurriculumDesigner => {
                "You are a curriculum designer who specializes in accelerated learning. You design paths \
                that focus on exactly what a student needs to reach a job-ready level."
            }
            Role::QuizMaster => {
                "You are a quiz master for a STEM learning game. You only ever answer with valid JSON."
            }
        }
    }
}

#[derive(Deserialize)]
struct GeneratedQuestion {
    question: String,
    options: Vec<String>,
    answer: String,
    xp: u32,
}

#[derive(Deserialize)]
struct GeneratedScramble {
    word: String,
    clue: String,
    xp: u32,
}

/// Cuts the outermost JSON object out of a completion (models like to add ``` fences).
fn extract_json_object(raw: &str) -> Result<&str> {
    let start = raw.find('{');
    let end = raw.rfind('}');
    match (start, end) {
        (Some(start), Some(end)) if start < end => Ok(&raw[start..=end]),
        _ => Err(AppError::Upstream("no JSON object in AI response".into())),
    }
}

fn check_reward(xp: u32, reward_range: &RangeInclusive<u32>) -> Result<()> {
    if !reward_range.contains(&xp) {
        return Err(AppError::Upstream(format!(
            "reward of {} XP is outside {}-{}",
            xp,
            reward_range.start(),
            reward_range.end()
        )));
    }
    Ok(())
}

/// Parses and checks a generated question. All strings are trimmed; matching stays exact.
pub fn parse_generated_question(
    raw: &str,
    reward_range: &RangeInclusive<u32>,
) -> Result<QuizQuestion> {
    let generated: GeneratedQuestion = serde_json::from_str(extract_json_object(raw)?)
        .map_err(|e| AppError::Upstream(format!("malformed question: {}", e)))?;
    check_reward(generated.xp, reward_range)?;

    let question = QuizQuestion::new(
        generated.question.trim().to_string(),
        generated
            .options
            .iter()
            .map(|option| option.trim().to_string())
            .collect(),
        generated.answer.trim().to_string(),
        generated.xp,
    );
    question
        .validate()
        .map_err(|e| AppError::Upstream(format!("malformed question: {}", e)))?;
    Ok(question)
}

pub fn parse_generated_scramble(
    raw: &str,
    reward_range: &RangeInclusive<u32>,
) -> Result<ScrambleChallenge> {
    let generated: GeneratedScramble = serde_json::from_str(extract_json_object(raw)?)
        .map_err(|e| AppError::Upstream(format!("malformed word game: {}", e)))?;
    check_reward(generated.xp, reward_range)?;

    let word = generated.word.trim();
    if word.is_empty() || word.chars().any(char::is_whitespace) {
        return Err(AppError::Upstream(format!(
            "malformed word game: {:?} is not a single word",
            generated.word
        )));
    }
    let clue = generated.clue.trim();
    if clue.is_empty() {
        return Err(AppError::Upstream("malformed word game: empty clue".into()));
    }
    Ok(ScrambleChallenge::new(
        word.to_string(),
        clue.to_string(),
        generated.xp,
    ))
}
