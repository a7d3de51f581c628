use std::sync::Arc;

use teloxide::{
    dispatching::{dialogue::ErasedStorage, UpdateHandler},
    prelude::*,
    types::{ChatAction, KeyboardButton, KeyboardMarkup},
    utils::command::BotCommands,
};

use crate::auth::{authenticate, AuthStatus};
use crate::error::AppError;
use crate::quiz::personality::{PersonalityRun, PersonalityStep};
use crate::quiz::roadmap::{build_roadmap_request, check_gate};
use crate::quiz::scramble::{GuessOutcome, ScrambleChallenge};
use crate::quiz::session::{resume_generated, QuizSession, QuizState, SubmitOutcome};
use crate::quiz::skills::{parse_manual_scores, Progress, SkillVector};
use crate::quiz::view::{progress_report, question_text, scramble_text};
use crate::quiz::Subject;
use crate::{AppContext, Session, State};

type QuizDialogue = Dialogue<State, ErasedStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Telegram rejects longer messages. Counted in UTF-16 code units, as Telegram does.
const MAX_MESSAGE_LEN: usize = 4000;

const CATALOG_QUIZZES: [(&str, Subject); 3] = [
    ("📐 Math quiz", Subject::Math),
    ("🔬 Science quiz", Subject::Science),
    ("💻 Tech quiz", Subject::Tech),
];
const AI_QUIZZES: [(&str, Subject); 3] = [
    ("🤖 AI Math", Subject::Math),
    ("🤖 AI Science", Subject::Science),
    ("🤖 AI Tech", Subject::Tech),
];
const SCRAMBLE_GAME: &str = "🔤 Word scramble";
const ROADMAP: &str = "🗺 Career roadmap";
const PERSONALITY_QUIZ: &str = "🧭 Personality quiz";
const PROGRESS: &str = "🏅 My progress";
const NEXT_QUESTION: &str = "➡️ Next question";
const NEW_QUESTION: &str = "🔄 New question";
const NEW_WORD: &str = "🔄 New word";
const RESTART: &str = "🔁 Restart category";
const BACK_TO_MENU: &str = "⬅️ Back to menu";

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "These commands are supported:")]
pub enum Command {
    #[command(description = "show this text.")]
    Help,
    #[command(description = "log in.")]
    Start,
    #[command(description = "show XP, rank and skills.")]
    Progress,
    #[command(description = "roadmap from your own scores, e.g. /scores 0.9 0.2 0.5")]
    Scores(String),
    #[command(description = "log out and discard progress.")]
    Logout,
}

pub fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    use dptree::case;

    Update::filter_message()
        .enter_dialogue::<Message, ErasedStorage<State>, State>()
        .branch(teloxide::filter_command::<Command, _>().endpoint(command))
        .branch(case![State::Start].endpoint(start))
        .branch(case![State::ReceiveUsername].endpoint(receive_username))
        .branch(case![State::ReceivePassword { username }].endpoint(receive_password))
        .branch(case![State::Menu { session }].endpoint(menu))
        .branch(case![State::CatalogQuiz { session, quiz }].endpoint(catalog_quiz))
        .branch(case![State::AiQuiz { session, quiz }].endpoint(ai_quiz))
        .branch(case![State::Scramble { session, challenge }].endpoint(scramble))
        .branch(case![State::Personality { session, run }].endpoint(personality))
}

fn keyboard<'a>(rows: impl IntoIterator<Item = Vec<&'a str>>) -> KeyboardMarkup {
    KeyboardMarkup::new(
        rows.into_iter()
            .map(|row| row.into_iter().map(KeyboardButton::new).collect::<Vec<_>>())
            .collect::<Vec<_>>(),
    )
}

fn menu_keyboard() -> KeyboardMarkup {
    keyboard([
        CATALOG_QUIZZES.iter().map(|(label, _)| *label).collect::<Vec<_>>(),
        AI_QUIZZES.iter().map(|(label, _)| *label).collect::<Vec<_>>(),
        vec![SCRAMBLE_GAME, ROADMAP],
        vec![PERSONALITY_QUIZ, PROGRESS],
    ])
}

fn options_keyboard(options: &[String]) -> KeyboardMarkup {
    keyboard(
        options
            .iter()
            .map(|option| vec![option.as_str()])
            .chain(std::iter::once(vec![BACK_TO_MENU])),
    )
}

fn subject_for(buttons: &[(&str, Subject)], text: &str) -> Option<Subject> {
    buttons
        .iter()
        .find(|(label, _)| *label == text)
        .map(|(_, subject)| *subject)
}

/// Splits long AI output on line boundaries so each piece fits in one message.
///
/// Lengths are UTF-16 code units, so an emoji outside the BMP counts twice.
fn split_message(text: &str, max_units: usize) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.lines() {
        let line_len = line.encode_utf16().count();
        if !current.is_empty() && current_len + line_len + 1 > max_units {
            parts.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if line_len > max_units {
            let mut chunk = String::new();
            let mut chunk_len = 0;
            for ch in line.chars() {
                if !chunk.is_empty() && chunk_len + ch.len_utf16() > max_units {
                    parts.push(std::mem::take(&mut chunk));
                    chunk_len = 0;
                }
                chunk.push(ch);
                chunk_len += ch.len_utf16();
            }
            if !chunk.is_empty() {
                parts.push(chunk);
            }
            continue;
        }
        if !current.is_empty() {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(line);
        current_len += line_len;
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

async fn reply_error(bot: &Bot, chat_id: ChatId, err: &AppError) -> HandlerResult {
    log::warn!("Chat {}: {}", chat_id, err);
    bot.send_message(chat_id, err.user_message()).await?;
    Ok(())
}

async fn show_busy(bot: &Bot, chat_id: ChatId) {
    // Only cosmetic, so a failure here is ignored
    let _ = bot.send_chat_action(chat_id, ChatAction::Typing).await;
}

async fn command(
    bot: Bot,
    dialogue: QuizDialogue,
    ctx: Arc<AppContext>,
    cmd: Command,
    msg: Message,
) -> HandlerResult {
    match cmd {
        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
        }
        Command::Start => {
            dialogue.reset().await?;
            start(bot, dialogue, msg).await?;
        }
        Command::Logout => {
            if let Some(session) = dialogue.get().await?.as_ref().and_then(State::session) {
                log::info!(
                    "User {:?} logged out with {} XP",
                    session.username,
                    session.progress.xp
                );
            }
            dialogue.exit().await?;
            bot.send_message(
                msg.chat.id,
                "👋 Logged out. Your progress from this session is gone. Send /start to play again.",
            )
            .await?;
        }
        Command::Progress => match dialogue.get().await?.as_ref().and_then(State::session) {
            Some(session) => {
                bot.send_message(
                    msg.chat.id,
                    format!("{}\n{}", session.display_name, progress_report(&session.progress)),
                )
                .await?;
            }
            None => {
                bot.send_message(msg.chat.id, "Please log in first with /start")
                    .await?;
            }
        },
        Command::Scores(args) => {
            let state = dialogue.get().await?;
            let Some(session) = state.as_ref().and_then(State::session) else {
                bot.send_message(msg.chat.id, "Please log in first with /start")
                    .await?;
                return Ok(());
            };
            match parse_manual_scores(&args) {
                Ok(skills) => {
                    send_roadmap(&bot, msg.chat.id, &ctx, session, &skills).await?
                }
                Err(err) => reply_error(&bot, msg.chat.id, &err).await?,
            }
        }
    }
    Ok(())
}

const GREETING_TEXT: &str = "Hi! I'm STEM Quest 🚀 Answer quiz questions, earn XP, climb the ranks and unlock your AI career roadmap. Let's log you in. What is your username?";
async fn start(bot: Bot, dialogue: QuizDialogue, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, GREETING_TEXT).await?;

    dialogue.update(State::ReceiveUsername).await?;
    Ok(())
}

async fn receive_username(bot: Bot, dialogue: QuizDialogue, msg: Message) -> HandlerResult {
    match msg.text().map(str::trim) {
        Some(username) if !username.is_empty() => {
            bot.send_message(msg.chat.id, "Thanks! Now your password:")
                .await?;
            dialogue
                .update(State::ReceivePassword {
                    username: username.to_string(),
                })
                .await?;
        }
        _ => {
            bot.send_message(msg.chat.id, "Please send your username as text")
                .await?;
        }
    }
    Ok(())
}

async fn receive_password(
    bot: Bot,
    dialogue: QuizDialogue,
    ctx: Arc<AppContext>,
    username: String,
    msg: Message,
) -> HandlerResult {
    let Some(password) = msg.text() else {
        bot.send_message(msg.chat.id, "Please send your password as text")
            .await?;
        return Ok(());
    };

    let status = authenticate(&ctx.settings.users, &username, password);
    if status == AuthStatus::Pending {
        bot.send_message(msg.chat.id, "The password can't be empty. Try again:")
            .await?;
        return Ok(());
    }
    // Keep the password out of the chat history
    let _ = bot.delete_message(msg.chat.id, msg.id).await;

    match status.into_result() {
        Ok(display_name) => {
            log::info!("User {:?} logged in from chat {}", username, msg.chat.id);
            bot.send_message(
                msg.chat.id,
                format!("Welcome, {}! Pick a game to start earning XP.", display_name),
            )
            .reply_markup(menu_keyboard())
            .await?;
            dialogue
                .update(State::Menu {
                    session: Session::new(username, display_name),
                })
                .await?;
        }
        Err(err) => {
            reply_error(&bot, msg.chat.id, &err).await?;
            bot.send_message(msg.chat.id, "Let's try again. What is your username?")
                .await?;
            dialogue.update(State::ReceiveUsername).await?;
        }
    }
    Ok(())
}

async fn back_to_menu(
    bot: &Bot,
    dialogue: &QuizDialogue,
    chat_id: ChatId,
    session: Session,
) -> HandlerResult {
    bot.send_message(chat_id, progress_report(&session.progress))
        .reply_markup(menu_keyboard())
        .await?;
    dialogue.update(State::Menu { session }).await?;
    Ok(())
}

async fn menu(
    bot: Bot,
    dialogue: QuizDialogue,
    ctx: Arc<AppContext>,
    session: Session,
    msg: Message,
) -> HandlerResult {
    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, "Please pick one of the options")
            .reply_markup(menu_keyboard())
            .await?;
        return Ok(());
    };

    if let Some(subject) = subject_for(&CATALOG_QUIZZES, text) {
        let quiz = QuizSession::from_catalog(subject, ctx.settings.game.static_skill_step);
        send_catalog_question(&bot, msg.chat.id, &ctx, &quiz).await?;
        dialogue.update(State::CatalogQuiz { session, quiz }).await?;
        return Ok(());
    }

    if let Some(subject) = subject_for(&AI_QUIZZES, text) {
        return start_ai_quiz(&bot, &dialogue, msg.chat.id, &ctx, session, subject).await;
    }

    match text {
        SCRAMBLE_GAME => {
            let gate = check_gate(session.progress.xp, ctx.settings.game.scramble_unlock_xp);
            if let Err(gate) = gate {
                return reply_error(&bot, msg.chat.id, &AppError::from(gate)).await;
            }
            show_busy(&bot, msg.chat.id).await;
            match ctx.helper.generate_scramble().await {
                Ok(challenge) => {
                    send_scramble(&bot, msg.chat.id, &challenge).await?;
                    dialogue
                        .update(State::Scramble { session, challenge })
                        .await?;
                }
                Err(err) => reply_error(&bot, msg.chat.id, &err).await?,
            }
        }
        ROADMAP => {
            let skills = session.progress.skills;
            send_roadmap(&bot, msg.chat.id, &ctx, &session, &skills).await?;
        }
        PERSONALITY_QUIZ => {
            let run = PersonalityRun::default();
            send_personality_question(&bot, msg.chat.id, &ctx, &run).await?;
            dialogue.update(State::Personality { session, run }).await?;
        }
        PROGRESS => {
            bot.send_message(msg.chat.id, progress_report(&session.progress))
                .reply_markup(menu_keyboard())
                .await?;
        }
        _ => {
            bot.send_message(msg.chat.id, "Please pick one of the options")
                .reply_markup(menu_keyboard())
                .await?;
        }
    }
    Ok(())
}

/// Gate on the session's XP, then run the two-stage pipeline on `skills`.
async fn send_roadmap(
    bot: &Bot,
    chat_id: ChatId,
    ctx: &AppContext,
    session: &Session,
    skills: &SkillVector,
) -> HandlerResult {
    let threshold = ctx.settings.game.roadmap_unlock_xp;
    let prompt = match build_roadmap_request(skills, session.progress.xp, threshold) {
        Ok(prompt) => prompt,
        Err(gate) => return reply_error(bot, chat_id, &AppError::from(gate)).await,
    };

    bot.send_message(chat_id, "🧠 Picking a career and writing your 4-week roadmap...")
        .await?;
    show_busy(bot, chat_id).await;

    match ctx.helper.generate_roadmap(&prompt, &session.interests).await {
        Ok(roadmap) => {
            for part in split_message(&roadmap, MAX_MESSAGE_LEN) {
                bot.send_message(chat_id, part).await?;
            }
        }
        Err(err) => reply_error(bot, chat_id, &err).await?,
    }
    Ok(())
}

async fn send_catalog_question(
    bot: &Bot,
    chat_id: ChatId,
    ctx: &AppContext,
    quiz: &QuizSession,
) -> HandlerResult {
    match quiz.load_question(&ctx.catalog) {
        Some(question) => {
            bot.send_message(
                chat_id,
                question_text(quiz.subject(), Some(quiz.index() + 1), question),
            )
            .reply_markup(options_keyboard(&question.options))
            .await?;
        }
        None => {
            bot.send_message(
                chat_id,
                format!(
                    "🎉 {} category complete! Restart it or head back to the menu.",
                    quiz.subject()
                ),
            )
            .reply_markup(keyboard([vec![RESTART], vec![BACK_TO_MENU]]))
            .await?;
        }
    }
    Ok(())
}

fn outcome_text(outcome: &SubmitOutcome, progress: &Progress, continue_label: &str) -> String {
    match outcome {
        SubmitOutcome::Correct { xp_awarded } => format!(
            "✅ Correct! +{} XP\n\n{}",
            xp_awarded,
            progress_report(progress)
        ),
        SubmitOutcome::Incorrect { correct_answer } => format!(
            "❌ Not quite. The correct answer is: {}\n\n{}",
            correct_answer,
            progress_report(progress)
        ),
        SubmitOutcome::AlreadyAnswered => format!(
            "You already answered this one. Press \"{}\" to continue.",
            continue_label
        ),
        SubmitOutcome::NoQuestion => "There is no open question right now.".to_string(),
    }
}

async fn catalog_quiz(
    bot: Bot,
    dialogue: QuizDialogue,
    ctx: Arc<AppContext>,
    (mut session, mut quiz): (Session, QuizSession),
    msg: Message,
) -> HandlerResult {
    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, "Please answer with one of the buttons")
            .await?;
        return Ok(());
    };

    match text {
        BACK_TO_MENU => return back_to_menu(&bot, &dialogue, msg.chat.id, session).await,
        NEXT_QUESTION => match quiz.state(&ctx.catalog) {
            QuizState::AwaitingAnswer => {
                bot.send_message(msg.chat.id, "Answer the current question first 🙂")
                    .await?;
                return Ok(());
            }
            QuizState::Answered | QuizState::Complete => {
                quiz.advance(&ctx.catalog);
                send_catalog_question(&bot, msg.chat.id, &ctx, &quiz).await?;
            }
        },
        RESTART => {
            quiz.restart();
            send_catalog_question(&bot, msg.chat.id, &ctx, &quiz).await?;
        }
        choice => {
            let outcome = quiz.submit_answer(choice, &ctx.catalog, &mut session.progress);
            if outcome == SubmitOutcome::NoQuestion {
                send_catalog_question(&bot, msg.chat.id, &ctx, &quiz).await?;
                return Ok(());
            }
            bot.send_message(
                msg.chat.id,
                outcome_text(&outcome, &session.progress, NEXT_QUESTION),
            )
            .reply_markup(keyboard([vec![NEXT_QUESTION], vec![BACK_TO_MENU]]))
            .await?;
        }
    }

    dialogue.update(State::CatalogQuiz { session, quiz }).await?;
    Ok(())
}

async fn announce_generation(bot: &Bot, chat_id: ChatId, subject: Subject) -> HandlerResult {
    bot.send_message(chat_id, format!("🤖 Generating a {} question...", subject))
        .await?;
    show_busy(bot, chat_id).await;
    Ok(())
}

async fn send_ai_question(bot: &Bot, chat_id: ChatId, quiz: &QuizSession) -> HandlerResult {
    if let Some(question) = quiz.generated_question() {
        bot.send_message(chat_id, question_text(quiz.subject(), None, question))
            .reply_markup(options_keyboard(&question.options))
            .await?;
    }
    Ok(())
}

async fn start_ai_quiz(
    bot: &Bot,
    dialogue: &QuizDialogue,
    chat_id: ChatId,
    ctx: &AppContext,
    mut session: Session,
    subject: Subject,
) -> HandlerResult {
    let step = ctx.settings.game.ai_skill_step;
    let mut quiz = resume_generated(&mut session.parked_ai_quiz, subject, step);

    if quiz.needs_fetch(subject, false) {
        announce_generation(bot, chat_id, subject).await?;
        match ctx.helper.generate_question(subject, &session.progress.skills).await {
            Ok(question) => quiz.install(subject, question),
            Err(err) => {
                reply_error(bot, chat_id, &err).await?;
                session.parked_ai_quiz = Some(quiz);
                dialogue.update(State::Menu { session }).await?;
                return Ok(());
            }
        }
    }

    send_ai_question(bot, chat_id, &quiz).await?;
    dialogue.update(State::AiQuiz { session, quiz }).await?;
    Ok(())
}

async fn ai_quiz(
    bot: Bot,
    dialogue: QuizDialogue,
    ctx: Arc<AppContext>,
    (mut session, mut quiz): (Session, QuizSession),
    msg: Message,
) -> HandlerResult {
    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, "Please answer with one of the buttons")
            .await?;
        return Ok(());
    };

    match text {
        BACK_TO_MENU => {
            session.parked_ai_quiz = Some(quiz);
            return back_to_menu(&bot, &dialogue, msg.chat.id, session).await;
        }
        NEW_QUESTION => {
            let subject = quiz.subject();
            if quiz.needs_fetch(subject, true) {
                announce_generation(&bot, msg.chat.id, subject).await?;
                match ctx.helper.generate_question(subject, &session.progress.skills).await {
                    Ok(question) => {
                        quiz.install(subject, question);
                        send_ai_question(&bot, msg.chat.id, &quiz).await?;
                    }
                    Err(err) => reply_error(&bot, msg.chat.id, &err).await?,
                }
            }
        }
        choice => {
            let outcome = quiz.submit_answer(choice, &ctx.catalog, &mut session.progress);
            bot.send_message(
                msg.chat.id,
                outcome_text(&outcome, &session.progress, NEW_QUESTION),
            )
            .reply_markup(keyboard([vec![NEW_QUESTION], vec![BACK_TO_MENU]]))
            .await?;
        }
    }

    dialogue.update(State::AiQuiz { session, quiz }).await?;
    Ok(())
}

async fn send_scramble(bot: &Bot, chat_id: ChatId, challenge: &ScrambleChallenge) -> HandlerResult {
    bot.send_message(chat_id, scramble_text(challenge))
        .reply_markup(keyboard([vec![NEW_WORD], vec![BACK_TO_MENU]]))
        .await?;
    Ok(())
}

async fn scramble(
    bot: Bot,
    dialogue: QuizDialogue,
    ctx: Arc<AppContext>,
    (mut session, mut challenge): (Session, ScrambleChallenge),
    msg: Message,
) -> HandlerResult {
    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, "Type your guess as text").await?;
        return Ok(());
    };

    match text {
        BACK_TO_MENU => return back_to_menu(&bot, &dialogue, msg.chat.id, session).await,
        NEW_WORD => {
            show_busy(&bot, msg.chat.id).await;
            match ctx.helper.generate_scramble().await {
                Ok(next) => {
                    challenge = next;
                    send_scramble(&bot, msg.chat.id, &challenge).await?;
                }
                Err(err) => reply_error(&bot, msg.chat.id, &err).await?,
            }
        }
        guess => {
            let step = ctx.settings.game.scramble_skill_step;
            let reply = match challenge.guess(guess, &mut session.progress, step) {
                GuessOutcome::Correct { xp_awarded } => format!(
                    "✅ Correct! +{} XP\n\n{}",
                    xp_awarded,
                    progress_report(&session.progress)
                ),
                GuessOutcome::Incorrect { word } => format!(
                    "❌ The word was {}\n\n{}",
                    word,
                    progress_report(&session.progress)
                ),
                GuessOutcome::AlreadyAnswered => format!(
                    "This word is done. Press \"{}\" for another one.",
                    NEW_WORD
                ),
            };
            bot.send_message(msg.chat.id, reply)
                .reply_markup(keyboard([vec![NEW_WORD], vec![BACK_TO_MENU]]))
                .await?;
        }
    }

    dialogue
        .update(State::Scramble { session, challenge })
        .await?;
    Ok(())
}

async fn send_personality_question(
    bot: &Bot,
    chat_id: ChatId,
    ctx: &AppContext,
    run: &PersonalityRun,
) -> HandlerResult {
    if let Some(question) = run.current(&ctx.personality) {
        bot.send_message(
            chat_id,
            format!(
                "🧭 Question {}/{}\n\n{}",
                run.number(),
                ctx.personality.len(),
                question.question
            ),
        )
        .reply_markup(options_keyboard(&question.options))
        .await?;
    }
    Ok(())
}

async fn personality(
    bot: Bot,
    dialogue: QuizDialogue,
    ctx: Arc<AppContext>,
    (mut session, mut run): (Session, PersonalityRun),
    msg: Message,
) -> HandlerResult {
    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, "Please answer with one of the buttons")
            .await?;
        return Ok(());
    };
    if text == BACK_TO_MENU {
        return back_to_menu(&bot, &dialogue, msg.chat.id, session).await;
    }

    match run.answer(text, &ctx.personality) {
        Ok(PersonalityStep::Next) => {
            send_personality_question(&bot, msg.chat.id, &ctx, &run).await?;
        }
        Ok(PersonalityStep::Finished(skills)) => {
            log::info!(
                "User {:?} finished the personality quiz: {:?}",
                session.username,
                skills
            );
            bot.send_message(
                msg.chat.id,
                format!(
                    "🎯 Target skills identified: {}\nYour career roadmap will take them into account.",
                    skills.join(", ")
                ),
            )
            .await?;
            session.interests = skills;
            return back_to_menu(&bot, &dialogue, msg.chat.id, session).await;
        }
        Err(err) => reply_error(&bot, msg.chat.id, &err).await?,
    }

    dialogue.update(State::Personality { session, run }).await?;
    Ok(())
}
