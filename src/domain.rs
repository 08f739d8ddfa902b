//! Domain models: questions, leaderboard rows and the session phase.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected question definitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuestionError {
  #[error("question has no options")]
  NoOptions,
  #[error("option '{0}' appears more than once")]
  DuplicateOption(String),
  #[error("answer '{0}' is not one of the options")]
  AnswerNotAnOption(String),
}

/// Immutable multiple-choice question.
#[derive(Clone, Debug)]
pub struct Question {
  prompt: String,
  options: Vec<String>,
  answer: String,
}

impl Question {
  pub fn new<P, O, A>(prompt: P, options: O, answer: A) -> Result<Self, QuestionError>
  where
    P: Into<String>,
    O: IntoIterator,
    O::Item: Into<String>,
    A: Into<String>,
  {
    let options: Vec<String> = options.into_iter().map(Into::into).collect();
    let answer = answer.into();
    if options.is_empty() {
      return Err(QuestionError::NoOptions);
    }
    for (i, opt) in options.iter().enumerate() {
      if options[..i].contains(opt) {
        return Err(QuestionError::DuplicateOption(opt.clone()));
      }
    }
    if !options.contains(&answer) {
      return Err(QuestionError::AnswerNotAnOption(answer));
    }
    Ok(Self { prompt: prompt.into(), options, answer })
  }

  pub fn prompt(&self) -> &str { &self.prompt }
  pub fn options(&self) -> &[String] { &self.options }
  pub fn answer(&self) -> &str { &self.answer }

  pub fn has_option(&self, option: &str) -> bool {
    self.options.iter().any(|o| o == option)
  }
}

/// One persisted leaderboard row. Names may repeat.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
  pub name: String,
  pub score: u32,
}

impl LeaderboardEntry {
  pub fn new(name: impl Into<String>, score: u32) -> Self {
    Self { name: name.into(), score }
  }
}

/// Where a session is in the quiz.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
  NotStarted,
  InProgress,
  Completed,
}

impl std::fmt::Display for Phase {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let s = match self {
      Phase::NotStarted => "not_started",
      Phase::InProgress => "in_progress",
      Phase::Completed => "completed",
    };
    f.write_str(s)
  }
}

/// Result of the most recently graded answer, shown once on the next render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Feedback {
  Correct,
  Incorrect { expected: String },
}

/// Outcome of the completion append.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Submission {
  Stored,
  Failed(String),
}
