//! Per-session quiz state and its transitions.
//!
//! NotStarted -> InProgress -> Completed -> (play again) -> NotStarted.
//! `answer` (or `start`, for an empty bank) reports `Transition::Completed`
//! only on the step where
//! `quiz_completed` flips from false to true; the caller hangs the single
//! leaderboard append on that edge. Events that do not belong to the current
//! phase come back as `Transition::Ignored` and change nothing.

use tracing::debug;

use crate::domain::{Feedback, Phase, Question, Submission};
use crate::error::ValidationError;
use crate::quiz::{grade, is_complete};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
  pub player_name: String,
  pub current_question_index: usize,
  pub score: u32,
  pub quiz_started: bool,
  pub quiz_completed: bool,
  pub last_feedback: Option<Feedback>,
  pub last_submission: Option<Submission>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transition {
  Ignored,
  Started,
  Answered { correct: bool },
  /// The false->true completion edge. Reported once per run.
  Completed { correct: bool, score: u32 },
  Reset,
}

impl SessionState {
  pub fn new() -> Self { Self::default() }

  pub fn phase(&self) -> Phase {
    match (self.quiz_started, self.quiz_completed) {
      (false, _) => Phase::NotStarted,
      (true, false) => Phase::InProgress,
      (true, true) => Phase::Completed,
    }
  }

  /// Name form submission. Whitespace-only names are rejected.
  /// A bank of `total == 0` questions completes on the spot.
  pub fn start(&mut self, name: &str, total: usize) -> Result<Transition, ValidationError> {
    if self.phase() != Phase::NotStarted {
      return Ok(Transition::Ignored);
    }
    let name = name.trim();
    if name.is_empty() {
      return Err(ValidationError::EmptyName);
    }
    *self = Self {
      player_name: name.to_string(),
      quiz_started: true,
      ..Self::default()
    };
    debug!(target: "quiz", player = %self.player_name, "Quiz started");
    if is_complete(self.current_question_index, total) {
      self.quiz_completed = true;
      return Ok(Transition::Completed { correct: false, score: self.score });
    }
    Ok(Transition::Started)
  }

  /// Grade one answer against the current question and advance.
  pub fn answer(&mut self, questions: &[Question], option: &str) -> Result<Transition, ValidationError> {
    if self.phase() != Phase::InProgress {
      return Ok(Transition::Ignored);
    }
    let Some(question) = questions.get(self.current_question_index) else {
      // Bank shorter than the index: complete without grading.
      self.quiz_completed = true;
      return Ok(Transition::Completed { correct: false, score: self.score });
    };
    if !question.has_option(option) {
      return Err(ValidationError::UnknownOption(option.to_string()));
    }

    let correct = grade(question, option);
    if correct {
      self.score += 1;
      self.last_feedback = Some(Feedback::Correct);
    } else {
      self.last_feedback = Some(Feedback::Incorrect { expected: question.answer().to_string() });
    }
    self.current_question_index += 1;
    debug!(target: "quiz", player = %self.player_name, index = self.current_question_index, %correct, score = self.score, "Answer graded");

    if is_complete(self.current_question_index, questions.len()) {
      self.quiz_completed = true;
      Ok(Transition::Completed { correct, score: self.score })
    } else {
      Ok(Transition::Answered { correct })
    }
  }

  /// "Play again". Only a completed run can be reset.
  pub fn restart(&mut self) -> Transition {
    if self.phase() != Phase::Completed {
      return Transition::Ignored;
    }
    *self = Self::default();
    Transition::Reset
  }

  /// Take the pending feedback so it is shown on exactly one render.
  pub fn take_feedback(&mut self) -> Option<Feedback> {
    self.last_feedback.take()
  }

  #[cfg(test)]
  pub fn invariants_hold(&self, total: usize) -> bool {
    let idx = self.current_question_index;
    idx <= total
      && (self.score as usize) <= idx
      && (!self.quiz_started || self.quiz_completed == (idx == total))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::seeds::seed_questions;

  #[test]
  fn empty_name_does_not_start() {
    let mut s = SessionState::new();
    assert_eq!(s.start("   ", 2), Err(ValidationError::EmptyName));
    assert_eq!(s.phase(), Phase::NotStarted);
    assert_eq!(s, SessionState::new());
  }

  #[test]
  fn invariants_hold_after_every_transition() {
    let qs = seed_questions();
    let mut s = SessionState::new();
    assert!(s.invariants_hold(qs.len()));
    s.start("Ann", qs.len()).unwrap();
    assert!(s.invariants_hold(qs.len()));
    for q in &qs {
      let wrong = q.options().iter().find(|o| o.as_str() != q.answer()).unwrap();
      s.answer(&qs, wrong).unwrap();
      assert!(s.invariants_hold(qs.len()));
      assert_eq!(s.quiz_completed, s.current_question_index == qs.len());
    }
    assert_eq!(s.score, 0);
    assert_eq!(s.phase(), Phase::Completed);
  }

  #[test]
  fn completion_edge_is_reported_once() {
    let qs = seed_questions();
    let mut s = SessionState::new();
    s.start("Ann", qs.len()).unwrap();
    assert_eq!(s.answer(&qs, "Switzerland"), Ok(Transition::Answered { correct: true }));
    assert_eq!(s.answer(&qs, "Matterhorn"), Ok(Transition::Completed { correct: false, score: 1 }));
    assert_eq!(s.answer(&qs, "Monte Rosa"), Ok(Transition::Ignored));
    assert_eq!(s.score, 1);
    assert_eq!(s.current_question_index, 2);
  }

  #[test]
  fn unknown_option_is_rejected_without_advancing() {
    let qs = seed_questions();
    let mut s = SessionState::new();
    s.start("Ann", qs.len()).unwrap();
    assert_eq!(s.answer(&qs, "Narnia"), Err(ValidationError::UnknownOption("Narnia".into())));
    assert_eq!(s.current_question_index, 0);
  }

  #[test]
  fn restart_clears_prior_run() {
    let qs = seed_questions();
    let mut s = SessionState::new();
    s.start("Ann", qs.len()).unwrap();
    s.answer(&qs, "Switzerland").unwrap();
    assert_eq!(s.restart(), Transition::Ignored, "restart mid-run is ignored");
    s.answer(&qs, "Monte Rosa").unwrap();
    assert_eq!(s.score, 2);

    assert_eq!(s.restart(), Transition::Reset);
    assert_eq!(s.phase(), Phase::NotStarted);
    s.start("Bob", qs.len()).unwrap();
    assert_eq!(s.player_name, "Bob");
    assert_eq!(s.score, 0);
    assert_eq!(s.current_question_index, 0);
    assert!(!s.quiz_completed);
  }

  #[test]
  fn empty_bank_completes_on_start() {
    let mut s = SessionState::new();
    assert_eq!(s.start("Ann", 0), Ok(Transition::Completed { correct: false, score: 0 }));
    assert_eq!(s.phase(), Phase::Completed);
    assert!(s.invariants_hold(0));
    assert_eq!(s.answer(&[], "x"), Ok(Transition::Ignored));
  }

  #[test]
  fn start_is_ignored_once_running() {
    let mut s = SessionState::new();
    s.start("Ann", 2).unwrap();
    assert_eq!(s.start("Bob", 2), Ok(Transition::Ignored));
    assert_eq!(s.player_name, "Ann");
  }
}
