//! Grading and completion checks. Pure functions over in-memory questions.

use crate::domain::Question;

/// Exact, case-sensitive match against the correct option.
pub fn grade(question: &Question, submitted: &str) -> bool {
  submitted == question.answer()
}

pub fn is_complete(index: usize, total: usize) -> bool {
  index >= total
}
