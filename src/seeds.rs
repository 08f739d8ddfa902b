//! Built-in question bank and default intro content.

use tracing::error;

use crate::domain::Question;

const QUESTION_BANK: &[(&str, &[&str], &str)] = &[
  (
    "What country is Kandersteg located in?",
    &["Germany", "Switzerland", "France", "Austria"],
    "Switzerland",
  ),
  (
    "What is the highest peak in the Swiss Alps?",
    &["Mont Blanc", "Matterhorn", "Monte Rosa", "Jungfrau"],
    "Monte Rosa",
  ),
];

pub const DEFAULT_DONATION_URL: &str = "https://www.paypal.com/donate?campaign_id=UJM5RGT9FMXGN";
pub const DEFAULT_IMAGE_URL: &str = "https://github.com/Kim2783/Kandersteg/blob/main/scouts%20jpeg.jpg";
pub const DEFAULT_IMAGE_CAPTION: &str = "Your scout group photo here.";

/// The fixed, ordered quiz. Malformed entries are logged and skipped.
pub fn seed_questions() -> Vec<Question> {
  QUESTION_BANK
    .iter()
    .filter_map(|(prompt, options, answer)| match Question::new(*prompt, options.iter().copied(), *answer) {
      Ok(q) => Some(q),
      Err(e) => {
        error!(target: "quiz", %prompt, error = %e, "Skipping malformed built-in question");
        None
      }
    })
    .collect()
}
