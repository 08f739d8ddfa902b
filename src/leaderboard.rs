//! Leaderboard view: raw sheet cells to a sorted display list.
//!
//! Rows are never dropped for a bad score; unreadable scores count as 0.
//! Order is score descending, then name ascending (byte-wise, so
//! case-sensitive). Duplicate names are all kept.

use serde_json::Value;

use crate::domain::LeaderboardEntry;

/// One data row as the store returns it: `[Name, Score, ...]`.
pub type RawRow = Vec<Value>;

/// Coerce a score cell. Integral numbers and integral-looking strings pass;
/// everything else (text, blanks, negatives, fractions, NaN) is 0.
pub fn coerce_score(cell: Option<&Value>) -> u32 {
  match cell {
    Some(Value::Number(n)) => {
      if let Some(u) = n.as_u64() {
        u32::try_from(u).unwrap_or(u32::MAX)
      } else {
        n.as_f64().map(float_score).unwrap_or(0)
      }
    }
    Some(Value::String(s)) => {
      let s = s.trim();
      s.parse::<u32>()
        .ok()
        .or_else(|| s.parse::<f64>().ok().map(float_score))
        .unwrap_or(0)
    }
    _ => 0,
  }
}

fn float_score(f: f64) -> u32 {
  if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 {
    f as u32
  } else {
    0
  }
}

fn name_cell(cell: Option<&Value>) -> String {
  match cell {
    Some(Value::String(s)) => s.clone(),
    Some(Value::Null) | None => String::new(),
    Some(other) => other.to_string(),
  }
}

/// Turn raw data rows (header already removed) into entries.
pub fn entries_from_rows(rows: &[RawRow]) -> Vec<LeaderboardEntry> {
  rows
    .iter()
    .map(|r| LeaderboardEntry::new(name_cell(r.first()), coerce_score(r.get(1))))
    .collect()
}

/// Sorted copy of `rows`; the input is left untouched.
pub fn render(rows: &[LeaderboardEntry]) -> Vec<LeaderboardEntry> {
  let mut out = rows.to_vec();
  out.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.name.cmp(&b.name)));
  out
}
