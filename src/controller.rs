//! Page controller shared by the HTTP and WebSocket handlers.
//!
//! One call to `handle_event` is one render pass: apply the event to the
//! session (`advance`), then draw the page for the resulting phase
//! (`render`). The leaderboard append lives in `advance` and runs only on
//! `Transition::Completed`, so re-rendering a finished quiz never writes
//! again.

use tracing::{info, instrument, warn};

use crate::domain::{Feedback, Phase, Submission};
use crate::leaderboard;
use crate::protocol::{Block, ClientEvent, Page};
use crate::session::{SessionState, Transition};
use crate::state::AppState;

const EMPTY_LEADERBOARD: &str = "No scores have been submitted yet. Be the first to play!";

#[instrument(level = "info", skip(state, session), fields(event = event.name(), phase = %session.phase()))]
pub async fn handle_event(state: &AppState, session: &mut SessionState, event: ClientEvent) -> Page {
  let notice = advance(state, session, event).await;
  render(state, session, notice).await
}

/// Compute the next state. Returns a notice to show on this render, if any.
async fn advance(state: &AppState, session: &mut SessionState, event: ClientEvent) -> Option<Block> {
  let outcome = match event {
    ClientEvent::View => Ok(Transition::Ignored),
    ClientEvent::StartQuiz { name } => session.start(&name, state.questions.len()),
    ClientEvent::SubmitAnswer { option } => session.answer(&state.questions, &option),
    ClientEvent::PlayAgain => Ok(session.restart()),
  };

  match outcome {
    Ok(Transition::Completed { score, .. }) => {
      info!(target: "quiz", player = %session.player_name, score, total = state.questions.len(), "Quiz completed");
      let submission = match state.leaderboard.append(&session.player_name, score).await {
        Ok(()) => Submission::Stored,
        Err(e) => Submission::Failed(e.to_string()),
      };
      session.last_submission = Some(submission);
      None
    }
    Ok(Transition::Started) => {
      info!(target: "quiz", player = %session.player_name, "Quiz started");
      None
    }
    Ok(_) => None,
    Err(e) => {
      warn!(target: "quiz", error = %e, "Event rejected");
      Some(Block::Warning { text: e.to_string() })
    }
  }
}

/// Draw the current phase. Only consumes one-shot feedback; never writes to the store.
async fn render(state: &AppState, session: &mut SessionState, notice: Option<Block>) -> Page {
  let phase = session.phase();
  let blocks = match phase {
    Phase::NotStarted => render_intro(state, notice),
    Phase::InProgress | Phase::Completed => {
      let mut b = render_quiz(state, session, notice);
      b.extend(render_leaderboard(state).await);
      b
    }
  };
  Page { phase, blocks }
}

fn render_intro(state: &AppState, notice: Option<Block>) -> Vec<Block> {
  let intro = &state.intro;
  let mut b = vec![
    Block::Title { text: "Kandersteg Trivia Challenge! 🏔️".into() },
    Block::Header { text: "Help send our scout group to Switzerland!".into() },
    Block::Image { url: intro.image_url.clone(), caption: intro.image_caption.clone() },
    Block::Text {
      text: "Welcome to the Kandersteg Trivia Challenge! To help our scouts fund their trip to the amazing \
             Kandersteg International Scout Centre in Switzerland, we're asking for a small donation to \
             participate in this fun quiz.\n\nTest your knowledge of scouting, Switzerland, and Kandersteg, \
             and see if you can make it to the top of our leaderboard!"
        .into(),
    },
    Block::Info {
      text: "Donations are handled through a secure PayPal link managed by the scout group. \
             Your contribution is greatly appreciated!"
        .into(),
    },
    Block::LinkButton { label: "Donate and Start the Quiz!".into(), url: intro.donation_url.clone() },
    Block::Divider,
    Block::Text { text: "Already donated? Enter your name below to play!".into() },
  ];
  b.extend(notice);
  b.push(Block::NameForm { label: "Enter your name to play:".into(), submit: "Start Quiz".into() });
  b
}

fn render_quiz(state: &AppState, session: &mut SessionState, notice: Option<Block>) -> Vec<Block> {
  let total = state.questions.len();
  let mut b = Vec::new();

  match session.take_feedback() {
    Some(Feedback::Correct) => b.push(Block::Success { text: "Correct!".into() }),
    Some(Feedback::Incorrect { expected }) => b.push(Block::Error {
      text: format!("Incorrect. The correct answer was: {}", expected),
    }),
    None => {}
  }

  match state.questions.get(session.current_question_index).filter(|_| !session.quiz_completed) {
    Some(q) => {
      b.push(Block::Title { text: format!("Welcome, {}!", session.player_name) });
      b.push(Block::Subheader { text: "Quiz Time!".into() });
      b.extend(notice);
      b.push(Block::Markdown {
        text: format!("**Question {}:** {}", session.current_question_index + 1, q.prompt()),
      });
      b.push(Block::RadioForm {
        form_id: format!("q_form_{}", session.current_question_index),
        label: "Choose your answer:".into(),
        options: q.options().to_vec(),
        submit: "Submit Answer".into(),
      });
    }
    None => {
      b.push(Block::Title { text: "Quiz Finished! 🎉".into() });
      b.push(Block::Markdown { text: format!("Your final score is: **{} / {}**", session.score, total) });
      b.push(Block::Text { text: "Congratulations! Thank you for playing and supporting our trip.".into() });
      match &session.last_submission {
        Some(Submission::Stored) => b.push(Block::Success { text: "Your score has been added to the leaderboard!".into() }),
        Some(Submission::Failed(msg)) => b.push(Block::Error {
          text: format!("We couldn't save your score to the leaderboard: {}", msg),
        }),
        None => {}
      }
      b.extend(notice);
      b.push(Block::Button { label: "Play again".into(), event: "play_again".into() });
    }
  }
  b
}

/// Leaderboard section. Read failures degrade to a warning and the empty placeholder.
async fn render_leaderboard(state: &AppState) -> Vec<Block> {
  let mut b = vec![Block::Divider, Block::Subheader { text: "Leaderboard 🏆".into() }];
  let rows = match state.leaderboard.load_all().await {
    Ok(rows) => rows,
    Err(_) => {
      b.push(Block::Warning { text: "The leaderboard is unavailable right now.".into() });
      Vec::new()
    }
  };
  if rows.is_empty() {
    b.push(Block::Placeholder { text: EMPTY_LEADERBOARD.into() });
  } else {
    b.push(Block::Table {
      columns: vec!["Name".into(), "Score".into()],
      rows: leaderboard::render(&rows),
    });
  }
  b
}
