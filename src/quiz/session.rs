use std::time::Duration;

use uuid::Uuid;

use super::question::{sanitize, Question, SKIP_LABEL};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    InProgress,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// The skip option. Score untouched.
    Neutral,
    Correct,
    Wrong { correct: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub score: i64,
    pub average_seconds: f64,
    pub total_questions: usize,
}

/// One playthrough over a snapshot of the bank.
#[derive(Debug, Clone)]
pub struct QuizSession {
    id: Uuid,
    questions: Vec<Question>,
    current: usize,
    score: i64,
    times: Vec<Duration>,
    answered: bool,
}

impl QuizSession {
    /// Starts a fresh session. An empty question list yields a session that
    /// is already finished.
    pub fn start(questions: Vec<Question>) -> Self {
        let session = Self {
            id: Uuid::new_v4(),
            questions,
            current: 0,
            score: 0,
            times: Vec::new(),
            answered: false,
        };
        log::debug!("Session {} started with {} questions", session.id, session.total());
        session
    }

    pub fn id(&self) -> &Uuid {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        if self.current < self.questions.len() {
            SessionState::InProgress
        } else {
            SessionState::Finished
        }
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn position(&self) -> (usize, usize) {
        let total = self.total();
        ((self.current + 1).min(total), total)
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn times(&self) -> &[Duration] {
        &self.times
    }

    pub fn is_answered(&self) -> bool {
        self.answered
    }

    /// Scores `chosen` against the current question.
    ///
    /// Returns `None` when the current question was already answered or the
    /// session is finished. The session does not move on by itself; call
    /// [`QuizSession::advance`] once feedback has been shown.
    pub fn submit_answer(&mut self, chosen: &str, elapsed: Duration) -> Option<AnswerOutcome> {
        if self.answered {
            log::debug!("Session {}: question {} already answered", self.id, self.current);
            return None;
        }
        let correct = self.current_question()?.correct().to_owned();

        self.answered = true;
        self.times.push(elapsed);

        let chosen = sanitize(chosen);
        let outcome = if chosen.eq_ignore_ascii_case(SKIP_LABEL) {
            AnswerOutcome::Neutral
        } else if !correct.is_empty() && chosen == correct {
            self.score += 1;
            AnswerOutcome::Correct
        } else {
            self.score -= 1;
            AnswerOutcome::Wrong { correct }
        };

        log::debug!(
            "Session {}: question {} answered {:?} in {:?}, score {}",
            self.id,
            self.current,
            outcome,
            elapsed,
            self.score
        );
        Some(outcome)
    }

    /// Moves to the next question. Only the first call after an answer has
    /// any effect.
    pub fn advance(&mut self) -> SessionState {
        if self.answered {
            self.answered = false;
            self.current += 1;
        }
        self.state()
    }

    pub fn average_time_seconds(&self) -> f64 {
        if self.times.is_empty() {
            return 0.0;
        }
        let total: Duration = self.times.iter().sum();
        total.as_secs_f64() / self.times.len() as f64
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            score: self.score,
            average_seconds: self.average_time_seconds(),
            total_questions: self.total(),
        }
    }
}
