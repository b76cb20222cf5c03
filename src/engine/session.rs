// src/engine/session.rs
//
// One play-through of a quiz: Question -> Feedback -> (Question | Result).
// The attempt is client-held state. Nothing here touches the database; a
// finished attempt hands out its submission payload exactly once and the
// caller decides what to do with it.

use std::fmt;
use std::time::{Duration, Instant};

use crate::engine::shuffle;
use crate::models::quiz::{AnswerOption, Question};
use crate::models::submission::SubmitScoreRequest;

/// Fixed answering window per question.
pub const QUESTION_TIME: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Question,
    Feedback,
    Result,
}

/// How the current question was resolved. At most one resolution exists
/// per question; whichever of selection and timeout lands first wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Answered { shuffled_index: usize, correct: bool },
    TimedOut,
}

#[derive(Debug, PartialEq, Eq)]
pub enum SessionError {
    /// A quiz with no questions cannot be played.
    EmptyQuiz,
    /// A question whose options or answer index are malformed.
    MalformedQuestion(usize),
    /// The requested action is not legal in the current phase.
    OutOfPhase,
    /// Selected option index outside the shuffled list.
    InvalidOption(usize),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::EmptyQuiz => write!(f, "quiz has no questions"),
            SessionError::MalformedQuestion(i) => write!(f, "question {} is malformed", i),
            SessionError::OutOfPhase => write!(f, "action not allowed in the current phase"),
            SessionError::InvalidOption(i) => write!(f, "option index {} out of range", i),
        }
    }
}

impl std::error::Error for SessionError {}

/// What the feedback screen shows: the correct option's fact, plus the
/// chosen option when the answer was wrong.
#[derive(Debug)]
pub struct FeedbackView<'a> {
    pub correct_option: &'a AnswerOption,
    pub chosen_option: Option<&'a AnswerOption>,
    pub was_correct: bool,
    pub timed_out: bool,
}

/// Ephemeral per-attempt state. Created when a user starts a quiz,
/// discarded after the result submission is handed out.
pub struct QuizAttempt {
    quiz_slug: String,
    questions: Vec<Question>,
    index: usize,
    phase: Phase,
    score: i64,
    resolution: Option<Resolution>,
    deadline: Instant,
    started: Instant,
    submitted: bool,
}

impl QuizAttempt {
    pub fn new(
        quiz_slug: impl Into<String>,
        questions: Vec<Question>,
        now: Instant,
    ) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::EmptyQuiz);
        }
        for (i, q) in questions.iter().enumerate() {
            if q.options.is_empty() || q.correct_index >= q.options.len() {
                return Err(SessionError::MalformedQuestion(i));
            }
        }

        Ok(Self {
            quiz_slug: quiz_slug.into(),
            questions,
            index: 0,
            phase: Phase::Question,
            score: 0,
            resolution: None,
            deadline: now + QUESTION_TIME,
            started: now,
            submitted: false,
        })
    }

    pub fn quiz_slug(&self) -> &str {
        &self.quiz_slug
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn question_index(&self) -> usize {
        self.index
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    pub fn current_question(&self) -> &Question {
        &self.questions[self.index]
    }

    /// Remaining time in the current answering window. The countdown is
    /// advisory; elapsed time is judged by wall-clock deltas, so a starved
    /// redraw loop cannot stretch the window.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.deadline.saturating_duration_since(now)
    }

    fn seed_key(&self) -> String {
        format!("{}:{}", self.quiz_slug, self.index)
    }

    /// The current question's options in display order, each paired with
    /// its source index. Stable across repeated calls.
    pub fn shuffled_options(&self) -> Vec<(usize, &AnswerOption)> {
        shuffle::shuffle(&self.current_question().options, &self.seed_key())
    }

    /// Display position of the correct option for the current question.
    pub fn shuffled_correct_index(&self) -> usize {
        let q = self.current_question();
        // The constructor validated correct_index, so the position exists.
        shuffle::shuffled_position(q.options.len(), q.correct_index, &self.seed_key())
            .unwrap_or(q.correct_index)
    }

    /// Resolves the current question as timed out when its deadline has
    /// passed. Returns whether a transition happened. No-op outside the
    /// Question phase, so a late tick cannot double-resolve.
    pub fn check_timeout(&mut self, now: Instant) -> bool {
        if self.phase != Phase::Question || now < self.deadline {
            return false;
        }
        self.resolution = Some(Resolution::TimedOut);
        self.phase = Phase::Feedback;
        true
    }

    /// Records an explicit selection by shuffled index. A selection landing
    /// after the deadline loses the race and scores as a timeout.
    pub fn select(&mut self, shuffled_index: usize, now: Instant) -> Result<Resolution, SessionError> {
        if self.phase != Phase::Question {
            return Err(SessionError::OutOfPhase);
        }
        if self.check_timeout(now) {
            return Ok(Resolution::TimedOut);
        }
        if shuffled_index >= self.current_question().options.len() {
            return Err(SessionError::InvalidOption(shuffled_index));
        }

        let correct = shuffled_index == self.shuffled_correct_index();
        if correct {
            self.score += 1;
        }
        let resolution = Resolution::Answered {
            shuffled_index,
            correct,
        };
        self.resolution = Some(resolution);
        self.phase = Phase::Feedback;
        Ok(resolution)
    }

    pub fn resolution(&self) -> Option<Resolution> {
        self.resolution
    }

    /// Feedback for the resolved question. `None` outside the Feedback phase.
    pub fn feedback(&self) -> Option<FeedbackView<'_>> {
        if self.phase != Phase::Feedback {
            return None;
        }
        let q = self.current_question();
        let correct_option = &q.options[q.correct_index];

        match self.resolution? {
            Resolution::TimedOut => Some(FeedbackView {
                correct_option,
                chosen_option: None,
                was_correct: false,
                timed_out: true,
            }),
            Resolution::Answered {
                shuffled_index,
                correct,
            } => {
                let shuffled = self.shuffled_options();
                let chosen = shuffled.get(shuffled_index).map(|&(src, _)| &q.options[src]);
                Some(FeedbackView {
                    correct_option,
                    chosen_option: if correct { None } else { chosen },
                    was_correct: correct,
                    timed_out: false,
                })
            }
        }
    }

    /// The single "continue" action of the Feedback phase: move to the next
    /// question, or to the terminal Result once all questions are resolved.
    pub fn advance(&mut self, now: Instant) -> Result<Phase, SessionError> {
        if self.phase != Phase::Feedback {
            return Err(SessionError::OutOfPhase);
        }

        if self.index + 1 >= self.questions.len() {
            self.phase = Phase::Result;
        } else {
            self.index += 1;
            self.resolution = None;
            self.deadline = now + QUESTION_TIME;
            self.phase = Phase::Question;
        }

        Ok(self.phase)
    }

    /// One-shot submission latch. Hands out the payload the first time it
    /// is called in the Result phase and never again, so re-rendering the
    /// result screen cannot resubmit.
    pub fn finish(&mut self, now: Instant) -> Option<SubmitScoreRequest> {
        if self.phase != Phase::Result || self.submitted {
            return None;
        }
        self.submitted = true;

        Some(SubmitScoreRequest {
            quiz_id: self.quiz_slug.clone(),
            correct: self.score,
            total: self.questions.len() as i64,
            time_spent: now.saturating_duration_since(self.started).as_secs() as i64,
        })
    }
}
