// src/engine/scoring.rs
//
// Pure scoring arithmetic: point awards, level derivation and the
// weekly/monthly window rollover. The database read-modify-write lives in
// handlers::scores; everything here is side-effect free.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// Denormalized tier derived from a user's all-time points.
/// Boundaries are inclusive on the lower bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Level {
    Amateur,
    Professional,
    WorldClass,
    #[serde(rename = "GOAT")]
    Goat,
}

impl Level {
    pub fn from_points(total_points: i64) -> Self {
        if total_points >= 15000 {
            Level::Goat
        } else if total_points >= 5000 {
            Level::WorldClass
        } else if total_points >= 1000 {
            Level::Professional
        } else {
            Level::Amateur
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Amateur => "Amateur",
            Level::Professional => "Professional",
            Level::WorldClass => "WorldClass",
            Level::Goat => "GOAT",
        }
    }
}

/// Points for a submission: correct answers times the quiz-level constant.
/// The constant comes from quiz configuration, never from the submission.
pub fn points_awarded(correct_count: i64, points_per_correct: i64) -> i64 {
    correct_count.max(0) * points_per_correct.max(0)
}

/// ISO-week window key, e.g. "2024-W10". Uses the ISO week-numbering year,
/// which can differ from the calendar year around new year.
pub fn weekly_key(at: DateTime<Utc>) -> String {
    let iso = at.iso_week();
    format!("{}-W{:02}", iso.year(), iso.week())
}

/// Calendar-month window key, e.g. "2024-03".
pub fn monthly_key(at: DateTime<Utc>) -> String {
    format!("{:04}-{:02}", at.year(), at.month())
}

/// A user's running totals, detached from the database row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    pub total_points: i64,
    pub weekly_points: i64,
    pub monthly_points: i64,
    pub weekly_key: String,
    pub monthly_key: String,
    pub level: Level,
}

/// Applies one award to a standing: roll windows whose stored key differs
/// from the current one, add the points everywhere, re-derive the level.
/// `total_points` never resets.
pub fn apply_award(mut standing: Standing, points: i64, at: DateTime<Utc>) -> Standing {
    let week = weekly_key(at);
    let month = monthly_key(at);

    if standing.weekly_key != week {
        standing.weekly_points = 0;
        standing.weekly_key = week;
    }
    if standing.monthly_key != month {
        standing.monthly_points = 0;
        standing.monthly_key = month;
    }

    standing.total_points += points;
    standing.weekly_points += points;
    standing.monthly_points += points;
    standing.level = Level::from_points(standing.total_points);

    standing
}
