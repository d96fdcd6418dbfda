use serde::{Deserialize, Serialize};
use std::fmt;

pub type Score = i64;

/// Difficulty tier used as the leaderboard sort key.
///
/// Unrecognized codes and names resolve to [`Metric::Easy`]. This is the
/// product default, not an error path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Easy, Metric::Medium, Metric::Hard];

    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Easy,
            1 => Self::Medium,
            2 => Self::Hard,
            _ => Self::Easy,
        }
    }

    /// Accepts `easy`/`medium`/`hard` in any case, or the numeric code as text.
    pub fn from_name(name: &str) -> Self {
        let name = name.trim();
        if let Ok(code) = name.parse::<i64>() {
            return Self::from_code(code);
        }
        match name.to_ascii_lowercase().as_str() {
            "easy" => Self::Easy,
            "medium" => Self::Medium,
            "hard" => Self::Hard,
            _ => Self::Easy,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Self::Easy => 0,
            Self::Medium => 1,
            Self::Hard => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One score per metric. Missing entries deserialize as 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Scores {
    pub easy: Score,
    pub medium: Score,
    pub hard: Score,
}

impl Scores {
    pub fn new(easy: Score, medium: Score, hard: Score) -> Self {
        Self { easy, medium, hard }
    }

    pub fn get(&self, metric: Metric) -> Score {
        match metric {
            Metric::Easy => self.easy,
            Metric::Medium => self.medium,
            Metric::Hard => self.hard,
        }
    }

    pub fn set(&mut self, metric: Metric, score: Score) {
        match metric {
            Metric::Easy => self.easy = score,
            Metric::Medium => self.medium = score,
            Metric::Hard => self.hard = score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserScoreRecord {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    /// Avatar URL; empty when the user has none.
    #[serde(default)]
    pub picture_url: String,
    #[serde(default)]
    pub scores: Scores,
}

impl UserScoreRecord {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            picture_url: String::new(),
            scores: Scores::default(),
        }
    }

    pub fn with_picture_url(mut self, url: impl Into<String>) -> Self {
        self.picture_url = url.into();
        self
    }

    pub fn with_score(mut self, metric: Metric, score: Score) -> Self {
        self.scores.set(metric, score);
        self
    }

    pub fn score(&self, metric: Metric) -> Score {
        self.scores.get(metric)
    }

    pub fn has_picture(&self) -> bool {
        !self.picture_url.is_empty()
    }
}
