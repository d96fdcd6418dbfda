use std::fmt;
use std::sync::Arc;

use score_schema::{Metric, UserScoreRecord};

use crate::enrichment::{Generation, ImageState};

pub const PLACEHOLDER_TEXT: &str = "-";

/// Medal shown in place of the rank number for the top three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RankBadge(u8);

impl RankBadge {
    /// Badge for an absolute rank, if that rank earns one.
    pub fn for_rank(rank: usize) -> Option<Self> {
        match rank {
            1..=3 => Some(Self(rank as u8)),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RankDisplay {
    Badge(RankBadge),
    Text(String),
}

impl RankDisplay {
    /// Badges hide the numeric text.
    pub fn text(&self) -> &str {
        match self {
            Self::Badge(_) => "",
            Self::Text(text) => text,
        }
    }

    pub fn badge(&self) -> Option<RankBadge> {
        match self {
            Self::Badge(badge) => Some(*badge),
            Self::Text(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardRow {
    /// 1-based position across all pages.
    pub rank: usize,
    pub record: Option<Arc<UserScoreRecord>>,
    pub rank_display: RankDisplay,
    pub name_text: String,
    pub score_text: String,
    pub image: ImageState,
}

impl LeaderboardRow {
    pub(crate) fn new(
        page_index: usize,
        rank: usize,
        record: Option<Arc<UserScoreRecord>>,
        metric: Metric,
    ) -> Self {
        let rank_display = match RankBadge::for_rank(rank).filter(|_| page_index == 0) {
            Some(badge) => RankDisplay::Badge(badge),
            None => RankDisplay::Text(rank.to_string()),
        };

        let (name_text, score_text) = match &record {
            Some(record) => (record.display_name.clone(), record.score(metric).to_string()),
            None => (PLACEHOLDER_TEXT.to_string(), PLACEHOLDER_TEXT.to_string()),
        };

        Self {
            rank,
            record,
            rank_display,
            name_text,
            score_text,
            image: ImageState::NoImage,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.record.is_none()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.record.as_deref().map(|record| record.id.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YourRank {
    LoginPrompt,
    Ranked(usize),
    /// Logged in, but the user has no record in the store.
    Unranked,
}

impl fmt::Display for YourRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoginPrompt => f.write_str("Login to compare your highscore."),
            Self::Ranked(rank) => write!(f, "Your Rank: #{rank}"),
            Self::Unranked => f.write_str("Unranked"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardPage {
    pub page_index: usize,
    pub metric: Metric,
    pub generation: Generation,
    pub rows: Vec<LeaderboardRow>,
    pub your_rank: YourRank,
}

impl LeaderboardPage {
    pub(crate) fn empty() -> Self {
        Self {
            page_index: 0,
            metric: Metric::default(),
            generation: Generation::default(),
            rows: Vec::new(),
            your_rank: YourRank::LoginPrompt,
        }
    }

    pub fn difficulty_label(&self) -> &'static str {
        self.metric.label()
    }

    pub fn row(&self, index: usize) -> Option<&LeaderboardRow> {
        self.rows.get(index)
    }

    pub fn filled_rows(&self) -> impl Iterator<Item = &LeaderboardRow> {
        self.rows.iter().filter(|row| !row.is_placeholder())
    }
}
