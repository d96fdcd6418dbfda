use std::fmt::Write;

use leaderboard_core::enrichment::ImageState;
use leaderboard_core::view::page::{LeaderboardPage, LeaderboardRow, RankDisplay};

pub fn render_page(page: &LeaderboardPage) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Difficulty: {}", page.difficulty_label());
    for row in &page.rows {
        let _ = writeln!(out, "{}", render_row(row));
    }
    let _ = writeln!(out, "{}", page.your_rank);
    out
}

pub fn render_row(row: &LeaderboardRow) -> String {
    let rank = match &row.rank_display {
        RankDisplay::Badge(badge) => format!("[{}]", badge.id()),
        RankDisplay::Text(text) => text.clone(),
    };
    format!(
        "{} | {} | {} | {}",
        rank,
        row.name_text,
        row.score_text,
        render_image(&row.image)
    )
}

pub fn render_image(image: &ImageState) -> String {
    match image.image() {
        Some(asset) => format!("img({}B)", asset.len()),
        None if image.is_pending() => "pending".to_string(),
        None => "-".to_string(),
    }
}
