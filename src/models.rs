//! Data records scraped off Futpédia's pages.
//!
//! Records are plain value types and are never mutated once built; a
//! cache refresh replaces the stored instance. Identifiers are the slugs
//! the site itself addresses pages with, so the same entity always maps
//! to the same id.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

/// A championship as listed on the site's landing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Championship {
    pub id: String,
    pub name: String,
    pub path: String,
}

impl Championship {
    /// Site path of the championship page for a given slug.
    pub fn path_for(slug: &str) -> String {
        format!("/campeonato/{slug}")
    }
}

/// One edition of a championship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Season {
    pub championship_id: String,
    pub id: String,
    pub year: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub goals: u32,
    pub games_played: u32,
    pub games_total: u32,
    pub status: SeasonStatus,
    pub path: String,
}

/// A team as listed on the site-wide team index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub path: String,
    pub crest: Option<String>,
}

/// A single fixture of a season.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    pub season_path: String,
    pub round: Option<u32>,
    pub date: NaiveDateTime,
    pub home_team: String,
    pub away_team: String,
    pub score: Option<Score>,
    pub stadium: Option<String>,
    pub phase: GamePhase,
    pub path: String,
}

/// Final score of a played game. Unplayed fixtures carry no score at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub home: u32,
    pub away: u32,
}

/// Stage of the competition a game belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    FirstPhase,
    BestOf16,
    Quarterfinals,
    Semifinals,
    Finals,
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GamePhase::FirstPhase => "first_phase",
            GamePhase::BestOf16 => "best_of_16",
            GamePhase::Quarterfinals => "quarterfinals",
            GamePhase::Semifinals => "semifinals",
            GamePhase::Finals => "finals",
        };
        f.write_str(name)
    }
}

/// How much of a season's data is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeasonStatus {
    Scheduled,
    InProgress,
    Finished,
}

impl SeasonStatus {
    /// Availability is read off the played/total counts published with
    /// each edition, never off the wall clock.
    pub fn from_counts(played: u32, total: u32) -> Self {
        if played == 0 {
            SeasonStatus::Scheduled
        } else if played < total {
            SeasonStatus::InProgress
        } else {
            SeasonStatus::Finished
        }
    }
}

impl fmt::Display for SeasonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SeasonStatus::Scheduled => "scheduled",
            SeasonStatus::InProgress => "in_progress",
            SeasonStatus::Finished => "finished",
        };
        f.write_str(name)
    }
}

/// Row conversion for records handed back in bulk.
pub trait Tabular {
    fn columns() -> &'static [&'static str];
    fn row(&self) -> Vec<String>;
}

/// Ordered rows-and-columns structure assembled from scraped records.
///
/// Row order preserves the order records appeared on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    /// Builds a table out of records of one kind.
    pub fn from_records<T: Tabular>(records: &[T]) -> Self {
        Self {
            columns: T::columns().iter().map(|c| c.to_string()).collect(),
            rows: records.iter().map(Tabular::row).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(
            self.rows
                .iter()
                .filter_map(|row| row.get(idx))
                .map(String::as_str)
                .collect(),
        )
    }
}

impl Tabular for Championship {
    fn columns() -> &'static [&'static str] {
        &["id", "name", "path"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.id.clone(), self.name.clone(), self.path.clone()]
    }
}

impl Tabular for Season {
    fn columns() -> &'static [&'static str] {
        &[
            "championship",
            "id",
            "year",
            "start_date",
            "end_date",
            "goals",
            "games_played",
            "games_total",
            "status",
            "path",
        ]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.championship_id.clone(),
            self.id.clone(),
            self.year.to_string(),
            self.start_date.to_string(),
            self.end_date.to_string(),
            self.goals.to_string(),
            self.games_played.to_string(),
            self.games_total.to_string(),
            self.status.to_string(),
            self.path.clone(),
        ]
    }
}

impl Tabular for Team {
    fn columns() -> &'static [&'static str] {
        &["id", "name", "path", "crest"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.path.clone(),
            self.crest.clone().unwrap_or_default(),
        ]
    }
}

impl Tabular for Game {
    fn columns() -> &'static [&'static str] {
        &[
            "season",
            "round",
            "date",
            "home_team",
            "home_goals",
            "away_goals",
            "away_team",
            "stadium",
            "phase",
            "path",
        ]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.season_path.clone(),
            self.round.map(|r| r.to_string()).unwrap_or_default(),
            self.date.format("%Y-%m-%d %H:%M").to_string(),
            self.home_team.clone(),
            self.score.map(|s| s.home.to_string()).unwrap_or_default(),
            self.score.map(|s| s.away.to_string()).unwrap_or_default(),
            self.away_team.clone(),
            self.stadium.clone().unwrap_or_default(),
            self.phase.to_string(),
            self.path.clone(),
        ]
    }
}
