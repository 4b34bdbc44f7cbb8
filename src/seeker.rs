//! Locating the raw excerpts of interest inside Futpédia's pages.
//!
//! Seekers only cut the minimal fragment a parser needs out of a page;
//! they never build records themselves. Fragments are returned in the
//! order they appear in the document.

use std::fmt;

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::debug;

use crate::error::{Result, ScrapediaError};

/// The kinds of data the scraper knows how to pull off the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Championships,
    Seasons,
    Teams,
    Games,
    Status,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Championships => "championship-list",
            TargetKind::Seasons => "season-list",
            TargetKind::Teams => "team-list",
            TargetKind::Games => "game-list",
            TargetKind::Status => "season-status",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw excerpts for a season's games, tagged with the page layout they
/// were found in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameFragments {
    /// Round-robin season laid out as a table of fixture rows.
    Table { rows: Vec<String> },
    /// Round-robin first phase followed by a knockout bracket.
    Playoffs {
        rows: Vec<String>,
        ties: Vec<String>,
        headings: Vec<String>,
    },
    /// Round-robin season laid out as a list fed by inline JSON.
    List { games: String, teams: String },
}

static SCRIPT: Lazy<Selector> = Lazy::new(|| Selector::parse("script").unwrap());
static CHAMPIONSHIP_SCRIPT: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"script[type="text/javascript"][language="javascript"][charset="utf-8"]"#)
        .unwrap()
});
static TEAM_ITEM: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"li[itemprop="itemListElement"]"#).unwrap());
static GAME_TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("div#lista-jogos").unwrap());
static GAME_ROW: Lazy<Selector> =
    Lazy::new(|| Selector::parse("li.lista-classificacao-jogo").unwrap());
static GAME_LIST: Lazy<Selector> = Lazy::new(|| Selector::parse("table#tabela-jogos").unwrap());
static BRACKET_GROUP: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.tabela-classificacao-mata-mata-grupado").unwrap());
static BRACKET_TIE: Lazy<Selector> = Lazy::new(|| Selector::parse("div.chave").unwrap());
static PHASE_HEADING: Lazy<Selector> = Lazy::new(|| Selector::parse("h3").unwrap());

/// Finds the championships JSON embedded on the landing page.
pub fn seek_championships(content: &str) -> Result<String> {
    let document = Html::parse_document(content);
    let script = document
        .select(&CHAMPIONSHIP_SCRIPT)
        .map(|el| el.text().collect::<String>())
        .find(|text| text.contains("[{"))
        .ok_or_else(|| not_found(TargetKind::Championships, "landing page script"))?;

    excerpt(&script, "[{", "}]", TargetKind::Championships)
}

/// Finds the editions JSON embedded on a championship page.
pub fn seek_seasons(content: &str) -> Result<String> {
    let document = Html::parse_document(content);
    let script = document
        .select(&SCRIPT)
        .map(|el| el.text().collect::<String>())
        .find(|text| text.contains("static_host"))
        .ok_or_else(|| not_found(TargetKind::Seasons, "championship page script"))?;

    excerpt(&script, "{\"campeonato\":", "}]}", TargetKind::Seasons)
}

/// Availability data sits in the same editions excerpt the seasons come
/// from, so this only retags the failure kind.
pub fn seek_status(content: &str) -> Result<String> {
    match seek_seasons(content) {
        Ok(fragment) => Ok(fragment),
        Err(ScrapediaError::NotFound { context, .. }) => Err(ScrapediaError::NotFound {
            kind: TargetKind::Status,
            context,
        }),
        Err(other) => Err(other),
    }
}

/// Collects the team list items off the site-wide index.
pub fn seek_teams(content: &str) -> Result<Vec<String>> {
    let document = Html::parse_document(content);
    let items: Vec<String> = document.select(&TEAM_ITEM).map(|el| el.html()).collect();

    if items.is_empty() {
        return Err(not_found(TargetKind::Teams, "team index list items"));
    }
    Ok(items)
}

/// Detects which of the three season page layouts is present and pulls
/// the matching excerpts.
pub fn seek_games(content: &str) -> Result<GameFragments> {
    let document = Html::parse_document(content);

    let has_table = document.select(&GAME_TABLE).next().is_some();
    let has_bracket = document.select(&BRACKET_GROUP).next().is_some();

    if has_table && has_bracket {
        // Round-robin first phase with a knockout stage on the same page.
        let rows = collect_html(&document, &GAME_ROW);
        let ties = collect_html(&document, &BRACKET_TIE);
        let headings = document
            .select(&BRACKET_GROUP)
            .flat_map(|group| group.select(&PHASE_HEADING))
            .map(|h| h.text().collect::<String>().trim().to_string())
            .collect::<Vec<_>>();
        debug!(
            rows = rows.len(),
            ties = ties.len(),
            "season page holds a table plus a bracket"
        );
        return Ok(GameFragments::Playoffs {
            rows,
            ties,
            headings,
        });
    }

    if has_table {
        let rows = collect_html(&document, &GAME_ROW);
        debug!(rows = rows.len(), "season page holds a fixture table");
        return Ok(GameFragments::Table { rows });
    }

    if document.select(&GAME_LIST).next().is_some() {
        let script = document
            .select(&SCRIPT)
            .map(|el| el.text().collect::<String>())
            .find(|text| text.contains("JOGOS:"))
            .ok_or_else(|| not_found(TargetKind::Games, "season page fixtures script"))?;

        let games = list_excerpt(&script, "JOGOS:", "}],")?;
        let teams = list_excerpt(&script, "EQUIPES:", "}},")?;
        debug!("season page holds a fixture list");
        return Ok(GameFragments::List { games, teams });
    }

    Err(not_found(TargetKind::Games, "season page game listings"))
}

fn collect_html(document: &Html, selector: &Selector) -> Vec<String> {
    document.select(selector).map(|el| el.html()).collect()
}

/// Cuts `text` from the first `open` up to and including the first
/// `close` after it.
fn excerpt(text: &str, open: &str, close: &str, kind: TargetKind) -> Result<String> {
    let start = text
        .find(open)
        .ok_or_else(|| not_found(kind, "script excerpt start marker"))?;
    let body = &text[start..];
    let end = body
        .find(close)
        .ok_or_else(|| not_found(kind, "script excerpt end marker"))?;
    Ok(body[..end + close.len()].to_string())
}

/// Pulls one JSON value out of the fixtures script: the value starts at
/// the first bracket after `marker` and runs up to `close`, whose
/// trailing comma is dropped.
fn list_excerpt(script: &str, marker: &str, close: &str) -> Result<String> {
    let at = script
        .find(marker)
        .ok_or_else(|| not_found(TargetKind::Games, "fixtures script excerpt"))?;
    let rest = &script[at + marker.len()..];
    let open = rest
        .find(['[', '{'])
        .ok_or_else(|| not_found(TargetKind::Games, "fixtures script excerpt"))?;
    let body = &rest[open..];
    let end = body
        .find(close)
        .ok_or_else(|| not_found(TargetKind::Games, "fixtures script excerpt"))?;
    Ok(body[..end + close.len() - 1].to_string())
}

fn not_found(kind: TargetKind, context: &str) -> ScrapediaError {
    ScrapediaError::NotFound {
        kind,
        context: context.to_string(),
    }
}
