//! Turning raw page excerpts into typed records.
//!
//! Parsers are pure: the same fragment always yields the same records.
//! Wire field names stay in Portuguese at the deserialization boundary,
//! matching what the site embeds in its pages.

use std::collections::{HashMap, VecDeque};

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;

use crate::error::{Result, ScrapediaError};
use crate::models::{Championship, Game, GamePhase, Score, Season, SeasonStatus, Team};
use crate::seeker::{GameFragments, TargetKind};

/// Aggregate entry the site lists alongside real championships. Its page
/// has none of the known layouts, so it is filtered out up front.
const UNIFIED_CHAMPIONSHIP: &str = "Brasileiro Unificado";

static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());
static CREST: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());
static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("li.lista-classificacao-jogo").unwrap());
static HOME_META: Lazy<Selector> = Lazy::new(|| Selector::parse("div.time.mandante meta").unwrap());
static AWAY_META: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.time.visitante meta").unwrap());
static HOME_GOALS: Lazy<Selector> = Lazy::new(|| Selector::parse("span.mandante.font-face").unwrap());
static AWAY_GOALS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span.visitante.font-face").unwrap());
static STADIUM: Lazy<Selector> = Lazy::new(|| Selector::parse(r#"span[itemprop="name"]"#).unwrap());
static KICKOFF: Lazy<Selector> = Lazy::new(|| Selector::parse("span.horario").unwrap());
static MATCH_DATE: Lazy<Selector> = Lazy::new(|| Selector::parse("time").unwrap());
static TIE_HOME: Lazy<Selector> = Lazy::new(|| Selector::parse("div.mandante").unwrap());
static TIE_AWAY: Lazy<Selector> = Lazy::new(|| Selector::parse("div.visitante").unwrap());
static LEG_ONE: Lazy<Selector> = Lazy::new(|| Selector::parse("div.jogo_ida.dados").unwrap());
static LEG_TWO: Lazy<Selector> = Lazy::new(|| Selector::parse("div.jogo_volta.dados").unwrap());
static LEG_THREE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.terceiro_jogo.dados").unwrap());
static LEG_CONTENT: Lazy<Selector> = Lazy::new(|| Selector::parse("div.content").unwrap());
static LEG_STADIUM: Lazy<Selector> = Lazy::new(|| Selector::parse("strong").unwrap());
static PLACAR: Lazy<Selector> = Lazy::new(|| Selector::parse("span.placar").unwrap());

/// Picks the match date and kickoff hour out of a bracket leg's free
/// text, e.g. "Qua 22/11/2017 - 21h45".
static LEG_SCHEDULE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2}/\d{1,2}/\d{4}).*?(\d{1,2}h\d{2})").unwrap());

#[derive(Debug, Deserialize)]
struct ChampionshipWire {
    nome: String,
    slug: String,
}

#[derive(Debug, Deserialize)]
struct SeasonsWire {
    campeonato: ChampionshipRef,
    edicoes: Vec<EditionEntry>,
}

#[derive(Debug, Deserialize)]
struct ChampionshipRef {
    slug: String,
}

#[derive(Debug, Deserialize)]
struct EditionEntry {
    edicao: Edition,
    gols: u32,
    jogos: u32,
    jogos_realizados: u32,
}

#[derive(Debug, Deserialize)]
struct Edition {
    data_inicio: String,
    data_fim: String,
    slug_editorial: String,
}

#[derive(Debug, Deserialize)]
struct ListGame {
    mand: i64,
    vis: i64,
    golm: Option<u32>,
    golv: Option<u32>,
    sede: Option<String>,
    rod: Option<u32>,
    url: String,
    dt: String,
    hr: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListTeam {
    nome_popular: String,
}

/// Builds the championship list, dropping the aggregate entry.
pub fn parse_championships(fragment: &str) -> Result<Vec<Championship>> {
    let wire: Vec<ChampionshipWire> = serde_json::from_str(fragment)
        .map_err(|e| parse_error(TargetKind::Championships, fragment, &e.to_string()))?;

    Ok(wire
        .into_iter()
        .filter(|champ| champ.nome != UNIFIED_CHAMPIONSHIP)
        .map(|champ| Championship {
            id: champ.slug.clone(),
            name: champ.nome,
            path: Championship::path_for(&champ.slug),
        })
        .collect())
}

/// Builds the editions of one championship out of its page excerpt.
pub fn parse_seasons(fragment: &str) -> Result<Vec<Season>> {
    let wire: SeasonsWire = serde_json::from_str(fragment)
        .map_err(|e| parse_error(TargetKind::Seasons, fragment, &e.to_string()))?;

    let championship_id = wire.campeonato.slug;
    let championship_path = Championship::path_for(&championship_id);

    wire.edicoes
        .into_iter()
        .map(|entry| {
            let start_date = edition_date(&entry.edicao.data_inicio)?;
            let end_date = edition_date(&entry.edicao.data_fim)?;
            Ok(Season {
                championship_id: championship_id.clone(),
                id: entry.edicao.slug_editorial.clone(),
                year: start_date.year(),
                start_date,
                end_date,
                goals: entry.gols,
                games_played: entry.jogos_realizados,
                games_total: entry.jogos,
                status: SeasonStatus::from_counts(entry.jogos_realizados, entry.jogos),
                path: format!("{}/{}", championship_path, entry.edicao.slug_editorial),
            })
        })
        .collect()
}

/// Availability of one edition, read off the same excerpt the seasons
/// come from.
pub fn parse_status(fragment: &str, season_id: &str) -> Result<SeasonStatus> {
    let seasons = match parse_seasons(fragment) {
        Ok(seasons) => seasons,
        Err(ScrapediaError::Parse { detail, .. }) => {
            return Err(ScrapediaError::Parse {
                kind: TargetKind::Status,
                detail,
            })
        }
        Err(other) => return Err(other),
    };

    seasons
        .iter()
        .find(|season| season.id == season_id)
        .map(|season| season.status)
        .ok_or_else(|| ScrapediaError::NotFound {
            kind: TargetKind::Status,
            context: format!("season '{season_id}'"),
        })
}

/// Builds the team list out of the index page's list items.
pub fn parse_teams(fragments: &[String]) -> Result<Vec<Team>> {
    fragments.iter().map(|fragment| parse_team(fragment)).collect()
}

fn parse_team(fragment: &str) -> Result<Team> {
    let doc = Html::parse_fragment(fragment);
    let root = doc.root_element();

    let anchor = root
        .select(&ANCHOR)
        .next()
        .ok_or_else(|| parse_error(TargetKind::Teams, fragment, "list item without a link"))?;
    let path = anchor
        .value()
        .attr("href")
        .ok_or_else(|| parse_error(TargetKind::Teams, fragment, "team link without an href"))?
        .to_string();
    let name = anchor.text().collect::<String>().trim().to_string();
    if name.is_empty() {
        return Err(parse_error(TargetKind::Teams, fragment, "team link without a name"));
    }
    let crest = attr_of(root, &CREST, "src").filter(|src| !src.is_empty());

    Ok(Team {
        id: path.trim_start_matches('/').to_string(),
        name,
        path,
        crest,
    })
}

/// Builds the season's games out of whichever layout the seeker found.
pub fn parse_games(fragments: &GameFragments, season_path: &str) -> Result<Vec<Game>> {
    match fragments {
        GameFragments::Table { rows } => parse_table_rows(rows, season_path),
        GameFragments::Playoffs {
            rows,
            ties,
            headings,
        } => {
            let mut games = parse_table_rows(rows, season_path)?;
            games.extend(parse_bracket_ties(ties, headings, season_path)?);
            Ok(games)
        }
        GameFragments::List { games, teams } => parse_game_list(games, teams, season_path),
    }
}

fn parse_table_rows(rows: &[String], season_path: &str) -> Result<Vec<Game>> {
    rows.iter()
        .map(|fragment| parse_table_row(fragment, season_path))
        .collect()
}

fn parse_table_row(fragment: &str, season_path: &str) -> Result<Game> {
    let doc = Html::parse_fragment(fragment);
    let row = doc
        .select(&ROW)
        .next()
        .ok_or_else(|| parse_error(TargetKind::Games, fragment, "fixture row markup missing"))?;

    let home_team = attr_of(row, &HOME_META, "content")
        .ok_or_else(|| parse_error(TargetKind::Games, fragment, "home team meta missing"))?;
    let away_team = attr_of(row, &AWAY_META, "content")
        .ok_or_else(|| parse_error(TargetKind::Games, fragment, "away team meta missing"))?;

    let score = build_score(
        text_of(row, &HOME_GOALS).as_deref(),
        text_of(row, &AWAY_GOALS).as_deref(),
    )?;

    let date_raw = attr_of(row, &MATCH_DATE, "datetime")
        .ok_or_else(|| parse_error(TargetKind::Games, fragment, "fixture date missing"))?;
    let kickoff = text_of(row, &KICKOFF).filter(|t| !t.is_empty());
    let date = parse_game_datetime(&date_raw, kickoff.as_deref())?;

    let path = attr_of(row, &ANCHOR, "href")
        .ok_or_else(|| parse_error(TargetKind::Games, fragment, "fixture link missing"))?;
    let round = row
        .value()
        .attr("data-rodada")
        .and_then(|r| r.trim().parse().ok());
    let stadium = text_of(row, &STADIUM).filter(|t| !t.is_empty());

    Ok(Game {
        season_path: season_path.to_string(),
        round,
        date,
        home_team,
        away_team,
        score,
        stadium,
        phase: GamePhase::FirstPhase,
        path,
    })
}

fn parse_bracket_ties(
    ties: &[String],
    headings: &[String],
    season_path: &str,
) -> Result<Vec<Game>> {
    let mut phases = phase_ladder(headings);
    let mut games = Vec::new();

    for fragment in ties {
        let doc = Html::parse_fragment(fragment);
        let root = doc.root_element();

        let first_team = text_of(root, &TIE_HOME)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| parse_error(TargetKind::Games, fragment, "bracket tie without a home side"))?;
        let second_team = text_of(root, &TIE_AWAY)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| parse_error(TargetKind::Games, fragment, "bracket tie without an away side"))?;
        let phase = phases.pop_front().ok_or_else(|| {
            parse_error(TargetKind::Games, fragment, "more bracket ties than phase slots")
        })?;

        let first_leg = root
            .select(&LEG_ONE)
            .next()
            .ok_or_else(|| parse_error(TargetKind::Games, fragment, "bracket tie without a first leg"))?;
        games.push(parse_leg(
            first_leg,
            &first_team,
            &second_team,
            true,
            phase,
            season_path,
        )?);

        // Home advantage flips on the return leg; the tie may also go to
        // a third game.
        if let Some(second_leg) = root.select(&LEG_TWO).next() {
            games.push(parse_leg(
                second_leg,
                &second_team,
                &first_team,
                false,
                phase,
                season_path,
            )?);
        }
        if let Some(third_leg) = root.select(&LEG_THREE).next() {
            games.push(parse_leg(
                third_leg,
                &second_team,
                &first_team,
                false,
                phase,
                season_path,
            )?);
        }
    }

    Ok(games)
}

/// One leg of a knockout tie. The span tagged `primeiro` always scores
/// the tie's first team, whichever side it is playing on that leg.
fn parse_leg(
    leg: ElementRef<'_>,
    home_team: &str,
    away_team: &str,
    primeiro_is_home: bool,
    phase: GamePhase,
    season_path: &str,
) -> Result<Game> {
    let (primeiro, plain) = leg_scores(leg);
    let (home_goals, away_goals) = if primeiro_is_home {
        (primeiro, plain)
    } else {
        (plain, primeiro)
    };
    let score = build_score(home_goals.as_deref(), away_goals.as_deref())?;

    let content = leg.select(&LEG_CONTENT).next().ok_or_else(|| {
        parse_error(TargetKind::Games, &leg.html(), "bracket leg without details")
    })?;
    let text = content.text().collect::<String>();
    let schedule = LEG_SCHEDULE
        .captures(&text)
        .ok_or_else(|| parse_error(TargetKind::Games, &text, "bracket leg schedule missing"))?;
    let date = parse_game_datetime(&schedule[1], Some(&schedule[2]))?;

    let stadium = text_of(content, &LEG_STADIUM).filter(|t| !t.is_empty());
    let path = attr_of(leg, &ANCHOR, "href")
        .ok_or_else(|| parse_error(TargetKind::Games, &leg.html(), "bracket leg link missing"))?;

    Ok(Game {
        season_path: season_path.to_string(),
        round: None,
        date,
        home_team: home_team.to_string(),
        away_team: away_team.to_string(),
        score,
        stadium,
        phase,
        path,
    })
}

fn leg_scores(leg: ElementRef<'_>) -> (Option<String>, Option<String>) {
    let mut primeiro = None;
    let mut plain = None;
    for span in leg.select(&PLACAR) {
        let text = span.text().collect::<String>().trim().to_string();
        if span.value().classes().any(|class| class == "primeiro") {
            primeiro.get_or_insert(text);
        } else {
            plain.get_or_insert(text);
        }
    }
    (primeiro, plain)
}

/// Phase slots in bracket order: each heading contributes the ties its
/// stage holds.
fn phase_ladder(headings: &[String]) -> VecDeque<GamePhase> {
    let mut ladder = VecDeque::new();
    if headings.iter().any(|h| h == "Oitavas de final") {
        ladder.extend([GamePhase::BestOf16; 8]);
    }
    if headings.iter().any(|h| h == "Quartas de final") {
        ladder.extend([GamePhase::Quarterfinals; 4]);
    }
    if headings.iter().any(|h| h == "Semifinal") {
        ladder.extend([GamePhase::Semifinals; 2]);
    }
    if headings.iter().any(|h| h == "Final") {
        ladder.push_back(GamePhase::Finals);
    }
    ladder
}

fn parse_game_list(games_raw: &str, teams_raw: &str, season_path: &str) -> Result<Vec<Game>> {
    let games: Vec<ListGame> = serde_json::from_str(games_raw)
        .map_err(|e| parse_error(TargetKind::Games, games_raw, &e.to_string()))?;
    let teams: HashMap<String, ListTeam> = serde_json::from_str(teams_raw)
        .map_err(|e| parse_error(TargetKind::Games, teams_raw, &e.to_string()))?;

    games
        .into_iter()
        .map(|game| {
            let home_team = list_team_name(&teams, game.mand)?;
            let away_team = list_team_name(&teams, game.vis)?;
            let score = match (game.golm, game.golv) {
                (Some(home), Some(away)) => Some(Score { home, away }),
                _ => None,
            };
            let date = parse_game_datetime(&game.dt, game.hr.as_deref())?;

            Ok(Game {
                season_path: season_path.to_string(),
                round: game.rod,
                date,
                home_team,
                away_team,
                score,
                stadium: game.sede.filter(|s| !s.is_empty()),
                phase: GamePhase::FirstPhase,
                path: game.url,
            })
        })
        .collect()
}

fn list_team_name(teams: &HashMap<String, ListTeam>, id: i64) -> Result<String> {
    teams
        .get(&id.to_string())
        .map(|team| team.nome_popular.clone())
        .ok_or_else(|| {
            parse_error(
                TargetKind::Games,
                &id.to_string(),
                "fixture references an unknown team id",
            )
        })
}

fn edition_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| parse_error(TargetKind::Seasons, raw, &format!("invalid edition date: {e}")))
}

/// Match dates come as `%d/%m/%Y` with the kickoff hour, when published,
/// as `%Hh%M`. A fixture without a kickoff lands on midnight.
fn parse_game_datetime(date_raw: &str, kickoff: Option<&str>) -> Result<NaiveDateTime> {
    match kickoff {
        Some(hour) if !hour.trim().is_empty() => {
            let stamp = format!("{} {}", date_raw.trim(), hour.trim());
            NaiveDateTime::parse_from_str(&stamp, "%d/%m/%Y %Hh%M")
                .map_err(|e| parse_error(TargetKind::Games, &stamp, &format!("invalid kickoff: {e}")))
        }
        _ => NaiveDate::parse_from_str(date_raw.trim(), "%d/%m/%Y")
            .map(|date| date.and_time(NaiveTime::MIN))
            .map_err(|e| {
                parse_error(TargetKind::Games, date_raw, &format!("invalid match date: {e}"))
            }),
    }
}

fn build_score(home: Option<&str>, away: Option<&str>) -> Result<Option<Score>> {
    let home = home.map(str::trim).filter(|t| !t.is_empty());
    let away = away.map(str::trim).filter(|t| !t.is_empty());

    match (home, away) {
        (Some(home), Some(away)) => Ok(Some(Score {
            home: parse_goals(home)?,
            away: parse_goals(away)?,
        })),
        _ => Ok(None),
    }
}

fn parse_goals(raw: &str) -> Result<u32> {
    raw.parse()
        .map_err(|_| parse_error(TargetKind::Games, raw, "goal count is not a number"))
}

fn text_of(el: ElementRef<'_>, selector: &Selector) -> Option<String> {
    el.select(selector)
        .next()
        .map(|n| n.text().collect::<String>().trim().to_string())
}

fn attr_of(el: ElementRef<'_>, selector: &Selector, name: &str) -> Option<String> {
    el.select(selector)
        .next()
        .and_then(|n| n.value().attr(name))
        .map(str::to_string)
}

fn parse_error(kind: TargetKind, fragment: &str, detail: &str) -> ScrapediaError {
    let mut excerpt: String = fragment.chars().take(80).collect();
    if excerpt.len() < fragment.len() {
        excerpt.push_str("...");
    }
    ScrapediaError::Parse {
        kind,
        detail: format!("{detail} (near '{excerpt}')"),
    }
}
