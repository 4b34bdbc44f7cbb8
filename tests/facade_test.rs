//! End-to-end tests over the scraper facade, with the network swapped
//! out for canned pages.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use scrapedia::error::Result;
use scrapedia::pipeline::PipelineFactory;
use scrapedia::requester::{HttpResponse, HttpTransport, Requester};
use scrapedia::seeker::TargetKind;
use scrapedia::{RootScraper, ScrapediaError, ScraperConfig, SeasonStatus};

const BASE: &str = "http://test.local";

/// Serves a fixed set of pages and counts the hits per path. Unknown
/// paths answer 404.
struct PageTransport {
    pages: HashMap<String, String>,
    calls: Mutex<HashMap<String, usize>>,
}

impl PageTransport {
    fn new(pages: &[(&str, String)]) -> Arc<Self> {
        Arc::new(Self {
            pages: pages
                .iter()
                .map(|(path, body)| (path.to_string(), body.clone()))
                .collect(),
            calls: Mutex::new(HashMap::new()),
        })
    }

    fn calls_for(&self, path: &str) -> usize {
        self.calls.lock().unwrap().get(path).copied().unwrap_or(0)
    }
}

impl HttpTransport for PageTransport {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        let path = url.strip_prefix(BASE).unwrap_or(url);
        *self
            .calls
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_insert(0) += 1;

        Ok(match self.pages.get(path) {
            Some(body) => HttpResponse {
                status: 200,
                body: body.clone(),
            },
            None => HttpResponse {
                status: 404,
                body: String::new(),
            },
        })
    }
}

fn test_config() -> ScraperConfig {
    ScraperConfig {
        base_url: BASE.to_string(),
        max_retries: 1,
        backoff_factor_ms: 0,
        ..ScraperConfig::default()
    }
}

fn scraper_over(
    pages: &[(&str, String)],
    cache_capacity: usize,
) -> (RootScraper, Arc<PageTransport>) {
    let transport = PageTransport::new(pages);
    let requester = Requester::with_transport(&test_config(), transport.clone());
    let factory = PipelineFactory::with_requester(requester, cache_capacity);
    (RootScraper::with_factory(factory), transport)
}

fn landing_page() -> String {
    concat!(
        "<html><head>",
        r#"<script type="text/javascript" language="javascript" charset="utf-8">"#,
        "var campeonatos = ",
        r#"[{"nome":"Campeonato Brasileiro","slug":"campeonato-brasileiro","tipo":"campeonato"},"#,
        r#"{"nome":"Copa do Brasil","slug":"copa-do-brasil","tipo":"campeonato"},"#,
        r#"{"nome":"Brasileiro Unificado","slug":"brasileiro-unificado","tipo":"campeonato"}];"#,
        "</script></head><body></body></html>",
    )
    .to_string()
}

fn teams_page() -> String {
    concat!(
        "<html><body><ol>",
        r#"<li itemprop="itemListElement"><a href="/flamengo">"#,
        r#"<img src="/img/flamengo.png">Flamengo</a></li>"#,
        r#"<li itemprop="itemListElement"><a href="/santos">Santos</a></li>"#,
        "</ol></body></html>",
    )
    .to_string()
}

fn brasileiro_page() -> String {
    concat!(
        "<html><body><script>var static_host = \"http://s.glbimg.com/\";var dados = ",
        r#"{"campeonato":{"slug":"campeonato-brasileiro","nome":"Campeonato Brasileiro"},"#,
        r#""edicoes":[{"edicao":{"data_fim":"2018-12-02","slug_editorial":"2018","#,
        r#""data_inicio":"2018-04-14"},"gols":827,"jogos_realizados":380,"jogos":380},"#,
        r#"{"edicao":{"data_fim":"2019-12-08","slug_editorial":"2019","#,
        r#""data_inicio":"2019-04-27"},"gols":0,"jogos_realizados":0,"jogos":380}]};"#,
        "</script></body></html>",
    )
    .to_string()
}

fn brasileiro_2018_page() -> String {
    concat!(
        "<html><body>",
        r#"<div id="lista-jogos"><ul>"#,
        r#"<li class="lista-classificacao-jogo" data-rodada="1"><a href="/jogo/1001">"#,
        r#"<div class="time mandante"><meta itemprop="name" content="Flamengo">"#,
        r#"<span class="mandante font-face">2</span></div>"#,
        r#"<div class="time visitante"><meta itemprop="name" content="Santos">"#,
        r#"<span class="visitante font-face">1</span></div>"#,
        r#"<span itemprop="name">Maracana</span>"#,
        r#"<time datetime="14/04/2018"></time><span class="horario">16h00</span>"#,
        "</a></li>",
        r#"<li class="lista-classificacao-jogo" data-rodada="2"><a href="/jogo/1002">"#,
        r#"<div class="time mandante"><meta itemprop="name" content="Santos">"#,
        r#"<span class="mandante font-face"></span></div>"#,
        r#"<div class="time visitante"><meta itemprop="name" content="Flamengo">"#,
        r#"<span class="visitante font-face"></span></div>"#,
        r#"<time datetime="21/04/2018"></time>"#,
        "</a></li>",
        "</ul></div></body></html>",
    )
    .to_string()
}

fn copa_page() -> String {
    concat!(
        "<html><body><script>var static_host = \"http://s.glbimg.com/\";var dados = ",
        r#"{"campeonato":{"slug":"copa-do-brasil","nome":"Copa do Brasil"},"#,
        r#""edicoes":[{"edicao":{"data_fim":"2013-11-27","slug_editorial":"2013","#,
        r#""data_inicio":"2013-02-13"},"gols":260,"jogos_realizados":86,"jogos":86}]};"#,
        "</script></body></html>",
    )
    .to_string()
}

fn copa_2013_page() -> String {
    concat!(
        "<html><body>",
        r#"<table id="tabela-jogos"></table>"#,
        "<script>var classificacao = {",
        r#"JOGOS: [{"mand":262,"vis":275,"golm":3,"golv":0,"sede":"Pacaembu","rod":1,"#,
        r#""url":"/jogo/9001","dt":"21/07/2013","hr":"16h00"},"#,
        r#"{"mand":275,"vis":262,"golm":null,"golv":null,"sede":"Vila Belmiro","rod":2,"#,
        r#""url":"/jogo/9002","dt":"28/07/2013","hr":null}],"#,
        r#"EQUIPES: {"262":{"nome_popular":"Flamengo","slug":"flamengo"},"#,
        r#""275":{"nome_popular":"Santos","slug":"santos"}},"#,
        "};</script></body></html>",
    )
    .to_string()
}

fn site_pages() -> Vec<(&'static str, String)> {
    vec![
        ("/", landing_page()),
        ("/times", teams_page()),
        ("/campeonato/campeonato-brasileiro", brasileiro_page()),
        ("/campeonato/campeonato-brasileiro/2018", brasileiro_2018_page()),
        ("/campeonato/copa-do-brasil", copa_page()),
        ("/campeonato/copa-do-brasil/2013", copa_2013_page()),
    ]
}

#[test]
fn championships_skip_the_aggregate_and_cache_the_landing_page() -> anyhow::Result<()> {
    let (scraper, transport) = scraper_over(&site_pages(), 10);

    let table = scraper.championships()?;
    assert_eq!(table.len(), 2);
    assert_eq!(
        table.column("name").unwrap(),
        vec!["Campeonato Brasileiro", "Copa do Brasil"]
    );

    scraper.championships()?;
    assert_eq!(transport.calls_for("/"), 1);
    Ok(())
}

#[test]
fn the_root_scraper_reports_site_availability() {
    let (up, _) = scraper_over(&site_pages(), 10);
    assert!(up.status());

    let (down, _) = scraper_over(&[], 10);
    assert!(!down.status());
}

#[test]
fn the_team_index_keeps_crest_paths_when_present() -> anyhow::Result<()> {
    let (scraper, _) = scraper_over(&site_pages(), 10);

    let table = scraper.teams()?;
    assert_eq!(table.len(), 2);
    assert_eq!(table.column("id").unwrap(), vec!["flamengo", "santos"]);
    assert_eq!(
        table.column("crest").unwrap(),
        vec!["/img/flamengo.png", ""]
    );
    Ok(())
}

#[test]
fn drilling_down_fetches_every_page_exactly_once() -> anyhow::Result<()> {
    let (scraper, transport) = scraper_over(&site_pages(), 10);

    let brasileiro = scraper.championship("campeonato-brasileiro")?;
    let seasons = brasileiro.seasons(None)?;
    assert_eq!(seasons.len(), 2);

    let season = brasileiro.season("2018")?;
    let games = season.games()?;
    assert_eq!(games.len(), 2);
    assert_eq!(games.column("home_team").unwrap(), vec!["Flamengo", "Santos"]);
    assert_eq!(games.column("home_goals").unwrap(), vec!["2", ""]);
    assert_eq!(games.column("stadium").unwrap(), vec!["Maracana", ""]);
    assert_eq!(
        games.column("date").unwrap(),
        vec!["2018-04-14 16:00", "2018-04-21 00:00"]
    );

    season.games()?;
    assert_eq!(transport.calls_for("/"), 1);
    assert_eq!(transport.calls_for("/campeonato/campeonato-brasileiro"), 1);
    assert_eq!(
        transport.calls_for("/campeonato/campeonato-brasileiro/2018"),
        1
    );
    Ok(())
}

#[test]
fn narrowing_seasons_answers_one_row_or_not_found() -> anyhow::Result<()> {
    let (scraper, _) = scraper_over(&site_pages(), 10);
    let brasileiro = scraper.championship("campeonato-brasileiro")?;

    let narrowed = brasileiro.seasons(Some("2018"))?;
    assert_eq!(narrowed.len(), 1);
    assert_eq!(narrowed.column("id").unwrap(), vec!["2018"]);

    let missing = brasileiro.seasons(Some("1900")).unwrap_err();
    assert!(matches!(
        missing,
        ScrapediaError::NotFound {
            kind: TargetKind::Seasons,
            ..
        }
    ));
    Ok(())
}

#[test]
fn unknown_championships_are_not_found() {
    let (scraper, _) = scraper_over(&site_pages(), 10);

    let err = scraper.championship("serie-z").err();
    assert!(matches!(
        err,
        Some(ScrapediaError::NotFound {
            kind: TargetKind::Championships,
            ..
        })
    ));
}

#[test]
fn season_status_follows_the_played_counts() -> anyhow::Result<()> {
    let (scraper, _) = scraper_over(&site_pages(), 10);
    let brasileiro = scraper.championship("campeonato-brasileiro")?;

    assert_eq!(
        brasileiro.season("2018")?.status()?,
        SeasonStatus::Finished
    );
    assert_eq!(
        brasileiro.season("2019")?.status()?,
        SeasonStatus::Scheduled
    );
    Ok(())
}

#[test]
fn list_layout_pages_join_team_names_from_the_inline_json() -> anyhow::Result<()> {
    let (scraper, _) = scraper_over(&site_pages(), 10);

    let games = scraper
        .championship("copa-do-brasil")?
        .season("2013")?
        .games()?;

    assert_eq!(games.len(), 2);
    assert_eq!(games.column("home_team").unwrap(), vec!["Flamengo", "Santos"]);
    assert_eq!(games.column("round").unwrap(), vec!["1", "2"]);
    assert_eq!(games.column("away_goals").unwrap(), vec!["0", ""]);
    assert_eq!(
        games.column("stadium").unwrap(),
        vec!["Pacaembu", "Vila Belmiro"]
    );
    // No kickoff hour published for the second game.
    assert_eq!(
        games.column("date").unwrap(),
        vec!["2013-07-21 16:00", "2013-07-28 00:00"]
    );
    Ok(())
}

#[test]
fn season_teams_are_listed_by_first_appearance() -> anyhow::Result<()> {
    let (scraper, _) = scraper_over(&site_pages(), 10);

    let teams = scraper
        .championship("copa-do-brasil")?
        .season("2013")?
        .teams()?;

    assert_eq!(teams.column("name").unwrap(), vec!["Flamengo", "Santos"]);
    Ok(())
}

#[test]
fn a_small_cache_evicts_the_stalest_page_and_refetches_it() -> anyhow::Result<()> {
    let (scraper, transport) = scraper_over(&site_pages(), 2);

    scraper.championships()?;
    let brasileiro = scraper.championship("campeonato-brasileiro")?;
    brasileiro.seasons(None)?;
    brasileiro.season("2018")?.games()?;

    // Championships were the stalest of three entries in a two-slot
    // cache, so asking again refetches the landing page.
    scraper.championships()?;
    assert_eq!(transport.calls_for("/"), 2);
    Ok(())
}
