//! Scraping library for the history of Brazilian soccer.
//!
//! Scrapedia reads championships, seasons, teams and games off
//! Futpédia's public pages and answers them as plain tables. Scrapers
//! nest from the whole site down to a single season, and every page
//! fetched on the way is cached, so drilling down stays cheap.
//!
//! ```no_run
//! use scrapedia::RootScraper;
//!
//! let scraper = RootScraper::new()?;
//! let championships = scraper.championships()?;
//! println!("{} championships tracked", championships.len());
//!
//! let brasileiro = scraper.championship("campeonato-brasileiro")?;
//! let games = brasileiro.season("2018")?.games()?;
//! println!("{} games in 2018", games.len());
//! # Ok::<(), scrapedia::ScrapediaError>(())
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod packer;
pub mod parser;
pub mod pipeline;
pub mod requester;
pub mod scraper;
pub mod seeker;

pub use config::ScraperConfig;
pub use error::{Result, ScrapediaError};
pub use models::{
    Championship, Game, GamePhase, Score, Season, SeasonStatus, Table, Tabular, Team,
};
pub use scraper::{ChampionshipScraper, RootScraper, SeasonScraper};
