//! The crate's front door: scrapers that answer tables.
//!
//! `RootScraper` covers the site-wide pages and hands out a
//! `ChampionshipScraper` per championship, which in turn hands out a
//! `SeasonScraper` per edition. Each level reuses the shared pipeline
//! factory, so everything scraped on the way down stays cached.

use tracing::{info, instrument};

use crate::config::ScraperConfig;
use crate::error::{Result, ScrapediaError};
use crate::models::{Championship, Season, SeasonStatus, Table};
use crate::packer;
use crate::pipeline::PipelineFactory;
use crate::seeker::TargetKind;

/// Entry point over the site's landing pages.
pub struct RootScraper {
    factory: PipelineFactory,
}

impl RootScraper {
    /// Builds a scraper with the default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(&ScraperConfig::default())
    }

    pub fn with_config(config: &ScraperConfig) -> Result<Self> {
        Ok(Self {
            factory: PipelineFactory::new(config)?,
        })
    }

    /// Builds a scraper over an existing factory, keeping whatever
    /// transport and cache it carries.
    pub fn with_factory(factory: PipelineFactory) -> Self {
        Self { factory }
    }

    /// Whether the site currently answers at all.
    pub fn status(&self) -> bool {
        self.factory.site_up()
    }

    /// All championships the site tracks, one row each.
    #[instrument(skip(self))]
    pub fn championships(&self) -> Result<Table> {
        let championships = self.factory.championships()?;
        info!(count = championships.len(), "scraped championship list");
        Ok(packer::pack_table(&championships))
    }

    /// All teams that ever played a tracked championship.
    #[instrument(skip(self))]
    pub fn teams(&self) -> Result<Table> {
        let teams = self.factory.teams()?;
        info!(count = teams.len(), "scraped team list");
        Ok(packer::pack_table(&teams))
    }

    /// Narrows down to one championship by its slug.
    #[instrument(skip(self))]
    pub fn championship(&self, id: &str) -> Result<ChampionshipScraper> {
        let championship = self
            .factory
            .championships()?
            .into_iter()
            .find(|champ| champ.id == id)
            .ok_or_else(|| ScrapediaError::NotFound {
                kind: TargetKind::Championships,
                context: format!("championship '{id}'"),
            })?;

        Ok(ChampionshipScraper {
            championship,
            factory: self.factory.clone(),
        })
    }
}

/// Scraper scoped to one championship's page.
pub struct ChampionshipScraper {
    championship: Championship,
    factory: PipelineFactory,
}

impl ChampionshipScraper {
    pub fn championship(&self) -> &Championship {
        &self.championship
    }

    /// The championship's editions, or just the one named by `target`.
    #[instrument(skip(self), fields(championship = %self.championship.id))]
    pub fn seasons(&self, target: Option<&str>) -> Result<Table> {
        let seasons = self.factory.seasons(&self.championship)?;
        info!(count = seasons.len(), "scraped season list");

        match target {
            None => Ok(packer::pack_table(&seasons)),
            Some(id) => seasons
                .iter()
                .find(|season| season.id == id)
                .map(|season| packer::pack_table(std::slice::from_ref(season)))
                .ok_or_else(|| ScrapediaError::NotFound {
                    kind: TargetKind::Seasons,
                    context: format!(
                        "season '{id}' of championship '{}'",
                        self.championship.id
                    ),
                }),
        }
    }

    /// Narrows down to one edition by its slug.
    #[instrument(skip(self), fields(championship = %self.championship.id))]
    pub fn season(&self, id: &str) -> Result<SeasonScraper> {
        let season = self
            .factory
            .seasons(&self.championship)?
            .into_iter()
            .find(|season| season.id == id)
            .ok_or_else(|| ScrapediaError::NotFound {
                kind: TargetKind::Seasons,
                context: format!(
                    "season '{id}' of championship '{}'",
                    self.championship.id
                ),
            })?;

        Ok(SeasonScraper {
            season,
            factory: self.factory.clone(),
        })
    }
}

/// Scraper scoped to one edition's fixtures page.
pub struct SeasonScraper {
    season: Season,
    factory: PipelineFactory,
}

impl SeasonScraper {
    pub fn season(&self) -> &Season {
        &self.season
    }

    /// Every game of the edition, played or scheduled.
    #[instrument(skip(self), fields(season = %self.season.path))]
    pub fn games(&self) -> Result<Table> {
        let games = self.factory.games(&self.season)?;
        info!(count = games.len(), "scraped season games");
        Ok(packer::pack_table(&games))
    }

    /// The teams that appear in the edition's fixtures, in order of
    /// first appearance.
    #[instrument(skip(self), fields(season = %self.season.path))]
    pub fn teams(&self) -> Result<Table> {
        let games = self.factory.games(&self.season)?;

        let mut names: Vec<String> = Vec::new();
        for game in &games {
            for team in [&game.home_team, &game.away_team] {
                if !names.iter().any(|known| known == team) {
                    names.push(team.clone());
                }
            }
        }

        Ok(Table::new(
            vec!["name".to_string()],
            names.into_iter().map(|name| vec![name]).collect(),
        ))
    }

    /// How far along the edition is, read off the championship page.
    #[instrument(skip(self), fields(season = %self.season.path))]
    pub fn status(&self) -> Result<SeasonStatus> {
        self.factory.status(
            &Championship::path_for(&self.season.championship_id),
            &self.season.id,
        )
    }
}
