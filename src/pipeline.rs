//! Composable scrape pipelines.
//!
//! A pipeline chains the fetch, seek and parse stages for one target
//! kind into a single callable. The factory builds the chain for each
//! kind and routes every run through the shared cache, so repeated
//! scrapes of the same page cost one request.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::config::ScraperConfig;
use crate::error::Result;
use crate::models::{Championship, Game, Season, SeasonStatus, Team};
use crate::packer::{Packer, RequestKey};
use crate::parser;
use crate::requester::Requester;
use crate::seeker;

/// Chain of fallible stages from an input to the scraped records.
/// Any stage error stops the chain and surfaces unchanged.
pub struct Pipeline<I, O> {
    stages: usize,
    run: Box<dyn Fn(I) -> Result<O> + Send + Sync>,
}

impl<I, O> Pipeline<I, O>
where
    I: 'static,
    O: 'static,
{
    pub fn start<F>(stage: F) -> Self
    where
        F: Fn(I) -> Result<O> + Send + Sync + 'static,
    {
        Self {
            stages: 1,
            run: Box::new(stage),
        }
    }

    pub fn then<T, F>(self, stage: F) -> Pipeline<I, T>
    where
        T: 'static,
        F: Fn(O) -> Result<T> + Send + Sync + 'static,
    {
        let Pipeline { stages, run } = self;
        Pipeline {
            stages: stages + 1,
            run: Box::new(move |input| stage(run(input)?)),
        }
    }

    pub fn scrape(&self, input: I) -> Result<O> {
        debug!(stages = self.stages, "running scrape pipeline");
        (self.run)(input)
    }

    pub fn stages(&self) -> usize {
        self.stages
    }
}

/// Builds and runs the pipeline for each target kind over one shared
/// requester and cache.
#[derive(Clone)]
pub struct PipelineFactory {
    requester: Arc<Requester>,
    packer: Arc<Packer>,
}

impl PipelineFactory {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        Ok(Self {
            requester: Arc::new(Requester::new(config)?),
            packer: Arc::new(Packer::new(config.cache_capacity)),
        })
    }

    /// Builds a factory around an already constructed requester, used
    /// when the transport is swapped out.
    pub fn with_requester(requester: Requester, cache_capacity: usize) -> Self {
        Self {
            requester: Arc::new(requester),
            packer: Arc::new(Packer::new(cache_capacity)),
        }
    }

    pub fn requester(&self) -> &Requester {
        &self.requester
    }

    pub fn packer(&self) -> &Packer {
        &self.packer
    }

    /// Whether the site's landing page currently answers at all.
    #[instrument(skip(self))]
    pub fn site_up(&self) -> bool {
        self.requester.fetch("/").is_ok()
    }

    #[instrument(skip(self))]
    pub fn championships(&self) -> Result<Vec<Championship>> {
        self.packer
            .lookup_or_populate(RequestKey::championships(), || {
                let requester = Arc::clone(&self.requester);
                Pipeline::start(move |path: String| requester.fetch(&path))
                    .then(|body| seeker::seek_championships(&body))
                    .then(|raw| parser::parse_championships(&raw))
                    .scrape("/".to_string())
            })
    }

    #[instrument(skip(self))]
    pub fn teams(&self) -> Result<Vec<Team>> {
        self.packer.lookup_or_populate(RequestKey::teams(), || {
            let requester = Arc::clone(&self.requester);
            Pipeline::start(move |path: String| requester.fetch(&path))
                .then(|body| seeker::seek_teams(&body))
                .then(|fragments| parser::parse_teams(&fragments))
                .scrape("/times".to_string())
        })
    }

    #[instrument(skip(self, championship), fields(championship = %championship.id))]
    pub fn seasons(&self, championship: &Championship) -> Result<Vec<Season>> {
        self.packer
            .lookup_or_populate(RequestKey::seasons(&championship.path), || {
                let requester = Arc::clone(&self.requester);
                Pipeline::start(move |path: String| requester.fetch(&path))
                    .then(|body| seeker::seek_seasons(&body))
                    .then(|raw| parser::parse_seasons(&raw))
                    .scrape(championship.path.clone())
            })
    }

    #[instrument(skip(self, season), fields(season = %season.path))]
    pub fn games(&self, season: &Season) -> Result<Vec<Game>> {
        self.packer
            .lookup_or_populate(RequestKey::games(&season.path), || {
                let requester = Arc::clone(&self.requester);
                let season_path = season.path.clone();
                Pipeline::start(move |path: String| requester.fetch(&path))
                    .then(|body| seeker::seek_games(&body))
                    .then(move |fragments| parser::parse_games(&fragments, &season_path))
                    .scrape(season.path.clone())
            })
    }

    #[instrument(skip(self))]
    pub fn status(&self, championship_path: &str, season_id: &str) -> Result<SeasonStatus> {
        self.packer
            .lookup_or_populate(RequestKey::status(championship_path, season_id), || {
                let requester = Arc::clone(&self.requester);
                let season_id = season_id.to_string();
                Pipeline::start(move |path: String| requester.fetch(&path))
                    .then(|body| seeker::seek_status(&body))
                    .then(move |raw| parser::parse_status(&raw, &season_id))
                    .scrape(championship_path.to_string())
            })
    }
}
