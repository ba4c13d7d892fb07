use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::artifacts::{ArtifactStore, WorkdirLock};
use crate::config::Config;
use crate::crawler::{Crawler, RawVideoItem, YouTubeClient};
use crate::data::{DatasetBuilder, FeatureEncoder, FeatureMatrix};
use crate::http::FetchClient;
use crate::parser::{annotate_titles, WordParser, YahooParser};
use crate::Result;

/// Runs the pipeline stages for one channel against its working directory
pub struct Pipeline {
    config: Config,
    store: ArtifactStore,
    fetch: FetchClient,
    parser: Option<Arc<dyn WordParser>>,
}

impl Pipeline {
    /// Validate the configuration and build a reqwest-backed pipeline
    pub fn new(config: Config) -> Result<Self> {
        let fetch = FetchClient::from_config(&config.crawler)?;
        Self::with_fetch_client(config, fetch)
    }

    pub fn with_fetch_client(config: Config, fetch: FetchClient) -> Result<Self> {
        config.validate()?;
        let store = ArtifactStore::new(config.working_dir()?);

        Ok(Self {
            config,
            store,
            fetch,
            parser: None,
        })
    }

    /// Use `parser` instead of the Yahoo client for title annotation
    pub fn with_parser(mut self, parser: Arc<dyn WordParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// List the channel and fetch missing video details
    pub async fn crawl(&self) -> Result<Vec<RawVideoItem>> {
        let _lock = self.acquire()?;
        self.crawl_stage().await
    }

    /// Annotate titles, rebuild the dataset and encode features
    pub async fn preprocess(&self) -> Result<FeatureMatrix> {
        let _lock = self.acquire()?;
        self.preprocess_stage().await
    }

    /// Crawl then preprocess under a single lock
    pub async fn run_all(&self) -> Result<FeatureMatrix> {
        let _lock = self.acquire()?;
        self.crawl_stage().await?;
        self.preprocess_stage().await
    }

    /// Attach parsed words to detail items lacking them. The detail cache is
    /// rewritten only when something changed, including when the parser
    /// fails after annotating some items.
    pub async fn annotate(&self) -> Result<usize> {
        let path = self.store.video_detail_list_path();
        let mut items: Vec<RawVideoItem> = self.store.require_json(&path)?;

        let pending = items.iter().filter(|item| item.needs_annotation()).count();
        if pending == 0 {
            info!("⏭️ Skip title annotation: all {} items parsed", items.len());
            return Ok(0);
        }

        info!("📝 Parsing {} video titles", pending);
        let parser = self.word_parser()?;
        let outcome = annotate_titles(&mut items, parser.as_ref()).await;

        // keep whatever was parsed, even when the parser gave up partway
        if outcome.annotated > 0 {
            self.store.save_json(&path, &items)?;
        }
        outcome.into_result()
    }

    fn acquire(&self) -> Result<WorkdirLock> {
        self.store.initialize()?;
        self.store.lock()
    }

    /// The injected parser, or a Yahoo client built on first need
    fn word_parser(&self) -> Result<Arc<dyn WordParser>> {
        match &self.parser {
            Some(parser) => Ok(Arc::clone(parser)),
            None => {
                debug!("Creating Yahoo parser client");
                let parser = YahooParser::new(&self.config.parser, self.fetch.clone())?;
                Ok(Arc::new(parser))
            }
        }
    }

    async fn crawl_stage(&self) -> Result<Vec<RawVideoItem>> {
        let start_time = Instant::now();
        let channel_id = self.config.require_channel_id()?;

        let client = YouTubeClient::new(self.fetch.clone(), self.config.crawler.clone());
        let crawler = Crawler::new(client, self.store.clone());
        let items = crawler.run(channel_id).await?;

        info!(
            "✅ Crawl finished in {:.2}s: {} videos cached",
            start_time.elapsed().as_secs_f64(),
            items.len()
        );
        Ok(items)
    }

    async fn preprocess_stage(&self) -> Result<FeatureMatrix> {
        let start_time = Instant::now();

        self.annotate().await?;
        DatasetBuilder::from_config(&self.config.data)?.run(&self.store)?;
        let matrix = FeatureEncoder::from_config(&self.config.data).run(&self.store)?;

        info!(
            "✅ Preprocess finished in {:.2}s: {} training rows",
            start_time.elapsed().as_secs_f64(),
            matrix.len()
        );
        Ok(matrix)
    }
}
