//! Pipeline orchestrator for Summarist.
//!
//! Drives each item through classify, fetch, summarize, archive and record,
//! one item at a time. Per-item failures are reported as outcomes and never
//! stop a run.

use crate::archive::{Archiver, MarkdownArchiver};
use crate::config::{Prompts, Settings, SourceConfig};
use crate::downloader::YtDlp;
use crate::error::{Result, SummaristError};
use crate::media_source::{classify_source, MediaItem, SourceRegistry, SourceType};
use crate::state::ProcessedSet;
use crate::summarizer::{OpenAiModel, Summarizer};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Stand-in text summarized when an item has no transcript.
pub const EMPTY_TRANSCRIPT_PLACEHOLDER: &str = "(No transcript available)";

/// The step an item was in when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Classify,
    Fetch,
    Summarize,
    Archive,
    Record,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Classify => "classify",
            Stage::Fetch => "fetch",
            Stage::Summarize => "summarize",
            Stage::Archive => "archive",
            Stage::Record => "record",
        };
        f.write_str(name)
    }
}

/// Terminal state of one item.
#[derive(Debug)]
pub enum ItemOutcome {
    /// Archived and added to the processed set.
    Recorded {
        source_type: SourceType,
        id: String,
        title: String,
        folder: PathBuf,
    },
    /// Already in the processed set; nothing was fetched.
    Skipped { source_type: SourceType, id: String },
    Failed {
        url: String,
        stage: Stage,
        error: String,
        /// The error also makes every later item fail, so the run stops.
        fatal: bool,
    },
}

impl ItemOutcome {
    fn is_fatal(&self) -> bool {
        matches!(self, ItemOutcome::Failed { fatal: true, .. })
    }
}

/// A new item found while scanning configured sources.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub source_name: String,
    pub source_type: SourceType,
    pub item: MediaItem,
}

/// Outcomes of a run, in processing order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<ItemOutcome>,
}

impl BatchReport {
    pub fn push(&mut self, outcome: ItemOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn recorded(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Recorded { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&ItemOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }
}

/// The main orchestrator for the Summarist pipeline.
pub struct Orchestrator {
    registry: SourceRegistry,
    summarizer: Arc<Summarizer>,
    archiver: Arc<dyn Archiver>,
    processed: ProcessedSet,
}

impl Orchestrator {
    /// Build the pipeline from settings.
    ///
    /// Fails with a configuration error when no API key is available.
    pub fn new(settings: &Settings) -> Result<Self> {
        let api_key = settings.api_key().ok_or_else(|| {
            SummaristError::Config(
                "API key not configured. Set OPENAI_API_KEY or ai.api_key in config.".to_string(),
            )
        })?;

        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;
        let model = Arc::new(OpenAiModel::new(&settings.ai, &api_key)?);
        info!("Using model {} at {}", settings.ai.model, settings.ai.base_url);

        let downloader = Arc::new(YtDlp::new(&settings.downloader));
        let registry = SourceRegistry::new(downloader, settings.downloader.subtitle_languages.clone());

        let summarizer = Arc::new(Summarizer::new(model, prompts, &settings.summary));
        let archiver = Arc::new(MarkdownArchiver::new(settings.output_root()));
        let processed = ProcessedSet::load(&settings.state_path())?;

        Ok(Self::with_components(registry, summarizer, archiver, processed))
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        registry: SourceRegistry,
        summarizer: Arc<Summarizer>,
        archiver: Arc<dyn Archiver>,
        processed: ProcessedSet,
    ) -> Self {
        Self {
            registry,
            summarizer,
            archiver,
            processed,
        }
    }

    pub fn processed(&self) -> &ProcessedSet {
        &self.processed
    }

    /// Enumerate unprocessed items across enabled sources.
    ///
    /// A source that cannot be listed is logged and skipped.
    #[instrument(skip_all, fields(sources = sources.len()))]
    pub async fn scan_sources(&mut self, sources: &[SourceConfig]) -> Vec<Candidate> {
        let mut candidates = Vec::new();

        for source in sources.iter().filter(|s| s.enabled) {
            let fetcher = match self.registry.get(source.source_type) {
                Ok(f) => f,
                Err(e) => {
                    warn!("Skipping source '{}': {}", source.name, e);
                    continue;
                }
            };

            let items = match fetcher.list_items(&source.url).await {
                Ok(items) => items,
                Err(e) => {
                    warn!("Failed to list source '{}': {}", source.name, e);
                    continue;
                }
            };

            let total = items.len();
            let fresh: Vec<Candidate> = items
                .into_iter()
                .filter(|item| !self.processed.is_processed(source.source_type, &item.id))
                .map(|item| Candidate {
                    source_name: source.name.clone(),
                    source_type: source.source_type,
                    item,
                })
                .collect();

            info!("Source '{}': {} items, {} new", source.name, total, fresh.len());
            candidates.extend(fresh);
        }

        self.processed.mark_scanned(Utc::now());
        if let Err(e) = self.processed.save() {
            warn!("Failed to save scan time: {}", e);
        }

        candidates
    }

    /// Process one URL given on the command line.
    pub async fn process_url(&mut self, url: &str) -> ItemOutcome {
        match classify_source(url) {
            Ok(source_type) => self.process_item(source_type, url).await,
            Err(e) => failed(url, Stage::Classify, e),
        }
    }

    /// Process a candidate found by [`Orchestrator::scan_sources`].
    pub async fn process_candidate(&mut self, candidate: &Candidate) -> ItemOutcome {
        self.process_item(candidate.source_type, &candidate.item.url).await
    }

    /// Process candidates in order, calling `on_start` before each one.
    pub async fn process_batch(
        &mut self,
        candidates: &[Candidate],
        mut on_start: impl FnMut(usize, &Candidate),
    ) -> BatchReport {
        let mut report = BatchReport::default();
        for (i, candidate) in candidates.iter().enumerate() {
            on_start(i, candidate);
            let outcome = self.process_candidate(candidate).await;
            let stop = outcome.is_fatal();
            report.push(outcome);
            if stop {
                break;
            }
        }
        report
    }

    /// Process URLs in order, calling `on_start` before each one.
    pub async fn process_urls(&mut self, urls: &[String], mut on_start: impl FnMut(usize, &str)) -> BatchReport {
        let mut report = BatchReport::default();
        for (i, url) in urls.iter().enumerate() {
            on_start(i, url);
            let outcome = self.process_url(url).await;
            let stop = outcome.is_fatal();
            report.push(outcome);
            if stop {
                break;
            }
        }
        report
    }

    #[instrument(skip(self))]
    async fn process_item(&mut self, source_type: SourceType, url: &str) -> ItemOutcome {
        let fetcher = match self.registry.get(source_type) {
            Ok(f) => f,
            Err(e) => return failed(url, Stage::Classify, e),
        };

        let id = match fetcher.extract_id(url) {
            Ok(id) => id,
            Err(e) => return failed(url, Stage::Classify, e),
        };

        if self.processed.is_processed(source_type, &id) {
            info!("Skipping {} {}: already processed", source_type, id);
            return ItemOutcome::Skipped { source_type, id };
        }

        info!("Fetching {} item {}", fetcher.source_name(), id);
        let result = match fetcher.fetch_one(url).await {
            Ok(r) => r,
            Err(e) => return failed(url, Stage::Fetch, e),
        };

        let transcript = if result.transcript.trim().is_empty() {
            warn!("No transcript found for {}", url);
            EMPTY_TRANSCRIPT_PLACEHOLDER
        } else {
            result.transcript.as_str()
        };

        let summary = match self.summarizer.summarize(transcript).await {
            Ok(s) => s,
            Err(e) => return failed(url, Stage::Summarize, e),
        };

        let folder = match self.archiver.archive(
            source_type,
            &result.media,
            transcript,
            &summary,
            result.cover_path(),
        ) {
            Ok(folder) => folder,
            Err(e) => return failed(url, Stage::Archive, e),
        };

        self.processed.record(source_type, &result.media, Utc::now());
        if let Err(e) = self.processed.save() {
            // Keep memory in line with the file so a later save does not persist it
            self.processed.forget_last(source_type);
            return failed(url, Stage::Record, e);
        }

        ItemOutcome::Recorded {
            source_type,
            id: result.media.id.clone(),
            title: result.media.title.clone(),
            folder,
        }
    }
}

fn failed(url: &str, stage: Stage, e: SummaristError) -> ItemOutcome {
    error!("Failed to {} {}: {}", stage, url, e);
    ItemOutcome::Failed {
        url: url.to_string(),
        stage,
        error: e.to_string(),
        fatal: e.is_fatal_for_run(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::testing::FakeArchiver;
    use crate::config::SummarySettings;
    use crate::downloader::testing::FakeDownloader;
    use crate::media_source::{BilibiliSource, YoutubeSource};
    use crate::summarizer::testing::FakeModel;
    use std::path::Path;

    const INFO: &str = r#"{"title": "A talk", "channel": "Chan", "upload_date": "20240102"}"#;
    const URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

    struct Harness {
        downloader: Arc<FakeDownloader>,
        model: Arc<FakeModel>,
        archiver: Arc<FakeArchiver>,
    }

    impl Harness {
        fn new(downloader: FakeDownloader, model: FakeModel, archiver: FakeArchiver) -> Self {
            Self {
                downloader: Arc::new(downloader),
                model: Arc::new(model),
                archiver: Arc::new(archiver),
            }
        }

        fn working() -> Self {
            Self::new(
                FakeDownloader {
                    info: Some(INFO.to_string()),
                    ..FakeDownloader::default()
                },
                FakeModel::replying("```json\n{\"title\": \"Summary\", \"summary\": \"Body\"}\n```"),
                FakeArchiver::default(),
            )
        }

        fn orchestrator(&self, processed: ProcessedSet) -> Orchestrator {
            let mut registry = SourceRegistry::empty();
            let languages = vec!["en".to_string()];
            registry.register(Arc::new(YoutubeSource::new(self.downloader.clone(), languages.clone())));
            registry.register(Arc::new(BilibiliSource::new(self.downloader.clone(), languages)));

            let summarizer = Summarizer::new(self.model.clone(), Prompts::default(), &SummarySettings::default());
            Orchestrator::with_components(registry, Arc::new(summarizer), self.archiver.clone(), processed)
        }
    }

    fn scratch_state() -> (tempfile::TempDir, ProcessedSet) {
        let dir = tempfile::TempDir::new().unwrap();
        let set = ProcessedSet::empty(&dir.path().join("state.json"));
        (dir, set)
    }

    #[tokio::test]
    async fn test_second_run_is_skipped_without_side_effects() {
        let harness = Harness::working();
        let (_dir, state) = scratch_state();
        let mut orchestrator = harness.orchestrator(state);

        let first = orchestrator.process_url(URL).await;
        assert!(matches!(first, ItemOutcome::Recorded { ref id, .. } if id == "dQw4w9WgXcQ"));

        let fetches = harness.downloader.call_count();
        let second = orchestrator.process_url(URL).await;

        assert!(matches!(second, ItemOutcome::Skipped { source_type: SourceType::YouTube, .. }));
        assert_eq!(harness.downloader.call_count(), fetches);
        assert_eq!(harness.model.call_count(), 1);
        assert_eq!(harness.archiver.count(), 1);
    }

    #[tokio::test]
    async fn test_success_is_persisted() {
        let harness = Harness::working();
        let (dir, state) = scratch_state();
        let mut orchestrator = harness.orchestrator(state);

        orchestrator.process_url(URL).await;

        let reloaded = ProcessedSet::load(&dir.path().join("state.json")).unwrap();
        assert!(reloaded.is_processed(SourceType::YouTube, "dQw4w9WgXcQ"));
    }

    #[tokio::test]
    async fn test_summarize_failure_writes_no_archive() {
        let harness = Harness::new(
            FakeDownloader {
                info: Some(INFO.to_string()),
                ..FakeDownloader::default()
            },
            FakeModel::failing("rate limited"),
            FakeArchiver::default(),
        );
        let (_dir, state) = scratch_state();
        let mut orchestrator = harness.orchestrator(state);

        let outcome = orchestrator.process_url(URL).await;

        assert!(matches!(outcome, ItemOutcome::Failed { stage: Stage::Summarize, .. }));
        assert_eq!(harness.archiver.count(), 0);
        assert!(!orchestrator.processed().is_processed(SourceType::YouTube, "dQw4w9WgXcQ"));
    }

    #[tokio::test]
    async fn test_archive_failure_is_not_recorded() {
        let harness = Harness::new(
            FakeDownloader {
                info: Some(INFO.to_string()),
                ..FakeDownloader::default()
            },
            FakeModel::replying("plain summary"),
            FakeArchiver {
                fail: true,
                ..FakeArchiver::default()
            },
        );
        let (_dir, state) = scratch_state();
        let mut orchestrator = harness.orchestrator(state);

        let outcome = orchestrator.process_url(URL).await;

        assert!(matches!(outcome, ItemOutcome::Failed { stage: Stage::Archive, .. }));
        assert!(orchestrator.processed().is_empty());
    }

    #[tokio::test]
    async fn test_failed_save_is_not_recorded() {
        let harness = Harness::working();
        let dir = tempfile::TempDir::new().unwrap();
        // A directory where the state file should be makes the atomic replace fail
        let state_path = dir.path().join("state.json");
        std::fs::create_dir(&state_path).unwrap();
        let mut orchestrator = harness.orchestrator(ProcessedSet::empty(&state_path));

        let outcome = orchestrator.process_url(URL).await;

        assert!(matches!(outcome, ItemOutcome::Failed { stage: Stage::Record, .. }));
        assert!(!orchestrator.processed().is_processed(SourceType::YouTube, "dQw4w9WgXcQ"));
        assert!(orchestrator.processed().is_empty());
        assert_eq!(harness.archiver.count(), 1);
    }

    #[tokio::test]
    async fn test_empty_transcript_uses_placeholder() {
        let harness = Harness::working();
        let (_dir, state) = scratch_state();
        let mut orchestrator = harness.orchestrator(state);

        orchestrator.process_url(URL).await;

        let prompts = harness.model.prompts.lock().unwrap();
        assert!(prompts[0].contains(EMPTY_TRANSCRIPT_PLACEHOLDER));
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_run() {
        let harness = Harness::working();
        let (_dir, state) = scratch_state();
        let mut orchestrator = harness.orchestrator(state);

        let urls = vec![
            "https://vimeo.com/12345".to_string(),
            "https://www.youtube.com/watch?v=short".to_string(),
            URL.to_string(),
        ];
        let mut started = Vec::new();
        let report = orchestrator
            .process_urls(&urls, |i, _| started.push(i))
            .await;

        assert_eq!(started, vec![0, 1, 2]);
        assert!(matches!(report.outcomes[0], ItemOutcome::Failed { stage: Stage::Classify, .. }));
        assert!(matches!(report.outcomes[1], ItemOutcome::Failed { stage: Stage::Classify, .. }));
        assert_eq!(report.recorded(), 1);
        assert_eq!(report.failed(), 2);
        assert_eq!(report.skipped(), 0);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_reported() {
        let harness = Harness::new(
            FakeDownloader::default(),
            FakeModel::replying("unused"),
            FakeArchiver::default(),
        );
        let (_dir, state) = scratch_state();
        let mut orchestrator = harness.orchestrator(state);

        let outcome = orchestrator.process_url(URL).await;

        assert!(matches!(outcome, ItemOutcome::Failed { stage: Stage::Fetch, .. }));
        assert_eq!(harness.model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_scan_filters_processed_and_disabled() {
        let harness = Harness::new(
            FakeDownloader {
                info: Some(INFO.to_string()),
                listing: Some(
                    "{\"id\": \"aaaaaaaaaaa\", \"title\": \"Old\"}\n{\"id\": \"bbbbbbbbbbb\", \"title\": \"New\"}".to_string(),
                ),
                ..FakeDownloader::default()
            },
            FakeModel::replying("summary"),
            FakeArchiver::default(),
        );
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(
            &path,
            r#"{"processed": {"youtube": [{"video_id": "aaaaaaaaaaa"}]}}"#,
        )
        .unwrap();
        let mut orchestrator = harness.orchestrator(ProcessedSet::load(&path).unwrap());

        let sources = vec![
            SourceConfig {
                name: "Channel".to_string(),
                source_type: SourceType::YouTube,
                url: "https://www.youtube.com/@channel".to_string(),
                enabled: true,
            },
            SourceConfig {
                name: "Muted".to_string(),
                source_type: SourceType::YouTube,
                url: "https://www.youtube.com/@muted".to_string(),
                enabled: false,
            },
            SourceConfig {
                name: "Bad".to_string(),
                source_type: SourceType::Bilibili,
                url: "https://www.bilibili.com/".to_string(),
                enabled: true,
            },
        ];

        let candidates = orchestrator.scan_sources(&sources).await;

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].item.id, "bbbbbbbbbbb");
        assert_eq!(candidates[0].source_name, "Channel");
        assert!(orchestrator.processed().last_scan().is_some());

        let report = orchestrator.process_batch(&candidates, |_, _| {}).await;
        assert_eq!(report.recorded(), 1);
        assert!(Path::new(&path).exists());
    }
}
