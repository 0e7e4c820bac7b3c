use crate::config::Config;
use crate::constants::{DEFINITION_EXTENSIONS, INDEXER_EXTENSIONS, PROGRESS_INTERVAL};
use crate::error::Result;
use crate::extract::{extract_from_definition, extract_from_source, CategoryTaxonomy};
use crate::infra::github::GithubClient;
use crate::pipeline::concurrency::map_with_concurrency;
use crate::pipeline::merge::merge;
use crate::types::{IgnoreList, KnownTrackerSet, TrackerRecord, TreeEntry};
use std::convert::Infallible;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Start,
    TreeFetched,
    DefinitionsExtracted,
    IndexersExtracted,
    Merged,
    Persisted,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Start => "start",
            RunState::TreeFetched => "tree_fetched",
            RunState::DefinitionsExtracted => "definitions_extracted",
            RunState::IndexersExtracted => "indexers_extracted",
            RunState::Merged => "merged",
            RunState::Persisted => "persisted",
            RunState::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub commit: String,
    pub tree_entries: usize,
    pub definition_files: usize,
    pub indexer_files: usize,
    pub definition_records: usize,
    pub indexer_records: usize,
    pub emitted: usize,
    pub output: PathBuf,
}

/// Which extractor a phase runs
#[derive(Debug, Clone, Copy)]
enum Phase {
    Definitions,
    Indexers,
}

impl Phase {
    fn label(self) -> &'static str {
        match self {
            Phase::Definitions => "Definitions",
            Phase::Indexers => "Indexers",
        }
    }
}

/// Logs every `PROGRESS_INTERVAL` items and once more on completion.
struct PhaseProgress {
    phase: Phase,
    total: usize,
    done: AtomicUsize,
}

impl PhaseProgress {
    fn new(phase: Phase, total: usize) -> Self {
        Self {
            phase,
            total,
            done: AtomicUsize::new(0),
        }
    }

    fn tick(&self) {
        let done = self.done.fetch_add(1, Ordering::SeqCst) + 1;
        if done % PROGRESS_INTERVAL == 0 || done == self.total {
            info!("{} processed: {}/{}", self.phase.label(), done, self.total);
        }
    }
}

/// Everything a single fetch-and-extract job needs, shared across tasks.
struct ExtractJob {
    github: Arc<GithubClient>,
    taxonomy: Arc<CategoryTaxonomy>,
    owner: String,
    repo: String,
    reference: String,
}

impl ExtractJob {
    async fn fetch_and_extract(&self, phase: Phase, entry: &TreeEntry) -> Result<Option<TrackerRecord>> {
        let raw = self
            .github
            .fetch_raw(&self.owner, &self.repo, &self.reference, &entry.path)
            .await?;
        match phase {
            Phase::Definitions => extract_from_definition(&raw, &self.taxonomy),
            Phase::Indexers => Ok(extract_from_source(&raw, &self.taxonomy)),
        }
    }

    /// Error boundary around one file: any failure is logged and becomes `None`.
    async fn run(&self, phase: Phase, entry: &TreeEntry) -> Option<TrackerRecord> {
        match self.fetch_and_extract(phase, entry).await {
            Ok(record) => record,
            Err(e) => {
                warn!(path = %entry.path, error = %e, "skipping file");
                None
            }
        }
    }
}

/// Drives one harvest run: tree fetch, both extraction passes, merge, persist.
pub struct Harvester {
    github: Arc<GithubClient>,
    config: Config,
    known: KnownTrackerSet,
    ignore: IgnoreList,
    taxonomy: Arc<CategoryTaxonomy>,
    state: RunState,
}

impl Harvester {
    pub fn new(
        github: GithubClient,
        config: Config,
        known: KnownTrackerSet,
        ignore: IgnoreList,
        taxonomy: CategoryTaxonomy,
    ) -> Self {
        Self {
            github: Arc::new(github),
            config,
            known,
            ignore,
            taxonomy: Arc::new(taxonomy),
            state: RunState::Start,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn has_token(&self) -> bool {
        self.github.has_token()
    }

    fn transition(&mut self, next: RunState) {
        info!(from = %self.state, to = %next, "state transition");
        self.state = next;
    }

    pub async fn run(&mut self) -> Result<RunSummary> {
        match self.run_stages().await {
            Ok(summary) => Ok(summary),
            Err(e) => {
                error!(state = %self.state, error = %e, "harvest run failed");
                self.transition(RunState::Failed);
                Err(e)
            }
        }
    }

    async fn run_stages(&mut self) -> Result<RunSummary> {
        let gh = self.config.github.clone();
        let mut summary = RunSummary {
            output: self.config.paths.output.clone(),
            ..RunSummary::default()
        };

        info!(owner = %gh.owner, repo = %gh.repo, branch = %gh.branch, "fetching repository tree");
        let commit = self
            .github
            .resolve_branch_head(&gh.owner, &gh.repo, &gh.branch)
            .await?;
        let tree = self.github.fetch_tree(&gh.owner, &gh.repo, &commit).await?;
        summary.tree_entries = tree.len();
        summary.commit = commit.clone();
        self.transition(RunState::TreeFetched);

        let (definitions, indexers) = self.partition(tree);
        summary.definition_files = definitions.len();
        summary.indexer_files = indexers.len();
        info!(
            "Found {} definitions and {} indexers",
            definitions.len(),
            indexers.len()
        );

        let job = Arc::new(ExtractJob {
            github: self.github.clone(),
            taxonomy: self.taxonomy.clone(),
            owner: gh.owner.clone(),
            repo: gh.repo.clone(),
            reference: commit,
        });

        let mut candidates = self
            .extract_phase(&job, Phase::Definitions, definitions, self.config.concurrency.definitions)
            .await;
        summary.definition_records = candidates.len();
        info!("Without indexers: {}", candidates.len());
        self.transition(RunState::DefinitionsExtracted);

        let from_sources = self
            .extract_phase(&job, Phase::Indexers, indexers, self.config.concurrency.indexers)
            .await;
        summary.indexer_records = from_sources.len();
        candidates.extend(from_sources);
        info!("With indexers: {}", candidates.len());
        self.transition(RunState::IndexersExtracted);

        let dataset = merge(&self.known, &self.ignore, candidates);
        summary.emitted = dataset.len();
        self.transition(RunState::Merged);

        dataset.write_to(&self.config.paths.output)?;
        info!(
            path = %self.config.paths.output.display(),
            trackers = dataset.len(),
            "output overwritten with latest data"
        );
        self.transition(RunState::Persisted);

        Ok(summary)
    }

    /// Split the tree into definition files and indexer sources.
    fn partition(&self, tree: Vec<TreeEntry>) -> (Vec<TreeEntry>, Vec<TreeEntry>) {
        let paths = &self.config.paths;
        let mut definitions = Vec::new();
        let mut indexers = Vec::new();
        for entry in tree {
            if entry.matches(&paths.definitions_prefix, DEFINITION_EXTENSIONS) {
                definitions.push(entry);
            } else if entry.matches(&paths.indexers_prefix, INDEXER_EXTENSIONS) {
                indexers.push(entry);
            }
        }
        (definitions, indexers)
    }

    #[instrument(skip(self, job, entries), fields(phase = phase.label(), files = entries.len()))]
    async fn extract_phase(
        &self,
        job: &Arc<ExtractJob>,
        phase: Phase,
        entries: Vec<TreeEntry>,
        limit: usize,
    ) -> Vec<TrackerRecord> {
        let progress = Arc::new(PhaseProgress::new(phase, entries.len()));

        let results = map_with_concurrency(entries, limit, |entry| {
            let job = job.clone();
            let progress = progress.clone();
            async move {
                let record = job.run(phase, &entry).await;
                progress.tick();
                Ok::<_, Infallible>(record)
            }
        })
        .await
        .unwrap_or_else(|never| match never {});

        results.into_iter().flatten().collect()
    }
}
