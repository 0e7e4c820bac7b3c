use anyhow::Result;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;
use tracker_harvester::app::ports::{HttpClientPort, HttpGetResult, HttpRequest};
use tracker_harvester::config::Config;
use tracker_harvester::error::HarvestError;
use tracker_harvester::extract::CategoryTaxonomy;
use tracker_harvester::infra::github::GithubClient;
use tracker_harvester::infra::http_client::{RetryPolicy, RetryingHttp};
use tracker_harvester::pipeline::{Harvester, RunState};
use tracker_harvester::types::{IgnoreList, KnownTrackerSet};

const BRANCH_URL: &str = "https://api.github.com/repos/Jackett/Jackett/branches/master";
const TREE_URL: &str = "https://api.github.com/repos/Jackett/Jackett/git/trees/c0ffee?recursive=1";
const RAW: &str = "https://raw.githubusercontent.com/Jackett/Jackett/c0ffee/";

/// Serves canned responses per URL; each URL may have a queue of responses,
/// the last of which repeats.
struct FakeGithub {
    routes: Mutex<HashMap<String, VecDeque<(u16, String)>>>,
    hits: Mutex<HashMap<String, usize>>,
}

impl FakeGithub {
    fn new() -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
            hits: Mutex::new(HashMap::new()),
        }
    }

    fn route(self, url: &str, responses: Vec<(u16, &str)>) -> Self {
        self.routes.lock().unwrap().insert(
            url.to_string(),
            responses
                .into_iter()
                .map(|(s, b)| (s, b.to_string()))
                .collect(),
        );
        self
    }

    fn hits(&self, url: &str) -> usize {
        self.hits.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl HttpClientPort for FakeGithub {
    async fn get(&self, request: &HttpRequest) -> tracker_harvester::error::Result<HttpGetResult> {
        *self
            .hits
            .lock()
            .unwrap()
            .entry(request.url.clone())
            .or_insert(0) += 1;

        let mut routes = self.routes.lock().unwrap();
        let (status, body) = match routes.get_mut(&request.url) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap(),
            None => (404, "Not Found".to_string()),
        };
        Ok(HttpGetResult {
            status,
            body,
            retry_after: None,
        })
    }
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 6,
        base: Duration::from_millis(1),
        cap: Duration::from_millis(4),
        jitter: Duration::ZERO,
    }
}

fn harvester(port: Arc<FakeGithub>, output: std::path::PathBuf, known: KnownTrackerSet) -> Harvester {
    let mut config = Config::default();
    config.paths.output = output;
    let github = GithubClient::new(RetryingHttp::new(port, fast_retry()), &config.github);
    Harvester::new(
        github,
        config,
        known,
        IgnoreList::default(),
        CategoryTaxonomy::default(),
    )
}

const TREE: &str = r#"{
  "sha": "c0ffee",
  "truncated": false,
  "tree": [
    {"path": "src/Jackett.Common/Definitions", "type": "tree"},
    {"path": "src/Jackett.Common/Definitions/zeta.yml", "type": "blob"},
    {"path": "src/Jackett.Common/Definitions/alpha.yml", "type": "blob"},
    {"path": "src/Jackett.Common/Definitions/public.yml", "type": "blob"},
    {"path": "src/Jackett.Common/Definitions/broken.yml", "type": "blob"},
    {"path": "src/Jackett.Common/Definitions/missing.yml", "type": "blob"},
    {"path": "src/Jackett.Common/Definitions/jptv.yaml", "type": "blob"},
    {"path": "src/Jackett.Common/Indexers/Omega.cs", "type": "blob"},
    {"path": "src/Jackett.Common/Indexers/PublicOne.cs", "type": "blob"},
    {"path": "src/Jackett.Common/Content/logo.png", "type": "blob"}
  ]
}"#;

const ZETA: &str = "id: zeta\nname: Zeta\ndescription: Zeta tracker\ntype: private\ncaps:\n  categorymappings:\n    - {id: 1, cat: TV/HD}\n    - {id: 2, cat: Movies/SD}\n";
const ALPHA: &str = "id: alpha\nname: alpha\ntype: private\n";
const PUBLIC: &str = "id: pub\nname: Public\ntype: public\n";
const BROKEN: &str = "name: [oops\ntype: private\n";
const JPTV: &str = "name: JPTV\ntype: private\n";

const OMEGA: &str = r#"
    public class Omega : BaseWebIndexer
    {
        public Omega(IIndexerConfigurationService configService)
            : base(id: "omega",
                   name: "Omega",
                   description: "Omega private tracker",
                   link: "https://omega.example/")
        {
            Type = "private";
            AddCategoryMapping(1, TorznabCatType.TVAnime, "Anime");
            AddCategoryMapping(2, TorznabCatType.MoviesHD, "HD");
        }
    }
"#;

const PUBLIC_CS: &str = r#"
            : base(id: "publicone", name: "Public One", description: "open", link: "x")
        {
            Type = "public";
        }
"#;

fn full_site() -> FakeGithub {
    FakeGithub::new()
        .route(BRANCH_URL, vec![(200, r#"{"name":"master","commit":{"sha":"c0ffee"}}"#)])
        .route(TREE_URL, vec![(200, TREE)])
        .route(&format!("{RAW}src/Jackett.Common/Definitions/zeta.yml"), vec![(503, ""), (503, ""), (200, ZETA)])
        .route(&format!("{RAW}src/Jackett.Common/Definitions/alpha.yml"), vec![(200, ALPHA)])
        .route(&format!("{RAW}src/Jackett.Common/Definitions/public.yml"), vec![(200, PUBLIC)])
        .route(&format!("{RAW}src/Jackett.Common/Definitions/broken.yml"), vec![(200, BROKEN)])
        .route(&format!("{RAW}src/Jackett.Common/Definitions/jptv.yaml"), vec![(200, JPTV)])
        .route(&format!("{RAW}src/Jackett.Common/Indexers/Omega.cs"), vec![(200, OMEGA)])
        .route(&format!("{RAW}src/Jackett.Common/Indexers/PublicOne.cs"), vec![(200, PUBLIC_CS)])
}

#[tokio::test]
async fn test_full_run_writes_filtered_sorted_output() -> Result<()> {
    let dir = tempdir()?;
    let output = dir.path().join("trackers2.json");
    let port = Arc::new(full_site());
    let known = KnownTrackerSet::from_json_str(r#"{"trackers": [{"Name": "Alpha"}]}"#)?;

    let mut harvester = harvester(port.clone(), output.clone(), known);
    let summary = harvester.run().await?;

    assert_eq!(harvester.state(), RunState::Persisted);
    assert_eq!(summary.commit, "c0ffee");
    assert_eq!(summary.definition_files, 6);
    assert_eq!(summary.indexer_files, 2);
    // zeta, alpha, jptv from definitions; omega from sources
    assert_eq!(summary.definition_records, 3);
    assert_eq!(summary.indexer_records, 1);
    assert_eq!(summary.emitted, 2);

    // 503 twice, then success
    assert_eq!(port.hits(&format!("{RAW}src/Jackett.Common/Definitions/zeta.yml")), 3);
    // Logo is neither a definition nor an indexer
    assert_eq!(port.hits(&format!("{RAW}src/Jackett.Common/Content/logo.png")), 0);

    let written = std::fs::read_to_string(&output)?;
    assert!(written.ends_with('\n'));
    let value: serde_json::Value = serde_json::from_str(&written)?;
    let trackers = value["trackers"].as_array().unwrap();
    assert_eq!(trackers.len(), 2);
    assert_eq!(trackers[0]["name"], "Omega");
    assert_eq!(trackers[0]["description"], "Omega private tracker");
    assert_eq!(trackers[0]["type"], "Anime, Movies");
    assert_eq!(trackers[1]["name"], "Zeta");
    assert_eq!(trackers[1]["type"], "TV, Movies");
    Ok(())
}

#[tokio::test]
async fn test_output_is_overwritten() -> Result<()> {
    let dir = tempdir()?;
    let output = dir.path().join("out.json");
    std::fs::write(&output, "stale content that is not json")?;

    let mut harvester = harvester(Arc::new(full_site()), output.clone(), KnownTrackerSet::default());
    harvester.run().await?;

    let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&output)?)?;
    assert_eq!(value["trackers"].as_array().unwrap().len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_branch_failure_aborts_the_run() -> Result<()> {
    let dir = tempdir()?;
    let output = dir.path().join("out.json");
    let port = Arc::new(FakeGithub::new().route(BRANCH_URL, vec![(403, "API rate limit exceeded")]));

    let mut harvester = harvester(port, output.clone(), KnownTrackerSet::default());
    let err = harvester.run().await.unwrap_err();

    assert!(matches!(err, HarvestError::Fetch { status: 403, .. }));
    assert_eq!(harvester.state(), RunState::Failed);
    assert!(!output.exists());
    Ok(())
}

#[tokio::test]
async fn test_missing_tree_listing_aborts_the_run() -> Result<()> {
    let dir = tempdir()?;
    let port = Arc::new(
        FakeGithub::new()
            .route(BRANCH_URL, vec![(200, r#"{"commit":{"sha":"c0ffee"}}"#)])
            .route(TREE_URL, vec![(200, r#"{"message":"oops"}"#)]),
    );

    let mut harvester = harvester(port, dir.path().join("out.json"), KnownTrackerSet::default());
    let err = harvester.run().await.unwrap_err();

    assert!(matches!(err, HarvestError::InvalidResponse { .. }));
    assert_eq!(harvester.state(), RunState::Failed);
    Ok(())
}

#[tokio::test]
async fn test_exhausted_retries_on_tree_abort_the_run() -> Result<()> {
    let dir = tempdir()?;
    let port = Arc::new(
        FakeGithub::new()
            .route(BRANCH_URL, vec![(200, r#"{"commit":{"sha":"c0ffee"}}"#)])
            .route(TREE_URL, vec![(502, "")]),
    );

    let mut harvester = harvester(port.clone(), dir.path().join("out.json"), KnownTrackerSet::default());
    let err = harvester.run().await.unwrap_err();

    assert!(matches!(
        err,
        HarvestError::FetchExhausted {
            attempts: 6,
            last_status: 502
        }
    ));
    assert_eq!(port.hits(TREE_URL), 6);
    Ok(())
}
