/// Upstream repository that carries the tracker definitions and indexers
pub const JACKETT_OWNER: &str = "Jackett";
pub const JACKETT_REPO: &str = "Jackett";
pub const JACKETT_BRANCH: &str = "master";

pub const GITHUB_API: &str = "https://api.github.com";
pub const RAW_BASE: &str = "https://raw.githubusercontent.com";
pub const USER_AGENT: &str = "private-trackers-spreadsheet/1.0";
pub const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// Environment variable holding the optional bearer token
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

// Candidate file locations inside the Jackett tree
pub const DEFINITIONS_PREFIX: &str = "src/Jackett.Common/Definitions/";
pub const INDEXERS_PREFIX: &str = "src/Jackett.Common/Indexers/";
pub const DEFINITION_EXTENSIONS: &[&str] = &[".yml", ".yaml"];
pub const INDEXER_EXTENSIONS: &[&str] = &[".cs"];

// Per-phase in-flight limits, kept low to stay clear of secondary rate limits
pub const DEFINITIONS_CONCURRENCY: usize = 3;
pub const INDEXERS_CONCURRENCY: usize = 2;

/// Progress is logged every this many processed items
pub const PROGRESS_INTERVAL: usize = 25;

// Retry schedule
pub const MAX_ATTEMPTS: u32 = 6;
pub const BACKOFF_BASE_MS: u64 = 500;
pub const BACKOFF_CAP_MS: u64 = 60_000;
pub const JITTER_MS: u64 = 250;

pub const KNOWN_DATASET_PATH: &str = "trackers.json";
pub const OUTPUT_PATH: &str = "trackers2.json";

pub const UPSTREAM_DATASET_URL: &str =
    "https://raw.githubusercontent.com/HDVinnie/Private-Trackers-Spreadsheet/master/trackers.json";
pub const SYNC_EXCLUDED_FIELDS: &[&str] = &["Observatory Grade"];

/// Normalized tracker names that are never emitted, usually alternate
/// login flavours of a tracker that is already listed.
pub const DEFAULT_IGNORE: &[&str] = &[
    "beyond-hd (oneurl)",
    "efecto doppler",
    "empornium2fa",
    "hdbits (api)",
    "hon3y hd",
    "insane tracker",
    "jptv",
    "m-team - tp",
    "mteamtp2fa",
    "racing4everyone (r4e)",
    "snowpt",
    "the geeks",
    "the place",
    "the vault",
    "totheglorycookie",
    "xwtorrents",
];
