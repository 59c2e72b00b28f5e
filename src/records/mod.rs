use std::ffi::OsStr;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use directories::UserDirs;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::config::AppConfig;

pub mod shape;

pub use shape::{derive_tags, RunTag, SplitColumn, TagCategory};

const RECORD_EXTENSION: &str = "json";
const DAY: Duration = Duration::from_secs(86_400);

/// One indexed run, as written by the SpeedrunIGT mod.
///
/// Split fields hold elapsed in-game milliseconds with `0` meaning the
/// split was never reached. They are usually absent from the raw JSON and
/// get populated from `timelines` after parsing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunRecord {
    pub world_name: String,
    pub mc_version: String,
    pub category: String,
    pub run_type: String,
    pub is_completed: bool,
    pub is_coop: bool,
    pub is_hardcore: bool,
    #[serde(default)]
    pub is_cheat_allowed: bool,
    /// Epoch milliseconds of run completion/save.
    pub date: i64,
    #[serde(default)]
    pub retimed_igt: i64,
    pub final_igt: i64,
    pub final_rta: i64,
    #[serde(default)]
    pub timelines: Vec<TimelineEvent>,

    #[serde(default)]
    pub enter_nether: i64,
    #[serde(default)]
    pub enter_bastion: i64,
    #[serde(default)]
    pub enter_fortress: i64,
    #[serde(default)]
    pub nether_travel: i64,
    #[serde(default)]
    pub enter_stronghold: i64,
    #[serde(default)]
    pub enter_end: i64,

    /// Record file this run was indexed from; filled in after parsing.
    #[serde(skip_deserializing, default)]
    pub source_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub name: String,
    pub igt: i64,
    pub rta: i64,
}

impl RunRecord {
    pub fn split(&self, column: SplitColumn) -> i64 {
        match column {
            SplitColumn::EnterNether => self.enter_nether,
            SplitColumn::EnterBastion => self.enter_bastion,
            SplitColumn::EnterFortress => self.enter_fortress,
            SplitColumn::NetherTravel => self.nether_travel,
            SplitColumn::EnterStronghold => self.enter_stronghold,
            SplitColumn::EnterEnd => self.enter_end,
        }
    }

    /// Copies recognized timeline events into the flat split fields.
    pub fn absorb_timelines(&mut self) {
        for event in &self.timelines {
            match event.name.as_str() {
                "enter_nether" => self.enter_nether = event.igt,
                "enter_bastion" => self.enter_bastion = event.igt,
                "enter_fortress" => self.enter_fortress = event.igt,
                "nether_travel" => self.nether_travel = event.igt,
                "enter_stronghold" => self.enter_stronghold = event.igt,
                "enter_end" => self.enter_end = event.igt,
                _ => {}
            }
        }
    }
}

/// Closed set of time windows a fetch can be scoped to.
///
/// Textual forms are lowercase (`today`, `yesterday`, `week`, `month`,
/// `all`); anything else fails to parse rather than defaulting.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Period {
    Today,
    Yesterday,
    Week,
    Month,
    All,
}

impl Period {
    pub fn label(self) -> &'static str {
        match self {
            Period::Today => "Today",
            Period::Yesterday => "Yesterday",
            Period::Week => "This Week",
            Period::Month => "This Month",
            Period::All => "All Time",
        }
    }

    /// Whether a record file with the given modification time falls inside
    /// this window. Windows are rolling, measured back from `now`:
    /// `yesterday` is the 24h–48h band, the rest are simple cutoffs.
    pub fn accepts(self, modified: SystemTime, now: SystemTime) -> bool {
        // A file stamped in the future counts as just written.
        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        match self {
            Period::All => true,
            Period::Today => age < DAY,
            Period::Yesterday => age >= DAY && age < 2 * DAY,
            Period::Week => age < 7 * DAY,
            Period::Month => age < 30 * DAY,
        }
    }
}

/// The capability the feed's transport calls to obtain records.
///
/// Production uses [`FileRecordSource`]; tests substitute fakes.
pub trait RecordSource: Send + 'static {
    fn fetch(&self, period: Period) -> Result<Vec<RunRecord>, SourceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl SourceError {
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            SourceError::Io(_) => "IoError",
            SourceError::Other(_) => "Other",
        }
    }

    /// Wire form carried across the fetch boundary. The feed only ever
    /// sees this opaque JSON and decodes the description defensively.
    pub fn payload(&self) -> String {
        serde_json::json!({
            "code": self.code(),
            "description": self.to_string(),
        })
        .to_string()
    }
}

impl From<&str> for SourceError {
    fn from(message: &str) -> SourceError {
        SourceError::Other(message.to_string())
    }
}

/// Indexes SpeedrunIGT record files straight off the filesystem.
#[derive(Debug, Clone)]
pub struct FileRecordSource {
    records_dir: PathBuf,
    min_run_igt_ms: i64,
}

impl FileRecordSource {
    pub fn new(records_dir: PathBuf, min_run_igt_ms: i64) -> Self {
        Self {
            records_dir,
            min_run_igt_ms,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, SourceError> {
        let records_dir = match &config.records_dir {
            Some(dir) => dir.clone(),
            None => default_records_dir()?,
        };
        Ok(Self::new(records_dir, config.min_run_igt_ms))
    }

    pub fn records_dir(&self) -> &Path {
        &self.records_dir
    }

    fn load_record(&self, path: &Path) -> Result<Option<RunRecord>, SourceError> {
        let reader = BufReader::new(File::open(path)?);
        let mut record: RunRecord = serde_json::from_reader(reader).map_err(|err| {
            SourceError::Other(format!("invalid record file {}: {err}", path.display()))
        })?;
        record.absorb_timelines();
        if record.final_igt < self.min_run_igt_ms {
            // Ultra-short runs are practice resets, not records.
            return Ok(None);
        }
        record.source_path = path.display().to_string();
        Ok(Some(record))
    }
}

impl RecordSource for FileRecordSource {
    fn fetch(&self, period: Period) -> Result<Vec<RunRecord>, SourceError> {
        if !self.records_dir.is_dir() {
            tracing::debug!(dir = %self.records_dir.display(), "records directory missing, nothing indexed yet");
            return Ok(Vec::new());
        }

        let now = SystemTime::now();
        let mut records = Vec::new();
        for entry in std::fs::read_dir(&self.records_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(OsStr::to_str) != Some(RECORD_EXTENSION) {
                continue;
            }
            let modified = match entry.metadata().and_then(|meta| meta.modified()) {
                Ok(modified) => modified,
                Err(err) => {
                    tracing::warn!(file = %path.display(), %err, "skipping record file without readable mtime");
                    continue;
                }
            };
            if !period.accepts(modified, now) {
                continue;
            }
            match self.load_record(&path) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(file = %path.display(), %err, "skipping unreadable record file");
                }
            }
        }

        records.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(records)
    }
}

pub fn default_records_dir() -> Result<PathBuf, SourceError> {
    let dirs = UserDirs::new().ok_or_else(|| SourceError::Other("home dir not found".to_string()))?;
    Ok(dirs.home_dir().join("speedrunigt").join("records"))
}
