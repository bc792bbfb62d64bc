/**
 * Voter Identity Store
 *
 * Keeps the client's voter id and the polls it has voted on in a small JSON
 * file (`voter.json`) under the platform data directory:
 *
 * ```json
 * {
 *   "voterId": "voter_4f1c...",
 *   "votedPolls": { "aB3dE5fG7h": { "optionIndex": 1, "votedAt": 1760000000000 } }
 * }
 * ```
 *
 * The record is advisory. It lets a returning viewer see their choice
 * immediately, but the server decides whether a vote counts.
 *
 * A corrupt file is treated as empty. The voter id is salvaged when only the
 * voted-polls map is damaged, so the client keeps its identity.
 */
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::client::error::ClientError;
use crate::shared::AppConfig;

/// Name of the identity file inside the data directory
pub const VOTER_FILE_NAME: &str = "voter.json";

/// Subdirectory of the platform data directory used by default
pub const APP_DIR_NAME: &str = "pollroom";

/// Local record of a vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalVote {
    pub option_index: i64,
    /// Unix time in milliseconds
    pub voted_at: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VoterFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    voter_id: Option<String>,
    #[serde(default)]
    voted_polls: BTreeMap<String, LocalVote>,
}

impl VoterFile {
    fn parse(raw: &str, path: &Path) -> Self {
        let value: serde_json::Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("[Identity] {} is not valid JSON, starting fresh: {}", path.display(), e);
                return Self::default();
            }
        };

        let voter_id = value
            .get("voterId")
            .and_then(|v| v.as_str())
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        let voted_polls = match value.get("votedPolls") {
            None => BTreeMap::new(),
            Some(polls) => serde_json::from_value(polls.clone()).unwrap_or_else(|e| {
                tracing::warn!("[Identity] Voted polls in {} are corrupt, clearing: {}", path.display(), e);
                BTreeMap::new()
            }),
        };

        Self { voter_id, voted_polls }
    }
}

/// File-backed voter identity
#[derive(Debug)]
pub struct VoterStore {
    path: PathBuf,
    state: Mutex<VoterFile>,
}

/// Generate a fresh voter id
pub fn generate_voter_id() -> String {
    format!("voter_{}", Uuid::new_v4().simple())
}

impl VoterStore {
    /// Open (or prepare) the identity file inside `dir`
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, ClientError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(VOTER_FILE_NAME);

        let state = match fs::read_to_string(&path) {
            Ok(raw) => VoterFile::parse(&raw, &path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => VoterFile::default(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    /// Open the store in the configured data directory, or the platform default
    pub fn open_default(config: &AppConfig) -> Result<Self, ClientError> {
        let dir = match &config.data_dir {
            Some(dir) => dir.clone(),
            None => dirs::data_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(APP_DIR_NAME),
        };
        Self::open(dir)
    }

    /// Path of the identity file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VoterFile> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, state: &VoterFile) -> Result<(), ClientError> {
        let json = serde_json::to_string_pretty(state)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// The persisted voter id, generated and saved on first use
    pub fn voter_id(&self) -> Result<String, ClientError> {
        let mut state = self.lock();
        if let Some(id) = &state.voter_id {
            return Ok(id.clone());
        }
        let id = generate_voter_id();
        state.voter_id = Some(id.clone());
        self.persist(&state)?;
        tracing::debug!("[Identity] Generated voter id {}", id);
        Ok(id)
    }

    /// Remember that this client voted `option_index` on `share_id`
    pub fn mark_poll_as_voted(&self, share_id: &str, option_index: i64) -> Result<(), ClientError> {
        let mut state = self.lock();
        state.voted_polls.insert(
            share_id.to_string(),
            LocalVote {
                option_index,
                voted_at: chrono::Utc::now().timestamp_millis(),
            },
        );
        self.persist(&state)
    }

    /// The local vote on `share_id`, if any
    pub fn has_voted_on_poll(&self, share_id: &str) -> Option<LocalVote> {
        self.lock().voted_polls.get(share_id).copied()
    }

    /// Every local vote, keyed by share id
    pub fn voted_polls(&self) -> BTreeMap<String, LocalVote> {
        self.lock().voted_polls.clone()
    }

    /// Drop the local vote on `share_id`
    ///
    /// Returns whether a record was removed.
    pub fn forget_poll(&self, share_id: &str) -> Result<bool, ClientError> {
        let mut state = self.lock();
        if state.voted_polls.remove(share_id).is_none() {
            return Ok(false);
        }
        self.persist(&state)?;
        Ok(true)
    }
}
