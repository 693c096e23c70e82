//! Optional on-disk copy of raw upstream responses.
//!
//! Files are named `<source>_response_<local time>_<call id>_<short id>.json`
//! where the call id is the URL plus its query parameters with filesystem
//! hostile characters replaced by `_` and truncated to 100 characters.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{info, warn};

use crate::providers::ProviderInitError;

const MAX_IDENTIFIER_LEN: usize = 100;

/// Directory that receives pretty-printed JSON responses.
#[derive(Clone, Debug)]
pub struct ResponseArchive {
    dir: PathBuf,
}

impl ResponseArchive {
    /// Creates the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, ProviderInitError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| ProviderInitError::Archive {
            path: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `body` to a new file. Failures are logged and swallowed: the
    /// archive never fails the fetch it documents.
    pub fn save(
        &self,
        source: &str,
        url: &str,
        params: &[(&str, String)],
        body: &serde_json::Value,
    ) -> Option<PathBuf> {
        let name = format!(
            "{source}_response_{}_{}_{}.json",
            Local::now().format("%Y-%m-%d_%H-%M-%S"),
            call_identifier(url, params),
            &uuid::Uuid::new_v4().simple().to_string()[..8],
        );
        let path = self.dir.join(name);
        let written = serde_json::to_vec_pretty(body)
            .map_err(std::io::Error::other)
            .and_then(|bytes| fs::write(&path, bytes));
        match written {
            Ok(()) => {
                info!(path = %path.display(), "saved upstream response");
                Some(path)
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "could not save upstream response");
                None
            }
        }
    }
}

fn call_identifier(url: &str, params: &[(&str, String)]) -> String {
    let params_json = serde_json::Value::Object(
        params
            .iter()
            .map(|(k, v)| ((*k).to_string(), serde_json::Value::String(v.clone())))
            .collect(),
    );
    format!("{url}{params_json}")
        .chars()
        .map(|c| match c {
            '{' | '}' | ',' | '.' | '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            other => other,
        })
        .take(MAX_IDENTIFIER_LEN)
        .collect()
}
