//! Directory-backed store of tool-configuration documents.
//!
//! Documents are parsed on first use and cached by name together with the
//! source file's modification time. A cached document is re-parsed only when
//! the file's mtime advances or after an explicit [`ConfigStore::reload`].

use chatlink_core::{
    FunctionDeclaration, ProviderSchemas, SchemaProvider, ServerConfig, ToolConfigDocument,
};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;
use tracing::{debug, info, warn};

use crate::error::{ConfigError, ConfigResult, ValidationError};
use crate::validate;

const DOCUMENT_EXTENSION: &str = "json";

/// File stems containing any of these markers are never discovered.
const EXCLUDED_MARKERS: [&str; 3] = ["sample", "template", "example"];

struct CachedDocument {
    document: Arc<ToolConfigDocument>,
    loaded_at: DateTime<Utc>,
}

/// Parsed documents and the mtimes they were parsed at, guarded together.
#[derive(Default)]
struct DocumentCache {
    documents: HashMap<String, CachedDocument>,
    modified: HashMap<String, SystemTime>,
}

/// Loads, validates and caches named tool-configuration documents.
///
/// Safe to share between tasks: the cache is guarded by a single mutex and a
/// document is parsed while the lock is held, so concurrent first loads of
/// the same document parse it once.
pub struct ConfigStore {
    directory: PathBuf,
    feature_enabled: bool,
    cache: Mutex<DocumentCache>,
    parse_count: AtomicUsize,
}

impl ConfigStore {
    /// Create a store reading documents from `directory`.
    ///
    /// The feature flag defaults to enabled.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            feature_enabled: true,
            cache: Mutex::new(DocumentCache::default()),
            parse_count: AtomicUsize::new(0),
        }
    }

    /// Set the external feature flag consulted by [`ConfigStore::is_enabled`].
    #[must_use]
    pub const fn with_feature_enabled(mut self, enabled: bool) -> Self {
        self.feature_enabled = enabled;
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub const fn feature_enabled(&self) -> bool {
        self.feature_enabled
    }

    /// Number of document parses performed so far.
    pub fn parse_count(&self) -> usize {
        self.parse_count.load(Ordering::Relaxed)
    }

    /// Load a document by name, or the first discoverable one when `None`.
    pub fn load(&self, name: Option<&str>) -> ConfigResult<Arc<ToolConfigDocument>> {
        let name = self.resolve_name(name)?;
        let path = self.directory.join(&name);
        let modified = self.modified_time(&name, &path)?;

        let mut cache = self.lock_cache();
        if let (Some(cached), Some(seen)) = (cache.documents.get(&name), cache.modified.get(&name))
        {
            if modified <= *seen {
                debug!(config = %name, "Using cached tool configuration");
                return Ok(Arc::clone(&cached.document));
            }
            debug!(config = %name, "Tool configuration changed on disk, re-parsing");
        }

        let document = match self.parse(&name, &path) {
            Ok(document) => Arc::new(document),
            Err(e) => {
                cache.documents.remove(&name);
                cache.modified.remove(&name);
                warn!(config = %name, error = %e, "Failed to load tool configuration");
                return Err(e);
            }
        };

        info!(
            config = %name,
            functions = document.functions.len(),
            server = %document.server.base_url,
            "Loaded tool configuration"
        );

        cache.documents.insert(
            name.clone(),
            CachedDocument {
                document: Arc::clone(&document),
                loaded_at: Utc::now(),
            },
        );
        cache.modified.insert(name, modified);
        Ok(document)
    }

    /// Server settings of a document.
    pub fn server_config(&self, name: Option<&str>) -> ConfigResult<ServerConfig> {
        Ok(self.load(name)?.server.clone())
    }

    /// Provider-specific function schemas for the enabled functions of a document.
    pub fn schemas_for(
        &self,
        provider: SchemaProvider,
        name: Option<&str>,
    ) -> ConfigResult<ProviderSchemas> {
        let document = self.load(name)?;
        Ok(ProviderSchemas::build(provider, &document.functions))
    }

    /// Look up a function declaration by name.
    pub fn resolve_function(
        &self,
        function: &str,
        config_name: Option<&str>,
    ) -> ConfigResult<Option<FunctionDeclaration>> {
        Ok(self.load(config_name)?.function(function).cloned())
    }

    /// Validate call arguments against the function's declared rule.
    pub fn validate_arguments(
        &self,
        function: &str,
        arguments: &Map<String, Value>,
        config_name: Option<&str>,
    ) -> Result<(), ValidationError> {
        let document = self.load(config_name)?;
        validate::validate_arguments(&document, function, arguments)
    }

    /// Drop cached state for one document, or for all documents when `None`.
    pub fn reload(&self, name: Option<&str>) {
        let mut cache = self.lock_cache();
        match name {
            Some(name) => {
                let name = normalize_name(name);
                cache.documents.remove(&name);
                cache.modified.remove(&name);
                info!(config = %name, "Cleared cached tool configuration");
            }
            None => {
                cache.documents.clear();
                cache.modified.clear();
                info!("Cleared all cached tool configurations");
            }
        }
    }

    /// Names of every discoverable document, sorted.
    ///
    /// Sample and template files are skipped. A missing directory yields an
    /// empty list.
    pub fn list_available(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(
                    directory = %self.directory.display(),
                    error = %e,
                    "Configuration directory not readable"
                );
                return Vec::new();
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_discoverable(path))
            .filter_map(|path| path.file_name()?.to_str().map(str::to_string))
            .collect();
        names.sort();
        names
    }

    /// True when the feature flag is on and at least one document parses.
    pub fn is_enabled(&self) -> bool {
        if !self.feature_enabled {
            debug!("Tool calling disabled by feature flag");
            return false;
        }

        let enabled = self
            .list_available()
            .iter()
            .any(|name| self.load(Some(name.as_str())).is_ok());
        if !enabled {
            warn!(
                directory = %self.directory.display(),
                "No valid tool configuration found"
            );
        }
        enabled
    }

    /// When a cached document was last parsed.
    pub fn loaded_at(&self, name: &str) -> Option<DateTime<Utc>> {
        let name = normalize_name(name);
        self.lock_cache()
            .documents
            .get(&name)
            .map(|cached| cached.loaded_at)
    }

    /// Normalize an explicit name, or pick the first discoverable document.
    pub fn resolve_name(&self, name: Option<&str>) -> ConfigResult<String> {
        match name {
            Some(name) => {
                let name = normalize_name(name);
                if Path::new(&name).components().count() != 1 {
                    return Err(ConfigError::invalid(
                        &name,
                        "configuration names must be plain file names",
                    ));
                }
                Ok(name)
            }
            None => self
                .list_available()
                .into_iter()
                .next()
                .ok_or_else(|| ConfigError::NoDocuments {
                    directory: self.directory.clone(),
                }),
        }
    }

    fn modified_time(&self, name: &str, path: &Path) -> ConfigResult<SystemTime> {
        let io_error = |source: io::Error| {
            if source.kind() == io::ErrorKind::NotFound {
                ConfigError::NotFound {
                    name: name.to_string(),
                    directory: self.directory.clone(),
                }
            } else {
                ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        };

        fs::metadata(path)
            .and_then(|metadata| metadata.modified())
            .map_err(io_error)
    }

    fn parse(&self, name: &str, path: &Path) -> ConfigResult<ToolConfigDocument> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse_count.fetch_add(1, Ordering::Relaxed);
        debug!(config = %name, "Parsing tool configuration");

        let raw: Value = serde_json::from_str(&contents)
            .map_err(|e| ConfigError::invalid(name, format!("invalid JSON: {e}")))?;
        validate::check_structure(name, &raw)?;
        serde_json::from_value(raw).map_err(|e| ConfigError::invalid(name, e.to_string()))
    }

    fn lock_cache(&self) -> MutexGuard<'_, DocumentCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Append the `.json` extension when it is missing.
fn normalize_name(name: &str) -> String {
    let suffix = format!(".{DOCUMENT_EXTENSION}");
    if name.ends_with(&suffix) {
        name.to_string()
    } else {
        format!("{name}{suffix}")
    }
}

fn is_discoverable(path: &Path) -> bool {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(DOCUMENT_EXTENSION));
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    is_json && !EXCLUDED_MARKERS.iter().any(|marker| stem.contains(marker))
}
