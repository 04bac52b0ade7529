//! Per-user sessions: staged uploads, one index, serialized actions

use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::analysis::{MetricExtractor, MetricsReport};
use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::index::{IndexBuilder, VectorIndex};
use crate::ingestion::{DirectoryLoader, LoadOutcome, SkippedFile};
use crate::providers::ModelContext;
use crate::retrieval::QueryEngine;
use crate::types::response::RejectedFile;
use crate::types::{
    Document, FileSummary, IngestResponse, QueryRequest, QueryResponse, SessionSummary,
};

const EMPTY_UPLOAD: &str = "Please upload a PDF first";

/// A file received from the client
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

#[derive(Default)]
struct SessionState {
    index: Option<VectorIndex>,
}

/// One user's workspace
pub struct Session {
    id: Uuid,
    created_at: DateTime<Utc>,
    last_used: parking_lot::Mutex<Instant>,
    staging_dir: PathBuf,
    config: Arc<RagConfig>,
    models: ModelContext,
    state: Mutex<SessionState>,
}

impl Session {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Replace the staged batch with `files` and rebuild the index from scratch.
    ///
    /// The new batch is written to a side directory and only replaces the
    /// staged files and the index once the index is built; on any error the
    /// previous batch stays usable.
    pub async fn process_upload(&self, files: Vec<UploadedFile>) -> Result<IngestResponse> {
        let start = Instant::now();

        let mut accepted = Vec::new();
        let mut rejected = Vec::new();
        for file in files {
            match sanitize_filename(&file.filename) {
                Some(name) if self.config.staging.accepts(&name) => accepted.push((name, file.bytes)),
                Some(_) => rejected.push(RejectedFile {
                    filename: file.filename,
                    reason: format!(
                        "Only {} files are accepted",
                        self.config.staging.allowed_extensions.join(", ")
                    ),
                }),
                None => rejected.push(RejectedFile {
                    filename: file.filename,
                    reason: "Invalid file name".to_string(),
                }),
            }
        }

        if accepted.is_empty() {
            return Err(Error::InvalidRequest(EMPTY_UPLOAD.to_string()));
        }

        let mut state = self.state.lock().await;
        let incoming = self.incoming_dir();

        let (index, skipped) = match self.build_batch(&incoming, &accepted).await {
            Ok(built) => built,
            Err(e) => {
                tracing::warn!(session = %self.id, "Upload failed, keeping previous batch: {}", e);
                if let Err(cleanup) = remove_dir_if_exists(&incoming).await {
                    tracing::warn!(session = %self.id, "Failed to clean up {}: {}", incoming.display(), cleanup);
                }
                return Err(e);
            }
        };

        // The old batch goes away only now that its replacement is ready
        state.index = None;
        remove_dir_if_exists(&self.staging_dir).await?;
        tokio::fs::rename(&incoming, &self.staging_dir).await?;

        rejected.extend(skipped.into_iter().map(|s| RejectedFile {
            filename: s.filename,
            reason: s.error,
        }));
        tracing::info!(
            session = %self.id,
            "Staged {} files ({} rejected)",
            accepted.len(),
            rejected.len()
        );

        let response = IngestResponse {
            files: FileSummary::from_documents(index.documents()),
            total_pages: index.page_count(),
            total_nodes: index.node_count(),
            processing_time_ms: start.elapsed().as_millis() as u64,
            rejected,
        };
        state.index = Some(index);

        Ok(response)
    }

    /// Write `files` into `dir`, load them and build an index
    async fn build_batch(
        &self,
        dir: &Path,
        files: &[(String, Bytes)],
    ) -> Result<(VectorIndex, Vec<SkippedFile>)> {
        remove_dir_if_exists(dir).await?;
        tokio::fs::create_dir_all(dir).await?;

        for (name, bytes) in files {
            tokio::fs::write(dir.join(name), bytes).await?;
        }

        let LoadOutcome { documents, skipped } = load_dir(dir.to_path_buf()).await?;

        if documents.is_empty() && !skipped.is_empty() {
            let reasons: Vec<String> = skipped
                .iter()
                .map(|s| format!("{}: {}", s.filename, s.error))
                .collect();
            return Err(Error::InvalidRequest(format!(
                "None of the uploaded files could be read ({})",
                reasons.join("; ")
            )));
        }

        let index = IndexBuilder::new(self.models.embedder.clone(), &self.config.index)
            .build(documents)
            .await?;

        Ok((index, skipped))
    }

    /// Answer a question against the current index
    pub async fn ask(&self, request: &QueryRequest) -> Result<QueryResponse> {
        let state = self.state.lock().await;
        let index = state.index.as_ref().ok_or(Error::NoIndex)?;

        let top_k = request.top_k.unwrap_or(self.config.index.similarity_top_k);
        QueryEngine::new(index, self.models.llm.clone())
            .with_top_k(top_k)
            .query(&request.question)
            .await
    }

    /// Re-load every staged page and extract metrics from each
    pub async fn extract_metrics(&self, fallback_year: Option<i32>) -> Result<MetricsReport> {
        let state = self.state.lock().await;
        if state.index.is_none() {
            return Err(Error::NoIndex);
        }

        let documents = load_dir(self.staging_dir.clone()).await?.documents;
        let fallback_year = fallback_year.unwrap_or(self.config.analytics.fallback_year);

        let run = MetricExtractor::new(self.models.llm.clone(), &self.config.analytics)
            .extract_all(&documents)
            .await;

        drop(state);
        Ok(MetricsReport::build(run, fallback_year))
    }

    /// Files and pages in the current batch
    pub async fn documents(&self) -> Vec<FileSummary> {
        let state = self.state.lock().await;
        state
            .index
            .as_ref()
            .map(|index| FileSummary::from_documents(index.documents()))
            .unwrap_or_default()
    }

    pub async fn summary(&self) -> SessionSummary {
        let state = self.state.lock().await;
        let index = state.index.as_ref();

        SessionSummary {
            session_id: self.id,
            created_at: self.created_at,
            indexed: index.is_some(),
            total_pages: index.map(VectorIndex::page_count).unwrap_or(0),
            total_nodes: index.map(VectorIndex::node_count).unwrap_or(0),
            files: index
                .map(|i| FileSummary::from_documents(i.documents()))
                .unwrap_or_default(),
        }
    }

    /// Side directory a new batch is built in before it replaces the staged one
    fn incoming_dir(&self) -> PathBuf {
        self.staging_dir.with_extension("incoming")
    }

    fn touch(&self) {
        *self.last_used.lock() = Instant::now();
    }

    /// Time since the session was last looked up
    pub fn idle_for(&self) -> Duration {
        self.last_used.lock().elapsed()
    }
}

async fn load_dir(dir: PathBuf) -> Result<LoadOutcome> {
    tokio::task::spawn_blocking(move || DirectoryLoader::new(dir).load_with_skipped())
        .await
        .map_err(|e| Error::internal(format!("Document loading task failed: {}", e)))?
}

async fn remove_dir_if_exists(dir: &Path) -> Result<()> {
    if tokio::fs::try_exists(dir).await? {
        tokio::fs::remove_dir_all(dir).await?;
    }
    Ok(())
}

/// Registry of live sessions
pub struct SessionManager {
    sessions: DashMap<Uuid, Arc<Session>>,
    config: Arc<RagConfig>,
    models: ModelContext,
}

impl SessionManager {
    pub fn new(config: Arc<RagConfig>, models: ModelContext) -> Self {
        Self {
            sessions: DashMap::new(),
            config,
            models,
        }
    }

    /// Create a session and its staging directory
    pub async fn create(&self) -> Result<Arc<Session>> {
        let id = Uuid::new_v4();
        let staging_dir = self.config.staging.data_dir.join(id.to_string());
        tokio::fs::create_dir_all(&staging_dir).await?;

        let session = Arc::new(Session {
            id,
            created_at: Utc::now(),
            last_used: parking_lot::Mutex::new(Instant::now()),
            staging_dir,
            config: Arc::clone(&self.config),
            models: self.models.clone(),
            state: Mutex::new(SessionState::default()),
        });
        self.sessions.insert(id, Arc::clone(&session));

        tracing::info!(session = %id, "Session created");
        Ok(session)
    }

    /// Look up a session, marking it as used
    pub fn get(&self, id: Uuid) -> Result<Arc<Session>> {
        let session = self
            .sessions
            .get(&id)
            .map(|s| Arc::clone(s.value()))
            .ok_or(Error::SessionNotFound(id))?;
        session.touch();
        Ok(session)
    }

    /// Drop a session's index and delete its staged files
    pub async fn remove(&self, id: Uuid) -> Result<()> {
        let (_, session) = self.sessions.remove(&id).ok_or(Error::SessionNotFound(id))?;
        Self::teardown(&session).await?;

        tracing::info!(session = %id, "Session removed");
        Ok(())
    }

    /// Remove every session not looked up for at least `ttl`; returns how many went away
    pub async fn evict_idle(&self, ttl: Duration) -> usize {
        let candidates: Vec<Uuid> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().idle_for() >= ttl)
            .map(|entry| *entry.key())
            .collect();

        let mut evicted = 0;
        for id in candidates {
            // Re-check under the map lock: the session may have been used meanwhile
            let Some((_, session)) = self.sessions.remove_if(&id, |_, s| s.idle_for() >= ttl)
            else {
                continue;
            };

            match Self::teardown(&session).await {
                Ok(()) => tracing::info!(session = %id, "Session expired after {:?} idle", ttl),
                Err(e) => tracing::warn!(session = %id, "Failed to clean up expired session: {}", e),
            }
            evicted += 1;
        }

        evicted
    }

    async fn teardown(session: &Session) -> Result<()> {
        // Wait for any in-flight action before deleting its files
        let mut state = session.state.lock().await;
        state.index = None;

        remove_dir_if_exists(&session.staging_dir).await?;
        remove_dir_if_exists(&session.incoming_dir()).await
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Reduce an uploaded name to a safe final path component
pub fn sanitize_filename(raw: &str) -> Option<String> {
    let name = raw.rsplit(['/', '\\']).next()?.trim();
    if name.is_empty() || name.starts_with('.') {
        return None;
    }
    Some(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("paper.pdf").as_deref(), Some("paper.pdf"));
        assert_eq!(sanitize_filename("../../etc/passwd.pdf").as_deref(), Some("passwd.pdf"));
        assert_eq!(sanitize_filename("C:\\Users\\me\\a.pdf").as_deref(), Some("a.pdf"));
        assert_eq!(sanitize_filename(".."), None);
        assert_eq!(sanitize_filename("dir/"), None);
        assert_eq!(sanitize_filename(".env"), None);
    }
}
