//! Configuration for the research RAG system
//!
//! A [`RagConfig`] is built once per process (defaults, then an optional TOML
//! file, then environment overrides) and handed explicitly to every component
//! that needs it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable naming an optional TOML config file
pub const CONFIG_PATH_ENV: &str = "RAG_CONFIG";

/// Main RAG system configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Embedding configuration
    #[serde(default)]
    pub embeddings: EmbeddingConfig,
    /// Chat-completion backend configuration
    #[serde(default)]
    pub llm: LlmConfig,
    /// Vector index configuration
    #[serde(default)]
    pub index: IndexConfig,
    /// Upload staging configuration
    #[serde(default)]
    pub staging: StagingConfig,
    /// Metric extraction configuration
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

impl RagConfig {
    /// Load configuration: defaults, then `path` (or `$RAG_CONFIG`) if given, then env overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parse TOML config text
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
    }

    /// Apply environment overrides on top of the current values
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("RAG_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("RAG_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| Error::Config(format!("RAG_PORT is not a valid port: {}", port)))?;
        }
        if let Ok(dir) = std::env::var("RAG_DATA_DIR") {
            self.staging.data_dir = PathBuf::from(dir);
        }
        if let Ok(model) = std::env::var("GROQ_MODEL") {
            self.llm.model = model;
        }
        if let Ok(url) = std::env::var("OLLAMA_URL") {
            self.embeddings.base_url = url.clone();
            if self.llm.backend == LlmBackend::Ollama {
                self.llm.base_url = url;
            }
        }
        if let Ok(ttl) = std::env::var("RAG_SESSION_TTL_SECS") {
            self.staging.session_ttl_secs = ttl.parse().map_err(|_| {
                Error::Config(format!("RAG_SESSION_TTL_SECS is not a number of seconds: {}", ttl))
            })?;
        }
        if let Ok(year) = std::env::var("RAG_FALLBACK_YEAR") {
            self.analytics.fallback_year = year.parse().map_err(|_| {
                Error::Config(format!("RAG_FALLBACK_YEAR is not a year: {}", year))
            })?;
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 100MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
            max_upload_size: 100 * 1024 * 1024, // 100MB
        }
    }
}

/// Which embedding backend to build
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Ollama `/api/embeddings`
    #[default]
    Ollama,
    /// Local ONNX model (requires the `onnx` feature)
    Onnx,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Backend to use
    #[serde(default)]
    pub backend: EmbeddingBackend,
    /// Model name (Ollama tag or HuggingFace repo for ONNX)
    pub model: String,
    /// Embedding dimensions
    pub dimensions: usize,
    /// Batch size for embedding generation
    pub batch_size: usize,
    /// Maximum sequence length (ONNX only)
    pub max_length: usize,
    /// Ollama base URL
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Cache directory for downloaded models
    pub cache_dir: PathBuf,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::Ollama,
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            batch_size: 32,
            max_length: 512,
            base_url: "http://localhost:11434".to_string(),
            timeout_secs: 60,
            cache_dir: dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("research-rag")
                .join("models"),
        }
    }
}

impl EmbeddingConfig {
    /// Settings for the local bge-small model
    pub fn bge_small() -> Self {
        Self {
            backend: EmbeddingBackend::Onnx,
            model: "BAAI/bge-small-en-v1.5".to_string(),
            dimensions: 384,
            ..Self::default()
        }
    }
}

/// Which chat-completion backend to build
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    /// Groq OpenAI-compatible API
    #[default]
    Groq,
    /// Local Ollama `/api/chat`
    Ollama,
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Backend to use
    #[serde(default)]
    pub backend: LlmBackend,
    /// API base URL
    pub base_url: String,
    /// Generation model name
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Client-level retries for failed requests (0 = fail on first error)
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: LlmBackend::Groq,
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            temperature: 0.1,
            timeout_secs: 60,
            max_retries: 0,
        }
    }
}

impl LlmConfig {
    /// Ollama defaults for running without an API key
    pub fn ollama() -> Self {
        Self {
            backend: LlmBackend::Ollama,
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2:3b".to_string(),
            timeout_secs: 120,
            ..Self::default()
        }
    }

    /// Read the API key from the environment, failing fast when it is absent or blank
    pub fn api_key(&self) -> Result<String> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(Error::MissingCredential(self.api_key_env.clone())),
        }
    }
}

/// Vector index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Collection name inside the in-memory store
    pub collection_name: String,
    /// Number of nodes retrieved per question
    pub similarity_top_k: usize,
    /// Target node size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive nodes in characters
    pub chunk_overlap: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            collection_name: "research_papers".to_string(),
            similarity_top_k: 5,
            chunk_size: 1024,
            chunk_overlap: 200,
        }
    }
}

/// Upload staging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagingConfig {
    /// Root directory for staged uploads (one subdirectory per session)
    pub data_dir: PathBuf,
    /// Extensions accepted on upload (lowercase, no dot)
    pub allowed_extensions: Vec<String>,
    /// Sessions unused for this many seconds are removed (0 = never)
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

fn default_session_ttl_secs() -> u64 {
    60 * 60
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/raw"),
            allowed_extensions: vec!["pdf".to_string()],
            session_ttl_secs: default_session_ttl_secs(),
        }
    }
}

impl StagingConfig {
    /// Whether an uploaded filename has an accepted extension
    pub fn accepts(&self, filename: &str) -> bool {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        self.allowed_extensions.iter().any(|allowed| *allowed == ext)
    }
}

/// Metric extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Characters of each page sent to the extractor
    pub extract_char_limit: usize,
    /// Year assigned to metrics the model returned without one
    pub fallback_year: i32,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            extract_char_limit: 2000,
            fallback_year: 2013,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RagConfig::default();
        assert_eq!(config.index.collection_name, "research_papers");
        assert_eq!(config.index.similarity_top_k, 5);
        assert_eq!(config.llm.model, "llama-3.3-70b-versatile");
        assert_eq!(config.analytics.extract_char_limit, 2000);
        assert_eq!(config.analytics.fallback_year, 2013);
        assert_eq!(config.staging.data_dir, PathBuf::from("data/raw"));
        assert_eq!(config.staging.session_ttl_secs, 3600);
    }

    #[test]
    fn test_partial_toml() {
        let config = RagConfig::from_toml_str(
            r#"
            [staging]
            data_dir = "/tmp/papers"
            allowed_extensions = ["pdf"]

            [analytics]
            extract_char_limit = 500
            fallback_year = 2020

            [llm]
            backend = "ollama"
            base_url = "http://localhost:11434"
            model = "llama3.2:3b"
            api_key_env = "UNUSED"
            temperature = 0.0
            timeout_secs = 30
            max_retries = 1
            "#,
        )
        .unwrap();

        assert_eq!(config.analytics.fallback_year, 2020);
        assert_eq!(config.staging.session_ttl_secs, 3600);
        assert_eq!(config.llm.backend, LlmBackend::Ollama);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_missing_api_key() {
        let llm = LlmConfig {
            api_key_env: "RESEARCH_RAG_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..LlmConfig::default()
        };
        match llm.api_key() {
            Err(Error::MissingCredential(name)) => {
                assert_eq!(name, "RESEARCH_RAG_TEST_KEY_THAT_IS_NEVER_SET")
            }
            other => panic!("expected missing credential, got {:?}", other),
        }
    }

    #[test]
    fn test_staging_accepts_pdf_only() {
        let staging = StagingConfig::default();
        assert!(staging.accepts("paper.pdf"));
        assert!(staging.accepts("PAPER.PDF"));
        assert!(!staging.accepts("notes.txt"));
        assert!(!staging.accepts("pdf"));
    }
}
