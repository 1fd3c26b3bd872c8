use std::time::Duration;

/// Eviction policy for the result cache (spec §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionPolicy {
    Lru,
    Mru,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub capacity: usize,
    pub ttl: Duration,
    pub policy: EvictionPolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            capacity: 1000,
            ttl: Duration::from_secs(5 * 60),
            policy: EvictionPolicy::Lru,
        }
    }
}

/// Regex traversal budgets (spec §4.6).
#[derive(Debug, Clone, Copy)]
pub struct RegexConfig {
    pub max_depth: usize,
    pub timeout_ms: u64,
    pub case_sensitive: bool,
    pub whole_word: bool,
}

impl Default for RegexConfig {
    fn default() -> Self {
        RegexConfig {
            max_depth: 50,
            timeout_ms: 5000,
            case_sensitive: false,
            whole_word: false,
        }
    }
}

/// Required-field validation applied by `SearchEngine::add_documents`.
#[derive(Debug, Clone, Default)]
pub struct ValidationConfig {
    pub required_fields: Vec<String>,
}

/// Version history retention for `IndexManager::update_document` (spec §4.4).
#[derive(Debug, Clone, Copy)]
pub struct VersioningConfig {
    pub enabled: bool,
    pub max_versions: usize,
}

impl Default for VersioningConfig {
    fn default() -> Self {
        VersioningConfig {
            enabled: false,
            max_versions: 10,
        }
    }
}

/// Construction-time engine configuration (analogous to the teacher's
/// `Config`, expanded with the knobs this spec requires).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub index_name: String,
    /// Dot-notation field paths fed to the trie (spec §3 "Indexable fields").
    pub indexed_fields: Vec<String>,
    pub max_word_length: usize,
    pub stop_words: Vec<String>,
    pub cache: CacheConfig,
    pub regex: RegexConfig,
    pub validation: ValidationConfig,
    pub versioning: VersioningConfig,
}

impl EngineConfig {
    pub fn new(index_name: impl Into<String>, indexed_fields: Vec<String>) -> Self {
        EngineConfig {
            index_name: index_name.into(),
            indexed_fields,
            ..EngineConfig::default()
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            index_name: "default".to_string(),
            indexed_fields: vec!["content.text".to_string()],
            max_word_length: 50,
            stop_words: default_stop_words(),
            cache: CacheConfig::default(),
            regex: RegexConfig::default(),
            validation: ValidationConfig::default(),
            versioning: VersioningConfig::default(),
        }
    }
}

/// The closed stop-word set spec §4.5 step 4 refers to as "the closed set
/// used in the source".
pub fn default_stop_words() -> Vec<String> {
    [
        "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has",
        "he", "in", "is", "it", "its", "of", "on", "that", "the", "to", "was",
        "will", "with",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
