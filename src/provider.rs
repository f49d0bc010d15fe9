//! Resolves a named pretrained model to a loaded [`VectorStore`], via the
//! local cache or a one-time download of the gensim-data release archive.
//!
//! The core only ever sees the resulting store; how it was obtained stays
//! in here. First use of a named model downloads and gunzips the archive
//! into the cache directory; after the first parse a native cache
//! (`.vocab` + `.vec`) is written beside it so later loads skip parsing.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::download;
use crate::error::{Error, Result};
use crate::formats;
use crate::store::VectorStore;

const RELEASE_BASE: &str = "https://github.com/RaRe-Technologies/gensim-data/releases/download";

/// Corpus a GloVe model was trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GloveCorpus {
    WikiGigaword,
    Twitter,
}

impl GloveCorpus {
    fn slug(self) -> &'static str {
        match self {
            GloveCorpus::WikiGigaword => "wiki-gigaword",
            GloveCorpus::Twitter => "twitter",
        }
    }

    /// Dimensions published for this corpus.
    pub fn dims(self) -> &'static [usize] {
        match self {
            GloveCorpus::WikiGigaword => &[50, 100, 200, 300],
            GloveCorpus::Twitter => &[25, 50, 100, 200],
        }
    }
}

impl fmt::Display for GloveCorpus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Which embedding model to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSpec {
    /// Google News word2vec, 300 dimensions, binary format.
    Word2VecGoogleNews,
    /// GloVe in text format.
    Glove { corpus: GloveCorpus, dim: usize },
    /// A local embedding file in text or word2vec binary format.
    Custom { path: PathBuf, binary: bool },
}

impl ModelSpec {
    /// Canonical model name, matching the gensim-data release names.
    pub fn name(&self) -> String {
        match self {
            ModelSpec::Word2VecGoogleNews => "word2vec-google-news-300".to_string(),
            ModelSpec::Glove { corpus, dim } => format!("glove-{}-{dim}", corpus.slug()),
            ModelSpec::Custom { path, .. } => path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "custom".to_string()),
        }
    }

    fn is_binary(&self) -> bool {
        match self {
            ModelSpec::Word2VecGoogleNews => true,
            ModelSpec::Glove { .. } => false,
            ModelSpec::Custom { binary, .. } => *binary,
        }
    }

    fn archive_url(&self) -> Option<String> {
        match self {
            ModelSpec::Custom { .. } => None,
            _ => {
                let name = self.name();
                Some(format!("{RELEASE_BASE}/{name}/{name}.gz"))
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if let ModelSpec::Glove { corpus, dim } = self {
            if !corpus.dims().contains(dim) {
                return Err(Error::ModelUnavailable {
                    name: self.name(),
                    reason: format!(
                        "glove-{} is published in dimensions {:?}, not {dim}",
                        corpus.slug(),
                        corpus.dims()
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Named models this crate knows how to fetch.
pub fn known_models() -> Vec<String> {
    let mut names = vec![ModelSpec::Word2VecGoogleNews.name()];
    for corpus in [GloveCorpus::WikiGigaword, GloveCorpus::Twitter] {
        for &dim in corpus.dims() {
            names.push(ModelSpec::Glove { corpus, dim }.name());
        }
    }
    names
}

/// Where the provider keeps downloaded and parsed models. Passed explicitly
/// to every load; there is no process-wide cache location.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub cache_dir: PathBuf,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            cache_dir: PathBuf::from("data/models"),
        }
    }
}

/// Resolve `spec` to a loaded store.
pub fn load_model(spec: &ModelSpec, config: &ProviderConfig) -> Result<VectorStore> {
    spec.validate()?;
    let name = spec.name();

    let store = match spec {
        ModelSpec::Custom { path, binary } => {
            if !path.is_file() {
                return Err(Error::ModelUnavailable {
                    name,
                    reason: format!("file not found: {}", path.display()),
                });
            }
            load_vectors(path, *binary, &name)?
        }
        _ => load_named(spec, config, &name)?,
    };

    log::info!(
        "model '{name}' loaded: {} words, {} dimensions",
        store.len(),
        store.dims()
    );
    Ok(store)
}

fn load_named(spec: &ModelSpec, config: &ProviderConfig, name: &str) -> Result<VectorStore> {
    let ext = if spec.is_binary() { "bin" } else { "txt" };
    let source = config.cache_dir.join(format!("{name}.{ext}"));
    let vocab = config.cache_dir.join(format!("{name}.vocab"));
    let blob = config.cache_dir.join(format!("{name}.vec"));

    if vocab.is_file() && blob.is_file() {
        match formats::load_native_cache(&vocab, &blob) {
            Ok(store) => {
                log::debug!("loaded '{name}' from native cache");
                return Ok(store);
            }
            Err(e) => log::warn!("native cache for '{name}' unusable ({e}), reparsing"),
        }
    }

    if !source.is_file() {
        std::fs::create_dir_all(&config.cache_dir)?;
        let url = spec.archive_url().ok_or_else(|| Error::ModelUnavailable {
            name: name.to_string(),
            reason: "no download source".to_string(),
        })?;
        download::fetch_gz(&url, &source).map_err(|e| Error::ModelUnavailable {
            name: name.to_string(),
            reason: format!("{e:#}"),
        })?;
    }

    let store = load_vectors(&source, spec.is_binary(), name)?;

    if let Err(e) = formats::write_native_cache(&store, &vocab, &blob) {
        log::warn!("could not write native cache for '{name}': {e}");
    }
    Ok(store)
}

fn load_vectors(path: &Path, binary: bool, name: &str) -> Result<VectorStore> {
    let result = if binary {
        formats::load_word2vec_binary(path)
    } else {
        formats::load_text(path)
    };
    result.map_err(|e| Error::ModelUnavailable {
        name: name.to_string(),
        reason: format!("{}: {e}", path.display()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn model_names_match_the_release_naming() {
        assert_eq!(
            ModelSpec::Word2VecGoogleNews.name(),
            "word2vec-google-news-300"
        );
        let glove = ModelSpec::Glove {
            corpus: GloveCorpus::WikiGigaword,
            dim: 100,
        };
        assert_eq!(glove.name(), "glove-wiki-gigaword-100");
        assert_eq!(
            glove.archive_url().unwrap(),
            "https://github.com/RaRe-Technologies/gensim-data/releases/download/glove-wiki-gigaword-100/glove-wiki-gigaword-100.gz"
        );
    }

    #[test]
    fn unpublished_glove_dimension_is_unavailable() {
        let spec = ModelSpec::Glove {
            corpus: GloveCorpus::WikiGigaword,
            dim: 25,
        };
        let err = load_model(&spec, &ProviderConfig::default());
        assert!(matches!(err, Err(Error::ModelUnavailable { .. })));
    }

    #[test]
    fn custom_file_loads_without_network() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tiny.txt");
        std::fs::write(&path, "king 1 0\nqueen 0 1\n").unwrap();
        let spec = ModelSpec::Custom {
            path: path.clone(),
            binary: false,
        };
        let store = load_model(&spec, &ProviderConfig::default()).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn missing_custom_file_is_unavailable() {
        let spec = ModelSpec::Custom {
            path: PathBuf::from("does/not/exist.txt"),
            binary: false,
        };
        assert!(matches!(
            load_model(&spec, &ProviderConfig::default()),
            Err(Error::ModelUnavailable { .. })
        ));
    }

    #[test]
    fn known_models_covers_both_families() {
        let names = known_models();
        assert!(names.contains(&"word2vec-google-news-300".to_string()));
        assert!(names.contains(&"glove-twitter-25".to_string()));
        assert_eq!(names.len(), 9);
    }
}
