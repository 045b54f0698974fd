use std::collections::HashMap;
use std::sync::RwLock;

use super::document::{tokenize, SearchDocument, SearchHit, SearchKind, SearchQuery, SearchResults};

const TITLE_WEIGHT: u32 = 3;
const TAG_WEIGHT: u32 = 2;
const BODY_WEIGHT: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("search index unavailable: {0}")]
    Unavailable(String),
    #[error("invalid search query: {0}")]
    InvalidQuery(String),
}

/// Seam over the hosted search engine.
pub trait SearchIndex: Send + Sync {
    fn upsert(&self, document: SearchDocument) -> Result<(), SearchError>;
    fn remove(&self, kind: SearchKind, id: &str) -> Result<(), SearchError>;
    fn query(&self, query: &SearchQuery) -> Result<SearchResults, SearchError>;
}

/// In-process index with weighted term matching.
#[derive(Debug, Default)]
pub struct MemorySearchIndex {
    documents: RwLock<HashMap<(SearchKind, String), SearchDocument>>,
}

impl MemorySearchIndex {
    pub fn len(&self) -> usize {
        self.documents.read().map(|docs| docs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, kind: SearchKind, id: &str) -> bool {
        self.documents
            .read()
            .map(|docs| docs.contains_key(&(kind, id.to_string())))
            .unwrap_or(false)
    }
}

impl SearchIndex for MemorySearchIndex {
    fn upsert(&self, document: SearchDocument) -> Result<(), SearchError> {
        let mut guard = self
            .documents
            .write()
            .map_err(|_| SearchError::Unavailable("index lock poisoned".to_string()))?;
        guard.insert((document.kind, document.id.clone()), document);
        Ok(())
    }

    fn remove(&self, kind: SearchKind, id: &str) -> Result<(), SearchError> {
        let mut guard = self
            .documents
            .write()
            .map_err(|_| SearchError::Unavailable("index lock poisoned".to_string()))?;
        guard.remove(&(kind, id.to_string()));
        Ok(())
    }

    fn query(&self, query: &SearchQuery) -> Result<SearchResults, SearchError> {
        if query.limit == 0 {
            return Err(SearchError::InvalidQuery("limit must be positive".to_string()));
        }

        let guard = self
            .documents
            .read()
            .map_err(|_| SearchError::Unavailable("index lock poisoned".to_string()))?;

        let terms = query.text.as_deref().map(tokenize).unwrap_or_default();
        let location = query
            .location
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_lowercase);
        let required_tags: Vec<String> = query
            .tags
            .iter()
            .map(|tag| tag.trim().to_lowercase())
            .filter(|tag| !tag.is_empty())
            .collect();

        let mut hits: Vec<SearchHit> = guard
            .values()
            .filter(|document| document.kind == query.kind)
            .filter(|document| match &location {
                Some(wanted) => document
                    .location
                    .as_deref()
                    .map(|value| value.to_lowercase().contains(wanted.as_str()))
                    .unwrap_or(false),
                None => true,
            })
            .filter(|document| {
                required_tags.iter().all(|wanted| {
                    document
                        .tags
                        .iter()
                        .any(|tag| tag.eq_ignore_ascii_case(wanted))
                })
            })
            .filter_map(|document| {
                let score = score(document, &terms);
                if terms.is_empty() || score > 0 {
                    Some(SearchHit {
                        document: document.clone(),
                        score,
                    })
                } else {
                    None
                }
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| b.document.updated_at.cmp(&a.document.updated_at))
                .then_with(|| a.document.id.cmp(&b.document.id))
        });

        let total = hits.len();
        let hits = hits
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect();

        Ok(SearchResults {
            hits,
            total,
            limit: query.limit,
            offset: query.offset,
        })
    }
}

fn score(document: &SearchDocument, terms: &[String]) -> u32 {
    if terms.is_empty() {
        return 0;
    }

    let title = tokenize(&document.title);
    let body = tokenize(&document.body);
    let tags: Vec<String> = document.tags.iter().flat_map(|tag| tokenize(tag)).collect();

    terms
        .iter()
        .map(|term| {
            let mut points = 0;
            if title.contains(term) {
                points += TITLE_WEIGHT;
            }
            if tags.contains(term) {
                points += TAG_WEIGHT;
            }
            if body.contains(term) {
                points += BODY_WEIGHT;
            }
            points
        })
        .sum()
}
