//! Deterministic bag-of-words embedder

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use parking_lot::Mutex;

use super::backend::Embedder;
use super::error::BackendResult;

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "an", "and", "are", "by", "for", "from", "in", "is", "it", "of", "on", "or", "s",
        "the", "this", "to", "what", "with",
    ]
    .into_iter()
    .collect()
});

/// Term-frequency embedder with a vocabulary built from indexed documents
///
/// Every distinct stemmed term of a document gets its own dimension, so two
/// texts only score above zero when they share a term. Vectors produced
/// earlier are shorter than later ones; `cosine_similarity` pads with zeros.
/// Queries are embedded against the existing vocabulary and never extend it.
#[derive(Debug, Default)]
pub struct LexicalEmbedder {
    vocabulary: Mutex<HashMap<String, usize>>,
}

impl LexicalEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.lock().len()
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let terms = tokenize(text);
        let mut vocabulary = self.vocabulary.lock();
        let indices: Vec<usize> = terms
            .into_iter()
            .map(|term| {
                let next = vocabulary.len();
                *vocabulary.entry(term).or_insert(next)
            })
            .collect();

        let mut vector = vec![0.0; vocabulary.len()];
        for i in indices {
            vector[i] += 1.0;
        }
        vector
    }

    /// Unknown terms are dropped; they cannot match any document
    fn vectorize_query(&self, text: &str) -> Vec<f32> {
        let terms = tokenize(text);
        let vocabulary = self.vocabulary.lock();
        let mut vector = vec![0.0; vocabulary.len()];
        for i in terms.iter().filter_map(|term| vocabulary.get(term)) {
            vector[*i] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl Embedder for LexicalEmbedder {
    fn name(&self) -> &str {
        "lexical"
    }

    async fn embed(&self, texts: &[String]) -> BackendResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vectorize(t)).collect())
    }

    async fn embed_query(&self, query: &str) -> BackendResult<Vec<f32>> {
        Ok(self.vectorize_query(query))
    }
}

/// Lowercased, stemmed terms with stop words removed
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .filter(|w| !STOP_WORDS.contains(w.as_str()))
        .map(|w| stem(&w))
        .collect()
}

fn stem(word: &str) -> String {
    let len = word.chars().count();
    if !word.is_ascii() {
        return word.to_string();
    }
    if len > 4 && (word.ends_with("ied") || word.ends_with("ies")) {
        return format!("{}y", &word[..word.len() - 3]);
    }
    if len > 5 && word.ends_with("ing") {
        return word[..word.len() - 3].to_string();
    }
    if len > 4 && word.ends_with("ed") {
        return word[..word.len() - 2].to_string();
    }
    if len > 3 && word.ends_with('s') && !word.ends_with("ss") {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::cosine_similarity;

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("What's 212 multiplied by 122?"),
            vec!["212", "multiply", "122"]
        );
        assert_eq!(tokenize("Add two integers"), vec!["add", "two", "integer"]);
        assert_eq!(tokenize("added adding adds"), vec!["add", "add", "add"]);
        assert_eq!(tokenize("useless_0"), vec!["useless", "0"]);
    }

    #[tokio::test]
    async fn test_shared_terms_score_higher() {
        let embedder = LexicalEmbedder::new();
        let vectors = embedder
            .embed(&[
                "multiply\nMultiply two integers".to_string(),
                "add\nAdd two integers".to_string(),
                "What's 212 multiplied by 122?".to_string(),
            ])
            .await
            .unwrap();

        let multiply = cosine_similarity(&vectors[2], &vectors[0]);
        let add = cosine_similarity(&vectors[2], &vectors[1]);
        assert!(multiply > 0.0);
        assert_eq!(add, 0.0);
    }

    #[tokio::test]
    async fn test_queries_do_not_grow_vocabulary() {
        let embedder = LexicalEmbedder::new();
        let docs = embedder
            .embed(&["multiply\nMultiply two integers".to_string()])
            .await
            .unwrap();
        let size = embedder.vocabulary_size();

        for i in 0..50 {
            embedder
                .embed_query(&format!("query token{} multiplied", i))
                .await
                .unwrap();
        }
        assert_eq!(embedder.vocabulary_size(), size);

        let query = embedder.embed_query("What's 212 multiplied by 122?").await.unwrap();
        assert_eq!(query.len(), size);
        assert!(cosine_similarity(&query, &docs[0]) > 0.0);

        let unknown = embedder.embed_query("zebra").await.unwrap();
        assert!(unknown.iter().all(|x| *x == 0.0));
    }

    #[tokio::test]
    async fn test_deterministic_across_instances() {
        let texts = vec!["alpha beta".to_string(), "beta gamma".to_string()];
        let a = LexicalEmbedder::new().embed(&texts).await.unwrap();
        let b = LexicalEmbedder::new().embed(&texts).await.unwrap();
        assert_eq!(a, b);
    }
}
