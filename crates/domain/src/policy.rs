//! Pluggable candidate filters
//!
//! These predicates compose with the two mandatory rules of the decision
//! pipeline (not already retweeted, author followed). They only ever narrow
//! the selection.

use regex::Regex;

use crate::model::CandidateTweet;

/// A predicate over candidate tweets
pub trait CandidateFilter: Send + Sync {
    /// Short name used in log output
    fn name(&self) -> &'static str;

    /// Returns false to drop the candidate
    fn accept(&self, candidate: &CandidateTweet) -> bool;
}

/// Filter configuration
#[derive(Debug, Clone, Default)]
pub struct FilterConfig {
    /// Substrings that reject a tweet (case-insensitive)
    pub exclude_keywords: Vec<String>,
    /// Regex patterns that reject a tweet
    pub ignore_patterns: Vec<String>,
}

impl FilterConfig {
    /// Build the configured filters; empty lists produce no filter
    pub fn build(&self) -> Vec<Box<dyn CandidateFilter>> {
        let mut filters: Vec<Box<dyn CandidateFilter>> = Vec::new();

        if !self.exclude_keywords.is_empty() {
            filters.push(Box::new(ExcludeKeywords::new(&self.exclude_keywords)));
        }

        let patterns = IgnorePatterns::compile(&self.ignore_patterns);
        if !patterns.is_empty() {
            filters.push(Box::new(patterns));
        }

        filters
    }
}

/// Rejects tweets whose text contains any of the keywords
#[derive(Debug, Clone)]
pub struct ExcludeKeywords {
    keywords: Vec<String>,
}

impl ExcludeKeywords {
    pub fn new(keywords: &[String]) -> Self {
        Self {
            keywords: keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }
}

impl CandidateFilter for ExcludeKeywords {
    fn name(&self) -> &'static str {
        "exclude_keywords"
    }

    fn accept(&self, candidate: &CandidateTweet) -> bool {
        let text = candidate.text.to_lowercase();
        !self.keywords.iter().any(|k| text.contains(k.as_str()))
    }
}

/// Rejects tweets whose text matches any of the patterns
#[derive(Debug, Clone)]
pub struct IgnorePatterns {
    patterns: Vec<Regex>,
}

impl IgnorePatterns {
    /// Compile patterns, skipping (and logging) invalid ones
    pub fn compile(patterns: &[String]) -> Self {
        let patterns = patterns
            .iter()
            .filter_map(|pattern| match Regex::new(pattern) {
                Ok(regex) => Some(regex),
                Err(error) => {
                    tracing::warn!(pattern = %pattern, error = %error, "Invalid ignore pattern");
                    None
                }
            })
            .collect();
        Self { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl CandidateFilter for IgnorePatterns {
    fn name(&self) -> &'static str {
        "ignore_patterns"
    }

    fn accept(&self, candidate: &CandidateTweet) -> bool {
        !self
            .patterns
            .iter()
            .any(|pattern| pattern.is_match(&candidate.text))
    }
}
