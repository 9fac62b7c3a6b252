//! Reference implementations of the external capabilities (§ tokenize,
//! pos_tag, similarity, stopwords). They are deliberately small: enough for
//! the cli, benches and integration tests to run self-contained. Real
//! deployments substitute their own tokenizer, tagger and lexical-similarity
//! oracle without touching the chunker or resolver.

use std::collections::HashSet;

use crate::tagger::Similarity;
use crate::{PosTagger, Tokenizer};

/// Splits on whitespace; the preprocessor has already isolated punctuation.
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
  fn tokenize(&self, text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
  }
}

const PREPOSITIONS: &[&str] = &[
  "by", "from", "since", "over", "under", "about", "around", "of", "in", "on",
  "at", "with", "for", "during", "between", "until", "till", "before", "after",
];

const DETERMINERS: &[&str] = &["a", "an", "the", "this", "that", "these", "those"];

const ADJECTIVES: &[&str] = &[
  "last", "past", "recent", "new", "old", "long", "short", "popular", "best",
  "latest", "favorite",
];

const NUMBER_WORDS: &[&str] = &[
  "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
];

/// Suffix-and-lexicon POS tagger emitting Penn-style labels. Punctuation
/// tokens are tagged as themselves, Penn style.
pub struct HeuristicTagger;

impl PosTagger for HeuristicTagger {
  fn tag(&self, tokens: &[String]) -> Vec<(String, String)> {
    tokens
      .iter()
      .map(|t| (t.clone(), pos_of(t).to_string()))
      .collect()
  }
}

fn pos_of(token: &str) -> String {
  if token.chars().count() == 1 && !token.chars().next().is_some_and(char::is_alphanumeric) {
    return token.to_string();
  }
  let tag = if token == "'s" {
    "POS"
  } else if token == "to" {
    "TO"
  } else if PREPOSITIONS.contains(&token) {
    "IN"
  } else if DETERMINERS.contains(&token) {
    "DT"
  } else if ADJECTIVES.contains(&token) {
    "JJ"
  } else if token.chars().all(|c| c.is_ascii_digit()) || NUMBER_WORDS.contains(&token) {
    "CD"
  } else if token.len() > 3 && token.ends_with("ed") {
    "VBD"
  } else if token.len() > 4 && token.ends_with("ing") {
    "VBG"
  } else if token.len() > 3 && token.ends_with('s') {
    "NNS"
  } else {
    "NN"
  };
  tag.to_string()
}

/// Word-list similarity: 1.0 when the token matches an exemplar up to a
/// trailing plural `s`, 0.0 otherwise. A stand-in for a WordNet-style
/// path-similarity oracle.
pub struct WordListSimilarity;

fn depluralize(word: &str) -> &str {
  word.strip_suffix('s').unwrap_or(word)
}

impl Similarity for WordListSimilarity {
  fn score(&self, word: &str, exemplar: &str) -> f64 {
    if depluralize(word) == depluralize(exemplar) {
      1.0
    } else {
      0.0
    }
  }
}

/// A fixed English stop-word list.
pub fn stopwords() -> HashSet<String> {
  [
    "a", "an", "the", "is", "are", "was", "were", "be", "been", "am", "do",
    "does", "did", "i", "me", "my", "we", "our", "you", "your", "it", "its",
    "and", "or", "not", "no", "of", "in", "on", "to", "for", "with", "by",
    "at", "from", "as", "that", "this", "there", "what", "which", "who",
    "all", "any", "some", "can", "will", "just", "so", "than", "too", "very",
    "s", "t", "'s",
  ]
  .iter()
  .map(|s| s.to_string())
  .collect()
}
