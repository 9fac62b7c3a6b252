//! querychunk converts a free-text media search query ("videos by john
//! uploaded last week") into a structured slot mapping (SEARCH, CREATOR,
//! dates, length, keywords).
//!
//! The engine chunks the same sentence twice with two independent grammars:
//! one over POS/domain tags, one over the raw tokens. Recognized date
//! subtrees are normalized to calendar dates, and the two trees are merged
//! into one slot per token. Tokenization, POS tagging, lexical similarity
//! and date-literal parsing are capabilities the caller provides;
//! [`backends`] ships small reference implementations.

#[macro_use]
extern crate lazy_static;

pub mod backends;
pub mod chunk;
pub mod dates;
pub mod error;
pub mod grammars;
pub mod pattern;
pub mod preprocess;
pub mod resolve;
pub mod tagger;

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::dates::DateLiteralParser;
use crate::tagger::{DomainLexicon, Similarity};

pub use crate::error::ParseError;
pub use crate::resolve::{Slot, SlotMapping};

/// Raw-text tokenization capability.
pub trait Tokenizer {
  fn tokenize(&self, text: &str) -> Vec<String>;
}

/// Part-of-speech tagging capability; labels come from a fixed external
/// tagset (NN, VB, JJ, DT, IN, TO, CD, POS, ...).
pub trait PosTagger {
  fn tag(&self, tokens: &[String]) -> Vec<(String, String)>;
}

/// The engine with its capability backends bound. Stateless across requests:
/// every parse builds fresh trees and a fresh mapping, so one instance can
/// be shared between threads.
pub struct QueryParser {
  tokenizer: Box<dyn Tokenizer + Send + Sync>,
  pos_tagger: Box<dyn PosTagger + Send + Sync>,
  similarity: Box<dyn Similarity + Send + Sync>,
  date_parser: Box<dyn DateLiteralParser + Send + Sync>,
  stopwords: HashSet<String>,
  punctuation: HashSet<char>,
  lexicon: DomainLexicon,
}

impl QueryParser {
  pub fn new(
    tokenizer: Box<dyn Tokenizer + Send + Sync>,
    pos_tagger: Box<dyn PosTagger + Send + Sync>,
    similarity: Box<dyn Similarity + Send + Sync>,
    date_parser: Box<dyn DateLiteralParser + Send + Sync>,
    stopwords: HashSet<String>,
  ) -> Self {
    Self {
      tokenizer,
      pos_tagger,
      similarity,
      date_parser,
      stopwords,
      punctuation: preprocess::PUNCTUATION.chars().collect(),
      lexicon: DomainLexicon::builtin(),
    }
  }

  /// Replaces the built-in domain exemplar vocabulary.
  pub fn with_lexicon(mut self, lexicon: DomainLexicon) -> Self {
    self.lexicon = lexicon;
    self
  }

  /// The engine wired to the reference backends in [`backends`].
  pub fn builtin() -> Self {
    Self::new(
      Box::new(backends::WhitespaceTokenizer),
      Box::new(backends::HeuristicTagger),
      Box::new(backends::WordListSimilarity),
      Box::new(dates::ChronoDateParser),
      backends::stopwords(),
    )
  }

  /// Parses a query against today's local date.
  pub fn parse(&self, raw: &str, network_names: &[String]) -> Result<SlotMapping, ParseError> {
    self.parse_at(raw, network_names, chrono::Local::now().date_naive())
  }

  /// Parses a query with an explicit reference date for relative and
  /// future-corrected date expressions.
  pub fn parse_at(
    &self,
    raw: &str,
    network_names: &[String],
    today: NaiveDate,
  ) -> Result<SlotMapping, ParseError> {
    let text = preprocess::normalize(raw);
    let tokens = self.tokenizer.tokenize(&text);
    if tokens.is_empty() {
      return Ok(SlotMapping::default());
    }
    tracing::debug!(count = tokens.len(), "tokenized query");

    let names: HashSet<String> = network_names.iter().map(|n| n.to_lowercase()).collect();
    let pos_tagged = self.pos_tagger.tag(&tokens);
    let refined = tagger::tag_domains(&pos_tagged, &names, &self.lexicon, &*self.similarity);
    let tag_tree = chunk::chunk(&grammars::TAG_RULESET, &refined);

    // the word grammar sees each token's own text as its category
    let self_labeled: Vec<(String, String)> =
      tokens.iter().map(|t| (t.clone(), t.clone())).collect();
    let mut word_tree = chunk::chunk(&grammars::WORD_RULESET, &self_labeled);
    dates::normalize(&mut word_tree, today, &*self.date_parser);

    resolve::resolve(
      &tokens,
      &tag_tree,
      &word_tree,
      &self.stopwords,
      &self.punctuation,
    )
  }
}

lazy_static! {
  static ref BUILTIN: QueryParser = QueryParser::builtin();
}

/// Parses a query with the reference backends. The HTTP collaborator calls
/// this once per request and serializes the mapping to JSON.
pub fn parse_query(raw: &str, network_names: &[String]) -> Result<SlotMapping, ParseError> {
  BUILTIN.parse(raw, network_names)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
  }

  fn none() -> Vec<String> {
    Vec::new()
  }

  #[test]
  fn creator_date_query() {
    let p = QueryParser::builtin();
    let m = p
      .parse_at("videos by john uploaded last week", &none(), d(2014, 3, 17))
      .unwrap();

    assert_eq!(m.get(Slot::Search), Some("videos"));
    assert_eq!(m.get(Slot::Creator), Some("john"));
    assert_eq!(m.get(Slot::DateExact), Some("03-10-2014"));
    assert_eq!(m.keywords(), ["uploaded".to_string()]);
  }

  #[test]
  fn length_and_network_name_query() {
    let p = QueryParser::builtin();
    let networks = vec!["espn".to_string()];
    let m = p
      .parse_at("clips over 5 minutes from espn", &networks, d(2014, 3, 17))
      .unwrap();

    assert_eq!(m.get(Slot::Search), Some("clips"));
    assert_eq!(m.get(Slot::LengthNum), Some("5"));
    assert_eq!(m.get(Slot::LengthUnit), Some("minutes"));
    assert_eq!(m.get(Slot::NetworkName), Some("espn"));
    assert!(m.keywords().is_empty());
  }

  #[test]
  fn possessive_marks_the_creator() {
    let p = QueryParser::builtin();
    let m = p.parse_at("john's videos", &none(), d(2014, 3, 17)).unwrap();
    assert_eq!(m.get(Slot::Creator), Some("john"));
    assert_eq!(m.get(Slot::Search), Some("videos"));
  }

  #[test]
  fn date_range_prepositions() {
    let p = QueryParser::builtin();
    let m = p
      .parse_at("videos from march 5 until yesterday", &none(), d(2014, 6, 2))
      .unwrap();
    assert_eq!(m.get(Slot::DateFrom), Some("03-05-2014"));
    assert_eq!(m.get(Slot::DateTo), Some("06-01-2014"));
  }

  #[test]
  fn only_the_first_domain_noun_becomes_the_search_focus() {
    let p = QueryParser::builtin();
    let m = p
      .parse_at("videos and clips please", &none(), d(2014, 3, 17))
      .unwrap();
    assert_eq!(m.get(Slot::Search), Some("videos"));
    assert_eq!(m.get(Slot::Media), Some("clips"));
  }

  #[test]
  fn non_creator_prepositions_fall_back_to_keywords() {
    // the backward scan stops at TO, which does not mark a creator
    let p = QueryParser::builtin();
    let m = p.parse_at("sent to john", &none(), d(2014, 3, 17)).unwrap();
    assert_eq!(m.get(Slot::Creator), None);
    assert!(m.keywords().contains(&"john".to_string()));
  }

  #[test]
  fn unresolvable_dates_leave_the_date_slots_empty() {
    let p = QueryParser::builtin();
    let m = p
      .parse_at("videos uploaded march 45", &none(), d(2014, 3, 17))
      .unwrap();
    assert_eq!(m.get(Slot::DateExact), None);
    assert_eq!(m.get(Slot::DateFrom), None);
    assert!(m.keywords().contains(&"march".to_string()));
    assert!(m.keywords().contains(&"45".to_string()));
  }

  #[test]
  fn stopwords_and_punctuation_are_dropped() {
    let p = QueryParser::builtin();
    let m = p
      .parse_at("the best funky videos !", &none(), d(2014, 3, 17))
      .unwrap();
    assert_eq!(m.get(Slot::Search), Some("videos"));
    assert!(!m.keywords().contains(&"the".to_string()));
    assert!(!m.keywords().contains(&"!".to_string()));
    assert!(m.keywords().contains(&"funky".to_string()));
  }

  #[test]
  fn empty_query_is_an_empty_mapping() {
    let p = QueryParser::builtin();
    let m = p.parse_at("", &none(), d(2014, 3, 17)).unwrap();
    assert!(m.is_empty());
  }

  #[test]
  fn parsing_is_idempotent() {
    let networks = vec!["espn".to_string()];
    let a = parse_query("clips over 5 minutes from espn", &networks).unwrap();
    let b = parse_query("clips over 5 minutes from espn", &networks).unwrap();
    assert_eq!(a, b);
  }

  #[test]
  fn mapping_serializes_for_the_http_layer() {
    let p = QueryParser::builtin();
    let m = p
      .parse_at("videos by john uploaded last week", &none(), d(2014, 3, 17))
      .unwrap();
    let json = serde_json::to_value(&m).unwrap();
    assert_eq!(json["SEARCH"], "videos");
    assert_eq!(json["CREATOR"], "john");
    assert_eq!(json["DATE_EXACT"], "03-10-2014");
    assert_eq!(json["KEYWORDS"][0], "uploaded");
  }
}
