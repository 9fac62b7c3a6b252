//! The dual-tree merge: per-token slot derivation from the tag tree and the
//! (date-normalized) word tree, query-focus selection, and aggregation into
//! the final slot mapping.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::chunk::ChunkTree;
use crate::dates::CANONICAL_FORMAT;
use crate::error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Slot {
  #[serde(rename = "SEARCH")]
  Search,
  #[serde(rename = "CREATOR")]
  Creator,
  #[serde(rename = "NETWORK_NAME")]
  NetworkName,
  #[serde(rename = "DATE_FROM")]
  DateFrom,
  #[serde(rename = "DATE_TO")]
  DateTo,
  #[serde(rename = "DATE_EXACT")]
  DateExact,
  #[serde(rename = "LENGTH_NUM")]
  LengthNum,
  #[serde(rename = "LENGTH_UNIT")]
  LengthUnit,
  #[serde(rename = "MEDIA")]
  Media,
  #[serde(rename = "NETWORK")]
  Network,
  #[serde(rename = "USER")]
  User,
}

impl Slot {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Search => "SEARCH",
      Self::Creator => "CREATOR",
      Self::NetworkName => "NETWORK_NAME",
      Self::DateFrom => "DATE_FROM",
      Self::DateTo => "DATE_TO",
      Self::DateExact => "DATE_EXACT",
      Self::LengthNum => "LENGTH_NUM",
      Self::LengthUnit => "LENGTH_UNIT",
      Self::Media => "MEDIA",
      Self::Network => "NETWORK",
      Self::User => "USER",
    }
  }
}

impl fmt::Display for Slot {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// The final result of a parse: one accumulated string per slot, plus the
/// ordered free keywords. Immutable once returned.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SlotMapping {
  #[serde(flatten)]
  slots: BTreeMap<Slot, String>,
  #[serde(rename = "KEYWORDS", skip_serializing_if = "Vec::is_empty")]
  keywords: Vec<String>,
}

impl SlotMapping {
  pub fn get(&self, slot: Slot) -> Option<&str> {
    self.slots.get(&slot).map(String::as_str)
  }

  pub fn keywords(&self) -> &[String] {
    &self.keywords
  }

  pub fn is_empty(&self) -> bool {
    self.slots.is_empty() && self.keywords.is_empty()
  }

  pub fn slots(&self) -> impl Iterator<Item = (Slot, &str)> {
    self.slots.iter().map(|(s, v)| (*s, v.as_str()))
  }

  fn accumulate(&mut self, slot: Slot, value: &str) {
    self
      .slots
      .entry(slot)
      .and_modify(|v| {
        v.push(' ');
        v.push_str(value);
      })
      .or_insert_with(|| value.to_string());
  }
}

#[derive(Debug, Clone, PartialEq)]
enum Label {
  Skip,
  Unknown,
  Keyword,
  Slot(Slot),
}

fn is_preposition(tag: &str) -> bool {
  tag == "IN" || tag == "TO"
}

/// A date subtree the normalizer could resolve carries exactly one canonical
/// leaf. An unresolved subtree keeps its raw token leaves, which must not
/// surface as a date slot value.
fn is_canonical_date(word: &str) -> bool {
  NaiveDate::parse_from_str(word, CANONICAL_FORMAT).is_ok()
}

/// Word-grammar categories that stand for a preposition. The backward scan
/// stops at the nearest of these; TO included (the original compared against
/// a `T0` literal in one branch, read here as the documented intent of
/// stopping at any preposition).
fn is_preposition_category(category: &str) -> bool {
  matches!(category, "BY" | "FROM" | "TO")
}

/// Leftward search from `pos` for the nearest preceding preposition category
/// in the word tree.
fn preceding_preposition<'a>(word_tree: &'a ChunkTree, pos: usize) -> Option<&'a str> {
  (0..pos).rev().find_map(|j| {
    word_tree
      .top_category_at(j)
      .filter(|c| is_preposition_category(c))
  })
}

/// Merges both trees into the final slot mapping.
///
/// The trees must partition the identical token sequence; any divergence is
/// a `StructuralMismatch`.
pub fn resolve(
  tokens: &[String],
  tag_tree: &ChunkTree,
  word_tree: &ChunkTree,
  stopwords: &HashSet<String>,
  punctuation: &HashSet<char>,
) -> Result<SlotMapping, ParseError> {
  if tag_tree.token_len() != tokens.len() {
    return Err(ParseError::StructuralMismatch {
      position: tag_tree.token_len().min(tokens.len()),
    });
  }
  if word_tree.token_len() != tokens.len() {
    return Err(ParseError::StructuralMismatch {
      position: word_tree.token_len().min(tokens.len()),
    });
  }

  let mut labeled = Vec::with_capacity(tokens.len());
  for pos in 0..tokens.len() {
    labeled.push(classify(pos, tokens, tag_tree, word_tree)?);
  }

  // single left-to-right pass: the first USER/MEDIA/NETWORK token is the
  // query focus, everything unclaimed becomes a keyword candidate
  let mut focus_seen = false;
  for (label, _) in &mut labeled {
    match label {
      Label::Slot(Slot::Media | Slot::Network | Slot::User) if !focus_seen => {
        focus_seen = true;
        *label = Label::Slot(Slot::Search);
      }
      Label::Unknown => *label = Label::Keyword,
      _ => {}
    }
  }

  let mut mapping = SlotMapping::default();
  for (label, value) in labeled {
    match label {
      Label::Skip | Label::Unknown => {}
      Label::Keyword => {
        let is_punctuation = !value.is_empty() && value.chars().all(|c| punctuation.contains(&c));
        if !stopwords.contains(&value) && !is_punctuation {
          mapping.keywords.push(value);
        }
      }
      Label::Slot(slot) => mapping.accumulate(slot, &value),
    }
  }

  tracing::debug!(slots = %mapping.slots.len(), keywords = %mapping.keywords.len(), "resolved query");
  Ok(mapping)
}

/// The per-token decision table, evaluated top to bottom, first match wins.
fn classify(
  pos: usize,
  tokens: &[String],
  tag_tree: &ChunkTree,
  word_tree: &ChunkTree,
) -> Result<(Label, String), ParseError> {
  let mismatch = || ParseError::StructuralMismatch { position: pos };
  let word_leaf = word_tree.leaf_at(pos).ok_or_else(mismatch)?;
  let tag_leaf = tag_tree.leaf_at(pos).ok_or_else(mismatch)?;

  // a canonicalized date leaf spans several positions; only its first
  // position carries the slot, the rest are consumed
  if word_leaf.span.0 != pos {
    return Ok((Label::Skip, String::new()));
  }

  let word_category = word_tree.top_category_at(pos).ok_or_else(mismatch)?;
  let tag = tag_leaf.label.as_str();
  let enclosing = tag_tree.parent_label_at(pos);
  let token = tokens[pos].as_str();

  if word_category.ends_with("DATE_FROM") {
    return Ok(if is_preposition(tag) {
      (Label::Skip, String::new())
    } else if is_canonical_date(&word_leaf.word) {
      (Label::Slot(Slot::DateFrom), word_leaf.word.clone())
    } else {
      (Label::Unknown, token.to_string())
    });
  }

  if word_category.ends_with("DATE_TO") {
    return Ok(if is_preposition(tag) {
      (Label::Skip, String::new())
    } else if is_canonical_date(&word_leaf.word) {
      (Label::Slot(Slot::DateTo), word_leaf.word.clone())
    } else {
      (Label::Unknown, token.to_string())
    });
  }

  if word_category.ends_with("DATE") {
    return Ok(if is_canonical_date(&word_leaf.word) {
      (Label::Slot(Slot::DateExact), word_leaf.word.clone())
    } else {
      (Label::Unknown, token.to_string())
    });
  }

  if word_category == "LENGTH" {
    return Ok(if tag == "CD" {
      (Label::Slot(Slot::LengthNum), token.to_string())
    } else if tag.starts_with("NN") || tag.starts_with("JJ") {
      (Label::Slot(Slot::LengthUnit), token.to_string())
    } else {
      (Label::Skip, String::new())
    });
  }

  let domain = match tag {
    "MEDIA" => Some(Slot::Media),
    "NETWORK" => Some(Slot::Network),
    "NETWORK_NAME" => Some(Slot::NetworkName),
    "USER" => Some(Slot::User),
    _ => None,
  };
  if let Some(slot) = domain {
    return Ok((Label::Slot(slot), token.to_string()));
  }

  if enclosing == Some("PosP") {
    return Ok(if tag == "POS" || token.chars().count() <= 1 {
      (Label::Skip, String::new())
    } else {
      (Label::Slot(Slot::Creator), token.to_string())
    });
  }

  if enclosing == Some("PP") {
    if is_preposition(tag) {
      return Ok((Label::Skip, String::new()));
    }
    return Ok(match preceding_preposition(word_tree, pos) {
      Some("BY") | Some("FROM") => (Label::Slot(Slot::Creator), token.to_string()),
      _ => (Label::Unknown, token.to_string()),
    });
  }

  Ok((Label::Unknown, token.to_string()))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::chunk::{Leaf, Tree};

  fn leaf(word: &str, label: &str, pos: usize) -> Tree {
    Tree::Leaf(Leaf {
      word: word.to_string(),
      label: label.to_string(),
      span: (pos, pos + 1),
    })
  }

  fn flat(pairs: &[(&str, &str)]) -> ChunkTree {
    ChunkTree {
      nodes: pairs
        .iter()
        .enumerate()
        .map(|(i, (w, l))| leaf(w, l, i))
        .collect(),
    }
  }

  fn toks(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
  }

  #[test]
  fn diverging_trees_are_a_structural_error() {
    let tokens = toks(&["videos", "now"]);
    let tag_tree = flat(&[("videos", "MEDIA"), ("now", "RB")]);
    let short = flat(&[("videos", "videos")]);
    let err = resolve(&tokens, &tag_tree, &short, &HashSet::new(), &HashSet::new()).unwrap_err();
    assert_eq!(err, ParseError::StructuralMismatch { position: 1 });
  }

  #[test]
  fn stopwords_and_punctuation_never_reach_keywords() {
    let tokens = toks(&["the", ".", "weird"]);
    let tag_tree = flat(&[("the", "DT"), (".", "."), ("weird", "JJ")]);
    let word_tree = flat(&[("the", "the"), (".", "."), ("weird", "weird")]);
    let stop: HashSet<String> = ["the".to_string()].into_iter().collect();
    let punct: HashSet<char> = ".".chars().collect();
    let mapping = resolve(&tokens, &tag_tree, &word_tree, &stop, &punct).unwrap();
    assert_eq!(mapping.keywords(), ["weird".to_string()]);
  }

  #[test]
  fn first_domain_token_wins_the_search_slot() {
    let tokens = toks(&["videos", "clips"]);
    let tag_tree = flat(&[("videos", "MEDIA"), ("clips", "MEDIA")]);
    let word_tree = flat(&[("videos", "videos"), ("clips", "clips")]);
    let mapping =
      resolve(&tokens, &tag_tree, &word_tree, &HashSet::new(), &HashSet::new()).unwrap();
    assert_eq!(mapping.get(Slot::Search), Some("videos"));
    assert_eq!(mapping.get(Slot::Media), Some("clips"));
  }

  #[test]
  fn repeated_labels_accumulate_with_spaces() {
    let tokens = toks(&["by", "john", "smith"]);
    let tag_tree = ChunkTree {
      nodes: vec![Tree::Branch {
        label: "PP".to_string(),
        span: (0, 3),
        children: vec![leaf("by", "IN", 0), leaf("john", "NN", 1), leaf("smith", "NN", 2)],
      }],
    };
    let word_tree = ChunkTree {
      nodes: vec![
        Tree::Branch {
          label: "BY".to_string(),
          span: (0, 1),
          children: vec![leaf("by", "by", 0)],
        },
        leaf("john", "john", 1),
        leaf("smith", "smith", 2),
      ],
    };
    let mapping =
      resolve(&tokens, &tag_tree, &word_tree, &HashSet::new(), &HashSet::new()).unwrap();
    assert_eq!(mapping.get(Slot::Creator), Some("john smith"));
  }

  #[test]
  fn uncanonicalized_date_subtrees_yield_no_date_slot() {
    let tokens = toks(&["march", "45"]);
    let tag_tree = flat(&[("march", "NN"), ("45", "CD")]);
    // the chunker recognized a date shape, but the normalizer left the raw
    // leaves in place because day 45 does not exist
    let word_tree = ChunkTree {
      nodes: vec![Tree::Branch {
        label: "SDATE".to_string(),
        span: (0, 2),
        children: vec![leaf("march", "march", 0), leaf("45", "45", 1)],
      }],
    };
    let mapping =
      resolve(&tokens, &tag_tree, &word_tree, &HashSet::new(), &HashSet::new()).unwrap();
    assert_eq!(mapping.get(Slot::DateExact), None);
    assert_eq!(mapping.keywords(), ["march".to_string(), "45".to_string()]);
  }

  #[test]
  fn serializes_with_upper_case_slot_names() {
    let tokens = toks(&["videos"]);
    let tag_tree = flat(&[("videos", "MEDIA")]);
    let word_tree = flat(&[("videos", "videos")]);
    let mapping =
      resolve(&tokens, &tag_tree, &word_tree, &HashSet::new(), &HashSet::new()).unwrap();
    let json = serde_json::to_value(&mapping).unwrap();
    assert_eq!(json["SEARCH"], "videos");
  }
}
