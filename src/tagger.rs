//! Domain tagging: reclassifies nouns as MEDIA / NETWORK / USER /
//! NETWORK_NAME ahead of the tag-grammar chunking pass.

use std::collections::HashSet;

use serde::Deserialize;

/// Lexical-similarity capability. Scores are expected in `[0, 1]`; the
/// backing resource (WordNet, embeddings, plain word lists) is up to the
/// caller.
pub trait Similarity {
  fn score(&self, word: &str, exemplar: &str) -> f64;
}

/// A noun is reclassified when its best exemplar similarity reaches this.
pub const SIMILARITY_THRESHOLD: f64 = 0.5;

/// Versioned exemplar vocabularies for the three domain categories. Kept as
/// configuration data rather than code so the lists can be tuned without
/// touching the tagger.
#[derive(Debug, Clone, Deserialize)]
pub struct DomainLexicon {
  pub version: u32,
  pub media: Vec<String>,
  pub network: Vec<String>,
  pub user: Vec<String>,
}

impl DomainLexicon {
  /// The vocabulary shipped with the crate.
  pub fn builtin() -> Self {
    serde_json::from_str(include_str!("../data/domain_lexicon.json"))
      .expect("embedded domain lexicon is valid JSON")
  }
}

fn best_score(similarity: &dyn Similarity, word: &str, exemplars: &[String]) -> f64 {
  exemplars
    .iter()
    .map(|e| similarity.score(word, e))
    .fold(0.0, f64::max)
}

/// Refines POS tags with domain categories.
///
/// Only noun-tagged tokens (`NN*`) are considered. MEDIA wins first; a
/// token on the caller's network-name list becomes NETWORK_NAME, pre-empting
/// the network similarity check; then NETWORK, then USER. Anything that
/// clears no threshold keeps its POS tag. Pure re-labeling, no state across
/// tokens.
pub fn tag_domains(
  tagged: &[(String, String)],
  name_list: &HashSet<String>,
  lexicon: &DomainLexicon,
  similarity: &dyn Similarity,
) -> Vec<(String, String)> {
  tagged
    .iter()
    .map(|(word, tag)| {
      let refined = if tag.starts_with("NN") {
        let lowered = word.to_lowercase();
        if best_score(similarity, &lowered, &lexicon.media) >= SIMILARITY_THRESHOLD {
          "MEDIA"
        } else if name_list.contains(&lowered) {
          "NETWORK_NAME"
        } else if best_score(similarity, &lowered, &lexicon.network) >= SIMILARITY_THRESHOLD {
          "NETWORK"
        } else if best_score(similarity, &lowered, &lexicon.user) >= SIMILARITY_THRESHOLD {
          "USER"
        } else {
          tag.as_str()
        }
      } else {
        tag.as_str()
      };
      (word.clone(), refined.to_string())
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  struct Exact;

  impl Similarity for Exact {
    fn score(&self, word: &str, exemplar: &str) -> f64 {
      if word == exemplar { 1.0 } else { 0.0 }
    }
  }

  /// Returns a fixed score for every exemplar pair.
  struct Fixed(f64);

  impl Similarity for Fixed {
    fn score(&self, _: &str, _: &str) -> f64 {
      self.0
    }
  }

  fn tag(pairs: &[(&str, &str)], names: &[&str], sim: &dyn Similarity) -> Vec<(String, String)> {
    let tagged: Vec<_> = pairs
      .iter()
      .map(|(w, t)| (w.to_string(), t.to_string()))
      .collect();
    let names: HashSet<String> = names.iter().map(|n| n.to_string()).collect();
    tag_domains(&tagged, &names, &DomainLexicon::builtin(), sim)
  }

  #[test]
  fn media_nouns_are_reclassified() {
    let out = tag(&[("videos", "NNS"), ("john", "NN")], &[], &Exact);
    assert_eq!(out[0].1, "MEDIA");
    assert_eq!(out[1].1, "NN");
  }

  #[test]
  fn name_list_membership_preempts_network_similarity() {
    // "channel" scores against the network exemplars *and* sits on the name
    // list; membership must win
    let out = tag(&[("channel", "NN")], &["channel"], &Exact);
    assert_eq!(out[0].1, "NETWORK_NAME");
  }

  #[test]
  fn network_and_user_reclassification() {
    let out = tag(&[("channels", "NNS"), ("members", "NNS")], &[], &Exact);
    assert_eq!(out[0].1, "NETWORK");
    assert_eq!(out[1].1, "USER");
  }

  #[test]
  fn non_nouns_keep_their_tag() {
    let out = tag(&[("videos", "VBZ")], &[], &Exact);
    assert_eq!(out[0].1, "VBZ");
  }

  #[test]
  fn threshold_is_inclusive() {
    let out = tag(&[("anything", "NN")], &[], &Fixed(0.5));
    assert_eq!(out[0].1, "MEDIA");
    let out = tag(&[("anything", "NN")], &[], &Fixed(0.49));
    assert_eq!(out[0].1, "NN");
  }

  #[test]
  fn builtin_lexicon_loads() {
    let lex = DomainLexicon::builtin();
    assert_eq!(lex.version, 1);
    assert!(lex.media.iter().any(|w| w == "videos"));
  }
}
