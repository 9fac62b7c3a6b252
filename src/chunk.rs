//! The iterative bracket-matching chunking engine.
//!
//! Chunking applies an ordered ruleset to a flat sequence of tagged leaves,
//! rewriting the top-level span list in place: a build fragment wraps a
//! matched run of siblings into one labeled subtree, a chink fragment
//! dissolves matched subtrees back into their children. Matching is greedy
//! leftmost-longest per fragment, one left-to-right pass per fragment, so
//! every rule sees the output of the rules declared before it.

use std::fmt;

use regex::Regex;

use crate::pattern::{Action, CompiledFragment, CompiledRuleset};

/// A single tagged token. Identity is positional: `span` is a half-open
/// range of token indices, `(i, i + 1)` for an ordinary leaf. A leaf
/// rewritten by the date normalizer keeps the span of the whole subtree it
/// replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
  pub word: String,
  pub label: String,
  pub span: (usize, usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Tree {
  Leaf(Leaf),
  Branch {
    label: String,
    span: (usize, usize),
    children: Vec<Tree>,
  },
}

impl Tree {
  /// The category the chunker matches against: a leaf's own label, or the
  /// rule name a subtree was built with.
  pub fn label(&self) -> &str {
    match self {
      Self::Leaf(l) => &l.label,
      Self::Branch { label, .. } => label,
    }
  }

  pub fn span(&self) -> (usize, usize) {
    match self {
      Self::Leaf(l) => l.span,
      Self::Branch { span, .. } => *span,
    }
  }

  fn covers(&self, pos: usize) -> bool {
    let (start, end) = self.span();
    start <= pos && pos < end
  }

  pub fn leaves(&self) -> Vec<&Leaf> {
    let mut out = Vec::new();
    self.collect_leaves(&mut out);
    out
  }

  fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Leaf>) {
    match self {
      Self::Leaf(l) => out.push(l),
      Self::Branch { children, .. } => {
        for c in children {
          c.collect_leaves(out);
        }
      }
    }
  }
}

impl fmt::Display for Tree {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Leaf(l) => {
        if l.word == l.label {
          write!(f, "{}", l.word)
        } else {
          write!(f, "{}/{}", l.word, l.label)
        }
      }
      Self::Branch { label, children, .. } => {
        write!(f, "({}", label)?;
        for c in children {
          write!(f, " {}", c)?;
        }
        write!(f, ")")
      }
    }
  }
}

/// An ordered forest over the full token sequence. Sibling spans are
/// contiguous and non-overlapping; reading the leaves left to right always
/// reconstructs the input sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkTree {
  pub nodes: Vec<Tree>,
}

impl ChunkTree {
  /// Number of token positions the forest covers.
  pub fn token_len(&self) -> usize {
    self.nodes.last().map_or(0, |n| n.span().1)
  }

  pub fn leaves(&self) -> Vec<&Leaf> {
    let mut out = Vec::new();
    for n in &self.nodes {
      n.collect_leaves(&mut out);
    }
    out
  }

  /// The leaf whose span covers `pos`, however deeply nested.
  pub fn leaf_at(&self, pos: usize) -> Option<&Leaf> {
    let mut node = self.nodes.iter().find(|n| n.covers(pos))?;
    loop {
      match node {
        Tree::Leaf(l) => return Some(l),
        Tree::Branch { children, .. } => {
          node = children.iter().find(|c| c.covers(pos))?;
        }
      }
    }
  }

  /// The label of the top-level node covering `pos`: the outermost chunk
  /// name, or the leaf's own label for an unchunked position.
  pub fn top_category_at(&self, pos: usize) -> Option<&str> {
    self.nodes.iter().find(|n| n.covers(pos)).map(Tree::label)
  }

  /// The label of the branch that is the immediate parent of the leaf at
  /// `pos`, or `None` for a top-level leaf.
  pub fn parent_label_at(&self, pos: usize) -> Option<&str> {
    let mut node = self.nodes.iter().find(|n| n.covers(pos))?;
    let mut parent = None;
    loop {
      match node {
        Tree::Leaf(_) => return parent,
        Tree::Branch { label, children, .. } => {
          parent = Some(label.as_str());
          node = children.iter().find(|c| c.covers(pos))?;
        }
      }
    }
  }
}

impl fmt::Display for ChunkTree {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (idx, n) in self.nodes.iter().enumerate() {
      if idx > 0 {
        write!(f, " ")?;
      }
      write!(f, "{}", n)?;
    }
    Ok(())
  }
}

/// Chunks a tagged token sequence with a compiled ruleset.
///
/// Pure and deterministic; an empty input yields an empty forest.
pub fn chunk(ruleset: &CompiledRuleset, input: &[(String, String)]) -> ChunkTree {
  let mut nodes: Vec<Tree> = input
    .iter()
    .enumerate()
    .map(|(i, (word, label))| {
      Tree::Leaf(Leaf {
        word: word.clone(),
        label: label.clone(),
        span: (i, i + 1),
      })
    })
    .collect();

  for rule in &ruleset.rules {
    for fragment in &rule.fragments {
      match fragment.action {
        Action::Build => apply_build(&mut nodes, &rule.name, fragment),
        Action::Chink => apply_chink(&mut nodes, &rule.name, fragment),
      }
    }
  }

  ChunkTree { nodes }
}

/// Encodes the labels of a span list as `<label><label>...`, returning the
/// byte offset at which each node's encoding starts (plus the final end).
fn encode(nodes: &[Tree]) -> (String, Vec<usize>) {
  let mut s = String::new();
  let mut starts = Vec::with_capacity(nodes.len() + 1);
  for n in nodes {
    starts.push(s.len());
    s.push('<');
    s.push_str(n.label());
    s.push('>');
  }
  starts.push(s.len());
  (s, starts)
}

/// Finds the leftmost match of `re` over the encoded labels that lands
/// exactly on node boundaries, returning the node index range.
fn match_range(nodes: &[Tree], re: &Regex) -> Option<(usize, usize)> {
  let (encoded, starts) = encode(nodes);
  let mut from = 0;
  while from <= encoded.len() {
    let m = re.find_at(&encoded, from)?;
    match (
      starts.binary_search(&m.start()),
      starts.binary_search(&m.end()),
    ) {
      (Ok(a), Ok(b)) if b > a => return Some((a, b)),
      // an atom's character class swallowed a label boundary; skip past it
      _ => from = m.start() + 1,
    }
  }
  None
}

fn apply_build(nodes: &mut Vec<Tree>, name: &str, fragment: &CompiledFragment) {
  let mut idx = 0;
  while idx < nodes.len() {
    let Some((a, b)) = match_range(&nodes[idx..], &fragment.regex) else {
      break;
    };
    let (a, b) = (idx + a, idx + b);
    let children: Vec<Tree> = nodes.drain(a..b).collect();
    let span = (children[0].span().0, children[children.len() - 1].span().1);
    tracing::trace!(rule = name, start = span.0, end = span.1, "built chunk");
    nodes.insert(
      a,
      Tree::Branch {
        label: name.to_string(),
        span,
        children,
      },
    );
    idx = a + 1;
  }
}

fn apply_chink(nodes: &mut Vec<Tree>, name: &str, fragment: &CompiledFragment) {
  let mut idx = 0;
  while idx < nodes.len() {
    let Some((a, b)) = match_range(&nodes[idx..], &fragment.regex) else {
      break;
    };
    let (a, b) = (idx + a, idx + b);
    let matched: Vec<Tree> = nodes.drain(a..b).collect();
    let mut spliced = Vec::with_capacity(matched.len());
    for node in matched {
      match node {
        Tree::Branch { children, .. } => spliced.extend(children),
        leaf => spliced.push(leaf),
      }
    }
    tracing::trace!(rule = name, start = a, "dissolved chunk");
    idx = a + spliced.len();
    nodes.splice(a..a, spliced);
  }
}
