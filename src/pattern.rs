//! The declarative pattern-grammar language and its compiler.
//!
//! A grammar is an ordered list of `(name, fragments)` declarations. Each
//! fragment is either a *build* (`{<A><B>?}`) that wraps a matched span of
//! sibling nodes into a chunk named after the rule, or a *chink* (`}<A>{`)
//! that dissolves previously built chunks back into their children. Atoms
//! are regexes over a single category label: `<NN.*>` matches `NN`, `NNS`,
//! `NNP`, … An unescaped `.` never crosses a label boundary.

use regex::Regex;
use std::collections::HashMap;

use crate::error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
  /// Wrap the matched siblings into a new chunk.
  Build,
  /// Splice the children of matched chunks back to the top level.
  Chink,
}

#[derive(Debug)]
pub struct CompiledFragment {
  pub action: Action,
  pub regex: Regex,
  pub source: String,
}

#[derive(Debug)]
pub struct CompiledRule {
  pub name: String,
  pub fragments: Vec<CompiledFragment>,
}

/// An ordered, immutable ruleset. Rule order is correctness-critical: the
/// chunker applies rules in exactly this order, so later rules can reference
/// the chunk names earlier rules produce.
#[derive(Debug)]
pub struct CompiledRuleset {
  pub rules: Vec<CompiledRule>,
}

/// Compiles an ordered list of rule declarations into a ruleset.
///
/// Duplicate declarations of a name with an identical body are skipped;
/// a differing body is a `ConflictingDefinition`. Declaration order of the
/// first occurrence of each name is preserved.
pub fn compile(decls: &[(&str, &[&str])]) -> Result<CompiledRuleset, ParseError> {
  let mut seen: HashMap<String, String> = HashMap::new();
  let mut rules = Vec::new();

  for (name, fragments) in decls {
    let body = fragments
      .iter()
      .map(|f| normalize_body(f))
      .collect::<Vec<_>>()
      .join(" ");

    match seen.get(*name) {
      Some(existing) if *existing == body => continue,
      Some(existing) => {
        return Err(ParseError::ConflictingDefinition {
          name: (*name).to_string(),
          existing: existing.clone(),
          new: body,
        });
      }
      None => {}
    }

    let compiled = fragments
      .iter()
      .map(|f| compile_fragment(name, f))
      .collect::<Result<Vec<_>, _>>()?;

    seen.insert((*name).to_string(), body);
    rules.push(CompiledRule {
      name: (*name).to_string(),
      fragments: compiled,
    });
  }

  Ok(CompiledRuleset { rules })
}

/// Whitespace between atoms carries no meaning; strip it so textually
/// different spellings of the same body compare equal.
fn normalize_body(fragment: &str) -> String {
  fragment.split_whitespace().collect()
}

fn syntax_error(rule: &str, message: impl Into<String>) -> ParseError {
  ParseError::PatternSyntax {
    rule: rule.to_string(),
    message: message.into(),
  }
}

fn compile_fragment(rule: &str, source: &str) -> Result<CompiledFragment, ParseError> {
  let s = source.trim();

  let (action, inner) = if s.len() >= 2 && s.starts_with('{') && s.ends_with('}') {
    (Action::Build, &s[1..s.len() - 1])
  } else if s.len() >= 2 && s.starts_with('}') && s.ends_with('{') {
    (Action::Chink, &s[1..s.len() - 1])
  } else {
    return Err(syntax_error(
      rule,
      format!("fragment must be `{{...}}` or `}}...{{`, got `{}`", source),
    ));
  };

  let mut pattern = String::new();
  let mut rest = inner.trim_start();
  let mut atoms = 0usize;

  while !rest.is_empty() {
    if !rest.starts_with('<') {
      return Err(syntax_error(rule, format!("expected `<` at `{}`", rest)));
    }
    let close = rest
      .find('>')
      .ok_or_else(|| syntax_error(rule, format!("unterminated `<` at `{}`", rest)))?;
    let expr = &rest[1..close];
    if expr.is_empty() {
      return Err(syntax_error(rule, "empty atom `<>`"));
    }
    if expr.contains(['{', '}']) {
      return Err(syntax_error(
        rule,
        format!("braces are not allowed inside an atom: `<{}>`", expr),
      ));
    }

    pattern.push_str("(?:<(?:");
    pattern.push_str(&confine_dots(expr));
    pattern.push_str(")>)");

    rest = &rest[close + 1..];
    if let Some(q) = rest.chars().next() {
      if q == '?' || q == '*' || q == '+' {
        pattern.push(q);
        rest = &rest[1..];
      }
    }
    rest = rest.trim_start();
    atoms += 1;
  }

  if atoms == 0 {
    return Err(syntax_error(rule, "fragment contains no atoms"));
  }

  let regex =
    Regex::new(&pattern).map_err(|e| syntax_error(rule, format!("atom regex: {}", e)))?;

  if regex.is_match("") {
    return Err(ParseError::ZeroWidthPattern {
      rule: rule.to_string(),
    });
  }

  Ok(CompiledFragment {
    action,
    regex,
    source: s.to_string(),
  })
}

/// Rewrites unescaped `.` so a wildcard cannot run past the end of one
/// encoded label into the next.
fn confine_dots(expr: &str) -> String {
  let mut out = String::with_capacity(expr.len());
  let mut escaped = false;
  for c in expr.chars() {
    if escaped {
      out.push(c);
      escaped = false;
    } else if c == '\\' {
      out.push(c);
      escaped = true;
    } else if c == '.' {
      out.push_str("[^<>]");
    } else {
      out.push(c);
    }
  }
  out
}
