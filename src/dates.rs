//! Date and number normalization over the word-grammar tree.
//!
//! Every `SDATE` (absolute) and `RDATE` (relative) subtree is resolved to a
//! concrete calendar date and rewritten in place to a single canonical leaf
//! spanning the original tokens. A subtree that cannot be resolved is left
//! untouched; the slot is simply absent from the final mapping.

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};

use crate::chunk::{ChunkTree, Leaf, Tree};

/// Canonical string form for resolved dates.
pub const CANONICAL_FORMAT: &str = "%m-%d-%Y";

const ABSOLUTE_DATE: &str = "SDATE";
const RELATIVE_DATE: &str = "RDATE";

/// Date-literal parsing capability. Fields missing from the literal are
/// filled in from `default`.
pub trait DateLiteralParser {
  fn parse(&self, text: &str, default: NaiveDate) -> Option<NaiveDate>;
}

/// Resolves number literals: textual digits directly, the number words
/// one..ten by fixed lookup. Anything else is absent.
pub fn resolve_number(text: &str) -> Option<u32> {
  if let Ok(n) = text.parse::<u32>() {
    return Some(n);
  }
  let n = match text {
    "one" => 1,
    "two" => 2,
    "three" => 3,
    "four" => 4,
    "five" => 5,
    "six" => 6,
    "seven" => 7,
    "eight" => 8,
    "nine" => 9,
    "ten" => 10,
    _ => return None,
  };
  Some(n)
}

/// Rewrites every resolvable date subtree to one canonical leaf, keeping the
/// subtree's category label and token span.
pub fn normalize(tree: &mut ChunkTree, today: NaiveDate, parser: &dyn DateLiteralParser) {
  for node in &mut tree.nodes {
    normalize_node(node, today, parser);
  }
}

fn normalize_node(node: &mut Tree, today: NaiveDate, parser: &dyn DateLiteralParser) {
  let Tree::Branch { label, span, children } = node else {
    return;
  };

  // descend first: an SDATE nested under DATE_FROM must be rewritten too
  for child in children.iter_mut() {
    normalize_node(child, today, parser);
  }

  let resolved = match label.as_str() {
    ABSOLUTE_DATE => resolve_absolute(children, today, parser),
    RELATIVE_DATE => resolve_relative(children, today, parser),
    _ => return,
  };

  match resolved {
    Some(date) => {
      let word = date.format(CANONICAL_FORMAT).to_string();
      *children = vec![Tree::Leaf(Leaf {
        label: word.clone(),
        word,
        span: *span,
      })];
    }
    None => tracing::debug!(category = %label, "date expression left unresolved"),
  }
}

fn leaf_text(children: &[Tree]) -> String {
  let mut words = Vec::new();
  for child in children {
    for leaf in child.leaves() {
      words.push(leaf.word.as_str());
    }
  }
  words.join(" ")
}

/// Queries never reference dates that have not occurred yet, so a resolved
/// date after `today` is re-anchored to the previous year.
fn correct_future(date: NaiveDate, today: NaiveDate) -> Option<NaiveDate> {
  if date <= today {
    return Some(date);
  }
  let year = today.year() - 1;
  NaiveDate::from_ymd_opt(year, date.month(), date.day())
    .or_else(|| NaiveDate::from_ymd_opt(year, date.month(), 28))
}

fn resolve_absolute(
  children: &[Tree],
  today: NaiveDate,
  parser: &dyn DateLiteralParser,
) -> Option<NaiveDate> {
  let text = leaf_text(children);
  let default = NaiveDate::from_ymd_opt(today.year(), 1, 1)?;
  let date = parser.parse(&text, default)?;
  correct_future(date, today)
}

fn resolve_relative(
  children: &[Tree],
  today: NaiveDate,
  parser: &dyn DateLiteralParser,
) -> Option<NaiveDate> {
  let mut magnitude: Option<u32> = None;

  for child in children {
    match child {
      Tree::Leaf(leaf) => match leaf.word.as_str() {
        "yesterday" => return today.checked_sub_days(Days::new(1)),
        "today" => return Some(today),
        // anchor words like "last", "past", "ago" carry no date on their own
        _ => {}
      },
      Tree::Branch { label, children, .. } => match label.as_str() {
        "NUM" => magnitude = resolve_number(&leaf_text(children)),
        "MONTH" | "DOW" => {
          let default = NaiveDate::from_ymd_opt(today.year(), 1, 1)?;
          let date = parser.parse(&leaf_text(children), default)?;
          return correct_future(date, today);
        }
        "UNIT" => {
          let n = magnitude.unwrap_or(1);
          return subtract_unit(today, n, &leaf_text(children));
        }
        _ => {}
      },
    }
  }

  None
}

fn subtract_unit(today: NaiveDate, n: u32, unit: &str) -> Option<NaiveDate> {
  if unit.starts_with("day") {
    today.checked_sub_days(Days::new(u64::from(n)))
  } else if unit.starts_with("week") {
    today.checked_sub_days(Days::new(u64::from(n) * 7))
  } else if unit.starts_with("month") {
    today.checked_sub_months(Months::new(n))
  } else if unit.starts_with("year") {
    today.checked_sub_months(Months::new(n * 12))
  } else if unit.starts_with("decade") {
    today.checked_sub_months(Months::new(n * 120))
  } else {
    None
  }
}

/// Chrono-backed implementation of the date-literal capability: understands
/// month names and abbreviations, days of the month, 4-digit years and
/// weekday names, filling missing fields from the default date.
pub struct ChronoDateParser;

impl DateLiteralParser for ChronoDateParser {
  fn parse(&self, text: &str, default: NaiveDate) -> Option<NaiveDate> {
    let mut month: Option<u32> = None;
    let mut day: Option<u32> = None;
    let mut year: Option<i32> = None;
    let mut weekday: Option<Weekday> = None;
    let mut recognized = false;

    for token in text.split_whitespace() {
      if let Some(m) = month_number(token) {
        month = Some(m);
        recognized = true;
      } else if let Some(w) = weekday_of(token) {
        weekday = Some(w);
        recognized = true;
      } else if let Ok(n) = token.parse::<u32>() {
        recognized = true;
        if token.len() == 4 {
          year = Some(n as i32);
        } else if day.is_none() && (1..=31).contains(&n) {
          day = Some(n);
        } else {
          return None;
        }
      } else {
        return None;
      }
    }

    if !recognized {
      return None;
    }

    if let (Some(w), None, None, None) = (weekday, month, day, year) {
      // bare weekday: first occurrence on or after the default date
      let mut date = default;
      while date.weekday() != w {
        date = date.succ_opt()?;
      }
      return Some(date);
    }

    NaiveDate::from_ymd_opt(
      year.unwrap_or_else(|| default.year()),
      month.unwrap_or_else(|| default.month()),
      day.unwrap_or_else(|| default.day()),
    )
  }
}

fn month_number(token: &str) -> Option<u32> {
  let n = match token {
    "january" | "jan" => 1,
    "february" | "feb" => 2,
    "march" | "mar" => 3,
    "april" | "apr" => 4,
    "may" => 5,
    "june" | "jun" => 6,
    "july" | "jul" => 7,
    "august" | "aug" => 8,
    "september" | "sept" | "sep" => 9,
    "october" | "oct" => 10,
    "november" | "nov" => 11,
    "december" | "dec" => 12,
    _ => return None,
  };
  Some(n)
}

fn weekday_of(token: &str) -> Option<Weekday> {
  let w = match token {
    "monday" => Weekday::Mon,
    "tuesday" => Weekday::Tue,
    "wednesday" => Weekday::Wed,
    "thursday" => Weekday::Thu,
    "friday" => Weekday::Fri,
    "saturday" => Weekday::Sat,
    "sunday" => Weekday::Sun,
    _ => return None,
  };
  Some(w)
}
