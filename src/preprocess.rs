//! Lexical preprocessing applied before tokenization: case folding,
//! punctuation isolation and reserved-glyph substitution.

/// Characters the slot resolver treats as pure punctuation when filtering
/// keyword candidates.
pub const PUNCTUATION: &str = "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

/// Normalizes raw query text for the downstream tokenizer.
///
/// * folds to lower case
/// * substitutes the glyphs reserved by the chunker's label encoding
///   (`<` `>` `{` `}`) with plain parentheses
/// * surrounds every other punctuation character with spaces so it becomes
///   its own token, keeping possessive `'s` together as one token
pub fn normalize(raw: &str) -> String {
  let lowered = raw.to_lowercase();
  let mut out = String::with_capacity(lowered.len() + 8);
  let mut chars = lowered.chars().peekable();

  while let Some(c) = chars.next() {
    let c = match c {
      '<' | '{' => '(',
      '>' | '}' => ')',
      c => c,
    };

    if c == '\'' && chars.peek() == Some(&'s') {
      chars.next();
      // `john's` becomes `john 's`; `o'sullivan` keeps its apostrophe
      if chars.peek().is_none_or(|n| !n.is_alphanumeric()) {
        out.push_str(" 's");
      } else {
        out.push('\'');
        out.push('s');
      }
    } else if c.is_ascii_punctuation() {
      out.push(' ');
      out.push(c);
      out.push(' ');
    } else {
      out.push(c);
    }
  }

  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn folds_case() {
    assert_eq!(normalize("Videos By John"), "videos by john");
  }

  #[test]
  fn splits_possessive_marker() {
    assert_eq!(normalize("John's videos"), "john 's videos");
  }

  #[test]
  fn keeps_internal_apostrophes() {
    assert_eq!(normalize("o'sullivan"), "o'sullivan");
  }

  #[test]
  fn isolates_punctuation() {
    assert_eq!(normalize("clips, now!"), "clips ,  now ! ");
  }

  #[test]
  fn substitutes_reserved_glyphs() {
    // adjacent isolated glyphs leave a double space; the whitespace
    // tokenizer downstream does not care
    assert_eq!(normalize("a<b>{c}"), "a ( b )  ( c ) ");
  }
}
