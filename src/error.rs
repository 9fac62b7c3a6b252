use thiserror::Error;

/// Fatal errors surfaced by the engine. Grammar problems are configuration
/// bugs (the shipped grammars never trigger them); a structural mismatch is
/// an internal invariant violation, not bad user input. Date-resolution
/// failures are recovered locally and never reach this type.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
  /// A rule name was declared twice with two different bodies.
  #[error("conflicting definitions for rule `{name}`: `{existing}` vs `{new}`")]
  ConflictingDefinition {
    name: String,
    existing: String,
    new: String,
  },

  /// A pattern fragment doesn't follow the `{...}` / `}...{` syntax, or its
  /// atom regex failed to compile.
  #[error("bad pattern in rule `{rule}`: {message}")]
  PatternSyntax { rule: String, message: String },

  /// A fragment that can match an empty span would make no progress when
  /// applied, so it is rejected at compile time.
  #[error("pattern for rule `{rule}` can match zero width")]
  ZeroWidthPattern { rule: String },

  /// The tag tree and word tree were not built over the same token sequence.
  #[error("tag and word trees diverge at token position {position}")]
  StructuralMismatch { position: usize },
}
