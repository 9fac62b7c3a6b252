//! The two shipped grammars: the tag grammar applied to POS + domain tags,
//! and the word grammar applied to raw token text. Rule order is the
//! application order; later rules reference the chunk names of earlier ones.
//! Both end with an explicit chink rule so helper categories never survive
//! at the top level.

use crate::pattern::{CompiledRuleset, compile};

/// Entity-phrase grammar over POS and domain tags.
pub const TAG_GRAMMAR: &[(&str, &[&str])] = &[
  // possessive phrase: owner noun(s), the marker, optionally the owned head
  ("PosP", &["{<NN.*|USER|MEDIA|NETWORK|NETWORK_NAME><POS><MEDIA|NETWORK|NN.*>?}"]),
  // prepositional phrase attaching a nominal to a preceding preposition
  ("PP", &["{<IN|TO><DT>?<JJ>*<NN.*|MEDIA|NETWORK|USER|NETWORK_NAME>+}"]),
  // group leftover nominals, then hand them back unlabeled
  ("NP", &["{<DT>?<JJ>*<NN.*>+}"]),
  ("STRAY", &["}<NP>{"]),
];

/// Quantity, date, comparator and preposition grammar over raw tokens.
pub const WORD_GRAMMAR: &[(&str, &[&str])] = &[
  ("YEAR", &["{<[12][0-9][0-9][0-9]>}"]),
  ("NUM", &["{<[0-9]+|one|two|three|four|five|six|seven|eight|nine|ten>}"]),
  (
    "MONTH",
    &["{<january|february|march|april|may|june|july|august|september|october|november|december|jan|feb|mar|apr|jun|jul|aug|sept|sep|oct|nov|dec>}"],
  ),
  ("DOW", &["{<monday|tuesday|wednesday|thursday|friday|saturday|sunday>}"]),
  ("UNIT", &["{<days?|weeks?|months?|years?|decades?>}"]),
  (
    "RDATE",
    &[
      "{<yesterday|today>}",
      "{<last|past><NUM>?<UNIT|MONTH|DOW>}",
      "{<NUM><UNIT><ago>}",
    ],
  ),
  (
    "SDATE",
    &[
      "{<MONTH><NUM><YEAR>?}",
      "{<NUM><MONTH><YEAR>?}",
      "{<MONTH><YEAR>?}",
      "{<DOW>}",
      "{<YEAR>}",
    ],
  ),
  (
    "LENGTH",
    &["{<over|under|about|around|at|exactly|least|most>*<NUM><seconds?|minutes?|hours?>}"],
  ),
  ("BY", &["{<by>}"]),
  ("FROM", &["{<from|since>}"]),
  ("TO", &["{<to|until|till|before>}"]),
  ("DATE_FROM", &["{<FROM><SDATE|RDATE>}"]),
  ("DATE_TO", &["{<TO><SDATE|RDATE>}"]),
  ("STRAY", &["}<NUM|MONTH|DOW|UNIT|YEAR>{"]),
];

lazy_static! {
  /// Compiled once and shared; chunking never mutates a ruleset.
  pub static ref TAG_RULESET: CompiledRuleset =
    compile(TAG_GRAMMAR).expect("shipped tag grammar must compile");
  pub static ref WORD_RULESET: CompiledRuleset =
    compile(WORD_GRAMMAR).expect("shipped word grammar must compile");
}
