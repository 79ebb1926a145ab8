//! Stateful pattern (regex-like) values.
//!
//! A pattern keeps a `last_index` cursor between uses when it is global (`g`)
//! or sticky (`y`), so two patterns with the same source can answer the same
//! query differently. Cursor positions are byte offsets into the haystack.
//!
//! Sources compile with the `regex` crate, which is always Unicode-aware: the
//! `d`, `u` and `v` flags are parsed and kept but change nothing, and syntax the
//! crate lacks (backreferences, lookaround) is rejected as [`PatternError::Regex`].

use std::fmt;
use std::rc::Rc;

use regex::{Regex, RegexBuilder};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("invalid pattern flag '{0}'")]
    InvalidFlag(char),
    #[error("duplicate pattern flag '{0}'")]
    DuplicateFlag(char),
    #[error("pattern flags 'u' and 'v' are mutually exclusive")]
    ConflictingUnicodeFlags,
    #[error(transparent)]
    Regex(#[from] regex::Error),
}

/// Parsed pattern flags (`d g i m s u v y`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PatternFlags {
    pub has_indices: bool,
    pub global: bool,
    pub ignore_case: bool,
    pub multiline: bool,
    pub dot_all: bool,
    pub unicode: bool,
    pub unicode_sets: bool,
    pub sticky: bool,
}

impl PatternFlags {
    pub fn parse(flags: &str) -> Result<Self, PatternError> {
        let mut parsed = Self::default();
        for flag in flags.chars() {
            let slot = match flag {
                'd' => &mut parsed.has_indices,
                'g' => &mut parsed.global,
                'i' => &mut parsed.ignore_case,
                'm' => &mut parsed.multiline,
                's' => &mut parsed.dot_all,
                'u' => &mut parsed.unicode,
                'v' => &mut parsed.unicode_sets,
                'y' => &mut parsed.sticky,
                other => return Err(PatternError::InvalidFlag(other)),
            };
            if *slot {
                return Err(PatternError::DuplicateFlag(flag));
            }
            *slot = true;
        }
        if parsed.unicode && parsed.unicode_sets {
            return Err(PatternError::ConflictingUnicodeFlags);
        }
        Ok(parsed)
    }

    /// Whether matching reads and advances `last_index`.
    pub fn tracks_last_index(&self) -> bool {
        self.global || self.sticky
    }
}

impl fmt::Display for PatternFlags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let flags = [
            (self.has_indices, 'd'),
            (self.global, 'g'),
            (self.ignore_case, 'i'),
            (self.multiline, 'm'),
            (self.dot_all, 's'),
            (self.unicode, 'u'),
            (self.unicode_sets, 'v'),
            (self.sticky, 'y'),
        ];
        for (enabled, flag) in flags {
            if enabled {
                write!(f, "{flag}")?;
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatternMatch {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

#[derive(Clone, Debug)]
pub struct Pattern {
    source: Rc<str>,
    flags: PatternFlags,
    regex: Regex,
    last_index: usize,
}

impl Pattern {
    /// Compile `source` with a flag string such as `"gi"`.
    pub fn new(source: &str, flags: &str) -> Result<Self, PatternError> {
        Self::with_flags(source, PatternFlags::parse(flags)?)
    }

    pub fn with_flags(source: &str, flags: PatternFlags) -> Result<Self, PatternError> {
        let regex = RegexBuilder::new(source)
            .case_insensitive(flags.ignore_case)
            .multi_line(flags.multiline)
            .dot_matches_new_line(flags.dot_all)
            .build()?;
        Ok(Self {
            source: source.into(),
            flags,
            regex,
            last_index: 0,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn flags(&self) -> PatternFlags {
        self.flags
    }

    pub fn last_index(&self) -> usize {
        self.last_index
    }

    pub fn set_last_index(&mut self, last_index: usize) {
        self.last_index = last_index;
    }

    /// Find the next match.
    ///
    /// Global and sticky patterns search from `last_index`, move it to the
    /// end of a match and reset it to 0 on a miss. Sticky patterns only
    /// accept a match starting exactly at the cursor. Other patterns always
    /// search from the start and leave the cursor alone.
    pub fn exec(&mut self, haystack: &str) -> Option<PatternMatch> {
        let tracks = self.flags.tracks_last_index();
        let start = if tracks { self.last_index } else { 0 };

        let found = if start <= haystack.len() && haystack.is_char_boundary(start) {
            self.regex
                .find_at(haystack, start)
                .filter(|m| !self.flags.sticky || m.start() == start)
        } else {
            None
        };

        match found {
            Some(m) => {
                if tracks {
                    self.last_index = m.end();
                }
                Some(PatternMatch {
                    start: m.start(),
                    end: m.end(),
                    text: m.as_str().to_string(),
                })
            }
            None => {
                if tracks {
                    self.last_index = 0;
                }
                None
            }
        }
    }

    pub fn test(&mut self, haystack: &str) -> bool {
        self.exec(haystack).is_some()
    }

    /// A new pattern with the same source and flags that continues from the
    /// same cursor. The compiled program is immutable and shared.
    pub fn duplicate(&self) -> Self {
        Self {
            source: Rc::clone(&self.source),
            flags: self.flags,
            regex: self.regex.clone(),
            last_index: self.last_index,
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "/{}/{}", self.source, self.flags)
    }
}
