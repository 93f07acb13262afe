//! Single-pattern incremental byte matcher.
//!
//! A pattern is a byte string whose last position may be a bracketed class:
//!
//! ```text
//! b"\x1b\x1b"             ESC ESC
//! b"\x1bb[x-z]"           ESC 'b' then one of 'x'..='z'
//! b"\x1ba[a-c,e,g-i]"     ESC 'a' then one of a b c e g h i
//! ```
//!
//! Class entries are comma-separated and are either one byte or a three-byte
//! `lo-hi` inclusive range. The matcher does not backtrack: a byte that fails
//! to extend a partial match resets the cursor and is not compared again.

use crate::pipeline::error::PatternError;
use crate::pipeline::node::NodeContext;
use std::any::Any;
use std::fmt;
use std::ops::RangeInclusive;

/// Callback invoked by a sequence-check stage when a pattern completes.
pub type MatchCallback = Box<dyn FnMut(&SeqMatch<'_>, &mut NodeContext<'_>) + Send>;

/// Opaque value carried by a pattern and handed to its callback.
pub type Payload = Box<dyn Any + Send>;

/// What a callback sees when its pattern matches.
pub struct SeqMatch<'a> {
    /// Index of the pattern within its sequence-check stage.
    pub index: usize,
    /// The pattern's associated payload.
    pub payload: &'a (dyn Any + Send),
    /// Bytes consumed by the trailing class (empty for literal patterns).
    pub got: &'a [u8],
}

impl SeqMatch<'_> {
    /// Downcast the payload.
    pub fn payload<T: 'static>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }

    /// The byte accepted by the trailing class, if any.
    pub fn last_byte(&self) -> Option<u8> {
        self.got.last().copied()
    }
}

/// Acceptance set for the final position of a class pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteClass {
    ranges: Vec<RangeInclusive<u8>>,
}

impl ByteClass {
    fn parse(body: &[u8]) -> Result<Self, PatternError> {
        let mut ranges = Vec::new();
        for entry in body.split(|&b| b == b',') {
            match entry {
                [b] => ranges.push(*b..=*b),
                [lo, b'-', hi] if lo <= hi => ranges.push(*lo..=*hi),
                _ => {
                    return Err(PatternError::InvalidClassEntry {
                        entry: entry.to_vec(),
                    })
                }
            }
        }
        Ok(Self { ranges })
    }

    #[inline]
    pub fn contains(&self, byte: u8) -> bool {
        self.ranges.iter().any(|r| r.contains(&byte))
    }

    pub fn ranges(&self) -> &[RangeInclusive<u8>] {
        &self.ranges
    }
}

/// A byte pattern with its match cursor, callback and payload.
pub struct ByteSeq {
    /// Literal positions. For class patterns this is the prefix only.
    literal: Vec<u8>,
    class: Option<ByteClass>,
    callback: Option<MatchCallback>,
    payload: Payload,
    forward: bool,
    cursor: usize,
    matched: bool,
    got: Vec<u8>,
}

impl ByteSeq {
    /// Parse `pattern`. The matcher forwards while pending and has no callback
    /// until configured with the builder methods below.
    pub fn new(pattern: &[u8]) -> Result<Self, PatternError> {
        let (literal, class) = parse_pattern(pattern)?;
        Ok(Self {
            literal,
            class,
            callback: None,
            payload: Box::new(()),
            forward: true,
            cursor: 0,
            matched: false,
            got: Vec::new(),
        })
    }

    /// Set the function called on every match.
    pub fn on_match<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&SeqMatch<'_>, &mut NodeContext<'_>) + Send + 'static,
    {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Attach an arbitrary payload passed back to the callback.
    pub fn with_payload<T: Any + Send>(mut self, payload: T) -> Self {
        self.payload = Box::new(payload);
        self
    }

    /// Whether bytes may be forwarded while this pattern is partially matched.
    pub fn forward(mut self, forward: bool) -> Self {
        self.forward = forward;
        self
    }

    /// Pattern length in positions (the class counts as one).
    pub fn len(&self) -> usize {
        self.literal.len() + usize::from(self.class.is_some())
    }

    /// Always false: empty patterns are rejected by [`ByteSeq::new`].
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn forwards(&self) -> bool {
        self.forward
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Partially matched: at least one byte consumed, and not yet reset.
    pub fn is_engaged(&self) -> bool {
        self.cursor > 0
    }

    pub fn is_matched(&self) -> bool {
        self.matched
    }

    /// Bytes accepted by the trailing class since the last reset.
    pub fn got(&self) -> &[u8] {
        &self.got
    }

    pub fn class(&self) -> Option<&ByteClass> {
        self.class.as_ref()
    }

    /// Advance the cursor with one byte. Returns true when the pattern is
    /// complete; the cursor then stays at `len()` until [`ByteSeq::reset`].
    pub fn feed(&mut self, byte: u8) -> bool {
        if self.matched {
            self.reset();
        }

        let last = self.len() - 1;
        if self.cursor < last {
            if byte == self.literal[self.cursor] {
                self.cursor += 1;
            } else {
                self.cursor = 0;
            }
            return false;
        }

        let hit = match &self.class {
            Some(class) => class.contains(byte),
            None => byte == self.literal[last],
        };
        if hit {
            self.cursor = self.len();
            self.matched = true;
            if self.class.is_some() {
                self.got.push(byte);
            }
        } else {
            self.cursor = 0;
        }
        hit
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
        self.matched = false;
        self.got.clear();
    }

    /// Run the callback for a completed match.
    pub(crate) fn fire(&mut self, index: usize, ctx: &mut NodeContext<'_>) {
        if let Some(callback) = self.callback.as_mut() {
            let event = SeqMatch {
                index,
                payload: self.payload.as_ref(),
                got: &self.got,
            };
            callback(&event, ctx);
        }
    }
}

impl fmt::Debug for ByteSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteSeq")
            .field("literal", &self.literal)
            .field("class", &self.class)
            .field("forward", &self.forward)
            .field("cursor", &self.cursor)
            .field("matched", &self.matched)
            .finish()
    }
}

fn parse_pattern(pattern: &[u8]) -> Result<(Vec<u8>, Option<ByteClass>), PatternError> {
    if pattern.is_empty() {
        return Err(PatternError::Empty);
    }

    let Some(open) = pattern.iter().position(|&b| b == b'[') else {
        return Ok((pattern.to_vec(), None));
    };

    let rest = &pattern[open + 1..];
    match rest.last() {
        Some(b']') => {}
        _ if rest.contains(&b']') => {
            return Err(PatternError::TrailingAfterClass {
                pattern: pattern.to_vec(),
            })
        }
        _ => {
            return Err(PatternError::UnclosedClass {
                pattern: pattern.to_vec(),
            })
        }
    }

    let class = ByteClass::parse(&rest[..rest.len() - 1])?;
    Ok((pattern[..open].to_vec(), Some(class)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(seq: &mut ByteSeq, input: &[u8]) -> Vec<usize> {
        let mut hits = Vec::new();
        for (i, &b) in input.iter().enumerate() {
            if seq.feed(b) {
                hits.push(i);
                seq.reset();
            }
        }
        hits
    }

    #[test]
    fn test_literal_match() {
        let mut seq = ByteSeq::new(b"\x1b\x1b").unwrap();
        assert_eq!(seq.len(), 2);
        assert!(!seq.feed(0x1b));
        assert!(seq.is_engaged());
        assert!(seq.feed(0x1b));
        assert!(seq.is_matched());
        assert!(seq.got().is_empty());
    }

    #[test]
    fn test_mismatch_resets_without_retry() {
        let mut seq = ByteSeq::new(b"\x1ba").unwrap();
        // The second ESC breaks the partial match and is not retried at position 0.
        assert_eq!(feed_all(&mut seq, b"\x1b\x1ba"), Vec::<usize>::new());
        assert_eq!(feed_all(&mut seq, b"x\x1bay"), vec![2]);
    }

    #[test]
    fn test_class_match_accumulates_final_byte() {
        let mut seq = ByteSeq::new(b"\x1bb[x-z]").unwrap();
        assert_eq!(seq.len(), 3);
        seq.feed(0x1b);
        seq.feed(b'b');
        assert!(seq.feed(b'y'));
        assert_eq!(seq.got(), b"y");
        seq.reset();
        assert!(seq.got().is_empty());

        seq.feed(0x1b);
        seq.feed(b'b');
        assert!(!seq.feed(b'w'));
        assert_eq!(seq.cursor(), 0);
    }

    #[test]
    fn test_class_singletons_and_ranges() {
        let seq = ByteSeq::new(b"\x1ba[a-c,e,g-i]").unwrap();
        let class = seq.class().unwrap();
        for b in b"abceghi" {
            assert!(class.contains(*b), "{} should be accepted", *b as char);
        }
        for b in b"dfjz" {
            assert!(!class.contains(*b));
        }
    }

    #[test]
    fn test_class_only_pattern() {
        let mut seq = ByteSeq::new(b"[0-9]").unwrap();
        assert_eq!(seq.len(), 1);
        assert!(seq.feed(b'7'));
        assert_eq!(seq.got(), b"7");
    }

    #[test]
    fn test_feed_after_match_starts_over() {
        let mut seq = ByteSeq::new(b"ab").unwrap();
        seq.feed(b'a');
        assert!(seq.feed(b'b'));
        // Not reset by the owner: the next byte starts a fresh scan.
        assert!(!seq.feed(b'a'));
        assert!(seq.feed(b'b'));
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        assert_eq!(
            ByteSeq::new(b"\x1b[z-a]").unwrap_err(),
            PatternError::InvalidClassEntry {
                entry: b"z-a".to_vec()
            }
        );
        assert!(ByteSeq::new(b"\x1b[a-a]").is_ok());
    }

    #[test]
    fn test_pattern_errors() {
        assert_eq!(ByteSeq::new(b"").unwrap_err(), PatternError::Empty);
        assert!(matches!(
            ByteSeq::new(b"\x1b[a-c").unwrap_err(),
            PatternError::UnclosedClass { .. }
        ));
        assert!(matches!(
            ByteSeq::new(b"\x1b[ab]").unwrap_err(),
            PatternError::InvalidClassEntry { .. }
        ));
        assert!(matches!(
            ByteSeq::new(b"\x1b[a-bc]").unwrap_err(),
            PatternError::InvalidClassEntry { .. }
        ));
        assert!(matches!(
            ByteSeq::new(b"\x1b[]").unwrap_err(),
            PatternError::InvalidClassEntry { .. }
        ));
        assert!(matches!(
            ByteSeq::new(b"\x1b[a]x").unwrap_err(),
            PatternError::TrailingAfterClass { .. }
        ));
    }

    #[test]
    fn test_payload_downcast() {
        let seq = ByteSeq::new(b"x").unwrap().with_payload(2.5f64);
        let event = SeqMatch {
            index: 0,
            payload: seq.payload.as_ref(),
            got: &[],
        };
        assert_eq!(event.payload::<f64>(), Some(&2.5));
        assert_eq!(event.payload::<u32>(), None);
        assert_eq!(event.last_byte(), None);
    }

    // Property-based tests using proptest
    use proptest::prelude::*;

    /// A literal pattern whose first byte never reappears in it, and a stream
    /// built from whole copies of the pattern and noise free of that byte.
    /// For such inputs the non-backtracking matcher is exact.
    fn pattern_and_stream() -> impl Strategy<Value = (Vec<u8>, Vec<Vec<u8>>)> {
        (any::<u8>(), prop::collection::vec(any::<u8>(), 0..4)).prop_flat_map(|(head, tail)| {
            let tail: Vec<u8> = tail.into_iter().filter(|&b| b != head).collect();
            let mut pattern = vec![head];
            pattern.extend(tail);
            let noise = prop::collection::vec(any::<u8>(), 0..8).prop_map(move |v| {
                v.into_iter().filter(|&b| b != head).collect::<Vec<u8>>()
            });
            let segment = prop_oneof![Just(None), noise.prop_map(Some)];
            (
                Just(pattern),
                prop::collection::vec(segment, 0..12),
            )
        })
        .prop_map(|(pattern, segments)| {
            let segments = segments
                .into_iter()
                .map(|s| s.unwrap_or_else(|| pattern.clone()))
                .collect();
            (pattern, segments)
        })
    }

    proptest! {
        #[test]
        fn test_literal_hits_exactly_where_pattern_ends((pattern, segments) in pattern_and_stream()) {
            // '[' would open a class; keep the pattern literal.
            prop_assume!(!pattern.contains(&b'['));
            let stream: Vec<u8> = segments.concat();
            let mut seq = ByteSeq::new(&pattern).unwrap();
            let hits = feed_all(&mut seq, &stream);

            let expected: Vec<usize> = (0..stream.len())
                .filter(|&i| i + 1 >= pattern.len() && stream[i + 1 - pattern.len()..=i] == pattern[..])
                .collect();
            prop_assert_eq!(hits, expected);
        }

        #[test]
        fn test_class_matches_iff_final_byte_in_range(lo in 0u8..=255, hi in 0u8..=255, last in any::<u8>()) {
            prop_assume!(![lo, hi].contains(&b','));
            let mut pattern = b"\x1bq[".to_vec();
            pattern.extend([lo, b'-', hi, b']']);
            let mut seq = ByteSeq::new(&pattern).unwrap();
            seq.feed(0x1b);
            seq.feed(b'q');
            let hit = seq.feed(last);
            prop_assert_eq!(hit, lo <= last && last <= hi);
            if hit {
                prop_assert_eq!(seq.got(), &[last][..]);
            }
        }
    }
}
