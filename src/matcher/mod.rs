//! Byte-sequence detection.
//!
//! [`ByteSeq`] tracks one pattern over a byte stream. The sequence-check
//! stage (`pipeline::nodes::seq_check`) runs many of them side by side.

pub mod byte_seq;

pub use byte_seq::{ByteClass, ByteSeq, MatchCallback, Payload, SeqMatch};
