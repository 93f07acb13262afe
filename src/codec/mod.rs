//! Wire codecs.

pub mod frame;

pub use frame::{
    encode, encode_into, escape_raw, Decoded, DecoderStats, FrameDecoder, FrameFault,
    Phase, ESC, ESC_LITERAL, FRAME_START, MAX_PAYLOAD,
};
