//! Length-and-checksum framing over a byte stream that may also carry raw data.
//!
//! # Wire format
//!
//! ```text
//! ESC START  len_hi  len_lo  payload...  checksum
//! ```
//!
//! `ESC` is 255 and `START` is 1. Every other position is written bare,
//! except that a value of 255 anywhere (length, payload, checksum, or raw
//! bytes outside a frame) is written as `[255, 0]`. The checksum is
//! `len_hi + len_lo + sum(payload)` modulo 256.
//!
//! Bytes outside a frame are raw data and come out of the decoder unchanged,
//! in stream order relative to the packets around them.

use crate::error::{MultitermError, Result};

/// Escape prefix.
pub const ESC: u8 = 255;
/// Follows `ESC` to mean "a literal 255".
pub const ESC_LITERAL: u8 = 0;
/// Follows `ESC` to open a frame.
pub const FRAME_START: u8 = 1;
/// Largest payload the 16-bit length field may carry.
pub const MAX_PAYLOAD: usize = 0xFFFE;

#[inline]
fn push_escaped(out: &mut Vec<u8>, byte: u8) {
    out.push(byte);
    if byte == ESC {
        out.push(ESC_LITERAL);
    }
}

/// Frame `payload`, appending the encoded bytes to `out`.
pub fn encode_into(payload: &[u8], out: &mut Vec<u8>) -> Result<()> {
    if payload.len() > MAX_PAYLOAD {
        return Err(MultitermError::OversizeFrame {
            len: payload.len(),
            max: MAX_PAYLOAD,
        });
    }

    let [len_hi, len_lo] = (payload.len() as u16).to_be_bytes();
    out.reserve(payload.len() + 6);
    out.extend_from_slice(&[ESC, FRAME_START]);
    push_escaped(out, len_hi);
    push_escaped(out, len_lo);

    let mut checksum = len_hi.wrapping_add(len_lo);
    for &b in payload {
        push_escaped(out, b);
        checksum = checksum.wrapping_add(b);
    }
    push_escaped(out, checksum);
    Ok(())
}

/// Frame `payload` into a new buffer.
pub fn encode(payload: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(payload.len() + 6);
    encode_into(payload, &mut out)?;
    Ok(out)
}

/// Escape raw bytes so they pass through a decoder unchanged.
pub fn escape_raw(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    for &b in raw {
        push_escaped(&mut out, b);
    }
    out
}

/// Output of the decoder, in stream order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// Plain bytes seen outside any frame.
    Raw(Vec<u8>),
    /// A complete, checksum-verified payload (possibly empty).
    Packet(Vec<u8>),
}

/// Why an in-flight frame was thrown away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFault {
    /// `ESC` followed by something other than `START` outside a frame.
    BadStart(u8),
    /// `ESC ESC`.
    DoubleEscape,
    /// `ESC` followed by a control value other than `START` inside a frame.
    UnexpectedControl(u8),
    /// `ESC START` while a frame was still being received.
    Restarted,
    ChecksumMismatch { expected: u8, got: u8 },
}

/// Decoder phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Raw,
    LenHi,
    LenLo,
    Payload,
    Checksum,
}

/// Running counters, mostly for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    pub packets: u64,
    pub faults: u64,
    pub raw_bytes: u64,
}

/// Incremental frame decoder.
///
/// A partially received frame survives across calls to [`FrameDecoder::push`]
/// and is completed by later input. Raw bytes are flushed at the end of every
/// call and before every packet.
#[derive(Debug)]
pub struct FrameDecoder {
    phase: Phase,
    escaped: bool,
    packet: Vec<u8>,
    len: usize,
    checksum: u8,
    raw: Vec<u8>,
    last_fault: Option<FrameFault>,
    stats: DecoderStats,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            phase: Phase::Raw,
            escaped: false,
            packet: Vec::new(),
            len: 0,
            checksum: 0,
            raw: Vec::new(),
            last_fault: None,
            stats: DecoderStats::default(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// An `ESC` has been read and the next byte decides what it meant.
    pub fn escape_pending(&self) -> bool {
        self.escaped
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    pub fn last_fault(&self) -> Option<FrameFault> {
        self.last_fault
    }

    /// Drop all state, including buffered raw bytes and any partial frame.
    pub fn reset(&mut self) {
        self.reset_frame();
        self.escaped = false;
        self.raw.clear();
    }

    /// Decode `chunk`, appending results to `out` in stream order.
    pub fn push(&mut self, chunk: &[u8], out: &mut Vec<Decoded>) {
        for &b in chunk {
            self.step(b, out);
        }
        self.flush_raw(out);
    }

    /// Decode `chunk` into a fresh vector.
    pub fn decode(&mut self, chunk: &[u8]) -> Vec<Decoded> {
        let mut out = Vec::new();
        self.push(chunk, &mut out);
        out
    }

    fn step(&mut self, byte: u8, out: &mut Vec<Decoded>) {
        let value = if self.escaped {
            self.escaped = false;
            match byte {
                ESC_LITERAL => ESC,
                ESC => {
                    // The second ESC opens a new escape of its own.
                    self.fault(FrameFault::DoubleEscape);
                    self.escaped = true;
                    return;
                }
                FRAME_START => {
                    if self.phase != Phase::Raw {
                        self.fault(FrameFault::Restarted);
                    }
                    self.reset_frame();
                    self.phase = Phase::LenHi;
                    return;
                }
                other => {
                    if self.phase == Phase::Raw {
                        self.fault(FrameFault::BadStart(other));
                    } else {
                        self.fault(FrameFault::UnexpectedControl(other));
                    }
                    return;
                }
            }
        } else if byte == ESC {
            self.escaped = true;
            return;
        } else {
            byte
        };

        match self.phase {
            Phase::Raw => self.raw.push(value),
            Phase::LenHi => {
                self.len = usize::from(value) << 8;
                self.checksum = value;
                self.phase = Phase::LenLo;
            }
            Phase::LenLo => {
                self.len |= usize::from(value);
                self.checksum = self.checksum.wrapping_add(value);
                self.phase = if self.len == 0 {
                    Phase::Checksum
                } else {
                    Phase::Payload
                };
            }
            Phase::Payload => {
                self.packet.push(value);
                self.checksum = self.checksum.wrapping_add(value);
                if self.packet.len() == self.len {
                    self.phase = Phase::Checksum;
                }
            }
            Phase::Checksum => {
                if value == self.checksum {
                    self.flush_raw(out);
                    out.push(Decoded::Packet(std::mem::take(&mut self.packet)));
                    self.stats.packets += 1;
                    self.reset_frame();
                } else {
                    self.fault(FrameFault::ChecksumMismatch {
                        expected: self.checksum,
                        got: value,
                    });
                }
            }
        }
    }

    /// Discard the in-flight frame. Buffered raw bytes are kept.
    fn fault(&mut self, fault: FrameFault) {
        tracing::debug!(?fault, phase = ?self.phase, "Discarding malformed frame");
        self.last_fault = Some(fault);
        self.stats.faults += 1;
        self.reset_frame();
    }

    fn reset_frame(&mut self) {
        self.phase = Phase::Raw;
        self.packet.clear();
        self.len = 0;
        self.checksum = 0;
    }

    fn flush_raw(&mut self, out: &mut Vec<Decoded>) {
        if !self.raw.is_empty() {
            self.stats.raw_bytes += self.raw.len() as u64;
            out.push(Decoded::Raw(std::mem::take(&mut self.raw)));
        }
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}
