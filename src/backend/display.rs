//! Output surfaces for text stages.

use crate::pipeline::bridge::SinkMessage;
use crossbeam_channel::{Sender, TrySendError};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::{Arc, Mutex};

/// 24-bit foreground colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 255, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

/// Somewhere a text stage can append coloured bytes.
#[cfg_attr(test, mockall::automock)]
pub trait DisplaySink: Send {
    fn append(&mut self, color: Color, text: &[u8]);
}

/// One display shared by several text stages.
impl<D: DisplaySink + ?Sized> DisplaySink for Arc<Mutex<D>> {
    fn append(&mut self, color: Color, text: &[u8]) {
        let mut guard = match self.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.append(color, text);
    }
}

/// Writes to a terminal using truecolor escape sequences.
pub struct AnsiDisplay<W: Write + Send> {
    out: W,
    current: Option<Color>,
}

impl<W: Write + Send> AnsiDisplay<W> {
    pub fn new(out: W) -> Self {
        Self { out, current: None }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl AnsiDisplay<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> DisplaySink for AnsiDisplay<W> {
    fn append(&mut self, color: Color, text: &[u8]) {
        let mut buf = Vec::with_capacity(text.len() + 20);
        if self.current != Some(color) {
            // Infallible: writing into a Vec.
            let _ = write!(buf, "\x1b[38;2;{};{};{}m", color.r, color.g, color.b);
            self.current = Some(color);
        }
        buf.extend_from_slice(String::from_utf8_lossy(text).as_bytes());
        if let Err(e) = self.out.write_all(&buf).and_then(|_| self.out.flush()) {
            tracing::warn!("Display write failed: {}", e);
        }
    }
}

/// Forwards text to another thread as [`SinkMessage::Text`].
///
/// Never blocks the dispatcher: when the channel is full the text is dropped.
pub struct ChannelDisplay {
    tx: Sender<SinkMessage>,
    dropped: u64,
}

impl ChannelDisplay {
    pub fn new(tx: Sender<SinkMessage>) -> Self {
        Self { tx, dropped: 0 }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl DisplaySink for ChannelDisplay {
    fn append(&mut self, color: Color, text: &[u8]) {
        let msg = SinkMessage::Text {
            color,
            bytes: text.to_vec(),
        };
        match self.tx.try_send(msg) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
                if self.dropped.is_power_of_two() {
                    tracing::warn!(dropped = self.dropped, "Display channel full, text dropped");
                }
            }
            Err(TrySendError::Disconnected(_)) => {
                tracing::trace!("Display channel closed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    #[test]
    fn test_ansi_sets_color_once() {
        let mut d = AnsiDisplay::new(Vec::new());
        d.append(Color::RED, b"ab");
        d.append(Color::RED, b"c");
        d.append(Color::GREEN, b"d");
        let out = String::from_utf8(d.into_inner()).unwrap();
        assert_eq!(out, "\x1b[38;2;255;0;0mabc\x1b[38;2;0;255;0md");
    }

    #[test]
    fn test_ansi_lossy_utf8() {
        let mut d = AnsiDisplay::new(Vec::new());
        d.append(Color::WHITE, &[b'a', 0xFF]);
        let out = String::from_utf8(d.into_inner()).unwrap();
        assert!(out.ends_with("a\u{FFFD}"));
    }

    #[test]
    fn test_shared_display_tracks_one_color() {
        let screen = Arc::new(Mutex::new(AnsiDisplay::new(Vec::new())));
        let mut local = screen.clone();
        let mut remote = screen.clone();
        local.append(Color::WHITE, b"a");
        remote.append(Color::GREEN, b"b");
        local.append(Color::WHITE, b"c");
        drop((local, remote));
        let out = Arc::try_unwrap(screen).ok().unwrap().into_inner().unwrap().into_inner();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\x1b[38;2;255;255;255ma\x1b[38;2;0;255;0mb\x1b[38;2;255;255;255mc"
        );
    }

    #[test]
    fn test_channel_display_drops_when_full() {
        let (tx, rx) = bounded(1);
        let mut d = ChannelDisplay::new(tx);
        d.append(Color::BLUE, b"one");
        d.append(Color::BLUE, b"two");
        assert_eq!(d.dropped(), 1);
        match rx.try_recv().unwrap() {
            SinkMessage::Text { color, bytes } => {
                assert_eq!(color, Color::BLUE);
                assert_eq!(bytes, b"one");
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
