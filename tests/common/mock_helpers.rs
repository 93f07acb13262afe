//! Helpers for threaded tests

use multiterm_rs::backend::Color;
use multiterm_rs::pipeline::{PipelineBridge, SinkMessage};
use std::time::{Duration, Instant};

/// Poll `cond` until it holds or `timeout` passes. Returns the final verdict.
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if cond() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
}

/// Collect display text from the bridge until `want` bytes have arrived or
/// `timeout` passes.
pub fn collect_text(
    bridge: &PipelineBridge,
    want: usize,
    timeout: Duration,
) -> Vec<(Color, Vec<u8>)> {
    let deadline = Instant::now() + timeout;
    let mut out: Vec<(Color, Vec<u8>)> = Vec::new();
    while out.iter().map(|(_, b)| b.len()).sum::<usize>() < want {
        let left = deadline.saturating_duration_since(Instant::now());
        if left.is_zero() {
            break;
        }
        if let Some(SinkMessage::Text { color, bytes }) = bridge.recv_timeout(left) {
            out.push((color, bytes));
        }
    }
    out
}
