//! multiterm - headless terminal over a byte pipeline
//!
//! Reads key bytes from stdin, runs them through the stage graph described
//! by the config file, and writes coloured output to stdout.
//!
//! Control sequences typed at the keyboard are never echoed:
//! - `ESC ESC` quits
//! - `ESC l 0` / `ESC l 1` turns local echo off / on

use anyhow::Context;
use multiterm_rs::{
    backend::{AnsiDisplay, Color, DisplaySink, MemoryTransport},
    config::{default_config_path, AppConfig, LoggingConfig, TerminalConfig},
    matcher::ByteSeq,
    pipeline::{nodes::*, Graph, InputHandle, NodeCommand, NodeId, Port, Runtime},
};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Sender id of the sequence-check stage; the echo select keys on it.
const CHECK_ID: &str = "check";

type Screen = Arc<Mutex<AnsiDisplay<std::io::Stdout>>>;

fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(default_config_path);
    let config = config_path
        .as_deref()
        .map(AppConfig::load_or_default)
        .unwrap_or_default();

    let _log_guard = init_tracing(&config.logging)?;
    tracing::info!("Starting multiterm (config: {:?})", config_path);

    let (graph, keyboard) = build_graph(&config.terminal)?;
    let runtime = Runtime::start(graph, &config.runtime)?;
    let input = runtime.input(keyboard, "stdin");
    let reader = std::thread::Builder::new()
        .name("stdin".into())
        .spawn(move || read_keys(input))
        .context("Failed to spawn stdin reader")?;

    while runtime.is_running() && !reader.is_finished() {
        std::thread::sleep(Duration::from_millis(20));
    }

    // The reader may still be blocked in read(); it is not joined.
    runtime.shutdown()?;
    tracing::info!("Shutting down...");
    Ok(())
}

fn init_tracing(config: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));

    match &config.file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|d| !d.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .with_context(|| format!("Log file path {:?} has no file name", path))?;
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false),
                )
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
            Ok(None)
        }
    }
}

/// Wire the terminal graph. Returns it with the keyboard entry stage.
///
/// ```text
/// keyboard ─► check ─► echo ─► [lines] ─► [hex] ─► text(input)
///               │        └──► [logfile]
///               └─► lines ─► framer ─► ser1 ⇄ remote (echoes)
///                                       └─► deframer ─┬─► [lines] ─► [hex] ─► text(remote)
///                                                     └packet┘
/// ```
///
/// The framer path only exists with `loopback = true`.
fn build_graph(terminal: &TerminalConfig) -> anyhow::Result<(Graph, NodeId)> {
    let mut g = Graph::new();
    let screen: Screen = Arc::new(Mutex::new(AnsiDisplay::stdout()));
    let logfile = match &terminal.log_path {
        Some(path) => Some(g.add(
            LogfileNode::open(path).with_context(|| format!("Opening {:?}", path))?,
            "",
        )),
        None => None,
    };

    let keyboard = g.add(KeyboardNode::new(), "keyboard");
    let echo = g.add(SelectNode::new(true), "echo");

    let quit = ByteSeq::new(b"\x1b\x1b")?
        .forward(false)
        .on_match(|_, ctx| ctx.request_stop());
    let local_echo = ByteSeq::new(b"\x1bl[0-1]")?
        .forward(false)
        .with_payload(echo)
        .on_match(|m, ctx| {
            if let Some(&select) = m.payload::<NodeId>() {
                let command = match m.last_byte() {
                    Some(b'1') => NodeCommand::Enable(CHECK_ID.into()),
                    _ => NodeCommand::Disable(CHECK_ID.into()),
                };
                ctx.command(select, command);
            }
        });
    let check = g.add(SeqCheckNode::new().with(quit).with(local_echo), CHECK_ID);

    g.connect(keyboard, check)?;
    g.connect(check, echo)?;
    let local_view = display_chain(&mut g, terminal, terminal.input_color, screen.clone())?;
    g.connect(echo, local_view)?;
    if let Some(log) = logfile {
        g.connect(echo, log)?;
    }

    if terminal.loopback {
        let (near, far) = MemoryTransport::pair();
        let lines = g.add(LinebufferNode::new(), "tx-lines");
        let framer = g.add(FramerNode::new(), "framer");
        let ser = g.add(SerialNode::from_transport(near), "ser1");
        let remote = g.add(SerialNode::from_transport(far), "remote");
        let deframer = g.add(DeframerNode::new(), "deframer");

        g.connect(check, lines)?;
        g.connect(lines, framer)?;
        g.connect(framer, ser)?;
        // Whatever the far end reads is written straight back.
        g.connect(remote, remote)?;
        g.connect(ser, deframer)?;

        let remote_view = display_chain(&mut g, terminal, terminal.remote_color, screen)?;
        g.connect(deframer, remote_view)?;
        g.connect_port(deframer, Port::Packet, remote_view)?;
        if let Some(log) = logfile {
            g.connect_port(deframer, Port::Packet, log)?;
        }
    }

    Ok((g, keyboard))
}

/// Optional line buffer and hex dump in front of a text stage. Returns the
/// chain's entry stage.
fn display_chain(
    g: &mut Graph,
    terminal: &TerminalConfig,
    color: Color,
    screen: impl DisplaySink + 'static,
) -> anyhow::Result<NodeId> {
    let mut entry = g.add(TextNode::new(color, screen), "");
    if terminal.hex_dump {
        let hex = g.add(HexNode::new(), "hex");
        g.connect(hex, entry)?;
        entry = hex;
    }
    if terminal.line_buffered {
        let lines = g.add(LinebufferNode::new(), "lines");
        g.connect(lines, entry)?;
        entry = lines;
    }
    Ok(entry)
}

fn read_keys(input: InputHandle) {
    let mut stdin = std::io::stdin().lock();
    let mut buf = [0u8; 1024];
    loop {
        match stdin.read(&mut buf) {
            Ok(0) => {
                tracing::info!("stdin closed");
                break;
            }
            Ok(n) => {
                if input.send(&buf[..n]).is_err() {
                    break;
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => {
                tracing::warn!("stdin read failed: {}", e);
                break;
            }
        }
    }
}
