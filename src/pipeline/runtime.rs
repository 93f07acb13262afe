//! Runtime: runs a graph on two threads.
//!
//! ```text
//!  sources ──read──▶ Poller ──Event::Polled──┐
//!                                            ▼
//!  InputHandle ─────Event::Deliver────▶ Dispatcher (owns Graph) ──▶ SinkMessage
//! ```
//!
//! Shutdown raises the stop flag, joins the poller first (so no read is in
//! flight against a stage being torn down), then the dispatcher, and hands
//! the graph back.

use crate::backend::display::ChannelDisplay;
use crate::config::RuntimeConfig;
use crate::error::{MultitermError, Result, ResultExt};
use crate::pipeline::bridge::{Event, InputHandle, PipelineBridge, SinkMessage};
use crate::pipeline::executor::Dispatcher;
use crate::pipeline::graph::Graph;
use crate::pipeline::id::{NodeId, SenderId};
use crate::pipeline::node::NodeCommand;
use crate::pipeline::poller::Poller;
use crossbeam_channel::{Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

const WAIT_TICK: Duration = Duration::from_millis(10);

pub struct Runtime {
    running: Arc<AtomicBool>,
    bridge: PipelineBridge,
    poller: Option<JoinHandle<()>>,
    dispatcher: Option<JoinHandle<Graph>>,
}

/// Creates the runtime's channels before the graph is built, so stages can
/// hold a sender to the UI (see [`PipelineBuilder::display`]).
pub struct PipelineBuilder {
    config: RuntimeConfig,
    bridge: PipelineBridge,
    event_rx: Receiver<Event>,
    msg_tx: Sender<SinkMessage>,
}

impl PipelineBuilder {
    pub fn new(config: &RuntimeConfig) -> Self {
        let (bridge, event_rx, msg_tx) =
            PipelineBridge::new(config.channel_capacity, config.message_capacity);
        Self {
            config: config.clone(),
            bridge,
            event_rx,
            msg_tx,
        }
    }

    /// A display sink that shows up as [`SinkMessage::Text`] on the bridge.
    pub fn display(&self) -> ChannelDisplay {
        ChannelDisplay::new(self.msg_tx.clone())
    }

    /// Spawn the poller over every pollable stage of `graph`, and the
    /// dispatcher that owns it.
    pub fn start(self, graph: Graph) -> Result<Runtime> {
        let Self {
            config,
            bridge,
            event_rx,
            msg_tx,
        } = self;

        graph.log_topology();
        let running = graph.running_flag().clone();
        running.store(true, Ordering::Release);

        let poller = Poller::new(
            graph.sources(),
            bridge.event_tx.clone(),
            running.clone(),
            config.poll_idle(),
        );
        let dispatcher = Dispatcher::new(graph, event_rx, msg_tx, config.dispatch_timeout());

        let dispatcher = std::thread::Builder::new()
            .name("dispatcher".into())
            .spawn(move || dispatcher.run())
            .context("Failed to spawn dispatcher thread")?;
        let poller = match std::thread::Builder::new()
            .name("poller".into())
            .spawn(move || poller.run())
        {
            Ok(handle) => handle,
            Err(e) => {
                running.store(false, Ordering::Release);
                let _ = dispatcher.join();
                return Err(MultitermError::from(e).with_context("Failed to spawn poller thread"));
            }
        };

        tracing::info!("Runtime started");
        Ok(Runtime {
            running,
            bridge,
            poller: Some(poller),
            dispatcher: Some(dispatcher),
        })
    }
}

impl Runtime {
    /// Start `graph` with fresh channels.
    pub fn start(graph: Graph, config: &RuntimeConfig) -> Result<Self> {
        PipelineBuilder::new(config).start(graph)
    }

    /// Handle for feeding key bytes to `target`, tagged with `sender`.
    pub fn input(&self, target: NodeId, sender: impl Into<SenderId>) -> InputHandle {
        InputHandle::new(self.bridge.event_tx.clone(), target, sender.into())
    }

    /// Queue a command for a stage.
    pub fn command(&self, target: NodeId, command: NodeCommand) -> Result<()> {
        self.bridge
            .event_tx
            .send(Event::Command { target, command })
            .map_err(|_| MultitermError::Channel("dispatcher has stopped".into()))
    }

    pub fn bridge(&self) -> &PipelineBridge {
        &self.bridge
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Stop both threads and return the graph.
    pub fn shutdown(mut self) -> Result<Graph> {
        tracing::info!("Runtime shutting down");
        self.running.store(false, Ordering::Release);
        self.bridge.shutdown();
        self.join()
    }

    /// Block until a stage requests a stop (or the dispatcher exits), then
    /// return the graph.
    pub fn wait(mut self) -> Result<Graph> {
        while self.is_running() {
            std::thread::sleep(WAIT_TICK);
        }
        self.join()
    }

    fn join(&mut self) -> Result<Graph> {
        join_poller(self.poller.take())?;
        join_dispatcher(self.dispatcher.take())
    }
}

fn join_poller(handle: Option<JoinHandle<()>>) -> Result<()> {
    match handle {
        Some(h) => h
            .join()
            .map_err(|_| MultitermError::Channel("poller thread panicked".into())),
        None => Ok(()),
    }
}

fn join_dispatcher(handle: Option<JoinHandle<Graph>>) -> Result<Graph> {
    handle
        .ok_or_else(|| MultitermError::Channel("dispatcher already joined".into()))?
        .join()
        .map_err(|_| MultitermError::Channel("dispatcher thread panicked".into()))
}

impl Drop for Runtime {
    fn drop(&mut self) {
        if self.dispatcher.is_some() || self.poller.is_some() {
            self.running.store(false, Ordering::Release);
            self.bridge.shutdown();
            if let Err(e) = self.join() {
                tracing::warn!("Runtime teardown: {}", e);
            }
        }
    }
}
