//! LogfileNode: appends every chunk verbatim to a file.
//!
//! The file is opened once, in create+append mode, when the stage is built,
//! and stays open for the life of the stage.

use crate::pipeline::error::PipelineResult;
use crate::pipeline::id::SenderId;
use crate::pipeline::node::NodeContext;
use crate::pipeline::port::{PortDescriptor, SINK_PORTS};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct LogfileNode {
    path: PathBuf,
    file: File,
    written: u64,
}

impl LogfileNode {
    pub fn open(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        tracing::info!("Logging stream to {:?}", path);
        Ok(Self {
            path,
            file,
            written: 0,
        })
    }

    pub fn name(&self) -> &str {
        "Logfile"
    }

    pub fn ports(&self) -> &[PortDescriptor] {
        SINK_PORTS
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn deliver(&mut self, chunk: &[u8], _sender: &SenderId, _ctx: &mut NodeContext<'_>) {
        match self.file.write_all(chunk).and_then(|_| self.file.flush()) {
            Ok(()) => self.written += chunk.len() as u64,
            Err(e) => tracing::warn!("Write to {:?} failed: {}", self.path, e),
        }
    }
}
