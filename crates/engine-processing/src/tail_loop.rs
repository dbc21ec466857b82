use crate::{error::TailError, interpreter::Interpreter};
use engine_core::StopFlag;
use model::{batch::TAIL_CHUNK_SIZE, contracts::Tailer, timestamp::ResumeTimestamp};
use std::time::Duration;
use tracing::{debug, info};

/// Idle backoff between empty chunk pulls, so a quiet source doesn't spin
/// the tail loop hot while waiting on the next oplog entry.
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Pulls oplog entries from the tailer and hands them to the op
/// interpreter until the stop flag trips (C6, §4.6). Single-threaded with
/// respect to the interpreter: entries within one chunk are applied in
/// order, never concurrently.
pub struct TailLoop {
    tailer: Box<dyn Tailer>,
    interpreter: Interpreter,
    stop: StopFlag,
}

impl TailLoop {
    pub fn new(tailer: Box<dyn Tailer>, interpreter: Interpreter, stop: StopFlag) -> Self {
        TailLoop { tailer, interpreter, stop }
    }

    pub async fn run(&mut self, tail_from: Option<ResumeTimestamp>) -> Result<(), TailError> {
        self.tailer.tail_from(tail_from).await?;

        while !self.stop.is_tripped() {
            let chunk = self.tailer.next_chunk(TAIL_CHUNK_SIZE).await?;
            if chunk.is_empty() {
                tokio::time::sleep(IDLE_POLL_INTERVAL).await;
                continue;
            }

            debug!(count = chunk.len(), "tail chunk received");
            for entry in &chunk {
                self.interpreter.apply(entry).await?;
            }
        }

        info!("stop flag set, tail loop exiting");
        Ok(())
    }
}
