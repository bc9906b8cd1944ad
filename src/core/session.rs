//! Session management
//!
//! Connects a byte source (serial port, pipe, file) to a [`Terminal`]. A
//! reader thread pulls raw chunks and hands them over a channel; the thread
//! that owns the terminal drains them and feeds the bytes in order, so the
//! terminal only ever sees one writer.

use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::terminal::Terminal;

const CHUNK_SIZE: usize = 4096;

/// Session events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Bytes were fed, screen updated
    Output,
    /// Source reached end of input
    Closed,
    /// Reading from the source failed
    Error(String),
}

enum Chunk {
    Data(Vec<u8>),
    Eof,
    Failed(String),
}

/// A byte source feeding a terminal
pub struct Session {
    /// Running flag
    running: Arc<AtomicBool>,
    /// Reader thread handle
    reader_thread: Option<JoinHandle<()>>,
    /// Channel to receive source output
    output_rx: Receiver<Chunk>,
    closed: bool,
}

impl Session {
    /// Start reading from `source` on a background thread
    pub fn spawn<R>(mut source: R) -> io::Result<Self>
    where
        R: Read + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let (tx, rx) = mpsc::channel::<Chunk>();

        let flag = running.clone();
        let reader_thread = thread::Builder::new()
            .name("vramterm-reader".to_string())
            .spawn(move || {
                let mut buffer = vec![0u8; CHUNK_SIZE];
                while flag.load(Ordering::SeqCst) {
                    let chunk = match source.read(&mut buffer) {
                        Ok(0) => Chunk::Eof,
                        Ok(n) => Chunk::Data(buffer[..n].to_vec()),
                        Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                        Err(e) => Chunk::Failed(e.to_string()),
                    };
                    let done = !matches!(chunk, Chunk::Data(_));
                    if tx.send(chunk).is_err() || done {
                        break;
                    }
                }
                flag.store(false, Ordering::SeqCst);
            })?;

        info!("Session reader started");
        Ok(Self {
            running,
            reader_thread: Some(reader_thread),
            output_rx: rx,
            closed: false,
        })
    }

    /// Check if the source is still delivering
    pub fn is_running(&self) -> bool {
        !self.closed
    }

    /// Feed everything that is available right now, without blocking
    pub fn pump(&mut self, terminal: &mut Terminal) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while !self.closed {
            match self.output_rx.try_recv() {
                Ok(chunk) => events.extend(self.handle(chunk, terminal)),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.closed = true;
                    events.push(SessionEvent::Closed);
                }
            }
        }
        events
    }

    /// Wait up to `timeout` for the next chunk and feed it
    pub fn pump_timeout(
        &mut self,
        terminal: &mut Terminal,
        timeout: Duration,
    ) -> Option<SessionEvent> {
        if self.closed {
            return None;
        }
        match self.output_rx.recv_timeout(timeout) {
            Ok(chunk) => self.handle(chunk, terminal),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                self.closed = true;
                Some(SessionEvent::Closed)
            }
        }
    }

    /// Feed until the source is exhausted
    pub fn drain_blocking(&mut self, terminal: &mut Terminal) -> Result<usize, String> {
        let mut chunks = 0;
        while !self.closed {
            let event = match self.output_rx.recv() {
                Ok(chunk) => self.handle(chunk, terminal),
                Err(_) => {
                    self.closed = true;
                    Some(SessionEvent::Closed)
                }
            };
            match event {
                Some(SessionEvent::Output) => chunks += 1,
                Some(SessionEvent::Error(e)) => return Err(e),
                _ => {}
            }
        }
        Ok(chunks)
    }

    fn handle(&mut self, chunk: Chunk, terminal: &mut Terminal) -> Option<SessionEvent> {
        match chunk {
            Chunk::Data(data) => {
                debug!("Feeding {} bytes", data.len());
                terminal.feed(&data);
                Some(SessionEvent::Output)
            }
            Chunk::Eof => {
                info!("Session source closed");
                self.closed = true;
                Some(SessionEvent::Closed)
            }
            Chunk::Failed(e) => {
                warn!("Session source failed: {}", e);
                self.closed = true;
                Some(SessionEvent::Error(e))
            }
        }
    }

    /// Stop the reader thread.
    ///
    /// A reader blocked inside `read` only notices once the source yields.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.closed = true;
        if let Some(handle) = self.reader_thread.take() {
            if handle.is_finished() {
                let _ = handle.join();
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop();
    }
}
