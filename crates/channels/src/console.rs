//! Console channel — interactive terminal-based chat.
//!
//! Reads lines from stdin, writes replies to stdout and notices to stderr.
//! Used for `docent chat` interactive mode.

use async_trait::async_trait;
use docent_core::channel::{InputSource, OutputSink};
use docent_core::error::ChannelError;
use tokio::io::{self, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

/// Line reader backed by a background task.
///
/// The task owns the reader so `next_line` stays cancel-safe: a line that
/// arrives while no one is waiting sits in the channel buffer.
pub struct ConsoleInput {
    rx: mpsc::Receiver<Result<String, ChannelError>>,
    prompt: Option<String>,
}

impl ConsoleInput {
    /// Read from the process's stdin, printing `> ` before each line.
    pub fn stdin() -> Self {
        Self::from_reader(io::stdin()).with_prompt("> ")
    }

    /// Read lines from any async reader, without a prompt.
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(32);

        tokio::spawn(async move {
            let mut lines = BufReader::new(reader).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if tx.send(Ok(line)).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => break, // EOF (Ctrl+D)
                    Err(e) => {
                        let _ = tx.send(Err(ChannelError::ConnectionLost(e.to_string()))).await;
                        break;
                    }
                }
            }
            debug!("Console reader finished");
        });

        Self { rx, prompt: None }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }
}

#[async_trait]
impl InputSource for ConsoleInput {
    async fn next_line(&mut self) -> Result<Option<String>, ChannelError> {
        if let Some(prompt) = &self.prompt {
            let mut stdout = io::stdout();
            stdout.write_all(prompt.as_bytes()).await.map_err(delivery)?;
            stdout.flush().await.map_err(delivery)?;
        }
        self.rx.recv().await.transpose()
    }
}

/// Writes replies and notices to two separate streams.
pub struct ConsoleOutput<O = io::Stdout, E = io::Stderr> {
    out: O,
    err: E,
}

impl ConsoleOutput {
    /// Replies to stdout, notices to stderr.
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<O, E> ConsoleOutput<O, E>
where
    O: AsyncWrite + Unpin + Send,
    E: AsyncWrite + Unpin + Send,
{
    pub fn new(out: O, err: E) -> Self {
        Self { out, err }
    }

    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }
}

async fn write_line<W>(w: &mut W, content: &str) -> Result<(), ChannelError>
where
    W: AsyncWrite + Unpin + Send,
{
    w.write_all(content.as_bytes()).await.map_err(delivery)?;
    w.write_all(b"\n").await.map_err(delivery)?;
    w.flush().await.map_err(delivery)
}

fn delivery(e: std::io::Error) -> ChannelError {
    ChannelError::DeliveryFailed(e.to_string())
}

#[async_trait]
impl<O, E> OutputSink for ConsoleOutput<O, E>
where
    O: AsyncWrite + Unpin + Send,
    E: AsyncWrite + Unpin + Send,
{
    async fn reply(&mut self, content: &str) -> Result<(), ChannelError> {
        write_line(&mut self.out, content).await
    }

    async fn notice(&mut self, content: &str) -> Result<(), ChannelError> {
        write_line(&mut self.err, content).await
    }
}
