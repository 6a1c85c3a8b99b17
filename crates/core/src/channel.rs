//! Input and output traits — the abstraction over the user-facing surface.
//!
//! A session reads one line per turn from an [`InputSource`] and writes
//! replies and notices to an [`OutputSink`]. The console implementation
//! lives in `docent-channels`; the in-memory ones below drive tests.

use std::collections::VecDeque;

use async_trait::async_trait;

use crate::error::ChannelError;

/// Where user messages come from.
#[async_trait]
pub trait InputSource: Send {
    /// Block until the next line arrives. `Ok(None)` means end of input.
    async fn next_line(&mut self) -> Result<Option<String>, ChannelError>;
}

/// Where assistant replies and session notices go.
#[async_trait]
pub trait OutputSink: Send {
    /// Deliver an assistant reply.
    async fn reply(&mut self, content: &str) -> Result<(), ChannelError>;

    /// Deliver a short status line (warnings, recoverable errors).
    async fn notice(&mut self, content: &str) -> Result<(), ChannelError>;
}

/// Pre-scripted input, one line per element.
#[async_trait]
impl InputSource for VecDeque<String> {
    async fn next_line(&mut self) -> Result<Option<String>, ChannelError> {
        Ok(self.pop_front())
    }
}

/// Output that keeps everything in memory.
#[derive(Debug, Default, Clone)]
pub struct BufferedOutput {
    pub replies: Vec<String>,
    pub notices: Vec<String>,
}

#[async_trait]
impl OutputSink for BufferedOutput {
    async fn reply(&mut self, content: &str) -> Result<(), ChannelError> {
        self.replies.push(content.to_string());
        Ok(())
    }

    async fn notice(&mut self, content: &str) -> Result<(), ChannelError> {
        self.notices.push(content.to_string());
        Ok(())
    }
}
