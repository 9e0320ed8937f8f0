//! Streamed result previews.
//!
//! The explore endpoint streams newline-delimited JSON rows, terminated
//! by a `[DONE]` sentinel. Chunks arrive at arbitrary byte boundaries,
//! so lines are reassembled before decoding and a partial trailing line
//! is carried over to the next chunk.

use futures::StreamExt;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};
use crate::pipelines::{error_for, HttpPipelineClient};

/// End-of-stream sentinel sent by the service
pub const DONE_SENTINEL: &str = "[DONE]";

/// Query for a streamed preview
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExploreQuery {
    /// Statement to run against the connected source
    pub statement: String,

    /// Maximum number of rows to stream back
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Counters of one finished preview stream
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExploreStats {
    /// Rows decoded and delivered
    pub rows: u64,

    /// Lines that were not valid JSON and were skipped
    pub malformed: u64,
}

/// Reassembles newline-delimited frames from arbitrary byte chunks
#[derive(Debug, Default)]
pub struct LineDecoder {
    // Raw bytes: a character split across chunks must not be decoded early
    buffer: Vec<u8>,
}

impl LineDecoder {
    /// Feed one chunk, returning every complete line it closed
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(at) = self.buffer.iter().position(|&byte| byte == b'\n') {
            let frame: Vec<u8> = self.buffer.drain(..=at).collect();
            let line = String::from_utf8_lossy(&frame);
            lines.push(line.trim_end_matches(['\n', '\r']).to_string());
        }
        lines
    }

    /// The unterminated trailing line, if any
    pub fn finish(self) -> Option<String> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(String::from_utf8_lossy(&self.buffer).into_owned())
        }
    }
}

/// Decode one frame into a row. Returns false once the stream is done.
fn consume_line<F>(line: &str, stats: &mut ExploreStats, on_row: &mut F) -> bool
where
    F: FnMut(Value),
{
    let line = line.trim();
    if line.is_empty() {
        return true;
    }
    if line == DONE_SENTINEL {
        return false;
    }

    match serde_json::from_str::<Value>(line) {
        Ok(row) => {
            stats.rows += 1;
            on_row(row);
        }
        Err(source) => {
            warn!(%source, "Skipping malformed result line");
            stats.malformed += 1;
        }
    }
    true
}

impl HttpPipelineClient {
    /// Stream preview rows for a statement, invoking `on_row` for every
    /// decoded row as it arrives. Returns the stream counters after the
    /// `[DONE]` sentinel or the end of the body; cancelling the token
    /// stops the stream mid-flight.
    pub async fn stream_explore<F>(
        &self,
        query: &ExploreQuery,
        cancel: &CancellationToken,
        mut on_row: F,
    ) -> ClientResult<ExploreStats>
    where
        F: FnMut(Value),
    {
        debug!(statement = %query.statement, "Starting preview stream");

        let response = self
            .authorize(self.client().post(self.explore_url()).json(query))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_for(None, response).await);
        }

        let mut stream = response.bytes_stream();
        let mut decoder = LineDecoder::default();
        let mut stats = ExploreStats::default();

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    debug!(rows = stats.rows, "Preview stream aborted");
                    return Err(ClientError::Aborted);
                }
                chunk = stream.next() => match chunk {
                    Some(Ok(bytes)) => {
                        for line in decoder.push(&bytes) {
                            if !consume_line(&line, &mut stats, &mut on_row) {
                                return Ok(stats);
                            }
                        }
                    }
                    Some(Err(source)) => return Err(ClientError::Stream(source.to_string())),
                    None => break,
                },
            }
        }

        // A final row without a trailing newline still counts
        if let Some(tail) = decoder.finish() {
            consume_line(&tail, &mut stats, &mut on_row);
        }

        debug!(rows = stats.rows, malformed = stats.malformed, "Preview stream finished");
        Ok(stats)
    }
}
