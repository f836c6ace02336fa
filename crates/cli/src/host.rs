//! Line-oriented host shell.
//!
//! Stands in for the visual-programming host: each input line is one block
//! invocation, `{"opcode": "ambientSetData", "args": {"DATA": "d1", "VALUE": 20}}`.
//! Lines that cannot be parsed or dispatched are logged and skipped; the
//! session is never touched by a bad line.

use extension::{BlockCommand, PendingTransmission, Session, TelemetryClientFactory};
use serde::Deserialize;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

/// One block invocation as sent by the host.
#[derive(Debug, Deserialize)]
pub struct Invocation {
    pub opcode: String,
    #[serde(default)]
    pub args: Value,
}

/// Counts reported when the input is exhausted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Blocks handed to the session.
    pub dispatched: usize,
    /// Lines skipped because they were not valid invocations.
    pub skipped: usize,
    /// Transmissions the service accepted.
    pub sent: usize,
    /// Transmissions that failed or were rejected.
    pub failed: usize,
}

/// Dispatches invocations to one session and tallies the transmissions they
/// start.
///
/// Finished transmissions are collected as each line arrives, so only
/// requests still in flight are held between lines.
pub struct HostShell<'a, F: TelemetryClientFactory> {
    session: &'a mut Session<F>,
    pending: Vec<PendingTransmission>,
    summary: RunSummary,
    line_number: usize,
}

impl<'a, F: TelemetryClientFactory> HostShell<'a, F> {
    pub fn new(session: &'a mut Session<F>) -> Self {
        Self {
            session,
            pending: Vec::new(),
            summary: RunSummary::default(),
            line_number: 0,
        }
    }

    /// Counts so far. `sent` and `failed` only include collected transmissions.
    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    /// Transmissions started but not yet collected.
    pub fn outstanding(&self) -> usize {
        self.pending.len()
    }

    /// Handles one input line.
    pub async fn handle_line(&mut self, line: &str) {
        self.line_number += 1;
        self.reap_finished().await;

        let line = line.trim();
        if line.is_empty() {
            return;
        }

        let invocation: Invocation = match serde_json::from_str(line) {
            Ok(invocation) => invocation,
            Err(e) => {
                warn!(line = self.line_number, error = %e, "Skipping malformed invocation");
                self.summary.skipped += 1;
                return;
            }
        };
        let command = match BlockCommand::from_host(&invocation.opcode, &invocation.args) {
            Ok(command) => command,
            Err(e) => {
                warn!(line = self.line_number, error = %e, "Skipping undispatchable invocation");
                self.summary.skipped += 1;
                return;
            }
        };

        debug!(line = self.line_number, opcode = command.opcode(), "Dispatching block");
        self.summary.dispatched += 1;
        if let Some(transmission) = self.session.dispatch(command) {
            self.pending.push(transmission);
        }
    }

    /// Waits for every outstanding transmission and returns the final counts.
    pub async fn finish(mut self) -> RunSummary {
        if !self.pending.is_empty() {
            info!(outstanding = self.pending.len(), "Input closed; waiting for transmissions");
        }
        for transmission in std::mem::take(&mut self.pending) {
            self.record(transmission).await;
        }
        self.summary
    }

    async fn reap_finished(&mut self) {
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].is_finished() {
                let transmission = self.pending.swap_remove(i);
                self.record(transmission).await;
            } else {
                i += 1;
            }
        }
    }

    async fn record(&mut self, transmission: PendingTransmission) {
        // Outcomes are already logged by the transmission task.
        match transmission.wait().await {
            Ok(_) => self.summary.sent += 1,
            Err(_) => self.summary.failed += 1,
        }
    }
}

/// Dispatches every invocation in `input` to `session`, then waits for the
/// transmissions still in flight.
pub async fn run<F, R>(session: &mut Session<F>, input: R) -> std::io::Result<RunSummary>
where
    F: TelemetryClientFactory,
    R: AsyncBufRead + Unpin,
{
    let mut shell = HostShell::new(session);
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        shell.handle_line(&line).await;
    }
    let collected = shell.summary();
    debug!(
        sent = collected.sent,
        failed = collected.failed,
        outstanding = shell.outstanding(),
        "Input closed"
    );
    Ok(shell.finish().await)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use extension::{
        Credentials, DataBuffer, Slot, TelemetryClient, TelemetryError, Timestamp, TransmissionId,
        TransmissionReceipt,
    };

    use super::*;

    type Log = Arc<Mutex<Vec<(Credentials, DataBuffer)>>>;

    struct LogClient {
        credentials: Credentials,
        log: Log,
    }

    #[async_trait]
    impl TelemetryClient for LogClient {
        async fn send(
            &self,
            id: TransmissionId,
            data: &DataBuffer,
        ) -> Result<TransmissionReceipt, TelemetryError> {
            self.log
                .lock()
                .unwrap()
                .push((self.credentials.clone(), data.clone()));
            if self.credentials.write_key.as_str() == "bad" {
                return Err(TelemetryError::Rejected {
                    status: 401,
                    body: String::new(),
                });
            }
            Ok(TransmissionReceipt {
                id,
                channel_id: self.credentials.channel_id.clone(),
                status: 200,
                slots: data.len(),
                body: String::new(),
                completed_at: Timestamp::now(),
            })
        }

        fn credentials(&self) -> &Credentials {
            &self.credentials
        }
    }

    struct LogFactory(Log);

    impl TelemetryClientFactory for LogFactory {
        fn connect(&self, credentials: Credentials) -> Arc<dyn TelemetryClient> {
            Arc::new(LogClient {
                credentials,
                log: Arc::clone(&self.0),
            })
        }
    }

    fn session() -> (Session<LogFactory>, Log) {
        let log = Log::default();
        (Session::new(LogFactory(Arc::clone(&log))), log)
    }

    #[tokio::test]
    async fn test_run_dispatches_and_waits() {
        let (mut session, log) = session();
        let input = r#"
{"opcode": "ambientInit", "args": {"CHANNELID": "100", "WRITEKEY": "key"}}
{"opcode": "ambientSetData", "args": {"DATA": "d1", "VALUE": 10}}
{"opcode": "ambientSetData", "args": {"DATA": "d2", "VALUE": "2.5"}}
{"opcode": "ambientSend"}
{"opcode": "ambientSetData", "args": {"DATA": "d3", "VALUE": 3}}
{"opcode": "ambientClear", "args": {}}
{"opcode": "ambientSend", "args": {}}
"#;

        let summary = run(&mut session, input.as_bytes()).await.unwrap();

        assert_eq!(
            summary,
            RunSummary {
                dispatched: 7,
                skipped: 0,
                sent: 2,
                failed: 0,
            }
        );
        let log = log.lock().unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].0, Credentials::new("100", "key"));
        assert_eq!(log[0].1.get(Slot::D1), Some(10.0));
        assert_eq!(log[0].1.get(Slot::D2), Some(2.5));
        assert!(log[1].1.is_empty());
    }

    #[tokio::test]
    async fn test_run_skips_bad_lines() {
        let (mut session, log) = session();
        let input = "not json\n\
                     {\"opcode\": \"ambientExplode\"}\n\
                     {\"opcode\": \"ambientSetData\", \"args\": {\"DATA\": \"d9\", \"VALUE\": 1}}\n\
                     {\"opcode\": \"ambientSetData\", \"args\": {\"DATA\": \"d8\", \"VALUE\": 1}}\n";

        let summary = run(&mut session, input.as_bytes()).await.unwrap();

        assert_eq!(summary.skipped, 3);
        assert_eq!(summary.dispatched, 1);
        assert_eq!(session.buffer().get(Slot::D8), Some(1.0));
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_run_counts_failed_transmissions() {
        let (mut session, _) = session();
        let input = "{\"opcode\": \"ambientInit\", \"args\": {\"CHANNELID\": \"1\", \"WRITEKEY\": \"bad\"}}\n\
                     {\"opcode\": \"ambientSend\"}\n";

        let summary = run(&mut session, input.as_bytes()).await.unwrap();

        assert_eq!(summary.sent, 0);
        assert_eq!(summary.failed, 1);
    }

    #[tokio::test]
    async fn test_finished_transmissions_are_counted_before_input_ends() {
        let (mut session, log) = session();
        let mut shell = HostShell::new(&mut session);

        shell
            .handle_line(r#"{"opcode": "ambientInit", "args": {"CHANNELID": "7", "WRITEKEY": "key"}}"#)
            .await;
        shell.handle_line(r#"{"opcode": "ambientSend"}"#).await;
        shell.handle_line(r#"{"opcode": "ambientSend"}"#).await;
        assert_eq!(shell.outstanding() + shell.summary().sent, 2);

        tokio::time::sleep(Duration::from_millis(20)).await;
        shell.handle_line("").await;

        assert_eq!(shell.outstanding(), 0);
        assert_eq!(shell.summary().sent, 2);
        assert_eq!(log.lock().unwrap().len(), 2);

        let summary = shell.finish().await;
        assert_eq!(summary.sent, 2);
        assert_eq!(summary.dispatched, 3);
    }
}
