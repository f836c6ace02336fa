//! The block handler set.
//!
//! A [`Session`] owns the current telemetry client and the data buffer. The
//! host shell constructs one session and feeds it every decoded
//! [`BlockCommand`]; the handlers take `&mut self`, so the buffer is only ever
//! touched by the dispatching task and needs no lock.
//!
//! `send` is the only handler that does anything asynchronous. It spawns the
//! request on the Tokio runtime, clears the buffer straight away, and returns a
//! [`PendingTransmission`]. The spawned task logs its own outcome, so dropping
//! the handle gives the same fire-and-forget behaviour blocks have always had;
//! awaiting it gives callers (and tests) the result.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::{
    BlockCommand, ChannelId, Credentials, DataBuffer, Slot, TelemetryClient,
    TelemetryClientFactory, TelemetryError, TransmissionId, TransmissionReceipt, WriteKey,
};

/// Mutable state behind the four blocks.
pub struct Session<F> {
    factory: F,
    client: Arc<dyn TelemetryClient>,
    initialized: bool,
    buffer: DataBuffer,
}

impl<F: TelemetryClientFactory> Session<F> {
    /// Creates a session with an empty buffer.
    ///
    /// Until [`Session::init`] runs, the session holds a client built from
    /// [`Credentials::placeholder`].
    pub fn new(factory: F) -> Self {
        let client = factory.connect(Credentials::placeholder());
        Self {
            factory,
            client,
            initialized: false,
            buffer: DataBuffer::new(),
        }
    }

    /// `init` block: replaces the client with one bound to the given credentials.
    ///
    /// Buffered values are kept and will be sent with the new credentials.
    pub fn init(&mut self, channel_id: impl Into<ChannelId>, write_key: impl Into<WriteKey>) {
        let credentials = Credentials::new(channel_id, write_key);
        debug!(channel_id = %credentials.channel_id, "Initialising Ambient client");
        self.client = self.factory.connect(credentials);
        self.initialized = true;
    }

    /// `setData` block: buffers `value` in `slot`, overwriting any previous value.
    pub fn set_data(&mut self, slot: Slot, value: f64) {
        if let Some(previous) = self.buffer.set(slot, value) {
            debug!(%slot, previous, value, "Overwrote buffered value");
        } else {
            debug!(%slot, value, "Buffered value");
        }
    }

    /// `send` block: transmits the buffer and clears it.
    ///
    /// The buffer is empty when this returns, whatever the request's eventual
    /// outcome. An empty buffer is still transmitted.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn send(&mut self) -> PendingTransmission {
        let id = TransmissionId::new_random();
        let data = self.buffer.take();
        let client = Arc::clone(&self.client);

        if !self.initialized {
            warn!(transmission_id = %id, "Sending before init; placeholder credentials will be used");
        }

        let span = info_span!(
            "ambient.send",
            transmission_id = %id,
            channel_id = %client.credentials().channel_id,
            slots = data.len()
        );
        let handle = tokio::spawn(
            async move {
                let result = client.send(id, &data).await;
                match &result {
                    Ok(receipt) => info!(status = receipt.status, "Transmission accepted"),
                    Err(e) => warn!(error = %e, status = ?e.status(), "Transmission failed"),
                }
                result
            }
            .instrument(span),
        );

        PendingTransmission { id, handle }
    }

    /// `clear` block: discards every buffered value without sending.
    pub fn clear(&mut self) {
        debug!(discarded = self.buffer.len(), "Cleared buffer");
        self.buffer.clear();
    }

    /// Runs the handler for `command`.
    ///
    /// Returns the pending transmission for [`BlockCommand::Send`], `None` for
    /// every other block.
    pub fn dispatch(&mut self, command: BlockCommand) -> Option<PendingTransmission> {
        match command {
            BlockCommand::Init {
                channel_id,
                write_key,
            } => {
                self.init(channel_id, write_key);
                None
            }
            BlockCommand::SetData { slot, value } => {
                self.set_data(slot, value);
                None
            }
            BlockCommand::Send => Some(self.send()),
            BlockCommand::Clear => {
                self.clear();
                None
            }
        }
    }

    /// Values waiting for the next `send`.
    pub fn buffer(&self) -> &DataBuffer {
        &self.buffer
    }

    /// Credentials the next `send` will use.
    pub fn credentials(&self) -> &Credentials {
        self.client.credentials()
    }

    /// Returns `true` once the `init` block has run.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

/// Handle to a transmission spawned by [`Session::send`].
///
/// Dropping the handle does not cancel the request.
#[derive(Debug)]
pub struct PendingTransmission {
    id: TransmissionId,
    handle: JoinHandle<Result<TransmissionReceipt, TelemetryError>>,
}

impl PendingTransmission {
    /// Identifier recorded on the transmission's span.
    pub fn id(&self) -> TransmissionId {
        self.id
    }

    /// Returns `true` once the request has completed either way.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the request to complete and returns its outcome.
    pub async fn wait(self) -> Result<TransmissionReceipt, TelemetryError> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(TelemetryError::Aborted {
                id: self.id,
                message: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::Timestamp;

    /// One recorded call to [`TelemetryClient::send`].
    #[derive(Debug, Clone)]
    struct Sent {
        credentials: Credentials,
        data: DataBuffer,
    }

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<Sent>>,
        reject_with: Option<u16>,
    }

    struct RecordingClient {
        credentials: Credentials,
        recorder: Arc<Recorder>,
    }

    #[async_trait]
    impl TelemetryClient for RecordingClient {
        async fn send(
            &self,
            id: TransmissionId,
            data: &DataBuffer,
        ) -> Result<TransmissionReceipt, TelemetryError> {
            self.recorder.sent.lock().unwrap().push(Sent {
                credentials: self.credentials.clone(),
                data: data.clone(),
            });
            match self.recorder.reject_with {
                Some(status) => Err(TelemetryError::Rejected {
                    status,
                    body: "rejected".to_string(),
                }),
                None => Ok(TransmissionReceipt {
                    id,
                    channel_id: self.credentials.channel_id.clone(),
                    status: 200,
                    slots: data.len(),
                    body: String::new(),
                    completed_at: Timestamp::now(),
                }),
            }
        }

        fn credentials(&self) -> &Credentials {
            &self.credentials
        }
    }

    struct RecordingFactory(Arc<Recorder>);

    impl TelemetryClientFactory for RecordingFactory {
        fn connect(&self, credentials: Credentials) -> Arc<dyn TelemetryClient> {
            Arc::new(RecordingClient {
                credentials,
                recorder: Arc::clone(&self.0),
            })
        }
    }

    fn session() -> (Session<RecordingFactory>, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        (Session::new(RecordingFactory(Arc::clone(&recorder))), recorder)
    }

    fn sent(recorder: &Recorder) -> Vec<Sent> {
        recorder.sent.lock().unwrap().clone()
    }

    #[test]
    fn test_set_data_keeps_last_value() {
        let (mut session, _) = session();
        session.set_data(Slot::D2, 1.0);
        session.set_data(Slot::D2, 7.5);

        assert_eq!(session.buffer().len(), 1);
        assert_eq!(session.buffer().get(Slot::D2), Some(7.5));
    }

    #[test]
    fn test_clear_empties_buffer_without_sending() {
        let (mut session, recorder) = session();
        session.set_data(Slot::D1, 1.0);
        session.set_data(Slot::D8, 8.0);

        session.clear();
        session.clear();

        assert!(session.buffer().is_empty());
        assert!(sent(&recorder).is_empty());
    }

    #[tokio::test]
    async fn test_send_clears_buffer_immediately() {
        let (mut session, _) = session();
        session.init("1", "k");
        session.set_data(Slot::D1, 3.0);

        let pending = session.send();
        assert!(session.buffer().is_empty());

        pending.wait().await.unwrap();
    }

    #[tokio::test]
    async fn test_send_clears_buffer_when_rejected() {
        let recorder = Arc::new(Recorder {
            reject_with: Some(401),
            ..Recorder::default()
        });
        let mut session = Session::new(RecordingFactory(Arc::clone(&recorder)));
        session.init("1", "bad");
        session.set_data(Slot::D4, 4.0);

        let err = session.send().wait().await.unwrap_err();

        assert_eq!(err.status(), Some(401));
        assert!(session.buffer().is_empty());
        assert_eq!(sent(&recorder).len(), 1);
    }

    #[tokio::test]
    async fn test_send_empty_buffer_after_init() {
        let (mut session, recorder) = session();
        session.init("12345", "abcdef");

        let receipt = session.send().wait().await.unwrap();

        assert_eq!(receipt.slots, 0);
        let sent = sent(&recorder);
        assert_eq!(sent.len(), 1);
        assert!(sent[0].data.is_empty());
        assert_eq!(sent[0].credentials, Credentials::new("12345", "abcdef"));
    }

    #[tokio::test]
    async fn test_send_all_slots_uses_last_written_values() {
        let (mut session, recorder) = session();
        session.init("1", "k");
        for (i, slot) in Slot::ALL.into_iter().enumerate() {
            session.set_data(slot, -1.0);
            session.set_data(slot, i as f64);
        }

        session.send().wait().await.unwrap();

        let data = &sent(&recorder)[0].data;
        assert_eq!(data.len(), 8);
        for (i, slot) in Slot::ALL.into_iter().enumerate() {
            assert_eq!(data.get(slot), Some(i as f64));
        }
    }

    #[tokio::test]
    async fn test_latest_init_wins() {
        let (mut session, recorder) = session();
        session.init("first", "key-1");
        session.set_data(Slot::D1, 1.0);
        session.init("second", "key-2");

        session.send().wait().await.unwrap();

        let sent = sent(&recorder);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].credentials, Credentials::new("second", "key-2"));
        assert_eq!(sent[0].data.get(Slot::D1), Some(1.0));
    }

    #[tokio::test]
    async fn test_send_before_init_uses_placeholder_credentials() {
        let (mut session, recorder) = session();
        assert!(!session.is_initialized());

        session.send().wait().await.unwrap();

        assert!(sent(&recorder)[0].credentials.is_placeholder());
    }

    #[tokio::test]
    async fn test_dispatch_routes_commands() {
        let (mut session, recorder) = session();

        assert!(session
            .dispatch(BlockCommand::Init {
                channel_id: "9".to_string(),
                write_key: "w".to_string(),
            })
            .is_none());
        assert!(session.is_initialized());
        assert!(session
            .dispatch(BlockCommand::SetData {
                slot: Slot::D6,
                value: 6.0,
            })
            .is_none());

        let pending = session.dispatch(BlockCommand::Send).unwrap();
        let receipt = pending.wait().await.unwrap();

        assert_eq!(receipt.channel_id, ChannelId::new("9"));
        assert_eq!(sent(&recorder)[0].data.get(Slot::D6), Some(6.0));
        assert!(session.dispatch(BlockCommand::Clear).is_none());
    }
}
