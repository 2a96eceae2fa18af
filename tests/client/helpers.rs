#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use xexec::core::{channel, StreamSender};
use xexec::error::TransportResult;
use xexec::{
    Event, EventFilter, Execution, ExecutionCreated, ExecutionError, ExecutionFilter,
    ExecutionRequest, ExecutionStatus, Hash, StreamHandle, StreamMetadata, Transport,
    TransportError,
};

/// How a result stream announces itself.
#[derive(Debug, Clone)]
pub enum ReadyMode {
    Immediate,
    After(Duration),
    /// A frame without a status header first, then the ready frame.
    NoStatusThenReady,
    Rejected(String),
    Never,
}

/// How the unary submission call behaves.
#[derive(Debug, Clone)]
pub enum SubmitMode {
    Accept,
    /// Reply only after this delay.
    AcceptAfter(Duration),
    Fail(TransportError),
    Hang,
}

/// What the engine pushes on the result stream after a submission.
#[derive(Debug, Clone)]
pub enum ResultMode {
    /// Completed record, pushed after the submission reply.
    Complete,
    /// Completed record, pushed before the submission reply.
    CompleteBeforeReply,
    Fail(ExecutionError),
    StreamError(TransportError),
    EndStream,
    Silent,
}

#[derive(Debug, Clone)]
pub struct Script {
    pub open_error: Option<TransportError>,
    /// The stream open call never returns.
    pub hang_open: bool,
    pub ready: ReadyMode,
    pub submit: SubmitMode,
    pub result: ResultMode,
    /// Push uncorrelated and non-terminal records before the result.
    pub noise: bool,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            open_error: None,
            hang_open: false,
            ready: ReadyMode::Immediate,
            submit: SubmitMode::Accept,
            result: ResultMode::Complete,
            noise: false,
        }
    }
}

struct OpenStream {
    filter: ExecutionFilter,
    sender: StreamSender<Execution>,
    ready: Arc<AtomicBool>,
}

struct Inner {
    script: Mutex<Script>,
    streams: Mutex<Vec<OpenStream>>,
    submissions: Mutex<Vec<ExecutionRequest>>,
    opened: AtomicUsize,
    premature: AtomicUsize,
    sequence: AtomicU64,
}

/// A transport following a [`Script`] and recording how the client used it.
#[derive(Clone)]
pub struct ScriptedTransport {
    inner: Arc<Inner>,
}

impl ScriptedTransport {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            inner: Arc::new(Inner {
                script: Mutex::new(script),
                streams: Mutex::new(Vec::new()),
                submissions: Mutex::new(Vec::new()),
                opened: AtomicUsize::new(0),
                premature: AtomicUsize::new(0),
                sequence: AtomicU64::new(0),
            }),
        })
    }

    pub fn set_script(&self, script: Script) {
        *self.inner.script.lock() = script;
    }

    /// Result streams requested so far.
    pub fn opened(&self) -> usize {
        self.inner.opened.load(Ordering::SeqCst)
    }

    /// Submissions that arrived while no correlated stream was ready.
    pub fn premature_submissions(&self) -> usize {
        self.inner.premature.load(Ordering::SeqCst)
    }

    pub fn submissions(&self) -> Vec<ExecutionRequest> {
        self.inner.submissions.lock().clone()
    }

    /// Streams the client has not closed yet.
    pub fn open_streams(&self) -> usize {
        self.inner
            .streams
            .lock()
            .iter()
            .filter(|s| !s.sender.is_closed())
            .count()
    }

    /// Push `execution` on every stream, ignoring filters. Returns how many
    /// streams accepted it.
    pub fn push_to_all(&self, execution: &Execution) -> usize {
        self.inner
            .streams
            .lock()
            .iter()
            .filter(|s| s.sender.send(execution.clone()))
            .count()
    }

    fn deliver(&self, execution: &Execution) {
        for stream in self.inner.streams.lock().iter() {
            if stream.filter.matches(execution) {
                stream.sender.send(execution.clone());
            }
        }
    }

    fn fail_matching(&self, request: &ExecutionRequest, err: &TransportError) {
        for stream in self.inner.streams.lock().iter() {
            if correlated(&stream.filter, request) {
                stream.sender.fail(err.clone());
            }
        }
    }

    fn end_matching(&self, request: &ExecutionRequest) {
        self.inner
            .streams
            .lock()
            .retain(|stream| !correlated(&stream.filter, request));
    }

    fn record(&self, request: &ExecutionRequest, status: ExecutionStatus) -> Execution {
        let seq = self.inner.sequence.fetch_add(1, Ordering::SeqCst);
        Execution {
            hash: Hash::digest(format!("scripted:{}", seq).as_bytes()),
            instance_hash: request.instance_hash,
            process_hash: request.process_hash,
            task_key: request.task_key.clone(),
            status,
            inputs: request.inputs.clone(),
            outputs: None,
            error: None,
            tags: request.tags.clone(),
        }
    }

    fn push_noise(&self, request: &ExecutionRequest) {
        let running = self.record(request, ExecutionStatus::Running);
        self.push_to_all(&running);

        let mut stranger = self.record(request, ExecutionStatus::Completed);
        stranger.tags = vec!["someone-else".to_string()];
        self.push_to_all(&stranger);
    }

    fn emit_result(&self, request: &ExecutionRequest, mode: &ResultMode) {
        match mode {
            ResultMode::Complete | ResultMode::CompleteBeforeReply => {
                let mut execution = self.record(request, ExecutionStatus::Completed);
                execution.outputs = request.inputs.clone();
                self.deliver(&execution);
            }
            ResultMode::Fail(error) => {
                let mut execution = self.record(request, ExecutionStatus::Failed);
                execution.error = Some(error.clone());
                self.deliver(&execution);
            }
            ResultMode::StreamError(err) => self.fail_matching(request, err),
            ResultMode::EndStream => self.end_matching(request),
            ResultMode::Silent => {}
        }
    }
}

fn correlated(filter: &ExecutionFilter, request: &ExecutionRequest) -> bool {
    filter.instance_hash.map_or(true, |h| h == request.instance_hash)
        && filter.tags.iter().all(|tag| request.tags.contains(tag))
}

fn mark_ready(sender: &StreamSender<Execution>, ready: &AtomicBool) {
    ready.store(true, Ordering::SeqCst);
    sender.ready(StreamMetadata::ready());
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn open_execution_stream(
        &self,
        filter: ExecutionFilter,
    ) -> TransportResult<StreamHandle<Execution>> {
        self.inner.opened.fetch_add(1, Ordering::SeqCst);
        let script = self.inner.script.lock().clone();
        if script.hang_open {
            std::future::pending::<()>().await;
        }
        if let Some(err) = script.open_error {
            return Err(err);
        }

        let (sender, handle) = channel();
        let ready = Arc::new(AtomicBool::new(false));
        match script.ready {
            ReadyMode::Immediate => mark_ready(&sender, &ready),
            ReadyMode::After(delay) => {
                let sender = sender.clone();
                let ready = ready.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    mark_ready(&sender, &ready);
                });
            }
            ReadyMode::NoStatusThenReady => {
                sender.ready(StreamMetadata::new().with_header("x-trace", "1"));
                mark_ready(&sender, &ready);
            }
            ReadyMode::Rejected(status) => {
                sender.ready(StreamMetadata::new().with_header("status", status));
            }
            ReadyMode::Never => {}
        }

        self.inner.streams.lock().push(OpenStream {
            filter,
            sender,
            ready,
        });
        Ok(handle)
    }

    async fn open_event_stream(
        &self,
        _filter: EventFilter,
    ) -> TransportResult<StreamHandle<Event>> {
        let (sender, handle) = channel();
        sender.ready(StreamMetadata::ready());
        Ok(handle)
    }

    async fn create_execution(
        &self,
        request: ExecutionRequest,
    ) -> TransportResult<ExecutionCreated> {
        let live = self
            .inner
            .streams
            .lock()
            .iter()
            .any(|s| correlated(&s.filter, &request) && s.ready.load(Ordering::SeqCst));
        if !live {
            self.inner.premature.fetch_add(1, Ordering::SeqCst);
        }
        self.inner.submissions.lock().push(request.clone());
        let script = self.inner.script.lock().clone();

        if script.noise {
            self.push_noise(&request);
        }
        if matches!(script.result, ResultMode::CompleteBeforeReply) {
            self.emit_result(&request, &script.result);
        }

        match script.submit.clone() {
            SubmitMode::Accept => {}
            SubmitMode::AcceptAfter(delay) => tokio::time::sleep(delay).await,
            SubmitMode::Fail(err) => return Err(err),
            SubmitMode::Hang => std::future::pending::<()>().await,
        }

        let created = ExecutionCreated {
            hash: Hash::digest(format!("created:{:?}", request.tags).as_bytes()),
        };
        if !matches!(script.result, ResultMode::CompleteBeforeReply) {
            let transport = self.clone();
            tokio::spawn(async move {
                tokio::task::yield_now().await;
                transport.emit_result(&request, &script.result);
            });
        }
        Ok(created)
    }
}

pub async fn with_timeout<F, T>(label: &str, duration: Duration, f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(duration, f)
        .await
        .unwrap_or_else(|_| panic!("'{}' timed out after {:?}", label, duration))
}

pub fn instance() -> Hash {
    Hash::digest(b"calculator")
}

/// Formatted log output collected for the current thread.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Route WARN and above on this thread into the buffer until the guard drops.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let sink = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || sink.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn warnings(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock())
            .lines()
            .filter(|line| line.contains("WARN"))
            .map(str::to_string)
            .collect()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
