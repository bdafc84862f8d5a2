#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone};
use tempfile::TempDir;
use tokio::task::JoinHandle;

use spark::channels::{Channel, ChannelFuture, ChannelMessage};
use spark::clock::{Clock, ManualClock};
use spark::config::{Config, OracleConfig, ProviderKind};
use spark::daemon::{RestartPolicy, Runtime, build_shared};
use spark::oracle::{
    ChatRequest, ContentBlock, DecisionOracle, OracleMode, Provider, ProviderMessage,
    ProviderProfile, ProviderResponse, StopReason,
};
use spark::session::SessionState;

pub const USER_ID: &str = "42";

/// Friday 2026-10-16 at `hour:minute` local time.
pub fn at(hour: u32, minute: u32) -> DateTime<Local> {
    Local
        .with_ymd_and_hms(2026, 10, 16, hour, minute, 0)
        .single()
        .expect("unambiguous local time")
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Replays canned responses in order; errors once the script runs out.
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<ProviderResponse>>,
    seen: Mutex<Vec<(String, Vec<ProviderMessage>)>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn texts(texts: &[&str]) -> Arc<Self> {
        Self::new(
            texts
                .iter()
                .map(|t| ProviderResponse::text_only(*t))
                .collect(),
        )
    }

    pub fn push(&self, response: ProviderResponse) {
        lock(&self.responses).push_back(response);
    }

    pub fn calls(&self) -> usize {
        lock(&self.seen).len()
    }

    pub fn requests(&self) -> Vec<(String, Vec<ProviderMessage>)> {
        lock(&self.seen).clone()
    }
}

impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn chat<'a>(
        &'a self,
        request: ChatRequest<'a>,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<ProviderResponse>> + Send + 'a>> {
        lock(&self.seen).push((request.system.to_string(), request.messages.to_vec()));
        let next = lock(&self.responses).pop_front();
        Box::pin(async move { next.ok_or_else(|| anyhow::anyhow!("scripted provider exhausted")) })
    }
}

pub fn tool_use(id: &str, name: &str, input: serde_json::Value) -> ProviderResponse {
    ProviderResponse {
        text: String::new(),
        model: None,
        content_blocks: vec![ContentBlock::ToolUse {
            id: id.into(),
            name: name.into(),
            input,
        }],
        stop_reason: Some(StopReason::ToolUse),
    }
}

/// Records everything sent; never touches the network.
#[derive(Default)]
pub struct RecordingChannel {
    sent: Mutex<Vec<(String, String)>>,
    typing: AtomicUsize,
    failing: AtomicBool,
}

impl RecordingChannel {
    pub fn sent(&self) -> Vec<(String, String)> {
        lock(&self.sent).clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|(_, text)| text).collect()
    }

    pub fn typing_count(&self) -> usize {
        self.typing.load(Ordering::SeqCst)
    }

    pub fn fail_sends(&self, fail: bool) {
        self.failing.store(fail, Ordering::SeqCst);
    }
}

impl Channel for RecordingChannel {
    fn name(&self) -> &str {
        "recording"
    }

    fn send<'a>(&'a self, message: &'a str, recipient: &'a str) -> ChannelFuture<'a, ()> {
        Box::pin(async move {
            if self.failing.load(Ordering::SeqCst) {
                anyhow::bail!("transport down");
            }
            lock(&self.sent).push((recipient.to_string(), message.to_string()));
            Ok(())
        })
    }

    fn listen<'a>(&'a self, _tx: tokio::sync::mpsc::Sender<ChannelMessage>) -> ChannelFuture<'a, ()> {
        Box::pin(async { Ok(()) })
    }

    fn default_recipient(&self) -> Option<&str> {
        Some(USER_ID)
    }

    fn send_typing<'a>(&'a self, _recipient: &'a str) -> ChannelFuture<'a, ()> {
        self.typing.fetch_add(1, Ordering::SeqCst);
        Box::pin(async { Ok(()) })
    }
}

/// Config over a temp knowledge root: 1-minute ticks, quiet 23-8, no
/// pacing, short debounce, no cooldown.
pub fn test_config(root: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.knowledge.root = root.display().to_string();
    config.scheduler.tick_min_minutes = 1.0;
    config.scheduler.tick_max_minutes = 1.0;
    config.scheduler.quiet_start = 23;
    config.scheduler.quiet_end = 8;
    config.scheduler.cooldown_minutes = 0;
    config.conversation.debounce_secs = 0.05;
    config.conversation.min_line_delay_ms = 0;
    config.conversation.max_line_delay_ms = 0;
    config
}

fn oracle(provider: Arc<ScriptedProvider>, mode: OracleMode) -> DecisionOracle {
    DecisionOracle::new(
        provider,
        ProviderProfile::resolve(ProviderKind::Anthropic, mode, &OracleConfig::default()),
        mode,
        0.7,
        Duration::from_secs(5),
    )
}

/// A fully wired runtime with scripted oracles, a recording channel and a
/// manual clock.
pub struct Harness {
    pub tmp: TempDir,
    pub config: Config,
    pub clock: Arc<ManualClock>,
    pub channel: Arc<RecordingChannel>,
    pub reactive: Arc<ScriptedProvider>,
    pub proactive: Arc<ScriptedProvider>,
    pub runtime: Runtime,
}

impl Harness {
    pub fn new(reactive: Arc<ScriptedProvider>, proactive: Arc<ScriptedProvider>) -> Self {
        Self::with_config(reactive, proactive, |_| {})
    }

    pub fn with_config(
        reactive: Arc<ScriptedProvider>,
        proactive: Arc<ScriptedProvider>,
        tweak: impl FnOnce(&mut Config),
    ) -> Self {
        let tmp = TempDir::new().unwrap();
        let mut config = test_config(tmp.path());
        tweak(&mut config);

        let clock = Arc::new(ManualClock::new(at(10, 0)));
        let channel = Arc::new(RecordingChannel::default());
        let shared = build_shared(&config, channel.clone(), clock.clone()).unwrap();
        let runtime = Runtime::assemble(
            &config,
            shared,
            oracle(Arc::clone(&reactive), OracleMode::Reactive),
            oracle(Arc::clone(&proactive), OracleMode::Proactive),
        )
        .unwrap();

        Self {
            tmp,
            config,
            clock,
            channel,
            reactive,
            proactive,
            runtime,
        }
    }

    pub fn now(&self) -> DateTime<Local> {
        self.clock.now()
    }

    pub async fn state(&self) -> SessionState {
        self.runtime.shared.session.load().await
    }

    pub async fn set_state(&self, state: &SessionState) {
        self.runtime.shared.session.save(state).await.unwrap();
    }

    pub fn message(&self, text: &str) -> ChannelMessage {
        ChannelMessage::new(USER_ID, text, "recording", self.now())
    }

    pub fn write_file(&self, rel: &str, content: &str) {
        let path = self.tmp.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    pub fn read_file(&self, rel: &str) -> Option<String> {
        std::fs::read_to_string(self.tmp.path().join(rel)).ok()
    }

    /// Start the reactive consumer (and the intake router behind
    /// `runtime.inbound()`).
    pub fn start(&self) -> Vec<JoinHandle<()>> {
        let policy = RestartPolicy::from_config(&self.config.reliability);
        vec![
            self.runtime.spawn_intake(policy),
            self.runtime.spawn_reactive(policy),
        ]
    }

    /// Wait until no inbound message is pending a reply.
    pub async fn settle(&self) {
        let coordinator = &self.runtime.shared.coordinator;
        tokio::time::timeout(Duration::from_secs(5), async {
            while coordinator.is_user_interacting() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("reactive turn did not finish");
    }
}
