//! Monitor runtime
//!
//! One task owns the [`Session`] and steps it from a single `select!` loop: the decibel
//! tick, the threshold refresh, the classification timer, commands from the handle, and
//! completions from spawned collaborator calls. Each branch is one synchronous session
//! step, so no locks are involved. State goes out on a `watch` channel, notices on
//! `broadcast`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use errors::{NoiseError, NoiseResult};
use noise_core::{
    AudioSource, Classifier, ClassifierResult, DecibelSource, Effect, Environment,
    ImageGenerator, LocationResolver, Notice, NoticeSeverity, ResolvedLocation, Session,
    SessionConfig, SessionSnapshot, SpecificSuggestions, Suggestion, SuggestionGenerator, Ticket,
};

use crate::config::MonitorConfig;

const COMMAND_CAPACITY: usize = 32;
const COMPLETION_CAPACITY: usize = 64;
const NOTICE_CAPACITY: usize = 32;

/// Timer settings for the runtime
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub tick: Duration,
    pub threshold_refresh: Duration,
    pub classify_interval: Duration,
    pub capture: Duration,
    pub session: SessionConfig,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self::from(&MonitorConfig::default())
    }
}

impl From<&MonitorConfig> for MonitorSettings {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            tick: config.tick(),
            threshold_refresh: config.threshold_refresh(),
            classify_interval: config.classify_interval(),
            capture: config.capture(),
            session: config.session(),
        }
    }
}

/// External services the monitor calls
#[derive(Clone)]
pub struct Collaborators {
    pub suggestions: Arc<dyn SuggestionGenerator>,
    pub classifier: Arc<dyn Classifier>,
    pub images: Arc<dyn ImageGenerator>,
    pub location: Arc<dyn LocationResolver>,
    pub audio: Arc<dyn AudioSource>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SetEnvironment(Environment),
    ClassifyNow,
    Shutdown,
}

/// Results from spawned collaborator calls
enum Completion {
    General {
        ticket: Ticket,
        result: NoiseResult<Vec<Suggestion>>,
    },
    Suggestions {
        ticket: Ticket,
        result: SpecificSuggestions,
    },
    Classification {
        ticket: Ticket,
        result: NoiseResult<Vec<ClassifierResult>>,
    },
    Image {
        name: String,
        result: NoiseResult<String>,
    },
    Location(NoiseResult<ResolvedLocation>),
}

pub struct Monitor {
    settings: MonitorSettings,
    source: Box<dyn DecibelSource>,
    collaborators: Collaborators,
    session: Session,
}

impl Monitor {
    pub fn new(
        settings: MonitorSettings,
        source: Box<dyn DecibelSource>,
        collaborators: Collaborators,
    ) -> Self {
        let session = Session::new(settings.session.clone());
        Self {
            settings,
            source,
            collaborators,
            session,
        }
    }

    /// Start the runtime on the current tokio runtime
    pub fn spawn(self) -> MonitorHandle {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (snapshot_tx, snapshot_rx) = watch::channel(self.session.snapshot());
        let (notice_tx, _) = broadcast::channel(NOTICE_CAPACITY);

        let task = tokio::spawn(self.run(command_rx, snapshot_tx, notice_tx.clone()));

        MonitorHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
            notices: notice_tx,
            task,
        }
    }

    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        snapshots: watch::Sender<SessionSnapshot>,
        notices: broadcast::Sender<Notice>,
    ) {
        let (done_tx, mut done_rx) = mpsc::channel(COMPLETION_CAPACITY);

        let effects = self.session.start(Local::now());
        self.execute(effects, &done_tx, &notices);
        self.resolve_location(&done_tx);
        snapshots.send_replace(self.session.snapshot());

        let start = Instant::now();
        let mut tick = interval_at(start + self.settings.tick, self.settings.tick);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut refresh = interval_at(
            start + self.settings.threshold_refresh,
            self.settings.threshold_refresh,
        );
        refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut classify = interval(self.settings.classify_interval);
        classify.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "Monitor running: tick {:?}, classification every {:?}",
            self.settings.tick, self.settings.classify_interval
        );

        loop {
            let effects = tokio::select! {
                _ = tick.tick() => {
                    let reading = self.source.next_reading(Local::now());
                    self.session.on_reading(reading)
                },
                _ = refresh.tick() => self.session.refresh_threshold(Local::now()),
                _ = classify.tick() => {
                    self.begin_classification(&done_tx);
                    Vec::new()
                },
                command = commands.recv() => match command {
                    Some(Command::SetEnvironment(environment)) => {
                        self.session.set_environment(environment, Local::now())
                    },
                    Some(Command::ClassifyNow) => {
                        self.begin_classification(&done_tx);
                        Vec::new()
                    },
                    Some(Command::Shutdown) | None => break,
                },
                Some(done) = done_rx.recv() => self.complete(done),
            };

            self.execute(effects, &done_tx, &notices);
            snapshots.send_replace(self.session.snapshot());
        }

        info!("Monitor stopped");
    }

    fn complete(&mut self, done: Completion) -> Vec<Effect> {
        match done {
            Completion::General { ticket, result } => {
                self.session.complete_general(ticket, result);
                Vec::new()
            },
            Completion::Suggestions { ticket, result } => {
                self.session.complete_suggestions(ticket, result);
                Vec::new()
            },
            Completion::Classification { ticket, result } => {
                self.session.complete_classification(ticket, result)
            },
            Completion::Image { name, result } => {
                self.session.complete_image(&name, result);
                Vec::new()
            },
            Completion::Location(result) => {
                self.session.set_location(result);
                Vec::new()
            },
        }
    }

    fn begin_classification(&mut self, done: &mpsc::Sender<Completion>) {
        let Some(ticket) = self.session.begin_classification() else {
            debug!("Classification skipped");
            return;
        };

        let audio = Arc::clone(&self.collaborators.audio);
        let classifier = Arc::clone(&self.collaborators.classifier);
        let capture = self.settings.capture;
        let done = done.clone();
        tokio::spawn(async move {
            let result = match audio.capture(capture).await {
                Ok(sample) => classifier.classify(&sample).await,
                Err(e) => Err(e),
            };
            deliver(&done, Completion::Classification { ticket, result }).await;
        });
    }

    fn resolve_location(&self, done: &mpsc::Sender<Completion>) {
        let resolver = Arc::clone(&self.collaborators.location);
        let done = done.clone();
        tokio::spawn(async move {
            let result = resolver.resolve().await;
            deliver(&done, Completion::Location(result)).await;
        });
    }

    fn execute(
        &self,
        effects: Vec<Effect>,
        done: &mpsc::Sender<Completion>,
        notices: &broadcast::Sender<Notice>,
    ) {
        for effect in effects {
            match effect {
                Effect::FetchGeneralSuggestions { ticket } => {
                    let generator = Arc::clone(&self.collaborators.suggestions);
                    let done = done.clone();
                    tokio::spawn(async move {
                        let result = generator.suggest_general().await;
                        deliver(&done, Completion::General { ticket, result }).await;
                    });
                },
                Effect::FetchSuggestions {
                    ticket,
                    noise_type,
                    level,
                    include_general,
                } => {
                    let generator = Arc::clone(&self.collaborators.suggestions);
                    let done = done.clone();
                    tokio::spawn(async move {
                        let general = async {
                            if !include_general {
                                return None;
                            }
                            match generator.suggest_general().await {
                                Ok(pool) => Some(pool),
                                Err(e) => {
                                    warn!("General suggestions unavailable: {}", e);
                                    None
                                },
                            }
                        };
                        let (general, specific) = tokio::join!(
                            general,
                            generator.suggest_for_condition(&noise_type, level)
                        );
                        let result = SpecificSuggestions { general, specific };
                        deliver(&done, Completion::Suggestions { ticket, result }).await;
                    });
                },
                Effect::FetchImage { classification } => {
                    let images = Arc::clone(&self.collaborators.images);
                    let done = done.clone();
                    tokio::spawn(async move {
                        let result = images.image_for(&classification).await;
                        deliver(
                            &done,
                            Completion::Image {
                                name: classification.name,
                                result,
                            },
                        )
                        .await;
                    });
                },
                Effect::Notify(notice) => {
                    match notice.severity {
                        NoticeSeverity::Destructive => {
                            warn!("{}: {}", notice.title, notice.description)
                        },
                        NoticeSeverity::Info => info!("{}: {}", notice.title, notice.description),
                    }
                    // No subscribers is fine
                    let _ = notices.send(notice);
                },
            }
        }
    }
}

async fn deliver(done: &mpsc::Sender<Completion>, completion: Completion) {
    if done.send(completion).await.is_err() {
        debug!("Monitor gone, dropping completion");
    }
}

/// Control surface for a running monitor
pub struct MonitorHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<SessionSnapshot>,
    notices: broadcast::Sender<Notice>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    async fn send(&self, command: Command) -> NoiseResult<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| NoiseError::MonitorStopped(format!("{:?} not delivered", command)))
    }

    pub async fn set_environment(&self, environment: Environment) -> NoiseResult<()> {
        self.send(Command::SetEnvironment(environment)).await
    }

    pub async fn classify_now(&self) -> NoiseResult<()> {
        self.send(Command::ClassifyNow).await
    }

    /// Latest published state
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    /// Stop the loop and wait for it to exit
    pub async fn shutdown(self) -> NoiseResult<()> {
        // The loop may already be gone; joining is what matters
        let _ = self.commands.send(Command::Shutdown).await;
        self.task
            .await
            .map_err(|e| NoiseError::Internal(format!("monitor task failed: {}", e)))
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use async_trait::async_trait;
    use noise_core::{
        AudioSample, Classification, Coordinates, ReplaySource, ThresholdTable,
    };
    use tracing_test::traced_test;

    struct Tips;

    #[async_trait]
    impl SuggestionGenerator for Tips {
        async fn suggest_general(&self) -> NoiseResult<Vec<Suggestion>> {
            Ok(vec![Suggestion::new("Rest", "Find a quiet spot.")])
        }

        async fn suggest_for_condition(&self, noise_type: &str, _level: u8) -> NoiseResult<Vec<Suggestion>> {
            Ok(vec![Suggestion::new("Ear protection", noise_type)])
        }
    }

    struct Silent;

    #[async_trait]
    impl Classifier for Silent {
        async fn classify(&self, _sample: &AudioSample) -> NoiseResult<Vec<ClassifierResult>> {
            Ok(Vec::new())
        }
    }

    #[async_trait]
    impl ImageGenerator for Silent {
        async fn image_for(&self, _classification: &Classification) -> NoiseResult<String> {
            Ok("img".to_string())
        }
    }

    #[async_trait]
    impl LocationResolver for Silent {
        async fn resolve(&self) -> NoiseResult<ResolvedLocation> {
            Ok(ResolvedLocation {
                coordinates: Coordinates::new(0.0, 0.0),
                city: "Null Island, ".to_string(),
            })
        }
    }

    #[async_trait]
    impl AudioSource for Silent {
        async fn capture(&self, _duration: Duration) -> NoiseResult<AudioSample> {
            Ok(AudioSample::wav(vec![0; 16]))
        }
    }

    fn collaborators() -> Collaborators {
        Collaborators {
            suggestions: Arc::new(Tips),
            classifier: Arc::new(Silent),
            images: Arc::new(Silent),
            location: Arc::new(Silent),
            audio: Arc::new(Silent),
        }
    }

    #[tokio::test(start_paused = true)]
    #[traced_test]
    async fn test_breach_is_logged_and_broadcast() {
        let settings = MonitorSettings {
            session: SessionConfig {
                environment: Environment::Residential,
                thresholds: ThresholdTable::uniform(55, 65, 75),
            },
            ..MonitorSettings::default()
        };
        let monitor = Monitor::new(
            settings,
            Box::new(ReplaySource::new([50, 70])),
            collaborators(),
        );
        let handle = monitor.spawn();
        let mut notices = handle.notices();

        tokio::time::sleep(Duration::from_secs(4)).await;

        let notice = notices.recv().await.unwrap();
        assert_eq!(notice.title, "Noise Limit Breached");
        assert!(logs_contain("Noise Limit Breached"));
        assert_eq!(handle.snapshot().alerts.len(), 1);

        handle.shutdown().await.unwrap();
    }
}
