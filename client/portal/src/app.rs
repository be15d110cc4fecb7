use chrono::{Local, Utc};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex as StdMutex,
    },
    time::{Duration, Instant},
};
use tokio::{
    sync::{Mutex, Notify},
    task::JoinHandle,
    time::sleep,
};

use crate::{
    api::Backend,
    catalog::{BookCatalog, RefreshMode},
    config::PortalConfig,
    form::{RegistrationForm, SubmitRejected, INVALID_FORM_MESSAGE},
    models::RegistrationPayload,
    notice::{NoticeBoard, NoticeKind, SuccessModal},
    schedule::{self, Countdown},
    store::PreferenceStore,
    theme::Theme,
    validators::FieldKind,
};

pub const SUBMIT_SUCCESS_MESSAGE: &str = "Регистрация успешно завершена!";
pub const SUBMIT_FAILURE_MESSAGE: &str =
    "Ошибка при отправке данных. Пожалуйста, попробуйте позже.";

/// Everything the page shows. Renderers read a clone of it.
#[derive(Debug, Clone)]
pub struct PortalState {
    pub form: RegistrationForm,
    pub catalog: BookCatalog,
    pub theme: Theme,
    pub notices: NoticeBoard,
    pub modal: SuccessModal,
    pub countdown: Countdown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Accepted(RegistrationPayload),
    /// Validation failed; no request was sent.
    Rejected(Vec<FieldKind>),
    /// A submission is already in flight.
    Busy,
    Failed(String),
}

#[derive(Clone)]
pub struct StopSignal {
    flag: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    pub fn stop(&self) {
        self.flag.store(true, Ordering::Relaxed);
        self.notify.notify_waiters();
    }

    pub fn stopped(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Returns true when woken by `stop` rather than by the timer.
    pub async fn sleep_or_stop(&self, duration: Duration) -> bool {
        if self.stopped() {
            return true;
        }
        tokio::select! {
            _ = sleep(duration) => false,
            _ = self.notify.notified() => true,
        }
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

struct RunningLoops {
    stop: StopSignal,
    handles: Vec<JoinHandle<()>>,
}

/// Application controller: owns the state and the two timers.
#[derive(Clone)]
pub struct Portal {
    config: Arc<PortalConfig>,
    backend: Arc<dyn Backend>,
    store: Arc<dyn PreferenceStore>,
    state: Arc<Mutex<PortalState>>,
    running: Arc<StdMutex<Option<RunningLoops>>>,
}

impl Portal {
    pub fn new(
        config: PortalConfig,
        backend: Arc<dyn Backend>,
        store: Arc<dyn PreferenceStore>,
    ) -> Self {
        let theme = Theme::load(store.as_ref());
        // Re-applying on startup also writes the default back.
        theme.persist(store.as_ref());
        tracing::info!(theme = %theme, api_base = %config.api_base, "portal created");

        let state = PortalState {
            form: RegistrationForm::new(),
            catalog: BookCatalog::new(),
            theme,
            notices: NoticeBoard::new(config.notice_timeout),
            modal: SuccessModal::default(),
            countdown: Countdown::read(store.as_ref(), Utc::now()),
        };
        Self {
            config: Arc::new(config),
            backend,
            store,
            state: Arc::new(Mutex::new(state)),
            running: Arc::new(StdMutex::new(None)),
        }
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    pub async fn snapshot(&self) -> PortalState {
        self.state.lock().await.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .map(|running| running.is_some())
            .unwrap_or(false)
    }

    /// Schedules the next refresh, then spawns the refresh loop (which
    /// starts with the initial load) and the countdown loop. Must be
    /// called inside a tokio runtime; a second call is a no-op.
    pub fn start(&self) {
        let mut running = match self.running.lock() {
            Ok(running) => running,
            Err(poisoned) => poisoned.into_inner(),
        };
        if running.is_some() {
            return;
        }

        self.reset_schedule();
        let stop = StopSignal::new();

        let refresh_portal = self.clone();
        let refresh_stop = stop.clone();
        let refresh_handle = tokio::spawn(async move {
            refresh_portal.refresh_loop(refresh_stop).await;
        });

        let tick_portal = self.clone();
        let tick_stop = stop.clone();
        let tick_handle = tokio::spawn(async move {
            tick_portal.countdown_loop(tick_stop).await;
        });

        *running = Some(RunningLoops {
            stop,
            handles: vec![refresh_handle, tick_handle],
        });
        tracing::info!(
            interval_secs = self.config.refresh_interval.as_secs(),
            "portal started"
        );
    }

    /// Stops both loops and waits for them. An in-flight fetch finishes
    /// first.
    pub async fn stop(&self) {
        let loops = match self.running.lock() {
            Ok(mut running) => running.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        let Some(loops) = loops else {
            return;
        };
        loops.stop.stop();
        for handle in loops.handles {
            let _ = handle.await;
        }
        tracing::info!("portal stopped");
    }

    async fn refresh_loop(self, stop: StopSignal) {
        self.refresh(RefreshMode::Initial).await;
        loop {
            if stop.sleep_or_stop(self.config.refresh_interval).await {
                break;
            }
            self.reset_schedule();
            self.refresh(RefreshMode::Forced).await;
        }
    }

    async fn countdown_loop(self, stop: StopSignal) {
        loop {
            if stop.stopped() {
                break;
            }
            self.tick().await;
            if stop.sleep_or_stop(self.config.countdown_tick).await {
                break;
            }
        }
    }

    fn reset_schedule(&self) -> i64 {
        schedule::reset_schedule(self.store.as_ref(), Utc::now(), self.config.refresh_interval)
    }

    /// One countdown tick: re-reads the persisted target and drops an
    /// expired notice.
    pub async fn tick(&self) -> Countdown {
        let countdown = Countdown::read(self.store.as_ref(), Utc::now());
        let mut state = self.state.lock().await;
        state.countdown = countdown;
        state.notices.expire(Instant::now());
        tracing::trace!(countdown = %countdown, "tick");
        countdown
    }

    /// One refresh cycle. Concurrent calls are not deduplicated; the last
    /// response to arrive wins.
    pub async fn refresh(&self, mode: RefreshMode) {
        self.state.lock().await.catalog.begin(mode);

        let result = self.backend.fetch_books().await;

        let stamp = Local::now().format("%H:%M").to_string();
        let mut state = self.state.lock().await;
        state
            .catalog
            .finish(result, stamp, &mut rand::thread_rng());
    }

    /// Manual refresh button and the retry action of the error placeholder.
    pub async fn retry(&self) {
        self.refresh(RefreshMode::Forced).await;
    }

    pub async fn input(&self, kind: FieldKind, raw: &str) {
        let today = Local::now().date_naive();
        self.state.lock().await.form.input(kind, raw, today);
    }

    pub async fn set_bio(&self, raw: &str) {
        self.state.lock().await.form.set_bio(raw);
    }

    pub async fn set_preference(&self, value: &str, selected: bool) {
        self.state.lock().await.form.set_preference(value, selected);
    }

    pub async fn set_newsletter(&self, newsletter: bool) {
        self.state.lock().await.form.set_newsletter(newsletter);
    }

    /// Reset button: clears the form and the status banner.
    pub async fn reset_form(&self) {
        let mut state = self.state.lock().await;
        state.form.reset();
        state.notices.clear();
    }

    pub async fn close_modal(&self) {
        self.state.lock().await.modal.close();
    }

    pub async fn toggle_theme(&self) -> Theme {
        let mut state = self.state.lock().await;
        state.theme = state.theme.toggled();
        state.theme.persist(self.store.as_ref());
        tracing::info!(theme = %state.theme, "theme toggled");
        state.theme
    }

    /// Full submit protocol. The lease taken in `prepare_submit` keeps the
    /// button disabled until this function returns, on every path.
    pub async fn submit(&self) -> SubmitOutcome {
        let today = Local::now().date_naive();
        let prepared = {
            let mut state = self.state.lock().await;
            match state.form.prepare_submit(today, Utc::now()) {
                Ok(prepared) => prepared,
                Err(SubmitRejected::Invalid(fields)) => {
                    tracing::info!(invalid = ?fields, "submit blocked by validation");
                    state
                        .notices
                        .show(NoticeKind::Error, INVALID_FORM_MESSAGE, Instant::now());
                    return SubmitOutcome::Rejected(fields);
                }
                Err(SubmitRejected::Busy) => return SubmitOutcome::Busy,
            }
        };
        let (payload, lease) = prepared;

        let result = self.backend.submit_registration(&payload).await;

        let mut state = self.state.lock().await;
        let outcome = match result {
            Ok(_) => {
                state.modal.open_with(&payload, &Local);
                state.form.reset();
                state
                    .notices
                    .show(NoticeKind::Success, SUBMIT_SUCCESS_MESSAGE, Instant::now());
                SubmitOutcome::Accepted(payload)
            }
            Err(err) => {
                tracing::error!(error = %err, "registration submit failed");
                state
                    .notices
                    .show(NoticeKind::Error, SUBMIT_FAILURE_MESSAGE, Instant::now());
                SubmitOutcome::Failed(err.to_string())
            }
        };
        drop(lease);
        outcome
    }
}
