//! Transient status banner and the success modal.

use chrono::TimeZone;
use std::{
    fmt,
    time::{Duration, Instant},
};

use crate::models::RegistrationPayload;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

impl NoticeKind {
    pub fn label(&self) -> &'static str {
        match self {
            NoticeKind::Success => "success",
            NoticeKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    expires_at: Instant,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.label(), self.message)
    }
}

/// Holds at most one notice. A newer notice replaces the older one
/// together with its expiry.
#[derive(Debug, Clone)]
pub struct NoticeBoard {
    current: Option<Notice>,
    timeout: Duration,
}

impl NoticeBoard {
    pub fn new(timeout: Duration) -> Self {
        Self {
            current: None,
            timeout,
        }
    }

    pub fn show(&mut self, kind: NoticeKind, message: impl Into<String>, now: Instant) {
        let notice = Notice {
            kind,
            message: message.into(),
            expires_at: now + self.timeout,
        };
        match kind {
            NoticeKind::Success => tracing::info!(message = %notice.message, "notice"),
            NoticeKind::Error => tracing::warn!(message = %notice.message, "notice"),
        }
        self.current = Some(notice);
    }

    pub fn visible(&self, now: Instant) -> Option<&Notice> {
        self.current
            .as_ref()
            .filter(|notice| now < notice.expires_at)
    }

    /// Drops the notice once it has expired.
    pub fn expire(&mut self, now: Instant) {
        if self.visible(now).is_none() {
            self.current = None;
        }
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SuccessModal {
    open: bool,
    lines: Vec<(&'static str, String)>,
}

impl SuccessModal {
    /// Fills the modal from the submitted payload with dates shown in `tz`.
    pub fn open_with<Tz>(&mut self, payload: &RegistrationPayload, tz: &Tz)
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let registered = payload.registration_date.with_timezone(tz);
        self.lines = vec![
            ("Имя", payload.name.clone()),
            ("Email", payload.email.clone()),
            ("Телефон", payload.phone.clone()),
            ("Дата рождения", payload.birthdate.format("%d.%m.%Y").to_string()),
            (
                "Предпочтения",
                payload
                    .preferences
                    .iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            (
                "Рассылка",
                if payload.newsletter { "Да" } else { "Нет" }.to_string(),
            ),
            (
                "Дата регистрации",
                registered.format("%d.%m.%Y, %H:%M:%S").to_string(),
            ),
        ];
        self.open = true;
    }

    /// Close button, OK button and backdrop click all land here.
    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn lines(&self) -> &[(&'static str, String)] {
        &self.lines
    }
}
