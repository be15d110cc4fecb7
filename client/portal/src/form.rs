//! Registration form state. Rendering reads this model and never the
//! other way round.

use chrono::{DateTime, NaiveDate, Utc};
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use crate::{
    models::RegistrationPayload,
    phone::format_phone,
    validators::{self, FieldKind, PasswordStrength, ValidationContext},
};

pub const BIO_LIMIT: usize = 500;
pub const INVALID_FORM_MESSAGE: &str = "Пожалуйста, исправьте ошибки в форме";
pub const SUBMIT_LABEL: &str = "Зарегистрироваться";
pub const SUBMIT_BUSY_LABEL: &str = "Отправка...";

/// Values offered by the preferences multi-select.
pub const PREFERENCE_OPTIONS: [(&str, &str); 5] = [
    ("fiction", "Художественная литература"),
    ("science", "Научная литература"),
    ("fantasy", "Фэнтези"),
    ("detective", "Детективы"),
    ("classic", "Классика"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldStatus {
    /// Empty value; shows neither the valid nor the invalid indicator.
    #[default]
    Untouched,
    Valid,
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormFieldState {
    pub raw_value: String,
    pub status: FieldStatus,
    /// Error text; empty unless the field is invalid.
    pub message: String,
}

impl FormFieldState {
    pub fn is_valid(&self) -> bool {
        self.status == FieldStatus::Valid
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BioCounter {
    value: String,
}

impl BioCounter {
    /// Stores the text, cutting it at [`BIO_LIMIT`] characters.
    pub fn set(&mut self, raw: &str) {
        self.value = match raw.char_indices().nth(BIO_LIMIT) {
            Some((cut, _)) => raw[..cut].to_string(),
            None => raw.to_string(),
        };
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn remaining(&self) -> usize {
        BIO_LIMIT.saturating_sub(self.value.chars().count())
    }
}

/// Shared enabled/busy flag behind the submit button.
#[derive(Debug, Clone, Default)]
pub struct SubmitButton {
    busy: Arc<AtomicBool>,
}

impl SubmitButton {
    /// Disables the button until the returned lease is dropped. `None`
    /// while another submission holds it.
    pub fn acquire(&self) -> Option<SubmitLease> {
        if self.busy.swap(true, Ordering::SeqCst) {
            return None;
        }
        Some(SubmitLease {
            busy: self.busy.clone(),
        })
    }

    pub fn is_enabled(&self) -> bool {
        !self.busy.load(Ordering::SeqCst)
    }

    pub fn label(&self) -> &'static str {
        if self.is_enabled() {
            SUBMIT_LABEL
        } else {
            SUBMIT_BUSY_LABEL
        }
    }
}

#[derive(Debug)]
pub struct SubmitLease {
    busy: Arc<AtomicBool>,
}

impl Drop for SubmitLease {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitRejected {
    /// Fields that were empty or invalid, in form order.
    Invalid(Vec<FieldKind>),
    Busy,
}

#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    fields: BTreeMap<FieldKind, FormFieldState>,
    strength: PasswordStrength,
    bio: BioCounter,
    preferences: BTreeSet<String>,
    newsletter: bool,
    submit: SubmitButton,
}

impl RegistrationForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(&self, kind: FieldKind) -> FormFieldState {
        self.fields.get(&kind).cloned().unwrap_or_default()
    }

    fn value(&self, kind: FieldKind) -> &str {
        self.fields
            .get(&kind)
            .map(|field| field.raw_value.as_str())
            .unwrap_or("")
    }

    /// Applies one input event: masks the phone, validates the field and
    /// keeps the password indicators in sync.
    pub fn input(&mut self, kind: FieldKind, raw: &str, today: NaiveDate) -> FieldStatus {
        let value = match kind {
            FieldKind::Phone => format_phone(raw),
            _ => raw.to_string(),
        };
        self.fields.entry(kind).or_default().raw_value = value;

        let status = self.revalidate(kind, today);
        if kind == FieldKind::Password {
            self.strength = validators::password_strength(self.value(FieldKind::Password));
            // A confirmation typed earlier must follow the new password.
            if self.field(FieldKind::ConfirmPassword).status != FieldStatus::Untouched {
                self.revalidate(FieldKind::ConfirmPassword, today);
            }
        }
        status
    }

    pub fn revalidate(&mut self, kind: FieldKind, today: NaiveDate) -> FieldStatus {
        let value = self.value(kind).to_string();
        let (status, message) = if value.is_empty() {
            (FieldStatus::Untouched, String::new())
        } else {
            let ctx = ValidationContext {
                today,
                password: self.value(FieldKind::Password),
            };
            let verdict = validators::validate(kind, &value, &ctx);
            if verdict.is_valid {
                (FieldStatus::Valid, String::new())
            } else {
                (FieldStatus::Invalid, verdict.message.to_string())
            }
        };

        let field = self.fields.entry(kind).or_default();
        field.status = status;
        field.message = message;
        status
    }

    /// Validates every field; returns the ones that are not valid.
    pub fn validate_all(&mut self, today: NaiveDate) -> Vec<FieldKind> {
        FieldKind::ALL
            .into_iter()
            .filter(|kind| self.revalidate(*kind, today) != FieldStatus::Valid)
            .collect()
    }

    pub fn strength(&self) -> PasswordStrength {
        self.strength
    }

    pub fn set_bio(&mut self, raw: &str) {
        self.bio.set(raw);
    }

    pub fn bio(&self) -> &BioCounter {
        &self.bio
    }

    pub fn set_preference(&mut self, value: &str, selected: bool) {
        if selected {
            self.preferences.insert(value.to_string());
        } else {
            self.preferences.remove(value);
        }
    }

    pub fn preferences(&self) -> &BTreeSet<String> {
        &self.preferences
    }

    pub fn set_newsletter(&mut self, newsletter: bool) {
        self.newsletter = newsletter;
    }

    pub fn newsletter(&self) -> bool {
        self.newsletter
    }

    pub fn submit_button(&self) -> &SubmitButton {
        &self.submit
    }

    /// Returns every field to empty and Untouched. An in-flight submit
    /// keeps its lease.
    pub fn reset(&mut self) {
        let submit = self.submit.clone();
        *self = Self {
            submit,
            ..Self::default()
        };
    }

    /// Steps 1 to 3 of a submission: validate, snapshot and take the lease.
    pub fn prepare_submit(
        &mut self,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<(RegistrationPayload, SubmitLease), SubmitRejected> {
        if !self.submit.is_enabled() {
            return Err(SubmitRejected::Busy);
        }

        let invalid = self.validate_all(today);
        if !invalid.is_empty() {
            return Err(SubmitRejected::Invalid(invalid));
        }
        let Some(birthdate) = validators::parse_birthdate(self.value(FieldKind::Birthdate)) else {
            return Err(SubmitRejected::Invalid(vec![FieldKind::Birthdate]));
        };

        let payload = RegistrationPayload {
            name: self.value(FieldKind::Name).to_string(),
            email: self.value(FieldKind::Email).to_string(),
            phone: self.value(FieldKind::Phone).to_string(),
            birthdate,
            preferences: self.preferences.clone(),
            bio: self.bio.value().to_string(),
            newsletter: self.newsletter,
            registration_date: now,
        };
        let lease = self.submit.acquire().ok_or(SubmitRejected::Busy)?;
        Ok((payload, lease))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    /// Inputs from the end-to-end registration scenario.
    pub(crate) fn fill_valid(form: &mut RegistrationForm) {
        let today = today();
        form.input(FieldKind::Name, "Иван Иванов", today);
        form.input(FieldKind::Email, "a@b.com", today);
        form.input(FieldKind::Phone, "89001234567", today);
        form.input(FieldKind::Birthdate, "2010-01-15", today);
        form.input(FieldKind::Password, "abcd1234", today);
        form.input(FieldKind::ConfirmPassword, "abcd1234", today);
    }

    #[test]
    fn clearing_a_field_returns_it_to_untouched() {
        let mut form = RegistrationForm::new();
        assert_eq!(form.input(FieldKind::Email, "a@", today()), FieldStatus::Invalid);
        assert_eq!(form.field(FieldKind::Email).message, "Введите корректный email адрес");

        assert_eq!(form.input(FieldKind::Email, "a@b.ru", today()), FieldStatus::Valid);
        assert!(form.field(FieldKind::Email).message.is_empty());

        assert_eq!(form.input(FieldKind::Email, "", today()), FieldStatus::Untouched);
        assert!(form.field(FieldKind::Email).message.is_empty());
    }

    #[test]
    fn phone_is_masked_before_validation() {
        let mut form = RegistrationForm::new();
        assert_eq!(form.input(FieldKind::Phone, "8900123", today()), FieldStatus::Invalid);
        assert_eq!(form.field(FieldKind::Phone).raw_value, "+7 (900) 123");

        assert_eq!(form.input(FieldKind::Phone, "+7 (900) 123-45-67", today()), FieldStatus::Valid);
        assert_eq!(form.field(FieldKind::Phone).raw_value, "+7 (900) 123-45-67");
    }

    #[test]
    fn confirmation_follows_password_changes() {
        let mut form = RegistrationForm::new();
        form.input(FieldKind::Password, "abcd1234", today());
        form.input(FieldKind::ConfirmPassword, "abcd1234", today());
        assert!(form.field(FieldKind::ConfirmPassword).is_valid());

        form.input(FieldKind::Password, "abcd12345", today());
        assert_eq!(form.field(FieldKind::ConfirmPassword).status, FieldStatus::Invalid);

        form.input(FieldKind::ConfirmPassword, "abcd12345", today());
        assert!(form.field(FieldKind::ConfirmPassword).is_valid());
    }

    #[test]
    fn untouched_confirmation_stays_untouched() {
        let mut form = RegistrationForm::new();
        form.input(FieldKind::Password, "abc", today());
        assert_eq!(form.field(FieldKind::ConfirmPassword).status, FieldStatus::Untouched);
        assert_eq!(form.strength().value(), 1);
        form.input(FieldKind::Password, "abcd1234", today());
        assert_eq!(form.strength(), PasswordStrength::MAX);
    }

    #[test]
    fn bio_is_truncated_at_limit() {
        let mut form = RegistrationForm::new();
        assert_eq!(form.bio().remaining(), BIO_LIMIT);
        form.set_bio("книга ");
        assert_eq!(form.bio().remaining(), BIO_LIMIT - 6);

        let long = "я".repeat(BIO_LIMIT + 20);
        form.set_bio(&long);
        assert_eq!(form.bio().value().chars().count(), BIO_LIMIT);
        assert_eq!(form.bio().remaining(), 0);
    }

    #[test]
    fn reset_clears_everything() {
        let mut form = RegistrationForm::new();
        fill_valid(&mut form);
        form.set_bio("Люблю фантастику");
        form.set_preference("fantasy", true);
        form.set_newsletter(true);

        form.reset();
        for kind in FieldKind::ALL {
            assert_eq!(form.field(kind), FormFieldState::default(), "{kind}");
        }
        assert_eq!(form.strength().value(), 0);
        assert_eq!(form.bio().remaining(), BIO_LIMIT);
        assert!(form.preferences().is_empty());
        assert!(!form.newsletter());
    }

    #[test]
    fn invalid_form_is_rejected_without_lease() {
        let mut form = RegistrationForm::new();
        fill_valid(&mut form);
        form.input(FieldKind::Email, "broken", today());

        let err = form.prepare_submit(today(), Utc::now()).unwrap_err();
        assert_eq!(err, SubmitRejected::Invalid(vec![FieldKind::Email]));
        assert!(form.submit_button().is_enabled());
    }

    #[test]
    fn empty_form_reports_every_field() {
        let mut form = RegistrationForm::new();
        let err = form.prepare_submit(today(), Utc::now()).unwrap_err();
        assert_eq!(err, SubmitRejected::Invalid(FieldKind::ALL.to_vec()));
    }

    #[test]
    fn lease_disables_button_until_dropped() {
        let mut form = RegistrationForm::new();
        fill_valid(&mut form);
        form.set_preference("classic", true);
        form.set_preference("fantasy", true);
        form.set_preference("classic", false);

        let (payload, lease) = form.prepare_submit(today(), Utc::now()).unwrap();
        assert_eq!(payload.phone, "+7 (900) 123-45-67");
        assert_eq!(payload.preferences, BTreeSet::from(["fantasy".to_string()]));
        assert!(!form.submit_button().is_enabled());
        assert_eq!(form.submit_button().label(), SUBMIT_BUSY_LABEL);
        assert_eq!(
            form.prepare_submit(today(), Utc::now()).unwrap_err(),
            SubmitRejected::Busy
        );

        drop(lease);
        assert!(form.submit_button().is_enabled());
        assert_eq!(form.submit_button().label(), SUBMIT_LABEL);
    }

    #[test]
    fn lease_survives_reset() {
        let mut form = RegistrationForm::new();
        fill_valid(&mut form);
        let (_payload, lease) = form.prepare_submit(today(), Utc::now()).unwrap();
        form.reset();
        assert!(!form.submit_button().is_enabled());
        drop(lease);
        assert!(form.submit_button().is_enabled());
    }
}
