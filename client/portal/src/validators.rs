//! Field validators. Pure functions from a raw value to a [`Verdict`].

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::{fmt, sync::LazyLock};

/// Minimum age, in whole years, accepted by the birthdate field.
pub const MIN_AGE_YEARS: i32 = 12;
pub const PASSWORD_MIN_LEN: usize = 8;

static NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[А-ЯЁ][а-яё]{2,}(?: [А-ЯЁ][а-яё]+)*$").unwrap());
static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());
static PHONE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+7 \([0-9]{3}\) [0-9]{3}-[0-9]{2}-[0-9]{2}$").unwrap());
static PASSWORD_LETTER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Zа-яА-Я]").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldKind {
    Name,
    Email,
    Phone,
    Birthdate,
    Password,
    ConfirmPassword,
}

impl FieldKind {
    /// Validated fields in submit order.
    pub const ALL: [FieldKind; 6] = [
        FieldKind::Name,
        FieldKind::Email,
        FieldKind::Phone,
        FieldKind::Birthdate,
        FieldKind::Password,
        FieldKind::ConfirmPassword,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Name => "name",
            FieldKind::Email => "email",
            FieldKind::Phone => "phone",
            FieldKind::Birthdate => "birthdate",
            FieldKind::Password => "password",
            FieldKind::ConfirmPassword => "confirmPassword",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FieldKind::Name => "Имя",
            FieldKind::Email => "Email",
            FieldKind::Phone => "Телефон",
            FieldKind::Birthdate => "Дата рождения",
            FieldKind::Password => "Пароль",
            FieldKind::ConfirmPassword => "Подтверждение пароля",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Number of satisfied password predicates, 0..=3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct PasswordStrength(u8);

impl PasswordStrength {
    pub const MAX: PasswordStrength = PasswordStrength(3);

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Width of the strength bar in percent.
    pub fn percent(&self) -> u8 {
        match self.0 {
            0 => 0,
            1 => 33,
            2 => 66,
            _ => 100,
        }
    }

    /// Bar colour as `#rrggbb`.
    pub fn color(&self) -> &'static str {
        match self.0 {
            0 | 1 => "#f72585",
            2 => "#ff9e00",
            _ => "#4cc9f0",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub is_valid: bool,
    pub message: &'static str,
    pub strength: Option<PasswordStrength>,
}

impl Verdict {
    fn new(is_valid: bool, message: &'static str) -> Self {
        Self {
            is_valid,
            message,
            strength: None,
        }
    }
}

/// Values read at validation time rather than captured earlier.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    pub today: NaiveDate,
    pub password: &'a str,
}

pub fn validate(kind: FieldKind, raw: &str, ctx: &ValidationContext<'_>) -> Verdict {
    match kind {
        FieldKind::Name => validate_name(raw),
        FieldKind::Email => validate_email(raw),
        FieldKind::Phone => validate_phone(raw),
        FieldKind::Birthdate => validate_birthdate(raw, ctx.today),
        FieldKind::Password => validate_password(raw),
        FieldKind::ConfirmPassword => validate_confirm_password(raw, ctx.password),
    }
}

pub fn validate_name(raw: &str) -> Verdict {
    Verdict::new(
        NAME_REGEX.is_match(raw),
        "Имя должно начинаться с заглавной буквы и содержать минимум 2 символа",
    )
}

pub fn validate_email(raw: &str) -> Verdict {
    Verdict::new(EMAIL_REGEX.is_match(raw), "Введите корректный email адрес")
}

pub fn validate_phone(raw: &str) -> Verdict {
    Verdict::new(
        PHONE_REGEX.is_match(raw),
        "Формат телефона: +7 (XXX) XXX-XX-XX",
    )
}

pub fn validate_birthdate(raw: &str, today: NaiveDate) -> Verdict {
    let is_valid = parse_birthdate(raw)
        .map(|birthdate| birthdate <= min_birthdate(today))
        .unwrap_or(false);
    Verdict::new(is_valid, "Вам должно быть больше 12 лет")
}

pub fn parse_birthdate(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Latest birthdate that still satisfies [`MIN_AGE_YEARS`] on `today`.
pub fn min_birthdate(today: NaiveDate) -> NaiveDate {
    let year = today.year() - MIN_AGE_YEARS;
    // Feb 29 has no counterpart in a common year; roll to Mar 1.
    today
        .with_year(year)
        .or_else(|| NaiveDate::from_ymd_opt(year, 3, 1))
        .unwrap_or(today)
}

pub fn password_strength(raw: &str) -> PasswordStrength {
    let predicates = [
        raw.chars().count() >= PASSWORD_MIN_LEN,
        PASSWORD_LETTER_REGEX.is_match(raw),
        raw.chars().any(|c| c.is_ascii_digit()),
    ];
    PasswordStrength(predicates.iter().filter(|hit| **hit).count() as u8)
}

pub fn validate_password(raw: &str) -> Verdict {
    let strength = password_strength(raw);
    Verdict {
        is_valid: strength == PasswordStrength::MAX,
        message: "Пароль должен содержать минимум 8 символов, буквы и цифры",
        strength: Some(strength),
    }
}

pub fn validate_confirm_password(raw: &str, password: &str) -> Verdict {
    Verdict::new(raw == password, "Пароли не совпадают")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn name_accepts_capitalized_cyrillic_words() {
        for name in ["Иван", "Иван Иванов", "Ёлкин", "Анна Мария Петрова", "Оля Ли"] {
            assert!(validate_name(name).is_valid, "{name}");
        }
    }

    #[test]
    fn name_rejects_other_shapes() {
        for name in [
            "иван",
            "Ив",
            "ИВАН",
            "Иван  Иванов",
            "Иван иванов",
            "Ivan",
            "Иван ",
            " Иван",
            "Иван-Петров",
        ] {
            assert!(!validate_name(name).is_valid, "{name}");
        }
    }

    #[test]
    fn email_shape() {
        assert!(validate_email("a@b.com").is_valid);
        assert!(validate_email("first.last@mail.example.org").is_valid);
        assert!(!validate_email("a@b").is_valid);
        assert!(!validate_email("a b@c.de").is_valid);
        assert!(!validate_email("a@@b.com").is_valid);
        assert!(!validate_email("@b.com").is_valid);
    }

    #[test]
    fn phone_requires_full_mask() {
        assert!(validate_phone("+7 (900) 123-45-67").is_valid);
        assert!(!validate_phone("+7 (900) 123-45-6").is_valid);
        assert!(!validate_phone("+8 (900) 123-45-67").is_valid);
        assert!(!validate_phone("89001234567").is_valid);
    }

    #[test]
    fn birthdate_min_age_is_evaluated_against_given_day() {
        let today = date(2026, 10, 16);
        assert!(validate_birthdate("2014-10-16", today).is_valid);
        assert!(!validate_birthdate("2014-10-17", today).is_valid);
        assert!(validate_birthdate("1990-01-01", today).is_valid);
        assert!(!validate_birthdate("not a date", today).is_valid);
        // The same birthday becomes valid a day later.
        assert!(validate_birthdate("2014-10-17", date(2026, 10, 17)).is_valid);
    }

    #[test]
    fn leap_day_rolls_forward_in_common_years() {
        assert_eq!(min_birthdate(date(2028, 2, 29)), date(2016, 2, 29));
        // 2100 is not a leap year.
        assert_eq!(min_birthdate(date(2112, 2, 29)), date(2100, 3, 1));
        assert_eq!(min_birthdate(date(2025, 2, 28)), date(2013, 2, 28));
    }

    #[test]
    fn password_strength_counts_predicates() {
        assert_eq!(password_strength("").value(), 0);
        assert_eq!(password_strength("abc").value(), 1);
        assert_eq!(password_strength("123").value(), 1);
        assert_eq!(password_strength("!!!!!!!!").value(), 1);
        assert_eq!(password_strength("abc1").value(), 2);
        assert_eq!(password_strength("abcdefgh").value(), 2);
        assert_eq!(password_strength("пароль12").value(), 3);
        assert_eq!(password_strength("abcd1234").value(), 3);
    }

    #[test]
    fn password_strength_is_monotonic() {
        // Each step satisfies one more predicate than the previous one.
        let steps = ["!!", "!!a", "!!a1", "!!a1!!!!"];
        let strengths: Vec<u8> = steps.iter().map(|s| password_strength(s).value()).collect();
        assert_eq!(strengths, vec![0, 1, 2, 3]);
        assert!(strengths.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn password_needs_all_three_predicates() {
        let verdict = validate_password("abcdefgh");
        assert!(!verdict.is_valid);
        assert_eq!(verdict.strength, Some(PasswordStrength(2)));
        assert!(validate_password("abcd1234").is_valid);
    }

    #[test]
    fn strength_bar_projection() {
        assert_eq!(PasswordStrength(0).percent(), 0);
        assert_eq!(PasswordStrength(1).percent(), 33);
        assert_eq!(PasswordStrength(2).color(), "#ff9e00");
        assert_eq!(PasswordStrength::MAX.percent(), 100);
        assert_eq!(PasswordStrength::MAX.color(), "#4cc9f0");
    }

    #[test]
    fn confirm_password_reads_live_password() {
        let today = date(2026, 1, 1);
        let ctx = ValidationContext {
            today,
            password: "abcd1234",
        };
        assert!(validate(FieldKind::ConfirmPassword, "abcd1234", &ctx).is_valid);
        let ctx = ValidationContext {
            today,
            password: "abcd12345",
        };
        assert!(!validate(FieldKind::ConfirmPassword, "abcd1234", &ctx).is_valid);
    }
}
