//! Plain-text projection of the page, used by the headless runner.

use std::{fmt::Write as _, time::Instant};

use crate::{
    app::PortalState,
    catalog::{BookCard, CatalogView, LOAD_ERROR_DETAIL, LOAD_ERROR_TITLE, RETRY_LABEL},
    form::{FieldStatus, RegistrationForm},
    validators::FieldKind,
};

pub fn render_card(card: &BookCard) -> String {
    format!(
        "{} / {} [{}] {} ★{}\n    {}\n    {}",
        card.title,
        card.author,
        card.genre,
        card.price,
        card.rating,
        card.excerpt,
        card.tags.join(" · ")
    )
}

pub fn render_catalog(state: &PortalState) -> String {
    let catalog = &state.catalog;
    let mut out = String::new();
    if catalog.spinner_visible() {
        out.push_str("Загрузка...\n");
    }
    match catalog.view() {
        CatalogView::Empty => {}
        CatalogView::Items(cards) => {
            for card in cards {
                let _ = writeln!(out, "  {}", render_card(card));
            }
        }
        CatalogView::Failed => {
            let _ = writeln!(out, "  {LOAD_ERROR_TITLE}. {LOAD_ERROR_DETAIL} [{RETRY_LABEL}]");
        }
    }
    if let Some(stamp) = catalog.last_updated() {
        let _ = writeln!(out, "Последнее обновление: {stamp}");
    }
    let _ = write!(out, "{}", state.countdown);
    out
}

pub fn render_form(form: &RegistrationForm) -> String {
    let mut out = String::new();
    for kind in FieldKind::ALL {
        let field = form.field(kind);
        let marker = match field.status {
            FieldStatus::Untouched => ' ',
            FieldStatus::Valid => '+',
            FieldStatus::Invalid => '!',
        };
        let value = match kind {
            FieldKind::Password | FieldKind::ConfirmPassword => "*".repeat(field.raw_value.chars().count()),
            _ => field.raw_value.clone(),
        };
        let _ = write!(out, "[{marker}] {}: {value}", kind.label());
        if !field.message.is_empty() {
            let _ = write!(out, " ({})", field.message);
        }
        out.push('\n');
    }
    let _ = write!(
        out,
        "Сила пароля: {}%, осталось символов: {}, кнопка: {}",
        form.strength().percent(),
        form.bio().remaining(),
        form.submit_button().label()
    );
    out
}

pub fn render_page(state: &PortalState, now: Instant) -> String {
    let mut out = format!("Тема: {} ({})\n", state.theme, state.theme.icon());
    if let Some(notice) = state.notices.visible(now) {
        let _ = writeln!(out, "{notice}");
    }
    out.push_str(&render_form(&state.form));
    out.push('\n');
    if state.modal.is_open() {
        out.push_str("Регистрация завершена:\n");
        for (label, value) in state.modal.lines() {
            let _ = writeln!(out, "  {label}: {value}");
        }
    }
    out.push_str(&render_catalog(state));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::fake::sample_books,
        catalog::BookCatalog,
        form::tests::{fill_valid, today},
        notice::{NoticeBoard, NoticeKind, SuccessModal},
        schedule::Countdown,
        theme::Theme,
    };
    use rand::{rngs::StdRng, SeedableRng};
    use std::time::Duration;

    fn state() -> PortalState {
        PortalState {
            form: RegistrationForm::new(),
            catalog: BookCatalog::new(),
            theme: Theme::Light,
            notices: NoticeBoard::new(Duration::from_secs(5)),
            modal: SuccessModal::default(),
            countdown: Countdown::Updating,
        }
    }

    #[test]
    fn catalog_shows_cards_or_placeholder() {
        let mut state = state();
        let mut rng = StdRng::seed_from_u64(1);
        state
            .catalog
            .finish(Ok(sample_books()), "12:30".to_string(), &mut rng);
        let text = render_catalog(&state);
        assert!(text.contains("Мастер и Маргарита"));
        assert!(text.contains("450₽"));
        assert!(text.contains("Последнее обновление: 12:30"));
        assert!(text.ends_with("Обновление..."));

        state.catalog.finish(
            Err(crate::error::ApiError::Status { status: 500 }),
            "12:35".to_string(),
            &mut rng,
        );
        let text = render_catalog(&state);
        assert!(text.contains(RETRY_LABEL));
        assert!(!text.contains("Мастер"));
    }

    #[test]
    fn form_hides_passwords_and_marks_status() {
        let mut state = state();
        fill_valid(&mut state.form);
        state.form.input(FieldKind::Email, "broken", today());
        state
            .notices
            .show(NoticeKind::Error, "Пожалуйста, исправьте ошибки в форме", Instant::now());

        let text = render_page(&state, Instant::now());
        assert!(text.contains("[+] Телефон: +7 (900) 123-45-67"));
        assert!(text.contains("[!] Email: broken (Введите корректный email адрес)"));
        assert!(text.contains("[+] Пароль: ********"));
        assert!(!text.contains("abcd1234"));
        assert!(text.contains("[error] Пожалуйста"));
        assert!(text.starts_with("Тема: light (moon)"));
    }
}
