//! Book list state: what the last refresh cycle left on screen.

use rand::{seq::SliceRandom, Rng};

use crate::{error::ApiError, models::Book};

pub const LOAD_ERROR_TITLE: &str = "Ошибка при загрузке данных";
pub const LOAD_ERROR_DETAIL: &str = "Пожалуйста, проверьте соединение с сервером";
pub const RETRY_LABEL: &str = "Попробовать снова";

const EXCERPT_CHARS: usize = 100;

/// Cover gradients as `(from, to)` colour pairs.
pub const COVER_GRADIENTS: [(&str, &str); 5] = [
    ("#4361ee", "#4cc9f0"),
    ("#7209b7", "#f72585"),
    ("#ff9e00", "#ff0054"),
    ("#38b000", "#70e000"),
    ("#5a189a", "#9d4edd"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// First load: spinner on, current cards cleared.
    Initial,
    /// Scheduled, manual or retry refresh: cards stay until replaced.
    Forced,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookCard {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub price: String,
    pub rating: String,
    pub excerpt: String,
    pub tags: [String; 3],
    pub cover: (&'static str, &'static str),
}

impl BookCard {
    pub fn from_book<R: Rng + ?Sized>(book: &Book, rng: &mut R) -> Self {
        let excerpt: String = book.description.chars().take(EXCERPT_CHARS).collect();
        let cover = COVER_GRADIENTS
            .choose(rng)
            .copied()
            .unwrap_or(COVER_GRADIENTS[0]);
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            genre: book.genre.clone(),
            price: format!("{}₽", book.price),
            rating: book.rating.to_string(),
            excerpt: format!("{excerpt}..."),
            tags: [
                book.genre.clone(),
                format!("{} стр.", book.pages),
                book.year.to_string(),
            ],
            cover,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum CatalogView {
    #[default]
    Empty,
    Items(Vec<BookCard>),
    /// Error placeholder with a retry action.
    Failed,
}

#[derive(Debug, Clone, Default)]
pub struct BookCatalog {
    view: CatalogView,
    spinner: bool,
    last_updated: Option<String>,
}

impl BookCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, mode: RefreshMode) {
        if mode == RefreshMode::Initial {
            self.spinner = true;
            self.view = CatalogView::Empty;
        }
    }

    /// Applies the outcome of a fetch. `stamp` is the display time for
    /// "last updated" and is only used on success.
    pub fn finish<R: Rng + ?Sized>(
        &mut self,
        result: Result<Vec<Book>, ApiError>,
        stamp: String,
        rng: &mut R,
    ) {
        match result {
            Ok(books) => {
                tracing::info!(count = books.len(), updated = %stamp, "book list refreshed");
                self.view = CatalogView::Items(
                    books.iter().map(|book| BookCard::from_book(book, rng)).collect(),
                );
                self.last_updated = Some(stamp);
            }
            Err(err) => {
                tracing::warn!(error = %err, "book list refresh failed");
                self.view = CatalogView::Failed;
            }
        }
        self.spinner = false;
    }

    pub fn view(&self) -> &CatalogView {
        &self.view
    }

    pub fn spinner_visible(&self) -> bool {
        self.spinner
    }

    pub fn last_updated(&self) -> Option<&str> {
        self.last_updated.as_deref()
    }
}
