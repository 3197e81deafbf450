use crate::images::{image_url, POSTER_SIZE};
use crate::models::{Category, MovieSummary};
use crate::request::{Generation, RequestState, RequestTag};
use crate::tmdb::TmdbError;
use tracing::{debug, warn};

pub const LOADING_TEXT: &str = "Loading...";
pub const ERROR_TEXT: &str = "Error fetching movies";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListKey {
    pub category: Category,
    pub page: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListRequest {
    pub tag: RequestTag,
    pub key: ListKey,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MovieCard {
    pub id: i32,
    pub title: String,
    pub poster_url: Option<String>,
}

impl MovieCard {
    pub fn from_summary(summary: &MovieSummary, image_base: &str) -> Self {
        Self {
            id: summary.id,
            title: summary.title.clone(),
            poster_url: image_url(image_base, POSTER_SIZE, summary.poster_path.as_deref()),
        }
    }

    pub fn link(&self) -> String {
        format!("movie {}", self.id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListView {
    Loading,
    Error,
    Strip { heading: String, cards: Vec<MovieCard> },
}

#[derive(Debug)]
pub struct MovieList {
    key: ListKey,
    heading: String,
    state: RequestState<Vec<MovieSummary>>,
    generation: Generation,
}

impl MovieList {
    pub fn new(category: Category, heading: impl Into<String>, page: u32) -> Self {
        Self {
            key: ListKey {
                category,
                page: page.max(1),
            },
            heading: heading.into(),
            state: RequestState::Idle,
            generation: Generation::default(),
        }
    }

    pub fn for_category(category: Category) -> Self {
        Self::new(category, category.heading(), 1)
    }

    pub fn key(&self) -> ListKey {
        self.key
    }

    pub fn set_heading(&mut self, heading: impl Into<String>) {
        self.heading = heading.into();
    }

    pub fn state(&self) -> &RequestState<Vec<MovieSummary>> {
        &self.state
    }

    pub fn begin(&mut self) -> ListRequest {
        let tag = self.generation.advance();
        self.state = RequestState::Loading;
        debug!(category = %self.key.category, page = self.key.page, tag = tag.value(), "List request issued");
        ListRequest { tag, key: self.key }
    }

    pub fn ensure_loaded(&mut self) -> Option<ListRequest> {
        match self.state {
            RequestState::Idle => Some(self.begin()),
            _ => None,
        }
    }

    pub fn set_page(&mut self, page: u32) -> Option<ListRequest> {
        self.set_key(ListKey {
            category: self.key.category,
            page: page.max(1),
        })
    }

    pub fn set_category(&mut self, category: Category) -> Option<ListRequest> {
        self.set_key(ListKey {
            category,
            page: self.key.page,
        })
    }

    // One request per distinct (category, page).
    pub fn set_key(&mut self, key: ListKey) -> Option<ListRequest> {
        if key == self.key && !matches!(self.state, RequestState::Idle) {
            return None;
        }
        self.key = key;
        Some(self.begin())
    }

    pub fn settle(
        &mut self,
        tag: RequestTag,
        result: Result<Vec<MovieSummary>, TmdbError>,
    ) -> bool {
        if !self.generation.is_current(tag) {
            debug!(tag = tag.value(), "Discarding stale list response");
            return false;
        }
        if let Err(e) = &result {
            warn!(
                "Failed to fetch {} movies (page {}): {}",
                self.key.category, self.key.page, e
            );
        }
        self.state.settle(result);
        true
    }

    pub fn view(&self, image_base: &str) -> ListView {
        match &self.state {
            RequestState::Idle | RequestState::Loading => ListView::Loading,
            RequestState::Failed(_) => ListView::Error,
            RequestState::Ready(movies) => ListView::Strip {
                heading: self.heading.clone(),
                cards: movies
                    .iter()
                    .map(|m| MovieCard::from_summary(m, image_base))
                    .collect(),
            },
        }
    }
}
