use crate::tmdb::TmdbError;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub message: String,
    pub not_found: bool,
}

impl From<&TmdbError> for FetchFailure {
    fn from(err: &TmdbError) -> Self {
        Self {
            message: err.to_string(),
            not_found: err.is_not_found(),
        }
    }
}

impl From<TmdbError> for FetchFailure {
    fn from(err: TmdbError) -> Self {
        FetchFailure::from(&err)
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestState<T> {
    #[default]
    Idle,
    Loading,
    Ready(T),
    Failed(FetchFailure),
}

impl<T> RequestState<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, RequestState::Idle | RequestState::Loading)
    }

    pub fn is_settled(&self) -> bool {
        !self.is_pending()
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            RequestState::Ready(v) => Some(v),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&FetchFailure> {
        match self {
            RequestState::Failed(f) => Some(f),
            _ => None,
        }
    }

    pub fn settle<E: Into<FetchFailure>>(&mut self, result: Result<T, E>) {
        *self = match result {
            Ok(v) => RequestState::Ready(v),
            Err(e) => RequestState::Failed(e.into()),
        };
    }
}

// Tags only ever grow within a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestTag(u64);

impl RequestTag {
    pub fn value(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct Generation {
    current: u64,
}

impl Generation {
    pub fn advance(&mut self) -> RequestTag {
        self.current += 1;
        RequestTag(self.current)
    }

    pub fn is_current(&self, tag: RequestTag) -> bool {
        self.current != 0 && tag.0 == self.current
    }
}
