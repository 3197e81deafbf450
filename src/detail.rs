use crate::images::{image_url, BACKDROP_SIZE, LOGO_SIZE, POSTER_SIZE, PROFILE_SIZE};
use crate::models::{format_release_date, format_runtime, MovieDetails, Provider, ProviderInfo};
use crate::request::{Generation, RequestState, RequestTag};
use crate::tmdb::TmdbError;
use tracing::{debug, error, warn};

pub const NOT_FOUND_TEXT: &str = "Movie not found";
pub const TOP_CAST: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailRequests {
    pub tag: RequestTag,
    pub id: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    Rent,
    Buy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    OpenExternal(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OfferButton {
    pub label: String,
    pub provider_name: String,
    pub logo_url: Option<String>,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CastCard {
    pub name: String,
    pub character: String,
    pub profile_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailContent {
    pub heading: String,
    pub tagline: String,
    pub genres: Vec<String>,
    pub rating: String,
    pub rent: Option<OfferButton>,
    pub buy: Option<OfferButton>,
    pub overview: String,
    pub status: String,
    pub release_date: String,
    pub runtime: String,
    pub director: String,
    pub cast: Vec<CastCard>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetailView {
    Empty,
    Loading,
    NotFound,
    Unavailable(String),
    Ready(Box<DetailContent>),
}

#[derive(Debug, Default)]
pub struct MovieDetailPage {
    id: Option<i32>,
    details: RequestState<MovieDetails>,
    providers: RequestState<ProviderInfo>,
    generation: Generation,
}

impl MovieDetailPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> Option<i32> {
        self.id
    }

    pub fn details(&self) -> &RequestState<MovieDetails> {
        &self.details
    }

    pub fn providers(&self) -> &RequestState<ProviderInfo> {
        &self.providers
    }

    // Earlier requests are left to finish; their completions no longer match.
    pub fn navigate(&mut self, id: i32) -> Option<DetailRequests> {
        if self.id == Some(id) {
            return None;
        }
        self.id = Some(id);
        Some(self.begin())
    }

    pub fn reload(&mut self) -> Option<DetailRequests> {
        self.id.map(|_| self.begin())
    }

    fn begin(&mut self) -> DetailRequests {
        let tag = self.generation.advance();
        self.details = RequestState::Loading;
        self.providers = RequestState::Loading;
        let id = self.id.unwrap_or_default();
        debug!(id, tag = tag.value(), "Detail requests issued");
        DetailRequests { tag, id }
    }

    pub fn settle_details(
        &mut self,
        tag: RequestTag,
        result: Result<MovieDetails, TmdbError>,
    ) -> bool {
        if !self.generation.is_current(tag) {
            debug!(tag = tag.value(), "Discarding stale movie details");
            return false;
        }
        match &result {
            Err(TmdbError::NotFound) => {
                debug!(id = ?self.id, "Movie details not found");
            }
            Err(e) => error!("Error fetching movie details for {:?}: {}", self.id, e),
            Ok(_) => {}
        }
        self.details.settle(result);
        true
    }

    pub fn settle_providers(
        &mut self,
        tag: RequestTag,
        result: Result<ProviderInfo, TmdbError>,
    ) -> bool {
        if !self.generation.is_current(tag) {
            debug!(tag = tag.value(), "Discarding stale watch providers");
            return false;
        }
        if let Err(e) = &result {
            warn!("Watch providers unavailable for {:?}: {}", self.id, e);
        }
        self.providers.settle(result);
        true
    }

    pub fn is_pending(&self) -> bool {
        self.id.is_some() && (self.details.is_pending() || self.providers.is_pending())
    }

    // Nothing renders until both retrievals have settled.
    pub fn view(&self, image_base: &str) -> DetailView {
        if self.id.is_none() {
            return DetailView::Empty;
        }
        if self.is_pending() {
            return DetailView::Loading;
        }
        match &self.details {
            RequestState::Ready(movie) if movie.is_usable() => DetailView::Ready(Box::new(
                build_content(movie, self.providers.ready(), image_base),
            )),
            RequestState::Ready(_) => DetailView::NotFound,
            RequestState::Failed(f) if f.not_found => DetailView::NotFound,
            RequestState::Failed(f) => DetailView::Unavailable(f.message.clone()),
            RequestState::Idle | RequestState::Loading => DetailView::Loading,
        }
    }

    pub fn activate(&self, offer: Offer) -> Option<Action> {
        let providers = self.providers.ready()?;
        let available = match offer {
            Offer::Rent => providers.first_rent().is_some(),
            Offer::Buy => providers.first_buy().is_some(),
        };
        if !available || providers.link.is_empty() {
            return None;
        }
        Some(Action::OpenExternal(providers.link.clone()))
    }
}

pub fn build_content(
    movie: &MovieDetails,
    providers: Option<&ProviderInfo>,
    image_base: &str,
) -> DetailContent {
    let heading = match movie.release_year() {
        Some(year) => format!("{} ({})", movie.title, year),
        None => movie.title.clone(),
    };
    let link = providers.map(|p| p.link.clone()).unwrap_or_default();
    let button = |label: &str, provider: &Provider| OfferButton {
        label: format!("{} at {}", label, provider.provider_name),
        provider_name: provider.provider_name.clone(),
        logo_url: image_url(image_base, LOGO_SIZE, provider.logo_path.as_deref()),
        link: link.clone(),
    };

    DetailContent {
        heading,
        tagline: movie.tagline.clone(),
        genres: movie.genres.iter().map(|g| g.name.clone()).collect(),
        rating: format!("{:.1}", movie.vote_average),
        rent: providers
            .and_then(ProviderInfo::first_rent)
            .map(|p| button("Rent", p)),
        buy: providers
            .and_then(ProviderInfo::first_buy)
            .map(|p| button("Buy", p)),
        overview: movie.overview.clone(),
        status: movie.status.clone(),
        release_date: format_release_date(&movie.release_date)
            .unwrap_or_else(|| movie.release_date.clone()),
        runtime: format_runtime(movie.runtime.unwrap_or(0)),
        director: movie.director().to_string(),
        cast: movie
            .top_cast(TOP_CAST)
            .iter()
            .map(|c| CastCard {
                name: c.name.clone(),
                character: c.character.clone(),
                profile_url: image_url(image_base, PROFILE_SIZE, c.profile_path.as_deref()),
            })
            .collect(),
        poster_url: image_url(image_base, POSTER_SIZE, movie.poster_path.as_deref()),
        backdrop_url: image_url(image_base, BACKDROP_SIZE, movie.backdrop_path.as_deref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CastMember, Credits, CrewMember, Genre};

    const BASE: &str = "https://image.tmdb.org/t/p";

    fn movie(title: &str) -> MovieDetails {
        MovieDetails {
            title: title.to_string(),
            overview: "A story.".to_string(),
            poster_path: Some("/poster.jpg".to_string()),
            release_date: "1999-10-15".to_string(),
            vote_average: 8.433,
            genres: vec![Genre {
                id: 18,
                name: "Drama".to_string(),
            }],
            runtime: Some(139),
            status: "Released".to_string(),
            tagline: "Mischief. Mayhem. Soap.".to_string(),
            credits: Some(Credits {
                crew: vec![CrewMember {
                    id: 7467,
                    name: "David Fincher".to_string(),
                    job: "Director".to_string(),
                }],
                cast: (0..8)
                    .map(|i| CastMember {
                        id: i,
                        name: format!("Actor {i}"),
                        character: format!("Role {i}"),
                        profile_path: Some(format!("/p{i}.jpg")),
                    })
                    .collect(),
            }),
            ..Default::default()
        }
    }

    fn provider(name: &str) -> Provider {
        Provider {
            provider_name: name.to_string(),
            logo_path: Some(format!("/{name}.png")),
        }
    }

    fn providers() -> ProviderInfo {
        ProviderInfo {
            rent: vec![provider("A"), provider("B")],
            buy: vec![provider("C")],
            link: "https://www.themoviedb.org/movie/550/watch?locale=US".to_string(),
        }
    }

    #[test]
    fn loading_until_both_settle() {
        let mut page = MovieDetailPage::new();
        assert_eq!(page.view(BASE), DetailView::Empty);
        let req = page.navigate(550).expect("requests issued");
        assert_eq!(page.view(BASE), DetailView::Loading);

        page.settle_details(req.tag, Ok(movie("Fight Club")));
        assert_eq!(page.view(BASE), DetailView::Loading);

        page.settle_providers(req.tag, Ok(providers()));
        assert!(matches!(page.view(BASE), DetailView::Ready(_)));
    }

    #[test]
    fn providers_first_still_loads() {
        let mut page = MovieDetailPage::new();
        let req = page.navigate(550).expect("requests issued");
        page.settle_providers(req.tag, Ok(providers()));
        assert_eq!(page.view(BASE), DetailView::Loading);
    }

    #[test]
    fn ready_content_derives_display_values() {
        let content = build_content(&movie("Fight Club"), Some(&providers()), BASE);
        assert_eq!(content.heading, "Fight Club (1999)");
        assert_eq!(content.rating, "8.4");
        assert_eq!(content.runtime, "2h 19m");
        assert_eq!(content.release_date, "10/15/1999");
        assert_eq!(content.director, "David Fincher");
        assert_eq!(content.cast.len(), TOP_CAST);
        assert_eq!(
            content.cast[0].profile_url.as_deref(),
            Some("https://image.tmdb.org/t/p/w200/p0.jpg")
        );

        let rent = content.rent.expect("rent offer");
        assert_eq!(rent.label, "Rent at A");
        assert_eq!(rent.provider_name, "A");
        assert_eq!(rent.logo_url.as_deref(), Some("https://image.tmdb.org/t/p/w45/A.png"));
        let buy = content.buy.expect("buy offer");
        assert_eq!(buy.label, "Buy at C");
        assert_eq!(rent.link, buy.link);
    }

    #[test]
    fn not_found_and_unavailable_are_distinct() {
        let mut page = MovieDetailPage::new();
        let req = page.navigate(1).expect("requests issued");
        page.settle_details(req.tag, Err(TmdbError::NotFound));
        page.settle_providers(req.tag, Err(TmdbError::NotFound));
        assert_eq!(page.view(BASE), DetailView::NotFound);

        let req = page.navigate(2).expect("requests issued");
        page.settle_details(req.tag, Err(TmdbError::Unauthorized));
        page.settle_providers(req.tag, Ok(ProviderInfo::default()));
        assert!(matches!(page.view(BASE), DetailView::Unavailable(_)));
    }

    #[test]
    fn empty_details_body_counts_as_not_found() {
        let mut page = MovieDetailPage::new();
        let req = page.navigate(3).expect("requests issued");
        page.settle_details(req.tag, Ok(MovieDetails::default()));
        page.settle_providers(req.tag, Ok(ProviderInfo::default()));
        assert_eq!(page.view(BASE), DetailView::NotFound);
    }

    #[test]
    fn provider_failure_hides_offers() {
        let mut page = MovieDetailPage::new();
        let req = page.navigate(550).expect("requests issued");
        page.settle_details(req.tag, Ok(movie("Fight Club")));
        page.settle_providers(req.tag, Err(TmdbError::Unauthorized));
        let DetailView::Ready(content) = page.view(BASE) else {
            panic!("expected ready page");
        };
        assert!(content.rent.is_none());
        assert!(content.buy.is_none());
        assert_eq!(page.activate(Offer::Rent), None);
    }

    #[test]
    fn rent_and_buy_open_the_same_link() {
        let mut page = MovieDetailPage::new();
        let req = page.navigate(550).expect("requests issued");
        page.settle_details(req.tag, Ok(movie("Fight Club")));
        page.settle_providers(req.tag, Ok(providers()));
        let link = providers().link;
        assert_eq!(page.activate(Offer::Rent), Some(Action::OpenExternal(link.clone())));
        assert_eq!(page.activate(Offer::Buy), Some(Action::OpenExternal(link)));
    }

    #[test]
    fn stale_response_does_not_overwrite_newer_id() {
        let mut page = MovieDetailPage::new();
        let first = page.navigate(100).expect("requests issued");
        let second = page.navigate(200).expect("requests issued");

        assert!(page.settle_details(second.tag, Ok(movie("Two Hundred"))));
        assert!(page.settle_providers(second.tag, Ok(ProviderInfo::default())));
        assert!(!page.settle_details(first.tag, Ok(movie("One Hundred"))));
        assert!(!page.settle_providers(first.tag, Ok(providers())));

        let DetailView::Ready(content) = page.view(BASE) else {
            panic!("expected ready page");
        };
        assert!(content.heading.starts_with("Two Hundred"));
        assert!(content.rent.is_none());
    }

    #[test]
    fn same_id_does_not_refetch() {
        let mut page = MovieDetailPage::new();
        assert!(page.navigate(550).is_some());
        assert!(page.navigate(550).is_none());
        assert!(page.reload().is_some());
    }

    #[test]
    fn missing_director_and_year() {
        let mut m = movie("Untitled");
        m.credits = None;
        m.release_date = String::new();
        m.runtime = None;
        let content = build_content(&m, None, BASE);
        assert_eq!(content.heading, "Untitled");
        assert_eq!(content.director, "Unknown");
        assert_eq!(content.runtime, "0h 0m");
        assert!(content.cast.is_empty());
    }
}
