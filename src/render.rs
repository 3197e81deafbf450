use crate::detail::{DetailContent, DetailView, OfferButton, NOT_FOUND_TEXT};
use crate::list::{ListView, MovieCard, ERROR_TEXT, LOADING_TEXT};
use std::fmt::Write;

const CARD_SEPARATOR: &str = "  |  ";
const SPINNER: &str = "( ◌ )";

// One unwrapped line per row; the terminal scrolls it sideways.
pub fn render_list(view: &ListView) -> String {
    match view {
        ListView::Loading => format!("{LOADING_TEXT}\n"),
        ListView::Error => format!("{ERROR_TEXT}\n"),
        ListView::Strip { heading, cards } => {
            let strip = cards
                .iter()
                .map(card_label)
                .collect::<Vec<_>>()
                .join(CARD_SEPARATOR);
            format!("## {heading}\n{strip}\n")
        }
    }
}

fn card_label(card: &MovieCard) -> String {
    format!("[{}] {}", card.id, card.title)
}

pub fn render_posters(view: &ListView) -> String {
    let ListView::Strip { cards, .. } = view else {
        return String::new();
    };
    let mut out = String::new();
    for card in cards {
        let _ = writeln!(
            out,
            "  {} -> {}",
            card.link(),
            card.poster_url.as_deref().unwrap_or("(no poster)")
        );
    }
    out
}

pub fn render_detail(view: &DetailView) -> String {
    match view {
        DetailView::Empty => String::new(),
        DetailView::Loading => overlay(),
        DetailView::NotFound => format!("{NOT_FOUND_TEXT}\n"),
        DetailView::Unavailable(reason) => {
            format!("Could not load this movie right now ({reason})\n")
        }
        DetailView::Ready(content) => render_content(content),
    }
}

fn overlay() -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "░".repeat(40));
    let _ = writeln!(out, "{:^40}", SPINNER);
    let _ = writeln!(out, "{}", "░".repeat(40));
    out
}

fn render_content(c: &DetailContent) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}", c.heading);
    if !c.tagline.is_empty() {
        let _ = writeln!(out, "{}", c.tagline);
    }
    if !c.genres.is_empty() {
        let genres = c
            .genres
            .iter()
            .map(|g| format!("[{g}]"))
            .collect::<Vec<_>>()
            .join(" ");
        let _ = writeln!(out, "{genres}");
    }

    let mut actions = vec![format!("★ {}", c.rating)];
    actions.extend(c.rent.iter().map(offer_label));
    actions.extend(c.buy.iter().map(offer_label));
    let _ = writeln!(out, "{}", actions.join("   "));

    let _ = writeln!(out, "\nOverview\n{}\n", c.overview);
    let _ = writeln!(out, "Status:       {}", c.status);
    let _ = writeln!(out, "Release Date: {}", c.release_date);
    let _ = writeln!(out, "Runtime:      {}", c.runtime);
    let _ = writeln!(out, "Director:     {}", c.director);

    if !c.cast.is_empty() {
        let _ = writeln!(out, "\nTop Cast");
        for member in &c.cast {
            match &member.profile_url {
                Some(url) => {
                    let _ = writeln!(out, "  {} as {}  {}", member.name, member.character, url);
                }
                None => {
                    let _ = writeln!(out, "  {} as {}", member.name, member.character);
                }
            }
        }
    }
    if let Some(poster) = &c.poster_url {
        let _ = writeln!(out, "\nPoster: {poster}");
    }
    if let Some(backdrop) = &c.backdrop_url {
        let _ = writeln!(out, "Backdrop: {backdrop}");
    }
    out
}

fn offer_label(button: &OfferButton) -> String {
    match &button.logo_url {
        Some(logo) => format!("<{}> (logo: {})", button.label, logo),
        None => format!("<{}>", button.label),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detail::CastCard;

    fn card(id: i32, title: &str) -> MovieCard {
        MovieCard {
            id,
            title: title.to_string(),
            poster_url: None,
        }
    }

    #[test]
    fn strip_keeps_order_on_one_line() {
        let view = ListView::Strip {
            heading: "Popular".to_string(),
            cards: vec![card(2, "Second"), card(1, "First")],
        };
        let out = render_list(&view);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines, vec!["## Popular", "[2] Second  |  [1] First"]);
    }

    #[test]
    fn list_states_render_text() {
        assert_eq!(render_list(&ListView::Loading), "Loading...\n");
        assert_eq!(render_list(&ListView::Error), "Error fetching movies\n");
    }

    #[test]
    fn loading_overlay_has_no_content() {
        let out = render_detail(&DetailView::Loading);
        assert!(out.contains(SPINNER));
        assert!(!out.contains("Overview"));
    }

    #[test]
    fn ready_page_shows_offers_and_facts() {
        let content = DetailContent {
            heading: "Fight Club (1999)".to_string(),
            tagline: String::new(),
            genres: vec!["Drama".to_string()],
            rating: "8.4".to_string(),
            rent: Some(OfferButton {
                label: "Rent at A".to_string(),
                provider_name: "A".to_string(),
                logo_url: None,
                link: "https://example.test/watch".to_string(),
            }),
            buy: None,
            overview: "Soap.".to_string(),
            status: "Released".to_string(),
            release_date: "10/15/1999".to_string(),
            runtime: "2h 19m".to_string(),
            director: "David Fincher".to_string(),
            cast: vec![CastCard {
                name: "Edward Norton".to_string(),
                character: "The Narrator".to_string(),
                profile_url: None,
            }],
            poster_url: None,
            backdrop_url: None,
        };
        let out = render_detail(&DetailView::Ready(Box::new(content)));
        assert!(out.starts_with("# Fight Club (1999)\n"));
        assert!(out.contains("★ 8.4   <Rent at A>"));
        assert!(!out.contains("Buy at"));
        assert!(out.contains("Runtime:      2h 19m"));
        assert!(out.contains("Edward Norton as The Narrator"));
    }

    #[test]
    fn ready_page_lists_logo_profile_and_backdrop_urls() {
        let content = DetailContent {
            heading: "Heat (1995)".to_string(),
            tagline: String::new(),
            genres: vec![],
            rating: "7.9".to_string(),
            rent: Some(OfferButton {
                label: "Rent at A".to_string(),
                provider_name: "A".to_string(),
                logo_url: Some("https://image.tmdb.org/t/p/w45/a.png".to_string()),
                link: "https://example.test/watch".to_string(),
            }),
            buy: None,
            overview: String::new(),
            status: "Released".to_string(),
            release_date: "12/15/1995".to_string(),
            runtime: "2h 50m".to_string(),
            director: "Michael Mann".to_string(),
            cast: vec![CastCard {
                name: "Al Pacino".to_string(),
                character: "Vincent Hanna".to_string(),
                profile_url: Some("https://image.tmdb.org/t/p/w200/pacino.jpg".to_string()),
            }],
            poster_url: Some("https://image.tmdb.org/t/p/w500/p.jpg".to_string()),
            backdrop_url: Some("https://image.tmdb.org/t/p/original/b.jpg".to_string()),
        };
        let out = render_detail(&DetailView::Ready(Box::new(content)));
        assert!(out.contains("<Rent at A> (logo: https://image.tmdb.org/t/p/w45/a.png)"));
        assert!(out.contains("Al Pacino as Vincent Hanna  https://image.tmdb.org/t/p/w200/pacino.jpg"));
        assert!(out.contains("Poster: https://image.tmdb.org/t/p/w500/p.jpg"));
        assert!(out.contains("Backdrop: https://image.tmdb.org/t/p/original/b.jpg"));
    }
}
