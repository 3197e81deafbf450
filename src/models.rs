use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;

pub const UNKNOWN_DIRECTOR: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Popular,
    TopRated,
    Upcoming,
    NowPlaying,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Popular,
        Category::TopRated,
        Category::Upcoming,
        Category::NowPlaying,
    ];

    pub fn path_segment(&self) -> &'static str {
        match self {
            Category::Popular => "popular",
            Category::TopRated => "top_rated",
            Category::Upcoming => "upcoming",
            Category::NowPlaying => "now_playing",
        }
    }

    pub fn heading(&self) -> &'static str {
        match self {
            Category::Popular => "Popular",
            Category::TopRated => "Top Rated",
            Category::Upcoming => "Upcoming",
            Category::NowPlaying => "Now Playing",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "popular" => Ok(Category::Popular),
            "top_rated" => Ok(Category::TopRated),
            "upcoming" => Ok(Category::Upcoming),
            "now_playing" => Ok(Category::NowPlaying),
            other => Err(anyhow::anyhow!(
                "unknown category '{}' (expected popular, top_rated, upcoming or now_playing)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MovieSummary {
    pub id: i32,
    #[serde(default, deserialize_with = "null_to_default")]
    pub title: String,
    pub poster_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Genre {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CrewMember {
    pub id: i32,
    pub name: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub job: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CastMember {
    pub id: i32,
    pub name: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub character: String,
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Credits {
    #[serde(default, deserialize_with = "null_to_default")]
    pub crew: Vec<CrewMember>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub cast: Vec<CastMember>,
}

// TMDB leaves plenty of these null for obscure titles.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MovieDetails {
    #[serde(default, deserialize_with = "null_to_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub overview: String,
    pub backdrop_path: Option<String>,
    pub poster_path: Option<String>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub release_date: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub vote_average: f64,
    #[serde(default, deserialize_with = "null_to_default")]
    pub genres: Vec<Genre>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub runtime: Option<u32>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub status: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub tagline: String,
    pub credits: Option<Credits>,
}

impl MovieDetails {
    pub fn director(&self) -> &str {
        self.credits
            .as_ref()
            .and_then(|c| c.crew.iter().find(|m| m.job == "Director"))
            .map(|m| m.name.as_str())
            .unwrap_or(UNKNOWN_DIRECTOR)
    }

    pub fn release_year(&self) -> Option<i32> {
        parse_release_date(&self.release_date).map(|d| d.year())
    }

    pub fn top_cast(&self, max: usize) -> &[CastMember] {
        match &self.credits {
            Some(c) => &c.cast[..c.cast.len().min(max)],
            None => &[],
        }
    }

    // A 200 with an empty body still deserializes.
    pub fn is_usable(&self) -> bool {
        !self.title.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Provider {
    pub provider_name: String,
    pub logo_path: Option<String>,
}

// `link` is the aggregate watch page, not specific to any provider.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProviderInfo {
    #[serde(default, deserialize_with = "null_to_default")]
    pub rent: Vec<Provider>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub buy: Vec<Provider>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub link: String,
}

impl ProviderInfo {
    pub fn first_rent(&self) -> Option<&Provider> {
        self.rent.first()
    }

    pub fn first_buy(&self) -> Option<&Provider> {
        self.buy.first()
    }
}

fn null_to_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub fn format_runtime(minutes: u32) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}

pub fn parse_release_date(date: &str) -> Option<NaiveDate> {
    date.trim().parse::<NaiveDate>().ok()
}

// 7/16/2010
pub fn format_release_date(date: &str) -> Option<String> {
    parse_release_date(date).map(|d| format!("{}/{}/{}", d.month(), d.day(), d.year()))
}
