//! TMDB image URLs: `{base}/{size}{path}`, where `path` is the fragment the
//! API hands back (it already starts with `/`).

pub const POSTER_SIZE: &str = "w500";
pub const LOGO_SIZE: &str = "w45";
pub const PROFILE_SIZE: &str = "w200";
pub const BACKDROP_SIZE: &str = "original";

pub fn image_url(base: &str, size: &str, path: Option<&str>) -> Option<String> {
    let path = path.map(str::trim).filter(|p| !p.is_empty())?;
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        Some(format!("{base}/{size}{path}"))
    } else {
        Some(format!("{base}/{size}/{path}"))
    }
}
