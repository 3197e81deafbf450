use crate::detail::{Action, DetailRequests, DetailView, MovieDetailPage, Offer};
use crate::list::{ListKey, ListRequest, ListView, MovieList};
use crate::models::{Category, MovieDetails, MovieSummary, ProviderInfo};
use crate::render;
use crate::request::RequestTag;
use crate::tmdb::{parse_tmdb_id, TmdbApi, TmdbError};
use anyhow::{anyhow, bail, Result};
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    List { category: Category, page: u32 },
    Movie(i32),
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Home => f.write_str("home"),
            Route::List { category, page } => write!(f, "list {category} {page}"),
            Route::Movie(id) => write!(f, "movie {id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Go(Route),
    NextPage,
    PrevPage,
    Rent,
    Buy,
    Reload,
    Posters,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut parts = line.split_whitespace();
        let Some(head) = parts.next() else {
            bail!("empty command");
        };
        let cmd = match head.to_lowercase().as_str() {
            "home" => Command::Go(Route::Home),
            "list" => {
                let category = parts
                    .next()
                    .ok_or_else(|| anyhow!("usage: list <category> [page]"))?
                    .parse::<Category>()?;
                let page = match parts.next() {
                    Some(p) => p
                        .parse::<u32>()
                        .map_err(|_| anyhow!("page must be a positive number"))?,
                    None => 1,
                };
                Command::Go(Route::List {
                    category,
                    page: page.max(1),
                })
            }
            "movie" => {
                let raw = parts.next().ok_or_else(|| anyhow!("usage: movie <id>"))?;
                let id = parse_tmdb_id(raw)
                    .ok_or_else(|| anyhow!("'{}' is not a TMDB movie id", raw))?;
                Command::Go(Route::Movie(id))
            }
            "next" => Command::NextPage,
            "prev" => Command::PrevPage,
            "rent" => Command::Rent,
            "buy" => Command::Buy,
            "reload" => Command::Reload,
            "posters" => Command::Posters,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => bail!("unknown command '{}' (try 'help')", other),
        };
        Ok(cmd)
    }
}

pub const HELP: &str = "\
commands:
  home                      popular, top rated, upcoming and now playing rows
  list <category> [page]    one category, e.g. `list top_rated 2`
  next | prev               page through the current list
  movie <id>                detail page for a TMDB movie id
  rent | buy                open the watch link for the current movie
  posters                   poster URLs for the current list
  reload                    fetch the current page again
  quit
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListSlot {
    Home(usize),
    Browse,
}

#[derive(Debug)]
pub enum Completion {
    List {
        slot: ListSlot,
        tag: RequestTag,
        result: Result<Vec<MovieSummary>, TmdbError>,
    },
    Details {
        tag: RequestTag,
        result: Result<MovieDetails, TmdbError>,
    },
    Providers {
        tag: RequestTag,
        result: Result<ProviderInfo, TmdbError>,
    },
}

// Views only change when a completion is applied.
pub struct Browser {
    tmdb: Arc<dyn TmdbApi>,
    image_base: String,
    route: Option<Route>,
    home: Vec<MovieList>,
    browse: Option<MovieList>,
    detail: MovieDetailPage,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
}

impl Browser {
    pub fn new(tmdb: Arc<dyn TmdbApi>, image_base: impl Into<String>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tmdb,
            image_base: image_base.into(),
            route: None,
            home: Category::ALL.iter().map(|c| MovieList::for_category(*c)).collect(),
            browse: None,
            detail: MovieDetailPage::new(),
            tx,
            rx,
        }
    }

    pub fn detail(&self) -> &MovieDetailPage {
        &self.detail
    }

    pub fn navigate(&mut self, route: Route) {
        info!("Navigating to {}", route);
        self.route = Some(route);
        match route {
            Route::Home => {
                let pending: Vec<(usize, ListRequest)> = self
                    .home
                    .iter_mut()
                    .enumerate()
                    .filter_map(|(i, row)| row.ensure_loaded().map(|req| (i, req)))
                    .collect();
                for (i, req) in pending {
                    self.spawn_list(ListSlot::Home(i), req);
                }
            }
            Route::List { category, page } => {
                let key = ListKey { category, page };
                let req = if let Some(list) = self.browse.as_mut() {
                    if list.key().category != category {
                        list.set_heading(category.heading());
                    }
                    list.set_key(key)
                } else {
                    let mut list = MovieList::new(category, category.heading(), page);
                    let req = list.begin();
                    self.browse = Some(list);
                    Some(req)
                };
                if let Some(req) = req {
                    self.spawn_list(ListSlot::Browse, req);
                }
            }
            Route::Movie(id) => {
                if let Some(req) = self.detail.navigate(id) {
                    self.spawn_detail(req);
                }
            }
        }
    }

    // Fetches the current route again, even after a failure.
    pub fn reload(&mut self) {
        match self.route {
            Some(Route::Home) => {
                let pending: Vec<(usize, ListRequest)> = self
                    .home
                    .iter_mut()
                    .enumerate()
                    .map(|(i, row)| (i, row.begin()))
                    .collect();
                for (i, req) in pending {
                    self.spawn_list(ListSlot::Home(i), req);
                }
            }
            Some(Route::List { .. }) => {
                if let Some(req) = self.browse.as_mut().map(MovieList::begin) {
                    self.spawn_list(ListSlot::Browse, req);
                }
            }
            Some(Route::Movie(_)) => {
                if let Some(req) = self.detail.reload() {
                    self.spawn_detail(req);
                }
            }
            None => {}
        }
    }

    pub fn page_step(&mut self, forward: bool) -> Result<()> {
        let Some(Route::List { category, page }) = self.route else {
            bail!("paging only works on a list");
        };
        let page = if forward {
            page.saturating_add(1)
        } else {
            page.saturating_sub(1).max(1)
        };
        self.navigate(Route::List { category, page });
        Ok(())
    }

    fn spawn_list(&self, slot: ListSlot, req: ListRequest) {
        let tmdb = Arc::clone(&self.tmdb);
        self.spawn_fetch(
            "list",
            async move { tmdb.movie_list(req.key.category, req.key.page).await },
            move |result| Completion::List {
                slot,
                tag: req.tag,
                result,
            },
        );
    }

    // Two independent retrievals; they may complete in either order.
    fn spawn_detail(&self, req: DetailRequests) {
        let tmdb = Arc::clone(&self.tmdb);
        self.spawn_fetch(
            "details",
            async move { tmdb.movie_details(req.id).await },
            move |result| Completion::Details {
                tag: req.tag,
                result,
            },
        );

        let tmdb = Arc::clone(&self.tmdb);
        self.spawn_fetch(
            "providers",
            async move { tmdb.watch_providers(req.id).await },
            move |result| Completion::Providers {
                tag: req.tag,
                result,
            },
        );
    }

    // The fetch runs in its own task so a panic still settles the request.
    fn spawn_fetch<T, F, W>(&self, what: &'static str, fetch: F, wrap: W)
    where
        T: Send + 'static,
        F: Future<Output = Result<T, TmdbError>> + Send + 'static,
        W: FnOnce(Result<T, TmdbError>) -> Completion + Send + 'static,
    {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = match tokio::spawn(fetch).await {
                Ok(result) => result,
                Err(e) => {
                    warn!("{} fetch task failed: {}", what, e);
                    Err(TmdbError::Aborted(e.to_string()))
                }
            };
            if tx.send(wrap(result)).is_err() {
                debug!("Browser gone before {} completion was delivered", what);
            }
        });
    }

    // False when the completion was stale and dropped.
    pub fn apply(&mut self, completion: Completion) -> bool {
        match completion {
            Completion::List {
                slot: ListSlot::Home(i),
                tag,
                result,
            } => self
                .home
                .get_mut(i)
                .map(|row| row.settle(tag, result))
                .unwrap_or(false),
            Completion::List {
                slot: ListSlot::Browse,
                tag,
                result,
            } => self
                .browse
                .as_mut()
                .map(|list| list.settle(tag, result))
                .unwrap_or(false),
            Completion::Details { tag, result } => self.detail.settle_details(tag, result),
            Completion::Providers { tag, result } => self.detail.settle_providers(tag, result),
        }
    }

    pub async fn next_completion(&mut self) -> Option<bool> {
        let completion = self.rx.recv().await?;
        Some(self.apply(completion))
    }

    pub fn is_pending(&self) -> bool {
        match self.route {
            Some(Route::Home) => self.home.iter().any(|row| row.state().is_pending()),
            Some(Route::List { .. }) => self
                .browse
                .as_ref()
                .map(|l| l.state().is_pending())
                .unwrap_or(false),
            Some(Route::Movie(_)) => self.detail.is_pending(),
            None => false,
        }
    }

    pub async fn settle(&mut self) {
        while self.is_pending() {
            if self.next_completion().await.is_none() {
                break;
            }
        }
    }

    pub fn shows_failure(&self) -> bool {
        match self.route {
            Some(Route::Home) => self
                .home
                .iter()
                .all(|row| matches!(row.view(&self.image_base), ListView::Error)),
            Some(Route::List { .. }) => self
                .browse
                .as_ref()
                .map(|l| matches!(l.view(&self.image_base), ListView::Error))
                .unwrap_or(false),
            Some(Route::Movie(_)) => matches!(
                self.detail.view(&self.image_base),
                DetailView::NotFound | DetailView::Unavailable(_)
            ),
            None => false,
        }
    }

    pub fn activate(&self, offer: Offer) -> Option<Action> {
        match self.route {
            Some(Route::Movie(_)) => self.detail.activate(offer),
            _ => None,
        }
    }

    pub fn render(&self) -> String {
        match self.route {
            Some(Route::Home) => self
                .home
                .iter()
                .map(|row| render::render_list(&row.view(&self.image_base)))
                .collect::<Vec<_>>()
                .join("\n"),
            Some(Route::List { page, .. }) => match &self.browse {
                Some(list) => {
                    let view = list.view(&self.image_base);
                    let mut out = render::render_list(&view);
                    if matches!(view, ListView::Strip { .. }) {
                        out.push_str(&format!("page {page} (next / prev)\n"));
                    }
                    out
                }
                None => String::new(),
            },
            Some(Route::Movie(_)) => render::render_detail(&self.detail.view(&self.image_base)),
            None => String::new(),
        }
    }

    pub fn render_posters(&self) -> String {
        match (self.route, &self.browse) {
            (Some(Route::List { .. }), Some(list)) => {
                render::render_posters(&list.view(&self.image_base))
            }
            (Some(Route::Home), _) => self
                .home
                .iter()
                .map(|row| render::render_posters(&row.view(&self.image_base)))
                .collect(),
            _ => String::new(),
        }
    }
}

// User input and request completions share one task.
pub async fn run_shell(mut browser: Browser, start: Route) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_frame = String::new();

    browser.navigate(start);
    redraw(&browser, &mut last_frame, true);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(Command::Quit) => break,
                    Ok(command) => {
                        if let Err(e) = handle_command(&mut browser, command) {
                            println!("{e}");
                        }
                    }
                    Err(e) => println!("{e}"),
                }
                redraw(&browser, &mut last_frame, true);
            }
            applied = browser.next_completion() => {
                if applied == Some(true) {
                    redraw(&browser, &mut last_frame, false);
                }
            }
        }
    }
    info!("Leaving browser");
    Ok(())
}

fn handle_command(browser: &mut Browser, command: Command) -> Result<()> {
    match command {
        Command::Go(route) => browser.navigate(route),
        Command::NextPage => browser.page_step(true)?,
        Command::PrevPage => browser.page_step(false)?,
        Command::Reload => browser.reload(),
        Command::Rent | Command::Buy => {
            let offer = if command == Command::Rent {
                Offer::Rent
            } else {
                Offer::Buy
            };
            match browser.activate(offer) {
                Some(Action::OpenExternal(url)) => println!("Open in your browser: {url}"),
                None => println!("No {:?} offer for this page", offer),
            }
        }
        Command::Posters => print!("{}", browser.render_posters()),
        Command::Help => print!("{HELP}"),
        Command::Quit => {}
    }
    Ok(())
}

// After a user command the page is always reprinted so it stays under any
// output the command produced; completions only reprint on change.
fn redraw(browser: &Browser, last_frame: &mut String, force: bool) {
    if let Some(frame) = next_frame(browser.render(), last_frame, force) {
        println!("{frame}");
    }
}

fn next_frame(frame: String, last_frame: &mut String, force: bool) -> Option<String> {
    if frame.is_empty() || (!force && frame == *last_frame) {
        return None;
    }
    last_frame.clone_from(&frame);
    Some(frame)
}
