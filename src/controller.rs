use std::fmt;

use futures::{Stream, stream};
use tokio::task::JoinSet;

use crate::chart::{self, ChartSurface};
use crate::client::ApiClient;
use crate::dom::{Element, render_list};
use crate::error::RenderError;
use crate::layout::{CLOSE_HTML, Document, PanelKind};
use crate::model::{DynamicSnapshot, StaticInfo};
use crate::rank::{self, RankedEntry};
use crate::timeline;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelState {
    Unfetched,
    Loading,
    Rendered,
    Failed(String),
}

impl fmt::Display for PanelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PanelState::Unfetched => write!(f, "unfetched"),
            PanelState::Loading => write!(f, "loading"),
            PanelState::Rendered => write!(f, "rendered"),
            PanelState::Failed(e) => write!(f, "failed ({e})"),
        }
    }
}

/// A panel pipeline that has run to completion.
#[derive(Debug)]
struct PanelUpdate {
    kind: PanelKind,
    state: PanelState,
    root: Element,
}

impl PanelUpdate {
    fn finish(kind: PanelKind, root: Element, result: Result<(), RenderError>) -> Self {
        let state = match result {
            Ok(()) => PanelState::Rendered,
            Err(e) => {
                // Left unrendered; no retry and nothing shown on the page.
                tracing::error!(panel = kind.name(), error = %e, "panel failed");
                PanelState::Failed(e.to_string())
            }
        };
        tracing::debug!(panel = kind.name(), state = %state, "done");
        PanelUpdate { kind, state, root }
    }
}

/// One render pass in progress.
///
/// Both panel pipelines run as separate tasks. Each finished panel is taken
/// into the document on its own; a panel whose fetch never resolves stays
/// `Loading` without holding back the other one. Dropping the render aborts
/// whatever is still running.
pub struct PageRender {
    document: Document,
    static_state: PanelState,
    dynamic_state: PanelState,
    tasks: JoinSet<PanelUpdate>,
}

impl PageRender {
    fn new() -> Self {
        PageRender {
            document: Document::new(),
            static_state: PanelState::Unfetched,
            dynamic_state: PanelState::Unfetched,
            tasks: JoinSet::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn state(&self, kind: PanelKind) -> &PanelState {
        match kind {
            PanelKind::Static => &self.static_state,
            PanelKind::Dynamic => &self.dynamic_state,
        }
    }

    fn set_state(&mut self, kind: PanelKind, state: PanelState) {
        match kind {
            PanelKind::Static => self.static_state = state,
            PanelKind::Dynamic => self.dynamic_state = state,
        }
    }

    fn spawn<F>(&mut self, kind: PanelKind, pipeline: F)
    where
        F: Future<Output = PanelUpdate> + Send + 'static,
    {
        self.tasks.spawn(pipeline);
        self.set_state(kind, PanelState::Loading);
        tracing::debug!(panel = kind.name(), "loading");
    }

    /// Waits for the next panel to finish and applies it. Returns `None` once
    /// no panel is left running.
    pub async fn next(&mut self) -> Option<PanelKind> {
        loop {
            let update = match self.tasks.join_next().await? {
                Ok(update) => update,
                Err(e) => {
                    tracing::error!(error = %e, "panel task ended abnormally");
                    continue;
                }
            };

            if update.state == PanelState::Rendered {
                *self.document.panel_mut(update.kind) = update.root;
            }
            self.set_state(update.kind, update.state);
            return Some(update.kind);
        }
    }

    /// Fragment for the next panel that renders, skipping failed ones.
    async fn next_fragment(&mut self) -> Option<String> {
        while let Some(kind) = self.next().await {
            if self.state(kind) == &PanelState::Rendered {
                return Some(self.document.panel_fragment(kind));
            }
        }
        None
    }

    /// The page as HTML chunks: the shell with empty panels first, then one
    /// fragment per panel in the order they finish, then the closing markup.
    pub fn into_html(self) -> impl Stream<Item = String> + Send + 'static {
        stream::unfold(Some((self, true)), |step| async move {
            let (mut render, first) = step?;
            if first {
                let shell = render.document.open_html();
                return Some((shell, Some((render, false))));
            }
            match render.next_fragment().await {
                Some(fragment) => Some((fragment, Some((render, false)))),
                None => Some((CLOSE_HTML.to_string(), None)),
            }
        })
    }
}

#[derive(Clone)]
pub struct PageController {
    client: ApiClient,
    top_n: usize,
}

impl PageController {
    pub fn new(client: ApiClient, top_n: usize) -> Self {
        PageController { client, top_n }
    }

    /// Starts both panel fetches. Must be called inside a tokio runtime.
    pub fn start(&self) -> PageRender {
        let mut render = PageRender::new();
        render.spawn(PanelKind::Static, static_pipeline(self.client.clone()));
        render.spawn(
            PanelKind::Dynamic,
            dynamic_pipeline(self.client.clone(), self.top_n),
        );
        render
    }
}

async fn static_pipeline(client: ApiClient) -> PanelUpdate {
    let mut root = PanelKind::Static.empty_root();
    let result = fetch_static(&client, &mut root).await;
    PanelUpdate::finish(PanelKind::Static, root, result)
}

async fn fetch_static(client: &ApiClient, root: &mut Element) -> Result<(), RenderError> {
    let info = client.fetch_static().await?;
    render_static(root, &info)
}

async fn dynamic_pipeline(client: ApiClient, top_n: usize) -> PanelUpdate {
    let mut root = PanelKind::Dynamic.empty_root();
    let result = fetch_dynamic(&client, &mut root, top_n).await;
    PanelUpdate::finish(PanelKind::Dynamic, root, result)
}

async fn fetch_dynamic(
    client: &ApiClient,
    root: &mut Element,
    top_n: usize,
) -> Result<(), RenderError> {
    let snapshot = client.fetch_dynamic().await?;
    tracing::info!(
        hits = snapshot.num_hits,
        total = snapshot.num_total,
        buckets = snapshot.lookup_timeline.len(),
        "dynamic snapshot received"
    );
    render_dynamic(root, snapshot, top_n)
}

fn target<'a>(root: &'a mut Element, id: &'static str) -> Result<&'a mut Element, RenderError> {
    root.by_id_mut(id).ok_or(RenderError::MissingTarget(id))
}

fn ranked_item(li: &mut Element, entry: RankedEntry) {
    li.append(Element::new("span")).set_text(&entry.label);
    li.append(Element::new("span")).set_text(&entry.count.to_string());
}

pub fn render_static(root: &mut Element, info: &StaticInfo) -> Result<(), RenderError> {
    target(root, "version")?.set_text(&format!("Version: {}", info.version));

    target(root, "cache-size")?
        .find_mut(&|el| el.tag == "span")
        .ok_or(RenderError::MissingTarget("cache-size > span"))?
        .set_text(&info.cache_size.to_string());

    render_list(target(root, "nameservers")?, &info.name_servers, |li, server| {
        li.set_text(server)
    });
    Ok(())
}

pub fn render_dynamic(
    root: &mut Element,
    snapshot: DynamicSnapshot,
    top_n: usize,
) -> Result<(), RenderError> {
    let requests = target(root, "requests")?;
    target(requests, "request-text")?.set_text(&format!(
        "hits: {} of {}",
        snapshot.num_hits, snapshot.num_total
    ));
    requests
        .by_class_mut("bg")
        .ok_or(RenderError::MissingTarget("requests .bg"))?
        .set_style("width", &format!("{}%", snapshot.cache_percent()));

    render_list(
        target(root, "domains")?,
        rank::top_n(&snapshot.top_query_domains, top_n),
        ranked_item,
    );
    render_list(
        target(root, "clients")?,
        rank::top_n(&snapshot.top_query_sources, top_n),
        ranked_item,
    );
    render_list(
        target(root, "type")?,
        rank::rank(&snapshot.top_query_types),
        ranked_item,
    );
    render_list(
        target(root, "unknown")?,
        rank::rank(&snapshot.unknown_domains),
        ranked_item,
    );

    let timeline = timeline::normalize(snapshot.lookup_timeline);
    let config = chart::timeline_chart(&timeline);
    target(root, "timeline")?.draw(&config)?;
    Ok(())
}
