use crate::dom::Element;

/// The independently fetched sections of the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelKind {
    Static,
    Dynamic,
}

impl PanelKind {
    pub fn name(self) -> &'static str {
        match self {
            PanelKind::Static => "static",
            PanelKind::Dynamic => "dynamic",
        }
    }

    /// `id` of the panel's root element.
    pub fn id(self) -> &'static str {
        match self {
            PanelKind::Static => "static-panel",
            PanelKind::Dynamic => "dynamic-panel",
        }
    }

    /// The panel's containers, all empty.
    pub fn empty_root(self) -> Element {
        match self {
            PanelKind::Static => static_panel(),
            PanelKind::Dynamic => dynamic_panel(),
        }
    }
}

/// Closes what [`Document::open_html`] leaves open.
pub const CLOSE_HTML: &str = "<script>drawCharts(document);</script></body></html>";

/// The dashboard page: fixed markup with one subtree per panel.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub static_panel: Element,
    pub dynamic_panel: Element,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Document {
            static_panel: PanelKind::Static.empty_root(),
            dynamic_panel: PanelKind::Dynamic.empty_root(),
        }
    }

    pub fn panel(&self, kind: PanelKind) -> &Element {
        match kind {
            PanelKind::Static => &self.static_panel,
            PanelKind::Dynamic => &self.dynamic_panel,
        }
    }

    pub fn panel_mut(&mut self, kind: PanelKind) -> &mut Element {
        match kind {
            PanelKind::Static => &mut self.static_panel,
            PanelKind::Dynamic => &mut self.dynamic_panel,
        }
    }

    pub fn by_id(&self, id: &str) -> Option<&Element> {
        self.static_panel
            .by_id(id)
            .or_else(|| self.dynamic_panel.by_id(id))
    }

    /// Everything up to and including the panels as they are now. The body
    /// stays open so panel fragments can follow.
    pub fn open_html(&self) -> String {
        let head = Element::new("head")
            .child(Element::new("meta").attr("charset", "UTF-8"))
            .child(
                Element::new("meta")
                    .attr("name", "viewport")
                    .attr("content", "width=device-width, initial-scale=1.0"),
            )
            .child(Element::new("title").text("dnsmasq dashboard"))
            .child(Element::new("script").attr("src", CHART_JS_SRC))
            .child(Element::new("script").raw(PAGE_SCRIPT))
            .child(Element::new("style").raw(STYLE));

        let container = Element::new("div")
            .class("container")
            .child(Element::new("h1").text("dnsmasq dashboard"))
            .child(self.static_panel.clone())
            .child(self.dynamic_panel.clone());

        let mut out = String::from("<!DOCTYPE html>\n<html lang=\"en\">");
        head.write_html(&mut out);
        out.push_str("<body>");
        container.write_html(&mut out);
        out
    }

    /// Markup that replaces the empty `kind` panel already sent by
    /// [`Document::open_html`] with its current content.
    pub fn panel_fragment(&self, kind: PanelKind) -> String {
        let id = kind.id();
        format!(
            "<template id=\"{id}-rendered\">{}</template><script>swapPanel('{id}');</script>",
            self.panel(kind).to_html()
        )
    }
}

fn card(title: &str) -> Element {
    Element::new("div")
        .class("card")
        .child(Element::new("h2").text(title))
}

fn stat_list(id: &str) -> Element {
    Element::with_id("ul", id).class("stat-list")
}

fn static_panel() -> Element {
    Element::with_id("section", PanelKind::Static.id()).class("grid").child(
        card("Server")
            .child(Element::with_id("p", "version"))
            .child(
                Element::with_id("p", "cache-size")
                    .text("Cache size: ")
                    .child(Element::new("span")),
            )
            .child(Element::new("h3").text("Name servers"))
            .child(stat_list("nameservers")),
    )
}

fn dynamic_panel() -> Element {
    Element::with_id("section", PanelKind::Dynamic.id())
        .class("grid")
        .child(
            card("Requests").child(
                Element::with_id("div", "requests")
                    .child(Element::with_id("span", "request-text"))
                    .child(
                        Element::new("div")
                            .class("bar")
                            .child(Element::new("div").class("bg")),
                    ),
            ),
        )
        .child(
            card("Requests per hour").child(
                Element::new("div")
                    .class("chart-container")
                    .child(Element::with_id("canvas", "timeline")),
            ),
        )
        .child(card("Top domains").child(stat_list("domains")))
        .child(card("Top clients").child(stat_list("clients")))
        .child(card("Query types").child(stat_list("type")))
        .child(card("Unknown domains").child(stat_list("unknown")))
}

const CHART_JS_SRC: &str = "https://cdn.jsdelivr.net/npm/chart.js@4.4.0/dist/chart.umd.min.js";

const PAGE_SCRIPT: &str = r#"
function drawCharts(root) {
    root.querySelectorAll('canvas[data-chart]:not([data-drawn])').forEach(canvas => {
        canvas.dataset.drawn = '1';
        new Chart(canvas.getContext('2d'), JSON.parse(canvas.dataset.chart));
    });
}
function swapPanel(id) {
    const tpl = document.getElementById(id + '-rendered');
    document.getElementById(id).replaceWith(tpl.content.cloneNode(true));
    tpl.remove();
    drawCharts(document);
}
"#;

const STYLE: &str = r#"
* { margin: 0; padding: 0; box-sizing: border-box; }
body {
    font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
    background: #f0f2f8;
    padding: 20px;
}
.container { max-width: 1400px; margin: 0 auto; }
h1 { color: #333; font-size: 2rem; margin-bottom: 20px; }
.grid {
    display: grid;
    grid-template-columns: repeat(auto-fit, minmax(400px, 1fr));
    gap: 20px;
    margin-bottom: 20px;
}
.card {
    background: white;
    padding: 25px;
    border-radius: 12px;
    box-shadow: 0 10px 30px rgba(0,0,0,0.1);
}
.card h2 {
    font-size: 1.3rem;
    color: #333;
    border-bottom: 3px solid #667eea;
    padding-bottom: 10px;
    margin-bottom: 15px;
}
.chart-container { position: relative; height: 300px; }
.stat-list { list-style: none; max-height: 400px; overflow-y: auto; }
.stat-list li {
    display: flex;
    justify-content: space-between;
    padding: 10px;
    margin-bottom: 6px;
    background: #f8f9fa;
    border-left: 4px solid #667eea;
    border-radius: 6px;
}
.bar { height: 12px; margin-top: 10px; background: #e7e9fc; border-radius: 6px; overflow: hidden; }
.bar .bg { height: 100%; width: 0; background: #667eea; }
"#;
