//! In-memory page document.
//!
//! Renderers receive a `&mut Element` for the container they write into and
//! only ever append to it. Elements are found by their `id` attribute or, for
//! a few layout details, by class name.

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    /// Trusted markup owned by the layout (stylesheet, scripts). Never user data.
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    attrs: Vec<(String, String)>,
    style: Vec<(String, String)>,
    children: Vec<Node>,
}

const VOID_TAGS: &[&str] = &["meta", "link", "br", "img", "input"];

impl Element {
    pub fn new(tag: &str) -> Self {
        Element {
            tag: tag.to_string(),
            attrs: Vec::new(),
            style: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_id(tag: &str, id: &str) -> Self {
        Element::new(tag).attr("id", id)
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn class(self, class: &str) -> Self {
        self.attr("class", class)
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.children.push(Node::Text(text.to_string()));
        self
    }

    pub fn raw(mut self, markup: &str) -> Self {
        self.children.push(Node::Raw(markup.to_string()));
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.get_attr("id")
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attrs.push((name.to_string(), value.to_string())),
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.get_attr("class")
            .is_some_and(|c| c.split_whitespace().any(|c| c == class))
    }

    pub fn style(&self, property: &str) -> Option<&str> {
        self.style
            .iter()
            .find(|(k, _)| k == property)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_style(&mut self, property: &str, value: &str) {
        match self.style.iter_mut().find(|(k, _)| k == property) {
            Some((_, v)) => *v = value.to_string(),
            None => self.style.push((property.to_string(), value.to_string())),
        }
    }

    /// Replaces the children with a single text node.
    pub fn set_text(&mut self, text: &str) {
        self.children = vec![Node::Text(text.to_string())];
    }

    /// Appends `child` and hands it back for further filling.
    pub fn append(&mut self, child: Element) -> &mut Element {
        self.children.push(Node::Element(child));
        match self.children.last_mut() {
            Some(Node::Element(el)) => el,
            _ => unreachable!("element was just pushed"),
        }
    }

    pub fn children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(el) => Some(el),
            _ => None,
        })
    }

    /// Concatenated text of this element and its descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            match node {
                Node::Text(t) => out.push_str(t),
                Node::Element(el) => out.push_str(&el.text_content()),
                Node::Raw(_) => {}
            }
        }
        out
    }

    pub fn find(&self, pred: &dyn Fn(&Element) -> bool) -> Option<&Element> {
        if pred(self) {
            return Some(self);
        }
        self.children().find_map(|c| c.find(pred))
    }

    pub fn find_mut(&mut self, pred: &dyn Fn(&Element) -> bool) -> Option<&mut Element> {
        if pred(self) {
            return Some(self);
        }
        self.children.iter_mut().find_map(|n| match n {
            Node::Element(el) => el.find_mut(pred),
            _ => None,
        })
    }

    pub fn by_id(&self, id: &str) -> Option<&Element> {
        self.find(&|el| el.id() == Some(id))
    }

    pub fn by_id_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.find_mut(&|el| el.id() == Some(id))
    }

    pub fn by_class_mut(&mut self, class: &str) -> Option<&mut Element> {
        self.find_mut(&|el| el.has_class(class))
    }

    pub fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        for (k, v) in &self.attrs {
            out.push_str(&format!(" {}=\"{}\"", k, html_escape(v)));
        }
        if !self.style.is_empty() {
            let css: Vec<String> = self.style.iter().map(|(k, v)| format!("{k}: {v}")).collect();
            out.push_str(&format!(" style=\"{}\"", html_escape(&css.join("; "))));
        }
        out.push('>');
        if VOID_TAGS.contains(&self.tag.as_str()) {
            return;
        }
        for node in &self.children {
            match node {
                Node::Element(el) => el.write_html(out),
                Node::Text(t) => out.push_str(&html_escape(t)),
                Node::Raw(m) => out.push_str(m),
            }
        }
        out.push_str("</");
        out.push_str(&self.tag);
        out.push('>');
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }
}

/// Appends one `li` per item to `target`, filled in by `fill`.
///
/// Existing children of `target` are left alone; items are neither reordered
/// nor deduplicated.
pub fn render_list<T>(
    target: &mut Element,
    items: impl IntoIterator<Item = T>,
    mut fill: impl FnMut(&mut Element, T),
) {
    for item in items {
        let li = target.append(Element::new("li"));
        fill(li, item);
    }
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
