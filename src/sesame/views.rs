//! HTML views.
//!
//! A template is plain HTML with `{{ key }}` placeholders. Templates are
//! compiled once at startup; values are HTML escaped at render time and
//! missing keys render as nothing.

use anyhow::{anyhow, Context, Result};
use std::{collections::HashMap, fmt, fs, path::Path};
use tracing::debug;

/// Every page the service can render.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum View {
    Index,
    Login,
    Protected,
}

impl View {
    pub const ALL: [Self; 3] = [Self::Index, Self::Login, Self::Protected];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::Login => "login",
            Self::Protected => "protected",
        }
    }

    fn embedded_source(self) -> &'static str {
        match self {
            Self::Index => include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/views/index.html")),
            Self::Login => include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/views/login.html")),
            Self::Protected => {
                include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/views/protected.html"))
            }
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Flat key/value data handed to a template.
pub type ViewContext = HashMap<&'static str, String>;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Text(String),
    Var(String),
}

#[derive(Clone, Debug)]
struct Template {
    segments: Vec<Segment>,
}

impl Template {
    fn compile(source: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut rest = source;

        while let Some(start) = rest.find("{{") {
            if start > 0 {
                segments.push(Segment::Text(rest[..start].to_string()));
            }
            let after = &rest[start + 2..];
            let end = after
                .find("}}")
                .ok_or_else(|| anyhow!("unterminated placeholder"))?;
            let key = after[..end].trim();
            if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(anyhow!("invalid placeholder name: {key:?}"));
            }
            segments.push(Segment::Var(key.to_string()));
            rest = &after[end + 2..];
        }

        if !rest.is_empty() {
            segments.push(Segment::Text(rest.to_string()));
        }

        Ok(Self { segments })
    }

    fn render(&self, context: &ViewContext) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Var(key) => {
                    if let Some(value) = context.get(key.as_str()) {
                        push_escaped(&mut out, value);
                    }
                }
            }
        }
        out
    }
}

fn push_escaped(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
}

/// The compiled set of views.
#[derive(Clone, Debug)]
pub struct Views {
    templates: HashMap<View, Template>,
}

impl Views {
    /// Templates compiled into the binary.
    ///
    /// # Errors
    /// Returns an error if a bundled template is malformed.
    pub fn embedded() -> Result<Self> {
        let mut templates = HashMap::new();
        for view in View::ALL {
            let template = Template::compile(view.embedded_source())
                .with_context(|| format!("invalid embedded template: {view}"))?;
            templates.insert(view, template);
        }
        Ok(Self { templates })
    }

    /// Load `<dir>/<view>.html` for every view.
    ///
    /// # Errors
    /// Returns an error if any view is missing or malformed; the server must
    /// not start with an incomplete set.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut templates = HashMap::new();
        for view in View::ALL {
            let path = dir.join(format!("{}.html", view.name()));
            let source = fs::read_to_string(&path)
                .with_context(|| format!("failed to read template: {}", path.display()))?;
            let template = Template::compile(&source)
                .with_context(|| format!("invalid template: {}", path.display()))?;
            debug!("loaded template {}", path.display());
            templates.insert(view, template);
        }
        Ok(Self { templates })
    }

    /// Render a view. Every [`View`] has a template, so this cannot fail.
    #[must_use]
    pub fn render(&self, view: View, context: &ViewContext) -> String {
        self.templates
            .get(&view)
            .map(|template| template.render(context))
            .unwrap_or_default()
    }
}
