//! Download URL templates.
//!
//! A template is a URL with placeholders for the pinned version and the
//! platform:
//!
//! ```text
//! https://example.com/releases/v{{.Version}}/foo-{{.Version}}-{{.GOOS}}-{{.GOARCH}}.tar.gz
//! ```
//!
//! | Placeholder                  | Value                     |
//! |------------------------------|---------------------------|
//! | `{{.Version}}`               | pinned version            |
//! | `{{.GOOS}}` / `{{.OS}}`      | OS, e.g. `linux`, `darwin` |
//! | `{{.GOARCH}}` / `{{.Arch}}`  | arch, e.g. `amd64`, `arm64` |
//!
//! Whitespace inside the braces is ignored and the leading dot is optional.

use crate::error::{Error, Result};
use crate::platform::Platform;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*\.?([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("valid placeholder regex")
});

/// A value that can be substituted into a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Pinned version.
    Version,
    /// Operating system identifier.
    Os,
    /// Architecture identifier.
    Arch,
}

impl Field {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "Version" | "version" => Some(Self::Version),
            "GOOS" | "OS" | "Os" | "os" => Some(Self::Os),
            "GOARCH" | "Arch" | "arch" => Some(Self::Arch),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Field(Field),
}

/// Values available to a template.
#[derive(Debug, Clone, Copy)]
pub struct TemplateData<'a> {
    /// Pinned version.
    pub version: &'a str,
    /// Target platform.
    pub platform: &'a Platform,
}

impl TemplateData<'_> {
    fn value(&self, field: Field) -> &str {
        match field {
            Field::Version => self.version,
            Field::Os => &self.platform.os,
            Field::Arch => &self.platform.arch,
        }
    }
}

/// A parsed URL template.
///
/// # Example
///
/// ```
/// use testbin::platform::Platform;
/// use testbin::template::{TemplateData, UrlTemplate};
///
/// let template = UrlTemplate::parse("https://dl.example.com/foo-{{.Version}}-{{.GOOS}}-{{.GOARCH}}.tar.gz")
///     .unwrap();
/// let platform = Platform::new("linux", "amd64");
/// let url = template.render(&TemplateData { version: "1.2.3", platform: &platform });
/// assert_eq!(url, "https://dl.example.com/foo-1.2.3-linux-amd64.tar.gz");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl UrlTemplate {
    /// Parse a template.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Template`] for unknown placeholders, unterminated
    /// `{{` and stray `}}`.
    pub fn parse(source: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut last = 0;

        for caps in PLACEHOLDER_RE.captures_iter(source) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            push_text(source, &source[last..whole.start()], &mut segments)?;

            let name = name.as_str();
            let field = Field::from_name(name)
                .ok_or_else(|| Error::template(source, format!("unknown field {name:?}")))?;
            segments.push(Segment::Field(field));
            last = whole.end();
        }
        push_text(source, &source[last..], &mut segments)?;

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// Template source text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the template references `field`.
    #[must_use]
    pub fn uses(&self, field: Field) -> bool {
        self.segments.contains(&Segment::Field(field))
    }

    /// Render the template.
    #[must_use]
    pub fn render(&self, data: &TemplateData<'_>) -> String {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Field(field) => out.push_str(data.value(*field)),
            }
        }
        out
    }
}

fn push_text(source: &str, text: &str, segments: &mut Vec<Segment>) -> Result<()> {
    if text.contains("{{") {
        return Err(Error::template(source, "unterminated or malformed \"{{\" action"));
    }
    if text.contains("}}") {
        return Err(Error::template(source, "unexpected \"}}\""));
    }
    if !text.is_empty() {
        segments.push(Segment::Text(text.to_string()));
    }
    Ok(())
}

impl fmt::Display for UrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
