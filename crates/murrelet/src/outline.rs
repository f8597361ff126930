use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

use derive_more::{Deref, DerefMut};
use regex::Regex;
use slug::slugify;
use tracing::trace;

static HEADING_TAG_REGEX: OnceLock<Regex> = OnceLock::new();

fn heading_tag_regex() -> &'static Regex {
    HEADING_TAG_REGEX.get_or_init(|| {
        Regex::new(r"<h([23])(\s[^>]*)?>").expect("failed to compile regex for heading tags")
    })
}

static ID_ATTR_REGEX: OnceLock<Regex> = OnceLock::new();

fn id_attr_regex() -> &'static Regex {
    ID_ATTR_REGEX.get_or_init(|| {
        Regex::new(r#"\sid="([^"]*)""#).expect("failed to compile regex for id attributes")
    })
}

static INLINE_MARKUP_REGEX: OnceLock<Regex> = OnceLock::new();

fn inline_markup_regex() -> &'static Regex {
    INLINE_MARKUP_REGEX.get_or_init(|| {
        Regex::new(r"<[^>]+>").expect("failed to compile regex for inline markup")
    })
}

/// The identifier of a heading anchor, page-unique within a rendered page.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone)]
pub struct HeadingId(pub String);

impl HeadingId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HeadingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for HeadingId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A section heading harvested from a rendered page.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Heading {
    pub level: u8,
    pub id: HeadingId,
    pub text: String,
}

/// The `<h2>`/`<h3>` headings of a page, in document order.
#[derive(Default, Deref, DerefMut)]
pub struct Outline(Vec<Heading>);

impl Outline {
    /// Harvests the outline from rendered HTML and returns it alongside a
    /// copy of the HTML in which every harvested heading carries its id.
    ///
    /// A heading's explicit `id` attribute is reused; headings without one
    /// get an id derived from their text. Ids are kept page-unique: a repeat
    /// of an earlier id, explicit or derived, gets a numeric suffix and the
    /// tag is rewritten to carry it. Headings of other levels, and heading
    /// tags with no matching close tag, pass through untouched.
    pub fn from_html(html: &str) -> (Self, String) {
        let mut headings = Vec::new();
        let mut used_ids = HashSet::new();
        let mut output = String::with_capacity(html.len() + 64);
        let mut last_end = 0;
        let mut consumed = 0;

        for captures in heading_tag_regex().captures_iter(html) {
            let open = captures.get(0).unwrap();

            // A match inside the previous heading's body is markup noise.
            if open.start() < consumed {
                continue;
            }

            let level: u8 = match captures.get(1).unwrap().as_str() {
                "2" => 2,
                _ => 3,
            };
            let attrs = captures.get(2).map_or("", |m| m.as_str());

            let close_tag = if level == 2 { "</h2>" } else { "</h3>" };
            let Some(inner_len) = html[open.end()..].find(close_tag) else {
                trace!("skipping unterminated <h{level}> at byte {}", open.start());
                continue;
            };

            let inner = &html[open.end()..open.end() + inner_len];
            let text = inline_markup_regex()
                .replace_all(inner, "")
                .trim()
                .to_string();

            let explicit_id = id_attr_regex()
                .captures(attrs)
                .map(|captures| captures.get(1).unwrap().as_str())
                .filter(|id| !id.is_empty());

            output.push_str(&html[last_end..open.start()]);

            let id = match explicit_id {
                Some(explicit_id) => {
                    let id = unique_id(explicit_id.to_string(), &mut used_ids);
                    if id.as_str() == explicit_id {
                        output.push_str(open.as_str());
                    } else {
                        let attrs = id_attr_regex().replace(attrs, "");
                        output.push_str(&format!("<h{level} id=\"{id}\"{attrs}>"));
                    }
                    id
                }
                None => {
                    let id = derived_id(&text, headings.len() + 1, &mut used_ids);
                    // Strips a present-but-empty id attribute, which would
                    // otherwise sit next to the injected one.
                    let attrs = id_attr_regex().replace(attrs, "");
                    output.push_str(&format!("<h{level} id=\"{id}\"{attrs}>"));
                    id
                }
            };

            last_end = open.end();
            consumed = open.end() + inner_len + close_tag.len();

            headings.push(Heading { level, id, text });
        }

        output.push_str(&html[last_end..]);

        (Self(headings), output)
    }
}

fn derived_id(text: &str, position: usize, used_ids: &mut HashSet<String>) -> HeadingId {
    let base = slugify(text);
    let base = if base.is_empty() {
        format!("section-{position}")
    } else {
        base
    };

    unique_id(base, used_ids)
}

fn unique_id(base: String, used_ids: &mut HashSet<String>) -> HeadingId {
    let mut id = base.clone();
    let mut suffix = 2;
    while !used_ids.insert(id.clone()) {
        id = format!("{base}-{suffix}");
        suffix += 1;
    }

    HeadingId(id)
}
