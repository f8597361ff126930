use std::fmt::{self, Write};

use crate::outline::Outline;

/// The minimum number of headings a page needs before a table of contents is
/// rendered for it.
pub const MIN_HEADINGS_FOR_NAV: usize = 3;

/// A link in the table-of-contents navigation list.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct NavLink {
    pub href: String,
    pub label: String,
}

impl NavLink {
    /// Returns the fragment this link targets within the current document,
    /// or `None` for links that navigate elsewhere.
    pub fn fragment(&self) -> Option<&str> {
        self.href
            .strip_prefix('#')
            .filter(|fragment| !fragment.is_empty())
    }
}

/// Returns one link per outline heading, in document order.
pub fn nav_links(outline: &Outline) -> Vec<NavLink> {
    outline
        .iter()
        .map(|heading| NavLink {
            href: format!("#{}", heading.id),
            label: heading.text.clone(),
        })
        .collect()
}

pub fn should_render_nav(outline: &Outline) -> bool {
    outline.len() >= MIN_HEADINGS_FOR_NAV
}

/// Renders the navigation list for an outline. An empty outline renders to
/// an empty string.
pub fn render_nav(outline: &Outline) -> Result<String, fmt::Error> {
    if outline.is_empty() {
        return Ok(String::new());
    }

    let mut html = String::new();

    writeln!(html, r#"<nav class="toc" aria-label="Table of contents">"#)?;
    writeln!(html, r#"<ul class="toc-list">"#)?;

    for heading in outline.iter() {
        let level_class = if heading.level == 2 {
            "toc-h2"
        } else {
            "toc-h3"
        };

        writeln!(
            html,
            r##"<li class="{level_class}"><a href="#{}">{}</a></li>"##,
            heading.id, heading.text
        )?;
    }

    writeln!(html, "</ul>")?;
    write!(html, "</nav>")?;

    Ok(html)
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::outline::{Heading, HeadingId};

    fn outline(headings: &[(u8, &str, &str)]) -> Outline {
        let mut outline = Outline::default();
        for (level, id, text) in headings {
            outline.push(Heading {
                level: *level,
                id: HeadingId::from(*id),
                text: text.to_string(),
            });
        }
        outline
    }

    #[test]
    fn test_nav_links_follow_document_order() {
        let outline = outline(&[
            (2, "overview", "Overview"),
            (3, "details", "Details"),
            (2, "closing", "Closing"),
        ]);

        assert_eq!(
            nav_links(&outline),
            vec![
                NavLink {
                    href: "#overview".to_string(),
                    label: "Overview".to_string(),
                },
                NavLink {
                    href: "#details".to_string(),
                    label: "Details".to_string(),
                },
                NavLink {
                    href: "#closing".to_string(),
                    label: "Closing".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_render_nav_markup() {
        let outline = outline(&[
            (2, "overview", "Overview"),
            (3, "details", "Details"),
            (2, "closing", "Closing"),
        ]);

        assert_eq!(
            render_nav(&outline).unwrap(),
            indoc! {r##"
                <nav class="toc" aria-label="Table of contents">
                <ul class="toc-list">
                <li class="toc-h2"><a href="#overview">Overview</a></li>
                <li class="toc-h3"><a href="#details">Details</a></li>
                <li class="toc-h2"><a href="#closing">Closing</a></li>
                </ul>
                </nav>"##}
        );
    }

    #[test]
    fn test_empty_outline_renders_nothing() {
        assert_eq!(render_nav(&Outline::default()).unwrap(), "");
    }

    #[test]
    fn test_nav_requires_three_headings() {
        let two = outline(&[(2, "a", "A"), (2, "b", "B")]);
        let three = outline(&[(2, "a", "A"), (2, "b", "B"), (3, "c", "C")]);

        assert!(!should_render_nav(&two));
        assert!(should_render_nav(&three));
    }

    #[test]
    fn test_fragment_extraction() {
        let same_document = NavLink {
            href: "#overview".to_string(),
            label: "Overview".to_string(),
        };
        let elsewhere = NavLink {
            href: "/posts/".to_string(),
            label: "Posts".to_string(),
        };
        let bare_hash = NavLink {
            href: "#".to_string(),
            label: "Top".to_string(),
        };

        assert_eq!(same_document.fragment(), Some("overview"));
        assert_eq!(elsewhere.fragment(), None);
        assert_eq!(bare_hash.fragment(), None);
    }
}
