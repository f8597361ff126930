use std::fs;

use anyhow::Result;
use murrelet::nav::{nav_links, render_nav, should_render_nav};
use murrelet::outline::Outline;
use murrelet::{InMemoryViewport, TocTracker, TrackerConfig};
use pulldown_cmark as md;
use tracing_subscriber::EnvFilter;

const POST: &str = r#"# Six months with a split keyboard

I switched to a split keyboard at the start of the year. This is the
long-term report.

## Overview

The board in question is a 58-key split with a column-staggered layout.
Everything below happened over six months of daily use.

## The learning curve

Typing speed fell off a cliff for the first two weeks.

### Week one { #week-one }

Twenty words a minute, on a good day. Muscle memory for `B` and `Y` turned
out to live entirely in the wrong hand.

### Regaining speed

By week six the numbers were back to normal, and the flat typing posture
started to feel like the default rather than the exception.

## Daily driving

Layers replace the number row, and a thumb cluster replaces the spacebar
region. The day-to-day surprise is how little the hands move.

## Verdict

Would I go back? No. The split went from experiment to the only keyboard
that feels right.
"#;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let body = render_markdown(POST);
    let (outline, body) = Outline::from_html(&body);

    let nav = if should_render_nav(&outline) {
        render_nav(&outline)?
    } else {
        String::new()
    };

    fs::create_dir_all("public")?;
    fs::write("public/index.html", page(&nav, &body))?;

    println!("Wrote public/index.html");
    println!();

    // The kind of session a browser host would deliver, scripted against the
    // in-memory host. RUST_LOG=murrelet=trace shows the tracker's decisions.
    let mut viewport = InMemoryViewport::new(900.0);
    for (position, heading) in outline.iter().enumerate() {
        viewport.insert_anchor(heading.id.clone(), 320.0 + 700.0 * position as f64);
    }

    let links = nav_links(&outline);
    let Some(mut tracker) = TocTracker::attach(&links, &mut viewport, TrackerConfig::default())
    else {
        println!("Nothing to track.");
        return Ok(());
    };

    println!("Reading session ({} sections):", links.len());
    if let Some(id) = tracker.active_id() {
        println!("  attached at the top, reading #{id}");
    }

    for offset in [500.0, 1100.0, 1900.0, 2700.0, 3400.0] {
        let entered = viewport.set_scroll(offset);
        tracker.on_intersections(&entered, &mut viewport);

        if let Some(id) = tracker.active_id() {
            println!("  scrolled to {offset:>6.0}, reading #{id}");
        }
    }

    if tracker.on_link_click("#overview", &mut viewport) {
        if let Some(target) = viewport.scroll_requests().last() {
            println!("  clicked #overview, host scrolling back to {target:.0}");
        }
    }

    tracker.detach(&mut viewport);

    Ok(())
}

fn render_markdown(text: &str) -> String {
    let mut options = md::Options::empty();
    options.insert(md::Options::ENABLE_TABLES);
    options.insert(md::Options::ENABLE_FOOTNOTES);
    options.insert(md::Options::ENABLE_STRIKETHROUGH);
    options.insert(md::Options::ENABLE_TASKLISTS);
    options.insert(md::Options::ENABLE_HEADING_ATTRIBUTES);

    let parser = md::Parser::new_ext(text, options);

    let mut html = String::new();
    md::html::push_html(&mut html, parser);

    html
}

fn page(nav: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Six months with a split keyboard</title>
</head>
<body>
<header class="site-header">murrelet demo</header>
{nav}
<main>
{body}</main>
</body>
</html>
"#
    )
}
