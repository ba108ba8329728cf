//! Field-level HTML heuristics built on `scraper`.
//!
//! Each function looks at one aspect of a parsed page (title, body, bylines,
//! metadata) and returns a normalized value. Relative URLs are resolved
//! against the page URL.

use crate::utils::collapse_whitespace;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use url::Url;

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap()
}

static SEL_OG_TITLE: Lazy<Selector> = Lazy::new(|| selector("meta[property='og:title']"));
static SEL_TITLE: Lazy<Selector> = Lazy::new(|| selector("title"));
static SEL_H1: Lazy<Selector> = Lazy::new(|| selector("h1"));
static SEL_P: Lazy<Selector> = Lazy::new(|| selector("p"));
static SEL_JSON_LD: Lazy<Selector> =
    Lazy::new(|| selector("script[type='application/ld+json']"));
static SEL_META_AUTHOR: Lazy<Selector> = Lazy::new(|| {
    selector("meta[name='author'], meta[property='article:author'], meta[name='byl']")
});
static SEL_LINK_AUTHOR: Lazy<Selector> = Lazy::new(|| selector("a[rel='author'], [itemprop='author']"));
static SEL_DATE_META: Lazy<Selector> = Lazy::new(|| {
    selector(
        "meta[property='article:published_time'], meta[name='pubdate'], \
         meta[name='publishdate'], meta[name='date'], meta[itemprop='datePublished']",
    )
});
static SEL_TIME: Lazy<Selector> = Lazy::new(|| selector("time[datetime]"));
static SEL_TOP_IMAGE: Lazy<Selector> = Lazy::new(|| {
    selector(
        "meta[property='og:image'], meta[name='twitter:image'], meta[property='twitter:image']",
    )
});
static SEL_IMAGE_SRC: Lazy<Selector> = Lazy::new(|| selector("link[rel='image_src']"));
static SEL_IMG: Lazy<Selector> = Lazy::new(|| selector("img"));
static SEL_DESCRIPTION: Lazy<Selector> = Lazy::new(|| selector("meta[name='description']"));
static SEL_OG_DESCRIPTION: Lazy<Selector> =
    Lazy::new(|| selector("meta[property='og:description']"));
static SEL_HTML: Lazy<Selector> = Lazy::new(|| selector("html[lang]"));
static SEL_CONTENT_LANGUAGE: Lazy<Selector> =
    Lazy::new(|| selector("meta[http-equiv='content-language']"));
static SEL_KEYWORDS: Lazy<Selector> = Lazy::new(|| selector("meta[name='keywords']"));
static SEL_CANONICAL: Lazy<Selector> = Lazy::new(|| selector("link[rel='canonical']"));
static SEL_OG_URL: Lazy<Selector> = Lazy::new(|| selector("meta[property='og:url']"));
static SEL_FAVICON: Lazy<Selector> = Lazy::new(|| selector("link[rel~='icon']"));
static SEL_EMBED: Lazy<Selector> = Lazy::new(|| selector("iframe[src], embed[src]"));
static SEL_VIDEO: Lazy<Selector> = Lazy::new(|| selector("video[src], video source[src]"));

/// Content regions tried in order before falling back to every `<p>`.
static CONTENT_REGIONS: Lazy<Vec<Selector>> = Lazy::new(|| {
    ["article", "[itemprop='articleBody']", "main", "[role='main']"]
        .into_iter()
        .map(selector)
        .collect()
});

const TITLE_SEPARATORS: &[&str] = &[" | ", " - ", " – ", " — ", " :: "];
const VIDEO_HOSTS: &[&str] = &["youtube.com", "youtu.be", "vimeo.com", "dailymotion.com"];

fn element_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}

fn first_attr(doc: &Html, sel: &Selector, attr: &str) -> Option<String> {
    doc.select(sel)
        .filter_map(|el| el.value().attr(attr))
        .map(collapse_whitespace)
        .find(|v| !v.is_empty())
}

fn resolve(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with("data:") {
        return None;
    }
    base.join(href).ok().map(|u| u.to_string())
}

/// Every top-level JSON-LD node, with `@graph` containers and arrays flattened.
fn json_ld_nodes(doc: &Html) -> Vec<Value> {
    let mut nodes = Vec::new();
    for script in doc.select(&SEL_JSON_LD) {
        let raw = script.text().collect::<String>();
        let Ok(json) = serde_json::from_str::<Value>(raw.trim()) else {
            continue;
        };
        let roots = match json {
            Value::Array(items) => items,
            other => vec![other],
        };
        for root in roots {
            if let Some(Value::Array(graph)) = root.get("@graph") {
                nodes.extend(graph.iter().cloned());
            }
            nodes.push(root);
        }
    }
    nodes
}

/// Headline: `og:title`, then `<title>` without its site suffix, then `<h1>`.
pub fn title(doc: &Html) -> String {
    if let Some(t) = first_attr(doc, &SEL_OG_TITLE, "content") {
        return t;
    }
    if let Some(t) = doc.select(&SEL_TITLE).map(element_text).find(|t| !t.is_empty()) {
        return strip_site_suffix(&t);
    }
    doc.select(&SEL_H1)
        .map(element_text)
        .find(|t| !t.is_empty())
        .unwrap_or_default()
}

/// "Markets rally | Example News" -> "Markets rally". The longest segment
/// wins so titles that put the site name first are handled too.
fn strip_site_suffix(title: &str) -> String {
    let Some(sep) = TITLE_SEPARATORS.iter().find(|s| title.contains(*s)) else {
        return title.to_string();
    };
    title
        .split(sep)
        .map(str::trim)
        .max_by_key(|part| part.chars().count())
        .unwrap_or(title)
        .to_string()
}

fn paragraphs(root: ElementRef<'_>) -> Vec<String> {
    root.select(&SEL_P)
        .map(element_text)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Body text: paragraphs of the richest content region, joined by blank lines.
pub fn body_text(doc: &Html) -> String {
    for region in CONTENT_REGIONS.iter() {
        let best = doc
            .select(region)
            .map(paragraphs)
            .max_by_key(|ps| ps.iter().map(String::len).sum::<usize>());
        if let Some(ps) = best.filter(|ps| !ps.is_empty()) {
            return ps.join("\n\n");
        }
    }
    paragraphs(doc.root_element()).join("\n\n")
}

fn json_ld_author_names(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.push(s.clone()),
        Value::Array(items) => items.iter().for_each(|v| json_ld_author_names(v, out)),
        Value::Object(obj) => {
            if let Some(name) = obj.get("name").and_then(Value::as_str) {
                out.push(name.to_string());
            }
        }
        _ => {}
    }
}

fn clean_author(raw: &str) -> Vec<String> {
    let raw = collapse_whitespace(raw);
    let stripped = match raw.get(..3) {
        Some(prefix) if prefix.eq_ignore_ascii_case("by ") => &raw[3..],
        _ => raw.as_str(),
    };
    stripped
        .split(" and ")
        .flat_map(|part| part.split(", "))
        .map(|name| name.trim().trim_end_matches(',').trim().to_string())
        .filter(|name| !name.is_empty() && !name.starts_with("http"))
        .collect()
}

/// Bylines from JSON-LD, meta tags and `rel=author` links, de-duplicated in
/// discovery order.
pub fn authors(doc: &Html) -> Vec<String> {
    let mut raw = Vec::new();
    for node in json_ld_nodes(doc) {
        if let Some(author) = node.get("author") {
            json_ld_author_names(author, &mut raw);
        }
    }
    raw.extend(
        doc.select(&SEL_META_AUTHOR)
            .filter_map(|el| el.value().attr("content"))
            .map(str::to_string),
    );
    raw.extend(doc.select(&SEL_LINK_AUTHOR).map(|el| {
        el.value()
            .attr("content")
            .map(str::to_string)
            .unwrap_or_else(|| element_text(el))
    }));

    raw.iter()
        .flat_map(|a| clean_author(a))
        .unique_by(|a| a.to_lowercase())
        .collect()
}

/// Parse the date formats news sites commonly publish.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Publish timestamp from meta tags, JSON-LD or the first `<time datetime>`.
pub fn publish_date(doc: &Html) -> Option<DateTime<Utc>> {
    let from_meta = doc
        .select(&SEL_DATE_META)
        .filter_map(|el| el.value().attr("content"))
        .find_map(parse_date);
    if from_meta.is_some() {
        return from_meta;
    }
    let from_json_ld = json_ld_nodes(doc)
        .iter()
        .filter_map(|node| node.get("datePublished").and_then(Value::as_str))
        .find_map(parse_date);
    if from_json_ld.is_some() {
        return from_json_ld;
    }
    doc.select(&SEL_TIME)
        .filter_map(|el| el.value().attr("datetime"))
        .find_map(parse_date)
}

pub fn top_image(doc: &Html, base: &Url) -> Option<String> {
    doc.select(&SEL_TOP_IMAGE)
        .filter_map(|el| el.value().attr("content"))
        .chain(doc.select(&SEL_IMAGE_SRC).filter_map(|el| el.value().attr("href")))
        .find_map(|href| resolve(base, href))
}

/// Every `<img>` on the page, absolute and de-duplicated, `data:` URIs skipped.
pub fn images(doc: &Html, base: &Url) -> Vec<String> {
    doc.select(&SEL_IMG)
        .filter_map(|el| {
            el.value()
                .attr("src")
                .or_else(|| el.value().attr("data-src"))
        })
        .filter_map(|src| resolve(base, src))
        .unique()
        .collect()
}

pub fn meta_description(doc: &Html) -> Option<String> {
    first_attr(doc, &SEL_DESCRIPTION, "content")
        .or_else(|| first_attr(doc, &SEL_OG_DESCRIPTION, "content"))
}

/// Primary language subtag declared by the page, lowercased ("en-US" -> "en").
pub fn meta_lang(doc: &Html) -> Option<String> {
    first_attr(doc, &SEL_HTML, "lang")
        .or_else(|| first_attr(doc, &SEL_CONTENT_LANGUAGE, "content"))
        .and_then(|lang| {
            lang.split(['-', '_', ','])
                .next()
                .map(|primary| primary.trim().to_lowercase())
        })
        .filter(|lang| !lang.is_empty())
}

pub fn meta_keywords(doc: &Html) -> Vec<String> {
    first_attr(doc, &SEL_KEYWORDS, "content")
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .unique()
                .collect()
        })
        .unwrap_or_default()
}

pub fn canonical_link(doc: &Html, base: &Url) -> Option<String> {
    first_attr(doc, &SEL_CANONICAL, "href")
        .or_else(|| first_attr(doc, &SEL_OG_URL, "content"))
        .and_then(|href| resolve(base, &href))
}

pub fn favicon(doc: &Html, base: &Url) -> Option<String> {
    first_attr(doc, &SEL_FAVICON, "href").and_then(|href| resolve(base, &href))
}

/// Embedded videos: `<video>` sources plus iframes from known video hosts.
pub fn movies(doc: &Html, base: &Url) -> Vec<String> {
    let embeds = doc
        .select(&SEL_EMBED)
        .filter_map(|el| el.value().attr("src"))
        .filter_map(|src| resolve(base, src))
        .filter(|src| VIDEO_HOSTS.iter().any(|host| src.contains(host)));
    let videos = doc
        .select(&SEL_VIDEO)
        .filter_map(|el| el.value().attr("src"))
        .filter_map(|src| resolve(base, src));
    embeds.chain(videos).unique().collect()
}
