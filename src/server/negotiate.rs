//! Accept-header content negotiation and body rendering.
//!
//! The diagnostics snapshot can be rendered as json (the default), html,
//! plain text or xml. The `Accept` header is parsed with q-factors; the
//! highest-q recognized type wins, first entry winning ties. Keys are sorted
//! so output is deterministic.

use bytes::Bytes;
use std::collections::HashMap;

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_XML: &str = "application/xml";
pub const CONTENT_TYPE_HTML: &str = "text/html";
pub const CONTENT_TYPE_PLAIN: &str = "text/plain";

/// Advertised in the `Accept` response header.
pub const ACCEPTED_CONTENT_TYPES: &str = "text/html,text/plain,application/json";

/// Pick a content type from the `Accept` header and render the payload.
pub fn negotiate(accept: Option<&str>, payload: &HashMap<String, String>) -> (&'static str, Bytes) {
    match preferred_type(accept.unwrap_or_default()) {
        t if t.contains(CONTENT_TYPE_HTML) => (CONTENT_TYPE_HTML, render_html(payload)),
        t if t.contains(CONTENT_TYPE_PLAIN) => (CONTENT_TYPE_PLAIN, render_plain(payload)),
        t if t.contains(CONTENT_TYPE_XML) => (CONTENT_TYPE_XML, render_xml(payload)),
        _ => (CONTENT_TYPE_JSON, render_json(payload)),
    }
}

/// Highest-q entry of an `Accept` header. Malformed or out-of-range q values
/// count as 0; ties keep the earlier entry.
fn preferred_type(accept: &str) -> String {
    let mut preferred = String::new();
    let mut max_q = 0.0f32;

    for entry in accept.split(',') {
        let mut q = 0.0f32;
        for part in entry.split(';') {
            let part = part.trim();
            if let Some(value) = part.strip_prefix("q=").or_else(|| part.strip_prefix("Q=")) {
                q = value.parse().unwrap_or(0.0);
                if !(0.0..=1.0).contains(&q) {
                    q = 0.0;
                }
            }
        }

        if preferred.is_empty() || q > max_q {
            max_q = q;
            preferred = entry.to_string();
        }
    }

    preferred
}

fn sorted(payload: &HashMap<String, String>) -> Vec<(&str, &str)> {
    let mut entries: Vec<(&str, &str)> = payload
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    entries.sort_unstable();
    entries
}

fn render_json(payload: &HashMap<String, String>) -> Bytes {
    let ordered: std::collections::BTreeMap<&str, &str> = payload
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    Bytes::from(serde_json::to_vec(&ordered).unwrap_or_default())
}

fn render_html(payload: &HashMap<String, String>) -> Bytes {
    let mut out = String::from("<table><tbody>");
    for (key, value) in sorted(payload) {
        out.push_str("<tr><th>");
        out.push_str(key);
        out.push_str("</th><td>");
        out.push_str(value);
        out.push_str("</td></tr>");
    }
    out.push_str("</tbody></table>");
    Bytes::from(out)
}

fn render_plain(payload: &HashMap<String, String>) -> Bytes {
    let mut out = String::new();
    for (key, value) in sorted(payload) {
        out.push_str(key);
        out.push_str(": ");
        out.push_str(value);
        out.push_str(" | ");
    }
    Bytes::from(out)
}

fn render_xml(payload: &HashMap<String, String>) -> Bytes {
    let mut out = String::from("<statuses>");
    for (key, value) in sorted(payload) {
        out.push_str("<status name=\"");
        out.push_str(key);
        out.push_str("\" value=\"");
        out.push_str(value);
        out.push_str("\"></status>");
    }
    out.push_str("</statuses>");
    Bytes::from(out)
}
