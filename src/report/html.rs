//! HTML helpers and the document shell.

pub const STYLESHEET: &str = r#"
  <style>
  body { font-family: sans-serif; }
  h2.otherthread { background: salmon; }
  .line { white-space: pre; font-family: monospace; }
  .line.target { font-weight: bold; }
  .line.unavailable { color: gray; font-style: italic; }
  .line > a { text-decoration: none; }
  .line > a:hover { text-decoration: underline; }
  .line > a.lineBlame { color: rgba(0, 0, 0, .2); }
  .line > a.fileDiff { color: rgba(0, 0, 255, .8) }
  </style>
"#;

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// `<a>` element; `text` is inserted as-is, the URL and title are escaped.
pub fn html_link(url: &str, text: &str, class: Option<&str>, title: Option<&str>) -> String {
    let class_attr = class
        .map(|c| format!(" class=\"{}\"", c))
        .unwrap_or_default();
    let title_attr = title
        .map(|t| format!(" title=\"{}\"", html_escape(t)))
        .unwrap_or_default();
    format!(
        "<a{}{} href=\"{}\">{}</a>",
        class_attr,
        title_attr,
        html_escape(url),
        text
    )
}

/// Full page: doctype, stylesheet, optional heading, then the body in order.
pub fn render_document(heading: Option<&str>, body: &str) -> String {
    format!(
        "<!DOCTYPE html><meta charset=\"utf-8\"><title>Stack Blame</title>{}{}{}",
        STYLESHEET,
        heading.unwrap_or(""),
        body
    )
}
