//! Per-frame rendering: header line plus blame-annotated source context.
//!
//! Both projections come out of one pass so the terminal transcript and the
//! HTML always show the same lines in the same order.

use std::ops::RangeInclusive;

use crate::error::{AppError, Result};
use crate::hg::BlameSource;
use crate::models::{BlameTarget, StackFrame};
use crate::report::freshness::{age_stars, line_color, Freshness};
use crate::report::html::{html_escape, html_link};
use crate::report::Section;

pub const DEFAULT_CONTEXT_LINES: usize = 5;

const CODE_SEARCH_BASE: &str = "https://mxr.mozilla.org";
const HG_WEB_BASE: &str = "https://hg.mozilla.org";

/// Width of the revision column; mozilla-central has six-digit revisions.
const REV_DIGITS: usize = 6;
const AUTHOR_WIDTH: usize = 12;

/// Lines `[line - radius, line + radius]` clamped to `1..=file_len`.
/// Empty when the target lies past the end of the file.
pub fn context_window(line: usize, radius: usize, file_len: usize) -> RangeInclusive<usize> {
    let first = line.saturating_sub(radius).max(1);
    let last = line.saturating_add(radius).min(file_len);
    first..=last
}

fn search_url(repository: &str, function_name: &str) -> Option<String> {
    let name = function_name.split('(').next().unwrap_or(function_name);
    reqwest::Url::parse_with_params(
        &format!("{}/{}/search", CODE_SEARCH_BASE, repository),
        &[("string", name)],
    )
    .ok()
    .map(|url| url.to_string())
}

pub struct ContextRenderer<'a> {
    blame: BlameSource<'a>,
    freshness: Freshness,
    context_lines: usize,
}

impl<'a> ContextRenderer<'a> {
    pub fn new(blame: BlameSource<'a>, freshness: Freshness, context_lines: usize) -> Self {
        Self {
            blame,
            freshness,
            context_lines,
        }
    }

    pub fn blame_source(&self) -> &BlameSource<'a> {
        &self.blame
    }

    /// Header for every frame, context only for blamable ones.
    ///
    /// A failed `hg blame` only costs this frame its context; a missing
    /// checkout still aborts the run.
    pub fn render_frame(&mut self, frame: &StackFrame) -> Result<Section> {
        tracing::debug!("frame {}: {}", frame.frame_index, frame.function_name);
        let mut section = render_header(frame);

        let Some(target) = frame.blame_target() else {
            if frame.is_generated_header() {
                tracing::debug!("not blaming generated header {:?}", frame.source_file);
            }
            return Ok(section);
        };

        match self.render_context(&target) {
            Ok(context) => section.append(context),
            Err(AppError::BlameRetrieval { reason, .. }) => {
                tracing::warn!(
                    "no blame for {} @ {}: {}",
                    target.source_file,
                    target.changeset_id,
                    reason
                );
                section.append(Section {
                    text: format!("(blame unavailable: {})\n", reason),
                    html: format!(
                        "<div class=\"line unavailable\">blame unavailable: {}</div>\n",
                        html_escape(&reason)
                    ),
                });
            }
            Err(e) => return Err(e),
        }

        Ok(section)
    }

    pub fn render_context(&mut self, target: &BlameTarget<'_>) -> Result<Section> {
        let lines = self.blame.get_blame(target)?;
        let mut section = Section::default();

        for line_number in context_window(target.line_number, self.context_lines, lines.len()) {
            let blame = &lines[line_number - 1];
            let score = self.freshness.score(blame.commit_date);
            let date = blame.commit_date.format("%Y-%m-%d").to_string();
            let user_and_rev = format!(
                "{:>aw$}@{:<rw$}",
                blame.author_name,
                blame.revision_number,
                aw = AUTHOR_WIDTH,
                rw = REV_DIGITS
            );

            let diff_url = format!(
                "{}/{}/diff/{}/{}",
                HG_WEB_BASE, target.repository_name, blame.changeset_id, target.source_file
            );
            let annotate_url = format!(
                "{}/{}/annotate/{}/{}#l{}",
                HG_WEB_BASE,
                target.repository_name,
                target.changeset_id,
                target.source_file,
                line_number
            );
            let class = if line_number == target.line_number {
                "line target"
            } else {
                "line"
            };

            section.html.push_str(&format!(
                "<div class=\"{}\" style=\"background: {}; color: black;\">{} {} {}</div>\n",
                class,
                line_color(score),
                html_link(
                    &diff_url,
                    &html_escape(&user_and_rev),
                    Some("fileDiff"),
                    Some(&format!("Committed {}", date)),
                ),
                html_link(&annotate_url, &format!("{:>5}", line_number), Some("lineBlame"), None),
                html_escape(&blame.source_text)
            ));
            section.text.push_str(&format!(
                "{} {} [{}] {}\n",
                age_stars(score),
                user_and_rev,
                date,
                blame.source_text
            ));
        }

        Ok(section)
    }
}

fn render_header(frame: &StackFrame) -> Section {
    let module_prefix = frame
        .module_name
        .as_deref()
        .map(|m| format!("{} ! ", m))
        .unwrap_or_default();
    let function = &frame.function_name;

    let mut text = format!("\n{}{}", module_prefix, function);
    let mut html = format!("\n<h3>{}", html_escape(&module_prefix));

    let Some(repository) = frame.repository_name.as_deref() else {
        text.push_str(" (unknown repo)\n");
        html.push_str(&format!("{} (unknown repo)</h3>\n\n", html_escape(function)));
        return Section { text, html };
    };

    if function.is_empty() {
        html.push_str("(unknown function)");
    } else {
        match search_url(repository, function) {
            Some(url) => html.push_str(&html_link(&url, &html_escape(function), Some("mxrSearch"), None)),
            None => html.push_str(&html_escape(function)),
        }
    }

    let line = frame
        .line_number
        .map(|l| l.to_string())
        .unwrap_or_else(|| "?".to_string());

    match frame.source_file.as_deref().filter(|f| !f.is_empty()) {
        Some(file) => {
            let source_url = format!("{}/{}/source/{}#{}", CODE_SEARCH_BASE, repository, file, line);
            html.push_str(&format!(
                " ({})</h3>\n\n",
                html_link(
                    &source_url,
                    &html_escape(&format!("{}:{}", file, line)),
                    Some("mxrLine"),
                    None
                )
            ));
            text.push_str(&format!(
                " ({}:{} @ {})\n\n",
                file,
                line,
                frame.changeset_id.as_deref().unwrap_or("?")
            ));
        }
        None => {
            text.push_str(&format!(" (unknown.file:{})\n", line));
            html.push_str(&format!(" (unknown.file:{})</h3>\n\n", line));
        }
    }

    Section { text, html }
}
