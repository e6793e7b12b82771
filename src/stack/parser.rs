//! Stack dump parsing.
//!
//! Two line grammars are recognized, per line:
//!
//! ```text
//! 0|0|XUL|_cairo_image_surface_assume_ownership_of_data|hg:hg.mozilla.org/mozilla-central:gfx/cairo/cairo/src/cairo-image-surface.c:a42e9b001bc8|812|0x0
//! #1  0x0000000104ae1111 in str_localeCompare (cx=0x10bde7fb0, argc=0, vp=0x111a3a0a0) at /Users/jruderman/trees/mozilla-central/js/src/jsstr.cpp:779
//! ```
//!
//! The first is `minidump_stackwalk -m` output, the second gdb `bt`.
//! Anything else is ignored.

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{AppError, Result};
use crate::hg::Vcs;
use crate::models::{FrameFormat, StackFrame};

/// Location tokens pointing at this host carry repository, file and changeset.
pub const HOSTED_REPOSITORY_PREFIX: &str = "hg.mozilla.org/";

/// Directory name that marks a local checkout in debugger source paths.
pub const DEBUGGER_CHECKOUT_NAME: &str = "mozilla-central";

static DEBUGGER_FRAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#(\d+)\s+(?:0x[0-9a-fA-F]* in )?([^() ]*)(.*)").expect("valid frame regex")
});

static DEBUGGER_LOCATION: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(
        r"^(.*) at (.*{}/)(.*):(\d+)",
        regex::escape(DEBUGGER_CHECKOUT_NAME)
    );
    Regex::new(&pattern).expect("valid location regex")
});

/// A recognized but not yet normalized stack line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawFrame<'l> {
    Stackwalk([&'l str; 7]),
    Debugger(&'l str),
}

impl<'l> RawFrame<'l> {
    pub fn classify(line: &'l str) -> Option<Self> {
        let fields: Vec<&str> = line.split('|').collect();
        if let Ok(fields) = <[&str; 7]>::try_from(fields) {
            if !fields[0].is_empty() && fields[0].bytes().all(|b| b.is_ascii_digit()) {
                return Some(RawFrame::Stackwalk(fields));
            }
        }
        if line.starts_with('#') {
            return Some(RawFrame::Debugger(line));
        }
        None
    }
}

/// Normalize one `minidump_stackwalk -m` line.
pub fn parse_stackwalk_frame(fields: [&str; 7]) -> Result<StackFrame> {
    let [thread, frame, module, function, location, line, _offset] = fields;

    let thread_index = thread.parse().map_err(|_| AppError::FrameParse {
        line: fields.join("|"),
        reason: format!("bad thread number {:?}", thread),
    })?;
    let frame_index = frame.parse().unwrap_or(0);

    let mut parsed = StackFrame::unresolved(FrameFormat::Stackwalk, thread_index, frame_index, function);
    if !module.is_empty() {
        parsed.module_name = Some(module.to_string());
    }

    if let Some((repository_name, file, changeset)) = hosted_location(location) {
        parsed.repository_name = Some(repository_name.to_string());
        parsed.source_file = Some(file.to_string());
        parsed.changeset_id = Some(changeset.to_string());
        parsed.line_number = line.trim().parse().ok();
    }

    Ok(parsed)
}

/// `hg:hg.mozilla.org/<repo>:<file>:<changeset>` → (repo, file, changeset)
fn hosted_location(token: &str) -> Option<(&str, &str, &str)> {
    let parts: Vec<&str> = token.split(':').collect();
    if parts.len() < 4 || parts[0] != "hg" {
        return None;
    }
    let repository_name = parts[1].strip_prefix(HOSTED_REPOSITORY_PREFIX)?;
    Some((repository_name, parts[2], parts[3]))
}

/// A gdb `bt` line before its changeset is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebuggerFrame {
    pub frame_index: u32,
    pub function_name: String,
    /// (checkout root, path inside it, line)
    pub location: Option<(PathBuf, String, usize)>,
}

pub fn parse_debugger_frame(line: &str) -> Result<DebuggerFrame> {
    let caps = DEBUGGER_FRAME.captures(line).ok_or_else(|| AppError::FrameParse {
        line: line.to_string(),
        reason: "expected `#<n> [0x<addr> in ]<function>(<args>)`".to_string(),
    })?;

    let frame_index = caps[1].parse().unwrap_or(0);
    let function_name = caps[2].to_string();
    let rest = caps.get(3).map_or("", |m| m.as_str());

    let location = DEBUGGER_LOCATION.captures(rest).and_then(|loc| {
        let line_number = loc[4].parse().ok()?;
        Some((PathBuf::from(&loc[2]), loc[3].to_string(), line_number))
    });

    Ok(DebuggerFrame {
        frame_index,
        function_name,
        location,
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// Keep frames of every thread, not just the crashing one.
    pub all_threads: bool,
}

/// Turns a stack dump into frames, applying the thread policy.
///
/// Debugger frames need the changeset of the checkout they were built from,
/// so the parser asks the `Vcs` for the working copy's parent once and
/// reuses it for every later frame.
pub struct StackParser<'a> {
    vcs: &'a dyn Vcs,
    options: ParseOptions,
    working_copy_parent: Option<String>,
}

impl<'a> StackParser<'a> {
    pub fn new(vcs: &'a dyn Vcs, options: ParseOptions) -> Self {
        Self {
            vcs,
            options,
            working_copy_parent: None,
        }
    }

    pub fn parse(&mut self, raw: &str) -> Result<Vec<StackFrame>> {
        let mut frames = Vec::new();
        let mut last_thread: Option<u32> = None;

        for line in raw.lines() {
            match RawFrame::classify(line) {
                Some(RawFrame::Stackwalk(fields)) => {
                    let frame = parse_stackwalk_frame(fields)?;
                    match last_thread {
                        None => last_thread = Some(frame.thread_index),
                        Some(t) if t != frame.thread_index => {
                            if !self.options.all_threads {
                                tracing::debug!("stopping at thread {}", frame.thread_index);
                                break;
                            }
                            last_thread = Some(frame.thread_index);
                        }
                        Some(_) => {}
                    }
                    frames.push(frame);
                }
                Some(RawFrame::Debugger(line)) => {
                    let parsed = parse_debugger_frame(line)?;
                    frames.push(self.resolve_debugger_frame(parsed)?);
                }
                None => {}
            }
        }

        Ok(frames)
    }

    fn resolve_debugger_frame(&mut self, parsed: DebuggerFrame) -> Result<StackFrame> {
        let mut frame = StackFrame::unresolved(
            FrameFormat::Debugger,
            0,
            parsed.frame_index,
            &parsed.function_name,
        );

        if let Some((checkout, file, line)) = parsed.location {
            let changeset = match &self.working_copy_parent {
                Some(node) => node.clone(),
                None => {
                    let node = self.vcs.parent_revision(&checkout)?;
                    tracing::debug!("working copy of {} is at {}", checkout.display(), node);
                    self.working_copy_parent = Some(node.clone());
                    node
                }
            };

            frame.repository_name = Some(DEBUGGER_CHECKOUT_NAME.to_string());
            frame.source_file = Some(file);
            frame.line_number = Some(line);
            frame.changeset_id = Some(changeset);
            frame.local_repo_path = Some(checkout);
        }

        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hg::testing::FakeVcs;
    use pretty_assertions::assert_eq;

    const CAIRO: &str = "0|0|XUL|_cairo_image_surface_assume_ownership_of_data|hg:hg.mozilla.org/mozilla-central:gfx/cairo/cairo/src/cairo-image-surface.c:a42e9b001bc8|812|0x0";

    #[test]
    fn stackwalk_frame_with_hosted_location() {
        let RawFrame::Stackwalk(fields) = RawFrame::classify(CAIRO).unwrap() else {
            panic!("expected a stackwalk line");
        };
        let frame = parse_stackwalk_frame(fields).unwrap();

        assert_eq!(frame.thread_index, 0);
        assert_eq!(frame.module_name.as_deref(), Some("XUL"));
        assert_eq!(frame.function_name, "_cairo_image_surface_assume_ownership_of_data");
        assert_eq!(frame.repository_name.as_deref(), Some("mozilla-central"));
        assert_eq!(
            frame.source_file.as_deref(),
            Some("gfx/cairo/cairo/src/cairo-image-surface.c")
        );
        assert_eq!(frame.line_number, Some(812));
        assert_eq!(frame.changeset_id.as_deref(), Some("a42e9b001bc8"));
    }

    #[test]
    fn stackwalk_frame_without_provenance() {
        let line = "0|3|libsystem_kernel.dylib|__kill|/usr/lib/foo.c:12|33|0x8";
        let RawFrame::Stackwalk(fields) = RawFrame::classify(line).unwrap() else {
            panic!("expected a stackwalk line");
        };
        let frame = parse_stackwalk_frame(fields).unwrap();

        assert_eq!(frame.frame_index, 3);
        assert_eq!(frame.repository_name, None);
        assert_eq!(frame.source_file, None);
        assert_eq!(frame.line_number, None);
        assert_eq!(frame.changeset_id, None);
    }

    #[test]
    fn other_lines_are_ignored() {
        assert_eq!(RawFrame::classify("Crash reason:  EXC_BAD_ACCESS"), None);
        assert_eq!(RawFrame::classify("OS|Mac OS X|10.8.2 12C60"), None);
        assert_eq!(RawFrame::classify("x|0|a|b|c|d|e"), None);
        assert_eq!(RawFrame::classify(""), None);
    }

    #[test]
    fn debugger_frame_with_checkout_location() {
        let vcs = FakeVcs::default().with_parent("0123456789ab");
        let mut parser = StackParser::new(&vcs, ParseOptions::default());

        let frames = parser
            .parse("#1  0x0000000104ae1111 in foo(a=1) at /repo/mozilla-central/js/src/jsstr.cpp:779")
            .unwrap();

        assert_eq!(frames.len(), 1);
        let frame = &frames[0];
        assert_eq!(frame.format, FrameFormat::Debugger);
        assert_eq!(frame.frame_index, 1);
        assert_eq!(frame.function_name, "foo");
        assert_eq!(frame.source_file.as_deref(), Some("js/src/jsstr.cpp"));
        assert_eq!(frame.line_number, Some(779));
        assert_eq!(frame.repository_name.as_deref(), Some("mozilla-central"));
        assert_eq!(frame.changeset_id.as_deref(), Some("0123456789ab"));
        assert_eq!(
            frame.local_repo_path,
            Some(PathBuf::from("/repo/mozilla-central/"))
        );
    }

    #[test]
    fn debugger_frame_without_location() {
        let parsed = parse_debugger_frame("#7  0x00007fff8c1e in _sigtramp ()").unwrap();
        assert_eq!(parsed.frame_index, 7);
        assert_eq!(parsed.function_name, "_sigtramp");
        assert_eq!(parsed.location, None);

        let parsed = parse_debugger_frame("#0  js::RunScript (cx=0x1) at /tmp/other/jsinterp.cpp:10").unwrap();
        assert_eq!(parsed.function_name, "js::RunScript");
        assert_eq!(parsed.location, None);
    }

    #[test]
    fn parent_revision_is_looked_up_once() {
        let vcs = FakeVcs::default().with_parent("0123456789ab");
        let mut parser = StackParser::new(&vcs, ParseOptions::default());

        let dump = "#0  0x1 in a() at /r/mozilla-central/a.cpp:1\n\
                    #1  0x2 in b() at /r/mozilla-central/b.cpp:2\n\
                    #2  0x3 in c ()\n";
        let frames = parser.parse(dump).unwrap();

        assert_eq!(frames.len(), 3);
        assert_eq!(vcs.parent_calls(), 1);
        assert_eq!(frames[1].changeset_id.as_deref(), Some("0123456789ab"));
        assert_eq!(frames[2].changeset_id, None);
    }

    #[test]
    fn malformed_debugger_line_aborts() {
        let vcs = FakeVcs::default();
        let mut parser = StackParser::new(&vcs, ParseOptions::default());

        let err = parser.parse("#include <stdio.h>").unwrap_err();
        assert!(matches!(err, AppError::FrameParse { .. }));
    }

    const THREADS: &str = "0|0|XUL|a|hg:hg.mozilla.org/mozilla-central:a.cpp:aaaaaaaaaaaa|1|0x0\n\
                           0|1|XUL|b||2|0x0\n\
                           1|0|XUL|c||3|0x0\n\
                           2|0|XUL|d||4|0x0\n";

    #[test]
    fn crashing_thread_only_by_default() {
        let vcs = FakeVcs::default();
        let frames = StackParser::new(&vcs, ParseOptions::default())
            .parse(THREADS)
            .unwrap();

        let names: Vec<&str> = frames.iter().map(|f| f.function_name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(frames.iter().all(|f| f.thread_index == 0));
    }

    #[test]
    fn all_threads_keeps_everything() {
        let vcs = FakeVcs::default();
        let frames = StackParser::new(&vcs, ParseOptions { all_threads: true })
            .parse(THREADS)
            .unwrap();

        let threads: Vec<u32> = frames.iter().map(|f| f.thread_index).collect();
        assert_eq!(threads, vec![0, 0, 1, 2]);
    }
}
