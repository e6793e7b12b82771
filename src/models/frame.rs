use std::path::PathBuf;

/// Path fragment marking exported/generated headers, which are not worth blaming.
pub const GENERATED_HEADERS_MARKER: &str = "dist/include";

/// Which stack dump grammar a frame came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    /// `minidump_stackwalk -m` output, one pipe-delimited frame per line
    Stackwalk,
    /// gdb `bt` output, `#N ...` lines
    Debugger,
}

/// One normalized stack frame.
///
/// Provenance fields are optional: system libraries and frames without
/// symbols have no repository, file or line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    pub format: FrameFormat,
    /// Thread number from the dump; always 0 for debugger frames
    pub thread_index: u32,
    pub frame_index: u32,
    pub module_name: Option<String>,
    pub function_name: String,
    /// Path relative to the repository root
    pub source_file: Option<String>,
    pub line_number: Option<usize>,
    pub changeset_id: Option<String>,
    /// Official repository name, e.g. `mozilla-central`
    pub repository_name: Option<String>,
    /// Local checkout the frame was built from, when the dump names one
    pub local_repo_path: Option<PathBuf>,
}

impl StackFrame {
    /// Frames that only carry a module and function name.
    pub fn unresolved(format: FrameFormat, thread_index: u32, frame_index: u32, function_name: &str) -> Self {
        Self {
            format,
            thread_index,
            frame_index,
            module_name: None,
            function_name: function_name.to_string(),
            source_file: None,
            line_number: None,
            changeset_id: None,
            repository_name: None,
            local_repo_path: None,
        }
    }

    /// Whether the source file lives under generated/vendored headers.
    pub fn is_generated_header(&self) -> bool {
        self.source_file
            .as_deref()
            .is_some_and(|f| f.contains(GENERATED_HEADERS_MARKER))
    }

    /// Everything needed to blame the target line, or `None` when the frame
    /// has no usable provenance.
    pub fn blame_target(&self) -> Option<BlameTarget<'_>> {
        if self.is_generated_header() {
            return None;
        }
        Some(BlameTarget {
            repository_name: self.repository_name.as_deref()?,
            source_file: self.source_file.as_deref().filter(|f| !f.is_empty())?,
            line_number: self.line_number?,
            changeset_id: self.changeset_id.as_deref()?,
            local_repo_path: self.local_repo_path.as_deref(),
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BlameTarget<'a> {
    pub repository_name: &'a str,
    pub source_file: &'a str,
    pub line_number: usize,
    pub changeset_id: &'a str,
    pub local_repo_path: Option<&'a std::path::Path>,
}
