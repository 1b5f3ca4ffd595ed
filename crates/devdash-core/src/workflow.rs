//! Stage rendering, log severity tags and the hard-coded action triggers.
//!
//! Nothing here guards transitions: any status can follow any other, and the
//! store accepts whatever valid label it is given.

use crate::types::Status;

// ---------------------------------------------------------------------------
// StageState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageState {
    Done,
    Current,
    Future,
}

impl Status {
    /// Where `self` sits relative to the project's `current` stage.
    pub fn stage_state(self, current: Status) -> StageState {
        match self.cmp(&current) {
            std::cmp::Ordering::Less => StageState::Done,
            std::cmp::Ordering::Equal => StageState::Current,
            std::cmp::Ordering::Greater => StageState::Future,
        }
    }
}

/// One-line progress strip, e.g. `[x] Planning > [*] Development > [ ] Testing …`.
pub fn render_progress(current: Status) -> String {
    Status::all()
        .iter()
        .map(|&stage| {
            let mark = match stage.stage_state(current) {
                StageState::Done => "[x]",
                StageState::Current => "[*]",
                StageState::Future => "[ ]",
            };
            format!("{mark} {stage}")
        })
        .collect::<Vec<_>>()
        .join(" > ")
}

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    /// Severity from a log line's leading tag. Untagged lines and other tags
    /// (`[USER]`, `[AI]`) have none.
    pub fn of(line: &str) -> Option<Severity> {
        let line = line.trim_start();
        [
            ("[INFO]", Severity::Info),
            ("[SUCCESS]", Severity::Success),
            ("[WARNING]", Severity::Warning),
            ("[ERROR]", Severity::Error),
        ]
        .into_iter()
        .find_map(|(tag, sev)| line.starts_with(tag).then_some(sev))
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

// ---------------------------------------------------------------------------
// Trigger
// ---------------------------------------------------------------------------

const BUILD_PHRASE: &str = "build project";
const DECOMPOSE_MARKER: &str = "decompose task:";

/// What a line of user input asks the dashboard to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Run build verification; `Testing`, then `Deployment` on success.
    Build,
    /// Break the remaining text into CLI commands; `Development` on success.
    Decompose(String),
    /// Plain conversation with the assistant.
    Chat,
}

impl Trigger {
    pub fn classify(input: &str) -> Trigger {
        if find_ignore_case(input, BUILD_PHRASE).is_some() {
            return Trigger::Build;
        }
        if let Some(end) = find_ignore_case(input, DECOMPOSE_MARKER) {
            return Trigger::Decompose(input[end..].trim().to_string());
        }
        Trigger::Chat
    }
}

/// Byte offset just past the first ASCII-case-insensitive match of `needle`
/// in `haystack`. `needle` must be ASCII, so the offset is a char boundary.
fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    let bytes = haystack.as_bytes();
    haystack
        .char_indices()
        .map(|(i, _)| i)
        .find(|&i| {
            bytes
                .get(i..i + needle.len())
                .is_some_and(|window| window.eq_ignore_ascii_case(needle.as_bytes()))
        })
        .map(|i| i + needle.len())
}
