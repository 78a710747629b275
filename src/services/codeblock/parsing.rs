/// Text normalization stages: wrong-fence detection, fence/tag stripping,
/// REPL prompt removal and indentation repair.

use std::sync::OnceLock;

use log::trace;
use regex::Regex;

use crate::services::utils::{lines_with_ends, skip_chars, take_chars};

pub const BACKTICK: char = '`';

/// Messages with fewer newlines than this are never treated as a pasted block.
pub const MIN_NEWLINES: usize = 3;

/// `>>> ` and `... ` are always cut as four characters, space included.
const REPL_PROMPT_LEN: usize = 4;

/// Triple glyphs people type when they mean ``` (quotes, primes, accents).
pub const WRONG_FENCES: [&str; 10] = [
    "'''",
    "\"\"\"",
    "\u{00b4}\u{00b4}\u{00b4}", // ACUTE ACCENT
    "\u{2018}\u{2018}\u{2018}", // LEFT SINGLE QUOTATION MARK
    "\u{2019}\u{2019}\u{2019}", // RIGHT SINGLE QUOTATION MARK
    "\u{2032}\u{2032}\u{2032}", // PRIME
    "\u{201c}\u{201c}\u{201c}", // LEFT DOUBLE QUOTATION MARK
    "\u{201d}\u{201d}\u{201d}", // RIGHT DOUBLE QUOTATION MARK
    "\u{2033}\u{2033}\u{2033}", // DOUBLE PRIME
    "\u{3003}\u{3003}\u{3003}", // VERTICAL KANA REPEAT MARK UPPER HALF
];

fn valid_python_block_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"(?is)```(?:py|python)\n(.*?)```").expect("Invalid code block regex pattern"))
}

fn fenced_block_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"(?s)```(?P<lang>[^\W_]+\n)?(?P<code>.+?)```").expect("Invalid fenced block regex pattern")
    })
}

fn bad_language_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"(?i)^(?P<spaces>\s+)?(?P<lang>python|py)(?P<newline>\n)?")
            .expect("Invalid language regex pattern")
    })
}

/// Code recovered from a message, ready for validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub normalized: String,
    /// Text before REPL prompts were removed; only set when that stage changed something.
    pub before: Option<String>,
    pub is_repl_code: bool,
}

impl Candidate {
    /// The text to quote back to the user.
    pub fn display_text(&self) -> &str {
        self.before.as_deref().unwrap_or(&self.normalized)
    }
}

/// Information about a Python language tag written the wrong way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadLanguage {
    pub language: String,
    pub leading_spaces: bool,
    pub terminal_newline: bool,
}

/// True if the first three characters are a decoy fence instead of ```.
pub fn has_wrong_fence(text: &str) -> bool {
    WRONG_FENCES.contains(&take_chars(text, 3))
}

/// True if `text` fences code with real backticks but never names a language.
pub fn has_untagged_fence(text: &str) -> bool {
    let mut untagged = false;
    for caps in fenced_block_regex().captures_iter(text) {
        if caps.name("lang").is_some() {
            return false;
        }
        untagged = true;
    }
    untagged
}

/// The text between a wrong opening fence and the closing one,
/// i.e. everything except the first and last three characters.
pub fn wrong_fence_inner(text: &str) -> &str {
    let len = text.chars().count();
    if len <= 6 {
        return "";
    }
    take_chars(skip_chars(text, 3), len - 6)
}

/// Try to dig Python code out of `text`.
///
/// Returns `None` when the text already holds a correctly highlighted Python
/// block (unless `bad_fence` is set), when it is too short to be a pasted
/// block, or when backticks survive normalization.
pub fn strip_fence(text: &str, bad_fence: bool) -> Option<Candidate> {
    if text.matches('\n').count() < MIN_NEWLINES {
        return None;
    }

    if !bad_fence && valid_python_block_regex().is_match(text) {
        trace!("Message is already a valid Python code block. No action taken.");
        return None;
    }

    trace!("Stripping backticks from message.\n\n{text}\n\n");
    let content: String = lines_with_ends(text).map(strip_line_ticks).collect();
    let content = content.trim();

    trace!("Removing 'py' or 'python' from message.\n\n{content}\n\n");
    let (content, is_py_tag) = if take_chars(content, 6).eq_ignore_ascii_case("python") {
        (skip_chars(content, 6), true)
    } else if take_chars(content, 2).eq_ignore_ascii_case("py") {
        (skip_chars(content, 2), true)
    } else {
        (content, false)
    };

    let content = if is_py_tag {
        drop_tag_line(content)
    } else {
        content.to_string()
    };

    // A first line like "```python x = 1" leaves leading whitespace behind.
    let old = content.trim();

    let (stripped, is_repl_code) = strip_repl(old);
    if stripped != old {
        return Some(Candidate {
            normalized: stripped,
            before: Some(old.to_string()),
            is_repl_code,
        });
    }

    let fixed = fix_indentation(old);
    if fixed.contains(BACKTICK) {
        trace!("Detected ` inside the code, won't reply");
        return None;
    }

    trace!("Returning message.\n\n{fixed}\n\n");
    Some(Candidate {
        normalized: fixed,
        before: None,
        is_repl_code,
    })
}

/// Backticks are stripped from both ends of a line, but a line terminator
/// shields the trailing end.
fn strip_line_ticks(line: &str) -> &str {
    let stripped = line.trim_start_matches(BACKTICK);
    if stripped.ends_with('\n') {
        stripped
    } else {
        stripped.trim_end_matches(BACKTICK)
    }
}

/// After a `py`/`python` prefix: keep code that continues on the tag line
/// (from its first space on), otherwise drop the tag line.
fn drop_tag_line(content: &str) -> String {
    let mut lines = lines_with_ends(content);
    let Some(first) = lines.next() else {
        return String::new();
    };
    let rest: String = lines.collect();
    match first.find(' ') {
        Some(space) => format!("{}{}", &first[space..], rest),
        None => rest,
    }
}

/// Extract code from interactive interpreter output.
///
/// Lines starting with `>>>` or `...` are kept minus the prompt; everything
/// else is output and dropped. The flag reports whether any prompt was found.
pub fn strip_repl(text: &str) -> (String, bool) {
    let mut stripped = String::new();
    for line in lines_with_ends(text) {
        if line.starts_with(">>>") || line.starts_with("...") {
            stripped.push_str(skip_chars(line, REPL_PROMPT_LEN));
        }
    }

    if stripped.is_empty() {
        trace!("Found no REPL code in \n\n{text}\n\n");
        return (text.to_string(), false);
    }

    trace!("Found REPL code in \n\n{text}\n\n");
    (stripped.trim_end().to_string(), true)
}

/// Remove the indentation of the first line from every line, keeping `skip` spaces.
fn unindent(code: &str, skip: usize) -> String {
    let leading = code.chars().take_while(|&c| c == ' ').count();
    if leading <= skip {
        return code.to_string();
    }
    let cut = leading - skip;
    lines_with_ends(code).map(|line| skip_chars(line, cut)).collect()
}

/// Repair code that was over-indented as a whole.
///
/// The body after a first line ending in `:` keeps one level (4 spaces).
pub fn fix_indentation(text: &str) -> String {
    let text = unindent(text, 0);

    let mut lines = lines_with_ends(&text);
    let Some(first) = lines.next() else {
        return String::new();
    };
    let first_line = first.trim_end_matches(&['\r', '\n'][..]);
    let rest: String = lines.collect();
    if rest.is_empty() {
        return first_line.to_string();
    }

    let skip = if first_line.ends_with(':') { 4 } else { 0 };
    format!("{}\n{}", first_line, unindent(&rest, skip))
}

/// Describe a Python language tag at the start of code block content.
/// Returns `None` if the content does not start with `py` or `python`.
pub fn parse_bad_language(content: &str) -> Option<BadLanguage> {
    let caps = bad_language_regex().captures(content)?;
    Some(BadLanguage {
        language: caps.name("lang").map(|m| m.as_str().to_string()).unwrap_or_default(),
        leading_spaces: caps.name("spaces").is_some(),
        terminal_newline: caps.name("newline").is_some(),
    })
}
