/// Guidance texts shown to users, and the excerpt formatting they embed.

use crate::services::utils::{lines_with_ends, take_chars};

use super::parsing::{self, Candidate};

/// Excerpts are cut before exceeding this many characters...
pub const EXCERPT_CHAR_BUDGET: usize = 204;
/// ...or after this many lines, whichever comes first.
pub const EXCERPT_LINE_BUDGET: usize = 10;
pub const TRUNCATION_MARKER: &str = "#...";

const MARKDOWN_SPECIAL: [char; 6] = ['*', '_', '~', '`', '|', '>'];

/// Shorten `text` to the excerpt budget, cutting only between lines.
pub fn format_excerpt(text: &str) -> String {
    if text.chars().count() < EXCERPT_CHAR_BUDGET {
        return text.to_string();
    }

    let mut kept_bytes = 0;
    let mut kept_chars = 0;
    for (walked, line) in lines_with_ends(text).enumerate() {
        let len = line.chars().count();
        if kept_chars + len > EXCERPT_CHAR_BUDGET || walked == EXCERPT_LINE_BUDGET {
            break;
        }
        kept_chars += len;
        kept_bytes += line.len();
    }
    format!("{}{}", &text[..kept_bytes], TRUNCATION_MARKER)
}

/// Backslash-escape characters Discord markdown would otherwise interpret.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        if MARKDOWN_SPECIAL.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// The "write it like this" example followed by how it renders.
fn example_blocks(excerpt: &str) -> String {
    format!(
        "\\`\\`\\`python\n{}\n\\`\\`\\`\n\n**This will result in the following:**\n```python\n{}\n```",
        escape_markdown(excerpt),
        excerpt
    )
}

/// Instructions for code pasted without any code block.
pub fn no_ticks_message(candidate: &Candidate) -> String {
    let excerpt = format_excerpt(candidate.display_text());
    format!(
        "It looks like you're trying to paste code into this channel.\n\n\
         Discord has support for Markdown, which allows you to post code with full \
         syntax highlighting. Please use these whenever you paste code, as this \
         helps improve the legibility and makes it easier for us to help you.\n\n\
         **To do this, use the following method:**\n{}",
        example_blocks(&excerpt)
    )
}

/// Instructions for a backtick block that is missing the `python` tag.
pub fn no_lang_message(candidate: &Candidate) -> String {
    let excerpt = format_excerpt(candidate.display_text());
    format!(
        "It looks like you pasted Python code without syntax highlighting.\n\n\
         Please use syntax highlighting to improve the legibility of your code and make \
         it easier for us to help you.\n\n\
         **To do this, use the following method:**\n{}",
        example_blocks(&excerpt)
    )
}

/// Instructions for a block fenced with quotes or primes instead of backticks.
///
/// Returns `None` when no code can be recovered from between the fences.
pub fn wrong_ticks_message(content: &str) -> Option<String> {
    let ticks = take_chars(content, 3);
    let inner = parsing::wrong_fence_inner(content);
    let candidate = parsing::strip_fence(&format!("```{inner}```"), true)?;
    let excerpt = format_excerpt(candidate.display_text());

    let mut message = format!(
        "It looks like you are trying to paste code into this channel.\n\n\
         You seem to be using the wrong symbols to indicate where the codeblock should start. \
         The correct symbols would be \\`\\`\\`, not `{ticks}`.\n\n\
         **Here is an example of how it should look:**\n{}",
        example_blocks(&excerpt)
    );
    if let Some(addendum) = bad_language_addendum(inner) {
        message.push_str("\n\n");
        message.push_str(&addendum);
    }
    Some(message)
}

/// Extra advice when the `python` tag is separated from the fence or glued to the code.
fn bad_language_addendum(inner: &str) -> Option<String> {
    let bad = parsing::parse_bad_language(inner)?;
    if !bad.leading_spaces && bad.terminal_newline {
        return None;
    }

    let lang = bad.language.to_lowercase();
    let mut lines = vec![String::from(
        "Furthermore, it looks like you incorrectly specified a language for your code block.",
    )];
    if bad.leading_spaces {
        lines.push(format!("Make sure there are no spaces between the back ticks and `{lang}`."));
    }
    if !bad.terminal_newline {
        lines.push(format!(
            "Make sure you put your code on a new line following `{lang}`. \
             There must not be any spaces after `{lang}`."
        ));
    }
    Some(lines.join("\n"))
}
