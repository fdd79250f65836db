//! Rendering commands as POSIX shell text.
//!
//! Nothing in this crate executes a rendered string. Rendering exists so that
//! a command can be logged, shown in an error, or pasted into a terminal, and
//! be read back as exactly the argument vector that was executed.

use crate::TemplateError;

/// Placeholder substituted by [`render_template`].
pub const PLACEHOLDER: char = '?';

/// Quotes `s` as a single POSIX shell word.
///
/// Words made only of `[A-Za-z0-9-_=./:@]` are returned unchanged, the empty
/// word becomes `''`, and anything else is single-quoted with embedded `'`
/// written as `'"'"'`.
pub fn shell_escape(s: &str) -> String {
    if s.is_empty() {
        "''".to_string()
    } else if s
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "-_=./:@".contains(c))
    {
        s.to_string()
    } else {
        let escaped = s.replace('\'', "'\"'\"'");
        format!("'{}'", escaped)
    }
}

/// Substitutes each `?` in `template`, in order, with the matching argument
/// quoted by [`shell_escape`].
///
/// The template text itself is copied verbatim, so it may contain shell
/// operators such as `&&`; arguments never can.
pub fn render_template<S: AsRef<str>>(template: &str, args: &[S]) -> Result<String, TemplateError> {
    let expected = template.matches(PLACEHOLDER).count();
    if expected != args.len() {
        return Err(TemplateError::ArgumentCount {
            expected,
            actual: args.len(),
        });
    }

    let mut out = String::with_capacity(template.len() + args.len() * 8);
    let mut args = args.iter();
    for ch in template.chars() {
        if ch != PLACEHOLDER {
            out.push(ch);
        } else if let Some(arg) = args.next() {
            out.push_str(&shell_escape(arg.as_ref()));
        }
    }
    Ok(out)
}
