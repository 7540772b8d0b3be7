use crate::{CompoundIdentifier, Token};

const QUOTE: char = '"';
const DOT: char = '.';
const TERMINATOR: char = ';';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Between words; the current group may still be continued by a dot.
    Space,
    /// After a dot, waiting for the next part of the same group.
    DotSpace,
    Unquoted,
    Quoted,
}

/// Split a shell line into space-separated compound identifiers, each made of
/// dot-separated parts.
///
/// Unquoted parts are uppercased and an unquoted `null` becomes `None`.
/// Double-quoted parts keep their case and may contain spaces, dots and `""`
/// escapes. Never fails: stray quotes, a leading dot and an unterminated
/// quote are all accepted.
pub fn split_compound(line: &str) -> Vec<CompoundIdentifier> {
    let line = trim_terminator(line);

    let mut lines: Vec<CompoundIdentifier> = Vec::new();
    let mut group: CompoundIdentifier = Vec::new();
    let mut buf = String::new();
    let mut state = State::Space;

    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        match state {
            State::Quoted => {
                if ch == QUOTE {
                    if chars.peek() == Some(&QUOTE) {
                        chars.next();
                        buf.push(QUOTE);
                    } else {
                        group.push(finish_quoted(&mut buf));
                        state = State::Space;
                    }
                } else {
                    buf.push(ch);
                }
            }
            State::Unquoted => {
                if ch.is_whitespace() {
                    group.push(finish_unquoted(&mut buf));
                    state = State::Space;
                } else if ch == DOT {
                    group.push(finish_unquoted(&mut buf));
                    state = State::DotSpace;
                } else {
                    buf.push(ch);
                }
            }
            State::Space | State::DotSpace => {
                if ch.is_whitespace() {
                    continue;
                }
                if ch == DOT {
                    // A dot after a finished part continues its group. A
                    // leading dot or a repeated dot is skipped.
                    state = State::DotSpace;
                    continue;
                }
                if state == State::Space && !group.is_empty() {
                    lines.push(std::mem::take(&mut group));
                }
                if ch == QUOTE {
                    state = State::Quoted;
                } else {
                    buf.push(ch);
                    state = State::Unquoted;
                }
            }
        }
    }

    match state {
        State::Quoted => group.push(finish_quoted(&mut buf)),
        State::Unquoted => group.push(finish_unquoted(&mut buf)),
        State::Space | State::DotSpace => {}
    }
    if !group.is_empty() {
        lines.push(group);
    }

    lines
}

/// Strip trailing whitespace and at most one statement terminator.
fn trim_terminator(line: &str) -> &str {
    let line = line.trim_end();
    match line.strip_suffix(TERMINATOR) {
        Some(rest) => rest.trim_end(),
        None => line,
    }
}

fn finish_quoted(buf: &mut String) -> Token {
    Some(std::mem::take(buf))
}

fn finish_unquoted(buf: &mut String) -> Token {
    let upper = buf.to_uppercase();
    buf.clear();
    if upper == "NULL" {
        None
    } else {
        Some(upper)
    }
}
