//! Shell-like command-line splitting.
//!
//! Used by the command action when a program is spawned directly instead of
//! through a shell: the configured command string is split into a program and
//! its arguments. Supports single and double quotes and backslash escapes;
//! quotes are stripped from the produced tokens.

/// Split a command line into whitespace-separated tokens, honoring quotes.
///
/// `ab"c d"e` yields one token `abc de`; a trailing backslash or an unclosed
/// quote is tolerated by taking the remaining text literally.
pub fn split_command_line(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut chars = input.chars().peekable();

    while let Some(character) = chars.next() {
        match character {
            c if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            '\\' => {
                in_token = true;
                match chars.next() {
                    Some(escaped) => current.push(escaped),
                    None => current.push('\\'),
                }
            }
            quote @ ('\'' | '"') => {
                in_token = true;
                loop {
                    match chars.next() {
                        Some(c) if c == quote => break,
                        Some('\\') if quote == '"' => match chars.next() {
                            Some(escaped) => current.push(escaped),
                            None => {
                                current.push('\\');
                                break;
                            }
                        },
                        Some(c) => current.push(c),
                        None => break,
                    }
                }
            }
            other => {
                in_token = true;
                current.push(other);
            }
        }
    }

    if in_token {
        tokens.push(current);
    }
    tokens
}
