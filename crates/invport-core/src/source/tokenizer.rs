//! Quote-aware splitting of one delimited line.

/// Split a line into fields.
///
/// A `"` toggles quoted state, `""` inside a quoted field is a literal quote,
/// and the delimiter only separates fields outside quotes. Fields are not
/// trimmed. Single pass, no backtracking.
pub fn tokenize_line(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '"' {
            if in_quotes && chars.peek() == Some(&'"') {
                current.push('"');
                chars.next();
            } else {
                in_quotes = !in_quotes;
            }
        } else if c == delimiter && !in_quotes {
            fields.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }

    fields.push(current);
    fields
}
