use chrono::{DateTime, Local, Utc};

/// Helper function to format a timestamp as a local calendar date
///
/// # Arguments
///
/// * `date` - A UTC timestamp as received from the backend
///
/// # Returns
///
/// A `String` in the "dd-mm-yyyy" format, in the machine's local time zone
pub fn format_date(date: DateTime<Utc>) -> String {
    date.with_timezone(&Local).format("%d-%m-%Y").to_string()
}

/// Helper function to format a timestamp as local date and time
///
/// Appointments are listed with this, e.g. "17 Oct 2026 14:30".
pub fn format_datetime(date: DateTime<Utc>) -> String {
    date.with_timezone(&Local)
        .format("%d %b %Y %H:%M")
        .to_string()
}

/// Helper function to escape special characters for Markdown
///
/// This function takes a string and prefixes every character that has a
/// special meaning in Telegram's MarkdownV2 syntax with a backslash, so that
/// user-provided text (names, diagnoses, notes) is rendered literally.
///
/// # Arguments
///
/// * `text` - A string slice containing the text to be escaped
///
/// # Returns
///
/// A `String` with all Markdown special characters escaped
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if "_*[]()~`>#+-=|{}.!\\".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Longest text Telegram accepts in one message, in UTF-16 code units.
pub const MESSAGE_LIMIT: usize = 4096;

fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Helper function to split a long reply into messages Telegram accepts
///
/// Paragraphs (separated by a blank line) are packed into as few chunks as
/// possible without exceeding `limit`. A single paragraph longer than `limit`
/// is cut at character boundaries.
///
/// # Arguments
///
/// * `text` - The full reply
/// * `limit` - Maximum length of one chunk, in UTF-16 code units
///
/// # Returns
///
/// The chunks in order; empty when `text` is empty
pub fn chunk_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();

    for paragraph in text.split("\n\n") {
        for piece in cut_to_limit(paragraph, limit) {
            if !current.is_empty() && utf16_len(&current) + 2 + utf16_len(&piece) > limit {
                chunks.push(std::mem::take(&mut current));
            } else if !current.is_empty() {
                current.push_str("\n\n");
            }
            current.push_str(&piece);
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn cut_to_limit(paragraph: &str, limit: usize) -> Vec<String> {
    if utf16_len(paragraph) <= limit {
        return vec![paragraph.to_string()];
    }

    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut len = 0;
    for c in paragraph.chars() {
        if len + c.len_utf16() > limit {
            pieces.push(std::mem::take(&mut piece));
            len = 0;
        }
        piece.push(c);
        len += c.len_utf16();
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_every_reserved_character() {
        assert_eq!(escape_markdown("Dr. Park (GP)"), "Dr\\. Park \\(GP\\)");
        assert_eq!(escape_markdown("a_b*c"), "a\\_b\\*c");
        assert_eq!(escape_markdown("plain"), "plain");
    }

    #[test]
    fn format_date_is_day_month_year() {
        let date = Utc::now();
        let formatted = format_date(date);
        assert_eq!(formatted.len(), 10);
        assert_eq!(formatted.matches('-').count(), 2);
    }

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(chunk_message("a\n\nb", MESSAGE_LIMIT), vec!["a\n\nb"]);
        assert!(chunk_message("", MESSAGE_LIMIT).is_empty());
    }

    #[test]
    fn long_lists_break_between_paragraphs() {
        let entries: Vec<String> = (0..40)
            .map(|i| format!("🗓 entry {:02} {}", i, "x".repeat(100)))
            .collect();
        let text = entries.join("\n\n");
        assert!(utf16_len(&text) > MESSAGE_LIMIT);

        let chunks = chunk_message(&text, MESSAGE_LIMIT);

        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| utf16_len(c) <= MESSAGE_LIMIT));
        assert_eq!(chunks.join("\n\n"), text);
    }

    #[test]
    fn oversized_paragraph_is_cut() {
        let chunks = chunk_message(&"é".repeat(10), 4);
        assert_eq!(chunks, vec!["éééé", "éééé", "éé"]);
    }
}
