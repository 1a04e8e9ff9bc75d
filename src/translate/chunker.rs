//! Paragraph-preserving text chunking.
//! Long texts are split on blank lines into pieces that fit the provider's
//! request limit. Chunks borrow from the input, so joining them with
//! `PARAGRAPH_SEPARATOR` yields the input back byte for byte.
//!
//! A single paragraph longer than the limit is emitted as its own oversized
//! chunk. It is never cut mid-paragraph and never truncated.
//!
//! Only `\n\n` counts as a paragraph break. Text using `\r\n\r\n` breaks
//! reads as one paragraph and reaches the provider as a single chunk,
//! however long it is.

/// Separator between paragraphs, and between translated chunks on rejoin.
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Split `text` into ordered chunks of at most `max_chars` characters,
/// breaking only at paragraph boundaries.
///
/// Texts within the limit come back as a single chunk.
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<&str> {
    if text.chars().count() <= max_chars {
        return vec![text];
    }

    let sep_chars = PARAGRAPH_SEPARATOR.chars().count();
    let mut chunks = Vec::new();

    // Current buffer is text[start..end], holding `buffered` chars.
    let mut start = 0;
    let mut end = 0;
    let mut buffered = 0;
    let mut has_buffer = false;

    let mut offset = 0;
    for para in text.split(PARAGRAPH_SEPARATOR) {
        let para_start = offset;
        let para_end = offset + para.len();
        offset = para_end + PARAGRAPH_SEPARATOR.len();
        let para_chars = para.chars().count();

        if !has_buffer {
            start = para_start;
            end = para_end;
            buffered = para_chars;
            has_buffer = true;
        } else if buffered + sep_chars + para_chars <= max_chars {
            end = para_end;
            buffered += sep_chars + para_chars;
        } else {
            chunks.push(&text[start..end]);
            start = para_start;
            end = para_end;
            buffered = para_chars;
        }
    }

    if has_buffer {
        chunks.push(&text[start..end]);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraphs(n: usize, len: usize) -> String {
        (0..n)
            .map(|i| {
                let c = (b'a' + (i % 26) as u8) as char;
                c.to_string().repeat(len)
            })
            .collect::<Vec<_>>()
            .join(PARAGRAPH_SEPARATOR)
    }

    #[test]
    fn short_text_is_single_chunk() {
        let text = "Extinto em 1627.\n\nÚltimo registro na Polônia.";
        assert_eq!(split_into_chunks(text, 4500), vec![text]);
    }

    #[test]
    fn empty_text_is_single_chunk() {
        assert_eq!(split_into_chunks("", 10), vec![""]);
    }

    #[test]
    fn splits_at_paragraph_boundaries() {
        // Three 40-char paragraphs: two fit in 100 (40 + 2 + 40), the third does not.
        let text = paragraphs(3, 40);
        let chunks = split_into_chunks(&text, 100);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), 82);
        assert_eq!(chunks[1], "c".repeat(40));
        assert!(chunks.iter().all(|c| c.chars().count() <= 100));
    }

    #[test]
    fn rejoining_reconstructs_input() {
        let text = paragraphs(12, 35);
        let chunks = split_into_chunks(&text, 120);
        assert!(chunks.len() > 1);
        assert_eq!(chunks.join(PARAGRAPH_SEPARATOR), text);
    }

    #[test]
    fn rejoining_keeps_extra_blank_lines() {
        let text = format!("{}\n\n\n\n{}\n\n\n{}", "x".repeat(30), "y".repeat(30), "z".repeat(30));
        let chunks = split_into_chunks(&text, 40);
        assert_eq!(chunks.join(PARAGRAPH_SEPARATOR), text);
    }

    #[test]
    fn oversized_paragraph_passes_through_whole() {
        let big = "w".repeat(250);
        let text = format!("short\n\n{big}\n\ntail");
        let chunks = split_into_chunks(&text, 100);
        assert_eq!(chunks, vec!["short", big.as_str(), "tail"]);
    }

    #[test]
    fn crlf_breaks_are_not_split() {
        let text = ["a".repeat(40), "b".repeat(40), "c".repeat(40)].join("\r\n\r\n");
        assert_eq!(split_into_chunks(&text, 50), vec![text.as_str()]);
    }

    #[test]
    fn limit_counts_characters_not_bytes() {
        // 30 two-byte chars per paragraph: 62 chars for two paragraphs, 124 bytes.
        let para = "ç".repeat(30);
        let text = format!("{para}\n\n{para}\n\n{para}");
        let chunks = split_into_chunks(&text, 62);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], format!("{para}\n\n{para}"));
    }
}
