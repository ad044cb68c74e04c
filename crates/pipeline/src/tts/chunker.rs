//! Text chunking for the speech endpoint
//!
//! The endpoint rejects long inputs, so text is cut into pieces of at most
//! [`MAX_CHUNK_CHARS`] characters. Cuts prefer sentence terminators
//! (including the Devanagari danda), then clause punctuation, then
//! whitespace. A single word longer than the limit is split hard.

/// Maximum characters per request
pub const MAX_CHUNK_CHARS: usize = 200;

const SENTENCE_TERMINATORS: &[char] = &['.', '!', '?', '।', '॥', '\n'];
const CLAUSE_TERMINATORS: &[char] = &[',', ';', ':', '—', '–'];

/// Split `text` into trimmed, non-empty chunks of at most `max_chars` characters
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut pieces = Vec::new();
    for sentence in split_keep(text, SENTENCE_TERMINATORS) {
        fit(sentence, max_chars, &mut pieces);
    }
    merge(pieces, max_chars)
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split after each terminator, keeping it attached to the preceding piece
fn split_keep<'a>(text: &'a str, terminators: &[char]) -> Vec<&'a str> {
    text.split_inclusive(|c: char| terminators.contains(&c))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Break one sentence into pieces that each fit
fn fit(sentence: &str, max_chars: usize, out: &mut Vec<String>) {
    if char_len(sentence) <= max_chars {
        out.push(sentence.to_string());
        return;
    }

    for clause in split_keep(sentence, CLAUSE_TERMINATORS) {
        if char_len(clause) <= max_chars {
            out.push(clause.to_string());
            continue;
        }
        for word in clause.split_whitespace() {
            if char_len(word) <= max_chars {
                out.push(word.to_string());
            } else {
                let chars: Vec<char> = word.chars().collect();
                out.extend(chars.chunks(max_chars).map(|c| c.iter().collect::<String>()));
            }
        }
    }
}

/// Greedily join adjacent pieces while they fit
fn merge(pieces: Vec<String>, max_chars: usize) -> Vec<String> {
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();

    for piece in pieces {
        if current.is_empty() {
            current = piece;
        } else if char_len(&current) + 1 + char_len(&piece) <= max_chars {
            current.push(' ');
            current.push_str(&piece);
        } else {
            chunks.push(std::mem::take(&mut current));
            current = piece;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
