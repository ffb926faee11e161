//! Text chunking utilities for simulating streaming output
//!
//! Scripted replies are complete strings; they are cut into small pieces so
//! that consumers see the same fragment-by-fragment flow a real model produces.

/// Configuration for text chunking
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    /// Target size of each chunk in bytes
    pub chunk_size: usize,
    /// Delay between chunks in milliseconds
    pub chunk_delay_ms: u64,
    /// Whether to split at word boundaries
    pub word_boundary: bool,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 20,
            chunk_delay_ms: 0,
            word_boundary: true,
        }
    }
}

/// Split text into chunks
///
/// Concatenating the result always yields the input. Chunks never split a
/// UTF-8 character.
pub fn split_text_into_chunks(text: &str, config: &ChunkConfig) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut position = 0;

    while position < text.len() {
        let remaining = &text[position..];
        let mut chunk_end = ceil_char_boundary(remaining, config.chunk_size.max(1));

        if config.word_boundary && chunk_end < remaining.len() {
            if let Some(last_space) = remaining[..chunk_end].rfind(' ') {
                if last_space > 0 {
                    chunk_end = last_space + 1;
                }
            } else if let Some(next_space) = remaining[chunk_end..].find(' ') {
                chunk_end = chunk_end + next_space + 1;
            }
        }

        chunks.push(remaining[..chunk_end].to_string());
        position += chunk_end;
    }

    chunks
}

fn ceil_char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index += 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concatenation_restores_input() {
        let reply = "Sure:\n```rust\nfn main() {}\n```\nThat prints nothing.";
        for chunk_size in [1, 4, 9, 64] {
            for word_boundary in [false, true] {
                let config = ChunkConfig {
                    chunk_size,
                    chunk_delay_ms: 0,
                    word_boundary,
                };
                let chunks = split_text_into_chunks(reply, &config);
                assert_eq!(chunks.concat(), reply, "size {chunk_size}, words {word_boundary}");
            }
        }
    }

    #[test]
    fn test_word_boundary_ends_chunks_after_spaces() {
        let config = ChunkConfig {
            chunk_size: 8,
            chunk_delay_ms: 0,
            word_boundary: true,
        };

        let chunks = split_text_into_chunks("fence the code block", &config);
        assert_eq!(chunks, vec!["fence ", "the ", "code ", "block"]);
    }

    #[test]
    fn test_long_word_extends_to_next_space() {
        let config = ChunkConfig {
            chunk_size: 4,
            chunk_delay_ms: 0,
            word_boundary: true,
        };

        let chunks = split_text_into_chunks("extraordinary idea", &config);
        assert_eq!(chunks, vec!["extraordinary ", "idea"]);
    }

    #[test]
    fn test_chunk_end_moves_past_multibyte_character() {
        // 'é' spans bytes 1..3, so a 2-byte cut lands inside it
        let config = ChunkConfig {
            chunk_size: 2,
            chunk_delay_ms: 0,
            word_boundary: false,
        };

        let chunks = split_text_into_chunks("héllo", &config);
        assert_eq!(chunks[0], "hé");
        assert_eq!(chunks.concat(), "héllo");
    }

    #[test]
    fn test_split_never_cuts_multibyte_characters() {
        let text = "héllo wörld ✓✓✓";
        let config = ChunkConfig {
            chunk_size: 2,
            chunk_delay_ms: 0,
            word_boundary: false,
        };

        let chunks = split_text_into_chunks(text, &config);
        assert_eq!(chunks.concat(), text);
        assert!(chunks.iter().all(|c| !c.is_empty()));
    }

    #[test]
    fn test_split_empty_text() {
        assert!(split_text_into_chunks("", &ChunkConfig::default()).is_empty());
    }
}
