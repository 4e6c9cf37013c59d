use tarot_core::CHUNK_OVERLAP_TOKENS;
use tarot_core::CHUNK_TARGET_TOKENS;
use tarot_core::TOKENS_PER_WORD;

/// A single chunk cut from a source document, tagged with the page it
/// started on (spec §C supplement: source-page tagging).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    pub source_page: Option<u32>,
    pub chunk_index: usize,
}

/// Splits `text` into overlapping word-count windows.
///
/// Token budgets are converted to word counts via `TOKENS_PER_WORD`
/// (`words_per_chunk = round(target_tokens * 0.75)`), matching the ingestion
/// pipeline this crate's vector store is populated by. `source_page`, when
/// given, is stamped on every chunk produced from this call; callers
/// chunking a multi-page document call this once per page.
pub fn chunk_text(text: &str, source_page: Option<u32>, start_index: usize) -> Vec<Chunk> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }

    let words_per_chunk = ((CHUNK_TARGET_TOKENS as f32) * TOKENS_PER_WORD).round() as usize;
    let words_per_chunk = words_per_chunk.max(1);
    let overlap_words = ((CHUNK_OVERLAP_TOKENS as f32) * TOKENS_PER_WORD).round() as usize;
    let stride = words_per_chunk.saturating_sub(overlap_words).max(1);

    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut index = start_index;
    while start < words.len() {
        let end = (start + words_per_chunk).min(words.len());
        let text = words[start..end].join(" ");
        chunks.push(Chunk {
            text,
            source_page,
            chunk_index: index,
        });
        index += 1;
        if end == words.len() {
            break;
        }
        start += stride;
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("word{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn short_text_produces_a_single_chunk() {
        let chunks = chunk_text("a short sentence of lore", Some(3), 0);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].source_page, Some(3));
        assert_eq!(chunks[0].chunk_index, 0);
    }

    #[test]
    fn empty_text_produces_no_chunks() {
        assert!(chunk_text("   ", None, 0).is_empty());
    }

    #[test]
    fn long_text_is_split_into_overlapping_windows() {
        let text = words(900);
        let chunks = chunk_text(&text, None, 0);
        assert!(chunks.len() > 1);

        let overlap_words = ((CHUNK_OVERLAP_TOKENS as f32) * TOKENS_PER_WORD).round() as usize;
        for pair in chunks.windows(2) {
            let first_words: Vec<&str> = pair[0].text.split_whitespace().collect();
            let second_words: Vec<&str> = pair[1].text.split_whitespace().collect();
            let first_suffix = &first_words[first_words.len() - overlap_words..];
            let second_prefix = &second_words[..overlap_words];
            assert_eq!(first_suffix, second_prefix, "adjacent chunks should overlap");
        }
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i);
        }
    }

    #[test]
    fn start_index_offsets_chunk_indices() {
        let chunks = chunk_text("a short sentence", None, 5);
        assert_eq!(chunks[0].chunk_index, 5);
    }
}
