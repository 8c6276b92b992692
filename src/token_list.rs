use crate::types::{PipelineItem, Span, Token};

/// Segment texts the spell checker never sees, so they do not consume checked words.
const SPELLCHECK_SKIP: &[&str] = &[",", ".", ":", "?", "(", ")", "/", "\""];

/// Splits raw text on whitespace into tokens with ordinal indices and half-open
/// character spans.
pub fn init_tokens(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;
    let mut char_count = 0usize;
    let mut word = String::new();

    for ch in text.chars() {
        if ch.is_whitespace() {
            if let Some(begin) = start.take() {
                let index = tokens.len();
                let span = Span::new(begin, char_count);
                tokens.push(Token::new(std::mem::take(&mut word), index, span));
            }
        } else {
            if start.is_none() {
                start = Some(char_count);
            }
            word.push(ch);
        }
        char_count += 1;
    }
    if let Some(begin) = start {
        let index = tokens.len();
        tokens.push(Token::new(word, index, Span::new(begin, char_count)));
    }
    tokens
}

/// Surfaces of all text tokens, space-joined.
pub fn extract_text(items: &[PipelineItem]) -> String {
    items
        .iter()
        .filter_map(PipelineItem::as_token)
        .map(|token| token.surface.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// The text handed to the normalizer: tokenized pieces of every non-deleted token.
pub fn extract_tokenized_text(items: &[PipelineItem]) -> String {
    items
        .iter()
        .filter_map(PipelineItem::as_token)
        .filter(|token| !token.is_deleted())
        .flat_map(|token| token.tokenized.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalized segment texts, space-joined. With `with_tags`, tag tokens and embedded
/// tag segments are kept in place; otherwise they are left out.
pub fn extract_normalized_text(items: &[PipelineItem], with_tags: bool) -> String {
    let mut words: Vec<&str> = Vec::new();
    for item in items {
        match item {
            PipelineItem::Tag(tag) => {
                if with_tags {
                    words.push(&tag.name);
                }
            }
            PipelineItem::Token(token) => words.extend(
                token
                    .normalized
                    .iter()
                    .filter(|segment| with_tags || !segment.is_tag())
                    .map(|segment| segment.text.as_str()),
            ),
        }
    }
    words.join(" ")
}

/// `word pos` pairs for a phrasing parser, one line per sentence.
pub fn extract_tagged_text(items: &[PipelineItem], sentence_tag: &str) -> String {
    split_sentences(items, sentence_tag)
        .into_iter()
        .map(|sentence| {
            sentence
                .iter()
                .filter_map(PipelineItem::as_token)
                .flat_map(|token| token.normalized.iter())
                .filter(|segment| !segment.is_tag())
                .map(|segment| format!("{} {}", segment.text, segment.pos))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Normalized text of each sentence, tags left out.
pub fn sentence_representation(items: &[PipelineItem], sentence_tag: &str) -> Vec<String> {
    split_sentences(items, sentence_tag)
        .into_iter()
        .map(|sentence| extract_normalized_text(sentence, false))
        .filter(|text| !text.is_empty())
        .collect()
}

/// Splits the stream after every sentence tag; the tag stays with the sentence it ends.
pub fn split_sentences<'a>(
    items: &'a [PipelineItem],
    sentence_tag: &str,
) -> Vec<&'a [PipelineItem]> {
    let mut sentences = Vec::new();
    let mut start = 0usize;
    for (i, item) in items.iter().enumerate() {
        if item.is_tag_named(sentence_tag) {
            sentences.push(&items[start..=i]);
            start = i + 1;
        }
    }
    if start < items.len() {
        sentences.push(&items[start..]);
    }
    sentences
}

/// Overwrites segment words with a spell-checked word stream.
///
/// Tokens are updated in order; punctuation segments are skipped and changed segments
/// are flagged. Stops at the first token the remaining stream cannot cover, leaving it
/// and everything after untouched. Returns the number of words consumed.
pub fn apply_spellchecked(items: &mut [PipelineItem], checked: &[String]) -> usize {
    let mut used = 0usize;
    for item in items.iter_mut() {
        let PipelineItem::Token(token) = item else {
            continue;
        };
        match apply_spellchecked_token(token, &checked[used..]) {
            Some(consumed) => used += consumed,
            None => {
                tracing::warn!(
                    source_index = token.source_index,
                    remaining = checked.len() - used,
                    "spellcheck: word stream too short; remaining tokens left unchanged"
                );
                break;
            }
        }
    }
    used
}

fn apply_spellchecked_token(token: &mut Token, checked: &[String]) -> Option<usize> {
    let needed = token
        .normalized
        .iter()
        .filter(|segment| !segment.is_tag())
        .flat_map(|segment| segment.text.split_whitespace())
        .filter(|word| !SPELLCHECK_SKIP.contains(word))
        .count();
    if checked.len() < needed {
        return None;
    }

    let mut used = 0usize;
    for segment in token.normalized.iter_mut().filter(|segment| !segment.is_tag()) {
        let mut changed = false;
        let words: Vec<String> = segment
            .text
            .split_whitespace()
            .map(|word| {
                if SPELLCHECK_SKIP.contains(&word) {
                    return word.to_string();
                }
                let replacement = &checked[used];
                used += 1;
                if replacement != word {
                    changed = true;
                }
                replacement.clone()
            })
            .collect();
        if changed {
            segment.text = words.join(" ");
            segment.spell_corrected = true;
        }
    }
    Some(used)
}
