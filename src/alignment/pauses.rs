use crate::config::{NormalizerConfig, PunctuationMode};
use crate::types::{NormalizedSegment, PipelineItem, TagToken, Token};

/// Turns punctuation segments into pause tags.
///
/// A token whose only segment is punctuation is replaced by the tag. Otherwise the tag
/// goes before the token when the punctuation opens it (e.g. a parenthesis) and after it
/// in every other position. A full stop on the last text token of a sentence yields the
/// sentence tag instead, or nothing when a sentence tag already follows.
pub fn insert_pause_tags(items: &[PipelineItem], config: &NormalizerConfig) -> Vec<PipelineItem> {
    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let token = match item {
            PipelineItem::Tag(_) => {
                out.push(item.clone());
                continue;
            }
            PipelineItem::Token(token) => token,
        };

        let punct_index = punctuation_indices(token, config);
        if punct_index.is_empty() {
            out.push(item.clone());
            continue;
        }

        let next = items.get(i + 1);
        let sentence_final = next.map_or(true, |next| next.is_tag_named(&config.sentence_tag));
        let sentence_tag_follows = next.is_some_and(|next| next.is_tag_named(&config.sentence_tag));

        let kept = kept_token(token, &punct_index, config.punctuation_mode);
        let mut token_added = false;
        for &ind in &punct_index {
            let is_full_stop = token.normalized[ind].text == NormalizerConfig::FULL_STOP;
            let tag = if is_full_stop && sentence_final {
                if sentence_tag_follows {
                    None
                } else {
                    Some(TagToken::new(config.sentence_tag.clone(), token.source_index))
                }
            } else {
                Some(TagToken::new(config.pause_tag.clone(), token.source_index))
            };
            tracing::debug!(
                source_index = token.source_index,
                segment = ind,
                tag = tag.as_ref().map_or("", |tag| tag.name.as_str()),
                "pauses: punctuation segment"
            );

            if ind == 0 && token.normalized.len() > 1 {
                out.extend(tag.map(PipelineItem::from));
                if !token_added {
                    out.extend(kept.clone().map(PipelineItem::from));
                    token_added = true;
                }
            } else {
                if !token_added {
                    out.extend(kept.clone().map(PipelineItem::from));
                    token_added = true;
                }
                out.extend(tag.map(PipelineItem::from));
            }
        }
    }
    out
}

fn punctuation_indices(token: &Token, config: &NormalizerConfig) -> Vec<usize> {
    let slash = token.surface == config.slash_surface;
    token
        .normalized
        .iter()
        .enumerate()
        .filter(|(_, segment)| slash || config.is_pause_pos(&segment.pos))
        .map(|(i, _)| i)
        .collect()
}

/// The token as it continues downstream, or `None` when nothing is left of it.
fn kept_token(token: &Token, punct_index: &[usize], mode: PunctuationMode) -> Option<Token> {
    match mode {
        PunctuationMode::Keep => Some(token.clone()),
        PunctuationMode::Replace => {
            let remaining: Vec<NormalizedSegment> = token
                .normalized
                .iter()
                .enumerate()
                .filter(|(i, _)| !punct_index.contains(i))
                .map(|(_, segment)| segment.clone())
                .collect();
            if remaining.is_empty() {
                return None;
            }
            let mut kept = token.clone();
            kept.normalized = remaining;
            Some(kept)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Span;

    fn normalized(surface: &str, idx: usize, segments: &[(&str, &str)]) -> PipelineItem {
        let mut token = Token::new(surface, idx, Span::default());
        token.normalized = segments
            .iter()
            .map(|(text, pos)| NormalizedSegment::new(*text, *pos))
            .collect();
        token.into()
    }

    fn render(items: &[PipelineItem]) -> Vec<String> {
        items
            .iter()
            .map(|item| match item {
                PipelineItem::Tag(tag) => tag.name.clone(),
                PipelineItem::Token(token) => token
                    .normalized
                    .iter()
                    .map(|s| s.text.as_str())
                    .collect::<Vec<_>>()
                    .join("+"),
            })
            .collect()
    }

    #[test]
    fn comma_token_becomes_pause() {
        let items = vec![
            normalized("já", 0, &[("já", "aa")]),
            normalized(",", 1, &[(",", ",")]),
            normalized("nei", 2, &[("nei", "aa")]),
        ];
        let out = insert_pause_tags(&items, &NormalizerConfig::default());
        assert_eq!(render(&out), ["já", "<sil>", "nei"]);
    }

    #[test]
    fn trailing_punctuation_tag_follows_token() {
        let items = vec![
            normalized("2367,", 0, &[("tveir", "tfkfn"), ("sjö", "tfkfn"), (",", ",")]),
            normalized("takk", 1, &[("takk", "nhen")]),
        ];
        let out = insert_pause_tags(&items, &NormalizerConfig::default());
        assert_eq!(render(&out), ["tveir+sjö", "<sil>", "takk"]);
    }

    #[test]
    fn opening_punctuation_tag_precedes_token() {
        let items = vec![
            normalized("(sjá", 0, &[("(", "pa"), ("sjá", "sbm")]),
            normalized("hér)", 1, &[("hér", "aa"), (")", "pl")]),
            normalized("takk", 2, &[("takk", "nhen")]),
        ];
        let out = insert_pause_tags(&items, &NormalizerConfig::default());
        assert_eq!(render(&out), ["<sil>", "sjá", "hér", "<sil>", "takk"]);
    }

    #[test]
    fn parenthesised_word_gets_tags_on_both_sides() {
        let items = vec![
            normalized("(já)", 0, &[("(", "pa"), ("já", "aa"), (")", "pl")]),
            normalized("takk", 1, &[("takk", "nhen")]),
        ];
        let out = insert_pause_tags(&items, &NormalizerConfig::default());
        assert_eq!(render(&out), ["<sil>", "já", "<sil>", "takk"]);
    }

    #[test]
    fn keep_mode_leaves_punctuation_on_token() {
        let config = NormalizerConfig {
            punctuation_mode: PunctuationMode::Keep,
            ..NormalizerConfig::default()
        };
        let items = vec![
            normalized("já,", 0, &[("já", "aa"), (",", ",")]),
            normalized("nei", 1, &[("nei", "aa")]),
        ];
        let out = insert_pause_tags(&items, &config);
        assert_eq!(render(&out), ["já+,", "<sil>", "nei"]);
    }

    #[test]
    fn sentence_final_full_stop_emits_sentence_tag() {
        let items = vec![
            normalized("mín.", 0, &[("mínútur", "nvfn"), (".", ".")]),
        ];
        let out = insert_pause_tags(&items, &NormalizerConfig::default());
        assert_eq!(render(&out), ["mínútur", "<sentence>"]);
    }

    #[test]
    fn full_stop_before_sentence_tag_adds_nothing() {
        let items = vec![
            normalized("rigningu.", 0, &[("rigningu", "nveþ"), (".", ".")]),
            TagToken::new("<sentence>", 0).into(),
            normalized("Norðaustanátt", 1, &[("Norðaustanátt", "nven")]),
        ];
        let out = insert_pause_tags(&items, &NormalizerConfig::default());
        assert_eq!(render(&out), ["rigningu", "<sentence>", "Norðaustanátt"]);
    }

    #[test]
    fn slash_token_is_all_punctuation() {
        let items = vec![
            normalized("/", 0, &[("skástrik", "nhen")]),
            normalized("já", 1, &[("já", "aa")]),
        ];
        let out = insert_pause_tags(&items, &NormalizerConfig::default());
        assert_eq!(render(&out), ["<sil>", "já"]);
    }

    #[test]
    fn tags_pass_unchanged() {
        let items: Vec<PipelineItem> = vec![
            TagToken::range_start("<lang xml:lang=\"en-GB\">", 0).into(),
            normalized("hello", 0, &[("hello", "e")]),
            TagToken::range_end("</lang>", 0).into(),
        ];
        let out = insert_pause_tags(&items, &NormalizerConfig::default());
        assert_eq!(out, items);
    }
}
