use crate::types::{AlignmentWarning, NormalizedSegment, TAG_POS};

/// Collects the segments one original token receives from the norm nodes it consumes.
pub(crate) struct SegmentWriter<'a> {
    split_punctuation: &'a [char],
    source_index: usize,
    segments: Vec<NormalizedSegment>,
    warnings: Vec<AlignmentWarning>,
}

impl<'a> SegmentWriter<'a> {
    pub(crate) fn new(split_punctuation: &'a [char], source_index: usize) -> Self {
        Self {
            split_punctuation,
            source_index,
            segments: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// One segment per whitespace word of `text`.
    ///
    /// A trailing split-punctuation character becomes its own segment whose pos is the
    /// character itself; words opening with `<` are embedded tags and get the `TAG` pos.
    pub(crate) fn push_words(&mut self, text: &str, pos: &str) {
        if text.trim().is_empty() {
            self.warn_empty(text);
            return;
        }
        for word in text.split_whitespace() {
            if word.starts_with('<') {
                self.segments.push(NormalizedSegment::new(word, TAG_POS));
                continue;
            }

            let (core, punct) = self.split_trailing_punctuation(word);
            if core.is_empty() {
                self.warn_empty(word);
            } else {
                self.segments.push(NormalizedSegment::new(core, pos));
            }
            if let Some(punct) = punct {
                let punct = punct.to_string();
                self.segments.push(NormalizedSegment::new(punct.clone(), punct));
            }
        }
    }

    /// The whole trimmed text as a single segment, no splitting.
    pub(crate) fn push_verbatim(&mut self, text: &str, pos: &str) {
        let text = text.trim();
        if text.is_empty() {
            self.warn_empty(text);
            return;
        }
        self.segments.push(NormalizedSegment::new(text, pos));
    }

    pub(crate) fn finish(self) -> (Vec<NormalizedSegment>, Vec<AlignmentWarning>) {
        (self.segments, self.warnings)
    }

    fn split_trailing_punctuation<'w>(&self, word: &'w str) -> (&'w str, Option<char>) {
        match word.chars().last() {
            Some(last) if self.split_punctuation.contains(&last) => {
                (&word[..word.len() - last.len_utf8()], Some(last))
            }
            _ => (word, None),
        }
    }

    fn warn_empty(&mut self, text: &str) {
        tracing::warn!(
            source_index = self.source_index,
            text,
            "alignment: normalized word is empty after punctuation stripping; segment skipped"
        );
        self.warnings.push(AlignmentWarning::EmptySegment {
            source_index: self.source_index,
            text: text.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPLIT: &[char] = &[',', '.'];

    fn texts(segments: &[NormalizedSegment]) -> Vec<(&str, &str)> {
        segments
            .iter()
            .map(|s| (s.text.as_str(), s.pos.as_str()))
            .collect()
    }

    #[test]
    fn words_share_the_node_pos() {
        let mut writer = SegmentWriter::new(SPLIT, 1);
        writer.push_words("fimm sjö núll", "tfkfn");
        let (segments, warnings) = writer.finish();
        assert_eq!(
            texts(&segments),
            [("fimm", "tfkfn"), ("sjö", "tfkfn"), ("núll", "tfkfn")]
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn trailing_punctuation_is_split_off() {
        let mut writer = SegmentWriter::new(SPLIT, 4);
        writer.push_words("mínútur.", "nvfo");
        writer.push_words("já,", "aa");
        let (segments, _) = writer.finish();
        assert_eq!(
            texts(&segments),
            [("mínútur", "nvfo"), (".", "."), ("já", "aa"), (",", ",")]
        );
    }

    #[test]
    fn embedded_tag_gets_tag_pos() {
        let mut writer = SegmentWriter::new(SPLIT, 0);
        writer.push_words("<sil> halló", "au");
        let (segments, _) = writer.finish();
        assert!(segments[0].is_tag());
        assert_eq!(segments[0].text, "<sil>");
        assert_eq!(texts(&segments)[1], ("halló", "au"));
    }

    #[test]
    fn stray_period_keeps_punctuation_and_warns() {
        let mut writer = SegmentWriter::new(SPLIT, 9);
        writer.push_words(".", "pl");
        let (segments, warnings) = writer.finish();
        assert_eq!(texts(&segments), [(".", ".")]);
        assert_eq!(
            warnings,
            [AlignmentWarning::EmptySegment {
                source_index: 9,
                text: ".".to_string()
            }]
        );
    }

    #[test]
    fn blank_processed_text_warns() {
        let mut writer = SegmentWriter::new(SPLIT, 5);
        writer.push_words("", "x");
        writer.push_words("  ", "x");
        let (segments, warnings) = writer.finish();
        assert!(segments.is_empty());
        assert_eq!(warnings.len(), 2);
        assert!(matches!(
            warnings[0],
            AlignmentWarning::EmptySegment { source_index: 5, .. }
        ));
    }

    #[test]
    fn verbatim_keeps_inner_spaces() {
        let mut writer = SegmentWriter::new(SPLIT, 2);
        writer.push_verbatim("  sautján hundruð.  ", "tfkfn");
        writer.push_verbatim("   ", "x");
        let (segments, warnings) = writer.finish();
        assert_eq!(texts(&segments), [("sautján hundruð.", "tfkfn")]);
        assert_eq!(warnings.len(), 1);
    }
}
