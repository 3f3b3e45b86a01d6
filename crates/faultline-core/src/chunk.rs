use std::iter::FusedIterator;

use crate::errors::ConfigError;

/// Hard size limit of one embed description, in characters.
pub const DEFAULT_WRAP_LEN: usize = 2000;

/// Fixed text placed around every chunk payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Marker {
    prefix: String,
    suffix: String,
}

impl Marker {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// Markdown code fence: "```lang\n" ... "```".
    pub fn code_fence(lang: &str) -> Self {
        Self::new(format!("```{lang}\n"), "```")
    }

    /// Characters consumed by the marker in every chunk.
    pub fn overhead(&self) -> usize {
        self.prefix.chars().count() + self.suffix.chars().count()
    }

    fn wrap(&self, payload: &str) -> Chunk {
        let mut wrapped =
            String::with_capacity(self.prefix.len() + payload.len() + self.suffix.len());
        wrapped.push_str(&self.prefix);
        wrapped.push_str(payload);
        wrapped.push_str(&self.suffix);
        Chunk {
            payload_start: self.prefix.len(),
            payload_end: self.prefix.len() + payload.len(),
            wrapped,
        }
    }
}

/// Splits diagnostic text into marker-wrapped chunks that each fit
/// within `wrap_len` characters.
#[derive(Clone, Debug)]
pub struct ChunkEncoder {
    wrap_len: usize,
    marker: Marker,
    stride: usize,
}

impl ChunkEncoder {
    /// Fails when the marker alone fills the whole wrap length.
    pub fn new(wrap_len: usize, marker: Marker) -> Result<Self, ConfigError> {
        let overhead = marker.overhead();
        if overhead >= wrap_len {
            return Err(ConfigError::NoUsablePayload { wrap_len, overhead });
        }
        Ok(Self {
            wrap_len,
            stride: wrap_len - overhead,
            marker,
        })
    }

    pub fn wrap_len(&self) -> usize {
        self.wrap_len
    }

    pub fn marker(&self) -> &Marker {
        &self.marker
    }

    /// Payload characters carried by each chunk.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Lazily split `text`. Calling this again starts over from the beginning.
    ///
    /// Always yields at least one chunk, so empty text produces the bare marker.
    pub fn split<'a>(&'a self, text: &'a str) -> Chunks<'a> {
        Chunks {
            encoder: self,
            rest: text,
            started: false,
        }
    }
}

/// A wrapped chunk: [`Chunk::as_str`] is the wire text, [`Chunk::payload`]
/// the unwrapped slice of the input text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    wrapped: String,
    payload_start: usize,
    payload_end: usize,
}

impl Chunk {
    pub fn as_str(&self) -> &str {
        &self.wrapped
    }

    pub fn payload(&self) -> &str {
        &self.wrapped[self.payload_start..self.payload_end]
    }

    /// Wrapped length in characters.
    pub fn char_len(&self) -> usize {
        self.wrapped.chars().count()
    }

    pub fn into_string(self) -> String {
        self.wrapped
    }
}

/// Iterator returned by [`ChunkEncoder::split`].
#[derive(Clone, Debug)]
pub struct Chunks<'a> {
    encoder: &'a ChunkEncoder,
    rest: &'a str,
    started: bool,
}

impl Iterator for Chunks<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.rest.is_empty() {
            if self.started {
                return None;
            }
            self.started = true;
            return Some(self.encoder.marker.wrap(""));
        }
        self.started = true;

        // Byte offset of the first char past the stride; never splits a code point.
        let end = self
            .rest
            .char_indices()
            .nth(self.encoder.stride)
            .map_or(self.rest.len(), |(i, _)| i);
        let (head, tail) = self.rest.split_at(end);
        self.rest = tail;
        Some(self.encoder.marker.wrap(head))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.rest.is_empty() {
            let n = usize::from(!self.started);
            return (n, Some(n));
        }
        let stride = self.encoder.stride;
        let lower = self.rest.len().div_ceil(4).div_ceil(stride);
        let upper = self.rest.len().div_ceil(stride);
        (lower.max(1), Some(upper))
    }
}

impl FusedIterator for Chunks<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder(wrap_len: usize, prefix: &str, suffix: &str) -> ChunkEncoder {
        ChunkEncoder::new(wrap_len, Marker::new(prefix, suffix)).unwrap()
    }

    fn rejoin(chunks: impl Iterator<Item = Chunk>) -> String {
        chunks.map(|c| c.payload().to_string()).collect()
    }

    #[test]
    fn code_fence_overhead() {
        assert_eq!(Marker::code_fence("py").overhead(), 9);
        assert_eq!(Marker::code_fence("").overhead(), 7);
    }

    #[test]
    fn rejects_marker_that_fills_wrap_len() {
        let err = ChunkEncoder::new(5, Marker::new("```", "``")).unwrap_err();
        assert_eq!(
            err,
            ConfigError::NoUsablePayload {
                wrap_len: 5,
                overhead: 5
            }
        );
        assert!(ChunkEncoder::new(6, Marker::new("```", "``")).is_ok());
    }

    #[test]
    fn empty_text_yields_one_bare_marker() {
        let enc = encoder(2000, "```py\n", "```");
        let chunks: Vec<Chunk> = enc.split("").collect();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].as_str(), "```py\n```");
        assert_eq!(chunks[0].payload(), "");
    }

    #[test]
    fn short_text_is_single_chunk() {
        let enc = encoder(2000, "<<<", ">>");
        let chunks: Vec<Chunk> = enc.split("ValueError: bad input").collect();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].as_str(), "<<<ValueError: bad input>>");
    }

    #[test]
    fn five_thousand_chars_split_into_three() {
        let enc = encoder(2000, "<<<", ">>");
        let text: String = (0..5000).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let chunks: Vec<Chunk> = enc.split(&text).collect();

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].payload(), &text[..1995]);
        assert_eq!(chunks[1].payload().len(), 1995);
        assert_eq!(chunks[2].payload().len(), 1010);
        assert_eq!(rejoin(chunks.into_iter()), text);
    }

    #[test]
    fn wrapped_length_never_exceeds_limit() {
        let enc = encoder(50, "```rust\n", "```");
        for len in [0, 1, 38, 39, 40, 41, 77, 78, 79, 500] {
            let text = "x".repeat(len);
            for chunk in enc.split(&text) {
                assert!(chunk.char_len() <= 50, "len {len}: {}", chunk.char_len());
            }
            assert_eq!(rejoin(enc.split(&text)), text);
        }
    }

    #[test]
    fn exact_multiple_of_stride_has_no_trailing_empty_chunk() {
        let enc = encoder(10, "[", "]");
        let text = "a".repeat(16);
        let chunks: Vec<Chunk> = enc.split(&text).collect();
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.payload().len() == 8));
    }

    #[test]
    fn multibyte_text_round_trips_on_char_boundaries() {
        let enc = encoder(8, "[", "]");
        let text = "héllo wörld 🦀🦀🦀 ünïcödé";
        let chunks: Vec<Chunk> = enc.split(text).collect();
        for chunk in &chunks {
            assert!(chunk.char_len() <= 8);
            assert!(chunk.payload().chars().count() <= 6);
        }
        assert_eq!(rejoin(chunks.into_iter()), text);
    }

    #[test]
    fn split_is_restartable() {
        let enc = encoder(20, "<", ">");
        let text = "0123456789".repeat(7);
        let first: Vec<Chunk> = enc.split(&text).collect();
        let second: Vec<Chunk> = enc.split(&text).collect();
        assert_eq!(first, second);

        let mut iter = enc.split(&text);
        iter.next();
        let resumed = iter.clone();
        assert_eq!(iter.count(), resumed.count());
    }

    #[test]
    fn iterator_is_fused() {
        let enc = encoder(20, "<", ">");
        let mut iter = enc.split("abc");
        assert!(iter.next().is_some());
        assert!(iter.next().is_none());
        assert!(iter.next().is_none());
    }

    #[test]
    fn size_hint_brackets_actual_count() {
        let enc = encoder(12, "<", ">");
        let texts = [
            String::new(),
            "a".to_string(),
            "b".repeat(10),
            "ü".repeat(31),
            "c".repeat(100),
        ];
        for text in &texts {
            let (lower, upper) = enc.split(text).size_hint();
            let actual = enc.split(text).count();
            assert!(lower <= actual, "{text:?}: {lower} > {actual}");
            assert!(upper.unwrap() >= actual, "{text:?}: {upper:?} < {actual}");
        }
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn payloads_rejoin_to_input(
            text in any::<String>(),
            wrap_len in 2usize..300,
            prefix in ".{0,5}",
            suffix in ".{0,5}",
        ) {
            let marker = Marker::new(prefix, suffix);
            prop_assume!(marker.overhead() < wrap_len);
            let enc = ChunkEncoder::new(wrap_len, marker).unwrap();

            let rebuilt: String = enc.split(&text).map(|c| c.payload().to_string()).collect();
            prop_assert_eq!(rebuilt, text);
        }

        #[test]
        fn chunks_fit_wrap_len(
            text in "\\PC{0,600}",
            wrap_len in 2usize..300,
            lang in "[a-z]{0,4}",
        ) {
            let marker = Marker::code_fence(&lang);
            prop_assume!(marker.overhead() < wrap_len);
            let enc = ChunkEncoder::new(wrap_len, marker).unwrap();

            let chunks: Vec<Chunk> = enc.split(&text).collect();
            prop_assert!(!chunks.is_empty());
            for chunk in &chunks {
                prop_assert!(chunk.char_len() <= wrap_len);
            }
            let expected = text.chars().count().div_ceil(enc.stride()).max(1);
            prop_assert_eq!(chunks.len(), expected);
        }
    }
}
