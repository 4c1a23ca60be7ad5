use std::collections::VecDeque;

/// Recursive character splitter.
///
/// Splits on the coarsest separator present (`\n\n`, `\n`, ` `, then single
/// characters) and merges pieces back into chunks of at most `chunk_size`
/// characters, carrying up to `chunk_overlap` characters into the next chunk.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<&'static str>,
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self::new(1000, 200)
    }
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size.saturating_sub(1)),
            separators: vec!["\n\n", "\n", " ", ""],
        }
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    fn split_recursive(&self, text: &str, separators: &[&'static str]) -> Vec<String> {
        let (separator, remaining) = match separators
            .iter()
            .position(|s| s.is_empty() || text.contains(s))
        {
            Some(i) => (separators[i], &separators[i + 1..]),
            None => ("", &separators[separators.len()..]),
        };

        let pieces: Vec<String> = if separator.is_empty() {
            text.chars().map(String::from).collect()
        } else {
            text.split(separator)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect()
        };

        let mut chunks = Vec::new();
        let mut short_pieces: Vec<String> = Vec::new();

        for piece in pieces {
            if char_len(&piece) < self.chunk_size {
                short_pieces.push(piece);
                continue;
            }
            if !short_pieces.is_empty() {
                chunks.extend(self.merge(&short_pieces, separator));
                short_pieces.clear();
            }
            if remaining.is_empty() {
                chunks.push(piece);
            } else {
                chunks.extend(self.split_recursive(&piece, remaining));
            }
        }

        if !short_pieces.is_empty() {
            chunks.extend(self.merge(&short_pieces, separator));
        }

        chunks
    }

    fn merge(&self, pieces: &[String], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut chunks = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);
            let joined_len = |window: &VecDeque<&str>| if window.is_empty() { 0 } else { sep_len };

            if total + len + joined_len(&window) > self.chunk_size {
                if !window.is_empty() {
                    push_trimmed(&mut chunks, &join(&window, separator));

                    while total > self.chunk_overlap
                        || (total > 0 && total + len + joined_len(&window) > self.chunk_size)
                    {
                        let Some(first) = window.pop_front() else {
                            break;
                        };
                        let removed_sep = if window.is_empty() { 0 } else { sep_len };
                        total = total.saturating_sub(char_len(first) + removed_sep);
                    }
                }
            }

            window.push_back(piece);
            total += len + if window.len() > 1 { sep_len } else { 0 };
        }

        push_trimmed(&mut chunks, &join(&window, separator));
        chunks
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn join(window: &VecDeque<&str>, separator: &str) -> String {
    window.iter().copied().collect::<Vec<_>>().join(separator)
}

fn push_trimmed(chunks: &mut Vec<String>, chunk: &str) {
    let trimmed = chunk.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}
