//! Bounded trailing window over observed session output

use std::collections::HashSet;

/// Trailing window of the most recent output.
///
/// Offsets handed out are absolute: they count every byte ever appended, so
/// dropping old content never makes an earlier occurrence look new. The
/// window always begins at a line start, so truncation cannot turn the tail
/// of a longer line into something that reads like a standalone signal.
#[derive(Debug, Clone)]
pub struct OutputWindow {
    text: String,
    capacity: usize,
    dropped: usize,
}

impl OutputWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            text: String::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    /// Append complete lines, then drop whole lines from the front until the
    /// window fits its capacity again.
    pub fn append_lines<'a>(&mut self, lines: impl IntoIterator<Item = &'a str>) {
        for line in lines {
            self.text.push_str(line);
            self.text.push('\n');
        }
        self.truncate_front();
    }

    fn truncate_front(&mut self) {
        if self.text.len() <= self.capacity {
            return;
        }

        let excess = self.text.len() - self.capacity;
        // Cut just after the first newline at or beyond `excess`; the last
        // byte is always a newline, so a cut point exists.
        let cut = self.text.as_bytes()[excess..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(self.text.len(), |at| excess + at + 1);

        self.text.drain(..cut);
        self.dropped += cut;
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Absolute offset of the first byte still held
    pub fn start_offset(&self) -> usize {
        self.dropped
    }

    /// Absolute offset one past the last byte appended
    pub fn end_offset(&self) -> usize {
        self.dropped + self.text.len()
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Lines of `current` that were not already visible in `previous`.
///
/// Handles both a scrolled screen (a suffix of the previous capture reappears
/// at the top) and an in-place redraw (the top is unchanged and only lower
/// lines differ); whichever explains more of the new capture wins. When
/// neither lines up (a scroll combined with a changed line), only lines that
/// were not on the previous screen at all count as new.
pub fn unseen_lines<'a>(previous: &[String], current: &'a str) -> Vec<&'a str> {
    let current: Vec<&str> = current.lines().collect();

    let max_overlap = previous.len().min(current.len());
    let scrolled = (1..=max_overlap)
        .rev()
        .find(|&k| {
            previous[previous.len() - k..]
                .iter()
                .zip(&current[..k])
                .all(|(p, c)| p == c)
        })
        .unwrap_or(0);

    let unchanged_top = previous
        .iter()
        .zip(&current)
        .take_while(|(p, c)| p == c)
        .count();

    if scrolled == 0 && unchanged_top == 0 && !previous.is_empty() {
        let seen: HashSet<&str> = previous.iter().map(String::as_str).collect();
        return current
            .into_iter()
            .filter(|line| !seen.contains(line))
            .collect();
    }

    current[scrolled.max(unchanged_top)..].to_vec()
}
