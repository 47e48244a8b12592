/*!
 * Grouping of subtitle lines into translation requests.
 *
 * Lines are packed greedily into newline-joined blocks whose display width
 * stays under a limit. Full-width characters count double, so a block of
 * CJK text is limited to about half as many characters as a Latin one.
 */

use std::ops::Range;

/// Whether a character occupies two columns on screen
pub fn is_full_width(c: char) -> bool {
    matches!(
        c as u32,
        0x1100..=0x115F
            | 0x2E80..=0x303E
            | 0x3041..=0x33FF
            | 0x3400..=0x4DBF
            | 0x4E00..=0x9FFF
            | 0xA000..=0xA4CF
            | 0xAC00..=0xD7A3
            | 0xF900..=0xFAFF
            | 0xFE30..=0xFE4F
            | 0xFF00..=0xFF60
            | 0xFFE0..=0xFFE6
            | 0x20000..=0x2FFFD
            | 0x30000..=0x3FFFD
    )
}

/// Display width of a text, full-width characters counting 2
pub fn display_width(text: &str) -> usize {
    text.chars().map(|c| if is_full_width(c) { 2 } else { 1 }).sum()
}

/// Pack consecutive lines into batches of bounded display width.
///
/// Each batch's width includes one separator per line boundary. A single
/// line wider than the limit gets a batch of its own. Returns index ranges
/// into `lines` that together cover it exactly once, in order.
pub fn batch_lines<S: AsRef<str>>(lines: &[S], max_width: usize) -> Vec<Range<usize>> {
    let mut batches = Vec::new();
    let mut start = 0;
    let mut width = 0;

    for (i, line) in lines.iter().enumerate() {
        let line_width = display_width(line.as_ref());
        let added = if i > start { line_width + 1 } else { line_width };
        if i > start && width + added > max_width {
            batches.push(start..i);
            start = i;
            width = line_width;
        } else {
            width += added;
        }
    }
    if start < lines.len() {
        batches.push(start..lines.len());
    }
    batches
}

/// Flatten a text to one line so that it occupies exactly one line of a block
pub fn single_line(text: &str) -> String {
    text.lines().map(str::trim).filter(|l| !l.is_empty()).collect::<Vec<_>>().join(" ")
}

/// Split a translated block back into lines.
///
/// Returns `None` when the line count differs from what was sent.
pub fn split_translated(block: &str, expected: usize) -> Option<Vec<String>> {
    let mut lines: Vec<String> = block.split('\n').map(|l| l.trim().to_string()).collect();
    if lines.len() == expected + 1 && lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    if lines.len() == expected {
        Some(lines)
    } else {
        None
    }
}
