/*!
 * Segmentation engines.
 *
 * This module turns recognizer output into readable subtitle events:
 * - `boundary`: choice of natural split points inside oversized text
 * - `word_binding`: binding of word timestamps to coarse events
 * - `sentence`: sentence-level merge and split of whole events
 * - `bilingual`: merge of two language tracks into one and back
 * - `trim`: tightening of event bounds to detected speech
 */

pub mod bilingual;
pub mod boundary;
pub mod sentence;
pub mod trim;
pub mod word_binding;

pub use bilingual::{BilingualSplit, OverlapCase, merge_bilingual, split_bilingual};
pub use boundary::{SplitDecision, SplitRules, SplitStrategy, TokenSet, find_split_position, split_text};
pub use sentence::{SegmentationStats, merge_and_split};
pub use trim::trim_events;
pub use word_binding::{WordBinding, align_words, bind_words, compose_events};
