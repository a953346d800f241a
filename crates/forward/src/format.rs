use unicode_segmentation::UnicodeSegmentation;

/// Appended to text cut at the length limit.
pub const TRUNCATION_MARKER: &str = "...";

/// ZERO WIDTH NON-JOINER. Ends a trailing prepend character's cluster so the
/// marker stays three clusters of its own.
const CLUSTER_BREAK: char = '\u{200C}';

/// Shape message text for the destination.
///
/// Length is counted in extended grapheme clusters, so a cut never lands
/// inside a combining sequence or an emoji cluster. Text longer than
/// `max_length` keeps its first `max_length` clusters plus
/// [`TRUNCATION_MARKER`]; shorter text is returned unchanged.
///
/// When the last kept cluster is a prepend character (e.g. U+0600) it would
/// swallow the first dot of the marker, so a zero width non-joiner is
/// appended to it first.
pub fn format_message(text: &str, max_length: usize) -> String {
    let Some((cut, _)) = text.grapheme_indices(true).nth(max_length) else {
        return text.to_string();
    };
    let kept = &text[..cut];
    let out = format!("{kept}{TRUNCATION_MARKER}");
    if display_len(&out) == max_length + display_len(TRUNCATION_MARKER) {
        return out;
    }
    format!("{kept}{CLUSTER_BREAK}{TRUNCATION_MARKER}")
}

/// Length of `text` in the unit [`format_message`] uses.
pub fn display_len(text: &str) -> usize {
    text.graphemes(true).count()
}
