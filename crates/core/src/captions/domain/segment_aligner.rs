use crate::captions::domain::caption::Caption;
use crate::narration::domain::sentence::Sentence;
use crate::shared::validation::ValidationError;
use crate::transcription::domain::transcript_segment::TranscriptSegment;

/// Greedy one-pass sentence-to-timing alignment.
///
/// Sentence `i` borrows the window of transcript segment `i` verbatim. Once
/// the segments run out, each further sentence gets a synthetic window of
/// `default_duration` seconds chained to the previous caption's end (or to
/// 0.0 when there are no segments at all). Surplus segments are ignored.
///
/// Fails only when `default_duration` is not positive, since sentences and
/// segments are validated on construction.
pub fn align(
    sentences: &[Sentence],
    segments: &[TranscriptSegment],
    default_duration: f64,
) -> Result<Vec<Caption>, ValidationError> {
    let mut captions: Vec<Caption> = Vec::with_capacity(sentences.len());
    for (i, sentence) in sentences.iter().enumerate() {
        let (start, end) = match segments.get(i) {
            Some(segment) => (segment.start(), segment.end()),
            None => {
                let start = captions.last().map_or(0.0, Caption::end);
                (start, start + default_duration)
            }
        };
        captions.push(Caption::new(sentence.as_str(), start, end)?);
    }

    let extrapolated = sentences.len().saturating_sub(segments.len());
    if extrapolated > 0 {
        log::debug!("Extrapolated timing for {extrapolated} sentences past the transcript");
    } else if segments.len() > sentences.len() {
        log::debug!(
            "Ignoring {} surplus transcript segments",
            segments.len() - sentences.len()
        );
    }

    Ok(captions)
}
