// ============================================================
// Layer 4 — Modality Aligner
// ============================================================
// Audio and visual streams are sampled at their own frame
// rates; words have their own timestamps. Before the streams
// can be stacked step by step they are resampled onto the
// reference intervals (usually the words):
//
//   words:  |── w0 ──|──── w1 ────|─ w2 ─|
//   audio:  |a0|a1|a2|a3|a4|a5|a6|a7|a8|a9|
//
//   aligned audio for w1 = mean(a3..a7) weighted by how much
//   of each frame falls inside w1's interval.
//
// A reference step that no frame overlaps gets a zero vector.
// A zero-length reference step takes the plain mean of the
// frames covering its instant.

use crate::domain::utterance::{FeatureStep, FeatureStreams, SegmentStreams};

/// Resample every segment of `other` onto the intervals of `reference`.
///
/// Segments present in `reference` but missing (or empty) in `other`
/// come out empty, so later selection drops them.
pub fn align_streams(reference: &FeatureStreams, other: &FeatureStreams) -> FeatureStreams {
    reference
        .iter()
        .map(|(video, segments)| {
            let aligned: SegmentStreams = segments
                .iter()
                .map(|(segment, ref_steps)| {
                    let frames = other
                        .get(video)
                        .and_then(|s| s.get(segment))
                        .map(Vec::as_slice)
                        .unwrap_or(&[]);
                    (segment.clone(), align_sequence(ref_steps, frames))
                })
                .collect();
            (video.clone(), aligned)
        })
        .collect()
}

/// Resample one sequence of frames onto the reference intervals.
pub fn align_sequence(reference: &[FeatureStep], frames: &[FeatureStep]) -> Vec<FeatureStep> {
    let Some(dim) = frames.first().map(FeatureStep::dim) else {
        return Vec::new();
    };

    reference
        .iter()
        .map(|r| {
            let mut acc    = vec![0.0f64; dim];
            let mut weight = 0.0f64;

            for f in frames {
                let w = if r.end > r.start {
                    (r.end.min(f.end) - r.start.max(f.start)).max(0.0)
                } else if f.start <= r.start && r.start < f.end {
                    1.0
                } else {
                    0.0
                };
                if w <= 0.0 {
                    continue;
                }
                for (a, &v) in acc.iter_mut().zip(&f.values) {
                    *a += w * v as f64;
                }
                weight += w;
            }

            let values = if weight > 0.0 {
                acc.iter().map(|&a| (a / weight) as f32).collect()
            } else {
                vec![0.0; dim]
            };
            FeatureStep::new(r.start, r.end, values)
        })
        .collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn step(start: f64, end: f64, values: &[f32]) -> FeatureStep {
        FeatureStep::new(start, end, values.to_vec())
    }

    #[test]
    fn test_overlap_weighted_mean() {
        let words  = vec![step(0.0, 1.0, &[0.0]), step(1.0, 2.0, &[0.0])];
        let frames = vec![
            step(0.0, 0.5, &[2.0, 0.0]),
            step(0.5, 1.5, &[4.0, 1.0]),
            step(1.5, 2.0, &[8.0, 3.0]),
        ];
        let out = align_sequence(&words, &frames);
        assert_eq!(out.len(), 2);
        // w0: 0.5*2 + 0.5*4 over 1.0
        assert!((out[0].values[0] - 3.0).abs() < 1e-6);
        assert!((out[0].values[1] - 0.5).abs() < 1e-6);
        // w1: 0.5*4 + 0.5*8 over 1.0
        assert!((out[1].values[0] - 6.0).abs() < 1e-6);
        assert!((out[1].values[1] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_keeps_reference_timestamps() {
        let words  = vec![step(0.2, 0.7, &[9.0; 3])];
        let frames = vec![step(0.0, 1.0, &[1.0])];
        let out    = align_sequence(&words, &frames);
        assert_eq!(out[0].start, 0.2);
        assert_eq!(out[0].end, 0.7);
        assert_eq!(out[0].values, vec![1.0]);
    }

    #[test]
    fn test_uncovered_step_is_zero() {
        let words  = vec![step(5.0, 6.0, &[0.0])];
        let frames = vec![step(0.0, 1.0, &[1.0, 2.0])];
        assert_eq!(align_sequence(&words, &frames)[0].values, vec![0.0, 0.0]);
    }

    #[test]
    fn test_zero_length_reference_step() {
        let words  = vec![step(0.5, 0.5, &[0.0])];
        let frames = vec![step(0.0, 1.0, &[4.0]), step(1.0, 2.0, &[8.0])];
        assert_eq!(align_sequence(&words, &frames)[0].values, vec![4.0]);
    }

    #[test]
    fn test_missing_segment_aligns_to_empty() {
        let mut reference = FeatureStreams::new();
        reference
            .entry("v".into())
            .or_default()
            .insert("0".into(), vec![step(0.0, 1.0, &[1.0])]);
        let other = FeatureStreams::new();

        let aligned = align_streams(&reference, &other);
        assert!(aligned["v"]["0"].is_empty());
    }
}
