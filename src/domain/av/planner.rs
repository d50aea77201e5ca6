use crate::domain::jobs::SegmentSpec;
use rand::Rng;

/// Seconds kept free at the end of every bucket so a clip does not run into
/// the next bucket's window.
pub const BUCKET_MARGIN: f64 = 3.0;

/// Most buckets `total_duration` seconds can be split into. Starts are
/// rounded to centiseconds, so a bucket is never narrower than one.
pub fn max_segments(total_duration: f64) -> usize {
    if !(total_duration > 0.0) {
        return 0;
    }
    (total_duration * 100.0).floor() as usize
}

/// Spread `segment_count` clips of `clip_duration` seconds evenly over a
/// source of `total_duration` seconds.
///
/// The source is cut into equal buckets and each clip starts at a random
/// offset inside its own bucket, rounded to centiseconds. Clips never reach
/// past the end of their bucket: the duration is clamped when the bucket is
/// too short to hold it. Counts above [`max_segments`] plan nothing.
pub fn plan<R: Rng + ?Sized>(
    total_duration: f64,
    segment_count: usize,
    clip_duration: f64,
    rng: &mut R,
) -> Vec<SegmentSpec> {
    if segment_count == 0 || segment_count > max_segments(total_duration) {
        return Vec::new();
    }

    let bucket_width = total_duration / segment_count as f64;

    (0..segment_count)
        .map(|i| {
            let bucket_start = i as f64 * bucket_width;
            let bucket_end = bucket_start + bucket_width;
            let window_end = bucket_start.max(bucket_end - BUCKET_MARGIN);

            let start_time = if window_end > bucket_start {
                let drawn = round_centis(rng.gen_range(bucket_start..window_end));
                let lo = (bucket_start * 100.0).ceil() / 100.0;
                let hi = (window_end * 100.0).floor() / 100.0;
                let rounded = if lo <= hi { drawn.clamp(lo, hi) } else { drawn };
                rounded.clamp(bucket_start, window_end)
            } else {
                bucket_start
            };

            SegmentSpec {
                start_time,
                duration: clip_duration.min(bucket_end - start_time),
            }
        })
        .collect()
}

fn round_centis(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
