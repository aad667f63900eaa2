//! Frame alignment: merges the dense machine stream with the sparse frame
//! events in one forward sweep over both sorted sequences.

use contracts::{
    AlignedFrameRow, AlignedTrace, AlignmentQuality, ClockAlignment, ContractError,
    DeviceTriggerRecord, FrameEvent, FrameValueSource, MachineStream, SampleRow, TraceEntry,
};
use tracing::{debug, trace, warn};

/// `(tf - t_prev) / (t_next - t_prev)`, 0 when the interval has no width
#[inline]
pub fn interpolation_ratio(t_prev: f64, t_next: f64, t_frame: f64) -> f64 {
    let span = t_next - t_prev;
    if span > 0.0 {
        (t_frame - t_prev) / span
    } else {
        0.0
    }
}

#[inline]
fn lerp(v_prev: f64, v_next: f64, ratio: f64) -> f64 {
    v_prev + (v_next - v_prev) * ratio
}

/// Place device records on the machine clock, capture order
pub fn frame_events(records: &[DeviceTriggerRecord], alignment: &ClockAlignment) -> Vec<FrameEvent> {
    records
        .iter()
        .map(|record| FrameEvent {
            timestamp_ms: alignment.map_device_time(record.device_timestamp_ms),
            record: record.clone(),
        })
        .collect()
}

/// Frame aligner
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameAligner;

impl FrameAligner {
    /// Build the merged trace
    ///
    /// # Errors
    /// `CannotAlign` when the machine stream is empty.
    pub fn align(
        &self,
        stream: &MachineStream,
        events: &[FrameEvent],
    ) -> Result<AlignedTrace, ContractError> {
        let rows = &stream.rows;
        if rows.is_empty() {
            return Err(ContractError::cannot_align("machine stream has no samples"));
        }

        let mut quality = AlignmentQuality::default();
        let order = sweep_order(events, &mut quality);

        let mut entries = Vec::with_capacity(rows.len() + events.len());
        let mut slots: Vec<Option<AlignedFrameRow>> = vec![None; events.len()];
        let mut next = 0usize;

        for k in order {
            let event = &events[k];
            let tf = event.timestamp_ms;

            // Genuine rows win ties
            while next < rows.len() && rows[next].timestamp_ms <= tf {
                entries.push(TraceEntry::Genuine(next));
                next += 1;
            }

            let prev = next.checked_sub(1).map(|i| &rows[i]);
            let following = rows.get(next);
            let (channels, trigger, source) = match (prev, following) {
                (Some(p), _) if p.timestamp_ms == tf => {
                    if next >= 2 && rows[next - 2].timestamp_ms == tf {
                        quality.degenerate_intervals += 1;
                        warn!(
                            frame = event.record.frame_index,
                            timestamp_ms = tf,
                            "duplicate machine timestamps at frame time, using ratio 0"
                        );
                    }
                    quality.exact_matches += 1;
                    (p.channels.clone(), p.trigger, FrameValueSource::Exact)
                }
                // p < tf < n here; equal timestamps end up in the arm above
                (Some(p), Some(n)) => {
                    let ratio = interpolation_ratio(p.timestamp_ms, n.timestamp_ms, tf);
                    quality.interpolated += 1;
                    (interpolate(p, n, ratio), p.trigger, FrameValueSource::Interpolated { ratio })
                }
                (Some(edge), None) | (None, Some(edge)) => {
                    quality.clamped += 1;
                    warn!(
                        frame = event.record.frame_index,
                        timestamp_ms = tf,
                        nearest_ms = edge.timestamp_ms,
                        "frame outside machine stream, holding nearest sample"
                    );
                    (edge.channels.clone(), edge.trigger, FrameValueSource::Held)
                }
                (None, None) => {
                    return Err(ContractError::cannot_align("machine stream has no samples"));
                }
            };

            trace!(frame = event.record.frame_index, timestamp_ms = tf, ?source, "frame aligned");
            slots[k] = Some(AlignedFrameRow {
                frame_index: event.record.frame_index,
                timestamp_ms: tf,
                channels,
                trigger,
                source,
                device: event.record.clone(),
            });
            entries.push(TraceEntry::Frame(k));
        }

        entries.extend((next..rows.len()).map(TraceEntry::Genuine));
        let frames: Vec<AlignedFrameRow> = slots.into_iter().flatten().collect();

        debug!(
            frames = frames.len(),
            exact = quality.exact_matches,
            interpolated = quality.interpolated,
            clamped = quality.clamped,
            "frames aligned"
        );

        Ok(AlignedTrace {
            entries,
            frames,
            quality,
        })
    }
}

fn interpolate(prev: &SampleRow, next: &SampleRow, ratio: f64) -> Vec<f64> {
    prev.channels
        .iter()
        .zip(&next.channels)
        .map(|(&a, &b)| lerp(a, b, ratio))
        .collect()
}

/// Event indices in ascending time; capture order when already sorted
fn sweep_order(events: &[FrameEvent], quality: &mut AlignmentQuality) -> Vec<usize> {
    let mut order: Vec<usize> = (0..events.len()).collect();
    let sorted = events
        .windows(2)
        .all(|w| w[0].timestamp_ms <= w[1].timestamp_ms);
    if !sorted {
        quality.reordered_events = true;
        warn!("mapped frame times not monotonic, re-ordering for the merge");
        order.sort_by(|&a, &b| events[a].timestamp_ms.total_cmp(&events[b].timestamp_ms));
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Channel, ChannelSchema, ClockSegment, DeviceAux, ADC_CHANNELS};
    use rand::Rng;

    fn stream(samples: &[(f64, f64)]) -> MachineStream {
        MachineStream {
            schema: ChannelSchema {
                channels: vec![Channel::new("chA", "")],
                trigger: Channel::new("DIC.trigger", ""),
                trigger_position: 1,
            },
            rows: samples
                .iter()
                .enumerate()
                .map(|(i, &(t, v))| SampleRow {
                    timestamp_ms: t,
                    channels: vec![v],
                    trigger: (i % 2) as f64,
                })
                .collect(),
        }
    }

    fn event(frame_index: u64, t: f64) -> FrameEvent {
        FrameEvent {
            timestamp_ms: t,
            record: DeviceTriggerRecord {
                frame_index,
                device_timestamp_ms: t,
                adc_values: [0.0; ADC_CHANNELS],
                calibrated: [0.0; ADC_CHANNELS],
                aux: DeviceAux {
                    adc_frame_count: frame_index * 3,
                    ..Default::default()
                },
            },
        }
    }

    fn timestamps(trace: &AlignedTrace, s: &MachineStream) -> Vec<f64> {
        trace.entries.iter().map(|e| trace.timestamp_of(*e, s)).collect()
    }

    #[test]
    fn midpoint_interpolates_linearly() {
        let s = stream(&[(0.0, 10.0), (100.0, 20.0), (200.0, 30.0)]);
        let trace = FrameAligner.align(&s, &[event(0, 150.0)]).unwrap();
        let frame = &trace.frames[0];
        assert_eq!(frame.channels, vec![25.0]);
        assert_eq!(frame.source, FrameValueSource::Interpolated { ratio: 0.5 });
        // Trigger held from the preceding row
        assert_eq!(frame.trigger, 1.0);
        assert_eq!(
            trace.entries,
            vec![
                TraceEntry::Genuine(0),
                TraceEntry::Genuine(1),
                TraceEntry::Frame(0),
                TraceEntry::Genuine(2)
            ]
        );
    }

    #[test]
    fn exact_timestamp_copies_row() {
        let s = stream(&[(0.0, 10.0), (100.0, 20.0), (200.0, 30.0)]);
        let trace = FrameAligner.align(&s, &[event(0, 100.0), event(1, 200.0)]).unwrap();
        assert_eq!(trace.frames[0].channels, vec![20.0]);
        assert_eq!(trace.frames[1].channels, vec![30.0]);
        assert_eq!(trace.quality.exact_matches, 2);
        // Genuine row precedes the frame on a tie
        assert_eq!(trace.entries[1], TraceEntry::Genuine(1));
        assert_eq!(trace.entries[2], TraceEntry::Frame(0));
    }

    #[test]
    fn duplicate_timestamps_counted_as_degenerate() {
        let s = stream(&[(0.0, 10.0), (100.0, 20.0), (100.0, 22.0), (200.0, 30.0)]);
        let trace = FrameAligner.align(&s, &[event(0, 100.0)]).unwrap();
        assert_eq!(trace.quality.degenerate_intervals, 1);
        assert_eq!(trace.frames[0].channels, vec![22.0]);
    }

    #[test]
    fn frame_past_duplicates_interpolates_from_last_one() {
        let s = stream(&[(0.0, 10.0), (100.0, 20.0), (100.0, 22.0), (200.0, 30.0)]);
        let trace = FrameAligner.align(&s, &[event(0, 150.0)]).unwrap();
        assert_eq!(trace.quality.degenerate_intervals, 0);
        assert_eq!(trace.quality.interpolated, 1);
        assert_eq!(trace.frames[0].channels, vec![26.0]);
        assert_eq!(
            trace.frames[0].source,
            FrameValueSource::Interpolated { ratio: 0.5 }
        );
    }

    #[test]
    fn out_of_range_frames_hold_nearest_sample() {
        let s = stream(&[(100.0, 20.0), (200.0, 30.0)]);
        let trace = FrameAligner
            .align(&s, &[event(0, 50.0), event(1, 250.0)])
            .unwrap();
        assert_eq!(trace.frames[0].channels, vec![20.0]);
        assert_eq!(trace.frames[1].channels, vec![30.0]);
        assert_eq!(trace.quality.clamped, 2);
        assert_eq!(trace.frames[1].source, FrameValueSource::Held);
    }

    #[test]
    fn device_fields_copied_verbatim() {
        let s = stream(&[(0.0, 0.0), (10.0, 1.0)]);
        let trace = FrameAligner.align(&s, &[event(7, 5.0)]).unwrap();
        assert_eq!(trace.frames[0].frame_index, 7);
        assert_eq!(trace.frames[0].device.aux.adc_frame_count, 21);
    }

    #[test]
    fn unsorted_events_reordered_for_merge_only() {
        let s = stream(&[(0.0, 0.0), (100.0, 100.0)]);
        let trace = FrameAligner
            .align(&s, &[event(0, 60.0), event(1, 40.0)])
            .unwrap();
        assert!(trace.quality.reordered_events);
        // Projection stays in capture order
        assert_eq!(trace.frames[0].frame_index, 0);
        assert_eq!(trace.frames[0].channels, vec![60.0]);
        let ts = timestamps(&trace, &s);
        assert!(ts.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn empty_stream_cannot_align() {
        let s = stream(&[]);
        assert!(FrameAligner.align(&s, &[event(0, 1.0)]).is_err());
    }

    #[test]
    fn frame_events_apply_alignment() {
        let alignment = ClockAlignment {
            offset_ms: 1015.0,
            per_edge_difference: vec![],
            max_abs_difference: 0.0,
            pairs: vec![],
            segments: vec![ClockSegment {
                device_start_ms: 0.0,
                intercept_ms: 1015.0,
                scale: 1.0,
            }],
            drift_warning: false,
            unpaired_edges: 0,
            unpaired_markers: 0,
        };
        let records = vec![event(0, 0.0).record, event(1, 100.0).record];
        let events = frame_events(&records, &alignment);
        assert_eq!(events[0].timestamp_ms, 1015.0);
        assert_eq!(events[1].timestamp_ms, 1115.0);
    }

    #[test]
    fn zero_span_ratio_is_zero() {
        assert_eq!(interpolation_ratio(5.0, 5.0, 5.0), 0.0);
        assert_eq!(interpolation_ratio(0.0, 10.0, 2.5), 0.25);
    }

    #[test]
    fn randomised_merge_is_monotonic_and_bounded() {
        let mut rng = rand::rng();
        for _ in 0..50 {
            let mut t = 0.0;
            let samples: Vec<(f64, f64)> = (0..rng.random_range(2..60))
                .map(|_| {
                    t += rng.random_range(0.5..5.0);
                    (t, rng.random_range(-100.0..100.0))
                })
                .collect();
            let s = stream(&samples);
            let (first, last) = s.time_range().unwrap();

            let mut tf = first;
            let events: Vec<FrameEvent> = (0..rng.random_range(1..30))
                .map(|i| {
                    tf = (tf + rng.random_range(0.0..4.0)).min(last);
                    event(i, tf)
                })
                .collect();

            let trace = FrameAligner.align(&s, &events).unwrap();
            assert_eq!(trace.frames.len(), events.len());
            assert_eq!(trace.entries.len(), s.len() + events.len());

            let ts = timestamps(&trace, &s);
            assert!(ts.windows(2).all(|w| w[0] <= w[1]));

            for frame in &trace.frames {
                let i = s.rows.partition_point(|r| r.timestamp_ms <= frame.timestamp_ms);
                let prev = &s.rows[i - 1];
                if prev.timestamp_ms == frame.timestamp_ms {
                    assert_eq!(frame.channels, prev.channels);
                    continue;
                }
                let next = &s.rows[i];
                let (v0, v1) = (prev.channels[0], next.channels[0]);
                let expected = v0
                    + (v1 - v0) * (frame.timestamp_ms - prev.timestamp_ms)
                        / (next.timestamp_ms - prev.timestamp_ms);
                let got = frame.channels[0];
                assert!((got - expected).abs() <= 1e-9 * expected.abs().max(1.0));
                assert!(got >= v0.min(v1) - 1e-9 && got <= v0.max(v1) + 1e-9);
            }
        }
    }
}
