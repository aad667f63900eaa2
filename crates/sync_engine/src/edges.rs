//! Trigger edge extraction on the machine clock.

use contracts::{ContractError, EdgeQuality, MachineStream, TrailingEdgePolicy, TriggerEdge};
use tracing::{debug, warn};

/// Edges this many rows apart or closer are flagged as a likely dropout
const ADJACENT_ROWS: usize = 2;

/// Scans the trigger channel for rising transitions
#[derive(Debug, Clone, Copy, Default)]
pub struct TriggerEdgeExtractor {
    policy: TrailingEdgePolicy,
}

impl TriggerEdgeExtractor {
    pub fn new(policy: TrailingEdgePolicy) -> Self {
        Self { policy }
    }

    /// Detect rising edges (`prev <= 0`, `current > 0`), timestamped at the
    /// current row.
    ///
    /// # Errors
    /// `CannotAlign` when no edge survives the trailing-edge policy.
    pub fn extract(
        &self,
        stream: &MachineStream,
    ) -> Result<(Vec<TriggerEdge>, EdgeQuality), ContractError> {
        let mut edges: Vec<TriggerEdge> = stream
            .rows
            .windows(2)
            .enumerate()
            .filter(|(_, pair)| pair[0].trigger <= 0.0 && pair[1].trigger > 0.0)
            .map(|(i, pair)| TriggerEdge {
                timestamp_ms: pair[1].timestamp_ms,
                row_index: i + 1,
            })
            .collect();

        let mut quality = EdgeQuality::default();
        let last_row = stream.len().saturating_sub(1);
        let drop_last = match (self.policy, edges.last()) {
            (TrailingEdgePolicy::Always, Some(_)) => true,
            (TrailingEdgePolicy::FinalSample, Some(edge)) => edge.row_index == last_row,
            _ => false,
        };
        if drop_last {
            if let Some(edge) = edges.pop() {
                debug!(
                    timestamp_ms = edge.timestamp_ms,
                    row = edge.row_index,
                    "trailing trigger edge dropped"
                );
                quality.dropped_trailing = true;
            }
        }

        if edges.is_empty() {
            return Err(ContractError::cannot_align(format!(
                "no rising edges on trigger channel '{}' ({} samples)",
                stream.schema.trigger.header(),
                stream.len()
            )));
        }

        for pair in edges.windows(2) {
            if pair[1].row_index - pair[0].row_index <= ADJACENT_ROWS {
                quality.adjacent_edges += 1;
                warn!(
                    first_ms = pair[0].timestamp_ms,
                    second_ms = pair[1].timestamp_ms,
                    "adjacent trigger edges, possible dropout inside a pulse"
                );
            }
        }

        Ok((edges, quality))
    }
}
