//! Progress events emitted by the processing driver
//!
//! One bounded channel, one producer (the driver) and one consumer (a
//! CLI thread that prints). The channel is purely cosmetic: a
//! disconnected consumer never fails the driver.

use std::path::PathBuf;
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};

#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Opening input `index` of `total`.
    Opening {
        index: usize,
        total: usize,
        name: String,
    },
    /// Compositing input `index` of `total` into the mosaic.
    Merging {
        index: usize,
        total: usize,
        name: String,
    },
    /// Mosaic grid established.
    MosaicReady {
        width: usize,
        height: usize,
        bands: usize,
    },
    /// Warping to the target CRS.
    Reprojecting { target: String },
    /// Writing the output file.
    Writing { path: PathBuf },
    /// Recoverable oddity worth surfacing (skipped file, CRS mismatch).
    Warning(String),
}

/// Sending half handed to the driver.
#[derive(Debug, Clone)]
pub struct ProgressSender(SyncSender<ProgressEvent>);

impl ProgressSender {
    /// Never fails: progress has no effect on processing correctness,
    /// so a dropped receiver is silently ignored.
    pub fn send(&self, event: ProgressEvent) {
        let _ = self.0.send(event);
    }

    /// A sender whose events go nowhere; handy in tests.
    pub fn sink() -> Self {
        let (tx, _rx) = sync_channel(1);
        // Receiver dropped here; sends become no-ops.
        ProgressSender(tx)
    }
}

/// Create the bounded progress channel.
pub fn progress_channel(capacity: usize) -> (ProgressSender, Receiver<ProgressEvent>) {
    let (tx, rx) = sync_channel(capacity);
    (ProgressSender(tx), rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_flow_in_order() {
        let (tx, rx) = progress_channel(8);
        tx.send(ProgressEvent::Merging {
            index: 1,
            total: 2,
            name: "a.tif".to_string(),
        });
        tx.send(ProgressEvent::Warning("skipped b.tif".to_string()));
        drop(tx);

        let events: Vec<ProgressEvent> = rx.iter().collect();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], ProgressEvent::Merging { index: 1, .. }));
        assert!(matches!(events[1], ProgressEvent::Warning(_)));
    }

    #[test]
    fn test_sink_never_blocks_or_fails() {
        let tx = ProgressSender::sink();
        for _ in 0..100 {
            tx.send(ProgressEvent::MosaicReady {
                width: 1,
                height: 1,
                bands: 1,
            });
        }
    }
}
