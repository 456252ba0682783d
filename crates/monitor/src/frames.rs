//! Landmark frame intake
//!
//! One JSON object per line, as produced by the face-landmark detector:
//!
//! ```text
//! {"landmarks": [[0.41, 0.37], [0.42, 0.36], ...]}
//! {"landmarks": [{"x": 0.41, "y": 0.37, "z": -0.02}, ...]}
//! {"landmarks": null}
//! ```
//!
//! A missing, null, or empty `landmarks` field means no face in that frame.

use engagement::{LandmarkFrame, Point};
use report_scheduler::SharedSession;
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::MonitorError;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPoint {
    Pair([f64; 2]),
    Triple([f64; 3]),
    Object { x: f64, y: f64 },
}

impl From<RawPoint> for Point {
    fn from(raw: RawPoint) -> Self {
        match raw {
            RawPoint::Pair([x, y]) | RawPoint::Triple([x, y, _]) => Point::new(x, y),
            RawPoint::Object { x, y } => Point::new(x, y),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FrameRecord {
    #[serde(default)]
    landmarks: Option<Vec<RawPoint>>,
}

/// Parse one input line; `Ok(None)` is a frame without a face
pub fn parse_frame_line(line: &str) -> Result<Option<LandmarkFrame>, MonitorError> {
    let record: FrameRecord =
        serde_json::from_str(line).map_err(|e| MonitorError::Frame(e.to_string()))?;

    Ok(record
        .landmarks
        .filter(|points| !points.is_empty())
        .map(|points| points.into_iter().map(Point::from).collect()))
}

/// Feed frames from `reader` into the session until EOF or shutdown.
///
/// Returns the number of frames processed. Bad lines are logged and skipped.
pub async fn run_frame_source<R>(
    reader: R,
    session: SharedSession,
    mut shutdown: watch::Receiver<bool>,
) -> Result<u64, MonitorError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut processed = 0u64;
    let mut line_number = 0u64;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("Frame input closed after {} frames", processed);
                    break;
                };
                line_number += 1;

                if line.trim().is_empty() {
                    continue;
                }

                let frame = match parse_frame_line(&line) {
                    Ok(frame) => frame,
                    Err(e) => {
                        warn!("Skipping frame on line {}: {}", line_number, e);
                        continue;
                    }
                };

                let analysis = session.write().await.process_frame(frame.as_ref());
                processed += 1;

                let face = if analysis.face_detected { "present" } else { "absent" };
                metrics::counter!("engagement_frames_total", "face" => face).increment(1);
                metrics::gauge!("engagement_score").set(analysis.score);

                if analysis.has_alerts() {
                    debug!("Frame {}: alerts {:?}", line_number, analysis.alerts);
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("Frame intake stopped after {} frames", processed);
                    break;
                }
            }
        }
    }

    Ok(processed)
}
