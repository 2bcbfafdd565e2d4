// src/session.rs
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::angles::AngleSet;
use crate::config::EngineConfig;
use crate::engine::{compute_all, compute_angle, AngleReport};
use crate::error::{EngineError, Result};
use crate::input::RawFrame;
use crate::keypoint::{ConfidenceGate, JointName, KeypointFrame, Observation};
use crate::recorder::AngleRecorder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Idle,
    Collecting,
    Stopped,
}

/// Latest gated frame, shared with pollers as an immutable snapshot.
pub type FrameSnapshot<J> = Option<Arc<KeypointFrame<J>>>;

/// One capture run: idle -> collecting -> stopped.
///
/// While collecting, every ingested frame is gated, evaluated against the
/// angle table, recorded, and published to subscribers. A stopped session
/// cannot be restarted; start a new one instead.
pub struct CaptureSession<A: AngleSet> {
    id: Uuid,
    state: SessionState,
    gate: ConfidenceGate,
    recorder: AngleRecorder<A>,
    latest: watch::Sender<FrameSnapshot<A::Joint>>,
    frames_ingested: u64,
    started_at: Option<DateTime<Local>>,
}

impl<A: AngleSet> CaptureSession<A> {
    pub fn new(config: &EngineConfig) -> Self {
        let (latest, _) = watch::channel(None);
        Self {
            id: Uuid::new_v4(),
            state: SessionState::Idle,
            gate: config.gate(),
            recorder: AngleRecorder::new(
                &config.output_directory,
                Some(config.resolved_session_name()),
            ),
            latest,
            frames_ingested: 0,
            started_at: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn frames_ingested(&self) -> u64 {
        self.frames_ingested
    }

    pub fn started_at(&self) -> Option<DateTime<Local>> {
        self.started_at
    }

    pub fn recorder(&self) -> &AngleRecorder<A> {
        &self.recorder
    }

    pub fn into_recorder(self) -> AngleRecorder<A> {
        self.recorder
    }

    pub fn start(&mut self) -> Result<()> {
        if self.state != SessionState::Idle {
            return Err(EngineError::InvalidTransition {
                state: self.state,
                action: "start",
            });
        }
        self.state = SessionState::Collecting;
        self.started_at = Some(Local::now());
        info!(session = %self.id, name = self.recorder.session_name(), "session collecting");
        Ok(())
    }

    pub fn stop(&mut self) -> Result<()> {
        if self.state != SessionState::Collecting {
            return Err(EngineError::InvalidTransition {
                state: self.state,
                action: "stop",
            });
        }
        self.state = SessionState::Stopped;
        info!(session = %self.id, frames = self.frames_ingested, "session stopped");
        Ok(())
    }

    /// Gates one frame of detector output, publishes it and returns the
    /// angles computed from it.
    pub fn ingest<I>(&mut self, timestamp: f64, raw: I) -> Result<AngleReport<A>>
    where
        I: IntoIterator<Item = (A::Joint, Observation)>,
    {
        if self.state != SessionState::Collecting {
            return Err(EngineError::InvalidTransition {
                state: self.state,
                action: "ingest into",
            });
        }

        let frame = Arc::new(self.gate.apply(raw));
        let report = compute_all::<A>(&frame);

        debug!(
            frame = self.frames_ingested,
            keypoints = frame.len(),
            angles = report.present_count(),
            "frame ingested"
        );

        self.recorder.record(timestamp, &report);
        self.latest.send_replace(Some(frame));
        self.frames_ingested += 1;
        Ok(report)
    }

    /// Ingests a decoded input line. Names outside the session's joint set
    /// are dropped with a warning; the rest of the frame still counts.
    pub fn ingest_raw(&mut self, frame: &RawFrame) -> Result<AngleReport<A>> {
        let (joints, unknown) = frame.resolve_known::<A::Joint>();
        let kind = <A::Joint as JointName>::KIND;
        for name in unknown {
            warn!(
                frame = self.frames_ingested,
                kind,
                joint = name,
                "ignoring unknown joint"
            );
        }
        self.ingest(frame.timestamp, joints)
    }

    pub fn latest(&self) -> FrameSnapshot<A::Joint> {
        self.latest.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FrameSnapshot<A::Joint>> {
        self.latest.subscribe()
    }
}

/// A display refresh produced by [`spawn_poller`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleUpdate<A> {
    pub angle: A,
    pub degrees: Option<f64>,
    pub tick: u64,
}

/// Shortest period a poller will tick at.
pub const MIN_POLL_PERIOD: Duration = Duration::from_millis(1);

/// Re-evaluates `angle` against the latest snapshot every `period`,
/// independent of the frame rate. Periods below [`MIN_POLL_PERIOD`] are
/// raised to it. The task ends once the session is dropped or the update
/// receiver goes away.
pub fn spawn_poller<A: AngleSet>(
    mut frames: watch::Receiver<FrameSnapshot<A::Joint>>,
    angle: A,
    period: Duration,
    updates: mpsc::Sender<AngleUpdate<A>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period.max(MIN_POLL_PERIOD));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut tick = 0u64;

        loop {
            ticker.tick().await;
            if frames.has_changed().is_err() {
                break;
            }

            let snapshot = frames.borrow_and_update().clone();
            let degrees = snapshot
                .as_deref()
                .and_then(|frame| compute_angle(frame, angle));

            if updates.send(AngleUpdate { angle, degrees, tick }).await.is_err() {
                break;
            }
            tick += 1;
        }

        debug!(angle = angle.label(), ticks = tick, "poller stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{BodyAngle, BodyJoint};
    use crate::hand::{HandAngle, HandJoint};
    use tempfile::tempdir;
    use tokio::time::timeout;

    fn config(dir: &std::path::Path) -> EngineConfig {
        EngineConfig {
            output_directory: dir.to_path_buf(),
            session_name: Some("test".into()),
            ..EngineConfig::default()
        }
    }

    fn arm_down() -> Vec<(BodyJoint, Observation)> {
        vec![
            (BodyJoint::Neck, Observation::new(0.5, 0.8, 0.9)),
            (BodyJoint::Root, Observation::new(0.5, 0.2, 0.9)),
            (BodyJoint::RightShoulder, Observation::new(0.6, 0.75, 0.9)),
            (BodyJoint::RightElbow, Observation::new(0.6, 0.55, 0.9)),
        ]
    }

    #[test]
    fn lifecycle_is_enforced() {
        let dir = tempdir().unwrap();
        let mut session = CaptureSession::<BodyAngle>::new(&config(dir.path()));
        assert_eq!(session.state(), SessionState::Idle);

        let early = session.ingest(0.0, arm_down());
        assert!(matches!(
            early,
            Err(EngineError::InvalidTransition {
                state: SessionState::Idle,
                ..
            })
        ));
        assert!(session.stop().is_err());

        session.start().unwrap();
        assert!(session.started_at().is_some());
        assert!(session.start().is_err());
        session.ingest(0.0, arm_down()).unwrap();
        session.stop().unwrap();

        assert!(session.ingest(0.1, arm_down()).is_err());
        assert!(session.start().is_err());
        assert_eq!(session.frames_ingested(), 1);
        assert_eq!(session.recorder().len(), 1);
    }

    #[test]
    fn ingest_publishes_snapshot_and_records() {
        let dir = tempdir().unwrap();
        let mut session = CaptureSession::<BodyAngle>::new(&config(dir.path()));
        let rx = session.subscribe();
        assert!(session.latest().is_none());

        session.start().unwrap();
        let report = session.ingest(0.0, arm_down()).unwrap();
        assert!(report.get(BodyAngle::RightShoulderFlexion).unwrap() < 1e-4);

        let snapshot = rx.borrow().clone().unwrap();
        assert_eq!(snapshot.len(), 4);
        assert!(snapshot.contains(BodyJoint::Root));

        let recorder = session.into_recorder();
        assert_eq!(recorder.session_name(), "test");
        assert_eq!(recorder.samples()[0].frame, 0);
    }

    #[test]
    fn ingest_raw_resolves_names() {
        let dir = tempdir().unwrap();
        let mut session = CaptureSession::<HandAngle>::new(&config(dir.path()));
        session.start().unwrap();

        let mut frame = RawFrame::new(0.25);
        frame.insert(HandJoint::Wrist, Observation::new(0.5, 0.1, 0.9));
        let report = session.ingest_raw(&frame).unwrap();
        assert_eq!(report.present_count(), 0);
        assert_eq!(session.latest().unwrap().len(), 1);
    }

    #[test]
    fn unknown_joint_does_not_cost_the_frame() {
        let dir = tempdir().unwrap();
        let mut session = CaptureSession::<BodyAngle>::new(&config(dir.path()));
        session.start().unwrap();

        let mut frame = RawFrame::new(0.0);
        for (joint, obs) in arm_down() {
            frame.insert(joint, obs);
        }
        frame.joints.insert("tail".into(), Observation::new(0.5, 0.1, 0.9));

        let report = session.ingest_raw(&frame).unwrap();
        assert!(report.get(BodyAngle::RightShoulderFlexion).unwrap() < 1e-4);
        assert_eq!(session.frames_ingested(), 1);
        assert_eq!(session.recorder().len(), 1);
    }

    #[tokio::test]
    async fn poller_reports_latest_value_and_stops_with_session() {
        let dir = tempdir().unwrap();
        let mut session = CaptureSession::<BodyAngle>::new(&config(dir.path()));
        session.start().unwrap();
        session.ingest(0.0, arm_down()).unwrap();

        let (tx, mut rx) = mpsc::channel(8);
        let handle = spawn_poller(
            session.subscribe(),
            BodyAngle::RightShoulderFlexion,
            Duration::from_millis(10),
            tx,
        );

        let first = timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.angle, BodyAngle::RightShoulderFlexion);
        assert_eq!(first.tick, 0);
        assert!(first.degrees.unwrap() < 1e-4);

        // raise the arm overhead; a later tick must see it
        let mut raised = arm_down();
        raised[3] = (BodyJoint::RightElbow, Observation::new(0.6, 0.95, 0.9));
        session.ingest(0.5, raised).unwrap();

        let mut saw_raised = false;
        for _ in 0..50 {
            let update = timeout(Duration::from_secs(1), rx.recv())
                .await
                .unwrap()
                .unwrap();
            if update.degrees.map_or(false, |d| (d - 180.0).abs() < 1e-4) {
                saw_raised = true;
                break;
            }
        }
        assert!(saw_raised);

        drop(session);
        // drain until the poller notices the dropped session
        loop {
            match timeout(Duration::from_secs(1), rx.recv()).await.unwrap() {
                Some(_) => continue,
                None => break,
            }
        }
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn zero_period_poller_still_ticks() {
        let dir = tempdir().unwrap();
        let mut session = CaptureSession::<BodyAngle>::new(&config(dir.path()));
        session.start().unwrap();
        session.ingest(0.0, arm_down()).unwrap();

        let (tx, mut rx) = mpsc::channel(4);
        let handle = spawn_poller(
            session.subscribe(),
            BodyAngle::RightShoulderFlexion,
            Duration::ZERO,
            tx,
        );

        for expected in 0..3 {
            let update = timeout(Duration::from_secs(1), rx.recv())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(update.tick, expected);
            assert!(update.degrees.unwrap() < 1e-4);
        }

        drop(rx);
        timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn poller_before_first_frame_reports_absent() {
        let dir = tempdir().unwrap();
        let session = CaptureSession::<BodyAngle>::new(&config(dir.path()));

        let (tx, mut rx) = mpsc::channel(1);
        let handle = spawn_poller(
            session.subscribe(),
            BodyAngle::LeftKneeFlexion,
            Duration::from_millis(10),
            tx,
        );

        let update = timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(update.degrees, None);

        drop(rx);
        timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
    }
}
