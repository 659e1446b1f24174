// Host-facing facade: the plotter model, its scheduler and the pen trace

use std::time::{Duration, Instant};

use tracing::info;

use crate::config::SimConfig;
use crate::kinematics::{KinematicModel, Point, Pose, Result};
use crate::messages::{BoardCommand, MotionCommand, Segment};
use crate::scheduler::{MotionObserver, MotionScheduler};

/// What a renderer draws for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub pose: Pose,
    /// Ink laid down since the previous frame, if the pen is down
    pub segment: Option<Segment>,
}

pub struct Whiteboard {
    model: KinematicModel,
    scheduler: MotionScheduler,
    speed_pulses_per_ms: f64,
    drawing: bool,
    /// Pen position of the last rendered frame
    last_pen: Point,
}

impl Whiteboard {
    /// # Errors
    /// Fails if the starting pose cannot be computed from the geometry.
    pub fn new(model: KinematicModel, tick_period: Duration, speed_pulses_per_ms: f64) -> Result<Self> {
        let last_pen = model.query_pose()?.pen;
        Ok(Self {
            model,
            scheduler: MotionScheduler::new(tick_period),
            speed_pulses_per_ms,
            drawing: false,
            last_pen,
        })
    }

    pub fn from_config(config: &SimConfig) -> Result<Self> {
        let model = config.device.build_model()?;
        Self::new(model, config.tick_period(), config.speed_pulses_per_ms)
    }

    pub fn model(&self) -> &KinematicModel {
        &self.model
    }

    pub fn scheduler(&self) -> &MotionScheduler {
        &self.scheduler
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    pub fn set_drawing(&mut self, drawing: bool) {
        if drawing != self.drawing {
            info!("Pen {}", if drawing { "down" } else { "up" });
        }
        self.drawing = drawing;
    }

    /// Move the wheels by `pulses` at the configured speed
    pub fn move_wheels(&mut self, pulses: [i32; 2], now: Instant, observer: &mut impl MotionObserver) {
        let command = MotionCommand::new(pulses, self.speed_pulses_per_ms);
        self.scheduler
            .command_motion(&mut self.model, command, now, observer);
    }

    /// Apply a line-protocol command: set the pen, then start any motion
    pub fn apply(&mut self, command: BoardCommand, now: Instant, observer: &mut impl MotionObserver) {
        self.set_drawing(command.drawing());
        if let Some(pulses) = command.pulses() {
            self.move_wheels(pulses, now, observer);
        }
    }

    pub fn tick(&mut self, now: Instant, observer: &mut impl MotionObserver) {
        self.scheduler.tick(&mut self.model, now, observer);
    }

    pub fn query_pose(&self) -> Result<Pose> {
        self.model.query_pose()
    }

    /// Render one frame: the current pose plus, with the pen down, the line
    /// from the previous frame's pen position. The previous position is
    /// updated either way.
    pub fn frame(&mut self) -> Result<Frame> {
        let pose = self.model.query_pose()?;
        let segment = self.drawing.then_some(Segment {
            from: self.last_pen,
            to: pose.pen,
        });
        self.last_pen = pose.pen;
        Ok(Frame { pose, segment })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::MotionEvent;

    fn whiteboard() -> Whiteboard {
        Whiteboard::from_config(&SimConfig::default()).unwrap()
    }

    #[test]
    fn test_pen_up_frames_have_no_segment() {
        let mut board = whiteboard();
        let start = Instant::now();
        board.move_wheels([100, -100], start, &mut ());
        board.tick(start + Duration::from_millis(250), &mut ());

        let frame = board.frame().unwrap();
        assert!(frame.segment.is_none());
    }

    #[test]
    fn test_segment_starts_at_previous_frame() {
        let mut board = whiteboard();
        let origin = board.frame().unwrap().pose.pen;
        let start = Instant::now();

        board.apply(BoardCommand::Draw { left: 100, right: -100 }, start, &mut ());
        assert!(board.is_drawing());
        board.tick(start + Duration::from_millis(250), &mut ());
        let first = board.frame().unwrap();
        let first_segment = first.segment.unwrap();
        assert_eq!(first_segment.from, origin);
        assert_eq!(first_segment.to, first.pose.pen);

        board.tick(start + Duration::from_millis(500), &mut ());
        let second = board.frame().unwrap().segment.unwrap();
        assert_eq!(second.from, first_segment.to);
    }

    #[test]
    fn test_pen_command_does_not_move() {
        let mut board = whiteboard();
        let mut events = Vec::new();
        board.apply(BoardCommand::Pen(true), Instant::now(), &mut events);
        assert!(board.is_drawing());
        assert!(!board.is_running());
        assert!(events.is_empty());
    }

    #[test]
    fn test_move_lifts_pen_and_runs() {
        let mut board = whiteboard();
        board.set_drawing(true);
        let mut events = Vec::new();
        board.apply(BoardCommand::Move { left: 20, right: 20 }, Instant::now(), &mut events);
        assert!(!board.is_drawing());
        assert!(board.is_running());
        assert_eq!(board.scheduler().duration(), Some(Duration::from_millis(100)));
        assert_eq!(events, vec![MotionEvent::RunningChanged(true)]);
    }
}
