// Fixed-rate animation loop
// Commands arrive over zenoh as text lines; every tick advances the
// scheduler, and each state change renders a frame that is published as the
// pen pose (plus the drawn segment when the pen is down).

use std::time::Instant;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::config::{SimConfig, TOPIC_CMD, TOPIC_POSE, TOPIC_RUNNING, TOPIC_SEGMENT};
use crate::messages::{BoardCommand, PoseReport, RunnerStatus};
use crate::scheduler::MotionEvent;
use crate::whiteboard::{Frame, Whiteboard};

/// Everything the loop has to publish after one tick
#[derive(Debug, Default, PartialEq)]
pub struct TickOutput {
    pub frame: Option<Frame>,
    pub running: Vec<RunnerStatus>,
}

pub struct Runtime {
    board: Whiteboard,
    events: Vec<MotionEvent>,
}

impl Runtime {
    pub fn new(board: Whiteboard) -> Self {
        Self {
            board,
            events: Vec::new(),
        }
    }

    pub fn board(&self) -> &Whiteboard {
        &self.board
    }

    /// Process one incoming command line
    pub fn on_command(&mut self, line: &str, now: Instant) {
        match line.parse::<BoardCommand>() {
            Ok(cmd) => {
                info!("Received command: {:?}", cmd);
                self.board.apply(cmd, now, &mut self.events);
            }
            Err(e) => warn!("Failed to parse command {:?}: {}", line, e),
        }
    }

    /// Current pose for publishing outside a tick; unreachable poses are
    /// logged and skipped like any other frame
    pub fn pose_report(&self) -> Option<PoseReport> {
        match self.board.query_pose() {
            Ok(pose) => Some(PoseReport::from(&pose)),
            Err(e) => {
                warn!("Skipping pose: {}", e);
                None
            }
        }
    }

    /// Advance the animation and collect what needs publishing
    pub fn on_tick(&mut self, now: Instant) -> TickOutput {
        self.board.tick(now, &mut self.events);

        let mut output = TickOutput::default();
        let mut redraw = false;
        for event in self.events.drain(..) {
            match event {
                MotionEvent::StateChanged => redraw = true,
                MotionEvent::RunningChanged(running) => {
                    output.running.push(RunnerStatus { running })
                }
            }
        }

        if redraw {
            match self.board.frame() {
                Ok(frame) => output.frame = Some(frame),
                Err(e) => warn!("Skipping frame: {}", e),
            }
        }
        output
    }
}

pub async fn run(config: SimConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let board = Whiteboard::from_config(&config)?;
    let mut runtime = Runtime::new(board);

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    info!("Setting up publishers and subscribers...");
    let subscriber = session.declare_subscriber(TOPIC_CMD).await?;
    let pub_pose = session.declare_publisher(TOPIC_POSE).await?;
    let pub_running = session.declare_publisher(TOPIC_RUNNING).await?;
    let pub_segment = session.declare_publisher(TOPIC_SEGMENT).await?;

    let mut tick = interval(config.tick_period());

    info!(
        "Runtime started: {}ms tick, {} pulses/ms",
        config.tick_period().as_millis(),
        config.speed_pulses_per_ms
    );
    info!("Subscribed to: {}", TOPIC_CMD);
    info!(
        "Publishing to: {}, {}, {}",
        TOPIC_POSE, TOPIC_RUNNING, TOPIC_SEGMENT
    );

    // Initial frame so renderers can draw the board at rest
    if let Some(report) = runtime.pose_report() {
        pub_pose.put(serde_json::to_string(&report)?).await?;
    }

    loop {
        tick.tick().await;

        // 1. Drain all pending commands (non-blocking); the last one wins
        while let Ok(Some(sample)) = subscriber.try_recv() {
            let payload = sample.payload().to_bytes();
            match std::str::from_utf8(&payload) {
                Ok(line) => runtime.on_command(line, Instant::now()),
                Err(e) => warn!("Command is not UTF-8: {}", e),
            }
        }

        // 2. Advance the animation
        let output = runtime.on_tick(Instant::now());

        // 3. Publish the frame
        if let Some(frame) = output.frame {
            let pose_json = serde_json::to_string(&PoseReport::from(&frame.pose))?;
            pub_pose.put(pose_json).await?;
            if let Some(segment) = frame.segment {
                debug!("Segment {:?}", segment);
                pub_segment.put(serde_json::to_string(&segment)?).await?;
            }
        }

        // 4. Publish run/idle transitions
        for status in output.running {
            pub_running.put(serde_json::to_string(&status)?).await?;
        }
    }
}
