// End-to-end behaviour through the public API: commands, ticks, frames.

use std::time::{Duration, Instant};

use approx::{assert_abs_diff_eq, assert_relative_eq};
use whiteboard_sim::config::{DeviceConfig, SimConfig};
use whiteboard_sim::kinematics::{KinematicModel, KinematicsError, LEFT, RIGHT};
use whiteboard_sim::messages::{BoardCommand, MotionCommand};
use whiteboard_sim::scheduler::{MotionEvent, MotionScheduler};
use whiteboard_sim::whiteboard::Whiteboard;

fn config() -> SimConfig {
    SimConfig {
        device: DeviceConfig {
            pulley_radius: 5.0,
            pulley_separation: 400.0,
            wheel_radius: 8.0,
            pulses_per_revolution: 280.0,
            start_x: 200.0,
            start_y: 150.0,
        },
        ..SimConfig::default()
    }
}

/// Tick at the scheduler's period until the run completes
fn run_to_idle(board: &mut Whiteboard, start: Instant, events: &mut Vec<MotionEvent>) -> Instant {
    let period = board.scheduler().tick_period();
    let mut now = start;
    while board.is_running() {
        now += period;
        board.tick(now, events);
        board.frame().unwrap();
    }
    now
}

#[test]
fn test_symmetric_start_is_centred() {
    let board = Whiteboard::from_config(&config()).unwrap();
    let [left, right] = board.model().string_lengths();
    assert_relative_eq!(left, right);
    assert_abs_diff_eq!(board.query_pose().unwrap().pen.x, 200.0, epsilon = 1e-9);
}

#[test]
fn test_opposite_moves_return_home() {
    let mut board = Whiteboard::from_config(&config()).unwrap();
    let home = board.query_pose().unwrap().pen;
    let mut events = Vec::new();

    let t = Instant::now();
    board.apply("D 300 -120".parse().unwrap(), t, &mut events);
    let t = run_to_idle(&mut board, t, &mut events);
    let away = board.query_pose().unwrap().pen;
    assert!((away.x - home.x).abs() > 10.0);

    board.apply("D -300 120".parse().unwrap(), t, &mut events);
    run_to_idle(&mut board, t, &mut events);
    let back = board.query_pose().unwrap().pen;
    assert_abs_diff_eq!(back.x, home.x, epsilon = 1e-6);
    assert_abs_diff_eq!(back.y, home.y, epsilon = 1e-6);
    assert_abs_diff_eq!(board.model().wheel_angles()[LEFT], 0.0, epsilon = 1e-9);

    let transitions: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, MotionEvent::RunningChanged(_)))
        .collect();
    assert_eq!(
        transitions,
        vec![
            &MotionEvent::RunningChanged(true),
            &MotionEvent::RunningChanged(false),
            &MotionEvent::RunningChanged(true),
            &MotionEvent::RunningChanged(false),
        ]
    );
}

#[test]
fn test_drawn_segments_are_contiguous() {
    let mut board = Whiteboard::from_config(&config()).unwrap();
    let start = Instant::now();
    board.apply(BoardCommand::Draw { left: 150, right: 60 }, start, &mut ());

    let mut previous = board.query_pose().unwrap().pen;
    let mut now = start;
    let mut segments = 0;
    while board.is_running() {
        now += Duration::from_millis(30);
        board.tick(now, &mut ());
        let segment = board.frame().unwrap().segment.unwrap();
        assert_eq!(segment.from, previous);
        previous = segment.to;
        segments += 1;
    }
    // 150 pulses at 0.2 pulses/ms = 750ms
    assert_eq!(segments, 25);
}

#[test]
fn test_string_change_matches_single_shot() {
    let mut model = KinematicModel::initialize(5.0, 100.0, 5.0, 200.0, 50.0, 60.0).unwrap();
    let mut scheduler = MotionScheduler::new(Duration::from_millis(7));
    let before = model.string_lengths();
    let pulses = [-37, 91];
    let start = Instant::now();

    scheduler.command_motion(&mut model, MotionCommand::new(pulses, 0.05), start, &mut ());
    let mut now = start;
    while scheduler.is_running() {
        now += scheduler.tick_period();
        scheduler.tick(&mut model, now, &mut ());
    }

    let geometry = *model.geometry();
    for i in [LEFT, RIGHT] {
        let single_shot = geometry.wheel_radius() * pulses[i] as f64 * geometry.radians_per_pulse();
        assert_relative_eq!(model.string_lengths()[i] - before[i], single_shot, epsilon = 1e-9);
    }
}

#[test]
fn test_preempting_with_null_motion_keeps_partial_progress() {
    let mut board = Whiteboard::from_config(&config()).unwrap();
    let start = Instant::now();
    board.move_wheels([1000, 0], start, &mut ());
    board.tick(start + Duration::from_millis(30), &mut ());
    let partial = board.model().string_lengths();

    board.move_wheels([0, 0], start + Duration::from_millis(31), &mut ());
    assert!(!board.is_running());
    board.tick(start + Duration::from_secs(10), &mut ());
    assert_eq!(board.model().string_lengths(), partial);
}

#[test]
fn test_extreme_retraction_is_unreachable() {
    let mut model = KinematicModel::initialize(5.0, 100.0, 5.0, 280.0, 50.0, 40.0).unwrap();
    let retract = (1.0 - model.string_lengths()[LEFT]) / 5.0;
    model.advance(1.0, [retract, retract]);
    assert!(matches!(
        model.query_pose(),
        Err(KinematicsError::UnreachablePose { .. })
    ));
}

#[test]
fn test_invalid_geometry_produces_no_board() {
    let mut config = config();
    config.device.pulses_per_revolution = 0.0;
    assert!(matches!(
        Whiteboard::from_config(&config),
        Err(KinematicsError::InvalidGeometry { .. })
    ));
}
