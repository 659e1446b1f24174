// Keyboard jog: Q/A left string in/out, E/D right string in/out,
// SPACE toggles the pen, R/F step size, ESC quits.
//
// Usage: cargo run --example jog_publisher
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::time::Duration;
use tracing::info;
use whiteboard_sim::config::TOPIC_CMD;
use whiteboard_sim::messages::BoardCommand;

const STEPS: [i16; 3] = [10, 50, 200]; // pulses per key press

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;
    let publisher = session.declare_publisher(TOPIC_CMD).await?;

    info!("Controls: Q/A=left, E/D=right, SPACE=pen, R/F=step, ESC=quit");
    info!("Step: {} pulses", STEPS[0]);

    enable_raw_mode()?;
    let result = run_jog(&publisher).await;
    disable_raw_mode()?;

    result
}

async fn run_jog(
    publisher: &zenoh::pubsub::Publisher<'_>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut step_idx: usize = 0;
    let mut pen_down = false;

    loop {
        if !event::poll(Duration::from_millis(50))? {
            continue;
        }
        let Event::Key(KeyEvent { code, kind, .. }) = event::read()? else {
            continue;
        };
        if kind != KeyEventKind::Press && kind != KeyEventKind::Repeat {
            continue;
        }

        let step = STEPS[step_idx];
        let wheels = match code {
            KeyCode::Char('q') => Some((-step, 0)),
            KeyCode::Char('a') => Some((step, 0)),
            KeyCode::Char('e') => Some((0, -step)),
            KeyCode::Char('d') => Some((0, step)),
            KeyCode::Char(' ') => {
                pen_down = !pen_down;
                publish(publisher, BoardCommand::Pen(pen_down)).await?;
                None
            }
            KeyCode::Char('r') => {
                step_idx = (step_idx + 1).min(STEPS.len() - 1);
                info!("Step: {} pulses", STEPS[step_idx]);
                None
            }
            KeyCode::Char('f') => {
                step_idx = step_idx.saturating_sub(1);
                info!("Step: {} pulses", STEPS[step_idx]);
                None
            }
            KeyCode::Esc => break,
            _ => None,
        };

        if let Some((left, right)) = wheels {
            let command = if pen_down {
                BoardCommand::Draw { left, right }
            } else {
                BoardCommand::Move { left, right }
            };
            publish(publisher, command).await?;
        }
    }

    Ok(())
}

async fn publish(
    publisher: &zenoh::pubsub::Publisher<'_>,
    command: BoardCommand,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    publisher.put(command.to_string()).await?;
    Ok(())
}
