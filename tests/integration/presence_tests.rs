//! PresenceMonitor against a scripted sensor on a paused clock.

use std::time::Duration;

use deskswitch::app::ports::SensorError;
use deskswitch::presence::PresenceMonitor;
use tokio::sync::mpsc;

use crate::mock_hw::{ScriptedSensor, fixture};

const HOLD: Duration = Duration::from_secs(5);
const POLL: Duration = Duration::from_secs(1);

#[tokio::test(start_paused = true)]
async fn absence_reported_after_hold() {
    let sensor = ScriptedSensor::new([Ok(true), Ok(false), Ok(false), Ok(false)]);
    let mut monitor = PresenceMonitor::new(sensor, HOLD, POLL);

    assert_eq!(monitor.poll_once().await, None);
    tokio::time::advance(Duration::from_secs(1)).await;
    assert_eq!(monitor.poll_once().await, None);
    tokio::time::advance(Duration::from_secs(3)).await;
    assert_eq!(monitor.poll_once().await, None);
    tokio::time::advance(Duration::from_secs(3)).await;
    assert_eq!(monitor.poll_once().await, Some(false));
    assert!(monitor.debouncer().absence_reported());
}

#[tokio::test(start_paused = true)]
async fn fetch_error_skips_the_tick() {
    let sensor = ScriptedSensor::new([
        Ok(true),
        Err(SensorError::Transport("timed out".into())),
        Err(SensorError::Status(503)),
    ]);
    let mut monitor = PresenceMonitor::new(sensor, HOLD, POLL);

    assert_eq!(monitor.poll_once().await, None);
    tokio::time::advance(Duration::from_secs(10)).await;
    assert_eq!(monitor.poll_once().await, None);
    assert_eq!(monitor.poll_once().await, None);
    assert!(monitor.debouncer().last_presence(), "errors keep the previous reading");
}

#[tokio::test(start_paused = true)]
async fn run_delivers_debounced_edges() {
    let sensor = ScriptedSensor::new(
        [true, false, false, false, false, false, false, false, true]
            .into_iter()
            .map(Ok),
    );
    let monitor = PresenceMonitor::new(sensor, HOLD, POLL);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let task = tokio::spawn(monitor.run(move |present| {
        let tx = tx.clone();
        async move {
            let _ = tx.send(present);
        }
    }));

    let first = tokio::time::timeout(Duration::from_secs(30), rx.recv()).await.unwrap();
    let second = tokio::time::timeout(Duration::from_secs(30), rx.recv()).await.unwrap();
    task.abort();

    assert_eq!(first, Some(false));
    assert_eq!(second, Some(true));
}

#[tokio::test(start_paused = true)]
async fn monitor_drives_board_blanking() {
    let f = fixture("presence-board");
    f.board.init_panel().await;
    let sensor = ScriptedSensor::new([Ok(true), Ok(false)]);
    let monitor = PresenceMonitor::new(sensor, HOLD, POLL);

    let board = f.board.clone();
    let task = tokio::spawn(monitor.run(move |present| {
        let board = board.clone();
        async move { board.on_presence_changed(present).await }
    }));

    tokio::time::sleep(Duration::from_secs(10)).await;
    task.abort();

    assert!(f.board.is_blanked().await);
}
