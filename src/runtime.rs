// Tick loop: pose feed in, session lines in, wheel speeds and responses out
// Ticks and session events share this one task; the controller is never locked.

use std::time::Instant;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, info, warn};

// local imports
use crate::config::{
    Args, POSE_TIMEOUT, POSE_TRACE_EVERY, SIM_ARENA_SIZE, SIM_AXLE_LENGTH, SIM_ROBOT_RADIUS,
    TOPIC_HEALTH, TOPIC_POSE, TOPIC_WHEELS,
};
use crate::controller::{RobotController, SessionAction};
use crate::messages::{Pose, RuntimeHealth};
use crate::motion::WheelSpeeds;
use crate::session::{self, Session, SessionEvent};
use crate::sim::Simulator;

/// Pose feed freshness, reported but never used to stop a motion
struct PoseWatchdog {
    last_pose_at: Option<Instant>, // None until the first pose
    health: RuntimeHealth,
}

impl PoseWatchdog {
    fn new() -> Self {
        Self {
            last_pose_at: None,
            health: RuntimeHealth::PoseStale,
        }
    }

    fn on_pose(&mut self) {
        self.last_pose_at = Some(Instant::now());
    }

    fn check(&mut self) -> RuntimeHealth {
        let age = self.last_pose_at.map(|at| at.elapsed());
        if age.is_none_or(|age| age > POSE_TIMEOUT) {
            if self.health != RuntimeHealth::PoseStale {
                warn!("Pose feed stale ({:?} old)", age.unwrap_or_default());
            }
            self.health = RuntimeHealth::PoseStale;
        } else {
            if self.health != RuntimeHealth::Ok {
                info!("Pose feed live");
            }
            self.health = RuntimeHealth::Ok;
        }
        self.health
    }
}

/// Send every pending response to the connected client, if any
fn flush_responses(controller: &mut RobotController, client: Option<&Session>) {
    for response in controller.drain_responses() {
        match client {
            Some(session) => {
                if !session.send(&response) {
                    debug!("Client {} gone, dropping: {}", session.id, response);
                }
            }
            None => debug!("No client connected, dropping: {}", response),
        }
    }
}

/// Actuation goes out on every tick so late subscribers catch up, and
/// between ticks only when it changed
fn wheels_due(published: Option<WheelSpeeds>, wheels: WheelSpeeds, ticked: bool) -> bool {
    ticked || published != Some(wheels)
}

/// Apply one session event: the newest connection replaces the active one,
/// lines from any other connection are ignored. On quit the goodbye is
/// flushed before returning.
fn on_session_event(
    event: SessionEvent,
    controller: &mut RobotController,
    client: &mut Option<Session>,
) -> SessionAction {
    match event {
        SessionEvent::Connected(session) => {
            if let Some(old) = client.replace(session) {
                info!("Client {} replaced by a new connection", old.id);
            }
            controller.greeting();
        }
        SessionEvent::Line { id, line } => {
            if client.as_ref().map(|s| s.id) != Some(id) {
                debug!("Ignoring line from inactive client {}: {:?}", id, line);
                return SessionAction::Continue;
            }
            if controller.handle_line(&line) == SessionAction::Quit {
                info!("Quit requested by client {}", id);
                flush_responses(controller, client.as_ref());
                return SessionAction::Quit;
            }
        }
        SessionEvent::Disconnected { id } => {
            if client.as_ref().map(|s| s.id) == Some(id) {
                *client = None;
            }
        }
    }
    SessionAction::Continue
}

pub async fn run(args: Args) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("Opening Zenoh session...");
    let zenoh_session = zenoh::open(zenoh::Config::default()).await?;

    info!("Setting up publishers and subscribers...");
    let pub_wheels = zenoh_session.declare_publisher(TOPIC_WHEELS).await?;
    let pub_health = zenoh_session.declare_publisher(TOPIC_HEALTH).await?;
    let pose_subscriber = if args.sim {
        None
    } else {
        Some(zenoh_session.declare_subscriber(TOPIC_POSE).await?)
    };

    let start_pose = Pose::new(args.start_x, args.start_y, args.start_heading);
    let mut simulator = args
        .sim
        .then(|| Simulator::new(start_pose, SIM_AXLE_LENGTH, SIM_ARENA_SIZE, SIM_ROBOT_RADIUS));

    let listener = TcpListener::bind(args.listen).await?;
    let (events_tx, mut events_rx) = mpsc::channel::<SessionEvent>(64);
    session::spawn_acceptor(listener, events_tx);

    let mut controller = RobotController::new(args.base_speed, start_pose);
    let mut client: Option<Session> = None;
    let mut watchdog = PoseWatchdog::new();
    let mut published: Option<WheelSpeeds> = None;
    let mut ticks: u64 = 0;

    let period = args.tick_period();
    let dt = period.as_secs_f64();
    let mut tick = interval(period);

    info!(
        "Runtime started: {}Hz loop, base speed {}, {} pose feed",
        args.loop_hz,
        args.base_speed,
        if args.sim { "simulated" } else { "zenoh" }
    );
    info!("Listening for commands on {}", args.listen);
    if !args.sim {
        info!("Subscribed to: {}", TOPIC_POSE);
    }
    info!("Publishing to: {}, {}", TOPIC_WHEELS, TOPIC_HEALTH);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let mut ticked = false;
        tokio::select! {
            _ = tick.tick() => {
                ticks += 1;
                ticked = true;

                // 1. Latest pose: step the simulator, or drain the feed and keep the newest
                let mut pose = None;
                if let Some(sim) = simulator.as_mut() {
                    sim.step(dt);
                    pose = Some(sim.pose());
                } else if let Some(subscriber) = pose_subscriber.as_ref() {
                    while let Ok(Some(sample)) = subscriber.try_recv() {
                        let payload = sample.payload().to_bytes();
                        match serde_json::from_slice::<Pose>(&payload) {
                            Ok(p) => pose = Some(p),
                            Err(e) => warn!("Failed to parse pose: {}", e),
                        }
                    }
                }

                // 2. Advance the sequencer
                if let Some(pose) = pose {
                    watchdog.on_pose();
                    controller.on_tick(pose);
                }

                if ticks % POSE_TRACE_EVERY == 0 {
                    let p = controller.pose();
                    info!("Tick {} - pose ({:.2}, {:.2}) heading {:.2}", ticks, p.x, p.y, p.heading);
                }

                // 3. Publish health
                let health_json = serde_json::to_string(&watchdog.check())?;
                pub_health.put(health_json).await?;
            }
            Some(event) = events_rx.recv() => {
                if on_session_event(event, &mut controller, &mut client) == SessionAction::Quit {
                    break;
                }
            }
            _ = &mut ctrl_c => {
                info!("Interrupted, shutting down");
                break;
            }
        }

        // 4. Publish actuation every tick, and right away when it changes
        let wheels = controller.wheel_speeds();
        if published != Some(wheels) {
            debug!("Wheel speeds: left={:.2}, right={:.2}", wheels.left, wheels.right);
        }
        if wheels_due(published, wheels, ticked) {
            pub_wheels.put(serde_json::to_string(&wheels)?).await?;
            if let Some(sim) = simulator.as_mut() {
                sim.set_wheel_speeds(wheels);
            }
            published = Some(wheels);
        }

        // 5. Responses to the client
        flush_responses(&mut controller, client.as_ref());
    }

    // Leave the robot stopped (safety measure)
    pub_wheels.put(serde_json::to_string(&WheelSpeeds::stop())?).await?;
    if let Some(session) = client.take() {
        session.close().await;
    }

    info!("Runtime stopped after {} ticks", ticks);
    Ok(())
}
