//! Session actor that drives a pure control machine
//!
//! Each controller is a tokio task owning its machine. Operator commands, the
//! 1 Hz clock, telemetry updates and deferred actions are processed strictly
//! one at a time. Effects returned by the machine are carried out here:
//! realtime writes go to a sequential writer task, notifications to the
//! [`NotificationHub`], events to the [`EventBus`], and scheduled actions are
//! delivered back to the machine after their delay.

use std::sync::Arc;
use std::time::Duration;

use roast_core::control::{AutoRoast, Deferred, Effect, ManualRoast};
use roast_core::{
    FieldValue, ManualSnapshot, Notification, RealtimeField, RoastError, RoastResult,
    RoastSnapshot,
};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use super::events::EventBus;
use super::notification::NotificationHub;
use super::telemetry::{TelemetryLink, TelemetryUpdate};
use crate::error::{AppError, AppResult};
use crate::store::RealtimeStore;

const JOB_CAPACITY: usize = 32;
const TICK: Duration = Duration::from_secs(1);

/// A control machine the session actor can drive
pub trait ControlMachine: Send + 'static {
    type Snapshot: Clone + Send + Sync + 'static;

    /// Name used in logs and errors
    const NAME: &'static str;

    fn snapshot(&self) -> Self::Snapshot;

    /// Whether the 1 Hz clock should be running
    fn clock_running(&self) -> bool;

    fn on_tick(&mut self) -> Vec<Effect>;

    fn on_telemetry(&mut self, update: TelemetryUpdate, now: Duration) -> Vec<Effect>;

    fn fire(&mut self, action: Deferred) -> Vec<Effect>;
}

fn telemetry_lost(silent_for: Duration) -> Effect {
    Effect::Notify(Notification::warning(
        "Temperature Signal Lost",
        format!(
            "No temperature reading received for {} seconds.",
            silent_for.as_secs()
        ),
    ))
}

impl ControlMachine for AutoRoast {
    type Snapshot = RoastSnapshot;
    const NAME: &'static str = "auto roast";

    fn snapshot(&self) -> RoastSnapshot {
        AutoRoast::snapshot(self)
    }

    fn clock_running(&self) -> bool {
        self.is_active()
    }

    fn on_tick(&mut self) -> Vec<Effect> {
        AutoRoast::on_tick(self)
    }

    fn on_telemetry(&mut self, update: TelemetryUpdate, now: Duration) -> Vec<Effect> {
        match update {
            TelemetryUpdate::Temperature(temperature) => self.on_temperature(temperature, now),
            TelemetryUpdate::Heater(on) => self.on_heater_echo(on),
            TelemetryUpdate::Motor(on) => {
                self.on_motor_echo(on);
                Vec::new()
            }
            TelemetryUpdate::Stale { silent_for } if self.is_active() => {
                vec![telemetry_lost(silent_for)]
            }
            TelemetryUpdate::Stale { .. } => Vec::new(),
        }
    }

    fn fire(&mut self, action: Deferred) -> Vec<Effect> {
        AutoRoast::fire(self, action)
    }
}

impl ControlMachine for ManualRoast {
    type Snapshot = ManualSnapshot;
    const NAME: &'static str = "manual roast";

    fn snapshot(&self) -> ManualSnapshot {
        ManualRoast::snapshot(self)
    }

    fn clock_running(&self) -> bool {
        self.is_roasting()
    }

    fn on_tick(&mut self) -> Vec<Effect> {
        ManualRoast::on_tick(self)
    }

    fn on_telemetry(&mut self, update: TelemetryUpdate, _now: Duration) -> Vec<Effect> {
        match update {
            TelemetryUpdate::Temperature(temperature) => self.on_temperature(temperature),
            TelemetryUpdate::Heater(on) => self.on_heater_echo(on),
            TelemetryUpdate::Motor(on) => {
                self.on_motor_echo(on);
                Vec::new()
            }
            TelemetryUpdate::Stale { silent_for } if self.is_roasting() => {
                vec![telemetry_lost(silent_for)]
            }
            TelemetryUpdate::Stale { .. } => Vec::new(),
        }
    }

    fn fire(&mut self, _action: Deferred) -> Vec<Effect> {
        Vec::new()
    }
}

/// Shared services every session actor needs
#[derive(Clone)]
pub struct SessionDeps {
    pub realtime: Arc<dyn RealtimeStore>,
    pub notifications: NotificationHub,
    pub events: EventBus,
    pub stale_after: Option<Duration>,
}

type Reply = Box<dyn FnOnce() + Send>;
type Job<M> = Box<dyn FnOnce(&mut M, Duration) -> (Vec<Effect>, Reply) + Send>;

/// Handle to a running session actor
///
/// The actor stops when the last handle is dropped.
pub struct SessionController<M: ControlMachine> {
    jobs: mpsc::Sender<Job<M>>,
    snapshot: watch::Receiver<M::Snapshot>,
}

impl<M: ControlMachine> Clone for SessionController<M> {
    fn clone(&self) -> Self {
        Self {
            jobs: self.jobs.clone(),
            snapshot: self.snapshot.clone(),
        }
    }
}

impl<M: ControlMachine> SessionController<M> {
    /// Spawn the actor on the current runtime
    pub fn spawn(machine: M, deps: &SessionDeps) -> Self {
        let (jobs_tx, jobs_rx) = mpsc::channel(JOB_CAPACITY);
        let (snapshot_tx, snapshot_rx) = watch::channel(machine.snapshot());
        let (link, telemetry) = TelemetryLink::subscribe(deps.realtime.clone(), deps.stale_after);
        let (deferred_tx, deferred_rx) = mpsc::unbounded_channel();
        let writes = spawn_writer(deps.realtime.clone(), deps.notifications.clone());

        let mut actor = SessionActor {
            machine,
            started: Instant::now(),
            jobs: jobs_rx,
            telemetry,
            _link: link,
            deferred_tx,
            deferred_rx,
            clock: None,
            writes,
            snapshot: snapshot_tx,
            notifications: deps.notifications.clone(),
            events: deps.events.clone(),
        };
        actor.sync_clock();
        tokio::spawn(actor.run());

        tracing::debug!("{} controller started", M::NAME);

        Self {
            jobs: jobs_tx,
            snapshot: snapshot_rx,
        }
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> M::Snapshot {
        self.snapshot.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<M::Snapshot> {
        self.snapshot.clone()
    }

    /// Run `command` on the machine and wait until its effects are applied
    pub async fn execute<R, F>(&self, command: F) -> AppResult<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut M, Duration) -> RoastResult<(Vec<Effect>, R)> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel::<RoastResult<R>>();

        let job: Job<M> = Box::new(move |machine: &mut M, now: Duration| {
            match command(machine, now) {
                Ok((effects, value)) => {
                    let reply: Reply = Box::new(move || {
                        let _ = tx.send(Ok(value));
                    });
                    (effects, reply)
                }
                Err(error) => {
                    let effects = match error {
                        RoastError::HeaterLocked => vec![Effect::Notify(Notification::warning(
                            "Heater Control Disabled",
                            "The heater is locked by the safety interlock until the temperature drops.",
                        ))],
                        _ => Vec::new(),
                    };
                    let reply: Reply = Box::new(move || {
                        let _ = tx.send(Err(error));
                    });
                    (effects, reply)
                }
            }
        });

        self.jobs.send(job).await.map_err(|_| stopped::<M>())?;
        rx.await.map_err(|_| stopped::<M>())?.map_err(AppError::from)
    }

    /// Run a command that only produces effects
    pub async fn apply<F>(&self, command: F) -> AppResult<()>
    where
        F: FnOnce(&mut M, Duration) -> RoastResult<Vec<Effect>> + Send + 'static,
    {
        self.execute(move |machine, now| command(machine, now).map(|effects| (effects, ())))
            .await
    }
}

fn stopped<M: ControlMachine>() -> AppError {
    AppError::Unavailable(format!("{} controller is not running", M::NAME))
}

struct SessionActor<M: ControlMachine> {
    machine: M,
    started: Instant,
    jobs: mpsc::Receiver<Job<M>>,
    telemetry: mpsc::Receiver<TelemetryUpdate>,
    _link: TelemetryLink,
    deferred_tx: mpsc::UnboundedSender<Deferred>,
    deferred_rx: mpsc::UnboundedReceiver<Deferred>,
    clock: Option<Interval>,
    writes: mpsc::UnboundedSender<(RealtimeField, FieldValue)>,
    snapshot: watch::Sender<M::Snapshot>,
    notifications: NotificationHub,
    events: EventBus,
}

impl<M: ControlMachine> SessionActor<M> {
    async fn run(mut self) {
        loop {
            tokio::select! {
                job = self.jobs.recv() => match job {
                    Some(job) => {
                        let now = self.now();
                        let (effects, reply) = job(&mut self.machine, now);
                        self.apply(effects);
                        reply();
                    }
                    None => break,
                },
                Some(update) = self.telemetry.recv() => {
                    let now = self.now();
                    let effects = self.machine.on_telemetry(update, now);
                    self.apply(effects);
                }
                Some(action) = self.deferred_rx.recv() => {
                    let effects = self.machine.fire(action);
                    self.apply(effects);
                }
                _ = next_tick(&mut self.clock) => {
                    let effects = self.machine.on_tick();
                    self.apply(effects);
                }
            }
        }

        tracing::debug!("{} controller stopped", M::NAME);
    }

    fn now(&self) -> Duration {
        self.started.elapsed()
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Write { field, value } => {
                    if self.writes.send((field, value)).is_err() {
                        tracing::warn!(%field, "realtime writer is gone");
                    }
                }
                Effect::Notify(notification) => self.notifications.notify(notification),
                Effect::Publish(event) => self.events.publish(event),
                Effect::Schedule { delay, action } => {
                    let deferred = self.deferred_tx.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        let _ = deferred.send(action);
                    });
                }
            }
        }

        self.sync_clock();
        self.snapshot.send_replace(self.machine.snapshot());
    }

    fn sync_clock(&mut self) {
        match (self.machine.clock_running(), self.clock.is_some()) {
            (true, false) => {
                let mut clock = interval_at(Instant::now() + TICK, TICK);
                clock.set_missed_tick_behavior(MissedTickBehavior::Delay);
                self.clock = Some(clock);
            }
            (false, true) => self.clock = None,
            _ => {}
        }
    }
}

async fn next_tick(clock: &mut Option<Interval>) {
    match clock {
        Some(clock) => {
            clock.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Apply realtime writes in order; failures are reported, never retried
fn spawn_writer(
    store: Arc<dyn RealtimeStore>,
    notifications: NotificationHub,
) -> mpsc::UnboundedSender<(RealtimeField, FieldValue)> {
    let (tx, mut rx) = mpsc::unbounded_channel::<(RealtimeField, FieldValue)>();
    tokio::spawn(async move {
        while let Some((field, value)) = rx.recv().await {
            if let Err(e) = store.write(field, value).await {
                tracing::warn!(%field, error = %e, "realtime write failed");
                notifications.notify(Notification::error(
                    "Roaster Update Failed",
                    format!("Could not update {}: {}", field.key(), e),
                ));
            }
        }
    });
    tx
}
