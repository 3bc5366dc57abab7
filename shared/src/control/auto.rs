//! Auto-roast phase machine
//!
//! preheating → drying → firstCrack → development → (finish) → idle, with at
//! most one confirmation dialog open at a time. Threshold rules are
//! evaluated on temperature readings and clock ticks; none of them run while
//! a dialog is open.

use std::collections::BTreeSet;
use std::time::Duration;

use super::detector::TurningPointDetector;
use super::interlock::{InterlockReport, SafetyInterlock};
use super::{Deferred, Effect, Effects, RoastEvent, RoastSettings, SafetySettings};
use crate::error::{RoastError, RoastResult};
use crate::models::{
    Modal, Notification, RealtimeField, RoastPlan, RoastSnapshot, RoastStatus,
};
use crate::types::{TempHistory, TempSample};
use crate::validation::{validate_pre_heat_target, validate_roast_plan};

/// One-shot rules tracked per phase entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PhaseEvent {
    PreHeatReached,
    DryingComplete,
    FirstCrackComplete,
    DropReached,
    RoastPlanPrompted,
}

#[derive(Debug)]
pub struct AutoRoast {
    settings: RoastSettings,
    /// Generation counter; deferred actions from older sessions are dropped
    session: u64,
    status: RoastStatus,
    heater: bool,
    motor: bool,
    pid_control: bool,
    temperature: f64,
    elapsed: u32,
    pre_heat_target: f64,
    plan: Option<RoastPlan>,
    turning_point: Option<f64>,
    /// Turning point latched while another dialog was open
    turning_point_pending: bool,
    modal: Option<Modal>,
    notified: BTreeSet<PhaseEvent>,
    detector: TurningPointDetector,
    interlock: SafetyInterlock,
    history: TempHistory,
}

impl AutoRoast {
    pub fn new(settings: RoastSettings, safety: SafetySettings) -> Self {
        Self {
            settings,
            session: 0,
            status: RoastStatus::Idle,
            heater: false,
            motor: false,
            pid_control: false,
            temperature: 0.0,
            elapsed: 0,
            pre_heat_target: 0.0,
            plan: None,
            turning_point: None,
            turning_point_pending: false,
            modal: None,
            notified: BTreeSet::new(),
            detector: TurningPointDetector::new(
                settings.turning_point_arm_delay,
                settings.turning_point_hysteresis,
            ),
            interlock: SafetyInterlock::ceiling_only(safety),
            history: TempHistory::unbounded(),
        }
    }

    pub fn status(&self) -> RoastStatus {
        self.status
    }

    pub fn modal(&self) -> Option<Modal> {
        self.modal
    }

    pub fn plan(&self) -> Option<&RoastPlan> {
        self.plan.as_ref()
    }

    pub fn turning_point(&self) -> Option<f64> {
        self.turning_point
    }

    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }

    pub fn is_active(&self) -> bool {
        !self.status.is_idle()
    }

    pub fn snapshot(&self) -> RoastSnapshot {
        let plan = self.plan.unwrap_or(RoastPlan {
            drying_target_temp: 0.0,
            drying_target_time: 0,
            first_crack_target_temp: 0.0,
            first_crack_target_time: 0,
            drop_target_temp: 0.0,
            drop_target_time: 0,
        });
        RoastSnapshot {
            status: self.status,
            phase: self.status,
            heater: self.heater,
            motor: self.motor,
            pid_control: self.pid_control,
            temperature: self.temperature,
            elapsed_time: self.elapsed,
            pre_heat_target_temp: self.pre_heat_target,
            drying_target_temp: plan.drying_target_temp,
            drying_target_time: plan.drying_target_time,
            first_crack_target_temp: plan.first_crack_target_temp,
            first_crack_target_time: plan.first_crack_target_time,
            drop_target_temp: plan.drop_target_temp,
            drop_target_time: plan.drop_target_time,
            turning_point: self.turning_point,
            heater_control_disabled: self.interlock.is_heater_disabled(),
            is_modal_open: self.modal.is_some(),
            modal_type: self.modal,
            temp_history: self.history.to_vec(),
        }
    }

    // ========================================================================
    // Operator commands
    // ========================================================================

    /// Start pressed: open the pre-heat dialog, or tell the operator a roast
    /// is already running.
    pub fn request_start(&mut self) -> RoastResult<Vec<Effect>> {
        let mut fx = Effects::new();
        if self.is_active() {
            fx.notify(Notification::info(
                "Roasting in progress",
                "A roast is already running. Stop or finish it first.",
            ));
            return Ok(fx.into_vec());
        }
        self.ensure_no_modal()?;
        fx.write(RealtimeField::TurningPoint, 0.0);
        fx.write(RealtimeField::Status, RoastStatus::Idle.as_str());
        fx.write(RealtimeField::Phase, RoastStatus::Idle.as_str());
        self.open_modal(Modal::PreHeatEntry, &mut fx);
        Ok(fx.into_vec())
    }

    pub fn confirm_pre_heat(&mut self, target: f64) -> RoastResult<Vec<Effect>> {
        self.ensure_modal(Modal::PreHeatEntry)?;
        validate_pre_heat_target(target)?;

        let mut fx = Effects::new();
        self.close_modal(&mut fx);

        self.session += 1;
        self.elapsed = 0;
        self.plan = None;
        self.turning_point = None;
        self.turning_point_pending = false;
        self.history.clear();
        self.detector.reset();
        self.pre_heat_target = target;
        self.heater = !self.interlock.is_heater_disabled();
        self.motor = true;

        fx.write(RealtimeField::PreHeatTargetTemp, target);
        fx.write(RealtimeField::TargetTemp, target);
        self.enter(RoastStatus::Preheating, &mut fx);
        fx.write(RealtimeField::Heater, self.heater);
        fx.write(RealtimeField::Motor, true);
        fx.notify(Notification::info(
            "Preheating",
            format!("Heating the drum to {}°C.", target),
        ));
        Ok(fx.into_vec())
    }

    /// Beans are in the drum: start the drying clock and arm detection
    pub fn confirm_beans_inserted(&mut self, now: Duration) -> RoastResult<Vec<Effect>> {
        self.ensure_modal(Modal::BeansInserted)?;
        if self.status != RoastStatus::Preheating {
            return Err(RoastError::transition(format!(
                "beans can only be inserted while preheating, not {}",
                self.status
            )));
        }

        let mut fx = Effects::new();
        self.close_modal(&mut fx);
        self.elapsed = 0;
        self.history.clear();
        self.enter(RoastStatus::Drying, &mut fx);
        self.detector.arm(now);
        fx.write(RealtimeField::BeansInserted, true);
        fx.notify(Notification::info(
            "Drying Phase Started",
            "Watching for the turning point.",
        ));
        Ok(fx.into_vec())
    }

    pub fn acknowledge_turning_point(&mut self) -> RoastResult<Vec<Effect>> {
        self.ensure_modal(Modal::TurningPointAck)?;
        let mut fx = Effects::new();
        self.close_modal(&mut fx);
        Ok(fx.into_vec())
    }

    pub fn submit_plan(&mut self, plan: RoastPlan) -> RoastResult<Vec<Effect>> {
        self.ensure_modal(Modal::RoastPlanEntry)?;
        validate_roast_plan(&plan)?;

        let mut fx = Effects::new();
        self.close_modal(&mut fx);
        self.plan = Some(plan);
        self.pid_control = true;

        fx.write(RealtimeField::DryingTargetTemp, plan.drying_target_temp);
        fx.write(RealtimeField::DryingTargetTime, plan.drying_target_time);
        fx.write(RealtimeField::FirstCrackTargetTemp, plan.first_crack_target_temp);
        fx.write(RealtimeField::FirstCrackTargetTime, plan.first_crack_target_time);
        fx.write(RealtimeField::DropTargetTemp, plan.drop_target_temp);
        fx.write(RealtimeField::DropTargetTime, plan.drop_target_time);
        fx.write(RealtimeField::TargetTemp, plan.drying_target_temp);
        fx.write(RealtimeField::PidControl, true);
        fx.notify(Notification::success(
            "Roast Plan Set",
            "PID control is holding the drying target.",
        ));

        self.check_thresholds(&mut fx);
        Ok(fx.into_vec())
    }

    pub fn request_finish(&mut self) -> RoastResult<Vec<Effect>> {
        if !self.is_active() {
            return Err(RoastError::NotRoasting);
        }
        self.ensure_no_modal()?;
        let mut fx = Effects::new();
        self.open_modal(Modal::FinishConfirm, &mut fx);
        Ok(fx.into_vec())
    }

    pub fn confirm_finish(&mut self) -> RoastResult<Vec<Effect>> {
        self.ensure_modal(Modal::FinishConfirm)?;
        let mut fx = Effects::new();
        self.close_modal(&mut fx);
        fx.publish(RoastEvent::PhaseChanged {
            from: self.status,
            to: RoastStatus::Finished,
        });
        self.status = RoastStatus::Finished;
        fx.notify(Notification::success(
            "Roast Finished",
            "The roaster has been reset and is ready for the next batch.",
        ));
        self.reset(&mut fx);
        Ok(fx.into_vec())
    }

    /// Abort from any active phase
    pub fn stop(&mut self) -> RoastResult<Vec<Effect>> {
        if !self.is_active() && self.modal.is_none() {
            return Err(RoastError::NotRoasting);
        }
        let mut fx = Effects::new();
        if self.modal.is_some() {
            self.close_modal(&mut fx);
        }
        self.reset(&mut fx);
        fx.notify(Notification::info(
            "Roasting Stopped",
            "The roaster has been stopped and all targets cleared.",
        ));
        Ok(fx.into_vec())
    }

    /// Close a dialog that does not require confirmation
    pub fn cancel_modal(&mut self) -> RoastResult<Vec<Effect>> {
        match self.modal {
            Some(modal) if modal.is_cancellable() => {
                let mut fx = Effects::new();
                self.close_modal(&mut fx);
                if std::mem::take(&mut self.turning_point_pending)
                    && self.status == RoastStatus::Drying
                {
                    self.open_modal(Modal::TurningPointAck, &mut fx);
                }
                Ok(fx.into_vec())
            }
            Some(modal) => Err(RoastError::transition(format!(
                "the {} dialog must be confirmed",
                modal.as_str()
            ))),
            None => Err(RoastError::transition("no dialog is open")),
        }
    }

    pub fn set_heater(&mut self, on: bool) -> RoastResult<Vec<Effect>> {
        if on && self.interlock.is_heater_disabled() {
            return Err(RoastError::HeaterLocked);
        }
        self.heater = on;
        let mut fx = Effects::new();
        fx.write(RealtimeField::Heater, on);
        Ok(fx.into_vec())
    }

    pub fn set_motor(&mut self, on: bool) -> Vec<Effect> {
        self.motor = on;
        let mut fx = Effects::new();
        fx.write(RealtimeField::Motor, on);
        fx.into_vec()
    }

    pub fn set_pid_control(&mut self, on: bool) -> Vec<Effect> {
        self.pid_control = on;
        let mut fx = Effects::new();
        fx.write(RealtimeField::PidControl, on);
        fx.into_vec()
    }

    // ========================================================================
    // Telemetry, clock and deferred actions
    // ========================================================================

    pub fn on_temperature(&mut self, temperature: f64, now: Duration) -> Vec<Effect> {
        self.temperature = temperature;
        let mut fx = Effects::new();
        if !self.is_active() {
            return fx.into_vec();
        }

        self.history.push(TempSample {
            elapsed: self.elapsed,
            temp: temperature,
            target: self.current_target(),
        });

        let report = self.interlock.evaluate(temperature);
        self.apply_interlock(report, &mut fx);

        // Minimum tracking keeps running behind an open dialog
        if self.status == RoastStatus::Drying && self.turning_point.is_none() {
            if let Some(turning_point) = self.detector.observe(temperature, now) {
                self.latch_turning_point(turning_point, &mut fx);
                return fx.into_vec();
            }
        }

        if self.modal.is_some() {
            return fx.into_vec();
        }

        if self.status == RoastStatus::Preheating
            && temperature >= self.pre_heat_target
            && self.mark(PhaseEvent::PreHeatReached)
        {
            fx.notify(Notification::success(
                "Pre-Heat Target Reached",
                "The roaster has reached the pre-heat target temperature.",
            ));
            self.open_modal(Modal::BeansInserted, &mut fx);
        }

        self.check_thresholds(&mut fx);
        fx.into_vec()
    }

    /// Clock tick, once per second
    pub fn on_tick(&mut self) -> Vec<Effect> {
        let mut fx = Effects::new();
        if !self.is_active() {
            return fx.into_vec();
        }
        self.elapsed = self.elapsed.saturating_add(1);
        if self.modal.is_none() {
            self.check_thresholds(&mut fx);
        }
        fx.into_vec()
    }

    /// Heater state observed on the realtime store
    pub fn on_heater_echo(&mut self, on: bool) -> Vec<Effect> {
        let mut fx = Effects::new();
        if on && self.interlock.is_heater_disabled() {
            self.heater = false;
            fx.write(RealtimeField::Heater, false);
        } else {
            self.heater = on;
        }
        fx.into_vec()
    }

    pub fn on_motor_echo(&mut self, on: bool) {
        self.motor = on;
    }

    pub fn fire(&mut self, action: Deferred) -> Vec<Effect> {
        let mut fx = Effects::new();
        match action {
            Deferred::OpenRoastPlan { session } => {
                if session == self.session
                    && self.status == RoastStatus::Drying
                    && self.modal.is_none()
                    && self.turning_point.is_some()
                    && self.plan.is_none()
                    && self.mark(PhaseEvent::RoastPlanPrompted)
                {
                    self.open_modal(Modal::RoastPlanEntry, &mut fx);
                }
            }
        }
        fx.into_vec()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Record the turning point; its dialog waits for any open one to close
    fn latch_turning_point(&mut self, turning_point: f64, fx: &mut Effects) {
        self.turning_point = Some(turning_point);
        fx.write(RealtimeField::TurningPoint, turning_point);
        fx.publish(RoastEvent::TurningPointDetected {
            temperature: turning_point,
        });
        fx.notify(Notification::info(
            "Turning Point Detected",
            format!("Bean temperature bottomed out at {:.1}°C.", turning_point),
        ));
        if self.modal.is_none() {
            self.open_modal(Modal::TurningPointAck, fx);
        } else {
            self.turning_point_pending = true;
        }
    }

    fn check_thresholds(&mut self, fx: &mut Effects) {
        let Some(plan) = self.plan else {
            return;
        };
        match self.status {
            RoastStatus::Drying => {
                if self.elapsed >= plan.drying_target_time && self.mark(PhaseEvent::DryingComplete)
                {
                    fx.notify(Notification::success(
                        "Drying Phase Complete",
                        "Moving to First Crack phase.",
                    ));
                    self.enter(RoastStatus::FirstCrack, fx);
                    fx.write(RealtimeField::TargetTemp, plan.first_crack_target_temp);
                    self.check_thresholds(fx);
                }
            }
            RoastStatus::FirstCrack => {
                let phase_end = plan.drying_target_time + plan.first_crack_target_time;
                if self.elapsed >= phase_end && self.mark(PhaseEvent::FirstCrackComplete) {
                    fx.notify(Notification::success(
                        "First Crack Phase Complete",
                        "Moving to Development phase.",
                    ));
                    self.pid_control = false;
                    fx.write(RealtimeField::PidControl, false);
                    self.enter(RoastStatus::Development, fx);
                    self.check_thresholds(fx);
                }
            }
            RoastStatus::Development => {
                let reached = self.temperature >= plan.drop_target_temp
                    || self.elapsed >= plan.drop_target_time;
                if reached && self.mark(PhaseEvent::DropReached) {
                    fx.notify(
                        Notification::warning(
                            "Drop Target Reached",
                            "The roast has reached the target drop temperature or time. Consider finishing the roast.",
                        )
                        .persistent(),
                    );
                }
            }
            _ => {}
        }
    }

    fn apply_interlock(&mut self, report: InterlockReport, fx: &mut Effects) {
        if report.force_heater_off && (self.heater || report.tripped()) {
            self.heater = false;
            fx.write(RealtimeField::Heater, false);
        }
        for signal in &report.signals {
            fx.notify(signal.notification());
            if let Some(event) = signal.event() {
                fx.publish(event);
            }
        }
    }

    fn enter(&mut self, to: RoastStatus, fx: &mut Effects) {
        let from = self.status;
        self.status = to;
        self.notified.clear();
        if to != RoastStatus::Drying {
            self.detector.reset();
        }
        fx.write(RealtimeField::Status, to.as_str());
        fx.write(RealtimeField::Phase, to.as_str());
        fx.publish(RoastEvent::PhaseChanged { from, to });
    }

    /// Back to idle, clearing every target in the realtime store
    fn reset(&mut self, fx: &mut Effects) {
        self.session += 1;
        self.status = RoastStatus::Idle;
        self.heater = false;
        self.motor = false;
        self.pid_control = false;
        self.elapsed = 0;
        self.pre_heat_target = 0.0;
        self.plan = None;
        self.turning_point = None;
        self.turning_point_pending = false;
        self.modal = None;
        self.notified.clear();
        self.detector.reset();
        self.history.clear();

        fx.write(RealtimeField::Status, RoastStatus::Idle.as_str());
        fx.write(RealtimeField::Phase, RoastStatus::Idle.as_str());
        fx.write(RealtimeField::Heater, false);
        fx.write(RealtimeField::Motor, false);
        fx.write(RealtimeField::PidControl, false);
        fx.write(RealtimeField::TurningPoint, 0.0);
        fx.write(RealtimeField::BeansInserted, false);
        fx.write(RealtimeField::TargetTemp, 0.0);
        fx.write(RealtimeField::PreHeatTargetTemp, 0.0);
        fx.write(RealtimeField::DryingTargetTemp, 0.0);
        fx.write(RealtimeField::DryingTargetTime, 0.0);
        fx.write(RealtimeField::FirstCrackTargetTemp, 0.0);
        fx.write(RealtimeField::FirstCrackTargetTime, 0.0);
        fx.write(RealtimeField::DropTargetTemp, 0.0);
        fx.write(RealtimeField::DropTargetTime, 0.0);
        fx.publish(RoastEvent::SessionReset);
    }

    fn current_target(&self) -> f64 {
        match (self.status, self.plan) {
            (RoastStatus::Preheating, _) => self.pre_heat_target,
            (RoastStatus::Drying, Some(plan)) => plan.drying_target_temp,
            (RoastStatus::FirstCrack, Some(plan)) => plan.first_crack_target_temp,
            (RoastStatus::Development, Some(plan)) => plan.drop_target_temp,
            _ => 0.0,
        }
    }

    /// Record a one-shot; `false` if it already happened in this phase
    fn mark(&mut self, event: PhaseEvent) -> bool {
        self.notified.insert(event)
    }

    fn open_modal(&mut self, modal: Modal, fx: &mut Effects) {
        self.modal = Some(modal);
        fx.publish(RoastEvent::ModalOpened { modal });
    }

    fn close_modal(&mut self, fx: &mut Effects) {
        if let Some(modal) = self.modal.take() {
            fx.publish(RoastEvent::ModalClosed { modal });
        }
        if self.status == RoastStatus::Drying
            && self.turning_point.is_some()
            && !self.turning_point_pending
            && self.plan.is_none()
            && !self.notified.contains(&PhaseEvent::RoastPlanPrompted)
        {
            fx.schedule(
                self.settings.roast_plan_delay,
                Deferred::OpenRoastPlan {
                    session: self.session,
                },
            );
        }
    }

    fn ensure_modal(&self, expected: Modal) -> RoastResult<()> {
        match self.modal {
            Some(modal) if modal == expected => Ok(()),
            Some(modal) => Err(RoastError::transition(format!(
                "expected the {} dialog but {} is open",
                expected.as_str(),
                modal.as_str()
            ))),
            None => Err(RoastError::transition(format!(
                "the {} dialog is not open",
                expected.as_str()
            ))),
        }
    }

    fn ensure_no_modal(&self) -> RoastResult<()> {
        match self.modal {
            Some(modal) => Err(RoastError::transition(format!(
                "the {} dialog is already open",
                modal.as_str()
            ))),
            None => Ok(()),
        }
    }
}
