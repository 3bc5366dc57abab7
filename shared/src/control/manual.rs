//! Manual roast session
//!
//! The operator drives heater and motor directly. Every reading passes
//! through the safety interlock while a roast is running; stopping captures
//! the drop temperature and duration and holds them for save or discard.

use super::interlock::{InterlockReport, SafetyInterlock};
use super::{Effect, Effects, RoastEvent, RoastSettings, SafetySettings};
use crate::error::{RoastError, RoastResult};
use crate::models::{
    ManualDialog, ManualRoastSettings, ManualSnapshot, Notification, RealtimeField,
    RoastLog, RoastLogPatch, RoastProfileInput, SaveRoastInput, StoppedRoast,
};
use crate::types::{TempHistory, TempSample};
use crate::validation::{validate_manual_settings, validate_profile_input};

/// Default profile name offered in the save dialog
pub const DEFAULT_PROFILE_NAME: &str = "My Roast Profile";

#[derive(Debug)]
pub struct ManualRoast {
    safety: SafetySettings,
    is_roasting: bool,
    heater: bool,
    motor: bool,
    temperature: f64,
    elapsed: u32,
    settings: ManualRoastSettings,
    interlock: SafetyInterlock,
    timer_notification_sent: bool,
    history: TempHistory,
    log: RoastLog,
    dialog: Option<ManualDialog>,
    stopped: Option<StoppedRoast>,
}

impl ManualRoast {
    pub fn new(settings: RoastSettings, safety: SafetySettings) -> Self {
        let defaults = ManualRoastSettings::default();
        Self {
            safety,
            is_roasting: false,
            heater: false,
            motor: false,
            temperature: 0.0,
            elapsed: 0,
            settings: defaults,
            interlock: SafetyInterlock::new(
                safety,
                defaults.target_temperature,
                defaults.max_safety_temp,
                defaults.auto_shutoff_enabled,
            ),
            timer_notification_sent: false,
            history: TempHistory::with_capacity(settings.manual_history_capacity),
            log: RoastLog::default(),
            dialog: None,
            stopped: None,
        }
    }

    pub fn is_roasting(&self) -> bool {
        self.is_roasting
    }

    /// Roasting, or stopped with an unsaved result
    pub fn is_active(&self) -> bool {
        self.is_roasting || self.stopped.is_some()
    }

    pub fn dialog(&self) -> Option<ManualDialog> {
        self.dialog
    }

    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }

    pub fn snapshot(&self) -> ManualSnapshot {
        ManualSnapshot {
            is_roasting: self.is_roasting,
            heater: self.heater,
            motor: self.motor,
            temperature: self.temperature,
            elapsed_time: self.elapsed,
            settings: self.settings,
            heater_control_disabled: self.interlock.is_heater_disabled(),
            is_target_reached: self.interlock.is_target_reached(),
            is_nearing_safety_limit: self.interlock.is_nearing_limit(),
            timer_notification_sent: self.timer_notification_sent,
            stats: self.history.stats(),
            temp_history: self.history.to_vec(),
            log: self.log.clone(),
            dialog: self.dialog,
            stopped: self.stopped.clone(),
        }
    }

    pub fn start(&mut self, settings: ManualRoastSettings) -> RoastResult<Vec<Effect>> {
        if self.is_active() {
            return Err(RoastError::transition("a manual roast is already active"));
        }
        validate_manual_settings(&settings, &self.safety)?;

        self.settings = settings;
        self.interlock = SafetyInterlock::new(
            self.safety,
            settings.target_temperature,
            settings.max_safety_temp,
            settings.auto_shutoff_enabled,
        );
        self.is_roasting = true;
        self.elapsed = 0;
        self.timer_notification_sent = false;
        self.heater = true;
        self.motor = true;
        self.history.clear();
        self.log = RoastLog::default();
        self.dialog = None;

        let mut fx = Effects::new();
        fx.write(RealtimeField::Status, "roasting");
        fx.write(RealtimeField::TargetTemp, settings.target_temperature);
        fx.write(RealtimeField::MaxSafetyTemp, settings.max_safety_temp);
        fx.write(RealtimeField::Heater, true);
        fx.write(RealtimeField::Motor, true);
        fx.publish(RoastEvent::ManualStarted {
            target_temperature: settings.target_temperature,
            max_safety_temp: settings.max_safety_temp,
        });
        fx.notify(Notification::success(
            "Roasting Started",
            format!(
                "Target {}°C, safety limit {}°C.",
                settings.target_temperature, settings.max_safety_temp
            ),
        ));
        Ok(fx.into_vec())
    }

    pub fn on_temperature(&mut self, temperature: f64) -> Vec<Effect> {
        self.temperature = temperature;
        self.history.push(TempSample {
            elapsed: self.elapsed,
            temp: temperature,
            target: self.settings.target_temperature,
        });

        let mut fx = Effects::new();
        if self.is_roasting {
            let report = self.interlock.evaluate(temperature);
            self.apply_interlock(report, &mut fx);
        }
        fx.into_vec()
    }

    /// Clock tick, once per second while roasting
    pub fn on_tick(&mut self) -> Vec<Effect> {
        let mut fx = Effects::new();
        if !self.is_roasting {
            return fx.into_vec();
        }
        self.elapsed = self.elapsed.saturating_add(1);

        let timer_seconds = self.settings.timer_duration.saturating_mul(60);
        if self.settings.timer_enabled
            && !self.timer_notification_sent
            && self.elapsed >= timer_seconds
        {
            self.timer_notification_sent = true;
            fx.notify(Notification::info(
                "Timer Reached",
                format!(
                    "The configured timer of {} minutes has elapsed.",
                    self.settings.timer_duration
                ),
            ));
        }
        fx.into_vec()
    }

    pub fn set_heater(&mut self, on: bool) -> RoastResult<Vec<Effect>> {
        if on && !self.is_roasting {
            return Err(RoastError::NotRoasting);
        }
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

    /// Heater state observed on the realtime store
    pub fn on_heater_echo(&mut self, on: bool) -> Vec<Effect> {
        let mut fx = Effects::new();
        if on && self.is_roasting && self.interlock.is_heater_disabled() {
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

    pub fn update_log(&mut self, patch: RoastLogPatch) -> RoastResult<()> {
        if !self.is_active() {
            return Err(RoastError::NotRoasting);
        }
        self.log.apply(patch);
        if let Some(stopped) = self.stopped.as_mut() {
            stopped.log = self.log.clone();
        }
        Ok(())
    }

    pub fn request_stop(&mut self) -> RoastResult<()> {
        if !self.is_roasting {
            return Err(RoastError::NotRoasting);
        }
        if self.dialog.is_some() {
            return Err(RoastError::transition("a dialog is already open"));
        }
        self.dialog = Some(ManualDialog::StopConfirm);
        Ok(())
    }

    pub fn cancel_stop(&mut self) -> RoastResult<()> {
        if self.dialog != Some(ManualDialog::StopConfirm) {
            return Err(RoastError::transition("the stop dialog is not open"));
        }
        self.dialog = None;
        Ok(())
    }

    /// Capture the result, force actuators off, and open the save dialog
    pub fn confirm_stop(&mut self) -> RoastResult<Vec<Effect>> {
        if self.dialog != Some(ManualDialog::StopConfirm) {
            return Err(RoastError::transition("the stop dialog is not open"));
        }

        let stopped = StoppedRoast {
            duration: self.elapsed,
            drop_temperature: self.temperature,
            target_temperature: self.settings.target_temperature,
            log: self.log.clone(),
        };
        let mut fx = Effects::new();
        fx.publish(RoastEvent::ManualStopped {
            duration: stopped.duration,
            drop_temperature: stopped.drop_temperature,
        });
        fx.notify(Notification::info(
            "Roasting Stopped",
            format!(
                "Drop temperature {:.1}°C after {} seconds.",
                stopped.drop_temperature, stopped.duration
            ),
        ));

        self.stopped = Some(stopped);
        self.is_roasting = false;
        self.elapsed = 0;
        self.timer_notification_sent = false;
        self.heater = false;
        self.motor = false;
        self.interlock = SafetyInterlock::new(
            self.safety,
            self.settings.target_temperature,
            self.settings.max_safety_temp,
            self.settings.auto_shutoff_enabled,
        );
        self.dialog = Some(ManualDialog::SaveData);
        self.write_idle(&mut fx);
        Ok(fx.into_vec())
    }

    /// Build the profile document from the save form and the captured result.
    ///
    /// The stopped roast stays claimed until [`complete_save`] or
    /// [`save_failed`]; a second save or a discard is rejected meanwhile.
    ///
    /// [`complete_save`]: Self::complete_save
    /// [`save_failed`]: Self::save_failed
    pub fn prepare_save(&mut self, input: SaveRoastInput) -> RoastResult<RoastProfileInput> {
        let stopped = match (&self.stopped, self.dialog) {
            (Some(stopped), Some(ManualDialog::SaveData)) => stopped,
            (Some(_), Some(ManualDialog::Saving)) => {
                return Err(RoastError::transition("the roast is already being saved"))
            }
            _ => return Err(RoastError::transition("there is no stopped roast to save")),
        };
        let name = if input.name.trim().is_empty() {
            DEFAULT_PROFILE_NAME.to_string()
        } else {
            input.name
        };
        let profile = RoastProfileInput {
            name,
            description: input
                .description
                .unwrap_or_else(|| stopped.log.description.clone()),
            roast_level: input.roast_level.or(stopped.log.roast_level),
            duration: stopped.duration,
            target_temperature: stopped.target_temperature,
            drop_temperature: stopped.drop_temperature,
            roast_phase: input
                .roast_phase
                .unwrap_or_else(|| stopped.log.roast_phase.clone()),
        };
        validate_profile_input(&profile)?;
        self.dialog = Some(ManualDialog::Saving);
        Ok(profile)
    }

    pub fn complete_save(&mut self, name: &str) -> Vec<Effect> {
        let mut fx = Effects::new();
        self.clear_result();
        fx.notify(Notification::success(
            "Roast Saved",
            format!("\"{}\" was added to your roast profiles.", name),
        ));
        fx.into_vec()
    }

    /// The save dialog stays open so the operator can retry
    pub fn save_failed(&mut self, message: &str) -> Vec<Effect> {
        if self.dialog == Some(ManualDialog::Saving) {
            self.dialog = Some(ManualDialog::SaveData);
        }
        let mut fx = Effects::new();
        fx.notify(Notification::error("Failed to Save Roast", message));
        fx.into_vec()
    }

    pub fn discard(&mut self) -> RoastResult<Vec<Effect>> {
        if self.stopped.is_none() {
            return Err(RoastError::transition("there is no stopped roast to discard"));
        }
        if self.dialog == Some(ManualDialog::Saving) {
            return Err(RoastError::transition("the roast is already being saved"));
        }
        self.clear_result();
        let mut fx = Effects::new();
        fx.notify(Notification::info(
            "Roast Discarded",
            "The roast data was not saved.",
        ));
        Ok(fx.into_vec())
    }

    fn clear_result(&mut self) {
        self.stopped = None;
        self.dialog = None;
        self.settings = ManualRoastSettings::default();
        self.history.clear();
        self.log = RoastLog::default();
    }

    fn write_idle(&self, fx: &mut Effects) {
        fx.write(RealtimeField::Heater, false);
        fx.write(RealtimeField::Motor, false);
        fx.write(RealtimeField::Status, "idle");
        fx.write(RealtimeField::TargetTemp, 0.0);
        fx.write(RealtimeField::MaxSafetyTemp, 0.0);
        fx.publish(RoastEvent::SessionReset);
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CrackMark, RoastLevel};
    use crate::control::InterlockSignal;

    fn machine() -> ManualRoast {
        ManualRoast::new(RoastSettings::default(), SafetySettings::default())
    }

    fn roasting() -> ManualRoast {
        let mut roast = machine();
        roast.start(ManualRoastSettings::default()).unwrap();
        roast
    }

    fn titles(effects: &[Effect]) -> Vec<String> {
        effects
            .iter()
            .filter_map(|e| e.as_notification().map(|n| n.title.clone()))
            .collect()
    }

    fn heater_writes(effects: &[Effect]) -> Vec<bool> {
        effects
            .iter()
            .filter_map(|e| match e.as_write() {
                Some((RealtimeField::Heater, value)) => value.as_bool(),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_start_writes_targets_and_actuators() {
        let mut roast = machine();
        let effects = roast.start(ManualRoastSettings::default()).unwrap();
        assert!(roast.is_roasting());
        assert_eq!(heater_writes(&effects), vec![true]);
        assert!(effects.iter().any(|e| matches!(
            e.as_write(),
            Some((RealtimeField::MaxSafetyTemp, v)) if v.as_f64() == Some(220.0)
        )));
    }

    #[test]
    fn test_start_rejects_invalid_settings() {
        let mut roast = machine();
        let settings = ManualRoastSettings {
            max_safety_temp: 295.0,
            ..ManualRoastSettings::default()
        };
        assert!(matches!(
            roast.start(settings),
            Err(RoastError::Validation(_))
        ));
        assert!(!roast.is_roasting());
    }

    #[test]
    fn test_start_twice_is_rejected() {
        let mut roast = roasting();
        assert!(roast.start(ManualRoastSettings::default()).is_err());
    }

    #[test]
    fn test_auto_shutoff_hysteresis() {
        let mut roast = roasting();

        let effects = roast.on_temperature(210.0);
        assert_eq!(heater_writes(&effects), vec![false]);
        assert!(roast.snapshot().heater_control_disabled);
        assert_eq!(roast.set_heater(true).unwrap_err(), RoastError::HeaterLocked);

        for temp in [208.0, 204.0, 200.0] {
            let effects = roast.on_temperature(temp);
            assert!(effects.is_empty());
        }

        let effects = roast.on_temperature(199.0);
        assert_eq!(titles(&effects), vec!["Heater Control Restored"]);
        let snapshot = roast.snapshot();
        assert!(!snapshot.heater_control_disabled);
        assert!(!snapshot.is_nearing_safety_limit);
        assert!(roast.set_heater(true).is_ok());
    }

    #[test]
    fn test_repeated_reading_does_not_repeat_alerts() {
        let mut roast = roasting();
        let first = roast.on_temperature(180.0);
        assert_eq!(titles(&first), vec!["Target Temperature Reached"]);
        assert!(roast.on_temperature(180.0).is_empty());
    }

    #[test]
    fn test_heater_echo_while_locked_is_forced_off() {
        let mut roast = roasting();
        roast.on_temperature(212.0);
        let effects = roast.on_heater_echo(true);
        assert_eq!(heater_writes(&effects), vec![false]);
        assert!(!roast.snapshot().heater);
    }

    #[test]
    fn test_motor_is_never_restricted() {
        let mut roast = roasting();
        roast.on_temperature(305.0);
        assert_eq!(roast.set_motor(false).len(), 1);
        assert_eq!(roast.set_motor(true).len(), 1);
    }

    #[test]
    fn test_ceiling_alert_requires_dismissal() {
        let mut roast = roasting();
        let effects = roast.on_temperature(300.0);
        let ceiling = InterlockSignal::CeilingExceeded { temperature: 300.0 }.notification();
        assert!(effects
            .iter()
            .filter_map(|e| e.as_notification())
            .any(|n| n == &ceiling && !n.auto_dismiss));
    }

    #[test]
    fn test_heater_requires_running_roast() {
        let mut roast = machine();
        assert_eq!(roast.set_heater(true).unwrap_err(), RoastError::NotRoasting);
        assert!(roast.set_heater(false).is_ok());
    }

    #[test]
    fn test_timer_notifies_once() {
        let mut roast = machine();
        roast
            .start(ManualRoastSettings {
                timer_enabled: true,
                timer_duration: 1,
                ..ManualRoastSettings::default()
            })
            .unwrap();

        let mut fired = 0;
        for _ in 0..120 {
            fired += titles(&roast.on_tick()).len();
        }
        assert_eq!(fired, 1);
        assert!(roast.snapshot().timer_notification_sent);
    }

    #[test]
    fn test_history_window_and_stats() {
        let mut roast = roasting();
        for i in 0..40 {
            roast.on_tick();
            roast.on_temperature(100.0 + f64::from(i));
        }
        let snapshot = roast.snapshot();
        assert_eq!(snapshot.temp_history.len(), 30);
        let stats = snapshot.stats.unwrap();
        assert_eq!(stats.min, 110.0);
        assert_eq!(stats.max, 139.0);
        assert_eq!(stats.avg, 124.5);
    }

    #[test]
    fn test_stop_captures_result_and_opens_save_dialog() {
        let mut roast = roasting();
        for _ in 0..90 {
            roast.on_tick();
        }
        roast.on_temperature(205.0);
        roast
            .update_log(RoastLogPatch {
                roast_level: Some(RoastLevel::Medium),
                first_crack: Some(CrackMark {
                    time: Some(70),
                    temp: Some(196.0),
                    notes: "loud".to_string(),
                }),
                ..RoastLogPatch::default()
            })
            .unwrap();

        roast.request_stop().unwrap();
        assert_eq!(roast.dialog(), Some(ManualDialog::StopConfirm));
        let effects = roast.confirm_stop().unwrap();

        assert_eq!(heater_writes(&effects), vec![false]);
        assert!(!roast.is_roasting());
        assert_eq!(roast.dialog(), Some(ManualDialog::SaveData));
        let stopped = roast.snapshot().stopped.unwrap();
        assert_eq!(stopped.duration, 90);
        assert_eq!(stopped.drop_temperature, 205.0);

        let profile = roast
            .prepare_save(SaveRoastInput {
                name: "Sidamo".to_string(),
                ..SaveRoastInput::default()
            })
            .unwrap();
        assert_eq!(profile.duration, 90);
        assert_eq!(profile.drop_temperature, 205.0);
        assert_eq!(profile.roast_level, Some(RoastLevel::Medium));
        assert_eq!(profile.roast_phase.first_crack.time, Some(70));
    }

    #[test]
    fn test_cancel_stop_keeps_roasting() {
        let mut roast = roasting();
        roast.request_stop().unwrap();
        roast.cancel_stop().unwrap();
        assert!(roast.is_roasting());
        assert_eq!(roast.dialog(), None);
    }

    #[test]
    fn test_save_failure_keeps_dialog_open() {
        let mut roast = roasting();
        roast.request_stop().unwrap();
        roast.confirm_stop().unwrap();
        roast.prepare_save(SaveRoastInput::default()).unwrap();

        let effects = roast.save_failed("store unavailable");
        assert_eq!(titles(&effects), vec!["Failed to Save Roast"]);
        assert_eq!(roast.dialog(), Some(ManualDialog::SaveData));

        roast.complete_save("Sidamo");
        assert_eq!(roast.dialog(), None);
        assert!(!roast.is_active());
    }

    #[test]
    fn test_blank_name_falls_back_to_default() {
        let mut roast = roasting();
        roast.request_stop().unwrap();
        roast.confirm_stop().unwrap();
        let profile = roast.prepare_save(SaveRoastInput::default()).unwrap();
        assert_eq!(profile.name, DEFAULT_PROFILE_NAME);
    }

    #[test]
    fn test_discard_clears_without_saving() {
        let mut roast = roasting();
        roast.request_stop().unwrap();
        roast.confirm_stop().unwrap();
        roast.discard().unwrap();
        assert!(!roast.is_active());
        assert!(roast.snapshot().temp_history.is_empty());
        assert!(roast.discard().is_err());
    }

    #[test]
    fn test_save_in_progress_blocks_second_save_and_discard() {
        let mut roast = roasting();
        roast.request_stop().unwrap();
        roast.confirm_stop().unwrap();

        roast.prepare_save(SaveRoastInput::default()).unwrap();
        assert_eq!(roast.dialog(), Some(ManualDialog::Saving));
        assert!(matches!(
            roast.prepare_save(SaveRoastInput::default()),
            Err(RoastError::InvalidTransition(_))
        ));
        assert!(roast.discard().is_err());
        assert!(roast.is_active());

        roast.save_failed("store unavailable");
        assert!(roast.prepare_save(SaveRoastInput::default()).is_ok());
    }

    #[test]
    fn test_invalid_save_input_does_not_claim_roast() {
        let mut roast = roasting();
        roast.on_temperature(320.0);
        roast.request_stop().unwrap();
        roast.confirm_stop().unwrap();

        let result = roast.prepare_save(SaveRoastInput::default());
        assert!(matches!(result, Err(RoastError::Validation(_))));
        assert_eq!(roast.dialog(), Some(ManualDialog::SaveData));
    }
}
