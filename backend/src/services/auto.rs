//! Automatic roast controller

use roast_core::control::{AutoRoast, RoastSettings, SafetySettings};
use roast_core::{RoastPlan, RoastSnapshot};
use tokio::sync::watch;

use super::session::{SessionController, SessionDeps};
use crate::error::AppResult;

/// Handle to the automatic roast session
#[derive(Clone)]
pub struct AutoRoastController {
    session: SessionController<AutoRoast>,
}

impl AutoRoastController {
    pub fn spawn(settings: RoastSettings, safety: SafetySettings, deps: &SessionDeps) -> Self {
        Self {
            session: SessionController::spawn(AutoRoast::new(settings, safety), deps),
        }
    }

    pub fn snapshot(&self) -> RoastSnapshot {
        self.session.snapshot()
    }

    pub fn watch(&self) -> watch::Receiver<RoastSnapshot> {
        self.session.watch()
    }

    pub async fn request_start(&self) -> AppResult<RoastSnapshot> {
        self.session.apply(|roast, _| roast.request_start()).await?;
        Ok(self.snapshot())
    }

    pub async fn confirm_pre_heat(&self, target: f64) -> AppResult<RoastSnapshot> {
        self.session
            .apply(move |roast, _| roast.confirm_pre_heat(target))
            .await?;
        Ok(self.snapshot())
    }

    pub async fn confirm_beans_inserted(&self) -> AppResult<RoastSnapshot> {
        self.session
            .apply(|roast, now| roast.confirm_beans_inserted(now))
            .await?;
        Ok(self.snapshot())
    }

    pub async fn acknowledge_turning_point(&self) -> AppResult<RoastSnapshot> {
        self.session
            .apply(|roast, _| roast.acknowledge_turning_point())
            .await?;
        Ok(self.snapshot())
    }

    pub async fn submit_plan(&self, plan: RoastPlan) -> AppResult<RoastSnapshot> {
        self.session
            .apply(move |roast, _| roast.submit_plan(plan))
            .await?;
        Ok(self.snapshot())
    }

    pub async fn request_finish(&self) -> AppResult<RoastSnapshot> {
        self.session.apply(|roast, _| roast.request_finish()).await?;
        Ok(self.snapshot())
    }

    pub async fn confirm_finish(&self) -> AppResult<RoastSnapshot> {
        self.session.apply(|roast, _| roast.confirm_finish()).await?;
        Ok(self.snapshot())
    }

    pub async fn cancel_modal(&self) -> AppResult<RoastSnapshot> {
        self.session.apply(|roast, _| roast.cancel_modal()).await?;
        Ok(self.snapshot())
    }

    pub async fn stop(&self) -> AppResult<RoastSnapshot> {
        self.session.apply(|roast, _| roast.stop()).await?;
        Ok(self.snapshot())
    }

    pub async fn set_heater(&self, on: bool) -> AppResult<RoastSnapshot> {
        self.session
            .apply(move |roast, _| roast.set_heater(on))
            .await?;
        Ok(self.snapshot())
    }

    pub async fn set_motor(&self, on: bool) -> AppResult<RoastSnapshot> {
        self.session
            .apply(move |roast, _| Ok(roast.set_motor(on)))
            .await?;
        Ok(self.snapshot())
    }

    pub async fn set_pid_control(&self, on: bool) -> AppResult<RoastSnapshot> {
        self.session
            .apply(move |roast, _| Ok(roast.set_pid_control(on)))
            .await?;
        Ok(self.snapshot())
    }
}
