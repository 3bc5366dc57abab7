//! Manual roast controller

use roast_core::control::{ManualRoast, RoastSettings, SafetySettings};
use roast_core::{
    ManualRoastSettings, ManualSnapshot, RoastLogPatch, RoastProfile, SaveRoastInput,
};
use tokio::sync::watch;

use super::profiles::ProfileService;
use super::session::{SessionController, SessionDeps};
use crate::error::AppResult;

/// Handle to the manual roast session
#[derive(Clone)]
pub struct ManualRoastController {
    session: SessionController<ManualRoast>,
}

impl ManualRoastController {
    pub fn spawn(settings: RoastSettings, safety: SafetySettings, deps: &SessionDeps) -> Self {
        Self {
            session: SessionController::spawn(ManualRoast::new(settings, safety), deps),
        }
    }

    pub fn snapshot(&self) -> ManualSnapshot {
        self.session.snapshot()
    }

    pub fn watch(&self) -> watch::Receiver<ManualSnapshot> {
        self.session.watch()
    }

    pub async fn start(&self, settings: ManualRoastSettings) -> AppResult<ManualSnapshot> {
        self.session
            .apply(move |roast, _| roast.start(settings))
            .await?;
        Ok(self.snapshot())
    }

    pub async fn set_heater(&self, on: bool) -> AppResult<ManualSnapshot> {
        self.session
            .apply(move |roast, _| roast.set_heater(on))
            .await?;
        Ok(self.snapshot())
    }

    pub async fn set_motor(&self, on: bool) -> AppResult<ManualSnapshot> {
        self.session
            .apply(move |roast, _| Ok(roast.set_motor(on)))
            .await?;
        Ok(self.snapshot())
    }

    pub async fn update_log(&self, patch: RoastLogPatch) -> AppResult<ManualSnapshot> {
        self.session
            .apply(move |roast, _| roast.update_log(patch).map(|_| Vec::new()))
            .await?;
        Ok(self.snapshot())
    }

    pub async fn request_stop(&self) -> AppResult<ManualSnapshot> {
        self.session
            .apply(|roast, _| roast.request_stop().map(|_| Vec::new()))
            .await?;
        Ok(self.snapshot())
    }

    pub async fn cancel_stop(&self) -> AppResult<ManualSnapshot> {
        self.session
            .apply(|roast, _| roast.cancel_stop().map(|_| Vec::new()))
            .await?;
        Ok(self.snapshot())
    }

    pub async fn confirm_stop(&self) -> AppResult<ManualSnapshot> {
        self.session.apply(|roast, _| roast.confirm_stop()).await?;
        Ok(self.snapshot())
    }

    /// Persist the stopped roast as a profile.
    ///
    /// On a store failure the save dialog stays open and the error is
    /// returned to the caller.
    pub async fn save(
        &self,
        input: SaveRoastInput,
        profiles: &ProfileService,
    ) -> AppResult<RoastProfile> {
        let profile_input = self
            .session
            .execute(move |roast, _| roast.prepare_save(input).map(|p| (Vec::new(), p)))
            .await?;

        let name = profile_input.name.clone();
        match profiles.create(profile_input).await {
            Ok(profile) => {
                self.session
                    .apply(move |roast, _| Ok(roast.complete_save(&name)))
                    .await?;
                Ok(profile)
            }
            Err(error) => {
                tracing::warn!(error = %error, "failed to save manual roast");
                let message = error.to_string();
                self.session
                    .apply(move |roast, _| Ok(roast.save_failed(&message)))
                    .await?;
                Err(error)
            }
        }
    }

    pub async fn discard(&self) -> AppResult<ManualSnapshot> {
        self.session.apply(|roast, _| roast.discard()).await?;
        Ok(self.snapshot())
    }
}
