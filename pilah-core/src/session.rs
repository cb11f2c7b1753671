//! One scheduling session: the wizard, the facility feed, and the pending
//! location watch, owned together and discarded together.

use std::sync::Arc;

use crate::error::SchedulingError;
use crate::feed::{FacilityFeed, FacilityResponse, FacilityTicket, FeedOutcome};
use crate::model::{CategoryId, Coordinate, DeliveryBranch, PickupRequest, StoredRequestId};
use crate::service::{LocationWatch, SchedulingService};
use crate::wizard::{WizardController, WizardState};

#[derive(Debug, Clone, PartialEq)]
/// Result of a successful submission.
pub struct SubmissionReceipt {
    /// Identifier assigned by the request store.
    pub stored_id: StoredRequestId,
    /// The request as stored.
    pub request: PickupRequest,
}

/// Single-owner aggregate for one user's scheduling flow.
pub struct SchedulingSession {
    service: Arc<SchedulingService>,
    wizard: Option<WizardController>,
    feed: FacilityFeed,
    location: Option<LocationWatch>,
}

impl SchedulingSession {
    /// Open a session around a fresh wizard.
    #[must_use]
    pub fn new(service: Arc<SchedulingService>, wizard: WizardController) -> Self {
        Self {
            service,
            wizard: Some(wizard),
            feed: FacilityFeed::new(),
            location: None,
        }
    }

    /// Service the session talks to.
    #[must_use]
    pub fn service(&self) -> &Arc<SchedulingService> {
        &self.service
    }

    /// False after a successful submission or abandonment.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.wizard.is_some()
    }

    /// The wizard, for rendering.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError::SessionClosed`] once the session ended.
    pub fn wizard(&self) -> Result<&WizardController, SchedulingError> {
        self.wizard.as_ref().ok_or(SchedulingError::SessionClosed)
    }

    /// The wizard, for field edits.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError::SessionClosed`] once the session ended.
    pub fn wizard_mut(&mut self) -> Result<&mut WizardController, SchedulingError> {
        self.wizard.as_mut().ok_or(SchedulingError::SessionClosed)
    }

    /// Read-only wizard state.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError::SessionClosed`] once the session ended.
    pub fn state(&self) -> Result<&WizardState, SchedulingError> {
        self.wizard().map(WizardController::state)
    }

    /// Reference coordinate facilities are currently ranked against.
    #[must_use]
    pub fn reference(&self) -> Option<Coordinate> {
        self.feed.reference()
    }

    /// See [`WizardController::choose_branch`].
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError::BranchLocked`] off step 1.
    pub fn choose_branch(&mut self, branch: DeliveryBranch) -> Result<(), SchedulingError> {
        self.wizard_mut()?.choose_branch(branch)
    }

    /// See [`WizardController::set_quantity`].
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError::UnknownCategory`] for ids outside the catalog.
    pub fn set_quantity(&mut self, category: &CategoryId, delta: i32) -> Result<u8, SchedulingError> {
        self.wizard_mut()?.set_quantity(category, delta)
    }

    /// See [`WizardController::toggle_category`].
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError::UnknownCategory`] for ids outside the catalog.
    pub fn toggle_category(&mut self, category: &CategoryId, selected: bool) -> Result<(), SchedulingError> {
        self.wizard_mut()?.toggle_category(category, selected)
    }

    /// See [`WizardController::advance`].
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError::Validation`] when the gate fails.
    pub fn advance(&mut self) -> Result<usize, SchedulingError> {
        Ok(self.wizard_mut()?.advance()?)
    }

    /// See [`WizardController::retreat`].
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError::SessionClosed`] once the session ended.
    pub fn retreat(&mut self) -> Result<usize, SchedulingError> {
        Ok(self.wizard_mut()?.retreat())
    }

    /// Start acquiring the device location; replaces any pending watch.
    pub fn start_locating(&mut self) {
        self.location = Some(self.service.watch_location());
    }

    /// Whether a location acquisition is pending and has finished.
    #[must_use]
    pub fn location_ready(&self) -> bool {
        self.location.as_ref().is_some_and(LocationWatch::is_finished)
    }

    /// Whether the session still holds a location watch. This stays true
    /// after the acquisition finished, until [`Self::finish_locating`]
    /// collects the result or the session closes.
    #[must_use]
    pub fn location_pending(&self) -> bool {
        self.location.is_some()
    }

    /// Wait for the pending location and start a facility retrieval for it.
    /// Without a position the retrieval runs unranked.
    pub async fn finish_locating(&mut self) -> FacilityTicket {
        let reference = match self.location.take() {
            Some(watch) => watch.wait().await.ok(),
            None => None,
        };
        self.set_reference(reference)
    }

    /// Start a facility retrieval for a new reference coordinate. Answers to
    /// earlier tickets will be discarded.
    pub fn set_reference(&mut self, reference: Option<Coordinate>) -> FacilityTicket {
        self.feed.begin(reference)
    }

    /// Apply an arriving facility list. Returns whether the list was applied.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError::FacilityListUnavailable`] when the current
    /// retrieval failed; the candidate list is then empty.
    /// Returns [`SchedulingError::SessionClosed`] once the session ended.
    pub fn apply_facilities(&mut self, response: FacilityResponse) -> Result<bool, SchedulingError> {
        if !self.is_open() {
            return Err(SchedulingError::SessionClosed);
        }
        let outcome = self.feed.resolve(response);
        let wizard = self.wizard_mut()?;
        match outcome {
            FeedOutcome::Stale => Ok(false),
            FeedOutcome::Ranked(ranked) => {
                wizard.set_facilities(ranked);
                Ok(true)
            }
            FeedOutcome::Unavailable(err) => {
                wizard.set_facilities(Vec::new());
                Err(SchedulingError::FacilityListUnavailable(err))
            }
        }
    }

    /// Start, await, and apply a facility retrieval in one go.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError::FacilityListUnavailable`] when the directory
    /// fails.
    pub async fn refresh_facilities(&mut self, reference: Option<Coordinate>) -> Result<bool, SchedulingError> {
        let ticket = self.set_reference(reference);
        let response = self.service.fetch_facilities(ticket).await;
        self.apply_facilities(response)
    }

    /// Best-effort address for the current reference coordinate; empty when
    /// there is none or geocoding fails.
    pub async fn suggest_address(&self) -> String {
        match self.feed.reference() {
            Some(at) => self.service.suggest_address(at).await,
            None => String::new(),
        }
    }

    /// Validate, assemble, and persist the request.
    ///
    /// On success the session closes. On a persistence failure the wizard is
    /// kept intact so the user can retry without re-entering anything.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError::Validation`],
    /// [`SchedulingError::NotAtTerminalStep`], or
    /// [`SchedulingError::Persistence`].
    pub async fn submit(&mut self) -> Result<SubmissionReceipt, SchedulingError> {
        let request = self.wizard_mut()?.submit()?;
        let stored_id = self.service.persist(&request).await?;
        self.close();
        Ok(SubmissionReceipt { stored_id, request })
    }

    /// Abandon the session, releasing any pending location watch.
    pub fn abandon(&mut self) {
        if self.is_open() {
            tracing::info!("scheduling session abandoned");
        }
        self.close();
    }

    fn close(&mut self) {
        self.wizard = None;
        if let Some(watch) = self.location.take() {
            watch.cancel();
        }
    }
}
