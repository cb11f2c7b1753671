//! Tagged facility retrieval: only the answer to the most recently started
//! request is applied, whatever order the answers arrive in.

use crate::model::{Coordinate, Facility, RankedFacility};
use crate::ports::PortError;
use crate::ranking::rank;

#[derive(Debug, Clone, Copy, PartialEq)]
/// Tag attached to one facility retrieval.
pub struct FacilityTicket {
    /// Monotonically increasing request number.
    pub token: u64,
    /// Reference coordinate the retrieval was started for.
    pub reference: Option<Coordinate>,
}

#[derive(Debug)]
/// Answer of a facility retrieval, still carrying its ticket.
pub struct FacilityResponse {
    /// Ticket the retrieval was started with.
    pub ticket: FacilityTicket,
    /// Directory result.
    pub result: Result<Vec<Facility>, PortError>,
}

#[derive(Debug)]
/// What to do with an arriving [`FacilityResponse`].
pub enum FeedOutcome {
    /// A newer retrieval was started since; drop the answer.
    Stale,
    /// Current answer, ranked against the ticket's reference.
    Ranked(Vec<RankedFacility>),
    /// Current answer, but the directory failed.
    Unavailable(PortError),
}

/// Issues tickets and filters out superseded answers.
#[derive(Debug, Default)]
pub struct FacilityFeed {
    latest: u64,
    reference: Option<Coordinate>,
}

impl FacilityFeed {
    /// Feed with no retrieval started.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a retrieval for a new reference coordinate, superseding any
    /// retrieval still in flight.
    pub fn begin(&mut self, reference: Option<Coordinate>) -> FacilityTicket {
        self.latest = self.latest.saturating_add(1);
        self.reference = reference;
        tracing::debug!(token = self.latest, reference = ?reference, "facility retrieval started");
        FacilityTicket {
            token: self.latest,
            reference,
        }
    }

    /// Reference coordinate of the most recent retrieval.
    #[must_use]
    pub fn reference(&self) -> Option<Coordinate> {
        self.reference
    }

    /// Whether `ticket` belongs to the most recent retrieval.
    #[must_use]
    pub fn is_current(&self, ticket: &FacilityTicket) -> bool {
        ticket.token == self.latest
    }

    /// Decide what an arriving answer means for the facility list.
    #[must_use]
    pub fn resolve(&self, response: FacilityResponse) -> FeedOutcome {
        if !self.is_current(&response.ticket) {
            tracing::debug!(
                token = response.ticket.token,
                latest = self.latest,
                "discarding superseded facility list"
            );
            return FeedOutcome::Stale;
        }
        match response.result {
            Ok(facilities) => {
                FeedOutcome::Ranked(rank(facilities, response.ticket.reference.as_ref()))
            }
            Err(err) => FeedOutcome::Unavailable(err),
        }
    }
}
