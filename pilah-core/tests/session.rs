//! Session behaviour against in-memory collaborators.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, TimeZone};
use pilah_core::{
    CategoryId, Collaborators, Coordinate, DeliveryBranch, Facility, FacilityCriteria,
    FacilityId, FacilityPort, GeocodePort, LocationPort, PickupRequest, PilahConfig, PortError,
    RequestStore, SchedulingError, SchedulingService, SchedulingSession, StoredRequestId,
    TimeSlotId, WizardController,
};

const HOME: Coordinate = Coordinate::new(-6.2, 106.8);

enum LocationBehaviour {
    At(Coordinate),
    Denied,
    Hang,
}

struct FakeLocation(LocationBehaviour);

#[async_trait]
impl LocationPort for FakeLocation {
    async fn current_coordinate(&self) -> Result<Coordinate, PortError> {
        match self.0 {
            LocationBehaviour::At(coordinate) => Ok(coordinate),
            LocationBehaviour::Denied => Err(PortError::PermissionDenied),
            LocationBehaviour::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Err(PortError::Internal("should have timed out".to_owned()))
            }
        }
    }
}

struct FakeGeocoder {
    fail: bool,
}

#[async_trait]
impl GeocodePort for FakeGeocoder {
    async fn reverse_geocode(&self, _at: &Coordinate) -> Result<String, PortError> {
        if self.fail {
            Err(PortError::Internal("geocoder offline".to_owned()))
        } else {
            Ok("Jl. Kenanga No. 12, Jakarta".to_owned())
        }
    }
}

struct FakeDirectory {
    facilities: Vec<Facility>,
    fail: bool,
    seen: Mutex<Vec<FacilityCriteria>>,
}

#[async_trait]
impl FacilityPort for FakeDirectory {
    async fn list_facilities(&self, criteria: &FacilityCriteria) -> Result<Vec<Facility>, PortError> {
        self.seen.lock().unwrap().push(*criteria);
        if self.fail {
            Err(PortError::Rejected {
                status: 503,
                message: "maintenance".to_owned(),
            })
        } else {
            Ok(self.facilities.clone())
        }
    }
}

struct FlakyStore {
    failures_left: AtomicUsize,
    stored: Mutex<Vec<PickupRequest>>,
}

#[async_trait]
impl RequestStore for FlakyStore {
    async fn persist(&self, request: &PickupRequest) -> Result<StoredRequestId, PortError> {
        let remaining = self.failures_left.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_left.store(remaining - 1, Ordering::SeqCst);
            return Err(PortError::Timeout);
        }
        let mut stored = self.stored.lock().unwrap();
        stored.push(request.clone());
        Ok(StoredRequestId(format!("req-{}", stored.len())))
    }
}

struct Harness {
    directory: Arc<FakeDirectory>,
    store: Arc<FlakyStore>,
    session: SchedulingSession,
}

fn facility(id: &str, coordinate: Option<Coordinate>) -> Facility {
    Facility {
        id: FacilityId(id.to_owned()),
        name: format!("Bank Sampah {id}"),
        coordinate,
        contact_phone: Some("021-555-0101".to_owned()),
        address: None,
    }
}

fn directory_listing() -> Vec<Facility> {
    vec![
        facility("far", Some(Coordinate::new(-6.9, 107.6))),
        facility("unknown", None),
        facility("near", Some(Coordinate::new(-6.21, 106.81))),
    ]
}

fn fixed_clock() -> DateTime<Local> {
    Local.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).single().unwrap()
}

fn harness(location: LocationBehaviour, directory_fails: bool, store_failures: usize, geocoder_fails: bool) -> Harness {
    let directory = Arc::new(FakeDirectory {
        facilities: directory_listing(),
        fail: directory_fails,
        seen: Mutex::new(Vec::new()),
    });
    let store = Arc::new(FlakyStore {
        failures_left: AtomicUsize::new(store_failures),
        stored: Mutex::new(Vec::new()),
    });
    let collaborators = Arc::new(Collaborators {
        location: Arc::new(FakeLocation(location)),
        geocoder: Arc::new(FakeGeocoder {
            fail: geocoder_fails,
        }),
        facilities: Arc::clone(&directory) as Arc<dyn FacilityPort>,
        store: Arc::clone(&store) as Arc<dyn RequestStore>,
    });
    let config = PilahConfig {
        geolocation_timeout: Duration::from_millis(50),
        facility_limit: 25,
        ..PilahConfig::default()
    };
    let service = Arc::new(SchedulingService::new(collaborators, &config));
    let session = SchedulingSession::new(service, WizardController::default().with_clock(fixed_clock));
    Harness {
        directory,
        store,
        session,
    }
}

fn ranked_ids(session: &SchedulingSession) -> Vec<String> {
    session
        .wizard()
        .unwrap()
        .facilities()
        .iter()
        .map(|ranked| ranked.facility.id.0.clone())
        .collect()
}

fn fill_self_delivery(session: &mut SchedulingSession) {
    session.choose_branch(DeliveryBranch::SelfDelivery).unwrap();
    session.advance().unwrap();
    session
        .wizard_mut()
        .unwrap()
        .set_facility(Some(FacilityId("near".to_owned())));
    session.advance().unwrap();
    let wizard = session.wizard_mut().unwrap();
    wizard.set_scheduled_date(NaiveDate::from_ymd_opt(2025, 3, 11));
    wizard.set_time_slot(Some(TimeSlotId("slot-1300".to_owned())));
    session.advance().unwrap();
    session.set_quantity(&CategoryId::new("paper-koran"), 2).unwrap();
}

#[tokio::test]
async fn located_device_ranks_nearest_first() {
    let mut harness = harness(LocationBehaviour::At(HOME), false, 0, false);

    harness.session.start_locating();
    assert!(harness.session.location_pending(), "watch started");
    let ticket = harness.session.finish_locating().await;
    assert_eq!(ticket.reference, Some(HOME));

    let response = harness.session.service().fetch_facilities(ticket).await;
    assert!(harness.session.apply_facilities(response).unwrap(), "current answer applied");

    assert_eq!(ranked_ids(&harness.session), ["near", "far", "unknown"]);
    let criteria = harness.directory.seen.lock().unwrap().clone();
    assert_eq!(criteria, [FacilityCriteria::new(Some(HOME), 25)]);
}

#[tokio::test]
async fn geolocation_timeout_keeps_input_order() {
    let mut harness = harness(LocationBehaviour::Hang, false, 0, false);

    let err = harness.session.service().locate().await.unwrap_err();
    assert!(matches!(err, SchedulingError::LocationUnavailable(PortError::Timeout)), "{err:?}");

    harness.session.start_locating();
    let ticket = harness.session.finish_locating().await;
    assert_eq!(ticket.reference, None);

    let response = harness.session.service().fetch_facilities(ticket).await;
    harness.session.apply_facilities(response).unwrap();

    assert_eq!(ranked_ids(&harness.session), ["far", "unknown", "near"]);
    assert!(
        harness
            .session
            .wizard()
            .unwrap()
            .facilities()
            .iter()
            .all(|ranked| ranked.distance_km.is_none()),
        "no distances without a reference"
    );
}

#[tokio::test]
async fn permission_denied_is_location_unavailable() {
    let harness = harness(LocationBehaviour::Denied, false, 0, false);

    let err = harness.session.service().locate().await.unwrap_err();

    assert!(
        matches!(err, SchedulingError::LocationUnavailable(PortError::PermissionDenied)),
        "{err:?}"
    );
    assert!(err.is_retryable(), "location can be retried");
}

#[tokio::test]
async fn superseded_facility_answer_is_discarded() {
    let mut harness = harness(LocationBehaviour::Denied, false, 0, false);

    let stale_ticket = harness.session.set_reference(None);
    let fresh_ticket = harness.session.set_reference(Some(HOME));
    let fresh = harness.session.service().fetch_facilities(fresh_ticket).await;
    let stale = harness.session.service().fetch_facilities(stale_ticket).await;

    assert!(harness.session.apply_facilities(fresh).unwrap(), "fresh answer applied");
    assert!(!harness.session.apply_facilities(stale).unwrap(), "stale answer dropped");

    assert_eq!(ranked_ids(&harness.session), ["near", "far", "unknown"]);
    assert_eq!(harness.session.reference(), Some(HOME));
}

#[tokio::test]
async fn directory_failure_blocks_facility_gate() {
    let mut harness = harness(LocationBehaviour::Denied, true, 0, false);

    let err = harness.session.refresh_facilities(Some(HOME)).await.unwrap_err();
    assert!(matches!(err, SchedulingError::FacilityListUnavailable(_)), "{err:?}");
    assert!(ranked_ids(&harness.session).is_empty(), "candidate list is empty");

    harness.session.choose_branch(DeliveryBranch::SelfDelivery).unwrap();
    harness.session.advance().unwrap();
    let err = harness.session.advance().unwrap_err();
    assert!(matches!(err, SchedulingError::Validation(_)), "{err:?}");
    assert_eq!(harness.session.state().unwrap().current_step, 2);
}

#[tokio::test]
async fn persistence_failure_keeps_state_for_retry() {
    let mut harness = harness(LocationBehaviour::Denied, false, 1, false);
    harness.session.refresh_facilities(Some(HOME)).await.unwrap();
    fill_self_delivery(&mut harness.session);
    let before = harness.session.state().unwrap().clone();

    let err = harness.session.submit().await.unwrap_err();
    assert!(matches!(err, SchedulingError::Persistence(PortError::Timeout)), "{err:?}");
    assert!(err.is_retryable(), "persistence can be retried");
    assert!(harness.session.is_open(), "session survives");
    assert_eq!(harness.session.state().unwrap(), &before);

    let receipt = harness.session.submit().await.unwrap();
    assert_eq!(receipt.stored_id, StoredRequestId("req-1".to_owned()));
    assert_eq!(receipt.request.pickup_address, None);
    assert_eq!(receipt.request.facility_name, "Bank Sampah near");
    assert_eq!(harness.store.stored.lock().unwrap().len(), 1);

    assert!(!harness.session.is_open(), "session closed after submission");
    assert!(matches!(harness.session.advance(), Err(SchedulingError::SessionClosed)), "closed");
}

#[tokio::test]
async fn address_suggestion_is_best_effort() {
    let mut working = harness(LocationBehaviour::Denied, false, 0, false);
    assert_eq!(working.session.suggest_address().await, "", "no reference yet");
    working.session.set_reference(Some(HOME));
    assert_eq!(working.session.suggest_address().await, "Jl. Kenanga No. 12, Jakarta");

    let mut broken = harness(LocationBehaviour::Denied, false, 0, true);
    broken.session.set_reference(Some(HOME));
    assert_eq!(broken.session.suggest_address().await, "");
}

#[tokio::test]
async fn abandoning_releases_the_location_watch() {
    let mut harness = harness(LocationBehaviour::Hang, false, 0, false);
    harness.session.start_locating();
    assert!(!harness.session.location_ready(), "still waiting");

    harness.session.abandon();

    assert!(!harness.session.location_pending(), "watch released");
    assert!(!harness.session.is_open(), "session closed");
    assert!(harness.directory.seen.lock().unwrap().is_empty(), "nothing fetched");
}

#[tokio::test]
async fn finished_watch_is_held_until_collected() {
    let mut harness = harness(LocationBehaviour::At(HOME), false, 0, false);
    harness.session.start_locating();

    while !harness.session.location_ready() {
        tokio::task::yield_now().await;
    }
    assert!(harness.session.location_pending(), "finished watch is still held");

    let ticket = harness.session.finish_locating().await;
    assert_eq!(ticket.reference, Some(HOME));
    assert!(!harness.session.location_pending(), "collected watch is released");
    assert!(!harness.session.location_ready(), "nothing left to collect");
}

#[tokio::test]
async fn facility_answer_after_submission_is_refused() {
    let mut harness = harness(LocationBehaviour::Denied, false, 0, false);
    harness.session.refresh_facilities(Some(HOME)).await.unwrap();
    fill_self_delivery(&mut harness.session);
    let late_ticket = harness.session.set_reference(Some(HOME));
    let late = harness.session.service().fetch_facilities(late_ticket).await;

    harness.session.submit().await.unwrap();

    let err = harness.session.apply_facilities(late).unwrap_err();
    assert!(matches!(err, SchedulingError::SessionClosed), "{err:?}");
    assert_eq!(harness.session.reference(), Some(HOME));
}
