//! Orders candidate facilities by distance from a reference coordinate.

use std::cmp::Ordering;

use crate::geo::distance_km;
use crate::model::{Coordinate, Facility, RankedFacility};

/// Rank facilities by ascending distance from `reference`.
///
/// Facilities whose distance is unknown keep their input order and sort after
/// every facility with a known distance. Without a reference the input order
/// is returned untouched.
#[must_use]
pub fn rank(facilities: Vec<Facility>, reference: Option<&Coordinate>) -> Vec<RankedFacility> {
    let reference = reference.filter(|coordinate| coordinate.is_valid());

    let mut ranked: Vec<RankedFacility> = facilities
        .into_iter()
        .map(|facility| {
            let distance_km = reference.and_then(|origin| {
                facility
                    .coordinate
                    .filter(Coordinate::is_valid)
                    .map(|position| distance_km(origin, &position))
            });
            RankedFacility {
                facility,
                distance_km,
            }
        })
        .collect();

    if reference.is_some() {
        // sort_by is stable, so ties and unknown distances keep input order
        ranked.sort_by(|left, right| compare_distance(left.distance_km, right.distance_km));
    }
    ranked
}

fn compare_distance(left: Option<f64>, right: Option<f64>) -> Ordering {
    match (left, right) {
        (Some(left), Some(right)) => left.total_cmp(&right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FacilityId;

    fn facility(id: &str, coordinate: Option<Coordinate>) -> Facility {
        Facility {
            id: FacilityId(id.to_owned()),
            name: format!("Bank Sampah {id}"),
            coordinate,
            contact_phone: None,
            address: None,
        }
    }

    fn ids(ranked: &[RankedFacility]) -> Vec<&str> {
        ranked.iter().map(|entry| entry.facility.id.0.as_str()).collect()
    }

    #[test]
    fn sorts_nearest_first_with_unknown_last() {
        let home = Coordinate::new(-6.2, 106.8);
        let facilities = vec![
            facility("far", Some(Coordinate::new(-6.9, 107.6))),
            facility("unknown-a", None),
            facility("near", Some(Coordinate::new(-6.21, 106.81))),
            facility("unknown-b", None),
            facility("middle", Some(Coordinate::new(-6.4, 106.8))),
        ];

        let ranked = rank(facilities, Some(&home));

        assert_eq!(ids(&ranked), ["near", "middle", "far", "unknown-a", "unknown-b"]);
        assert!(ranked.iter().take(3).all(|entry| entry.distance_km.is_some()), "known distances");
        assert!(ranked.iter().skip(3).all(|entry| entry.distance_km.is_none()), "unknown distances");
    }

    #[test]
    fn no_reference_keeps_input_order() {
        let facilities = vec![
            facility("b", Some(Coordinate::new(1.0, 1.0))),
            facility("a", Some(Coordinate::new(0.0, 0.0))),
        ];

        let ranked = rank(facilities, None);

        assert_eq!(ids(&ranked), ["b", "a"]);
        assert!(ranked.iter().all(|entry| entry.distance_km.is_none()), "no distances without reference");
    }

    #[test]
    fn invalid_facility_coordinate_counts_as_unknown() {
        let home = Coordinate::new(0.0, 0.0);
        let facilities = vec![
            facility("broken", Some(Coordinate::new(f64::NAN, 0.0))),
            facility("ok", Some(Coordinate::new(0.1, 0.1))),
        ];

        let ranked = rank(facilities, Some(&home));

        assert_eq!(ids(&ranked), ["ok", "broken"]);
    }
}
