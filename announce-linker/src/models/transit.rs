//! Upstream transit API records
//!
//! Wire shapes of the TfL Unified API responses the importer reads. Only the
//! fields the entity store needs are declared; everything else in the
//! payload is ignored. A record missing a declared required field fails
//! conversion as a whole.

use crate::error::{LinkerError, LinkerResult};
use announce_common::db::{BusRoute, BusRouteSection, BusStop};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// `additionalProperties` key carrying a stop's compass bearing
pub const COMPASS_POINT_KEY: &str = "CompassPoint";

/// Deserialize one upstream record, reporting it verbatim on failure
pub fn parse_record<T: DeserializeOwned>(kind: &'static str, record: &Value) -> LinkerResult<T> {
    T::deserialize(record).map_err(|e| LinkerError::malformed(kind, record, e.to_string()))
}

/// One page of `StopPoint/Mode/bus`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopPointPage {
    pub stop_points: Vec<Value>,
    pub total: u64,
}

/// A stop point
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopPoint {
    pub naptan_id: String,
    pub indicator: Option<String>,
    pub stop_letter: Option<String>,
    pub stop_type: Option<String>,
    pub common_name: String,
    pub place_type: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub additional_properties: Vec<AdditionalProperty>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdditionalProperty {
    pub key: String,
    #[serde(default)]
    pub value: Option<String>,
}

impl StopPoint {
    /// Compass bearing from the first `CompassPoint` property
    pub fn compass_point(&self) -> Option<&str> {
        self.additional_properties
            .iter()
            .find(|p| p.key == COMPASS_POINT_KEY)
            .and_then(|p| p.value.as_deref())
    }

    /// Store row for this stop, unlinked
    pub fn into_bus_stop(self) -> BusStop {
        let compass_direction = self.compass_point().map(str::to_string);
        BusStop {
            naptan_id: self.naptan_id,
            indicator: self.indicator,
            stop_letter: self.stop_letter,
            stop_type: self.stop_type,
            common_name: self.common_name,
            place_type: self.place_type,
            lat: self.lat,
            lon: self.lon,
            compass_direction,
            audio_file: None,
            audio_file_likeliness: None,
        }
    }
}

/// A line from `Line/Route`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: String,
    pub name: String,
    pub route_sections: Vec<RouteSection>,
}

impl Route {
    pub fn to_bus_route(&self) -> BusRoute {
        BusRoute {
            id: self.id.clone(),
            route_name: self.name.clone(),
        }
    }
}

/// One direction of a line as listed by `Line/Route`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSection {
    pub name: String,
    pub direction: String,
    pub origination_name: String,
    pub destination_name: String,
    /// NaPTAN id of the first stop
    pub originator: String,
    /// NaPTAN id of the last stop
    pub destination: String,
}

/// Stop sequence for one line direction (`Line/{id}/Route/Sequence/{dir}`)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSequence {
    pub line_strings: Vec<String>,
    pub ordered_line_routes: Vec<OrderedLineRoute>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderedLineRoute {
    #[serde(default)]
    pub name: Option<String>,
    pub naptan_ids: Vec<String>,
}

/// Store id of a route section: `{route}_{direction}_{index}`
pub fn section_id(route_id: &str, direction: &str, index: usize) -> String {
    format!("{}_{}_{}", route_id, direction, index)
}

impl RouteSection {
    /// Store row for this section, unlinked
    pub fn to_bus_route_section(&self, route_id: &str, index: usize, line_string: &str) -> BusRouteSection {
        BusRouteSection {
            id: section_id(route_id, &self.direction, index),
            route_id: route_id.to_string(),
            name: self.name.clone(),
            direction: self.direction.clone(),
            origin_name: self.origination_name.clone(),
            origin_audio_file: None,
            origin_audio_file_likeliness: None,
            destination_name: self.destination_name.clone(),
            destination_audio_file: None,
            destination_audio_file_likeliness: None,
            origin_naptan_id: self.originator.clone(),
            destination_naptan_id: self.destination.clone(),
            line_strings: line_string.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stop_json() -> Value {
        json!({
            "$type": "Tfl.Api.Presentation.Entities.StopPoint, Tfl.Api.Presentation.Entities",
            "naptanId": "490000001A",
            "indicator": "Stop A",
            "stopLetter": "A",
            "stopType": "NaptanPublicBusCoachTram",
            "commonName": "Angel Islington",
            "placeType": "StopPoint",
            "lat": 51.532,
            "lon": -0.105,
            "additionalProperties": [
                { "category": "Direction", "key": "Towards", "value": "Old Street" },
                { "category": "Direction", "key": "CompassPoint", "value": "S" }
            ]
        })
    }

    #[test]
    fn test_stop_conversion() {
        let stop: StopPoint = parse_record("stop", &stop_json()).unwrap();
        assert_eq!(stop.compass_point(), Some("S"));

        let row = stop.into_bus_stop();
        assert_eq!(row.naptan_id, "490000001A");
        assert_eq!(row.stop_letter.as_deref(), Some("A"));
        assert_eq!(row.compass_direction.as_deref(), Some("S"));
        assert_eq!(row.audio_file, None);
        assert_eq!(row.audio_file_likeliness, None);
    }

    #[test]
    fn test_optional_stop_fields() {
        let stop: StopPoint = parse_record(
            "stop",
            &json!({
                "naptanId": "490000002B",
                "commonName": "Bank",
                "placeType": "StopPoint",
                "lat": 51.5,
                "lon": -0.09
            }),
        )
        .unwrap();

        assert_eq!(stop.indicator, None);
        assert_eq!(stop.compass_point(), None);
    }

    #[test]
    fn test_missing_required_field_is_malformed() {
        let mut record = stop_json();
        record.as_object_mut().unwrap().remove("commonName");

        let err = parse_record::<StopPoint>("stop", &record).unwrap_err();
        match err {
            LinkerError::MalformedRecord { kind, record, reason } => {
                assert_eq!(kind, "stop");
                assert!(record.contains("490000001A"));
                assert!(reason.contains("commonName"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_mistyped_field_is_malformed() {
        let mut record = stop_json();
        record["lat"] = json!("north");
        assert!(matches!(
            parse_record::<StopPoint>("stop", &record),
            Err(LinkerError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn test_route_section_conversion() {
        let route: Route = parse_record(
            "route",
            &json!({
                "id": "4",
                "name": "4",
                "modeName": "bus",
                "routeSections": [{
                    "name": "Archway Station - Blackfriars",
                    "direction": "inbound",
                    "originationName": "Archway Station",
                    "destinationName": "Blackfriars Station",
                    "originator": "490000008ZB",
                    "destination": "490000024B",
                    "serviceType": "Regular"
                }]
            }),
        )
        .unwrap();

        assert_eq!(route.to_bus_route().route_name, "4");
        let section = route.route_sections[0].to_bus_route_section(&route.id, 0, "[[...]]");
        assert_eq!(section.id, "4_inbound_0");
        assert_eq!(section.origin_name, "Archway Station");
        assert_eq!(section.destination_naptan_id, "490000024B");
        assert_eq!(section.line_strings, "[[...]]");
    }

    #[test]
    fn test_route_section_missing_originator_is_malformed() {
        let record = json!({
            "id": "4",
            "name": "4",
            "routeSections": [{
                "name": "Archway Station - Blackfriars",
                "direction": "inbound",
                "originationName": "Archway Station",
                "destinationName": "Blackfriars Station",
                "destination": "490000024B"
            }]
        });
        assert!(matches!(
            parse_record::<Route>("route", &record),
            Err(LinkerError::MalformedRecord { kind: "route", .. })
        ));
    }
}
