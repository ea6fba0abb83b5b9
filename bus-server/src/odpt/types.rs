//! ODPT API response DTOs.
//!
//! These map the JSON-LD wire format (`odpt:`/`dc:`/`owl:` prefixed keys).
//! Fields are `Option` throughout because records omit keys freely, and the
//! vehicle/timetable records additionally keep a flattened map of whatever
//! else came along, for the ordered-fallback extractors.

use serde::Deserialize;
use serde_json::Value;

use crate::domain::{RoutePattern, StopPole, stop_ref};

/// A bus stop pole record (`odpt:BusstopPole`).
#[derive(Debug, Clone, Deserialize)]
pub struct BusstopPoleDto {
    #[serde(rename = "owl:sameAs")]
    pub same_as: Option<String>,
    #[serde(rename = "@id")]
    pub at_id: Option<String>,
    #[serde(rename = "dc:title")]
    pub title: Option<String>,
    #[serde(rename = "odpt:busroutePattern")]
    pub patterns: Option<Vec<String>>,
}

impl BusstopPoleDto {
    /// Canonical identifier: `owl:sameAs`, falling back to `@id`.
    pub fn canonical_id(&self) -> Option<&str> {
        self.same_as
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.at_id.as_deref().filter(|s| !s.is_empty()))
    }

    /// Convert to a domain pole; `None` when id or title is missing.
    pub fn into_stop_pole(self) -> Option<StopPole> {
        let id = self.canonical_id()?.to_string();
        let title = self.title.as_deref().unwrap_or_default().trim().to_string();
        if title.is_empty() {
            return None;
        }
        let mut patterns = self.patterns.unwrap_or_default();
        let mut seen = std::collections::HashSet::new();
        patterns.retain(|p| !p.is_empty() && seen.insert(p.clone()));
        Some(StopPole {
            id,
            title,
            patterns,
        })
    }
}

/// One position in a pattern's stop order.
#[derive(Debug, Clone, Deserialize)]
pub struct PoleOrderDto {
    #[serde(rename = "odpt:busstopPole")]
    pub pole: Option<String>,
    #[serde(rename = "odpt:note")]
    pub note: Option<String>,
    #[serde(rename = "odpt:index")]
    pub index: Option<i64>,
}

/// A route pattern record (`odpt:BusroutePattern`).
#[derive(Debug, Clone, Deserialize)]
pub struct BusroutePatternDto {
    #[serde(rename = "owl:sameAs")]
    pub same_as: Option<String>,
    #[serde(rename = "@id")]
    pub at_id: Option<String>,
    #[serde(rename = "dc:title")]
    pub title: Option<String>,
    #[serde(rename = "odpt:busroute")]
    pub route: Option<String>,
    #[serde(rename = "odpt:busstopPoleOrder")]
    pub stop_order: Option<Vec<PoleOrderDto>>,
}

impl BusroutePatternDto {
    pub fn canonical_id(&self) -> Option<&str> {
        self.same_as
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.at_id.as_deref().filter(|s| !s.is_empty()))
    }

    /// Convert to a domain pattern; `None` when the id is missing.
    pub fn into_route_pattern(self) -> Option<RoutePattern> {
        let id = self.canonical_id()?.to_string();
        let stops = self
            .stop_order
            .unwrap_or_default()
            .iter()
            .enumerate()
            .map(|(i, o)| stop_ref(o.pole.as_deref(), o.note.as_deref(), i))
            .collect();
        Some(RoutePattern {
            id,
            route_id: self.route.filter(|r| !r.is_empty()),
            title: self.title.unwrap_or_default(),
            stops,
        })
    }
}

/// One stop-visit row within a timetable.
#[derive(Debug, Clone, Deserialize)]
pub struct TimetableObjectDto {
    #[serde(rename = "odpt:busstopPole")]
    pub pole: Option<String>,
    #[serde(rename = "odpt:note")]
    pub note: Option<String>,
    #[serde(rename = "odpt:isMidnight")]
    pub is_midnight: Option<bool>,
    #[serde(rename = "odpt:arrivalTime")]
    pub arrival_time: Option<String>,
    #[serde(rename = "odpt:departureTime")]
    pub departure_time: Option<String>,
}

impl TimetableObjectDto {
    /// The usable time string for this row: departure, else arrival.
    pub fn time_str(&self) -> Option<&str> {
        self.departure_time
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.arrival_time.as_deref().filter(|s| !s.is_empty()))
    }
}

/// A timetable record (`odpt:BusTimetable`): one scheduled run of a pattern.
#[derive(Debug, Clone, Deserialize)]
pub struct BusTimetableDto {
    #[serde(rename = "dc:title")]
    pub title: Option<String>,
    #[serde(rename = "odpt:busroutePattern")]
    pub pattern: Option<String>,
    #[serde(rename = "odpt:busroute")]
    pub route: Option<String>,
    #[serde(rename = "odpt:busTimetableObject")]
    pub objects: Option<Vec<TimetableObjectDto>>,
    /// Everything else (notes, remarks, status fields under varying names).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl BusTimetableDto {
    pub fn stop_visits(&self) -> &[TimetableObjectDto] {
        self.objects.as_deref().unwrap_or_default()
    }
}

/// A live vehicle record (`odpt:Bus`).
///
/// Only the join keys are named; the schema for everything else varies by
/// feed generation, so the rest stays in the flattened map for the
/// extractors.
#[derive(Debug, Clone, Deserialize)]
pub struct BusDto {
    #[serde(rename = "odpt:busroute")]
    pub route: Option<String>,
    #[serde(rename = "odpt:busroutePattern")]
    pub pattern: Option<String>,
    #[serde(rename = "odpt:delay")]
    pub delay: Option<Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pole_prefers_same_as_over_at_id() {
        let dto: BusstopPoleDto = serde_json::from_value(serde_json::json!({
            "owl:sameAs": "odpt.BusstopPole:Toei.Toyosu.1",
            "@id": "urn:ucode:xyz",
            "dc:title": " 豊洲駅前 ",
            "odpt:busroutePattern": ["pat.a", "", "pat.a"]
        }))
        .unwrap();
        assert_eq!(dto.canonical_id(), Some("odpt.BusstopPole:Toei.Toyosu.1"));
        let pole = dto.into_stop_pole().unwrap();
        assert_eq!(pole.title, "豊洲駅前");
        assert_eq!(pole.patterns, vec!["pat.a".to_string()]);
    }

    #[test]
    fn pole_without_title_or_id_is_dropped() {
        let no_title: BusstopPoleDto =
            serde_json::from_value(serde_json::json!({ "@id": "urn:x" })).unwrap();
        assert!(no_title.into_stop_pole().is_none());

        let no_id: BusstopPoleDto =
            serde_json::from_value(serde_json::json!({ "dc:title": "X" })).unwrap();
        assert!(no_id.into_stop_pole().is_none());
    }

    #[test]
    fn pattern_converts_stop_order() {
        let dto: BusroutePatternDto = serde_json::from_value(serde_json::json!({
            "owl:sameAs": "odpt.BusroutePattern:Toei.海01.40301",
            "dc:title": "海01",
            "odpt:busstopPoleOrder": [
                { "odpt:busstopPole": "pole.a", "odpt:note": "豊洲駅前:1", "odpt:index": 1 },
                { "odpt:busstopPole": "pole.b", "odpt:note": "枝川", "odpt:index": 2 }
            ]
        }))
        .unwrap();
        let pattern = dto.into_route_pattern().unwrap();
        assert_eq!(pattern.stops.len(), 2);
        assert_eq!(pattern.stops[0].name, "豊洲駅前");
        assert_eq!(pattern.stops[1].index, 1);
        assert_eq!(
            pattern.effective_route_id().as_deref(),
            Some("odpt.Busroute:Toei.海01")
        );
    }

    #[test]
    fn timetable_row_prefers_departure_time() {
        let row: TimetableObjectDto = serde_json::from_value(serde_json::json!({
            "odpt:arrivalTime": "12:00",
            "odpt:departureTime": "12:01"
        }))
        .unwrap();
        assert_eq!(row.time_str(), Some("12:01"));

        let arrival_only: TimetableObjectDto =
            serde_json::from_value(serde_json::json!({ "odpt:arrivalTime": "12:00" })).unwrap();
        assert_eq!(arrival_only.time_str(), Some("12:00"));

        let empty: TimetableObjectDto =
            serde_json::from_value(serde_json::json!({ "odpt:departureTime": "" })).unwrap();
        assert_eq!(empty.time_str(), None);
    }

    #[test]
    fn timetable_keeps_unknown_fields_in_extra() {
        let tt: BusTimetableDto = serde_json::from_value(serde_json::json!({
            "dc:title": "海01",
            "odpt:note": "終車",
            "odpt:busTimetableObject": []
        }))
        .unwrap();
        assert_eq!(tt.extra.get("odpt:note"), Some(&Value::from("終車")));
    }

    #[test]
    fn bus_keeps_variant_fields_in_extra() {
        let bus: BusDto = serde_json::from_value(serde_json::json!({
            "odpt:busroute": "odpt.Busroute:Toei.海01",
            "odpt:delay": 120,
            "odpt:occupancy": "満員",
            "dc:date": "2024-06-10T12:00:00+09:00"
        }))
        .unwrap();
        assert_eq!(bus.route.as_deref(), Some("odpt.Busroute:Toei.海01"));
        assert_eq!(bus.delay, Some(Value::from(120)));
        assert!(bus.extra.contains_key("odpt:occupancy"));
        assert!(bus.extra.contains_key("dc:date"));
    }
}
