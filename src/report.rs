use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use clap::ValueEnum;
use color_eyre::eyre::Result;
use eyre::eyre;
use itertools::Itertools;

use crate::api::routes::{LocalizedText, Route, RouteResponse};

const ROAD_KEYWORDS: [&str; 7] = ["Highway", "Hwy", "Motorway", "Rd", "Road", "Street", "St"];
const MOTORWAY_TOKEN: &str = "Autobahn";
const MAX_DISPLAYED_ROADS: usize = 3;
const SEPARATOR_WIDTH: usize = 80;

/// How to recognize a major road in a navigation instruction.
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum RoadRule {
    /// Road-type keywords ("Highway", "Rd", "Street", ...)
    Keywords,
    /// "Autobahn" or a route number like A66 / B8
    MotorwayNumbers,
}

impl RoadRule {
    fn matches(&self, instruction: &str) -> bool {
        match self {
            RoadRule::Keywords => ROAD_KEYWORDS
                .iter()
                .any(|keyword| instruction.contains(keyword)),
            RoadRule::MotorwayNumbers => {
                instruction.contains(MOTORWAY_TOKEN) || has_route_number(instruction)
            }
        }
    }
}

// A standalone token of one letter followed by 1-3 digits, e.g. "A66" or "B8".
fn has_route_number(instruction: &str) -> bool {
    instruction
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|token| {
            let mut chars = token.chars();
            matches!(chars.next(), Some(first) if first.is_ascii_alphabetic())
                && (1..=3).contains(&(token.len() - 1))
                && chars.all(|c| c.is_ascii_digit())
        })
}

/// Distinct matching instruction strings across all legs and steps of one
/// route, in deterministic order.
pub fn major_roads(route: &Route, rule: RoadRule) -> BTreeSet<String> {
    let mut roads = BTreeSet::new();

    for leg in &route.legs {
        for step in &leg.steps {
            let instruction = step
                .navigation_instruction
                .as_ref()
                .and_then(|nav| nav.instructions.as_deref());

            if let Some(instruction) = instruction {
                if rule.matches(instruction) {
                    roads.insert(instruction.to_string());
                }
            }
        }
    }

    roads
}

fn parse_seconds(raw: &str) -> Result<i64> {
    raw.trim_end_matches('s')
        .parse()
        .map_err(|_| eyre!("Unparseable duration value: {:?}", raw))
}

// The API omits the raw fields on degenerate routes; treat them as zero.
fn duration_seconds(route: &Route) -> Result<i64> {
    parse_seconds(route.duration.as_deref().unwrap_or("0s"))
}

fn localized_text(field: Option<&LocalizedText>) -> Option<String> {
    field.and_then(|value| value.text.clone())
}

/// Multi-line report, one block per route.
pub fn human_report(response: &RouteResponse, rule: RoadRule) -> Result<String> {
    if response.routes.is_empty() {
        return Ok("No routes found".to_string());
    }

    let mut lines = vec![
        format!("Found {} route(s)", response.routes.len()),
        String::new(),
        "=".repeat(SEPARATOR_WIDTH),
    ];

    for (idx, route) in response.routes.iter().enumerate() {
        lines.push(String::new());
        match &route.description {
            Some(description) => lines.push(format!("ROUTE {}: {}", idx + 1, description)),
            None => lines.push(format!("ROUTE {}:", idx + 1)),
        }
        lines.push("-".repeat(SEPARATOR_WIDTH));

        let roads = major_roads(route, rule);
        if !roads.is_empty() {
            lines.push(format!(
                "Route via: {}",
                roads.iter().take(MAX_DISPLAYED_ROADS).join(", ")
            ));
        }

        let localized = route.localized_values.as_ref();
        let seconds = duration_seconds(route)?;
        let meters = route.distance_meters.unwrap_or(0);

        let distance = localized_text(localized.and_then(|values| values.distance.as_ref()))
            .unwrap_or_else(|| format!("{:.1} km", meters as f64 / 1000.0));
        lines.push(format!("Distance: {}", distance));

        let duration = localized_text(localized.and_then(|values| values.duration.as_ref()))
            .unwrap_or_else(|| format!("{:.1} minutes ({} seconds)", seconds as f64 / 60.0, seconds));
        lines.push(format!("Duration: {}", duration));

        if let Some(raw_static) = route.static_duration.as_deref() {
            let static_seconds = parse_seconds(raw_static)?;
            let static_duration =
                localized_text(localized.and_then(|values| values.static_duration.as_ref()))
                    .unwrap_or_else(|| format!("{:.1} minutes", static_seconds as f64 / 60.0));
            lines.push(format!("Duration without traffic: {}", static_duration));

            // Can go negative if the traffic-aware estimate beats the baseline.
            let delay = seconds - static_seconds;
            lines.push(format!(
                "Traffic delay: {} seconds ({:.1} minutes)",
                delay,
                delay as f64 / 60.0
            ));
        }

        lines.push("-".repeat(SEPARATOR_WIDTH));
    }

    Ok(lines.join("\n"))
}

/// One `date;time;distanceKm;durationMin[;staticDurationMin;delayMin]` row
/// per route. The timestamp is captured once by the caller so all rows of an
/// invocation share it.
pub fn log_lines(response: &RouteResponse, timestamp: NaiveDateTime) -> Result<String> {
    if response.routes.is_empty() {
        return Ok("No routes found".to_string());
    }

    let date = timestamp.format("%Y-%m-%d");
    let time = timestamp.format("%H:%M:%S");
    let mut rows = Vec::with_capacity(response.routes.len());

    for route in &response.routes {
        let seconds = duration_seconds(route)?;
        let km = route.distance_meters.unwrap_or(0) as f64 / 1000.0;
        let mut row = format!("{};{};{:.1};{:.1}", date, time, km, seconds as f64 / 60.0);

        if let Some(raw_static) = route.static_duration.as_deref() {
            let static_seconds = parse_seconds(raw_static)?;
            let delay = seconds - static_seconds;
            row.push_str(&format!(
                ";{:.1};{:.1}",
                static_seconds as f64 / 60.0,
                delay as f64 / 60.0
            ));
        }

        rows.push(row);
    }

    Ok(rows.join("\n"))
}

pub fn http_failure_notice(status: u16, body: &str) -> String {
    format!("Error: {}\n{}", status, body)
}

#[cfg(test)]
pub mod test {
    use chrono::NaiveDate;
    use serde_json::json;

    use super::*;

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(6, 45, 0)
            .unwrap()
    }

    fn response(value: serde_json::Value) -> RouteResponse {
        serde_json::from_value(value).unwrap()
    }

    fn step(instruction: &str) -> serde_json::Value {
        json!({ "navigationInstruction": { "instructions": instruction } })
    }

    #[test]
    fn report_computes_distance_and_duration_from_raw_fields() {
        let response = response(json!({
            "routes": [{ "duration": "1234s", "distanceMeters": 45000 }]
        }));

        let report = human_report(&response, RoadRule::MotorwayNumbers).unwrap();

        assert!(report.contains("Found 1 route(s)"));
        assert!(report.contains("Distance: 45.0 km"));
        assert!(report.contains("Duration: 20.6 minutes (1234 seconds)"));
    }

    #[test]
    fn report_prefers_localized_text_over_computed_values() {
        let response = response(json!({
            "routes": [{
                "duration": "1234s",
                "distanceMeters": 45000,
                "localizedValues": {
                    "distance": { "text": "45 km" },
                    "duration": { "text": "21 Minuten" }
                }
            }]
        }));

        let report = human_report(&response, RoadRule::MotorwayNumbers).unwrap();

        assert!(report.contains("Distance: 45 km"));
        assert!(report.contains("Duration: 21 Minuten"));
        assert!(!report.contains("20.6 minutes"));
    }

    #[test]
    fn delay_appears_in_both_modes_when_static_duration_is_present() {
        let response = response(json!({
            "routes": [{
                "duration": "1800s",
                "staticDuration": "1500s",
                "distanceMeters": 45000
            }]
        }));

        let report = human_report(&response, RoadRule::MotorwayNumbers).unwrap();
        assert!(report.contains("Duration without traffic: 25.0 minutes"));
        assert!(report.contains("Traffic delay: 300 seconds (5.0 minutes)"));

        let lines = log_lines(&response, timestamp()).unwrap();
        assert_eq!(lines, "2024-01-15;06:45:00;45.0;30.0;25.0;5.0");
    }

    #[test]
    fn delay_is_absent_when_static_duration_is_missing() {
        let response = response(json!({
            "routes": [{ "duration": "1800s", "distanceMeters": 45000 }]
        }));

        let report = human_report(&response, RoadRule::MotorwayNumbers).unwrap();
        assert!(!report.contains("Traffic delay"));
        assert!(!report.contains("Duration without traffic"));

        let lines = log_lines(&response, timestamp()).unwrap();
        assert_eq!(lines, "2024-01-15;06:45:00;45.0;30.0");
    }

    #[test]
    fn one_record_per_route() {
        let response = response(json!({
            "routes": [
                { "duration": "1800s", "distanceMeters": 45000 },
                { "duration": "2100s", "distanceMeters": 52000 }
            ]
        }));

        let report = human_report(&response, RoadRule::MotorwayNumbers).unwrap();
        assert!(report.contains("Found 2 route(s)"));
        assert!(report.contains("ROUTE 1:"));
        assert!(report.contains("ROUTE 2:"));

        let lines = log_lines(&response, timestamp()).unwrap();
        assert_eq!(lines.lines().count(), 2);
    }

    #[test]
    fn empty_route_list_yields_the_notice_in_both_modes() {
        let response = response(json!({ "routes": [] }));

        assert_eq!(
            human_report(&response, RoadRule::MotorwayNumbers).unwrap(),
            "No routes found"
        );
        assert_eq!(log_lines(&response, timestamp()).unwrap(), "No routes found");
    }

    #[test]
    fn missing_raw_fields_fall_back_to_zero() {
        let response = response(json!({ "routes": [{}] }));

        let lines = log_lines(&response, timestamp()).unwrap();
        assert_eq!(lines, "2024-01-15;06:45:00;0.0;0.0");
    }

    #[test]
    fn duplicate_instructions_collapse_to_one_entry() {
        let response = response(json!({
            "routes": [{
                "duration": "1800s",
                "distanceMeters": 45000,
                "legs": [
                    { "steps": [step("Auf die A66 auffahren")] },
                    { "steps": [step("Auf die A66 auffahren")] }
                ]
            }]
        }));

        let roads = major_roads(&response.routes[0], RoadRule::MotorwayNumbers);
        assert_eq!(roads.len(), 1);
    }

    #[test]
    fn displayed_roads_are_capped_at_three() {
        let response = response(json!({
            "routes": [{
                "duration": "1800s",
                "distanceMeters": 45000,
                "legs": [{ "steps": [
                    step("Auf die A3 auffahren"),
                    step("Auf die A5 wechseln"),
                    step("Auf die A66 wechseln"),
                    step("Auf die B8 abfahren")
                ] }]
            }]
        }));

        let report = human_report(&response, RoadRule::MotorwayNumbers).unwrap();
        let via = report
            .lines()
            .find(|line| line.starts_with("Route via: "))
            .unwrap();

        assert_eq!(via.trim_start_matches("Route via: ").split(", ").count(), 3);
    }

    #[test]
    fn keyword_rule_matches_road_type_keywords() {
        assert!(RoadRule::Keywords.matches("Turn onto Main Street"));
        assert!(RoadRule::Keywords.matches("Merge onto the Motorway"));
        assert!(!RoadRule::Keywords.matches("Auf die A66 auffahren"));
    }

    #[test]
    fn motorway_rule_matches_route_numbers_and_the_autobahn_token() {
        assert!(RoadRule::MotorwayNumbers.matches("Auf die A66 auffahren"));
        assert!(RoadRule::MotorwayNumbers.matches("Der Autobahn folgen"));
        assert!(RoadRule::MotorwayNumbers.matches("B8 Richtung Hanau"));
        assert!(!RoadRule::MotorwayNumbers.matches("Turn onto Main Street"));
        // Four digits is not a route number.
        assert!(!RoadRule::MotorwayNumbers.matches("Kilometer A1234 passieren"));
    }

    #[test]
    fn unparseable_duration_is_an_error() {
        assert!(parse_seconds("abc").is_err());
        assert_eq!(parse_seconds("1234s").unwrap(), 1234);
        assert_eq!(parse_seconds("0s").unwrap(), 0);
    }

    #[test]
    fn failure_notice_carries_status_and_raw_body() {
        let notice = http_failure_notice(403, "{\"error\": \"key invalid\"}");

        assert!(notice.contains("403"));
        assert!(notice.contains("{\"error\": \"key invalid\"}"));
    }
}
