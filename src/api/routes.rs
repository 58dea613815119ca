use color_eyre::eyre::Result;
use reqwest::Method;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ORIGIN: &str = "Am Neuwirtshaus 4, 63457 Hanau";
pub const DEFAULT_DESTINATION: &str = "Mergenthalerallee 3-5, 65760 Eschborn";

const ENDPOINT: &str = "https://routes.googleapis.com/directions/v2:computeRoutes";

// Restricts the response payload to the fields the report actually consumes,
// plus the encoded path for ad hoc inspection of the raw response.
const FIELD_MASK: &str = "routes.duration,routes.distanceMeters,routes.staticDuration,\
routes.legs,routes.description,routes.localizedValues,routes.polyline.encodedPolyline";

#[derive(Serialize, Debug)]
struct Waypoint {
    address: String,
}

#[derive(Serialize, Debug)]
struct RouteModifiers {
    #[serde(rename = "avoidTolls")]
    avoid_tolls: bool,
    #[serde(rename = "avoidHighways")]
    avoid_highways: bool,
    #[serde(rename = "avoidFerries")]
    avoid_ferries: bool,
}

#[derive(Serialize, Debug)]
pub struct RouteRequest {
    origin: Waypoint,
    destination: Waypoint,
    #[serde(rename = "travelMode")]
    travel_mode: &'static str,
    #[serde(rename = "routingPreference")]
    routing_preference: &'static str,
    #[serde(rename = "computeAlternativeRoutes")]
    compute_alternative_routes: bool,
    #[serde(rename = "languageCode")]
    language_code: &'static str,
    units: &'static str,
    #[serde(rename = "routeModifiers")]
    route_modifiers: RouteModifiers,
    #[serde(rename = "requestedReferenceRoutes")]
    requested_reference_routes: Vec<&'static str>,
}

impl RouteRequest {
    pub fn drive(origin: &str, destination: &str) -> Self {
        RouteRequest {
            origin: Waypoint {
                address: origin.to_string(),
            },
            destination: Waypoint {
                address: destination.to_string(),
            },
            travel_mode: "DRIVE",
            routing_preference: "TRAFFIC_AWARE",
            compute_alternative_routes: true,
            language_code: "de-DE",
            units: "METRIC",
            route_modifiers: RouteModifiers {
                avoid_tolls: false,
                avoid_highways: false,
                avoid_ferries: false,
            },
            requested_reference_routes: vec!["FUEL_EFFICIENT"],
        }
    }
}

#[derive(Clone, Deserialize, Debug)]
pub struct NavigationInstruction {
    pub instructions: Option<String>,
}

#[derive(Clone, Deserialize, Debug)]
pub struct Step {
    #[serde(rename = "navigationInstruction")]
    pub navigation_instruction: Option<NavigationInstruction>,
}

#[derive(Clone, Deserialize, Debug)]
pub struct Leg {
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Clone, Deserialize, Debug)]
pub struct LocalizedText {
    pub text: Option<String>,
}

#[derive(Clone, Deserialize, Debug)]
pub struct LocalizedValues {
    pub distance: Option<LocalizedText>,
    pub duration: Option<LocalizedText>,
    #[serde(rename = "staticDuration")]
    pub static_duration: Option<LocalizedText>,
}

// Durations arrive as strings like "1234s"; distances as plain meters.
#[derive(Clone, Deserialize, Debug)]
pub struct Route {
    pub duration: Option<String>,
    #[serde(rename = "staticDuration")]
    pub static_duration: Option<String>,
    #[serde(rename = "distanceMeters")]
    pub distance_meters: Option<i64>,
    pub description: Option<String>,
    #[serde(default)]
    pub legs: Vec<Leg>,
    #[serde(rename = "localizedValues")]
    pub localized_values: Option<LocalizedValues>,
}

#[derive(Clone, Deserialize, Debug, Default)]
pub struct RouteResponse {
    #[serde(default)]
    pub routes: Vec<Route>,
}

/// A non-2xx status is not a transport failure here: the caller is expected
/// to print the diagnostics and carry on.
pub enum ApiOutcome {
    Routes(RouteResponse),
    Failed { status: u16, body: String },
}

pub fn compute_routes(api_key: &str, request: &RouteRequest) -> Result<ApiOutcome> {
    log::debug!("POST {}", ENDPOINT);

    let client = reqwest::blocking::Client::new();
    let response = client
        .request(Method::POST, ENDPOINT)
        .header("Content-Type", "application/json")
        .header("X-Goog-Api-Key", api_key)
        .header("X-Goog-FieldMask", FIELD_MASK)
        .json(request)
        .send()?;

    let status = response.status();
    if !status.is_success() {
        return Ok(ApiOutcome::Failed {
            status: status.as_u16(),
            body: response.text()?,
        });
    }

    Ok(ApiOutcome::Routes(response.json()?))
}
