//! Reqwest-backed OSRM route source adapter.
//!
//! This adapter owns transport details only: request URL construction, timeout
//! and HTTP error mapping, and JSON decoding into a domain route.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

use super::dto::{OSRM_OK, OsrmErrorDto, OsrmResponseDto};
use crate::domain::ports::{RouteSource, RouteSourceError};
use crate::domain::{RouteResult, WaypointSequence};

/// OSRM routing profile used when none is configured.
pub const DEFAULT_OSRM_PROFILE: &str = "driving";

const DEFAULT_USER_AGENT: &str = "itinerary-routing/0.1";

/// Route source that issues one HTTP GET per attempt against an OSRM server.
pub struct OsrmHttpRouteSource {
    client: Client,
    endpoint: Url,
    profile: String,
}

impl OsrmHttpRouteSource {
    /// Build an adapter using a reqwest client with an explicit request timeout.
    /// ```rust,ignore
    /// let source = OsrmHttpRouteSource::new(endpoint, Duration::from_secs(10))?;
    /// ```
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        Self::with_profile(endpoint, timeout, DEFAULT_OSRM_PROFILE)
    }

    /// Build an adapter for a specific OSRM profile such as `driving` or `cycling`.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn with_profile(
        endpoint: Url,
        timeout: Duration,
        profile: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            endpoint,
            profile: profile.into(),
        })
    }
}

#[async_trait]
impl RouteSource for OsrmHttpRouteSource {
    async fn compute_route(
        &self,
        waypoints: &WaypointSequence,
    ) -> Result<RouteResult, RouteSourceError> {
        let url = build_route_url(&self.endpoint, &self.profile, waypoints)?;
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        parse_route(body.as_ref(), waypoints)
    }
}

fn build_route_url(
    endpoint: &Url,
    profile: &str,
    waypoints: &WaypointSequence,
) -> Result<Url, RouteSourceError> {
    if profile.is_empty() || profile.contains('/') {
        return Err(RouteSourceError::invalid_request(format!(
            "routing profile must be a single path segment, got {profile:?}"
        )));
    }
    let coordinates = waypoints
        .as_slice()
        .iter()
        .map(|point| format!("{},{}", point.longitude(), point.latitude()))
        .collect::<Vec<_>>()
        .join(";");

    let mut url = endpoint.clone();
    url.path_segments_mut()
        .map_err(|()| {
            RouteSourceError::invalid_request(format!("endpoint {endpoint} cannot carry a path"))
        })?
        .pop_if_empty()
        .extend(["route", "v1", profile, coordinates.as_str()]);
    url.query_pairs_mut()
        .clear()
        .append_pair("overview", "full")
        .append_pair("geometries", "geojson")
        .append_pair("steps", "true");
    Ok(url)
}

fn parse_route(
    body: &[u8],
    waypoints: &WaypointSequence,
) -> Result<RouteResult, RouteSourceError> {
    let decoded: OsrmResponseDto = serde_json::from_slice(body).map_err(|error| {
        RouteSourceError::decode(format!("invalid OSRM JSON payload: {error}"))
    })?;
    if decoded.code != OSRM_OK {
        return Err(map_osrm_code(
            &decoded.code,
            decoded.message.as_deref().unwrap_or_default(),
        ));
    }
    let route = decoded
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| RouteSourceError::no_route("OSRM returned no routes"))?;
    route
        .into_domain_route(waypoints)
        .map_err(RouteSourceError::decode)
}

fn map_osrm_code(code: &str, message: &str) -> RouteSourceError {
    let detail = if message.is_empty() {
        code.to_owned()
    } else {
        format!("{code}: {message}")
    };
    match code {
        "NoRoute" | "NoSegment" => RouteSourceError::no_route(detail),
        "TooBig" | "InvalidQuery" | "InvalidValue" | "InvalidOptions" | "InvalidUrl"
        | "InvalidService" | "InvalidVersion" => RouteSourceError::invalid_request(detail),
        _ => RouteSourceError::transport(detail),
    }
}

fn map_transport_error(error: reqwest::Error) -> RouteSourceError {
    if error.is_timeout() {
        RouteSourceError::timeout(error.to_string())
    } else {
        RouteSourceError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> RouteSourceError {
    // OSRM reports routing failures such as NoRoute as 400 with a JSON code.
    if let Ok(payload) = serde_json::from_slice::<OsrmErrorDto>(body) {
        if payload.code == "NoRoute" || payload.code == "NoSegment" {
            return map_osrm_code(&payload.code, payload.message.as_deref().unwrap_or_default());
        }
    }

    let body_preview = body_preview(body);
    let message = if body_preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), body_preview)
    };

    match status {
        StatusCode::TOO_MANY_REQUESTS => RouteSourceError::rate_limited(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            RouteSourceError::timeout(message)
        }
        _ if status.is_client_error() => RouteSourceError::invalid_request(message),
        _ => RouteSourceError::transport(message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for non-network OSRM mapping helpers.

    use super::*;
    use crate::domain::InstructionKind;
    use rstest::{fixture, rstest};

    #[fixture]
    fn two_stops() -> WaypointSequence {
        WaypointSequence::from_coordinates([(49.2488, -122.9805), (49.888, -119.496)])
            .expect("valid sequence")
    }

    #[rstest]
    fn builds_route_url_with_lng_lat_pairs(two_stops: WaypointSequence) {
        let endpoint = Url::parse("https://router.example.test/osrm/").expect("url");
        let url = build_route_url(&endpoint, DEFAULT_OSRM_PROFILE, &two_stops).expect("url");

        assert_eq!(
            url.path(),
            "/osrm/route/v1/driving/-122.9805,49.2488;-119.496,49.888"
        );
        assert_eq!(url.query(), Some("overview=full&geometries=geojson&steps=true"));
    }

    #[rstest]
    fn rejects_profiles_with_slashes(two_stops: WaypointSequence) {
        let endpoint = Url::parse("https://router.example.test").expect("url");
        let error = build_route_url(&endpoint, "driving/extra", &two_stops).expect_err("profile");
        assert!(matches!(error, RouteSourceError::InvalidRequest { .. }));
    }

    #[rstest]
    #[case::rate_limited(StatusCode::TOO_MANY_REQUESTS, "RateLimited")]
    #[case::request_timeout(StatusCode::REQUEST_TIMEOUT, "Timeout")]
    #[case::gateway_timeout(StatusCode::GATEWAY_TIMEOUT, "Timeout")]
    #[case::bad_request(StatusCode::BAD_REQUEST, "InvalidRequest")]
    #[case::server_error(StatusCode::BAD_GATEWAY, "Transport")]
    fn maps_http_statuses_to_expected_domain_errors(
        #[case] status: StatusCode,
        #[case] expected: &str,
    ) {
        let error = map_status_error(status, b"<html>upstream unavailable</html>");
        let matched = match expected {
            "RateLimited" => matches!(error, RouteSourceError::RateLimited { .. }),
            "Timeout" => matches!(error, RouteSourceError::Timeout { .. }),
            "InvalidRequest" => matches!(error, RouteSourceError::InvalidRequest { .. }),
            "Transport" => matches!(error, RouteSourceError::Transport { .. }),
            _ => panic!("unsupported test expectation: {expected}"),
        };
        assert!(matched, "{status} should map to {expected}, got {error:?}");
    }

    #[test]
    fn no_route_payload_maps_to_no_route_even_on_400() {
        let error = map_status_error(
            StatusCode::BAD_REQUEST,
            br#"{"code":"NoRoute","message":"Impossible route between points"}"#,
        );
        assert!(matches!(error, RouteSourceError::NoRoute { .. }));
        assert!(error.to_string().contains("Impossible route"));
    }

    #[test]
    fn body_preview_truncates_and_compacts_whitespace() {
        let body = format!("a  b\n{}", "x".repeat(200));
        let preview = body_preview(body.as_bytes());
        assert!(preview.starts_with("a b x"));
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), 163);
    }

    #[rstest]
    fn parses_osrm_json_into_domain_route(two_stops: WaypointSequence) {
        let body = r#"{
            "code": "Ok",
            "routes": [{
                "distance": 390012.5,
                "duration": 14820.0,
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[-122.9805, 49.2488], [-121.0, 49.5], [-119.496, 49.888]]
                },
                "legs": [{
                    "steps": [
                        {"distance": 1200.0, "duration": 90.0, "name": "Kingsway",
                         "maneuver": {"type": "depart", "modifier": "east"}},
                        {"distance": 388812.5, "duration": 14730.0, "name": "BC-97C",
                         "maneuver": {"type": "turn", "modifier": "left"}},
                        {"distance": 0.0, "duration": 0.0, "name": "",
                         "maneuver": {"type": "arrive"}}
                    ]
                }]
            }]
        }"#;

        let route = parse_route(body.as_bytes(), &two_stops).expect("decode");
        assert!(!route.is_fallback());
        assert_eq!(route.coordinates.len(), 3);
        assert_eq!(route.coordinates[1].latitude(), 49.5);
        assert_eq!(route.summary.total_distance_m, 390_012.5);
        let kinds = route
            .instructions
            .iter()
            .map(|step| step.kind)
            .collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![
                InstructionKind::Start,
                InstructionKind::Turn,
                InstructionKind::Arrive
            ]
        );
        assert_eq!(route.instructions[0].text, "Head east onto Kingsway");
        assert_eq!(route.instructions[1].text, "Turn left onto BC-97C");
        assert_eq!(route.instructions[2].waypoint_index, Some(1));
    }

    #[rstest]
    fn intermediate_arrivals_are_folded_into_next_departure() {
        let three = WaypointSequence::from_coordinates([(0.0, 0.0), (0.0, 1.0), (1.0, 1.0)])
            .expect("valid sequence");
        let body = r#"{
            "code": "Ok",
            "routes": [{
                "distance": 2.0, "duration": 2.0,
                "geometry": {"coordinates": [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]},
                "legs": [
                    {"steps": [
                        {"distance": 1.0, "duration": 1.0, "maneuver": {"type": "depart"}},
                        {"distance": 0.0, "duration": 0.0, "maneuver": {"type": "arrive"}}
                    ]},
                    {"steps": [
                        {"distance": 1.0, "duration": 1.0, "maneuver": {"type": "depart"}},
                        {"distance": 0.0, "duration": 0.0, "maneuver": {"type": "arrive"}}
                    ]}
                ]
            }]
        }"#;

        let route = parse_route(body.as_bytes(), &three).expect("decode");
        let indices = route
            .instructions
            .iter()
            .map(|step| (step.kind, step.waypoint_index))
            .collect::<Vec<_>>();
        assert_eq!(
            indices,
            vec![
                (InstructionKind::Start, Some(0)),
                (InstructionKind::Continue, Some(1)),
                (InstructionKind::Arrive, Some(2)),
            ]
        );
    }

    #[rstest]
    #[case::no_route(r#"{"code":"NoRoute","message":"none"}"#, "NoRoute")]
    #[case::empty_routes(r#"{"code":"Ok","routes":[]}"#, "NoRoute")]
    #[case::too_big(r#"{"code":"TooBig"}"#, "InvalidRequest")]
    #[case::not_json("<html></html>", "Decode")]
    fn classifies_unusable_payloads(
        two_stops: WaypointSequence,
        #[case] body: &str,
        #[case] expected: &str,
    ) {
        let error = parse_route(body.as_bytes(), &two_stops).expect_err("payload must fail");
        let matched = match expected {
            "NoRoute" => matches!(error, RouteSourceError::NoRoute { .. }),
            "InvalidRequest" => matches!(error, RouteSourceError::InvalidRequest { .. }),
            "Decode" => matches!(error, RouteSourceError::Decode { .. }),
            _ => panic!("unsupported test expectation: {expected}"),
        };
        assert!(matched, "expected {expected}, got {error:?}");
    }

    #[rstest]
    fn rejects_out_of_range_geometry(two_stops: WaypointSequence) {
        let body = r#"{"code":"Ok","routes":[{"distance":1.0,"duration":1.0,
            "geometry":{"coordinates":[[200.0, 10.0]]},"legs":[]}]}"#;
        let error = parse_route(body.as_bytes(), &two_stops).expect_err("invalid geometry");
        assert!(matches!(error, RouteSourceError::Decode { .. }));
    }
}
