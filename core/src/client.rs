//! IGDB request builder, response parser and the client that ties them to a
//! transport.
//!
//! # Design
//! Each call is split into a pure `build_*` step producing an `HttpRequest`
//! and a `parse_response` step consuming the `HttpResponse`. `IgdbClient`
//! keeps no per-request state: every call returns an `ApiResponse` holding
//! the decoded body together with the raw response, and scroll pagination
//! takes that value back explicitly. One client can therefore serve
//! concurrent callers without one overwriting another's cursor.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::IgdbConfig;
use crate::endpoint::IntoEndpoint;
use crate::error::{IgdbError, IgdbResult};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::params::ParameterBuilder;

/// Response header carrying the relative path of the next scroll page.
pub const SCROLL_NEXT_PAGE: &str = "X-Next-Page";
/// Response header carrying the total number of scroll results.
pub const SCROLL_COUNT: &str = "X-Count";

/// Decoded body of an IGDB call plus the response it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub data: Vec<Value>,
    pub raw: HttpResponse,
}

impl ApiResponse {
    pub fn status(&self) -> u16 {
        self.raw.status
    }

    pub fn is_success(&self) -> bool {
        self.raw.is_success()
    }

    /// Continuation path for scroll pagination, if the server sent one.
    pub fn next_page(&self) -> Option<&str> {
        self.raw.header(SCROLL_NEXT_PAGE)
    }

    /// Deserialize every element of the body into `D`.
    pub fn items<D: DeserializeOwned>(&self) -> IgdbResult<Vec<D>> {
        self.data
            .iter()
            .cloned()
            .map(|value| {
                serde_json::from_value(value).map_err(|source| IgdbError::Deserialize { source })
            })
            .collect()
    }

    pub fn into_data(self) -> Vec<Value> {
        self.data
    }
}

/// Decode a response body into a list of values.
///
/// A JSON array yields its elements and any other JSON value a one-element
/// list. A body that is not JSON at all (IGDB answers some errors with bare
/// text) becomes a one-element list holding the raw text, so callers always
/// get a list back.
pub fn process_response(body: &str) -> Vec<Value> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(items)) => items,
        Ok(other) => vec![other],
        Err(err) => {
            debug!(error = %err, "IGDB body is not JSON; wrapping raw text");
            vec![Value::String(body.to_string())]
        }
    }
}

/// Read `header` from `response`, failing when it is absent or empty.
pub fn scroll_header<'a>(response: &'a HttpResponse, header: &str) -> IgdbResult<&'a str> {
    response
        .header(header)
        .ok_or_else(|| IgdbError::ScrollHeaderNotFound {
            header: header.to_string(),
        })
}

/// Client for the IGDB REST API.
#[derive(Debug, Clone)]
pub struct IgdbClient<T = UreqTransport> {
    base_url: String,
    api_key: String,
    transport: T,
}

impl IgdbClient<UreqTransport> {
    /// Client talking to the network through a default `ureq` agent.
    pub fn from_config(config: IgdbConfig) -> IgdbResult<Self> {
        Self::new(config, UreqTransport::new())
    }
}

impl<T: Transport> IgdbClient<T> {
    /// Fails with `IgdbError::Configuration` when the key or URL is blank.
    pub fn new(config: IgdbConfig, transport: T) -> IgdbResult<Self> {
        config.validate()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            transport,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base_url}/{resource}/` for a known resource.
    pub fn endpoint(&self, endpoint: impl IntoEndpoint) -> IgdbResult<String> {
        let endpoint = endpoint.into_endpoint()?;
        Ok(format!("{}/{}/", self.base_url, endpoint.as_str()))
    }

    pub fn build_request(
        &self,
        endpoint: impl IntoEndpoint,
        params: &ParameterBuilder,
    ) -> IgdbResult<HttpRequest> {
        let url = self.endpoint(endpoint)? + &params.build_query_string();
        Ok(self.get(url))
    }

    /// Request for the page after `previous`, taken from its next-page header.
    pub fn build_scroll_request(&self, previous: &HttpResponse) -> IgdbResult<HttpRequest> {
        let path = scroll_header(previous, SCROLL_NEXT_PAGE)?;
        self.build_scroll_request_from_path(path)
    }

    /// Request for a next-page path saved from an earlier response, e.g.
    /// `/games/scroll/<token>/`.
    pub fn build_scroll_request_from_path(&self, path: &str) -> IgdbResult<HttpRequest> {
        let path = path.trim();
        if path.is_empty() {
            return Err(IgdbError::ScrollHeaderNotFound {
                header: SCROLL_NEXT_PAGE.to_string(),
            });
        }
        let separator = if path.starts_with('/') { "" } else { "/" };
        Ok(self.get(format!("{}{}{}", self.base_url, separator, path)))
    }

    /// Interpret the response to `request`.
    ///
    /// Non-2xx responses are still returned when their body is JSON, since
    /// IGDB describes errors that way; without a JSON body they become
    /// `IgdbError::ApiRequest` carrying the whole response.
    pub fn parse_response(
        &self,
        request: &HttpRequest,
        response: HttpResponse,
    ) -> IgdbResult<ApiResponse> {
        if !response.is_success() {
            warn!(url = %request.url, status = response.status, "IGDB returned an error status");
            if serde_json::from_str::<Value>(&response.body).is_err() {
                return Err(IgdbError::ApiRequest {
                    url: request.url.clone(),
                    status: response.status,
                    response: Box::new(response),
                });
            }
        }

        Ok(ApiResponse {
            data: process_response(&response.body),
            raw: response,
        })
    }

    /// Execute `request` and parse the answer.
    pub fn send(&self, request: &HttpRequest) -> IgdbResult<ApiResponse> {
        debug!(url = %request.url, "sending IGDB request");
        let response = self
            .transport
            .execute(request)
            .map_err(|source| IgdbError::Transport {
                url: request.url.clone(),
                source,
            })?;
        self.parse_response(request, response)
    }

    pub fn call_api(
        &self,
        endpoint: impl IntoEndpoint,
        params: &ParameterBuilder,
    ) -> IgdbResult<ApiResponse> {
        let request = self.build_request(endpoint, params)?;
        self.send(&request)
    }

    /// `call_api` with `term` as the search parameter.
    pub fn search(
        &self,
        term: &str,
        endpoint: impl IntoEndpoint,
        params: ParameterBuilder,
    ) -> IgdbResult<ApiResponse> {
        self.call_api(endpoint, &params.search(term))
    }

    /// `call_api` followed by deserializing every element into `D`.
    pub fn fetch<D: DeserializeOwned>(
        &self,
        endpoint: impl IntoEndpoint,
        params: &ParameterBuilder,
    ) -> IgdbResult<Vec<D>> {
        self.call_api(endpoint, params)?.items()
    }

    /// Fetch the page following `previous` in a scroll cursor.
    ///
    /// `previous` must come from a call made with `scroll=1` (or from an
    /// earlier `scroll`). When it carries no next-page header nothing is sent
    /// and `IgdbError::ScrollHeaderNotFound` is returned.
    pub fn scroll(&self, previous: &ApiResponse) -> IgdbResult<ApiResponse> {
        let path = scroll_header(&previous.raw, SCROLL_NEXT_PAGE)?;
        self.scroll_path(path)
    }

    /// Resume a scroll cursor from its next-page path alone.
    ///
    /// Lets a caller keep only the `X-Next-Page` value between requests (in a
    /// session, say) instead of the whole previous response.
    pub fn scroll_path(&self, path: &str) -> IgdbResult<ApiResponse> {
        let request = self.build_scroll_request_from_path(path)?;
        self.send(&request)
    }

    /// Total number of results of the scroll cursor `previous` belongs to.
    pub fn scroll_count(&self, previous: &ApiResponse) -> IgdbResult<u64> {
        let value = scroll_header(&previous.raw, SCROLL_COUNT)?;
        value
            .trim()
            .parse()
            .map_err(|source| IgdbError::InvalidScrollCount {
                value: value.to_string(),
                source,
            })
    }

    fn get(&self, url: String) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url,
            headers: vec![
                ("user-key".to_string(), self.api_key.clone()),
                ("Accept".to_string(), "application/json".to_string()),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use serde_json::json;

    use super::*;
    use crate::endpoint::Endpoint;
    use crate::http::TransportError;
    use crate::types::Game;

    const BASE_URL: &str = "https://api-endpoint.igdb.com";

    /// Replays canned answers and records every request it receives.
    #[derive(Debug, Default)]
    struct FakeTransport {
        answers: RefCell<VecDeque<Result<HttpResponse, TransportError>>>,
        requests: RefCell<Vec<HttpRequest>>,
    }

    impl FakeTransport {
        fn answer(self, status: u16, headers: &[(&str, &str)], body: &str) -> Self {
            self.answers.borrow_mut().push_back(Ok(HttpResponse {
                status,
                headers: headers
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                body: body.to_string(),
            }));
            self
        }

        fn fail(self, message: &str) -> Self {
            self.answers.borrow_mut().push_back(Err(message.into()));
            self
        }

        fn urls(&self) -> Vec<String> {
            self.requests.borrow().iter().map(|r| r.url.clone()).collect()
        }
    }

    impl Transport for FakeTransport {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.requests.borrow_mut().push(request.clone());
            self.answers
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err("no canned answer left".into()))
        }
    }

    fn client(transport: &FakeTransport) -> IgdbClient<&FakeTransport> {
        IgdbClient::new(IgdbConfig::new(format!("{BASE_URL}/"), "secret"), transport).unwrap()
    }

    fn ok_response(headers: &[(&str, &str)], body: &str) -> ApiResponse {
        let raw = HttpResponse {
            status: 200,
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: body.to_string(),
        };
        ApiResponse {
            data: process_response(&raw.body),
            raw,
        }
    }

    #[test]
    fn new_rejects_missing_api_key() {
        let err = IgdbClient::new(IgdbConfig::new(BASE_URL, ""), FakeTransport::default())
            .unwrap_err();
        assert!(matches!(err, IgdbError::Configuration { .. }));
    }

    #[test]
    fn new_rejects_missing_base_url() {
        let err = IgdbClient::new(IgdbConfig::new("", "secret"), FakeTransport::default())
            .unwrap_err();
        assert!(matches!(err, IgdbError::Configuration { .. }));
    }

    #[test]
    fn endpoint_joins_base_url_and_resource() {
        let transport = FakeTransport::default();
        let c = client(&transport);
        assert_eq!(c.base_url(), BASE_URL);
        assert_eq!(c.endpoint("games").unwrap(), format!("{BASE_URL}/games/"));
        assert_eq!(
            c.endpoint(Endpoint::GameModes).unwrap(),
            format!("{BASE_URL}/game_modes/")
        );
    }

    #[test]
    fn endpoint_rejects_unknown_resource() {
        let transport = FakeTransport::default();
        let err = client(&transport).endpoint("not_a_real_resource").unwrap_err();
        assert!(matches!(err, IgdbError::UnknownEndpoint { .. }));
    }

    #[test]
    fn call_api_with_unknown_resource_sends_nothing() {
        let transport = FakeTransport::default();
        let err = client(&transport)
            .call_api("videos_of_cats", &ParameterBuilder::new())
            .unwrap_err();
        assert!(matches!(err, IgdbError::UnknownEndpoint { ref name } if name == "videos_of_cats"));
        assert!(transport.requests.borrow().is_empty());
    }

    #[test]
    fn build_request_sets_key_and_accept_headers() {
        let transport = FakeTransport::default();
        let req = client(&transport)
            .build_request(Endpoint::Games, &ParameterBuilder::new().id(1))
            .unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, format!("{BASE_URL}/games/1?fields=*"));
        assert_eq!(
            req.headers,
            vec![
                ("user-key".to_string(), "secret".to_string()),
                ("Accept".to_string(), "application/json".to_string()),
            ]
        );
    }

    #[test]
    fn games_search_end_to_end() {
        let body = r#"[{"name":"Mass Effect","slug":"mass-effect"}]"#;
        let transport = FakeTransport::default().answer(200, &[], body);
        let params = ParameterBuilder::new()
            .search("mass effect")
            .fields("name")
            .fields("slug");

        let response = client(&transport).games(&params).unwrap();

        assert_eq!(
            transport.urls(),
            vec![format!("{BASE_URL}/games/?fields=name,slug&search=mass%20effect")]
        );
        assert_eq!(
            response.data,
            vec![json!({"name": "Mass Effect", "slug": "mass-effect"})]
        );
        assert_eq!(response.status(), 200);
    }

    #[test]
    fn search_sets_the_term_on_the_builder() {
        let transport = FakeTransport::default().answer(200, &[], "[]");
        let response = client(&transport)
            .search("halo", "characters", ParameterBuilder::new().search("ignored"))
            .unwrap();
        assert!(response.data.is_empty());
        assert_eq!(
            transport.urls(),
            vec![format!("{BASE_URL}/characters/?fields=*&search=halo")]
        );
    }

    #[test]
    fn non_json_body_is_wrapped_in_a_list() {
        let transport = FakeTransport::default().answer(200, &[], "oops");
        let response = client(&transport)
            .call_api(Endpoint::Genres, &ParameterBuilder::new())
            .unwrap();
        assert_eq!(response.data, vec![json!("oops")]);
    }

    #[test]
    fn json_object_body_is_wrapped_in_a_list() {
        assert_eq!(process_response(r#"{"id":1}"#), vec![json!({"id": 1})]);
        assert_eq!(process_response(""), vec![json!("")]);
    }

    #[test]
    fn error_status_with_text_body_keeps_response() {
        let transport = FakeTransport::default().answer(403, &[], "Authentication failed");
        let err = client(&transport)
            .games(&ParameterBuilder::new())
            .unwrap_err();
        assert!(matches!(err, IgdbError::ApiRequest { status: 403, .. }));
        let response = err.response().unwrap();
        assert_eq!(response.body, "Authentication failed");
    }

    #[test]
    fn error_status_with_json_body_is_returned() {
        let body = r#"[{"title":"Syntax Error","status":400}]"#;
        let transport = FakeTransport::default().answer(400, &[], body);
        let response = client(&transport)
            .games(&ParameterBuilder::new().filter("[bogus]"))
            .unwrap();
        assert!(!response.is_success());
        assert_eq!(response.data[0]["title"], "Syntax Error");
    }

    #[test]
    fn transport_failure_is_reported_with_url() {
        let transport = FakeTransport::default().fail("connection refused");
        let err = client(&transport)
            .platforms(&ParameterBuilder::new())
            .unwrap_err();
        match err {
            IgdbError::Transport { url, source } => {
                assert_eq!(url, format!("{BASE_URL}/platforms/?fields=*"));
                assert_eq!(source.to_string(), "connection refused");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn scroll_follows_next_page_header() {
        let transport = FakeTransport::default()
            .answer(
                200,
                &[("x-next-page", "/games/scroll/abc/"), ("x-count", "3")],
                r#"[{"id":1}]"#,
            )
            .answer(200, &[], r#"[{"id":2},{"id":3}]"#);
        let c = client(&transport);

        let first = c
            .games(&ParameterBuilder::new().fields("id").limit(1).enable_scroll())
            .unwrap();
        assert_eq!(first.next_page(), Some("/games/scroll/abc/"));
        assert_eq!(c.scroll_count(&first).unwrap(), 3);

        let second = c.scroll(&first).unwrap();
        assert_eq!(second.data, vec![json!({"id": 2}), json!({"id": 3})]);
        assert_eq!(
            transport.urls(),
            vec![
                format!("{BASE_URL}/games/?fields=id&limit=1&scroll=1"),
                format!("{BASE_URL}/games/scroll/abc/"),
            ]
        );
        assert_eq!(transport.requests.borrow()[1].headers[0].1, "secret");

        let err = c.scroll(&second).unwrap_err();
        assert!(err.is_end_of_scroll());
    }

    #[test]
    fn scroll_without_header_sends_nothing() {
        let transport = FakeTransport::default();
        let previous = ok_response(&[], "[]");
        let err = client(&transport).scroll(&previous).unwrap_err();
        assert!(matches!(err, IgdbError::ScrollHeaderNotFound { ref header } if header == SCROLL_NEXT_PAGE));
        assert!(transport.requests.borrow().is_empty());
    }

    #[test]
    fn scroll_resumes_from_saved_path() {
        let transport = FakeTransport::default()
            .answer(200, &[("X-Next-Page", "/games/scroll/abc/")], r#"[{"id":2}]"#)
            .answer(200, &[], r#"[{"id":3}]"#);
        let c = client(&transport);

        let saved = "/games/scroll/abc/".to_string();
        let second = c.scroll_path(&saved).unwrap();
        assert_eq!(second.data, vec![json!({"id": 2})]);

        let next = second.next_page().unwrap().to_owned();
        drop(second);
        let third = c.scroll_path(&next).unwrap();
        assert_eq!(third.data, vec![json!({"id": 3})]);

        assert_eq!(
            transport.urls(),
            vec![
                format!("{BASE_URL}/games/scroll/abc/"),
                format!("{BASE_URL}/games/scroll/abc/"),
            ]
        );
        assert_eq!(transport.requests.borrow()[0].headers[0].1, "secret");
    }

    #[test]
    fn scroll_path_without_leading_slash_is_joined() {
        let transport = FakeTransport::default();
        let req = client(&transport)
            .build_scroll_request_from_path("games/scroll/abc/")
            .unwrap();
        assert_eq!(req.url, format!("{BASE_URL}/games/scroll/abc/"));
    }

    #[test]
    fn blank_scroll_path_sends_nothing() {
        let transport = FakeTransport::default();
        let err = client(&transport).scroll_path("  ").unwrap_err();
        assert!(err.is_end_of_scroll());
        assert!(transport.requests.borrow().is_empty());
    }

    #[test]
    fn scroll_count_requires_header() {
        let transport = FakeTransport::default();
        let err = client(&transport)
            .scroll_count(&ok_response(&[], "[]"))
            .unwrap_err();
        assert!(matches!(err, IgdbError::ScrollHeaderNotFound { ref header } if header == SCROLL_COUNT));
    }

    #[test]
    fn scroll_count_rejects_non_numbers() {
        let transport = FakeTransport::default();
        let err = client(&transport)
            .scroll_count(&ok_response(&[("X-Count", "many")], "[]"))
            .unwrap_err();
        assert!(matches!(err, IgdbError::InvalidScrollCount { ref value, .. } if value == "many"));
    }

    #[test]
    fn scroll_header_reads_any_header() {
        let previous = ok_response(&[("X-Next-Page", "/pulses/scroll/x/")], "[]");
        assert_eq!(
            scroll_header(&previous.raw, "x-next-page").unwrap(),
            "/pulses/scroll/x/"
        );
        assert!(scroll_header(&previous.raw, "X-Count").is_err());
    }

    #[test]
    fn fetch_deserializes_games() {
        let body = r#"[{"id":1,"name":"Thief II","slug":"thief-ii","cover":{"cloudinary_id":"abc"}}]"#;
        let transport = FakeTransport::default().answer(200, &[], body);
        let games: Vec<Game> = client(&transport)
            .fetch(Endpoint::Games, &ParameterBuilder::new().id(1))
            .unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].slug, "thief-ii");
        assert_eq!(
            games[0].cover_url("t_thumb").as_deref(),
            Some("https://images.igdb.com/igdb/image/upload/t_thumb/abc.png")
        );
    }

    #[test]
    fn fetch_reports_shape_mismatch() {
        let transport = FakeTransport::default().answer(200, &[], "oops");
        let err = client(&transport)
            .fetch::<Game>(Endpoint::Games, &ParameterBuilder::new())
            .unwrap_err();
        assert!(matches!(err, IgdbError::Deserialize { .. }));
    }
}
