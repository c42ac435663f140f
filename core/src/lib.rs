//! Query builder and blocking client for the IGDB REST API.
//!
//! # Overview
//! `ParameterBuilder` collects query options (fields, filters, ids, paging,
//! search, scroll) and renders them in the IGDB dialect. `IgdbClient`
//! resolves a resource name against the fixed `Endpoint` table, sends the
//! request through a `Transport` and decodes the JSON body.
//!
//! # Design
//! - Requests and responses are plain data (`HttpRequest`, `HttpResponse`);
//!   the network lives behind `Transport`, with `UreqTransport` as default.
//! - Calls return an `ApiResponse` pairing the decoded body with the raw
//!   response. Scroll pagination takes that value back, so the client holds
//!   no "last response" and can be shared.
//! - Bodies that are not JSON are wrapped into a one-element list instead of
//!   failing; see [`client::process_response`].

pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod params;
pub mod types;

pub use client::{
    process_response, scroll_header, ApiResponse, IgdbClient, SCROLL_COUNT, SCROLL_NEXT_PAGE,
};
pub use config::IgdbConfig;
pub use endpoint::{Endpoint, IntoEndpoint};
pub use error::{IgdbError, IgdbResult};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError, UreqTransport};
pub use params::ParameterBuilder;
pub use types::{Cover, Game};
