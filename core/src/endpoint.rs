//! The fixed set of IGDB resources the client may query.
//!
//! One table drives the `Endpoint` enum, its name mapping and the
//! per-resource convenience methods on `IgdbClient`.

use std::fmt;
use std::str::FromStr;

use crate::client::{ApiResponse, IgdbClient};
use crate::error::{IgdbError, IgdbResult};
use crate::http::Transport;
use crate::params::ParameterBuilder;

macro_rules! endpoints {
    ($($variant:ident => $name:literal, $method:ident;)+) => {
        /// A known IGDB resource collection.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Endpoint {
            $($variant,)+
        }

        impl Endpoint {
            /// Every known resource, in table order.
            pub const ALL: &'static [Endpoint] = &[$(Endpoint::$variant,)+];

            /// Path segment of the resource, e.g. `"game_modes"`.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Endpoint::$variant => $name,)+
                }
            }
        }

        impl FromStr for Endpoint {
            type Err = IgdbError;

            fn from_str(name: &str) -> Result<Self, Self::Err> {
                match name {
                    $($name => Ok(Endpoint::$variant),)+
                    _ => Err(IgdbError::UnknownEndpoint {
                        name: name.to_string(),
                    }),
                }
            }
        }

        impl<T: Transport> IgdbClient<T> {
            $(
                #[doc = concat!("Query the `/", $name, "/` endpoint.")]
                pub fn $method(&self, params: &ParameterBuilder) -> IgdbResult<ApiResponse> {
                    self.call_api(Endpoint::$variant, params)
                }
            )+
        }
    };
}

endpoints! {
    Achievements => "achievements", achievements;
    Characters => "characters", characters;
    Collections => "collections", collections;
    Companies => "companies", companies;
    Credits => "credits", credits;
    ExternalReviews => "external_reviews", external_reviews;
    ExternalReviewSources => "external_review_sources", external_review_sources;
    Feeds => "feeds", feeds;
    Franchises => "franchises", franchises;
    Games => "games", games;
    GameEngines => "game_engines", game_engines;
    GameModes => "game_modes", game_modes;
    Genres => "genres", genres;
    Keywords => "keywords", keywords;
    Pages => "pages", pages;
    People => "people", people;
    Platforms => "platforms", platforms;
    PlayTimes => "play_times", play_times;
    PlayerPerspectives => "player_perspectives", player_perspectives;
    Pulses => "pulses", pulses;
    PulseGroups => "pulse_groups", pulse_groups;
    PulseSources => "pulse_sources", pulse_sources;
    ReleaseDates => "release_dates", release_dates;
    Reviews => "reviews", reviews;
    Themes => "themes", themes;
    Titles => "titles", titles;
    Me => "me", me;
    GameVersions => "game_versions", game_versions;
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything `IgdbClient::call_api` accepts as a resource selector.
///
/// Typed `Endpoint`s always resolve; raw names are checked against the table.
pub trait IntoEndpoint {
    fn into_endpoint(self) -> IgdbResult<Endpoint>;
}

impl IntoEndpoint for Endpoint {
    fn into_endpoint(self) -> IgdbResult<Endpoint> {
        Ok(self)
    }
}

impl IntoEndpoint for &str {
    fn into_endpoint(self) -> IgdbResult<Endpoint> {
        self.parse()
    }
}

impl IntoEndpoint for &String {
    fn into_endpoint(self) -> IgdbResult<Endpoint> {
        self.parse()
    }
}
