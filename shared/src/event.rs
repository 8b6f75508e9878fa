use serde::{Deserialize, Serialize};

use crate::api::{CatalogItem, City, Region};
use crate::capabilities::GeolocationResult;
use crate::config::Config;
use crate::form::{ContactField, Section};
use crate::router::Route;
use crate::AppResult;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Event {
    // Shell lifecycle & routing
    Configure(Config),
    Navigate {
        path: String,
    },
    /// The shell finished loading the page module for `route`.
    PageLoaded {
        route: Route,
    },
    ErrorDismissed,

    // Registration form
    RegionChanged {
        value: String,
    },
    CityChanged {
        value: String,
    },
    ContactFieldChanged {
        field: ContactField,
        value: String,
    },
    MapClicked {
        lat: f64,
        lng: f64,
    },
    ItemToggled {
        id: u32,
    },
    FileSelected {
        file_name: String,
        #[serde(with = "serde_bytes")]
        bytes: Vec<u8>,
    },
    SubmitRequested,
    OverlayDismissed,
    NoticeDismissed {
        section: Section,
    },

    // Capability responses
    #[serde(skip)]
    ItemsFetched(AppResult<Vec<CatalogItem>>),
    #[serde(skip)]
    RegionsFetched(AppResult<Vec<Region>>),
    #[serde(skip)]
    CitiesFetched {
        token: u64,
        result: AppResult<Vec<City>>,
    },
    #[serde(skip)]
    PositionResolved(GeolocationResult),
    #[serde(skip)]
    PointSubmitted(AppResult<()>),
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Configure(_) => "configure",
            Self::Navigate { .. } => "navigate",
            Self::PageLoaded { .. } => "page_loaded",
            Self::ErrorDismissed => "error_dismissed",
            Self::RegionChanged { .. } => "region_changed",
            Self::CityChanged { .. } => "city_changed",
            Self::ContactFieldChanged { .. } => "contact_field_changed",
            Self::MapClicked { .. } => "map_clicked",
            Self::ItemToggled { .. } => "item_toggled",
            Self::FileSelected { .. } => "file_selected",
            Self::SubmitRequested => "submit_requested",
            Self::OverlayDismissed => "overlay_dismissed",
            Self::NoticeDismissed { .. } => "notice_dismissed",
            Self::ItemsFetched(_) => "items_fetched",
            Self::RegionsFetched(_) => "regions_fetched",
            Self::CitiesFetched { .. } => "cities_fetched",
            Self::PositionResolved(_) => "position_resolved",
            Self::PointSubmitted(_) => "point_submitted",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::Navigate { .. }
                | Self::ErrorDismissed
                | Self::RegionChanged { .. }
                | Self::CityChanged { .. }
                | Self::ContactFieldChanged { .. }
                | Self::MapClicked { .. }
                | Self::ItemToggled { .. }
                | Self::FileSelected { .. }
                | Self::SubmitRequested
                | Self::OverlayDismissed
                | Self::NoticeDismissed { .. }
        )
    }
}
