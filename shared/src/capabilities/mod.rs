mod geolocation;
mod navigation;

pub use self::geolocation::{
    Geolocation, GeolocationError, GeolocationOperation, GeolocationResult, Position,
    PositionOptions,
};
pub use self::navigation::{NavigationOperation, Navigator};

pub use crux_core::render::Render;
pub use crux_http::Http;

use crate::app::App;
use crate::event::Event;

#[derive(crux_core::macros::Effect)]
#[effect(app = "App")]
pub struct Capabilities {
    pub http: Http<Event>,
    pub render: Render<Event>,
    pub geolocation: Geolocation<Event>,
    pub navigator: Navigator<Event>,
}
