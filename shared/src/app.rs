use tracing::{debug, info, warn};

use crate::api::{self, CatalogItem, City, Region};
use crate::capabilities::{Capabilities, PositionOptions};
use crate::event::Event;
use crate::form::{RegionChange, RegistrationForm, SubmitBlocked};
use crate::model::{Coordinate, Model, Page};
use crate::multipart::MultipartForm;
use crate::router::Route;
use crate::upload::SelectedFile;
use crate::view::ViewModel;
use crate::AppError;

#[derive(Default)]
pub struct App;

impl App {
    fn navigate(route: Route, model: &mut Model) {
        if model.page.route() == Some(route) {
            debug!(%route, "already on route");
            return;
        }
        info!(%route, "navigating");
        model.page = Page::Loading(route);
    }

    fn mount(route: Route, model: &mut Model, caps: &Capabilities) {
        match route {
            Route::Home => model.page = Page::Home,
            Route::CreatePoint => {
                model.page = Page::CreatePoint(Box::new(RegistrationForm::new()));
                Self::load_form_data(model, caps);
            }
        }
    }

    // Items, regions and device position are requested independently; any of
    // them may fail without affecting the others.
    fn load_form_data(model: &mut Model, caps: &Capabilities) {
        match model.config.items_url() {
            Ok(url) => caps
                .http
                .get(url.as_str())
                .expect_json::<Vec<CatalogItem>>()
                .send(|r| Event::ItemsFetched(api::decode_json(r))),
            Err(e) => model.set_error(e.into()),
        }

        match model.config.regions_url() {
            Ok(url) => caps
                .http
                .get(url.as_str())
                .expect_json::<Vec<Region>>()
                .send(|r| Event::RegionsFetched(api::decode_json(r))),
            Err(e) => model.set_error(e.into()),
        }

        caps.geolocation
            .current_position(PositionOptions::default(), Event::PositionResolved);
    }

    fn update_form(event: Event, model: &mut Model, caps: &Capabilities) {
        let Model { config, page, .. } = model;
        let Page::CreatePoint(form) = page else {
            debug!(event = event.name(), "ignoring form event outside the registration page");
            return;
        };

        match event {
            Event::RegionChanged { value } => match form.change_region(&value) {
                Ok(RegionChange::Cleared) => {}
                Ok(RegionChange::FetchCities { region, token }) => match config.cities_url(&region) {
                    Ok(url) => caps
                        .http
                        .get(url.as_str())
                        .expect_json::<Vec<City>>()
                        .send(move |r| Event::CitiesFetched {
                            token,
                            result: api::decode_json(r),
                        }),
                    Err(e) => {
                        form.apply_cities(token, Err(e.into()));
                    }
                },
                Err(e) => warn!(error = %e, "ignoring region selection"),
            },

            Event::CityChanged { value } => {
                if let Err(e) = form.change_city(&value) {
                    warn!(error = %e, "ignoring city selection");
                }
            }

            Event::ContactFieldChanged { field, value } => form.set_contact_field(field, value),

            Event::MapClicked { lat, lng } => match Coordinate::new(lat, lng) {
                Ok(position) => form.click_map(position),
                Err(e) => warn!(error = %e, "ignoring map click"),
            },

            Event::ItemToggled { id } => {
                let selected = form.toggle_item(id);
                debug!(id, selected, "item toggled");
            }

            Event::FileSelected { file_name, bytes } => {
                form.select_file(SelectedFile::inspect(&file_name, bytes).map_err(AppError::from));
            }

            Event::SubmitRequested => match form.begin_submit() {
                Ok(submission) => match config.points_url() {
                    Ok(url) => {
                        let multipart = submission.into_multipart(MultipartForm::new());
                        let content_type = multipart.content_type();
                        info!(has_image = multipart.has_file("image"), "submitting registration");
                        caps.http
                            .post(url.as_str())
                            .body_bytes(multipart.into_body())
                            .header("Content-Type", content_type.as_str())
                            .send(|r| Event::PointSubmitted(api::decode_status(r)));
                    }
                    Err(e) => form.finish_submit(Err(e.into())),
                },
                Err(SubmitBlocked::InFlight) => debug!("registration already in flight"),
                Err(SubmitBlocked::AlreadyRegistered) => debug!("point already registered"),
                Err(SubmitBlocked::Invalid(errors)) => {
                    debug!(count = errors.len(), "registration blocked by validation");
                }
            },

            Event::NoticeDismissed { section } => form.dismiss_notice(section),

            Event::ItemsFetched(result) => form.set_items(result),
            Event::RegionsFetched(result) => form.set_regions(result),
            Event::CitiesFetched { token, result } => {
                let outcome = form.apply_cities(token, result);
                debug!(token, ?outcome, "city list response");
            }
            Event::PositionResolved(result) => form.set_initial_position(
                result
                    .map_err(AppError::from)
                    .and_then(Coordinate::try_from),
            ),
            Event::PointSubmitted(result) => form.finish_submit(result),

            Event::Configure(_)
            | Event::Navigate { .. }
            | Event::PageLoaded { .. }
            | Event::ErrorDismissed
            | Event::OverlayDismissed => {}
        }
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        let event_name = event.name();
        if event.is_user_initiated() {
            info!(event = event_name, "user action");
        } else {
            debug!(event = event_name, "event");
        }

        match event {
            Event::Configure(config) => match config.validate() {
                Ok(()) => {
                    model.config = config;
                    model.clear_error();
                }
                Err(e) => {
                    warn!(error = %e, "rejected configuration");
                    model.set_error(e.into());
                }
            },

            Event::Navigate { path } => match Route::from_path(&path) {
                Some(route) => Self::navigate(route, model),
                None => {
                    info!(%path, "no route matches path");
                    model.page = Page::NotFound;
                }
            },

            Event::PageLoaded { route } => {
                if matches!(model.page, Page::Loading(pending) if pending == route) {
                    Self::mount(route, model, caps);
                } else {
                    debug!(%route, "ignoring stale page load");
                }
            }

            Event::ErrorDismissed => model.clear_error(),

            Event::OverlayDismissed => {
                let target = model
                    .form_mut()
                    .filter(|form| form.overlay.is_visible())
                    .map(|form| form.overlay.dismiss());

                match target {
                    Some(route) => {
                        caps.navigator.push(route);
                        Self::navigate(route, model);
                    }
                    None => debug!("no overlay to dismiss"),
                }
            }

            form_event => Self::update_form(form_event, model, caps),
        }

        caps.render.render();
    }

    fn view(&self, model: &Model) -> ViewModel {
        ViewModel::build(model)
    }
}
