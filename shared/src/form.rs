//! State and transitions of the collection-point registration form.
//!
//! Everything here is synchronous and effect-free; the app update loop calls
//! these transitions and issues whatever requests they ask for.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::api::{CatalogItem, City, Region};
use crate::model::{Coordinate, Selection, SelectionError};
use crate::multipart::MultipartForm;
use crate::overlay::{Overlay, OverlayProps};
use crate::router::Route;
use crate::upload::SelectedFile;
use crate::{AppError, AppResult, MAX_CONTACT_FIELD_LENGTH};

/// Where a successful registration sends the user.
pub const SUCCESS_REDIRECT: Route = Route::Home;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactField {
    Name,
    Email,
    Whatsapp,
}

impl ContactField {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Whatsapp => "whatsapp",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub name: String,
    pub email: String,
    pub whatsapp: String,
}

impl ContactInfo {
    pub fn set(&mut self, field: ContactField, value: String) {
        let slot = match field {
            ContactField::Name => &mut self.name,
            ContactField::Email => &mut self.email,
            ContactField::Whatsapp => &mut self.whatsapp,
        };
        *slot = value;
    }
}

/// Item ids chosen by the user, unique and kept in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectedItems(Vec<u32>);

impl SelectedItems {
    /// Adds `id` if absent, removes it if present. Returns whether `id` is
    /// selected afterwards.
    pub fn toggle(&mut self, id: u32) -> bool {
        if let Some(pos) = self.0.iter().position(|&i| i == id) {
            self.0.remove(pos);
            false
        } else {
            self.0.push(id);
            true
        }
    }

    #[must_use]
    pub fn contains(&self, id: u32) -> bool {
        self.0.contains(&id)
    }

    #[must_use]
    pub fn ids(&self) -> &[u32] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Comma-separated ids, e.g. `"3,7"`.
    #[must_use]
    pub fn joined(&self) -> String {
        self.0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CityPhase {
    NoRegion,
    CitiesLoading,
    CitiesReady,
}

/// Form sections that can carry a non-fatal inline notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Image,
    Map,
    Regions,
    Cities,
}

#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldError {
    #[error("Enter the entity name")]
    NameRequired,
    #[error("Enter an email address")]
    EmailRequired,
    #[error("Enter a valid email address")]
    EmailInvalid,
    #[error("Enter a WhatsApp number")]
    WhatsappRequired,
    #[error("{field} is too long (maximum {max} characters)")]
    TooLong { field: String, max: usize },
    #[error("Select a state (UF)")]
    RegionRequired,
    #[error("Select a city")]
    CityRequired,
    #[error("Pick the collection point on the map")]
    PositionRequired,
    #[error("Select at least one collection item")]
    ItemsRequired,
}

impl FieldError {
    /// Name of the form field the error belongs to.
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::NameRequired => "name",
            Self::EmailRequired | Self::EmailInvalid => "email",
            Self::WhatsappRequired => "whatsapp",
            Self::TooLong { field, .. } => field,
            Self::RegionRequired => "uf",
            Self::CityRequired => "city",
            Self::PositionRequired => "position",
            Self::ItemsRequired => "items",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitState {
    Idle,
    Submitting,
    Failed(AppError),
    /// Registered; the form stays read-only until the page is left.
    Succeeded,
}

/// What the caller must do after a region change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionChange {
    Cleared,
    FetchCities { region: String, token: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CitiesOutcome {
    Applied,
    Failed,
    Stale,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitBlocked {
    InFlight,
    AlreadyRegistered,
    Invalid(Vec<FieldError>),
}

/// Field values of one registration, in the backend's field names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointSubmission {
    pub name: String,
    pub email: String,
    pub whatsapp: String,
    pub uf: String,
    pub city: String,
    pub latitude: String,
    pub longitude: String,
    pub items: String,
    pub image: Option<SelectedFile>,
}

impl PointSubmission {
    #[must_use]
    pub fn into_multipart(self, form: MultipartForm) -> MultipartForm {
        let form = form
            .text("name", self.name)
            .text("email", self.email)
            .text("whatsapp", self.whatsapp)
            .text("uf", self.uf)
            .text("city", self.city)
            .text("latitude", self.latitude)
            .text("longitude", self.longitude)
            .text("items", self.items);

        match self.image {
            Some(file) => form.file("image", file.file_name, file.mime_type, file.bytes),
            None => form,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegistrationForm {
    pub items: Vec<CatalogItem>,
    pub regions: Vec<Region>,
    pub cities: Vec<City>,

    pub contact: ContactInfo,
    pub selected_region: Selection,
    pub selected_city: Selection,
    /// Map centre, seeded once from the device position.
    pub initial_position: Coordinate,
    /// Marker position; `None` until the user clicks the map.
    pub selected_position: Option<Coordinate>,
    pub selected_items: SelectedItems,
    pub selected_file: Option<SelectedFile>,

    city_request_token: u64,
    pending_city_request: Option<u64>,

    pub notices: BTreeMap<Section, AppError>,
    pub field_errors: Vec<FieldError>,
    pub submit: SubmitState,
    pub show_success: bool,
    pub overlay: Overlay,
}

impl Default for RegistrationForm {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            regions: Vec::new(),
            cities: Vec::new(),
            contact: ContactInfo::default(),
            selected_region: Selection::None,
            selected_city: Selection::None,
            initial_position: Coordinate::default(),
            selected_position: None,
            selected_items: SelectedItems::default(),
            selected_file: None,
            city_request_token: 0,
            pending_city_request: None,
            notices: BTreeMap::new(),
            field_errors: Vec::new(),
            submit: SubmitState::Idle,
            show_success: false,
            overlay: Overlay::new(OverlayProps::hidden(SUCCESS_REDIRECT)),
        }
    }
}

impl RegistrationForm {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_items(&mut self, result: AppResult<Vec<CatalogItem>>) {
        match result {
            Ok(items) => {
                debug!(count = items.len(), "catalog items loaded");
                self.items = items;
            }
            Err(e) => {
                warn!(error = %e, "failed to load catalog items");
            }
        }
    }

    pub fn set_regions(&mut self, result: AppResult<Vec<Region>>) {
        match result {
            Ok(regions) => {
                debug!(count = regions.len(), "regions loaded");
                self.regions = regions;
                self.notices.remove(&Section::Regions);
            }
            Err(e) => {
                warn!(error = %e, "failed to load regions");
                self.notices.insert(Section::Regions, e);
            }
        }
    }

    /// Selects a region. The selected city is always reset. Picking the
    /// sentinel empties the city list at once; any other value keeps the
    /// current list until the fetch identified by the returned token lands.
    pub fn change_region(&mut self, raw: &str) -> Result<RegionChange, SelectionError> {
        let selection = Selection::parse(raw)?;

        self.selected_city = Selection::None;
        self.city_request_token += 1;
        let token = self.city_request_token;

        let change = match &selection {
            Selection::None => {
                self.cities.clear();
                self.pending_city_request = None;
                self.notices.remove(&Section::Cities);
                RegionChange::Cleared
            }
            Selection::Value(region) => {
                self.pending_city_request = Some(token);
                RegionChange::FetchCities {
                    region: region.clone(),
                    token,
                }
            }
        };

        self.selected_region = selection;
        Ok(change)
    }

    /// Applies a city-list response. Only the response to the latest region
    /// change is accepted.
    pub fn apply_cities(&mut self, token: u64, result: AppResult<Vec<City>>) -> CitiesOutcome {
        if self.pending_city_request != Some(token) {
            debug!(token, latest = self.city_request_token, "discarding stale city list");
            return CitiesOutcome::Stale;
        }
        self.pending_city_request = None;

        match result {
            Ok(cities) => {
                debug!(count = cities.len(), "cities loaded");
                self.cities = cities;
                self.notices.remove(&Section::Cities);
                CitiesOutcome::Applied
            }
            Err(e) => {
                warn!(error = %e, "failed to load cities");
                // The old list belongs to the previous region.
                self.cities.clear();
                self.notices.insert(Section::Cities, e);
                CitiesOutcome::Failed
            }
        }
    }

    /// Token of the city request still awaiting a response.
    #[must_use]
    pub const fn pending_city_token(&self) -> Option<u64> {
        self.pending_city_request
    }

    #[must_use]
    pub fn city_phase(&self) -> CityPhase {
        if self.selected_region.is_none() {
            CityPhase::NoRegion
        } else if self.pending_city_request.is_some() {
            CityPhase::CitiesLoading
        } else {
            CityPhase::CitiesReady
        }
    }

    pub fn change_city(&mut self, raw: &str) -> Result<(), SelectionError> {
        self.selected_city = Selection::parse(raw)?;
        Ok(())
    }

    pub fn set_contact_field(&mut self, field: ContactField, value: String) {
        self.contact.set(field, value);
        self.field_errors.retain(|e| e.field() != field.as_str());
    }

    pub fn click_map(&mut self, position: Coordinate) {
        self.selected_position = Some(position);
        self.field_errors.retain(|e| *e != FieldError::PositionRequired);
    }

    pub fn set_initial_position(&mut self, result: AppResult<Coordinate>) {
        match result {
            Ok(position) => {
                self.initial_position = position;
                self.notices.remove(&Section::Map);
            }
            Err(e) => {
                warn!(error = %e, "device position unavailable");
                self.notices.insert(Section::Map, e);
            }
        }
    }

    pub fn toggle_item(&mut self, id: u32) -> bool {
        let selected = self.selected_items.toggle(id);
        if !self.selected_items.is_empty() {
            self.field_errors.retain(|e| *e != FieldError::ItemsRequired);
        }
        selected
    }

    pub fn select_file(&mut self, result: AppResult<SelectedFile>) {
        match result {
            Ok(file) => {
                self.selected_file = Some(file);
                self.notices.remove(&Section::Image);
            }
            Err(e) => {
                self.notices.insert(Section::Image, e);
            }
        }
    }

    pub fn dismiss_notice(&mut self, section: Section) {
        self.notices.remove(&section);
    }

    #[must_use]
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        let name = self.contact.name.trim();
        let email = self.contact.email.trim();
        let whatsapp = self.contact.whatsapp.trim();

        if name.is_empty() {
            errors.push(FieldError::NameRequired);
        }
        if email.is_empty() {
            errors.push(FieldError::EmailRequired);
        } else if !looks_like_email(email) {
            errors.push(FieldError::EmailInvalid);
        }
        if whatsapp.is_empty() {
            errors.push(FieldError::WhatsappRequired);
        }
        for (field, value) in [
            (ContactField::Name, name),
            (ContactField::Email, email),
            (ContactField::Whatsapp, whatsapp),
        ] {
            if value.chars().count() > MAX_CONTACT_FIELD_LENGTH {
                errors.push(FieldError::TooLong {
                    field: field.as_str().to_string(),
                    max: MAX_CONTACT_FIELD_LENGTH,
                });
            }
        }
        if self.selected_region.is_none() {
            errors.push(FieldError::RegionRequired);
        }
        if !self.city_is_listed() {
            errors.push(FieldError::CityRequired);
        }
        if self.selected_position.is_none() {
            errors.push(FieldError::PositionRequired);
        }
        if self.selected_items.is_empty() {
            errors.push(FieldError::ItemsRequired);
        }

        errors
    }

    // The selected city must come from the list loaded for the selected region.
    fn city_is_listed(&self) -> bool {
        self.city_phase() == CityPhase::CitiesReady
            && self
                .selected_city
                .value()
                .is_some_and(|name| self.cities.iter().any(|c| c.name == name))
    }

    /// Validates and snapshots the form for submission, moving it to
    /// `Submitting`. Nothing is sent when this returns an error.
    pub fn begin_submit(&mut self) -> Result<PointSubmission, SubmitBlocked> {
        match self.submit {
            SubmitState::Submitting => return Err(SubmitBlocked::InFlight),
            SubmitState::Succeeded => return Err(SubmitBlocked::AlreadyRegistered),
            SubmitState::Idle | SubmitState::Failed(_) => {}
        }

        let errors = self.validate();
        if !errors.is_empty() {
            self.field_errors.clone_from(&errors);
            return Err(SubmitBlocked::Invalid(errors));
        }
        self.field_errors.clear();

        let position = self.selected_position.unwrap_or_default();
        let submission = PointSubmission {
            name: self.contact.name.trim().to_string(),
            email: self.contact.email.trim().to_string(),
            whatsapp: self.contact.whatsapp.trim().to_string(),
            uf: self.selected_region.as_str().to_string(),
            city: self.selected_city.as_str().to_string(),
            latitude: position.latitude_field(),
            longitude: position.longitude_field(),
            items: self.selected_items.joined(),
            image: self.selected_file.clone(),
        };

        self.submit = SubmitState::Submitting;
        Ok(submission)
    }

    pub fn finish_submit(&mut self, result: AppResult<()>) {
        match result {
            Ok(()) => {
                self.submit = SubmitState::Succeeded;
                self.show_success = true;
                let props = self.overlay_props();
                self.overlay.observe(props);
            }
            Err(e) => {
                warn!(error = %e, "registration failed");
                self.submit = SubmitState::Failed(e);
            }
        }
    }

    #[must_use]
    pub const fn overlay_props(&self) -> OverlayProps {
        OverlayProps {
            visible: self.show_success,
            redirect: SUCCESS_REDIRECT,
        }
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.submit == SubmitState::Submitting
    }
}

fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    }
}
