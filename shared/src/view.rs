use serde::{Deserialize, Serialize};

use crate::config::MapConfig;
use crate::form::{CityPhase, ContactInfo, RegistrationForm, Section, SubmitState};
use crate::model::{Model, Page};
use crate::router::Route;
use crate::{AppError, ErrorSeverity, NONE_SELECTED};

pub const REGION_PLACEHOLDER: &str = "Selecione uma UF";
pub const CITY_PLACEHOLDER: &str = "Selecione uma Cidade";
pub const SUCCESS_MESSAGE: &str = "Ponto de coleta cadastrado com sucesso!";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserFacingError {
    pub message: String,
    pub is_transient: bool,
    pub is_retryable: bool,
    pub error_code: String,
}

impl From<&AppError> for UserFacingError {
    fn from(e: &AppError) -> Self {
        Self {
            message: e.user_facing_message(),
            is_transient: e.severity == ErrorSeverity::Transient,
            is_retryable: e.is_retryable(),
            error_code: e.code().to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ViewModel {
    pub page: PageView,
    pub error: Option<UserFacingError>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum PageView {
    /// Shown while the shell loads the page module.
    Loading { route: Route },
    Home(HomeView),
    CreatePoint(Box<FormView>),
    NotFound,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HomeView {
    pub create_point_path: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct OptionView {
    pub value: String,
    pub label: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemView {
    pub id: u32,
    pub title: String,
    pub image_url: String,
    pub selected: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MapView {
    pub center_lat: f64,
    pub center_lng: f64,
    pub zoom: f64,
    pub marker_lat: Option<f64>,
    pub marker_lng: Option<f64>,
    pub tile_url: String,
    pub attribution: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileView {
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NoticeView {
    pub section: Section,
    pub error: UserFacingError,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldErrorView {
    pub field: String,
    pub message: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct OverlayView {
    pub visible: bool,
    pub message: String,
    pub redirect_path: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FormView {
    pub items: Vec<ItemView>,
    /// Region options, led by the "nothing selected" placeholder.
    pub regions: Vec<OptionView>,
    pub cities: Vec<OptionView>,
    pub selected_region: String,
    pub selected_city: String,
    pub city_phase: CityPhase,
    pub contact: ContactInfo,
    pub map: MapView,
    pub file: Option<FileView>,
    pub notices: Vec<NoticeView>,
    pub field_errors: Vec<FieldErrorView>,
    pub is_submitting: bool,
    pub submit_error: Option<UserFacingError>,
    pub overlay: OverlayView,
}

impl FormView {
    #[must_use]
    pub fn build(form: &RegistrationForm, map: &MapConfig) -> Self {
        let placeholder = |label: &str| OptionView {
            value: NONE_SELECTED.to_string(),
            label: label.to_string(),
        };

        let regions = std::iter::once(placeholder(REGION_PLACEHOLDER))
            .chain(form.regions.iter().map(|r| OptionView {
                value: r.code.clone(),
                label: format!("{} - ({})", r.name, r.code),
            }))
            .collect();

        let cities = std::iter::once(placeholder(CITY_PLACEHOLDER))
            .chain(form.cities.iter().map(|c| OptionView {
                value: c.name.clone(),
                label: c.name.clone(),
            }))
            .collect();

        let items = form
            .items
            .iter()
            .map(|item| ItemView {
                id: item.id,
                title: item.title.clone(),
                image_url: item.image_url.clone(),
                selected: form.selected_items.contains(item.id),
            })
            .collect();

        let submit_error = match &form.submit {
            SubmitState::Failed(e) => Some(UserFacingError::from(e)),
            SubmitState::Idle | SubmitState::Submitting | SubmitState::Succeeded => None,
        };

        let overlay = form.overlay.state();

        Self {
            items,
            regions,
            cities,
            selected_region: form.selected_region.as_str().to_string(),
            selected_city: form.selected_city.as_str().to_string(),
            city_phase: form.city_phase(),
            contact: form.contact.clone(),
            map: MapView {
                center_lat: form.initial_position.lat(),
                center_lng: form.initial_position.lng(),
                zoom: map.zoom,
                marker_lat: form.selected_position.map(|p| p.lat()),
                marker_lng: form.selected_position.map(|p| p.lng()),
                tile_url: map.tile_url.clone(),
                attribution: map.attribution.clone(),
            },
            file: form.selected_file.as_ref().map(|f| FileView {
                file_name: f.file_name.clone(),
                mime_type: f.mime_type.clone(),
                size_bytes: f.size_bytes(),
            }),
            notices: form
                .notices
                .iter()
                .map(|(section, e)| NoticeView {
                    section: *section,
                    error: UserFacingError::from(e),
                })
                .collect(),
            field_errors: form
                .field_errors
                .iter()
                .map(|e| FieldErrorView {
                    field: e.field().to_string(),
                    message: e.to_string(),
                })
                .collect(),
            is_submitting: form.is_submitting(),
            submit_error,
            overlay: OverlayView {
                visible: overlay.visible,
                message: SUCCESS_MESSAGE.to_string(),
                redirect_path: overlay.redirect.path().to_string(),
            },
        }
    }
}

impl ViewModel {
    #[must_use]
    pub fn build(model: &Model) -> Self {
        let page = match &model.page {
            Page::Loading(route) => PageView::Loading { route: *route },
            Page::Home => PageView::Home(HomeView {
                create_point_path: Route::CreatePoint.path().to_string(),
            }),
            Page::CreatePoint(form) => {
                PageView::CreatePoint(Box::new(FormView::build(form, &model.config.map)))
            }
            Page::NotFound => PageView::NotFound,
        };

        Self {
            page,
            error: model.active_error.as_ref().map(UserFacingError::from),
        }
    }
}
