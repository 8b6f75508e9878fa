use assert_matches::assert_matches;
use crux_core::testing::AppTester;
use crux_http::protocol::{HttpResponse, HttpResult};
use serde_json::json;
use shared::api::{CatalogItem, City, Region};
use shared::capabilities::{GeolocationError, GeolocationOperation, NavigationOperation, Position};
use shared::form::{CityPhase, ContactField, Section};
use shared::model::Page;
use shared::view::PageView;
use shared::{App, Effect, ErrorKind, Event, Model, Route};

fn http_calls(effects: &[Effect]) -> Vec<(String, String)> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::Http(request) => Some((request.operation.method.clone(), request.operation.url.clone())),
            _ => None,
        })
        .collect()
}

fn catalog() -> Vec<CatalogItem> {
    [(3, "Pilhas e Baterias"), (7, "Óleo de Cozinha"), (9, "Lâmpadas")]
        .into_iter()
        .map(|(id, title)| CatalogItem {
            id,
            image_url: format!("http://localhost:3333/uploads/{id}.svg"),
            title: title.to_string(),
        })
        .collect()
}

fn regions() -> Vec<Region> {
    vec![
        Region {
            id: 33,
            code: "RJ".into(),
            name: "Rio de Janeiro".into(),
        },
        Region {
            id: 35,
            code: "SP".into(),
            name: "São Paulo".into(),
        },
    ]
}

fn city(name: &str) -> City {
    City { name: name.into() }
}

fn open_form(app: &AppTester<App, Effect>, model: &mut Model) -> Vec<Effect> {
    app.update(
        Event::Navigate {
            path: "/create-point".into(),
        },
        model,
    );
    app.update(
        Event::PageLoaded {
            route: Route::CreatePoint,
        },
        model,
    )
    .effects
}

fn city_token(model: &Model) -> u64 {
    model
        .form()
        .and_then(|form| form.pending_city_token())
        .expect("a city request is pending")
}

/// Answers the first HTTP request in `effects` and feeds the resulting events
/// back into the app.
fn respond(app: &AppTester<App, Effect>, model: &mut Model, effects: Vec<Effect>, response: HttpResponse) {
    let mut request = effects
        .into_iter()
        .find_map(|e| match e {
            Effect::Http(request) => Some(request),
            _ => None,
        })
        .expect("an HTTP request");

    let update = app
        .resolve(&mut request, HttpResult::Ok(response))
        .expect("resolves");
    for event in update.events {
        app.update(event, model);
    }
}

/// Fills a valid Niterói registration, loading the RJ city list on the way.
fn fill_niteroi_registration(app: &AppTester<App, Effect>, model: &mut Model) {
    app.update(Event::RegionChanged { value: "RJ".into() }, model);
    let token = city_token(model);
    app.update(
        Event::CitiesFetched {
            token,
            result: Ok(vec![city("Niterói"), city("Rio de Janeiro")]),
        },
        model,
    );
    app.update(Event::CityChanged { value: "Niterói".into() }, model);
    for (field, value) in [
        (ContactField::Name, "Ponto"),
        (ContactField::Email, "a@b.com"),
        (ContactField::Whatsapp, "21999999999"),
    ] {
        app.update(
            Event::ContactFieldChanged {
                field,
                value: value.into(),
            },
            model,
        );
    }
    app.update(Event::MapClicked { lat: -22.88, lng: -43.1 }, model);
    app.update(Event::ItemToggled { id: 9 }, model);
}

#[test]
fn mounting_the_form_requests_items_regions_and_position() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let effects = open_form(&app, &mut model);

    let calls = http_calls(&effects);
    assert_eq!(calls.len(), 2);
    assert!(calls.contains(&("GET".to_string(), "http://localhost:3333/items".to_string())));
    assert!(calls.contains(&(
        "GET".to_string(),
        "https://servicodados.ibge.gov.br/api/v1/localidades/estados?orderBy=nome".to_string()
    )));
    assert!(effects.iter().any(|e| matches!(
        e,
        Effect::Geolocation(request)
            if matches!(request.operation, GeolocationOperation::CurrentPosition(_))
    )));
    assert!(effects.iter().any(|e| matches!(e, Effect::Render(_))));
}

#[test]
fn full_registration_posts_multipart_and_returns_home() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    open_form(&app, &mut model);

    app.update(Event::ItemsFetched(Ok(catalog())), &mut model);
    app.update(Event::RegionsFetched(Ok(regions())), &mut model);

    let update = app.update(Event::RegionChanged { value: "SP".into() }, &mut model);
    assert_eq!(
        http_calls(&update.effects),
        vec![(
            "GET".to_string(),
            "https://servicodados.ibge.gov.br/api/v1/localidades/estados/SP/municipios".to_string()
        )]
    );
    let token = city_token(&model);
    app.update(
        Event::CitiesFetched {
            token,
            result: Ok(vec![city("Campinas"), city("São Paulo")]),
        },
        &mut model,
    );

    app.update(Event::CityChanged { value: "Campinas".into() }, &mut model);
    for (field, value) in [
        (ContactField::Name, "Recicla Campinas"),
        (ContactField::Email, "contato@recicla.org"),
        (ContactField::Whatsapp, "19999999999"),
    ] {
        app.update(
            Event::ContactFieldChanged {
                field,
                value: value.into(),
            },
            &mut model,
        );
    }
    app.update(Event::MapClicked { lat: -23.55, lng: -46.63 }, &mut model);
    app.update(Event::ItemToggled { id: 3 }, &mut model);
    app.update(Event::ItemToggled { id: 7 }, &mut model);

    let update = app.update(Event::SubmitRequested, &mut model);
    let post = update
        .effects
        .iter()
        .find_map(|e| match e {
            Effect::Http(request) => Some(&request.operation),
            _ => None,
        })
        .expect("registration request");

    assert_eq!(post.method, "POST");
    assert_eq!(post.url, "http://localhost:3333/points");
    assert!(post.headers.iter().any(|h| h.name.eq_ignore_ascii_case("content-type")
        && h.value.starts_with("multipart/form-data; boundary=")));

    let body = String::from_utf8_lossy(&post.body);
    for (name, value) in [
        ("name", "Recicla Campinas"),
        ("email", "contato@recicla.org"),
        ("whatsapp", "19999999999"),
        ("uf", "SP"),
        ("city", "Campinas"),
        ("latitude", "-23.55"),
        ("longitude", "-46.63"),
        ("items", "3,7"),
    ] {
        let part = format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n");
        assert!(body.contains(&part), "missing part {name}");
    }
    assert!(!body.contains("name=\"image\""));

    let view = app.view(&model);
    let PageView::CreatePoint(form) = view.page else {
        panic!("expected form page");
    };
    assert!(form.is_submitting);
    assert!(!form.overlay.visible);

    app.update(Event::PointSubmitted(Ok(())), &mut model);
    let PageView::CreatePoint(form) = app.view(&model).page else {
        panic!("expected form page");
    };
    assert!(form.overlay.visible);
    assert_eq!(form.overlay.redirect_path, "/");
    assert_eq!(form.contact.name, "Recicla Campinas");

    let update = app.update(Event::OverlayDismissed, &mut model);
    assert!(update.effects.iter().any(|e| matches!(
        e,
        Effect::Navigator(request)
            if request.operation == NavigationOperation::Push { path: "/".into() }
    )));
    assert_matches!(model.page, Page::Loading(Route::Home));

    app.update(Event::PageLoaded { route: Route::Home }, &mut model);
    assert_matches!(model.page, Page::Home);
}

#[test]
fn invalid_form_sends_nothing() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    open_form(&app, &mut model);

    let update = app.update(Event::SubmitRequested, &mut model);
    assert!(http_calls(&update.effects).is_empty());

    let PageView::CreatePoint(form) = app.view(&model).page else {
        panic!("expected form page");
    };
    let fields: Vec<_> = form.field_errors.iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, ["name", "email", "whatsapp", "uf", "city", "position", "items"]);
    assert!(!form.is_submitting);
}

#[test]
fn repeated_submit_sends_one_request() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    open_form(&app, &mut model);
    fill_niteroi_registration(&app, &mut model);

    let first = app.update(Event::SubmitRequested, &mut model);
    assert_eq!(http_calls(&first.effects).len(), 1);

    let second = app.update(Event::SubmitRequested, &mut model);
    assert!(http_calls(&second.effects).is_empty());

    app.update(
        Event::PointSubmitted(Err(shared::AppError::new(ErrorKind::Network, "offline"))),
        &mut model,
    );
    let PageView::CreatePoint(form) = app.view(&model).page else {
        panic!("expected form page");
    };
    assert!(form.submit_error.as_ref().is_some_and(|e| e.is_retryable));
    assert!(!form.overlay.visible);

    let retry = app.update(Event::SubmitRequested, &mut model);
    assert_eq!(http_calls(&retry.effects).len(), 1);
}

#[test]
fn registered_point_is_not_sent_twice() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    open_form(&app, &mut model);
    fill_niteroi_registration(&app, &mut model);

    let submit = app.update(Event::SubmitRequested, &mut model);
    respond(&app, &mut model, submit.effects, HttpResponse::status(201).build());

    let PageView::CreatePoint(form) = app.view(&model).page else {
        panic!("expected form page");
    };
    assert!(form.overlay.visible);
    assert!(!form.is_submitting);

    let again = app.update(Event::SubmitRequested, &mut model);
    assert!(http_calls(&again.effects).is_empty());
}

#[test]
fn city_list_response_fills_city_options() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    open_form(&app, &mut model);

    let update = app.update(Event::RegionChanged { value: "SP".into() }, &mut model);
    respond(
        &app,
        &mut model,
        update.effects,
        HttpResponse::ok()
            .json(vec![city("Campinas"), city("Santos")])
            .build(),
    );

    let PageView::CreatePoint(form) = app.view(&model).page else {
        panic!("expected form page");
    };
    let values: Vec<_> = form.cities.iter().map(|c| c.value.as_str()).collect();
    assert_eq!(values, ["0", "Campinas", "Santos"]);
    assert_eq!(form.city_phase, CityPhase::CitiesReady);
    assert!(form.notices.is_empty());
}

#[test]
fn rejected_registration_shows_server_message() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    open_form(&app, &mut model);
    fill_niteroi_registration(&app, &mut model);

    let submit = app.update(Event::SubmitRequested, &mut model);
    respond(
        &app,
        &mut model,
        submit.effects,
        HttpResponse::status(400)
            .json(json!({ "message": "uf is required" }))
            .build(),
    );

    let PageView::CreatePoint(form) = app.view(&model).page else {
        panic!("expected form page");
    };
    let error = form.submit_error.expect("submit error");
    assert_eq!(error.message, "uf is required");
    assert_eq!(error.error_code, "VALIDATION_ERROR");
    assert!(!form.overlay.visible);

    let retry = app.update(Event::SubmitRequested, &mut model);
    assert_eq!(http_calls(&retry.effects).len(), 1);
}

#[test]
fn failed_city_fetch_blocks_a_stale_city() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    open_form(&app, &mut model);
    fill_niteroi_registration(&app, &mut model);

    let update = app.update(Event::RegionChanged { value: "SP".into() }, &mut model);
    respond(&app, &mut model, update.effects, HttpResponse::status(502).build());
    app.update(Event::CityChanged { value: "Niterói".into() }, &mut model);

    let submit = app.update(Event::SubmitRequested, &mut model);
    assert!(http_calls(&submit.effects).is_empty());

    let PageView::CreatePoint(form) = app.view(&model).page else {
        panic!("expected form page");
    };
    assert_eq!(form.cities.len(), 1);
    assert_eq!(form.notices[0].section, Section::Cities);
    let fields: Vec<_> = form.field_errors.iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, ["city"]);
}

#[test]
fn latest_region_wins_over_slow_responses() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    open_form(&app, &mut model);

    app.update(Event::RegionChanged { value: "SP".into() }, &mut model);
    let first = city_token(&model);
    app.update(Event::RegionChanged { value: "RJ".into() }, &mut model);
    let second = city_token(&model);
    assert_ne!(first, second);

    app.update(
        Event::CitiesFetched {
            token: second,
            result: Ok(vec![city("Niterói")]),
        },
        &mut model,
    );
    app.update(
        Event::CitiesFetched {
            token: first,
            result: Ok(vec![city("Campinas")]),
        },
        &mut model,
    );

    let PageView::CreatePoint(form) = app.view(&model).page else {
        panic!("expected form page");
    };
    let labels: Vec<_> = form.cities.iter().map(|c| c.label.as_str()).collect();
    assert_eq!(labels, ["Selecione uma Cidade", "Niterói"]);
    assert_eq!(form.selected_region, "RJ");
}

#[test]
fn sentinel_region_clears_cities_without_request() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    open_form(&app, &mut model);

    app.update(Event::RegionChanged { value: "SP".into() }, &mut model);
    let token = city_token(&model);
    app.update(
        Event::CitiesFetched {
            token,
            result: Ok(vec![city("Campinas")]),
        },
        &mut model,
    );
    app.update(Event::CityChanged { value: "Campinas".into() }, &mut model);

    let update = app.update(Event::RegionChanged { value: "0".into() }, &mut model);
    assert!(http_calls(&update.effects).is_empty());

    let form = model.form().expect("form page");
    assert!(form.cities.is_empty());
    assert_eq!(form.selected_city.as_str(), "0");
}

#[test]
fn region_failure_becomes_regions_notice() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    open_form(&app, &mut model);

    app.update(
        Event::RegionsFetched(Err(shared::AppError::from_http_status(503, None))),
        &mut model,
    );
    let PageView::CreatePoint(form) = app.view(&model).page else {
        panic!("expected form page");
    };
    assert_eq!(form.notices.len(), 1);
    assert_eq!(form.notices[0].section, Section::Regions);
    assert!(view_has_no_global_error(&app, &model));
}

fn view_has_no_global_error(app: &AppTester<App, Effect>, model: &Model) -> bool {
    app.view(model).error.is_none()
}

#[test]
fn device_position_centres_map_without_placing_marker() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    let effects = open_form(&app, &mut model);

    let mut request = effects
        .into_iter()
        .find_map(|e| match e {
            Effect::Geolocation(request) => Some(request),
            _ => None,
        })
        .expect("geolocation request");

    let update = app
        .resolve(
            &mut request,
            Ok(Position {
                latitude: -22.9,
                longitude: -47.06,
                accuracy_m: Some(20.0),
            }),
        )
        .expect("resolves");
    for event in update.events {
        app.update(event, &mut model);
    }

    let PageView::CreatePoint(form) = app.view(&model).page else {
        panic!("expected form page");
    };
    assert!((form.map.center_lat + 22.9).abs() < 1e-9);
    assert!((form.map.center_lng + 47.06).abs() < 1e-9);
    assert_eq!(form.map.marker_lat, None);
}

#[test]
fn denied_location_shows_map_notice() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    open_form(&app, &mut model);

    app.update(
        Event::PositionResolved(Err(GeolocationError::PermissionDenied)),
        &mut model,
    );

    let form = model.form().expect("form page");
    let notice = form.notices.get(&Section::Map).expect("map notice");
    assert_eq!(notice.kind, ErrorKind::LocationPermissionDenied);
    assert_eq!(form.initial_position.lat(), 0.0);
}

#[test]
fn unsupported_upload_keeps_form_usable() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    open_form(&app, &mut model);

    app.update(
        Event::FileSelected {
            file_name: "notes.txt".into(),
            bytes: b"not an image at all".to_vec(),
        },
        &mut model,
    );

    let PageView::CreatePoint(form) = app.view(&model).page else {
        panic!("expected form page");
    };
    assert_eq!(form.file, None);
    assert_eq!(form.notices[0].section, Section::Image);
    assert_eq!(form.notices[0].error.error_code, "IMAGE_FORMAT_UNSUPPORTED");

    app.update(Event::NoticeDismissed { section: Section::Image }, &mut model);
    assert!(model.form().expect("form page").notices.is_empty());
}
