//! HTTP handler functions for the CrowdWatch API.

use actix_web::{HttpResponse, web};
use crowdwatch_ai_models::ChatInput;
use crowdwatch_location::filter_by_name;
use crowdwatch_location_models::Location;
use crowdwatch_server_models::{
    AddLocationRequest, AnalyzeRequest, ApiError, ApiHealth, ChatRequest, LocationView,
    LocationsResponse, SearchParams, SelectResponse,
};

use crate::{AppState, actions, read_registry, write_registry};

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/locations?search=`
pub async fn list_locations(
    state: web::Data<AppState>,
    params: web::Query<SearchParams>,
) -> HttpResponse {
    let registry = read_registry(&state.locations);
    let term = params.search.as_deref().unwrap_or_default();

    let response = LocationsResponse {
        locations: filter_by_name(registry.all(), term)
            .into_iter()
            .map(LocationView::from)
            .collect(),
        selected_id: registry.selected_id().map(str::to_string),
    };

    HttpResponse::Ok().json(response)
}

/// `POST /api/locations`
///
/// Generates a profile for the name, then appends and selects it.
pub async fn add_location(
    state: web::Data<AppState>,
    body: web::Json<AddLocationRequest>,
) -> HttpResponse {
    let response =
        actions::add_new_location(state.provider.as_ref(), &state.locations, &body.name).await;
    HttpResponse::Ok().json(response)
}

/// `PUT /api/locations/{id}/select`
pub async fn select_location(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> HttpResponse {
    let id = path.into_inner();
    let mut registry = write_registry(&state.locations);

    match registry.select(&id) {
        Ok(location) => HttpResponse::Ok().json(SelectResponse {
            selected_id: location.id.clone(),
        }),
        Err(e) => not_found(&e.to_string()),
    }
}

/// `POST /api/locations/{id}/prediction`
pub async fn predict_location(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> HttpResponse {
    let id = path.into_inner();

    let location = {
        let registry = read_registry(&state.locations);
        registry.get(&id).cloned()
    };
    let Some(location) = location else {
        return not_found(&format!("Location not found: {id}"));
    };

    HttpResponse::Ok().json(actions::get_crowd_alert(state.provider.as_ref(), &location).await)
}

/// `POST /api/predictions`
///
/// Predicts for a location supplied in the body without touching the
/// registry.
pub async fn predict(state: web::Data<AppState>, body: web::Json<Location>) -> HttpResponse {
    HttpResponse::Ok().json(actions::get_crowd_alert(state.provider.as_ref(), &body).await)
}

/// `GET /api/statistics`
pub async fn statistics(state: web::Data<AppState>) -> HttpResponse {
    let summary = {
        let registry = read_registry(&state.locations);
        crowdwatch_analytics::summarize(registry.all())
    };
    HttpResponse::Ok().json(summary)
}

/// `POST /api/realtime/analyze`
pub async fn analyze_frame(
    state: web::Data<AppState>,
    body: web::Json<AnalyzeRequest>,
) -> HttpResponse {
    let AnalyzeRequest { image_data_uri } = body.into_inner();
    HttpResponse::Ok().json(
        actions::get_realtime_crowd_density(state.provider.as_ref(), image_data_uri).await,
    )
}

/// `POST /api/chat`
pub async fn chat(state: web::Data<AppState>, body: web::Json<ChatRequest>) -> HttpResponse {
    let ChatRequest { history, message } = body.into_inner();
    let input = ChatInput { history, message };
    HttpResponse::Ok().json(actions::get_chat_reply(state.provider.as_ref(), &input).await)
}

fn not_found(message: &str) -> HttpResponse {
    HttpResponse::NotFound().json(ApiError {
        error: message.to_string(),
    })
}
