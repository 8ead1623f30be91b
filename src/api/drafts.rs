// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Listing draft endpoints.

use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use serde::Deserialize;
use tokio::sync::OwnedMutexGuard;
use tracing::debug;
use utoipa::IntoParams;

use crate::{
    auth::Session,
    error::ApiError,
    flows::{
        listing::{DraftImage, DraftView},
        ListingDraft, StepInput, SubmitOutcome,
    },
    models::ProductType,
    state::AppState,
};

/// Request body cap for photo uploads.
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Multipart field names accepted as images.
const IMAGE_FIELDS: &[&str] = &["files", "file", "image"];

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NewDraftQuery {
    /// Preselected listing type; skips the type step.
    #[serde(rename = "type")]
    pub product_type: Option<ProductType>,
}

type DraftGuard = OwnedMutexGuard<Option<ListingDraft>>;

async fn lock_draft(state: &AppState, session: &Session) -> DraftGuard {
    state.flows.draft(session.subject()).lock_owned().await
}

fn current(slot: &Option<ListingDraft>) -> Result<ListingDraft, ApiError> {
    slot.clone()
        .ok_or_else(|| ApiError::not_found("No listing in progress"))
}

/// Write `draft` back into its slot and render it.
fn commit(mut guard: DraftGuard, draft: ListingDraft) -> Json<DraftView> {
    let view = draft.view();
    *guard = Some(draft);
    Json(view)
}

/// Current draft, or a fresh one if none is in progress.
#[utoipa::path(
    get,
    path = "/drafts",
    tag = "Drafts",
    responses(
        (status = 200, description = "Current draft", body = DraftView),
        (status = 401, description = "Please log in to continue")
    )
)]
pub async fn get_draft(State(state): State<AppState>, session: Session) -> Json<DraftView> {
    let mut guard = lock_draft(&state, &session).await;
    Json(guard.get_or_insert_with(|| ListingDraft::new(None)).view())
}

/// Start a new draft, replacing any in progress.
#[utoipa::path(
    post,
    path = "/drafts",
    tag = "Drafts",
    params(NewDraftQuery),
    responses(
        (status = 200, description = "New draft", body = DraftView)
    )
)]
pub async fn new_draft(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<NewDraftQuery>,
) -> Json<DraftView> {
    let guard = lock_draft(&state, &session).await;
    commit(guard, ListingDraft::new(query.product_type))
}

/// Submit the input for the current step and advance.
#[utoipa::path(
    post,
    path = "/drafts/step",
    tag = "Drafts",
    request_body = StepInput,
    responses(
        (status = 200, description = "Draft advanced", body = DraftView),
        (status = 409, description = "Input is for another step"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn apply_step(
    State(state): State<AppState>,
    session: Session,
    Json(input): Json<StepInput>,
) -> Result<Json<DraftView>, ApiError> {
    let guard = lock_draft(&state, &session).await;
    let mut draft = current(&guard)?;
    draft.apply(input)?;
    Ok(commit(guard, draft))
}

/// Attach images to the draft. All-or-nothing per request.
#[utoipa::path(
    post,
    path = "/drafts/photos",
    tag = "Drafts",
    request_body(content = String, content_type = "multipart/form-data", description = "One or more `files` parts"),
    responses(
        (status = 200, description = "Images attached", body = DraftView),
        (status = 400, description = "Malformed upload"),
        (status = 422, description = "Too many images")
    )
)]
pub async fn upload_photos(
    State(state): State<AppState>,
    session: Session,
    mut multipart: Multipart,
) -> Result<Json<DraftView>, ApiError> {
    // Checked up front so a body for a missing draft is never buffered
    current(&*state.flows.draft(session.subject()).lock().await)?;

    // The slot stays unlocked while the client streams the body
    let mut images = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid upload: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if !IMAGE_FIELDS.contains(&name.as_str()) {
            debug!(field = %name, "Ignoring non-image multipart field");
            continue;
        }

        let file_name = field.file_name().unwrap_or("image").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid upload: {e}")))?;
        images.push(DraftImage::new(file_name, content_type, bytes));
    }

    let guard = lock_draft(&state, &session).await;
    let mut draft = current(&guard)?;
    for image in images {
        draft.add_image(image)?;
    }
    Ok(commit(guard, draft))
}

#[utoipa::path(
    delete,
    path = "/drafts/photos/{index}",
    tag = "Drafts",
    params(
        ("index" = usize, Path, description = "Zero-based image position")
    ),
    responses(
        (status = 200, description = "Image removed", body = DraftView),
        (status = 422, description = "No image at that position")
    )
)]
pub async fn remove_photo(
    State(state): State<AppState>,
    session: Session,
    Path(index): Path<usize>,
) -> Result<Json<DraftView>, ApiError> {
    let guard = lock_draft(&state, &session).await;
    let mut draft = current(&guard)?;
    draft.remove_image(index)?;
    Ok(commit(guard, draft))
}

#[utoipa::path(
    post,
    path = "/drafts/back",
    tag = "Drafts",
    responses(
        (status = 200, description = "Previous step", body = DraftView)
    )
)]
pub async fn go_back(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<DraftView>, ApiError> {
    let guard = lock_draft(&state, &session).await;
    let mut draft = current(&guard)?;
    draft.back();
    Ok(commit(guard, draft))
}

/// Create the listing. On success the draft is dropped and listing caches
/// are invalidated.
#[utoipa::path(
    post,
    path = "/drafts/submit",
    tag = "Drafts",
    responses(
        (status = 200, description = "Listing created", body = SubmitOutcome),
        (status = 422, description = "Validation error")
    )
)]
pub async fn submit_draft(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<SubmitOutcome>, ApiError> {
    let mut guard = lock_draft(&state, &session).await;
    let draft = current(&guard)?;
    let outcome = draft.submit(&state.backend, &session.token).await?;
    *guard = None;
    drop(guard);

    state.fetchers.invalidate_listings();
    Ok(Json(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::router,
        test_support::{mint_token, test_state, unreachable_backend},
    };
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;
    use tokio_util::io::ReaderStream;
    use tower::ServiceExt;

    const BOUNDARY: &str = "draft-photos";

    fn image_part(file_name: &str) -> String {
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\npng:{file_name}\r\n"
        )
    }

    fn closing() -> String {
        format!("--{BOUNDARY}--\r\n")
    }

    fn upload(sub: &str, body: Body) -> Request<Body> {
        Request::post("/drafts/photos")
            .header(header::COOKIE, format!("session_token={}", mint_token(sub, 600)))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(body)
            .unwrap()
    }

    fn draft_on_photos() -> ListingDraft {
        let mut draft = ListingDraft::new(Some(ProductType::Sell));
        draft
            .apply(StepInput::Basics {
                title: "Desk lamp".into(),
                category_name: None,
                is_digital: false,
            })
            .unwrap();
        draft
            .apply(StepInput::Details {
                description: "Barely used".into(),
                price: Some("250".into()),
            })
            .unwrap();
        draft
    }

    #[tokio::test]
    async fn interleaved_uploads_keep_every_image() {
        let state = test_state(unreachable_backend());
        *state.flows.draft("7").lock().await = Some(draft_on_photos());

        // First upload sends half its body, then stalls
        let (mut writer, reader) = tokio::io::duplex(64 * 1024);
        writer.write_all(image_part("a1.png").as_bytes()).await.unwrap();
        let slow = tokio::spawn(
            router(state.clone()).oneshot(upload("7", Body::from_stream(ReaderStream::new(reader)))),
        );
        tokio::time::sleep(Duration::from_millis(50)).await;

        let body = format!("{}{}{}", image_part("b1.png"), image_part("b2.png"), closing());
        let fast = router(state.clone())
            .oneshot(upload("7", Body::from(body)))
            .await
            .unwrap();
        assert_eq!(fast.status(), StatusCode::OK);

        writer
            .write_all(format!("{}{}", image_part("a2.png"), closing()).as_bytes())
            .await
            .unwrap();
        drop(writer);
        let slow = slow.await.unwrap().unwrap();
        assert_eq!(slow.status(), StatusCode::OK);

        let slot = state.flows.draft("7");
        let guard = slot.lock().await;
        let names: Vec<String> = guard
            .as_ref()
            .unwrap()
            .view()
            .images
            .into_iter()
            .map(|image| image.file_name)
            .collect();
        assert_eq!(names, ["b1.png", "b2.png", "a1.png", "a2.png"]);
    }

    #[tokio::test]
    async fn rejected_upload_leaves_draft_untouched() {
        let state = test_state(unreachable_backend());
        *state.flows.draft("7").lock().await = Some(draft_on_photos());

        let body: String = (1..=6)
            .map(|i| image_part(&format!("{i}.png")))
            .chain(std::iter::once(closing()))
            .collect();
        let response = router(state.clone())
            .oneshot(upload("7", Body::from(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let slot = state.flows.draft("7");
        let guard = slot.lock().await;
        assert!(guard.as_ref().unwrap().view().images.is_empty());
    }

    #[tokio::test]
    async fn upload_without_draft_is_404() {
        let state = test_state(unreachable_backend());
        let body = format!("{}{}", image_part("a.png"), closing());
        let response = router(state)
            .oneshot(upload("7", Body::from(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
