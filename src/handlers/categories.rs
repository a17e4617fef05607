use axum::{Json, extract::State, http::StatusCode};

use crate::{
    AppState,
    auth::Owner,
    error::AppError,
    extract::{ApiJson, ApiPath},
    models::{
        CategorySummary, CreateCategoryRequest, DataResponse, ErrorResponse, MessageResponse,
        UpdateCategoryRequest,
    },
    validation,
};

/// create_category
///
/// [Owner Route] Registers a category ranked above every existing one
/// (`max(order) + 1`, or 1 for the first category).
#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Created", body = MessageResponse),
        (status = 400, description = "Invalid body or not an owner", body = ErrorResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    )
)]
pub async fn create_category(
    Owner(owner): Owner,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let name = validation::create_category(payload)?;
    let category = state.repo.create_category(name, Some(owner.id)).await?;

    tracing::info!(
        category_id = category.category_id,
        order = category.order,
        "category created"
    );
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("category registered")),
    ))
}

/// list_categories
///
/// [Public Route] All categories, highest order first.
#[utoipa::path(
    get,
    path = "/api/categories",
    responses((status = 200, description = "Categories", body = [CategorySummary]))
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<DataResponse<Vec<CategorySummary>>>, AppError> {
    let categories = state.repo.list_categories().await?;
    Ok(Json(DataResponse {
        data: categories.into_iter().map(CategorySummary::from).collect(),
    }))
}

/// update_category
///
/// [Owner Route] Renames and/or reorders a category. A new `order` held by
/// another category swaps the two ranks; what happens to the name in that case,
/// and when the requested order is free, follows the configured `ReorderPolicy`.
#[utoipa::path(
    patch,
    path = "/api/categories/{categoryId}",
    params(("categoryId" = i64, Path, description = "Category ID")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Updated", body = MessageResponse),
        (status = 400, description = "Invalid body or not an owner", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse)
    )
)]
pub async fn update_category(
    Owner(_owner): Owner,
    State(state): State<AppState>,
    ApiPath(category_id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdateCategoryRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let category_id = validation::id(category_id, "categoryId")?;
    let changes = validation::update_category(payload)?;

    let plan = state
        .repo
        .update_category(category_id, changes, state.config.reorder_policy)
        .await?
        .ok_or_else(|| AppError::not_found("category does not exist"))?;

    tracing::info!(
        category_id,
        swapped = plan.swapped(),
        fields_applied = plan.apply_fields,
        noop = plan.is_noop(),
        "category updated"
    );
    Ok(Json(MessageResponse::new("category updated")))
}

/// delete_category
///
/// [Owner Route] Hard-deletes a category together with its menus.
#[utoipa::path(
    delete,
    path = "/api/categories/{categoryId}",
    params(("categoryId" = i64, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Category not found", body = ErrorResponse)
    )
)]
pub async fn delete_category(
    Owner(_owner): Owner,
    State(state): State<AppState>,
    ApiPath(category_id): ApiPath<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    let category_id = validation::id(category_id, "categoryId")?;
    if !state.repo.delete_category(category_id).await? {
        return Err(AppError::not_found("category does not exist"));
    }
    tracing::info!(category_id, "category deleted");
    Ok(Json(MessageResponse::new("category deleted")))
}
