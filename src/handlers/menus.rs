use axum::{Json, extract::State, http::StatusCode};

use crate::{
    AppState,
    auth::Owner,
    error::AppError,
    extract::{ApiJson, ApiPath},
    models::{
        CreateMenuRequest, DataResponse, ErrorResponse, MenuDetail, MenuSummary, MessageResponse,
        UpdateMenuRequest,
    },
    validation,
};

fn menu_ids((category_id, menu_id): (i64, i64)) -> Result<(i64, i64), AppError> {
    Ok((
        validation::id(category_id, "categoryId")?,
        validation::id(menu_id, "menuId")?,
    ))
}

/// create_menu
///
/// [Owner Route] Adds a menu item to a category. The order is one past the
/// highest order of any menu, in any category.
#[utoipa::path(
    post,
    path = "/api/categories/{categoryId}/menus",
    params(("categoryId" = i64, Path, description = "Category ID")),
    request_body = CreateMenuRequest,
    responses(
        (status = 201, description = "Created", body = MessageResponse),
        (status = 400, description = "Invalid body or not an owner", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse)
    )
)]
pub async fn create_menu(
    Owner(_owner): Owner,
    State(state): State<AppState>,
    ApiPath(category_id): ApiPath<i64>,
    ApiJson(payload): ApiJson<CreateMenuRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let category_id = validation::id(category_id, "categoryId")?;
    let menu = validation::create_menu(payload)?;

    let created = state
        .repo
        .create_menu(category_id, menu)
        .await?
        .ok_or_else(|| AppError::not_found("category does not exist"))?;

    tracing::info!(
        category_id,
        menu_id = created.menu_id,
        order = created.order,
        "menu created"
    );
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("menu registered")),
    ))
}

/// list_menus
///
/// [Public Route] Menus of one category, highest order first, without descriptions.
#[utoipa::path(
    get,
    path = "/api/categories/{categoryId}/menus",
    params(("categoryId" = i64, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Menus", body = [MenuSummary]),
        (status = 404, description = "Category not found", body = ErrorResponse)
    )
)]
pub async fn list_menus(
    State(state): State<AppState>,
    ApiPath(category_id): ApiPath<i64>,
) -> Result<Json<DataResponse<Vec<MenuSummary>>>, AppError> {
    let category_id = validation::id(category_id, "categoryId")?;
    if state.repo.get_category(category_id).await?.is_none() {
        return Err(AppError::not_found("category does not exist"));
    }

    let menus = state.repo.list_menus(category_id).await?;
    Ok(Json(DataResponse {
        data: menus.into_iter().map(MenuSummary::from).collect(),
    }))
}

/// get_menu
///
/// [Public Route] Full detail of one menu item within its category.
#[utoipa::path(
    get,
    path = "/api/categories/{categoryId}/menus/{menuId}",
    params(
        ("categoryId" = i64, Path, description = "Category ID"),
        ("menuId" = i64, Path, description = "Menu ID")
    ),
    responses(
        (status = 200, description = "Menu", body = MenuDetail),
        (status = 404, description = "Category or menu not found", body = ErrorResponse)
    )
)]
pub async fn get_menu(
    State(state): State<AppState>,
    ApiPath(ids): ApiPath<(i64, i64)>,
) -> Result<Json<DataResponse<MenuDetail>>, AppError> {
    let (category_id, menu_id) = menu_ids(ids)?;
    if state.repo.get_category(category_id).await?.is_none() {
        return Err(AppError::not_found("category does not exist"));
    }

    let menu = state
        .repo
        .get_menu(category_id, menu_id)
        .await?
        .ok_or_else(|| AppError::not_found("menu does not exist"))?;
    Ok(Json(DataResponse {
        data: MenuDetail::from(menu),
    }))
}

/// update_menu
///
/// [Owner Route] Edits a menu item. Reordering follows the same swap rules as
/// categories, with the sibling searched among all menus. Answers 201, which
/// existing clients expect.
#[utoipa::path(
    patch,
    path = "/api/categories/{categoryId}/menus/{menuId}",
    params(
        ("categoryId" = i64, Path, description = "Category ID"),
        ("menuId" = i64, Path, description = "Menu ID")
    ),
    request_body = UpdateMenuRequest,
    responses(
        (status = 201, description = "Updated", body = MessageResponse),
        (status = 400, description = "Invalid body or not an owner", body = ErrorResponse),
        (status = 404, description = "Menu not found", body = ErrorResponse)
    )
)]
pub async fn update_menu(
    Owner(_owner): Owner,
    State(state): State<AppState>,
    ApiPath(ids): ApiPath<(i64, i64)>,
    ApiJson(payload): ApiJson<UpdateMenuRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let (category_id, menu_id) = menu_ids(ids)?;
    let changes = validation::update_menu(payload)?;

    let plan = state
        .repo
        .update_menu(category_id, menu_id, changes, state.config.reorder_policy)
        .await?
        .ok_or_else(|| AppError::not_found("menu does not exist"))?;

    tracing::info!(
        category_id,
        menu_id,
        swapped = plan.swapped(),
        fields_applied = plan.apply_fields,
        noop = plan.is_noop(),
        "menu updated"
    );
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("menu updated")),
    ))
}

/// delete_menu
///
/// [Owner Route] Removes a menu item from its category.
#[utoipa::path(
    delete,
    path = "/api/categories/{categoryId}/menus/{menuId}",
    params(
        ("categoryId" = i64, Path, description = "Category ID"),
        ("menuId" = i64, Path, description = "Menu ID")
    ),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Menu not found", body = ErrorResponse)
    )
)]
pub async fn delete_menu(
    Owner(_owner): Owner,
    State(state): State<AppState>,
    ApiPath(ids): ApiPath<(i64, i64)>,
) -> Result<Json<MessageResponse>, AppError> {
    let (category_id, menu_id) = menu_ids(ids)?;
    if !state.repo.delete_menu(category_id, menu_id).await? {
        return Err(AppError::not_found("menu does not exist"));
    }
    tracing::info!(category_id, menu_id, "menu deleted");
    Ok(Json(MessageResponse::new("menu deleted")))
}
