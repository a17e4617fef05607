use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Closed Enumerations ---

/// Role
///
/// The two account roles. Stored as the Postgres enum `user_role` and exchanged
/// over JSON as `CUSTOMER` / `OWNER`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[default]
    Customer,
    Owner,
}

/// MenuStatus
///
/// Sale state of a menu item, stored as the Postgres enum `menu_status`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "menu_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MenuStatus {
    #[default]
    ForSale,
    SoldOut,
}

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// An account row from the `users` table. `password` holds the bcrypt hash and
/// never leaves the server.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub user_id: i64,
    pub nickname: String,
    pub password: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Category
///
/// A row from the `categories` table. `order` is a display rank, highest first.
#[derive(Debug, Clone, FromRow)]
pub struct Category {
    pub category_id: i64,
    // The owner who created the category, if the account still exists.
    pub user_id: Option<i64>,
    pub name: String,
    pub order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Menu
///
/// A row from the `menus` table.
#[derive(Debug, Clone, FromRow)]
pub struct Menu {
    pub menu_id: i64,
    pub category_id: i64,
    pub name: String,
    pub description: String,
    pub image: String,
    pub price: i32,
    pub order: i32,
    pub status: MenuStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Repository Inputs ---

/// Validated data for a new account; `password` is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub nickname: String,
    pub password: String,
    pub role: Role,
}

/// Validated data for a new menu item.
#[derive(Debug, Clone)]
pub struct NewMenu {
    pub name: String,
    pub description: String,
    pub image: String,
    pub price: i32,
}

/// Field changes for a category update.
#[derive(Debug, Clone)]
pub struct CategoryChanges {
    pub name: String,
    pub order: i32,
}

/// Field changes for a menu update. `None` keeps the stored value.
#[derive(Debug, Clone)]
pub struct MenuChanges {
    pub name: String,
    pub description: String,
    pub price: Option<i32>,
    pub order: Option<i32>,
    pub status: Option<MenuStatus>,
}

// --- Request Payloads (Input Schemas) ---

// Every field is optional at the serde level so that missing values reach the
// validation layer and produce a field-specific message.

/// CreateCategoryRequest
///
/// Body of `POST /api/categories`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateCategoryRequest {
    pub name: Option<String>,
}

/// UpdateCategoryRequest
///
/// Body of `PATCH /api/categories/{categoryId}`. Both fields are required.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub order: Option<i32>,
}

/// CreateMenuRequest
///
/// Body of `POST /api/categories/{categoryId}/menus`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateMenuRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub price: Option<i32>,
}

/// UpdateMenuRequest
///
/// Body of `PATCH /api/categories/{categoryId}/menus/{menuId}`.
/// `name` and `description` are required; the rest keep their stored value when absent.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateMenuRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i32>,
    pub order: Option<i32>,
    pub status: Option<MenuStatus>,
}

/// SignUpRequest
///
/// Body of `POST /api/sign-up`. `type` selects the account role and defaults to `CUSTOMER`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SignUpRequest {
    pub nickname: Option<String>,
    pub password: Option<String>,
    #[serde(rename = "type")]
    pub role: Option<Role>,
}

/// SignInRequest
///
/// Body of `POST /api/sign-in`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SignInRequest {
    pub nickname: Option<String>,
    pub password: Option<String>,
}

// --- Response Schemas (Output) ---

/// CategorySummary
///
/// One entry of the category listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub category_id: i64,
    pub name: String,
    pub order: i32,
}

impl From<Category> for CategorySummary {
    fn from(category: Category) -> Self {
        Self {
            category_id: category.category_id,
            name: category.name,
            order: category.order,
        }
    }
}

/// MenuSummary
///
/// One entry of a category's menu listing. The description is only part of the detail view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MenuSummary {
    pub menu_id: i64,
    pub name: String,
    pub image: String,
    pub price: i32,
    pub order: i32,
    pub status: MenuStatus,
}

impl From<Menu> for MenuSummary {
    fn from(menu: Menu) -> Self {
        Self {
            menu_id: menu.menu_id,
            name: menu.name,
            image: menu.image,
            price: menu.price,
            order: menu.order,
            status: menu.status,
        }
    }
}

/// MenuDetail
///
/// Full view of a single menu item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MenuDetail {
    pub menu_id: i64,
    pub name: String,
    pub description: String,
    pub image: String,
    pub price: i32,
    pub order: i32,
    pub status: MenuStatus,
}

impl From<Menu> for MenuDetail {
    fn from(menu: Menu) -> Self {
        Self {
            menu_id: menu.menu_id,
            name: menu.name,
            description: menu.description,
            image: menu.image,
            price: menu.price,
            order: menu.order,
            status: menu.status,
        }
    }
}

/// UserProfile
///
/// Output schema for `GET /api/users/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: i64,
    pub nickname: String,
    #[serde(rename = "type")]
    pub role: Role,
}

// --- Envelopes ---

/// `{ "message": ... }` body returned by mutations.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// `{ "data": ... }` body returned by reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub data: T,
}

/// `{ "errorMessage": ... }` body returned by every failure.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error_message: String,
}
