//! Request schemas.
//!
//! One validator per request shape, shared by every handler that accepts it.
//! Each turns an optional-field payload into the repository input type or an
//! `AppError::Validation` naming the offending field.

use crate::{
    error::AppError,
    models::{
        CategoryChanges, CreateCategoryRequest, CreateMenuRequest, MenuChanges, NewMenu, Role,
        SignInRequest, SignUpRequest, UpdateCategoryRequest, UpdateMenuRequest,
    },
};

const TEXT_MAX: usize = 100;
const NICKNAME_LEN: (usize, usize) = (3, 15);
const PASSWORD_LEN: (usize, usize) = (8, 20);

fn required<T>(value: Option<T>, field: &str) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::validation(format!("\"{field}\" is required")))
}

/// A required string of 1..=100 characters.
fn text(value: Option<String>, field: &str) -> Result<String, AppError> {
    let value = required(value, field)?;
    let len = value.chars().count();
    if len == 0 {
        return Err(AppError::validation(format!(
            "\"{field}\" is not allowed to be empty"
        )));
    }
    if len > TEXT_MAX {
        return Err(AppError::validation(format!(
            "\"{field}\" length must be less than or equal to {TEXT_MAX} characters long"
        )));
    }
    Ok(value)
}

fn price(value: i32) -> Result<i32, AppError> {
    if value < 0 {
        return Err(AppError::validation("menu price cannot be less than 0"));
    }
    Ok(value)
}

/// Path ids are positive integers.
pub fn id(value: i64, field: &str) -> Result<i64, AppError> {
    if value < 1 {
        return Err(AppError::validation(format!(
            "\"{field}\" must be a positive number"
        )));
    }
    Ok(value)
}

pub fn create_category(req: CreateCategoryRequest) -> Result<String, AppError> {
    text(req.name, "name")
}

pub fn update_category(req: UpdateCategoryRequest) -> Result<CategoryChanges, AppError> {
    Ok(CategoryChanges {
        name: text(req.name, "name")?,
        order: required(req.order, "order")?,
    })
}

pub fn create_menu(req: CreateMenuRequest) -> Result<NewMenu, AppError> {
    Ok(NewMenu {
        name: text(req.name, "name")?,
        description: text(req.description, "description")?,
        image: text(req.image, "image")?,
        price: price(required(req.price, "price")?)?,
    })
}

pub fn update_menu(req: UpdateMenuRequest) -> Result<MenuChanges, AppError> {
    Ok(MenuChanges {
        name: text(req.name, "name")?,
        description: text(req.description, "description")?,
        price: req.price.map(price).transpose()?,
        order: req.order,
        status: req.status,
    })
}

/// A validated sign-up. The password is still plain text here.
#[derive(Debug)]
pub struct SignUp {
    pub nickname: String,
    pub password: String,
    pub role: Role,
}

pub fn sign_up(req: SignUpRequest) -> Result<SignUp, AppError> {
    let nickname = required(req.nickname, "nickname")?;
    let (min, max) = NICKNAME_LEN;
    let len = nickname.chars().count();
    if len < min || len > max || !nickname.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AppError::validation(format!(
            "\"nickname\" must be {min} to {max} letters or digits"
        )));
    }

    let password = required(req.password, "password")?;
    let (min, max) = PASSWORD_LEN;
    let len = password.chars().count();
    if len < min || len > max {
        return Err(AppError::validation(format!(
            "\"password\" must be {min} to {max} characters long"
        )));
    }
    if password == nickname {
        return Err(AppError::validation(
            "\"password\" must not be the same as the nickname",
        ));
    }

    Ok(SignUp {
        nickname,
        password,
        role: req.role.unwrap_or_default(),
    })
}

/// Sign-in only checks presence.
pub fn sign_in(req: SignInRequest) -> Result<(String, String), AppError> {
    let nickname = required(req.nickname, "nickname")?;
    let password = required(req.password, "password")?;
    if nickname.is_empty() || password.is_empty() {
        return Err(AppError::validation("nickname and password are required"));
    }
    Ok((nickname, password))
}
