use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

use crate::{
    credential::{hash_password, verify_password},
    dto::auth::{LoginRequest, LoginResponse, SignupRequest},
    entity::users::{self, Column as UserCol, Entity as Users},
    error::{AppError, AppResult, is_unique_violation},
    models::PublicUser,
    state::AppState,
};

pub async fn signup(state: &AppState, payload: SignupRequest) -> AppResult<()> {
    let db = state.db()?;

    // New accounts are hashed up front; only legacy rows ever hold
    // plaintext.
    let record = hash_password(&payload.password);
    let result = users::ActiveModel {
        id: NotSet,
        name: Set(payload.name),
        email: Set(payload.email),
        password: Set(record),
        role: Set("customer".to_string()),
    }
    .insert(db)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(err) if is_unique_violation(&err) => {
            Err(AppError::Conflict("Email already exists".into()))
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn login(state: &AppState, payload: LoginRequest) -> AppResult<LoginResponse> {
    let db = state.db()?;

    let user = Users::find()
        .filter(UserCol::Email.eq(payload.email.as_str()))
        .one(db)
        .await?
        .ok_or(AppError::Auth)?;

    if !verify_password(&payload.password, &user.password) {
        return Err(AppError::Auth);
    }

    Ok(LoginResponse {
        success: true,
        user: PublicUser {
            name: user.name,
            email: user.email,
            role: user.role,
        },
    })
}
