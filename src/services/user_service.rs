use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::users::UpdateProfileRequest,
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::UserProfile,
    response::{ApiResponse, Meta},
};

const NICKNAME_MAX: usize = 50;
const PHONE_MAX: usize = 20;

pub async fn get_profile(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<UserProfile>> {
    let profile = sqlx::query_as::<_, UserProfile>(
        "SELECT id, username, nickname, phone, role, created_at FROM users WHERE id = $1",
    )
    .bind(user.user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound)?;

    Ok(ApiResponse::success("OK", profile, Some(Meta::empty())))
}

pub async fn update_profile(
    pool: &DbPool,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<UserProfile>> {
    let nickname = normalize(payload.nickname, "nickname", NICKNAME_MAX)?;
    let phone = normalize(payload.phone, "phone", PHONE_MAX)?;

    if let Some(phone) = phone.as_deref() {
        let taken: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM users WHERE phone = $1 AND id <> $2")
                .bind(phone)
                .bind(user.user_id)
                .fetch_optional(pool)
                .await?;
        if taken.is_some() {
            return Err(phone_taken());
        }
    }

    let profile = sqlx::query_as::<_, UserProfile>(
        r#"
        UPDATE users
        SET nickname = COALESCE($2, nickname), phone = COALESCE($3, phone)
        WHERE id = $1
        RETURNING id, username, nickname, phone, role, created_at
        "#,
    )
    .bind(user.user_id)
    .bind(nickname)
    .bind(phone)
    .fetch_optional(pool)
    .await
    .map_err(|err| match err {
        // Lost a race with another account claiming the same phone.
        sqlx::Error::Database(db) if db.is_unique_violation() => phone_taken(),
        other => AppError::from(other),
    })?
    .ok_or(AppError::NotFound)?;

    tracing::info!(user_id = %user.user_id, "profile updated");
    Ok(ApiResponse::success("Profile updated", profile, Some(Meta::empty())))
}

fn normalize(value: Option<String>, field: &str, max: usize) -> AppResult<Option<String>> {
    let Some(value) = value else {
        return Ok(None);
    };
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{field} must not be empty")));
    }
    if value.chars().count() > max {
        return Err(AppError::BadRequest(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(Some(value.to_string()))
}

fn phone_taken() -> AppError {
    AppError::BadRequest("Phone is already in use".to_string())
}
