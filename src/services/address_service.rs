use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    dto::addresses::{AddressList, AddressRequest},
    entity::user_addresses::{
        ActiveModel as AddressActive, Column as AddressCol, Entity as UserAddresses,
        Model as AddressModel,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Address,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn list_addresses(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<AddressList>> {
    let items = UserAddresses::find()
        .filter(AddressCol::UserId.eq(user.user_id))
        .order_by_desc(AddressCol::IsDefault)
        .order_by_desc(AddressCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Address::from)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        AddressList { items },
        Some(Meta::empty()),
    ))
}

pub async fn create_address(
    state: &AppState,
    user: &AuthUser,
    payload: AddressRequest,
) -> AppResult<ApiResponse<Address>> {
    validate(&payload)?;
    let txn = state.orm.begin().await?;

    let existing = UserAddresses::find()
        .filter(AddressCol::UserId.eq(user.user_id))
        .count(&txn)
        .await?;
    // The first address a user saves becomes the default.
    let is_default = payload.is_default || existing == 0;
    if is_default {
        clear_default(&txn, user.user_id, None).await?;
    }

    let address = AddressActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        name: Set(payload.name.trim().to_string()),
        phone: Set(payload.phone.trim().to_string()),
        province: Set(payload.province),
        city: Set(payload.city),
        district: Set(payload.district),
        detail: Set(payload.detail.trim().to_string()),
        postal_code: Set(payload.postal_code),
        is_default: Set(is_default),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    Ok(ApiResponse::success(
        "Address created",
        address.into(),
        Some(Meta::empty()),
    ))
}

pub async fn update_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: AddressRequest,
) -> AppResult<ApiResponse<Address>> {
    validate(&payload)?;
    let txn = state.orm.begin().await?;

    let existing = find_owned(&txn, user.user_id, id).await?;
    if payload.is_default {
        clear_default(&txn, user.user_id, Some(id)).await?;
    }

    let keep_default = existing.is_default;
    let mut active: AddressActive = existing.into();
    active.name = Set(payload.name.trim().to_string());
    active.phone = Set(payload.phone.trim().to_string());
    active.province = Set(payload.province);
    active.city = Set(payload.city);
    active.district = Set(payload.district);
    active.detail = Set(payload.detail.trim().to_string());
    active.postal_code = Set(payload.postal_code);
    active.is_default = Set(payload.is_default || keep_default);
    active.updated_at = Set(Utc::now().into());
    let address = active.update(&txn).await?;

    txn.commit().await?;
    Ok(ApiResponse::success(
        "Address updated",
        address.into(),
        Some(Meta::empty()),
    ))
}

pub async fn delete_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = UserAddresses::delete_many()
        .filter(
            Condition::all()
                .add(AddressCol::Id.eq(id))
                .add(AddressCol::UserId.eq(user.user_id)),
        )
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::success(
        "Address deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Loads an address only if it belongs to `user_id`.
pub async fn find_owned<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    id: Uuid,
) -> AppResult<AddressModel> {
    UserAddresses::find()
        .filter(
            Condition::all()
                .add(AddressCol::Id.eq(id))
                .add(AddressCol::UserId.eq(user_id)),
        )
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)
}

async fn clear_default<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    except: Option<Uuid>,
) -> AppResult<()> {
    let mut condition = Condition::all()
        .add(AddressCol::UserId.eq(user_id))
        .add(AddressCol::IsDefault.eq(true));
    if let Some(id) = except {
        condition = condition.add(AddressCol::Id.ne(id));
    }
    UserAddresses::update_many()
        .col_expr(AddressCol::IsDefault, Expr::value(false))
        .filter(condition)
        .exec(conn)
        .await?;
    Ok(())
}

fn validate(payload: &AddressRequest) -> AppResult<()> {
    if payload.name.trim().is_empty()
        || payload.phone.trim().is_empty()
        || payload.detail.trim().is_empty()
    {
        return Err(AppError::BadRequest(
            "name, phone and detail are required".into(),
        ));
    }
    Ok(())
}
