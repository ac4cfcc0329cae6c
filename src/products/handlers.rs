use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::gate::AdminUser,
    error::ApiError,
    forum::repo::Topic,
    policy::{can_read_product, Privacy},
    state::AppState,
    users::repo::User,
    validate::{is_clean_text, require},
};

use super::{
    dto::{
        AdminTopicsResponse, CreateProductRequest, DeletedProductResponse, EditProductRequest,
        PrivateProductsResponse, ProductResponse, ProductsResponse, UpdatedProductResponse,
    },
    repo::Product,
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/getAllProducts", get(get_all_products))
        .route("/getOneProduct/:productId", get(get_one_product))
        .route("/getPrivateProducts", get(get_private_products))
        .route("/getAllForumTopics", get(get_all_forum_topics))
        .route("/createProduct", post(create_product))
        .route("/editProduct/:productId", patch(edit_product))
        .route("/deleteProduct/:productId", delete(delete_product))
}

fn parse_privacy(raw: &str) -> Result<Privacy, ApiError> {
    raw.parse::<Privacy>().map_err(|()| {
        ApiError::Validation(r#"Privacy must be either "private" or "public""#.into())
    })
}

fn validate_product_fields(
    name: &str,
    description: &str,
    image: &str,
    price: f64,
    quantity: i32,
) -> Result<(), ApiError> {
    require(
        name.len() >= 2 && is_clean_text(name),
        "Name must be at least 2 characters of letters, numbers and basic punctuation",
    )?;
    require(
        description.len() >= 10 && is_clean_text(description),
        "Description must be at least 10 characters of letters, numbers and basic punctuation",
    )?;
    require(!image.trim().is_empty(), "Image is required")?;
    require(price >= 1.0, "Price must be at least 1")?;
    require(quantity >= 1, "Quantity must be at least 1")?;
    Ok(())
}

/// Public storefront listing; private products never leave the database
/// here.
#[instrument(skip(state))]
pub async fn get_all_products(
    State(state): State<AppState>,
) -> Result<Json<ProductsResponse>, ApiError> {
    let products = Product::list_public(&state.db).await?;
    Ok(Json(ProductsResponse {
        success: true,
        products,
    }))
}

/// Single product, readable by anyone while public. Private products are
/// refused even to logged-in farmers, so the check runs with no identity.
#[instrument(skip(state))]
pub async fn get_one_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = Product::find_by_id(&state.db, product_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".into()))?;

    if !can_read_product(product.privacy, None) {
        warn!(product_id = %product_id, "private product read denied");
        return Err(ApiError::Forbidden(
            "Access denied. Product is private.".into(),
        ));
    }

    Ok(Json(ProductResponse {
        success: true,
        product,
    }))
}

#[instrument(skip(state, payload))]
pub async fn create_product(
    State(state): State<AppState>,
    AdminUser(identity): AdminUser,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    validate_product_fields(
        &payload.name,
        &payload.description,
        &payload.image,
        payload.price,
        payload.quantity,
    )?;
    let privacy = parse_privacy(&payload.privacy)?;

    let product = Product::create(
        &state.db,
        &payload.name,
        &payload.description,
        &payload.image,
        payload.price,
        payload.quantity,
        privacy,
    )
    .await?;
    // Second write, not transactional with the create; stale list entries
    // are filtered on read.
    User::push_product(&state.db, identity.sub, product.id).await?;

    info!(product_id = %product.id, admin = %identity.sub, "product created");
    Ok((
        StatusCode::CREATED,
        Json(ProductResponse {
            success: true,
            product,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn edit_product(
    State(state): State<AppState>,
    AdminUser(identity): AdminUser,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<EditProductRequest>,
) -> Result<Json<UpdatedProductResponse>, ApiError> {
    validate_product_fields(
        &payload.name,
        &payload.description,
        &payload.image,
        payload.price,
        payload.quantity,
    )?;
    let privacy = parse_privacy(&payload.privacy)?;

    Product::find_by_id(&state.db, product_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".into()))?;

    let updated = Product::update(
        &state.db,
        product_id,
        &payload.name,
        &payload.description,
        &payload.image,
        payload.price,
        payload.quantity,
        privacy,
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Product not found".into()))?;

    info!(product_id = %product_id, admin = %identity.sub, "product updated");
    Ok(Json(UpdatedProductResponse {
        success: true,
        updated_product: updated,
    }))
}

#[instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    AdminUser(identity): AdminUser,
    Path(product_id): Path<Uuid>,
) -> Result<Json<DeletedProductResponse>, ApiError> {
    Product::find_by_id(&state.db, product_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".into()))?;

    Product::delete(&state.db, product_id).await?;
    User::pull_product(&state.db, identity.sub, product_id).await?;

    info!(product_id = %product_id, admin = %identity.sub, "product deleted");
    Ok(Json(DeletedProductResponse {
        success: true,
        message: "Product deleted successfully".into(),
    }))
}

/// Private products of the calling admin, resolved through their
/// `products` list. Ids pointing at deleted rows drop out silently.
#[instrument(skip(state))]
pub async fn get_private_products(
    State(state): State<AppState>,
    AdminUser(identity): AdminUser,
) -> Result<Json<PrivateProductsResponse>, ApiError> {
    let admin = User::find_by_id(&state.db, identity.sub)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let mut private_products = Vec::new();
    for product_id in &admin.products {
        if let Some(product) = Product::find_by_id(&state.db, *product_id).await? {
            if product.privacy == Privacy::Private {
                private_products.push(product);
            }
        }
    }

    Ok(Json(PrivateProductsResponse {
        success: true,
        private_products,
    }))
}

/// Every topic, private ones included, for the moderation view.
#[instrument(skip(state))]
pub async fn get_all_forum_topics(
    State(state): State<AppState>,
    AdminUser(identity): AdminUser,
) -> Result<Json<AdminTopicsResponse>, ApiError> {
    let forum_topics = Topic::list_all(&state.db).await?;
    info!(admin = %identity.sub, count = forum_topics.len(), "moderation topic listing");
    Ok(Json(AdminTopicsResponse {
        success: true,
        forum_topics,
    }))
}
