use super::{message, parse_id, AdminUser, AppState};
use crate::backend::CacheBackend;
use crate::error::{Error, Result};
use crate::media::{MediaFile, MediaStore};
use crate::query::SearchQuery;
use crate::repository::Datastore;
use crate::services::ProductForm;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

const PHOTO_FIELD: &str = "photo";

/// Text fields and photo files of a product form.
#[derive(Debug, Default)]
pub(crate) struct ProductUpload {
    pub form: ProductForm,
    pub photos: Vec<MediaFile>,
}

fn invalid_form(err: axum::extract::multipart::MultipartError) -> Error {
    let status = err.status();
    warn!("Failed to read multipart payload ({}): {}", status.as_u16(), err);
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        Error::validation("Upload is too large")
    } else {
        Error::validation("Invalid form data")
    }
}

/// Read every field of a product form. Unknown fields are skipped.
pub(crate) async fn read_product_upload(multipart: &mut Multipart) -> Result<ProductUpload> {
    let mut upload = ProductUpload::default();

    while let Some(field) = multipart.next_field().await.map_err(invalid_form)? {
        let name = field.name().unwrap_or_default().to_string();

        if name == PHOTO_FIELD {
            let file_name = field
                .file_name()
                .map(str::to_string)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| "upload.bin".to_string());
            let content_type = field
                .content_type()
                .map(str::to_string)
                .unwrap_or_else(|| "application/octet-stream".to_string());
            let bytes = field.bytes().await.map_err(invalid_form)?;
            if !bytes.is_empty() {
                upload.photos.push(MediaFile::new(file_name, content_type, bytes));
            }
            continue;
        }

        let slot = match name.as_str() {
            "name" => &mut upload.form.name,
            "price" => &mut upload.form.price,
            "stock" => &mut upload.form.stock,
            "category" => &mut upload.form.category,
            _ => continue,
        };
        *slot = Some(field.text().await.map_err(invalid_form)?);
    }

    Ok(upload)
}

async fn latest<D: Datastore, B: CacheBackend, M: MediaStore>(
    State(state): State<AppState<D, B, M>>,
) -> Result<impl IntoResponse> {
    let products = state.catalog.latest().await?;
    Ok(Json(json!({ "success": true, "products": products })))
}

async fn categories<D: Datastore, B: CacheBackend, M: MediaStore>(
    State(state): State<AppState<D, B, M>>,
) -> Result<impl IntoResponse> {
    let categories = state.catalog.categories().await?;
    Ok(Json(json!({ "success": true, "categories": categories })))
}

async fn admin_products<D: Datastore, B: CacheBackend, M: MediaStore>(
    State(state): State<AppState<D, B, M>>,
) -> Result<impl IntoResponse> {
    let products = state.catalog.all_products().await?;
    Ok(Json(json!({ "success": true, "products": products })))
}

async fn search<D: Datastore, B: CacheBackend, M: MediaStore>(
    State(state): State<AppState<D, B, M>>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse> {
    let page = state.catalog.search(&query).await?;
    Ok(Json(json!({
        "success": true,
        "products": page.products,
        "totalPage": page.total_page,
    })))
}

async fn single<D: Datastore, B: CacheBackend, M: MediaStore>(
    State(state): State<AppState<D, B, M>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let product = state.catalog.product(parse_id(&id)?).await?;
    Ok(Json(json!({ "success": true, "products": product })))
}

async fn create<D: Datastore, B: CacheBackend, M: MediaStore>(
    State(state): State<AppState<D, B, M>>,
    AdminUser(admin): AdminUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let upload = read_product_upload(&mut multipart).await?;
    let product = state.catalog.create(upload.form, upload.photos).await?;
    debug!("Product {} created by {}", product.id, admin.id);
    Ok((StatusCode::CREATED, message("Product created successfully")))
}

async fn update<D: Datastore, B: CacheBackend, M: MediaStore>(
    State(state): State<AppState<D, B, M>>,
    AdminUser(_): AdminUser,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let id = parse_id(&id)?;
    let upload = read_product_upload(&mut multipart).await?;
    state.catalog.update(id, upload.form, upload.photos).await?;
    Ok(message("Product Updated Successfully"))
}

async fn remove<D: Datastore, B: CacheBackend, M: MediaStore>(
    State(state): State<AppState<D, B, M>>,
    AdminUser(_): AdminUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    state.catalog.delete(parse_id(&id)?).await?;
    Ok(message("Product Deleted Successfully"))
}

pub(crate) fn routes<D, B, M>() -> Router<AppState<D, B, M>>
where
    D: Datastore,
    B: CacheBackend,
    M: MediaStore,
{
    Router::new()
        .route("/new", post(create::<D, B, M>))
        .route("/all", get(search::<D, B, M>))
        .route("/latest", get(latest::<D, B, M>))
        .route("/categories", get(categories::<D, B, M>))
        .route("/admin-products", get(admin_products::<D, B, M>))
        .route(
            "/{id}",
            get(single::<D, B, M>)
                .put(update::<D, B, M>)
                .delete(remove::<D, B, M>),
        )
}
