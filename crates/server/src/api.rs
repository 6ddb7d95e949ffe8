use crate::extract::JsonBody;
use crate::metrics;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get, put};
use axum::Json;
use inventory_common::audit::{self, AuditReportRow, ProductState};
use inventory_common::entities::{bitacora, productos};
use inventory_common::models::*;
use inventory_common::{InventoryError, to_csv};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    FromQueryResult, QueryOrder, QuerySelect, Set, Statement,
};
use serde_json::Value as JsonValue;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

type ApiResult<T> = std::result::Result<T, InventoryError>;

type ProductoModel = productos::Model;
type BitacoraModel = bitacora::Model;

const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
const CSV_DISPOSITION: &str = "attachment; filename=\"bitacora.csv\"";

pub fn router(state: AppState) -> axum::Router {
    let index = state.web_dist_dir.join("index.html");
    let static_files = ServeDir::new(&state.web_dist_dir).fallback(ServeFile::new(index));
    axum::Router::new()
        .route("/api/ping", get(ping))
        .route("/api/productos", get(list_productos).post(create_producto))
        .route(
            "/api/productos/{id}",
            put(update_producto).delete(delete_producto),
        )
        .route("/api/bitacora", get(list_bitacora))
        .route("/api/bitacora/reporte", get(bitacora_report))
        .route("/api/bitacora.csv", get(export_bitacora_csv))
        .route("/api/reporte", get(productos_range_report))
        .route("/api/metrics", get(render_metrics))
        .route("/api/{*rest}", any(api_route_not_found))
        .route_layer(axum::middleware::from_fn(metrics::metrics_middleware))
        .fallback_service(static_files)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn ping(State(state): State<AppState>) -> ApiResult<Json<Vec<JsonValue>>> {
    let backend = state.db.get_database_backend();
    let rows = JsonValue::find_by_statement(Statement::from_string(
        backend,
        "SELECT 1+1 AS resultado",
    ))
    .all(state.db.as_ref())
    .await?;
    Ok(Json(rows))
}

async fn list_productos(State(state): State<AppState>) -> ApiResult<Json<Vec<ProductoModel>>> {
    let list = productos::Entity::find()
        .order_by_desc(productos::Column::Id)
        .all(state.db.as_ref())
        .await?;
    Ok(Json(list))
}

async fn create_producto(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateProducto>,
) -> ApiResult<(StatusCode, Json<ProductoCreated>)> {
    let nuevo = payload.validate()?;
    let audit_in_app = state.audit_in_app;

    let producto = txn!(state.db.as_ref(), |txn| {
        insert_producto(txn, nuevo, audit_in_app).await
    })?;

    info!(id = producto.id, "producto created");
    Ok((
        StatusCode::CREATED,
        Json(ProductoCreated {
            id: producto.id,
            nombre: producto.nombre,
            precio: producto.precio,
            stock: producto.stock,
        }),
    ))
}

async fn update_producto(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    JsonBody(payload): JsonBody<UpdateProducto>,
) -> ApiResult<Json<MutationResult>> {
    if payload.is_empty() {
        return Err(InventoryError::validation(
            "nothing to update: send nombre, precio or stock",
        ));
    }
    payload.validate()?;
    let audit_in_app = state.audit_in_app;

    let affected = txn_with!(state.db.as_ref(), |txn, payload| {
        apply_update(txn, id, payload, audit_in_app).await
    }, &payload)?;

    debug!(id, affected, "producto update");
    Ok(Json(MutationResult::affected(affected)))
}

async fn delete_producto(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<MutationResult>> {
    let audit_in_app = state.audit_in_app;

    let affected = txn!(state.db.as_ref(), |txn| {
        remove_producto(txn, id, audit_in_app).await
    })?;

    debug!(id, affected, "producto delete");
    Ok(Json(MutationResult::affected(affected)))
}

async fn insert_producto(
    txn: &DatabaseTransaction,
    nuevo: NewProducto,
    audit_in_app: bool,
) -> ApiResult<ProductoModel> {
    let active = productos::ActiveModel {
        nombre: Set(nuevo.nombre),
        precio: Set(nuevo.precio),
        stock: Set(nuevo.stock),
        ..Default::default()
    };
    let producto = active.insert(txn).await?;

    if audit_in_app {
        let detalle = audit::snapshot_payload(&ProductState::from(&producto))?;
        add_audit(txn, AuditAction::Insert, producto.id, detalle).await?;
    }
    Ok(producto)
}

async fn apply_update(
    txn: &DatabaseTransaction,
    id: i32,
    payload: UpdateProducto,
    audit_in_app: bool,
) -> ApiResult<u64> {
    let Some(producto) = find_locked(txn, id).await? else {
        return Ok(0);
    };

    let antes = ProductState::from(&producto);
    let mut active: productos::ActiveModel = producto.into();
    if let Some(nombre) = payload.nombre {
        active.nombre = Set(nombre);
    }
    if let Some(precio) = payload.precio {
        active.precio = Set(precio);
    }
    if let Some(stock) = payload.stock {
        active.stock = Set(stock);
    }
    let updated = match active.update(txn).await {
        Ok(updated) => updated,
        // deleted by a concurrent request between the read and the write
        Err(DbErr::RecordNotUpdated) => return Ok(0),
        Err(err) => return Err(err.into()),
    };

    if audit_in_app {
        let despues = ProductState::from(&updated);
        let detalle = audit::change_payload(&antes, &despues)?;
        add_audit(txn, AuditAction::Update, updated.id, detalle).await?;
    }
    Ok(1)
}

async fn remove_producto(
    txn: &DatabaseTransaction,
    id: i32,
    audit_in_app: bool,
) -> ApiResult<u64> {
    let Some(producto) = find_locked(txn, id).await? else {
        return Ok(0);
    };

    let result = productos::Entity::delete_by_id(id).exec(txn).await?;
    if audit_in_app && result.rows_affected > 0 {
        let detalle = audit::snapshot_payload(&ProductState::from(&producto))?;
        add_audit(txn, AuditAction::Delete, id, detalle).await?;
    }
    Ok(result.rows_affected)
}

/// Reads a product row with `FOR UPDATE` so the mutation and its audit
/// snapshot see the same state.
async fn find_locked(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<Option<ProductoModel>, DbErr> {
    productos::Entity::find_by_id(id)
        .lock_exclusive()
        .one(txn)
        .await
}

async fn add_audit<C: ConnectionTrait>(
    db: &C,
    accion: AuditAction,
    id_registro: i32,
    detalle: String,
) -> Result<(), DbErr> {
    let active = bitacora::ActiveModel {
        tabla: Set(PRODUCTS_TABLE.to_string()),
        accion: Set(accion.to_string()),
        id_registro: Set(id_registro),
        detalle: Set(Some(detalle)),
        ..Default::default()
    };
    match active.insert(db).await {
        Ok(_) => {
            metrics::inc_audit_write(accion);
            Ok(())
        }
        Err(err) => {
            metrics::inc_audit_write_failure();
            Err(err)
        }
    }
}

async fn load_bitacora(db: &DatabaseConnection) -> Result<Vec<BitacoraModel>, DbErr> {
    bitacora::Entity::find()
        .order_by_desc(bitacora::Column::RealizadoEn)
        .order_by_desc(bitacora::Column::Id)
        .all(db)
        .await
}

async fn list_bitacora(State(state): State<AppState>) -> ApiResult<Json<Vec<BitacoraModel>>> {
    Ok(Json(load_bitacora(&state.db).await?))
}

async fn bitacora_report(State(state): State<AppState>) -> ApiResult<Json<Vec<AuditReportRow>>> {
    let rows = load_bitacora(&state.db).await?;
    Ok(Json(audit::normalize(rows)))
}

async fn export_bitacora_csv(State(state): State<AppState>) -> ApiResult<Response> {
    let rows = audit::normalize(load_bitacora(&state.db).await?);
    let body = to_csv(&rows);
    Ok((
        [
            (header::CONTENT_TYPE, CSV_CONTENT_TYPE),
            (header::CONTENT_DISPOSITION, CSV_DISPOSITION),
        ],
        body,
    )
        .into_response())
}

async fn productos_range_report(
    State(state): State<AppState>,
    Query(params): Query<ReportRangeQuery>,
) -> ApiResult<Json<Vec<JsonValue>>> {
    let (ini, fin) = params.bounds()?;
    let backend = state.db.get_database_backend();
    let rows = JsonValue::find_by_statement(Statement::from_sql_and_values(
        backend,
        "SELECT * FROM sp_reporte_productos_rango($1, $2)",
        [ini.into(), fin.into()],
    ))
    .all(state.db.as_ref())
    .await?;
    Ok(Json(rows))
}

async fn render_metrics() -> ApiResult<Response> {
    metrics::render_metrics()
}

async fn api_route_not_found(Path(rest): Path<String>) -> ApiResult<()> {
    Err(InventoryError::not_found(format!("no API route at /api/{}", rest)))
}
