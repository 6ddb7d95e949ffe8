use axum::extract::FromRequest;
use inventory_common::InventoryError;

/// `Json` whose rejections render as the API's `{"error": ...}` 400.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(InventoryError))]
pub struct JsonBody<T>(pub T);
