//! Transaction helper macros.
//!
//! Every product mutation and its audit row share one transaction; these
//! macros keep the `Box::pin(async move { .. })` boilerplate out of handlers.

/// Runs `$body` inside a transaction on `$db`.
///
/// The body must evaluate to `Result<T, E>`; the macro yields
/// `Result<T, TransactionError<E>>`, which converts into `InventoryError`
/// with `?`.
///
/// # Example
///
/// ```ignore
/// let producto = txn!(&state.db, |txn| {
///     let active = productos::ActiveModel {
///         nombre: Set(nombre),
///         ..Default::default()
///     };
///     Ok::<_, InventoryError>(active.insert(txn).await?)
/// })?;
/// ```
#[macro_export]
macro_rules! txn {
    ($db:expr, |$txn:ident| $body:expr) => {{
        use sea_orm::TransactionTrait;
        $db.transaction(|$txn| Box::pin(async move { $body })).await
    }};
}

/// Like [`txn!`], cloning the listed values before they move into the
/// transaction closure.
///
/// ```ignore
/// let affected = txn_with!(&state.db, |txn, payload| {
///     update_producto_in(txn, id, payload, audit).await
/// }, &payload)?;
/// ```
#[macro_export]
macro_rules! txn_with {
    ($db:expr, |$txn:ident, $($param:ident),*| $body:expr, $($arg:expr),*) => {{
        use sea_orm::TransactionTrait;
        $(let $param = $arg.clone();)*
        $db.transaction(|$txn| Box::pin(async move { $body })).await
    }};
}
