pub mod bitacora;
pub mod productos;
