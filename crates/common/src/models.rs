use crate::error::{InventoryError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Table name recorded in `bitacora.tabla` for product mutations.
pub const PRODUCTS_TABLE: &str = "productos";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditAction {
    Insert,
    Update,
    Delete,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "INSERT" => Ok(Self::Insert),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            other => Err(InventoryError::validation(format!(
                "unknown audit action {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateProducto {
    pub nombre: Option<String>,
    pub precio: Option<f64>,
    pub stock: Option<i32>,
}

/// A create request that passed validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewProducto {
    pub nombre: String,
    pub precio: f64,
    pub stock: i32,
}

impl CreateProducto {
    /// Checks required fields, reporting every missing one at once.
    pub fn validate(self) -> Result<NewProducto> {
        let nombre = self.nombre.filter(|n| !n.trim().is_empty());
        let mut missing = Vec::new();
        if nombre.is_none() {
            missing.push("nombre");
        }
        if self.precio.is_none() {
            missing.push("precio");
        }
        if self.stock.is_none() {
            missing.push("stock");
        }

        match (nombre, self.precio, self.stock) {
            (Some(nombre), Some(precio), Some(stock)) => {
                check_precio(precio)?;
                check_stock(stock)?;
                Ok(NewProducto {
                    nombre,
                    precio,
                    stock,
                })
            }
            _ => Err(InventoryError::validation(format!(
                "missing fields: {}",
                missing.join(", ")
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProducto {
    pub nombre: Option<String>,
    pub precio: Option<f64>,
    pub stock: Option<i32>,
}

impl UpdateProducto {
    pub fn validate(&self) -> Result<()> {
        if let Some(nombre) = &self.nombre {
            if nombre.trim().is_empty() {
                return Err(InventoryError::validation("nombre must not be empty"));
            }
        }
        if let Some(precio) = self.precio {
            check_precio(precio)?;
        }
        if let Some(stock) = self.stock {
            check_stock(stock)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.nombre.is_none() && self.precio.is_none() && self.stock.is_none()
    }
}

fn check_precio(precio: f64) -> Result<()> {
    if !precio.is_finite() || precio < 0.0 {
        return Err(InventoryError::validation(format!(
            "precio must be a non-negative number, got {}",
            precio
        )));
    }
    Ok(())
}

fn check_stock(stock: i32) -> Result<()> {
    if stock < 0 {
        return Err(InventoryError::validation(format!(
            "stock must be non-negative, got {}",
            stock
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductoCreated {
    pub id: i32,
    pub nombre: String,
    pub precio: f64,
    pub stock: i32,
}

/// Outcome of an update or delete; `affectedRows` is 0 when the id did not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationResult {
    pub ok: bool,
    #[serde(rename = "affectedRows")]
    pub affected_rows: u64,
}

impl MutationResult {
    pub fn affected(affected_rows: u64) -> Self {
        Self {
            ok: true,
            affected_rows,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportRangeQuery {
    pub ini: Option<String>,
    pub fin: Option<String>,
}

impl ReportRangeQuery {
    /// Inclusive calendar-date bounds.
    pub fn bounds(&self) -> Result<(NaiveDate, NaiveDate)> {
        let (ini, fin) = match (non_blank(&self.ini), non_blank(&self.fin)) {
            (Some(ini), Some(fin)) => (ini, fin),
            _ => {
                return Err(InventoryError::validation(
                    "use ?ini=YYYY-MM-DD&fin=YYYY-MM-DD",
                ));
            }
        };
        Ok((parse_date("ini", ini)?, parse_date("fin", fin)?))
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        InventoryError::validation(format!("{} must be YYYY-MM-DD, got {}", field, value))
    })
}
