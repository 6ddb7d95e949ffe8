//! Audit detail payloads and the normalized report projection.
//!
//! `bitacora.detalle` holds one of two JSON shapes depending on the action:
//! a flat `{nombre, precio, stock}` for INSERT/DELETE and
//! `{antes: {...}, despues: {...}}` for UPDATE. Rows are projected into flat
//! report rows; anything that does not match a known shape is passed through
//! untouched.

use crate::csv::CsvRow;
use crate::entities::{bitacora, productos};
use crate::models::AuditAction;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

/// Product state written into a detail payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductState {
    pub nombre: String,
    pub precio: f64,
    pub stock: i32,
}

impl From<&productos::Model> for ProductState {
    fn from(model: &productos::Model) -> Self {
        Self {
            nombre: model.nombre.clone(),
            precio: model.precio,
            stock: model.stock,
        }
    }
}

#[derive(Serialize)]
struct ChangePayload<'a> {
    antes: &'a ProductState,
    despues: &'a ProductState,
}

/// Payload for INSERT and DELETE entries.
pub fn snapshot_payload(state: &ProductState) -> serde_json::Result<String> {
    serde_json::to_string(state)
}

/// Payload for UPDATE entries.
pub fn change_payload(antes: &ProductState, despues: &ProductState) -> serde_json::Result<String> {
    serde_json::to_string(&ChangePayload { antes, despues })
}

/// Product fields as read back from a payload. Values are kept verbatim so
/// numbers written as strings by other writers survive the projection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailFields {
    pub nombre: Option<JsonValue>,
    pub precio: Option<JsonValue>,
    pub stock: Option<JsonValue>,
}

impl DetailFields {
    fn from_value(value: Option<&JsonValue>) -> Self {
        match value.and_then(JsonValue::as_object) {
            Some(object) => Self::from_object(object),
            None => Self::default(),
        }
    }

    fn from_object(object: &Map<String, JsonValue>) -> Self {
        Self {
            nombre: object.get("nombre").cloned(),
            precio: object.get("precio").cloned(),
            stock: object.get("stock").cloned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuditDetail {
    /// Full row state (INSERT/DELETE shape).
    Snapshot(DetailFields),
    /// Before/after pair (UPDATE shape).
    Change {
        antes: DetailFields,
        despues: DetailFields,
    },
    /// Unparseable or unknown payload, kept raw.
    Unrecognized(Option<String>),
}

impl AuditDetail {
    /// Parses a raw payload for the given action. Never fails.
    pub fn parse(accion: &str, detalle: Option<&str>) -> Self {
        let unrecognized = || Self::Unrecognized(detalle.map(str::to_string));

        let Some(raw) = detalle else {
            return unrecognized();
        };
        let parsed = match serde_json::from_str::<JsonValue>(raw) {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!(error = %err, "audit detail is not valid JSON");
                return unrecognized();
            }
        };
        let Some(object) = parsed.as_object() else {
            return unrecognized();
        };

        let is_update = accion.parse::<AuditAction>().ok() == Some(AuditAction::Update);
        if is_update && object.contains_key("antes") && object.contains_key("despues") {
            return Self::Change {
                antes: DetailFields::from_value(object.get("antes")),
                despues: DetailFields::from_value(object.get("despues")),
            };
        }
        if object.contains_key("nombre") {
            return Self::Snapshot(DetailFields::from_object(object));
        }
        unrecognized()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotRow {
    pub id: i32,
    pub tabla: String,
    pub accion: String,
    pub id_registro: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nombre: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precio: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<JsonValue>,
    pub realizado_en: DateTimeWithTimeZone,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeRow {
    pub id: i32,
    pub tabla: String,
    pub accion: String,
    pub id_registro: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub antes_nombre: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub antes_precio: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub antes_stock: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub despues_nombre: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub despues_precio: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub despues_stock: Option<JsonValue>,
    pub realizado_en: DateTimeWithTimeZone,
}

/// One row of the normalized audit report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AuditReportRow {
    Change(ChangeRow),
    Snapshot(SnapshotRow),
    Raw(bitacora::Model),
}

const SNAPSHOT_COLUMNS: &[&str] = &[
    "id",
    "tabla",
    "accion",
    "id_registro",
    "nombre",
    "precio",
    "stock",
    "realizado_en",
];

const CHANGE_COLUMNS: &[&str] = &[
    "id",
    "tabla",
    "accion",
    "id_registro",
    "antes_nombre",
    "antes_precio",
    "antes_stock",
    "despues_nombre",
    "despues_precio",
    "despues_stock",
    "realizado_en",
];

const RAW_COLUMNS: &[&str] = &[
    "id",
    "tabla",
    "accion",
    "id_registro",
    "detalle",
    "realizado_en",
];

impl From<bitacora::Model> for AuditReportRow {
    fn from(row: bitacora::Model) -> Self {
        match AuditDetail::parse(&row.accion, row.detalle.as_deref()) {
            AuditDetail::Change { antes, despues } => Self::Change(ChangeRow {
                id: row.id,
                tabla: row.tabla,
                accion: row.accion,
                id_registro: row.id_registro,
                antes_nombre: antes.nombre,
                antes_precio: antes.precio,
                antes_stock: antes.stock,
                despues_nombre: despues.nombre,
                despues_precio: despues.precio,
                despues_stock: despues.stock,
                realizado_en: row.realizado_en,
            }),
            AuditDetail::Snapshot(fields) => Self::Snapshot(SnapshotRow {
                id: row.id,
                tabla: row.tabla,
                accion: row.accion,
                id_registro: row.id_registro,
                nombre: fields.nombre,
                precio: fields.precio,
                stock: fields.stock,
                realizado_en: row.realizado_en,
            }),
            AuditDetail::Unrecognized(_) => Self::Raw(row),
        }
    }
}

/// Projects raw audit rows, keeping their order.
pub fn normalize(rows: Vec<bitacora::Model>) -> Vec<AuditReportRow> {
    rows.into_iter().map(AuditReportRow::from).collect()
}

impl AuditReportRow {
    pub fn id(&self) -> i32 {
        match self {
            Self::Change(row) => row.id,
            Self::Snapshot(row) => row.id,
            Self::Raw(row) => row.id,
        }
    }
}

fn json_cell(value: &Option<JsonValue>) -> Option<String> {
    match value {
        None | Some(JsonValue::Null) => None,
        Some(JsonValue::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    }
}

impl CsvRow for AuditReportRow {
    fn columns(&self) -> Vec<&str> {
        match self {
            Self::Change(_) => CHANGE_COLUMNS.to_vec(),
            Self::Snapshot(_) => SNAPSHOT_COLUMNS.to_vec(),
            Self::Raw(_) => RAW_COLUMNS.to_vec(),
        }
    }

    fn cell(&self, column: &str) -> Option<String> {
        let (id, tabla, accion, id_registro, realizado_en) = match self {
            Self::Change(r) => (r.id, &r.tabla, &r.accion, r.id_registro, &r.realizado_en),
            Self::Snapshot(r) => (r.id, &r.tabla, &r.accion, r.id_registro, &r.realizado_en),
            Self::Raw(r) => (r.id, &r.tabla, &r.accion, r.id_registro, &r.realizado_en),
        };
        match column {
            "id" => return Some(id.to_string()),
            "tabla" => return Some(tabla.clone()),
            "accion" => return Some(accion.clone()),
            "id_registro" => return Some(id_registro.to_string()),
            "realizado_en" => return Some(realizado_en.to_rfc3339()),
            _ => {}
        }
        match (self, column) {
            (Self::Snapshot(r), "nombre") => json_cell(&r.nombre),
            (Self::Snapshot(r), "precio") => json_cell(&r.precio),
            (Self::Snapshot(r), "stock") => json_cell(&r.stock),
            (Self::Change(r), "antes_nombre") => json_cell(&r.antes_nombre),
            (Self::Change(r), "antes_precio") => json_cell(&r.antes_precio),
            (Self::Change(r), "antes_stock") => json_cell(&r.antes_stock),
            (Self::Change(r), "despues_nombre") => json_cell(&r.despues_nombre),
            (Self::Change(r), "despues_precio") => json_cell(&r.despues_precio),
            (Self::Change(r), "despues_stock") => json_cell(&r.despues_stock),
            (Self::Raw(r), "detalle") => r.detalle.clone(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv::to_csv;
    use chrono::{FixedOffset, TimeZone};
    use serde_json::json;

    fn ts(minute: u32) -> DateTimeWithTimeZone {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2025, 3, 1, 10, minute, 0)
            .unwrap()
    }

    fn row(id: i32, accion: &str, detalle: Option<&str>) -> bitacora::Model {
        bitacora::Model {
            id,
            tabla: "productos".to_string(),
            accion: accion.to_string(),
            id_registro: 7,
            detalle: detalle.map(str::to_string),
            realizado_en: ts(id as u32),
        }
    }

    #[test]
    fn test_insert_payload_flattens_without_prefixes() {
        let normalized =
            AuditReportRow::from(row(1, "INSERT", Some(r#"{"nombre":"X","precio":9.5,"stock":3}"#)));
        let value = serde_json::to_value(&normalized).unwrap();

        assert_eq!(value["nombre"], json!("X"));
        assert_eq!(value["precio"], json!(9.5));
        assert_eq!(value["stock"], json!(3));
        assert_eq!(value["accion"], json!("INSERT"));
        assert_eq!(value["id_registro"], json!(7));
        let object = value.as_object().unwrap();
        assert!(object.keys().all(|k| !k.starts_with("antes_") && !k.starts_with("despues_")));
        assert!(!object.contains_key("detalle"));
    }

    #[test]
    fn test_update_payload_flattens_with_prefixes() {
        let detalle = r#"{"antes":{"nombre":"A","precio":1,"stock":2},"despues":{"nombre":"B","precio":"1.50","stock":4}}"#;
        let normalized = AuditReportRow::from(row(2, "UPDATE", Some(detalle)));

        let AuditReportRow::Change(change) = &normalized else {
            panic!("expected change row, got {:?}", normalized);
        };
        assert_eq!(change.antes_nombre, Some(json!("A")));
        assert_eq!(change.antes_stock, Some(json!(2)));
        assert_eq!(change.despues_nombre, Some(json!("B")));
        assert_eq!(change.despues_precio, Some(json!("1.50")));
        assert_eq!(normalized.cell("despues_precio").as_deref(), Some("1.50"));
        assert_eq!(normalized.cell("antes_precio").as_deref(), Some("1"));
    }

    #[test]
    fn test_update_missing_after_falls_back_to_raw() {
        let detalle = r#"{"antes":{"nombre":"A","precio":1,"stock":2},"despues_typo":{}}"#;
        let normalized = AuditReportRow::from(row(3, "UPDATE", Some(detalle)));

        assert_eq!(normalized, AuditReportRow::Raw(row(3, "UPDATE", Some(detalle))));
        let value = serde_json::to_value(&normalized).unwrap();
        assert_eq!(value["detalle"], json!(detalle));
    }

    #[test]
    fn test_malformed_json_falls_back_to_raw() {
        let normalized = AuditReportRow::from(row(4, "DELETE", Some("{nombre:")));
        assert!(matches!(normalized, AuditReportRow::Raw(_)));
        assert_eq!(normalized.cell("detalle").as_deref(), Some("{nombre:"));

        let normalized = AuditReportRow::from(row(5, "DELETE", None));
        assert!(matches!(normalized, AuditReportRow::Raw(_)));
        assert_eq!(normalized.cell("detalle"), None);
    }

    #[test]
    fn test_non_object_payload_is_unrecognized() {
        assert_eq!(
            AuditDetail::parse("INSERT", Some("[1,2]")),
            AuditDetail::Unrecognized(Some("[1,2]".to_string()))
        );
        assert_eq!(
            AuditDetail::parse("INSERT", Some("null")),
            AuditDetail::Unrecognized(Some("null".to_string()))
        );
    }

    #[test]
    fn test_change_shape_only_counts_for_update() {
        let detalle = r#"{"antes":{"nombre":"A"},"despues":{"nombre":"B"}}"#;
        assert!(matches!(
            AuditDetail::parse("INSERT", Some(detalle)),
            AuditDetail::Unrecognized(_)
        ));
    }

    #[test]
    fn test_update_with_flat_shape_uses_snapshot() {
        let detail = AuditDetail::parse("UPDATE", Some(r#"{"nombre":"Z","stock":1}"#));
        let AuditDetail::Snapshot(fields) = detail else {
            panic!("expected snapshot");
        };
        assert_eq!(fields.nombre, Some(json!("Z")));
        assert_eq!(fields.precio, None);
    }

    #[test]
    fn test_normalize_keeps_order() {
        let rows = vec![
            row(9, "DELETE", Some(r#"{"nombre":"C","precio":2,"stock":0}"#)),
            row(8, "UPDATE", Some("oops")),
            row(7, "INSERT", Some(r#"{"nombre":"C","precio":2,"stock":1}"#)),
        ];
        let ids: Vec<i32> = normalize(rows).iter().map(AuditReportRow::id).collect();
        assert_eq!(ids, vec![9, 8, 7]);
    }

    #[test]
    fn test_payload_writers_match_reader_shapes() {
        let antes = ProductState {
            nombre: "A".to_string(),
            precio: 1.5,
            stock: 2,
        };
        let despues = ProductState {
            nombre: "A".to_string(),
            precio: 2.0,
            stock: 2,
        };

        let payload = snapshot_payload(&antes).unwrap();
        assert!(matches!(
            AuditDetail::parse("INSERT", Some(&payload)),
            AuditDetail::Snapshot(_)
        ));

        let payload = change_payload(&antes, &despues).unwrap();
        let AuditDetail::Change { antes, despues } = AuditDetail::parse("UPDATE", Some(&payload))
        else {
            panic!("expected change");
        };
        assert_eq!(antes.precio, Some(json!(1.5)));
        assert_eq!(despues.precio, Some(json!(2.0)));
    }

    #[test]
    fn test_mixed_rows_export_union_of_columns() {
        let rows = normalize(vec![
            row(2, "UPDATE", Some("broken")),
            row(1, "INSERT", Some(r#"{"nombre":"A,B","precio":3,"stock":1}"#)),
        ]);
        let csv = to_csv(&rows);
        let mut lines = csv.lines();

        assert_eq!(
            lines.next(),
            Some("id,tabla,accion,id_registro,detalle,realizado_en,nombre,precio,stock")
        );
        assert_eq!(
            lines.next(),
            Some("2,productos,UPDATE,7,broken,2025-03-01T10:02:00+00:00,,,")
        );
        assert_eq!(
            lines.next(),
            Some("1,productos,INSERT,7,,2025-03-01T10:01:00+00:00,\"A,B\",3,1")
        );
        assert_eq!(lines.next(), None);
    }
}
