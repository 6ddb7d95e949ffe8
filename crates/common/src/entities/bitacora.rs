use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Audit row. `detalle` is kept as raw text: rows written by database
/// triggers are not guaranteed to hold valid JSON.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bitacora")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub tabla: String,
    pub accion: String,
    pub id_registro: i32,
    #[sea_orm(column_type = "Text", nullable)]
    pub detalle: Option<String>,
    pub realizado_en: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        unreachable!("bitacora has no relations")
    }
}

impl ActiveModelBehavior for ActiveModel {}
