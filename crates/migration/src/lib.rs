use sea_orm_migration::prelude::*;

mod m20261001_000001_productos;
mod m20261001_000002_bitacora;
mod m20261001_000003_reporte_rango;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261001_000001_productos::Migration),
            Box::new(m20261001_000002_bitacora::Migration),
            Box::new(m20261001_000003_reporte_rango::Migration),
        ]
    }
}
