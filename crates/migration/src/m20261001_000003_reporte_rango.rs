use sea_orm_migration::prelude::*;

/// Installs the stored report `sp_reporte_productos_rango(ini, fin)`: products
/// created between two calendar dates, both inclusive.
#[derive(DeriveMigrationName)]
pub struct Migration;

const CREATE_FUNCTION: &str = r#"
CREATE OR REPLACE FUNCTION sp_reporte_productos_rango(p_ini DATE, p_fin DATE)
RETURNS TABLE (
    id INTEGER,
    nombre VARCHAR,
    precio DOUBLE PRECISION,
    stock INTEGER,
    creado_en TIMESTAMPTZ
)
LANGUAGE sql STABLE AS $$
    SELECT p.id, p.nombre, p.precio, p.stock, p.creado_en
    FROM productos p
    WHERE p.creado_en::date BETWEEN p_ini AND p_fin
    ORDER BY p.creado_en, p.id
$$;
"#;

const DROP_FUNCTION: &str = "DROP FUNCTION IF EXISTS sp_reporte_productos_rango(DATE, DATE);";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(CREATE_FUNCTION)
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(DROP_FUNCTION)
            .await?;
        Ok(())
    }
}
