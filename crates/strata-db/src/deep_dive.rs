//! Package / Component / Transformation / Column Lineage persistence
//! (`spec.md` §4.F "deep-dive bridging").

use crate::error::{DbError, Result};
use crate::LineageStore;
use strata_ids::{AssetId, ColumnLineageId, ComponentId, PackageId, SolutionId};
use strata_protocol::{ColumnLineage, ComponentType, Operation, Package, PackageComponent, TransformationIr};

impl LineageStore {
    pub async fn insert_package(&self, package: &Package) -> Result<()> {
        sqlx::query("INSERT INTO package (id, project_id, name, source_path) VALUES (?, ?, ?, ?)")
            .bind(&package.id)
            .bind(&package.project_id)
            .bind(&package.name)
            .bind(&package.source_path)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn insert_component(&self, component: &PackageComponent, asset_id: Option<&AssetId>) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO package_component
               (id, package_id, asset_id, name, component_type, order_index)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&component.id)
        .bind(&component.package_id)
        .bind(asset_id)
        .bind(&component.name)
        .bind(component.component_type)
        .bind(component.order_index)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Insert a transformation, nulling an invalid `source_component_id`
    /// rather than rejecting the row (`spec.md` §4.F sanitization rule).
    pub async fn insert_transformation(&self, transformation: &TransformationIr) -> Result<()> {
        let source_component_id = match &transformation.source_component_id {
            Some(id) if self.component_exists(id).await? => Some(id.clone()),
            _ => None,
        };
        sqlx::query(
            r#"INSERT INTO transformation_ir
               (id, package_id, source_component_id, operation, detail)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(&transformation.id)
        .bind(&transformation.package_id)
        .bind(&source_component_id)
        .bind(transformation.operation)
        .bind(&transformation.detail)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn component_exists(&self, id: &ComponentId) -> Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM package_component WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    pub async fn insert_column_lineage(&self, lineage: &ColumnLineage) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO column_lineage
               (id, project_id, source_asset_id, source_column, target_asset_id,
                target_column, transformation_rule, confidence)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&lineage.id)
        .bind(&lineage.project_id)
        .bind(&lineage.source_asset_id)
        .bind(&lineage.source_column)
        .bind(&lineage.target_asset_id)
        .bind(&lineage.target_column)
        .bind(&lineage.transformation_rule)
        .bind(lineage.confidence)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_column_lineage(&self, project_id: &SolutionId) -> Result<Vec<ColumnLineage>> {
        let rows = sqlx::query_as::<_, ColumnLineageRow>(
            r#"SELECT id, project_id, source_asset_id, source_column, target_asset_id,
                      target_column, transformation_rule, confidence
               FROM column_lineage WHERE project_id = ?"#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get_package(&self, id: &PackageId) -> Result<Package> {
        let row = sqlx::query_as::<_, PackageRow>(
            "SELECT id, project_id, name, source_path FROM package WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Into::into)
            .ok_or_else(|| DbError::not_found(format!("package {id} not found")))
    }

    pub async fn list_components(&self, package_id: &PackageId) -> Result<Vec<PackageComponent>> {
        let rows = sqlx::query_as::<_, ComponentRow>(
            r#"SELECT id, package_id, name, component_type, order_index
               FROM package_component WHERE package_id = ? ORDER BY order_index"#,
        )
        .bind(package_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[derive(sqlx::FromRow)]
struct PackageRow {
    id: PackageId,
    project_id: SolutionId,
    name: String,
    source_path: String,
}

impl From<PackageRow> for Package {
    fn from(row: PackageRow) -> Self {
        Package {
            id: row.id,
            project_id: row.project_id,
            name: row.name,
            source_path: row.source_path,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ComponentRow {
    id: ComponentId,
    package_id: PackageId,
    name: String,
    component_type: ComponentType,
    order_index: i64,
}

impl From<ComponentRow> for PackageComponent {
    fn from(row: ComponentRow) -> Self {
        PackageComponent {
            id: row.id,
            package_id: row.package_id,
            name: row.name,
            component_type: row.component_type,
            order_index: row.order_index,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ColumnLineageRow {
    id: ColumnLineageId,
    project_id: SolutionId,
    source_asset_id: Option<AssetId>,
    source_column: String,
    target_asset_id: Option<AssetId>,
    target_column: String,
    transformation_rule: Option<String>,
    confidence: f64,
}

impl From<ColumnLineageRow> for ColumnLineage {
    fn from(row: ColumnLineageRow) -> Self {
        ColumnLineage {
            id: row.id,
            project_id: row.project_id,
            source_asset_id: row.source_asset_id,
            source_column: row.source_column,
            target_asset_id: row.target_asset_id,
            target_column: row.target_column,
            transformation_rule: row.transformation_rule,
            confidence: row.confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_ids::TransformationId;
    use strata_protocol::Solution;

    async fn seeded_solution(store: &LineageStore) -> SolutionId {
        let solution = Solution::new("acme-etl", "git://example/acme-etl.git");
        store.insert_solution(&solution).await.unwrap();
        solution.id
    }

    #[tokio::test]
    async fn transformation_with_missing_component_is_nulled_not_rejected() {
        let store = LineageStore::open(None).await.unwrap();
        let project_id = seeded_solution(&store).await;
        let package = Package {
            id: PackageId::new(),
            project_id,
            name: "LoadCustomers.dtsx".to_string(),
            source_path: "pkgs/LoadCustomers.dtsx".to_string(),
        };
        store.insert_package(&package).await.unwrap();

        let transformation = TransformationIr {
            id: TransformationId::new(),
            package_id: package.id,
            source_component_id: Some(ComponentId::new()),
            operation: Operation::Write,
            detail: "dangling reference".to_string(),
        };
        store.insert_transformation(&transformation).await.unwrap();

        let row: (Option<String>,) =
            sqlx::query_as("SELECT source_component_id FROM transformation_ir WHERE id = ?")
                .bind(&transformation.id)
                .fetch_one(store.pool())
                .await
                .unwrap();
        assert!(row.0.is_none());
    }
}
