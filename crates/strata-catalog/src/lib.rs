//! Catalog Sync (`spec.md` §4.F): folds one `ExtractionResult` (plus an
//! optional `DeepDiveResult`) into the persistent asset/edge/evidence
//! graph, idempotently.
//!
//! Sync order within one item is always assets, then evidences, then edges
//! — an edge can only resolve its endpoints once both sides' assets exist,
//! and evidence rows must exist before an edge can link to them.

pub mod error;

pub use error::{CatalogError, Result};

use serde_json::json;
use std::collections::BTreeMap;
use std::str::FromStr;
use strata_db::LineageStore;
use strata_ids::{AssetId, ComponentId, EvidenceId, PackageId, SolutionId};
use strata_protocol::{
    Asset, AssetType, ColumnLineage, ComponentType, DeepDiveResult, Edge, EdgeType, Evidence,
    EvidenceKind, ExtractionResult, Locator, Operation, Package, PackageComponent,
    TransformationIr,
};
use tracing::{debug, warn};

/// Outcome of syncing one `ExtractionResult` into the catalog: the local
/// `node_id -> AssetId` map callers need to thread `DeepDiveResult`
/// references (`source_ref`/`target_ref`) through.
#[derive(Debug, Default, Clone)]
pub struct SyncOutcome {
    pub node_map: BTreeMap<String, AssetId>,
    pub assets_touched: usize,
    pub edges_touched: usize,
    pub evidences_touched: usize,
}

pub struct CatalogSync {
    store: LineageStore,
}

impl CatalogSync {
    pub fn new(store: LineageStore) -> Self {
        Self { store }
    }

    /// Apply one extractor's macro output: assets, then evidences, then
    /// edges (`spec.md` §4.F steps 1-3).
    ///
    /// `file_hash` is the source file's sha256 (the plan item's
    /// `file_hash`), stamped onto every evidence row that doesn't already
    /// carry one of its own. The rerun-skip check in `strata-planner`
    /// matches on this hash, so without it every evidence row would persist
    /// with `hash = NULL` and a rerun could never recognize an unchanged
    /// file as already processed.
    pub async fn sync_extraction(
        &self,
        project_id: &SolutionId,
        result: &ExtractionResult,
        file_hash: &str,
    ) -> Result<SyncOutcome> {
        let mut outcome = SyncOutcome::default();

        for node in &result.nodes {
            let asset_type =
                AssetType::from_str(&node.node_type).unwrap_or(AssetType::Unknown);
            let mut asset = Asset::new(project_id.clone(), asset_type, &node.name, &node.system);
            asset.canonical_name = node.node_id.clone();

            let asset_id = self.store.sync_asset(&asset, &node.attributes).await?;
            outcome.node_map.insert(node.node_id.clone(), asset_id);
            outcome.assets_touched += 1;
        }

        let mut evidence_ids: Vec<EvidenceId> = Vec::with_capacity(result.evidences.len());
        for ev in &result.evidences {
            let kind = EvidenceKind::from_str(&ev.kind).unwrap_or(EvidenceKind::Code);
            let mut evidence = Evidence::new(project_id.clone(), &ev.file_path, kind, &ev.snippet);
            evidence.locator = Locator {
                file: ev.file_path.clone(),
                line_start: ev.line_start,
                line_end: ev.line_end,
                xpath: ev.xpath.clone(),
                byte_start: None,
                byte_end: None,
            };
            evidence = match &ev.hash {
                Some(hash) => evidence.with_hash(hash.clone()),
                None => evidence.with_hash(file_hash.to_string()),
            };
            let evidence_id = self.store.insert_evidence(&evidence).await?;
            evidence_ids.push(evidence_id);
            outcome.evidences_touched += 1;
        }

        for edge in &result.edges {
            let (Some(from), Some(to)) = (
                outcome.node_map.get(&edge.from_node_id),
                outcome.node_map.get(&edge.to_node_id),
            ) else {
                warn!(
                    from = %edge.from_node_id,
                    to = %edge.to_node_id,
                    "skipping edge: endpoint not present in this extraction's node map"
                );
                continue;
            };
            let edge_type = match EdgeType::from_str(&edge.edge_type) {
                Ok(t) => t,
                Err(_) => {
                    warn!(edge_type = %edge.edge_type, "skipping edge: unrecognized edge type");
                    continue;
                }
            };

            let mut stored = Edge::new(
                project_id.clone(),
                from.clone(),
                to.clone(),
                edge_type,
                edge.confidence,
                result.meta.extractor_id.clone(),
            );
            stored.is_hypothesis = edge.is_hypothesis;
            stored.rationale = edge.rationale.clone();

            let edge_id = self.store.upsert_edge(&stored).await?;
            outcome.edges_touched += 1;

            for &idx in &edge.evidence_refs {
                if let Some(evidence_id) = evidence_ids.get(idx) {
                    self.store.link_edge_evidence(&edge_id, evidence_id).await?;
                } else {
                    debug!(idx, "edge referenced an evidence index out of range, skipping link");
                }
            }
        }

        Ok(outcome)
    }

    /// Bridge a `DeepDiveResult` on top of an already-synced
    /// `ExtractionResult` (`spec.md` §4.F deep-dive extension): upsert the
    /// `Package`, bridge each component to an `Asset`, sanitize and persist
    /// the transformation IR, and persist column lineage plus a
    /// `DETAILED_LINEAGE` edge when both endpoints resolve.
    pub async fn sync_deep_dive(
        &self,
        project_id: &SolutionId,
        source_path: &str,
        deep_dive: &DeepDiveResult,
        macro_outcome: &SyncOutcome,
    ) -> Result<()> {
        let package = Package {
            id: PackageId::new(),
            project_id: project_id.clone(),
            name: deep_dive.package_name.clone(),
            source_path: source_path.to_string(),
        };
        self.store.insert_package(&package).await?;

        let mut component_asset_ids: BTreeMap<String, AssetId> = BTreeMap::new();
        let mut component_ids: BTreeMap<String, ComponentId> = BTreeMap::new();

        for comp in &deep_dive.components {
            let component_type =
                ComponentType::from_str(&comp.component_type).unwrap_or(ComponentType::Transform);
            let asset_type = AssetType::for_component(component_type);
            let canonical_name = format!("{}:{}", deep_dive.package_name, comp.name);

            let mut asset = Asset::new(project_id.clone(), asset_type, &canonical_name, "unknown");
            asset.canonical_name = canonical_name.clone();
            let mut tags = BTreeMap::new();
            tags.insert("package_id".to_string(), json!(package.id.as_str()));
            let asset_id = self.store.sync_asset(&asset, &tags).await?;

            let component_id = ComponentId::new();
            let component = PackageComponent {
                id: component_id.clone(),
                package_id: package.id.clone(),
                name: comp.name.clone(),
                component_type,
                order_index: comp.order_index,
            };
            self.store.insert_component(&component, Some(&asset_id)).await?;

            component_asset_ids.insert(comp.component_id.clone(), asset_id);
            component_ids.insert(comp.component_id.clone(), component_id);
        }

        for transformation in &deep_dive.transformations {
            let source_component_id = transformation
                .source_component_id
                .as_ref()
                .and_then(|id| component_ids.get(id))
                .cloned();
            let operation =
                Operation::from_str(&transformation.operation).unwrap_or(Operation::Select);
            let ir = TransformationIr {
                id: strata_ids::TransformationId::new(),
                package_id: package.id.clone(),
                source_component_id,
                operation,
                detail: transformation.detail.clone(),
            };
            self.store.insert_transformation(&ir).await?;
        }

        for lineage in &deep_dive.column_lineage {
            let source_asset_id = lineage
                .source_ref
                .as_ref()
                .and_then(|r| self.resolve_asset_ref(r, macro_outcome, &component_asset_ids));
            let target_asset_id = lineage
                .target_ref
                .as_ref()
                .and_then(|r| self.resolve_asset_ref(r, macro_outcome, &component_asset_ids));

            let column_lineage = ColumnLineage {
                id: strata_ids::ColumnLineageId::new(),
                project_id: project_id.clone(),
                source_asset_id: source_asset_id.clone(),
                source_column: lineage.source_column.clone(),
                target_asset_id: target_asset_id.clone(),
                target_column: lineage.target_column.clone(),
                transformation_rule: lineage.transformation_rule.clone(),
                confidence: lineage.confidence,
            };
            self.store.insert_column_lineage(&column_lineage).await?;

            if column_lineage.both_endpoints_resolved() {
                let edge = Edge::new(
                    project_id.clone(),
                    source_asset_id.clone().unwrap(),
                    target_asset_id.clone().unwrap(),
                    EdgeType::DetailedLineage,
                    lineage.confidence,
                    "deep_dive".to_string(),
                );
                self.store.upsert_edge(&edge).await?;
            }
        }

        Ok(())
    }

    /// Resolve a `DeepDiveColumnLineage` endpoint reference, which may be a
    /// raw `AssetId` (uuid string), a `node_id` already present in the
    /// macro extraction's node map, a component's `component_id`, or a
    /// dotted `"schema.table.col"` string naming a table asset
    /// (`spec.md` §4.F).
    fn resolve_asset_ref(
        &self,
        reference: &str,
        macro_outcome: &SyncOutcome,
        component_asset_ids: &BTreeMap<String, AssetId>,
    ) -> Option<AssetId> {
        if let Some(id) = macro_outcome.node_map.get(reference) {
            return Some(id.clone());
        }
        if let Some(id) = component_asset_ids.get(reference) {
            return Some(id.clone());
        }
        if let Ok(id) = strata_ids::AssetId::parse(reference) {
            return Some(id);
        }
        if reference.contains('.') {
            let table_ref = reference.rsplit_once('.').map(|(table, _col)| table)?;
            return macro_outcome.node_map.get(table_ref).cloned();
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_protocol::{
        DeepDiveColumnLineage, DeepDiveComponent, ExtractedEdge, ExtractedNode, Solution,
    };

    async fn seeded_project(store: &LineageStore) -> SolutionId {
        let solution = Solution::new("acme-etl", "git://example/acme-etl.git");
        store.insert_solution(&solution).await.unwrap();
        solution.id
    }

    fn node(id: &str, node_type: &str, name: &str) -> ExtractedNode {
        ExtractedNode {
            node_id: id.to_string(),
            node_type: node_type.to_string(),
            name: name.to_string(),
            system: "sqlserver".to_string(),
            attributes: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn syncing_nodes_and_edges_creates_assets_and_edges() {
        let store = LineageStore::open(None).await.unwrap();
        let project_id = seeded_project(&store).await;
        let sync = CatalogSync::new(store.clone());

        let mut result = ExtractionResult::new("sql_parser", "scripts/load.sql");
        result.nodes.push(node("dbo.sales", "TABLE", "dbo.sales"));
        result.nodes.push(node("staging.sales_raw", "TABLE", "staging.sales_raw"));
        result.edges.push(ExtractedEdge {
            from_node_id: "dbo.sales".to_string(),
            to_node_id: "staging.sales_raw".to_string(),
            edge_type: "READS_FROM".to_string(),
            confidence: 1.0,
            is_hypothesis: false,
            rationale: None,
            evidence_refs: vec![],
        });

        let outcome = sync.sync_extraction(&project_id, &result, "deadbeef").await.unwrap();
        assert_eq!(outcome.assets_touched, 2);
        assert_eq!(outcome.edges_touched, 1);
        assert_eq!(store.count_assets(&project_id).await.unwrap(), 2);
        assert_eq!(store.count_edges(&project_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn rerunning_the_same_extraction_does_not_duplicate_rows() {
        let store = LineageStore::open(None).await.unwrap();
        let project_id = seeded_project(&store).await;
        let sync = CatalogSync::new(store.clone());

        let mut result = ExtractionResult::new("sql_parser", "scripts/load.sql");
        result.nodes.push(node("dbo.sales", "TABLE", "dbo.sales"));
        result.nodes.push(node("staging.sales_raw", "TABLE", "staging.sales_raw"));
        result.edges.push(ExtractedEdge {
            from_node_id: "dbo.sales".to_string(),
            to_node_id: "staging.sales_raw".to_string(),
            edge_type: "READS_FROM".to_string(),
            confidence: 0.6,
            is_hypothesis: true,
            rationale: None,
            evidence_refs: vec![],
        });

        sync.sync_extraction(&project_id, &result, "deadbeef").await.unwrap();

        let mut rerun = result.clone();
        rerun.edges[0].confidence = 0.95;
        rerun.edges[0].is_hypothesis = false;
        sync.sync_extraction(&project_id, &rerun, "deadbeef").await.unwrap();

        assert_eq!(store.count_assets(&project_id).await.unwrap(), 2);
        assert_eq!(store.count_edges(&project_id).await.unwrap(), 1);
        let edges = store.list_edges(&project_id).await.unwrap();
        assert_eq!(edges[0].confidence, 0.95);
        assert!(!edges[0].is_hypothesis);
    }

    #[tokio::test]
    async fn edge_with_unmapped_endpoint_is_skipped() {
        let store = LineageStore::open(None).await.unwrap();
        let project_id = seeded_project(&store).await;
        let sync = CatalogSync::new(store.clone());

        let mut result = ExtractionResult::new("sql_parser", "scripts/load.sql");
        result.nodes.push(node("dbo.sales", "TABLE", "dbo.sales"));
        result.edges.push(ExtractedEdge {
            from_node_id: "dbo.sales".to_string(),
            to_node_id: "nonexistent_node".to_string(),
            edge_type: "READS_FROM".to_string(),
            confidence: 1.0,
            is_hypothesis: false,
            rationale: None,
            evidence_refs: vec![],
        });

        let outcome = sync.sync_extraction(&project_id, &result, "deadbeef").await.unwrap();
        assert_eq!(outcome.edges_touched, 0);
        assert_eq!(store.count_edges(&project_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn deep_dive_bridges_components_and_column_lineage_into_detailed_lineage_edge() {
        let store = LineageStore::open(None).await.unwrap();
        let project_id = seeded_project(&store).await;
        let sync = CatalogSync::new(store.clone());

        let mut result = ExtractionResult::new("dtsx_walker", "pkgs/Load.dtsx");
        result.nodes.push(node("pkg::Load", "PROCESS", "Load"));
        result.nodes.push(node("dbo.Customers", "TABLE", "dbo.Customers"));
        result.nodes.push(node("stage.Customers", "TABLE", "stage.Customers"));
        let macro_outcome = sync.sync_extraction(&project_id, &result, "deadbeef").await.unwrap();

        let deep_dive = DeepDiveResult {
            package_id: "pkg::Load".to_string(),
            package_name: "Load".to_string(),
            components: vec![
                DeepDiveComponent {
                    component_id: "pkg::Load::Source".to_string(),
                    name: "Source".to_string(),
                    component_type: "SOURCE".to_string(),
                    order_index: 0,
                },
                DeepDiveComponent {
                    component_id: "pkg::Load::Sink".to_string(),
                    name: "Sink".to_string(),
                    component_type: "SINK".to_string(),
                    order_index: 1,
                },
            ],
            transformations: vec![],
            column_lineage: vec![DeepDiveColumnLineage {
                source_ref: Some("dbo.Customers".to_string()),
                source_column: "*".to_string(),
                target_ref: Some("stage.Customers".to_string()),
                target_column: "*".to_string(),
                transformation_rule: Some("Data Flow Path".to_string()),
                confidence: 0.8,
            }],
        };

        sync.sync_deep_dive(&project_id, "pkgs/Load.dtsx", &deep_dive, &macro_outcome)
            .await
            .unwrap();

        let lineage = store.list_column_lineage(&project_id).await.unwrap();
        assert_eq!(lineage.len(), 1);
        assert!(lineage[0].both_endpoints_resolved());

        let edges = store.list_edges(&project_id).await.unwrap();
        assert!(edges.iter().any(|e| e.edge_type == EdgeType::DetailedLineage));

        // one component asset per SOURCE/SINK, plus the three macro assets
        assert_eq!(store.count_assets(&project_id).await.unwrap(), 5);
    }
}
