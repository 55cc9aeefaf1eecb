//! Deterministic SSIS `.dtsx` walker (`spec.md` §4.B): a `component`
//! with an adapter class id is classified SOURCE/SINK by name; its
//! `SqlCommand`/`OpenRowset` property text names the table it touches.
//! Always deep-dive: the package and its components are emitted
//! alongside the macro nodes/edges.

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::collections::BTreeMap;
use strata_protocol::{
    DeepDiveColumnLineage, DeepDiveComponent, DeepDiveResult, DeepDiveTransformation,
    ExtractedEdge, ExtractedEvidence, ExtractedNode, ExtractionResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ComponentKind {
    Source,
    Sink,
    Other,
}

struct FoundComponent {
    name: String,
    kind: ComponentKind,
    table: Option<String>,
}

fn classify_component_class(class_id: &str) -> ComponentKind {
    let lower = class_id.to_ascii_lowercase();
    if lower.contains("source") {
        ComponentKind::Source
    } else if lower.contains("destination") {
        ComponentKind::Sink
    } else {
        ComponentKind::Other
    }
}

fn normalize_table_ref(raw: &str) -> String {
    raw.trim().replace(['[', ']'], "")
}

fn walk(content: &str) -> crate::error::Result<Vec<FoundComponent>> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text = true;

    let mut components = Vec::new();
    let mut current: Option<(String, ComponentKind)> = None;
    let mut current_property_name: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => {
                let local = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                if local.eq_ignore_ascii_case("component") {
                    let mut name = String::new();
                    let mut class_id = String::new();
                    for attr in e.attributes().flatten() {
                        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).to_string();
                        let value = attr.unescape_value().unwrap_or_default().to_string();
                        if key.eq_ignore_ascii_case("name") {
                            name = value;
                        } else if key.eq_ignore_ascii_case("componentClassID") {
                            class_id = value;
                        }
                    }
                    let kind = classify_component_class(&class_id);
                    if kind != ComponentKind::Other || !name.is_empty() {
                        components.push(FoundComponent { name: name.clone(), kind, table: None });
                    }
                    current = Some((name, kind));
                } else if local.eq_ignore_ascii_case("property") {
                    let mut prop_name = String::new();
                    for attr in e.attributes().flatten() {
                        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).to_string();
                        if key.eq_ignore_ascii_case("name") {
                            prop_name = attr.unescape_value().unwrap_or_default().to_string();
                        }
                    }
                    current_property_name = Some(prop_name);
                }
            }
            Event::Text(e) => {
                if let Some(prop_name) = &current_property_name {
                    if prop_name.eq_ignore_ascii_case("SqlCommand")
                        || prop_name.eq_ignore_ascii_case("OpenRowset")
                    {
                        let text = e.unescape().unwrap_or_default().to_string();
                        if !text.trim().is_empty() {
                            if let Some(last) = components.last_mut() {
                                last.table = Some(normalize_table_ref(&text));
                            }
                        }
                    }
                }
            }
            Event::End(e) => {
                let local = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                if local.eq_ignore_ascii_case("property") {
                    current_property_name = None;
                } else if local.eq_ignore_ascii_case("component") {
                    current = None;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    let _ = current;
    Ok(components)
}

pub fn extract(
    file_path: &str,
    content: &str,
) -> crate::error::Result<(ExtractionResult, DeepDiveResult)> {
    let package_name = file_path
        .rsplit('/')
        .next()
        .unwrap_or(file_path)
        .trim_end_matches(".dtsx")
        .to_string();
    let package_id = format!("pkg::{package_name}");

    let components = walk(content)?;

    let mut macro_result = ExtractionResult::new("dtsx_walker", file_path);
    macro_result.nodes.push(ExtractedNode {
        node_id: package_id.clone(),
        node_type: "PROCESS".to_string(),
        name: package_name.clone(),
        system: "ssis".to_string(),
        attributes: BTreeMap::new(),
    });

    let mut deep_dive = DeepDiveResult {
        package_id: package_id.clone(),
        package_name: package_name.clone(),
        ..Default::default()
    };

    for (idx, comp) in components.iter().enumerate() {
        let component_id = format!("{package_id}::{}", comp.name);
        let component_type = match comp.kind {
            ComponentKind::Source => "SOURCE",
            ComponentKind::Sink => "SINK",
            ComponentKind::Other => "TRANSFORM",
        };
        deep_dive.components.push(DeepDiveComponent {
            component_id: component_id.clone(),
            name: comp.name.clone(),
            component_type: component_type.to_string(),
            order_index: idx as i64,
        });

        if let Some(table) = &comp.table {
            macro_result.nodes.push(ExtractedNode {
                node_id: table.clone(),
                node_type: "TABLE".to_string(),
                name: table.clone(),
                system: "unknown".to_string(),
                attributes: BTreeMap::new(),
            });

            let evidence_idx = macro_result.evidences.len();
            macro_result.evidences.push(ExtractedEvidence {
                file_path: file_path.to_string(),
                kind: "xml".to_string(),
                line_start: None,
                line_end: None,
                xpath: Some(format!("//component[@name='{}']", comp.name)),
                snippet: table.clone(),
                hash: None,
            });

            let (from, to, edge_type) = match comp.kind {
                ComponentKind::Source => (package_id.clone(), table.clone(), "READS_FROM"),
                ComponentKind::Sink => (package_id.clone(), table.clone(), "WRITES_TO"),
                ComponentKind::Other => continue,
            };
            macro_result.edges.push(ExtractedEdge {
                from_node_id: from,
                to_node_id: to,
                edge_type: edge_type.to_string(),
                confidence: 0.85,
                is_hypothesis: false,
                rationale: Some("heuristic from component class id".to_string()),
                evidence_refs: vec![evidence_idx],
            });

            deep_dive.transformations.push(DeepDiveTransformation {
                source_component_id: Some(component_id.clone()),
                operation: if comp.kind == ComponentKind::Source { "READ".to_string() } else { "WRITE".to_string() },
                detail: table.clone(),
            });
        }
    }

    let source = components.iter().find(|c| c.kind == ComponentKind::Source);
    let sink = components.iter().find(|c| c.kind == ComponentKind::Sink);
    if let (Some(source), Some(sink)) = (source, sink) {
        if let (Some(source_table), Some(sink_table)) = (&source.table, &sink.table) {
            deep_dive.column_lineage.push(DeepDiveColumnLineage {
                source_ref: Some(source_table.clone()),
                source_column: "*".to_string(),
                target_ref: Some(sink_table.clone()),
                target_column: "*".to_string(),
                transformation_rule: Some("Data Flow Path".to_string()),
                confidence: 0.8,
            });
        }
    }

    Ok((macro_result, deep_dive))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        <DTS:Executable>
          <component name="Source - Customers" componentClassID="Microsoft.OLEDBSourceAdapter">
            <properties>
              <property name="SqlCommand">SELECT * FROM [dbo].[Customers]</property>
            </properties>
          </component>
          <component name="Destination - StageCustomers" componentClassID="Microsoft.OLEDBDestinationAdapter">
            <properties>
              <property name="OpenRowset">[stage].[Customers]</property>
            </properties>
          </component>
        </DTS:Executable>
    "#;

    #[test]
    fn extracts_source_and_destination_tables_with_edges() {
        let (result, deep_dive) = extract("pkgs/Load.dtsx", SAMPLE).unwrap();

        assert!(result.nodes.iter().any(|n| n.node_type == "PROCESS" && n.name == "Load"));
        assert!(result.nodes.iter().any(|n| n.name == "dbo.Customers"));
        assert!(result.nodes.iter().any(|n| n.name == "stage.Customers"));
        assert!(result.edges.iter().any(|e| e.edge_type == "READS_FROM" && e.to_node_id == "dbo.Customers"));
        assert!(result.edges.iter().any(|e| e.edge_type == "WRITES_TO" && e.to_node_id == "stage.Customers"));

        assert_eq!(deep_dive.components.len(), 2);
        assert_eq!(deep_dive.column_lineage.len(), 1);
        let lineage = &deep_dive.column_lineage[0];
        assert_eq!(lineage.source_column, "*");
        assert_eq!(lineage.transformation_rule.as_deref(), Some("Data Flow Path"));
    }
}
