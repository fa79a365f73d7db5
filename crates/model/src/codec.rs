//! JSON exchange contract.
//!
//! One object per node, child collections as identifier-keyed maps,
//! pretty-printed UTF-8 on encode. Only identity (`qIdentifier`, `name`,
//! `parentKey`), metrics, source ranges and child maps cross the wire.
//!
//! Decoding validates mandatory fields per kind; any miss rejects the whole
//! document; no partial results are produced. Decoded nodes pass the same
//! validating constructors as built ones, so an empty identifier or a
//! self-parenting key in a document also rejects it. Structural equality
//! survives a round trip; byte-identical text is not guaranteed because
//! child-map iteration order is not fixed.

use crate::error::{ModelError, Result};
use crate::kinds::{Field, Method, Module, Namespace, Project, SourceFile, Statement, TypeNode};
use crate::metrics::MetricStore;
use crate::node::CodeNode;
use crate::span::Span;
use crate::tree::CodeTree;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Encode a whole tree: its root project, or JSON `null` when empty.
pub fn encode_tree(tree: &CodeTree) -> Result<String> {
    serde_json::to_string_pretty(&tree.root().map(ProjectWire::from)).map_err(ModelError::Encode)
}

/// Decode a whole tree from a document produced by [`encode_tree`].
pub fn decode_tree(json: &str) -> Result<CodeTree> {
    let wire: Option<ProjectWire> = serde_json::from_str(json).map_err(ModelError::Decode)?;
    let mut tree = CodeTree::new();
    if let Some(root) = wire {
        tree.set_root_node(Project::try_from(root)?);
    }
    Ok(tree)
}

pub fn encode_project(project: &Project) -> Result<String> {
    serde_json::to_string_pretty(&ProjectWire::from(project)).map_err(ModelError::Encode)
}

pub fn decode_project(json: &str) -> Result<Project> {
    let wire: ProjectWire = serde_json::from_str(json).map_err(ModelError::Decode)?;
    Project::try_from(wire)
}

/// Encode one file subtree, the unit per-file producers exchange.
pub fn encode_file(file: &SourceFile) -> Result<String> {
    serde_json::to_string_pretty(&FileWire::from(file)).map_err(ModelError::Encode)
}

pub fn decode_file(json: &str) -> Result<SourceFile> {
    let wire: FileWire = serde_json::from_str(json).map_err(ModelError::Decode)?;
    SourceFile::try_from(wire)
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

fn is_zero(value: &usize) -> bool {
    *value == 0
}

// ---------------------------------------------------------------------------
// Wire shapes, one per kind
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct ProjectWire {
    #[serde(rename = "qIdentifier")]
    q_identifier: String,
    start: usize,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    name: String,
    #[serde(rename = "parentKey", default, skip_serializing_if = "Option::is_none")]
    parent_key: Option<String>,
    #[serde(default, skip_serializing_if = "MetricStore::is_empty")]
    metrics: MetricStore,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    subprojects: HashMap<String, ProjectWire>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    modules: HashMap<String, ModuleWire>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    namespaces: HashMap<String, NamespaceWire>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    files: HashMap<String, FileWire>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ModuleWire {
    #[serde(rename = "qIdentifier")]
    q_identifier: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    name: String,
    #[serde(rename = "parentKey", default, skip_serializing_if = "Option::is_none")]
    parent_key: Option<String>,
    #[serde(default, skip_serializing_if = "MetricStore::is_empty")]
    metrics: MetricStore,
    #[serde(default, skip_serializing_if = "is_zero")]
    start: usize,
    #[serde(default, skip_serializing_if = "is_zero")]
    end: usize,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    files: HashMap<String, FileWire>,
}

#[derive(Debug, Serialize, Deserialize)]
struct NamespaceWire {
    #[serde(rename = "qIdentifier")]
    q_identifier: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    name: String,
    #[serde(rename = "parentKey", default, skip_serializing_if = "Option::is_none")]
    parent_key: Option<String>,
    #[serde(default, skip_serializing_if = "MetricStore::is_empty")]
    metrics: MetricStore,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    namespaces: HashMap<String, NamespaceWire>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    types: HashMap<String, TypeWire>,
}

#[derive(Debug, Serialize, Deserialize)]
struct FileWire {
    #[serde(rename = "qIdentifier")]
    q_identifier: String,
    start: usize,
    end: usize,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    name: String,
    #[serde(rename = "parentKey", default, skip_serializing_if = "Option::is_none")]
    parent_key: Option<String>,
    #[serde(default, skip_serializing_if = "MetricStore::is_empty")]
    metrics: MetricStore,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    types: HashMap<String, TypeWire>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TypeWire {
    #[serde(rename = "qIdentifier")]
    q_identifier: String,
    name: String,
    start: usize,
    end: usize,
    #[serde(rename = "parentKey", default, skip_serializing_if = "Option::is_none")]
    parent_key: Option<String>,
    #[serde(default, skip_serializing_if = "MetricStore::is_empty")]
    metrics: MetricStore,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    fields: HashMap<String, FieldWire>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    methods: HashMap<String, MethodWire>,
}

#[derive(Debug, Serialize, Deserialize)]
struct MethodWire {
    #[serde(rename = "qIdentifier")]
    q_identifier: String,
    name: String,
    start: usize,
    end: usize,
    constructor: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    accessor: bool,
    #[serde(rename = "abstract", default, skip_serializing_if = "is_false")]
    is_abstract: bool,
    #[serde(rename = "parentKey", default, skip_serializing_if = "Option::is_none")]
    parent_key: Option<String>,
    #[serde(default, skip_serializing_if = "MetricStore::is_empty")]
    metrics: MetricStore,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    statements: HashMap<String, StatementWire>,
}

#[derive(Debug, Serialize, Deserialize)]
struct FieldWire {
    #[serde(rename = "qIdentifier")]
    q_identifier: String,
    name: String,
    start: usize,
    /// Defaults to `start` when absent.
    #[serde(default, skip_serializing_if = "is_zero")]
    end: usize,
    #[serde(rename = "parentKey", default, skip_serializing_if = "Option::is_none")]
    parent_key: Option<String>,
    #[serde(default, skip_serializing_if = "MetricStore::is_empty")]
    metrics: MetricStore,
}

#[derive(Debug, Serialize, Deserialize)]
struct StatementWire {
    #[serde(rename = "qIdentifier")]
    q_identifier: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    name: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    start: usize,
    #[serde(default, skip_serializing_if = "is_zero")]
    end: usize,
    #[serde(rename = "parentKey", default, skip_serializing_if = "Option::is_none")]
    parent_key: Option<String>,
    #[serde(default, skip_serializing_if = "MetricStore::is_empty")]
    metrics: MetricStore,
}

// ---------------------------------------------------------------------------
// Model -> wire
// ---------------------------------------------------------------------------

impl From<&Project> for ProjectWire {
    fn from(node: &Project) -> Self {
        Self {
            q_identifier: node.qid().to_string(),
            start: node.start(),
            name: node.name().to_string(),
            parent_key: node.parent_key().map(str::to_owned),
            metrics: node.metrics().clone(),
            subprojects: node
                .subprojects()
                .map(|child| (child.qid().to_string(), ProjectWire::from(child)))
                .collect(),
            modules: node
                .modules()
                .map(|child| (child.qid().to_string(), ModuleWire::from(child)))
                .collect(),
            namespaces: node
                .namespaces()
                .map(|child| (child.qid().to_string(), NamespaceWire::from(child)))
                .collect(),
            files: node
                .files()
                .map(|child| (child.qid().to_string(), FileWire::from(child)))
                .collect(),
        }
    }
}

impl From<&Module> for ModuleWire {
    fn from(node: &Module) -> Self {
        Self {
            q_identifier: node.qid().to_string(),
            name: node.name().to_string(),
            parent_key: node.parent_key().map(str::to_owned),
            metrics: node.metrics().clone(),
            start: node.span().start,
            end: node.span().end,
            files: node
                .files()
                .map(|child| (child.qid().to_string(), FileWire::from(child)))
                .collect(),
        }
    }
}

impl From<&Namespace> for NamespaceWire {
    fn from(node: &Namespace) -> Self {
        Self {
            q_identifier: node.qid().to_string(),
            name: node.name().to_string(),
            parent_key: node.parent_key().map(str::to_owned),
            metrics: node.metrics().clone(),
            namespaces: node
                .namespaces()
                .map(|child| (child.qid().to_string(), NamespaceWire::from(child)))
                .collect(),
            types: node
                .types()
                .map(|child| (child.qid().to_string(), TypeWire::from(child)))
                .collect(),
        }
    }
}

impl From<&SourceFile> for FileWire {
    fn from(node: &SourceFile) -> Self {
        Self {
            q_identifier: node.qid().to_string(),
            start: node.span().start,
            end: node.span().end,
            name: node.name().to_string(),
            parent_key: node.parent_key().map(str::to_owned),
            metrics: node.metrics().clone(),
            types: node
                .types()
                .map(|child| (child.qid().to_string(), TypeWire::from(child)))
                .collect(),
        }
    }
}

impl From<&TypeNode> for TypeWire {
    fn from(node: &TypeNode) -> Self {
        Self {
            q_identifier: node.qid().to_string(),
            name: node.name().to_string(),
            start: node.span().start,
            end: node.span().end,
            parent_key: node.parent_key().map(str::to_owned),
            metrics: node.metrics().clone(),
            fields: node
                .fields()
                .map(|child| (child.qid().to_string(), FieldWire::from(child)))
                .collect(),
            methods: node
                .methods()
                .map(|child| (child.qid().to_string(), MethodWire::from(child)))
                .collect(),
        }
    }
}

impl From<&Method> for MethodWire {
    fn from(node: &Method) -> Self {
        Self {
            q_identifier: node.qid().to_string(),
            name: node.name().to_string(),
            start: node.span().start,
            end: node.span().end,
            constructor: node.is_constructor(),
            accessor: node.is_accessor(),
            is_abstract: node.is_abstract(),
            parent_key: node.parent_key().map(str::to_owned),
            metrics: node.metrics().clone(),
            statements: node
                .statements()
                .map(|child| (child.qid().to_string(), StatementWire::from(child)))
                .collect(),
        }
    }
}

impl From<&Field> for FieldWire {
    fn from(node: &Field) -> Self {
        Self {
            q_identifier: node.qid().to_string(),
            name: node.name().to_string(),
            start: node.span().start,
            end: node.span().end,
            parent_key: node.parent_key().map(str::to_owned),
            metrics: node.metrics().clone(),
        }
    }
}

impl From<&Statement> for StatementWire {
    fn from(node: &Statement) -> Self {
        Self {
            q_identifier: node.qid().to_string(),
            name: node.name().to_string(),
            start: node.span().start,
            end: node.span().end,
            parent_key: node.parent_key().map(str::to_owned),
            metrics: node.metrics().clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Wire -> model
// ---------------------------------------------------------------------------

impl TryFrom<ProjectWire> for Project {
    type Error = ModelError;

    fn try_from(wire: ProjectWire) -> Result<Self> {
        let mut node = Project::new(wire.q_identifier)?;
        if !wire.name.is_empty() {
            node.set_name(wire.name);
        }
        node.set_start(wire.start);
        if let Some(parent) = wire.parent_key {
            node.set_parent_key(parent)?;
        }
        node.core_mut().set_metrics(wire.metrics);
        for child in wire.subprojects.into_values() {
            node.add_subproject(Project::try_from(child)?);
        }
        for child in wire.modules.into_values() {
            node.add_module(Module::try_from(child)?);
        }
        for child in wire.namespaces.into_values() {
            node.add_namespace(Namespace::try_from(child)?);
        }
        for child in wire.files.into_values() {
            node.add_file(SourceFile::try_from(child)?);
        }
        Ok(node)
    }
}

impl TryFrom<ModuleWire> for Module {
    type Error = ModelError;

    fn try_from(wire: ModuleWire) -> Result<Self> {
        let mut node = Module::new(wire.q_identifier)?;
        if !wire.name.is_empty() {
            node.set_name(wire.name);
        }
        node.set_span(Span::new(wire.start, wire.end));
        if let Some(parent) = wire.parent_key {
            node.set_parent_key(parent)?;
        }
        node.core_mut().set_metrics(wire.metrics);
        for child in wire.files.into_values() {
            node.add_file(SourceFile::try_from(child)?);
        }
        Ok(node)
    }
}

impl TryFrom<NamespaceWire> for Namespace {
    type Error = ModelError;

    fn try_from(wire: NamespaceWire) -> Result<Self> {
        let mut node = Namespace::new(wire.q_identifier)?;
        if !wire.name.is_empty() {
            node.set_name(wire.name);
        }
        if let Some(parent) = wire.parent_key {
            node.set_parent_key(parent)?;
        }
        node.core_mut().set_metrics(wire.metrics);
        for child in wire.namespaces.into_values() {
            node.add_namespace(Namespace::try_from(child)?);
        }
        for child in wire.types.into_values() {
            node.add_type(TypeNode::try_from(child)?);
        }
        Ok(node)
    }
}

impl TryFrom<FileWire> for SourceFile {
    type Error = ModelError;

    fn try_from(wire: FileWire) -> Result<Self> {
        let mut node = SourceFile::new(wire.q_identifier, Span::new(wire.start, wire.end))?;
        if !wire.name.is_empty() {
            node.set_name(wire.name);
        }
        if let Some(parent) = wire.parent_key {
            node.set_parent_key(parent)?;
        }
        node.core_mut().set_metrics(wire.metrics);
        for child in wire.types.into_values() {
            node.add_type(TypeNode::try_from(child)?);
        }
        Ok(node)
    }
}

impl TryFrom<TypeWire> for TypeNode {
    type Error = ModelError;

    fn try_from(wire: TypeWire) -> Result<Self> {
        let mut node = TypeNode::new(wire.q_identifier, wire.name, Span::new(wire.start, wire.end))?;
        if let Some(parent) = wire.parent_key {
            node.set_parent_key(parent)?;
        }
        node.core_mut().set_metrics(wire.metrics);
        for child in wire.fields.into_values() {
            node.add_field(Field::try_from(child)?);
        }
        for child in wire.methods.into_values() {
            node.add_method(Method::try_from(child)?);
        }
        Ok(node)
    }
}

impl TryFrom<MethodWire> for Method {
    type Error = ModelError;

    fn try_from(wire: MethodWire) -> Result<Self> {
        let mut node = Method::new(wire.q_identifier, wire.name, Span::new(wire.start, wire.end))?
            .with_constructor(wire.constructor)
            .with_accessor(wire.accessor)
            .with_abstract(wire.is_abstract);
        if let Some(parent) = wire.parent_key {
            node.set_parent_key(parent)?;
        }
        node.core_mut().set_metrics(wire.metrics);
        for child in wire.statements.into_values() {
            node.add_statement(Statement::try_from(child)?);
        }
        Ok(node)
    }
}

impl TryFrom<FieldWire> for Field {
    type Error = ModelError;

    fn try_from(wire: FieldWire) -> Result<Self> {
        let end = if wire.end == 0 { wire.start } else { wire.end };
        let mut node = Field::new(wire.q_identifier, wire.name, Span::new(wire.start, end))?;
        if let Some(parent) = wire.parent_key {
            node.set_parent_key(parent)?;
        }
        node.core_mut().set_metrics(wire.metrics);
        Ok(node)
    }
}

impl TryFrom<StatementWire> for Statement {
    type Error = ModelError;

    fn try_from(wire: StatementWire) -> Result<Self> {
        let mut node = Statement::new(wire.q_identifier)?;
        if !wire.name.is_empty() {
            node.core_mut().set_name(wire.name);
        }
        node.set_span(Span::new(wire.start, wire.end));
        if let Some(parent) = wire.parent_key {
            node.set_parent_key(parent)?;
        }
        node.core_mut().set_metrics(wire.metrics);
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codetree_metrics::OpenRegistry;
    use pretty_assertions::assert_eq;

    fn sample_project() -> Project {
        let mut project = Project::new("root").unwrap();
        project.set_start(1);
        project.add_metric(&OpenRegistry, "LOC", 200.0);

        let mut file = SourceFile::new("/home/git/test", Span::new(1, 120)).unwrap();
        file.set_parent_key("root").unwrap();

        let mut class = TypeNode::new("Class", "Class", Span::new(1, 100)).unwrap();
        class.set_parent_key("/home/git/test").unwrap();
        class.add_metric(&OpenRegistry, "McCC", 12.0);

        let mut method = Method::new("Class#Method", "Method", Span::new(50, 100))
            .unwrap()
            .with_constructor(false);
        method.set_parent_key("Class").unwrap();
        let mut statement = Statement::new("Class#Method::s1").unwrap();
        statement.set_parent_key("Class#Method").unwrap();
        statement.set_span(Span::new(51, 52));
        method.add_statement(statement);

        let mut field = Field::new("Class.TestField", "TestField", Span::line(25)).unwrap();
        field.set_parent_key("Class").unwrap();

        class.add_method(method);
        class.add_field(field);
        file.add_type(class);
        project.add_file(file);

        let mut module = Module::new("mod-a").unwrap();
        module.set_parent_key("root").unwrap();
        module.set_span(Span::new(1, 10));
        project.add_module(module);

        let mut namespace = Namespace::new("ns").unwrap();
        namespace.set_parent_key("root").unwrap();
        project.add_namespace(namespace);

        project
    }

    #[test]
    fn project_round_trip_preserves_structure() {
        let original = sample_project();
        let json = encode_project(&original).unwrap();
        let decoded = decode_project(&json).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn tree_round_trip_preserves_equality() {
        let mut tree = CodeTree::new();
        tree.set_root_node(sample_project());
        let json = encode_tree(&tree).unwrap();
        let decoded = decode_tree(&json).unwrap();
        assert_eq!(decoded, tree);
    }

    #[test]
    fn empty_tree_encodes_as_null() {
        let tree = CodeTree::new();
        let json = encode_tree(&tree).unwrap();
        assert_eq!(json, "null");
        assert!(!decode_tree(&json).unwrap().has_root());
    }

    #[test]
    fn file_round_trip_preserves_structure() {
        let project = sample_project();
        let file = project.file("/home/git/test").unwrap();
        let json = encode_file(file).unwrap();
        let decoded = decode_file(&json).unwrap();
        assert_eq!(&decoded, file);
    }

    #[test]
    fn missing_mandatory_fields_reject_the_document() {
        // No qIdentifier.
        assert!(matches!(
            decode_project(r#"{"start": 1}"#),
            Err(ModelError::Decode(_))
        ));
        // No start.
        assert!(matches!(
            decode_project(r#"{"qIdentifier": "root"}"#),
            Err(ModelError::Decode(_))
        ));
        // File without end.
        assert!(matches!(
            decode_file(r#"{"qIdentifier": "/f", "start": 1}"#),
            Err(ModelError::Decode(_))
        ));
        // Method without the constructor flag, nested deep in a document:
        // the whole document is rejected.
        let json = r#"{
            "qIdentifier": "/f", "start": 1, "end": 9,
            "types": {
                "C": {
                    "qIdentifier": "C", "name": "C", "start": 1, "end": 9,
                    "methods": {
                        "C#m": {"qIdentifier": "C#m", "name": "m", "start": 1, "end": 2}
                    }
                }
            }
        }"#;
        assert!(matches!(decode_file(json), Err(ModelError::Decode(_))));
    }

    #[test]
    fn empty_identifier_in_a_document_is_rejected() {
        assert!(matches!(
            decode_project(r#"{"qIdentifier": "", "start": 1}"#),
            Err(ModelError::EmptyIdentifier)
        ));
    }

    #[test]
    fn self_parenting_in_a_document_is_rejected() {
        let json = r#"{"qIdentifier": "root", "start": 1, "parentKey": "root"}"#;
        assert!(matches!(
            decode_project(json),
            Err(ModelError::SelfParent { .. })
        ));
    }

    #[test]
    fn optional_fields_default_to_empty() {
        let module: Module = Module::try_from(
            serde_json::from_str::<ModuleWire>(r#"{"qIdentifier": "m"}"#).unwrap(),
        )
        .unwrap();
        assert_eq!(module.qid(), "m");
        assert_eq!(module.span(), Span::new(0, 0));
        assert_eq!(module.files().count(), 0);
        assert!(module.metrics().is_empty());
    }

    #[test]
    fn field_end_defaults_to_start() {
        let json = r#"{"qIdentifier": "C.f", "name": "f", "start": 25}"#;
        let field: Field =
            Field::try_from(serde_json::from_str::<FieldWire>(json).unwrap()).unwrap();
        assert_eq!(field.span(), Span::new(25, 25));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let json = r#"{"qIdentifier": "root", "start": 1, "vendor": {"x": 1}}"#;
        assert!(decode_project(json).is_ok());
    }

    #[test]
    fn wire_field_names_match_the_exchange_contract() {
        let project = sample_project();
        let json = encode_project(&project).unwrap();
        assert!(json.contains("\"qIdentifier\""));
        assert!(json.contains("\"parentKey\""));
        assert!(json.contains("\"constructor\""));
        assert!(!json.contains("q_identifier"));
    }
}
