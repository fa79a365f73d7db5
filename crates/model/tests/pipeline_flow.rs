//! End-to-end pipeline scenarios: building a tree, exchanging it as JSON,
//! concurrent per-file ingestion, merging and extraction.

use anyhow::Result;
use codetree_model::{
    decode_tree, encode_tree, CodeNode, CodeTree, Field, Method, MetricCatalog, NodeRef,
    OpenRegistry, Project, SourceFile, Span, Statement, TypeNode,
};
use pretty_assertions::assert_eq;
use std::fs;
use std::thread;

fn analysis_registry() -> MetricCatalog {
    MetricCatalog::new()
        .register("LOC")
        .register("McCC")
        .register("NOA")
        .alias("lines_of_code", "LOC")
}

/// project -> file "/home/git/test" -> type "Class" [1,100]
///   -> method "Method" [50,100], field "TestField" [25,25]
fn reference_tree() -> CodeTree {
    let registry = analysis_registry();

    let mut project = Project::new("project").unwrap();
    project.set_start(1);
    project.add_metric(&registry, "LOC", 100.0);

    let mut file = SourceFile::new("/home/git/test", Span::new(1, 100)).unwrap();
    file.set_parent_key("project").unwrap();

    let mut class = TypeNode::new("Class", "Class", Span::new(1, 100)).unwrap();
    class.set_parent_key("/home/git/test").unwrap();
    class.add_metric(&registry, "McCC", 4.0);

    let mut method = Method::new("Class#Method", "Method", Span::new(50, 100)).unwrap();
    method.set_parent_key("Class").unwrap();
    method.add_metric(&registry, "lines_of_code", 51.0);

    let mut field = Field::new("Class.TestField", "TestField", Span::line(25)).unwrap();
    field.set_parent_key("Class").unwrap();

    class.add_method(method);
    class.add_field(field);
    file.add_type(class);
    project.add_file(file);

    let mut tree = CodeTree::new();
    tree.set_root_node(project);
    tree
}

#[test]
fn reference_tree_round_trips_through_json() -> Result<()> {
    let tree = reference_tree();
    let json = encode_tree(&tree)?;
    let decoded = decode_tree(&json)?;
    assert_eq!(decoded, tree);

    // Aliased metric writes landed under the canonical name.
    let method = decoded.utils().find_method("Class#Method").unwrap();
    assert_eq!(method.metric("LOC"), Some(51.0));
    assert!(method.metric("lines_of_code").is_none());
    Ok(())
}

#[test]
fn trees_exchange_through_files_on_disk() -> Result<()> {
    let tree = reference_tree();
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("analysis.json");

    fs::write(&path, encode_tree(&tree)?)?;
    let received = decode_tree(&fs::read_to_string(&path)?)?;

    assert_eq!(received, tree);
    Ok(())
}

#[test]
fn concurrent_producers_fill_one_shared_tree() -> Result<()> {
    let mut seed = CodeTree::new();
    seed.set_root("build")?;
    let shared = codetree_model::SharedTree::new(seed);

    let mut workers = Vec::new();
    for producer in 0..4 {
        let handle = shared.clone();
        workers.push(thread::spawn(move || {
            for index in 0..8 {
                let qid = format!("/src/p{producer}/f{index}.rs");
                let mut file = SourceFile::new(&qid, Span::new(1, 50)).unwrap();
                file.set_parent_key("build").unwrap();
                file.add_metric(&OpenRegistry, "LOC", 50.0);
                handle.update_file(file).unwrap();
            }
        }));
    }
    for worker in workers {
        worker.join().expect("producer panicked");
    }

    let tree = shared.into_inner();
    assert_eq!(tree.utils().all_files().len(), 32);
    assert_eq!(
        tree.utils()
            .find_file("/src/p2/f5.rs")
            .unwrap()
            .metric("LOC"),
        Some(50.0)
    );
    Ok(())
}

#[test]
fn competing_submissions_for_one_file_fold_together() -> Result<()> {
    let mut seed = CodeTree::new();
    seed.set_root("build")?;
    let shared = codetree_model::SharedTree::new(seed);

    let first = shared.clone();
    let second = shared.clone();
    let a = thread::spawn(move || {
        let mut file = SourceFile::new("/src/main.rs", Span::new(1, 80)).unwrap();
        file.set_parent_key("build").unwrap();
        file.add_metric(&OpenRegistry, "LOC", 80.0);
        first.update_file(file).unwrap();
    });
    let b = thread::spawn(move || {
        let mut file = SourceFile::new("/src/main.rs", Span::new(1, 80)).unwrap();
        file.set_parent_key("build").unwrap();
        file.add_metric(&OpenRegistry, "McCC", 6.0);
        second.update_file(file).unwrap();
    });
    a.join().expect("producer panicked");
    b.join().expect("producer panicked");

    shared.with_read(|tree| {
        let utils = tree.utils();
        assert_eq!(utils.all_files().len(), 1);
        let file = utils.find_file("/src/main.rs").unwrap();
        // Both producers' metrics survived the fold.
        assert_eq!(file.metric("LOC"), Some(80.0));
        assert_eq!(file.metric("McCC"), Some(6.0));
    });
    Ok(())
}

#[test]
fn merge_attaches_a_decoded_partition_as_subproject() -> Result<()> {
    let mut tree = CodeTree::new();
    tree.set_root("project")?;

    // Another stage produced this partition and shipped it as JSON.
    let mut partition = Project::new("analytics")?;
    partition.set_parent_key("project")?;
    partition.set_start(1);
    let mut shipped = CodeTree::new();
    shipped.set_root_node(partition);
    let wire = encode_tree(&shipped)?;

    tree.merge(decode_tree(&wire)?);

    let root = tree.root().unwrap();
    assert!(root.subproject("analytics").is_some());
    assert_eq!(
        root.subproject("analytics").unwrap().parent_key(),
        Some("project")
    );
    Ok(())
}

#[test]
fn extraction_prunes_sibling_partitions() -> Result<()> {
    let mut root = Project::new("project")?;
    for (sub_qid, file_qids) in [
        ("subproject1", ["path1", "path2"]),
        ("subproject2", ["path3", "path4"]),
    ] {
        let mut sub = Project::new(sub_qid)?;
        sub.set_parent_key("project")?;
        for file_qid in file_qids {
            let mut file = SourceFile::new(file_qid, Span::new(1, 10))?;
            file.set_parent_key(sub_qid)?;
            if file_qid == "path1" {
                let mut class = TypeNode::new("path1::Widget", "Widget", Span::new(1, 9))?;
                class.set_parent_key("path1")?;
                let mut method = Method::new("path1::Widget#draw()", "draw", Span::new(2, 8))?;
                method.set_parent_key("path1::Widget")?;
                let mut statement = Statement::new("path1::Widget#draw()::s1")?;
                statement.set_parent_key("path1::Widget#draw()")?;
                method.add_statement(statement);
                class.add_method(method);
                file.add_type(class);
            }
            sub.add_file(file);
        }
        root.add_subproject(sub);
    }
    let mut tree = CodeTree::new();
    tree.set_root_node(root);

    let utils = tree.utils();
    let target = utils.find_file("path1").unwrap();
    let extracted = utils.extract_tree(NodeRef::from(target)).unwrap();

    let new_root = extracted.root().unwrap();
    assert_eq!(new_root.qid(), "project");
    assert!(new_root.subproject("subproject2").is_none());
    let sub1 = new_root.subproject("subproject1").unwrap();
    assert!(sub1.file("path2").is_none());
    // The extracted file keeps its full subtree.
    let file = sub1.file("path1").unwrap();
    let class = file.type_node("path1::Widget").unwrap();
    assert_eq!(
        class
            .method("path1::Widget#draw()")
            .unwrap()
            .statements()
            .count(),
        1
    );
    Ok(())
}
