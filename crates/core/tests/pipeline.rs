use natmdx_core::transform::{StripTableWhitespace, TABLE_STRUCTURAL_TAGS, strip_prefix};
use natmdx_core::{
    CompiledDocument, Compiler, Element, LocalAssetResolver, Node, PrefixTagNames, TreeTransform,
    compile_mdx, sibling_order,
};
use serde_json::json;

fn cdn(path: &str) -> Option<String> {
    Some(format!(
        "https://cdn.example.com/{}",
        path.trim_start_matches("./")
    ))
}

#[test]
fn local_image_in_source_mode_becomes_require() {
    let code = Compiler::default()
        .compile_to_source("![alt](./a.png)", "page.mdx")
        .expect("compile should succeed");
    assert!(code.contains("\"src\": require(\"./a.png\")"));
    assert!(code.contains("\"alt\": \"alt\""));
}

#[test]
fn local_image_in_graph_mode_resolves_to_url() {
    let resolver: &dyn LocalAssetResolver = &cdn;
    let lowering = Compiler::default()
        .compile_to_graph_with("![alt](./a.png)", "page.mdx", resolver)
        .expect("compile should succeed");
    assert!(lowering.diagnostics.is_empty());

    let json = serde_json::to_value(&lowering.document).expect("serialize should succeed");
    assert_eq!(
        json["tree"]["children"][0]["children"][0],
        json!({
            "type": "element",
            "name": "html.img",
            "props": {"src": "https://cdn.example.com/a.png", "alt": "alt"}
        })
    );
}

#[test]
fn frontmatter_is_isolated_from_the_tree() {
    let document = compile_mdx("---\ntitle: X\n---\n# Body", None).expect("compile should succeed");
    insta::assert_snapshot!(document.to_json().expect("serialize should succeed"), @r#"{"tree":{"type":"element","name":"html.div","children":[{"type":"element","name":"html.h1","children":[{"type":"text","value":"Body"}]}]},"frontmatter":{"title":"X"}}"#);
}

#[test]
fn documents_without_frontmatter_omit_it() {
    let document = compile_mdx("# Body", None).expect("compile should succeed");
    assert!(document.frontmatter.is_none());
    let json = document.to_json().expect("serialize should succeed");
    assert!(!json.contains("frontmatter"));
}

#[test]
fn prefixing_a_compiled_tree_again_changes_nothing() {
    let document = Compiler::default()
        .compile("# A\n\n<Card>\n\n*b* and `c`\n\n</Card>", "doc.mdx")
        .expect("compile should succeed");
    let mut again = document.root.clone();
    PrefixTagNames::default()
        .transform(&mut again)
        .expect("prefix should succeed");
    assert_eq!(again, document.root);
}

#[test]
fn graph_survives_json_round_trip() {
    let source = "---\ntags: [a, b]\n---\n\n# Title\n\n- [x] done\n- todo\n\n<Badge count={3} open label=\"new\">\n\nhi\n\n</Badge>\n\n| a | b |\n| - | :-: |\n| 1 | 2 |";
    let document = Compiler::default()
        .compile_to_graph(source, "doc.mdx")
        .expect("compile should succeed");
    let json = document.to_json().expect("serialize should succeed");
    let parsed = CompiledDocument::from_json(&json).expect("parse should succeed");
    assert_eq!(parsed, document);
}

fn assert_no_table_whitespace(element: &Element) {
    let structural = TABLE_STRUCTURAL_TAGS.contains(&strip_prefix(&element.name, "html."));
    for child in &element.children {
        match child {
            Node::Element(child) => assert_no_table_whitespace(child),
            Node::Text(_) if structural => {
                assert!(!child.is_whitespace_text(), "whitespace under <{}>", element.name)
            }
            _ => {}
        }
    }
}

#[test]
fn table_whitespace_is_pruned_but_cells_keep_theirs() {
    let document = Compiler::default()
        .compile("| a | b |\n| - | - |\n| 1 | 2 |", "doc.mdx")
        .expect("compile should succeed");
    assert_no_table_whitespace(&document.root);

    let mut table = Element::new("html.table").with_children(vec![
        Node::text("\n  "),
        Element::new("html.tr")
            .with_children(vec![
                Node::text(" "),
                Element::new("html.td")
                    .with_children(vec![Node::text(" ")])
                    .into(),
            ])
            .into(),
    ]);
    StripTableWhitespace::default()
        .transform(&mut table)
        .expect("strip should succeed");
    let expected = Element::new("html.table").with_children(vec![
        Element::new("html.tr")
            .with_children(vec![
                Element::new("html.td")
                    .with_children(vec![Node::text(" ")])
                    .into(),
            ])
            .into(),
    ]);
    assert_eq!(table, expected);
}

#[test]
fn order_metadata_marks_run_boundaries() {
    let document = Compiler::default()
        .compile("one\n\ntwo\n\n# three\n\n# four\n\nfive", "doc.mdx")
        .expect("compile should succeed");
    let names: Vec<Option<&str>> = document
        .root
        .children
        .iter()
        .filter_map(|child| match child {
            Node::Element(element) => Some(Some(element.name.as_str())),
            _ => None,
        })
        .collect();
    let order = sibling_order(names);
    let first_of_type: Vec<bool> = order.iter().map(|meta| meta.first_of_type).collect();
    assert_eq!(first_of_type, vec![true, false, true, false, true]);

    let code = Compiler::default()
        .compile_to_source("one\n\ntwo\n\n# three\n\n# four\n\nfive", "doc.mdx")
        .expect("compile should succeed");
    let emitted: Vec<&str> = code
        .match_indices("firstOfType: ")
        .map(|(at, _)| {
            let rest = &code[at + "firstOfType: ".len()..];
            if rest.starts_with("true") { "true" } else { "false" }
        })
        .collect();
    assert_eq!(emitted, vec!["true", "true", "false", "true", "false", "true"]);
}

#[test]
fn missing_custom_component_degrades_in_source() {
    let code = Compiler::default()
        .compile_to_source("<Unknown>hi</Unknown>", "doc.mdx")
        .expect("compile should succeed");
    assert!(code.contains("_customComponent(components, \"Unknown\")"));
    assert!(code.contains("function MissingComponent(props)"));
}
