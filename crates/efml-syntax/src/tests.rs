use expect_test::expect;

use crate::SyntaxKind::*;
use crate::*;

fn position(start: u32, end: u32, line: u32, start_character: u32) -> NodePosition {
    NodePosition {
        range: TextRange::new(start.into(), end.into()),
        line,
        start_character,
        character: start_character + end - start,
        len: end - start,
        crosses_line: false,
    }
}

fn alloc(nodes: &mut Arena<Node>, position: NodePosition, data: NodeData) -> NodeId {
    nodes.alloc(Node { position, missing: false, parent: None, data })
}

/// Hand-built tree for `">a\n"`.
fn element() -> SourceFile {
    let mut nodes = Arena::new();
    let start = alloc(&mut nodes, position(0, 1, 0, 0), NodeData::Token(GREATER_THAN));
    let name = alloc(&mut nodes, position(1, 2, 0, 1), NodeData::StringLiteral);
    let tag = alloc(
        &mut nodes,
        position(0, 2, 0, 0),
        NodeData::TagDescriptor(TagDescriptor { start, name, attributes: None, reference: None }),
    );
    let end_of_line = alloc(&mut nodes, position(2, 3, 0, 2), NodeData::Token(NEW_LINE));
    let line = alloc(
        &mut nodes,
        position(0, 3, 0, 0),
        NodeData::ElementDeclaration(ElementDeclaration {
            line: LineTrivia { indent: None, indent_level: 0, end_of_line },
            tag,
            children: Vec::new(),
        }),
    );
    let end_of_file = alloc(&mut nodes, position(3, 3, 1, 0), NodeData::Token(EOF));
    let root = alloc(
        &mut nodes,
        position(0, 3, 0, 0),
        NodeData::Root(Root { children: vec![line], end_of_file }),
    );

    for (parent, child) in [(tag, start), (tag, name), (line, tag), (line, end_of_line)] {
        nodes[child].parent = Some(parent);
    }
    nodes[line].parent = Some(root);
    nodes[end_of_file].parent = Some(root);

    SourceFile::new(">a\n".to_owned(), LanguageVariant::Html, nodes, root, Vec::new())
}

#[test]
fn children_follow_source_order() {
    let file = element();
    let line = file.lines()[0];
    let kinds = file.children(line).into_iter().map(|id| file.kind(id)).collect::<Vec<_>>();
    assert_eq!(kinds, [TAG_DESCRIPTOR, NEW_LINE]);
}

#[test]
fn recursive_walk_is_pre_order_and_short_circuits() {
    let file = element();

    let mut seen = Vec::new();
    let found = file.for_each_child_recursively(file.root(), |id| {
        seen.push(file.kind(id));
        (file.kind(id) == STRING_LITERAL).then_some(id)
    });

    assert_eq!(seen, [ELEMENT_DECLARATION, TAG_DESCRIPTOR, GREATER_THAN, STRING_LITERAL]);
    assert_eq!(found.map(|id| file.node_text(id)), Some("a"));
}

#[test]
fn ancestors_walk_back_links() {
    let file = element();
    let name = file.find(|node| node.kind() == STRING_LITERAL).unwrap();
    let kinds = file.ancestors(name).map(|id| file.kind(id)).collect::<Vec<_>>();
    assert_eq!(kinds, [TAG_DESCRIPTOR, ELEMENT_DECLARATION, SOURCE_FILE]);
}

#[test]
fn leaves_cover_the_text() {
    let file = element();
    let text = file.leaves().into_iter().map(|id| file.node_text(id)).collect::<String>();
    assert_eq!(text, file.text());
    assert_eq!(file.end(), TextSize::of(file.text()));
}

#[test]
fn debug_tree_dump() {
    let file = element();
    expect![[r#"
        SOURCE_FILE@0..3
          ELEMENT_DECLARATION@0..3
            TAG_DESCRIPTOR@0..2
              GREATER_THAN@0..1 ">"
              STRING_LITERAL@1..2 "a"
            NEW_LINE@2..3 "\n"
          EOF@3..3 ""
    "#]]
    .assert_eq(&file.debug_tree());
}

#[test]
fn kind_classification() {
    assert!(DOT.is_token());
    assert!(UNKNOWN.is_token());
    assert!(!STRING_LITERAL.is_token());
    assert!(NEW_LINE.is_trivia());
    assert!(!EOF.is_trivia());
    assert!(TEXT_LINE.is_line());
    assert!(!TAG_DESCRIPTOR.is_line());
    assert_eq!(MUSTACHE_END.to_string(), "'}}'");
    assert_eq!(NEW_LINE.to_string(), "line break");
}
