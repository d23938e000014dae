use std::fs;
use std::path::{Path, PathBuf};

use efml_errors::{Position, Severity};
use efml_syntax::SyntaxKind::{self, *};
use efml_syntax::{NodeData, NodeId, SourceFile, TextSize};
use expect_test::expect;
use proptest::prelude::*;

use crate::parse;
use crate::parser::Parser;

#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct TestCase {
    input: PathBuf,
    text: String,
}

impl TestCase {
    fn list() -> Vec<Self> {
        let test_data_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("test_data");

        let mut cases = fs::read_dir(&test_data_dir)
            .unwrap_or_else(|err| {
                panic!("Cannot read directory {}: {err}", test_data_dir.display())
            })
            .filter_map(|entry| {
                let path = entry.ok()?.path();
                if path.extension()? == "efml" {
                    let text = fs::read_to_string(&path).ok()?;
                    Some(Self { input: path, text })
                } else {
                    None
                }
            })
            .collect::<Vec<_>>();

        cases.sort();
        cases
    }
}

fn reconstructed(file: &SourceFile) -> String {
    file.leaves().into_iter().map(|id| file.node_text(id)).collect()
}

fn check_tree(file: &SourceFile, text: &str) {
    assert_eq!(reconstructed(file), text);
    assert_eq!(file.end(), TextSize::of(text));

    file.for_each_child_recursively(file.root(), |id| {
        let node = &file[id];
        let parent = node.parent.expect("every non-root node has a parent");
        assert!(file[parent].position.range.contains_range(node.position.range));
        if node.missing {
            assert!(node.position.is_empty());
        }
        None::<()>
    });
}

fn is_blank(file: &SourceFile, line: NodeId) -> bool {
    match &file[line].data {
        NodeData::CommentLine(comment) => {
            comment.comment.is_none_or(|comment| file.node_text(comment).is_empty())
        }
        _ => false,
    }
}

fn check_indentation(file: &SourceFile) {
    for element in file.find_all(|node| node.kind() == ELEMENT_DECLARATION) {
        let NodeData::ElementDeclaration(declaration) = &file[element].data else { unreachable!() };

        let mut widths = declaration
            .children
            .iter()
            .filter(|&&child| !is_blank(file, child))
            .filter_map(|&child| file[child].data.line_trivia())
            .map(|line| line.indent_level)
            .collect::<Vec<_>>();
        widths.dedup();

        assert!(widths.len() <= 1, "children of one element at different widths: {widths:?}");
        if let Some(&width) = widths.first() {
            assert!(width > declaration.line.indent_level);
        }
    }
}

fn kinds(file: &SourceFile, ids: &[NodeId]) -> Vec<SyntaxKind> {
    ids.iter().map(|&id| file.kind(id)).collect()
}

fn children(file: &SourceFile, element: NodeId) -> &[NodeId] {
    match &file[element].data {
        NodeData::ElementDeclaration(declaration) => &declaration.children,
        data => panic!("not an element: {data:?}"),
    }
}

#[test]
fn test_data_properties() {
    let cases = TestCase::list();
    assert!(!cases.is_empty());

    for case in cases {
        let file = parse(&case.text);
        check_tree(&file, &case.text);
        assert_eq!(parse(&case.text), file, "{} parses differently twice", case.input.display());

        if file.diagnostics().is_empty() {
            check_indentation(&file);
        }
    }
}

#[test]
fn element_with_text_child() {
    let file = parse(">div\n  .hello\n");

    expect![[r#"
        SOURCE_FILE@0..14
          ELEMENT_DECLARATION@0..14
            TAG_DESCRIPTOR@0..4
              GREATER_THAN@0..1 ">"
              STRING_LITERAL@1..4 "div"
            NEW_LINE@4..5 "\n"
            TEXT_LINE@5..14
              WHITESPACE@5..7 "  "
              DOT@7..8 "."
              TEMPLATE_STRING@8..13
                STRING_LITERAL@8..13 "hello"
              NEW_LINE@13..14 "\n"
          EOF@14..14 ""
    "#]]
    .assert_eq(&file.debug_tree());
    assert!(file.diagnostics().is_empty());
}

#[test]
fn missing_tag_name() {
    let file = parse(">\n");

    expect![[r#"
        SOURCE_FILE@0..2
          ELEMENT_DECLARATION@0..2
            TAG_DESCRIPTOR@0..1
              GREATER_THAN@0..1 ">"
              STRING_LITERAL@1..1 "" missing
            NEW_LINE@1..2 "\n"
          EOF@2..2 ""
    "#]]
    .assert_eq(&file.debug_tree());

    let [diagnostic] = file.diagnostics() else {
        panic!("expected one diagnostic, got {:?}", file.diagnostics());
    };
    assert_eq!(diagnostic.code(), 5);
    assert_eq!(diagnostic.message(), "Non-empty string expected.");
    assert_eq!(diagnostic.lined().start, Position::new(0, 1));
    assert_eq!(diagnostic.lined().end, Position::new(0, 1));
}

#[test]
fn missing_tag_name_leaves_the_rest_alone() {
    let file = parse(">\n>p\n  .x\n");
    assert_eq!(file.diagnostics().len(), 1);
    assert_eq!(kinds(&file, file.lines()), [ELEMENT_DECLARATION, ELEMENT_DECLARATION]);
    assert_eq!(kinds(&file, children(&file, file.lines()[1])), [TEXT_LINE]);
}

#[test]
fn lone_mustache_attribute_value() {
    let file = parse("#value = {{a.b = 1}}\n");

    expect![[r##"
        SOURCE_FILE@0..21
          ATTRIBUTE_OR_PROPERTY@0..21
            HASH@0..1 "#"
            STRING_LITERAL@1..6 "value"
            EQ@6..8 " ="
            MUSTACHE@8..20
              MUSTACHE_START@8..11 " {{"
              DOTTED_CHAIN@11..14
                STRING_LITERAL@11..12 "a"
                DOT@12..13 "."
                STRING_LITERAL@13..14 "b"
              EQ@14..16 " ="
              STRING_LITERAL@16..18 " 1"
              MUSTACHE_END@18..20 "}}"
            NEW_LINE@20..21 "\n"
          EOF@21..21 ""
    "##]]
    .assert_eq(&file.debug_tree());
}

#[test]
fn property_binding_stops_at_its_trigger_event() {
    let text = ">input\n  %value@input = {{x}}\n  #title@x\n";
    let file = parse(text);
    assert!(file.diagnostics().is_empty());
    check_tree(&file, text);

    let lines = children(&file, file.lines()[0]);
    let NodeData::AttributeOrProperty(property) = &file[lines[0]].data else {
        panic!("expected a property line");
    };
    assert_eq!(file.node_text(property.binding), "value");
    let (at, event) = property.trigger_event.unwrap();
    assert_eq!(file.kind(at), AT);
    assert_eq!(file.node_text(event), "input");
    assert!(property.initializer.is_some());

    // Attributes have no trigger event; `@` stays in the binding.
    let NodeData::AttributeOrProperty(attribute) = &file[lines[1]].data else {
        panic!("expected an attribute line");
    };
    assert_eq!(file.node_text(attribute.binding), "title@x");
    assert_eq!(attribute.trigger_event, None);
}

#[test]
fn empty_trigger_event_is_reported() {
    let file = parse("%value@ = x\n");
    let [diagnostic] = file.diagnostics() else {
        panic!("expected one diagnostic, got {:?}", file.diagnostics());
    };
    assert_eq!(diagnostic.code(), 5);
}

#[test]
fn mustache_followed_by_text_is_a_template() {
    let file = parse("#x = {{a}} tail\n");
    assert!(file.diagnostics().is_empty());

    let NodeData::AttributeOrProperty(attribute) = &file[file.lines()[0]].data else {
        panic!("expected an attribute line");
    };
    let (_, value) = attribute.initializer.unwrap();
    let NodeData::TemplateString(template) = &file[value].data else {
        panic!("expected a template");
    };
    assert_eq!(kinds(&file, &template.parts), [MUSTACHE, STRING_LITERAL]);
    check_tree(&file, "#x = {{a}} tail\n");
}

#[test]
fn event_handler_parts() {
    let file = parse("@click.ctrl.13 = submit : {{item}}\n");
    assert!(file.diagnostics().is_empty());

    let NodeData::EventHandler(handler) = &file[file.lines()[0]].data else {
        panic!("expected an event handler");
    };
    assert_eq!(file.node_text(handler.event), "click");
    let (_, chain) = handler.modifiers.unwrap();
    let NodeData::DottedChain(chain) = &file[chain].data else { unreachable!() };
    let segments = chain.segments().map(|id| file.node_text(id)).collect::<Vec<_>>();
    assert_eq!(segments, ["ctrl", "13"]);
    assert_eq!(file.node_text(handler.handler).trim(), "submit");
    assert!(handler.parameter.is_some());
}

#[test]
fn trailing_dot_in_modifiers() {
    let file = parse(">div\n  @click.ctrl.meta.stop.alt.\n");
    let codes = file.diagnostics().iter().map(|d| d.code()).collect::<Vec<_>>();
    assert_eq!(codes, [5, 1, 5]);

    let event = children(&file, file.lines()[0])[0];
    let NodeData::EventHandler(handler) = &file[event].data else { unreachable!() };
    assert!(file[handler.equals].missing);
    let (_, chain) = handler.modifiers.unwrap();
    let NodeData::DottedChain(chain) = &file[chain].data else { unreachable!() };
    assert_eq!(kinds(&file, &chain.items[chain.items.len() - 2..]), [DOT, STRING_LITERAL]);
    assert!(file[*chain.items.last().unwrap()].missing);
}

#[test]
fn blank_lines_do_not_end_a_block() {
    let file = parse(">div\n  .a\n\n  .b\n");
    assert!(file.diagnostics().is_empty());
    assert_eq!(kinds(&file, file.lines()), [ELEMENT_DECLARATION]);
    assert_eq!(
        kinds(&file, children(&file, file.lines()[0])),
        [TEXT_LINE, COMMENT_LINE, TEXT_LINE]
    );
}

#[test]
fn trailing_blank_lines_belong_to_the_outer_block() {
    let file = parse(">div\n  .a\n\n>p\n");
    assert_eq!(kinds(&file, file.lines()), [ELEMENT_DECLARATION, COMMENT_LINE, ELEMENT_DECLARATION]);
    assert_eq!(kinds(&file, children(&file, file.lines()[0])), [TEXT_LINE]);
}

#[test]
fn dedent_closes_blocks() {
    let file = parse(">a\n  >b\n    .c\n  .d\n.e\n");
    assert!(file.diagnostics().is_empty());

    assert_eq!(kinds(&file, file.lines()), [ELEMENT_DECLARATION, TEXT_LINE]);
    let a = children(&file, file.lines()[0]);
    assert_eq!(kinds(&file, a), [ELEMENT_DECLARATION, TEXT_LINE]);
    assert_eq!(kinds(&file, children(&file, a[0])), [TEXT_LINE]);
    check_indentation(&file);
}

#[test]
fn deeper_line_without_element_is_a_warning() {
    let file = parse(">div\n  .a\n    .b\n");

    let [diagnostic] = file.diagnostics() else {
        panic!("expected one diagnostic, got {:?}", file.diagnostics());
    };
    assert_eq!(diagnostic.severity(), Severity::Warning);
    assert_eq!(diagnostic.message(), "Unexpected indentation: expected 2 columns, found 4.");
    assert_eq!(diagnostic.related().len(), 1);
    assert_eq!(kinds(&file, children(&file, file.lines()[0])), [TEXT_LINE, TEXT_LINE]);
}

#[test]
fn unexpected_token_becomes_a_comment_line() {
    let file = parse("= x\n>div\n");

    let [diagnostic] = file.diagnostics() else {
        panic!("expected one diagnostic, got {:?}", file.diagnostics());
    };
    assert_eq!(diagnostic.code(), 2);
    assert_eq!(diagnostic.message(), "Unexpected token '='");
    assert_eq!(kinds(&file, file.lines()), [COMMENT_LINE, ELEMENT_DECLARATION]);
}

#[test]
fn whitespace_only_last_line() {
    let file = parse(">a\n  ");
    assert!(file.diagnostics().is_empty());
    assert_eq!(kinds(&file, file.lines()), [ELEMENT_DECLARATION, COMMENT_LINE]);
    check_tree(&file, ">a\n  ");
}

#[test]
fn recovery_diagnostics_in_order() {
    let text = ">\n= stray\n@click\n#\n>div\n  .{{broken\n    .too deep\n";
    let file = parse(text);

    let codes = file.diagnostics().iter().map(|d| d.code()).collect::<Vec<_>>();
    assert_eq!(codes, [5, 2, 1, 5, 5, 1, 3]);
    check_tree(&file, text);
}

#[test]
fn positions_are_lined() {
    let file = parse(">div\n  .hello\n");
    let element = &file[file.lines()[0]].position;
    assert!(element.crosses_line);
    assert_eq!(element.character, element.len);

    let dot = file.find(|node| node.kind() == DOT).unwrap();
    let dot = &file[dot].position;
    assert_eq!((dot.line, dot.start_character, dot.character, dot.len), (1, 2, 3, 1));
    assert!(!dot.crosses_line);
}

#[test]
fn crlf_lines() {
    let file = parse(">a\r\n  .b\r\n");
    assert!(file.diagnostics().is_empty());
    let text = children(&file, file.lines()[0])[0];
    assert_eq!(file[text].position.line, 1);
    assert_eq!(file[text].position.start_character, 0);
}

#[test]
#[should_panic(expected = "parser invariant violated")]
fn list_without_element_is_an_invariant_violation() {
    let mut p = Parser::new(">a");
    p.node_list(|_| true, |_| None);
}

#[test]
#[should_panic(expected = "parser invariant violated")]
fn list_without_progress_is_an_invariant_violation() {
    let mut p = Parser::new(">a");
    p.node_list(|p| !p.at(EOF), |p| Some(p.missing(NodeData::StringLiteral)));
}

proptest! {
    #[test]
    fn parsing_is_total_lossless_and_deterministic(
        text in "[>#%@.|+=:{}é \\-\\tab\\n\\r]{0,120}"
    ) {
        let file = parse(&text);
        check_tree(&file, &text);
        prop_assert_eq!(parse(&text), file);
    }
}
