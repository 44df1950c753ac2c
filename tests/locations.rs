use markup_locator::{
    LineIndex, ParseErrorKind, ParseOptions, Position, PositionField, Span, Tree,
    parse_with_abort,
};

fn p(row: usize, column: usize) -> Position {
    Position::new(row, column)
}

/// Reads back the text of every recorded tag and checks it is the tag as written.
fn assert_tags_read_back(src: &str, offset: usize) {
    let tree = Tree::parse(src, offset).unwrap();
    let index = LineIndex::new(src, offset);

    for node in tree.descendants() {
        let element = node.element();
        let open = index.slice(&element.open_tag().unwrap()).unwrap();
        let close = index.slice(&element.close_tag().unwrap()).unwrap();

        assert!(open.starts_with('<') && open.ends_with('>'), "{open:?} in {src:?}");
        assert!(!open[1..open.len() - 1].contains('>'), "{open:?} in {src:?}");
        if element.is_self_closing() {
            assert_eq!(open, close);
        } else {
            assert_eq!(close, format!("</{}>", element.name()), "in {src:?}");
        }
    }
}

#[test]
fn test_tags_read_back() {
    let documents = [
        "<a/>",
        "<a></a>",
        r#"<a x="1"><b/>hi</a>"#,
        "<a>\n  <b>\n    <c   />\n  </b>\n  text\n</a>",
        "<a><!--x--><b/><?pi?><c></c><!--y--></a>",
        "<a><![CDATA[<fake/>]]><b>&lt;</b></a>",
        "<r xmlns:p='u'><p:x p:y='z'><p:x/></p:x></r>",
        "<a>ünï<b>cødé</b>ü</a>",
        "<a\n  x='1'\n  y=\"2\"\n/>",
    ];
    for src in documents {
        assert_tags_read_back(src, 0);
        assert_tags_read_back(src, 41);
    }
}

#[test]
fn test_scenario() {
    let tree = Tree::parse(r#"<a x="1"><b/>hi</a>"#, 0).unwrap();
    let a = tree.root().element();
    let b = tree.root().children().next().unwrap();

    assert_eq!(a.open_tag(), Some(Span::new(p(0, 0), p(0, 9))));
    assert_eq!(a.position(PositionField::CloseTagStart), Some(p(0, 15)));
    assert_eq!(b.position(PositionField::OpenTagStart), Some(p(0, 9)));
    assert_eq!(b.position(PositionField::CloseTagStart), Some(p(0, 9)));
    assert!(b.element().is_self_closing());
}

#[test]
fn test_self_closing() {
    let short = Tree::parse("<a/>", 0).unwrap();
    let short = short.root().element();
    assert_eq!(
        short.position(PositionField::OpenTagStart),
        short.position(PositionField::CloseTagStart)
    );
    assert_eq!(
        short.position(PositionField::OpenTagEnd),
        short.position(PositionField::CloseTagEnd)
    );
    assert!(short.is_self_closing());

    let long = Tree::parse("<a></a>", 0).unwrap();
    let long = long.root().element();
    assert!(!long.is_self_closing());
    assert_eq!(long.open_tag(), Some(Span::new(p(0, 0), p(0, 3))));
    assert_eq!(long.close_tag(), Some(Span::new(p(0, 3), p(0, 7))));
}

#[test]
fn test_adjacent_comments_do_not_skip_finalization() {
    let src = "<a>x<!--1--><!--2--><b/><!--3--><!--4-->y<c></c><!--5--><!--6--></a>";
    let tree = Tree::parse(src, 0).unwrap();
    let a = tree.root();
    let b = a.children().next().unwrap();
    let c = a.children().nth(1).unwrap();

    assert_eq!(a.element().open_tag(), Some(Span::new(p(0, 0), p(0, 3))));
    assert_eq!(a.element().text(), Some("x"));

    assert_eq!(b.element().open_tag(), Some(Span::new(p(0, 20), p(0, 24))));
    assert!(b.element().is_self_closing());
    assert_eq!(b.element().tail(), Some("y"));

    assert_eq!(c.element().open_tag(), Some(Span::new(p(0, 41), p(0, 44))));
    assert_eq!(c.element().close_tag(), Some(Span::new(p(0, 44), p(0, 48))));
    assert_eq!(a.element().close_tag(), Some(Span::new(p(0, 64), p(0, 68))));
}

#[test]
fn test_comment_between_child_tags() {
    let src = "<a><b/><!--c-->t</a>";
    let tree = Tree::parse(src, 0).unwrap();
    let b = tree.root().children().next().unwrap();
    assert!(b.element().is_self_closing());
    assert_eq!(b.element().extent(), Some(Span::new(p(0, 3), p(0, 7))));
    assert_eq!(b.element().tail(), Some("t"));
}

#[test]
fn test_offset_applies_to_rows_only() {
    let tree = Tree::parse("<a>\n<b/></a>", 100).unwrap();
    let b = tree.root().children().next().unwrap();
    assert_eq!(tree.root().position(PositionField::OpenTagStart), Some(p(100, 0)));
    assert_eq!(b.position(PositionField::OpenTagStart), Some(p(101, 0)));
    assert_eq!(b.position(PositionField::OpenTagEnd), Some(p(101, 4)));
}

#[test]
fn test_location_pseudo_attributes() {
    let tree = Tree::parse("<a>\n  <b/>\n</a>", 3).unwrap();
    let b = tree.root().children().next().unwrap();
    let values: Vec<_> = b
        .element()
        .location_attributes()
        .map(|(name, value)| (name.local, value))
        .collect();

    assert_eq!(
        values,
        [
            ("open_tag_start_pos".to_string(), "4/2".to_string()),
            ("open_tag_end_pos".to_string(), "4/6".to_string()),
            ("close_tag_start_pos".to_string(), "4/2".to_string()),
            ("close_tag_end_pos".to_string(), "4/6".to_string()),
        ]
    );
    assert_eq!("4/6".parse::<Position>().unwrap(), p(4, 6));
}

#[test]
fn test_errors_point_into_the_document() {
    let error = Tree::parse("<a>\n  <b></c>\n</a>", 20).unwrap_err();
    assert!(matches!(error.kind, ParseErrorKind::MismatchedCloseTag { .. }));
    assert_eq!((error.line, error.column), (22, 6));
    assert_eq!(error.position(), p(21, 5));
    assert_eq!(
        error.to_string(),
        "22:6 - Mismatched tag: expected </b>, found </c>"
    );

    let error = Tree::parse("<a/><b/>", 0).unwrap_err();
    assert_eq!(error.line, 1);
}

#[test]
fn test_abort() {
    let src = format!("<a>{}</a>", "<b>text</b>".repeat(5000));
    let options = ParseOptions::default();

    let tree = parse_with_abort(&src, &options, || false).unwrap().unwrap();
    assert!(tree.is_complete());
    assert_eq!(tree.len(), 5001);

    let mut calls = 0;
    let partial = parse_with_abort(&src, &options, || {
        calls += 1;
        calls == 2
    })
    .unwrap()
    .unwrap();
    assert!(!partial.is_complete());
    assert!(partial.len() < 5001);
    assert!(partial.root().element().close_tag().is_none());
}
