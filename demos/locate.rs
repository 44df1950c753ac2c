//! Locating Elements Example
//!
//! This example parses two XML fragments embedded in a larger file, and finds which element
//! owns a cursor or a selection.
//!
//! It also shows how to move from a matched element to its neighbours, and which spans of text
//! to highlight for them.
use markup_locator::{
    DocumentSet, ElementPart, Fragment, LineIndex, Position, Span, element_preview,
    element_regions, nodes_at_spans, relative_node,
};

// Imagine a source file with two XML blocks in it, starting on rows 2 and 9
const FIRST: &str = r#"<config>
  <server host="localhost" port="8080"/>
  <server host="backup" port="8081">
    <retry count="3"/>
  </server>
</config>"#;

const SECOND: &str = "<notes>\n  <note>Remember the backup</note>\n</notes>";

fn main() {
    //
    // Each fragment is parsed on its own, with the row it starts at
    //
    // Fragments that fail to parse are reported and left out, the others are still usable.
    let (set, errors) =
        DocumentSet::parse_fragments([Fragment::new(FIRST, 2), Fragment::new(SECOND, 9)]);
    for (index, error) in &errors {
        eprintln!("Fragment {index} failed to parse: {error}");
    }

    //
    // Spans are resolved in one batch, and each gets the smallest element containing it.
    //
    // Positions are 0-based rows and columns of the whole file, not of the fragment.
    let cursor = Span::point(Position::new(5, 8));
    let selection = Span::new(Position::new(10, 8), Position::new(10, 16));
    let matches = nodes_at_spans(&set, &[cursor, selection]);

    for (query, found) in [cursor, selection].iter().zip(&matches) {
        let Some(found) = found else {
            println!("{query} is outside every fragment");
            continue;
        };

        //
        // Every element knows where its tags are; the source is only needed to show them
        let source = if found.node.tree().line_offset() == 2 {
            FIRST
        } else {
            SECOND
        };
        let preview = element_preview(source, found.node, Some(40)).unwrap();
        println!("{query} is in <{}>: {preview}", found.node.element().name());

        //
        // Directions move between elements, and regions say what to highlight
        if let Some(parent) = relative_node(found.node, "parent".parse().unwrap()) {
            let names = element_regions(parent, ElementPart::Names).unwrap();
            let index = LineIndex::new(source, parent.tree().line_offset());
            for span in names {
                println!("  parent name at {span}: {:?}", index.slice(&span));
            }
        }
    }
}
