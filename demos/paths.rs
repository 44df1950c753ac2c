//! Path Generation Example
//!
//! This example builds a path expression for an element, then evaluates it to get the element
//! back.
//!
//! Documents that bind one prefix to several namespaces get synthetic prefixes, so the paths
//! stay unambiguous.
use markup_locator::{
    LocationPathEngine, PathEngine, PathMode, PathOptions, Position, Tree, node_at, path_of,
    unique_namespace_prefixes,
};

const DOCUMENT: &str = r#"<library>
  <shelf xmlns:b="urn:books">
    <b:item id="1"/>
    <b:item id="2"/>
  </shelf>
  <shelf xmlns:b="urn:music">
    <b:item id="1"/>
  </shelf>
</library>"#;

fn main() {
    let tree = match Tree::parse(DOCUMENT, 0) {
        Ok(tree) => tree,
        Err(e) => panic!("Error parsing XML document:\n{e}"),
    };

    //
    // Options usually come from the host's settings, as JSON
    //
    // Unknown keys are rejected, and missing ones keep their defaults.
    let options = PathOptions::from_json(
        r#"{ "remap_namespace_prefixes": true, "include_attributes": true, "attribute_allow_list": ["id"] }"#,
    )
    .unwrap();

    //
    // The prefix map names every namespace of the tree;
    // here `b` stands for urn:books and `b1` for urn:music
    let namespaces = unique_namespace_prefixes(tree.namespaces(), &options.uniquify_options());
    for mapping in &namespaces {
        println!("{} = {}", mapping.prefix, mapping.uri);
    }

    //
    // Paths can be absolute, or relative to an ancestor
    let item = node_at([&tree], Position::new(6, 6)).unwrap();
    let shelf = item.parent().unwrap();
    let absolute = path_of(item, PathMode::Absolute, &options).unwrap();
    let relative = path_of(item, PathMode::RelativeTo(shelf), &options).unwrap();
    println!("{absolute}");
    println!("{relative}");

    //
    // Evaluating the path selects the same element again
    let items = LocationPathEngine
        .evaluate(&tree, &absolute, &namespaces, None)
        .unwrap();
    let found = items[0].node(&tree).unwrap();
    assert_eq!(found, item);
}
