//! Geoff recursive descent parser.
//!
//! Reads a document of statements into a [`Subgraph`]:
//! - paths of nodes and relationship boxes: `(a:Person)-[:KNOWS]->(b)`
//! - hook declarations: `:Person:name:=>(a {name:"Alice"})`
//! - block comments: `/* ... */`
//! - document boundaries: `~~~~`

use std::str::Chars;
use std::time::Instant;

use crate::model::{AbstractNode, AbstractRelationship, PropertyMap, Subgraph};
use crate::{Error, Result};
use super::literal::{read_string, read_value};
use super::scanner::Scanner;

/// Arrow on either side of a relationship box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arrow {
    Left,  // <-
    Plain, // -
    Right, // ->
}

/// Streaming reader: each call to [`Reader::read_subgraph`] consumes one
/// document, up to a boundary marker or the end of input.
pub struct Reader<I: Iterator<Item = char>> {
    sc: Scanner<I>,
}

impl<'a> Reader<Chars<'a>> {
    pub fn new(text: &'a str) -> Self {
        Self::from_chars(text.chars())
    }
}

impl<I: Iterator<Item = char>> Reader<I> {
    pub fn from_chars(chars: I) -> Self {
        Self { sc: Scanner::new(chars) }
    }

    /// Whether any input remains after the last document read.
    pub fn has_more(&mut self) -> bool {
        self.sc.has_more()
    }

    /// Read one document.
    pub fn read_subgraph(&mut self) -> Result<Subgraph> {
        tracing::info!(position = self.sc.position(), "Reading subgraph");
        let t0 = Instant::now();
        let mut subgraph = Subgraph::new();

        self.sc.skip_whitespace();
        while let Some(ch) = self.sc.peek() {
            match ch {
                '(' => self.read_path(&mut subgraph)?,
                ':' => self.read_hook(&mut subgraph)?,
                '/' => {
                    let comment = self.read_comment()?;
                    subgraph.add_comment(comment);
                }
                '~' => {
                    self.read_boundary()?;
                    self.sc.skip_whitespace();
                    break;
                }
                _ => return Err(self.sc.unexpected("statement")),
            }
            self.sc.skip_whitespace();
        }

        tracing::info!(
            nodes = subgraph.order(),
            relationships = subgraph.size(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Read subgraph"
        );
        Ok(subgraph)
    }

    // ========================================================================
    // Statements
    // ========================================================================

    /// `node (arrow relBox arrow node)* sharedProps?`
    fn read_path(&mut self, subgraph: &mut Subgraph) -> Result<()> {
        let mut node = self.read_node()?;
        let mut relationships = Vec::new();
        self.sc.skip_whitespace();

        while self.sc.next_is('<') || self.sc.next_is('-') {
            let position = self.sc.position();
            let left = self.read_arrow()?;
            self.sc.skip_whitespace();
            let (rel_type, props) = self.read_relationship_box()?;
            self.sc.skip_whitespace();
            let right = self.read_arrow()?;
            self.sc.skip_whitespace();
            let other = self.read_node()?;
            self.sc.skip_whitespace();

            if left != Arrow::Left && right != Arrow::Right {
                return Err(Error::UndirectedRelationship { position });
            }
            if left == Arrow::Left {
                relationships.push(AbstractRelationship {
                    start: other.name().to_owned(),
                    end: node.name().to_owned(),
                    rel_type: rel_type.clone(),
                    properties: props.clone(),
                });
            }
            if right == Arrow::Right {
                relationships.push(AbstractRelationship {
                    start: node.name().to_owned(),
                    end: other.name().to_owned(),
                    rel_type,
                    properties: props,
                });
            }
            subgraph.merge_node(std::mem::replace(&mut node, other));
        }

        let shared = if self.sc.next_is('{') {
            Some(self.read_property_map()?)
        } else {
            None
        };

        if relationships.is_empty() {
            if let Some(props) = shared {
                node.merge_properties(props);
            }
            subgraph.merge_node(node);
        } else {
            subgraph.merge_node(node);
            for mut rel in relationships {
                if let Some(props) = &shared {
                    rel.merge_properties(props.clone());
                }
                subgraph.add_relationship(rel);
            }
        }
        Ok(())
    }

    /// `":" label ":" (key ":")* "=>" "?"? node`
    fn read_hook(&mut self, subgraph: &mut Subgraph) -> Result<()> {
        self.sc.read_exact(':')?;
        self.sc.skip_whitespace();
        let label = self.read_name()?;
        self.sc.skip_whitespace();
        self.sc.read_exact(':')?;
        self.sc.skip_whitespace();

        let mut keys = Vec::new();
        while !self.sc.next_is('=') {
            keys.push(self.read_name()?);
            self.sc.skip_whitespace();
            self.sc.read_exact(':')?;
            self.sc.skip_whitespace();
        }
        let arrow_position = self.sc.position();
        self.sc.read_exact('=')?;
        self.sc.read_exact('>')?;
        let optional = if self.sc.next_is('?') {
            self.sc.read()?;
            true
        } else {
            false
        };
        if keys.is_empty() {
            return Err(Error::MissingHookKey { position: arrow_position });
        }
        self.sc.skip_whitespace();

        let node = self.read_node()?;
        subgraph.merge_node(node).set_hook(label, keys, optional);
        Ok(())
    }

    /// `"/*" text "*/"`, returning the trimmed text.
    fn read_comment(&mut self) -> Result<String> {
        self.sc.read_exact('/')?;
        self.sc.read_exact('*')?;
        let text = self.sc.read_until_str("*/");
        match text.strip_suffix("*/") {
            Some(body) => Ok(body.trim().to_string()),
            None => Err(Error::UnexpectedEndOfInput { position: self.sc.position() }),
        }
    }

    /// Four or more `~`.
    fn read_boundary(&mut self) -> Result<()> {
        for _ in 0..4 {
            self.sc.read_exact('~')?;
        }
        while self.sc.next_is('~') {
            self.sc.read()?;
        }
        Ok(())
    }

    // ========================================================================
    // Entities
    // ========================================================================

    /// `"(" (name? labels? props?) ")"`
    fn read_node(&mut self) -> Result<AbstractNode> {
        self.sc.read_exact('(')?;
        self.sc.skip_whitespace();

        let name = match self.sc.peek() {
            Some(')') | Some(':') | Some('{') => None,
            _ => {
                let name = self.read_name()?;
                self.sc.skip_whitespace();
                Some(name)
            }
        };
        let mut node = AbstractNode::new(name);
        if self.sc.next_is(':') {
            node.merge_labels(self.read_labels()?);
            self.sc.skip_whitespace();
        }
        if self.sc.next_is('{') {
            node.merge_properties(self.read_property_map()?);
            self.sc.skip_whitespace();
        }

        self.sc.read_exact(')')?;
        Ok(node)
    }

    /// `"[" name? ":" type props? "]"`; also accepts `[:name:TYPE]`.
    /// Relationship names are read and discarded.
    fn read_relationship_box(&mut self) -> Result<(String, PropertyMap)> {
        self.sc.read_exact('[')?;
        self.sc.skip_whitespace();
        if !self.sc.next_is(':') {
            self.read_name()?;
            self.sc.skip_whitespace();
        }
        self.sc.read_exact(':')?;
        let mut rel_type = self.read_name()?;
        if self.sc.next_is(':') {
            self.sc.read()?;
            rel_type = self.read_name()?;
        }
        self.sc.skip_whitespace();

        let props = if self.sc.next_is('{') {
            let props = self.read_property_map()?;
            self.sc.skip_whitespace();
            props
        } else {
            PropertyMap::new()
        };
        self.sc.read_exact(']')?;
        Ok((rel_type, props))
    }

    fn read_arrow(&mut self) -> Result<Arrow> {
        match self.sc.peek() {
            Some('<') => {
                self.sc.read()?;
                self.sc.read_exact('-')?;
                Ok(Arrow::Left)
            }
            Some('-') => {
                self.sc.read()?;
                if self.sc.next_is('>') {
                    self.sc.read()?;
                    Ok(Arrow::Right)
                } else {
                    Ok(Arrow::Plain)
                }
            }
            _ => Err(self.sc.unexpected("arrow")),
        }
    }

    /// `(":" name)+`
    fn read_labels(&mut self) -> Result<Vec<String>> {
        let mut labels = Vec::new();
        while self.sc.next_is(':') {
            self.sc.read()?;
            labels.push(self.read_name()?);
        }
        Ok(labels)
    }

    /// `"{" (name ":" value ("," name ":" value)*)? "}"`
    fn read_property_map(&mut self) -> Result<PropertyMap> {
        let mut props = PropertyMap::new();
        self.sc.read_exact('{')?;
        self.sc.skip_whitespace();
        if !self.sc.next_is('}') {
            loop {
                let key = self.read_name()?;
                self.sc.skip_whitespace();
                self.sc.read_exact(':')?;
                self.sc.skip_whitespace();
                let value = read_value(&mut self.sc)?;
                props.insert(key, value);
                self.sc.skip_whitespace();
                if !self.sc.next_is(',') {
                    break;
                }
                self.sc.read()?;
                self.sc.skip_whitespace();
            }
        }
        self.sc.read_exact('}')?;
        Ok(props)
    }

    /// A bare identifier (letters, digits, `_`) or a quoted string.
    fn read_name(&mut self) -> Result<String> {
        if self.sc.next_is('"') {
            return read_string(&mut self.sc);
        }
        let mut name = String::new();
        while self.sc.next_matches(|c| c.is_alphanumeric() || c == '_') {
            name.push(self.sc.read()?);
        }
        if name.is_empty() {
            return Err(self.sc.unexpected("name"));
        }
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;
    use pretty_assertions::assert_eq;

    fn parse(text: &str) -> Result<Subgraph> {
        Reader::new(text).read_subgraph()
    }

    #[test]
    fn test_single_node() {
        let g = parse(r#"(a:Person:Employee {name:"Alice", age:30})"#).unwrap();
        assert_eq!(g.order(), 1);
        assert_eq!(g.size(), 0);
        let a = g.node("a").unwrap();
        assert!(a.is_named());
        assert!(a.has_label("Person"));
        assert!(a.has_label("Employee"));
        assert_eq!(a.get("name"), Some(&Value::from("Alice")));
        assert_eq!(a.get("age"), Some(&Value::Int(30)));
    }

    #[test]
    fn test_node_forms() {
        let g = parse(r#"() (:Person) ({x:1}) (:Person {x:2}) (b) (c {y:3}) ("quoted name":L)"#).unwrap();
        assert_eq!(g.order(), 7);
        assert_eq!(g.nodes().filter(|n| n.is_named()).count(), 3);
        assert!(g.node("quoted name").unwrap().has_label("L"));
        assert_eq!(g.node("c").unwrap().get("y"), Some(&Value::Int(3)));
    }

    #[test]
    fn test_whitespace_inside_node() {
        let g = parse("( a :Person { name : \"Alice\" } )").unwrap();
        let a = g.node("a").unwrap();
        assert!(a.has_label("Person"));
        assert_eq!(a.get("name"), Some(&Value::from("Alice")));
    }

    #[test]
    fn test_left_relationship() {
        let g = parse(r#"(a:Person {name:"Ingrid",age:10})<-[:KNOWS]-(b:Person {name:"Ingrid",age:20})"#).unwrap();
        assert_eq!(g.order(), 2);
        assert_eq!(g.size(), 1);
        let rel = &g.relationships()[0];
        assert_eq!(rel.start, "b");
        assert_eq!(rel.end, "a");
        assert_eq!(rel.rel_type, "KNOWS");
    }

    #[test]
    fn test_bidirectional_box_yields_two() {
        let g = parse("(a)<-[:X]->(b)").unwrap();
        let rels: Vec<_> = g.relationships().iter().map(|r| (r.start.as_str(), r.end.as_str())).collect();
        assert_eq!(rels, vec![("b", "a"), ("a", "b")]);
    }

    #[test]
    fn test_long_path_with_shared_props() {
        let g = parse("(a)-[:X {w:1}]->(b) <-[:Y]- (c) {since:1999}").unwrap();
        assert_eq!(g.order(), 3);
        assert_eq!(g.size(), 2);
        let x = &g.relationships()[0];
        assert_eq!((x.start.as_str(), x.end.as_str()), ("a", "b"));
        assert_eq!(x.properties.get("w"), Some(&Value::Int(1)));
        assert_eq!(x.properties.get("since"), Some(&Value::Int(1999)));
        let y = &g.relationships()[1];
        assert_eq!((y.start.as_str(), y.end.as_str()), ("c", "b"));
        assert_eq!(y.properties.get("since"), Some(&Value::Int(1999)));
        assert!(g.node("a").unwrap().properties.is_empty());
    }

    #[test]
    fn test_shared_props_on_single_node() {
        let g = parse("(a {x:1}) {y:2}").unwrap();
        let a = g.node("a").unwrap();
        assert_eq!(a.get("x"), Some(&Value::Int(1)));
        assert_eq!(a.get("y"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_relationship_name_forms() {
        let g = parse("(a)-[r:X]->(b) (a)-[:Y]->(b) (a)-[:s:Z]->(b)").unwrap();
        let types: Vec<_> = g.relationships().iter().map(|r| r.rel_type.as_str()).collect();
        assert_eq!(types, vec!["X", "Y", "Z"]);
    }

    #[test]
    fn test_undirected_relationship() {
        let err = parse("(a)-[:X]-(b)").unwrap_err();
        assert!(matches!(err, Error::UndirectedRelationship { position: 3 }));
    }

    #[test]
    fn test_nodes_merge_by_name() {
        let g = parse(r#"(a:Person {name:"Alice"}) (a:Employee {name:"Alicia", age:3})"#).unwrap();
        assert_eq!(g.order(), 1);
        let a = g.node("a").unwrap();
        assert!(a.has_label("Person") && a.has_label("Employee"));
        assert_eq!(a.get("name"), Some(&Value::from("Alicia")));
    }

    #[test]
    fn test_hook() {
        let g = parse(r#":Person:name:age:=>(  :Person {name:"Ingrid",age:10})"#).unwrap();
        assert_eq!(g.order(), 1);
        let node = g.nodes().next().unwrap();
        assert!(!node.is_named());
        let hook = node.hook.as_ref().unwrap();
        assert_eq!(hook.label, "Person");
        assert_eq!(hook.keys.as_slice(), ["name".to_string(), "age".to_string()]);
        assert!(!hook.optional);
    }

    #[test]
    fn test_optional_hook_adds_label_and_placeholder() {
        let g = parse(r#":Person:email:=>?(p {name:"Bob"})"#).unwrap();
        let p = g.node("p").unwrap();
        assert!(p.has_label("Person"));
        assert!(p.hook.as_ref().unwrap().optional);
        assert_eq!(p.get("email"), Some(&Value::Null));
        assert_eq!(p.get("name"), Some(&Value::from("Bob")));
    }

    #[test]
    fn test_hook_on_node_declared_earlier() {
        let g = parse(r#"(p {name:"Bob"})-[:X]->(q) :Person:name:=>(p)"#).unwrap();
        let p = g.node("p").unwrap();
        assert_eq!(p.hook.as_ref().unwrap().label, "Person");
        assert_eq!(p.get("name"), Some(&Value::from("Bob")));
    }

    #[test]
    fn test_hook_without_keys() {
        assert!(matches!(parse(":Person:=>(p)"), Err(Error::MissingHookKey { .. })));
    }

    #[test]
    fn test_comments() {
        let g = parse("/* first */ (a) /* second\n line */").unwrap();
        assert_eq!(g.comments(), ["first".to_string(), "second\n line".to_string()]);
    }

    #[test]
    fn test_unterminated_comment() {
        assert!(matches!(parse("/* open"), Err(Error::UnexpectedEndOfInput { .. })));
    }

    #[test]
    fn test_boundary_ends_document() {
        let mut reader = Reader::new("(a)\n~~~~~~\n(b) (c)");
        let first = reader.read_subgraph().unwrap();
        assert_eq!(first.order(), 1);
        assert!(reader.has_more());
        let second = reader.read_subgraph().unwrap();
        assert_eq!(second.order(), 2);
        assert!(!reader.has_more());
    }

    #[test]
    fn test_short_boundary_is_error() {
        assert!(matches!(parse("(a) ~~~ (b)"), Err(Error::UnexpectedCharacter { found: ' ', .. })));
    }

    #[test]
    fn test_unexpected_statement() {
        assert!(matches!(parse("(a) x"), Err(Error::UnexpectedCharacter { found: 'x', position: 4, .. })));
    }

    #[test]
    fn test_unexpected_end() {
        assert!(matches!(parse("(a:Person"), Err(Error::UnexpectedEndOfInput { .. })));
        assert!(matches!(parse("(a)-[:X]->"), Err(Error::UnexpectedEndOfInput { .. })));
    }

    #[test]
    fn test_empty_document() {
        let g = parse("  \n ").unwrap();
        assert!(g.is_empty());
    }
}
