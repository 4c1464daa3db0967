//! # Geoff Notation
//!
//! Reader for the Geoff graph notation, producing [`Subgraph`] documents.
//! Pure functions over text with no storage dependency.
//!
//! ```text
//! /* people */
//! (alice:Person {name:"Alice"})-[:KNOWS {since:1999}]->(bob:Person {name:"Bob"})
//! :Person:name:=>(alice)
//! ~~~~
//! ```

pub mod scanner;
pub mod literal;
pub mod parser;

use std::io::{self, BufRead, BufReader, Read};

use crate::model::Subgraph;
use crate::Result;

pub use parser::Reader;

/// Parse the first document in `text`. Anything after a boundary marker is
/// ignored.
pub fn parse(text: &str) -> Result<Subgraph> {
    Reader::new(text).read_subgraph()
}

/// Parse every boundary-separated document in `text`.
pub fn parse_all(text: &str) -> Result<Vec<Subgraph>> {
    read_documents(Reader::new(text))
}

/// Parse every document from a UTF-8 stream, decoding it a line at a time.
///
/// A read failure or invalid UTF-8 is reported as [`Error::Io`](crate::Error::Io),
/// even when it also cut a document short.
pub fn parse_reader<R: Read>(input: R) -> Result<Vec<Subgraph>> {
    let mut chars = LineChars::new(BufReader::new(input));
    let documents = read_documents(Reader::from_chars(&mut chars));
    match chars.error.take() {
        Some(e) => Err(e.into()),
        None => documents,
    }
}

fn read_documents<I: Iterator<Item = char>>(mut reader: Reader<I>) -> Result<Vec<Subgraph>> {
    let mut documents = Vec::new();
    while reader.has_more() {
        documents.push(reader.read_subgraph()?);
    }
    Ok(documents)
}

/// Characters of a buffered stream, one line held in memory at a time. The
/// first I/O error ends the stream and is kept for the caller.
struct LineChars<R> {
    input: R,
    line: String,
    offset: usize,
    error: Option<io::Error>,
}

impl<R: BufRead> LineChars<R> {
    fn new(input: R) -> Self {
        Self { input, line: String::new(), offset: 0, error: None }
    }
}

impl<R: BufRead> Iterator for LineChars<R> {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        loop {
            if let Some(ch) = self.line[self.offset..].chars().next() {
                self.offset += ch.len_utf8();
                return Some(ch);
            }
            if self.error.is_some() {
                return None;
            }
            self.line.clear();
            self.offset = 0;
            match self.input.read_line(&mut self.line) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => {
                    self.error = Some(e);
                    return None;
                }
            }
        }
    }
}
