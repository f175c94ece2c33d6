/*!
# Command Protocol

The line-oriented command grammar both front-ends serve. A command is read
off the wire by [`read_command`], which also swallows the `m` edge lines that
follow `Newgraph n m` so that the rest of the system only ever sees a single,
fully-formed [`Command`] value — the multi-line framing never leaks past this
module.
*/

use crate::error::{MstError, Result};
use std::io::BufRead;

/// One parsed client command. `Invalid` carries the original line so the
/// reply can echo what was wrong with it.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    NewGraph {
        n: u32,
        edges: Vec<(u32, u32, u32)>,
    },
    AddEdge {
        u: u32,
        v: u32,
        w: u32,
    },
    RemoveEdge {
        u: u32,
        v: u32,
    },
    Prim,
    Kruskal,
    MstWeight,
    ShortestPath(Option<(u32, u32)>),
    LongestPath,
    AverageDistance,
    Exit,
    Invalid(String),
}

/// Reads one logical command from `reader`: a header line, plus (for
/// `Newgraph n m`) the `m` edge lines that follow it. Returns `Ok(None)` on a
/// clean EOF (peer closed before sending anything).
pub fn read_command<R: BufRead>(reader: &mut R) -> Result<Option<Command>> {
    let mut line = String::new();
    let bytes = reader.read_line(&mut line)?;
    if bytes == 0 {
        return Ok(None);
    }
    let command = match parse_line(line.trim_end()) {
        ParsedLine::NewGraphHeader { n, m } => {
            let mut edges = Vec::with_capacity(m as usize);
            for _ in 0..m {
                let mut edge_line = String::new();
                let n_bytes = reader.read_line(&mut edge_line)?;
                if n_bytes == 0 {
                    return Err(MstError::transport("connection closed mid-graph"));
                }
                match parse_edge_triplet(edge_line.trim_end()) {
                    Some(triple) => edges.push(triple),
                    None => return Ok(Some(Command::Invalid(edge_line.trim_end().to_string()))),
                }
            }
            Command::NewGraph { n, edges }
        }
        ParsedLine::Other(command) => command,
    };
    Ok(Some(command))
}

enum ParsedLine {
    NewGraphHeader { n: u32, m: u32 },
    Other(Command),
}

fn parse_line(line: &str) -> ParsedLine {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.as_slice() {
        ["Newgraph", n, m] => match (n.parse(), m.parse()) {
            (Ok(n), Ok(m)) => ParsedLine::NewGraphHeader { n, m },
            _ => ParsedLine::Other(Command::Invalid(line.to_string())),
        },
        ["AddEdge", u, v, w] => match (u.parse(), v.parse(), w.parse()) {
            (Ok(u), Ok(v), Ok(w)) => ParsedLine::Other(Command::AddEdge { u, v, w }),
            _ => ParsedLine::Other(Command::Invalid(line.to_string())),
        },
        ["RemoveEdge", u, v] => match (u.parse(), v.parse()) {
            (Ok(u), Ok(v)) => ParsedLine::Other(Command::RemoveEdge { u, v }),
            _ => ParsedLine::Other(Command::Invalid(line.to_string())),
        },
        ["Prim"] => ParsedLine::Other(Command::Prim),
        ["Kruskal"] => ParsedLine::Other(Command::Kruskal),
        ["MSTweight"] => ParsedLine::Other(Command::MstWeight),
        ["Shortestpath"] => ParsedLine::Other(Command::ShortestPath(None)),
        ["Shortestpath", u, v] => match (u.parse(), v.parse()) {
            (Ok(u), Ok(v)) => ParsedLine::Other(Command::ShortestPath(Some((u, v)))),
            _ => ParsedLine::Other(Command::Invalid(line.to_string())),
        },
        ["Longestpath"] => ParsedLine::Other(Command::LongestPath),
        ["Averdist"] => ParsedLine::Other(Command::AverageDistance),
        ["Exit"] => ParsedLine::Other(Command::Exit),
        [] => ParsedLine::Other(Command::Invalid(String::new())),
        _ => ParsedLine::Other(Command::Invalid(line.to_string())),
    }
}

fn parse_edge_triplet(line: &str) -> Option<(u32, u32, u32)> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.as_slice() {
        [u, v, w] => Some((u.parse().ok()?, v.parse().ok()?, w.parse().ok()?)),
        _ => None,
    }
}

impl Command {
    /// Parses a single self-contained line (used by the pipeline core's
    /// parse stage, after [`read_command`] has already folded any follow-up
    /// edge lines into a `NewGraph` value upstream).
    pub fn parse(line: &str) -> Command {
        match parse_line(line.trim_end()) {
            ParsedLine::NewGraphHeader { n, m } => Command::Invalid(format!(
                "Newgraph {n} {m} (missing {m} edge line(s) ahead of the parse stage)"
            )),
            ParsedLine::Other(command) => command,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parses_simple_commands() {
        assert_eq!(Command::parse("Prim"), Command::Prim);
        assert_eq!(Command::parse("MSTweight"), Command::MstWeight);
        assert_eq!(Command::parse("Exit"), Command::Exit);
    }

    #[test]
    fn parses_add_edge_and_remove_edge() {
        assert_eq!(
            Command::parse("AddEdge 1 2 5"),
            Command::AddEdge { u: 1, v: 2, w: 5 }
        );
        assert_eq!(
            Command::parse("RemoveEdge 1 2"),
            Command::RemoveEdge { u: 1, v: 2 }
        );
    }

    #[test]
    fn parses_shortest_path_with_and_without_endpoints() {
        assert_eq!(Command::parse("Shortestpath"), Command::ShortestPath(None));
        assert_eq!(
            Command::parse("Shortestpath 1 4"),
            Command::ShortestPath(Some((1, 4)))
        );
    }

    #[test]
    fn unknown_verb_is_invalid() {
        assert_eq!(
            Command::parse("Frobnicate"),
            Command::Invalid("Frobnicate".to_string())
        );
    }

    #[test]
    fn read_command_consumes_newgraph_edge_lines() {
        let mut input = Cursor::new("Newgraph 4 2\n1 2 1\n2 3 2\n");
        let command = read_command(&mut input).unwrap().unwrap();
        assert_eq!(
            command,
            Command::NewGraph {
                n: 4,
                edges: vec![(1, 2, 1), (2, 3, 2)],
            }
        );
    }

    #[test]
    fn read_command_returns_none_on_clean_eof() {
        let mut input = Cursor::new("");
        assert!(read_command(&mut input).unwrap().is_none());
    }
}
