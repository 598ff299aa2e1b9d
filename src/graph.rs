use crate::error::{SteinerError, SteinerResult};
use std::fmt::Display;
use std::{error::Error, str::FromStr};

pub type NodeIndex = usize;
pub type EdgeIndex = usize;
pub type EdgeWeight = f64;

/// Largest weight a single edge may carry. Keeps every path weight and every tree weight far away
/// from `f64` and `u64` overflow.
pub const MAX_EDGE_WEIGHT: EdgeWeight = u32::MAX as EdgeWeight;

/// What the shortest path engine and the approximation need from a graph.
///
/// Vertices are the dense range `0..num_vertices()`. Edges are undirected, so
/// `find_edge(u, v)` and `find_edge(v, u)` must return the same edge.
pub trait WeightedGraph {
    fn num_vertices(&self) -> usize;

    /// A fresh iterator over all vertices, always in ascending order.
    fn vertices(&self) -> std::ops::Range<NodeIndex> {
        0..self.num_vertices()
    }

    /// The edge directly connecting `u` and `v`, if any.
    fn find_edge(&self, u: NodeIndex, v: NodeIndex) -> Option<EdgeIndex>;

    /// Weight of `edge`, in `0.0..=MAX_EDGE_WEIGHT`.
    fn edge_weight(&self, edge: EdgeIndex) -> EdgeWeight;

    fn edge_endpoints(&self, edge: EdgeIndex) -> (NodeIndex, NodeIndex);
}

#[derive(PartialEq, Clone, Copy, Debug)]
struct Edge {
    from: NodeIndex,
    to: NodeIndex,
    weight: EdgeWeight,
}

impl Edge {
    fn endpoints(&self) -> (NodeIndex, NodeIndex) {
        (self.from, self.to)
    }
}

/// Undirected graph with non-negative edge weights and a mark per edge.
#[derive(PartialEq, Clone, Debug)]
pub struct Graph {
    /// Per node: `(neighbor, edge)` pairs, sorted by neighbor.
    adjacency: Vec<Vec<(NodeIndex, EdgeIndex)>>,
    edges: Vec<Edge>,
    marks: Vec<bool>,
    terminals: Vec<NodeIndex>,
}

impl FromStr for Graph {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_graph(s)
    }
}

impl Graph {
    /// Graph with `num_nodes` isolated nodes.
    pub fn new(num_nodes: usize) -> Self {
        Self {
            adjacency: vec![vec![]; num_nodes],
            edges: vec![],
            marks: vec![],
            terminals: vec![],
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.adjacency.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Add the undirected edge `from -- to`. If the two nodes are already connected the existing
    /// edge is kept and its index returned.
    pub fn add_edge(
        &mut self,
        from: NodeIndex,
        to: NodeIndex,
        weight: EdgeWeight,
    ) -> SteinerResult<EdgeIndex> {
        self.check_node(from)?;
        self.check_node(to)?;
        let invalid = |reason: &str| SteinerError::InvalidEdge {
            from,
            to,
            reason: reason.to_string(),
        };
        if from == to {
            return Err(invalid("self-loops are not supported"));
        }
        if !(0.0..=MAX_EDGE_WEIGHT).contains(&weight) {
            return Err(invalid(&format!(
                "weight must be finite, non-negative and at most {}, got {}",
                MAX_EDGE_WEIGHT, weight
            )));
        }
        if let Some(existing) = self.find_edge(from, to) {
            return Ok(existing);
        }
        let index = self.edges.len();
        self.edges.push(Edge { from, to, weight });
        self.marks.push(false);
        for (a, b) in [(from, to), (to, from)] {
            let list = &mut self.adjacency[a];
            let position = list.partition_point(|&(n, _)| n < b);
            list.insert(position, (b, index));
        }
        Ok(index)
    }

    /// Return an iterator over all edges as `(from, to, weight)` in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex, EdgeWeight)> + '_ {
        self.edges.iter().map(|e| (e.from, e.to, e.weight))
    }

    /// Iterator over the node indices.
    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> {
        0..self.num_nodes()
    }

    pub fn neighbors(&self, node: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.adjacency[node].iter().map(|&(n, _)| n)
    }

    /// Terminals listed in the parsed input, in file order.
    pub fn terminals(&self) -> &[NodeIndex] {
        &self.terminals
    }

    pub fn num_terminals(&self) -> usize {
        self.terminals.len()
    }

    pub fn set_terminals(&mut self, terminals: Vec<NodeIndex>) -> SteinerResult<()> {
        for &t in &terminals {
            self.check_node(t)?;
        }
        self.terminals = terminals;
        Ok(())
    }

    /// # Panics
    /// If `edge` is not an edge of this graph.
    pub fn set_mark(&mut self, edge: EdgeIndex, mark: bool) {
        self.marks[edge] = mark;
    }

    /// # Panics
    /// If `edge` is not an edge of this graph.
    pub fn is_marked(&self, edge: EdgeIndex) -> bool {
        self.marks[edge]
    }

    pub fn marked_edges(&self) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.marks
            .iter()
            .enumerate()
            .filter(|&(_, &marked)| marked)
            .map(|(i, _)| i)
    }

    pub fn reset_marks(&mut self) {
        self.marks.iter_mut().for_each(|m| *m = false);
    }

    pub(crate) fn check_node(&self, node: NodeIndex) -> SteinerResult<()> {
        if node < self.num_nodes() {
            Ok(())
        } else {
            Err(SteinerError::VertexOutOfRange {
                vertex: node,
                num_vertices: self.num_nodes(),
            })
        }
    }
}

impl WeightedGraph for Graph {
    fn num_vertices(&self) -> usize {
        self.num_nodes()
    }

    fn find_edge(&self, u: NodeIndex, v: NodeIndex) -> Option<EdgeIndex> {
        self.adjacency
            .get(u)?
            .iter()
            .find(|&&(n, _)| n == v)
            .map(|&(_, e)| e)
    }

    fn edge_weight(&self, edge: EdgeIndex) -> EdgeWeight {
        self.edges[edge].weight
    }

    fn edge_endpoints(&self, edge: EdgeIndex) -> (NodeIndex, NodeIndex) {
        self.edges[edge].endpoints()
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseError {
    line: usize,
    column: usize,
    message: String,
}

impl ParseError {
    pub fn new(line: usize, column: usize, message: String) -> Self {
        ParseError {
            line,
            column,
            message,
        }
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}:{})", self.message, self.line + 1, self.column)
    }
}

impl Error for ParseError {}

pub type ParseResult<T> = Result<T, ParseError>;

/// A single non-empty input line split into whitespace separated tokens.
struct Line<'a> {
    number: usize,
    text: &'a str,
    tokens: Vec<&'a str>,
}

impl<'a> Line<'a> {
    /// Column of the `index`-th token (or the end of the line).
    fn column(&self, index: usize) -> usize {
        match self.tokens.get(index) {
            Some(token) => token.as_ptr() as usize - self.text.as_ptr() as usize,
            None => self.text.len(),
        }
    }

    fn error(&self, index: usize, message: String) -> ParseError {
        ParseError::new(self.number, self.column(index), message)
    }

    fn expect_keyword(&self, index: usize, keyword: &str) -> ParseResult<()> {
        match self.tokens.get(index) {
            Some(&token) if token.eq_ignore_ascii_case(keyword) => Ok(()),
            other => Err(self.error(
                index,
                format!("expected '{}' but got {:?}", keyword, other),
            )),
        }
    }

    fn parse_token<T: FromStr>(&self, index: usize) -> ParseResult<T>
    where
        T::Err: Display,
    {
        let token = self
            .tokens
            .get(index)
            .ok_or_else(|| self.error(index, "unexpected end of line".to_string()))?;
        token.parse().map_err(|err| {
            self.error(index, format!("could not parse input '{}': {}", token, err))
        })
    }

    fn expect_len(&self, len: usize) -> ParseResult<()> {
        if self.tokens.len() > len {
            Err(self.error(len, "expected EOL".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Cursor over the non-empty lines of the input.
struct Lines<'a> {
    lines: Box<dyn Iterator<Item = Line<'a>> + 'a>,
    last_line: usize,
}

impl<'a> Lines<'a> {
    fn new(text: &'a str) -> Self {
        let lines = Box::new(
            text.lines()
                .enumerate()
                .map(|(number, text)| Line {
                    number,
                    text,
                    tokens: text.split_ascii_whitespace().collect(),
                })
                .filter(|line| !line.tokens.is_empty()),
        );
        Lines {
            lines,
            last_line: 0,
        }
    }

    fn next_line(&mut self) -> ParseResult<Line<'a>> {
        let line = self.lines.next().ok_or_else(|| {
            ParseError::new(self.last_line, 0, "unexpected end of input".to_string())
        })?;
        self.last_line = line.number;
        Ok(line)
    }

    /// Expect a line consisting of exactly the given keywords.
    fn keywords(&mut self, keywords: &[&str]) -> ParseResult<()> {
        let line = self.next_line()?;
        for (i, keyword) in keywords.iter().enumerate() {
            line.expect_keyword(i, keyword)?;
        }
        line.expect_len(keywords.len())
    }

    /// Parse a header of the form `NAME CONTENT`.
    fn key_value<T: FromStr>(&mut self, name: &str) -> ParseResult<T>
    where
        T::Err: Display,
    {
        let line = self.next_line()?;
        line.expect_keyword(0, name)?;
        let value = line.parse_token(1)?;
        line.expect_len(2)?;
        Ok(value)
    }

    fn expect_the_end(&mut self) -> ParseResult<()> {
        match self.lines.next() {
            None => Ok(()),
            Some(line) => Err(line.error(0, "expected end of input".to_string())),
        }
    }
}

/// Convert a 1-based node number from the input into a [NodeIndex].
fn node_index(line: &Line, token: usize, num_nodes: usize) -> ParseResult<NodeIndex> {
    let raw: usize = line.parse_token(token)?;
    if raw == 0 || raw > num_nodes {
        return Err(line.error(
            token,
            format!("node {} is not between 1 and {}", raw, num_nodes),
        ));
    }
    Ok(raw - 1)
}

/// Parse a graph in the PACE 2018 Steiner tree format, reporting parse errors.
///
/// Node numbers in the input are 1-based; they're shifted to the 0-based [NodeIndex] range.
/// Terminal order is preserved (duplicates dropped) since the first terminal seeds the tree.
pub fn parse_graph(text: &str) -> ParseResult<Graph> {
    let mut lines = Lines::new(text);
    lines.keywords(&["SECTION", "Graph"])?;
    let num_nodes: usize = lines.key_value("Nodes")?;
    let num_edges: usize = lines.key_value("Edges")?;
    let mut graph = Graph::new(num_nodes);
    for _ in 0..num_edges {
        let line = lines.next_line()?;
        line.expect_keyword(0, "E")?;
        let from = node_index(&line, 1, num_nodes)?;
        let to = node_index(&line, 2, num_nodes)?;
        let weight: EdgeWeight = line.parse_token(3)?;
        line.expect_len(4)?;
        graph
            .add_edge(from, to, weight)
            .map_err(|err| line.error(0, err.to_string()))?;
    }
    lines.keywords(&["END"])?;
    lines.keywords(&["SECTION", "Terminals"])?;
    let num_terminals: usize = lines.key_value("Terminals")?;
    let mut terminals = vec![];
    for _ in 0..num_terminals {
        let line = lines.next_line()?;
        line.expect_keyword(0, "T")?;
        let terminal = node_index(&line, 1, num_nodes)?;
        line.expect_len(2)?;
        if !terminals.contains(&terminal) {
            terminals.push(terminal);
        }
    }
    lines.keywords(&["END"])?;
    lines.keywords(&["EOF"])?;
    lines.expect_the_end()?;
    graph.terminals = terminals;
    Ok(graph)
}
