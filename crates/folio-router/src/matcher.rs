//! Path-segment matching and route ranking.
//!
//! The tree is flattened into one branch per node (the chain from a root
//! down to that node). Branches are scored once, and a URL is matched
//! against them best-first, so `detail/new` beats `detail/:id` regardless
//! of declaration order. Equal scores fall back to depth, then to
//! declaration order.

use std::cmp::Reverse;
use std::fmt;
use std::sync::Arc;

use folio_core::{decode_component, RouteParams};

use crate::RouteNode;

const STATIC_SEGMENT: i32 = 10;
const DYNAMIC_SEGMENT: i32 = 3;
const INDEX_ROUTE: i32 = 2;
const SPLAT_PENALTY: i32 = -2;

/// Param name under which a splat's remainder is captured.
pub const SPLAT_PARAM: &str = "*";

/// One `/`-separated piece of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text, compared case-insensitively.
    Static(String),
    /// `:name`, captures one URL segment.
    Param(String),
    /// `*`, captures the rest of the URL.
    Splat,
}

impl Segment {
    pub fn parse(raw: &str) -> Self {
        if raw == "*" {
            Segment::Splat
        } else if let Some(name) = raw.strip_prefix(':') {
            Segment::Param(name.to_string())
        } else {
            Segment::Static(raw.to_string())
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Static(s) => f.write_str(s),
            Segment::Param(name) => write!(f, ":{}", name),
            Segment::Splat => f.write_str("*"),
        }
    }
}

/// Every node from a root down to one matchable route.
pub(crate) struct Branch<V> {
    chain: Vec<Arc<RouteNode<V>>>,
    /// Cumulative pattern of each node in `chain`.
    patterns: Vec<String>,
    segments: Vec<Segment>,
    score: i32,
}

impl<V> Branch<V> {
    pub(crate) fn pattern(&self) -> &str {
        self.patterns.last().map(String::as_str).unwrap_or("/")
    }

    pub(crate) fn match_segments(&self, url: &[&str]) -> Option<RouteMatch<V>> {
        let mut params = RouteParams::new();
        let mut pos = 0;

        for segment in &self.segments {
            match segment {
                Segment::Static(text) => {
                    let part = url.get(pos)?;
                    if !part.eq_ignore_ascii_case(text) {
                        return None;
                    }
                    pos += 1;
                }
                Segment::Param(name) => {
                    let part = url.get(pos)?;
                    params.insert(name.clone(), decode_component(part));
                    pos += 1;
                }
                Segment::Splat => {
                    let rest: Vec<String> = url[pos..].iter().map(|p| decode_component(p)).collect();
                    params.insert(SPLAT_PARAM.to_string(), rest.join("/"));
                    pos = url.len();
                }
            }
        }

        if pos != url.len() {
            return None;
        }

        let chain = self
            .chain
            .iter()
            .zip(&self.patterns)
            .map(|(node, pattern)| MatchedRoute {
                node: node.clone(),
                pattern: pattern.clone(),
            })
            .collect();

        Some(RouteMatch {
            chain,
            params,
            pattern: self.pattern().to_string(),
        })
    }
}

fn score(segments: &[Segment], is_index: bool) -> i32 {
    let mut score = segments.len() as i32;
    if is_index {
        score += INDEX_ROUTE;
    }
    for segment in segments {
        score += match segment {
            Segment::Static(_) => STATIC_SEGMENT,
            Segment::Param(_) => DYNAMIC_SEGMENT,
            Segment::Splat => SPLAT_PENALTY,
        };
    }
    score
}

fn join_pattern(segments: &[Segment]) -> String {
    let parts: Vec<String> = segments.iter().map(Segment::to_string).collect();
    format!("/{}", parts.join("/"))
}

/// Flatten and rank the tree.
pub(crate) fn rank_branches<V>(routes: &[Arc<RouteNode<V>>]) -> Vec<Branch<V>> {
    let mut branches = Vec::new();
    flatten(routes, &[], &[], &[], &mut branches);

    let mut ranked: Vec<(usize, Branch<V>)> = branches.into_iter().enumerate().collect();
    ranked.sort_by_key(|(order, b)| (Reverse(b.score), Reverse(b.chain.len()), *order));
    ranked.into_iter().map(|(_, b)| b).collect()
}

fn flatten<V>(
    nodes: &[Arc<RouteNode<V>>],
    chain: &[Arc<RouteNode<V>>],
    patterns: &[String],
    segments: &[Segment],
    out: &mut Vec<Branch<V>>,
) {
    for node in nodes {
        let mut node_segments = segments.to_vec();
        node_segments.extend(
            node.path()
                .split('/')
                .filter(|s| !s.is_empty())
                .map(Segment::parse),
        );

        let mut node_chain = chain.to_vec();
        node_chain.push(node.clone());
        let mut node_patterns = patterns.to_vec();
        node_patterns.push(join_pattern(&node_segments));

        out.push(Branch {
            chain: node_chain.clone(),
            patterns: node_patterns.clone(),
            score: score(&node_segments, node.is_index()),
            segments: node_segments.clone(),
        });

        flatten(
            node.children(),
            &node_chain,
            &node_patterns,
            &node_segments,
            out,
        );
    }
}

/// One node of a matched chain.
pub struct MatchedRoute<V> {
    node: Arc<RouteNode<V>>,
    pattern: String,
}

impl<V> MatchedRoute<V> {
    pub fn node(&self) -> &Arc<RouteNode<V>> {
        &self.node
    }

    /// Full pattern up to and including this node, e.g. `/detail/:id`.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl<V> Clone for MatchedRoute<V> {
    fn clone(&self) -> Self {
        Self {
            node: self.node.clone(),
            pattern: self.pattern.clone(),
        }
    }
}

impl<V> fmt::Debug for MatchedRoute<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchedRoute")
            .field("pattern", &self.pattern)
            .finish()
    }
}

/// Result of matching a URL: the chain from the outermost layout down to
/// the leaf route, plus the params collected along it.
pub struct RouteMatch<V> {
    chain: Vec<MatchedRoute<V>>,
    params: RouteParams,
    pattern: String,
}

impl<V> RouteMatch<V> {
    pub fn chain(&self) -> &[MatchedRoute<V>] {
        &self.chain
    }

    pub fn params(&self) -> &RouteParams {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Pattern of the leaf route.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn leaf(&self) -> Option<&MatchedRoute<V>> {
        self.chain.last()
    }
}

impl<V> Clone for RouteMatch<V> {
    fn clone(&self) -> Self {
        Self {
            chain: self.chain.clone(),
            params: self.params.clone(),
            pattern: self.pattern.clone(),
        }
    }
}

impl<V> fmt::Debug for RouteMatch<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteMatch")
            .field("pattern", &self.pattern)
            .field("params", &self.params)
            .field("depth", &self.chain.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RouteTree;

    // === Segment Tests ===

    #[test]
    fn test_segment_parse() {
        assert_eq!(Segment::parse("about"), Segment::Static("about".into()));
        assert_eq!(Segment::parse(":id"), Segment::Param("id".into()));
        assert_eq!(Segment::parse("*"), Segment::Splat);
    }

    #[test]
    fn test_scores_rank_static_over_dynamic_over_splat() {
        let s = score(&[Segment::parse("detail"), Segment::parse("new")], false);
        let d = score(&[Segment::parse("detail"), Segment::parse(":id")], false);
        let w = score(&[Segment::parse("detail"), Segment::parse("*")], false);
        assert!(s > d);
        assert!(d > w);
    }

    // === Ranking Tests ===

    #[test]
    fn test_static_beats_dynamic_regardless_of_order() {
        let tree = RouteTree::new([
            RouteNode::new("detail/:id").with_view("dynamic"),
            RouteNode::new("detail/new").with_view("static"),
        ]);

        let m = tree.match_path("/detail/new").unwrap();
        assert_eq!(m.leaf().unwrap().node().view(), Some(&"static"));
        assert!(m.params().is_empty());

        let m = tree.match_path("/detail/7").unwrap();
        assert_eq!(m.leaf().unwrap().node().view(), Some(&"dynamic"));
    }

    #[test]
    fn test_splat_captures_remainder() {
        let tree = RouteTree::new([
            RouteNode::new("about").with_view("about"),
            RouteNode::new("*").with_view("fallback"),
        ]);

        let m = tree.match_path("/a/b/c").unwrap();
        assert_eq!(m.leaf().unwrap().node().view(), Some(&"fallback"));
        assert_eq!(m.param(SPLAT_PARAM), Some("a/b/c"));

        let m = tree.match_path("/about").unwrap();
        assert_eq!(m.leaf().unwrap().node().view(), Some(&"about"));
    }

    #[test]
    fn test_params_are_percent_decoded() {
        let tree = RouteTree::new([
            RouteNode::new("tag/:name").with_view("tag"),
            RouteNode::new("files/*").with_view("files"),
        ]);

        let m = tree.match_path("/tag/hello%20world").unwrap();
        assert_eq!(m.param("name"), Some("hello world"));

        let m = tree.match_path("/tag/%FF").unwrap();
        assert_eq!(m.param("name"), Some("%FF"));

        let m = tree.match_path("/files/a%20b/c%2Fd").unwrap();
        assert_eq!(m.param(SPLAT_PARAM), Some("a b/c/d"));
    }

    #[test]
    fn test_index_beats_parent_layout() {
        let tree = RouteTree::new([RouteNode::new("/")
            .with_view("layout")
            .with_child(RouteNode::index().with_view("home"))]);
        let m = tree.match_path("/").unwrap();
        assert_eq!(m.chain().len(), 2);
        assert_eq!(m.chain()[0].pattern(), "/");
    }

    #[test]
    fn test_layout_without_index_matches_itself() {
        let tree = RouteTree::new([RouteNode::new("/")
            .with_view("layout")
            .with_child(RouteNode::new("about").with_view("about"))]);
        let m = tree.match_path("/").unwrap();
        assert_eq!(m.chain().len(), 1);
    }

    #[test]
    fn test_static_match_is_case_insensitive() {
        let tree = RouteTree::new([RouteNode::new("About").with_view("about")]);
        assert!(tree.match_path("/about").is_some());
        assert!(tree.match_path("/ABOUT").is_some());
    }

    #[test]
    fn test_cumulative_patterns() {
        let tree = RouteTree::new([RouteNode::new("/")
            .with_view("layout")
            .with_child(RouteNode::new("detail/:id").with_view("detail"))]);
        let m = tree.match_path("/detail/3").unwrap();
        let patterns: Vec<_> = m.chain().iter().map(|r| r.pattern()).collect();
        assert_eq!(patterns, vec!["/", "/detail/:id"]);
    }
}
