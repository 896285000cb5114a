//! Identifiers for log graph vertices and edges.
//!
//! Every identifier has a fixed-width string form: a type tag followed by a
//! zero-padded counter (`NODE_000042`, `CHAP_000003`). Edge identifiers join
//! their two endpoint identifiers in canonical order, so an edge has exactly
//! one identifier no matter which endpoint it is looked up from.

use crate::error::IdError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of digits in the counter suffix.
pub const ID_WIDTH: usize = 6;
pub const NODE_TAG: &str = "NODE_";
pub const CHAPTER_TAG: &str = "CHAP_";
/// Largest counter that fits into [`ID_WIDTH`] digits.
pub const MAX_COUNTER: u32 = 999_999;

pub const UNDIRECTED_SEPARATOR: &str = "<->";
pub const DIRECTED_SEPARATOR: &str = "-->";

fn check_counter(tag: &str, counter: u32) -> Result<u32, IdError> {
    if counter > MAX_COUNTER {
        return Err(IdError::InvalidIdentifier(format!(
            "{tag}{counter} (counter exceeds {ID_WIDTH} digits)"
        )));
    }
    Ok(counter)
}

fn parse_counter(raw: &str, tag: &str) -> Result<u32, IdError> {
    let invalid = || IdError::InvalidIdentifier(raw.to_string());
    let digits = raw.strip_prefix(tag).ok_or_else(invalid)?;
    if digits.len() != ID_WIDTH || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    digits.parse::<u32>().map_err(|_| invalid())
}

/// Identifier of an event node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeId(u32);

impl NodeId {
    pub fn new(counter: u32) -> Result<Self, IdError> {
        check_counter(NODE_TAG, counter).map(Self)
    }

    pub fn counter(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{NODE_TAG}{:0width$}", self.0, width = ID_WIDTH)
    }
}

impl FromStr for NodeId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_counter(s, NODE_TAG).map(Self)
    }
}

impl TryFrom<String> for NodeId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NodeId> for String {
    fn from(value: NodeId) -> Self {
        value.to_string()
    }
}

/// Identifier of a chapter marker.
///
/// Counter `0` is the reserved start chapter and [`MAX_COUNTER`] the reserved
/// end chapter, which sorts after every regular chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChapterId(u32);

impl ChapterId {
    /// Regular chapter. The sentinel counter is reserved for [`ChapterId::last`].
    pub fn new(counter: u32) -> Result<Self, IdError> {
        if counter == MAX_COUNTER {
            return Err(IdError::InvalidIdentifier(format!(
                "{CHAPTER_TAG}{counter} (counter reserved for the last chapter)"
            )));
        }
        check_counter(CHAPTER_TAG, counter).map(Self)
    }

    /// Builds either a regular chapter id or, when `is_last` is set, the
    /// sentinel; the counter is ignored for the sentinel.
    pub fn with_last(counter: u32, is_last: bool) -> Result<Self, IdError> {
        if is_last {
            Ok(Self::last())
        } else {
            Self::new(counter)
        }
    }

    pub const fn start() -> Self {
        Self(0)
    }

    pub const fn last() -> Self {
        Self(MAX_COUNTER)
    }

    pub fn is_start(&self) -> bool {
        self.0 == 0
    }

    pub fn is_last(&self) -> bool {
        self.0 == MAX_COUNTER
    }

    pub fn counter(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ChapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{CHAPTER_TAG}{:0width$}", self.0, width = ID_WIDTH)
    }
}

impl FromStr for ChapterId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_counter(s, CHAPTER_TAG).map(Self)
    }
}

impl TryFrom<String> for ChapterId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChapterId> for String {
    fn from(value: ChapterId) -> Self {
        value.to_string()
    }
}

/// Either kind of vertex identifier.
///
/// Variant order matches the string order of the tags (`CHAP_` < `NODE_`),
/// so comparing two `VertexId`s agrees with comparing their string forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum VertexId {
    Chapter(ChapterId),
    Node(NodeId),
}

impl VertexId {
    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            VertexId::Node(id) => Some(*id),
            VertexId::Chapter(_) => None,
        }
    }

    pub fn as_chapter(&self) -> Option<ChapterId> {
        match self {
            VertexId::Chapter(id) => Some(*id),
            VertexId::Node(_) => None,
        }
    }

    pub fn is_node(&self) -> bool {
        matches!(self, VertexId::Node(_))
    }

    pub fn is_chapter(&self) -> bool {
        matches!(self, VertexId::Chapter(_))
    }
}

impl From<NodeId> for VertexId {
    fn from(value: NodeId) -> Self {
        VertexId::Node(value)
    }
}

impl From<ChapterId> for VertexId {
    fn from(value: ChapterId) -> Self {
        VertexId::Chapter(value)
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VertexId::Node(id) => id.fmt(f),
            VertexId::Chapter(id) => id.fmt(f),
        }
    }
}

impl FromStr for VertexId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with(NODE_TAG) {
            s.parse().map(VertexId::Node)
        } else if s.starts_with(CHAPTER_TAG) {
            s.parse().map(VertexId::Chapter)
        } else {
            Err(IdError::InvalidIdentifier(s.to_string()))
        }
    }
}

impl TryFrom<String> for VertexId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VertexId> for String {
    fn from(value: VertexId) -> Self {
        value.to_string()
    }
}

/// Identifier of a relation between two distinct vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EdgeId {
    low: VertexId,
    high: VertexId,
    directed: bool,
}

impl EdgeId {
    pub fn new(
        a: impl Into<VertexId>,
        b: impl Into<VertexId>,
        directed: bool,
    ) -> Result<Self, IdError> {
        let (a, b) = (a.into(), b.into());
        if a == b {
            return Err(IdError::SelfLoop(a));
        }
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        Ok(Self {
            low,
            high,
            directed,
        })
    }

    pub fn undirected(a: impl Into<VertexId>, b: impl Into<VertexId>) -> Result<Self, IdError> {
        Self::new(a, b, false)
    }

    /// Endpoints in canonical (sorted) order.
    pub fn endpoints(&self) -> (VertexId, VertexId) {
        (self.low, self.high)
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    pub fn connects(&self, vertex: VertexId) -> bool {
        self.low == vertex || self.high == vertex
    }

    /// The endpoint opposite to `vertex`, if `vertex` is an endpoint.
    pub fn other(&self, vertex: VertexId) -> Option<VertexId> {
        if self.low == vertex {
            Some(self.high)
        } else if self.high == vertex {
            Some(self.low)
        } else {
            None
        }
    }

    fn separator(&self) -> &'static str {
        if self.directed {
            DIRECTED_SEPARATOR
        } else {
            UNDIRECTED_SEPARATOR
        }
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.low, self.separator(), self.high)
    }
}

impl FromStr for EdgeId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let directed = !s.contains(UNDIRECTED_SEPARATOR) && s.contains(DIRECTED_SEPARATOR);
        let (a, b) = edge_id_to_endpoints(s)?;
        EdgeId::new(a, b, directed)
    }
}

impl TryFrom<String> for EdgeId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EdgeId> for String {
    fn from(value: EdgeId) -> Self {
        value.to_string()
    }
}

/// Tag prefix and total length check, matching the fixed id layout.
pub fn is_valid_node_id(id: &str) -> bool {
    id.parse::<NodeId>().is_ok()
}

pub fn is_valid_chapter_id(id: &str) -> bool {
    id.parse::<ChapterId>().is_ok()
}

/// Splits an edge id string into its two endpoint ids, in written order.
pub fn edge_id_to_endpoints(id: &str) -> Result<(VertexId, VertexId), IdError> {
    let (a, b) = id
        .split_once(UNDIRECTED_SEPARATOR)
        .or_else(|| id.split_once(DIRECTED_SEPARATOR))
        .ok_or_else(|| IdError::InvalidIdentifier(id.to_string()))?;
    let a = a
        .parse::<VertexId>()
        .map_err(|_| IdError::InvalidIdentifier(id.to_string()))?;
    let b = b
        .parse::<VertexId>()
        .map_err(|_| IdError::InvalidIdentifier(id.to_string()))?;
    Ok((a, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn node(counter: u32) -> NodeId {
        NodeId::new(counter).unwrap()
    }

    fn chapter(counter: u32) -> ChapterId {
        ChapterId::new(counter).unwrap()
    }

    #[test]
    fn test_string_forms() {
        assert_eq!(node(0).to_string(), "NODE_000000");
        assert_eq!(node(42).to_string(), "NODE_000042");
        assert_eq!(chapter(3).to_string(), "CHAP_000003");
        assert_eq!(ChapterId::last().to_string(), "CHAP_999999");
        assert_eq!(ChapterId::with_last(5, true).unwrap(), ChapterId::last());
    }

    #[test]
    fn test_chapter_ordering_puts_last_after_everything() {
        assert!(chapter(1) < chapter(2));
        assert!(chapter(2) < ChapterId::last());
        assert!(ChapterId::start() < chapter(1));
        assert!(chapter(1).to_string() < ChapterId::last().to_string());
    }

    #[test]
    fn test_sentinel_counter_is_reserved() {
        assert!(ChapterId::new(MAX_COUNTER).is_err());
        assert!(NodeId::new(MAX_COUNTER + 1).is_err());
    }

    #[test]
    fn test_validators() {
        assert!(is_valid_node_id("NODE_000001"));
        assert!(!is_valid_node_id("NODE_0001"));
        assert!(!is_valid_node_id("CHAP_000001"));
        assert!(!is_valid_node_id("NODE_00000x"));
        assert!(is_valid_chapter_id("CHAP_999999"));
        assert!(!is_valid_chapter_id("NODE_000001"));
    }

    #[test]
    fn test_edge_id_is_canonical() {
        let a = VertexId::from(node(2));
        let b = VertexId::from(node(1));
        let ab = EdgeId::undirected(a, b).unwrap();
        let ba = EdgeId::undirected(b, a).unwrap();
        assert_eq!(ab, ba);
        assert_eq!(ab.to_string(), "NODE_000001<->NODE_000002");
        assert_eq!(ab.other(a), Some(b));
    }

    #[test]
    fn test_edge_id_rejects_self_loop() {
        let err = EdgeId::undirected(node(1), node(1)).unwrap_err();
        assert!(matches!(err, IdError::SelfLoop(_)));
    }

    #[test]
    fn test_directed_separator() {
        let id = EdgeId::new(node(3), chapter(1), true).unwrap();
        assert_eq!(id.to_string(), "CHAP_000001-->NODE_000003");
        let parsed: EdgeId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!(parsed.is_directed());
    }

    #[test]
    fn test_edge_id_to_endpoints_errors() {
        assert!(edge_id_to_endpoints("NODE_000001NODE_000002").is_err());
        assert!(edge_id_to_endpoints("NODE_000001<->NODE_02").is_err());
        let (a, b) = edge_id_to_endpoints("NODE_000002<->CHAP_000001").unwrap();
        assert_eq!(a, VertexId::Node(node(2)));
        assert_eq!(b, VertexId::Chapter(chapter(1)));
    }

    #[test]
    fn test_serde_uses_string_form() {
        let json = serde_json::to_string(&VertexId::from(node(7))).unwrap();
        assert_eq!(json, "\"NODE_000007\"");
        let back: VertexId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, VertexId::from(node(7)));
        assert!(serde_json::from_str::<NodeId>("\"NODE_7\"").is_err());
    }

    proptest! {
        #[test]
        fn prop_node_id_round_trip_preserves_order(a in 0u32..=MAX_COUNTER, b in 0u32..=MAX_COUNTER) {
            let (ia, ib) = (node(a), node(b));
            prop_assert_eq!(ia.to_string().parse::<NodeId>().unwrap(), ia);
            prop_assert_eq!(ia.cmp(&ib), ia.to_string().cmp(&ib.to_string()));
        }

        #[test]
        fn prop_chapter_id_round_trip(counter in 0u32..MAX_COUNTER, last in proptest::bool::ANY) {
            let id = ChapterId::with_last(counter, last).unwrap();
            prop_assert_eq!(id.to_string().parse::<ChapterId>().unwrap(), id);
            prop_assert!(id <= ChapterId::last());
        }

        #[test]
        fn prop_edge_id_symmetric(a in 0u32..1000, b in 0u32..1000, directed in proptest::bool::ANY) {
            prop_assume!(a != b);
            let x = EdgeId::new(node(a), node(b), directed).unwrap();
            let y = EdgeId::new(node(b), node(a), directed).unwrap();
            prop_assert_eq!(x, y);
            prop_assert_eq!(x.to_string().parse::<EdgeId>().unwrap(), x);
        }
    }
}
