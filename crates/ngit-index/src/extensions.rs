//! Index extensions. Only `TREE` (the cache tree) is interpreted; everything
//! else is skipped by length.

use bstr::BString;
use ngit_hash::ObjectId;

use crate::IndexError;

/// The cache-tree extension: tree OIDs precomputed for directory prefixes.
///
/// Each node records how many index entries it covers and, when that count
/// is non-negative, the OID of the corresponding tree. A count of -1 marks
/// an invalidated node, which carries no OID.
#[derive(Debug, Clone)]
pub struct CacheTree {
    pub root: CacheTreeNode,
}

/// One node of the cache tree.
#[derive(Debug, Clone)]
pub struct CacheTreeNode {
    /// Path component of this subtree (empty for the root).
    pub name: BString,
    /// Number of covered index entries; -1 when invalidated.
    pub entry_count: i32,
    /// Subtree OID, present only while valid.
    pub oid: Option<ObjectId>,
    pub children: Vec<CacheTreeNode>,
}

impl CacheTree {
    pub const SIGNATURE: &'static [u8; 4] = b"TREE";

    /// Parse the TREE extension payload.
    ///
    /// Wire format per node: NUL-terminated path component (empty for the
    /// root), ASCII entry count, space, ASCII subtree count, newline, then
    /// the 20-byte OID when the entry count is non-negative, then the
    /// children.
    pub fn parse(data: &[u8]) -> Result<Self, IndexError> {
        let mut cursor = 0;
        let root = parse_node(data, &mut cursor)?;
        Ok(Self { root })
    }

    /// The root tree OID, if still valid.
    pub fn root_oid(&self) -> Option<&ObjectId> {
        if self.root.entry_count >= 0 {
            self.root.oid.as_ref()
        } else {
            None
        }
    }

    /// Total node count (valid and invalidated).
    pub fn node_count(&self) -> usize {
        fn count(node: &CacheTreeNode) -> usize {
            1 + node.children.iter().map(count).sum::<usize>()
        }
        count(&self.root)
    }
}

fn parse_node(data: &[u8], cursor: &mut usize) -> Result<CacheTreeNode, IndexError> {
    let name_end = data[*cursor..]
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| bad_tree("missing path terminator"))?
        + *cursor;
    let name = BString::from(&data[*cursor..name_end]);
    *cursor = name_end + 1;

    let entry_count: i32 = read_ascii_int(data, cursor, b' ')?;
    let subtree_count: usize = read_ascii_int(data, cursor, b'\n')?
        .try_into()
        .map_err(|_| bad_tree("negative subtree count"))?;

    let oid = if entry_count >= 0 {
        if *cursor + 20 > data.len() {
            return Err(bad_tree("truncated OID"));
        }
        let oid = ObjectId::from_bytes(&data[*cursor..*cursor + 20])
            .map_err(|_| bad_tree("invalid OID"))?;
        *cursor += 20;
        Some(oid)
    } else {
        None
    };

    let mut children = Vec::with_capacity(subtree_count);
    for _ in 0..subtree_count {
        children.push(parse_node(data, cursor)?);
    }

    Ok(CacheTreeNode {
        name,
        entry_count,
        oid,
        children,
    })
}

fn read_ascii_int(data: &[u8], cursor: &mut usize, terminator: u8) -> Result<i32, IndexError> {
    let end = data[*cursor..]
        .iter()
        .position(|&b| b == terminator)
        .ok_or_else(|| bad_tree("missing count terminator"))?
        + *cursor;
    let text = std::str::from_utf8(&data[*cursor..end]).map_err(|_| bad_tree("non-ASCII count"))?;
    let value = text
        .parse()
        .map_err(|_| bad_tree(&format!("invalid count: {text}")))?;
    *cursor = end + 1;
    Ok(value)
}

fn bad_tree(reason: &str) -> IndexError {
    IndexError::InvalidExtension {
        sig: "TREE".into(),
        reason: reason.to_string(),
    }
}
