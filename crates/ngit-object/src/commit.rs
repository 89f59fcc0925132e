use bstr::{BStr, BString, ByteSlice};
use ngit_hash::ObjectId;
use ngit_utils::date::Signature;

use crate::ObjectError;

/// A commit object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// OID of the root tree.
    pub tree: ObjectId,
    /// Parent commit OIDs (empty for a root commit).
    pub parents: Vec<ObjectId>,
    /// Author identity and timestamp.
    pub author: Signature,
    /// Committer identity and timestamp.
    pub committer: Signature,
    /// Headers this codec does not interpret (gpgsig, mergetag, encoding...).
    /// Continuation lines are folded in so re-encoding round-trips.
    pub extra_headers: Vec<(BString, BString)>,
    /// Commit message: everything after the blank separator line.
    pub message: BString,
}

impl Commit {
    /// Parse a commit payload (no framing header).
    ///
    /// Headers are `key value` lines up to the first blank line; a line
    /// starting with a space continues the previous header's value.
    pub fn parse(payload: &[u8]) -> Result<Self, ObjectError> {
        let mut tree: Option<ObjectId> = None;
        let mut parents = Vec::new();
        let mut author: Option<Signature> = None;
        let mut committer: Option<Signature> = None;
        let mut extra_headers: Vec<(BString, BString)> = Vec::new();

        let data = payload;
        let mut pos = 0;

        loop {
            if pos >= data.len() {
                break;
            }
            // Blank line ends the header block.
            if data[pos] == b'\n' {
                pos += 1;
                break;
            }

            let line_end = data[pos..]
                .iter()
                .position(|&b| b == b'\n')
                .map(|p| p + pos)
                .unwrap_or(data.len());
            let line = &data[pos..line_end];
            pos = line_end + 1;

            let space_pos = match line.iter().position(|&b| b == b' ') {
                Some(p) => p,
                None => continue,
            };
            let key = &line[..space_pos];
            let value = &line[space_pos + 1..];

            match key {
                b"tree" => {
                    tree = Some(parse_oid_value(value, "tree")?);
                }
                b"parent" => {
                    parents.push(parse_oid_value(value, "parent")?);
                }
                b"author" => {
                    author = Some(parse_signature(value)?);
                }
                b"committer" => {
                    committer = Some(parse_signature(value)?);
                }
                _ => {
                    // Unknown header; fold space-prefixed continuation lines
                    // into its value.
                    let mut val = BString::from(value);
                    while pos < data.len() && data[pos] == b' ' {
                        let cont_end = data[pos..]
                            .iter()
                            .position(|&b| b == b'\n')
                            .map(|p| p + pos)
                            .unwrap_or(data.len());
                        val.push(b'\n');
                        val.extend_from_slice(&data[pos + 1..cont_end]);
                        pos = cont_end + 1;
                    }
                    extra_headers.push((BString::from(key), val));
                }
            }
        }

        let tree = tree.ok_or(ObjectError::MissingCommitField { field: "tree" })?;
        let author = author.ok_or(ObjectError::MissingCommitField { field: "author" })?;
        let committer =
            committer.ok_or(ObjectError::MissingCommitField { field: "committer" })?;

        let message = BString::from(&data[pos.min(data.len())..]);

        Ok(Self {
            tree,
            parents,
            author,
            committer,
            extra_headers,
            message,
        })
    }

    /// Re-encode the payload (no framing header).
    pub fn serialize_payload(&self) -> Vec<u8> {
        let mut out = Vec::new();

        out.extend_from_slice(b"tree ");
        out.extend_from_slice(self.tree.to_hex().as_bytes());
        out.push(b'\n');

        for parent in &self.parents {
            out.extend_from_slice(b"parent ");
            out.extend_from_slice(parent.to_hex().as_bytes());
            out.push(b'\n');
        }

        out.extend_from_slice(b"author ");
        out.extend_from_slice(&self.author.to_bytes());
        out.push(b'\n');

        out.extend_from_slice(b"committer ");
        out.extend_from_slice(&self.committer.to_bytes());
        out.push(b'\n');

        for (key, val) in &self.extra_headers {
            out.extend_from_slice(key);
            out.push(b' ');
            for (i, line) in val.split(|&b| b == b'\n').enumerate() {
                if i > 0 {
                    out.extend_from_slice(b"\n ");
                }
                out.extend_from_slice(line);
            }
            out.push(b'\n');
        }

        out.push(b'\n');
        out.extend_from_slice(&self.message);
        out
    }

    /// First parent, if any.
    pub fn first_parent(&self) -> Option<&ObjectId> {
        self.parents.first()
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// First line of the message.
    pub fn summary(&self) -> &BStr {
        let msg: &[u8] = self.message.as_ref();
        match msg.find_byte(b'\n') {
            Some(pos) => BStr::new(&msg[..pos]),
            None => BStr::new(msg),
        }
    }
}

fn parse_oid_value(value: &[u8], field: &'static str) -> Result<ObjectId, ObjectError> {
    let hex = std::str::from_utf8(value)
        .map_err(|_| ObjectError::InvalidHeader(format!("non-UTF-8 {field} OID")))?;
    Ok(ObjectId::from_hex(hex)?)
}

fn parse_signature(value: &[u8]) -> Result<Signature, ObjectError> {
    Signature::parse(BStr::new(value)).map_err(|e| ObjectError::InvalidSignature(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_commit_bytes() -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"tree da39a3ee5e6b4b0d3255bfef95601890afd80709\n");
        out.extend_from_slice(b"parent 0000000000000000000000000000000000000001\n");
        out.extend_from_slice(b"author John Doe <john@example.com> 1234567890 +0000\n");
        out.extend_from_slice(b"committer Jane Doe <jane@example.com> 1234567890 +0000\n");
        out.extend_from_slice(b"\n");
        out.extend_from_slice(b"Initial commit\n");
        out
    }

    #[test]
    fn parse_commit() {
        let commit = Commit::parse(&sample_commit_bytes()).unwrap();
        assert_eq!(
            commit.tree.to_hex(),
            "da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
        assert_eq!(commit.parents.len(), 1);
        assert_eq!(commit.author.name, "John Doe");
        assert_eq!(commit.committer.email, "jane@example.com");
        assert_eq!(commit.message, "Initial commit\n");
    }

    #[test]
    fn parse_root_and_merge() {
        let mut root = Vec::new();
        root.extend_from_slice(b"tree da39a3ee5e6b4b0d3255bfef95601890afd80709\n");
        root.extend_from_slice(b"author A <a@b.com> 1000000000 +0000\n");
        root.extend_from_slice(b"committer A <a@b.com> 1000000000 +0000\n");
        root.extend_from_slice(b"\nroot\n");
        let commit = Commit::parse(&root).unwrap();
        assert!(commit.is_root());
        assert!(!commit.is_merge());

        let mut merge = Vec::new();
        merge.extend_from_slice(b"tree da39a3ee5e6b4b0d3255bfef95601890afd80709\n");
        merge.extend_from_slice(b"parent 0000000000000000000000000000000000000001\n");
        merge.extend_from_slice(b"parent 0000000000000000000000000000000000000002\n");
        merge.extend_from_slice(b"author A <a@b.com> 1000000000 +0000\n");
        merge.extend_from_slice(b"committer A <a@b.com> 1000000000 +0000\n");
        merge.extend_from_slice(b"\nMerge\n");
        let commit = Commit::parse(&merge).unwrap();
        assert!(commit.is_merge());
        assert_eq!(commit.parents.len(), 2);
    }

    #[test]
    fn serialize_roundtrip() {
        let original = sample_commit_bytes();
        let commit = Commit::parse(&original).unwrap();
        assert_eq!(commit.serialize_payload(), original);
    }

    #[test]
    fn multiline_header_roundtrip() {
        let mut data = Vec::new();
        data.extend_from_slice(b"tree da39a3ee5e6b4b0d3255bfef95601890afd80709\n");
        data.extend_from_slice(b"author A <a@b.com> 1000000000 +0000\n");
        data.extend_from_slice(b"committer A <a@b.com> 1000000000 +0000\n");
        data.extend_from_slice(b"gpgsig -----BEGIN PGP SIGNATURE-----\n");
        data.extend_from_slice(b" line-two\n");
        data.extend_from_slice(b" -----END PGP SIGNATURE-----\n");
        data.extend_from_slice(b"\nsigned\n");

        let commit = Commit::parse(&data).unwrap();
        assert_eq!(commit.extra_headers.len(), 1);
        assert_eq!(commit.extra_headers[0].0, "gpgsig");
        assert_eq!(
            commit.extra_headers[0].1,
            "-----BEGIN PGP SIGNATURE-----\nline-two\n-----END PGP SIGNATURE-----"
        );
        assert_eq!(commit.serialize_payload(), data);
    }

    #[test]
    fn missing_required_headers() {
        let no_tree = b"author A <a@b.com> 1 +0000\ncommitter A <a@b.com> 1 +0000\n\nmsg\n";
        assert!(matches!(
            Commit::parse(no_tree),
            Err(ObjectError::MissingCommitField { field: "tree" })
        ));

        let no_author =
            b"tree da39a3ee5e6b4b0d3255bfef95601890afd80709\ncommitter A <a@b.com> 1 +0000\n\nm\n";
        assert!(matches!(
            Commit::parse(no_author),
            Err(ObjectError::MissingCommitField { field: "author" })
        ));
    }

    #[test]
    fn summary_is_first_line() {
        let commit = Commit::parse(&sample_commit_bytes()).unwrap();
        assert_eq!(commit.summary(), "Initial commit");
    }
}
