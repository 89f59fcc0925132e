use bstr::{BStr, BString};
use ngit_hash::ObjectId;
use ngit_utils::date::Signature;

use crate::{ObjectError, ObjectType};

/// An annotated tag object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// OID of the tagged object.
    pub target: ObjectId,
    /// Kind of the tagged object.
    pub target_type: ObjectType,
    /// Tag name.
    pub tag_name: BString,
    /// Tagger identity (absent in some historical tags).
    pub tagger: Option<Signature>,
    /// Tag message, including any trailing signature block.
    pub message: BString,
}

impl Tag {
    /// Parse a tag payload (no framing header).
    pub fn parse(payload: &[u8]) -> Result<Self, ObjectError> {
        let mut target: Option<ObjectId> = None;
        let mut target_type: Option<ObjectType> = None;
        let mut tag_name: Option<BString> = None;
        let mut tagger: Option<Signature> = None;

        let data = payload;
        let mut pos = 0;

        loop {
            if pos >= data.len() {
                break;
            }
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
                b"object" => {
                    let hex = std::str::from_utf8(value).map_err(|_| {
                        ObjectError::InvalidHeader("non-UTF-8 target OID".into())
                    })?;
                    target = Some(ObjectId::from_hex(hex)?);
                }
                b"type" => {
                    target_type = Some(ObjectType::from_bytes(value)?);
                }
                b"tag" => {
                    tag_name = Some(BString::from(value));
                }
                b"tagger" => {
                    tagger = Some(
                        Signature::parse(BStr::new(value))
                            .map_err(|e| ObjectError::InvalidSignature(e.to_string()))?,
                    );
                }
                _ => {}
            }
        }

        let target = target.ok_or(ObjectError::MissingTagField { field: "object" })?;
        let target_type = target_type.ok_or(ObjectError::MissingTagField { field: "type" })?;
        let tag_name = tag_name.ok_or(ObjectError::MissingTagField { field: "tag" })?;

        Ok(Self {
            target,
            target_type,
            tag_name,
            tagger,
            message: BString::from(&data[pos.min(data.len())..]),
        })
    }

    /// Re-encode the payload (no framing header).
    pub fn serialize_payload(&self) -> Vec<u8> {
        let mut out = Vec::new();

        out.extend_from_slice(b"object ");
        out.extend_from_slice(self.target.to_hex().as_bytes());
        out.push(b'\n');

        out.extend_from_slice(b"type ");
        out.extend_from_slice(self.target_type.as_bytes());
        out.push(b'\n');

        out.extend_from_slice(b"tag ");
        out.extend_from_slice(&self.tag_name);
        out.push(b'\n');

        if let Some(ref tagger) = self.tagger {
            out.extend_from_slice(b"tagger ");
            out.extend_from_slice(&tagger.to_bytes());
            out.push(b'\n');
        }

        out.push(b'\n');
        out.extend_from_slice(&self.message);
        out
    }
}
