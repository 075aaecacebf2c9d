//! On-disk and in-memory data model shared by the builder, merger, artifact
//! writer and query resolver.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Dense, gap-free, process-local document identifier.
pub type DocId = u32;

/// A label from the fixed set of HTML structural tags a token can be
/// attributed to. `Body` is a valid value for bookkeeping inside the
/// extractor and tokenizer, but is never inserted into a [`Posting`]'s
/// stored field set (presence in body text is implicit whenever `freq > 0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldTag {
    Title,
    H1,
    H2,
    H3,
    Strong,
    B,
    Body,
}

impl FieldTag {
    /// The tags the extractor treats as "weighted" (everything but body
    /// text). Order here is also the order tags are searched for in the
    /// DOM, matching the reference crawler's tag loop.
    pub const WEIGHTED: [FieldTag; 6] = [
        FieldTag::B,
        FieldTag::Strong,
        FieldTag::H1,
        FieldTag::H2,
        FieldTag::H3,
        FieldTag::Title,
    ];

    pub fn tag_name(self) -> &'static str {
        match self {
            FieldTag::Title => "title",
            FieldTag::H1 => "h1",
            FieldTag::H2 => "h2",
            FieldTag::H3 => "h3",
            FieldTag::Strong => "strong",
            FieldTag::B => "b",
            FieldTag::Body => "body",
        }
    }
}

/// Per-(term, doc-id) record: a positive frequency and the set of weighted
/// field-tags the term occurred under in that document. `fields` never
/// contains [`FieldTag::Body`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Posting {
    pub freq: u32,
    pub fields: HashSet<FieldTag>,
}

impl Posting {
    pub fn record(&mut self, field: FieldTag) {
        self.freq += 1;
        if field != FieldTag::Body {
            self.fields.insert(field);
        }
    }

    pub fn merge_from(&mut self, other: &Posting) {
        self.freq += other.freq;
        self.fields.extend(other.fields.iter().copied());
    }
}

/// Wire form of [`Posting`]: `fields` is a list, not a set, since JSON has
/// no native set type. Ordering within the list carries no meaning.
#[derive(Debug, Serialize, Deserialize)]
struct WirePosting {
    freq: u32,
    fields: Vec<FieldTag>,
}

impl From<&Posting> for WirePosting {
    fn from(p: &Posting) -> Self {
        WirePosting {
            freq: p.freq,
            fields: p.fields.iter().copied().collect(),
        }
    }
}

impl From<WirePosting> for Posting {
    fn from(w: WirePosting) -> Self {
        Posting {
            freq: w.freq,
            fields: w.fields.into_iter().collect(),
        }
    }
}

impl Serialize for Posting {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        WirePosting::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Posting {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        WirePosting::deserialize(deserializer).map(Posting::from)
    }
}

/// Doc-id → posting mapping for a single term, ordered by doc-id for
/// reproducible on-disk output.
pub type PostingList = BTreeMap<DocId, Posting>;

/// The in-memory accumulator used by the partial-index builder: a sorted
/// container keyed by term, supporting ordered flush with no separate sort
/// step.
pub type InMemoryIndex = BTreeMap<String, PostingList>;

/// A single `{term: postings}` record, the unit written as one line of a
/// partial run or the final merged index.
#[derive(Debug, Serialize, Deserialize)]
pub struct IndexRecord(pub HashMap<String, PostingList>);

impl IndexRecord {
    pub fn single(term: String, postings: PostingList) -> Self {
        let mut map = HashMap::with_capacity(1);
        map.insert(term, postings);
        IndexRecord(map)
    }

    /// Consumes the record, returning its sole `(term, postings)` pair.
    /// Every on-disk record has exactly one top-level key by construction;
    /// a record with zero or multiple keys is malformed.
    pub fn into_single(self) -> Option<(String, PostingList)> {
        let mut iter = self.0.into_iter();
        let first = iter.next()?;
        if iter.next().is_some() {
            None
        } else {
            Some(first)
        }
    }
}

/// Doc-id → URL, persisted with string doc-id keys since JSON object keys
/// must be strings.
pub type UrlMap = HashMap<DocId, String>;

pub fn url_map_to_wire(map: &UrlMap) -> HashMap<String, String> {
    map.iter().map(|(id, url)| (id.to_string(), url.clone())).collect()
}

pub fn url_map_from_wire(wire: HashMap<String, String>) -> UrlMap {
    wire.into_iter()
        .filter_map(|(id, url)| id.parse::<DocId>().ok().map(|id| (id, url)))
        .collect()
}

/// Term → byte offset into the merged index file.
pub type OffsetMap = BTreeMap<String, u64>;
