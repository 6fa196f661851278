use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Region name → set of territory codes.
///
/// Used both for a backend's supported-region catalog and for the geo profile
/// of a single record set.
pub type RegionMap = BTreeMap<String, BTreeSet<String>>;

/// Upper bound accepted for a weighted profile.
pub const MAX_WEIGHT: u32 = 255;

// ============ Pagination ============

/// Opaque cursor handed back into a "next page" call.
///
/// Backends keyed by record set resume from a `(name, type, qualifier)` triple;
/// others hand out a single token. `None` in [`Page::next`] signals the end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PagePointer {
    /// Resume at the record set with this identity.
    #[serde(rename_all = "camelCase")]
    RecordSet {
        /// Record name.
        name: String,
        /// Record type.
        record_type: String,
        /// Qualifier, if any.
        qualifier: Option<String>,
    },
    /// Provider-defined continuation token.
    Token {
        /// Raw token value.
        token: String,
    },
}

impl PagePointer {
    /// Build a token cursor.
    pub fn token(token: impl Into<String>) -> Self {
        Self::Token {
            token: token.into(),
        }
    }

    /// Build a cursor resuming at the given record set.
    pub fn record_set(key: &RecordSetKey) -> Self {
        Self::RecordSet {
            name: key.name.clone(),
            record_type: key.record_type.clone(),
            qualifier: key.qualifier.clone(),
        }
    }

    /// Returns the raw token for token cursors.
    pub fn as_token(&self) -> Option<&str> {
        match self {
            Self::Token { token } => Some(token),
            Self::RecordSet { .. } => None,
        }
    }

    /// Returns the record-set identity for triple cursors.
    pub fn as_record_set(&self) -> Option<RecordSetKey> {
        match self {
            Self::RecordSet {
                name,
                record_type,
                qualifier,
            } => Some(RecordSetKey {
                name: name.clone(),
                record_type: record_type.clone(),
                qualifier: qualifier.clone(),
            }),
            Self::Token { .. } => None,
        }
    }
}

/// One page of a provider listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items in this page, in provider order.
    pub items: Vec<T>,
    /// Cursor for the following page, `None` on the last page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PagePointer>,
}

impl<T> Page<T> {
    /// Create a page that continues at `next`.
    pub fn new(items: Vec<T>, next: Option<PagePointer>) -> Self {
        Self { items, next }
    }

    /// Create the final page of a listing.
    pub fn last(items: Vec<T>) -> Self {
        Self { items, next: None }
    }

    /// Whether this is the final page.
    pub fn is_last(&self) -> bool {
        self.next.is_none()
    }
}

// ============ Zone ============

/// A DNS zone managed by a backend.
///
/// Some backends key zones by name only, so `id` is optional; use [`Zone::key`]
/// to get the identifier the backend expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    /// Zone name (e.g., `"example.com."`).
    pub name: String,
    /// Provider-specific zone identifier, if the backend has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Default TTL applied to record sets that don't carry one.
    pub ttl: u32,
    /// Hostmaster email from the SOA.
    pub email: String,
}

impl Zone {
    /// Create a zone keyed by name.
    pub fn new(name: impl Into<String>, ttl: u32, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            ttl,
            email: email.into(),
        }
    }

    /// Attach a provider-specific id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// The identifier used when addressing this zone: its id, or its name.
    pub fn key(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.name)
    }
}

// ============ Record Data ============

/// Type-safe constructors for common rdata shapes.
///
/// Converts into the generic field map [`Rdata`] so callers don't spell field
/// names by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content")]
pub enum RecordData {
    /// A record: maps a hostname to an IPv4 address.
    A {
        /// IPv4 address (e.g., `"192.0.2.1"`).
        address: String,
    },

    /// AAAA record: maps a hostname to an IPv6 address.
    AAAA {
        /// IPv6 address (e.g., `"2001:db8::1"`).
        address: String,
    },

    /// CNAME record: alias from one name to another.
    CNAME {
        /// Target hostname.
        cname: String,
    },

    /// MX record: mail exchange server.
    MX {
        /// Preference (lower = preferred).
        preference: u16,
        /// Mail server hostname.
        exchange: String,
    },

    /// TXT record: arbitrary text data.
    TXT {
        /// Text content.
        txtdata: String,
    },

    /// SPF record: legacy sender policy type, same shape as TXT.
    SPF {
        /// Policy text.
        txtdata: String,
    },

    /// NS record: authoritative name server.
    NS {
        /// Name server hostname.
        nsdname: String,
    },

    /// PTR record: reverse pointer.
    PTR {
        /// Target hostname.
        ptrdname: String,
    },

    /// SRV record: service locator.
    SRV {
        /// Priority (lower = preferred).
        priority: u16,
        /// Weight for load balancing among same-priority targets.
        weight: u16,
        /// TCP/UDP port number.
        port: u16,
        /// Target hostname providing the service.
        target: String,
    },

    /// CAA record: Certificate Authority Authorization.
    CAA {
        /// Issuer critical flag (0 or 128).
        flags: u8,
        /// Property tag (`"issue"`, `"issuewild"`, or `"iodef"`).
        tag: String,
        /// CA domain or reporting URI.
        value: String,
    },
}

impl RecordData {
    /// Returns the record type mnemonic for this data.
    pub fn record_type(&self) -> &'static str {
        match self {
            Self::A { .. } => "A",
            Self::AAAA { .. } => "AAAA",
            Self::CNAME { .. } => "CNAME",
            Self::MX { .. } => "MX",
            Self::TXT { .. } => "TXT",
            Self::SPF { .. } => "SPF",
            Self::NS { .. } => "NS",
            Self::PTR { .. } => "PTR",
            Self::SRV { .. } => "SRV",
            Self::CAA { .. } => "CAA",
        }
    }
}

/// One rdata value: a mapping from field name to value (e.g. `{address: "192.0.2.1"}`).
///
/// Field order is canonical (sorted), so two values with the same fields compare equal
/// regardless of how they were built.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rdata(BTreeMap<String, Value>);

impl Rdata {
    /// Create an empty rdata map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, returning the updated value.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Look up a field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Iterate over `(field, value)` pairs in canonical order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Whether no field is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Rdata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<RecordData> for Rdata {
    fn from(data: RecordData) -> Self {
        match data {
            RecordData::A { address } | RecordData::AAAA { address } => {
                Self::new().with("address", address)
            }
            RecordData::CNAME { cname } => Self::new().with("cname", cname),
            RecordData::MX {
                preference,
                exchange,
            } => Self::new()
                .with("preference", preference)
                .with("exchange", exchange),
            RecordData::TXT { txtdata } | RecordData::SPF { txtdata } => {
                Self::new().with("txtdata", txtdata)
            }
            RecordData::NS { nsdname } => Self::new().with("nsdname", nsdname),
            RecordData::PTR { ptrdname } => Self::new().with("ptrdname", ptrdname),
            RecordData::SRV {
                priority,
                weight,
                port,
                target,
            } => Self::new()
                .with("priority", priority)
                .with("weight", weight)
                .with("port", port)
                .with("target", target),
            RecordData::CAA { flags, tag, value } => Self::new()
                .with("flags", flags)
                .with("tag", tag)
                .with("value", value),
        }
    }
}

impl fmt::Display for Rdata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (field, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match value {
                Value::String(s) => write!(f, "{field}={s}")?,
                other => write!(f, "{field}={other}")?,
            }
        }
        f.write_str("}")
    }
}

// ============ Profiles ============

/// Geo profile: the territories selected under each region.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Geo {
    regions: RegionMap,
}

impl Geo {
    /// Wrap a region map.
    pub fn new(regions: RegionMap) -> Self {
        Self { regions }
    }

    /// The selected territories, by region.
    pub fn regions(&self) -> &RegionMap {
        &self.regions
    }

    /// Consume the profile, returning its region map.
    pub fn into_regions(self) -> RegionMap {
        self.regions
    }

    /// Whether no region is selected.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Whether any region selects `territory`.
    pub fn contains_territory(&self, territory: &str) -> bool {
        self.regions.values().any(|t| t.contains(territory))
    }
}

impl From<RegionMap> for Geo {
    fn from(regions: RegionMap) -> Self {
        Self::new(regions)
    }
}

/// Weighted profile: relative share of responses for this qualifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weighted {
    /// Relative weight, `0..=MAX_WEIGHT`.
    pub weight: u32,
}

/// Group metadata shared by every entry of a record set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMetadata {
    /// Geo profile, if the set is geo-qualified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo: Option<Geo>,
    /// Weighted profile, if the set is weight-qualified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weighted: Option<Weighted>,
}

impl GroupMetadata {
    /// Group metadata carried by a record set.
    pub fn of(rrset: &ResourceRecordSet) -> Self {
        Self {
            geo: rrset.geo.clone(),
            weighted: rrset.weighted,
        }
    }
}

// ============ Record Sets ============

/// Identity of a record set: `(name, type, qualifier)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSetKey {
    /// Record name.
    pub name: String,
    /// Record type mnemonic, uppercase.
    #[serde(rename = "type")]
    pub record_type: String,
    /// Geo group or weighted label; absent for plain round-robin sets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,
}

impl RecordSetKey {
    /// Key for an unqualified record set.
    pub fn new(name: impl Into<String>, record_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            record_type: record_type.into().to_uppercase(),
            qualifier: None,
        }
    }

    /// Attach a qualifier.
    #[must_use]
    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }
}

impl fmt::Display for RecordSetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(q) => write!(f, "{}/{}/{q}", self.name, self.record_type),
            None => write!(f, "{}/{}", self.name, self.record_type),
        }
    }
}

/// Optional name/type/qualifier narrowing for record-set listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSetFilter {
    /// Only sets with this name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Only sets with this type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_type: Option<String>,
    /// Only sets with this qualifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,
}

impl RecordSetFilter {
    /// Filter narrowing to exactly one record-set identity.
    pub fn exact(key: &RecordSetKey) -> Self {
        Self {
            name: Some(key.name.clone()),
            record_type: Some(key.record_type.clone()),
            qualifier: key.qualifier.clone(),
        }
    }

    /// Whether `key` passes this filter. Unset fields match anything.
    pub fn matches(&self, key: &RecordSetKey) -> bool {
        self.name.as_ref().is_none_or(|n| *n == key.name)
            && self
                .record_type
                .as_ref()
                .is_none_or(|t| t.eq_ignore_ascii_case(&key.record_type))
            && self
                .qualifier
                .as_ref()
                .is_none_or(|q| key.qualifier.as_ref() == Some(q))
    }
}

/// Rejection raised while building a [`ResourceRecordSet`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidRecordSet {
    /// Offending field.
    pub field: &'static str,
    /// What is wrong with it.
    pub reason: String,
}

impl InvalidRecordSet {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for InvalidRecordSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid record set {}: {}", self.field, self.reason)
    }
}

impl std::error::Error for InvalidRecordSet {}

/// A group of rdata values sharing one `(name, type, qualifier)`.
///
/// Record sets are values: nothing mutates one in place. Use
/// [`to_builder`](Self::to_builder) to derive a changed copy.
///
/// `rdata` entries form a set (duplicates collapse on insertion) that keeps
/// insertion order for display. Equality compares them as a set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RecordSetRepr")]
pub struct ResourceRecordSet {
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    qualifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ttl: Option<u32>,
    records: Vec<Rdata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    geo: Option<Geo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    weighted: Option<Weighted>,
}

impl ResourceRecordSet {
    /// Start building a record set.
    pub fn builder(
        name: impl Into<String>,
        record_type: impl Into<String>,
    ) -> ResourceRecordSetBuilder {
        ResourceRecordSetBuilder {
            name: name.into(),
            record_type: record_type.into(),
            ..Default::default()
        }
    }

    /// Builder pre-filled with this set's values.
    pub fn to_builder(&self) -> ResourceRecordSetBuilder {
        ResourceRecordSetBuilder {
            name: self.name.clone(),
            record_type: self.record_type.clone(),
            qualifier: self.qualifier.clone(),
            ttl: self.ttl,
            records: self.records.clone(),
            geo: self.geo.clone(),
            weighted: self.weighted,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn record_type(&self) -> &str {
        &self.record_type
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    pub fn ttl(&self) -> Option<u32> {
        self.ttl
    }

    /// Rdata values in insertion order.
    pub fn records(&self) -> &[Rdata] {
        &self.records
    }

    pub fn geo(&self) -> Option<&Geo> {
        self.geo.as_ref()
    }

    pub fn weighted(&self) -> Option<Weighted> {
        self.weighted
    }

    /// The set's identity.
    pub fn key(&self) -> RecordSetKey {
        RecordSetKey {
            name: self.name.clone(),
            record_type: self.record_type.clone(),
            qualifier: self.qualifier.clone(),
        }
    }

    /// Whether `rdata` is one of this set's values.
    pub fn contains(&self, rdata: &Rdata) -> bool {
        self.records.contains(rdata)
    }

    /// A copy of this set with its geo profile replaced.
    pub fn with_geo(&self, geo: Geo) -> Result<Self, InvalidRecordSet> {
        self.to_builder().geo(geo).build()
    }

    /// A copy of this set with its ttl replaced.
    #[must_use]
    pub fn with_ttl(&self, ttl: Option<u32>) -> Self {
        Self {
            ttl,
            ..self.clone()
        }
    }
}

impl PartialEq for ResourceRecordSet {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.record_type == other.record_type
            && self.qualifier == other.qualifier
            && self.ttl == other.ttl
            && self.geo == other.geo
            && self.weighted == other.weighted
            && self.records.len() == other.records.len()
            && self.records.iter().all(|r| other.records.contains(r))
    }
}

impl Eq for ResourceRecordSet {}

/// Builder for [`ResourceRecordSet`].
#[derive(Debug, Clone, Default)]
pub struct ResourceRecordSetBuilder {
    name: String,
    record_type: String,
    qualifier: Option<String>,
    ttl: Option<u32>,
    records: Vec<Rdata>,
    geo: Option<Geo>,
    weighted: Option<Weighted>,
}

impl ResourceRecordSetBuilder {
    /// Set the qualifier (geo group name or weighted label).
    #[must_use]
    pub fn qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    /// Set the TTL in seconds.
    #[must_use]
    pub fn ttl(mut self, ttl: u32) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Set or clear the TTL; `None` defers to the zone default.
    #[must_use]
    pub fn ttl_opt(mut self, ttl: Option<u32>) -> Self {
        self.ttl = ttl;
        self
    }

    /// Append an rdata value; a duplicate of an existing value is dropped.
    #[must_use]
    pub fn add(mut self, rdata: impl Into<Rdata>) -> Self {
        let rdata = rdata.into();
        if !self.records.contains(&rdata) {
            self.records.push(rdata);
        }
        self
    }

    /// Append several rdata values.
    #[must_use]
    pub fn add_all<I, R>(self, records: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Rdata>,
    {
        records.into_iter().fold(self, |builder, rdata| builder.add(rdata))
    }

    /// Drop every rdata value.
    #[must_use]
    pub fn clear_records(mut self) -> Self {
        self.records.clear();
        self
    }

    /// Set the geo profile.
    #[must_use]
    pub fn geo(mut self, geo: impl Into<Geo>) -> Self {
        self.geo = Some(geo.into());
        self
    }

    /// Set the weighted profile.
    #[must_use]
    pub fn weight(mut self, weight: u32) -> Self {
        self.weighted = Some(Weighted { weight });
        self
    }

    /// Validate and build.
    pub fn build(self) -> Result<ResourceRecordSet, InvalidRecordSet> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(InvalidRecordSet::new("name", "must not be empty"));
        }
        let record_type = self.record_type.trim().to_uppercase();
        if record_type.is_empty() {
            return Err(InvalidRecordSet::new("type", "must not be empty"));
        }
        if self.qualifier.as_deref().is_some_and(|q| q.trim().is_empty()) {
            return Err(InvalidRecordSet::new("qualifier", "must not be blank"));
        }
        if self.records.iter().any(Rdata::is_empty) {
            return Err(InvalidRecordSet::new("records", "rdata must have fields"));
        }
        if self.qualifier.is_none() && (self.geo.is_some() || self.weighted.is_some()) {
            return Err(InvalidRecordSet::new(
                "qualifier",
                "geo and weighted record sets require a qualifier",
            ));
        }
        if let Some(Weighted { weight }) = self.weighted
            && weight > MAX_WEIGHT
        {
            return Err(InvalidRecordSet::new(
                "weighted",
                format!("weight {weight} exceeds {MAX_WEIGHT}"),
            ));
        }

        Ok(ResourceRecordSet {
            name,
            record_type,
            qualifier: self.qualifier,
            ttl: self.ttl,
            records: self.records,
            geo: self.geo,
            weighted: self.weighted,
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordSetRepr {
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    #[serde(default)]
    qualifier: Option<String>,
    #[serde(default)]
    ttl: Option<u32>,
    #[serde(default)]
    records: Vec<Rdata>,
    #[serde(default)]
    geo: Option<Geo>,
    #[serde(default)]
    weighted: Option<Weighted>,
}

impl TryFrom<RecordSetRepr> for ResourceRecordSet {
    type Error = InvalidRecordSet;

    fn try_from(repr: RecordSetRepr) -> Result<Self, Self::Error> {
        let mut builder = ResourceRecordSet::builder(repr.name, repr.record_type)
            .ttl_opt(repr.ttl)
            .add_all(repr.records);
        if let Some(q) = repr.qualifier {
            builder = builder.qualifier(q);
        }
        if let Some(geo) = repr.geo {
            builder = builder.geo(geo);
        }
        if let Some(w) = repr.weighted {
            builder = builder.weight(w.weight);
        }
        builder.build()
    }
}

// ============ Per-Entry Types ============

/// Backend-assigned reference to a single stored entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryRef(String);

impl EntryRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One stored rdata value, as listed by a record-by-record backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordEntry {
    /// Reference used to update or delete this entry.
    pub entry_ref: EntryRef,
    /// Record name.
    pub name: String,
    /// Record type mnemonic.
    #[serde(rename = "type")]
    pub record_type: String,
    /// Qualifier of the enclosing record set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,
    /// TTL stored on the entry.
    pub ttl: u32,
    /// The entry's value.
    pub rdata: Rdata,
    /// Metadata of the enclosing group.
    #[serde(flatten)]
    pub group: GroupMetadata,
}

impl RecordEntry {
    /// Identity of the record set this entry belongs to.
    pub fn key(&self) -> RecordSetKey {
        RecordSetKey {
            name: self.name.clone(),
            record_type: self.record_type.clone(),
            qualifier: self.qualifier.clone(),
        }
    }
}

/// Request to create one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEntry {
    /// Record name.
    pub name: String,
    /// Record type mnemonic.
    #[serde(rename = "type")]
    pub record_type: String,
    /// Qualifier of the enclosing record set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,
    /// TTL in seconds.
    pub ttl: u32,
    /// The value to store.
    pub rdata: Rdata,
    /// Metadata of the enclosing group.
    #[serde(flatten)]
    pub group: GroupMetadata,
}

impl NewEntry {
    /// Entry for one value of `rrset`, stored with `ttl`.
    pub fn for_record_set(rrset: &ResourceRecordSet, rdata: Rdata, ttl: u32) -> Self {
        Self {
            name: rrset.name.clone(),
            record_type: rrset.record_type.clone(),
            qualifier: rrset.qualifier.clone(),
            ttl,
            rdata,
            group: GroupMetadata::of(rrset),
        }
    }

    /// Identity of the record set this entry belongs to.
    pub fn key(&self) -> RecordSetKey {
        RecordSetKey {
            name: self.name.clone(),
            record_type: self.record_type.clone(),
            qualifier: self.qualifier.clone(),
        }
    }
}

/// In-place changes to one entry. `None` fields stay as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryUpdate {
    /// New TTL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    /// New value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rdata: Option<Rdata>,
    /// Replacement group metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupMetadata>,
}

impl EntryUpdate {
    /// Whether the update changes nothing.
    pub fn is_empty(&self) -> bool {
        self.ttl.is_none() && self.rdata.is_none() && self.group.is_none()
    }
}

// ============ Capabilities ============

/// How a backend applies record-set changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WriteMode {
    /// Native idempotent whole-set replace.
    ReplaceSet,
    /// Record-by-record create/update/delete.
    PerEntry,
}

/// Optional features gated behind an account-level probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// Directional (geo) record sets.
    Geo,
    /// Weighted record sets.
    Weighted,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Geo => f.write_str("geo"),
            Self::Weighted => f.write_str("weighted"),
        }
    }
}

/// What a backend declares about itself at construction.
///
/// Checked at composition time; the engine never inspects backend types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendCapabilities {
    /// Whole-set replace or record-by-record writes.
    pub write_mode: WriteMode,
    /// Whether TTL and group metadata can be updated on an existing entry.
    pub entry_metadata_update: bool,
    /// Whether a grouping pool must exist before its first entry is created.
    pub requires_pool: bool,
    /// Whether writes only take effect after an explicit commit.
    pub requires_commit: bool,
    /// Whether the backend can serve geo record sets (still subject to a probe).
    pub geo: bool,
    /// Whether the backend can serve weighted record sets (still subject to a probe).
    pub weighted: bool,
}

impl BackendCapabilities {
    /// A backend with native whole-set replace and nothing else.
    pub fn replace_set() -> Self {
        Self {
            write_mode: WriteMode::ReplaceSet,
            entry_metadata_update: false,
            requires_pool: false,
            requires_commit: false,
            geo: false,
            weighted: false,
        }
    }

    /// A record-by-record backend with nothing else.
    pub fn per_entry() -> Self {
        Self {
            write_mode: WriteMode::PerEntry,
            ..Self::replace_set()
        }
    }

    #[must_use]
    pub fn with_entry_metadata_update(mut self) -> Self {
        self.entry_metadata_update = true;
        self
    }

    #[must_use]
    pub fn with_pool(mut self) -> Self {
        self.requires_pool = true;
        self
    }

    #[must_use]
    pub fn with_commit(mut self) -> Self {
        self.requires_commit = true;
        self
    }

    #[must_use]
    pub fn with_geo(mut self) -> Self {
        self.geo = true;
        self
    }

    #[must_use]
    pub fn with_weighted(mut self) -> Self {
        self.weighted = true;
        self
    }

    /// Whether `capability` is declared.
    pub fn declares(&self, capability: Capability) -> bool {
        match capability {
            Capability::Geo => self.geo,
            Capability::Weighted => self.weighted,
        }
    }
}

impl Default for BackendCapabilities {
    fn default() -> Self {
        Self::replace_set()
    }
}

// ============ Backend Metadata Types ============

/// The input type of a credential field (affects UI rendering).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Plain text input.
    Text,
    /// Masked/password input.
    Password,
}

/// Definition of a single credential field required by a backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialField {
    /// Machine-readable field key (e.g., `"apiToken"`).
    pub key: String,
    /// Human-readable label (e.g., `"API Token"`).
    pub label: String,
    /// Input type for UI rendering.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Optional help/description text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
}

/// Backend-specific listing limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendLimits {
    /// Maximum page size of record-set and entry listings.
    pub max_page_size: u32,
}

/// Static metadata describing a backend.
///
/// Obtain via [`DnsBackend::metadata()`](crate::DnsBackend::metadata) or
/// [`get_all_backend_metadata()`](crate::get_all_backend_metadata).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendMetadata {
    /// Identifier the registry selects this backend by.
    pub id: String,
    /// Human-readable backend name.
    pub name: String,
    /// Short description of the backend.
    pub description: String,
    /// Credential fields required to authenticate with this backend.
    pub required_fields: Vec<CredentialField>,
    /// Declared capabilities.
    pub capabilities: BackendCapabilities,
    /// Listing limits.
    pub limits: BackendLimits,
}

// ============ Credential Types ============

/// Validation error for backend credentials.
///
/// Returned when credential fields are missing or empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CredentialValidationError {
    /// A required credential field is missing entirely.
    MissingField {
        /// Which backend the error relates to.
        provider: String,
        /// Machine-readable field key.
        field: String,
        /// Human-readable field label.
        label: String,
    },
    /// A credential field is present but empty/whitespace-only.
    EmptyField {
        /// Which backend the error relates to.
        provider: String,
        /// Machine-readable field key.
        field: String,
        /// Human-readable field label.
        label: String,
    },
}

impl fmt::Display for CredentialValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField { label, .. } => write!(f, "Missing required field: {label}"),
            Self::EmptyField { label, .. } => write!(f, "Field must not be empty: {label}"),
        }
    }
}

impl std::error::Error for CredentialValidationError {}

/// Flat key/value credentials, validated against a backend's required fields.
///
/// `Debug` prints field names only.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credentials(BTreeMap<String, String>);

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, returning the updated credentials.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Iterate over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Fetch a required field, rejecting missing or blank values.
    pub fn require(
        &self,
        provider: &str,
        field: &CredentialField,
    ) -> Result<&str, CredentialValidationError> {
        match self.0.get(&field.key) {
            None => Err(CredentialValidationError::MissingField {
                provider: provider.to_string(),
                field: field.key.clone(),
                label: field.label.clone(),
            }),
            Some(v) if v.trim().is_empty() => Err(CredentialValidationError::EmptyField {
                provider: provider.to_string(),
                field: field.key.clone(),
                label: field.label.clone(),
            }),
            Some(v) => Ok(v),
        }
    }

    /// Check every field `metadata` requires.
    pub fn validate(&self, metadata: &BackendMetadata) -> Result<(), CredentialValidationError> {
        for field in &metadata.required_fields {
            self.require(&metadata.id, field)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.keys()).finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Credentials {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
