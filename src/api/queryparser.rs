use std::ops::{BitOr, BitOrAssign};

use super::database::Database;
use super::error::Result;
use super::handle::Handle;
use super::query::ParsedQuery;
use super::stem::Stem;
use super::Bridge;
use crate::native::{HandleKind, QueryOp, StemStrategy};

/// Feature flags for [`QueryParser::parse_query_with_flags`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParseFlags(u32);

impl ParseFlags {
    pub const BOOLEAN: ParseFlags = ParseFlags(1);
    pub const PHRASE: ParseFlags = ParseFlags(2);
    pub const LOVEHATE: ParseFlags = ParseFlags(4);
    pub const BOOLEAN_ANY_CASE: ParseFlags = ParseFlags(8);
    pub const WILDCARD: ParseFlags = ParseFlags(16);
    pub const PURE_NOT: ParseFlags = ParseFlags(32);
    pub const PARTIAL: ParseFlags = ParseFlags(64);
    /// `BOOLEAN | PHRASE | LOVEHATE`, the native default.
    pub const DEFAULT: ParseFlags = ParseFlags(7);

    pub fn empty() -> Self {
        ParseFlags(0)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: ParseFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl Default for ParseFlags {
    fn default() -> Self {
        ParseFlags::DEFAULT
    }
}

impl BitOr for ParseFlags {
    type Output = ParseFlags;

    fn bitor(self, rhs: ParseFlags) -> ParseFlags {
        ParseFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for ParseFlags {
    fn bitor_assign(&mut self, rhs: ParseFlags) {
        self.0 |= rhs.0;
    }
}

/// Builds queries from free-form user text.
#[derive(Debug)]
pub struct QueryParser {
    handle: Handle,
}

impl QueryParser {
    pub fn new(bridge: &Bridge) -> Result<Self> {
        let handle = bridge.acquire(HandleKind::QueryParser, |api| api.queryparser_new())?;
        Ok(QueryParser { handle })
    }

    pub fn set_stemmer(&self, stem: &Stem) -> Result<()> {
        let (raw, stem) = (self.handle.raw()?, stem.raw()?);
        Ok(self.handle.api().queryparser_set_stemmer(raw, stem)?)
    }

    pub fn set_stemming_strategy(&self, strategy: StemStrategy) -> Result<()> {
        let raw = self.handle.raw()?;
        Ok(self
            .handle
            .api()
            .queryparser_set_stemming_strategy(raw, strategy)?)
    }

    /// Operator used between terms with no explicit operator.
    pub fn set_default_op(&self, op: QueryOp) -> Result<()> {
        let raw = self.handle.raw()?;
        Ok(self.handle.api().queryparser_set_default_op(raw, op)?)
    }

    /// Database used for wildcard expansion and spelling.
    pub fn set_database(&self, db: &Database) -> Result<()> {
        let (raw, db) = (self.handle.raw()?, db.raw()?);
        Ok(self.handle.api().queryparser_set_database(raw, db)?)
    }

    /// Map `field:` in query text to the term prefix `prefix`.
    pub fn add_prefix(&self, field: &str, prefix: &str) -> Result<()> {
        let raw = self.handle.raw()?;
        Ok(self.handle.api().queryparser_add_prefix(raw, field, prefix)?)
    }

    /// Like [`add_prefix`](Self::add_prefix), but the field filters instead of ranking.
    pub fn add_boolean_prefix(&self, field: &str, prefix: &str) -> Result<()> {
        let raw = self.handle.raw()?;
        Ok(self
            .handle
            .api()
            .queryparser_add_boolean_prefix(raw, field, prefix)?)
    }

    pub fn parse_query(&self, text: &str) -> Result<ParsedQuery> {
        self.parse_query_with_flags(text, ParseFlags::DEFAULT)
    }

    pub fn parse_query_with_flags(&self, text: &str, flags: ParseFlags) -> Result<ParsedQuery> {
        let raw = self.handle.raw()?;
        let handle = super::acquire(self.handle.api_arc(), HandleKind::Query, |api| {
            api.queryparser_parse_query(raw, text, flags.bits())
        })?;
        let parsed = ParsedQuery::new(handle)?;
        tracing::debug!(text, query = %parsed.get_description(), "parsed query");
        Ok(parsed)
    }

    pub fn dispose(&mut self) -> Result<()> {
        self.handle.release()
    }
}
