//! Query expression trees.
//!
//! A [`Query`] is built entirely on the Rust side and only lowered to
//! native query objects when it is handed to
//! [`Enquire::set_query`](super::Enquire::set_query). Queries produced by
//! the [`QueryParser`](super::QueryParser) already live on the native side
//! and are carried as [`ParsedQuery`].

use std::fmt::Write as _;
use std::sync::Arc;

use super::error::{Error, Result};
use super::handle::Handle;
use crate::native::{HandleKind, NativeApi, QueryOp, RawHandle};

/// A query expression.
#[derive(Debug)]
pub enum Query {
    /// Matches no documents.
    MatchNothing,
    /// A single term, with query frequency and position.
    Term { term: String, wqf: u32, pos: u32 },
    /// Subqueries joined by a combining operator.
    Combine {
        op: QueryOp,
        subqueries: Vec<Query>,
        /// Window size for `NEAR`/`PHRASE`, set size for `ELITE_SET`; 0 is the default.
        parameter: u32,
    },
    /// Documents whose value in `slot` lies in `lo..=hi`.
    ValueRange { slot: u32, lo: Vec<u8>, hi: Vec<u8> },
    /// `VALUE_GE` or `VALUE_LE` against a single limit.
    ValueCompare { op: QueryOp, slot: u32, limit: Vec<u8> },
    /// A query built by the native query parser.
    Parsed(ParsedQuery),
}

impl Query {
    /// Combine `operands` with `op`.
    ///
    /// No operands give [`Query::MatchNothing`]; a single operand is
    /// returned unchanged. Value operators do not combine subqueries and
    /// are rejected.
    pub fn new<I>(op: QueryOp, operands: I) -> Result<Query>
    where
        I: IntoIterator,
        I::Item: Into<Query>,
    {
        Self::with_parameter(op, operands, 0)
    }

    /// Like [`Query::new`], with a window or set-size parameter.
    pub fn with_parameter<I>(op: QueryOp, operands: I, parameter: u32) -> Result<Query>
    where
        I: IntoIterator,
        I::Item: Into<Query>,
    {
        if !op.is_combining() {
            return Err(Error::InvalidQuery(format!(
                "{} takes a value slot, not subqueries",
                op
            )));
        }
        if parameter != 0 && !op.takes_parameter() {
            return Err(Error::InvalidQuery(format!(
                "{} does not take a parameter",
                op
            )));
        }

        let mut subqueries: Vec<Query> = operands.into_iter().map(Into::into).collect();
        Ok(match subqueries.len() {
            0 => Query::MatchNothing,
            1 => subqueries.remove(0),
            _ => Query::Combine {
                op,
                subqueries,
                parameter,
            },
        })
    }

    pub fn term(term: impl Into<String>) -> Query {
        Self::term_with(term, 1, 0)
    }

    /// A term with an explicit within-query frequency and position.
    pub fn term_with(term: impl Into<String>, wqf: u32, pos: u32) -> Query {
        Query::Term {
            term: term.into(),
            wqf,
            pos,
        }
    }

    pub fn value_range(slot: u32, lo: impl Into<Vec<u8>>, hi: impl Into<Vec<u8>>) -> Query {
        Query::ValueRange {
            slot,
            lo: lo.into(),
            hi: hi.into(),
        }
    }

    pub fn value_ge(slot: u32, limit: impl Into<Vec<u8>>) -> Query {
        Query::ValueCompare {
            op: QueryOp::ValueGe,
            slot,
            limit: limit.into(),
        }
    }

    pub fn value_le(slot: u32, limit: impl Into<Vec<u8>>) -> Query {
        Query::ValueCompare {
            op: QueryOp::ValueLe,
            slot,
            limit: limit.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Query::MatchNothing)
    }

    /// Fully parenthesized description, e.g. `Query(((smoke OR test) OR terms))`.
    pub fn get_description(&self) -> String {
        let mut out = String::from("Query(");
        self.describe(&mut out);
        out.push(')');
        out
    }

    fn describe(&self, out: &mut String) {
        match self {
            Query::MatchNothing => {}
            Query::Term { term, wqf, pos } => {
                out.push_str(term);
                if *wqf != 1 {
                    let _ = write!(out, "#{}", wqf);
                }
                if *pos != 0 {
                    let _ = write!(out, "@{}", pos);
                }
            }
            Query::Combine {
                op,
                subqueries,
                parameter,
            } => {
                out.push('(');
                for (i, sub) in subqueries.iter().enumerate() {
                    if i > 0 {
                        if *parameter != 0 {
                            let _ = write!(out, " {} {} ", op, parameter);
                        } else {
                            let _ = write!(out, " {} ", op);
                        }
                    }
                    sub.describe(out);
                }
                out.push(')');
            }
            Query::ValueRange { slot, lo, hi } => {
                let _ = write!(
                    out,
                    "{} {} {} {}",
                    QueryOp::ValueRange,
                    slot,
                    String::from_utf8_lossy(lo),
                    String::from_utf8_lossy(hi)
                );
            }
            Query::ValueCompare { op, slot, limit } => {
                let _ = write!(out, "{} {} {}", op, slot, String::from_utf8_lossy(limit));
            }
            Query::Parsed(parsed) => out.push_str(&parsed.description),
        }
    }

    /// Build the native query objects for this tree.
    ///
    /// Intermediate handles are pushed onto `keep` and must outlive the
    /// native call that consumes the returned handle.
    pub(crate) fn lower(&self, api: &Arc<dyn NativeApi>, keep: &mut Vec<Handle>) -> Result<RawHandle> {
        let handle = match self {
            Query::Parsed(parsed) => return parsed.handle.raw(),
            Query::MatchNothing => {
                super::acquire(api, HandleKind::Query, |api| api.query_match_nothing())?
            }
            Query::Term { term, wqf, pos } => {
                super::acquire(api, HandleKind::Query, |api| api.query_term(term, *wqf, *pos))?
            }
            Query::Combine {
                op,
                subqueries,
                parameter,
            } => {
                let raws = subqueries
                    .iter()
                    .map(|sub| sub.lower(api, keep))
                    .collect::<Result<Vec<_>>>()?;
                super::acquire(api, HandleKind::Query, |api| {
                    api.query_combine(*op, &raws, *parameter)
                })?
            }
            Query::ValueRange { slot, lo, hi } => {
                super::acquire(api, HandleKind::Query, |api| {
                    api.query_value_range(QueryOp::ValueRange, *slot, lo, hi)
                })?
            }
            Query::ValueCompare { op, slot, limit } => {
                super::acquire(api, HandleKind::Query, |api| {
                    api.query_value_range(*op, *slot, limit, &[])
                })?
            }
        };
        let raw = handle.raw()?;
        keep.push(handle);
        Ok(raw)
    }
}

impl From<&str> for Query {
    fn from(term: &str) -> Self {
        Query::term(term)
    }
}

impl From<String> for Query {
    fn from(term: String) -> Self {
        Query::term(term)
    }
}

impl From<ParsedQuery> for Query {
    fn from(parsed: ParsedQuery) -> Self {
        Query::Parsed(parsed)
    }
}

/// A query that lives on the native side, produced by the query parser.
#[derive(Debug)]
pub struct ParsedQuery {
    handle: Handle,
    description: String,
}

impl ParsedQuery {
    pub(crate) fn new(handle: Handle) -> Result<Self> {
        let raw = handle.raw()?;
        let native = handle.api().query_description(raw)?;
        Ok(ParsedQuery {
            handle,
            description: strip_wrapper(&native).to_string(),
        })
    }

    pub fn get_description(&self) -> String {
        format!("Query({})", self.description)
    }

    pub fn is_empty(&self) -> bool {
        self.description.is_empty()
    }
}

/// `Query(x)` -> `x`; anything else is kept as is.
fn strip_wrapper(description: &str) -> &str {
    description
        .strip_prefix("Query(")
        .and_then(|rest| rest.strip_suffix(')'))
        .unwrap_or(description)
}
