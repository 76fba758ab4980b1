//! ORM-side filters and the parsed where-clause tree.
//!
//! A [`Filter`] is what the host ORM hands the connector:
//!
//! ```text
//! { "where": { <field>: <value> | "and": [ {..}, .. ] | "or": [ .. ] }, "limit": 10, "offset": 0 }
//! ```
//!
//! The where document is parsed into an [`Expr`] tree and walked with a [`QueryVisitor`].
//! Parsing accepts every shape the ORM can produce; deciding what the store can execute
//! is left to the visitor (see [`FilterCompiler`](crate::compile::FilterCompiler)).
//!
//! # Example
//!
//! ```ignore
//! use bson::doc;
//! use kindstore::query::Filter;
//!
//! let filter = Filter::builder()
//!     .where_clause(doc! { "status": "open", "and": [{ "owner": "ana" }] })
//!     .limit(10)
//!     .build();
//! ```

use bson::{Bson, Document};
use serde::{Deserialize, Serialize};

use crate::error::{ConnectorError, ConnectorResult};

/// Combinator key for a conjunction of sub-clauses.
pub const AND: &str = "and";
/// Combinator key for a disjunction of sub-clauses.
pub const OR: &str = "or";

/// A where clause plus paging, as passed by the ORM.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// Field-to-value mapping, possibly nesting `and` / `or` combinators.
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<Document>,
    /// Maximum number of records to return.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    /// Number of records to skip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a filter builder.
    pub fn builder() -> FilterBuilder {
        FilterBuilder::new()
    }

    /// Decodes a filter from its JSON wire form.
    pub fn from_json(value: serde_json::Value) -> ConnectorResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Parses the where clause. A missing clause parses to an empty conjunction.
    pub fn expr(&self) -> ConnectorResult<Expr> {
        match &self.where_clause {
            Some(clause) => Expr::parse(clause),
            None => Ok(Expr::And(Vec::new())),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FilterBuilder {
    filter: Filter,
}

impl FilterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the where clause.
    pub fn where_clause(mut self, clause: Document) -> Self {
        self.filter.where_clause = Some(clause);
        self
    }

    /// Sets the maximum number of records to return.
    pub fn limit(mut self, limit: usize) -> Self {
        self.filter.limit = Some(limit);
        self
    }

    /// Sets the number of records to skip.
    pub fn offset(mut self, offset: usize) -> Self {
        self.filter.offset = Some(offset);
        self
    }

    pub fn build(self) -> Filter {
        self.filter
    }
}

/// A parsed where clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// All sub-expressions must match. Sibling keys of a where document form an
    /// implicit `And`.
    And(Vec<Expr>),
    /// Any sub-expression may match.
    Or(Vec<Expr>),
    /// The field equals a literal value.
    Eq {
        field: String,
        value: Bson,
    },
    /// An operator clause such as `{ "age": { "gt": 5 } }`.
    Operator {
        field: String,
        clause: Document,
    },
}

impl Expr {
    /// Parses a where document into an expression tree.
    ///
    /// `and` / `or` must map to arrays of documents; anything else is a
    /// [`ConnectorError::Validation`] error.
    pub fn parse(clause: &Document) -> ConnectorResult<Expr> {
        let mut exprs = clause
            .iter()
            .map(|(field, value)| Self::parse_entry(field, value))
            .collect::<ConnectorResult<Vec<_>>>()?;

        if exprs.len() == 1 {
            return Ok(exprs.remove(0));
        }

        Ok(Expr::And(exprs))
    }

    fn parse_entry(field: &str, value: &Bson) -> ConnectorResult<Expr> {
        match (field, value) {
            (AND, value) => Ok(Expr::And(Self::parse_list(AND, value)?)),
            (OR, value) => Ok(Expr::Or(Self::parse_list(OR, value)?)),
            (field, Bson::Document(clause)) => Ok(Expr::Operator {
                field: field.to_string(),
                clause: clause.clone(),
            }),
            (field, value) => Ok(Expr::Eq {
                field: field.to_string(),
                value: value.clone(),
            }),
        }
    }

    fn parse_list(combinator: &str, value: &Bson) -> ConnectorResult<Vec<Expr>> {
        let items = value.as_array().ok_or_else(|| {
            ConnectorError::Validation(format!("`{combinator}` expects an array of where clauses"))
        })?;

        items
            .iter()
            .map(|item| match item {
                Bson::Document(clause) => Self::parse(clause),
                other => Err(ConnectorError::Validation(format!(
                    "`{combinator}` entries must be documents, got {other}"
                ))),
            })
            .collect()
    }
}

/// Walks an [`Expr`] tree. Implementors decide what each node translates to.
pub trait QueryVisitor {
    type Output;
    type Error: Into<ConnectorError>;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_eq(&mut self, field: &str, value: &Bson) -> Result<Self::Output, Self::Error>;
    fn visit_operator(
        &mut self,
        field: &str,
        clause: &Document,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        match expr {
            Expr::And(exprs) => self.visit_and(exprs),
            Expr::Or(exprs) => self.visit_or(exprs),
            Expr::Eq { field, value } => self.visit_eq(field, value),
            Expr::Operator { field, clause } => self.visit_operator(field, clause),
        }
    }
}
