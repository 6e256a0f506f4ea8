//! # Clause Recognizers
//!
//! Named recognizers over raw PPL text. Each one answers a single question
//! ("where is the index declaration?", "is there a `fields` stage?") with an
//! optional byte span, so the composer never touches a regular expression.
//!
//! ```text
//! search source=logs | where ts >= timestamp('…') and … | fields a, b | stats count()
//! └──── Index ─────┘└──────── TimeRange / RangeFilter ─┘└── Fields ─┘
//! ```
//!
//! This is a heuristic pass over text, not a parser: stages are delimited by
//! `|` and string literals containing a pipe will confuse it.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

static INDEX_LEADING: OnceLock<Regex> = OnceLock::new();
static INDEX_ANYWHERE: OnceLock<Regex> = OnceLock::new();
static TIME_RANGE: OnceLock<Regex> = OnceLock::new();
static FIELDS: OnceLock<Regex> = OnceLock::new();
static RANGE_FILTER: OnceLock<Regex> = OnceLock::new();

fn index_leading_regex() -> &'static Regex {
    INDEX_LEADING.get_or_init(|| {
        Regex::new(r"(?i)^\s*(search\s+)?(source|index)\s*=\s*([^|\s]+)")
            .expect("index clause regex")
    })
}

fn index_anywhere_regex() -> &'static Regex {
    INDEX_ANYWHERE.get_or_init(|| {
        Regex::new(r"(?i)(?:^|\|)\s*(search\s+)?(source|index)\s*=\s*([^|\s]+)")
            .expect("index clause regex")
    })
}

fn time_range_regex() -> &'static Regex {
    TIME_RANGE.get_or_init(|| {
        Regex::new(r"(?i)\|\s*where\s+[^|]*?\btimestamp\s*\([^|]*").expect("time range regex")
    })
}

fn fields_regex() -> &'static Regex {
    FIELDS.get_or_init(|| Regex::new(r"(?i)\|\s*fields\s+([^|]*)").expect("fields regex"))
}

fn range_filter_regex() -> &'static Regex {
    RANGE_FILTER.get_or_init(|| {
        Regex::new(r"(?i)^\s*\|\s*where\s+[^|]*?(>=|\btimestamp\s*\()[^|]*")
            .expect("range filter regex")
    })
}

/// The kind of stage a recognizer reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClauseKind {
    Index,
    TimeRange,
    Fields,
    RangeFilter,
}

impl std::fmt::Display for ClauseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ClauseKind::Index => "index",
            ClauseKind::TimeRange => "time_range",
            ClauseKind::Fields => "fields",
            ClauseKind::RangeFilter => "range_filter",
        };
        f.write_str(name)
    }
}

/// A recognized stage: its kind, byte span in the query, and text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClauseMatch {
    pub kind: ClauseKind,
    pub span: Range<usize>,
    pub text: String,
}

/// A recognizer locates one kind of stage in a query.
pub trait Recognizer {
    const KIND: ClauseKind;

    /// Byte span of the first matching stage, trailing whitespace excluded.
    fn find(query: &str) -> Option<Range<usize>>;

    fn recognize(query: &str) -> Option<ClauseMatch> {
        Self::find(query).map(|span| ClauseMatch {
            kind: Self::KIND,
            text: query[span.clone()].to_string(),
            span,
        })
    }

    fn is_present(query: &str) -> bool {
        Self::find(query).is_some()
    }
}

/// Which keyword introduced the index declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKeyword {
    Source,
    Index,
}

/// A located index declaration (`search source=logs`, `index = logs`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDeclaration<'a> {
    query: &'a str,
    span: Range<usize>,
    index: Range<usize>,
    pub keyword: IndexKeyword,
    /// `true` when the declaration carried the `search` command word.
    pub search: bool,
}

impl<'a> IndexDeclaration<'a> {
    fn from_captures(query: &'a str, caps: &regex::Captures<'_>) -> Option<Self> {
        let search = caps.get(1);
        let keyword = caps.get(2)?;
        let index = caps.get(3)?;
        let start = search.map_or(keyword.start(), |m| m.start());
        let keyword = if keyword.as_str().eq_ignore_ascii_case("index") {
            IndexKeyword::Index
        } else {
            IndexKeyword::Source
        };
        Some(Self {
            query,
            span: start..index.end(),
            index: index.range(),
            keyword,
            search: search.is_some(),
        })
    }

    /// The index token, e.g. `logs` in `search source=logs`.
    pub fn index(&self) -> &'a str {
        &self.query[self.index.clone()]
    }

    /// Byte offset immediately following the index token.
    pub fn end(&self) -> usize {
        self.span.end
    }

    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }

    /// The declaration text itself.
    pub fn head(&self) -> &'a str {
        &self.query[self.span.clone()]
    }

    /// Everything after the index token, untouched.
    pub fn remainder(&self) -> &'a str {
        &self.query[self.span.end..]
    }
}

/// Recognizes the index declaration that must open every query.
pub struct IndexClause;

impl IndexClause {
    /// Locate the leading declaration. Only whitespace may precede it.
    pub fn locate(query: &str) -> Option<IndexDeclaration<'_>> {
        let caps = index_leading_regex().captures(query)?;
        IndexDeclaration::from_captures(query, &caps)
    }

    /// Locate a declaration at the start of any stage, not just the first.
    pub fn locate_anywhere(query: &str) -> Option<IndexDeclaration<'_>> {
        let caps = index_anywhere_regex().captures(query)?;
        IndexDeclaration::from_captures(query, &caps)
    }
}

impl Recognizer for IndexClause {
    const KIND: ClauseKind = ClauseKind::Index;

    fn find(query: &str) -> Option<Range<usize>> {
        Self::locate(query).map(|decl| decl.span())
    }
}

/// Recognizes a `| where ... timestamp(...)` stage anywhere in the query.
pub struct TimeRangeClause;

impl Recognizer for TimeRangeClause {
    const KIND: ClauseKind = ClauseKind::TimeRange;

    fn find(query: &str) -> Option<Range<usize>> {
        time_range_regex()
            .find(query)
            .map(|m| trim_end(query, m.range()))
    }
}

/// Recognizes a `| fields a, b` stage anywhere in the query.
pub struct FieldsClause;

impl FieldsClause {
    /// Field names listed by the first `fields` stage.
    pub fn fields(query: &str) -> Option<Vec<String>> {
        let caps = fields_regex().captures(query)?;
        let list = caps.get(1)?.as_str();
        Some(
            list.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        )
    }
}

impl Recognizer for FieldsClause {
    const KIND: ClauseKind = ClauseKind::Fields;

    fn find(query: &str) -> Option<Range<usize>> {
        fields_regex()
            .find(query)
            .map(|m| trim_end(query, m.range()))
    }
}

/// Recognizes a range-bound `where` stage directly after the index
/// declaration (`| where ts >= ...`). This is where the composer anchors
/// panel filters.
pub struct RangeFilterClause;

impl Recognizer for RangeFilterClause {
    const KIND: ClauseKind = ClauseKind::RangeFilter;

    fn find(query: &str) -> Option<Range<usize>> {
        let decl = IndexClause::locate(query)?;
        let offset = decl.end();
        range_filter_regex()
            .find(decl.remainder())
            .map(|m| trim_end(query, offset + m.start()..offset + m.end()))
    }
}

/// Run every recognizer and return the matches ordered by position.
pub fn recognize(query: &str) -> Vec<ClauseMatch> {
    let mut matches: Vec<ClauseMatch> = [
        IndexClause::recognize(query),
        RangeFilterClause::recognize(query),
        TimeRangeClause::recognize(query),
        FieldsClause::recognize(query),
    ]
    .into_iter()
    .flatten()
    .collect();
    matches.sort_by_key(|m| (m.span.start, m.span.end));
    matches
}

fn trim_end(query: &str, span: Range<usize>) -> Range<usize> {
    let trimmed = query[span.clone()].trim_end();
    span.start..span.start + trimmed.len()
}
