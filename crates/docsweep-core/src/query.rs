//! Filter expression builder
//!
//! Turns the operator's form inputs into one GROQ query string:
//!
//! ```text
//! *[_type == "post" && (title match "*acme*" || ...)][0...100]{_id, _type, ...}
//! ```
//!
//! User-supplied values are embedded as escaped string literals. A custom
//! query is passed through untouched; the store is the only validator.

use std::num::NonZeroUsize;

/// Fields requested for every row
pub const PROJECTION: &str =
    r#"{_id, _type, title, name, "slug": slug.current, _createdAt, _updatedAt}"#;

/// Type selector on the search form
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TypeChoice {
    #[default]
    All,
    Specific(String),
}

impl TypeChoice {
    /// Parse form input; blank or `all` selects every type
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if input.is_empty() || input.eq_ignore_ascii_case("all") {
            TypeChoice::All
        } else {
            TypeChoice::Specific(input.to_string())
        }
    }
}

/// Everything the operator typed into the search form
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchRequest {
    pub doc_type: TypeChoice,
    pub term: String,
    pub custom: bool,
    pub custom_query: String,
}

impl SearchRequest {
    pub fn term(doc_type: TypeChoice, term: impl Into<String>) -> Self {
        Self {
            doc_type,
            term: term.into(),
            custom: false,
            custom_query: String::new(),
        }
    }

    pub fn custom(query: impl Into<String>) -> Self {
        Self {
            doc_type: TypeChoice::All,
            term: String::new(),
            custom: true,
            custom_query: query.into(),
        }
    }

    /// The custom query, when custom mode is on and the text is non-blank
    pub fn custom_text(&self) -> Option<&str> {
        if self.custom && !self.custom_query.trim().is_empty() {
            Some(&self.custom_query)
        } else {
            None
        }
    }

    /// A search must carry either a non-blank term or a non-blank custom query.
    ///
    /// Without one of them the built filter would match the entire store.
    pub fn is_searchable(&self) -> bool {
        self.custom_text().is_some() || !self.term.trim().is_empty()
    }
}

/// Build the filter expression for a search
pub fn build_query(request: &SearchRequest, result_cap: NonZeroUsize, known_types: &[String]) -> String {
    if let Some(custom) = request.custom_text() {
        return custom.to_string();
    }

    let mut conditions = Vec::with_capacity(2);

    match &request.doc_type {
        TypeChoice::Specific(t) => conditions.push(format!("_type == {}", quote(t))),
        TypeChoice::All if !known_types.is_empty() => {
            let list = known_types
                .iter()
                .map(|t| quote(t))
                .collect::<Vec<_>>()
                .join(", ");
            conditions.push(format!("_type in [{}]", list));
        }
        TypeChoice::All => {}
    }

    let term = request.term.trim();
    if !term.is_empty() {
        conditions.push(text_condition(term));
    }

    format!(
        "*[{}][0...{}]{}",
        conditions.join(" && "),
        result_cap,
        PROJECTION
    )
}

/// Case-insensitive substring match over the display fields and id suffix
fn text_condition(term: &str) -> String {
    let pattern = quote(&format!("*{}*", term));
    format!(
        "(title match {p} || name match {p} || slug.current match {p} || string::split(_id, _type + \".\")[-1] match {p})",
        p = pattern
    )
}

/// Render a value as a double-quoted GROQ string literal
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
