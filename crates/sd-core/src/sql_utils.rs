//! SQL identifier helpers used when building tracker DDL.
//!
//! The tracker table name comes from configuration, so it is always quoted
//! before being interpolated into SQL.

/// Quote a SQL identifier, doubling any embedded double quotes.
///
/// # Examples
/// ```
/// use sd_core::sql_utils::quote_ident;
/// assert_eq!(quote_ident("tracker"), r#""tracker""#);
/// assert_eq!(quote_ident(r#"a"b"#), r#""a""b""#);
/// ```
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote a possibly schema-qualified table name component by component.
///
/// # Examples
/// ```
/// use sd_core::sql_utils::quote_qualified;
/// assert_eq!(quote_qualified("deploy.tracker"), r#""deploy"."tracker""#);
/// ```
pub fn quote_qualified(name: &str) -> String {
    name.split('.')
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(".")
}

/// Split `schema.table` on the last `.`; unqualified names get `default_schema`.
pub fn split_qualified_name<'a>(name: &'a str, default_schema: &'a str) -> (&'a str, &'a str) {
    match name.rfind('.') {
        Some(pos) => (&name[..pos], &name[pos + 1..]),
        None => (default_schema, name),
    }
}
