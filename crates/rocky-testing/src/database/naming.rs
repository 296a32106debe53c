//! Table name rendering for raw `DELETE` statements

use once_cell::sync::Lazy;
use regex::Regex;
use rocky_orm::{DatabaseBackendType, TableMetadata};

static ACRONYM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{2,}").expect("valid acronym regex"));

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]?[a-z]+[0-9]*").expect("valid word regex"));

static LETTER_OR_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[A-Z]|[0-9]+)").expect("valid letter or digits regex"));

/// Length of the token starting `rest`, if one starts there.
///
/// An acronym run is a token when it ends the word, or, minus its last letter,
/// when that letter starts a capitalized word (`HTTPServer` -> `HTTP`).
fn token_len(rest: &str) -> Option<usize> {
    if let Some(run) = ACRONYM.find(rest) {
        let run = run.end();
        match rest[run..].chars().next() {
            None => return Some(run),
            Some(next) if !(next.is_alphanumeric() || next == '_') => return Some(run),
            Some(next) if next.is_ascii_lowercase() && run > 2 => return Some(run - 1),
            Some(_) => {}
        }
    }

    WORD.find(rest).or_else(|| LETTER_OR_DIGITS.find(rest)).map(|m| m.end())
}

/// Split into words, letters and digit runs, then join them lowercased with `_`.
///
/// `OrderLine` -> `order_line`, `HTTPServer2` -> `http_server2`, `OrderV2` -> `order_v_2`.
/// Characters outside any token, such as spaces and hyphens, are dropped.
pub fn to_snake_case(name: &str) -> String {
    let mut tokens = Vec::new();
    let mut rest = name;
    while let Some(first) = rest.chars().next() {
        let len = token_len(rest).unwrap_or(0);
        if len > 0 {
            tokens.push(&rest[..len]);
            rest = &rest[len..];
        } else {
            rest = &rest[first.len_utf8()..];
        }
    }
    tokens.join("_").to_lowercase()
}

/// Render the name used in a `DELETE FROM` statement.
///
/// Without quoting the bare table name is returned. SQL Server gets
/// `[schema].[table]`; every other backend gets snake_cased parts in double quotes.
pub fn format_table_name(
    table: &TableMetadata,
    backend: DatabaseBackendType,
    add_brackets_and_schema: bool,
) -> String {
    if !add_brackets_and_schema {
        return table.name.clone();
    }

    let parts: Vec<&str> = table
        .schema
        .as_deref()
        .into_iter()
        .chain(std::iter::once(table.name.as_str()))
        .collect();

    if backend.is_sql_server() {
        format!("[{}]", parts.join("].["))
    } else {
        let parts: Vec<String> = parts.into_iter().map(to_snake_case).collect();
        format!("\"{}\"", parts.join("\".\""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case() {
        assert_eq!(to_snake_case("OrderLine"), "order_line");
        assert_eq!(to_snake_case("MySchema"), "my_schema");
        assert_eq!(to_snake_case("HTTPServer2"), "http_server2");
        assert_eq!(to_snake_case("Orders"), "orders");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
        assert_eq!(to_snake_case("Address2Line"), "address2_line");
        assert_eq!(to_snake_case("APIKey"), "api_key");
        assert_eq!(to_snake_case("ID"), "id");
    }

    #[test]
    fn test_snake_case_splits_digits_and_drops_separators() {
        assert_eq!(to_snake_case("OrderV2"), "order_v_2");
        assert_eq!(to_snake_case("ABC123"), "a_b_c_123");
        assert_eq!(to_snake_case("ABc"), "a_bc");
        assert_eq!(to_snake_case("order-line"), "order_line");
        assert_eq!(to_snake_case("Order Line"), "order_line");
        assert_eq!(to_snake_case("2024Orders"), "2024_orders");
    }

    #[test]
    fn test_sql_server_brackets() {
        let table = TableMetadata::new("Orders").with_schema("dbo");
        assert_eq!(
            format_table_name(&table, DatabaseBackendType::SqlServer, true),
            "[dbo].[Orders]"
        );

        let table = TableMetadata::new("Orders");
        assert_eq!(format_table_name(&table, DatabaseBackendType::SqlServer, true), "[Orders]");
    }

    #[test]
    fn test_postgres_quotes_snake_cased_parts() {
        let table = TableMetadata::new("OrderLine").with_schema("MySchema");
        assert_eq!(
            format_table_name(&table, DatabaseBackendType::PostgreSQL, true),
            "\"my_schema\".\"order_line\""
        );

        let table = TableMetadata::new("OrderLine");
        assert_eq!(
            format_table_name(&table, DatabaseBackendType::SQLite, true),
            "\"order_line\""
        );
    }

    #[test]
    fn test_bare_names_without_quoting() {
        let orders = TableMetadata::new("Orders").with_schema("dbo");
        let lines = TableMetadata::new("OrderLine").with_schema("MySchema");

        assert_eq!(format_table_name(&orders, DatabaseBackendType::SqlServer, false), "Orders");
        assert_eq!(format_table_name(&lines, DatabaseBackendType::PostgreSQL, false), "OrderLine");
    }

    #[test]
    fn test_uses_table_name_not_entity() {
        let table = TableMetadata::new("Customer").with_table_name("Customers");
        assert_eq!(format_table_name(&table, DatabaseBackendType::PostgreSQL, false), "Customers");
        assert_eq!(
            format_table_name(&table, DatabaseBackendType::PostgreSQL, true),
            "\"customers\""
        );
    }
}
