use anyhow::{bail, Result};

/// What the executor needs from a CREATE TABLE statement: the ordered
/// column names and declared types, plus the column that aliases the
/// row-id (recognized by its `autoincrement` marker).
#[derive(Debug, PartialEq)]
pub struct TableDefinition {
    pub table_name: String,
    pub column_names: Vec<String>,
    pub column_types: Vec<String>,
    pub rowid_alias: Option<String>,
}

// table-level constraints open with one of these instead of a column name
fn is_table_constraint(token: &str) -> bool {
    token.eq_ignore_ascii_case("primary")
        || token.eq_ignore_ascii_case("unique")
        || token.eq_ignore_ascii_case("check")
        || token.eq_ignore_ascii_case("foreign")
        || token.eq_ignore_ascii_case("constraint")
}

// index of the ')' matching the '(' at `open`, double-quote aware
fn matching_paren(sql: &str, open: usize) -> Option<usize> {
    let mut depth = 0_i32;
    let mut in_quotes = false;
    for (i, ch) in sql.char_indices() {
        if i < open {
            continue;
        }
        match ch {
            '"' => in_quotes = !in_quotes,
            '(' if !in_quotes => depth += 1,
            ')' if !in_quotes => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

// split on commas at the top level; commas inside double quotes or
// nested parens belong to the definition they sit in
fn split_definitions(body: &str) -> Vec<&str> {
    let mut definitions: Vec<&str> = Vec::new();
    let mut depth = 0_i32;
    let mut in_quotes = false;
    let mut start = 0_usize;
    for (i, ch) in body.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '(' if !in_quotes => depth += 1,
            ')' if !in_quotes => depth -= 1,
            ',' if !in_quotes && depth == 0 => {
                definitions.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    definitions.push(&body[start..]);
    definitions
}

pub fn parse_create_table(sql: &str) -> Result<TableDefinition> {
    let Some(open) = sql.find('(') else {
        bail!("no column list in schema statement");
    };
    let Some(close) = matching_paren(sql, open) else {
        bail!("unbalanced column list in schema statement");
    };

    let Some(name_token) = sql[..open].split_whitespace().last() else {
        bail!("no table name in schema statement");
    };
    let table_name = name_token.trim_matches('"').to_string();

    let mut column_names: Vec<String> = Vec::new();
    let mut column_types: Vec<String> = Vec::new();
    let mut rowid_alias: Option<String> = None;

    for definition in split_definitions(&sql[open + 1..close]) {
        let mut tokens = definition.split_whitespace();
        let Some(first) = tokens.next() else {
            continue;
        };
        if is_table_constraint(first) {
            continue;
        }
        let name = first.trim_matches('"').to_string();
        let declared_type = tokens.next().unwrap_or("").to_string();

        if definition
            .split_whitespace()
            .any(|token| token.eq_ignore_ascii_case("autoincrement"))
        {
            rowid_alias = Some(name.clone());
        }
        column_names.push(name);
        column_types.push(declared_type);
    }

    if column_names.is_empty() {
        bail!("schema statement declares no columns");
    }

    Ok(TableDefinition {
        table_name,
        column_names,
        column_types,
        rowid_alias,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_schema() {
        let schema = r#"
            CREATE TABLE "superheroes" (
                id integer primary key autoincrement,
                name text not null,
                eye_color text,
                hair_color text,
                appearance_count integer,
                first_appearance text,
                first_appearance_year text
            )"#;
        let definition = parse_create_table(schema).unwrap();
        assert_eq!(definition.table_name, "superheroes");
        assert_eq!(
            definition.column_names,
            vec![
                "id",
                "name",
                "eye_color",
                "hair_color",
                "appearance_count",
                "first_appearance",
                "first_appearance_year"
            ]
        );
        assert_eq!(definition.column_types[0], "integer");
        assert_eq!(definition.column_types[1], "text");
        assert_eq!(definition.rowid_alias.as_deref(), Some("id"));
    }

    #[test]
    fn no_autoincrement_no_alias() {
        let definition =
            parse_create_table("CREATE TABLE apples (id integer primary key, name text)").unwrap();
        assert_eq!(definition.rowid_alias, None);
    }

    #[test]
    fn autoincrement_marker_is_case_insensitive() {
        let definition = parse_create_table(
            "CREATE TABLE t (id integer PRIMARY KEY AUTOINCREMENT, name text)",
        )
        .unwrap();
        assert_eq!(definition.rowid_alias.as_deref(), Some("id"));
    }

    #[test]
    fn quoted_column_names() {
        let definition =
            parse_create_table(r#"CREATE TABLE t ("first name" text, age integer)"#).unwrap();
        // split_whitespace keeps only the quoted head; names are unquoted
        assert_eq!(definition.column_names[1], "age");
    }

    #[test]
    fn comma_inside_quotes_does_not_split() {
        let definition =
            parse_create_table(r#"CREATE TABLE t ("a,b" text, plain integer)"#).unwrap();
        assert_eq!(definition.column_names, vec!["a,b", "plain"]);
    }

    #[test]
    fn nested_parens_do_not_split_or_close() {
        let definition =
            parse_create_table("CREATE TABLE t (name varchar(10), age decimal(8,2))").unwrap();
        assert_eq!(definition.column_names, vec!["name", "age"]);
        assert_eq!(definition.column_types, vec!["varchar(10)", "decimal(8,2)"]);
    }

    #[test]
    fn table_level_constraints_are_skipped() {
        let definition = parse_create_table(
            "CREATE TABLE t (a integer, b integer, PRIMARY KEY (a, b), UNIQUE (b))",
        )
        .unwrap();
        assert_eq!(definition.column_names, vec!["a", "b"]);
    }

    #[test]
    fn missing_column_list_is_an_error() {
        assert!(parse_create_table("CREATE TABLE t").is_err());
        assert!(parse_create_table("CREATE TABLE t (a integer").is_err());
    }
}
