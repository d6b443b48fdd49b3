/// Statement Builders
///
/// One builder per editor action. Identifiers are always quoted; every value
/// (form text, search pattern, selected primary key) is returned as a bound
/// parameter, never spliced into the SQL text.
use super::table_spec::TableSpec;
use rusqlite::types::Value;

/// A SQL text plus its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    fn new(sql: String, params: Vec<Value>) -> Self {
        Statement { sql, params }
    }
}

fn column_list(spec: &TableSpec) -> String {
    spec.columns()
        .iter()
        .map(|c| c.name.quoted())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Lists the table newest-first, optionally filtered so that a row matches
/// when any declared column's text form contains `search`.
///
/// `search` is expected to be trimmed already; an empty string means no
/// filter.
pub fn select_rows(spec: &TableSpec, search: &str) -> Statement {
    let pk = spec.primary_key().quoted();
    let mut params = Vec::new();
    let mut sql = format!(
        "SELECT {}, {} FROM {}",
        pk,
        column_list(spec),
        spec.name().quoted()
    );

    if !search.is_empty() {
        let pattern = format!("%{}%", search);
        let likes: Vec<String> = spec
            .columns()
            .iter()
            .map(|c| {
                params.push(Value::Text(pattern.clone()));
                format!("CAST({} AS TEXT) LIKE ?", c.name.quoted())
            })
            .collect();
        sql.push_str(" WHERE ");
        sql.push_str(&likes.join(" OR "));
    }

    sql.push_str(&format!(" ORDER BY {} DESC", pk));
    Statement::new(sql, params)
}

/// Inserts one row; `values` follow the declared column order.
pub fn insert_row(spec: &TableSpec, values: &[String]) -> Statement {
    let placeholders = vec!["?"; spec.columns().len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        spec.name().quoted(),
        column_list(spec),
        placeholders
    );
    Statement::new(sql, text_params(values))
}

/// Rewrites every declared column of the row with primary key `pk`.
/// The key is bound last.
pub fn update_row(spec: &TableSpec, values: &[String], pk: &Value) -> Statement {
    let sets = spec
        .columns()
        .iter()
        .map(|c| format!("{}=?", c.name.quoted()))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "UPDATE {} SET {} WHERE {}=?",
        spec.name().quoted(),
        sets,
        spec.primary_key().quoted()
    );
    let mut params = text_params(values);
    params.push(pk.clone());
    Statement::new(sql, params)
}

/// Removes the row with primary key `pk`.
pub fn delete_row(spec: &TableSpec, pk: &Value) -> Statement {
    let sql = format!(
        "DELETE FROM {} WHERE {}=?",
        spec.name().quoted(),
        spec.primary_key().quoted()
    );
    Statement::new(sql, vec![pk.clone()])
}

fn text_params(values: &[String]) -> Vec<Value> {
    values.iter().map(|v| Value::Text(v.clone())).collect()
}
