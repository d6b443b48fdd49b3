//! Generic table editor.
//!
//! One [`TableEditor`] serves one [`TableSpec`]. Each operator action maps to
//! exactly one method here, and each method issues at most one mutating
//! statement through the shared [`Gateway`]. After a successful mutation the
//! editor clears its form and re-reads the table, so the grid always shows
//! what the database committed.
use crate::core::db::{statement, Gateway, TableSpec};
use crate::core::{Notice, NoticeKind, Notifier, Response};
use crate::results_grid::{display_value, ResultsGrid};
use rusqlite::types::Value;
use std::rc::Rc;
use tracing::{debug, info};

/// Which row, if any, update and delete act on.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RowSelection {
    #[default]
    Unselected,
    Selected(Value),
}

impl RowSelection {
    pub fn primary_key(&self) -> Option<&Value> {
        match self {
            RowSelection::Unselected => None,
            RowSelection::Selected(pk) => Some(pk),
        }
    }
}

/// Draft values for the declared columns, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct FormValues {
    columns: Vec<String>,
    values: Vec<String>,
}

impl FormValues {
    fn for_spec(spec: &TableSpec) -> Self {
        let columns: Vec<String> = spec.columns().iter().map(|c| c.name.to_string()).collect();
        let values = vec![String::new(); columns.len()];
        FormValues { columns, values }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.index_of(column).map(|i| self.values[i].as_str())
    }

    /// Sets a declared column's draft value. Unknown columns are ignored and
    /// reported with `false`.
    pub fn set(&mut self, column: &str, value: impl Into<String>) -> bool {
        match self.index_of(column) {
            Some(i) => {
                self.values[i] = value.into();
                true
            }
            None => false,
        }
    }

    /// Mutable access by position, for field-by-field editing.
    pub fn field_mut(&mut self, index: usize) -> Option<&mut String> {
        self.values.get_mut(index)
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.iter_mut().for_each(String::clear);
    }

    fn trimmed(&self) -> Vec<String> {
        self.values.iter().map(|v| v.trim().to_string()).collect()
    }

    fn index_of(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }
}

/// Why an action was refused before any statement was built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
    MissingData,
    NoRowChosen,
}

/// What an editor action did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The statement ran and was committed.
    Applied,
    /// Validation failed; no statement was built.
    Refused(Refusal),
    /// The operator answered "no" to a confirmation.
    Declined,
    /// The database rejected the statement; state is unchanged.
    Failed,
}

pub struct TableEditor {
    spec: TableSpec,
    gateway: Rc<dyn Gateway>,
    notifier: Rc<dyn Notifier>,
    selection: RowSelection,
    search: String,
    form: FormValues,
    grid: ResultsGrid,
}

impl TableEditor {
    /// Creates an editor with an empty grid; call [`TableEditor::refresh`]
    /// to load rows.
    pub fn new(spec: TableSpec, gateway: Rc<dyn Gateway>, notifier: Rc<dyn Notifier>) -> Self {
        let form = FormValues::for_spec(&spec);
        let grid = ResultsGrid::new(spec.headers());
        TableEditor {
            spec,
            gateway,
            notifier,
            selection: RowSelection::Unselected,
            search: String::new(),
            form,
            grid,
        }
    }

    pub fn spec(&self) -> &TableSpec {
        &self.spec
    }

    pub fn selection(&self) -> &RowSelection {
        &self.selection
    }

    pub fn form(&self) -> &FormValues {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FormValues {
        &mut self.form
    }

    pub fn grid(&self) -> &ResultsGrid {
        &self.grid
    }

    pub fn search_text(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, text: impl Into<String>) {
        self.search = text.into();
    }

    pub fn search_mut(&mut self) -> &mut String {
        &mut self.search
    }

    /// Re-reads the table, applying the search filter if there is one.
    ///
    /// On failure the previously displayed rows stay as they were.
    pub fn refresh(&mut self) -> Outcome {
        let stmt = statement::select_rows(&self.spec, self.search.trim());
        match self.gateway.execute(&stmt.sql, &stmt.params) {
            Ok(set) => {
                debug!(table = %self.spec.name(), rows = set.rows.len(), "Refreshed");
                self.grid.replace_rows(set.rows);
                Outcome::Applied
            }
            Err(_) => Outcome::Failed,
        }
    }

    /// Empties the search text and shows every row again.
    pub fn reset_search(&mut self) -> Outcome {
        self.search.clear();
        self.refresh()
    }

    pub fn insert(&mut self) -> Outcome {
        let values = match self.validated_values("INSERT") {
            Some(values) => values,
            None => return Outcome::Refused(Refusal::MissingData),
        };
        let stmt = statement::insert_row(&self.spec, &values);
        self.apply(stmt)
    }

    pub fn update(&mut self) -> Outcome {
        let pk = match self.selected_key("UPDATE") {
            Some(pk) => pk,
            None => return Outcome::Refused(Refusal::NoRowChosen),
        };
        let values = match self.validated_values("UPDATE") {
            Some(values) => values,
            None => return Outcome::Refused(Refusal::MissingData),
        };
        let stmt = statement::update_row(&self.spec, &values, &pk);
        self.apply(stmt)
    }

    /// Deletes the selected row after the operator confirms it.
    pub fn delete(&mut self) -> Outcome {
        let pk = match self.selected_key("DELETE") {
            Some(pk) => pk,
            None => return Outcome::Refused(Refusal::NoRowChosen),
        };

        let question = Notice::confirm(
            "Confirm",
            format!("Delete row {}={}?", self.spec.primary_key(), display_value(&pk)),
        );
        if self.notifier.notify(&question) != Response::Yes {
            debug!(table = %self.spec.name(), "Delete declined");
            return Outcome::Declined;
        }

        let stmt = statement::delete_row(&self.spec, &pk);
        self.apply(stmt)
    }

    /// Loads a displayed row (primary key first) into the form and selects it.
    pub fn select(&mut self, row: &[Value]) {
        let Some((pk, rest)) = row.split_first() else {
            return;
        };
        self.selection = RowSelection::Selected(pk.clone());
        for (i, slot) in self.form.values.iter_mut().enumerate() {
            *slot = rest.get(i).map(display_value).unwrap_or_default();
        }
    }

    /// Selects the grid row at `index`; returns false if there is none.
    pub fn select_index(&mut self, index: usize) -> bool {
        match self.grid.row(index).cloned() {
            Some(row) => {
                self.select(&row);
                true
            }
            None => false,
        }
    }

    /// Forgets the selection and blanks the form. The grid is left alone.
    pub fn clear(&mut self) {
        self.selection = RowSelection::Unselected;
        self.form.clear();
    }

    fn apply(&mut self, stmt: statement::Statement) -> Outcome {
        match self.gateway.execute(&stmt.sql, &stmt.params) {
            Ok(set) => {
                info!(table = %self.spec.name(), affected = set.affected, "{}", first_word(&stmt.sql));
                self.clear();
                self.refresh();
                Outcome::Applied
            }
            Err(_) => Outcome::Failed,
        }
    }

    fn selected_key(&self, action: &str) -> Option<Value> {
        let pk = self.selection.primary_key().cloned();
        if pk.is_none() {
            self.notifier.notify(&Notice::new(
                NoticeKind::NoRowChosen,
                "No row chosen",
                format!("Pick a row in the table to {}.", action),
            ));
        }
        pk
    }

    fn validated_values(&self, action: &str) -> Option<Vec<String>> {
        let values = self.form.trimmed();
        if values.iter().any(|v| v.is_empty()) {
            self.notifier.notify(&Notice::new(
                NoticeKind::MissingData,
                "Missing data",
                format!("Fill in every field before {}.", action),
            ));
            return None;
        }
        Some(values)
    }
}

fn first_word(sql: &str) -> &str {
    sql.split_whitespace().next().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::SqliteGateway;
    use crate::core::notify::Recorder;
    use rusqlite::Connection;

    fn editor() -> (TableEditor, Rc<Recorder>) {
        let recorder = Rc::new(Recorder::new());
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE Klienti (
                klients_id INTEGER PRIMARY KEY AUTOINCREMENT,
                vards TEXT,
                uzvards TEXT
            );
            INSERT INTO Klienti (vards, uzvards) VALUES ('Anna', 'Ozola'), ('Bob', NULL);",
        )
        .unwrap();
        let gateway = Rc::new(SqliteGateway::from_connection(conn, recorder.clone()));
        let spec = TableSpec::new(
            "Klienti",
            "Klienti",
            "klients_id",
            vec![
                ("vards".to_string(), "Vārds".to_string()),
                ("uzvards".to_string(), "Uzvārds".to_string()),
            ],
        )
        .unwrap();
        let mut editor = TableEditor::new(spec, gateway, recorder.clone());
        assert_eq!(editor.refresh(), Outcome::Applied);
        (editor, recorder)
    }

    #[test]
    fn test_refresh_orders_newest_first() {
        let (editor, _) = editor();
        let keys: Vec<&Value> = editor.grid().rows.iter().map(|r| &r[0]).collect();
        assert_eq!(keys, vec![&Value::Integer(2), &Value::Integer(1)]);
        assert_eq!(editor.grid().headers, vec!["klients_id", "vards", "uzvards"]);
    }

    #[test]
    fn test_select_fills_form_and_blanks_null() {
        let (mut editor, _) = editor();
        assert!(editor.select_index(0));
        assert_eq!(editor.selection(), &RowSelection::Selected(Value::Integer(2)));
        assert_eq!(editor.form().get("vards"), Some("Bob"));
        assert_eq!(editor.form().get("uzvards"), Some(""));
        assert!(!editor.select_index(5));
    }

    #[test]
    fn test_select_empty_row_is_ignored() {
        let (mut editor, _) = editor();
        editor.select(&[]);
        assert_eq!(editor.selection(), &RowSelection::Unselected);
    }

    #[test]
    fn test_clear_keeps_grid() {
        let (mut editor, _) = editor();
        editor.select_index(1);
        editor.clear();
        assert_eq!(editor.selection(), &RowSelection::Unselected);
        assert!(editor.form().values().iter().all(String::is_empty));
        assert_eq!(editor.grid().len(), 2);
    }

    #[test]
    fn test_blank_after_trim_is_missing_data() {
        let (mut editor, recorder) = editor();
        editor.form_mut().set("vards", "Jane");
        editor.form_mut().set("uzvards", "   ");
        assert_eq!(editor.insert(), Outcome::Refused(Refusal::MissingData));
        assert_eq!(recorder.kinds(), vec![NoticeKind::MissingData]);
        assert_eq!(editor.grid().len(), 2);
    }

    #[test]
    fn test_insert_trims_values() {
        let (mut editor, _) = editor();
        editor.form_mut().set("vards", "  Jane ");
        editor.form_mut().set("uzvards", "Doe");
        assert_eq!(editor.insert(), Outcome::Applied);
        assert_eq!(editor.grid().rows[0][1], Value::Text("Jane".into()));
    }

    #[test]
    fn test_update_refused_before_validation_when_unselected() {
        let (mut editor, recorder) = editor();
        assert_eq!(editor.update(), Outcome::Refused(Refusal::NoRowChosen));
        assert_eq!(recorder.kinds(), vec![NoticeKind::NoRowChosen]);
    }

    #[test]
    fn test_delete_confirmation_names_key() {
        let (mut editor, recorder) = editor();
        editor.select_index(1);
        assert_eq!(editor.delete(), Outcome::Declined);
        let notice = recorder.last().unwrap();
        assert_eq!(notice.kind, NoticeKind::Confirm);
        assert_eq!(notice.message, "Delete row klients_id=1?");
        // declining leaves the selection in place
        assert!(editor.selection().primary_key().is_some());
    }

    #[test]
    fn test_reset_search_shows_everything() {
        let (mut editor, _) = editor();
        editor.set_search("Ann");
        editor.refresh();
        assert_eq!(editor.grid().len(), 1);
        assert_eq!(editor.reset_search(), Outcome::Applied);
        assert_eq!(editor.search_text(), "");
        assert_eq!(editor.grid().len(), 2);
    }

    #[test]
    fn test_search_is_trimmed() {
        let (mut editor, _) = editor();
        editor.set_search("  Bob  ");
        editor.refresh();
        assert_eq!(editor.grid().len(), 1);
        assert_eq!(editor.grid().rows[0][1], Value::Text("Bob".into()));
    }

    #[test]
    fn test_failed_refresh_keeps_rows() {
        let (mut editor, recorder) = editor();
        editor
            .gateway
            .execute("DROP TABLE Klienti", &[])
            .unwrap();
        assert_eq!(editor.refresh(), Outcome::Failed);
        assert_eq!(editor.grid().len(), 2);
        assert_eq!(recorder.kinds(), vec![NoticeKind::StatementFailed]);
    }
}
