/// Database Module
///
/// The database layer is split into four concerns:
/// - **Identifiers** (`ident.rs`): quoting of table and column names
/// - **Table metadata** (`table_spec.rs`): what one editor tab edits
/// - **Statements** (`statement.rs`): the dynamic SQL each editor action needs
/// - **Gateway** (`gateway.rs`): the single connection that executes them
///
/// Values never appear in generated SQL text; they travel as bound
/// parameters next to it.
pub mod gateway;
pub mod ident;
pub mod statement;
pub mod table_spec;

pub use gateway::*;
pub use ident::*;
pub use statement::*;
pub use table_spec::*;
