pub mod codes;
pub mod format_table;
