/// Bootstrap DDL for the two corpus tables. Every statement is idempotent.
pub fn render_schema() -> &'static str {
	include_str!("../../../sql/init.sql")
}

pub fn statements(sql: &str) -> impl Iterator<Item = &str> {
	sql.split(';').map(str::trim).filter(|statement| !statement.is_empty())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn schema_declares_both_corpus_tables() {
		let sql = render_schema();

		assert!(sql.contains("CREATE TABLE IF NOT EXISTS campaigns"));
		assert!(sql.contains("CREATE TABLE IF NOT EXISTS academy"));
	}

	#[test]
	fn statements_skip_blank_segments() {
		let parts = statements("SELECT 1;\n\n ;SELECT 2;").collect::<Vec<_>>();

		assert_eq!(parts, vec!["SELECT 1", "SELECT 2"]);
	}
}
