use serde::{Deserialize, Serialize};

use super::Table;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Token {
    pub id: i32,
    pub user_id: i32,
    pub token: String,
}

#[derive(Clone)]
pub struct TokenTable;

impl Table for TokenTable {
    fn name(&self) -> &'static str {
        "tokens"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS tokens (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                token VARCHAR(255) NOT NULL UNIQUE,
                FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS tokens;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["users"]
    }
}
