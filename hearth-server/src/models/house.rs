use serde::{Deserialize, Serialize};

use super::Table;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct House {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub location: String,
}

#[derive(Clone)]
pub struct HouseTable;

impl Table for HouseTable {
    fn name(&self) -> &'static str {
        "houses"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS houses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                name VARCHAR(255) NOT NULL,
                location VARCHAR(255) NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS houses;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["users"]
    }
}
