use serde::{Deserialize, Serialize};

use super::Table;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Room {
    pub id: i32,
    pub house_id: i32,
    pub name: String,
}

#[derive(Clone)]
pub struct RoomTable;

impl Table for RoomTable {
    fn name(&self) -> &'static str {
        "rooms"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS rooms (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                house_id INTEGER NOT NULL,
                name VARCHAR(255) NOT NULL,
                FOREIGN KEY (house_id) REFERENCES houses (id) ON DELETE CASCADE
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS rooms;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["houses"]
    }
}
