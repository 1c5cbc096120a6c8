use uuid::Uuid;

use farmlink_types::models::{Role, User, timestamp_now};

use crate::Database;

pub fn user(db: &Database, name: &str, role: Role) -> User {
    let user = User {
        id: Uuid::new_v4(),
        clerk_id: format!("clerk_{}", name.to_lowercase()),
        name: name.to_string(),
        email: format!("{}@farm.test", name.to_lowercase()),
        role,
        phone: None,
        location: None,
        organization: None,
        bio: None,
        latitude: None,
        longitude: None,
        created_at: timestamp_now(),
    };
    db.insert_user(&user).unwrap();
    user
}
