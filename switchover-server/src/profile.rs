//! The business row this deployment migrates.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use switchover_core::{Entity, SqlArg};

/// A user profile row, present in both stores during the dual-write phases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: i64,
    pub email: String,
    pub nickname: String,
    pub ctime: i64,
    pub utime: i64,
}

impl Entity for Profile {
    const TABLE: &'static str = "profiles";

    fn id(&self) -> i64 {
        self.id
    }

    fn utime(&self) -> i64 {
        self.utime
    }

    fn columns() -> &'static [&'static str] {
        &["id", "email", "nickname", "ctime", "utime"]
    }

    fn args(&self) -> Vec<SqlArg> {
        vec![
            SqlArg::from(self.id),
            SqlArg::from(self.email.clone()),
            SqlArg::from(self.nickname.clone()),
            SqlArg::from(self.ctime),
            SqlArg::from(self.utime),
        ]
    }

    // Each store stamps utime on its own write, so the follower's copy may
    // lawfully trail the leader's; the payload is what has to agree.
    fn compare_to(&self, other: &Self) -> bool {
        self.id == other.id
            && self.email == other.email
            && self.nickname == other.nickname
            && self.ctime == other.ctime
    }
}
