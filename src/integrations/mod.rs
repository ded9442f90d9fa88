//! External service integrations.

pub mod mailer {
    pub use crate::mailer::*;
}

pub mod db_storage {
    pub use crate::db_storage::*;
}
