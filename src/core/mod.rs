// Domain-layer modules and shared errors/models
pub mod payments {
    pub use crate::payments::*;
}

pub mod reminders {
    pub use crate::reminders::*;
}

pub mod urgency {
    pub use crate::urgency::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod errors {
    pub use crate::errors::*;
}
