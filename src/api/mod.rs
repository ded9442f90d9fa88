// Thin namespace wrapper for API-layer components
pub mod handlers {
    pub use crate::handlers::*;
}

pub mod payment_link {
    pub use crate::payment_link::*;
}
