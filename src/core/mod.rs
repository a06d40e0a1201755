// Domain-layer modules and shared errors
pub mod report {
    pub use crate::report::*;
}

pub mod scoring {
    pub use crate::scoring::*;
}

pub mod assessment {
    pub use crate::assessment::*;
}

pub mod errors {
    pub use crate::errors::*;
}
