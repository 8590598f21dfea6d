pub mod backend;
pub mod error;
pub mod feeds;
pub mod report;
pub mod spec;
pub mod state;
pub mod tensor;

pub use backend::*;
pub use error::*;
pub use feeds::*;
pub use report::*;
pub use spec::*;
pub use state::*;
pub use tensor::*;
