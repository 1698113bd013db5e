pub mod history;
pub mod intake;
pub mod order;
pub mod principal;
pub mod product;

pub use history::*;
pub use intake::*;
pub use order::*;
pub use principal::*;
pub use product::*;
